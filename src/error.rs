pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The source model references something that cannot be drawn as stated.
    /// Conversion skips the offending element and keeps going.
    #[error("Structural violation at {subject}: {message}")]
    StructuralViolation { subject: String, message: String },

    #[error("SBGN-ML serialization failed: {message}")]
    Serialization { message: String },

    #[error("Layout unavailable: {reason}")]
    LayoutUnavailable { reason: String },

    #[error("Failed to load pathway model: {message}")]
    ModelLoad { message: String },

    #[error("Invalid converter config: {message}")]
    Config { message: String },
}

impl Error {
    pub(crate) fn structural(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Error::StructuralViolation {
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub(crate) fn serialization(err: impl std::fmt::Display) -> Self {
        Error::Serialization {
            message: err.to_string(),
        }
    }
}
