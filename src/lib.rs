//! Convert pathway models (physical entities, conversions, template reactions and
//! controls) into SBGN process-description diagrams.
//!
//! ```no_run
//! use biopax_sbgn_rs::{Converter, ConverterConfig, Model};
//!
//! let model = Model::from_json_str(&std::fs::read_to_string("model.json")?)?;
//! let output = Converter::new(ConverterConfig::default()).convert(&model);
//! let xml = biopax_sbgn_rs::sbgnml::write_sbgnml(&output.diagram)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compartment;
pub mod config;
pub mod convert;
pub mod diagram;
pub mod error;
pub mod feature;
pub mod ids;
pub mod label;
pub mod layout;
pub mod model;
pub mod sbgnml;
pub mod ubique;

pub use config::ConverterConfig;
pub use convert::{ConversionOutput, Converter, LayoutOutcome, SourceMap};
pub use diagram::Diagram;
pub use error::{Error, Result};
pub use model::Model;
