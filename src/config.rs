use serde::Deserialize;

use crate::error::{Error, Result};

/// Converter options. Strategies (ubiquity, feature text, layout engine) are set on the
/// `Converter` itself.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Draw a reversible conversion as two opposite processes instead of one
    /// process with production arcs on both sides.
    pub two_glyphs_for_reversible: bool,
    /// Dissolve complexes nested in complexes into the outermost complex.
    pub flatten_complex_content: bool,
    /// Layout is skipped when the diagram has this many glyphs or more.
    pub max_layout_nodes: usize,
    pub do_layout: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            two_glyphs_for_reversible: true,
            flatten_complex_content: true,
            max_layout_nodes: 1000,
            do_layout: false,
        }
    }
}

impl ConverterConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| Error::Config {
            message: err.to_string(),
        })
    }
}
