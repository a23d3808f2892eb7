//! Short printable state-variable text for entity features.

use crate::diagram::Annotation;
use crate::model::EntityFeature;

/// Turns a feature into a state variable. Returning `None` leaves the feature undrawn.
pub trait FeatureDecorator {
    fn state_variable(&self, feature: &EntityFeature) -> Option<Annotation>;
}

impl<F> FeatureDecorator for F
where
    F: Fn(&EntityFeature) -> Option<Annotation>,
{
    fn state_variable(&self, feature: &EntityFeature) -> Option<Annotation> {
        self(feature)
    }
}

/// Built-in vocabulary: well-known modifications get their usual abbreviation,
/// anything else keeps its own term. Fragments render as `fragment`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonFeatureDecorator;

impl CommonFeatureDecorator {
    pub fn abbreviate(term: &str) -> String {
        let lower = term.trim().to_lowercase();
        let lower = lower
            .strip_prefix("mod:")
            .map(str::trim)
            .unwrap_or(lower.as_str());
        let short = match lower {
            t if t.contains("phospho") => "P",
            t if t.contains("acetyl") => "Ac",
            t if t.contains("ubiquitin") => "Ub",
            t if t.contains("sumo") => "SUMO",
            t if t.contains("methyl") => "Me",
            t if t.contains("glyco") => "G",
            t if t.contains("hydroxy") => "OH",
            t if t.contains("palmitoyl") => "Pa",
            t if t.contains("myristoyl") => "My",
            t if t.contains("farnesyl") => "F",
            t if t.contains("nitrosyl") => "NO",
            t if t.contains("sulfat") => "S",
            _ => return term.trim().to_string(),
        };
        short.to_string()
    }
}

impl FeatureDecorator for CommonFeatureDecorator {
    fn state_variable(&self, feature: &EntityFeature) -> Option<Annotation> {
        match feature {
            EntityFeature::Modification { term, site } => {
                let value = term
                    .as_deref()
                    .map(Self::abbreviate)
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| "mod".to_string());
                Some(Annotation::StateVariable {
                    value,
                    variable: site.clone().filter(|s| !s.trim().is_empty()),
                })
            }
            EntityFeature::Fragment { site } => Some(Annotation::StateVariable {
                value: "fragment".to_string(),
                variable: site.clone().filter(|s| !s.trim().is_empty()),
            }),
            EntityFeature::Binding { .. } => None,
        }
    }
}
