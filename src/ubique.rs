//! Ubiquitous ("don't care") molecule detection.

use std::collections::HashSet;
use std::io::BufRead;

use crate::model::PhysicalEntity;

/// Decides whether a molecule is drawn fresh at every use site instead of shared.
pub trait UbiqueDetector {
    fn is_ubique(&self, entity: &PhysicalEntity) -> bool;
}

impl<F> UbiqueDetector for F
where
    F: Fn(&PhysicalEntity) -> bool,
{
    fn is_ubique(&self, entity: &PhysicalEntity) -> bool {
        self(entity)
    }
}

/// Matches entities by URI or, case-insensitively, by any of their names.
#[derive(Clone, Debug, Default)]
pub struct ListUbiqueDetector {
    uris: HashSet<String>,
    names: HashSet<String>,
}

impl ListUbiqueDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small molecules that are usually hidden behind clone markers.
    pub fn common() -> Self {
        let mut detector = Self::new();
        for name in [
            "water", "h2o", "atp", "adp", "amp", "gtp", "gdp", "nad+", "nadh", "nadp+", "nadph",
            "phosphate", "pi", "ppi", "pyrophosphate", "co2", "carbon dioxide", "h+", "proton",
            "oxygen", "o2", "coa", "coenzyme a",
        ] {
            detector.add_name(name);
        }
        detector
    }

    /// One entry per line; lines containing `:` are taken as URIs, `#` starts a comment.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut detector = Self::new();
        for line in reader.lines() {
            let line = line?;
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            if entry.contains(':') {
                detector.add_uri(entry);
            } else {
                detector.add_name(entry);
            }
        }
        Ok(detector)
    }

    pub fn add_uri(&mut self, uri: impl Into<String>) {
        self.uris.insert(uri.into());
    }

    pub fn add_name(&mut self, name: &str) {
        self.names.insert(name.trim().to_lowercase());
    }

    fn name_matches(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }
}

impl UbiqueDetector for ListUbiqueDetector {
    fn is_ubique(&self, entity: &PhysicalEntity) -> bool {
        if self.uris.contains(&entity.uri) {
            return true;
        }
        if entity.is_complex() {
            return false;
        }
        let reference = entity.entity_reference.as_ref();
        entity
            .display_name
            .iter()
            .chain(entity.standard_name.iter())
            .chain(entity.names.iter())
            .chain(reference.into_iter().flat_map(|er| {
                er.display_name
                    .iter()
                    .chain(er.standard_name.iter())
                    .chain(er.names.iter())
            }))
            .any(|name| self.name_matches(name))
    }
}
