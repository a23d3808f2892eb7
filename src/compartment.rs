use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::diagram::{Diagram, Glyph, GlyphClass};
use crate::ids::{sanitize_id, IdRegistry};
use crate::model::PhysicalEntity;

// Ontology ids that occasionally leak into location terms, e.g. "go:" or "GO:0005737".
static ONTOLOGY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(go|so|mi|bto|cl|pato|mod):\d*$").expect("ontology id regex must compile")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));

/// Compartment glyphs of one conversion run, keyed by lower-cased location name.
#[derive(Debug, Default)]
pub struct CompartmentResolver {
    by_key: IndexMap<String, String>,
}

impl CompartmentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compartment glyph id for the entity's location, creating the glyph on first use.
    pub fn resolve(
        &mut self,
        entity: &PhysicalEntity,
        diagram: &mut Diagram,
        ids: &mut IdRegistry,
    ) -> Option<String> {
        let key = location_key(&entity.cellular_location)?;
        if let Some(id) = self.by_key.get(&key) {
            return Some(id.clone());
        }

        let id = ids.claim(&sanitize_id(&WHITESPACE.replace_all(&key, "_")));
        diagram.insert_glyph(Glyph::new(id.clone(), GlyphClass::Compartment).with_label(&key));
        tracing::debug!(compartment = %key, id = %id, "created compartment");
        self.by_key.insert(key, id.clone());
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// First location term that is not a bare ontology id, trimmed and lower-cased.
pub fn location_key(terms: &[String]) -> Option<String> {
    terms
        .iter()
        .map(|term| term.trim().to_lowercase())
        .find(|term| !term.is_empty() && !ONTOLOGY_ID.is_match(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;

    #[test]
    fn skips_ontology_ids() {
        let terms = vec!["GO:".to_string(), "go:0005737".into(), "Cytosol".into()];
        assert_eq!(location_key(&terms).as_deref(), Some("cytosol"));
        assert_eq!(location_key(&["GO:".to_string()]), None);
        assert_eq!(location_key(&[]), None);
    }

    #[test]
    fn reuses_compartments_case_insensitively() {
        let mut resolver = CompartmentResolver::new();
        let mut diagram = Diagram::new();
        let mut ids = IdRegistry::new();

        let a = PhysicalEntity::new("urn:a", EntityKind::Protein).located_in("Plasma Membrane");
        let b = PhysicalEntity::new("urn:b", EntityKind::Protein).located_in("plasma membrane ");
        let none = PhysicalEntity::new("urn:c", EntityKind::Protein);

        let first = resolver.resolve(&a, &mut diagram, &mut ids).unwrap();
        let second = resolver.resolve(&b, &mut diagram, &mut ids).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "plasma_membrane");
        assert!(resolver.resolve(&none, &mut diagram, &mut ids).is_none());

        assert_eq!(resolver.len(), 1);
        let glyph = diagram.glyph(&first).unwrap();
        assert_eq!(glyph.class, GlyphClass::Compartment);
        assert_eq!(glyph.label_text(), "plasma membrane");
    }
}
