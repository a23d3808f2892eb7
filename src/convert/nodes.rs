use std::collections::HashSet;

use crate::diagram::{Annotation, Glyph, GlyphClass};
use crate::error::Error;
use crate::ids::use_site_id;
use crate::label::resolve_label;
use crate::model::{EntityFeature, EntityKind, PhysicalEntity};

use super::Run;

/// SBGN class drawn for each kind of physical entity.
pub(crate) fn glyph_class(kind: EntityKind) -> GlyphClass {
    match kind {
        EntityKind::SmallMolecule => GlyphClass::SimpleChemical,
        EntityKind::Protein => GlyphClass::Macromolecule,
        EntityKind::Complex => GlyphClass::Complex,
        kind if kind.is_nucleic_acid() => GlyphClass::NucleicAcidFeature,
        _ => GlyphClass::UnspecifiedEntity,
    }
}

/// Molecule-type unit of information for nucleic acids.
fn molecule_type(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::Dna => Some("mt:DNA"),
        EntityKind::DnaRegion => Some("ct:DNA"),
        EntityKind::Rna => Some("mt:RNA"),
        EntityKind::RnaRegion => Some("ct:RNA"),
        EntityKind::NucleicAcid => Some("mt:NuclAc"),
        _ => None,
    }
}

impl<'a> Run<'a> {
    /// Participants get their glyph up front, as do top-level complexes even when
    /// nothing uses them. Dangling molecules are not drawn; inner complex members and
    /// ubiques are drawn lazily where they are used.
    pub(crate) fn needs_glyph(&self, entity: &PhysicalEntity) -> bool {
        if self.converter.is_ubique(entity) {
            return false;
        }
        self.index.participates(&entity.uri)
            || (entity.is_complex() && !self.index.is_component(&entity.uri))
    }

    /// The shared glyph of a non-ubiquitous entity, built on first request.
    pub(crate) fn entity_glyph(&mut self, entity: &PhysicalEntity) -> String {
        if let Some(id) = self.entity_glyphs.get(&entity.uri) {
            return id.clone();
        }

        let id = self.ids.id_for(&entity.uri);
        let glyph = self.glyph_basics(entity, id.clone());
        self.diagram.insert_glyph(glyph);
        self.entity_glyphs.insert(entity.uri.clone(), id.clone());
        self.record_source(&id, &entity.uri);
        self.assign_location(entity, &id);

        if entity.is_complex() {
            self.complex_content(entity, &id);
        }
        id
    }

    /// Glyph to connect an arc to. Ubiques get one fresh glyph per `context`;
    /// other entities share their single glyph.
    pub(crate) fn glyph_to_link(&mut self, uri: &str, context: &str) -> Option<String> {
        let model = self.model;
        let Some(entity) = model.entity(uri) else {
            self.report(Error::structural(
                context,
                format!("references unknown physical entity {uri}"),
            ));
            return None;
        };

        if !self.converter.is_ubique(entity) {
            return Some(self.entity_glyph(entity));
        }

        let key = (uri.to_string(), context.to_string());
        if let Some(id) = self.use_sites.get(&key) {
            return Some(id.clone());
        }
        let base = self.ids.id_for(uri);
        let id = self.ids.claim(&use_site_id(&base, context));
        let glyph = self.glyph_basics(entity, id.clone());
        self.diagram.insert_glyph(glyph);
        self.record_source(&id, uri);
        self.assign_location(entity, &id);
        if entity.is_complex() {
            self.complex_content(entity, &id);
        }
        self.use_sites.insert(key, id.clone());
        Some(id)
    }

    /// Whether an entity can be linked to as a controller: it exists and either
    /// already has a glyph or is drawn per use site.
    pub(crate) fn is_renderable(&self, uri: &str) -> bool {
        match self.model.entity(uri) {
            Some(entity) => {
                self.entity_glyphs.contains_key(uri) || self.converter.is_ubique(entity)
            }
            None => false,
        }
    }

    fn glyph_basics(&self, entity: &PhysicalEntity, id: String) -> Glyph {
        let mut glyph = Glyph::new(id, glyph_class(entity.kind)).with_label(resolve_label(entity));
        glyph.clone_marker = self.converter.is_ubique(entity);

        if let Some(text) = molecule_type(entity.kind) {
            glyph.annotations.push(Annotation::UnitOfInformation {
                text: text.to_string(),
            });
        }
        self.push_states(&entity.features, false, &mut glyph.annotations);
        self.push_states(&entity.not_features, true, &mut glyph.annotations);
        glyph
    }

    /// Modification and fragment features become state variables; absent ones get a `!`.
    fn push_states(&self, features: &[EntityFeature], negated: bool, out: &mut Vec<Annotation>) {
        for feature in features {
            if matches!(feature, EntityFeature::Binding { .. }) {
                continue;
            }
            let Some(state) = self.converter.features.state_variable(feature) else {
                continue;
            };
            let state = match state {
                Annotation::StateVariable { value, variable } if negated => {
                    Annotation::StateVariable {
                        value: format!("!{value}"),
                        variable,
                    }
                }
                other => other,
            };
            out.push(state);
        }
    }

    fn assign_location(&mut self, entity: &PhysicalEntity, glyph_id: &str) {
        let compartment = self
            .compartments
            .resolve(entity, &mut self.diagram, &mut self.ids);
        if let Some(glyph) = self.diagram.glyph_mut(glyph_id) {
            glyph.compartment = compartment;
        }
    }

    fn complex_content(&mut self, complex: &PhysicalEntity, container: &str) {
        if self.config().flatten_complex_content {
            let mut path = vec![complex.uri.clone()];
            for member in self.flattened_members(complex, &mut path) {
                self.complex_member(member, container);
            }
        } else {
            let mut path = vec![complex.uri.clone()];
            self.nested_members(complex, container, &mut path);
        }
    }

    /// Members to draw inside a flattened complex. Inner complexes with any simple
    /// descendant dissolve into their members; the rest stay as opaque members.
    pub(crate) fn flattened_members(
        &mut self,
        complex: &PhysicalEntity,
        path: &mut Vec<String>,
    ) -> Vec<&'a PhysicalEntity> {
        let model = self.model;
        let mut members: Vec<&'a PhysicalEntity> = Vec::new();
        let mut seen = HashSet::new();

        for uri in &complex.components {
            let Some(member) = self.component(complex, uri, path) else {
                continue;
            };
            if member.is_complex() && has_simple_descendant(model, member, &mut HashSet::new()) {
                path.push(member.uri.clone());
                let inner = self.flattened_members(member, path);
                path.pop();
                for m in inner {
                    if seen.insert(m.uri.as_str()) {
                        members.push(m);
                    }
                }
            } else if seen.insert(member.uri.as_str()) {
                members.push(member);
            }
        }
        members
    }

    /// Non-flattened mode: inner complexes become nested complex glyphs.
    fn nested_members(&mut self, complex: &PhysicalEntity, container: &str, path: &mut Vec<String>) {
        for uri in &complex.components {
            let Some(member) = self.component(complex, uri, path) else {
                continue;
            };
            let inner = self.complex_member(member, container);
            if member.is_complex() {
                path.push(member.uri.clone());
                self.nested_members(member, &inner, path);
                path.pop();
            }
        }
    }

    /// Resolve a component URI, reporting unknown members and self-containing complexes.
    fn component(
        &mut self,
        complex: &PhysicalEntity,
        uri: &str,
        path: &[String],
    ) -> Option<&'a PhysicalEntity> {
        let model = self.model;
        let Some(member) = model.entity(uri) else {
            self.report(Error::structural(
                &complex.uri,
                format!("component {uri} does not exist"),
            ));
            return None;
        };
        if path.iter().any(|p| p == uri) {
            self.report(Error::structural(
                &complex.uri,
                format!("complex contains itself through {uri}"),
            ));
            return None;
        }
        Some(member)
    }

    /// A member glyph lives only inside its container, so its id is scoped to it.
    fn complex_member(&mut self, member: &PhysicalEntity, container: &str) -> String {
        let base = self.ids.id_for(&member.uri);
        let id = self.ids.claim(&use_site_id(&base, container));
        let glyph = self.glyph_basics(member, id.clone());
        self.diagram.insert_glyph(glyph);
        self.diagram.attach_child(container, &id);
        self.record_source(&id, &member.uri);
        id
    }
}

/// True when some component, at any depth, is not a complex.
pub(crate) fn has_simple_descendant(
    model: &crate::model::Model,
    complex: &PhysicalEntity,
    visited: &mut HashSet<String>,
) -> bool {
    if !visited.insert(complex.uri.clone()) {
        return false;
    }
    complex
        .components
        .iter()
        .filter_map(|uri| model.entity(uri))
        .any(|member| !member.is_complex() || has_simple_descendant(model, member, visited))
}
