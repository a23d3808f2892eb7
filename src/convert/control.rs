use crate::diagram::{ArcClass, Endpoint, Glyph, GlyphClass};
use crate::error::Error;
use crate::ids::short_hash;
use crate::model::Control;

use super::Run;

/// Arc class for the regulation a control exerts on its target.
pub fn classify_control_type(control: &Control) -> ArcClass {
    if control.is_catalysis() {
        return ArcClass::Catalysis;
    }
    match control.control_type {
        Some(control_type) if control_type.is_inhibition() => ArcClass::Inhibition,
        _ => ArcClass::Stimulation,
    }
}

impl Run<'_> {
    /// Compile a control into the glyph that feeds its regulatory arc.
    ///
    /// - nothing drawable: `None`
    /// - a single controller and no modulating controls: that controller's glyph
    /// - otherwise an AND over the controllers, each modulating control (negated when
    ///   it inhibits) and the cofactors of a catalysis
    ///
    /// `stack` holds the controls being compiled; re-entering one is a cycle.
    pub(crate) fn compile_controller(&mut self, uri: &str, stack: &mut Vec<String>) -> Option<String> {
        let model = self.model;
        let control = model.control(uri)?;
        if stack.iter().any(|s| s == uri) {
            self.report(Error::structural(uri, "control regulates itself through a cycle"));
            return None;
        }
        stack.push(uri.to_string());

        let context = self.ids.id_for(uri);
        let controllers: Vec<&str> = control
            .controllers
            .iter()
            .map(String::as_str)
            .filter(|c| self.is_renderable(c))
            .collect();
        let modulators = self.modulators(uri, control);

        let compiled = if controllers.is_empty() && modulators.is_empty() {
            None
        } else if controllers.len() == 1 && modulators.is_empty() {
            self.glyph_to_link(controllers[0], &context)
        } else {
            let mut operands = Vec::new();
            if let Some(group) = self.entity_group(&controllers, &context) {
                operands.push(group);
            }
            for modulator in &modulators {
                let Some(child) = self.compile_controller(modulator, stack) else {
                    continue;
                };
                let inhibits = model
                    .control(modulator)
                    .is_some_and(|m| classify_control_type(m) == ArcClass::Inhibition);
                operands.push(if inhibits { self.not_operator(&child) } else { child });
            }
            if control.is_catalysis() {
                let cofactors: Vec<&str> = control
                    .cofactors()
                    .iter()
                    .map(String::as_str)
                    .filter(|c| self.is_renderable(c))
                    .collect();
                if let Some(group) = self.entity_group(&cofactors, &context) {
                    operands.push(group);
                }
            }
            match operands.len() {
                0 => None,
                1 => operands.pop(),
                _ => Some(self.and_operator(operands)),
            }
        };

        stack.pop();
        compiled
    }

    /// Controls acting on this control, whether they target it or are listed as its controllers.
    fn modulators(&self, uri: &str, control: &Control) -> Vec<String> {
        let mut modulators: Vec<String> = self.index.controls_of(uri).to_vec();
        for controller in &control.controllers {
            if self.model.control(controller).is_some() && !modulators.contains(controller) {
                modulators.push(controller.clone());
            }
        }
        modulators
    }

    /// One glyph standing for a set of entities: the entity itself, or an AND over them.
    fn entity_group(&mut self, uris: &[&str], context: &str) -> Option<String> {
        let glyphs: Vec<String> = uris
            .iter()
            .filter_map(|uri| self.glyph_to_link(uri, context))
            .collect();
        match glyphs.len() {
            0 => None,
            1 => glyphs.into_iter().next(),
            _ => Some(self.and_operator(glyphs)),
        }
    }

    /// AND glyph over `operands`, shared by every operand set with the same members.
    pub(crate) fn and_operator(&mut self, mut operands: Vec<String>) -> String {
        operands.sort();
        operands.dedup();
        if operands.len() == 1 {
            return operands.remove(0);
        }
        let key = operands.join("-AND-");
        let id = self.operator(&key, "AND", GlyphClass::And);
        for operand in operands {
            self.connect(
                ArcClass::LogicArc,
                Endpoint::Glyph(operand),
                Endpoint::Glyph(id.clone()),
                None,
            );
        }
        id
    }

    pub(crate) fn not_operator(&mut self, operand: &str) -> String {
        let key = format!("NOT-{operand}");
        let id = self.operator(&key, "NOT", GlyphClass::Not);
        self.connect(
            ArcClass::LogicArc,
            Endpoint::Glyph(operand.to_string()),
            Endpoint::Glyph(id.clone()),
            None,
        );
        id
    }

    fn operator(&mut self, key: &str, prefix: &str, class: GlyphClass) -> String {
        if let Some(id) = self.operators.get(key) {
            return id.clone();
        }
        let id = self.ids.claim(&format!("{prefix}_{}", short_hash(key)));
        self.diagram.insert_glyph(Glyph::new(id.clone(), class));
        self.operators.insert(key.to_string(), id.clone());
        id
    }
}
