use crate::diagram::{Arc, ArcClass, Endpoint, Glyph, GlyphClass, Port, PortRole};
use crate::ids::use_site_id;
use crate::model::{CatalysisDirection, Conversion, ConversionDirection, Interaction, TemplateReaction};

use super::Run;

/// Cardinality text for a stoichiometric coefficient: at most two decimals without
/// trailing zeros. Nothing for values that are not positive or that print as 1;
/// positive values too small to print read `0.01`.
pub fn format_coefficient(coefficient: f64) -> Option<String> {
    if !coefficient.is_finite() || coefficient <= 0.0 {
        return None;
    }
    let text = format!("{coefficient:.2}");
    match text.trim_end_matches('0').trim_end_matches('.') {
        "1" => None,
        "0" => Some("0.01".to_string()),
        text => Some(text.to_string()),
    }
}

/// A directed catalysis only applies to the process drawn in its direction.
fn contradicts(catalysis: Option<CatalysisDirection>, process: Option<ConversionDirection>) -> bool {
    matches!(
        (catalysis, process),
        (
            Some(CatalysisDirection::LeftToRight),
            Some(ConversionDirection::RightToLeft)
        ) | (
            Some(CatalysisDirection::RightToLeft),
            Some(ConversionDirection::LeftToRight)
        )
    )
}

impl Run<'_> {
    /// One process glyph for `conv` drawn in `direction`.
    pub(crate) fn build_conversion(
        &mut self,
        interaction: &Interaction,
        conv: &Conversion,
        direction: ConversionDirection,
    ) -> String {
        let base = self.ids.id_for(&interaction.uri);
        let process = self.ids.claim(&format!("{base}_{}", direction.tag()));
        let (input_port, output_port) = self.new_process(&process);

        let (input, output) = match direction {
            ConversionDirection::RightToLeft => (&conv.right, &conv.left),
            _ => (&conv.left, &conv.right),
        };
        let input_context = format!("{process}:in");
        let output_context = format!("{process}:out");

        for uri in input {
            let Some(glyph) = self.glyph_to_link(uri, &input_context) else {
                continue;
            };
            let cardinality = conv.coefficient_of(uri).and_then(format_coefficient);
            if direction == ConversionDirection::Reversible {
                // either side can be the product of an undirected process
                self.connect(
                    ArcClass::Production,
                    Endpoint::Port(input_port.clone()),
                    Endpoint::Glyph(glyph),
                    cardinality,
                );
            } else {
                self.connect(
                    ArcClass::Consumption,
                    Endpoint::Glyph(glyph),
                    Endpoint::Port(input_port.clone()),
                    cardinality,
                );
            }
        }

        for uri in output {
            let Some(glyph) = self.glyph_to_link(uri, &output_context) else {
                continue;
            };
            let cardinality = conv.coefficient_of(uri).and_then(format_coefficient);
            self.connect(
                ArcClass::Production,
                Endpoint::Port(output_port.clone()),
                Endpoint::Glyph(glyph),
                cardinality,
            );
        }

        self.attach_controls(&interaction.uri, &process, Some(direction));
        self.record_source(&process, &interaction.uri);
        process
    }

    /// Template reactions have no modelled input; a source-and-sink stands in for it.
    pub(crate) fn build_template_reaction(
        &mut self,
        interaction: &Interaction,
        reaction: &TemplateReaction,
    ) -> String {
        let process = self.ids.id_for(&interaction.uri);
        let (input_port, output_port) = self.new_process(&process);

        let sink_id = self.ids.claim(&use_site_id("unknown-template", &process));
        self.diagram
            .insert_glyph(Glyph::new(sink_id.clone(), GlyphClass::SourceAndSink));
        self.connect(
            ArcClass::Consumption,
            Endpoint::Glyph(sink_id),
            Endpoint::Port(input_port),
            None,
        );

        let context = format!("{process}:out");
        for uri in &reaction.products {
            if let Some(glyph) = self.glyph_to_link(uri, &context) {
                self.connect(
                    ArcClass::Production,
                    Endpoint::Port(output_port.clone()),
                    Endpoint::Glyph(glyph),
                    None,
                );
            }
        }

        self.attach_controls(&interaction.uri, &process, None);
        self.record_source(&process, &interaction.uri);
        process
    }

    /// Molecular and unclassified interactions: every participant is consumed.
    pub(crate) fn build_basic_process(
        &mut self,
        interaction: &Interaction,
        participants: &[String],
    ) -> String {
        let process = self.ids.id_for(&interaction.uri);
        let (input_port, _) = self.new_process(&process);

        let context = format!("{process}:in");
        for uri in participants {
            if let Some(glyph) = self.glyph_to_link(uri, &context) {
                self.connect(
                    ArcClass::Consumption,
                    Endpoint::Glyph(glyph),
                    Endpoint::Port(input_port.clone()),
                    None,
                );
            }
        }

        self.attach_controls(&interaction.uri, &process, None);
        self.record_source(&process, &interaction.uri);
        process
    }

    /// Process glyph with its input and output ports; `id` must already be reserved.
    /// Returns the port ids.
    fn new_process(&mut self, id: &str) -> (String, String) {
        let input = self.ids.claim(&format!("INP_{id}"));
        let output = self.ids.claim(&format!("OUT_{id}"));
        let mut glyph = Glyph::new(id, GlyphClass::Process);
        glyph.ports = vec![
            Port {
                id: input.clone(),
                role: PortRole::Input,
                position: None,
            },
            Port {
                id: output.clone(),
                role: PortRole::Output,
                position: None,
            },
        ];
        self.diagram.insert_glyph(glyph);
        (input, output)
    }

    /// Draw every control of `target_uri` into the glyph `target`.
    pub(crate) fn attach_controls(
        &mut self,
        target_uri: &str,
        target: &str,
        direction: Option<ConversionDirection>,
    ) {
        let model = self.model;
        let controls = self.index.controls_of(target_uri).to_vec();
        for control_uri in controls {
            let Some(control) = model.control(&control_uri) else {
                continue;
            };
            if contradicts(control.catalysis_direction(), direction) {
                tracing::debug!(
                    control = %control_uri,
                    process = %target,
                    "catalysis direction does not match the process"
                );
                continue;
            }
            match self.compile_controller(&control_uri, &mut Vec::new()) {
                Some(root) => {
                    let class = super::classify_control_type(control);
                    self.connect(class, Endpoint::Glyph(root), Endpoint::Glyph(target.to_string()), None);
                }
                None => {
                    tracing::debug!(control = %control_uri, "control has nothing to draw");
                }
            }
        }
    }

    pub(crate) fn connect(
        &mut self,
        class: ArcClass,
        source: Endpoint,
        target: Endpoint,
        cardinality: Option<String>,
    ) {
        let mut arc = Arc::new(class, source, target);
        arc.cardinality = cardinality;
        self.diagram.insert_arc(arc);
    }
}
