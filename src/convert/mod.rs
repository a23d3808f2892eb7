//! Pathway model to SBGN PD diagram conversion.
//!
//! A conversion runs in three passes over an immutable [`Model`]:
//! entity glyphs first, then processes with their controls, then the final
//! root set and the optional layout. All lookup maps live in a [`Run`] that
//! is created per call, so one [`Converter`] can serve any number of models.

mod control;
mod nodes;
mod process;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::compartment::CompartmentResolver;
use crate::config::ConverterConfig;
use crate::diagram::Diagram;
use crate::error::{Error, Result};
use crate::feature::{CommonFeatureDecorator, FeatureDecorator};
use crate::ids::IdRegistry;
use crate::layout::{apply_placement, GridLayout, LayoutEngine, LayoutGraph};
use crate::model::{ConversionDirection, InteractionKind, Model, PhysicalEntity};
use crate::sbgnml;
use crate::ubique::UbiqueDetector;

pub use control::classify_control_type;
pub use process::format_coefficient;

/// Diagram glyph id to the URIs of the source objects it was drawn for.
pub type SourceMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug)]
pub enum LayoutOutcome {
    Disabled,
    Applied,
    /// Layout was wanted but did not run; the diagram has no coordinates.
    Skipped(Error),
}

#[derive(Debug)]
pub struct ConversionOutput {
    pub diagram: Diagram,
    pub source_map: SourceMap,
    /// Non-fatal problems found in the source model; the offending parts were skipped.
    pub issues: Vec<Error>,
    pub layout: LayoutOutcome,
}

pub struct Converter {
    config: ConverterConfig,
    ubiques: Option<Box<dyn UbiqueDetector>>,
    features: Box<dyn FeatureDecorator>,
    layout: Box<dyn LayoutEngine>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            ubiques: None,
            features: Box::new(CommonFeatureDecorator),
            layout: Box::new(GridLayout::default()),
        }
    }

    pub fn with_ubique_detector(mut self, detector: impl UbiqueDetector + 'static) -> Self {
        self.ubiques = Some(Box::new(detector));
        self
    }

    pub fn with_feature_decorator(mut self, decorator: impl FeatureDecorator + 'static) -> Self {
        self.features = Box::new(decorator);
        self
    }

    pub fn with_layout(mut self, engine: impl LayoutEngine + 'static) -> Self {
        self.layout = Box::new(engine);
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub(crate) fn is_ubique(&self, entity: &PhysicalEntity) -> bool {
        self.ubiques
            .as_ref()
            .is_some_and(|detector| detector.is_ubique(entity))
    }

    /// Convert the model into a diagram graph. Never fails: problems in the model
    /// are reported in [`ConversionOutput::issues`].
    pub fn convert(&self, model: &Model) -> ConversionOutput {
        let mut run = Run::new(self, model);

        for entity in model.physical_entities() {
            if run.needs_glyph(entity) {
                run.entity_glyph(entity);
            }
        }

        run.check_controls();

        for interaction in model.interactions() {
            if interaction.participants().is_empty() {
                continue;
            }
            match &interaction.kind {
                InteractionKind::Conversion(conv) => {
                    for direction in self.process_directions(conv.direction) {
                        run.build_conversion(interaction, conv, direction);
                    }
                }
                InteractionKind::TemplateReaction(tr) => {
                    run.build_template_reaction(interaction, tr);
                }
                InteractionKind::Basic { participants } => {
                    run.build_basic_process(interaction, participants);
                }
                InteractionKind::Control(ctrl) => {
                    // Controls that regulate nothing but are themselves regulated are
                    // still drawn; everything else is drawn from its target process.
                    if ctrl.controlled.is_none() && !run.index.controls_of(&interaction.uri).is_empty()
                    {
                        run.compile_controller(&interaction.uri, &mut Vec::new());
                    }
                }
            }
        }

        run.assemble()
    }

    /// Convert and serialize to SBGN-ML in one step.
    pub fn write_sbgnml(&self, model: &Model) -> Result<String> {
        let output = self.convert(model);
        sbgnml::write_sbgnml(&output.diagram)
    }

    fn process_directions(&self, direction: Option<ConversionDirection>) -> Vec<ConversionDirection> {
        match direction {
            None | Some(ConversionDirection::LeftToRight) => vec![ConversionDirection::LeftToRight],
            Some(ConversionDirection::RightToLeft) => vec![ConversionDirection::RightToLeft],
            Some(ConversionDirection::Reversible) if self.config.two_glyphs_for_reversible => vec![
                ConversionDirection::LeftToRight,
                ConversionDirection::RightToLeft,
            ],
            Some(ConversionDirection::Reversible) => vec![ConversionDirection::Reversible],
        }
    }
}

/// Reverse references derived once per run from forward links in the model.
#[derive(Debug, Default)]
pub(crate) struct ModelIndex {
    controls_of: HashMap<String, Vec<String>>,
    participants: HashSet<String>,
    components: HashSet<String>,
}

impl ModelIndex {
    fn build(model: &Model) -> Self {
        let mut index = ModelIndex::default();
        for interaction in model.interactions() {
            for participant in interaction.participants() {
                index.participants.insert(participant.to_string());
            }
            if let Some(target) = interaction.as_control().and_then(|c| c.controlled.as_ref()) {
                index
                    .controls_of
                    .entry(target.clone())
                    .or_default()
                    .push(interaction.uri.clone());
            }
        }
        for entity in model.physical_entities() {
            if entity.is_complex() {
                index.components.extend(entity.components.iter().cloned());
            }
        }
        index
    }

    pub(crate) fn controls_of(&self, uri: &str) -> &[String] {
        self.controls_of.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }

    fn participates(&self, uri: &str) -> bool {
        self.participants.contains(uri)
    }

    fn is_component(&self, uri: &str) -> bool {
        self.components.contains(uri)
    }
}

/// Mutable state of a single conversion.
pub(crate) struct Run<'a> {
    converter: &'a Converter,
    model: &'a Model,
    index: ModelIndex,
    ids: IdRegistry,
    diagram: Diagram,
    compartments: CompartmentResolver,
    /// Entity URI to its shared glyph id.
    entity_glyphs: HashMap<String, String>,
    /// (entity URI, use context) to the glyph drawn for that use of a ubique.
    use_sites: HashMap<(String, String), String>,
    /// Operand key to AND/NOT glyph id.
    operators: HashMap<String, String>,
    source_map: SourceMap,
    issues: Vec<Error>,
}

impl<'a> Run<'a> {
    fn new(converter: &'a Converter, model: &'a Model) -> Self {
        Self {
            converter,
            model,
            index: ModelIndex::build(model),
            ids: IdRegistry::new(),
            diagram: Diagram::new(),
            compartments: CompartmentResolver::new(),
            entity_glyphs: HashMap::new(),
            use_sites: HashMap::new(),
            operators: HashMap::new(),
            source_map: SourceMap::new(),
            issues: Vec::new(),
        }
    }

    fn config(&self) -> &ConverterConfig {
        &self.converter.config
    }

    fn record_source(&mut self, glyph_id: &str, uri: &str) {
        self.source_map
            .entry(glyph_id.to_string())
            .or_default()
            .insert(uri.to_string());
    }

    /// Record a problem once; the same control can be compiled for several processes.
    fn report(&mut self, issue: Error) {
        if self.issues.contains(&issue) {
            return;
        }
        tracing::warn!(%issue, "skipping part of the model");
        self.issues.push(issue);
    }

    /// Flag controls whose controlled process is not in the model.
    fn check_controls(&mut self) {
        let model = self.model;
        for (interaction, control) in model.controls() {
            let Some(target) = control.controlled.as_deref() else {
                continue;
            };
            if model.interaction(target).is_none() && model.pathway(target).is_none() {
                self.report(Error::structural(
                    &interaction.uri,
                    format!("controlled process {target} does not exist"),
                ));
            }
        }
    }

    /// Pass 3: root set and optional layout.
    fn assemble(mut self) -> ConversionOutput {
        let mut nested = HashSet::new();
        for glyph in self.diagram.glyphs() {
            collect_descendants(&self.diagram, &glyph.id, &mut nested);
        }
        let roots: Vec<String> = self
            .diagram
            .glyphs()
            .map(|glyph| glyph.id.clone())
            .filter(|id| !nested.contains(id))
            .collect();
        self.diagram.set_roots(roots);

        tracing::debug!(
            glyphs = self.diagram.glyph_count(),
            arcs = self.diagram.arc_count(),
            compartments = self.compartments.len(),
            roots = self.diagram.roots().len(),
            "assembled diagram"
        );

        let layout = self.run_layout();

        ConversionOutput {
            diagram: self.diagram,
            source_map: self.source_map,
            issues: self.issues,
            layout,
        }
    }

    fn run_layout(&mut self) -> LayoutOutcome {
        let config = self.config();
        if !config.do_layout {
            tracing::debug!("layout disabled");
            return LayoutOutcome::Disabled;
        }
        let count = self.diagram.glyph_count();
        let reason = if count >= config.max_layout_nodes {
            Some(format!(
                "{count} glyphs reach the layout ceiling of {}",
                config.max_layout_nodes
            ))
        } else if self.diagram.arc_count() == 0 {
            Some("diagram has no arcs".to_string())
        } else {
            None
        };
        if let Some(reason) = reason {
            tracing::warn!(%reason, "no layout");
            return LayoutOutcome::Skipped(Error::LayoutUnavailable { reason });
        }

        let graph = LayoutGraph::from_diagram(&self.diagram);
        match self.converter.layout.layout(&graph) {
            Ok(placement) => {
                apply_placement(&mut self.diagram, &placement);
                LayoutOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(error = %err, "layout engine failed");
                let reason = match err {
                    Error::LayoutUnavailable { reason } => reason,
                    other => other.to_string(),
                };
                LayoutOutcome::Skipped(Error::LayoutUnavailable { reason })
            }
        }
    }
}

fn collect_descendants(diagram: &Diagram, id: &str, out: &mut HashSet<String>) {
    let Some(glyph) = diagram.glyph(id) else {
        return;
    };
    for child in &glyph.children {
        if out.insert(child.clone()) {
            collect_descendants(diagram, child, out);
        }
    }
}
