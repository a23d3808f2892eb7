//! In-memory pathway model consumed by the converter.
//!
//! The model is a read-only graph of physical entities and interactions keyed by URI.
//! References between objects are URIs; nothing here holds back-references, so the
//! converter derives whatever reverse lookups it needs once per run.

use std::io::Read;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    SmallMolecule,
    Protein,
    Dna,
    DnaRegion,
    Rna,
    RnaRegion,
    NucleicAcid,
    Complex,
    #[default]
    Unspecified,
}

impl EntityKind {
    pub fn is_complex(self) -> bool {
        matches!(self, EntityKind::Complex)
    }

    pub fn is_nucleic_acid(self) -> bool {
        matches!(
            self,
            EntityKind::Dna
                | EntityKind::DnaRegion
                | EntityKind::Rna
                | EntityKind::RnaRegion
                | EntityKind::NucleicAcid
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Xref {
    pub db: Option<String>,
    pub id: Option<String>,
}

impl Xref {
    pub fn new(db: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            db: Some(db.into()),
            id: Some(id.into()),
        }
    }
}

/// Shared description of a molecule (sequence or chemical record) that several
/// physical entities can point at.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityReference {
    pub display_name: Option<String>,
    pub standard_name: Option<String>,
    pub names: Vec<String>,
    pub xrefs: Vec<Xref>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityFeature {
    Modification {
        #[serde(default)]
        term: Option<String>,
        #[serde(default)]
        site: Option<String>,
    },
    Fragment {
        #[serde(default)]
        site: Option<String>,
    },
    Binding {
        #[serde(default)]
        partner: Option<String>,
    },
}

impl EntityFeature {
    pub fn modification(term: impl Into<String>, site: Option<&str>) -> Self {
        EntityFeature::Modification {
            term: Some(term.into()),
            site: site.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stoichiometry {
    pub entity: String,
    pub coefficient: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalEntity {
    pub uri: String,
    pub kind: EntityKind,
    pub display_name: Option<String>,
    pub standard_name: Option<String>,
    pub names: Vec<String>,
    pub xrefs: Vec<Xref>,
    pub entity_reference: Option<EntityReference>,
    pub cellular_location: Vec<String>,
    pub features: Vec<EntityFeature>,
    pub not_features: Vec<EntityFeature>,
    /// Complex components (URIs). Ignored for non-complex kinds.
    pub components: Vec<String>,
}

impl PhysicalEntity {
    pub fn new(uri: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            uri: uri.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_xref(mut self, xref: Xref) -> Self {
        self.xrefs.push(xref);
        self
    }

    pub fn with_reference(mut self, reference: EntityReference) -> Self {
        self.entity_reference = Some(reference);
        self
    }

    pub fn located_in(mut self, term: impl Into<String>) -> Self {
        self.cellular_location.push(term.into());
        self
    }

    pub fn with_feature(mut self, feature: EntityFeature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn without_feature(mut self, feature: EntityFeature) -> Self {
        self.not_features.push(feature);
        self
    }

    pub fn with_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components.extend(components.into_iter().map(Into::into));
        self
    }

    pub fn is_complex(&self) -> bool {
        self.kind.is_complex()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionDirection {
    LeftToRight,
    RightToLeft,
    Reversible,
}

impl ConversionDirection {
    /// Suffix used to tell apart the process glyphs of one conversion.
    pub fn tag(self) -> &'static str {
        match self {
            ConversionDirection::LeftToRight => "LEFTTORIGHT",
            ConversionDirection::RightToLeft => "RIGHTTOLEFT",
            ConversionDirection::Reversible => "REVERSIBLE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalysisDirection {
    LeftToRight,
    RightToLeft,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlType {
    Activation,
    ActivationAllosteric,
    ActivationNonallosteric,
    ActivationUnkmech,
    Inhibition,
    InhibitionAllosteric,
    InhibitionOther,
    InhibitionUnkmech,
    InhibitionCompetitive,
    InhibitionIrreversible,
    InhibitionUncompetitive,
    InhibitionNoncompetitive,
}

impl ControlType {
    pub fn is_inhibition(self) -> bool {
        matches!(
            self,
            ControlType::Inhibition
                | ControlType::InhibitionAllosteric
                | ControlType::InhibitionOther
                | ControlType::InhibitionUnkmech
                | ControlType::InhibitionCompetitive
                | ControlType::InhibitionIrreversible
                | ControlType::InhibitionUncompetitive
                | ControlType::InhibitionNoncompetitive
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversion {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub direction: Option<ConversionDirection>,
    pub stoichiometry: Vec<Stoichiometry>,
}

impl Conversion {
    /// Coefficient recorded for the participant, looked up by entity URI.
    pub fn coefficient_of(&self, entity: &str) -> Option<f64> {
        self.stoichiometry
            .iter()
            .find(|stoic| stoic.entity == entity)
            .map(|stoic| stoic.coefficient)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateReaction {
    pub products: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlKind {
    #[default]
    Control,
    Catalysis {
        #[serde(default)]
        cofactors: Vec<String>,
        #[serde(default)]
        direction: Option<CatalysisDirection>,
    },
    Modulation,
    TemplateReactionRegulation,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Control {
    /// Physical entities, pathways or other controls.
    pub controllers: Vec<String>,
    pub controlled: Option<String>,
    pub control_type: Option<ControlType>,
    pub kind: ControlKind,
}

impl Control {
    pub fn is_catalysis(&self) -> bool {
        matches!(self.kind, ControlKind::Catalysis { .. })
    }

    pub fn cofactors(&self) -> &[String] {
        match &self.kind {
            ControlKind::Catalysis { cofactors, .. } => cofactors,
            _ => &[],
        }
    }

    pub fn catalysis_direction(&self) -> Option<CatalysisDirection> {
        match &self.kind {
            ControlKind::Catalysis { direction, .. } => *direction,
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    Conversion(Conversion),
    TemplateReaction(TemplateReaction),
    Control(Control),
    /// Molecular or otherwise unclassified interaction with plain participants.
    Basic {
        #[serde(default)]
        participants: Vec<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub uri: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub kind: InteractionKind,
}

impl Interaction {
    pub fn new(uri: impl Into<String>, kind: InteractionKind) -> Self {
        Self {
            uri: uri.into(),
            display_name: None,
            kind,
        }
    }

    pub fn conversion(uri: impl Into<String>, conversion: Conversion) -> Self {
        Self::new(uri, InteractionKind::Conversion(conversion))
    }

    pub fn template_reaction(uri: impl Into<String>, reaction: TemplateReaction) -> Self {
        Self::new(uri, InteractionKind::TemplateReaction(reaction))
    }

    pub fn control(uri: impl Into<String>, control: Control) -> Self {
        Self::new(uri, InteractionKind::Control(control))
    }

    /// All participant URIs, including controllers and cofactors of controls.
    pub fn participants(&self) -> Vec<&str> {
        match &self.kind {
            InteractionKind::Conversion(conv) => conv
                .left
                .iter()
                .chain(conv.right.iter())
                .map(String::as_str)
                .collect(),
            InteractionKind::TemplateReaction(tr) => {
                tr.products.iter().map(String::as_str).collect()
            }
            InteractionKind::Control(ctrl) => ctrl
                .controllers
                .iter()
                .chain(ctrl.cofactors().iter())
                .map(String::as_str)
                .collect(),
            InteractionKind::Basic { participants } => {
                participants.iter().map(String::as_str).collect()
            }
        }
    }

    pub fn as_control(&self) -> Option<&Control> {
        match &self.kind {
            InteractionKind::Control(ctrl) => Some(ctrl),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pathway {
    pub uri: String,
    pub display_name: Option<String>,
    pub components: Vec<String>,
}

/// On-disk JSON shape: flat lists, order preserved.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ModelFile {
    physical_entities: Vec<PhysicalEntity>,
    interactions: Vec<Interaction>,
    pathways: Vec<Pathway>,
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    entities: IndexMap<String, PhysicalEntity>,
    interactions: IndexMap<String, Interaction>,
    pathways: IndexMap<String, Pathway>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json).map_err(|err| Error::ModelLoad {
            message: err.to_string(),
        })?;
        Ok(Self::from_file(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let file: ModelFile = serde_json::from_reader(reader).map_err(|err| Error::ModelLoad {
            message: err.to_string(),
        })?;
        Ok(Self::from_file(file))
    }

    pub fn to_json_string(&self) -> Result<String> {
        let file = ModelFile {
            physical_entities: self.entities.values().cloned().collect(),
            interactions: self.interactions.values().cloned().collect(),
            pathways: self.pathways.values().cloned().collect(),
        };
        serde_json::to_string_pretty(&file).map_err(|err| Error::ModelLoad {
            message: err.to_string(),
        })
    }

    fn from_file(file: ModelFile) -> Self {
        let mut model = Model::new();
        for entity in file.physical_entities {
            model.add_entity(entity);
        }
        for interaction in file.interactions {
            model.add_interaction(interaction);
        }
        for pathway in file.pathways {
            model.add_pathway(pathway);
        }
        model
    }

    pub fn add_entity(&mut self, entity: PhysicalEntity) -> &mut Self {
        self.entities.insert(entity.uri.clone(), entity);
        self
    }

    pub fn add_interaction(&mut self, interaction: Interaction) -> &mut Self {
        self.interactions.insert(interaction.uri.clone(), interaction);
        self
    }

    pub fn add_pathway(&mut self, pathway: Pathway) -> &mut Self {
        self.pathways.insert(pathway.uri.clone(), pathway);
        self
    }

    pub fn entity(&self, uri: &str) -> Option<&PhysicalEntity> {
        self.entities.get(uri)
    }

    pub fn interaction(&self, uri: &str) -> Option<&Interaction> {
        self.interactions.get(uri)
    }

    pub fn pathway(&self, uri: &str) -> Option<&Pathway> {
        self.pathways.get(uri)
    }

    pub fn control(&self, uri: &str) -> Option<&Control> {
        self.interactions.get(uri).and_then(Interaction::as_control)
    }

    pub fn physical_entities(&self) -> impl Iterator<Item = &PhysicalEntity> {
        self.entities.values()
    }

    pub fn interactions(&self) -> impl Iterator<Item = &Interaction> {
        self.interactions.values()
    }

    pub fn conversions(&self) -> impl Iterator<Item = (&Interaction, &Conversion)> {
        self.interactions.values().filter_map(|i| match &i.kind {
            InteractionKind::Conversion(conv) => Some((i, conv)),
            _ => None,
        })
    }

    pub fn template_reactions(&self) -> impl Iterator<Item = (&Interaction, &TemplateReaction)> {
        self.interactions.values().filter_map(|i| match &i.kind {
            InteractionKind::TemplateReaction(tr) => Some((i, tr)),
            _ => None,
        })
    }

    pub fn controls(&self) -> impl Iterator<Item = (&Interaction, &Control)> {
        self.interactions
            .values()
            .filter_map(|i| i.as_control().map(|ctrl| (i, ctrl)))
    }

    pub fn pathways(&self) -> impl Iterator<Item = &Pathway> {
        self.pathways.values()
    }
}
