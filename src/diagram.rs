//! SBGN process-description diagram graph produced by the converter.

use std::fmt;

use indexmap::IndexMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlyphClass {
    UnspecifiedEntity,
    SimpleChemical,
    Macromolecule,
    NucleicAcidFeature,
    Complex,
    Process,
    And,
    Not,
    SourceAndSink,
    Compartment,
    Cardinality,
    StateVariable,
    UnitOfInformation,
}

impl GlyphClass {
    pub fn as_str(self) -> &'static str {
        match self {
            GlyphClass::UnspecifiedEntity => "unspecified entity",
            GlyphClass::SimpleChemical => "simple chemical",
            GlyphClass::Macromolecule => "macromolecule",
            GlyphClass::NucleicAcidFeature => "nucleic acid feature",
            GlyphClass::Complex => "complex",
            GlyphClass::Process => "process",
            GlyphClass::And => "and",
            GlyphClass::Not => "not",
            GlyphClass::SourceAndSink => "source and sink",
            GlyphClass::Compartment => "compartment",
            GlyphClass::Cardinality => "cardinality",
            GlyphClass::StateVariable => "state variable",
            GlyphClass::UnitOfInformation => "unit of information",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let class = match name {
            "unspecified entity" => GlyphClass::UnspecifiedEntity,
            "simple chemical" => GlyphClass::SimpleChemical,
            "macromolecule" => GlyphClass::Macromolecule,
            "nucleic acid feature" => GlyphClass::NucleicAcidFeature,
            "complex" => GlyphClass::Complex,
            "process" => GlyphClass::Process,
            "and" => GlyphClass::And,
            "not" => GlyphClass::Not,
            "source and sink" => GlyphClass::SourceAndSink,
            "compartment" => GlyphClass::Compartment,
            "cardinality" => GlyphClass::Cardinality,
            "state variable" => GlyphClass::StateVariable,
            "unit of information" => GlyphClass::UnitOfInformation,
            _ => return None,
        };
        Some(class)
    }
}

impl fmt::Display for GlyphClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArcClass {
    Consumption,
    Production,
    Catalysis,
    Stimulation,
    Inhibition,
    LogicArc,
}

impl ArcClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ArcClass::Consumption => "consumption",
            ArcClass::Production => "production",
            ArcClass::Catalysis => "catalysis",
            ArcClass::Stimulation => "stimulation",
            ArcClass::Inhibition => "inhibition",
            ArcClass::LogicArc => "logic arc",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let class = match name {
            "consumption" => ArcClass::Consumption,
            "production" => ArcClass::Production,
            "catalysis" => ArcClass::Catalysis,
            "stimulation" => ArcClass::Stimulation,
            "inhibition" => ArcClass::Inhibition,
            "logic arc" => ArcClass::LogicArc,
            _ => return None,
        };
        Some(class)
    }

    /// Infix of arc ids, so arcs of different classes between the same glyphs stay apart.
    pub fn id_tag(self) -> &'static str {
        match self {
            ArcClass::Consumption => "CONSUMPTION",
            ArcClass::Production => "PRODUCTION",
            ArcClass::Catalysis => "CATALYSIS",
            ArcClass::Stimulation => "STIMULATION",
            ArcClass::Inhibition => "INHIBITION",
            ArcClass::LogicArc => "LOGIC",
        }
    }
}

impl fmt::Display for ArcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.w / 2.0,
            y: self.y + self.h / 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortRole {
    Input,
    Output,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub id: String,
    pub role: PortRole,
    pub position: Option<Point>,
}

/// Decorations drawn on the border of an entity glyph.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    StateVariable {
        value: String,
        variable: Option<String>,
    },
    UnitOfInformation {
        text: String,
    },
}

impl Annotation {
    pub fn class(&self) -> GlyphClass {
        match self {
            Annotation::StateVariable { .. } => GlyphClass::StateVariable,
            Annotation::UnitOfInformation { .. } => GlyphClass::UnitOfInformation,
        }
    }

    /// Display text; state variables use the `value@variable` form.
    pub fn label(&self) -> String {
        match self {
            Annotation::StateVariable { value, variable } => {
                state_var_label(Some(value.as_str()), variable.as_deref())
            }
            Annotation::UnitOfInformation { text } => text.clone(),
        }
    }
}

/// Build a state variable label in the same format as sbgnStyle (value@variable).
pub fn state_var_label(value: Option<&str>, variable: Option<&str>) -> String {
    match (value, variable) {
        (Some(value), Some(variable)) if !value.is_empty() && !variable.is_empty() => {
            format!("{value}@{variable}")
        }
        (Some(value), _) if !value.is_empty() => value.to_string(),
        (_, Some(variable)) if !variable.is_empty() => variable.to_string(),
        _ => String::new(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub id: String,
    pub class: GlyphClass,
    pub label: Option<String>,
    /// Set on ubiquitous molecules drawn once per use site.
    pub clone_marker: bool,
    /// Id of the compartment glyph this glyph sits in.
    pub compartment: Option<String>,
    /// Id of the glyph this one is nested in (complex membership).
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub ports: Vec<Port>,
    pub bbox: Option<BBox>,
}

impl Glyph {
    pub fn new(id: impl Into<String>, class: GlyphClass) -> Self {
        Self {
            id: id.into(),
            class,
            label: None,
            clone_marker: false,
            compartment: None,
            parent: None,
            children: Vec::new(),
            annotations: Vec::new(),
            ports: Vec::new(),
            bbox: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label_text(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    pub fn port(&self, role: PortRole) -> Option<&Port> {
        self.ports.iter().find(|port| port.role == role)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Glyph(String),
    Port(String),
}

impl Endpoint {
    pub fn id(&self) -> &str {
        match self {
            Endpoint::Glyph(id) | Endpoint::Port(id) => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arc {
    pub id: String,
    pub class: ArcClass,
    pub source: Endpoint,
    pub target: Endpoint,
    /// Formatted stoichiometric coefficient, present only when it is not 1.
    pub cardinality: Option<String>,
    pub start: Option<Point>,
    pub end: Option<Point>,
}

impl Arc {
    pub fn new(class: ArcClass, source: Endpoint, target: Endpoint) -> Self {
        let id = format!("{}--{}--{}", source.id(), class.id_tag(), target.id());
        Self {
            id,
            class,
            source,
            target,
            cardinality: None,
            start: None,
            end: None,
        }
    }
}

/// Glyphs (nested ones included) and arcs of one diagram, plus the top-level order.
#[derive(Clone, Debug, Default)]
pub struct Diagram {
    glyphs: IndexMap<String, Glyph>,
    arcs: IndexMap<String, Arc>,
    roots: Vec<String>,
    port_owners: IndexMap<String, String>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn glyph(&self, id: &str) -> Option<&Glyph> {
        self.glyphs.get(id)
    }

    pub(crate) fn glyph_mut(&mut self, id: &str) -> Option<&mut Glyph> {
        self.glyphs.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.glyphs.contains_key(id)
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values()
    }

    pub(crate) fn glyphs_mut(&mut self) -> impl Iterator<Item = &mut Glyph> {
        self.glyphs.values_mut()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn arc(&self, id: &str) -> Option<&Arc> {
        self.arcs.get(id)
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.values()
    }

    pub(crate) fn arcs_mut(&mut self) -> impl Iterator<Item = &mut Arc> {
        self.arcs.values_mut()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Ids of top-level glyphs, in creation order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn root_glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.roots.iter().filter_map(|id| self.glyphs.get(id))
    }

    pub fn children_of(&self, id: &str) -> Vec<&Glyph> {
        self.glyphs
            .get(id)
            .map(|glyph| {
                glyph
                    .children
                    .iter()
                    .filter_map(|child| self.glyphs.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn glyphs_of_class(&self, class: GlyphClass) -> Vec<&Glyph> {
        self.glyphs.values().filter(|g| g.class == class).collect()
    }

    pub fn arcs_of_class(&self, class: ArcClass) -> Vec<&Arc> {
        self.arcs.values().filter(|a| a.class == class).collect()
    }

    /// Id of the glyph owning the port, if `port_id` names a port.
    pub fn port_owner(&self, port_id: &str) -> Option<&str> {
        self.port_owners.get(port_id).map(String::as_str)
    }

    /// Glyph id behind an arc endpoint; ports resolve to their process.
    pub fn endpoint_glyph<'a>(&'a self, endpoint: &'a Endpoint) -> &'a str {
        match endpoint {
            Endpoint::Glyph(id) => id,
            Endpoint::Port(id) => self.port_owner(id).unwrap_or(id),
        }
    }

    /// Arcs whose target is the glyph or one of its ports.
    pub fn arcs_into(&self, glyph_id: &str) -> Vec<&Arc> {
        self.arcs
            .values()
            .filter(|arc| self.endpoint_glyph(&arc.target) == glyph_id)
            .collect()
    }

    /// Arcs whose source is the glyph or one of its ports.
    pub fn arcs_from(&self, glyph_id: &str) -> Vec<&Arc> {
        self.arcs
            .values()
            .filter(|arc| self.endpoint_glyph(&arc.source) == glyph_id)
            .collect()
    }

    pub(crate) fn insert_glyph(&mut self, glyph: Glyph) {
        for port in &glyph.ports {
            self.port_owners.insert(port.id.clone(), glyph.id.clone());
        }
        self.glyphs.insert(glyph.id.clone(), glyph);
    }

    /// Nests `child` under `parent`; both must already be inserted.
    pub(crate) fn attach_child(&mut self, parent: &str, child: &str) {
        if let Some(glyph) = self.glyphs.get_mut(child) {
            glyph.parent = Some(parent.to_string());
        }
        if let Some(glyph) = self.glyphs.get_mut(parent) {
            if !glyph.children.iter().any(|c| c == child) {
                glyph.children.push(child.to_string());
            }
        }
    }

    pub(crate) fn insert_arc(&mut self, arc: Arc) {
        self.arcs.insert(arc.id.clone(), arc);
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<String>) {
        self.roots = roots;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_round_trip() {
        for class in [
            GlyphClass::UnspecifiedEntity,
            GlyphClass::SimpleChemical,
            GlyphClass::Macromolecule,
            GlyphClass::NucleicAcidFeature,
            GlyphClass::Complex,
            GlyphClass::Process,
            GlyphClass::And,
            GlyphClass::Not,
            GlyphClass::SourceAndSink,
            GlyphClass::Compartment,
            GlyphClass::Cardinality,
            GlyphClass::StateVariable,
            GlyphClass::UnitOfInformation,
        ] {
            assert_eq!(GlyphClass::from_name(class.as_str()), Some(class));
        }
        assert_eq!(ArcClass::from_name("logic arc"), Some(ArcClass::LogicArc));
        assert_eq!(ArcClass::from_name("necessary stimulation"), None);
    }

    #[test]
    fn state_variable_labels() {
        assert_eq!(state_var_label(Some("P"), Some("S15")), "P@S15");
        assert_eq!(state_var_label(Some("P"), None), "P");
        assert_eq!(state_var_label(Some(""), Some("S15")), "S15");
        assert_eq!(state_var_label(None, None), "");
    }

    #[test]
    fn arcs_resolve_ports_to_their_process() {
        let mut diagram = Diagram::new();
        let mut process = Glyph::new("p1", GlyphClass::Process);
        process.ports.push(Port {
            id: "INP_p1".into(),
            role: PortRole::Input,
            position: None,
        });
        diagram.insert_glyph(process);
        diagram.insert_glyph(Glyph::new("a", GlyphClass::Macromolecule));
        diagram.insert_arc(Arc::new(
            ArcClass::Consumption,
            Endpoint::Glyph("a".into()),
            Endpoint::Port("INP_p1".into()),
        ));

        assert_eq!(diagram.port_owner("INP_p1"), Some("p1"));
        assert_eq!(diagram.arcs_into("p1").len(), 1);
        assert_eq!(diagram.arcs_from("a").len(), 1);
        assert_eq!(diagram.arc("a--CONSUMPTION--INP_p1").unwrap().class, ArcClass::Consumption);
    }

    #[test]
    fn arcs_of_different_classes_between_the_same_glyphs_coexist() {
        let mut diagram = Diagram::new();
        diagram.insert_glyph(Glyph::new("x", GlyphClass::Macromolecule));
        diagram.insert_glyph(Glyph::new("p", GlyphClass::Process));
        for class in [ArcClass::Catalysis, ArcClass::Inhibition, ArcClass::Catalysis] {
            diagram.insert_arc(Arc::new(
                class,
                Endpoint::Glyph("x".into()),
                Endpoint::Glyph("p".into()),
            ));
        }

        assert_eq!(diagram.arc_count(), 2);
        assert!(diagram.arc("x--CATALYSIS--p").is_some());
        assert!(diagram.arc("x--INHIBITION--p").is_some());
    }
}
