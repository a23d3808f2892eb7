//! Layout boundary: the diagram is handed to a [`LayoutEngine`] as a plain graph and the
//! returned boxes are copied back onto the glyphs.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::diagram::{ArcClass, BBox, Diagram, GlyphClass, Point, PortRole};
use crate::error::Result;

const PORT_CONNECTOR_LEN_PX: f64 = 11.0;

/// Default widths/heights from sbgnStyle.
pub fn default_dimensions(class: GlyphClass) -> Option<(f64, f64)> {
    match class {
        GlyphClass::UnspecifiedEntity => Some((32.0, 32.0)),
        GlyphClass::SimpleChemical => Some((48.0, 48.0)),
        GlyphClass::Macromolecule => Some((96.0, 48.0)),
        GlyphClass::NucleicAcidFeature => Some((88.0, 56.0)),
        GlyphClass::Complex => Some((10.0, 10.0)),
        GlyphClass::SourceAndSink => Some((60.0, 60.0)),
        GlyphClass::Process => Some((25.0, 25.0)),
        GlyphClass::Compartment => Some((50.0, 50.0)),
        GlyphClass::And | GlyphClass::Not => Some((40.0, 40.0)),
        GlyphClass::Cardinality | GlyphClass::StateVariable | GlyphClass::UnitOfInformation => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub class: GlyphClass,
    pub width: f64,
    pub height: f64,
    /// Enclosing complex.
    pub parent: Option<String>,
    pub compartment: Option<String>,
}

/// An arc between two glyphs; ports are already resolved to their process.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
    pub class: ArcClass,
}

#[derive(Clone, Debug, Default)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl LayoutGraph {
    pub fn from_diagram(diagram: &Diagram) -> Self {
        let nodes = diagram
            .glyphs()
            .map(|glyph| {
                let (width, height) = default_dimensions(glyph.class).unwrap_or((40.0, 20.0));
                LayoutNode {
                    id: glyph.id.clone(),
                    class: glyph.class,
                    width,
                    height,
                    parent: glyph.parent.clone(),
                    compartment: glyph.compartment.clone(),
                }
            })
            .collect();
        let edges = diagram
            .arcs()
            .map(|arc| LayoutEdge {
                source: diagram.endpoint_glyph(&arc.source).to_string(),
                target: diagram.endpoint_glyph(&arc.target).to_string(),
                class: arc.class,
            })
            .collect();
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn children_index(&self) -> HashMap<&str, Vec<&LayoutNode>> {
        let mut index: HashMap<&str, Vec<&LayoutNode>> = HashMap::new();
        for node in &self.nodes {
            if let Some(parent) = node.parent.as_deref() {
                index.entry(parent).or_default().push(node);
            }
        }
        index
    }
}

/// Glyph id to its box in diagram coordinates.
pub type Placement = HashMap<String, BBox>;

pub trait LayoutEngine {
    fn layout(&self, graph: &LayoutGraph) -> Result<Placement>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridLayoutConfig {
    /// Horizontal gap between grid cells.
    pub horizontal_spacing: f64,
    /// Vertical gap between grid rows and between compartments.
    pub vertical_spacing: f64,
    /// Inset of complex members from the complex border.
    pub complex_padding: f64,
    /// Inset of compartment members from the compartment border.
    pub compartment_padding: f64,
    pub start_x: f64,
    pub start_y: f64,
}

impl Default for GridLayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_spacing: 60.0,
            vertical_spacing: 60.0,
            complex_padding: 10.0,
            compartment_padding: 20.0,
            start_x: 0.0,
            start_y: 0.0,
        }
    }
}

/// Deterministic placement: top-level glyphs on a square-ish grid per compartment,
/// complex members stacked inside their complex.
#[derive(Clone, Debug, Default)]
pub struct GridLayout {
    config: GridLayoutConfig,
}

type Children<'g> = HashMap<&'g str, Vec<&'g LayoutNode>>;

impl GridLayout {
    pub fn with_config(config: GridLayoutConfig) -> Self {
        Self { config }
    }

    fn measure<'g>(
        &self,
        node: &'g LayoutNode,
        children: &Children<'g>,
        sizes: &mut HashMap<&'g str, (f64, f64)>,
    ) -> (f64, f64) {
        if let Some(size) = sizes.get(node.id.as_str()) {
            return *size;
        }
        let pad = self.config.complex_padding;
        let size = match children.get(node.id.as_str()) {
            Some(members) if !members.is_empty() => {
                let mut width: f64 = 0.0;
                let mut height = pad;
                for member in members.iter().copied() {
                    let (w, h) = self.measure(member, children, sizes);
                    width = width.max(w);
                    height += h + pad;
                }
                ((width + 2.0 * pad).max(node.width), height.max(node.height))
            }
            _ => (node.width, node.height),
        };
        sizes.insert(&node.id, size);
        size
    }

    /// Places `members` on a grid from (x, y) and returns the extent used.
    fn place_grid(
        &self,
        members: &[&LayoutNode],
        x: f64,
        y: f64,
        sizes: &HashMap<&str, (f64, f64)>,
        children: &Children<'_>,
        placement: &mut Placement,
    ) -> (f64, f64) {
        if members.is_empty() {
            return (0.0, 0.0);
        }
        let columns = (members.len() as f64).sqrt().ceil().max(1.0) as usize;
        let rows = members.len().div_ceil(columns);
        let (cell_w, cell_h) = members.iter().fold((0.0f64, 0.0f64), |(cw, ch), member| {
            let (w, h) = sizes[member.id.as_str()];
            (cw.max(w), ch.max(h))
        });
        let step_x = cell_w + self.config.horizontal_spacing;
        let step_y = cell_h + self.config.vertical_spacing;

        for (i, member) in members.iter().enumerate() {
            let (w, h) = sizes[member.id.as_str()];
            let bbox = BBox {
                x: x + (i % columns) as f64 * step_x,
                y: y + (i / columns) as f64 * step_y,
                w,
                h,
            };
            placement.insert(member.id.clone(), bbox);
            self.place_members(member, bbox, sizes, children, placement);
        }

        let used_columns = columns.min(members.len());
        (
            used_columns as f64 * step_x - self.config.horizontal_spacing,
            rows as f64 * step_y - self.config.vertical_spacing,
        )
    }

    fn place_members(
        &self,
        node: &LayoutNode,
        bbox: BBox,
        sizes: &HashMap<&str, (f64, f64)>,
        children: &Children<'_>,
        placement: &mut Placement,
    ) {
        let Some(members) = children.get(node.id.as_str()) else {
            return;
        };
        let pad = self.config.complex_padding;
        let mut y = bbox.y + pad;
        for member in members {
            let (w, h) = sizes[member.id.as_str()];
            let inner = BBox {
                x: bbox.x + pad,
                y,
                w,
                h,
            };
            placement.insert(member.id.clone(), inner);
            self.place_members(member, inner, sizes, children, placement);
            y += h + pad;
        }
    }
}

impl LayoutEngine for GridLayout {
    fn layout(&self, graph: &LayoutGraph) -> Result<Placement> {
        let children = graph.children_index();
        let mut sizes = HashMap::new();
        for node in &graph.nodes {
            self.measure(node, &children, &mut sizes);
        }

        let mut groups: IndexMap<Option<&str>, Vec<&LayoutNode>> = IndexMap::new();
        groups.insert(None, Vec::new());
        for node in &graph.nodes {
            if node.class == GlyphClass::Compartment {
                groups.insert(Some(node.id.as_str()), Vec::new());
            }
        }
        for node in &graph.nodes {
            if node.parent.is_some() || node.class == GlyphClass::Compartment {
                continue;
            }
            let key = node
                .compartment
                .as_deref()
                .filter(|c| groups.contains_key(&Some(*c)));
            groups.entry(key).or_default().push(node);
        }

        let mut placement = Placement::new();
        let x = self.config.start_x;
        let mut y = self.config.start_y;
        for (compartment, members) in &groups {
            match compartment {
                Some(id) => {
                    let inset = self.config.compartment_padding;
                    let (w, h) =
                        self.place_grid(members, x + inset, y + inset, &sizes, &children, &mut placement);
                    let (min_w, min_h) = sizes[id];
                    let bbox = BBox {
                        x,
                        y,
                        w: (w + 2.0 * inset).max(min_w),
                        h: (h + 2.0 * inset).max(min_h),
                    };
                    placement.insert(id.to_string(), bbox);
                    y += bbox.h + self.config.vertical_spacing;
                }
                None if !members.is_empty() => {
                    let (_, h) = self.place_grid(members, x, y, &sizes, &children, &mut placement);
                    y += h + self.config.vertical_spacing;
                }
                None => {}
            }
        }

        tracing::debug!(nodes = graph.nodes.len(), placed = placement.len(), "grid layout");
        Ok(placement)
    }
}

/// Copy placed boxes onto the glyphs, then derive port positions and arc end points.
pub fn apply_placement(diagram: &mut Diagram, placement: &Placement) {
    let mut anchors: HashMap<String, Point> = HashMap::new();
    for glyph in diagram.glyphs_mut() {
        let Some(bbox) = placement.get(&glyph.id) else {
            continue;
        };
        glyph.bbox = Some(*bbox);
        let center = bbox.center();
        anchors.insert(glyph.id.clone(), center);
        for port in &mut glyph.ports {
            let x = match port.role {
                PortRole::Input => bbox.x - PORT_CONNECTOR_LEN_PX,
                PortRole::Output => bbox.x + bbox.w + PORT_CONNECTOR_LEN_PX,
            };
            let position = Point { x, y: center.y };
            port.position = Some(position);
            anchors.insert(port.id.clone(), position);
        }
    }

    for arc in diagram.arcs_mut() {
        arc.start = anchors.get(arc.source.id()).copied();
        arc.end = anchors.get(arc.target.id()).copied();
    }
}
