//! SBGN-ML 0.2 serialization of a [`Diagram`] and a structural reader for the result.

use std::collections::BTreeMap;
use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use roxmltree::Document;

use crate::diagram::{Annotation, Arc, BBox, Diagram, Glyph, GlyphClass, Point};
use crate::error::{Error, Result};
use crate::ids::IdRegistry;
use crate::layout::default_dimensions;

pub const SBGN_NAMESPACE: &str = "http://sbgn.org/libsbgn/0.2";
pub const PD_LANGUAGE: &str = "process description";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

pub fn write_sbgnml(diagram: &Diagram) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(Error::serialization)?;

    write_start(&mut writer, "sbgn", &[("xmlns", SBGN_NAMESPACE)])?;
    write_start(&mut writer, "map", &[("language", PD_LANGUAGE)])?;

    // compartments go first so readers see them before any compartmentRef
    let mut ids = taken_ids(diagram);
    let (compartments, others): (Vec<&Glyph>, Vec<&Glyph>) = diagram
        .root_glyphs()
        .partition(|glyph| glyph.class == GlyphClass::Compartment);
    for glyph in compartments.into_iter().chain(others) {
        write_glyph(&mut writer, diagram, glyph, &mut ids)?;
    }
    for arc in diagram.arcs() {
        write_arc(&mut writer, arc, &mut ids)?;
    }

    write_end(&mut writer, "map")?;
    write_end(&mut writer, "sbgn")?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(Error::serialization)
}

/// Every id already in the diagram, so decoration ids written alongside cannot reuse one.
fn taken_ids(diagram: &Diagram) -> IdRegistry {
    let mut ids = IdRegistry::new();
    for glyph in diagram.glyphs() {
        ids.claim(&glyph.id);
        for port in &glyph.ports {
            ids.claim(&port.id);
        }
    }
    for arc in diagram.arcs() {
        ids.claim(&arc.id);
    }
    ids
}

fn write_glyph(
    writer: &mut XmlWriter,
    diagram: &Diagram,
    glyph: &Glyph,
    ids: &mut IdRegistry,
) -> Result<()> {
    let mut attrs = vec![("class", glyph.class.as_str()), ("id", glyph.id.as_str())];
    if let Some(compartment) = glyph.compartment.as_deref() {
        attrs.push(("compartmentRef", compartment));
    }
    write_start(writer, "glyph", &attrs)?;

    if let Some(label) = glyph.label.as_deref() {
        write_empty(writer, "label", &[("text", label)])?;
    }
    if glyph.clone_marker {
        write_empty(writer, "clone", &[])?;
    }
    let bbox = glyph.bbox.unwrap_or_else(|| sized_at_origin(glyph.class));
    write_bbox(writer, bbox)?;

    for (i, annotation) in glyph.annotations.iter().enumerate() {
        let suffix = match annotation {
            Annotation::StateVariable { .. } => "sv",
            Annotation::UnitOfInformation { .. } => "ui",
        };
        let id = ids.claim(&format!("{}_{suffix}{i}", glyph.id));
        write_annotation(writer, &id, i, annotation, bbox)?;
    }
    for child in diagram.children_of(&glyph.id) {
        write_glyph(writer, diagram, child, ids)?;
    }
    for port in &glyph.ports {
        let position = port.position.unwrap_or(ORIGIN);
        let (x, y) = (position.x.to_string(), position.y.to_string());
        write_empty(
            writer,
            "port",
            &[("id", port.id.as_str()), ("x", x.as_str()), ("y", y.as_str())],
        )?;
    }

    write_end(writer, "glyph")
}

/// State variables and units of information sit on the top border of their owner.
fn write_annotation(
    writer: &mut XmlWriter,
    id: &str,
    index: usize,
    annotation: &Annotation,
    owner_bbox: BBox,
) -> Result<()> {
    write_start(
        writer,
        "glyph",
        &[("class", annotation.class().as_str()), ("id", id)],
    )?;
    match annotation {
        Annotation::StateVariable { value, variable } => {
            let mut attrs = vec![("value", value.as_str())];
            if let Some(variable) = variable.as_deref() {
                attrs.push(("variable", variable));
            }
            write_empty(writer, "state", &attrs)?;
        }
        Annotation::UnitOfInformation { text } => {
            write_empty(writer, "label", &[("text", text.as_str())])?;
        }
    }
    write_bbox(
        writer,
        BBox {
            x: owner_bbox.x + 4.0 + index as f64 * 44.0,
            y: owner_bbox.y - 8.0,
            w: 40.0,
            h: 16.0,
        },
    )?;
    write_end(writer, "glyph")
}

fn write_arc(writer: &mut XmlWriter, arc: &Arc, ids: &mut IdRegistry) -> Result<()> {
    write_start(
        writer,
        "arc",
        &[
            ("class", arc.class.as_str()),
            ("id", arc.id.as_str()),
            ("source", arc.source.id()),
            ("target", arc.target.id()),
        ],
    )?;

    let start = arc.start.unwrap_or(ORIGIN);
    let end = arc.end.unwrap_or(ORIGIN);
    if let Some(cardinality) = arc.cardinality.as_deref() {
        let id = ids.claim(&format!("{}_card", arc.id));
        write_start(
            writer,
            "glyph",
            &[("class", GlyphClass::Cardinality.as_str()), ("id", id.as_str())],
        )?;
        write_empty(writer, "label", &[("text", cardinality)])?;
        write_bbox(
            writer,
            BBox {
                x: (start.x + end.x) / 2.0 - 10.0,
                y: (start.y + end.y) / 2.0 - 8.0,
                w: 20.0,
                h: 16.0,
            },
        )?;
        write_end(writer, "glyph")?;
    }
    write_point(writer, "start", start)?;
    write_point(writer, "end", end)?;

    write_end(writer, "arc")
}

fn sized_at_origin(class: GlyphClass) -> BBox {
    let (w, h) = default_dimensions(class).unwrap_or((40.0, 20.0));
    BBox {
        x: 0.0,
        y: 0.0,
        w,
        h,
    }
}

fn write_bbox(writer: &mut XmlWriter, bbox: BBox) -> Result<()> {
    let (x, y, w, h) = (
        bbox.x.to_string(),
        bbox.y.to_string(),
        bbox.w.to_string(),
        bbox.h.to_string(),
    );
    write_empty(
        writer,
        "bbox",
        &[
            ("x", x.as_str()),
            ("y", y.as_str()),
            ("w", w.as_str()),
            ("h", h.as_str()),
        ],
    )
}

fn write_point(writer: &mut XmlWriter, tag: &str, point: Point) -> Result<()> {
    let (x, y) = (point.x.to_string(), point.y.to_string());
    write_empty(writer, tag, &[("x", x.as_str()), ("y", y.as_str())])
}

fn element<'a>(tag: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut elem = BytesStart::new(tag);
    for attr in attrs {
        elem.push_attribute(*attr);
    }
    elem
}

fn write_start(writer: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
    writer
        .write_event(Event::Start(element(tag, attrs)))
        .map_err(Error::serialization)
}

fn write_empty(writer: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
    writer
        .write_event(Event::Empty(element(tag, attrs)))
        .map_err(Error::serialization)
}

fn write_end(writer: &mut XmlWriter, tag: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(Error::serialization)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SbgnPort {
    pub id: String,
    pub position: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SbgnGlyph {
    pub id: String,
    pub parent_id: Option<String>,
    pub class_name: String,
    pub compartment_ref: Option<String>,
    pub bbox: Option<BBox>,
    pub label: String,
    pub ports: Vec<SbgnPort>,
    pub has_clone: bool,
    pub state_value: Option<String>,
    pub state_variable: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SbgnArc {
    pub id: String,
    pub class_name: String,
    pub source: String,
    pub target: String,
    pub cardinality: Option<String>,
    pub points: Vec<Point>,
}

/// Flat view of an SBGN-ML map: every glyph (nested ones carry `parent_id`) and every arc.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SbgnDocument {
    pub language: Option<String>,
    pub glyphs: Vec<SbgnGlyph>,
    pub arcs: Vec<SbgnArc>,
}

impl SbgnDocument {
    pub fn glyph(&self, id: &str) -> Option<&SbgnGlyph> {
        self.glyphs.iter().find(|glyph| glyph.id == id)
    }

    pub fn arc(&self, id: &str) -> Option<&SbgnArc> {
        self.arcs.iter().find(|arc| arc.id == id)
    }

    pub fn glyph_class_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for glyph in &self.glyphs {
            *counts.entry(glyph.class_name.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn arc_class_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for arc in &self.arcs {
            *counts.entry(arc.class_name.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

pub fn read_sbgnml(xml: &str) -> Result<SbgnDocument> {
    let doc = Document::parse(xml).map_err(Error::serialization)?;
    let map_node = doc
        .descendants()
        .find(|node| node.has_tag_name("map"))
        .ok_or_else(|| Error::serialization("SBGN file missing map element"))?;

    let mut glyphs = Vec::new();
    for glyph_node in map_node.children().filter(|node| node.has_tag_name("glyph")) {
        parse_glyph_node(&glyph_node, None, &mut glyphs);
    }

    let arcs = map_node
        .children()
        .filter(|node| node.has_tag_name("arc"))
        .map(|arc| parse_arc_node(&arc))
        .collect();

    Ok(SbgnDocument {
        language: map_node.attribute("language").map(str::to_string),
        glyphs,
        arcs,
    })
}

fn parse_glyph_node(glyph: &roxmltree::Node, parent_id: Option<String>, glyphs: &mut Vec<SbgnGlyph>) {
    // Walk the glyph tree recursively so nested glyphs keep their parent.
    let id = glyph.attribute("id").unwrap_or_default().to_string();
    let label = child_label(glyph).replace('\r', "");

    let bbox = glyph
        .children()
        .find(|node| node.has_tag_name("bbox"))
        .and_then(|node| parse_bbox(&node));

    let ports = glyph
        .children()
        .filter(|node| node.has_tag_name("port"))
        .filter_map(|node| {
            Some(SbgnPort {
                id: node.attribute("id").unwrap_or_default().to_string(),
                position: Point {
                    x: parse_f64(node.attribute("x"))?,
                    y: parse_f64(node.attribute("y"))?,
                },
            })
        })
        .collect();

    let state_node = glyph.children().find(|node| node.has_tag_name("state"));

    glyphs.push(SbgnGlyph {
        id: id.clone(),
        parent_id,
        class_name: glyph.attribute("class").unwrap_or_default().to_string(),
        compartment_ref: glyph.attribute("compartmentRef").map(str::to_string),
        bbox,
        label,
        ports,
        has_clone: glyph.children().any(|node| node.has_tag_name("clone")),
        state_value: state_node
            .and_then(|node| node.attribute("value"))
            .map(str::to_string),
        state_variable: state_node
            .and_then(|node| node.attribute("variable"))
            .map(str::to_string),
    });

    for child in glyph.children().filter(|node| node.has_tag_name("glyph")) {
        parse_glyph_node(&child, Some(id.clone()), glyphs);
    }
}

fn parse_arc_node(arc: &roxmltree::Node) -> SbgnArc {
    let points = arc
        .children()
        .filter(|node| node.has_tag_name("start") || node.has_tag_name("next") || node.has_tag_name("end"))
        .filter_map(|node| {
            Some(Point {
                x: parse_f64(node.attribute("x"))?,
                y: parse_f64(node.attribute("y"))?,
            })
        })
        .collect();
    let cardinality = arc
        .children()
        .find(|node| node.has_tag_name("glyph") && node.attribute("class") == Some("cardinality"))
        .map(|node| child_label(&node).to_string());

    SbgnArc {
        id: arc.attribute("id").unwrap_or_default().to_string(),
        class_name: arc.attribute("class").unwrap_or_default().to_string(),
        source: arc.attribute("source").unwrap_or_default().to_string(),
        target: arc.attribute("target").unwrap_or_default().to_string(),
        cardinality,
        points,
    }
}

fn child_label<'a>(node: &roxmltree::Node<'a, '_>) -> &'a str {
    node.children()
        .find(|child| child.has_tag_name("label"))
        .and_then(|child| child.attribute("text"))
        .unwrap_or("")
}

fn parse_bbox(node: &roxmltree::Node) -> Option<BBox> {
    Some(BBox {
        x: parse_f64(node.attribute("x"))?,
        y: parse_f64(node.attribute("y"))?,
        w: parse_f64(node.attribute("w"))?,
        h: parse_f64(node.attribute("h"))?,
    })
}

fn parse_f64(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{ArcClass, Endpoint, Port, PortRole};

    fn sample() -> Diagram {
        let mut diagram = Diagram::new();
        diagram.insert_glyph(Glyph::new("p1", GlyphClass::Process));
        let mut atp = Glyph::new("atp_1", GlyphClass::SimpleChemical).with_label("ATP & co");
        atp.clone_marker = true;
        atp.compartment = Some("cytosol".into());
        diagram.insert_glyph(atp);
        let mut kinase = Glyph::new("mapk", GlyphClass::Macromolecule).with_label("MAPK1");
        kinase.annotations.push(Annotation::StateVariable {
            value: "P".into(),
            variable: Some("T185".into()),
        });
        kinase.ports.push(Port {
            id: "mapk_port".into(),
            role: PortRole::Input,
            position: None,
        });
        diagram.insert_glyph(kinase);
        diagram.insert_glyph(Glyph::new("cytosol", GlyphClass::Compartment).with_label("cytosol"));
        diagram.insert_glyph(Glyph::new("cx", GlyphClass::Complex));
        diagram.insert_glyph(Glyph::new("cx_m", GlyphClass::Macromolecule).with_label("M"));
        diagram.attach_child("cx", "cx_m");
        diagram.set_roots(vec![
            "p1".into(),
            "atp_1".into(),
            "mapk".into(),
            "cytosol".into(),
            "cx".into(),
        ]);

        let mut arc = Arc::new(
            ArcClass::Consumption,
            Endpoint::Glyph("atp_1".into()),
            Endpoint::Glyph("p1".into()),
        );
        arc.cardinality = Some("2".into());
        diagram.insert_arc(arc);
        diagram
    }

    #[test]
    fn writes_process_description_map() {
        let xml = write_sbgnml(&sample()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(SBGN_NAMESPACE));
        assert!(xml.contains("language=\"process description\""));
        assert!(xml.contains("ATP &amp; co"));

        let compartment = xml.find("id=\"cytosol\"").unwrap();
        let process = xml.find("id=\"p1\"").unwrap();
        assert!(compartment < process);
    }

    #[test]
    fn written_map_reads_back() {
        let doc = read_sbgnml(&write_sbgnml(&sample()).unwrap()).unwrap();
        assert_eq!(doc.language.as_deref(), Some(PD_LANGUAGE));

        let atp = doc.glyph("atp_1").unwrap();
        assert!(atp.has_clone);
        assert_eq!(atp.label, "ATP & co");
        assert_eq!(atp.compartment_ref.as_deref(), Some("cytosol"));
        assert_eq!(atp.bbox.map(|b| (b.w, b.h)), Some((48.0, 48.0)));

        let state = doc.glyph("mapk_sv0").unwrap();
        assert_eq!(state.class_name, "state variable");
        assert_eq!(state.parent_id.as_deref(), Some("mapk"));
        assert_eq!(state.state_value.as_deref(), Some("P"));
        assert_eq!(state.state_variable.as_deref(), Some("T185"));
        assert_eq!(doc.glyph("mapk").unwrap().ports[0].id, "mapk_port");

        assert_eq!(doc.glyph("cx_m").unwrap().parent_id.as_deref(), Some("cx"));

        let arc = doc.arc("atp_1--CONSUMPTION--p1").unwrap();
        assert_eq!(arc.class_name, "consumption");
        assert_eq!(arc.source, "atp_1");
        assert_eq!(arc.cardinality.as_deref(), Some("2"));
        assert_eq!(arc.points.len(), 2);
        // arc cardinality glyphs are not map glyphs
        assert!(doc.glyph("atp_1--CONSUMPTION--p1_card").is_none());

        let counts = doc.glyph_class_counts();
        assert_eq!(counts["macromolecule"], 2);
        assert_eq!(counts["state variable"], 1);
        assert_eq!(doc.arc_class_counts()["consumption"], 1);
    }

    #[test]
    fn decoration_ids_never_reuse_diagram_ids() {
        let mut diagram = sample();
        diagram.insert_glyph(Glyph::new("mapk_sv0", GlyphClass::SimpleChemical));
        diagram.insert_glyph(Glyph::new("atp_1--CONSUMPTION--p1_card", GlyphClass::SimpleChemical));
        let mut roots = diagram.roots().to_vec();
        roots.push("mapk_sv0".into());
        roots.push("atp_1--CONSUMPTION--p1_card".into());
        diagram.set_roots(roots);

        let xml = write_sbgnml(&diagram).unwrap();
        assert_eq!(xml.matches("id=\"mapk_sv0\"").count(), 1);
        assert!(xml.contains("id=\"mapk_sv0_2\""));
        assert_eq!(xml.matches("id=\"atp_1--CONSUMPTION--p1_card\"").count(), 1);
        assert!(xml.contains("id=\"atp_1--CONSUMPTION--p1_card_2\""));

        let doc = read_sbgnml(&xml).unwrap();
        assert_eq!(doc.glyph("mapk_sv0").unwrap().class_name, "simple chemical");
        assert_eq!(doc.glyph("mapk_sv0_2").unwrap().class_name, "state variable");
    }

    #[test]
    fn missing_map_is_an_error() {
        let err = read_sbgnml("<sbgn/>").unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
        assert!(read_sbgnml("<sbgn>").is_err());
    }
}
