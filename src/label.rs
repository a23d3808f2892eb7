//! Human-readable labels for entity glyphs.

use crate::model::{EntityKind, PhysicalEntity, Xref};

pub const PLACEHOLDER_LABEL: &str = "noname";

/// Pick a label: gene symbol, then display, standard and first names of the entity
/// and its reference. Small molecules prefer their shortest name.
pub fn resolve_label(entity: &PhysicalEntity) -> String {
    let reference = entity.entity_reference.as_ref();

    let symbol = entity
        .xrefs
        .iter()
        .chain(reference.into_iter().flat_map(|er| er.xrefs.iter()))
        .find_map(extract_gene_symbol);
    if let Some(symbol) = symbol {
        return symbol;
    }

    let mut name = non_blank(entity.display_name.as_deref())
        .or_else(|| non_blank(reference.and_then(|er| er.display_name.as_deref())))
        .or_else(|| non_blank(entity.standard_name.as_deref()))
        .or_else(|| non_blank(reference.and_then(|er| er.standard_name.as_deref())))
        .or_else(|| non_blank(entity.names.first().map(String::as_str)))
        .or_else(|| non_blank(reference.and_then(|er| er.names.first().map(String::as_str))))
        .map(str::to_string);

    if entity.kind == EntityKind::SmallMolecule {
        if let Some(short) = shortest_name(entity) {
            let shorter = match &name {
                Some(current) => short.len() < current.len(),
                None => true,
            };
            if shorter {
                name = Some(short.to_string());
            }
        }
    }

    name.unwrap_or_else(|| PLACEHOLDER_LABEL.to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn shortest_name(entity: &PhysicalEntity) -> Option<&str> {
    let reference_names = entity
        .entity_reference
        .iter()
        .flat_map(|er| er.names.iter());
    entity
        .names
        .iter()
        .chain(reference_names)
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .min_by_key(|name| name.len())
}

/// Gene symbol carried by an HGNC or "Gene Symbol" xref. Numeric HGNC ids are
/// not symbols and are skipped.
pub fn extract_gene_symbol(xref: &Xref) -> Option<String> {
    let db = xref.db.as_deref()?.trim().to_lowercase();
    if !(db.starts_with("hgnc") || db == "gene symbol") {
        return None;
    }
    let mut id = xref.id.as_deref()?.trim();
    // e.g. HGNC_1234
    if let Some((_, rest)) = id.split_once('_') {
        id = rest;
    }
    let bare = id
        .strip_prefix("HGNC:")
        .or_else(|| id.strip_prefix("hgnc:"))
        .unwrap_or(id);
    if bare.is_empty() || bare.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(bare.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityReference;

    #[test]
    fn gene_symbol_wins() {
        let protein = PhysicalEntity::new("urn:p", EntityKind::Protein)
            .named("Cellular tumor antigen p53")
            .with_xref(Xref::new("HGNC Symbol", "TP53"));
        assert_eq!(resolve_label(&protein), "TP53");
    }

    #[test]
    fn reference_gene_symbol_before_display_name() {
        let protein = PhysicalEntity::new("urn:p", EntityKind::Protein)
            .named("p53")
            .with_reference(EntityReference {
                xrefs: vec![Xref::new("Gene Symbol", "TP53")],
                ..Default::default()
            });
        assert_eq!(resolve_label(&protein), "TP53");
    }

    #[test]
    fn numeric_hgnc_ids_are_not_symbols() {
        assert_eq!(extract_gene_symbol(&Xref::new("HGNC", "HGNC:11998")), None);
        assert_eq!(extract_gene_symbol(&Xref::new("hgnc", "HGNC_1234")), None);
        assert_eq!(
            extract_gene_symbol(&Xref::new("HGNC", "SYMBOL_BRCA1")).as_deref(),
            Some("BRCA1")
        );
        assert_eq!(extract_gene_symbol(&Xref::new("UniProt", "P04637")), None);
    }

    #[test]
    fn falls_back_through_names() {
        let standard = PhysicalEntity {
            standard_name: Some("Std".into()),
            ..PhysicalEntity::new("urn:x", EntityKind::Protein)
        };
        assert_eq!(resolve_label(&standard), "Std");

        let reference_display = PhysicalEntity::new("urn:x", EntityKind::Protein)
            .with_names(["first"])
            .with_reference(EntityReference {
                display_name: Some("RefName".into()),
                ..Default::default()
            });
        assert_eq!(resolve_label(&reference_display), "RefName");

        let listed = PhysicalEntity::new("urn:x", EntityKind::Protein).with_names(["alpha", "b"]);
        assert_eq!(resolve_label(&listed), "alpha");
    }

    #[test]
    fn small_molecules_prefer_shortest_name() {
        let atp = PhysicalEntity::new("urn:atp", EntityKind::SmallMolecule)
            .named("adenosine 5'-triphosphate")
            .with_names(["adenosine triphosphate", "ATP"]);
        assert_eq!(resolve_label(&atp), "ATP");

        // proteins keep the display name
        let protein = PhysicalEntity::new("urn:p", EntityKind::Protein)
            .named("long protein name")
            .with_names(["LP"]);
        assert_eq!(resolve_label(&protein), "long protein name");
    }

    #[test]
    fn placeholder_when_nothing_is_named() {
        let blank = PhysicalEntity::new("urn:x", EntityKind::Unspecified).named("   ");
        assert_eq!(resolve_label(&blank), PLACEHOLDER_LABEL);
    }
}
