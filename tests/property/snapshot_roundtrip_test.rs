//! Property-based tests for snapshot round-trips.
//!
//! For any board reachable through the model's API, deserializing its
//! snapshot (directly, through JSON text, or through an export file and the
//! import validator) yields the same board.

use std::sync::Arc;
use std::time::Duration;

use linkboard::database::Database;
use linkboard::managers::layout_model::{LayoutModel, LayoutModelTrait};
use linkboard::services::persistence_gateway::{validate_import, PersistenceGateway, PersistenceGatewayTrait};
use linkboard::types::board::{Link, Section};
use linkboard::types::ids::ColumnId;
use linkboard::types::snapshot::Snapshot;
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
struct LinkPlan {
    title: String,
    host: String,
    score: Option<u32>,
    weight: Option<f64>,
    trashed: bool,
}

#[derive(Debug, Clone)]
struct SectionPlan {
    column: usize,
    title: String,
    links: Vec<LinkPlan>,
}

/// Any finite float, including subnormals and both zeros.
fn finite_f64() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

fn arb_link() -> impl Strategy<Value = LinkPlan> {
    (
        "[a-zA-Z0-9 ]{0,20}",
        "[a-z][a-z0-9]{1,10}",
        proptest::option::of(0..1000u32),
        proptest::option::of(finite_f64()),
        proptest::bool::weighted(0.2),
    )
        .prop_map(|(title, host, score, weight, trashed)| LinkPlan { title, host, score, weight, trashed })
}

fn arb_section() -> impl Strategy<Value = SectionPlan> {
    (0..3usize, "[A-Z][a-z]{0,12}", proptest::collection::vec(arb_link(), 0..6))
        .prop_map(|(column, title, links)| SectionPlan { column, title, links })
}

fn arb_board() -> impl Strategy<Value = (Vec<SectionPlan>, f64, String)> {
    (
        proptest::collection::vec(arb_section(), 0..8),
        prop_oneof![Just(0.75), Just(1.0), Just(1.25), Just(2.0), finite_f64()],
        "#[0-9a-f]{6}",
    )
}

fn build((sections, font_scale, color): &(Vec<SectionPlan>, f64, String)) -> LayoutModel {
    let mut model = LayoutModel::default();
    let mut to_trash = Vec::new();
    for (si, plan) in sections.iter().enumerate() {
        let section = Section::new(&plan.title, "");
        let section_id = section.id.clone();
        model
            .add_section(section, &ColumnId::from(format!("col-{}", plan.column + 1)), usize::MAX)
            .unwrap();
        for (li, l) in plan.links.iter().enumerate() {
            let mut link = Link::new(&l.title, &format!("https://{}{}-{}.example.com/", l.host, si, li));
            link.metadata = match (l.score, l.weight) {
                (None, None) => None,
                (score, weight) => Some(json!({"score": score, "weight": weight, "tags": ["a", "b"]})),
            };
            let id = model.add_link(link, &section_id, usize::MAX).unwrap();
            if l.trashed {
                to_trash.push(id);
            }
        }
    }
    for id in to_trash {
        model.delete_link(&id).unwrap();
    }
    model.set_preference("fontScale", json!(font_scale)).unwrap();
    model.set_preference("backgroundColor", json!(color)).unwrap();
    model.set_preference("layoutDensity", json!("cozy")).unwrap();
    model
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn deserialize_inverts_serialize(board in arb_board()) {
        let model = build(&board);
        let restored = LayoutModel::deserialize(model.serialize()).unwrap();
        prop_assert_eq!(restored.state(), model.state());
    }

    #[test]
    fn json_text_roundtrip(board in arb_board()) {
        let model = build(&board);
        let text = serde_json::to_string(&model.serialize()).unwrap();
        let snapshot: Snapshot = serde_json::from_str(&text).unwrap();
        let restored = LayoutModel::deserialize(snapshot).unwrap();
        prop_assert_eq!(restored.state(), model.state());
        // Serializing again yields the same text.
        prop_assert_eq!(serde_json::to_string(&restored.serialize()).unwrap(), text);
    }

    // Link weights and the font scale are arbitrary floats; the checksum recomputed on
    // import must still match the one written at export.
    #[test]
    fn export_import_roundtrip(board in arb_board()) {
        let model = build(&board);
        let db = Arc::new(Database::open_in_memory().unwrap());
        let gateway = PersistenceGateway::new(db, Duration::ZERO);

        let bytes = gateway.export(model.state()).unwrap();
        let imported = validate_import(&bytes).unwrap();
        prop_assert_eq!(imported.state(), model.state());
    }
}
