//! Seed intake for Linkboard.
//!
//! Takes candidate link records from an external producer (a bookmark-file
//! parser or a browsing-history scorer) and places them on the board:
//! one section per category, new sections spread across the columns.
//! Deduplication and categorisation are the producer's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::managers::layout_model::{LayoutModel, LayoutModelTrait};
use crate::services::link_utils;
use crate::types::board::{Link, Section};
use crate::types::errors::PersistenceError;
use crate::types::ids::{LinkId, SectionId};

/// Category used for records that come without one.
pub const UNSORTED_CATEGORY: &str = "Unsorted";

/// Icon given to sections created from a category.
pub const DEFAULT_SECTION_ICON: &str = "🔗";

/// One candidate link from a producer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeedLink {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, alias = "section")]
    pub category: String,
    #[serde(default, alias = "date")]
    pub added_at: Option<i64>,
}

/// What a seed run did.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub added: usize,
    pub skipped: usize,
    pub sections_created: usize,
}

/// Parses producer output: a JSON array of records, or an object with a
/// `links` array.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<SeedLink>, PersistenceError> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| PersistenceError::Validation(format!("not valid JSON: {}", e)))?;
    let list = match root {
        Value::Array(list) => Value::Array(list),
        Value::Object(mut map) => map
            .remove("links")
            .ok_or_else(|| PersistenceError::Validation("missing links array".to_string()))?,
        _ => {
            return Err(PersistenceError::Validation(
                "expected an array of links".to_string(),
            ))
        }
    };
    serde_json::from_value(list)
        .map_err(|e| PersistenceError::Validation(format!("malformed link record: {}", e)))
}

/// Appends `records` to the board.
///
/// Each record goes to the end of the section whose id is the slug of its
/// category; missing sections are created in the column holding the fewest
/// sections. Records whose url is not acceptable are skipped.
pub fn seed_model(model: &mut LayoutModel, records: Vec<SeedLink>) -> SeedReport {
    let mut report = SeedReport::default();

    for record in records {
        let category = match record.category.trim() {
            "" => UNSORTED_CATEGORY,
            name => name,
        };
        let section_id = SectionId::from(link_utils::slugify(category));

        if model.section(&section_id).is_none() {
            if !link_utils::is_valid_url(&record.url) {
                warn!(url = %record.url, "skipping seed record with invalid url");
                report.skipped += 1;
                continue;
            }
            let Some(column) = model
                .state()
                .layout
                .columns
                .iter()
                .min_by_key(|c| c.section_ids.len())
                .map(|c| c.id.clone())
            else {
                warn!("board has no columns; seed records dropped");
                report.skipped += 1;
                continue;
            };
            let section = Section {
                id: section_id.clone(),
                title: category.to_string(),
                icon: DEFAULT_SECTION_ICON.to_string(),
                links: Vec::new(),
            };
            if let Err(e) = model.add_section(section, &column, usize::MAX) {
                warn!(error = %e, category, "could not create seed section");
                report.skipped += 1;
                continue;
            }
            report.sections_created += 1;
        }

        let link = Link {
            id: LinkId::generate(),
            title: record.title,
            url: record.url,
            domain: record.domain,
            added_at: record.added_at.unwrap_or(0),
            metadata: None,
        };
        match model.add_link(link, &section_id, usize::MAX) {
            Ok(_) => report.added += 1,
            Err(e) => {
                warn!(error = %e, "skipping seed record");
                report.skipped += 1;
            }
        }
    }

    info!(
        added = report.added,
        skipped = report.skipped,
        sections = report.sections_created,
        "seed records placed"
    );
    report
}
