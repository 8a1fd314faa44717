use std::path::Path;
use theory_explorer_common::{Result, TheoryExplorerError};
use tracing::info;

use crate::types::TheoryRecord;

/// Separator between the fields of the embedded description
pub const FIELD_DELIMITER: &str = " | ";

fn join_list(values: Option<&Vec<String>>) -> String {
    values.map(|v| v.join(", ")).unwrap_or_default()
}

/// Flatten a record into the text that gets embedded.
///
/// Field order: name, type, domain, era, summary, key concepts, status, tags, sources.
/// Absent fields contribute an empty segment so the layout stays fixed.
pub fn theory_to_text(record: &TheoryRecord) -> String {
    [
        record.name.clone(),
        record.kind.clone(),
        record.domain.clone(),
        record.era.clone().unwrap_or_default(),
        record.summary.clone(),
        format!("Key concepts: {}", join_list(record.key_concepts.as_ref())),
        format!("Status: {}", record.status.as_deref().unwrap_or_default()),
        format!("Tags: {}", join_list(record.tags.as_ref())),
        format!("Sources: {}", join_list(record.sources.as_ref())),
    ]
    .join(FIELD_DELIMITER)
}

/// Read a JSON array of seed records
pub async fn load_seed_file(path: &Path) -> Result<Vec<TheoryRecord>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TheoryExplorerError::persistence_read(path, e))?;

    let records: Vec<TheoryRecord> =
        serde_json::from_str(&raw).map_err(|e| TheoryExplorerError::persistence_read(path, e))?;

    info!("Loaded {} seed records from {}", records.len(), path.display());
    Ok(records)
}
