use serde_json::{Map, Value as JsonValue};

/// Property bag supplied by a caller. A `null` value means "not supplied".
pub type Properties = Map<String, JsonValue>;

/// Changes requested by a transformer update. `None` leaves a field as it is.
#[derive(Debug, Default)]
pub struct TransformerChanges {
    pub source: Option<String>,
    pub target_repository: Option<String>,
    pub target_storage: Option<String>,
    pub script_file: Option<String>,
}

impl TransformerChanges {
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.target_repository.is_none()
            && self.target_storage.is_none()
            && self.script_file.is_none()
    }
}

/// Filters for listing transformers.
#[derive(Debug, Default)]
pub struct TransformerFilter {
    pub source_kind: Option<String>,
    pub source: Option<String>,
    pub target_kind: Option<String>,
    pub target: Option<String>,
    pub storage: Option<String>,
}
