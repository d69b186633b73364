//! JSON Schema for the configuration file.

use crate::config::DailywallConfig;

/// Location the published schema is expected at, used as its `$id`.
const SCHEMA_ID: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "/raw/main/dailywall.schema.json");

/// Generates the JSON Schema for [`DailywallConfig`].
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(DailywallConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!(SCHEMA_ID));
    }

    schema
}

/// Pretty-printed JSON Schema, as printed by `dailywall schema`.
#[must_use]
pub fn print_schema() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}
