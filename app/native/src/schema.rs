//! JSON Schema for the configuration file.

use crate::config::HeicwallConfig;

/// Identifier embedded as `$id` in the generated schema.
const SCHEMA_ID: &str = "https://raw.githubusercontent.com/heicwall/heicwall/main/heicwall.schema.json";

/// Generates a JSON Schema for the heicwall configuration.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(HeicwallConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!(SCHEMA_ID));
    }

    schema
}

/// Generates the schema as a pretty-printed JSON string.
#[must_use]
pub fn generate_schema_json() -> String {
    let schema = generate_schema();
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
