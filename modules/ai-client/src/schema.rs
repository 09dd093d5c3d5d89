//! JSON-schema generation for structured model output.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Types the model can be forced to produce via tool use.
///
/// Automatically implemented for any `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Tool input schema for this type: object schemas closed with
    /// `additionalProperties: false`, every property required, nested
    /// definitions inlined.
    fn tool_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = value.get("definitions").cloned();
        tighten(&mut value, definitions.as_ref());

        if let serde_json::Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Recursively close object schemas, mark all properties required, and
/// replace `$ref`/single-`allOf` indirection with the referenced schema.
fn tighten(value: &mut serde_json::Value, definitions: Option<&serde_json::Value>) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.and_then(|d| d.get(name)) {
                        *value = def.clone();
                        tighten(value, definitions);
                        return;
                    }
                }
            }

            if let Some(serde_json::Value::Array(all_of)) = map.get("allOf").cloned() {
                if all_of.len() == 1 {
                    *value = all_of.into_iter().next().unwrap();
                    tighten(value, definitions);
                    return;
                }
            }

            if map.get("type") == Some(&serde_json::Value::String("object".into())) {
                map.insert("additionalProperties".into(), serde_json::Value::Bool(false));
                if let Some(serde_json::Value::Object(props)) = map.get("properties") {
                    let keys = props
                        .keys()
                        .map(|k| serde_json::Value::String(k.clone()))
                        .collect();
                    map.insert("required".into(), serde_json::Value::Array(keys));
                }
            }

            for (_, v) in map.iter_mut() {
                tighten(v, definitions);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                tighten(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Links {
        blog: String,
        video: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    struct PageIntel {
        summary: String,
        links: Links,
    }

    #[test]
    fn objects_are_closed_and_fully_required() {
        let schema = PageIntel::tool_schema();
        let obj = schema.as_object().unwrap();

        assert_eq!(
            obj.get("additionalProperties"),
            Some(&serde_json::Value::Bool(false))
        );
        let required: Vec<&str> = obj["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"summary"));
        assert!(required.contains(&"links"));
    }

    #[test]
    fn nested_definitions_are_inlined() {
        let schema = PageIntel::tool_schema();
        let obj = schema.as_object().unwrap();
        assert!(!obj.contains_key("definitions"));
        assert!(!obj.contains_key("$schema"));

        let links = &schema["properties"]["links"];
        assert!(links.get("$ref").is_none());
        assert_eq!(links["type"], "object");

        let nested_required: Vec<&str> = links["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(nested_required.contains(&"blog"));
        assert!(nested_required.contains(&"video"));
    }
}
