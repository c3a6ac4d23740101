//! Markdown Documentation
//!
//! Renders a JSON Schema as a Markdown document: a heading per schema, a
//! section per property, property tables for objects and a "Sub Schemas"
//! part for the definitions block.
//!
//! Rendering is a pure walk over the parsed schema. Nodes that are not
//! objects where an object is expected are skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Result, SchemaError};

/// Keywords listed under "Additional restrictions", with their labels
const RESTRICTIONS: &[(&str, &str)] = &[
    ("minimum", "Minimum"),
    ("maximum", "Maximum"),
    ("pattern", "Regex pattern"),
    ("minItems", "Minimum items"),
    ("uniqueItems", "Unique items"),
];

/// Array item combinators and how they read
const ITEM_COMBINATORS: &[(&str, &str)] = &[
    ("allOf", "The elements of the array must match *all* of the following properties:"),
    ("anyOf", "The elements of the array must match *at least one* of the following properties:"),
    ("oneOf", "The elements of the array must match *exactly one* of the following properties:"),
    ("not", "The elements of the array must *not* match the following properties:"),
];

/// Render `schema` as Markdown under the heading `title`.
pub fn generate_markdown(schema: &Map<String, Value>, title: &str) -> String {
    Generator::new(schema).render(schema, title)
}

/// Read the schema at `schema_path` and write its Markdown to `destination`.
pub fn generate_markdown_file(schema_path: &Path, destination: &Path) -> Result<()> {
    let content = fs::read(schema_path).map_err(|source| SchemaError::Read {
        path: schema_path.to_path_buf(),
        source,
    })?;
    let schema: Map<String, Value> =
        serde_json::from_slice(&content).map_err(|source| SchemaError::Parse {
            path: schema_path.to_path_buf(),
            source,
        })?;

    let title = schema_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let markdown = generate_markdown(&schema, &title);

    fs::write(destination, markdown).map_err(|source| SchemaError::Write {
        path: destination.to_path_buf(),
        source,
    })?;

    info!(schema = %schema_path.display(), output = %destination.display(), "Generated markdown");
    Ok(())
}

fn str_value<'a>(schema: &'a Map<String, Value>, key: &str) -> &'a str {
    schema.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Strings verbatim, everything else as JSON
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_required(property: &str, schema: &Map<String, Value>) -> bool {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|required| required.iter().any(|field| field.as_str() == Some(property)))
        .unwrap_or(false)
}

fn element_title(
    octothorpes: &str,
    name: &str,
    schema_type: &str,
    is_required: bool,
    is_enum: bool,
    example: &str,
) -> String {
    let mut title = octothorpes.to_string();

    if !name.is_empty() {
        title.push_str(&format!(" `{}`", name));
    }

    if !schema_type.is_empty() || is_required {
        let mut qualifiers = Vec::new();
        if !schema_type.is_empty() {
            qualifiers.push(schema_type);
        }
        if is_enum {
            qualifiers.push("enum");
        }
        if is_required {
            qualifiers.push("required");
        }
        title.push_str(&format!(" ({})", qualifiers.join(", ")));
    }

    if !example.is_empty() {
        title.push_str(&format!(" eg: `{}`", example));
    }

    title
}

fn restrictions(schema: &Map<String, Value>) -> String {
    RESTRICTIONS
        .iter()
        .filter_map(|(key, label)| {
            schema
                .get(*key)
                .map(|value| format!("* {} : `{}`", label, plain(value)))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Generator {
    /// Local definition pointers (`#/definitions/Name`) to their names
    sub_schemas: BTreeMap<String, String>,
    definitions_key: &'static str,
}

impl Generator {
    fn new(schema: &Map<String, Value>) -> Self {
        let definitions_key = if schema.contains_key("$def") {
            "$def"
        } else {
            "definitions"
        };

        let sub_schemas = schema
            .get(definitions_key)
            .and_then(Value::as_object)
            .map(|definitions| {
                definitions
                    .keys()
                    .map(|name| (format!("#/{}/{}", definitions_key, name), name.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            sub_schemas,
            definitions_key,
        }
    }

    fn render(&self, schema: &Map<String, Value>, title: &str) -> String {
        let mut text = vec![format!("# {}", title), "---".to_string()];
        let mut octothorpes = String::new();

        if let Some(schema_title) = schema.get("title").and_then(Value::as_str) {
            octothorpes.push('#');
            text.push(format!("{} {}", octothorpes, schema_title));
        }

        if let Some(id) = schema.get("$id").and_then(Value::as_str) {
            text.push(format!("```text\n{}\n```", id));
        }

        if schema.get("type").and_then(Value::as_str) == Some("object") {
            let description = str_value(schema, "description");
            if !description.is_empty() {
                text.push(description.to_string());
            }

            let sections = self.property_section(&octothorpes, schema);
            if !sections.is_empty() {
                text.push("The schema defines the following properties:".to_string());
                text.extend(sections);
            }
        } else {
            text.extend(self.schema_section(&format!("#{}", octothorpes), "", false, schema));
        }

        if let Some(definitions) = schema.get(self.definitions_key).and_then(Value::as_object) {
            text.push("---".to_string());
            text.push("# Sub Schemas".to_string());
            text.push("The schema defines the following additional types:".to_string());

            for (name, definition) in definitions {
                let Some(definition) = definition.as_object() else {
                    continue;
                };
                text.extend(self.definition_section(&octothorpes, name, definition));
            }
        }

        text.join("\n\n")
    }

    fn definition_section(
        &self,
        octothorpes: &str,
        name: &str,
        definition: &Map<String, Value>,
    ) -> Vec<String> {
        let definition_type = str_value(definition, "type");
        let mut text = vec![format!("## `{}` ({})", name, definition_type)];

        let description = str_value(definition, "description");
        if !description.is_empty() {
            text.push(description.to_string());
        }

        if definition_type == "object" && definition.contains_key("properties") {
            text.push(self.properties_table(&format!("###{}", octothorpes), name, definition));
        }

        let sections = self.property_section("##", definition);
        if !sections.is_empty() {
            text.push(format!("{}### {} properties detail", octothorpes, name));
            text.push(format!("Properties detail of the `{}` object:", name));
            text.extend(sections);
        }

        let sections = self.pattern_property_section("##", definition);
        if !sections.is_empty() {
            text.push(format!("{}### {} patternProperties detail", octothorpes, name));
            text.push(format!("PatternProperties detail of the `{}` object:", name));
            text.extend(sections);
        }

        text
    }

    /// Display type of a schema: its `type` (first non-null one for unions),
    /// else the target of its `$ref`.
    fn actual_type(&self, schema: &Map<String, Value>) -> String {
        match schema.get("type") {
            Some(Value::String(schema_type)) => return schema_type.clone(),
            Some(Value::Array(types)) => {
                return types
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|t| !t.eq_ignore_ascii_case("null"))
                    .unwrap_or("")
                    .to_string();
            }
            _ => {}
        }

        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            return self
                .sub_schemas
                .get(reference)
                .cloned()
                .unwrap_or_else(|| reference.trim_start_matches("file://").to_string());
        }

        String::new()
    }

    fn properties_table(
        &self,
        octothorpes: &str,
        name: &str,
        schema: &Map<String, Value>,
    ) -> String {
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return String::new();
        };

        let mut rows = vec![
            format!("{} {} Properties", octothorpes, name),
            "|Property|Type|Required|".to_string(),
            "|:------|:---|:--------|".to_string(),
        ];

        for (property, inner) in properties {
            let actual_type = inner
                .as_object()
                .map(|inner| self.actual_type(inner))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "-".to_string());
            rows.push(format!("|{}|{}|{}|", property, actual_type, is_required(property, schema)));
        }

        rows.join("\n")
    }

    fn one_of(&self, schema: &Map<String, Value>) -> Vec<String> {
        let Some(variants) = schema.get("oneOf").and_then(Value::as_array) else {
            return Vec::new();
        };

        let list = variants
            .iter()
            .filter_map(Value::as_object)
            .map(|variant| format!("* `{}`", self.actual_type(variant)))
            .collect::<Vec<_>>()
            .join("\n");

        vec!["This property must be one of the following types:".to_string(), list]
    }

    fn property_section(&self, octothorpes: &str, schema: &Map<String, Value>) -> Vec<String> {
        match schema.get("properties").and_then(Value::as_object) {
            Some(properties) => self.nested_sections(octothorpes, properties, schema),
            None => self.one_of(schema),
        }
    }

    fn pattern_property_section(
        &self,
        octothorpes: &str,
        schema: &Map<String, Value>,
    ) -> Vec<String> {
        schema
            .get("patternProperties")
            .and_then(Value::as_object)
            .map(|properties| self.nested_sections(octothorpes, properties, schema))
            .unwrap_or_default()
    }

    fn nested_sections(
        &self,
        octothorpes: &str,
        properties: &Map<String, Value>,
        parent: &Map<String, Value>,
    ) -> Vec<String> {
        let octothorpes = format!("{}#", octothorpes);
        properties
            .iter()
            .filter_map(|(key, content)| content.as_object().map(|content| (key, content)))
            .flat_map(|(key, content)| {
                self.schema_section(&octothorpes, key, is_required(key, parent), content)
            })
            .collect()
    }

    fn schema_section(
        &self,
        octothorpes: &str,
        name: &str,
        required: bool,
        schema: &Map<String, Value>,
    ) -> Vec<String> {
        let schema_type = self.actual_type(schema);
        let example = schema.get("example").map(plain).unwrap_or_default();

        let mut text = vec![element_title(
            octothorpes,
            name,
            &schema_type,
            required,
            schema.contains_key("enum"),
            &example,
        )];

        let description = str_value(schema, "description");
        if !description.is_empty() {
            text.push(description.to_string());
        }

        if schema_type.eq_ignore_ascii_case("object") && schema.contains_key("properties") {
            text.push(self.properties_table(octothorpes, name, schema));
            text.push(format!("Properties detail of the `{}` object:", name));
            text.extend(self.property_section(octothorpes, schema));
        }

        if schema_type.eq_ignore_ascii_case("array") {
            text.extend(self.array_section(octothorpes, name, schema));
        }

        if let Some(variants) = schema.get("oneOf").and_then(Value::as_array) {
            text.push("The object must be one of the following types:".to_string());
            text.push(
                variants
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|variant| format!("* `{}`", self.actual_type(variant)))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }

        if let Some(values) = schema.get("enum").and_then(Value::as_array) {
            text.push("This element must be one of the following enum values:".to_string());
            text.push(
                values
                    .iter()
                    .map(|value| format!("* `{}`", plain(value)))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }

        let restrictions = restrictions(schema);
        if !restrictions.is_empty() {
            text.push("Additional restrictions:".to_string());
            text.push(restrictions);
        }

        text
    }

    fn array_section(
        &self,
        octothorpes: &str,
        name: &str,
        schema: &Map<String, Value>,
    ) -> Vec<String> {
        let Some(items) = schema.get("items").and_then(Value::as_object) else {
            return Vec::new();
        };

        let items_type = self.actual_type(items);
        if !items_type.is_empty() {
            let subject = if name.is_empty() {
                "The schema defines an array"
            } else {
                "The object is an array"
            };
            return vec![format!("{} with all elements of the type `{}`.", subject, items_type)];
        }

        let mut text = Vec::new();
        for (keyword, sentence) in ITEM_COMBINATORS {
            let Some(combinator) = items.get(*keyword) else {
                continue;
            };

            text.push(sentence.to_string());
            let members: Vec<&Map<String, Value>> = match combinator {
                Value::Array(members) => members.iter().filter_map(Value::as_object).collect(),
                Value::Object(member) => vec![member],
                _ => Vec::new(),
            };
            for member in members {
                let title = str_value(member, "title");
                text.extend(self.schema_section(octothorpes, title, false, member));
            }
            break;
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_element_title() {
        assert_eq!(
            element_title("##", "port", "integer", true, false, "8080"),
            "## `port` (integer, required) eg: `8080`"
        );
        assert_eq!(
            element_title("##", "mode", "string", false, true, ""),
            "## `mode` (string, enum)"
        );
        assert_eq!(element_title("#", "", "", false, false, ""), "#");
    }

    #[test]
    fn test_actual_type() {
        let schema = object(json!({ "definitions": { "Port": { "type": "integer" } } }));
        let generator = Generator::new(&schema);

        assert_eq!(generator.actual_type(&object(json!({ "type": ["null", "string"] }))), "string");
        assert_eq!(generator.actual_type(&object(json!({ "$ref": "#/definitions/Port" }))), "Port");
        assert_eq!(
            generator.actual_type(&object(json!({ "$ref": "file:///s/b.json#/X" }))),
            "/s/b.json#/X"
        );
        assert_eq!(generator.actual_type(&object(json!({ "oneOf": [] }))), "");
    }

    #[test]
    fn test_object_schema_document() {
        let schema = object(json!({
            "$id": "https://example.com/server.json",
            "title": "Server",
            "type": "object",
            "description": "Server settings",
            "required": ["port"],
            "properties": {
                "port": { "type": "integer", "minimum": 1, "maximum": 65535 },
                "mode": { "type": "string", "enum": ["fast", "safe"] }
            }
        }));

        let markdown = generate_markdown(&schema, "server.json");

        assert!(markdown.starts_with("# server.json\n\n---\n\n# Server"));
        assert!(markdown.contains("```text\nhttps://example.com/server.json\n```"));
        assert!(markdown.contains("Server settings"));
        assert!(markdown.contains("## `port` (integer, required)"));
        assert!(markdown.contains("* Minimum : `1`\n* Maximum : `65535`"));
        assert!(markdown.contains("## `mode` (string, enum)"));
        assert!(markdown.contains("* `fast`\n* `safe`"));
        assert!(!markdown.contains("Sub Schemas"));
    }

    #[test]
    fn test_sub_schemas_section() {
        let schema = object(json!({
            "type": "object",
            "properties": {
                "owner": { "$ref": "#/$def/Person" }
            },
            "$def": {
                "Person": {
                    "type": "object",
                    "description": "A person",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string" },
                        "tags": { "type": "array", "items": { "type": "string" } }
                    }
                },
                "Labels": {
                    "type": "object",
                    "patternProperties": { "^x-": { "type": "string" } }
                }
            }
        }));

        let markdown = generate_markdown(&schema, "doc.json");

        assert!(markdown.contains("# `owner` (Person)"));
        assert!(markdown.contains("# Sub Schemas"));
        assert!(markdown.contains("## `Person` (object)"));
        assert!(markdown.contains(
            "### Person Properties\n|Property|Type|Required|\n|:------|:---|:--------|\n\
             |name|string|true|\n|tags|array|false|"
        ));
        assert!(markdown
            .contains("The object is an array with all elements of the type `string`."));
        assert!(markdown.contains("Labels patternProperties detail"));
        assert!(markdown.contains("### `^x-` (string)"));
    }

    #[test]
    fn test_non_object_root_and_array_combinators() {
        let schema = object(json!({
            "type": "array",
            "items": {
                "anyOf": [
                    { "title": "Name", "type": "string" },
                    { "title": "Id", "type": "integer" }
                ]
            }
        }));

        let markdown = generate_markdown(&schema, "list.json");

        assert!(markdown.contains("# (array)"));
        assert!(markdown.contains("*at least one*"));
        assert!(markdown.contains("# `Name` (string)"));
        assert!(markdown.contains("# `Id` (integer)"));
    }

    #[test]
    fn test_malformed_nodes_are_skipped() {
        let schema = object(json!({
            "type": "object",
            "properties": { "flag": true, "name": { "type": "string" } },
            "definitions": { "Broken": 3 }
        }));

        let markdown = generate_markdown(&schema, "odd.json");

        assert!(markdown.contains("# `name` (string)"));
        assert!(!markdown.contains("Broken"));
    }
}
