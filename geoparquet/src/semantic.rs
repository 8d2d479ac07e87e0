// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Semantic validation of `geo` documents.
//!
//! These are the rules a JSON schema cannot express: members that must agree
//! with each other, column names that must be unique, and (in strict mode)
//! references that must resolve against the table schema of the file.
//!
//! Every check runs on the raw JSON value so that a document that already
//! failed structural validation still gets all of its semantic problems
//! reported. A member with the wrong type is skipped here; the structural
//! layer reports it.

use std::collections::HashSet;
use std::fmt::Formatter;

use arrow_schema::{DataType, Schema};
use serde::de::{Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::geometry_type::GeometryType;
use crate::metadata::Encoding;
use crate::report::{json_pointer, Diagnostic};

const COVERING_EXTREMA: [&str; 4] = ["xmin", "ymin", "xmax", "ymax"];

/// Outcome of resolving a column or a nested field in a table schema.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldLookup {
    Found(DataType),
    NotFound,
}

/// Access to the table schema of the file a document describes.
pub trait SchemaLookup {
    /// Resolves `path` inside the top-level column `column_name`.
    ///
    /// An empty `path` resolves the column itself; each segment of a
    /// non-empty path selects a child of a struct.
    fn resolve_field_path(&self, column_name: &str, path: &[&str]) -> FieldLookup;
}

impl SchemaLookup for Schema {
    fn resolve_field_path(&self, column_name: &str, path: &[&str]) -> FieldLookup {
        let Ok(field) = self.field_with_name(column_name) else {
            return FieldLookup::NotFound;
        };

        let mut data_type = field.data_type();
        for segment in path {
            let DataType::Struct(fields) = data_type else {
                return FieldLookup::NotFound;
            };
            match fields.find(segment) {
                Some((_, child)) => data_type = child.data_type(),
                None => return FieldLookup::NotFound,
            }
        }

        FieldLookup::Found(data_type.clone())
    }
}

/// Checks the cross-member rules of a document.
#[derive(Default)]
pub struct SemanticValidator<'a> {
    lookup: Option<&'a dyn SchemaLookup>,
    duplicate_columns: Vec<String>,
}

impl std::fmt::Debug for SemanticValidator<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticValidator")
            .field("strict", &self.lookup.is_some())
            .field("duplicate_columns", &self.duplicate_columns)
            .finish()
    }
}

impl<'a> SemanticValidator<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables strict mode: geometry columns and covering references are
    /// resolved against `lookup`.
    pub fn with_lookup(mut self, lookup: &'a dyn SchemaLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Column names found more than once in the serialized document, see
    /// [`find_duplicate_columns`].
    pub fn with_duplicate_columns(mut self, names: Vec<String>) -> Self {
        self.duplicate_columns = names;
        self
    }

    /// Returns every semantic problem of `document`, in document order.
    pub fn validate(&self, document: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];

        let columns = document.get("columns").and_then(Value::as_object);

        if let (Some(primary), Some(columns)) = (
            document.get("primary_column").and_then(Value::as_str),
            columns,
        ) {
            if !columns.contains_key(primary) {
                diagnostics.push(Diagnostic::semantic(
                    "/primary_column",
                    format!("primary_column \"{primary}\" is not a key of columns"),
                ));
            }
        }

        if let Some(columns) = columns {
            for (name, column) in columns {
                self.check_column(name, column, &mut diagnostics);
            }
        }

        log::debug!("semantic validation found {} problem(s)", diagnostics.len());
        diagnostics
    }

    fn check_column(&self, name: &str, column: &Value, diagnostics: &mut Vec<Diagnostic>) {
        let location = json_pointer(["columns", name]);

        if name.is_empty() {
            diagnostics.push(Diagnostic::semantic(
                location.as_str(),
                "column names must not be empty",
            ));
        }

        if self.duplicate_columns.iter().any(|d| d == name) {
            diagnostics.push(Diagnostic::semantic(
                location.as_str(),
                format!("column \"{name}\" appears more than once in columns"),
            ));
        }

        let Some(column) = column.as_object() else {
            return;
        };

        check_encoding(&location, column, diagnostics);
        check_covering_complete(&location, column, diagnostics);

        if let Some(lookup) = self.lookup {
            check_geometry_column(lookup, name, &location, column, diagnostics);
            check_covering_fields(lookup, &location, column, diagnostics);
        }
    }
}

/// A native encoding fixes the geometry type, so `geometry_types` may only
/// name that type (with or without Z).
fn check_encoding(location: &str, column: &Map<String, Value>, diagnostics: &mut Vec<Diagnostic>) {
    let Some(encoding) = column
        .get("encoding")
        .and_then(Value::as_str)
        .and_then(|e| e.parse::<Encoding>().ok())
    else {
        return;
    };

    let Some(geometry_types) = column.get("geometry_types").and_then(Value::as_array) else {
        return;
    };

    let geometry_types = geometry_types
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|name| name.parse::<GeometryType>().ok())
        .collect::<Vec<_>>();

    if !encoding.is_consistent_with(&geometry_types) {
        let names = geometry_types
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(", ");
        diagnostics.push(Diagnostic::semantic(
            format!("{location}/geometry_types"),
            format!("geometry types [{names}] cannot be stored with encoding \"{encoding}\""),
        ));
    }
}

fn check_covering_complete(
    location: &str,
    column: &Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(bbox) = column
        .get("covering")
        .and_then(|covering| covering.get("bbox"))
        .and_then(Value::as_object)
    else {
        return;
    };

    let missing = COVERING_EXTREMA
        .iter()
        .filter(|extremum| !bbox.contains_key(**extremum))
        .map(|extremum| format!("\"{extremum}\""))
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        diagnostics.push(Diagnostic::semantic(
            format!("{location}/covering/bbox"),
            format!(
                "covering bbox must reference all of xmin, ymin, xmax and ymax, missing {}",
                missing.join(", ")
            ),
        ));
    }
}

fn check_geometry_column(
    lookup: &dyn SchemaLookup,
    name: &str,
    location: &str,
    column: &Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match lookup.resolve_field_path(name, &[]) {
        FieldLookup::NotFound => diagnostics.push(Diagnostic::semantic(
            location,
            format!("geometry column \"{name}\" does not exist in the table schema"),
        )),
        FieldLookup::Found(data_type) => {
            let is_wkb = column.get("encoding").and_then(Value::as_str) == Some("WKB");
            let is_binary = matches!(
                data_type,
                DataType::Binary | DataType::LargeBinary | DataType::BinaryView
            );
            if is_wkb && !is_binary {
                diagnostics.push(Diagnostic::semantic(
                    location,
                    format!("WKB column \"{name}\" has type {data_type}, expected a binary type"),
                ));
            }
        }
    }
}

fn check_covering_fields(
    lookup: &dyn SchemaLookup,
    location: &str,
    column: &Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(bbox) = column
        .get("covering")
        .and_then(|covering| covering.get("bbox"))
        .and_then(Value::as_object)
    else {
        return;
    };

    for extremum in COVERING_EXTREMA {
        let Some(path) = bbox.get(extremum).and_then(Value::as_str) else {
            continue;
        };
        let segments = path.split('.').collect::<Vec<_>>();
        let [column_name, fields @ ..] = segments.as_slice() else {
            continue;
        };
        if fields.is_empty() {
            continue;
        }

        let location = format!("{location}/covering/bbox/{extremum}");
        match lookup.resolve_field_path(column_name, fields) {
            FieldLookup::NotFound => diagnostics.push(Diagnostic::semantic(
                location,
                format!("covering {extremum} \"{path}\" is not a field of a struct column"),
            )),
            FieldLookup::Found(data_type) if !data_type.is_numeric() => {
                diagnostics.push(Diagnostic::semantic(
                    location,
                    format!(
                        "covering {extremum} \"{path}\" has type {data_type}, expected a numeric type"
                    ),
                ))
            }
            FieldLookup::Found(_) => {}
        }
    }
}

/// Scans a serialized document for keys repeated inside `columns`.
///
/// A parsed [`Value`] keeps only the last of several equal keys, so this has
/// to look at the original bytes. Each repeated name is returned once, in
/// order of its first repetition.
pub fn find_duplicate_columns(bytes: &[u8]) -> Result<Vec<String>> {
    let DuplicateColumns(names) = serde_json::from_slice(bytes)?;
    Ok(names)
}

struct DuplicateColumns(Vec<String>);

impl<'de> Deserialize<'de> for DuplicateColumns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = DuplicateColumns;

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut names = vec![];
        while let Some(key) = map.next_key::<String>()? {
            if key == "columns" {
                let DuplicateColumns(duplicates) = map.next_value_seed(ColumnsVisitor)?;
                names.extend(duplicates);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(DuplicateColumns(names))
    }
}

/// Collects repeated keys of the `columns` object. Any other JSON type is
/// skipped.
struct ColumnsVisitor;

impl<'de> serde::de::DeserializeSeed<'de> for ColumnsVisitor {
    type Value = DuplicateColumns;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ColumnsVisitor {
    type Value = DuplicateColumns;

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut seen = HashSet::new();
        let mut duplicates = vec![];
        while let Some(key) = map.next_key::<String>()? {
            map.next_value::<IgnoredAny>()?;
            if !seen.insert(key.clone()) && !duplicates.contains(&key) {
                duplicates.push(key);
            }
        }
        Ok(DuplicateColumns(duplicates))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(DuplicateColumns(vec![]))
    }

    fn visit_bool<E: serde::de::Error>(self, _: bool) -> std::result::Result<Self::Value, E> {
        Ok(DuplicateColumns(vec![]))
    }

    fn visit_i64<E: serde::de::Error>(self, _: i64) -> std::result::Result<Self::Value, E> {
        Ok(DuplicateColumns(vec![]))
    }

    fn visit_u64<E: serde::de::Error>(self, _: u64) -> std::result::Result<Self::Value, E> {
        Ok(DuplicateColumns(vec![]))
    }

    fn visit_f64<E: serde::de::Error>(self, _: f64) -> std::result::Result<Self::Value, E> {
        Ok(DuplicateColumns(vec![]))
    }

    fn visit_str<E: serde::de::Error>(self, _: &str) -> std::result::Result<Self::Value, E> {
        Ok(DuplicateColumns(vec![]))
    }

    fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(DuplicateColumns(vec![]))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_schema::{Field, Fields};
    use serde_json::json;

    use super::*;
    use crate::report::DiagnosticKind;
    use crate::testing::{full_document, minimal_document};

    fn table_schema() -> Schema {
        let bbox = Fields::from(vec![
            Field::new("xmin", DataType::Float64, false),
            Field::new("ymin", DataType::Float64, false),
            Field::new("xmax", DataType::Float64, false),
            Field::new("ymax", DataType::Float64, false),
            Field::new("label", DataType::Utf8, true),
        ]);
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("geometry", DataType::Binary, true),
            Field::new("bbox", DataType::Struct(bbox), true),
        ])
    }

    fn locations(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.location()).collect()
    }

    #[test]
    fn test_schema_lookup() {
        let schema = table_schema();
        assert_eq!(
            schema.resolve_field_path("geometry", &[]),
            FieldLookup::Found(DataType::Binary)
        );
        assert_eq!(
            schema.resolve_field_path("bbox", &["xmin"]),
            FieldLookup::Found(DataType::Float64)
        );
        assert_eq!(schema.resolve_field_path("bbox", &["zmin"]), FieldLookup::NotFound);
        assert_eq!(schema.resolve_field_path("id", &["xmin"]), FieldLookup::NotFound);
        assert_eq!(schema.resolve_field_path("missing", &[]), FieldLookup::NotFound);

        let nested = Schema::new(vec![Field::new(
            "outer",
            DataType::Struct(Fields::from(vec![Field::new(
                "inner",
                DataType::Struct(Fields::from(vec![Field::new("x", DataType::Float32, false)])),
                false,
            )])),
            false,
        )]);
        assert_eq!(
            nested.resolve_field_path("outer", &["inner", "x"]),
            FieldLookup::Found(DataType::Float32)
        );
    }

    #[test]
    fn test_valid_documents() {
        let validator = SemanticValidator::new();
        assert!(validator.validate(&minimal_document()).is_empty());
        assert!(validator.validate(&full_document()).is_empty());
    }

    #[test]
    fn test_primary_column_not_in_columns() {
        let mut document = minimal_document();
        document["primary_column"] = json!("geom");

        let diagnostics = SemanticValidator::new().validate(&document);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::Semantic);
        assert_eq!(diagnostics[0].location(), "/primary_column");
    }

    #[test]
    fn test_empty_column_name() {
        let mut document = minimal_document();
        document["columns"][""] = document["columns"]["geometry"].clone();

        let diagnostics = SemanticValidator::new().validate(&document);
        assert_eq!(locations(&diagnostics), vec!["/columns/"]);
    }

    #[test]
    fn test_covering_incomplete() {
        let mut document = full_document();
        document["columns"]["geometry"]["covering"]["bbox"]
            .as_object_mut()
            .unwrap()
            .remove("ymax");

        let diagnostics = SemanticValidator::new().validate(&document);
        assert_eq!(locations(&diagnostics), vec!["/columns/geometry/covering/bbox"]);
        assert!(diagnostics[0].message().contains("\"ymax\""));

        document["columns"]["geometry"]["covering"]["bbox"] = json!({});
        let diagnostics = SemanticValidator::new().validate(&document);
        assert!(diagnostics[0].message().ends_with(r#""xmin", "ymin", "xmax", "ymax""#));
    }

    #[test]
    fn test_encoding_consistency() {
        let mut document = minimal_document();
        document["columns"]["geometry"]["encoding"] = json!("point");
        document["columns"]["geometry"]["geometry_types"] = json!(["Point", "Point Z"]);
        assert!(SemanticValidator::new().validate(&document).is_empty());

        document["columns"]["geometry"]["geometry_types"] = json!(["Point", "MultiPolygon"]);
        let diagnostics = SemanticValidator::new().validate(&document);
        assert_eq!(locations(&diagnostics), vec!["/columns/geometry/geometry_types"]);
    }

    #[test]
    fn test_no_early_exit() {
        let mut document = full_document();
        document["primary_column"] = json!("geom");
        document["columns"][""] = minimal_document()["columns"]["geometry"].clone();
        document["columns"]["geometry"]["covering"]["bbox"] = json!({"xmin": "bbox.xmin"});

        let diagnostics = SemanticValidator::new().validate(&document);
        assert_eq!(
            locations(&diagnostics),
            vec!["/primary_column", "/columns/geometry/covering/bbox", "/columns/"]
        );
    }

    #[test]
    fn test_skips_mistyped_members() {
        let document = json!({
            "primary_column": 1,
            "columns": {"geometry": "foo", "other": {"covering": {"bbox": []}}}
        });
        assert!(SemanticValidator::new().validate(&document).is_empty());
        assert!(SemanticValidator::new().validate(&json!([])).is_empty());
    }

    #[test]
    fn test_strict_mode() {
        let schema = table_schema();
        let validator = SemanticValidator::new().with_lookup(&schema);
        assert!(validator.validate(&full_document()).is_empty());

        let mut document = full_document();
        document["columns"]["geometry"]["covering"]["bbox"]["xmin"] = json!("bbox.label");
        document["columns"]["geometry"]["covering"]["bbox"]["ymin"] = json!("id.ymin");
        document["columns"]["geometry"]["covering"]["bbox"]["ymax"] = json!("missing.ymax");
        document["columns"]["other"] = minimal_document()["columns"]["geometry"].clone();

        let diagnostics = validator.validate(&document);
        assert_eq!(
            locations(&diagnostics),
            vec![
                "/columns/geometry/covering/bbox/xmin",
                "/columns/geometry/covering/bbox/ymin",
                "/columns/geometry/covering/bbox/ymax",
                "/columns/other",
            ]
        );
        assert!(diagnostics[0].message().contains("Utf8"));
    }

    #[test]
    fn test_strict_mode_wkb_type() {
        let schema = Schema::new(vec![Field::new("geometry", DataType::Utf8, true)]);
        let diagnostics = SemanticValidator::new()
            .with_lookup(&schema)
            .validate(&minimal_document());
        assert_eq!(locations(&diagnostics), vec!["/columns/geometry"]);

        let schema = Schema::new(vec![Arc::new(Field::new(
            "geometry",
            DataType::LargeBinary,
            true,
        ))]);
        assert!(SemanticValidator::new()
            .with_lookup(&schema)
            .validate(&minimal_document())
            .is_empty());
    }

    #[test]
    fn test_find_duplicate_columns() {
        let bytes = br#"{
            "version": "1.1.0",
            "primary_column": "geometry",
            "columns": {
                "geometry": {"encoding": "WKB", "geometry_types": []},
                "other": {"encoding": "WKB", "geometry_types": []},
                "geometry": {"encoding": "WKB", "geometry_types": ["Point"]},
                "geometry": {}
            }
        }"#;
        assert_eq!(find_duplicate_columns(bytes).unwrap(), vec!["geometry"]);

        let bytes = serde_json::to_vec(&full_document()).unwrap();
        assert!(find_duplicate_columns(&bytes).unwrap().is_empty());

        assert!(find_duplicate_columns(br#"{"columns": "foo"}"#).unwrap().is_empty());
        assert!(find_duplicate_columns(br#"{"columns": [1, {"a": 2}]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_columns_reported() {
        let diagnostics = SemanticValidator::new()
            .with_duplicate_columns(vec!["geometry".to_string()])
            .validate(&minimal_document());
        assert_eq!(locations(&diagnostics), vec!["/columns/geometry"]);
        assert!(diagnostics[0].message().contains("more than once"));
    }
}
