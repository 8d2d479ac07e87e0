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

//! Structural validation of `geo` documents against a JSON schema.
//!
//! Required members, member types, enumerations and array lengths are all
//! expressed in a draft-07 JSON schema rather than in code. The schema for
//! the current format revision is bundled with the crate (see
//! [`BUNDLED_SCHEMA`]); other revisions can be supplied as data with
//! [`StructuralValidator::try_new`].

use jsonschema::Validator;
use serde_json::Value;

use crate::errors::{GeoParquetError, Result};
use crate::report::Diagnostic;

/// The draft-07 schema of the `geo` document shipped with this crate.
pub const BUNDLED_SCHEMA: &str = include_str!("../format/schema.json");

/// Checks a document against a JSON schema and reports every violation.
pub struct StructuralValidator {
    schema: Value,
    validator: Validator,
}

impl std::fmt::Debug for StructuralValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralValidator")
            .field("title", &self.schema.get("title"))
            .finish_non_exhaustive()
    }
}

impl StructuralValidator {
    /// Compiles the schema shipped with this crate.
    pub fn bundled() -> Result<Self> {
        let schema: Value = serde_json::from_str(BUNDLED_SCHEMA)?;
        Self::try_new(&schema)
    }

    /// Compiles an arbitrary schema.
    ///
    /// The draft is taken from the schema's `$schema` member. Remote `$ref`s
    /// are not resolved.
    pub fn try_new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| GeoParquetError::Schema(e.to_string()))?;
        log::debug!(
            "compiled structural schema {}",
            schema.get("title").and_then(Value::as_str).unwrap_or("<untitled>")
        );
        Ok(Self {
            schema: schema.clone(),
            validator,
        })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns one diagnostic per schema violation, in the order the schema
    /// walk finds them. An empty result means the document is structurally
    /// valid.
    ///
    /// Each diagnostic carries the `description` of the violated schema node,
    /// when it has one, as its hint.
    pub fn validate(&self, instance: &Value) -> Vec<Diagnostic> {
        let diagnostics = self
            .validator
            .iter_errors(instance)
            .map(|error| {
                let diagnostic =
                    Diagnostic::structural(error.instance_path.as_str(), error.to_string());
                match self.description(error.schema_path.as_str()) {
                    Some(hint) => diagnostic.with_hint(hint),
                    None => diagnostic,
                }
            })
            .collect::<Vec<_>>();

        log::debug!("structural validation found {} problem(s)", diagnostics.len());
        diagnostics
    }

    /// Finds the description of the schema node owning the keyword at
    /// `keyword_path`.
    fn description(&self, keyword_path: &str) -> Option<&str> {
        let (node_path, _keyword) = keyword_path.rsplit_once('/')?;
        self.schema
            .pointer(node_path)?
            .get("description")?
            .as_str()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::metadata::KNOWN_VERSIONS;
    use crate::report::DiagnosticKind;
    use crate::testing::{full_document, minimal_document};

    fn validator() -> StructuralValidator {
        StructuralValidator::bundled().unwrap()
    }

    #[test]
    fn test_bundled_versions_match_known_versions() {
        let schema: Value = serde_json::from_str(BUNDLED_SCHEMA).unwrap();
        assert_eq!(schema["properties"]["version"]["enum"], json!(KNOWN_VERSIONS));
    }

    #[test]
    fn test_valid_documents() {
        let validator = validator();
        assert_eq!(validator.validate(&minimal_document()), vec![]);
        assert_eq!(validator.validate(&full_document()), vec![]);
    }

    #[test]
    fn test_location_and_hint() {
        let mut document = minimal_document();
        document["columns"]["geometry"]["edges"] = json!("ellipsoid");

        let diagnostics = validator().validate(&document);
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.kind(), DiagnosticKind::Structural);
        assert_eq!(diagnostic.location(), "/columns/geometry/edges");
        assert!(diagnostic.message().contains("ellipsoid"));
        assert!(diagnostic.hint().unwrap().starts_with("Name of the coordinate system"));
    }

    #[test]
    fn test_missing_member_reported_at_parent() {
        let mut document = minimal_document();
        document.as_object_mut().unwrap().remove("version");

        let diagnostics = validator().validate(&document);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location(), "");
        assert!(diagnostics[0].message().contains("version"));
    }

    #[test]
    fn test_reports_every_violation() {
        let mut document = minimal_document();
        document["version"] = json!("bad-version");
        document["columns"]["geometry"]["orientation"] = json!("clockwise");
        document["columns"]["geometry"]["bbox"] = json!([0, 0, 0]);

        let locations = validator()
            .validate(&document)
            .into_iter()
            .map(|d| d.location().to_string())
            .collect::<Vec<_>>();
        assert!(locations.contains(&"/version".to_string()));
        assert!(locations.contains(&"/columns/geometry/orientation".to_string()));
        assert!(locations.contains(&"/columns/geometry/bbox".to_string()));
    }

    #[test]
    fn test_custom_schema() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["version"],
            "properties": {"version": {"const": "0.4.0", "description": "Old version"}}
        });
        let validator = StructuralValidator::try_new(&schema).unwrap();
        assert!(validator.validate(&json!({"version": "0.4.0"})).is_empty());

        let diagnostics = validator.validate(&json!({"version": "1.1.0"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].hint(), Some("Old version"));
    }

    #[test]
    fn test_invalid_schema() {
        let schema = json!({"type": "not-a-type"});
        let err = StructuralValidator::try_new(&schema).unwrap_err();
        assert!(matches!(err, GeoParquetError::Schema(_)));
    }
}
