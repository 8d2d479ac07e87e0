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

//! Entry point running both validation layers over one document.

use serde_json::Value;

use crate::errors::{GeoParquetError, Result};
use crate::metadata::GeoParquetMetadata;
use crate::report::ValidationReport;
use crate::schema::StructuralValidator;
use crate::semantic::{find_duplicate_columns, SchemaLookup, SemanticValidator};

/// Validates `geo` documents structurally and then semantically.
///
/// The validator holds no per-document state and can be shared between
/// threads.
///
/// ```
/// use geoparquet::validator::GeoParquetValidator;
///
/// let validator = GeoParquetValidator::try_new().unwrap();
/// let report = validator
///     .validate_slice(br#"{"version": "1.1.0", "primary_column": "geom", "columns": {}}"#, None)
///     .unwrap();
/// assert!(!report.is_valid());
/// for diagnostic in report.diagnostics() {
///     println!("{diagnostic}");
/// }
/// ```
#[derive(Debug)]
pub struct GeoParquetValidator {
    structural: StructuralValidator,
}

impl GeoParquetValidator {
    /// Creates a validator using the bundled schema.
    pub fn try_new() -> Result<Self> {
        Ok(Self::new(StructuralValidator::bundled()?))
    }

    pub fn new(structural: StructuralValidator) -> Self {
        Self { structural }
    }

    pub fn structural(&self) -> &StructuralValidator {
        &self.structural
    }

    /// Validates a serialized document, as read from a file footer.
    ///
    /// Returns [`GeoParquetError::MalformedInput`] if `bytes` is not a JSON
    /// object. When `lookup` is given, semantic validation runs in strict
    /// mode against it.
    pub fn validate_slice(
        &self,
        bytes: &[u8],
        lookup: Option<&dyn SchemaLookup>,
    ) -> Result<ValidationReport> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|e| malformed_err!("geo metadata is not valid JSON: {}", e))?;
        check_is_object(&document)?;

        let duplicates = find_duplicate_columns(bytes)
            .map_err(|e| malformed_err!("geo metadata is not valid JSON: {}", e))?;
        Ok(self.run(&document, duplicates, lookup))
    }

    /// Validates an already parsed document.
    ///
    /// Repeated column names cannot be detected here since a [`Value`] only
    /// keeps one of them; use [`Self::validate_slice`] on raw bytes for that.
    pub fn validate_value(
        &self,
        document: &Value,
        lookup: Option<&dyn SchemaLookup>,
    ) -> Result<ValidationReport> {
        check_is_object(document)?;
        Ok(self.run(document, vec![], lookup))
    }

    /// Validates a typed document, e.g. one produced by the builder.
    pub fn validate_metadata(
        &self,
        metadata: &GeoParquetMetadata,
        lookup: Option<&dyn SchemaLookup>,
    ) -> Result<ValidationReport> {
        self.validate_value(&metadata.to_value()?, lookup)
    }

    fn run(
        &self,
        document: &Value,
        duplicates: Vec<String>,
        lookup: Option<&dyn SchemaLookup>,
    ) -> ValidationReport {
        let structural = self.structural.validate(document);

        let mut semantic = SemanticValidator::new().with_duplicate_columns(duplicates);
        if let Some(lookup) = lookup {
            semantic = semantic.with_lookup(lookup);
        }
        let semantic = semantic.validate(document);

        let report = ValidationReport::new(structural, semantic);
        if report.is_valid() {
            log::info!("geo metadata is valid");
        } else {
            log::info!("geo metadata has {} problem(s)", report.len());
        }
        report
    }
}

fn check_is_object(document: &Value) -> Result<()> {
    match document {
        Value::Object(_) => Ok(()),
        Value::Null => Err(malformed_err!("geo metadata is null")),
        Value::Bool(_) => Err(malformed_err!("geo metadata is a boolean, expected an object")),
        Value::Number(_) => Err(malformed_err!("geo metadata is a number, expected an object")),
        Value::String(_) => Err(malformed_err!("geo metadata is a string, expected an object")),
        Value::Array(_) => Err(malformed_err!("geo metadata is an array, expected an object")),
    }
}
