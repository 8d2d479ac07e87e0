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

//! Build and validate [GeoParquet] `geo` metadata.
//!
//! A GeoParquet file is a parquet file whose footer carries a JSON document
//! under the `geo` key describing its geometry columns. This crate:
//!
//! * summarizes WKB geometry columns into geometry types and bounding boxes
//!   ([`bounding`]),
//! * assembles `geo` documents from those summaries ([`builder`]),
//! * validates documents against the bundled JSON schema ([`schema`]) and
//!   against the cross-field rules a schema cannot express ([`semantic`]),
//!   collecting every problem in a [`ValidationReport`] ([`validator`]),
//! * reads and writes the `geo` key of parquet files ([`file`]).
//!
//! # Example
//!
//! ```
//! # use std::sync::Arc;
//! # use arrow_array::{BinaryArray, RecordBatch};
//! # use arrow_schema::{DataType, Field, Schema};
//! use geoparquet::builder::{ColumnMetadataBuilder, GeoParquetMetadataBuilder};
//! use geoparquet::file::{read_geo_metadata, write_table};
//! use geoparquet::validator::GeoParquetValidator;
//! # use geoparquet::testing::wkb_point_xy;
//!
//! let geometry = BinaryArray::from_iter_values([wkb_point_xy(1.0, 2.0), wkb_point_xy(3.0, 4.0)]);
//! let column = ColumnMetadataBuilder::try_from_array(&geometry)?.build()?;
//! let metadata = GeoParquetMetadataBuilder::new("geometry")
//!     .add_column("geometry", column)
//!     .build()?;
//!
//! let schema = Arc::new(Schema::new(vec![Field::new("geometry", DataType::Binary, true)]));
//! let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(geometry)])?;
//! let mut buf = Vec::new();
//! write_table(&mut buf, schema, &[batch], &metadata)?;
//!
//! let file = read_geo_metadata(&bytes::Bytes::from(buf))?;
//! let table: &Schema = file.schema();
//! let report = GeoParquetValidator::try_new()?.validate_slice(file.geo(), Some(table))?;
//! assert!(report.is_valid());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [GeoParquet]: https://geoparquet.org

#[macro_use]
pub mod errors;

pub mod bounding;
pub mod bounding_box;
pub mod builder;
pub mod crs;
pub mod file;
pub mod geometry_type;
pub mod interval;
pub mod metadata;
pub mod report;
pub mod schema;
pub mod semantic;
pub mod testing;
pub mod types;
pub mod validator;

pub use errors::{GeoParquetError, Result};
pub use metadata::{ColumnMetadata, GeoParquetMetadata};
pub use report::{Diagnostic, DiagnosticKind, ValidationReport};
pub use validator::GeoParquetValidator;
