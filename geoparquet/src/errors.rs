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

//! Common GeoParquet errors and macros.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use arrow_schema::ArrowError;
use parquet::errors::ParquetError;

/// Error type for all fallible operations in this crate.
///
/// Structural and semantic problems found while validating a document are
/// not errors: they are collected as [`Diagnostic`]s in a
/// [`ValidationReport`]. The variants here abort processing of the current
/// document.
///
/// [`Diagnostic`]: crate::report::Diagnostic
/// [`ValidationReport`]: crate::report::ValidationReport
#[derive(Debug)]
#[non_exhaustive]
pub enum GeoParquetError {
    /// The input is not well formed enough to be inspected, e.g. the `geo`
    /// key is missing or the value is not a JSON object.
    MalformedInput(String),
    /// A geometry kind outside the GeoParquet enumeration was encountered.
    UnknownGeometryKind(String),
    /// A well-known binary value could not be decoded.
    InvalidGeometry(String),
    /// A document could not be built without violating a metadata invariant.
    InvalidMetadata(String),
    /// The structural schema itself could not be compiled.
    Schema(String),
    /// Error when parsing or serializing JSON
    Json(serde_json::Error),
    /// Error raised by the parquet reader or writer
    Parquet(ParquetError),
    /// Error raised by an arrow array or schema operation
    Arrow(ArrowError),
    /// Error raised by a remote object store
    #[cfg(feature = "object_store")]
    ObjectStore(object_store::Error),
    /// Generic I/O error
    Io(std::io::Error),
}

impl Display for GeoParquetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            GeoParquetError::MalformedInput(msg) => write!(f, "Malformed input: {msg}"),
            GeoParquetError::UnknownGeometryKind(msg) => {
                write!(f, "Unknown geometry kind: {msg}")
            }
            GeoParquetError::InvalidGeometry(msg) => write!(f, "Invalid geometry: {msg}"),
            GeoParquetError::InvalidMetadata(msg) => write!(f, "Invalid metadata: {msg}"),
            GeoParquetError::Schema(msg) => write!(f, "Invalid metadata schema: {msg}"),
            GeoParquetError::Json(err) => write!(f, "JSON error: {err}"),
            GeoParquetError::Parquet(err) => write!(f, "Parquet error: {err}"),
            GeoParquetError::Arrow(err) => write!(f, "Arrow error: {err}"),
            #[cfg(feature = "object_store")]
            GeoParquetError::ObjectStore(err) => write!(f, "Object store error: {err}"),
            GeoParquetError::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl Error for GeoParquetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GeoParquetError::Json(err) => Some(err),
            GeoParquetError::Parquet(err) => Some(err),
            GeoParquetError::Arrow(err) => Some(err),
            #[cfg(feature = "object_store")]
            GeoParquetError::ObjectStore(err) => Some(err),
            GeoParquetError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GeoParquetError {
    fn from(err: serde_json::Error) -> Self {
        GeoParquetError::Json(err)
    }
}

impl From<ParquetError> for GeoParquetError {
    fn from(err: ParquetError) -> Self {
        GeoParquetError::Parquet(err)
    }
}

impl From<ArrowError> for GeoParquetError {
    fn from(err: ArrowError) -> Self {
        GeoParquetError::Arrow(err)
    }
}

#[cfg(feature = "object_store")]
impl From<object_store::Error> for GeoParquetError {
    fn from(err: object_store::Error) -> Self {
        GeoParquetError::ObjectStore(err)
    }
}

impl From<std::io::Error> for GeoParquetError {
    fn from(err: std::io::Error) -> Self {
        GeoParquetError::Io(err)
    }
}

impl From<GeoParquetError> for ArrowError {
    fn from(err: GeoParquetError) -> Self {
        ArrowError::ExternalError(Box::new(err))
    }
}

/// A specialized `Result` for GeoParquet errors.
pub type Result<T, E = GeoParquetError> = std::result::Result<T, E>;

macro_rules! malformed_err {
    ($fmt:expr) => (GeoParquetError::MalformedInput($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (GeoParquetError::MalformedInput(format!($fmt, $($args),*)));
}

macro_rules! metadata_err {
    ($fmt:expr) => (GeoParquetError::InvalidMetadata($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (GeoParquetError::InvalidMetadata(format!($fmt, $($args),*)));
}
