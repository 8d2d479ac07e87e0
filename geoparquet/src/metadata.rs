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

//! Typed model of the `geo` metadata document.
//!
//! Every struct keeps the members it does not recognize in an `extra` map,
//! so reading a document and writing it back preserves keys added by newer
//! format revisions or by other producers. Member order on output is the
//! declaration order below followed by the extra keys in their original order.
//!
//! Reading a document through this model checks types but not the
//! cross-member rules; run it through [`crate::validator::GeoParquetValidator`]
//! first when the source is untrusted.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::bounding_box::BoundingBox;
use crate::crs::{deserialize_optional_crs, Crs};
use crate::errors::{GeoParquetError, Result};
use crate::geometry_type::GeometryType;

/// Format versions a document may declare.
pub const KNOWN_VERSIONS: [&str; 5] = ["1.0.0-beta.1", "1.0.0-rc.1", "1.0.0", "1.1.0", "1.2.0-dev"];

/// Version written by [`crate::builder::GeoParquetMetadataBuilder`] unless
/// told otherwise.
pub const DEFAULT_VERSION: &str = "1.1.0";

/// How the values of a geometry column are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    /// Well-known binary, one blob per row.
    #[default]
    #[serde(rename = "WKB")]
    Wkb,
    #[serde(rename = "point")]
    Point,
    #[serde(rename = "linestring")]
    LineString,
    #[serde(rename = "polygon")]
    Polygon,
    #[serde(rename = "multipoint")]
    MultiPoint,
    #[serde(rename = "multilinestring")]
    MultiLineString,
    #[serde(rename = "multipolygon")]
    MultiPolygon,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Wkb => "WKB",
            Encoding::Point => "point",
            Encoding::LineString => "linestring",
            Encoding::Polygon => "polygon",
            Encoding::MultiPoint => "multipoint",
            Encoding::MultiLineString => "multilinestring",
            Encoding::MultiPolygon => "multipolygon",
        }
    }

    /// The 2D geometry type fixed by a native encoding, `None` for WKB.
    pub fn native_geometry_type(&self) -> Option<GeometryType> {
        match self {
            Encoding::Wkb => None,
            Encoding::Point => Some(GeometryType::Point),
            Encoding::LineString => Some(GeometryType::LineString),
            Encoding::Polygon => Some(GeometryType::Polygon),
            Encoding::MultiPoint => Some(GeometryType::MultiPoint),
            Encoding::MultiLineString => Some(GeometryType::MultiLineString),
            Encoding::MultiPolygon => Some(GeometryType::MultiPolygon),
        }
    }

    /// Returns true if every entry of `geometry_types` can be stored with this
    /// encoding. WKB can store anything; a native encoding only its own type,
    /// with or without Z.
    pub fn is_consistent_with(&self, geometry_types: &[GeometryType]) -> bool {
        match self.native_geometry_type() {
            None => true,
            Some(native) => geometry_types.iter().all(|t| t.to_2d() == native),
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = GeoParquetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WKB" => Ok(Encoding::Wkb),
            "point" => Ok(Encoding::Point),
            "linestring" => Ok(Encoding::LineString),
            "polygon" => Ok(Encoding::Polygon),
            "multipoint" => Ok(Encoding::MultiPoint),
            "multilinestring" => Ok(Encoding::MultiLineString),
            "multipolygon" => Ok(Encoding::MultiPolygon),
            _ => Err(metadata_err!("unknown encoding \"{s}\"")),
        }
    }
}

/// Interpretation of the line between two consecutive vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edges {
    /// Straight lines in the Cartesian plane.
    #[default]
    Planar,
    /// Shortest great-circle arcs on the sphere.
    Spherical,
}

/// Winding order of polygon rings. Only counterclockwise exterior rings can
/// be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[serde(rename = "counterclockwise")]
    CounterClockwise,
}

/// Reference to a field nested in a struct column, written `column.field`.
///
/// A path has at least two non-empty segments separated by `.`; the first
/// segment names a top-level column of the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn try_new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let segments = path.split('.').collect::<Vec<_>>();
        if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
            return Err(metadata_err!(
                "covering field path \"{path}\" must have at least two non-empty segments"
            ));
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The top-level column this path starts at.
    pub fn column(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        FieldPath::try_new(path).map_err(serde::de::Error::custom)
    }
}

/// Per-row bounding box columns, one field path per extremum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveringBbox {
    pub xmin: FieldPath,
    pub ymin: FieldPath,
    pub xmax: FieldPath,
    pub ymax: FieldPath,
}

impl CoveringBbox {
    /// Covering for a struct column `column` with fields named `xmin`,
    /// `ymin`, `xmax` and `ymax`.
    pub fn for_struct_column(column: &str) -> Result<Self> {
        Ok(Self {
            xmin: FieldPath::try_new(format!("{column}.xmin"))?,
            ymin: FieldPath::try_new(format!("{column}.ymin"))?,
            xmax: FieldPath::try_new(format!("{column}.xmax"))?,
            ymax: FieldPath::try_new(format!("{column}.ymax"))?,
        })
    }

    /// The four references in `xmin`, `ymin`, `xmax`, `ymax` order.
    pub fn paths(&self) -> [(&'static str, &FieldPath); 4] {
        [
            ("xmin", &self.xmin),
            ("ymin", &self.ymin),
            ("xmax", &self.xmax),
            ("ymax", &self.ymax),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Covering {
    pub bbox: CoveringBbox,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<CoveringBbox> for Covering {
    fn from(bbox: CoveringBbox) -> Self {
        Self {
            bbox,
            extra: Map::new(),
        }
    }
}

/// Metadata of one geometry column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub encoding: Encoding,
    /// Geometry types present in the column; empty means unknown.
    pub geometry_types: Vec<GeometryType>,
    /// `None` when the `crs` member is absent, which means `OGC:CRS84`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_crs"
    )]
    pub crs: Option<Crs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Edges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covering: Option<Covering>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ColumnMetadata {
    /// The declared edges, or [`Edges::Planar`] when absent.
    pub fn edges_or_default(&self) -> Edges {
        self.edges.unwrap_or_default()
    }
}

/// The document stored under the `geo` key of a parquet file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoParquetMetadata {
    pub version: String,
    pub primary_column: String,
    pub columns: IndexMap<String, ColumnMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GeoParquetMetadata {
    /// Parses a document from its JSON bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn try_from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Metadata of the primary geometry column.
    pub fn primary(&self) -> Option<&ColumnMetadata> {
        self.columns.get(&self.primary_column)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.get(name)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Compact JSON, as stored in the file footer.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl FromStr for GeoParquetMetadata {
    type Err = GeoParquetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from_slice(s.as_bytes())
    }
}
