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

//! The closed set of geometry types that may appear in `geometry_types`.
//!
//! Geometry types are plain enum variants everywhere inside this crate and are
//! only converted to their human readable names (`"Point"`, `"Polygon Z"`, ...)
//! at the serialization boundary.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{GeoParquetError, Result};

/// A geometry type, optionally with a Z dimension.
///
/// The declaration order matches the ISO WKB type codes, so sorting a list of
/// [`GeometryType`]s orders 2D types before 3D ones and otherwise follows the
/// WKB numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    PointZ,
    LineStringZ,
    PolygonZ,
    MultiPointZ,
    MultiLineStringZ,
    MultiPolygonZ,
    GeometryCollectionZ,
}

impl GeometryType {
    /// All geometry types in WKB code order.
    pub const ALL: [GeometryType; 14] = [
        GeometryType::Point,
        GeometryType::LineString,
        GeometryType::Polygon,
        GeometryType::MultiPoint,
        GeometryType::MultiLineString,
        GeometryType::MultiPolygon,
        GeometryType::GeometryCollection,
        GeometryType::PointZ,
        GeometryType::LineStringZ,
        GeometryType::PolygonZ,
        GeometryType::MultiPointZ,
        GeometryType::MultiLineStringZ,
        GeometryType::MultiPolygonZ,
        GeometryType::GeometryCollectionZ,
    ];

    /// The name used in GeoParquet metadata, e.g. `"MultiPolygon Z"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
            GeometryType::PointZ => "Point Z",
            GeometryType::LineStringZ => "LineString Z",
            GeometryType::PolygonZ => "Polygon Z",
            GeometryType::MultiPointZ => "MultiPoint Z",
            GeometryType::MultiLineStringZ => "MultiLineString Z",
            GeometryType::MultiPolygonZ => "MultiPolygon Z",
            GeometryType::GeometryCollectionZ => "GeometryCollection Z",
        }
    }

    /// Returns the ISO WKB type code (`1..=7` for XY, `1001..=1007` for XYZ).
    pub fn wkb_code(&self) -> i32 {
        let base = self.to_2d() as i32 + 1;
        if self.has_z() {
            base + 1000
        } else {
            base
        }
    }

    /// Converts an ISO WKB type code into a [`GeometryType`].
    ///
    /// Codes with an M dimension (`2xxx`, `3xxx`) have no GeoParquet name and
    /// are rejected along with any other unknown code.
    pub fn try_from_wkb_code(code: i32) -> Result<Self> {
        let (dimension, base) = (code / 1000, code % 1000);
        let geometry_type = match base {
            1..=7 => Self::ALL[(base - 1) as usize],
            _ => {
                return Err(GeoParquetError::UnknownGeometryKind(format!(
                    "WKB geometry type code {code}"
                )))
            }
        };

        match dimension {
            0 => Ok(geometry_type),
            1 => Ok(geometry_type.with_z()),
            _ => Err(GeoParquetError::UnknownGeometryKind(format!(
                "WKB geometry type code {code} has an M dimension"
            ))),
        }
    }

    /// Returns true for the `... Z` variants.
    pub fn has_z(&self) -> bool {
        matches!(
            self,
            GeometryType::PointZ
                | GeometryType::LineStringZ
                | GeometryType::PolygonZ
                | GeometryType::MultiPointZ
                | GeometryType::MultiLineStringZ
                | GeometryType::MultiPolygonZ
                | GeometryType::GeometryCollectionZ
        )
    }

    /// Returns the XY variant of this geometry type.
    pub fn to_2d(&self) -> Self {
        match self {
            GeometryType::PointZ => GeometryType::Point,
            GeometryType::LineStringZ => GeometryType::LineString,
            GeometryType::PolygonZ => GeometryType::Polygon,
            GeometryType::MultiPointZ => GeometryType::MultiPoint,
            GeometryType::MultiLineStringZ => GeometryType::MultiLineString,
            GeometryType::MultiPolygonZ => GeometryType::MultiPolygon,
            GeometryType::GeometryCollectionZ => GeometryType::GeometryCollection,
            other => *other,
        }
    }

    /// Returns the XYZ variant of this geometry type.
    pub fn with_z(&self) -> Self {
        match self {
            GeometryType::Point => GeometryType::PointZ,
            GeometryType::LineString => GeometryType::LineStringZ,
            GeometryType::Polygon => GeometryType::PolygonZ,
            GeometryType::MultiPoint => GeometryType::MultiPointZ,
            GeometryType::MultiLineString => GeometryType::MultiLineStringZ,
            GeometryType::MultiPolygon => GeometryType::MultiPolygonZ,
            GeometryType::GeometryCollection => GeometryType::GeometryCollectionZ,
            other => *other,
        }
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryType {
    type Err = GeoParquetError;

    /// Parses a GeoParquet geometry type name.
    ///
    /// Names are matched exactly: `"PointZ"` (missing the space before `Z`)
    /// and `"point"` are both rejected.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|geometry_type| geometry_type.as_str() == s)
            .copied()
            .ok_or_else(|| GeoParquetError::UnknownGeometryKind(format!("\"{s}\"")))
    }
}

impl Serialize for GeometryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GeometryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
