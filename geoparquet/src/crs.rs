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

//! Coordinate reference system descriptors.
//!
//! A CRS is never interpreted by this crate: a PROJJSON object is carried
//! through verbatim, and an explicit `null` records that the producer did not
//! know the CRS. A column without a `crs` key at all is in `OGC:CRS84`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::errors::{GeoParquetError, Result};
use crate::metadata::Edges;

/// Identifier of the CRS implied when a column has no `crs` key.
pub const DEFAULT_CRS: &str = "OGC:CRS84";

#[derive(Debug, Clone, PartialEq)]
pub enum Crs {
    /// Serialized as `null`: the CRS is undefined and consumers must not
    /// assume a default.
    Unknown,
    /// A PROJJSON object.
    Projjson(Map<String, Value>),
}

impl Crs {
    /// Wraps a PROJJSON value. Anything but a JSON object is rejected; in
    /// particular bare strings such as `"EPSG:4326"` must be expanded first.
    pub fn try_from_projjson(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Crs::Projjson(map)),
            other => Err(GeoParquetError::InvalidMetadata(format!(
                "crs must be a PROJJSON object or null, found {other}"
            ))),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Crs::Unknown)
    }

    /// Returns the PROJJSON `id` as `AUTHORITY:CODE`, if the object has one.
    pub fn authority_code(&self) -> Option<String> {
        let Crs::Projjson(projjson) = self else {
            return None;
        };

        let id = projjson.get("id")?;
        let authority = id.get("authority")?.as_str()?;
        match id.get("code")? {
            Value::String(code) => Some(format!("{authority}:{code}")),
            Value::Number(code) => Some(format!("{authority}:{code}")),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Crs::Unknown => Value::Null,
            Crs::Projjson(projjson) => Value::Object(projjson.clone()),
        }
    }
}

impl Serialize for Crs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Crs::Unknown => serializer.serialize_none(),
            Crs::Projjson(projjson) => projjson.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Crs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Crs::Unknown),
            value => Crs::try_from_projjson(value).map_err(serde::de::Error::custom),
        }
    }
}

/// Deserializes a present `crs` key, mapping `null` to [`Crs::Unknown`]
/// rather than to `None`.
pub(crate) fn deserialize_optional_crs<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Crs>, D::Error>
where
    D: Deserializer<'de>,
{
    Crs::deserialize(deserializer).map(Some)
}

/// Builds the `ARROW:extension:metadata` value of a `geoarrow.wkb` field.
///
/// A column without a `crs` key is written with the `OGC:CRS84` authority
/// code, an unknown CRS is omitted, and spherical edges are recorded.
pub fn geoarrow_metadata(crs: Option<&Crs>, edges: Edges) -> String {
    let mut out = Map::new();
    match crs {
        None => {
            out.insert("crs".to_string(), json!(DEFAULT_CRS));
            out.insert("crs_type".to_string(), json!("authority_code"));
        }
        Some(Crs::Unknown) => {}
        Some(crs) => {
            out.insert("crs".to_string(), crs.to_value());
            out.insert("crs_type".to_string(), json!("projjson"));
        }
    }

    if edges == Edges::Spherical {
        out.insert("edges".to_string(), json!("spherical"));
    }

    Value::Object(out).to_string()
}
