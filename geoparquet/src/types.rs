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

//! The `geoarrow.wkb` Arrow extension type.

use arrow_schema::extension::ExtensionType;
use arrow_schema::{ArrowError, DataType};
use serde_json::Value;

use crate::crs::{geoarrow_metadata, Crs, DEFAULT_CRS};
use crate::metadata::{ColumnMetadata, Edges};

/// Extension metadata of a `geoarrow.wkb` field.
///
/// `crs` follows the same convention as [`ColumnMetadata::crs`]: `None` is
/// `OGC:CRS84` and [`Crs::Unknown`] means the CRS is undefined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WkbMetadata {
    pub crs: Option<Crs>,
    pub edges: Edges,
}

/// Arrow extension type of binary columns holding ISO WKB geometries.
///
/// Extension name: `geoarrow.wkb`. The storage type is `Binary`,
/// `LargeBinary` or `BinaryView`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WkbType(WkbMetadata);

impl WkbType {
    pub fn new(metadata: WkbMetadata) -> Self {
        Self(metadata)
    }

    /// The extension type of a column described by `column`.
    pub fn from_column(column: &ColumnMetadata) -> Self {
        Self(WkbMetadata {
            crs: column.crs.clone(),
            edges: column.edges_or_default(),
        })
    }
}

impl ExtensionType for WkbType {
    const NAME: &'static str = "geoarrow.wkb";

    type Metadata = WkbMetadata;

    fn metadata(&self) -> &Self::Metadata {
        &self.0
    }

    fn serialize_metadata(&self) -> Option<String> {
        Some(geoarrow_metadata(self.0.crs.as_ref(), self.0.edges))
    }

    fn deserialize_metadata(metadata: Option<&str>) -> Result<Self::Metadata, ArrowError> {
        let metadata = match metadata {
            None | Some("") => "{}",
            Some(metadata) => metadata,
        };

        let invalid = |msg: String| {
            ArrowError::InvalidArgumentError(format!("invalid geoarrow.wkb metadata: {msg}"))
        };
        let value: Value = serde_json::from_str(metadata).map_err(|e| invalid(e.to_string()))?;
        let Value::Object(object) = value else {
            return Err(invalid(format!("expected an object, found {metadata}")));
        };

        let crs = match object.get("crs") {
            None | Some(Value::Null) => Some(Crs::Unknown),
            Some(Value::String(code)) if code == DEFAULT_CRS => None,
            Some(Value::String(code)) => {
                return Err(invalid(format!(
                    "authority code \"{code}\" cannot be expressed as PROJJSON"
                )))
            }
            Some(crs) => Some(
                Crs::try_from_projjson(crs.clone()).map_err(|e| invalid(e.to_string()))?,
            ),
        };

        let edges = match object.get("edges") {
            None => Edges::Planar,
            Some(edges) => {
                serde_json::from_value(edges.clone()).map_err(|e| invalid(e.to_string()))?
            }
        };

        Ok(WkbMetadata { crs, edges })
    }

    fn supports_data_type(&self, data_type: &DataType) -> Result<(), ArrowError> {
        match data_type {
            DataType::Binary | DataType::LargeBinary | DataType::BinaryView => Ok(()),
            data_type => Err(ArrowError::InvalidArgumentError(format!(
                "geoarrow.wkb data type mismatch, expected Binary, LargeBinary or BinaryView, found {data_type}"
            ))),
        }
    }

    fn try_new(data_type: &DataType, metadata: Self::Metadata) -> Result<Self, ArrowError> {
        let wkb = Self(metadata);
        wkb.supports_data_type(data_type)?;
        Ok(wkb)
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::extension::{EXTENSION_TYPE_METADATA_KEY, EXTENSION_TYPE_NAME_KEY};
    use arrow_schema::Field;
    use serde_json::json;

    use super::*;

    #[test]
    fn valid() -> Result<(), ArrowError> {
        let mut field = Field::new("geometry", DataType::Binary, true);
        field.try_with_extension_type(WkbType::default())?;
        assert_eq!(
            field.metadata().get(EXTENSION_TYPE_NAME_KEY).map(String::as_str),
            Some("geoarrow.wkb")
        );

        let wkb = field.try_extension_type::<WkbType>()?;
        assert_eq!(wkb.metadata(), &WkbMetadata::default());
        Ok(())
    }

    #[test]
    fn projjson_and_spherical() -> Result<(), ArrowError> {
        let crs = Crs::try_from_projjson(json!({"id": {"authority": "EPSG", "code": 4326}}))
            .map_err(ArrowError::from)?;
        let wkb = WkbType::new(WkbMetadata {
            crs: Some(crs),
            edges: Edges::Spherical,
        });

        let mut field = Field::new("geometry", DataType::LargeBinary, true);
        field.try_with_extension_type(wkb.clone())?;
        assert_eq!(field.try_extension_type::<WkbType>()?, wkb);
        Ok(())
    }

    #[test]
    fn unknown_crs() -> Result<(), ArrowError> {
        let wkb = WkbType::new(WkbMetadata {
            crs: Some(Crs::Unknown),
            edges: Edges::Planar,
        });
        assert_eq!(wkb.serialize_metadata().as_deref(), Some("{}"));

        let mut field = Field::new("geometry", DataType::BinaryView, true);
        field.try_with_extension_type(wkb.clone())?;
        assert_eq!(field.try_extension_type::<WkbType>()?, wkb);
        Ok(())
    }

    #[test]
    fn missing_metadata() {
        let metadata = WkbType::deserialize_metadata(None).unwrap();
        assert_eq!(metadata.crs, Some(Crs::Unknown));
        assert_eq!(metadata.edges, Edges::Planar);
    }

    #[test]
    #[should_panic(expected = "expected Binary, LargeBinary or BinaryView, found Utf8")]
    fn invalid_type() {
        Field::new("geometry", DataType::Utf8, true).with_extension_type(WkbType::default());
    }

    #[test]
    fn invalid_metadata() {
        let cases = [
            "not json",
            "[]",
            r#"{"crs":"EPSG:4326"}"#,
            r#"{"crs":42}"#,
            r#"{"edges":"ellipsoid"}"#,
        ];
        for metadata in cases {
            let field = Field::new("geometry", DataType::Binary, true).with_metadata(
                [
                    (EXTENSION_TYPE_NAME_KEY.to_owned(), "geoarrow.wkb".to_owned()),
                    (EXTENSION_TYPE_METADATA_KEY.to_owned(), metadata.to_owned()),
                ]
                .into_iter()
                .collect(),
            );
            let err = field.try_extension_type::<WkbType>().unwrap_err();
            assert!(err.to_string().contains("invalid geoarrow.wkb metadata"), "{err}");
        }
    }
}
