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

//! Builders producing [`GeoParquetMetadata`] from geometry summaries.
//!
//! A document returned by [`GeoParquetMetadataBuilder::build`] always passes
//! both validation layers; any input that would make it invalid is rejected
//! with [`GeoParquetError::InvalidMetadata`] instead.
//!
//! ```
//! use arrow_array::BinaryArray;
//! use geoparquet::builder::{ColumnMetadataBuilder, GeoParquetMetadataBuilder};
//! use geoparquet::testing::wkb_point_xy;
//!
//! let points = [wkb_point_xy(1.0, 1.0), wkb_point_xy(2.0, 2.0), wkb_point_xy(3.0, 3.0)];
//! let array = BinaryArray::from_iter_values(points.iter());
//!
//! let column = ColumnMetadataBuilder::try_from_array(&array).unwrap().build().unwrap();
//! let metadata = GeoParquetMetadataBuilder::new("geometry")
//!     .add_column("geometry", column)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     metadata.to_json().unwrap(),
//!     r#"{"version":"1.1.0","primary_column":"geometry","columns":{"geometry":{"encoding":"WKB","geometry_types":["Point"],"bbox":[1.0,1.0,3.0,3.0]}}}"#
//! );
//! ```

use arrow_array::Array;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::bounding::GeometrySummary;
use crate::bounding_box::{BoundingBox, DEFAULT_BBOX_PRECISION};
use crate::crs::Crs;
use crate::errors::{GeoParquetError, Result};
use crate::metadata::{
    ColumnMetadata, Covering, Edges, Encoding, GeoParquetMetadata, Orientation, DEFAULT_VERSION,
    KNOWN_VERSIONS,
};

/// Builds the metadata of one geometry column from its [`GeometrySummary`].
#[derive(Debug, Clone)]
pub struct ColumnMetadataBuilder {
    summary: GeometrySummary,
    encoding: Encoding,
    crs: Option<Crs>,
    edges: Option<Edges>,
    orientation: Option<Orientation>,
    epoch: Option<f64>,
    covering: Option<Covering>,
    bbox_precision: Option<u32>,
    extra: Map<String, Value>,
}

impl ColumnMetadataBuilder {
    /// Returns a builder for a WKB column without a `crs` member (so in
    /// `OGC:CRS84`), with planar edges left implicit and the bounding box
    /// rounded outward to [`DEFAULT_BBOX_PRECISION`] decimals.
    pub fn new(summary: GeometrySummary) -> Self {
        Self {
            summary,
            encoding: Encoding::Wkb,
            crs: None,
            edges: None,
            orientation: None,
            epoch: None,
            covering: None,
            bbox_precision: Some(DEFAULT_BBOX_PRECISION),
            extra: Map::new(),
        }
    }

    /// Summarizes an Arrow array of WKB values and returns a builder for it.
    pub fn try_from_array(array: &dyn Array) -> Result<Self> {
        Ok(Self::new(GeometrySummary::try_from_array(array)?))
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the `crs` member. Use [`Crs::Unknown`] to write an explicit
    /// `null`.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_edges(mut self, edges: Edges) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_epoch(mut self, epoch: f64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn with_covering(mut self, covering: impl Into<Covering>) -> Self {
        self.covering = Some(covering.into());
        self
    }

    /// Sets the number of decimals the bounding box is rounded outward to,
    /// or `None` to keep it exact.
    pub fn with_bbox_precision(mut self, decimals: Option<u32>) -> Self {
        self.bbox_precision = decimals;
        self
    }

    /// Adds a member outside the known set, written after the known ones.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<ColumnMetadata> {
        let geometry_types = self.summary.geometry_types();
        if !self.encoding.is_consistent_with(&geometry_types) {
            return Err(metadata_err!(
                "encoding \"{}\" cannot store geometry types {:?}",
                self.encoding,
                geometry_types.iter().map(|t| t.as_str()).collect::<Vec<_>>()
            ));
        }

        if let Some(epoch) = self.epoch {
            if !epoch.is_finite() {
                return Err(metadata_err!("epoch must be a finite number, found {}", epoch));
            }
        }

        for name in self.extra.keys() {
            if is_known_column_member(name) {
                return Err(metadata_err!(
                    "\"{}\" is a column metadata member and cannot be set as an extra key",
                    name
                ));
            }
        }

        if let Some(name) = self
            .covering
            .iter()
            .flat_map(|covering| covering.extra.keys())
            .find(|k| k.as_str() == "bbox")
        {
            return Err(metadata_err!(
                "\"{}\" is a covering member and cannot be set as an extra key",
                name
            ));
        }

        let bbox = self
            .summary
            .bbox()
            .map(|bbox| match self.bbox_precision {
                Some(decimals) => bbox.round_outward(decimals),
                None => bbox.clone(),
            })
            .filter(|bbox| {
                let finite = is_finite(bbox);
                if !finite {
                    log::warn!("omitting bbox with non-finite bounds {:?}", bbox.to_vec());
                }
                finite
            });

        Ok(ColumnMetadata {
            encoding: self.encoding,
            geometry_types,
            crs: self.crs,
            edges: self.edges,
            orientation: self.orientation,
            bbox,
            epoch: self.epoch,
            covering: self.covering,
            extra: self.extra,
        })
    }
}

fn is_finite(bbox: &BoundingBox) -> bool {
    bbox.to_vec().iter().all(|v| v.is_finite())
}

fn is_known_column_member(name: &str) -> bool {
    matches!(
        name,
        "encoding"
            | "geometry_types"
            | "crs"
            | "edges"
            | "orientation"
            | "bbox"
            | "epoch"
            | "covering"
    )
}

/// Assembles a [`GeoParquetMetadata`] document from column metadata.
#[derive(Debug, Clone)]
pub struct GeoParquetMetadataBuilder {
    version: String,
    primary_column: String,
    columns: IndexMap<String, ColumnMetadata>,
    repeated_columns: Vec<String>,
    extra: Map<String, Value>,
}

impl GeoParquetMetadataBuilder {
    /// Returns a builder for a document at [`DEFAULT_VERSION`] whose primary
    /// geometry column is `primary_column`.
    pub fn new(primary_column: impl Into<String>) -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            primary_column: primary_column.into(),
            columns: IndexMap::new(),
            repeated_columns: vec![],
            extra: Map::new(),
        }
    }

    /// Sets the format version, which must be one of [`KNOWN_VERSIONS`].
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adds a geometry column. Columns are written in insertion order.
    pub fn add_column(mut self, name: impl Into<String>, column: ColumnMetadata) -> Self {
        let name = name.into();
        if self.columns.contains_key(&name) {
            self.repeated_columns.push(name.clone());
        }
        self.columns.insert(name, column);
        self
    }

    /// Adds a top-level member outside the known set.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<GeoParquetMetadata> {
        if !KNOWN_VERSIONS.contains(&self.version.as_str()) {
            return Err(metadata_err!(
                "unknown version \"{}\", expected one of {:?}",
                self.version,
                KNOWN_VERSIONS
            ));
        }

        if self.primary_column.is_empty() {
            return Err(metadata_err!("primary column name must not be empty"));
        }

        if self.columns.is_empty() {
            return Err(metadata_err!("at least one geometry column is required"));
        }

        if !self.columns.contains_key(&self.primary_column) {
            return Err(metadata_err!(
                "primary column \"{}\" is not one of the geometry columns",
                self.primary_column
            ));
        }

        if self.columns.contains_key("") {
            return Err(metadata_err!("geometry column names must not be empty"));
        }

        if let Some(name) = self.repeated_columns.first() {
            return Err(metadata_err!("geometry column \"{}\" was added twice", name));
        }

        if let Some(name) = self
            .extra
            .keys()
            .find(|k| matches!(k.as_str(), "version" | "primary_column" | "columns"))
        {
            return Err(metadata_err!(
                "\"{}\" is a document member and cannot be set as an extra key",
                name
            ));
        }

        log::debug!(
            "built geo metadata for {} column(s), primary column \"{}\"",
            self.columns.len(),
            self.primary_column
        );

        Ok(GeoParquetMetadata {
            version: self.version,
            primary_column: self.primary_column,
            columns: self.columns,
            extra: self.extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use arrow_array::BinaryArray;
    use serde_json::json;
    use wkt::Wkt;

    use super::*;
    use crate::bounding::GeometryBounder;
    use crate::geometry_type::GeometryType;
    use crate::metadata::CoveringBbox;
    use crate::testing::wkb_point_xy;
    use crate::validator::GeoParquetValidator;

    fn summary(wkt_values: &[&str]) -> GeometrySummary {
        let mut bounder = GeometryBounder::empty();
        for value in wkt_values {
            let wkt: Wkt = Wkt::from_str(value).unwrap();
            bounder.update(&wkt).unwrap();
        }
        bounder.finish()
    }

    fn assert_valid(metadata: &GeoParquetMetadata) {
        let validator = GeoParquetValidator::try_new().unwrap();
        let report = validator.validate_metadata(metadata, None).unwrap();
        assert!(report.is_valid(), "{:?}", report.into_diagnostics());
    }

    #[test]
    fn test_three_points() {
        let points = [
            wkb_point_xy(1.0, 1.0),
            wkb_point_xy(2.0, 2.0),
            wkb_point_xy(3.0, 3.0),
        ];
        let array = BinaryArray::from_iter_values(points.iter());

        let column = ColumnMetadataBuilder::try_from_array(&array)
            .unwrap()
            .with_edges(Edges::Planar)
            .build()
            .unwrap();
        assert_eq!(column.geometry_types, vec![GeometryType::Point]);
        assert_eq!(column.bbox, Some(BoundingBox::new(1.0, 1.0, 3.0, 3.0)));
        assert_eq!(column.crs, None);

        let metadata = GeoParquetMetadataBuilder::new("geometry")
            .add_column("geometry", column)
            .build()
            .unwrap();
        assert_valid(&metadata);
    }

    #[test]
    fn test_empty_summary() {
        let column = ColumnMetadataBuilder::new(GeometrySummary::default())
            .build()
            .unwrap();
        assert!(column.geometry_types.is_empty());
        assert_eq!(column.bbox, None);

        let metadata = GeoParquetMetadataBuilder::new("geometry")
            .add_column("geometry", column)
            .build()
            .unwrap();
        assert_eq!(
            metadata.to_value().unwrap()["columns"]["geometry"],
            json!({"encoding": "WKB", "geometry_types": []})
        );
        assert_valid(&metadata);
    }

    #[test]
    fn test_bbox_rounded_outward() {
        let summary = summary(&["POINT (-78.23114 40.1)", "POINT (12.00001 41.99991)"]);

        let rounded = ColumnMetadataBuilder::new(summary.clone()).build().unwrap();
        assert_eq!(
            rounded.bbox.unwrap().to_vec(),
            vec![-78.2312, 40.1, 12.0001, 42.0]
        );

        let exact = ColumnMetadataBuilder::new(summary)
            .with_bbox_precision(None)
            .build()
            .unwrap();
        assert_eq!(
            exact.bbox.unwrap().to_vec(),
            vec![-78.23114, 40.1, 12.00001, 41.99991]
        );
    }

    #[test]
    fn test_all_options() {
        let summary = summary(&["POLYGON Z ((0 0 0, 1 0 0, 1 1 5, 0 0 0))", "POINT Z (2 2 2)"]);
        let crs = Crs::try_from_projjson(json!({"type": "GeographicCRS", "name": "WGS 84"}))
            .unwrap();

        let column = ColumnMetadataBuilder::new(summary)
            .with_crs(crs)
            .with_edges(Edges::Spherical)
            .with_orientation(Orientation::CounterClockwise)
            .with_epoch(2021.5)
            .with_covering(CoveringBbox::for_struct_column("bbox").unwrap())
            .with_extra("note", json!("tile 7"))
            .build()
            .unwrap();
        assert_eq!(
            column.geometry_types,
            vec![GeometryType::PointZ, GeometryType::PolygonZ]
        );
        assert_eq!(
            column.bbox,
            Some(BoundingBox::new(0.0, 0.0, 2.0, 2.0).with_zrange(0.0, 5.0))
        );

        let metadata = GeoParquetMetadataBuilder::new("geometry")
            .add_column("geometry", column)
            .add_column(
                "other",
                ColumnMetadataBuilder::new(GeometrySummary::default())
                    .with_crs(Crs::Unknown)
                    .build()
                    .unwrap(),
            )
            .with_extra("creator", json!({"library": "geoparquet"}))
            .build()
            .unwrap();

        let value = metadata.to_value().unwrap();
        assert_eq!(value["columns"]["other"]["crs"], Value::Null);
        assert_eq!(value["columns"]["geometry"]["edges"], "spherical");
        assert_eq!(value["columns"]["geometry"]["note"], "tile 7");
        assert_eq!(value["creator"]["library"], "geoparquet");
        assert_valid(&metadata);
    }

    #[test]
    fn test_native_encoding() {
        let points = summary(&["POINT (0 1)", "POINT Z (0 1 2)"]);
        let column = ColumnMetadataBuilder::new(points.clone())
            .with_encoding(Encoding::Point)
            .build()
            .unwrap();
        assert_eq!(column.encoding, Encoding::Point);

        let err = ColumnMetadataBuilder::new(points)
            .with_encoding(Encoding::Polygon)
            .build()
            .unwrap_err();
        assert!(matches!(err, GeoParquetError::InvalidMetadata(_)));
    }

    #[test]
    fn test_column_errors() {
        let err = ColumnMetadataBuilder::new(GeometrySummary::default())
            .with_epoch(f64::NAN)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("epoch"));

        let err = ColumnMetadataBuilder::new(GeometrySummary::default())
            .with_extra("bbox", json!([0, 0, 1, 1]))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("bbox"));
    }

    #[test]
    fn test_non_finite_bbox_omitted() {
        let points = [wkb_point_xy(0.0, 1.0), wkb_point_xy(f64::INFINITY, 2.0)];
        let array = BinaryArray::from_iter_values(points.iter());
        let column = ColumnMetadataBuilder::try_from_array(&array)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(column.bbox, None);
        assert_eq!(column.geometry_types, vec![GeometryType::Point]);
    }

    #[test]
    fn test_large_coordinates_keep_bbox() {
        let points = [wkb_point_xy(1e305, 1e305), wkb_point_xy(2e305, 2e305)];
        let array = BinaryArray::from_iter_values(points.iter());
        let column = ColumnMetadataBuilder::try_from_array(&array)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            column.bbox,
            Some(BoundingBox::new(1e305, 1e305, 2e305, 2e305))
        );

        let metadata = GeoParquetMetadataBuilder::new("geometry")
            .add_column("geometry", column)
            .build()
            .unwrap();
        assert_valid(&metadata);

        let read = GeoParquetMetadata::try_from_slice(&metadata.to_bytes().unwrap()).unwrap();
        assert_eq!(read, metadata);
    }

    #[test]
    fn test_bbox_precision_beyond_f64() {
        for decimals in [309, 400] {
            let column = ColumnMetadataBuilder::new(summary(&["POINT (0 1)", "POINT (0.1 2)"]))
                .with_bbox_precision(Some(decimals))
                .build()
                .unwrap();
            assert_eq!(
                column.bbox.as_ref().unwrap().to_vec(),
                vec![0.0, 1.0, 0.1, 2.0]
            );

            let metadata = GeoParquetMetadataBuilder::new("geometry")
                .add_column("geometry", column)
                .build()
                .unwrap();
            assert_valid(&metadata);
        }
    }

    #[test]
    fn test_covering_extra_bbox_rejected() {
        let mut covering = Covering::from(CoveringBbox::for_struct_column("bbox").unwrap());
        covering.extra.insert("bbox".to_string(), json!("other"));
        let err = ColumnMetadataBuilder::new(GeometrySummary::default())
            .with_covering(covering.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, GeoParquetError::InvalidMetadata(_)));
        assert!(err.to_string().contains("covering"), "{err}");

        covering.extra.remove("bbox");
        covering.extra.insert("tiles".to_string(), json!({"level": 3}));
        let column = ColumnMetadataBuilder::new(GeometrySummary::default())
            .with_covering(covering)
            .build()
            .unwrap();
        let metadata = GeoParquetMetadataBuilder::new("geometry")
            .add_column("geometry", column)
            .build()
            .unwrap();
        assert_valid(&metadata);
    }

    #[test]
    fn test_document_errors() {
        let column = || {
            ColumnMetadataBuilder::new(GeometrySummary::default())
                .build()
                .unwrap()
        };

        let cases = [
            GeoParquetMetadataBuilder::new("geometry").with_version("0.4.0"),
            GeoParquetMetadataBuilder::new(""),
            GeoParquetMetadataBuilder::new("geometry"),
            GeoParquetMetadataBuilder::new("geom").add_column("geometry", column()),
            GeoParquetMetadataBuilder::new("geometry")
                .add_column("geometry", column())
                .add_column("", column()),
            GeoParquetMetadataBuilder::new("geometry")
                .add_column("geometry", column())
                .add_column("geometry", column()),
            GeoParquetMetadataBuilder::new("geometry")
                .add_column("geometry", column())
                .with_extra("version", json!("1.0.0")),
        ];

        for (i, builder) in cases.into_iter().enumerate() {
            let err = builder.build().unwrap_err();
            assert!(matches!(err, GeoParquetError::InvalidMetadata(_)), "case {i}: {err}");
        }
    }

    #[test]
    fn test_versions() {
        for version in KNOWN_VERSIONS {
            let metadata = GeoParquetMetadataBuilder::new("geometry")
                .with_version(version)
                .add_column(
                    "geometry",
                    ColumnMetadataBuilder::new(GeometrySummary::default())
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap();
            assert_eq!(metadata.version, version);
            assert_valid(&metadata);
        }
    }
}
