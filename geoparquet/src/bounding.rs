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

//! Accumulates the geometry types and bounding box of a geometry column.
//!
//! [`GeometryBounder`] is fed one geometry (or one Arrow array of WKB values)
//! at a time and keeps only running min/max intervals and the set of observed
//! geometry types, so arbitrarily large columns can be summarized in constant
//! memory. [`GeometryBounder::finish`] produces the [`GeometrySummary`]
//! consumed by the metadata builder.

use std::collections::BTreeSet;

use arrow_array::cast::AsArray;
use arrow_array::Array;
use arrow_schema::DataType;
use geo_traits::{
    CoordTrait, Dimensions, GeometryCollectionTrait, GeometryTrait, GeometryType as GeoTraitsType,
    LineStringTrait, MultiLineStringTrait, MultiPointTrait, MultiPolygonTrait, PointTrait,
    PolygonTrait,
};
use wkb::reader::Wkb;

use crate::bounding_box::BoundingBox;
use crate::errors::{GeoParquetError, Result};
use crate::geometry_type::GeometryType;
use crate::interval::Interval;

/// Summary of a geometry column: the distinct geometry types and, unless the
/// column held no coordinates at all, its bounding box.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometrySummary {
    geometry_types: BTreeSet<GeometryType>,
    bbox: Option<BoundingBox>,
}

impl GeometrySummary {
    /// Summarizes an Arrow array of WKB values in one pass.
    pub fn try_from_array(array: &dyn Array) -> Result<Self> {
        let mut bounder = GeometryBounder::empty();
        bounder.update_array(array)?;
        Ok(bounder.finish())
    }

    /// The distinct geometry types, sorted by WKB code.
    pub fn geometry_types(&self) -> Vec<GeometryType> {
        self.geometry_types.iter().copied().collect()
    }

    /// The bounding box, or `None` when [`Self::is_empty`].
    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    /// Returns true if no non-null, non-empty geometry was seen.
    pub fn is_empty(&self) -> bool {
        self.bbox.is_none()
    }
}

#[derive(Debug)]
pub struct GeometryBounder {
    x: Interval,
    y: Interval,
    z: Interval,
    geometry_types: BTreeSet<GeometryType>,
}

impl GeometryBounder {
    pub fn empty() -> Self {
        Self {
            x: Interval::empty(),
            y: Interval::empty(),
            z: Interval::empty(),
            geometry_types: BTreeSet::new(),
        }
    }

    pub fn x(&self) -> Interval {
        self.x
    }

    pub fn y(&self) -> Interval {
        self.y
    }

    pub fn z(&self) -> Interval {
        self.z
    }

    pub fn geometry_types(&self) -> Vec<GeometryType> {
        self.geometry_types.iter().copied().collect()
    }

    /// Updates with every non-null value of a `Binary`, `LargeBinary` or
    /// `BinaryView` array of WKB.
    pub fn update_array(&mut self, array: &dyn Array) -> Result<()> {
        match array.data_type() {
            DataType::Binary => self.update_wkb_values(array.as_binary::<i32>().iter()),
            DataType::LargeBinary => self.update_wkb_values(array.as_binary::<i64>().iter()),
            DataType::BinaryView => self.update_wkb_values(array.as_binary_view().iter()),
            other => Err(GeoParquetError::InvalidGeometry(format!(
                "expected an array of WKB values, found {other}"
            ))),
        }
    }

    fn update_wkb_values<'a>(
        &mut self,
        values: impl IntoIterator<Item = Option<&'a [u8]>>,
    ) -> Result<()> {
        // Nulls contribute neither a type nor coordinates
        for wkb in values.into_iter().flatten() {
            self.update_wkb(wkb)?;
        }
        Ok(())
    }

    pub fn update_wkb(&mut self, wkb: &[u8]) -> Result<()> {
        let geometry =
            Wkb::try_new(wkb).map_err(|e| GeoParquetError::InvalidGeometry(e.to_string()))?;
        self.update(&geometry)
    }

    /// Updates with a single geometry. The geometry type is recorded even
    /// for empty geometries, which contribute no coordinates.
    pub fn update(&mut self, geom: &impl GeometryTrait<T = f64>) -> Result<()> {
        let geometry_type = geometry_type(geom)?;
        self.geometry_types.insert(geometry_type);
        self.visit(geom)
    }

    fn visit(&mut self, geom: &impl GeometryTrait<T = f64>) -> Result<()> {
        match geom.as_type() {
            GeoTraitsType::Point(point) => {
                if let Some(coord) = PointTrait::coord(point) {
                    self.update_coord(&coord);
                }
            }
            GeoTraitsType::LineString(line) => self.update_coords(line.coords()),
            GeoTraitsType::Polygon(polygon) => {
                // Interior rings are not assumed to lie within the exterior
                for ring in polygon.exterior().into_iter().chain(polygon.interiors()) {
                    self.update_coords(ring.coords());
                }
            }
            GeoTraitsType::MultiPoint(points) => {
                for point in points.points() {
                    self.visit(&point)?;
                }
            }
            GeoTraitsType::MultiLineString(lines) => {
                for line in lines.line_strings() {
                    self.visit(&line)?;
                }
            }
            GeoTraitsType::MultiPolygon(polygons) => {
                for polygon in polygons.polygons() {
                    self.visit(&polygon)?;
                }
            }
            GeoTraitsType::GeometryCollection(collection) => {
                for child in collection.geometries() {
                    self.visit(&child)?;
                }
            }
            _ => {
                return Err(GeoParquetError::UnknownGeometryKind(
                    "only OGC simple feature types can be bounded".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn update_coords(&mut self, coords: impl IntoIterator<Item = impl CoordTrait<T = f64>>) {
        for coord in coords {
            self.update_coord(&coord);
        }
    }

    fn update_coord(&mut self, coord: &impl CoordTrait<T = f64>) {
        self.x.update_value(coord.x());
        self.y.update_value(coord.y());
        if let Some(z_index) = z_index(coord.dim()) {
            if let Some(z) = coord.nth(z_index) {
                self.z.update_value(z);
            }
        }
    }

    pub fn finish(self) -> GeometrySummary {
        let bbox = if self.x.is_empty() || self.y.is_empty() {
            None
        } else {
            let bbox = BoundingBox::new(self.x.lo(), self.y.lo(), self.x.hi(), self.y.hi());
            if self.z.is_empty() {
                Some(bbox)
            } else {
                Some(bbox.with_zrange(self.z.lo(), self.z.hi()))
            }
        };

        GeometrySummary {
            geometry_types: self.geometry_types,
            bbox,
        }
    }
}

impl Default for GeometryBounder {
    fn default() -> Self {
        Self::empty()
    }
}

fn geometry_type(geom: &impl GeometryTrait<T = f64>) -> Result<GeometryType> {
    let has_z = match geom.dim() {
        Dimensions::Xy => false,
        Dimensions::Xyz => true,
        Dimensions::Xym | Dimensions::Xyzm => {
            return Err(GeoParquetError::UnknownGeometryKind(
                "geometries with an M dimension have no GeoParquet geometry type".to_string(),
            ))
        }
        Dimensions::Unknown(n) => {
            return Err(GeoParquetError::UnknownGeometryKind(format!(
                "unsupported coordinate dimension {n}"
            )))
        }
    };

    let geometry_type = match geom.as_type() {
        GeoTraitsType::Point(_) => GeometryType::Point,
        GeoTraitsType::LineString(_) => GeometryType::LineString,
        GeoTraitsType::Polygon(_) => GeometryType::Polygon,
        GeoTraitsType::MultiPoint(_) => GeometryType::MultiPoint,
        GeoTraitsType::MultiLineString(_) => GeometryType::MultiLineString,
        GeoTraitsType::MultiPolygon(_) => GeometryType::MultiPolygon,
        GeoTraitsType::GeometryCollection(_) => GeometryType::GeometryCollection,
        _ => {
            return Err(GeoParquetError::UnknownGeometryKind(
                "only OGC simple feature types have a GeoParquet geometry type".to_string(),
            ))
        }
    };

    Ok(if has_z {
        geometry_type.with_z()
    } else {
        geometry_type
    })
}

fn z_index(dim: Dimensions) -> Option<usize> {
    match dim {
        Dimensions::Xyz | Dimensions::Xyzm => Some(2),
        _ => None,
    }
}
