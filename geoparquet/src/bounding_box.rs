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

//! Bounding box of a geometry column, stored as the `bbox` member of a
//! column's metadata.
//!
//! In 2D representation, where x are points:
//! ```text
//!  ymax +-----------------------+
//!       |               x       |
//!       |      x                |
//!       |              x        |
//!       |      x                |
//!  ymin +-----------------------+
//!       xmin                    xmax
//! ```
//!
//! On the wire a bounding box is a flat array of either four
//! (`[xmin, ymin, xmax, ymax]`) or six (`[xmin, ymin, zmin, xmax, ymax, zmax]`)
//! numbers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{GeoParquetError, Result};

/// Number of decimal places used when rounding a bounding box for storage.
pub const DEFAULT_BBOX_PRECISION: u32 = 4;

/// An axis-aligned bounding box with X and Y and an optional Z range.
///
/// # Examples
///
/// ```
/// use geoparquet::bounding_box::BoundingBox;
///
/// // 2D bounding box
/// let bbox_2d = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
/// assert_eq!(bbox_2d.to_vec(), vec![0.0, 0.0, 100.0, 100.0]);
///
/// // 3D bounding box with elevation
/// let bbox_3d = BoundingBox::new(0.0, 0.0, 100.0, 100.0).with_zrange(0.0, 1000.0);
/// assert_eq!(bbox_3d.to_vec(), vec![0.0, 0.0, 0.0, 100.0, 100.0, 1000.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum X coordinate (longitude or easting)
    xmin: f64,
    /// Minimum Y coordinate (latitude or northing)
    ymin: f64,
    /// Maximum X coordinate (longitude or easting)
    xmax: f64,
    /// Maximum Y coordinate (latitude or northing)
    ymax: f64,
    /// Minimum and maximum Z coordinate (elevation/height), if present
    zrange: Option<(f64, f64)>,
}

impl BoundingBox {
    /// Creates a new 2D bounding box.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            zrange: None,
        }
    }

    /// Adds the specified Z-coordinate range.
    pub fn with_zrange(mut self, zmin: f64, zmax: f64) -> Self {
        self.zrange = Some((zmin, zmax));
        self
    }

    /// Builds a bounding box from its wire representation.
    ///
    /// Only slices of exactly four or six values are accepted.
    pub fn try_from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [xmin, ymin, xmax, ymax] => Ok(Self::new(xmin, ymin, xmax, ymax)),
            [xmin, ymin, zmin, xmax, ymax, zmax] => {
                Ok(Self::new(xmin, ymin, xmax, ymax).with_zrange(zmin, zmax))
            }
            _ => Err(GeoParquetError::InvalidMetadata(format!(
                "bbox must have 4 or 6 elements, found {}",
                values.len()
            ))),
        }
    }

    /// Returns the minimum x-coordinate.
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    /// Returns the minimum y-coordinate.
    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    /// Returns the maximum x-coordinate.
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    /// Returns the maximum y-coordinate.
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Returns the minimum z-coordinate, if present.
    pub fn zmin(&self) -> Option<f64> {
        self.zrange.map(|(zmin, _)| zmin)
    }

    /// Returns the maximum z-coordinate, if present.
    pub fn zmax(&self) -> Option<f64> {
        self.zrange.map(|(_, zmax)| zmax)
    }

    /// Returns `true` if this box carries a Z range.
    pub fn has_z(&self) -> bool {
        self.zrange.is_some()
    }

    /// Returns the wire representation: 4 values in 2D, 6 with a Z range.
    pub fn to_vec(&self) -> Vec<f64> {
        match self.zrange {
            Some((zmin, zmax)) => vec![self.xmin, self.ymin, zmin, self.xmax, self.ymax, zmax],
            None => vec![self.xmin, self.ymin, self.xmax, self.ymax],
        }
    }

    /// Returns `true` if `other` lies entirely within this box.
    ///
    /// Z is only compared when both boxes carry a Z range.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        let xy = self.xmin <= other.xmin
            && self.ymin <= other.ymin
            && self.xmax >= other.xmax
            && self.ymax >= other.ymax;

        match (self.zrange, other.zrange) {
            (Some((zmin, zmax)), Some((other_zmin, other_zmax))) => {
                xy && zmin <= other_zmin && zmax >= other_zmax
            }
            _ => xy,
        }
    }

    /// Rounds this box to `decimals` decimal places without shrinking it.
    ///
    /// Lower bounds are rounded toward negative infinity and upper bounds
    /// toward positive infinity, so every point covered by the original box
    /// is still covered by the rounded one. Round-to-nearest is never used.
    ///
    /// ```
    /// use geoparquet::bounding_box::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(-78.23114, 40.1, 12.00001, 41.99991).round_outward(4);
    /// assert_eq!(bbox.to_vec(), vec![-78.2312, 40.1, 12.0001, 42.0]);
    /// ```
    pub fn round_outward(&self, decimals: u32) -> Self {
        let mut out = Self::new(
            floor_to(self.xmin, decimals),
            floor_to(self.ymin, decimals),
            ceil_to(self.xmax, decimals),
            ceil_to(self.ymax, decimals),
        );
        if let Some((zmin, zmax)) = self.zrange {
            out = out.with_zrange(floor_to(zmin, decimals), ceil_to(zmax, decimals));
        }
        out
    }
}

/// Above this magnitude every `f64` is an integer.
const INTEGRAL: f64 = (1u64 << 52) as f64;

/// Returns `10^decimals` and `value` multiplied by it, or `None` when the
/// value has no digits left to round at that precision and is kept as is.
/// This covers non-finite values and products that overflow.
fn scaled(value: f64, decimals: u32) -> Option<(f64, f64)> {
    let scale = 10f64.powi(i32::try_from(decimals).ok()?);
    let scaled = value * scale;
    (scale.is_finite() && scaled.is_finite() && scaled.abs() < INTEGRAL)
        .then_some((scale, scaled))
}

fn floor_to(value: f64, decimals: u32) -> f64 {
    let Some((scale, scaled)) = scaled(value, decimals) else {
        return value;
    };
    let steps = scaled.floor();
    let rounded = steps / scale;
    // value * scale may itself have been rounded up past an integer
    if rounded > value {
        (steps - 1.0) / scale
    } else {
        rounded
    }
}

fn ceil_to(value: f64, decimals: u32) -> f64 {
    let Some((scale, scaled)) = scaled(value, decimals) else {
        return value;
    };
    let steps = scaled.ceil();
    let rounded = steps / scale;
    if rounded < value {
        (steps + 1.0) / scale
    } else {
        rounded
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}

impl<'de> Deserialize<'de> for BoundingBox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        BoundingBox::try_from_slice(&values).map_err(serde::de::Error::custom)
    }
}
