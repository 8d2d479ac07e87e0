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

//! Testing utilities for GeoParquet metadata and geometry columns

use serde_json::{json, Value};

/// Build well-known binary representing a point with the given XY coordinate
pub fn wkb_point_xy(x: f64, y: f64) -> Vec<u8> {
    let mut item: [u8; 21] = [0; 21];
    item[0] = 0x01;
    item[1] = 0x01;
    item[5..13].copy_from_slice(x.to_le_bytes().as_slice());
    item[13..21].copy_from_slice(y.to_le_bytes().as_slice());
    item.to_vec()
}

/// Build well-known binary representing a point with the given XYZ coordinate
pub fn wkb_point_xyz(x: f64, y: f64, z: f64) -> Vec<u8> {
    let mut item: [u8; 29] = [0; 29];
    item[0] = 0x01;
    item[1..5].copy_from_slice(1001_u32.to_le_bytes().as_slice());
    item[5..13].copy_from_slice(x.to_le_bytes().as_slice());
    item[13..21].copy_from_slice(y.to_le_bytes().as_slice());
    item[21..29].copy_from_slice(z.to_le_bytes().as_slice());
    item.to_vec()
}

/// Build well-known binary representing a point with the given XYZM coordinate
pub fn wkb_point_xyzm(x: f64, y: f64, z: f64, m: f64) -> Vec<u8> {
    let mut item: [u8; 37] = [0; 37];
    item[0] = 0x01;
    item[1..5].copy_from_slice(3001_u32.to_le_bytes().as_slice());
    item[5..13].copy_from_slice(x.to_le_bytes().as_slice());
    item[13..21].copy_from_slice(y.to_le_bytes().as_slice());
    item[21..29].copy_from_slice(z.to_le_bytes().as_slice());
    item[29..37].copy_from_slice(m.to_le_bytes().as_slice());
    item.to_vec()
}

/// A minimal valid `geo` document with a single WKB column named `geometry`.
pub fn minimal_document() -> Value {
    json!({
        "version": "1.1.0",
        "primary_column": "geometry",
        "columns": {
            "geometry": {
                "encoding": "WKB",
                "geometry_types": []
            }
        }
    })
}

/// A valid `geo` document exercising most optional column members.
pub fn full_document() -> Value {
    json!({
        "version": "1.1.0",
        "primary_column": "geometry",
        "columns": {
            "geometry": {
                "encoding": "WKB",
                "geometry_types": ["Polygon", "MultiPolygon"],
                "crs": {
                    "$schema": "https://proj.org/schemas/v0.7/projjson.schema.json",
                    "type": "GeographicCRS",
                    "name": "WGS 84 longitude-latitude",
                    "id": {"authority": "OGC", "code": "CRS84"}
                },
                "edges": "planar",
                "orientation": "counterclockwise",
                "bbox": [-180.0, -90.0, 180.0, 90.0],
                "epoch": 2021.47,
                "covering": {
                    "bbox": {
                        "xmin": "bbox.xmin",
                        "ymin": "bbox.ymin",
                        "xmax": "bbox.xmax",
                        "ymax": "bbox.ymax"
                    }
                }
            }
        }
    })
}
