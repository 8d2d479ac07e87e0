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

//! Reading and writing the `geo` key of parquet files.
//!
//! Only the footer is read; no column data is decoded. Writing goes through
//! [`ArrowWriter`] with the document attached as file key/value metadata.

use std::io::Write;
use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_schema::extension::ExtensionType;
use arrow_schema::{Field, FieldRef, Schema, SchemaRef};
use parquet::arrow::arrow_reader::{ArrowReaderMetadata, ArrowReaderOptions};
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::ChunkReader;

use crate::errors::{GeoParquetError, Result};
use crate::metadata::{Encoding, GeoParquetMetadata};
use crate::types::WkbType;

/// Key of the parquet file key/value metadata holding the document.
pub const GEO_METADATA_KEY: &str = "geo";

/// The serialized `geo` document of a file and the file's Arrow schema.
#[derive(Debug, Clone)]
pub struct FileGeoMetadata {
    geo: Vec<u8>,
    schema: SchemaRef,
}

impl FileGeoMetadata {
    /// The document exactly as stored, not yet parsed.
    pub fn geo(&self) -> &[u8] {
        &self.geo
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }
}

/// Reads the `geo` document and Arrow schema from the footer of a parquet
/// file.
///
/// Returns [`GeoParquetError::MalformedInput`] if the file has no `geo` key.
pub fn read_geo_metadata<R: ChunkReader>(reader: &R) -> Result<FileGeoMetadata> {
    let metadata = ArrowReaderMetadata::load(reader, ArrowReaderOptions::new())?;
    from_reader_metadata(&metadata)
}

/// Reads the `geo` document and Arrow schema of a parquet file in object
/// storage, e.g. `s3://bucket/data.parquet` or `https://host/data.parquet`.
///
/// Only the footer is fetched.
#[cfg(feature = "object_store")]
pub async fn read_geo_metadata_async(url: &str) -> Result<FileGeoMetadata> {
    use object_store::ObjectStore;
    use parquet::arrow::async_reader::ParquetObjectReader;

    let parsed =
        url::Url::parse(url).map_err(|e| malformed_err!("invalid URL \"{}\": {}", url, e))?;
    let (store, path) = object_store::parse_url(&parsed)?;
    let store: Arc<dyn ObjectStore> = Arc::from(store);

    let meta = store.head(&path).await?;
    log::debug!("reading parquet footer of {url} ({} bytes)", meta.size);

    let mut reader = ParquetObjectReader::new(store, meta.location).with_file_size(meta.size);
    let metadata = ArrowReaderMetadata::load_async(&mut reader, ArrowReaderOptions::new()).await?;
    from_reader_metadata(&metadata)
}

fn from_reader_metadata(metadata: &ArrowReaderMetadata) -> Result<FileGeoMetadata> {
    let key_values = metadata
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|kv| kv.as_slice())
        .unwrap_or_default();

    let Some(entry) = key_values.iter().find(|kv| kv.key == GEO_METADATA_KEY) else {
        log::warn!("parquet file has no '{GEO_METADATA_KEY}' key");
        return Err(malformed_err!(
            "Parquet file does not have a '{}' key",
            GEO_METADATA_KEY
        ));
    };

    let geo = entry
        .value
        .as_ref()
        .ok_or_else(|| malformed_err!("Parquet file has an empty '{}' key", GEO_METADATA_KEY))?;

    Ok(FileGeoMetadata {
        geo: geo.as_bytes().to_vec(),
        schema: metadata.schema().clone(),
    })
}

/// Writes `batches` as a parquet file with `metadata` stored under the `geo`
/// key.
///
/// Every WKB geometry column of `metadata` must be a column of `schema`; its
/// field is tagged with the `geoarrow.wkb` extension type and the column's
/// CRS and edges.
pub fn write_table<W: Write + Send>(
    writer: W,
    schema: SchemaRef,
    batches: &[RecordBatch],
    metadata: &GeoParquetMetadata,
) -> Result<()> {
    let schema = tag_geometry_fields(&schema, metadata)?;

    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![KeyValue::new(
            GEO_METADATA_KEY.to_string(),
            metadata.to_json()?,
        )]))
        .build();

    let mut writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))?;
    for batch in batches {
        let batch = RecordBatch::try_new(schema.clone(), batch.columns().to_vec())?;
        writer.write(&batch)?;
    }
    writer.close()?;

    log::debug!(
        "wrote {} batch(es) with {} geometry column(s)",
        batches.len(),
        metadata.columns.len()
    );
    Ok(())
}

fn tag_geometry_fields(schema: &Schema, metadata: &GeoParquetMetadata) -> Result<SchemaRef> {
    for name in metadata.columns.keys() {
        if schema.field_with_name(name).is_err() {
            return Err(metadata_err!(
                "geometry column \"{}\" is not a column of the table",
                name
            ));
        }
    }

    let fields = schema
        .fields()
        .iter()
        .map(|field| -> Result<FieldRef> {
            match metadata.columns.get(field.name()) {
                Some(column) if column.encoding == Encoding::Wkb => {
                    let mut field = Field::clone(field);
                    field.try_with_extension_type(WkbType::from_column(column))?;
                    Ok(Arc::new(field))
                }
                _ => Ok(field.clone()),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Arc::new(Schema::new_with_metadata(
        fields,
        schema.metadata().clone(),
    )))
}

/// Returns the `geoarrow.wkb` extension type of a field, or `None` if the
/// field carries another extension type or none at all.
pub fn geoarrow_extension(field: &Field) -> Result<Option<WkbType>> {
    match field.extension_type_name() {
        Some(WkbType::NAME) => Ok(Some(field.try_extension_type::<WkbType>()?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use arrow_array::{BinaryArray, Int32Array};
    use arrow_schema::DataType;
    use bytes::Bytes;

    use super::*;
    use crate::bounding::GeometrySummary;
    use crate::builder::{ColumnMetadataBuilder, GeoParquetMetadataBuilder};
    use crate::testing::wkb_point_xy;
    use crate::types::WkbMetadata;

    fn table() -> (SchemaRef, RecordBatch) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("geometry", DataType::Binary, true),
        ]));
        let points = [wkb_point_xy(1.0, 2.0), wkb_point_xy(3.0, 4.0)];
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(BinaryArray::from_iter_values(points.iter())),
            ],
        )
        .unwrap();
        (schema, batch)
    }

    fn metadata(batch: &RecordBatch) -> GeoParquetMetadata {
        let column = ColumnMetadataBuilder::try_from_array(batch.column(1).as_ref())
            .unwrap()
            .build()
            .unwrap();
        GeoParquetMetadataBuilder::new("geometry")
            .add_column("geometry", column)
            .build()
            .unwrap()
    }

    #[test]
    fn test_write_read() {
        let (schema, batch) = table();
        let metadata = metadata(&batch);

        let mut buf = Vec::with_capacity(1024);
        write_table(&mut buf, schema, &[batch], &metadata).unwrap();

        let file = read_geo_metadata(&Bytes::from(buf)).unwrap();
        assert_eq!(file.geo(), metadata.to_json().unwrap().as_bytes());
        assert_eq!(
            GeoParquetMetadata::try_from_slice(file.geo()).unwrap(),
            metadata
        );

        let field = file.schema().field_with_name("geometry").unwrap();
        let wkb = geoarrow_extension(field).unwrap().unwrap();
        assert_eq!(wkb.metadata(), &WkbMetadata::default());
        let id = file.schema().field_with_name("id").unwrap();
        assert_eq!(geoarrow_extension(id).unwrap(), None);
    }

    #[test]
    fn test_missing_geo_key() {
        let (schema, batch) = table();
        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = read_geo_metadata(&Bytes::from(buf)).unwrap_err();
        assert!(matches!(err, GeoParquetError::MalformedInput(_)), "{err}");
    }

    #[test]
    fn test_not_parquet() {
        let err = read_geo_metadata(&Bytes::from_static(b"not a parquet file")).unwrap_err();
        assert!(matches!(err, GeoParquetError::Parquet(_)), "{err}");
    }

    #[test]
    fn test_geometry_column_not_in_table() {
        let (schema, batch) = table();
        let column = ColumnMetadataBuilder::try_from_array(batch.column(1).as_ref())
            .unwrap()
            .build()
            .unwrap();
        let metadata = GeoParquetMetadataBuilder::new("geom")
            .add_column("geom", column)
            .build()
            .unwrap();

        let err = write_table(Vec::new(), schema, &[batch], &metadata).unwrap_err();
        assert!(matches!(err, GeoParquetError::InvalidMetadata(_)), "{err}");
    }

    #[test]
    fn test_geometry_column_not_binary() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "geometry",
            DataType::Utf8,
            true,
        )]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(arrow_array::StringArray::from(vec!["POINT (1 2)"]))],
        )
        .unwrap();
        let column = ColumnMetadataBuilder::new(GeometrySummary::default())
            .build()
            .unwrap();
        let metadata = GeoParquetMetadataBuilder::new("geometry")
            .add_column("geometry", column)
            .build()
            .unwrap();

        let err = write_table(Vec::new(), schema, &[batch], &metadata).unwrap_err();
        assert!(matches!(err, GeoParquetError::Arrow(_)), "{err}");
    }
}
