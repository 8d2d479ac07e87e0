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

//! Binary file to validate the `geo` metadata of a GeoParquet file.
//!
//! # Install
//!
//! `geoparquet-validate` can be installed using `cargo`:
//! ```text
//! cargo install geoparquet --features=cli
//! ```
//! After this `geoparquet-validate` should be available:
//! ```text
//! geoparquet-validate XYZ.parquet
//! ```
//!
//! Remote files are supported when built with the `object_store` feature:
//! ```text
//! cargo run --features=cli,object_store --bin geoparquet-validate s3://bucket/XYZ.parquet
//! ```
//!
//! Exit status is 0 if the metadata is valid, 1 if it is not, and 2 if the
//! file could not be read or has no usable `geo` key.

use std::fs::File;
use std::process::ExitCode;

use anyhow::{Context, Result};
use arrow_schema::Schema;
use clap::Parser;
use geoparquet::file::{read_geo_metadata, FileGeoMetadata};
use geoparquet::report::ValidationReport;
use geoparquet::semantic::SchemaLookup;
use geoparquet::validator::GeoParquetValidator;
use tracing_log::log::info;

/// Logging CLI config.
#[derive(Debug, Parser)]
struct LoggingArgs {
    /// Log verbosity.
    ///
    /// Defaults to "warn".
    ///
    /// Use `-v` for "info", `-vv` for "debug", `-vvv` for "trace".
    ///
    /// Note you can also set logging level using `RUST_LOG` environment variable:
    /// `RUST_LOG=debug`.
    #[clap(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
    )]
    log_verbose_count: u8,
}

#[derive(Debug, Parser)]
#[clap(author, version, about("Validate the geo metadata of a GeoParquet file"), long_about = None)]
struct Args {
    /// Path or URL of the parquet file.
    ///
    /// URLs (`s3://`, `gs://`, `az://`, `http(s)://`) require the
    /// `object_store` feature.
    file_or_url: String,

    /// Also check geometry columns and covering fields against the file's schema.
    #[clap(long)]
    strict: bool,

    /// Print the validation report as JSON instead of text.
    #[clap(long)]
    json: bool,

    /// Print the `geo` metadata before validating it.
    #[clap(long)]
    print_metadata: bool,

    #[clap(flatten)]
    logging_args: LoggingArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = setup_logging(&args.logging_args) {
        eprintln!("{e:#}");
        return ExitCode::from(2);
    }

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let file = load(&args.file_or_url)?;

    if args.print_metadata {
        print_metadata(file.geo());
    }

    let validator = GeoParquetValidator::try_new().context("compile bundled schema")?;
    let table: &Schema = file.schema();
    let lookup: Option<&dyn SchemaLookup> = match args.strict {
        true => Some(table),
        false => None,
    };
    let report = validator
        .validate_slice(file.geo(), lookup)
        .with_context(|| format!("validate geo metadata of {}", args.file_or_url))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(report.is_valid())
}

fn load(file_or_url: &str) -> Result<FileGeoMetadata> {
    info!("loading {file_or_url}");
    if file_or_url.contains("://") {
        return load_url(file_or_url);
    }

    let file = File::open(file_or_url).with_context(|| format!("open {file_or_url}"))?;
    Ok(read_geo_metadata(&file)?)
}

#[cfg(feature = "object_store")]
fn load_url(url: &str) -> Result<FileGeoMetadata> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start tokio runtime")?;
    Ok(runtime.block_on(geoparquet::file::read_geo_metadata_async(url))?)
}

#[cfg(not(feature = "object_store"))]
fn load_url(url: &str) -> Result<FileGeoMetadata> {
    Err(geoparquet::GeoParquetError::MalformedInput(format!(
        "cannot read {url}: built without the object_store feature"
    ))
    .into())
}

fn print_metadata(geo: &[u8]) {
    match serde_json::from_slice::<serde_json::Value>(geo) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{}", String::from_utf8_lossy(geo)),
        },
        Err(_) => println!("{}", String::from_utf8_lossy(geo)),
    }
    println!();
}

fn print_report(report: &ValidationReport) {
    for diagnostic in report.diagnostics() {
        println!("{diagnostic}");
        if let Some(hint) = diagnostic.hint() {
            println!("    hint: {hint}");
        }
    }

    if report.is_valid() {
        println!("geo metadata is valid");
    } else {
        println!("geo metadata is NOT valid: {} problem(s)", report.len());
    }
}

fn setup_logging(args: &LoggingArgs) -> Result<()> {
    use tracing_subscriber::{util::SubscriberInitExt, EnvFilter, FmtSubscriber};

    tracing_log::LogTracer::init().context("tracing log init")?;

    let filter = match args.log_verbose_count {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_new(filter).context("set up log env filter")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    subscriber.try_init().context("init logging subscriber")?;

    Ok(())
}
