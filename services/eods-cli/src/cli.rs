//! Command-line arguments.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use catalog::{CatalogFilters, RecordType, SatelliteId};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "eods")]
#[command(about = "Search the EODS catalog and run WPS download and crop jobs")]
pub struct Args {
    /// YAML file with `client:` and `jobs:` sections
    #[arg(long, env = "EODS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service domain, e.g. https://eods.example
    #[arg(long, env = "HOST")]
    pub host: String,

    #[arg(long, env = "API_USER")]
    pub user: String,

    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub token: String,

    /// `true`, `false` or the path of a PEM bundle to trust
    #[arg(long, env = "EODS_TLS_VERIFY")]
    pub tls_verify: Option<String>,

    /// Where downloads, `wps-log.csv` and query results are written
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Serve Prometheus metrics on this address while running
    #[arg(long, env = "EODS_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the catalog and list matching layers
    Query(QueryArgs),

    /// Search the catalog, then download every matching layer
    Run {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        job: JobArgs,

        /// `outputFormat` passed to gs:Download
        #[arg(long, default_value = "image/tiff")]
        output_format: String,
    },

    /// Search the catalog, then crop every matching layer to a geometry
    Crop {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        job: JobArgs,

        /// WKT clip geometry in British National Grid (EPSG:27700)
        #[arg(long)]
        clip: String,
    },

    /// Create or modify a layer group
    #[command(subcommand)]
    LayerGroup(LayerGroupCommand),
}

#[derive(Subcommand, Debug)]
pub enum LayerGroupCommand {
    Create {
        #[arg(long)]
        name: String,

        #[arg(long = "abstract", default_value = "")]
        abstract_text: String,

        /// Layer names, e.g. geonode:S2A_...
        #[arg(long = "layer", required = true)]
        layers: Vec<String>,
    },
    Modify {
        /// Numeric id of an existing group
        #[arg(long)]
        id: String,

        #[arg(long = "abstract", default_value = "")]
        abstract_text: String,

        #[arg(long = "layer", required = true)]
        layers: Vec<String>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct JobArgs {
    /// Mime type requested for the job output
    #[arg(long, default_value = "application/zip")]
    pub mime_type: String,

    /// Directory holding `<template>.xml` payload templates
    #[arg(long)]
    pub template_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RecordTypeArg {
    Layer,
    Raster,
    Vector,
}

impl From<RecordTypeArg> for RecordType {
    fn from(arg: RecordTypeArg) -> Self {
        match arg {
            RecordTypeArg::Layer => RecordType::Layer,
            RecordTypeArg::Raster => RecordType::Raster,
            RecordTypeArg::Vector => RecordType::Vector,
        }
    }
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct QueryArgs {
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// 1 for Sentinel-1, 2 for Sentinel-2
    #[arg(long)]
    pub satellite_id: Option<u8>,

    /// Match or partial match on the layer title
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub cloud_min: Option<u8>,

    #[arg(long)]
    pub cloud_max: Option<u8>,

    /// WGS84 WKT; layers intersecting it are returned
    #[arg(long)]
    pub geometry: Option<String>,

    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long, value_enum)]
    pub record_type: Option<RecordTypeArg>,

    /// Keep only the least cloudy granule per footprint (Sentinel-2)
    #[arg(long)]
    pub find_least_cloud: bool,

    /// Drop split granule halves from the results
    #[arg(long)]
    pub ignore_split_granules: bool,

    /// Safe granule/orbit list used by --find-least-cloud
    #[arg(long)]
    pub safe_list: Option<PathBuf>,
}

impl QueryArgs {
    pub fn to_filters(&self, output_dir: PathBuf) -> Result<CatalogFilters> {
        let satellite_id = self
            .satellite_id
            .map(SatelliteId::try_from)
            .transpose()
            .map_err(|e| anyhow!(e))?;

        Ok(CatalogFilters {
            start_date: self.start_date,
            end_date: self.end_date,
            satellite_id,
            title: self.title.clone(),
            cloud_min: self.cloud_min,
            cloud_max: self.cloud_max,
            geometry: self.geometry.clone(),
            result_limit: self.limit,
            record_type: self.record_type.map(RecordType::from),
            find_least_cloud: self.find_least_cloud,
            ignore_split_granules: self.ignore_split_granules,
            output_directory: Some(output_dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let args = Args::try_parse_from([
            "eods",
            "--host",
            "https://eo.example",
            "--user",
            "analyst",
            "--token",
            "tok",
            "run",
            "--satellite-id",
            "2",
            "--start-date",
            "2019-04-01",
            "--end-date",
            "2019-04-30",
            "--find-least-cloud",
        ])
        .unwrap();

        let Command::Run { query, job, output_format } = args.command else {
            panic!("expected run");
        };
        assert_eq!(output_format, "image/tiff");
        assert_eq!(job.mime_type, "application/zip");

        let filters = query.to_filters(PathBuf::from("out")).unwrap();
        assert_eq!(filters.satellite_id, Some(SatelliteId::Sentinel2));
        assert!(filters.find_least_cloud);
        assert_eq!(filters.output_directory, Some(PathBuf::from("out")));
        filters.validate().unwrap();
    }

    #[test]
    fn test_unknown_satellite() {
        let query = QueryArgs {
            satellite_id: Some(3),
            ..Default::default()
        };
        assert!(query.to_filters(PathBuf::from(".")).is_err());
    }

    #[test]
    fn test_layer_group_arguments() {
        let args = Args::try_parse_from([
            "eods", "--host", "h", "--user", "u", "--token", "t", "layer-group", "modify", "--id",
            "12", "--layer", "geonode:a", "--layer", "geonode:b",
        ])
        .unwrap();

        match args.command {
            Command::LayerGroup(LayerGroupCommand::Modify { id, layers, .. }) => {
                assert_eq!(id, "12");
                assert_eq!(layers.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
