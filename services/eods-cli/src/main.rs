//! `eods`: command-line client for an EODS service.
//!
//! - `query`: search the catalog and list matching layers
//! - `run`: search, then download each layer through gs:Download
//! - `crop`: search, then crop each layer through ras:CropCoverage
//! - `layer-group create|modify`
//!
//! Credentials come from `--host/--user/--token` or the `HOST`, `API_USER`
//! and `API_TOKEN` environment variables (a `.env` file is honoured).

mod cli;
mod config;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use catalog::{CatalogClient, QueryOutcome, SafeGranuleSet};
use clap::Parser;
use eods_common::{Connection, HttpBackend, ReqwestBackend, TlsPolicy};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use wps_jobs::{JobOutcome, JobRequest, JobSettings, WpsJobRunner};
use wps_protocol::{BuiltinTemplates, FileTemplateRenderer, PayloadRenderer};

use cli::{Args, Command, JobArgs, LayerGroupCommand, QueryArgs};
use config::FileConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    if let Some(addr) = args.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(addr = %addr, "Prometheus metrics exporter listening");
    }

    let mut config = FileConfig::load(args.config.as_deref())?;
    if let Some(flag) = &args.tls_verify {
        config.client.tls = TlsPolicy::from_flag(flag);
    }
    if let Some(dir) = &args.output_dir {
        config.jobs.output_dir = dir.clone();
    }

    let connection = Connection::new(&args.host, &args.user, &args.token);
    let backend: Arc<dyn HttpBackend> = Arc::new(ReqwestBackend::new(&config.client)?);

    match args.command {
        Command::Query(query) => {
            let outcome = search(&backend, &connection, &query, &config.jobs).await?;
            for identifier in outcome.identifiers {
                println!("{}", identifier);
            }
        }
        Command::Run {
            query,
            job,
            output_format,
        } => {
            let outcome = search(&backend, &connection, &query, &config.jobs).await?;
            let requests: Vec<JobRequest> = outcome
                .identifiers
                .iter()
                .map(|layer| JobRequest::download(layer, &output_format, &job.mime_type))
                .collect();
            run_jobs(backend, connection, &job, config.jobs, &requests).await?;
        }
        Command::Crop { query, job, clip } => {
            let outcome = search(&backend, &connection, &query, &config.jobs).await?;
            let requests = crop_requests(&outcome, &job.mime_type, &clip)?;
            run_jobs(backend, connection, &job, config.jobs, &requests).await?;
        }
        Command::LayerGroup(command) => {
            let response = match command {
                LayerGroupCommand::Create {
                    name,
                    abstract_text,
                    layers,
                } => {
                    layer_groups::create_layer_group(
                        backend.as_ref(),
                        &connection,
                        &layers,
                        &name,
                        &abstract_text,
                    )
                    .await?
                }
                LayerGroupCommand::Modify {
                    id,
                    abstract_text,
                    layers,
                } => {
                    let id = layer_groups::parse_group_id(&id)?;
                    layer_groups::modify_layer_group(
                        backend.as_ref(),
                        &connection,
                        &layers,
                        id,
                        &abstract_text,
                    )
                    .await?
                }
            };
            if let Some(response) = response {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
    }

    Ok(())
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Run the catalog search for `query`.
async fn search(
    backend: &Arc<dyn HttpBackend>,
    connection: &Connection,
    query: &QueryArgs,
    jobs: &JobSettings,
) -> Result<QueryOutcome> {
    let filters = query.to_filters(jobs.output_dir.clone())?;

    let mut client = CatalogClient::new(backend.clone(), connection.clone());
    if let Some(path) = &query.safe_list {
        client = client.with_safe_list(Arc::new(SafeGranuleSet::from_path(path)?));
    }

    match client.query_catalog(&filters).await? {
        Some(outcome) => {
            if let Some(path) = &outcome.csv_path {
                info!(path = %path.display(), "Query results written");
            }
            Ok(outcome)
        }
        None => bail!("Catalog query failed, see log for details"),
    }
}

/// One `ras:CropCoverage` request per returned record, bounded by the
/// record's footprint. Records without a footprint are skipped.
fn crop_requests(outcome: &QueryOutcome, mime_type: &str, clip: &str) -> Result<Vec<JobRequest>> {
    let mut requests = Vec::new();
    for record in outcome.table.iter().flatten() {
        let Some(footprint) = record.geometry_wkt.as_deref() else {
            warn!(layer = %record.alternate, "Record has no footprint, skipping crop");
            continue;
        };
        let request = JobRequest::raster_crop(&record.alternate, mime_type, footprint, clip)
            .with_context(|| format!("Invalid geometry for {}", record.alternate))?;
        requests.push(request);
    }
    Ok(requests)
}

async fn run_jobs(
    backend: Arc<dyn HttpBackend>,
    connection: Connection,
    job: &JobArgs,
    settings: JobSettings,
    requests: &[JobRequest],
) -> Result<()> {
    if requests.is_empty() {
        warn!("No layers matched, nothing to submit");
        return Ok(());
    }

    let renderer: Arc<dyn PayloadRenderer> = match &job.template_dir {
        Some(dir) => Arc::new(FileTemplateRenderer::new(dir)),
        None => Arc::new(BuiltinTemplates),
    };

    tokio::fs::create_dir_all(&settings.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", settings.output_dir.display()))?;

    let runner = WpsJobRunner::new(backend, connection, renderer, settings);
    let outcomes = runner.run_batch(requests).await?;

    for outcome in &outcomes {
        match outcome {
            JobOutcome::Finished(state) => {
                println!(
                    "{}\t{}\t{}",
                    state.layer_name,
                    state.status,
                    state
                        .output_files
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                );
            }
            JobOutcome::NotSubmitted { layer_name, failure } => {
                println!("{}\tSUBMISSION-FAILED\t{}", layer_name, failure);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CatalogRecord;
    use wps_jobs::request::{CLIP_GEOMETRY_KEY, LOWER_CORNER_KEY};

    const CLIP: &str = "POLYGON((370000 207000, 375000 207000, 375000 212000, 370000 207000))";

    #[test]
    fn test_crop_requests_use_record_footprints() {
        let mut with_footprint = CatalogRecord::new("S2A_a", "geonode:S2A_a");
        with_footprint.geometry_wkt = Some(
            "POLYGON((-2.4591467333 51.7495497809,-2.34253580452 51.8218717504,-2.4591467333 51.7495497809))".into(),
        );
        let without_footprint = CatalogRecord::new("S2A_b", "geonode:S2A_b");
        let outcome = QueryOutcome {
            identifiers: vec!["geonode:S2A_a".into(), "geonode:S2A_b".into()],
            table: Some(vec![with_footprint, without_footprint]),
            csv_path: None,
        };

        let requests = crop_requests(&outcome, "application/zip", CLIP).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].layer_name, "geonode:S2A_a");
        assert!(requests[0].substitutions[LOWER_CORNER_KEY].starts_with("368399.6"));
        assert_eq!(requests[0].substitutions[CLIP_GEOMETRY_KEY], CLIP);
    }
}
