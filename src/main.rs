//! # crdtdot
//!
//! Dot exporter for the CRDT DAG. Reads the delta blocks a replica keeps in
//! its datastore, starting at the current heads, and writes the causal
//! history as a Graphviz digraph:
//!
//! ```text
//! crdtdot -c ~/.crdtdot | dot -Tsvg > history.svg
//! ```
//!
//! Logs go to stderr; stdout carries only the graph.

mod config;

use std::env;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crdtdot_dag::{CancellationToken, ExportOptions, Exporter, TraverseConfigBuilder};
use crdtdot_store::{BlockAccessor, Cid, FsBlockStore, Namespace};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServiceConfig;

#[derive(Parser, Debug)]
#[command(name = "crdtdot")]
#[command(about = "Dot exporter for the CRDT DAG")]
#[command(version)]
struct Cli {
    /// Configuration folder containing service.json
    #[arg(short, long, env = "CRDTDOT_PATH", value_name = "FOLDER")]
    config: Option<PathBuf>,

    /// Datastore namespace of the replica (overrides crdt.datastore_namespace)
    #[arg(long)]
    namespace: Option<String>,

    /// Start from this head instead of the heads recorded in the store
    #[arg(long = "head", value_name = "CID")]
    heads: Vec<Cid>,

    /// Write the graph here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum number of blocks fetched at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Skip hashing fetched blocks against their identifiers
    #[arg(long)]
    no_verify: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CRDTDOT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "crdtdot=debug,crdtdot_dag=debug,crdtdot_store=debug,info"
        } else {
            "crdtdot=info,crdtdot_dag=info,warn"
        })
    });

    let format = env::var("CRDTDOT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry.with(fmt::layer().compact().with_writer(io::stderr)).init();
        }
    }
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, abandoning export");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let folder = cli.config.clone().unwrap_or_else(config::default_folder);
    let service = ServiceConfig::load(&folder).context("loading configuration")?;

    let namespace = Namespace::new(
        cli.namespace
            .as_deref()
            .unwrap_or(&service.crdt.datastore_namespace),
    );
    let datastore = service.datastore_path(&folder);
    debug!(
        folder = %folder.display(),
        datastore = %datastore.display(),
        "configuration loaded"
    );

    let accessor = BlockAccessor::new(Arc::new(FsBlockStore::new(&datastore)), namespace);
    // Checked here as well as in `collect` so a bad path fails before the
    // head markers are listed, with the datastore location in the message.
    accessor
        .check()
        .await
        .with_context(|| format!("opening datastore at {}", datastore.display()))?;

    let heads: Vec<Cid> = if cli.heads.is_empty() {
        accessor
            .heads()
            .await
            .context("reading heads")?
            .into_iter()
            .collect()
    } else {
        cli.heads.clone()
    };

    let mut traverse = TraverseConfigBuilder::new();
    if let Some(n) = cli.concurrency.or(service.export.concurrency) {
        traverse = traverse.max_concurrent_fetches(n);
    }
    let verify = !cli.no_verify && service.export.verify_blocks.unwrap_or(true);
    let options = ExportOptions {
        traverse: traverse.verify_blocks(verify).build(),
        deadline: cli.timeout.map(Duration::from_secs).or(service.export.timeout()),
    };

    let exporter = Exporter::new(accessor, options);
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let graph = exporter
        .collect(&heads, &cancel)
        .await
        .context("generating graph")?;

    // The output is only touched once the traversal has succeeded.
    match &cli.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            exporter.render(&graph, file).context("writing graph")?;
        }
        None => {
            exporter.render(&graph, io::stdout().lock()).context("writing graph")?;
        }
    }

    let stats = graph.stats();
    info!(
        nodes = stats.nodes,
        holes = stats.holes,
        heads = stats.heads,
        edges = stats.edges,
        max_priority = stats.max_priority,
        "exported graph"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repeated_heads() {
        let a = Cid::of(crdtdot_store::Codec::DagJson, b"a");
        let b = Cid::of(crdtdot_store::Codec::DagJson, b"b");
        let cli = Cli::try_parse_from([
            "crdtdot".to_string(),
            "--head".to_string(),
            a.to_string(),
            "--head".to_string(),
            b.to_string(),
            "--no-verify".to_string(),
        ])
        .unwrap();
        assert_eq!(cli.heads, vec![a, b]);
        assert!(cli.no_verify);
    }

    #[test]
    fn test_rejects_malformed_head() {
        assert!(Cli::try_parse_from(["crdtdot", "--head", "zz"]).is_err());
    }
}
