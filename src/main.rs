// Copyright (c) 2026 Aclinspect
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! `aclinspect`: print the ACL log and membership summary of a space.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use aclinspect::acl::state::LogReplayBuilder;
use aclinspect::config::InspectConfig;
use aclinspect::inspector::{AclInspector, FailurePolicy};
use aclinspect::monitoring::logging::{init_logging, LogFormat};
use aclinspect::source::FileRecordSource;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};

/// Inspect the ACL log of a space.
#[derive(Parser, Debug)]
#[command(name = "aclinspect", version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Space id
    #[arg(short = 's', long = "space")]
    space_id: Option<String>,

    /// Path to the record dump
    #[arg(short = 'r', long = "records")]
    records: Option<PathBuf>,

    /// Print the per-record log before the summary
    #[arg(short = 'l', long = "log")]
    show_log: bool,

    /// Skip malformed records in the log instead of aborting
    #[arg(long)]
    skip_malformed: bool,

    /// Hex identity the root record must carry
    #[arg(long)]
    owner: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn resolve_config(cli: Cli) -> Result<InspectConfig> {
    let mut cfg = match &cli.config {
        Some(path) => InspectConfig::load(path)?,
        None => InspectConfig::default(),
    };
    cfg.apply_env();

    if let Some(v) = cli.space_id {
        cfg.space_id = v;
    }
    if let Some(v) = cli.records {
        cfg.records_path = Some(v);
    }
    if cli.show_log {
        cfg.show_log = true;
    }
    if cli.skip_malformed {
        cfg.failure_policy = FailurePolicy::SkipAndReport;
    }
    if let Some(v) = cli.owner {
        cfg.owner_identity_hex = Some(v);
    }
    if let Some(v) = cli.log_level {
        cfg.logging.level = v;
    }
    if let Some(v) = cli.log_format {
        cfg.logging.format = v;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run(cfg: &InspectConfig) -> Result<()> {
    let records_path = cfg.records_path.clone().context("records file not specified")?;
    let mut builder = LogReplayBuilder::new();
    if let Some(owner) = cfg.owner_identity()? {
        builder = builder.with_pinned_owner(owner);
    }
    let mut inspector =
        AclInspector::new(FileRecordSource::new(records_path), builder).with_policy(cfg.failure_policy);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cfg.show_log {
        let report = inspector.log(&cfg.space_id, &mut out)?;
        if !report.skipped.is_empty() {
            warn!(skipped = ?report.skipped, "some acl records could not be decoded");
        }
    }
    inspector.summary(&cfg.space_id, &mut out)?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = resolve_config(cli)?;
    init_logging(&cfg.logging);

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        git_sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        rustc = option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown"),
        space = %cfg.space_id,
        "aclinspect starting"
    );

    run(&cfg)
}
