use anyhow::{Context, Result};
use clap::Parser;
use mountscope::config::Config;
use mountscope::resolver::{DiskUsageResolver, MountLookup, Resolution, UsageQuery};
use mountscope::task::{self, TaskOutcome};
use mountscope::util::human::{fmt_bytes, fmt_usage};
use mountscope::util::logging::init_logging;
use mountscope::util::paths::normalize;
use mountscope::palette;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "mountscope", about = "Show which mount owns a path and how full it is", version)]
struct Cli {
    /// Paths to resolve (default: current directory)
    paths: Vec<PathBuf>,

    /// Print a JSON snapshot instead of text
    #[arg(long)]
    json: bool,

    /// Print the mount table, most specific mount first, and exit
    #[arg(long)]
    list: bool,

    /// Print config file path and current values, then exit
    #[arg(long)]
    config: bool,

    /// Override the usage warning threshold (percent)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: Option<u8>,

    /// Give up on a path after this many milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = Config::load();
    if let Some(t) = cli.threshold {
        cfg.usage.warning_threshold_pct = t;
    }

    if cli.config {
        return run_print_config(&cfg);
    }

    let colors = *palette::init(cfg.colors);
    let resolver = Arc::new(DiskUsageResolver::from_config(&cfg, colors));

    if cli.list {
        return run_list(&resolver, cli.json);
    }

    let paths = if cli.paths.is_empty() {
        vec![std::env::current_dir().context("no current directory")?]
    } else {
        cli.paths.clone()
    };

    let timeout = Duration::from_millis(cli.timeout_ms.max(1));
    let mut results = Vec::new();
    for path in &paths {
        let path = absolute(path);
        let mut handle = task::spawn(resolver.clone(), path.clone());
        match handle.wait_timeout(timeout) {
            Some(TaskOutcome::Completed(res)) => results.push(res.clone()),
            Some(TaskOutcome::Cancelled) => log::warn!("{}: resolution cancelled", path),
            Some(TaskOutcome::Failed(reason)) => log::error!("{}: resolution failed: {}", path, reason),
            None => {
                handle.cancel();
                log::warn!("{}: timed out after {}ms", path, timeout.as_millis());
            }
        }
    }

    if cli.json {
        print_json(&results, paths.len())?;
    } else {
        for res in &results {
            print_resolution(res);
        }
    }

    let all_ok = results.len() == paths.len() && results.iter().all(Resolution::is_resolved);
    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

fn absolute(path: &Path) -> String {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map(|d| d.join(path)).unwrap_or_else(|_| path.to_path_buf())
    };
    std::fs::canonicalize(&joined)
        .unwrap_or_else(|_| normalize(&joined))
        .to_string_lossy()
        .into_owned()
}

fn print_resolution(res: &Resolution) {
    match &res.mount {
        MountLookup::Found { entry } => {
            let usage = match &res.usage {
                Some(UsageQuery::Measured { usage }) => fmt_usage(usage.used_bytes, usage.total_bytes),
                _ => "unknown".to_string(),
            };
            println!(
                "{}  on {} ({}, {}{})  {}% used  {}{}",
                res.path,
                entry.mount_point,
                entry.fs_type,
                res.access.label(),
                if res.mount_allowed { "" } else { ", fixed" },
                res.classification.percent_used,
                usage,
                if res.classification.is_warning { "  [WARN]" } else { "" },
            );
        }
        MountLookup::NotFound => println!("{}  no mount point found", res.path),
        MountLookup::ProviderError { reason } => println!("{}  mount table unavailable: {}", res.path, reason),
    }
}

fn print_json(results: &[Resolution], requested: usize) -> Result<()> {
    let snapshot = json!({
        "mountscope_version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Local::now().to_rfc3339(),
        "requested": requested,
        "resolutions": results,
    });
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn run_list(resolver: &DiskUsageResolver, as_json: bool) -> Result<()> {
    let table = resolver.mount_table()?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(table.entries())?);
        return Ok(());
    }
    for e in table.entries() {
        let usage = resolver.get_usage(e);
        println!(
            "{:30} {:10} {:3} {:>10}  {}",
            e.mount_point,
            e.fs_type,
            e.access_mode().label(),
            if usage.is_known() { fmt_bytes(usage.total_bytes) } else { "-".to_string() },
            e.device,
        );
    }
    Ok(())
}

fn run_print_config(cfg: &Config) -> Result<()> {
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    println!("Config: {}", path);
    println!();
    println!("[usage]");
    println!("  warning_threshold_pct = {}%", cfg.warning_threshold());
    println!("  source                = {:?}", cfg.usage.source);
    println!("  df_program            = {}", cfg.usage.df_program);
    println!("  df_args               = {:?}", cfg.usage.df_args);
    println!();
    println!("[mounts]");
    println!("  source        = {:?}", cfg.mounts.source);
    println!("  mounts_file   = {}", cfg.mounts.mounts_file.display());
    println!("  mount_program = {}", cfg.mounts.mount_program);
    println!("  match_mode    = {:?}", cfg.mounts.match_mode);
    println!();
    println!("[colors]");
    println!("  normal  = {:#010X}", cfg.colors.normal);
    println!("  warning = {:#010X}", cfg.colors.warning);
    Ok(())
}
