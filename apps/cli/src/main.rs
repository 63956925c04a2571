//! `jobscout` binary: the command surface (§6) over the Scraping and
//! Two-Stage Processing cores. Parses arguments, builds a per-command
//! `Store`/`RunContext`, dispatches, and prints a one-line Summary with
//! an exit code mapped from whatever went wrong (§7).

mod args;
mod commands;
mod error;
mod paths;

use clap::Parser;

use args::{Cli, Command};
use error::{exit_code_for, CliError};
use jobscout_app_processor::ProcessLimits;
use jobscout_app_scraper::ScrapeLimits;
use jobscout_domain_models::Profile;
use paths::ProfilePaths;

fn main() {
    jobscout_shared_telemetry::init("jobscout");
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build the tokio runtime");

    let exit_code = runtime.block_on(dispatch(cli));
    std::process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> i32 {
    match run_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            exit_code_for(&e)
        }
    }
}

async fn run_command(cli: &Cli) -> Result<i32, CliError> {
    match &cli.command {
        Command::Scrape {
            profile,
            site,
            max_pages_per_keyword,
            max_jobs_per_keyword,
            max_concurrent_workers,
            days_posted_window,
        } => {
            let (paths, profile_snapshot) = load_profile(&cli.profile_root, profile)?;
            let limits = ScrapeLimits {
                max_pages_per_keyword: *max_pages_per_keyword,
                max_jobs_per_keyword: *max_jobs_per_keyword,
                max_concurrent_workers: *max_concurrent_workers,
                days_posted_window: *days_posted_window,
                ..ScrapeLimits::default()
            };
            let summary = commands::scrape::run(profile_snapshot, &paths, site, limits).await?;
            println!(
                "scrape: seen={} inserted={} updated={} unchanged={} dropped={} resolve_timeouts={} \
                 sites_attempted={} sites_drifted={} cancelled={}",
                summary.records_seen,
                summary.records_inserted,
                summary.records_updated,
                summary.records_unchanged,
                summary.records_dropped,
                summary.resolve_timeouts,
                summary.sites_attempted.len(),
                summary.sites_with_drift.len(),
                summary.cancelled,
            );

            if summary.is_total_drift() {
                return Ok(4);
            }
            // §6: non-zero only when zero records were inserted *and* at
            // least one site reported drift; a known-empty result page
            // with no drift is a legitimate zero-record run (§8 boundary
            // behaviors) and exits 0.
            if summary.records_inserted == 0 && !summary.sites_with_drift.is_empty() {
                return Ok(2);
            }
            Ok(0)
        }

        Command::Process {
            profile,
            stage,
            stage2_backend,
            stage2_workers,
            max_records,
        } => {
            let (paths, profile_snapshot) = load_profile(&cli.profile_root, profile)?;
            let limits = ProcessLimits {
                stage2_concurrency: *stage2_workers,
                max_records: *max_records,
                ..ProcessLimits::default()
            };
            let summary = commands::process::run(profile_snapshot, &paths, *stage, *stage2_backend, limits).await?;
            println!(
                "process: stage1_evaluated={} stage1_passed_gate={} stage1_dropped={} \
                 stage2_attempted={} stage2_succeeded={} stage2_errors={} finalized={} cancelled={}",
                summary.stage1_evaluated,
                summary.stage1_passed_gate,
                summary.stage1_dropped,
                summary.stage2_attempted,
                summary.stage2_succeeded,
                summary.stage2_errors,
                summary.finalized,
                summary.cancelled,
            );
            Ok(0)
        }

        Command::Stats { profile } => {
            let (paths, _) = load_profile_path_only(&cli.profile_root, profile)?;
            let stats = commands::stats::run(&paths)?;
            println!("total={}", stats.total);
            for (status, count) in &stats.by_status {
                println!("  status[{status}]={count}");
            }
            for (site, count) in &stats.by_site {
                println!("  site[{site}]={count}");
            }
            println!("recent_24h={}", stats.recent_24h);
            Ok(0)
        }
    }
}

/// Resolve `<profile_root>/<name>/profile.json`, loading the snapshot
/// required by `scrape`/`process` (§6: "profile name, ..."). `stats`
/// only needs the directory to exist, not the profile snapshot.
fn load_profile(profile_root: &std::path::Path, name: &str) -> Result<(ProfilePaths, Profile), CliError> {
    let paths = ProfilePaths::resolve(profile_root, name);
    paths.ensure_dir().map_err(|e| CliError::Store(jobscout_infra_store::StoreError::Connection(e.to_string())))?;
    if !paths.profile_json.exists() {
        return Err(CliError::ProfileNotFound(name.to_string()));
    }
    let profile = Profile::load_from_file(&paths.profile_json)?;
    Ok((paths, profile))
}

fn load_profile_path_only(profile_root: &std::path::Path, name: &str) -> Result<(ProfilePaths, ()), CliError> {
    let paths = ProfilePaths::resolve(profile_root, name);
    if !paths.dir.exists() {
        return Err(CliError::ProfileNotFound(name.to_string()));
    }
    Ok((paths, ()))
}
