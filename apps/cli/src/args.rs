//! Command surface (§6): the three top-level commands an operator (or
//! the out-of-scope interactive menu) dispatches against a named
//! profile. Parsed with `clap`'s derive API the way the teacher's
//! binaries parse theirs.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "jobscout",
    version,
    about = "Job-discovery pipeline core: scrape listings, score them in two stages, and query the per-profile store"
)]
pub struct Cli {
    /// Directory containing every profile's store, run log, and
    /// metadata (§6: "a single environment variable names the profile
    /// root directory"). Falls back to `JOBSCOUT_PROFILE_ROOT`.
    #[arg(long, env = "JOBSCOUT_PROFILE_ROOT", default_value = "./profiles")]
    pub profile_root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteArg {
    Eluta,
    Indeed,
    Linkedin,
    Monster,
    Jobbank,
    Towardsai,
}

impl SiteArg {
    pub fn site_id(self) -> &'static str {
        match self {
            SiteArg::Eluta => "eluta",
            SiteArg::Indeed => "indeed",
            SiteArg::Linkedin => "linkedin",
            SiteArg::Monster => "monster",
            SiteArg::Jobbank => "jobbank",
            SiteArg::Towardsai => "towardsai",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageArg {
    /// Stage1 only, leaving gate-passing records at `stage1_scored`.
    Stage1,
    /// Stage1 then Stage2 for anything that clears the gate (the default).
    Both,
    /// Stage2 only, over records already sitting at `stage1_scored`.
    Stage2,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage2Backend {
    Heuristic,
    Llm,
    Embedding,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the Scraping Core against one profile.
    Scrape {
        /// Profile name; resolves to `<profile_root>/<name>/profile.json`.
        profile: String,
        /// Sites to crawl. Defaults to every registered adapter.
        #[arg(long, value_enum)]
        site: Vec<SiteArg>,
        #[arg(long, default_value_t = 5)]
        max_pages_per_keyword: u32,
        #[arg(long, default_value_t = 50)]
        max_jobs_per_keyword: u32,
        #[arg(long, default_value_t = 3)]
        max_concurrent_workers: usize,
        #[arg(long)]
        days_posted_window: Option<u32>,
    },
    /// Run the Two-Stage Processing Core against one profile.
    Process {
        profile: String,
        #[arg(long, value_enum, default_value = "both")]
        stage: StageArg,
        #[arg(long, value_enum, default_value = "heuristic")]
        stage2_backend: Stage2Backend,
        #[arg(long, default_value_t = 4)]
        stage2_workers: usize,
        #[arg(long)]
        max_records: Option<usize>,
    },
    /// Print per-status, per-site, and recent-window counts for a profile.
    Stats { profile: String },
}
