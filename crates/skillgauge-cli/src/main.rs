mod commands;
mod config;
mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "skillgauge",
    version,
    about = "Assess skill documents for quality and security risk, and rank them for your project"
)]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the documentation quality of a skill file
    Evaluate {
        /// Path to the SKILL.md file
        path: PathBuf,
        #[arg(short, long, help = "Save the report to a file")]
        output: Option<PathBuf>,
    },
    /// Scan a skill file for security risks
    SecurityScan {
        /// Path to the SKILL.md file
        path: PathBuf,
        #[arg(short, long, help = "Save the report to a file")]
        output: Option<PathBuf>,
    },
    /// Rank cached evaluations against your stack and project type
    Recommend {
        #[arg(short, long, help = "Tech stack, e.g. \"Next.js, Python, PostgreSQL\"")]
        stack: String,
        #[arg(
            short = 't',
            long = "type",
            help = "Project type, e.g. \"web app\", \"API service\", \"CLI tool\""
        )]
        project_type: String,
        #[arg(short, long, default_value = "", help = "Extra notes, e.g. \"deployed with Docker\"")]
        notes: String,
        #[arg(long, help = "Also show the skip tier")]
        show_skip: bool,
        #[arg(long, help = "Override the quality floor for candidates")]
        min_quality: Option<f64>,
        #[arg(short, long, help = "Save the report to a file")]
        output: Option<PathBuf>,
    },
    /// Generate a new skill document for a topic
    Generate {
        #[arg(short, long, help = "Skill topic, e.g. \"Python async best practices\"")]
        topic: String,
        #[arg(short, long, default_value = "", help = "Tech stack, e.g. \"Python, asyncio, FastAPI\"")]
        stack: String,
        #[arg(short, long, default_value = "", help = "Extra notes")]
        notes: String,
        #[arg(short, long, help = "Save the generated SKILL.md to a file")]
        output: Option<PathBuf>,
        #[arg(long, help = "Evaluate the generated document immediately")]
        evaluate: bool,
    },
    /// Evaluate every markdown document in a directory
    BatchEvaluate {
        /// Directory containing .md documents
        dir: PathBuf,
        #[arg(long, help = "Evaluate at most this many documents")]
        limit: Option<usize>,
        #[arg(long, help = "Re-evaluate documents already in the cache")]
        force: bool,
        #[arg(long, help = "Max concurrent service calls")]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    skillgauge_logging::init_logging(&config.logging.level)?;

    commands::run(cli, config).await
}
