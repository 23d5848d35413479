// crates/cli/src/main.rs
//! docrepo command-line tool.
//!
//! Feeds and inspects the job queue of a docrepo database. Configuration is
//! resolved once at startup (file, then `DOCREPO_*` env, then flags) and passed
//! to the database explicitly.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docrepo_core::{paths, Job, JobId, JobState, RepoConfig};
use docrepo_db::Database;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "docrepo", version, about = "Feed and inspect the docrepo job queue")]
struct Cli {
    /// SQLite database file (overrides config and DOCREPO_DB).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print jobs as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Queue a job unless an equivalent one is already queued.
    Enqueue {
        #[arg(long)]
        label: String,
        #[arg(long, default_value = "")]
        data: String,
        /// Skip the admission check and insert directly; a collision is an error.
        #[arg(long)]
        no_check: bool,
    },
    /// Print a job's fingerprint and whether it would be admitted.
    Check {
        #[arg(long)]
        label: String,
        #[arg(long, default_value = "")]
        data: String,
    },
    /// List queued jobs.
    List {
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        state: Option<JobState>,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show one job.
    Show { id: JobId },
    /// Delete one job.
    Delete { id: JobId },
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Resolve configuration: explicit file, else the default file if present;
/// then environment overrides; then the `--db` flag.
fn load_config(cli: &Cli) -> Result<RepoConfig> {
    let mut config = match &cli.config {
        Some(path) => RepoConfig::load(path)?,
        None => match paths::config_path() {
            Some(path) if path.exists() => RepoConfig::load(&path)?,
            _ => RepoConfig::default(),
        },
    };
    config.apply_env();
    if let Some(db) = &cli.db {
        config.database_path = Some(db.clone());
    }
    Ok(config)
}

fn write_job(out: &mut impl Write, job: &Job, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(job)?)?;
    } else {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            job.id().map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
            job.label(),
            job.state(),
            job.fingerprint(),
            job.data(),
        )?;
    }
    Ok(())
}

async fn run(command: Command, db: &Database, json: bool, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Enqueue {
            label,
            data,
            no_check,
        } => {
            let mut job = Job::new(label, data);
            if no_check {
                let id = db.store_job(&mut job).await?;
                writeln!(out, "queued job {id}")?;
            } else {
                match db.enqueue_unique(&mut job).await? {
                    Some(id) => writeln!(out, "queued job {id}")?,
                    None => writeln!(
                        out,
                        "equivalent job already queued (fingerprint {})",
                        job.fingerprint()
                    )?,
                }
            }
        }
        Command::Check { label, data } => {
            let job = Job::new(label, data);
            let unique = db.is_unique_in_queue(&job).await?;
            writeln!(out, "fingerprint {}", job.fingerprint())?;
            writeln!(out, "unique {unique}")?;
        }
        Command::List {
            label,
            state,
            limit,
        } => {
            for job in db.list_jobs(label.as_deref(), state, limit).await? {
                write_job(out, &job, json)?;
            }
        }
        Command::Show { id } => match db.get_job(id).await? {
            Some(job) => write_job(out, &job, json)?,
            None => bail!("job {id} not found"),
        },
        Command::Delete { id } => {
            if !db.delete_job(id).await? {
                bail!("job {id} not found");
            }
            writeln!(out, "deleted job {id}")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = load_config(&cli)?;
    let db = Database::from_config(&config)
        .await
        .context("failed to open database")?;
    tracing::debug!(path = %db.db_path().display(), "Database ready");

    let mut stdout = std::io::stdout().lock();
    run(cli.command, &db, cli.json, &mut stdout).await
}
