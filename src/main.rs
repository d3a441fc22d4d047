use std::path::PathBuf;

use clap::{Parser, Subcommand};
use course_player::{
    catalog::{Catalog, Course},
    config::Config,
    progress::{FileBackend, ProgressStore, bookmarked_videos},
    sync,
    utils::init_log,
};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for daily-rotated log files, logs go to stderr when absent
    #[arg(short, long)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the courses folder and write the catalog document
    Sync {
        /// Root folder with one sub-folder per course
        #[arg(short, long)]
        base: Option<PathBuf>,
        /// Catalog document to write
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        media_prefix: Option<String>,
        #[arg(long)]
        thumbnail_prefix: Option<String>,
    },
    /// List courses with their total duration
    Courses {
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
    /// List bookmarked videos across all courses
    Bookmarks {
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        /// Directory of the file-backed progress store
        #[arg(short, long)]
        progress_dir: Option<PathBuf>,
    },
    /// Print the JSON schema of the catalog document
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let _guard = init_log(args.log)?;
    let mut config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Sync {
            base,
            output,
            media_prefix,
            thumbnail_prefix,
        } => {
            let base = base.unwrap_or(config.courses_base);
            let output = output.unwrap_or(config.catalog_path);
            if let Some(prefix) = media_prefix {
                config.sync.media_prefix = prefix;
            }
            if let Some(prefix) = thumbnail_prefix {
                config.sync.thumbnail_prefix = prefix;
            }
            let catalog = sync::sync(&base, &output, &config.sync)?;
            println!(
                "Saved {} ({} courses)",
                output.display(),
                catalog.courses().len()
            );
        }
        Command::Courses { catalog } => {
            let catalog = Catalog::load(catalog.unwrap_or(config.catalog_path)).await?;
            for course in catalog.summaries() {
                println!(
                    "{}\t{}\t{} videos\t{}",
                    course.id, course.title, course.total_videos, course.total_duration
                );
            }
        }
        Command::Bookmarks {
            catalog,
            progress_dir,
        } => {
            let catalog = Catalog::load(catalog.unwrap_or(config.catalog_path)).await?;
            let progress_dir = progress_dir.unwrap_or(config.progress_dir);
            info!("Reading progress from {}", progress_dir.display());
            let store = ProgressStore::new(FileBackend::new(progress_dir)?);
            for item in bookmarked_videos(&catalog, &store)? {
                println!(
                    "{}\t{}\t{}\t{}",
                    item.course_id, item.video_id, item.course_name, item.title
                );
            }
        }
        Command::Schema => {
            let schema = schemars::schema_for!(Vec<Course>);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}
