use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use texwatch::watcher::WatchRegistry;
use texwatch::{ConsoleNotifier, DerivedPaths, DiffTool, Replicator, Settings, Splicer};

#[derive(Parser)]
#[command(name = "texwatch")]
#[command(about = "Watches LaTeX build artifacts, diffs PDFs and splices the results into the source")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Watch documents and react to artifact changes until ctrl-c
    Watch {
        /// Source documents to track
        #[arg(required = true)]
        documents: Vec<PathBuf>,
    },

    /// Run the comparison tool once and print the generated images
    Diff {
        /// Baseline artifact
        old: PathBuf,
        /// Fresh artifact
        new: PathBuf,
    },

    /// Splice images into a document at its anchor markers
    Splice {
        /// Document to edit
        document: PathBuf,
        /// Images to insert (one block per anchor)
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Copy the primary artifact onto the draft path once
    Sync {
        /// Source document the artifact belongs to
        document: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().map_err(|e| anyhow::anyhow!("failed to load settings: {e}"))?;
    texwatch::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => {
            Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!("failed to initialize configuration: {e}"))?;
        }

        Commands::Config => {
            let toml = toml::to_string_pretty(&settings).context("failed to render settings")?;
            print!("{toml}");
        }

        Commands::Watch { documents } => {
            let settings = Arc::new(settings);
            let mut registry = WatchRegistry::new(settings, Arc::new(ConsoleNotifier))?;

            for document in &documents {
                registry
                    .track_document(document)
                    .await
                    .with_context(|| format!("cannot track {}", document.display()))?;
            }

            registry.run().await?;
        }

        Commands::Diff { old, new } => {
            let tool = DiffTool::new(
                settings.diff.interpreter.clone(),
                settings.diff.tool_path.clone(),
                settings.diff.dpi,
                settings.diff.image_extensions.clone(),
            );
            let artifacts = tool.run(&old, &new, &settings.diff.output_dir).await?;
            for artifact in artifacts {
                println!("{}", artifact.display());
            }
        }

        Commands::Splice { document, images } => {
            let splicer = Splicer::new(settings.diff.marker.clone());
            let filled = splicer.splice(&document, &images).await?;
            println!("{filled} anchor(s) filled in {}", document.display());
        }

        Commands::Sync { document } => {
            let paths = derive(&settings, &document);
            let replicator =
                Replicator::new(settings.sync.max_retries, settings.sync.retry_backoff());
            replicator.sync(&paths.artifact, &paths.draft).await?;
            println!("draft synced: {}", paths.draft.display());
        }
    }

    Ok(())
}

fn derive(settings: &Settings, document: &Path) -> DerivedPaths {
    DerivedPaths::for_document(
        document,
        &settings.naming.artifact_extension,
        &settings.naming.log_extension,
        &settings.naming.draft_suffix,
    )
}
