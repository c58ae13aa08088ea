/// WaveVault - sample library indexer and project organiser
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wavevault_cli::{commands, Outcome, VaultConfig};
use wavevault_projects::{JsonFileBackend, ProjectStore};

#[derive(Parser)]
#[command(name = "wavevault")]
#[command(about = "Index audio sample folders and organise music projects", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./wavevault.toml when present)
    #[arg(short, long, global = true, env = "WAVEVAULT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index an audio sample folder into the library database
    Index {
        /// Folder (or single file) to index
        folder: PathBuf,
    },
    /// Add every project file below a folder to the inbox
    ScanProjects {
        /// Root folder to walk
        root: PathBuf,
    },
    /// Create a new album
    CreateAlbum {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        artist: String,
    },
    /// Create a track inside an album
    CreateTrack {
        #[arg(short, long)]
        name: String,
        /// Album id (ALB-...)
        #[arg(short, long)]
        album: String,
    },
    /// Move a version from the inbox into a track
    MoveVersion {
        #[arg(short, long)]
        version: String,
        /// Track id (TRK-...)
        #[arg(short, long)]
        track: String,
    },
    /// Move a version out of its track back to the inbox
    UnorganizeVersion {
        #[arg(short, long)]
        version: String,
    },
    /// Delete a version from the inbox or from its track
    DeleteVersion {
        #[arg(short, long)]
        version: String,
    },
    /// Print albums, tracks and the inbox
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wavevault=info,wavevault_cli=info,wavevault_metadata=info,wavevault_projects=info,wavevault_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = VaultConfig::load(cli.config.as_deref())?;

    let open_store = || ProjectStore::open(JsonFileBackend::new(&config.paths.projects_db));

    let outcome = match cli.command {
        Commands::Index { folder } => {
            let stats = commands::index(&config, &folder).await?;
            println!(
                "Indexed {} files ({} failed, {} not stored)",
                stats.files_discovered,
                stats.files_failed,
                stats.store_errors.len()
            );
            return Ok(());
        }
        Commands::ScanProjects { root } => commands::scan_projects(&mut open_store(), &root),
        Commands::CreateAlbum { name, artist } => {
            commands::create_album(&mut open_store(), &name, &artist)
        }
        Commands::CreateTrack { name, album } => {
            commands::create_track(&mut open_store(), &name, &album)
        }
        Commands::MoveVersion { version, track } => {
            commands::move_version(&mut open_store(), &version, &track)
        }
        Commands::UnorganizeVersion { version } => {
            commands::unorganize_version(&mut open_store(), &version)
        }
        Commands::DeleteVersion { version } => commands::delete_version(&mut open_store(), &version),
        Commands::List => {
            print!("{}", commands::render_tree(open_store().db()));
            return Ok(());
        }
    };

    match outcome {
        Outcome::Done(msg) => {
            println!("{msg}");
            Ok(())
        }
        Outcome::NotFound(msg) => anyhow::bail!("not found: {msg}"),
    }
}
