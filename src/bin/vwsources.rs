//! vwsources - fetch and inspect deployment sources
//!
//! Usage:
//!   vwsources fetch [FILE] [--name N]...   Fetch every (or each named) source
//!   vwsources check [FILE]                 Validate a sources file
//!   vwsources hash <FILE>                  Print checksums of a file

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use vectorweight_sources::config::{default_sources_file, load_sources};
use vectorweight_sources::helpers::compute_hashes;
use vectorweight_sources::{
    FetchSettings, ProvenanceDescriptor, SourceManager, SourceMetadata, cache_key, output,
};

#[derive(Parser)]
#[command(name = "vwsources")]
#[command(about = "Fetch, verify and cache deployment source material")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch sources into a scratch directory
    Fetch {
        /// Sources file (default: $VW_SOURCES_FILE or ~/.config/vectorweight/sources.toml)
        file: Option<PathBuf>,

        /// Only fetch the named source (repeatable)
        #[arg(short, long = "name")]
        names: Vec<String>,

        /// Directory to hold the scratch root (default: the system temp dir)
        #[arg(short, long, env = "VW_SOURCES_SCRATCH")]
        scratch: Option<PathBuf>,

        /// Keep the scratch directory after exit
        #[arg(short, long)]
        keep: bool,

        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a sources file
    Check {
        /// Sources file
        file: Option<PathBuf>,
    },

    /// Print SHA256, SHA512 and BLAKE3 of a file
    Hash {
        /// File to hash
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        output::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fetch {
            file,
            names,
            scratch,
            keep,
            json,
        } => {
            output::set_quiet(json);
            let file = file.unwrap_or_else(default_sources_file);
            let sources = select(load(&file)?, &names)?;
            fetch(sources, scratch, keep, json)?;
        }

        Commands::Check { file } => {
            let file = file.unwrap_or_else(default_sources_file);
            let sources = load(&file)?;
            if sources.is_empty() {
                output::warning(&format!("{} defines no sources", file.display()));
            }
            for (name, descriptor) in &sources {
                println!("{:<20} {:<18} {}", name, descriptor.mode, cache_key(descriptor));
            }
            output::success(&format!("{} source(s) OK", sources.len()));
        }

        Commands::Hash { file } => {
            let hashes = compute_hashes(&file)
                .with_context(|| format!("Failed to hash {}", file.display()))?;
            println!("sha256  {}", hashes.sha256);
            println!("sha512  {}", hashes.sha512);
            println!("blake3  {}", hashes.blake3);
        }
    }

    Ok(())
}

fn load(file: &Path) -> Result<BTreeMap<String, ProvenanceDescriptor>> {
    load_sources(file).with_context(|| format!("Failed to load sources from {}", file.display()))
}

/// Restrict `sources` to `names`, in the order given. Empty means all.
fn select(
    mut sources: BTreeMap<String, ProvenanceDescriptor>,
    names: &[String],
) -> Result<Vec<(String, ProvenanceDescriptor)>> {
    if names.is_empty() {
        return Ok(sources.into_iter().collect());
    }

    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match sources.remove(name) {
            Some(descriptor) => selected.push((name.clone(), descriptor)),
            None => bail!("No source named '{}'", name),
        }
    }
    Ok(selected)
}

fn fetch(
    sources: Vec<(String, ProvenanceDescriptor)>,
    scratch: Option<PathBuf>,
    keep: bool,
    json: bool,
) -> Result<()> {
    let mut settings = FetchSettings::from_env();
    if let Some(dir) = scratch {
        settings = settings.with_scratch_root(dir);
    }
    let mut manager = SourceManager::with_settings(settings).context("Failed to set up scratch")?;

    let total = sources.len();
    let mut fetched: BTreeMap<String, SourceMetadata> = BTreeMap::new();
    for (i, (name, descriptor)) in sources.into_iter().enumerate() {
        output::action_numbered(i + 1, total, &format!("Fetching {}", name));
        let metadata = manager
            .fetch_source(&descriptor)
            .with_context(|| format!("Failed to fetch source '{}'", name))?;
        fetched.insert(name, metadata);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&fetched)?);
    } else {
        for (name, metadata) in &fetched {
            println!("{}", name);
            println!("  type:   {}", metadata.source_type);
            println!("  path:   {}", metadata.local_path.display());
            if let Some(origin) = &metadata.origin_location {
                println!("  origin: {}", origin);
            }
            if let Some(artifact) = &metadata.artifact {
                println!("  file:   {}", artifact.display());
            }
        }
    }

    if keep {
        let root = manager.into_scratch_root();
        output::info(&format!("Sources kept in {}", root.display()));
    } else {
        output::detail("removing scratch directory (pass --keep to retain it)");
        manager.cleanup().context("Failed to clean up scratch")?;
    }
    Ok(())
}
