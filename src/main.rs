//! oxicat CLI: copy one file to standard output.
//!
//! This layer stays thin: it maps arguments and configuration onto a
//! [`CopyProfile`], opens the input file, issues the advisory readahead hint
//! when the profile asks for one, and turns copy outcomes into exit codes.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, warn};

use oxicat::buffer::AlignedBuffer;
use oxicat::config::{ConfigError, OxicatConfig};
use oxicat::copy::{copy_stream, CopyError, Stage};
use oxicat::platform;
use oxicat::policy::{BlockSizePolicy, CopyProfile, FileProperties};

/// Copy a file to standard output with tunable I/O buffering
#[derive(Parser)]
#[command(name = "oxicat", version, about)]
struct Cli {
    /// File to copy to standard output
    file: PathBuf,

    /// Buffer sizing profile: unbuffered, page-sized, page-aligned,
    /// fs-block, empirical, sequential
    #[arg(short, long)]
    profile: Option<String>,

    /// Override the tuned buffer size in bytes for the empirical profiles
    #[arg(long)]
    buffer_bytes: Option<usize>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: io::Error,
    },
    #[error(transparent)]
    Copy(#[from] CopyError),
}

impl AppError {
    fn exit_code(&self) -> ExitCode {
        match self {
            AppError::Config(_) => ExitCode::from(2),
            AppError::Open { .. } | AppError::Copy(_) => ExitCode::from(1),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(copied) => {
            debug!(bytes = copied, "copy complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("oxicat: {err}");
            err.exit_code()
        }
    }
}

fn run(cli: &Cli) -> Result<u64, AppError> {
    let config = load_config(cli)?;
    let mut profile = config.resolve_profile(cli.profile.as_deref())?;
    if let Some(bytes) = cli.buffer_bytes {
        profile = apply_buffer_override(profile, bytes)?;
    }

    let mut file = File::open(&cli.file).map_err(|source| AppError::Open {
        path: cli.file.clone(),
        source,
    })?;

    let props = FileProperties::for_file(&file);
    let size = profile.policy.choose_size(&props);
    let alignment = profile.alignment(&props);
    debug!(
        profile = profile.name(),
        size, alignment, "buffer plan"
    );

    let mut buffer = AlignedBuffer::allocate(size, alignment).map_err(CopyError::from)?;

    if profile.policy.wants_sequential_hint() {
        if let Err(err) = platform::advise_sequential(&file) {
            warn!("sequential readahead hint failed: {err}");
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let copied = copy_stream(&mut file, &mut out, &mut buffer)?;
    out.flush().map_err(|source| CopyError::Io {
        stage: Stage::Writing,
        source,
    })?;

    Ok(copied)
}

fn load_config(cli: &Cli) -> Result<OxicatConfig, ConfigError> {
    match &cli.config {
        Some(path) => {
            let mut config = OxicatConfig::load_from_path(path)?;
            config.apply_env_overrides()?;
            Ok(config)
        }
        None => OxicatConfig::load_from_env(),
    }
}

fn apply_buffer_override(mut profile: CopyProfile, bytes: usize) -> Result<CopyProfile, AppError> {
    if bytes == 0 {
        return Err(AppError::Config(ConfigError::InvalidValue {
            key: "buffer-bytes".to_string(),
            value: "0".to_string(),
        }));
    }
    match profile.policy {
        BlockSizePolicy::Empirical { .. } => {
            profile.policy = BlockSizePolicy::Empirical { bytes };
        }
        BlockSizePolicy::EmpiricalSequential { .. } => {
            profile.policy = BlockSizePolicy::EmpiricalSequential { bytes };
        }
        _ => warn!(
            profile = profile.name(),
            "--buffer-bytes only applies to the empirical profiles; ignored"
        ),
    }
    Ok(profile)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
