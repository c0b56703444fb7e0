use std::path::PathBuf;

use clap::Parser;

/// Smallest atlas edge length the sizing heuristic may return.
pub const MIN_TEXTURE_SIZE: u32 = 256;
/// Preferred atlas edge length (informational; sizing is fully heuristic).
pub const PREF_TEXTURE_SIZE: u32 = 4 * 1024;
/// Largest atlas edge length before packing is declared impossible.
pub const MAX_TEXTURE_SIZE: u32 = 32 * 1024;

/// Atlas edge-length bounds for the sizing heuristic and the
/// doubling-retry loop.
#[derive(Debug, Clone, Copy)]
pub struct AtlasLimits {
    pub min_size: u32,
    pub max_size: u32,
}

impl Default for AtlasLimits {
    fn default() -> Self {
        Self {
            min_size: MIN_TEXTURE_SIZE,
            max_size: MAX_TEXTURE_SIZE,
        }
    }
}

/// Fully resolved pipeline configuration (constructed from CLI args).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub limits: AtlasLimits,
    pub verbose: bool,
    pub threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            limits: AtlasLimits::default(),
            verbose: false,
            threads: None,
        }
    }
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "photo-atlas",
    about = "Pack loose texture patches into a texture atlas",
    version
)]
pub struct CliArgs {
    /// Input directory of patch images (HDR, EXR, PNG, JPEG)
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output atlas image path (PNG)
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Max atlas edge length in pixels
    #[arg(long, default_value_t = MAX_TEXTURE_SIZE)]
    pub max_size: u32,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Worker thread count (default: all cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

impl From<CliArgs> for PipelineConfig {
    fn from(args: CliArgs) -> Self {
        PipelineConfig {
            input: args.input,
            output: args.output,
            limits: AtlasLimits {
                min_size: MIN_TEXTURE_SIZE,
                max_size: args.max_size,
            },
            verbose: args.verbose,
            threads: args.threads,
        }
    }
}
