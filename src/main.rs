use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use photo_atlas::Pipeline;
use photo_atlas::config::{CliArgs, PipelineConfig};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Init tracing
    let filter = if args.verbose {
        EnvFilter::new("photo_atlas=debug")
    } else {
        EnvFilter::new("photo_atlas=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config: PipelineConfig = args.into();

    // Configure rayon thread pool
    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure rayon thread pool")?;
    }

    match Pipeline::run(&config) {
        Ok(result) => {
            println!(
                "Done: {} atlas(es) of {}px, {} faces, {} texcoords in {:.2}s",
                result.atlas_count,
                result.atlas_size,
                result.face_count,
                result.texcoord_count,
                result.duration.as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            error!(%e, "Packing failed");
            Err(anyhow::anyhow!(e)).context("photo-atlas packing failed")
        }
    }
}
