use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use jean_o_type::{LoadStrategy, ModelLoader};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Command-line / environment configuration for the studio.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jean-o-type",
    about = "Web app that classifies a photo of jeans into one of five styles"
)]
pub struct StudioConfig {
    /// Address to serve on.
    #[arg(long, env = "JEAN_ADDR", default_value = "127.0.0.1:7878")]
    pub addr: String,

    /// Directory holding `dino_pics/`.
    #[arg(long, env = "JEAN_ASSETS_DIR", default_value = ".")]
    pub assets_dir: PathBuf,

    /// Directory of per-style trend CSVs.
    #[arg(long, env = "JEAN_TRENDS_DIR", default_value = "trends/trends_dropdown")]
    pub trends_dir: PathBuf,

    /// How to find the model inside an upload: auto, directory, single-file, serving.
    #[arg(long, env = "JEAN_LOAD_STRATEGY", default_value = "auto")]
    pub load_strategy: LoadStrategy,

    /// Signature name bound by the serving loader.
    #[arg(long, env = "JEAN_ENDPOINT", default_value = "serving_default")]
    pub endpoint: String,

    /// Where uploads are unpacked while loading (default: the system temp dir).
    #[arg(long, env = "JEAN_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Largest accepted request body, in megabytes.
    #[arg(long, env = "JEAN_MAX_UPLOAD_MB", default_value_t = 200)]
    pub max_upload_mb: u64,
}

impl StudioConfig {
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Read-only state shared by every request thread.
///
/// Nothing here changes after startup: each submission loads its own model
/// from the upload and drops it when the response is rendered.
pub struct StudioState {
    pub config: StudioConfig,
    pub loader: ModelLoader,
}

impl StudioState {
    pub fn new(config: StudioConfig) -> Self {
        let mut loader = ModelLoader::new(config.load_strategy).with_endpoint(config.endpoint.clone());
        if let Some(dir) = &config.scratch_dir {
            loader = loader.with_scratch_dir(dir.clone());
        }
        StudioState { config, loader }
    }
}

pub type SharedState = Arc<StudioState>;
