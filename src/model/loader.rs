//! Turns an uploaded artifact into a callable model.
//!
//! Three ways to find the model inside an upload:
//!
//! - `Directory`:       the first archive entry names a folder holding `model.json`
//! - `SingleFile`:      the first `.json` entry anywhere in the archive
//! - `ServingEndpoint`: a `signatures.json` manifest binds an endpoint name
//!                       to one or more named output networks
//!
//! `Auto` picks one from the archive layout.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;

use crate::model::archive::{self, ArchiveEntry, ExtractedArtifact};
use crate::model::error::{ModelError, Result};
use crate::model::tensor::{ImageBatch, ModelOutput};
use crate::network::Network;
use crate::timer::Timer;

/// File a directory-style model keeps its network in.
pub const DIRECTORY_MODEL_FILE: &str = "model.json";
/// Manifest that marks an archive as a serving bundle.
pub const SIGNATURES_FILE: &str = "signatures.json";
pub const DEFAULT_ENDPOINT: &str = "serving_default";

// ---------------------------------------------------------------------------
// Loaded models
// ---------------------------------------------------------------------------

/// Anything the classifier can run a batch through.
pub trait InferenceModel: Send + Sync {
    fn predict(&self, batch: &ImageBatch) -> Result<ModelOutput>;

    /// Class labels bundled with the model, in output order.
    fn labels(&self) -> Option<&[String]> {
        None
    }
}

/// An opaque loaded model, owned by whoever asked for it.
pub type ModelHandle = Box<dyn InferenceModel>;

/// A complete network that maps a batch to one score tensor.
pub struct FullModel {
    network: Network,
}

impl FullModel {
    pub fn new(network: Network) -> FullModel {
        FullModel { network }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

fn run_network(network: &Network, batch: &ImageBatch) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(batch.batch_size() * network.output_size());
    for sample in batch.samples() {
        let scores = network.forward(sample.to_vec()).map_err(ModelError::Inference)?;
        out.extend(scores);
    }
    Ok(out)
}

impl InferenceModel for FullModel {
    fn predict(&self, batch: &ImageBatch) -> Result<ModelOutput> {
        Ok(ModelOutput::Single(run_network(&self.network, batch)?))
    }

    fn labels(&self) -> Option<&[String]> {
        self.network.output_labels()
    }
}

/// An inference-only wrapper bound to one serving endpoint.
pub struct ServingModel {
    endpoint: String,
    outputs: Vec<(String, Network)>,
}

impl ServingModel {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl InferenceModel for ServingModel {
    fn predict(&self, batch: &ImageBatch) -> Result<ModelOutput> {
        let named = self.outputs.iter()
            .map(|(name, network)| Ok((name.clone(), run_network(network, batch)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ModelOutput::Named(named))
    }

    fn labels(&self) -> Option<&[String]> {
        self.outputs.first().and_then(|(_, n)| n.output_labels())
    }
}

// ---------------------------------------------------------------------------
// Serving manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Manifest {
    signatures: Vec<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    name: String,
    outputs: Vec<OutputSpec>,
}

#[derive(Debug, Deserialize)]
struct OutputSpec {
    name: String,
    /// Network file, relative to the manifest.
    model: String,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStrategy {
    #[default]
    Auto,
    Directory,
    SingleFile,
    ServingEndpoint,
}

impl std::str::FromStr for LoadStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto"                => Ok(LoadStrategy::Auto),
            "directory" | "dir"   => Ok(LoadStrategy::Directory),
            "single-file" | "file" => Ok(LoadStrategy::SingleFile),
            "serving" | "serving-endpoint" => Ok(LoadStrategy::ServingEndpoint),
            other => Err(format!("unknown load strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelLoader {
    strategy: LoadStrategy,
    endpoint: String,
    scratch_dir: Option<PathBuf>,
}

impl Default for ModelLoader {
    fn default() -> Self {
        ModelLoader {
            strategy: LoadStrategy::Auto,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            scratch_dir: None,
        }
    }
}

impl ModelLoader {
    pub fn new(strategy: LoadStrategy) -> Self {
        ModelLoader { strategy, ..Default::default() }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Extract uploads under `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Unpacks `bytes`, loads the model and discards the scratch directory.
    ///
    /// On error nothing is retained: the temporary directory is removed
    /// whichever way this returns.
    pub fn load(&self, bytes: &[u8]) -> Result<ModelHandle> {
        let mut t = Timer::new_start("Loading model");
        let artifact = archive::extract(bytes, self.scratch_dir.as_deref())?;

        let strategy = match self.strategy {
            LoadStrategy::Auto => pick_strategy(&artifact),
            s => s,
        };
        debug!("loading {:?} artifact with {:?} strategy", artifact.kind(), strategy);

        let handle: ModelHandle = match strategy {
            LoadStrategy::Directory | LoadStrategy::Auto => Box::new(load_directory(&artifact)?),
            LoadStrategy::SingleFile => Box::new(load_single_file(&artifact)?),
            LoadStrategy::ServingEndpoint => Box::new(load_serving(&artifact, &self.endpoint)?),
        };

        t.stop();
        info!("model loaded ({:?})", strategy);
        Ok(handle)
    }
}

fn pick_strategy(artifact: &ExtractedArtifact) -> LoadStrategy {
    let entries = artifact.entries();
    if find_manifest(entries).is_some() {
        return LoadStrategy::ServingEndpoint;
    }
    match entries.first() {
        Some(first) if first.is_dir || first.name.contains('/') => LoadStrategy::Directory,
        _ => LoadStrategy::SingleFile,
    }
}

fn is_json(entry: &ArchiveEntry) -> bool {
    !entry.is_dir && entry.file_name().to_ascii_lowercase().ends_with(".json")
}

fn find_manifest(entries: &[ArchiveEntry]) -> Option<&ArchiveEntry> {
    entries.iter().find(|e| !e.is_dir && e.file_name() == SIGNATURES_FILE)
}

fn read_network(path: &Path, display: &str) -> Result<Network> {
    Network::load_json(path).map_err(|source| ModelError::Network { path: display.to_owned(), source })
}

/// The first entry in the listing decides: a folder means `<folder>/model.json`,
/// a lone `.json` file is loaded as is, anything else is not a model.
fn load_directory(artifact: &ExtractedArtifact) -> Result<FullModel> {
    let first = artifact.entries().first().ok_or(ModelError::EmptyArchive)?;

    let rel = if first.is_dir || first.name.contains('/') {
        format!("{}/{}", first.top_level(), DIRECTORY_MODEL_FILE)
    } else if is_json(first) {
        first.name.clone()
    } else {
        return Err(ModelError::NotAModel(first.name.clone()));
    };

    let path = artifact.path_of(&rel)?;
    if !path.is_file() {
        return Err(ModelError::NotAModel(first.name.clone()));
    }
    Ok(FullModel::new(read_network(&path, &rel)?))
}

fn load_single_file(artifact: &ExtractedArtifact) -> Result<FullModel> {
    let entry = artifact.entries().iter()
        .find(|e| is_json(e) && e.file_name() != SIGNATURES_FILE)
        .ok_or_else(|| ModelError::NotAModel(
            artifact.entries().first().map(|e| e.name.clone()).unwrap_or_default()
        ))?;
    Ok(FullModel::new(read_network(&artifact.path_of(&entry.name)?, &entry.name)?))
}

fn load_serving(artifact: &ExtractedArtifact, endpoint: &str) -> Result<ServingModel> {
    let manifest_entry = find_manifest(artifact.entries())
        .ok_or_else(|| ModelError::NotAModel(format!("no {} in archive", SIGNATURES_FILE)))?;
    let manifest_path = artifact.path_of(&manifest_entry.name)?;
    let manifest: Manifest = serde_json::from_reader(File::open(&manifest_path)?)
        .map_err(ModelError::Manifest)?;

    let signature = manifest.signatures.iter()
        .find(|s| s.name == endpoint)
        .ok_or_else(|| ModelError::EndpointNotFound {
            endpoint: endpoint.to_owned(),
            available: manifest.signatures.iter().map(|s| s.name.clone()).collect(),
        })?;
    if signature.outputs.is_empty() {
        return Err(ModelError::NoOutputs(endpoint.to_owned()));
    }

    let base = manifest_path.parent().unwrap_or_else(|| artifact.root());
    let mut outputs = Vec::with_capacity(signature.outputs.len());
    for spec in &signature.outputs {
        if !archive::is_enclosed(Path::new(&spec.model)) {
            return Err(ModelError::UnsafePath(spec.model.clone()));
        }
        let network = read_network(&base.join(&spec.model), &spec.model)?;
        outputs.push((spec.name.clone(), network));
    }

    Ok(ServingModel { endpoint: endpoint.to_owned(), outputs })
}
