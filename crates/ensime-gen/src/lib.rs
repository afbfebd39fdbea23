//! Derives the ENSIME project model of a Maven build and writes it out as a
//! `.ensime` file.
//!
//! The pipeline is:
//! 1. pick the Scala version ([`version::resolve_runtime_version`]),
//! 2. describe every module per goal ([`ProjectGraphBuilder`]),
//! 3. fold those into modules ([`aggregate`]) and assemble the [`Config`]
//!    ([`ConfigAssembler`]),
//! 4. render it ([`sexp::render`]) and write it ([`write_config`]).
//!
//! Artifact lookups go through [`ArtifactLocator`], which never fails: missing
//! artifacts are logged and left out.

mod aggregate;
mod assemble;
mod graph;
mod locator;
mod model;
pub mod options;
pub mod server;
pub mod sexp;
#[cfg(test)]
mod testing;
pub mod version;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

use ensime_config::GeneratorSettings;
use ensime_jdk::JavaHome;
use ensime_project::BuildModel;
use ensime_resolve::ArtifactResolver;
use thiserror::Error;

pub use aggregate::aggregate;
pub use assemble::{ConfigAssembler, CACHE_DIR_NAME};
pub use graph::ProjectGraphBuilder;
pub use locator::ArtifactLocator;
pub use model::{Config, Goal, ModuleRecord, ProjectDescriptor, ProjectId};

/// Name of the generated file, relative to the project root.
pub const CONFIG_FILE_NAME: &str = ".ensime";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("cannot aggregate a module without any project descriptors")]
    EmptyModule,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to create ensime cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to start ensime server for indexing (`{command}`): {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ensime server exited with {status}")]
    ServerExit { status: ExitStatus },
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

/// Builds the [`Config`] of `model`, resolving artifacts through `resolver`.
pub fn generate(
    model: &BuildModel,
    settings: &GeneratorSettings,
    java_home: &JavaHome,
    resolver: Arc<dyn ArtifactResolver>,
) -> Result<Config> {
    let locator = ArtifactLocator::new(resolver);
    ConfigAssembler::new(model, &locator, settings, java_home).assemble()
}

/// Renders `config` into `<root_dir>/.ensime` and returns the written path.
pub fn write_config(config: &Config) -> Result<PathBuf> {
    let path = config.root_dir.join(CONFIG_FILE_NAME);
    write_rendered(config, &path)?;
    tracing::info!(
        target = "ensime.gen",
        path = %path.display(),
        modules = config.modules.len(),
        "wrote ENSIME configuration"
    );
    Ok(path)
}

fn write_rendered(config: &Config, path: &Path) -> Result<()> {
    std::fs::write(path, sexp::render(config)).map_err(|source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    })
}
