//! Maven reactor loading for the ENSIME generator.
//!
//! This crate turns a workspace folder with a `pom.xml` into a [`BuildModel`]:
//! - buildable modules with their coordinates
//! - declared and managed dependencies (interpolated)
//! - typed plugin configuration (`scala-maven-plugin`, `maven-compiler-plugin`)
//! - `<build>` source and output directories

mod maven;
mod model;
pub mod pom;

pub use model::*;

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse XML in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("no pom.xml found at {root}")]
    NotAMavenProject { root: PathBuf },
}

/// Loads the Maven reactor rooted at `root`.
pub fn load_build_model(root: impl AsRef<Path>) -> Result<BuildModel, ProjectError> {
    let root = root.as_ref();
    let workspace_root = std::fs::canonicalize(root).map_err(|source| ProjectError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    if !workspace_root.join("pom.xml").is_file() {
        return Err(ProjectError::NotAMavenProject {
            root: workspace_root,
        });
    }

    maven::load_maven_model(&workspace_root)
}
