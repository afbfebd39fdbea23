use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use ensime_project::Coordinate;
use ensime_resolve::{ArtifactResolver, ResolvedArtifact};

/// Best-effort artifact lookups. Nothing here fails: whatever cannot be
/// resolved is logged at `debug` and left out.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    resolver: Arc<dyn ArtifactResolver>,
}

impl ArtifactLocator {
    pub fn new(resolver: Arc<dyn ArtifactResolver>) -> Self {
        Self { resolver }
    }

    /// The file of exactly `coordinate`, without its dependencies.
    pub fn locate_one(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        match self.resolver.resolve_artifact(coordinate) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::debug!(
                    target = "ensime.locate",
                    artifact = %coordinate,
                    error = %err,
                    "artifact not resolved"
                );
                None
            }
        }
    }

    /// `coordinate` and its transitive `compile` closure, without `.pom` files.
    pub fn locate_all(&self, coordinate: &Coordinate) -> BTreeSet<PathBuf> {
        self.closure(coordinate)
            .into_iter()
            .map(|artifact| artifact.file)
            .filter(|file| !file.to_string_lossy().ends_with(".pom"))
            .collect()
    }

    /// Coordinates of everything resolved in the `compile` closure of `coordinate`.
    pub fn transitive_coordinates(&self, coordinate: &Coordinate) -> Vec<Coordinate> {
        self.closure(coordinate)
            .into_iter()
            .map(|artifact| artifact.coordinate)
            .collect()
    }

    fn closure(&self, coordinate: &Coordinate) -> Vec<ResolvedArtifact> {
        match self.resolver.resolve_closure(coordinate, "compile") {
            Ok(resolution) => {
                for (missing, err) in &resolution.unresolved {
                    tracing::debug!(
                        target = "ensime.locate",
                        root = %coordinate,
                        artifact = %missing,
                        error = %err,
                        "dependency not resolved; keeping partial result"
                    );
                }
                resolution.artifacts
            }
            Err(err) => {
                tracing::debug!(
                    target = "ensime.locate",
                    artifact = %coordinate,
                    error = %err,
                    "dependency closure not resolved"
                );
                Vec::new()
            }
        }
    }
}
