//! Artifact resolution against a Maven repository layout.
//!
//! The generator only talks to [`ArtifactResolver`]; [`LocalRepository`] is the
//! offline implementation backed by `~/.m2/repository` (or an override). It never
//! downloads anything: an artifact that is not on disk is reported as unresolved.

mod local;

pub use local::{default_local_repository, LocalRepository};

use std::fmt;
use std::path::PathBuf;

use ensime_project::{Coordinate, ProjectError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("artifact {coordinate} not found at {path}")]
    NotFound { coordinate: Coordinate, path: PathBuf },

    #[error("dependency {group_id}:{artifact_id} of {required_by} has no resolvable version")]
    MissingVersion {
        group_id: String,
        artifact_id: String,
        required_by: Coordinate,
    },

    #[error("failed to read the POM of {coordinate}: {source}")]
    Pom {
        coordinate: Coordinate,
        #[source]
        source: ProjectError,
    },
}

/// An artifact that was found on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolvedArtifact {
    pub coordinate: Coordinate,
    pub file: PathBuf,
}

/// Outcome of a transitive resolution: everything that resolved, plus the nodes
/// that did not. A non-empty `unresolved` list is a partial result, not a failure.
#[derive(Debug, Default)]
pub struct ClosureResolution {
    pub artifacts: Vec<ResolvedArtifact>,
    pub unresolved: Vec<(Coordinate, ResolveError)>,
}

/// The dependency-resolution engine as seen by the generator.
pub trait ArtifactResolver: Send + Sync + fmt::Debug {
    /// Locates a single artifact without following its dependencies.
    fn resolve_artifact(&self, coordinate: &Coordinate) -> Result<PathBuf, ResolveError>;

    /// Resolves `root` and every artifact reachable from it.
    ///
    /// Returns `Err` only when nothing at all could be learned about `root`.
    fn resolve_closure(
        &self,
        root: &Coordinate,
        scope: &str,
    ) -> Result<ClosureResolution, ResolveError>;
}

/// Maven scope mediation: the scope a transitive dependency declared as
/// `declared` ends up with below a root requested in `root_scope`. `None` means
/// the dependency is not part of the closure.
pub fn mediate_scope(root_scope: &str, declared: &str) -> Option<&'static str> {
    match (root_scope, declared) {
        (_, "test" | "provided" | "system" | "import") => None,
        ("compile", "compile") => Some("compile"),
        ("compile" | "runtime", "runtime") | ("runtime", "compile") => Some("runtime"),
        ("provided", "compile" | "runtime") => Some("provided"),
        ("test", "compile" | "runtime") => Some("test"),
        _ => None,
    }
}
