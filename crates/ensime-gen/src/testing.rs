use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ensime_project::Coordinate;
use ensime_resolve::{ArtifactResolver, ClosureResolution, ResolveError, ResolvedArtifact};

use crate::ArtifactLocator;

/// In-memory resolver: artifacts are whatever was registered, edges are
/// followed regardless of scope.
#[derive(Debug, Default)]
pub(crate) struct FakeResolver {
    files: BTreeMap<Coordinate, PathBuf>,
    edges: BTreeMap<Coordinate, Vec<Coordinate>>,
}

impl FakeResolver {
    pub(crate) fn with_artifact(mut self, coordinate: Coordinate, file: impl AsRef<Path>) -> Self {
        self.files.insert(coordinate, file.as_ref().to_path_buf());
        self
    }

    pub(crate) fn with_dependency(mut self, from: Coordinate, to: Coordinate) -> Self {
        self.edges.entry(from).or_default().push(to);
        self
    }

    pub(crate) fn locator(self) -> ArtifactLocator {
        ArtifactLocator::new(Arc::new(self))
    }

    fn not_found(coordinate: &Coordinate) -> ResolveError {
        ResolveError::NotFound {
            coordinate: coordinate.clone(),
            path: PathBuf::from("/nowhere").join(coordinate.file_name()),
        }
    }
}

impl ArtifactResolver for FakeResolver {
    fn resolve_artifact(&self, coordinate: &Coordinate) -> Result<PathBuf, ResolveError> {
        self.files
            .get(coordinate)
            .cloned()
            .ok_or_else(|| Self::not_found(coordinate))
    }

    fn resolve_closure(
        &self,
        root: &Coordinate,
        _scope: &str,
    ) -> Result<ClosureResolution, ResolveError> {
        if !self.files.contains_key(root) && !self.edges.contains_key(root) {
            return Err(Self::not_found(root));
        }

        let mut result = ClosureResolution::default();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([root.clone()]);
        while let Some(coordinate) = queue.pop_front() {
            if !seen.insert(coordinate.clone()) {
                continue;
            }
            match self.resolve_artifact(&coordinate) {
                Ok(file) => result.artifacts.push(ResolvedArtifact {
                    coordinate: coordinate.clone(),
                    file,
                }),
                Err(err) => result.unresolved.push((coordinate.clone(), err)),
            }
            // Classified artifacts share the binary artifact's dependencies.
            let binary = coordinate.clone().with_classifier("");
            if let Some(next) = self.edges.get(&binary) {
                queue.extend(next.iter().cloned());
            }
        }
        Ok(result)
    }
}
