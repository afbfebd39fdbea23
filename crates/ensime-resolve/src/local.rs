use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use ensime_project::pom::{parse_pom, EffectivePom};
use ensime_project::Coordinate;

use crate::{mediate_scope, ArtifactResolver, ClosureResolution, ResolveError, ResolvedArtifact};

/// Parent chains deeper than this are treated as cyclic.
const MAX_PARENT_DEPTH: usize = 16;

/// `~/.m2/repository`, when a home directory is known.
pub fn default_local_repository() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)?;
    Some(home.join(".m2/repository"))
}

/// An offline resolver over a Maven local repository directory.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Uses `override_root` when given, else `~/.m2/repository`.
    pub fn discover(override_root: Option<&Path>) -> Self {
        let root = override_root
            .map(Path::to_path_buf)
            .or_else(default_local_repository)
            .unwrap_or_else(|| PathBuf::from(".m2/repository"));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.version_dir(
            &coordinate.group_id,
            &coordinate.artifact_id,
            &coordinate.version,
        )
        .join(coordinate.file_name())
    }

    fn version_dir(&self, group_id: &str, artifact_id: &str, version: &str) -> PathBuf {
        self.root
            .join(group_id.replace('.', "/"))
            .join(artifact_id)
            .join(version)
    }

    fn pom_coordinate(coordinate: &Coordinate) -> Coordinate {
        Coordinate::jar(
            &coordinate.group_id,
            &coordinate.artifact_id,
            &coordinate.version,
        )
        .with_extension("pom")
    }

    fn effective_pom(&self, coordinate: &Coordinate) -> Result<EffectivePom, ResolveError> {
        self.effective_pom_at_depth(&Self::pom_coordinate(coordinate), 0)
    }

    fn effective_pom_at_depth(
        &self,
        pom: &Coordinate,
        depth: usize,
    ) -> Result<EffectivePom, ResolveError> {
        let path = self.artifact_path(pom);
        if !path.is_file() {
            return Err(ResolveError::NotFound {
                coordinate: pom.clone(),
                path,
            });
        }
        let raw = parse_pom(&path).map_err(|source| ResolveError::Pom {
            coordinate: pom.clone(),
            source,
        })?;

        let parent = match &raw.parent {
            Some(parent) if depth < MAX_PARENT_DEPTH => {
                match (&parent.group_id, &parent.artifact_id, &parent.version) {
                    (Some(g), Some(a), Some(v)) => {
                        let parent_pom = Coordinate::jar(g, a, v).with_extension("pom");
                        match self.effective_pom_at_depth(&parent_pom, depth + 1) {
                            Ok(parent) => Some(parent),
                            Err(err) => {
                                tracing::debug!(
                                    target = "ensime.resolve",
                                    pom = %pom,
                                    error = %err,
                                    "parent POM unavailable; continuing without it"
                                );
                                None
                            }
                        }
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        Ok(EffectivePom::from_raw(&raw, parent.as_ref(), None))
    }
}

impl ArtifactResolver for LocalRepository {
    fn resolve_artifact(&self, coordinate: &Coordinate) -> Result<PathBuf, ResolveError> {
        let path = self.artifact_path(coordinate);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ResolveError::NotFound {
                coordinate: coordinate.clone(),
                path,
            })
        }
    }

    fn resolve_closure(
        &self,
        root: &Coordinate,
        scope: &str,
    ) -> Result<ClosureResolution, ResolveError> {
        let mut result = ClosureResolution::default();
        // Nearest declaration wins, as in Maven's dependency mediation.
        let mut seen: HashSet<(String, String, Option<String>)> = HashSet::new();
        let mut queue: VecDeque<(Coordinate, String)> = VecDeque::new();
        queue.push_back((root.clone(), scope.to_string()));

        let mut root_pom_error = None;
        let mut is_root = true;

        while let Some((coordinate, node_scope)) = queue.pop_front() {
            let key = (
                coordinate.group_id.clone(),
                coordinate.artifact_id.clone(),
                coordinate.classifier.clone(),
            );
            if !seen.insert(key) {
                continue;
            }

            match self.resolve_artifact(&coordinate) {
                Ok(file) => result.artifacts.push(ResolvedArtifact {
                    coordinate: coordinate.clone(),
                    file,
                }),
                Err(err) => result.unresolved.push((coordinate.clone(), err)),
            }

            let pom = match self.effective_pom(&coordinate) {
                Ok(pom) => pom,
                Err(err) => {
                    if is_root {
                        root_pom_error = Some(err);
                    } else {
                        tracing::debug!(
                            target = "ensime.resolve",
                            artifact = %coordinate,
                            error = %err,
                            "no POM for artifact; its dependencies are skipped"
                        );
                    }
                    is_root = false;
                    continue;
                }
            };
            is_root = false;

            for dep in &pom.dependencies {
                if dep.optional || dep.type_() != "jar" {
                    continue;
                }
                let Some(dep_scope) = mediate_scope(&node_scope, dep.scope()) else {
                    continue;
                };
                // Classifiers apply to the requested root only; its dependencies
                // are always the binary jars.
                match dep.version.as_deref().filter(|v| !v.contains("${")) {
                    Some(version) => {
                        let mut next = Coordinate::jar(&dep.group_id, &dep.artifact_id, version);
                        if let Some(classifier) = &dep.classifier {
                            next = next.with_classifier(classifier);
                        }
                        queue.push_back((next, dep_scope.to_string()));
                    }
                    None => result.unresolved.push((
                        Coordinate::jar(&dep.group_id, &dep.artifact_id, "?"),
                        ResolveError::MissingVersion {
                            group_id: dep.group_id.clone(),
                            artifact_id: dep.artifact_id.clone(),
                            required_by: coordinate.clone(),
                        },
                    )),
                }
            }
        }

        if result.artifacts.is_empty() {
            if let Some(err) = root_pom_error {
                // Neither the root artifact nor its POM exist: nothing was learned.
                return Err(match result.unresolved.into_iter().next() {
                    Some((_, artifact_err)) => artifact_err,
                    None => err,
                });
            }
        }

        Ok(result)
    }
}
