use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use ensime_config::GeneratorSettings;
use ensime_jdk::JavaHome;
use ensime_project::{BuildModel, Coordinate, Dependency};
use rayon::prelude::*;

use crate::aggregate::aggregate;
use crate::graph::ProjectGraphBuilder;
use crate::locator::ArtifactLocator;
use crate::model::{Config, ModuleRecord, ProjectDescriptor};
use crate::options;
use crate::version::{binary_version, resolve_runtime_version, SCALA_LIBRARY_GROUP_ID};
use crate::Result;

/// Directory below the project root the server keeps its index in.
pub const CACHE_DIR_NAME: &str = ".ensime_cache";

const ENSIME_GROUP_ID: &str = "org.ensime";

/// Scala artifacts that make up a compiler installation.
const COMPILER_ARTIFACTS: [&str; 4] = ["scalap", "scala-compiler", "scala-library", "scala-reflect"];

/// Puts together the [`Config`] of a build.
#[derive(Debug)]
pub struct ConfigAssembler<'a> {
    model: &'a BuildModel,
    locator: &'a ArtifactLocator,
    settings: &'a GeneratorSettings,
    java_home: &'a JavaHome,
}

impl<'a> ConfigAssembler<'a> {
    pub fn new(
        model: &'a BuildModel,
        locator: &'a ArtifactLocator,
        settings: &'a GeneratorSettings,
        java_home: &'a JavaHome,
    ) -> Self {
        Self {
            model,
            locator,
            settings,
            java_home,
        }
    }

    pub fn assemble(&self) -> Result<Config> {
        let root = &self.model.root;
        let runtime_version = self.runtime_version();
        let organization = self.scala_organization();
        tracing::debug!(
            target = "ensime.assemble",
            scala_version = %runtime_version,
            scala_organization = %organization,
            "resolved scala toolchain"
        );

        let projects = ProjectGraphBuilder::new(self.model, self.locator, &runtime_version).build();
        let modules = aggregate_modules(&projects)?;

        Ok(Config {
            root_dir: self.model.root_dir().to_path_buf(),
            cache_dir: self.model.root_dir().join(CACHE_DIR_NAME),
            java_home: self.java_home.root().to_path_buf(),
            compiler_jars: self.compiler_jars(organization, &runtime_version),
            runtime_support_jars: self.server_jars(organization, &runtime_version),
            server_version: self.settings.server_version.clone(),
            name: root.display_name().to_string(),
            suggested_options: options::suggested_options(&runtime_version),
            runtime_version,
            modules,
            java_flags: ensime_jdk::java_flags(self.settings.java_flags.iter().cloned()),
            tool_options: options::javac_options(root.plugins.javac_args(), root.plugins.jvm_args()),
            extra_source_archives: self.java_home.source_archive().into_iter().collect(),
            projects,
        })
    }

    /// Dependencies consulted for the Scala version: the top-level project's
    /// own, then those of every module.
    fn direct_dependencies(&self) -> Vec<Dependency> {
        self.model
            .root
            .dependencies
            .iter()
            .chain(self.model.modules.iter().flat_map(|m| &m.dependencies))
            .cloned()
            .collect()
    }

    fn runtime_version(&self) -> String {
        let direct = self.direct_dependencies();
        // Only walked when neither an override nor a declaration decides.
        let transitive = std::iter::once_with(|| self.transitive_coordinates(&direct)).flatten();

        let choice = resolve_runtime_version(
            &direct,
            &self.model.root.dependency_management,
            transitive,
            self.settings.scala_version_override(),
            &self.settings.default_scala_version,
        );
        if let Some(advisory) = &choice.advisory {
            tracing::warn!(target = "ensime.assemble", "{advisory}");
        }
        choice.version
    }

    fn transitive_coordinates(&self, direct: &[Dependency]) -> Vec<Coordinate> {
        let roots: BTreeSet<Coordinate> = direct.iter().filter_map(Dependency::coordinate).collect();
        roots
            .into_par_iter()
            .flat_map_iter(|root| self.locator.transitive_coordinates(&root))
            .collect()
    }

    fn scala_organization(&self) -> &'a str {
        std::iter::once(&self.model.root)
            .chain(&self.model.modules)
            .find_map(|module| module.plugins.scala_organization())
            .unwrap_or(SCALA_LIBRARY_GROUP_ID)
    }

    fn compiler_jars(&self, organization: &str, version: &str) -> BTreeSet<PathBuf> {
        COMPILER_ARTIFACTS
            .par_iter()
            .filter_map(|artifact| {
                self.locator
                    .locate_one(&Coordinate::jar(organization, *artifact, version))
            })
            .collect()
    }

    /// The server's own classpath. Scala jars are dropped since the compiler
    /// jars are always listed alongside; `tools.jar` is always appended.
    fn server_jars(&self, organization: &str, version: &str) -> BTreeSet<PathBuf> {
        let mut jars = match binary_version(version) {
            Some((major, minor)) => self.locator.locate_all(&Coordinate::jar(
                ENSIME_GROUP_ID,
                format!("server_{major}.{minor}"),
                &self.settings.server_version,
            )),
            None => {
                tracing::warn!(
                    target = "ensime.assemble",
                    scala_version = %version,
                    "cannot derive the scala binary version; ENSIME server jars not resolved"
                );
                BTreeSet::new()
            }
        };
        jars.extend(
            self.locator
                .locate_one(&Coordinate::jar(organization, "scalap", version)),
        );

        jars.retain(|jar| {
            let name = jar
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            !["scalap", "scala-reflect", "scala-library", "scala-compiler"]
                .iter()
                .any(|scala| name.contains(scala))
        });
        jars.insert(self.java_home.tools_jar());
        jars
    }
}

/// Groups descriptors by module and folds each group.
fn aggregate_modules(projects: &[ProjectDescriptor]) -> Result<BTreeMap<String, ModuleRecord>> {
    let mut grouped: BTreeMap<&str, Vec<ProjectDescriptor>> = BTreeMap::new();
    for project in projects {
        grouped
            .entry(project.id.module.as_str())
            .or_default()
            .push(project.clone());
    }
    grouped
        .into_iter()
        .map(|(name, group)| Ok((name.to_string(), aggregate(&group)?)))
        .collect()
}
