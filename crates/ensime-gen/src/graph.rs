use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use ensime_project::{BuildModel, BuildModule, Coordinate, Dependency};
use rayon::prelude::*;

use crate::locator::ArtifactLocator;
use crate::model::{Goal, ProjectDescriptor, ProjectId};
use crate::options;

/// Classifiers looked up for every library: binaries, sources, javadoc.
const LIBRARY_CLASSIFIERS: [&str; 3] = ["", "sources", "javadoc"];

#[derive(Debug, Default)]
struct LibraryFiles {
    jars: BTreeSet<PathBuf>,
    sources: BTreeSet<PathBuf>,
    docs: BTreeSet<PathBuf>,
}

/// Builds one [`ProjectDescriptor`] per module and goal.
#[derive(Debug)]
pub struct ProjectGraphBuilder<'a> {
    model: &'a BuildModel,
    locator: &'a ArtifactLocator,
    suggested_options: Vec<String>,
}

impl<'a> ProjectGraphBuilder<'a> {
    pub fn new(model: &'a BuildModel, locator: &'a ArtifactLocator, runtime_version: &str) -> Self {
        Self {
            model,
            locator,
            suggested_options: options::suggested_options(runtime_version),
        }
    }

    /// Descriptors for every module, `compile` before `test` for each one.
    pub fn build(&self) -> Vec<ProjectDescriptor> {
        let internal: HashSet<(&str, &str)> = self.model.internal_artifacts().collect();
        let libraries = self.locate_libraries();

        self.model
            .modules
            .par_iter()
            .flat_map_iter(|module| {
                Goal::ALL
                    .into_iter()
                    .map(|goal| self.describe(module, goal, &internal, &libraries))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Resolves every distinct library coordinate once, in parallel.
    fn locate_libraries(&self) -> HashMap<Coordinate, BTreeSet<PathBuf>> {
        let coordinates: BTreeSet<Coordinate> = self
            .model
            .modules
            .iter()
            .flat_map(|module| &module.dependencies)
            .filter_map(library_coordinate)
            .flat_map(|coordinate| {
                LIBRARY_CLASSIFIERS
                    .into_iter()
                    .map(move |classifier| coordinate.clone().with_classifier(classifier))
            })
            .collect();

        coordinates
            .into_par_iter()
            .map(|coordinate| {
                let files = self.locator.locate_all(&coordinate);
                (coordinate, files)
            })
            .collect()
    }

    fn describe(
        &self,
        module: &BuildModule,
        goal: Goal,
        internal: &HashSet<(&str, &str)>,
        libraries: &HashMap<Coordinate, BTreeSet<PathBuf>>,
    ) -> ProjectDescriptor {
        let id = ProjectId::new(&module.artifact_id, goal);

        let mut depends_on = Vec::new();
        if goal == Goal::Test {
            depends_on.push(ProjectId::new(&module.artifact_id, Goal::Compile));
        }
        depends_on.extend(
            module
                .dependencies
                .iter()
                .filter(|dep| dep.scope() == goal.as_str())
                .filter(|dep| internal.contains(&(dep.group_id.as_str(), dep.artifact_id.as_str())))
                .map(|dep| ProjectId::new(&dep.artifact_id, Goal::for_dependency_type(dep.type_()))),
        );

        let targets = BTreeSet::from([match goal {
            Goal::Compile => module.build.output_directory.clone(),
            Goal::Test => module.build.test_output_directory.clone(),
        }]);

        let compiler_options =
            options::scalac_options(module.plugins.scalac_args(), &self.suggested_options);
        let tool_options =
            options::javac_options(module.plugins.javac_args(), module.plugins.jvm_args());

        let mut files = LibraryFiles::default();
        for dep in &module.dependencies {
            let Some(coordinate) = library_coordinate(dep) else {
                tracing::debug!(
                    target = "ensime.graph",
                    module = %module.artifact_id,
                    dependency = %format!("{}:{}", dep.group_id, dep.artifact_id),
                    "dependency has no version; skipped"
                );
                continue;
            };
            for classifier in LIBRARY_CLASSIFIERS {
                let located = libraries
                    .get(&coordinate.clone().with_classifier(classifier))
                    .into_iter()
                    .flatten()
                    .filter(|file| is_jar(file))
                    .cloned();
                match classifier {
                    "" => files.jars.extend(located),
                    "sources" => files.sources.extend(located),
                    _ => files.docs.extend(located),
                }
            }
        }

        ProjectDescriptor {
            id,
            depends_on,
            sources: source_roots(module, goal),
            targets,
            compiler_options,
            tool_options,
            library_jars: files.jars,
            library_sources: files.sources,
            library_docs: files.docs,
        }
    }
}

/// The plain jar coordinate of a dependency. Classifiers and types are
/// ignored; the classifier lookups are added on top.
fn library_coordinate(dep: &Dependency) -> Option<Coordinate> {
    let coordinate = dep.coordinate()?;
    Some(Coordinate::jar(
        coordinate.group_id,
        coordinate.artifact_id,
        coordinate.version,
    ))
}

fn is_jar(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jar")
}

/// Existing source roots of `module` for `goal`: the Scala plugin's
/// `<sources>` (or `src/{main,test}/{scala,java}`) plus the module's compile
/// source roots, which both goals see.
fn source_roots(module: &BuildModule, goal: Goal) -> BTreeSet<PathBuf> {
    let configured: Vec<PathBuf> = module
        .plugins
        .scala_sources()
        .unwrap_or_default()
        .iter()
        .map(|source| module.basedir.join(source))
        .collect();

    let defaults = if configured.is_empty() {
        let src = module.basedir.join("src").join(goal.source_dir_name());
        vec![src.join("scala"), src.join("java")]
    } else {
        configured
    };

    defaults
        .into_iter()
        .chain(module.compile_source_roots())
        .filter(|path| path.exists())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeResolver;
    use ensime_project::{BuildDirs, PluginConfigs, ScalaPluginConfig};

    fn dependency(group: &str, artifact: &str, scope: Option<&str>, type_: Option<&str>) -> Dependency {
        Dependency {
            group_id: group.to_string(),
            artifact_id: artifact.to_string(),
            version: Some("1.0".to_string()),
            scope: scope.map(str::to_string),
            classifier: None,
            type_: type_.map(str::to_string),
            optional: false,
        }
    }

    fn module(basedir: &Path, artifact: &str, dependencies: Vec<Dependency>) -> BuildModule {
        BuildModule {
            group_id: "com.example".to_string(),
            artifact_id: artifact.to_string(),
            version: Some("1.0".to_string()),
            packaging: "jar".to_string(),
            name: None,
            basedir: basedir.to_path_buf(),
            dependencies,
            dependency_management: Vec::new(),
            plugins: PluginConfigs::default(),
            build: BuildDirs::standard(basedir),
        }
    }

    fn model(modules: Vec<BuildModule>) -> BuildModel {
        let mut root = modules[0].clone();
        root.packaging = "pom".to_string();
        BuildModel { root, modules }
    }

    #[test]
    fn internal_dependencies_become_edges() {
        let temp = tempfile::tempdir().unwrap();
        let core = module(&temp.path().join("core"), "core", Vec::new());
        let app = module(
            &temp.path().join("app"),
            "app",
            vec![
                dependency("com.example", "core", None, None),
                dependency("com.example", "core", Some("test"), Some("test-jar")),
                dependency("org.other", "lib", None, None),
            ],
        );
        let model = model(vec![core, app]);
        let locator = FakeResolver::default().locator();
        let projects = ProjectGraphBuilder::new(&model, &locator, "2.11.12").build();

        let ids: Vec<String> = projects.iter().map(|p| p.id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "EnsimeProjectId(core, compile)",
                "EnsimeProjectId(core, test)",
                "EnsimeProjectId(app, compile)",
                "EnsimeProjectId(app, test)",
            ]
        );

        assert_eq!(projects[2].depends_on, vec![ProjectId::new("core", Goal::Compile)]);
        assert_eq!(
            projects[3].depends_on,
            vec![
                ProjectId::new("app", Goal::Compile),
                ProjectId::new("core", Goal::Test),
            ]
        );
        assert_eq!(projects[1].depends_on, vec![ProjectId::new("core", Goal::Compile)]);
    }

    #[test]
    fn only_existing_source_roots_are_kept() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("core");
        std::fs::create_dir_all(base.join("src/main/scala")).unwrap();
        std::fs::create_dir_all(base.join("src/test/java")).unwrap();

        let model = model(vec![module(&base, "core", Vec::new())]);
        let locator = FakeResolver::default().locator();
        let projects = ProjectGraphBuilder::new(&model, &locator, "2.12.8").build();

        assert_eq!(projects[0].sources, BTreeSet::from([base.join("src/main/scala")]));
        assert_eq!(projects[1].sources, BTreeSet::from([base.join("src/test/java")]));
        assert_eq!(projects[0].targets, BTreeSet::from([base.join("target/classes")]));
        assert_eq!(projects[1].targets, BTreeSet::from([base.join("target/test-classes")]));
    }

    #[test]
    fn test_goal_also_sees_compile_source_roots() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("core");
        for dir in ["src/main/java", "src/main/scala", "src/test/scala"] {
            std::fs::create_dir_all(base.join(dir)).unwrap();
        }

        let model = model(vec![module(&base, "core", Vec::new())]);
        let locator = FakeResolver::default().locator();
        let projects = ProjectGraphBuilder::new(&model, &locator, "2.12.8").build();

        assert_eq!(
            projects[0].sources,
            BTreeSet::from([base.join("src/main/java"), base.join("src/main/scala")])
        );
        assert_eq!(projects[1].id, ProjectId::new("core", Goal::Test));
        assert_eq!(
            projects[1].sources,
            BTreeSet::from([base.join("src/main/java"), base.join("src/test/scala")])
        );
    }

    #[test]
    fn configured_scala_sources_replace_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("core");
        std::fs::create_dir_all(base.join("src/main/scala")).unwrap();
        std::fs::create_dir_all(base.join("shared")).unwrap();

        let mut core = module(&base, "core", Vec::new());
        core.plugins.scala = Some(ScalaPluginConfig {
            sources: Some(vec!["shared".to_string(), "missing".to_string()]),
            ..ScalaPluginConfig::default()
        });
        let model = model(vec![core]);
        let locator = FakeResolver::default().locator();
        let projects = ProjectGraphBuilder::new(&model, &locator, "2.12.8").build();

        assert_eq!(projects[0].sources, BTreeSet::from([base.join("shared")]));
    }

    #[test]
    fn options_merge_declared_args_with_suggestions() {
        let temp = tempfile::tempdir().unwrap();
        let mut core = module(temp.path(), "core", Vec::new());
        core.plugins.scala = Some(ScalaPluginConfig {
            args: Some(vec!["-Xfatal-warnings".to_string(), "-Xlint".to_string()]),
            jvm_args: Some(vec!["-Xss4m".to_string()]),
            ..ScalaPluginConfig::default()
        });
        let model = model(vec![core]);
        let locator = FakeResolver::default().locator();
        let projects = ProjectGraphBuilder::new(&model, &locator, "2.10.6").build();

        let opts = &projects[0].compiler_options;
        assert_eq!(opts[0], "-Xfatal-warnings");
        assert_eq!(opts[1], "-Xlint");
        assert_eq!(opts.last().map(String::as_str), Some("-Ymacro-no-expand"));
        assert_eq!(projects[0].tool_options, vec!["-Xss4m".to_string()]);
    }

    #[test]
    fn library_files_are_located_per_classifier() {
        let temp = tempfile::tempdir().unwrap();
        let lib = Coordinate::jar("org.other", "lib", "1.0");
        let dep = Coordinate::jar("org.other", "dep", "2.0");
        let junit = Coordinate::jar("junit", "junit", "1.0");
        let locator = FakeResolver::default()
            .with_artifact(lib.clone(), "/repo/lib-1.0.jar")
            .with_artifact(lib.clone().with_classifier("sources"), "/repo/lib-1.0-sources.jar")
            .with_artifact(lib.clone().with_classifier("javadoc"), "/repo/lib-1.0-javadoc.jar")
            .with_artifact(dep.clone(), "/repo/dep-2.0.jar")
            .with_artifact(dep.clone().with_extension("pom"), "/repo/dep-2.0.pom")
            .with_dependency(lib.clone(), dep.clone())
            .with_dependency(lib.clone(), dep.with_extension("pom"))
            .with_artifact(junit, "/repo/junit-1.0.jar")
            .locator();

        let model = model(vec![module(
            temp.path(),
            "core",
            vec![
                dependency("org.other", "lib", None, None),
                dependency("junit", "junit", Some("test"), None),
            ],
        )]);
        let projects = ProjectGraphBuilder::new(&model, &locator, "2.12.8").build();

        let compile = &projects[0];
        assert_eq!(
            compile.library_jars,
            BTreeSet::from([
                PathBuf::from("/repo/lib-1.0.jar"),
                PathBuf::from("/repo/dep-2.0.jar"),
                PathBuf::from("/repo/junit-1.0.jar"),
            ])
        );
        assert!(compile.library_sources.contains(Path::new("/repo/lib-1.0-sources.jar")));
        assert!(compile.library_docs.contains(Path::new("/repo/lib-1.0-javadoc.jar")));

        // Both goals see every direct dependency, test-scoped ones included.
        let test = &projects[1];
        assert_eq!(test.library_jars, compile.library_jars);
    }

    #[test]
    fn unresolvable_libraries_yield_empty_sets() {
        let temp = tempfile::tempdir().unwrap();
        let model = model(vec![module(
            temp.path(),
            "core",
            vec![dependency("org.missing", "gone", None, None)],
        )]);
        let locator = FakeResolver::default().locator();
        let projects = ProjectGraphBuilder::new(&model, &locator, "2.12.8").build();

        assert!(projects[0].library_jars.is_empty());
        assert!(projects[0].library_sources.is_empty());
        assert!(projects[0].library_docs.is_empty());
    }
}
