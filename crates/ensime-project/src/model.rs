use std::fmt;
use std::path::{Path, PathBuf};

/// `groupId:artifactId` of the Scala compiler plugin for Maven.
pub const SCALA_MAVEN_PLUGIN: &str = "net.alchim31.maven:scala-maven-plugin";

/// `groupId:artifactId` of the stock Java compiler plugin.
pub const COMPILER_MAVEN_PLUGIN: &str = "org.apache.maven.plugins:maven-compiler-plugin";

/// Group used for `<plugin>` entries that omit `<groupId>`.
pub const DEFAULT_PLUGIN_GROUP_ID: &str = "org.apache.maven.plugins";

/// A fully specified artifact address in a Maven repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Empty classifier is represented as `None`.
    pub classifier: Option<String>,
    pub extension: String,
}

impl Coordinate {
    pub fn jar(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            extension: "jar".to_string(),
        }
    }

    /// Same coordinate with `classifier` applied. An empty classifier clears it.
    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = if classifier.is_empty() {
            None
        } else {
            Some(classifier.to_string())
        };
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    pub fn matches(&self, group_id: &str, artifact_id: &str) -> bool {
        self.group_id == group_id && self.artifact_id == artifact_id
    }

    /// File name this artifact has inside a repository, e.g. `foo-1.0-sources.jar`.
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.extension)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        write!(f, ":{}", self.version)
    }
}

/// A `<dependency>` declaration after property interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub classifier: Option<String>,
    pub type_: Option<String>,
    pub optional: bool,
}

impl Dependency {
    pub fn matches(&self, group_id: &str, artifact_id: &str) -> bool {
        self.group_id == group_id && self.artifact_id == artifact_id
    }

    /// Declared scope; Maven treats a missing scope as `compile`.
    pub fn scope(&self) -> &str {
        self.scope.as_deref().unwrap_or("compile")
    }

    /// Declared type; Maven treats a missing type as `jar`.
    pub fn type_(&self) -> &str {
        self.type_.as_deref().unwrap_or("jar")
    }

    /// The binary jar coordinate for this dependency, when its version is known.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let version = self.version.as_deref()?;
        if version.contains("${") {
            return None;
        }
        let mut coordinate = Coordinate::jar(&self.group_id, &self.artifact_id, version);
        if let Some(classifier) = &self.classifier {
            coordinate = coordinate.with_classifier(classifier);
        }
        Some(coordinate)
    }
}

/// Typed `<configuration>` of `scala-maven-plugin`.
///
/// Every field is `None` when the element is absent, which is distinct from an
/// element present with no children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalaPluginConfig {
    pub scala_organization: Option<String>,
    pub args: Option<Vec<String>>,
    pub jvm_args: Option<Vec<String>>,
    pub sources: Option<Vec<String>>,
}

impl ScalaPluginConfig {
    fn merged_over(self, base: Self) -> Self {
        Self {
            scala_organization: self.scala_organization.or(base.scala_organization),
            args: self.args.or(base.args),
            jvm_args: self.jvm_args.or(base.jvm_args),
            sources: self.sources.or(base.sources),
        }
    }

    pub(crate) fn map_values(self, f: &impl Fn(&str) -> String) -> Self {
        Self {
            scala_organization: self.scala_organization.map(|v| f(&v)),
            args: map_list(self.args, f),
            jvm_args: map_list(self.jvm_args, f),
            sources: map_list(self.sources, f),
        }
    }
}

/// Typed `<configuration>` of `maven-compiler-plugin`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerPluginConfig {
    pub compiler_args: Option<Vec<String>>,
}

impl CompilerPluginConfig {
    fn merged_over(self, base: Self) -> Self {
        Self {
            compiler_args: self.compiler_args.or(base.compiler_args),
        }
    }

    pub(crate) fn map_values(self, f: &impl Fn(&str) -> String) -> Self {
        Self {
            compiler_args: map_list(self.compiler_args, f),
        }
    }
}

fn map_list(list: Option<Vec<String>>, f: &impl Fn(&str) -> String) -> Option<Vec<String>> {
    list.map(|values| values.iter().map(|v| f(v)).collect())
}

/// The plugin configuration blocks this tool understands, parsed once at the POM boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginConfigs {
    pub scala: Option<ScalaPluginConfig>,
    pub compiler: Option<CompilerPluginConfig>,
}

impl PluginConfigs {
    /// Field-wise merge: values present in `self` win over `base`.
    pub fn merged_over(self, base: &PluginConfigs) -> PluginConfigs {
        let scala = match (self.scala, base.scala.clone()) {
            (Some(own), Some(base)) => Some(own.merged_over(base)),
            (own, base) => own.or(base),
        };
        let compiler = match (self.compiler, base.compiler.clone()) {
            (Some(own), Some(base)) => Some(own.merged_over(base)),
            (own, base) => own.or(base),
        };
        PluginConfigs { scala, compiler }
    }

    pub fn scala_organization(&self) -> Option<&str> {
        self.scala
            .as_ref()
            .and_then(|s| s.scala_organization.as_deref())
    }

    pub fn scalac_args(&self) -> Option<&[String]> {
        self.scala.as_ref().and_then(|s| s.args.as_deref())
    }

    pub fn jvm_args(&self) -> Option<&[String]> {
        self.scala.as_ref().and_then(|s| s.jvm_args.as_deref())
    }

    pub fn scala_sources(&self) -> Option<&[String]> {
        self.scala.as_ref().and_then(|s| s.sources.as_deref())
    }

    pub fn javac_args(&self) -> Option<&[String]> {
        self.compiler
            .as_ref()
            .and_then(|c| c.compiler_args.as_deref())
    }
}

/// Absolute `<build>` directories of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirs {
    pub source_directory: PathBuf,
    pub output_directory: PathBuf,
    pub test_output_directory: PathBuf,
}

impl BuildDirs {
    /// Maven's standard layout below `basedir`.
    pub fn standard(basedir: &Path) -> Self {
        Self {
            source_directory: basedir.join("src/main/java"),
            output_directory: basedir.join("target/classes"),
            test_output_directory: basedir.join("target/test-classes"),
        }
    }
}

/// One buildable unit of a Maven reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildModule {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub packaging: String,
    /// `<name>`, when declared.
    pub name: Option<String>,
    pub basedir: PathBuf,
    pub dependencies: Vec<Dependency>,
    /// Effective `<dependencyManagement>` entries, parents included.
    pub dependency_management: Vec<Dependency>,
    pub plugins: PluginConfigs,
    pub build: BuildDirs,
}

impl BuildModule {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.artifact_id)
    }

    pub fn is_aggregator(&self) -> bool {
        self.packaging == "pom"
    }

    /// Declared compile source roots (`<sourceDirectory>`).
    pub fn compile_source_roots(&self) -> Vec<PathBuf> {
        vec![self.build.source_directory.clone()]
    }
}

/// The reactor as seen by the generator: the top-level project plus every
/// buildable (non-`pom`) module, the top-level one included when it builds code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildModel {
    pub root: BuildModule,
    pub modules: Vec<BuildModule>,
}

impl BuildModel {
    pub fn root_dir(&self) -> &Path {
        &self.root.basedir
    }

    /// `(groupId, artifactId)` pairs of every module in the reactor.
    pub fn internal_artifacts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules
            .iter()
            .map(|m| (m.group_id.as_str(), m.artifact_id.as_str()))
    }
}
