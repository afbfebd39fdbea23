use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// The build phases a module is described for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Goal {
    Compile,
    Test,
}

impl Goal {
    pub const ALL: [Goal; 2] = [Goal::Compile, Goal::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Goal::Compile => "compile",
            Goal::Test => "test",
        }
    }

    /// Directory name below `src/` holding this goal's sources.
    pub fn source_dir_name(self) -> &'static str {
        match self {
            Goal::Compile => "main",
            Goal::Test => "test",
        }
    }

    /// The goal a dependency of Maven type `type_` is consumed by.
    /// `test-jar` maps to `test`; `jar` and anything unknown map to `compile`.
    pub fn for_dependency_type(type_: &str) -> Goal {
        match type_ {
            "test-jar" => Goal::Test,
            _ => Goal::Compile,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId {
    pub module: String,
    pub goal: Goal,
}

impl ProjectId {
    pub fn new(module: impl Into<String>, goal: Goal) -> Self {
        Self {
            module: module.into(),
            goal,
        }
    }

    /// Key used to order ids in the generated file.
    pub fn sort_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnsimeProjectId({}, {})", self.module, self.goal)
    }
}

/// One module built for one goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub id: ProjectId,
    pub depends_on: Vec<ProjectId>,
    pub sources: BTreeSet<PathBuf>,
    pub targets: BTreeSet<PathBuf>,
    pub compiler_options: Vec<String>,
    pub tool_options: Vec<String>,
    pub library_jars: BTreeSet<PathBuf>,
    pub library_sources: BTreeSet<PathBuf>,
    pub library_docs: BTreeSet<PathBuf>,
}

/// A module with its `compile` and `test` descriptors folded together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRecord {
    pub name: String,
    pub main_source_roots: BTreeSet<PathBuf>,
    pub test_source_roots: BTreeSet<PathBuf>,
    pub targets: BTreeSet<PathBuf>,
    pub test_targets: BTreeSet<PathBuf>,
    pub depends_on_modules: BTreeSet<String>,
    pub compile_jars: BTreeSet<PathBuf>,
    /// Never populated; kept so the file always carries `:runtime-deps`.
    pub runtime_jars: BTreeSet<PathBuf>,
    /// Jars needed by tests only; disjoint from `compile_jars`.
    pub test_jars: BTreeSet<PathBuf>,
    pub source_jars: BTreeSet<PathBuf>,
    pub doc_jars: BTreeSet<PathBuf>,
}

/// Everything the `.ensime` file records about a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub java_home: PathBuf,
    pub compiler_jars: BTreeSet<PathBuf>,
    /// Jars the ENSIME server itself runs on.
    pub runtime_support_jars: BTreeSet<PathBuf>,
    pub server_version: String,
    pub name: String,
    pub runtime_version: String,
    pub suggested_options: Vec<String>,
    pub modules: BTreeMap<String, ModuleRecord>,
    pub java_flags: Vec<String>,
    pub tool_options: Vec<String>,
    pub extra_source_archives: BTreeSet<PathBuf>,
    pub projects: Vec<ProjectDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_string_form() {
        let id = ProjectId::new("core", Goal::Test);
        assert_eq!(id.to_string(), "EnsimeProjectId(core, test)");
        assert_ne!(id, ProjectId::new("core", Goal::Compile));
    }

    #[test]
    fn dependency_types_map_to_goals() {
        assert_eq!(Goal::for_dependency_type("jar"), Goal::Compile);
        assert_eq!(Goal::for_dependency_type("test-jar"), Goal::Test);
        assert_eq!(Goal::for_dependency_type("bundle"), Goal::Compile);
    }
}
