use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::model::{Goal, ModuleRecord, ProjectDescriptor};
use crate::GenerateError;

/// Folds the descriptors of one module into its [`ModuleRecord`].
///
/// The module name is taken from the first descriptor. Jars that both goals
/// use are reported as compile jars only.
pub fn aggregate(projects: &[ProjectDescriptor]) -> Result<ModuleRecord, GenerateError> {
    let first = projects.first().ok_or(GenerateError::EmptyModule)?;

    let (main, test): (Vec<&ProjectDescriptor>, Vec<&ProjectDescriptor>) =
        projects.iter().partition(|p| p.id.goal == Goal::Compile);

    let compile_jars = union(&main, |p| &p.library_jars);
    let test_jars = union(&test, |p| &p.library_jars)
        .difference(&compile_jars)
        .cloned()
        .collect();

    Ok(ModuleRecord {
        name: first.id.module.clone(),
        main_source_roots: union(&main, |p| &p.sources),
        test_source_roots: union(&test, |p| &p.sources),
        targets: union(&main, |p| &p.targets),
        test_targets: union(&test, |p| &p.targets),
        depends_on_modules: projects
            .iter()
            .flat_map(|p| p.depends_on.iter().map(|id| id.module.clone()))
            .collect(),
        compile_jars,
        runtime_jars: BTreeSet::new(),
        test_jars,
        source_jars: projects
            .iter()
            .flat_map(|p| p.library_sources.iter().cloned())
            .collect(),
        doc_jars: projects
            .iter()
            .flat_map(|p| p.library_docs.iter().cloned())
            .collect(),
    })
}

fn union(
    projects: &[&ProjectDescriptor],
    field: impl Fn(&ProjectDescriptor) -> &BTreeSet<PathBuf>,
) -> BTreeSet<PathBuf> {
    projects
        .iter()
        .flat_map(|p| field(*p).iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectId;

    fn descriptor(module: &str, goal: Goal, jars: &[&str]) -> ProjectDescriptor {
        ProjectDescriptor {
            id: ProjectId::new(module, goal),
            depends_on: vec![ProjectId::new("util", Goal::Compile)],
            sources: BTreeSet::from([PathBuf::from(format!("/{module}/src/{goal}"))]),
            targets: BTreeSet::from([PathBuf::from(format!("/{module}/target/{goal}"))]),
            compiler_options: Vec::new(),
            tool_options: Vec::new(),
            library_jars: jars.iter().map(PathBuf::from).collect(),
            library_sources: BTreeSet::from([PathBuf::from(format!("/{goal}-sources.jar"))]),
            library_docs: BTreeSet::new(),
        }
    }

    #[test]
    fn partitions_by_goal() {
        let record = aggregate(&[
            descriptor("core", Goal::Compile, &["/a.jar", "/b.jar"]),
            descriptor("core", Goal::Test, &["/b.jar", "/c.jar"]),
        ])
        .unwrap();

        assert_eq!(record.name, "core");
        assert_eq!(
            record.compile_jars,
            BTreeSet::from([PathBuf::from("/a.jar"), PathBuf::from("/b.jar")])
        );
        assert_eq!(record.test_jars, BTreeSet::from([PathBuf::from("/c.jar")]));
        assert!(record.compile_jars.is_disjoint(&record.test_jars));
        assert!(record.runtime_jars.is_empty());
        assert_eq!(
            record.main_source_roots,
            BTreeSet::from([PathBuf::from("/core/src/compile")])
        );
        assert_eq!(
            record.test_targets,
            BTreeSet::from([PathBuf::from("/core/target/test")])
        );
        assert_eq!(record.source_jars.len(), 2);
        assert_eq!(record.depends_on_modules, BTreeSet::from(["util".to_string()]));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let projects = [
            descriptor("core", Goal::Compile, &["/a.jar"]),
            descriptor("core", Goal::Test, &["/a.jar", "/t.jar"]),
        ];
        assert_eq!(aggregate(&projects).unwrap(), aggregate(&projects).unwrap());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(aggregate(&[]), Err(GenerateError::EmptyModule)));
    }
}
