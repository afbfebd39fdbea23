use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::pom::{parse_pom, EffectivePom, RawPom};
use crate::{BuildDirs, BuildModel, BuildModule, ProjectError};

pub(crate) fn load_maven_model(root: &Path) -> Result<BuildModel, ProjectError> {
    let root_pom_path = root.join("pom.xml");
    let root_pom = parse_pom(&root_pom_path)?;

    let root_effective = Arc::new(EffectivePom::from_raw(&root_pom, None, Some(root)));
    let mut discovered_modules =
        discover_modules_recursive(root, &root_pom, Arc::clone(&root_effective))?;
    discovered_modules.sort_by(|a, b| a.root.cmp(&b.root));
    discovered_modules.dedup_by(|a, b| a.root == b.root);

    let mut root_module = None;
    let mut modules = Vec::new();
    for module in &discovered_modules {
        let build_module = to_build_module(module);
        if module.root == root {
            root_module = Some(build_module.clone());
        }
        if build_module.is_aggregator() {
            tracing::debug!(
                target = "ensime.project",
                module = %build_module.artifact_id,
                "skipping aggregator module"
            );
            continue;
        }
        modules.push(build_module);
    }

    let root = match root_module {
        Some(root) => root,
        None => to_build_module(&DiscoveredModule {
            root: root.to_path_buf(),
            raw_pom: root_pom,
            effective: root_effective,
        }),
    };

    tracing::debug!(
        target = "ensime.project",
        root = %root.basedir.display(),
        modules = modules.len(),
        "loaded maven reactor"
    );

    Ok(BuildModel { root, modules })
}

fn to_build_module(module: &DiscoveredModule) -> BuildModule {
    let effective = module.effective.as_ref();
    let basedir = &module.root;
    let raw_build = &module.raw_pom.build;

    let artifact_id = effective.artifact_id.clone().unwrap_or_else(|| {
        basedir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "root".to_string())
    });

    let build = BuildDirs {
        source_directory: effective.build_path(
            basedir,
            raw_build.source_directory.as_deref(),
            "src/main/java",
        ),
        output_directory: effective.build_path(
            basedir,
            raw_build.output_directory.as_deref(),
            "target/classes",
        ),
        test_output_directory: effective.build_path(
            basedir,
            raw_build.test_output_directory.as_deref(),
            "target/test-classes",
        ),
    };

    BuildModule {
        group_id: effective.group_id.clone().unwrap_or_default(),
        artifact_id,
        version: effective.version.clone(),
        packaging: effective.packaging.clone(),
        name: effective.name.clone(),
        basedir: basedir.clone(),
        dependencies: effective
            .dependencies
            .iter()
            .filter(|d| !d.group_id.is_empty() && !d.artifact_id.is_empty())
            .cloned()
            .collect(),
        dependency_management: effective.dependency_management.values().cloned().collect(),
        plugins: effective.plugins.clone(),
        build,
    }
}

#[derive(Debug, Clone)]
struct DiscoveredModule {
    root: PathBuf,
    raw_pom: RawPom,
    effective: Arc<EffectivePom>,
}

fn discover_modules_recursive(
    workspace_root: &Path,
    root_pom: &RawPom,
    root_effective: Arc<EffectivePom>,
) -> Result<Vec<DiscoveredModule>, ProjectError> {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    // `workspace_root` is canonicalized by `load_build_model`.
    visited.insert(workspace_root.to_path_buf());

    let mut out = vec![DiscoveredModule {
        root: workspace_root.to_path_buf(),
        raw_pom: root_pom.clone(),
        effective: Arc::clone(&root_effective),
    }];
    let mut queue: VecDeque<(PathBuf, Arc<EffectivePom>)> = VecDeque::new();

    let mut root_modules = root_pom.modules.clone();
    root_modules.sort();
    for module in root_modules {
        queue.push_back((workspace_root.join(module), Arc::clone(&root_effective)));
    }

    while let Some((module_root, parent_effective)) = queue.pop_front() {
        let module_root = canonicalize_or_fallback(&module_root);
        if !visited.insert(module_root.clone()) {
            continue;
        }

        let module_pom_path = module_root.join("pom.xml");
        if !module_pom_path.is_file() {
            tracing::warn!(
                target = "ensime.project",
                module = %module_root.display(),
                "declared module has no pom.xml; skipping"
            );
            continue;
        }
        let raw_pom = parse_pom(&module_pom_path)?;

        let effective = Arc::new(EffectivePom::from_raw(
            &raw_pom,
            Some(parent_effective.as_ref()),
            Some(&module_root),
        ));

        let mut child_modules = raw_pom.modules.clone();
        child_modules.sort();
        for child in child_modules {
            queue.push_back((module_root.join(child), Arc::clone(&effective)));
        }

        out.push(DiscoveredModule {
            root: module_root,
            raw_pom,
            effective,
        });
    }

    Ok(out)
}

fn canonicalize_or_fallback(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
