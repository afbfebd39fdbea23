//! `pom.xml` parsing and single-level inheritance.
//!
//! [`RawPom`] is what a file literally says. [`EffectivePom`] folds a parent's
//! effective view into it: coordinates, properties, managed dependencies and
//! plugin configuration, with `${property}` placeholders resolved.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{
    CompilerPluginConfig, Dependency, PluginConfigs, ScalaPluginConfig,
    COMPILER_MAVEN_PLUGIN, DEFAULT_PLUGIN_GROUP_ID, SCALA_MAVEN_PLUGIN,
};
use crate::ProjectError;

#[derive(Debug, Default, Clone)]
pub struct RawPom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Dependency>,
    pub dependency_management: Vec<Dependency>,
    pub modules: Vec<String>,
    pub parent: Option<PomParent>,
    pub build: RawBuild,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomParent {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

/// The parts of `<build>` the generator reads.
#[derive(Debug, Default, Clone)]
pub struct RawBuild {
    pub source_directory: Option<String>,
    pub output_directory: Option<String>,
    pub test_output_directory: Option<String>,
    pub plugins: PluginConfigs,
    pub plugin_management: PluginConfigs,
}

#[derive(Debug, Clone)]
pub struct EffectivePom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: String,
    pub name: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub dependency_management: BTreeMap<(String, String), Dependency>,
    pub dependencies: Vec<Dependency>,
    pub plugins: PluginConfigs,
    pub plugin_management: PluginConfigs,
}

impl EffectivePom {
    /// Folds `parent` into `raw`. `basedir` seeds the `basedir` properties for
    /// workspace POMs; repository POMs pass `None`.
    pub fn from_raw(raw: &RawPom, parent: Option<&EffectivePom>, basedir: Option<&Path>) -> Self {
        let group_id = raw
            .group_id
            .clone()
            .or_else(|| raw.parent.as_ref().and_then(|p| p.group_id.clone()))
            .or_else(|| parent.and_then(|p| p.group_id.clone()));
        let artifact_id = raw.artifact_id.clone();
        let version = raw
            .version
            .clone()
            .or_else(|| raw.parent.as_ref().and_then(|p| p.version.clone()))
            .or_else(|| parent.and_then(|p| p.version.clone()));

        let mut properties = parent.map(|p| p.properties.clone()).unwrap_or_default();
        properties.extend(raw.properties.clone());

        if let Some(v) = group_id.as_ref() {
            properties.insert("project.groupId".to_string(), v.clone());
            properties.insert("pom.groupId".to_string(), v.clone());
        }
        if let Some(v) = artifact_id.as_ref() {
            properties.insert("project.artifactId".to_string(), v.clone());
            properties.insert("pom.artifactId".to_string(), v.clone());
        }
        if let Some(v) = version.as_ref() {
            properties.insert("project.version".to_string(), v.clone());
            properties.insert("pom.version".to_string(), v.clone());
        }
        if let Some(basedir) = basedir {
            let basedir_text = basedir.to_string_lossy().to_string();
            properties.insert(
                "project.build.directory".to_string(),
                basedir.join("target").to_string_lossy().to_string(),
            );
            properties.insert("basedir".to_string(), basedir_text.clone());
            properties.insert("project.basedir".to_string(), basedir_text);
        }

        let interpolate = |text: &str| resolve_placeholders(text, &properties);

        let mut dependency_management = parent
            .map(|p| p.dependency_management.clone())
            .unwrap_or_default();
        for dep in &raw.dependency_management {
            let dep = interpolate_dependency(dep, &interpolate);
            dependency_management.insert((dep.group_id.clone(), dep.artifact_id.clone()), dep);
        }

        // Inherited dependencies come first; a redeclaration in the child replaces them.
        let mut dependencies: Vec<Dependency> =
            parent.map(|p| p.dependencies.clone()).unwrap_or_default();
        for dep in &raw.dependencies {
            let mut dep = interpolate_dependency(dep, &interpolate);
            if let Some(managed) =
                dependency_management.get(&(dep.group_id.clone(), dep.artifact_id.clone()))
            {
                if dep.version.is_none() {
                    dep.version = managed.version.clone();
                }
                if dep.scope.is_none() {
                    dep.scope = managed.scope.clone();
                }
            }
            match dependencies.iter_mut().find(|existing| same_dependency(existing, &dep)) {
                Some(existing) => *existing = dep,
                None => dependencies.push(dep),
            }
        }

        let empty = PluginConfigs::default();
        let plugin_management = interpolate_plugins(raw.build.plugin_management.clone(), &interpolate)
            .merged_over(parent.map(|p| &p.plugin_management).unwrap_or(&empty));
        let plugins = interpolate_plugins(raw.build.plugins.clone(), &interpolate)
            .merged_over(parent.map(|p| &p.plugins).unwrap_or(&empty))
            .merged_over(&plugin_management);

        Self {
            group_id,
            artifact_id,
            version,
            packaging: raw.packaging.clone().unwrap_or_else(|| "jar".to_string()),
            name: raw.name.as_deref().map(&interpolate),
            properties: properties.clone(),
            dependency_management,
            dependencies,
            plugins,
            plugin_management,
        }
    }

    /// Interpolates a raw `<build>` path and anchors it at `basedir`.
    pub fn build_path(&self, basedir: &Path, raw: Option<&str>, default: &str) -> PathBuf {
        match raw {
            Some(raw) => {
                let resolved = PathBuf::from(resolve_placeholders(raw, &self.properties));
                if resolved.is_absolute() {
                    resolved
                } else {
                    basedir.join(resolved)
                }
            }
            None => basedir.join(default),
        }
    }
}

fn interpolate_dependency(dep: &Dependency, f: &impl Fn(&str) -> String) -> Dependency {
    Dependency {
        group_id: f(&dep.group_id),
        artifact_id: f(&dep.artifact_id),
        version: dep.version.as_deref().map(f),
        scope: dep.scope.clone(),
        classifier: dep.classifier.as_deref().map(f),
        type_: dep.type_.clone(),
        optional: dep.optional,
    }
}

/// Maven's dependency key: `groupId:artifactId:type:classifier`.
fn same_dependency(a: &Dependency, b: &Dependency) -> bool {
    a.group_id == b.group_id
        && a.artifact_id == b.artifact_id
        && a.type_() == b.type_()
        && a.classifier == b.classifier
}

fn interpolate_plugins(plugins: PluginConfigs, f: &impl Fn(&str) -> String) -> PluginConfigs {
    PluginConfigs {
        scala: plugins.scala.map(|s| s.map_values(f)),
        compiler: plugins.compiler.map(|c| c.map_values(f)),
    }
}

pub fn parse_pom(path: &Path) -> Result<RawPom, ProjectError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pom_str(&contents, path)
}

/// Parses POM text; `path` is only used for error context.
pub fn parse_pom_str(contents: &str, path: &Path) -> Result<RawPom, ProjectError> {
    let doc = roxmltree::Document::parse(contents).map_err(|source| ProjectError::Xml {
        path: path.to_path_buf(),
        source,
    })?;

    let project = doc.root_element();

    let mut pom = RawPom {
        group_id: child_text(&project, "groupId"),
        artifact_id: child_text(&project, "artifactId"),
        version: child_text(&project, "version"),
        packaging: child_text(&project, "packaging"),
        name: child_text(&project, "name"),
        ..RawPom::default()
    };

    if let Some(parent_node) = child_element(&project, "parent") {
        pom.parent = Some(PomParent {
            group_id: child_text(&parent_node, "groupId"),
            artifact_id: child_text(&parent_node, "artifactId"),
            version: child_text(&parent_node, "version"),
        });
    }

    if let Some(props_node) = child_element(&project, "properties") {
        for child in props_node.children().filter(|n| n.is_element()) {
            let key = child.tag_name().name().to_string();
            if let Some(value) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
                pom.properties.insert(key, value.to_string());
            }
        }
    }

    if let Some(deps_node) = child_element(&project, "dependencies") {
        pom.dependencies = parse_dependencies(&deps_node);
    }

    if let Some(dep_mgmt) = child_element(&project, "dependencyManagement") {
        if let Some(deps_node) = child_element(&dep_mgmt, "dependencies") {
            pom.dependency_management = parse_dependencies(&deps_node);
        }
    }

    if let Some(modules_node) = child_element(&project, "modules") {
        pom.modules = child_values(&modules_node);
    }

    if let Some(build_node) = child_element(&project, "build") {
        pom.build = parse_build(&build_node);
    }

    Ok(pom)
}

fn parse_build(build_node: &roxmltree::Node<'_, '_>) -> RawBuild {
    let mut build = RawBuild {
        source_directory: child_text(build_node, "sourceDirectory"),
        output_directory: child_text(build_node, "outputDirectory"),
        test_output_directory: child_text(build_node, "testOutputDirectory"),
        ..RawBuild::default()
    };

    if let Some(plugins_node) = child_element(build_node, "plugins") {
        build.plugins = parse_plugins(&plugins_node);
    }
    if let Some(mgmt) = child_element(build_node, "pluginManagement") {
        if let Some(plugins_node) = child_element(&mgmt, "plugins") {
            build.plugin_management = parse_plugins(&plugins_node);
        }
    }

    build
}

fn parse_plugins(plugins_node: &roxmltree::Node<'_, '_>) -> PluginConfigs {
    let mut out = PluginConfigs::default();
    for plugin in plugins_node
        .children()
        .filter(|n| n.is_element() && n.has_tag_name("plugin"))
    {
        let Some(artifact_id) = child_text(&plugin, "artifactId") else {
            continue;
        };
        let group_id =
            child_text(&plugin, "groupId").unwrap_or_else(|| DEFAULT_PLUGIN_GROUP_ID.to_string());
        let key = format!("{group_id}:{artifact_id}");
        let config = child_element(&plugin, "configuration");

        match key.as_str() {
            SCALA_MAVEN_PLUGIN => {
                out.scala = Some(
                    config
                        .map(|c| ScalaPluginConfig {
                            scala_organization: child_text(&c, "scalaOrganization"),
                            args: child_element(&c, "args").map(|n| child_values(&n)),
                            jvm_args: child_element(&c, "jvmArgs").map(|n| child_values(&n)),
                            sources: child_element(&c, "sources").map(|n| child_values(&n)),
                        })
                        .unwrap_or_default(),
                );
            }
            COMPILER_MAVEN_PLUGIN => {
                out.compiler = Some(
                    config
                        .map(|c| CompilerPluginConfig {
                            compiler_args: child_element(&c, "compilerArgs")
                                .map(|n| child_values(&n)),
                        })
                        .unwrap_or_default(),
                );
            }
            _ => {}
        }
    }
    out
}

fn parse_dependencies(deps_node: &roxmltree::Node<'_, '_>) -> Vec<Dependency> {
    deps_node
        .children()
        .filter(|n| n.is_element() && n.has_tag_name("dependency"))
        .filter_map(|dep_node| {
            let group_id = child_text(&dep_node, "groupId")?;
            let artifact_id = child_text(&dep_node, "artifactId")?;
            let version = child_text(&dep_node, "version");
            let scope = child_text(&dep_node, "scope");
            let classifier = child_text(&dep_node, "classifier");
            let type_ = child_text(&dep_node, "type");
            let optional = child_text(&dep_node, "optional").as_deref() == Some("true");

            Some(Dependency {
                group_id,
                artifact_id,
                version,
                scope,
                classifier,
                type_,
                optional,
            })
        })
        .collect()
}

/// Trimmed, non-empty text of every element child, in document order.
fn child_values(node: &roxmltree::Node<'_, '_>) -> Vec<String> {
    node.children()
        .filter(|n| n.is_element())
        .filter_map(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn child_element<'a>(
    node: &'a roxmltree::Node<'a, 'a>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub fn resolve_placeholders(text: &str, props: &BTreeMap<String, String>) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

    re.replace_all(text, |caps: &regex::Captures<'_>| {
        let key = &caps[1];
        props
            .get(key)
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}
