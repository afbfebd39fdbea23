//! Rendering a [`Config`] as the S-expression `.ensime` file.
//!
//! Output is byte-stable: every collection is emitted in a fixed order, so the
//! same config always renders to the same text.

use std::path::{Path, PathBuf};

use crate::model::{Config, ModuleRecord, ProjectDescriptor, ProjectId};

/// Renders `config`, normalized to `\n` line endings with one trailing newline.
pub fn render(config: &Config) -> String {
    let mut text = config_to_sexp(config).replace("\r\n", "\n");
    text.push('\n');
    text
}

/// Distinct paths sorted by file name then full path, with any whose file name
/// mentions `monkey` moved to the front.
///
/// Monkey-patch jars must precede the jars they patch on a classpath.
pub fn order_files<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Vec<&'a Path> {
    let mut sorted: Vec<(String, &Path)> = paths
        .into_iter()
        .map(|path| {
            let key = format!("{}{}", file_name(path), path.to_string_lossy());
            (key, path.as_path())
        })
        .collect();
    sorted.sort();
    sorted.dedup_by(|a, b| a.1 == b.1);

    let (monkeys, humans): (Vec<&Path>, Vec<&Path>) = sorted
        .into_iter()
        .map(|(_, path)| path)
        .partition(|path| file_name(path).contains("monkey"));
    monkeys.into_iter().chain(humans).collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// A parenthesized, space separated list, or `nil` when empty.
fn list(items: impl IntoIterator<Item = String>) -> String {
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        "nil".to_string()
    } else {
        format!("({})", items.join(" "))
    }
}

fn paths<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> String {
    list(order_files(paths).into_iter().map(quote_path))
}

fn strings<'a>(strings: impl IntoIterator<Item = &'a String>) -> String {
    list(strings.into_iter().map(|s| quote(s)))
}

/// `(:key value\n:key value ...)`.
fn record(fields: &[(&str, String)]) -> String {
    let body: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!(":{key} {value}"))
        .collect();
    format!("({})", body.join("\n"))
}

fn config_to_sexp(config: &Config) -> String {
    let modules = list(config.modules.values().map(module_to_sexp));

    let mut projects: Vec<&ProjectDescriptor> = config.projects.iter().collect();
    projects.sort_by_key(|p| p.id.sort_key());
    let projects = list(projects.into_iter().map(project_to_sexp));

    record(&[
        ("root-dir", quote_path(&config.root_dir)),
        ("cache-dir", quote_path(&config.cache_dir)),
        ("scala-compiler-jars", paths(&config.compiler_jars)),
        ("ensime-server-jars", paths(&config.runtime_support_jars)),
        // ENSIME 2.x `.ensime` key; clients choose the server release from it.
        ("ensime-server-version", quote(&config.server_version)),
        ("name", quote(&config.name)),
        ("java-home", quote_path(&config.java_home)),
        ("java-flags", strings(&config.java_flags)),
        ("java-sources", paths(&config.extra_source_archives)),
        ("java-compiler-args", strings(&config.tool_options)),
        ("reference-source-roots", paths(&config.extra_source_archives)),
        ("scala-version", quote(&config.runtime_version)),
        ("compiler-args", strings(&config.suggested_options)),
        ("subprojects", modules),
        ("projects", projects),
    ])
}

fn module_to_sexp(module: &ModuleRecord) -> String {
    record(&[
        ("name", quote(&module.name)),
        (
            "source-roots",
            paths(module.main_source_roots.iter().chain(&module.test_source_roots)),
        ),
        ("targets", paths(&module.targets)),
        ("test-targets", paths(&module.test_targets)),
        ("depends-on-modules", strings(&module.depends_on_modules)),
        ("compile-deps", paths(&module.compile_jars)),
        ("runtime-deps", paths(&module.runtime_jars)),
        ("test-deps", paths(&module.test_jars)),
        ("doc-jars", paths(&module.doc_jars)),
        ("reference-source-roots", paths(&module.source_jars)),
    ])
}

fn project_to_sexp(project: &ProjectDescriptor) -> String {
    let mut depends: Vec<&ProjectId> = project.depends_on.iter().collect();
    depends.sort_by_key(|id| id.sort_key());

    record(&[
        ("id", project_id_to_sexp(&project.id)),
        ("depends", list(depends.into_iter().map(project_id_to_sexp))),
        ("sources", paths(&project.sources)),
        ("targets", paths(&project.targets)),
        ("scalac-options", strings(&project.compiler_options)),
        ("javac-options", strings(&project.tool_options)),
        ("library-jars", paths(&project.library_jars)),
        ("library-sources", paths(&project.library_sources)),
        ("library-docs", paths(&project.library_docs)),
    ])
}

fn project_id_to_sexp(id: &ProjectId) -> String {
    format!(
        "(:project {} :config {})",
        quote(&id.module),
        quote(id.goal.as_str())
    )
}
