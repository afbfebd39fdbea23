//! Compiler options suggested to the presentation compiler.

use crate::version::binary_version;

const BASELINE: &[&str] = &[
    "-feature",
    "-deprecation",
    "-Xlint",
    "-Ywarn-dead-code",
    "-Ywarn-numeric-widen",
    "-Xfuture",
];

/// Extra flags per Scala line: `(major, minimum minor, maximum minor, flags)`.
const BY_BINARY_VERSION: &[(u32, u32, u32, &[&str])] = &[
    (2, 10, 10, &["-Ymacro-no-expand"]),
    (
        2,
        11,
        u32::MAX,
        &["-Ywarn-unused-import", "-Ymacro-expand:discard"],
    ),
];

/// Baseline scalac options for `runtime_version`.
pub fn suggested_options(runtime_version: &str) -> Vec<String> {
    let extra = binary_version(runtime_version)
        .and_then(|(major, minor)| {
            BY_BINARY_VERSION
                .iter()
                .find(|(m, lo, hi, _)| *m == major && (*lo..=*hi).contains(&minor))
        })
        .map(|(_, _, _, flags)| *flags)
        .unwrap_or_default();

    BASELINE
        .iter()
        .chain(extra)
        .map(|flag| flag.to_string())
        .collect()
}

/// `declared` followed by `suggested`, keeping the first occurrence of each flag.
/// Without declared options the suggestions are used as is.
pub fn scalac_options(declared: Option<&[String]>, suggested: &[String]) -> Vec<String> {
    let Some(declared) = declared else {
        return suggested.to_vec();
    };
    let mut out: Vec<String> = Vec::with_capacity(declared.len() + suggested.len());
    for flag in declared.iter().chain(suggested) {
        if !out.contains(flag) {
            out.push(flag.clone());
        }
    }
    out
}

/// javac options: `<compilerArgs>` then the Scala plugin's `<jvmArgs>`.
pub fn javac_options(compiler_args: Option<&[String]>, jvm_args: Option<&[String]>) -> Vec<String> {
    compiler_args
        .unwrap_or_default()
        .iter()
        .chain(jvm_args.unwrap_or_default())
        .cloned()
        .collect()
}
