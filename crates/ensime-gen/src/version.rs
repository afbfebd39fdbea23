//! Picking the Scala version a build compiles against.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use ensime_project::{Coordinate, Dependency};
use regex::Regex;

pub const SCALA_LIBRARY_GROUP_ID: &str = "org.scala-lang";
pub const SCALA_LIBRARY_ARTIFACT_ID: &str = "scala-library";

/// The chosen version, plus a warning to surface when the choice was a guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChoice {
    pub version: String,
    pub advisory: Option<String>,
}

impl VersionChoice {
    fn certain(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            advisory: None,
        }
    }

    fn guessed(version: String) -> Self {
        let advisory = format!(
            "Multiple scala versions detected, using {version}.  Use -Densime.scala.version to override."
        );
        Self {
            version,
            advisory: Some(advisory),
        }
    }
}

fn release_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("valid regex"))
}

/// `(major, minor, patch)` of a plain `x.y.z` release.
fn release_parts(version: &str) -> Option<(u64, u64, u64)> {
    let caps = release_regex().captures(version)?;
    Some((
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    ))
}

/// Determines the Scala version from the build's dependency declarations.
///
/// An explicit `override_version` wins, then the first `scala-library` in
/// `direct`, then in `managed`, then the versions found in `transitive`. With
/// no signal at all `fallback` is returned.
pub fn resolve_runtime_version(
    direct: &[Dependency],
    managed: &[Dependency],
    transitive: impl IntoIterator<Item = Coordinate>,
    override_version: Option<&str>,
    fallback: &str,
) -> VersionChoice {
    if let Some(version) = override_version.filter(|v| !v.trim().is_empty()) {
        return VersionChoice::certain(version);
    }

    let declared = |deps: &[Dependency]| {
        deps.iter()
            .filter(|d| d.matches(SCALA_LIBRARY_GROUP_ID, SCALA_LIBRARY_ARTIFACT_ID))
            .find_map(|d| d.version.clone())
    };
    if let Some(version) = declared(direct) {
        return VersionChoice::certain(version);
    }
    if let Some(version) = declared(managed) {
        return VersionChoice::certain(version);
    }

    let versions: BTreeSet<String> = transitive
        .into_iter()
        .filter(|c| c.matches(SCALA_LIBRARY_GROUP_ID, SCALA_LIBRARY_ARTIFACT_ID))
        .map(|c| c.version)
        .collect();

    if versions.len() > 1 {
        return VersionChoice::guessed(pick_among(versions));
    }
    match versions.into_iter().next() {
        Some(version) => VersionChoice::certain(version),
        None => VersionChoice::certain(fallback),
    }
}

/// Chooses between two or more distinct versions.
///
/// Within a single `major.minor` line the highest patch wins. Across lines
/// the lowest major then lowest minor wins, highest patch within it.
/// Versions that are not plain `x.y.z` releases lose every comparison.
fn pick_among(versions: BTreeSet<String>) -> String {
    let mut groups: BTreeMap<Option<(u64, u64)>, usize> = BTreeMap::new();
    for version in &versions {
        let line = release_parts(version).map(|(major, minor, _)| (major, minor));
        *groups.entry(line).or_default() += 1;
    }

    let mut sorted: Vec<String> = versions.into_iter().collect();
    if groups.len() == 1 {
        sorted.sort_by(|a, b| patch_key(a).cmp(&patch_key(b)).then_with(|| a.cmp(b)));
    } else {
        sorted.sort_by(|a, b| {
            line_key(a)
                .cmp(&line_key(b))
                .then_with(|| patch_key(a).cmp(&patch_key(b)))
                .then_with(|| a.cmp(b))
        });
    }
    sorted.into_iter().next().unwrap_or_default()
}

/// Highest patch first; non-releases last.
fn patch_key(version: &str) -> Reverse<Option<u64>> {
    Reverse(release_parts(version).map(|(_, _, patch)| patch))
}

/// Lowest line first; non-releases last.
fn line_key(version: &str) -> (u64, u64) {
    release_parts(version).map_or((u64::MAX, u64::MAX), |(major, minor, _)| (major, minor))
}

/// `(major, minor)` of a version such as `2.12.8` or `2.13.0-M5`.
pub fn binary_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = leading_number(parts.next()?)?;
    Some((major, minor))
}

fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}
