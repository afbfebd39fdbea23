use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaHome {
    root: PathBuf,
}

impl JavaHome {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `lib/tools.jar`. The server classpath always lists it, even on JDKs
    /// that no longer ship one.
    pub fn tools_jar(&self) -> PathBuf {
        self.root.join("lib").join("tools.jar")
    }

    pub fn java_binary(&self) -> PathBuf {
        let exe_name = if cfg!(windows) { "java.exe" } else { "java" };
        self.root.join("bin").join(exe_name)
    }

    /// The JDK's bundled sources, when installed.
    pub fn source_archive(&self) -> Option<PathBuf> {
        [self.root.join("src.zip"), self.root.join("lib").join("src.zip")]
            .into_iter()
            .find(|p| p.is_file())
    }

    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, JdkDiscoveryError> {
        let root = root.as_ref().to_path_buf();
        if !is_jdk_root(&root) {
            return Err(JdkDiscoveryError::NotAJdk { root });
        }
        Ok(Self { root })
    }

    /// Discover a JDK installation from the current process environment.
    ///
    /// Candidates are tried in this order:
    /// 1. `JDK_HOME`, then `JAVA_HOME`
    /// 2. `/usr/libexec/java_home` (macOS only)
    /// 3. `java` on `PATH`: the parent of its `java.home`, then `java.home` itself,
    ///    then the installation its resolved binary lives in
    pub fn discover() -> Result<Self, JdkDiscoveryError> {
        Self::discover_in(&DiscoveryEnv::from_process())
    }

    pub fn discover_in(env: &DiscoveryEnv) -> Result<Self, JdkDiscoveryError> {
        let mut tried = Vec::new();
        for candidate in env.candidates() {
            if is_jdk_root(&candidate) {
                tracing::debug!(
                    target = "ensime.jdk",
                    root = %candidate.display(),
                    "discovered JDK"
                );
                return Ok(Self { root: candidate });
            }
            tried.push(candidate);
        }
        Err(JdkDiscoveryError::NotFound { tried })
    }
}

#[derive(Debug, Error)]
pub enum JdkDiscoveryError {
    #[error(
        "Could not automatically find the JDK/lib/tools.jar.\nYou must explicitly set JDK_HOME or JAVA_HOME."
    )]
    NotFound { tried: Vec<PathBuf> },

    #[error("`{root}` is not a JDK installation (no lib/tools.jar or jmods/)")]
    NotAJdk { root: PathBuf },
}

/// Inputs to JDK discovery. [`DiscoveryEnv::from_process`] reads the real
/// environment; tests build one by hand with `probe_commands` off.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryEnv {
    pub jdk_home: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
    /// Whether to run platform discovery commands and `java` on `PATH`.
    pub probe_commands: bool,
}

impl DiscoveryEnv {
    pub fn from_process() -> Self {
        Self {
            jdk_home: non_empty_env("JDK_HOME"),
            java_home: non_empty_env("JAVA_HOME"),
            probe_commands: true,
        }
    }

    fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        let probe = self.probe_commands;
        self.jdk_home
            .clone()
            .into_iter()
            .chain(self.java_home.clone())
            .chain(
                std::iter::once_with(move || probe.then(discover_from_macos_helper).flatten())
                    .flatten(),
            )
            .chain(
                std::iter::once_with(move || probe.then(discover_from_java_command).flatten())
                    .flatten()
                    .flat_map(|java_home| {
                        let parent = java_home.parent().map(Path::to_path_buf);
                        parent.into_iter().chain(std::iter::once(java_home))
                    }),
            )
            .chain(
                std::iter::once_with(move || probe.then(discover_from_java_symlink).flatten())
                    .flatten(),
            )
    }
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn is_jdk_root(candidate: &Path) -> bool {
    candidate.join("lib").join("tools.jar").is_file() || candidate.join("jmods").is_dir()
}

fn discover_from_macos_helper() -> Option<PathBuf> {
    if !cfg!(target_os = "macos") {
        return None;
    }
    let output = Command::new("/usr/libexec/java_home").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let line = text.lines().next()?.trim();
    (!line.is_empty()).then(|| PathBuf::from(line))
}

fn discover_from_java_command() -> Option<PathBuf> {
    let output = Command::new("java")
        .args(["-XshowSettings:properties", "-version"])
        .output()
        .ok()?;

    // HotSpot prints settings to stderr, but we accept both.
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    combined.lines().find_map(|line| {
        let (k, v) = line.trim().split_once('=')?;
        (k.trim() == "java.home").then(|| PathBuf::from(v.trim()))
    })
}

fn discover_from_java_symlink() -> Option<PathBuf> {
    let java_bin = find_java_on_path()?;
    let java_bin = java_bin.canonicalize().ok()?;
    Some(java_bin.parent()?.parent()?.to_path_buf())
}

fn find_java_on_path() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let exe_name = if cfg!(windows) { "java.exe" } else { "java" };

    std::env::split_paths(&path_var)
        .map(|dir| dir.join(exe_name))
        .find(|candidate| candidate.is_file())
}
