use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use ensime_jdk::JavaHome;

use crate::model::Config;
use crate::sexp::order_files;
use crate::{GenerateError, Result};

pub const SERVER_MAIN_CLASS: &str = "org.ensime.server.Server";

/// JVM flags for a one-shot indexing run, ahead of the configured java flags.
const INDEX_JVM_FLAGS: &[&str] = &[
    "-Xms4g",
    "-Xmx4g",
    "-XX:StringTableSize=1000003",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:SymbolTableSize=1000003",
    "-Densime.config=.ensime",
    "-Densime.exitAfterIndex=true",
];

pub trait CommandRunner: Send + Sync + std::fmt::Debug {
    /// Runs `program` to completion with the caller's stdio.
    fn run(&self, cwd: &Path, program: &Path, args: &[String]) -> io::Result<ExitStatus>;
}

/// Runs commands with stdin, stdout and stderr inherited from this process.
#[derive(Debug, Clone, Default)]
pub struct InheritedIoRunner;

impl CommandRunner for InheritedIoRunner {
    fn run(&self, cwd: &Path, program: &Path, args: &[String]) -> io::Result<ExitStatus> {
        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| {
                let command = format_command(program, args);
                io::Error::new(err.kind(), format!("failed to spawn `{command}`: {err}"))
            })?;
        child.wait()
    }
}

/// The java invocation that indexes a project and exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCommand {
    pub cwd: PathBuf,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl IndexCommand {
    pub fn for_config(config: &Config, java_home: &JavaHome) -> Self {
        let tools_jar = java_home.tools_jar();
        let classpath_entries: Vec<PathBuf> = config
            .runtime_support_jars
            .iter()
            .chain(&config.compiler_jars)
            .cloned()
            .chain(std::iter::once(tools_jar))
            .collect();
        let classpath = order_files(&classpath_entries)
            .into_iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(classpath_separator());

        let mut args: Vec<String> = INDEX_JVM_FLAGS.iter().map(|f| f.to_string()).collect();
        args.extend(config.java_flags.iter().cloned());
        args.push("-cp".to_string());
        args.push(classpath);
        args.push(SERVER_MAIN_CLASS.to_string());

        Self {
            cwd: config.root_dir.clone(),
            program: java_home.java_binary(),
            args,
        }
    }

    pub fn display(&self) -> String {
        format_command(&self.program, &self.args)
    }
}

fn classpath_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

pub(crate) fn format_command(program: &Path, args: &[String]) -> String {
    let mut out = program.to_string_lossy().to_string();
    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

/// Creates the cache directory and runs the server over the project until it
/// has finished indexing.
pub fn run_index(config: &Config, java_home: &JavaHome, runner: &dyn CommandRunner) -> Result<()> {
    std::fs::create_dir_all(&config.cache_dir).map_err(|source| GenerateError::CacheDir {
        path: config.cache_dir.clone(),
        source,
    })?;

    let command = IndexCommand::for_config(config, java_home);
    tracing::info!(
        target = "ensime.server",
        cwd = %command.cwd.display(),
        command = %command.display(),
        "starting ENSIME server for indexing"
    );

    let status = runner
        .run(&command.cwd, &command.program, &command.args)
        .map_err(|source| GenerateError::Launch {
            command: command.display(),
            source,
        })?;
    if !status.success() {
        return Err(GenerateError::ServerExit { status });
    }

    tracing::info!(target = "ensime.server", "indexing finished");
    Ok(())
}
