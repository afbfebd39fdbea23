use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ensime_config::{init_tracing, GeneratorSettings};
use ensime_gen::server::{run_index, InheritedIoRunner};
use ensime_gen::{generate, write_config, Config};
use ensime_jdk::JavaHome;
use ensime_project::load_build_model;
use ensime_resolve::LocalRepository;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ensime", version, about = "Generate ENSIME project files for Maven builds")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write `.ensime` for the Maven project at PATH
    Generate(GenerateArgs),
    /// Write `.ensime`, then run the ENSIME server once to build its index
    Index(ProjectArgs),
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Do nothing; useful to disable generation from scripts
    #[arg(long)]
    skip: bool,
}

#[derive(Args)]
struct ProjectArgs {
    /// Project root containing `pom.xml` (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Use this Scala version instead of inferring it from dependencies
    #[arg(long)]
    scala_version: Option<String>,
    /// ENSIME server release to reference
    #[arg(long)]
    server_version: Option<String>,
    /// Maven local repository (defaults to `~/.m2/repository`)
    #[arg(long)]
    maven_repo: Option<PathBuf>,
    /// Log level or `tracing` filter directives
    #[arg(long)]
    log_level: Option<String>,
}

impl ProjectArgs {
    /// File settings, then `ENSIME_*` variables, then these flags.
    fn settings(&self) -> Result<GeneratorSettings> {
        let mut settings = GeneratorSettings::load(&self.path)
            .with_context(|| format!("failed to load settings for {}", self.path.display()))?
            .with_process_env();
        if let Some(version) = &self.scala_version {
            settings.scala_version = Some(version.clone());
        }
        if let Some(version) = &self.server_version {
            settings.server_version = version.clone();
        }
        if let Some(repo) = &self.maven_repo {
            settings.maven_repo = Some(repo.clone());
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        Ok(settings)
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Generate(args) => {
            let settings = args.project.settings()?;
            init_tracing(&settings.logging);
            if args.skip || settings.skip {
                tracing::info!("generation skipped");
                return Ok(0);
            }
            let (config, _) = build_config(&args.project, &settings)?;
            let path = write_config(&config)?;
            println!("Wrote {}", path.display());
            Ok(0)
        }
        Command::Index(args) => {
            let settings = args.settings()?;
            init_tracing(&settings.logging);
            let (config, java_home) = build_config(&args, &settings)?;
            let path = write_config(&config)?;
            println!("Wrote {}", path.display());
            run_index(&config, &java_home, &InheritedIoRunner)?;
            Ok(0)
        }
    }
}

fn build_config(args: &ProjectArgs, settings: &GeneratorSettings) -> Result<(Config, JavaHome)> {
    let model = load_build_model(&args.path)?;
    let java_home = JavaHome::discover()?;
    let repository = LocalRepository::discover(settings.maven_repo.as_deref());
    tracing::debug!(
        repository = %repository.root().display(),
        java_home = %java_home.root().display(),
        "generating ENSIME configuration"
    );
    let config = generate(&model, settings, &java_home, Arc::new(repository))?;
    Ok((config, java_home))
}
