mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use logging::{LogFormat, LoggingConfig};
use migrun_core::{Announcer, CompositeAnnouncer, RunnerContext, TextWriterAnnouncer};
use migrun_engine::{ProcessorFactoryRegistry, TaskExecutor};
use std::fs::File;
use std::io::{BufWriter, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "migrun")]
#[command(about = "Run versioned database migrations")]
struct Cli {
    /// Database type (postgres, sqlite)
    #[arg(long = "db", visible_alias = "database")]
    database: Option<String>,

    /// Connection string, or the name of an entry in <target>.config
    #[arg(short = 'c', long)]
    connection: Option<String>,

    /// Precompiled migration module
    #[arg(short = 'a', long)]
    target: Option<String>,

    /// Only run migrations of this namespace
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// migrate, migrate:up, migrate:down, rollback, rollback:toversion or rollback:all
    #[arg(short = 't', long)]
    task: Option<String>,

    /// Target version
    #[arg(long = "to", visible_alias = "version", default_value_t = 0, allow_negative_numbers = true)]
    version: i64,

    /// Number of migrations to roll back
    #[arg(long, default_value_t = 0)]
    steps: u32,

    /// Base directory for the target, its config file and the migration directory
    #[arg(long = "working-directory", visible_alias = "wd")]
    working_directory: Option<PathBuf>,

    /// Profile to run after migrating up
    #[arg(long)]
    profile: Option<String>,

    /// Statement timeout in seconds (0 uses the default of 30)
    #[arg(long, default_value_t = 0)]
    timeout: u32,

    /// Announce statements without executing them
    #[arg(short = 'p', long)]
    preview: bool,

    /// Also write every announcement to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Compile the .sql migrations in this directory instead of loading a module
    #[arg(short = 'm', long = "migration-directory")]
    migration_directory: Option<PathBuf>,

    /// Treat an unknown task as a no-op
    #[arg(long)]
    allow_unknown_task: bool,

    /// Show SQL, timings and debug logs
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Cli {
    fn context(&self) -> RunnerContext {
        RunnerContext {
            database: self.database.clone(),
            connection: self.connection.clone(),
            target: self.target.clone(),
            namespace: self.namespace.clone(),
            task: self.task.clone(),
            version: self.version,
            steps: self.steps,
            working_directory: self.working_directory.clone(),
            profile: self.profile.clone(),
            timeout: self.timeout,
            preview_only: self.preview,
            output: self.output.clone(),
            migration_directory: self.migration_directory.clone(),
            allow_unknown_task: self.allow_unknown_task,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&LoggingConfig::for_cli(cli.verbose, cli.log_format)) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Console sink plus the optional `--output` file sink
struct Sinks {
    console: Arc<TextWriterAnnouncer<Stdout>>,
    file: Option<Arc<TextWriterAnnouncer<BufWriter<File>>>>,
}

impl Sinks {
    fn open(cli: &Cli, context: &RunnerContext) -> Result<Self> {
        let console = Arc::new(
            TextWriterAnnouncer::stdout()
                .with_show_sql(cli.verbose)
                .with_show_elapsed_time(cli.verbose),
        );

        let file = match &context.output {
            Some(path) => {
                let output = TextWriterAnnouncer::create_file(&context.base_directory().join(path))
                    .with_context(|| format!("Failed to create output file {}", path.display()))?;
                Some(Arc::new(output.with_show_sql(true).with_show_elapsed_time(true)))
            }
            None => None,
        };

        Ok(Self { console, file })
    }

    fn announcer(&self) -> Arc<dyn Announcer> {
        match &self.file {
            Some(file) => Arc::new(
                CompositeAnnouncer::new()
                    .add_sink(self.console.clone())
                    .add_sink(file.clone()),
            ),
            None => self.console.clone(),
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Err(e) = file.flush() {
                tracing::warn!(error = %e, "Failed to flush output file");
            }
        }
        if let Err(e) = self.console.flush() {
            tracing::warn!(error = %e, "Failed to flush console output");
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    run_with(cli, ProcessorFactoryRegistry::with_default_factories()).await
}

/// Run the task; every sink is flushed whether or not it succeeded
async fn run_with(cli: &Cli, registry: ProcessorFactoryRegistry) -> Result<()> {
    let context = cli.context();
    let sinks = Sinks::open(cli, &context)?;

    let outcome = TaskExecutor::new(context, registry, sinks.announcer())
        .execute()
        .await;
    sinks.flush();

    let result = outcome?;
    tracing::info!(
        applied = result.applied.len(),
        reverted = result.reverted.len(),
        profiles = result.profiles_run,
        "Task finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flags_map_to_context() {
        let cli = Cli::try_parse_from([
            "migrun",
            "--db",
            "sqlite",
            "-c",
            "sqlite::memory:",
            "-a",
            "app.migrations",
            "-t",
            "rollback",
            "--steps",
            "3",
            "--timeout",
            "120",
            "-p",
            "--wd",
            "/srv/app",
        ])
        .unwrap();

        let ctx = cli.context();
        assert_eq!(ctx.database.as_deref(), Some("sqlite"));
        assert_eq!(ctx.connection.as_deref(), Some("sqlite::memory:"));
        assert_eq!(ctx.target.as_deref(), Some("app.migrations"));
        assert_eq!(ctx.task.as_deref(), Some("rollback"));
        assert_eq!(ctx.steps, 3);
        assert_eq!(ctx.timeout, 120);
        assert!(ctx.preview_only);
        assert_eq!(ctx.working_directory, Some(PathBuf::from("/srv/app")));
    }

    #[test]
    fn test_version_aliases() {
        let cli = Cli::try_parse_from(["migrun", "--version", "5"]).unwrap();
        assert_eq!(cli.context().version, 5);

        let cli = Cli::try_parse_from(["migrun", "--to", "7", "--database", "postgres"]).unwrap();
        assert_eq!(cli.context().version, 7);
        assert_eq!(cli.context().database.as_deref(), Some("postgres"));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["migrun", "-m", "migrations"]).unwrap();
        let ctx = cli.context();
        assert_eq!(ctx.version, 0);
        assert_eq!(ctx.timeout, 0);
        assert!(!ctx.allow_unknown_task);
        assert_eq!(ctx.migration_directory, Some(PathBuf::from("migrations")));
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn test_failed_run_still_writes_output_file() {
        let temp_dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "migrun",
            "--db",
            "sqlite",
            "-c",
            "sqlite::memory:",
            "-a",
            "missing.migrations",
            "--wd",
            temp_dir.path().to_str().unwrap(),
            "-o",
            "out.log",
        ])
        .unwrap();

        let err = run_with(&cli, ProcessorFactoryRegistry::with_default_factories())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("missing.migrations"));

        let written = std::fs::read_to_string(temp_dir.path().join("out.log")).unwrap();
        assert!(written.contains("Using database sqlite and connection string sqlite::memory:"));
    }

    #[tokio::test]
    async fn test_unwritable_output_fails_before_running() {
        let temp_dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "migrun",
            "-m",
            "migrations",
            "--wd",
            temp_dir.path().to_str().unwrap(),
            "-o",
            "no/such/dir/out.log",
        ])
        .unwrap();

        let err = run_with(&cli, ProcessorFactoryRegistry::new()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to create output file"));
    }
}
