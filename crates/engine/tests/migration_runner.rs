mod support;

use migrun_core::{AnnouncementKind, Announcer, ConnectionResolution, ResolvedConfig, RunnerContext};
use migrun_engine::processors::SqlxProcessor;
use migrun_engine::{
    DatabaseType, EngineError, MigrationDefinition, MigrationEngine, MigrationModule,
    MigrationRunner, ProcessorOptions,
};
use std::sync::Arc;
use support::RecordingAnnouncer;
use tempfile::TempDir;

fn module() -> MigrationModule {
    MigrationModule::new(
        "app",
        vec![
            MigrationDefinition::new(1, "create users")
                .with_up("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);")
                .with_down("DROP TABLE users;"),
            MigrationDefinition::new(2, "create posts")
                .with_up("CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER);")
                .with_down("DROP TABLE posts;"),
            MigrationDefinition::new(3, "create tags")
                .with_namespace("blog")
                .with_up("CREATE TABLE tags (id INTEGER PRIMARY KEY);")
                .with_down("DROP TABLE tags;"),
            MigrationDefinition::new(0, "seed users")
                .with_profile("development")
                .with_up("INSERT INTO users (id, name) VALUES (1, 'admin');"),
        ],
    )
}

fn config(ctx: RunnerContext, connection_string: &str) -> ResolvedConfig {
    ResolvedConfig::finalize(
        &ctx,
        ConnectionResolution::explicit(Some("sqlite".to_string()), connection_string),
        &[],
    )
    .unwrap()
}

async fn runner_for(
    module: MigrationModule,
    ctx: RunnerContext,
    connection_string: &str,
    announcer: Arc<RecordingAnnouncer>,
) -> MigrationRunner {
    let config = config(ctx, connection_string);
    let announcer: Arc<dyn Announcer> = announcer;
    let processor = SqlxProcessor::connect(
        DatabaseType::Sqlite,
        connection_string,
        announcer.clone(),
        ProcessorOptions {
            preview_only: config.preview_only,
            timeout: config.timeout,
        },
    )
    .await
    .unwrap();
    MigrationRunner::new(module, &config, Box::new(processor), announcer)
}

async fn runner(ctx: RunnerContext) -> MigrationRunner {
    runner_for(
        module(),
        ctx,
        "sqlite::memory:",
        Arc::new(RecordingAnnouncer::default()),
    )
    .await
}

async fn applied(runner: &mut MigrationRunner) -> Vec<i64> {
    runner.applied_versions().await.unwrap().into_iter().collect()
}

#[tokio::test]
async fn test_migrate_up_applies_all_pending() {
    let mut runner = runner(RunnerContext::new()).await;

    let result = runner.migrate_up().await.unwrap();
    assert_eq!(result.applied, vec![1, 2, 3]);
    assert_eq!(result.profiles_run, 0);
    assert_eq!(applied(&mut runner).await, vec![1, 2, 3]);

    let again = runner.migrate_up().await.unwrap();
    assert!(again.applied.is_empty());
}

#[tokio::test]
async fn test_migrate_up_to_stops_at_version() {
    let mut runner = runner(RunnerContext::new()).await;

    let result = runner.migrate_up_to(2).await.unwrap();
    assert_eq!(result.applied, vec![1, 2]);
    assert_eq!(applied(&mut runner).await, vec![1, 2]);
}

#[tokio::test]
async fn test_namespace_filters_migrations() {
    let mut runner = runner(RunnerContext::new().with_namespace("blog")).await;

    let result = runner.migrate_up().await.unwrap();
    assert_eq!(result.applied, vec![3]);
}

#[tokio::test]
async fn test_profile_runs_after_migrate_up_and_is_not_recorded() {
    let mut runner = runner(RunnerContext::new().with_profile("development")).await;

    let result = runner.migrate_up().await.unwrap();
    assert_eq!(result.profiles_run, 1);
    assert_eq!(applied(&mut runner).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_rollback_reverts_latest_first() {
    let mut runner = runner(RunnerContext::new()).await;
    runner.migrate_up().await.unwrap();

    let result = runner.rollback(2).await.unwrap();
    assert_eq!(result.reverted, vec![3, 2]);
    assert_eq!(applied(&mut runner).await, vec![1]);
}

#[tokio::test]
async fn test_rollback_to_version_zero_reverts_everything() {
    let mut runner = runner(RunnerContext::new()).await;
    runner.migrate_up().await.unwrap();

    let result = runner.rollback_to_version(0).await.unwrap();
    assert_eq!(result.reverted, vec![3, 2, 1]);
    assert!(applied(&mut runner).await.is_empty());
}

#[tokio::test]
async fn test_migrate_down_reverts_above_version() {
    let mut runner = runner(RunnerContext::new()).await;
    runner.migrate_up().await.unwrap();

    let result = runner.migrate_down(1).await.unwrap();
    assert_eq!(result.reverted, vec![3, 2]);
    assert_eq!(applied(&mut runner).await, vec![1]);
}

#[tokio::test]
async fn test_failed_migration_is_rolled_back() {
    let broken = MigrationModule::new(
        "broken",
        vec![
            MigrationDefinition::new(1, "create users")
                .with_up("CREATE TABLE users (id INTEGER PRIMARY KEY);")
                .with_down("DROP TABLE users;"),
            MigrationDefinition::new(2, "bad insert")
                .with_up("INSERT INTO users (id) VALUES (1);")
                .with_up("INSERT INTO missing_table (id) VALUES (1);"),
        ],
    );
    let announcer = Arc::new(RecordingAnnouncer::default());
    let mut runner = runner_for(broken, RunnerContext::new(), "sqlite::memory:", announcer.clone()).await;

    let err = runner.migrate_up().await.unwrap_err();
    assert!(matches!(err, EngineError::Migration(_)));
    assert!(err.to_string().contains("2: bad insert"));
    assert_eq!(applied(&mut runner).await, vec![1]);
    assert!(announcer
        .messages()
        .iter()
        .any(|(kind, m)| *kind == AnnouncementKind::Error && m.contains("bad insert")));
}

#[tokio::test]
async fn test_rollback_skips_versions_missing_from_module() {
    let temp_dir = TempDir::new().unwrap();
    let database = format!("sqlite://{}?mode=rwc", temp_dir.path().join("app.db").display());

    let mut first = runner_for(
        module(),
        RunnerContext::new(),
        &database,
        Arc::new(RecordingAnnouncer::default()),
    )
    .await;
    first.migrate_up().await.unwrap();
    first.close().await.unwrap();

    let without_tags = MigrationModule::new(
        "app",
        module().migrations.into_iter().filter(|m| m.version != 3).collect(),
    );
    let announcer = Arc::new(RecordingAnnouncer::default());
    let mut second = runner_for(without_tags, RunnerContext::new(), &database, announcer.clone()).await;

    let result = second.rollback(2).await.unwrap();
    assert_eq!(result.reverted, vec![2]);
    assert!(announcer.said("Skipping version 3: not found in module"));
    second.close().await.unwrap();
}

#[tokio::test]
async fn test_migrations_are_announced() {
    let announcer = Arc::new(RecordingAnnouncer::default());
    let mut runner = runner_for(module(), RunnerContext::new(), "sqlite::memory:", announcer.clone()).await;

    runner.migrate_up_to(1).await.unwrap();

    let messages = announcer.messages();
    assert!(messages
        .iter()
        .any(|(kind, m)| *kind == AnnouncementKind::Heading && m == "1: create users migrating"));
    assert!(messages
        .iter()
        .any(|(kind, m)| *kind == AnnouncementKind::Sql && m.starts_with("CREATE TABLE users")));
    assert!(messages.iter().any(|(kind, _)| *kind == AnnouncementKind::ElapsedTime));
}

#[tokio::test]
async fn test_preview_records_nothing() {
    let mut runner = runner(RunnerContext::new().with_preview_only(true)).await;

    let result = runner.migrate_up().await.unwrap();
    assert_eq!(result.applied, vec![1, 2, 3]);
    assert!(applied(&mut runner).await.is_empty());
}
