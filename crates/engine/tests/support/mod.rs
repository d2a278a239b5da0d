//! In-memory fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use migrun_core::{AnnouncementKind, Announcer, ResolvedConfig};
use migrun_engine::{
    EngineResult, MigrationEngine, MigrationModule, MigrationRunResult, Processor,
    ProcessorFactory, ProcessorOptions,
};
use std::io;
use std::sync::{Arc, Mutex};

/// Everything the fakes observed during one run
#[derive(Debug, Default)]
pub struct Recorded {
    /// `(factory, connection string, options)` per processor created
    pub created: Vec<(String, String, ProcessorOptions)>,
    /// Engine operations invoked, e.g. `rollback(3)`
    pub calls: Vec<String>,
    /// Name of the module handed to the engine
    pub module: Option<String>,
    pub engines_built: usize,
    pub processors_closed: usize,
}

pub type Log = Arc<Mutex<Recorded>>;

pub fn log() -> Log {
    Arc::new(Mutex::new(Recorded::default()))
}

pub struct FakeFactory {
    name: &'static str,
    provider: &'static str,
    log: Log,
}

impl FakeFactory {
    pub fn new(name: &'static str, provider: &'static str, log: &Log) -> Arc<Self> {
        Arc::new(Self {
            name,
            provider,
            log: log.clone(),
        })
    }
}

#[async_trait]
impl ProcessorFactory for FakeFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn is_for_provider(&self, provider: &str) -> bool {
        provider.to_lowercase().contains(self.provider)
    }

    async fn create(
        &self,
        connection_string: &str,
        _announcer: Arc<dyn Announcer>,
        options: ProcessorOptions,
    ) -> EngineResult<Box<dyn Processor>> {
        self.log.lock().unwrap().created.push((
            self.name.to_string(),
            connection_string.to_string(),
            options,
        ));
        Ok(Box::new(FakeProcessor {
            log: self.log.clone(),
        }))
    }
}

pub struct FakeProcessor {
    log: Log,
}

#[async_trait]
impl Processor for FakeProcessor {
    async fn execute(&mut self, _sql: &str) -> EngineResult<()> {
        Ok(())
    }

    async fn fetch_versions(&mut self, _sql: &str) -> EngineResult<Vec<i64>> {
        Ok(Vec::new())
    }

    async fn begin_transaction(&mut self) -> EngineResult<()> {
        Ok(())
    }

    async fn commit_transaction(&mut self) -> EngineResult<()> {
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> EngineResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> EngineResult<()> {
        self.log.lock().unwrap().processors_closed += 1;
        Ok(())
    }
}

/// Engine recording which operation was dispatched
pub struct RecordingEngine {
    log: Log,
    processor: Box<dyn Processor>,
}

impl RecordingEngine {
    pub fn build(
        log: &Log,
    ) -> impl Fn(MigrationModule, &ResolvedConfig, Box<dyn Processor>, Arc<dyn Announcer>) -> Box<dyn MigrationEngine>
           + Send
           + Sync
           + 'static {
        let log = log.clone();
        move |module: MigrationModule,
              _config: &ResolvedConfig,
              processor: Box<dyn Processor>,
              _announcer: Arc<dyn Announcer>| {
            {
                let mut recorded = log.lock().unwrap();
                recorded.engines_built += 1;
                recorded.module = Some(module.name);
            }
            Box::new(RecordingEngine {
                log: log.clone(),
                processor,
            }) as Box<dyn MigrationEngine>
        }
    }

    fn record(&self, call: String) -> EngineResult<MigrationRunResult> {
        self.log.lock().unwrap().calls.push(call);
        Ok(MigrationRunResult::default())
    }
}

#[async_trait]
impl MigrationEngine for RecordingEngine {
    async fn migrate_up(&mut self) -> EngineResult<MigrationRunResult> {
        self.record("migrate_up".to_string())
    }

    async fn migrate_up_to(&mut self, version: i64) -> EngineResult<MigrationRunResult> {
        self.record(format!("migrate_up_to({})", version))
    }

    async fn migrate_down(&mut self, version: i64) -> EngineResult<MigrationRunResult> {
        self.record(format!("migrate_down({})", version))
    }

    async fn rollback(&mut self, steps: u32) -> EngineResult<MigrationRunResult> {
        self.record(format!("rollback({})", steps))
    }

    async fn rollback_to_version(&mut self, version: i64) -> EngineResult<MigrationRunResult> {
        self.record(format!("rollback_to_version({})", version))
    }

    async fn close(&mut self) -> EngineResult<()> {
        self.processor.close().await
    }
}

/// Announcer keeping every message
#[derive(Default)]
pub struct RecordingAnnouncer {
    messages: Mutex<Vec<(AnnouncementKind, String)>>,
}

impl RecordingAnnouncer {
    pub fn messages(&self) -> Vec<(AnnouncementKind, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn said(&self, needle: &str) -> bool {
        self.messages().iter().any(|(_, m)| m.contains(needle))
    }
}

impl Announcer for RecordingAnnouncer {
    fn write(&self, kind: AnnouncementKind, message: &str) -> io::Result<()> {
        self.messages.lock().unwrap().push((kind, message.to_string()));
        Ok(())
    }
}
