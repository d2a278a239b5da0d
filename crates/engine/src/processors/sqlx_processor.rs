//! sqlx-backed processor
//!
//! One `Any` pool with a single connection per invocation. Every statement is
//! announced as SQL trace; in preview mode statements are only announced.

use async_trait::async_trait;
use migrun_core::Announcer;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{Any, AnyPool, Row, Transaction};
use std::sync::Arc;
use std::time::Duration;

use super::{DatabaseType, Processor, ProcessorFactory, ProcessorOptions};
use crate::error::{EngineError, EngineResult};

/// Processor executing statements through sqlx
pub struct SqlxProcessor {
    database_type: DatabaseType,
    pool: AnyPool,
    transaction: Option<Transaction<'static, Any>>,
    announcer: Arc<dyn Announcer>,
    options: ProcessorOptions,
}

impl SqlxProcessor {
    /// Connect to the database
    pub async fn connect(
        database_type: DatabaseType,
        connection_string: &str,
        announcer: Arc<dyn Announcer>,
        options: ProcessorOptions,
    ) -> EngineResult<Self> {
        sqlx::any::install_default_drivers();

        let session_sql = database_type.timeout_statement(options.timeout);
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(u64::from(options.timeout)))
            .after_connect(move |conn, _meta| {
                let session_sql = session_sql.clone();
                Box::pin(async move {
                    sqlx::query(&session_sql).execute(conn).await?;
                    Ok(())
                })
            })
            .connect(connection_string)
            .await
            .map_err(|e| {
                EngineError::Processor(format!(
                    "Failed to connect to {} database: {}",
                    database_type, e
                ))
            })?;

        tracing::debug!(database = %database_type, timeout = options.timeout, "Processor connected");

        Ok(Self {
            database_type,
            pool,
            transaction: None,
            announcer,
            options,
        })
    }

    async fn run(&mut self, sql: &str) -> Result<(), sqlx::Error> {
        match self.transaction.as_mut() {
            Some(tx) => sqlx::query(sql).execute(&mut **tx).await?,
            None => sqlx::query(sql).execute(&self.pool).await?,
        };
        Ok(())
    }

    async fn rows(&mut self, sql: &str) -> Result<Vec<AnyRow>, sqlx::Error> {
        match self.transaction.as_mut() {
            Some(tx) => sqlx::query(sql).fetch_all(&mut **tx).await,
            None => sqlx::query(sql).fetch_all(&self.pool).await,
        }
    }
}

#[async_trait]
impl Processor for SqlxProcessor {
    async fn execute(&mut self, sql: &str) -> EngineResult<()> {
        self.announcer.sql(sql);
        if self.options.preview_only {
            return Ok(());
        }

        self.run(sql)
            .await
            .map_err(|e| EngineError::Processor(format!("Failed to execute '{}': {}", sql, e)))
    }

    async fn fetch_versions(&mut self, sql: &str) -> EngineResult<Vec<i64>> {
        let rows = match self.rows(sql).await {
            Ok(rows) => rows,
            // The version table is never created in preview mode
            Err(e) if self.options.preview_only => {
                tracing::debug!(error = %e, "Version query failed in preview mode");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        rows.iter()
            .map(|row| row.try_get::<i64, _>(0).map_err(EngineError::from))
            .collect()
    }

    async fn begin_transaction(&mut self) -> EngineResult<()> {
        if self.options.preview_only || self.transaction.is_some() {
            return Ok(());
        }
        self.transaction = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn commit_transaction(&mut self) -> EngineResult<()> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> EngineResult<()> {
        if let Some(tx) = self.transaction.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> EngineResult<()> {
        self.rollback_transaction().await?;
        self.pool.close().await;
        tracing::debug!(database = %self.database_type, "Processor closed");
        Ok(())
    }
}

/// Factory building [`SqlxProcessor`]s for one database type
pub struct SqlxProcessorFactory {
    database_type: DatabaseType,
}

impl SqlxProcessorFactory {
    pub fn new(database_type: DatabaseType) -> Self {
        Self { database_type }
    }
}

#[async_trait]
impl ProcessorFactory for SqlxProcessorFactory {
    fn name(&self) -> &str {
        self.database_type.name()
    }

    fn is_for_provider(&self, provider: &str) -> bool {
        self.database_type.matches_provider(provider)
    }

    async fn create(
        &self,
        connection_string: &str,
        announcer: Arc<dyn Announcer>,
        options: ProcessorOptions,
    ) -> EngineResult<Box<dyn Processor>> {
        let processor =
            SqlxProcessor::connect(self.database_type, connection_string, announcer, options)
                .await?;
        Ok(Box::new(processor))
    }
}
