//! Per-statement execution environment
//!
//! A `QueryContext` is built once per statement and shared read-only, via
//! `Arc`, by every cursor in the statement's tree. It carries the
//! transaction-scoped store adapter, the type services, the cancellation
//! token, the metrics registry and the execution config.

mod cancel;
mod config;

pub use cancel::CancellationToken;
pub use config::{ConfigError, ConfigResult, ExecutionConfig};

use std::sync::Arc;

use uuid::Uuid;

use crate::observability::{log_event, Event, MetricsRegistry};
use crate::operator::{ExecutorError, ExecutorResult};
use crate::store::StoreAdapter;
use crate::types::{DefaultTypes, ValueComparator, ValueSerializer};

pub struct QueryContext {
    session_id: Uuid,
    store: Arc<dyn StoreAdapter>,
    config: ExecutionConfig,
    comparator: Arc<dyn ValueComparator>,
    serializer: Arc<dyn ValueSerializer>,
    cancel: CancellationToken,
    metrics: Arc<MetricsRegistry>,
}

impl QueryContext {
    /// Context with default type services, a fresh session id and a fresh
    /// cancellation token
    pub fn new(store: Arc<dyn StoreAdapter>, config: ExecutionConfig) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            store,
            config,
            comparator: Arc::new(DefaultTypes),
            serializer: Arc::new(DefaultTypes),
            cancel: CancellationToken::new(),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn with_comparator(mut self, comparator: Arc<dyn ValueComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn ValueSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Share a token with the caller so the statement can be canceled from outside
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn store(&self) -> &dyn StoreAdapter {
        self.store.as_ref()
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn comparator(&self) -> &dyn ValueComparator {
        self.comparator.as_ref()
    }

    pub fn serializer(&self) -> &dyn ValueSerializer {
        self.serializer.as_ref()
    }

    /// Owned handle on the comparator, for state that outlives a borrow of the context
    pub fn shared_comparator(&self) -> Arc<dyn ValueComparator> {
        Arc::clone(&self.comparator)
    }

    pub fn shared_serializer(&self) -> Arc<dyn ValueSerializer> {
        Arc::clone(&self.serializer)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Fail with `QueryCanceled` once cancellation was requested.
    ///
    /// Called by long-running cursors between rows.
    pub fn check_canceled(&self) -> ExecutorResult<()> {
        if self.cancel.is_canceled() {
            self.metrics.increment_cancellations();
            let session = self.session_id.to_string();
            log_event(Event::QueryCanceled, &[("session", &session)]);
            return Err(ExecutorError::QueryCanceled);
        }
        Ok(())
    }
}
