use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::FreshnessLedger;
use crate::error::{LedgerError, LedgerResult};

/// In-memory ledger with failure injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger<R> {
    record: Arc<Mutex<R>>,
    saves: Arc<AtomicU32>,
    fail_load: Arc<AtomicBool>,
    fail_save: Arc<AtomicBool>,
}

impl<R: Clone + Default> MemoryLedger<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: R) -> Self {
        let ledger = Self::default();
        *ledger.record.lock() = record;
        ledger
    }

    pub fn current(&self) -> R {
        self.record.lock().clone()
    }

    pub fn save_count(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_next_load(&self) {
        self.fail_load.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_save(&self) {
        self.fail_save.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl<R> FreshnessLedger<R> for MemoryLedger<R>
where
    R: Clone + Default + Send + Sync + 'static,
{
    async fn load(&self) -> LedgerResult<R> {
        if self.fail_load.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Injected("load".to_string()));
        }
        Ok(self.record.lock().clone())
    }

    async fn save(&self, record: &R) -> LedgerResult<()> {
        if self.fail_save.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Injected("save".to_string()));
        }
        *self.record.lock() = record.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
