//! Shared test fixtures: an in-memory remote sheet and a temporary cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;

use crate::api::{ApiError, RawRow, RemoteStore, Sheet};
use crate::cache::CacheManager;
use crate::models::{Budget, Category, Expense, Period};

/// Remote store backed by in-memory tables. Reads fail until a table is set
/// for the sheet, or always when `fail_reads` is on.
#[derive(Default)]
pub struct FakeRemote {
    tables: Mutex<HashMap<Sheet, Vec<RawRow>>>,
    writes: Mutex<Vec<(Sheet, Vec<Vec<String>>)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FakeRemote {
    pub fn with_table(sheet: Sheet, rows: Vec<RawRow>) -> Self {
        let remote = Self::default();
        remote.set_table(sheet, rows);
        remote
    }

    pub fn set_table(&self, sheet: Sheet, rows: Vec<RawRow>) {
        self.tables.lock().unwrap().insert(sheet, rows);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<(Sheet, Vec<Vec<String>>)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn fetch_rows(&self, sheet: Sheet) -> Result<Vec<RawRow>, ApiError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ApiError::InvalidResponse("simulated outage".into()));
        }
        self.tables
            .lock()
            .unwrap()
            .get(&sheet)
            .cloned()
            .ok_or_else(|| ApiError::EndpointStatus("error".into()))
    }

    async fn persist_rows(&self, sheet: Sheet, rows: Vec<Vec<String>>) -> Result<(), ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApiError::InvalidResponse("simulated outage".into()));
        }
        self.writes.lock().unwrap().push((sheet, rows));
        Ok(())
    }
}

pub fn temp_cache() -> (TempDir, Arc<CacheManager>) {
    let dir = TempDir::new().unwrap();
    let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
    (dir, Arc::new(cache))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn expense(id: i64, amount: Decimal, category: Category, on: NaiveDate) -> Expense {
    Expense::new(id, format!("expense {}", id), amount, category, on)
}

pub fn budget(id: i64, category: Category, amount: Decimal, label: &str) -> Budget {
    Budget::new(id, category, amount, Period::parse(label).unwrap())
}

/// Header row followed by `rows`, as the endpoint returns them.
pub fn table(header: &[&str], rows: Vec<Vec<Value>>) -> Vec<RawRow> {
    let mut table = vec![header.iter().map(|h| Value::String(h.to_string())).collect()];
    table.extend(rows);
    table
}

/// The fake as the trait object stores expect.
pub fn remote_handle(remote: &Arc<FakeRemote>) -> Option<Arc<dyn RemoteStore>> {
    let remote: Arc<dyn RemoteStore> = remote.clone();
    Some(remote)
}
