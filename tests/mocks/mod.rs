//! Mock 对象
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use verbena::errors::AppError;
use verbena::models::{FrameQuery, FrameRow};
use verbena::repositories::TelemetryStore;

/// 内存遥测帧存储
///
/// 按 `FrameQuery::matches` 实现与数据库相同的预过滤约定。
#[derive(Debug, Default, Clone)]
pub struct InMemoryTelemetryStore {
    rows: Arc<Mutex<Vec<(String, FrameRow)>>>,
    queries: Arc<Mutex<Vec<FrameQuery>>>,
}

impl InMemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, device_id: &str, received_at: DateTime<Utc>, body: impl Into<String>) {
        let mut rows = self.rows.lock().unwrap();
        rows.push((device_id.to_string(), FrameRow::new(received_at, body)));
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// 收到过的查询
    pub fn queries(&self) -> Vec<FrameQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn select(&self, query: &FrameQuery) -> Vec<FrameRow> {
        self.queries.lock().unwrap().push(query.clone());

        let rows = self.rows.lock().unwrap();
        let mut selected: Vec<FrameRow> = rows
            .iter()
            .filter(|(device_id, row)| *device_id == query.device_id && query.matches(row))
            .map(|(_, row)| row.clone())
            .collect();
        selected.sort_by_key(|row| row.received_at);
        selected
    }
}

#[async_trait::async_trait]
impl TelemetryStore for InMemoryTelemetryStore {
    async fn fetch_frames(&self, query: &FrameQuery) -> Result<Vec<FrameRow>, AppError> {
        Ok(self.select(query))
    }

    async fn latest_frame(&self, query: &FrameQuery) -> Result<Option<FrameRow>, AppError> {
        Ok(self.select(query).pop())
    }

    async fn first_frame(&self, query: &FrameQuery) -> Result<Option<FrameRow>, AppError> {
        Ok(self.select(query).into_iter().next())
    }
}
