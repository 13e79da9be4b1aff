//! 发电量统计服务

use crate::aggregation::{
    BucketAccumulator, BucketUnit, HourlyComputer, KpiComputer, SeriesAggregator, SourcePolicy,
    min_payload_len,
};
use crate::errors::AppError;
use crate::models::{
    FrameQuery, HourlyQueryParams, HourlyResponse, KpiResponse, RangeUtc, SeriesQueryParams,
    SeriesResponse, SeriesView,
};
use crate::protocol::EnergySource;
use crate::repositories::{FrameRepository, TelemetryStore};
use crate::services::cache_service::{kpi_key, CacheService};
use crate::utils::local_day_bounds_utc;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 基于 PostgreSQL 的统计服务
pub type PgEnergyService = EnergyService<FrameRepository>;

/// 发电量统计服务
pub struct EnergyService<S: TelemetryStore> {
    store: Arc<S>,
    cache: Option<Arc<CacheService>>,
    kpi_ttl_seconds: u64,
}

impl<S: TelemetryStore> EnergyService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            cache: None,
            kpi_ttl_seconds: 0,
        }
    }

    /// 启用 KPI 缓存
    pub fn with_cache(mut self, cache: Arc<CacheService>, kpi_ttl_seconds: u64) -> Self {
        self.cache = Some(cache);
        self.kpi_ttl_seconds = kpi_ttl_seconds;
        self
    }

    /// 日/月/年视图时间序列
    pub async fn series(
        &self,
        device_id: &str,
        params: &SeriesQueryParams,
    ) -> Result<SeriesResponse, AppError> {
        params
            .validate_time_range()
            .map_err(AppError::ValidationError)?;

        let source = params.source;
        let policy = SourcePolicy::for_source(source);
        let start = if policy.clamps_series_range {
            params.start.max(params.end - policy.recent_window())
        } else {
            params.start
        };
        let pinned_slot = pinned_slot(source, params.slot);

        let query = FrameQuery::new(device_id, source, start, params.end)
            .with_min_payload_len(min_payload_len(source))
            .with_slot(pinned_slot);
        let rows = self.store.fetch_frames(&query).await?;

        let unit = match params.view {
            SeriesView::Monthly => BucketUnit::Month,
            SeriesView::Daily | SeriesView::Yearly => BucketUnit::Day,
        };
        let mut accumulator =
            BucketAccumulator::calendar(source, unit, pinned_slot, policy.series_spacing());
        accumulator.ingest(&rows);

        let stats = accumulator.stats();
        tracing::debug!(
            device_id,
            %source,
            view = ?params.view,
            seen = stats.seen,
            accepted = stats.accepted,
            sampled_out = stats.sampled_out,
            decode_failed = stats.decode_failed,
            no_energy = stats.no_energy,
            source_mismatch = stats.source_mismatch,
            "时间序列扫描完成"
        );

        let has_data = !accumulator.is_empty();
        let mut summary = SeriesAggregator::aggregate(source, &accumulator.into_buckets());
        if params.view == SeriesView::Yearly {
            summary.rows = SeriesAggregator::roll_up_months(&summary.rows);
            summary.total = SeriesAggregator::totals(&summary.rows);
        }

        Ok(SeriesResponse {
            device_id: device_id.to_string(),
            source,
            view: params.view,
            range_utc: RangeUtc {
                start,
                end: params.end,
            },
            has_data,
            rows: summary.rows,
            total: summary.total,
        })
    }

    /// KPI 快照（启用缓存时先查缓存）
    pub async fn kpi(
        &self,
        device_id: &str,
        source: EnergySource,
        now: DateTime<Utc>,
    ) -> Result<KpiResponse, AppError> {
        let key = kpi_key(device_id, source);

        if let Some(cache) = &self.cache {
            match cache.get::<KpiResponse>(&key).await {
                Ok(Some(cached)) => return Ok(cached),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, key = %key, "读取 KPI 缓存失败"),
            }
        }

        let snapshot = KpiComputer::new(self.store.as_ref())
            .compute(device_id, source, now)
            .await?;
        let response = KpiResponse {
            device_id: device_id.to_string(),
            source,
            has_data: snapshot.has_data(),
            snapshot,
        };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &response, self.kpi_ttl_seconds).await {
                tracing::warn!(error = %e, key = %key, "写入 KPI 缓存失败");
            }
        }

        Ok(response)
    }

    /// 本地某日 24 小时电量
    pub async fn hourly(
        &self,
        device_id: &str,
        params: &HourlyQueryParams,
    ) -> Result<HourlyResponse, AppError> {
        let source = params.source;
        let pinned_slot = pinned_slot(source, params.slot);
        let (start, end) = local_day_bounds_utc(params.date);

        let query = FrameQuery::new(device_id, source, start, end)
            .with_min_payload_len(min_payload_len(source))
            .with_slot(pinned_slot);
        let rows = self.store.fetch_frames(&query).await?;

        let hours = HourlyComputer::new(source, pinned_slot).compute(params.date, &rows);
        let total_kwh = HourlyComputer::total_kwh(&hours);

        Ok(HourlyResponse {
            device_id: device_id.to_string(),
            source,
            date: params.date,
            hours,
            total_kwh,
        })
    }
}

/// 只有多路能源才使用指定的 slot
fn pinned_slot(source: EnergySource, slot: Option<u8>) -> Option<u8> {
    if source.is_multi_slot() {
        slot
    } else {
        None
    }
}
