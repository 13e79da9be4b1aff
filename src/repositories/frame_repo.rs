//! 遥测帧仓库（PostgreSQL）

use super::telemetry_store::TelemetryStore;
use crate::db::PostgresPool;
use crate::errors::AppError;
use crate::models::{FrameQuery, FrameRow};
use crate::protocol::STATUS_OK;

/// 排序方向
#[derive(Debug, Clone, Copy)]
enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// 生成帧查询 SQL
///
/// 帧体为空格分隔的两位十六进制，字节 i 位于字符 `3i+1` 起的 2 个字符：
/// 能源代码在 4-5，slot 在 10-11，状态码在 13-14。
fn frame_sql(order: Order, limit: Option<i64>) -> String {
    let mut sql = format!(
        r#"
        SELECT received_at, body
        FROM telemetry_frames
        WHERE device_id = $1
          AND received_at >= $2
          AND received_at < $3
          AND left(body, 2) = $4
          AND upper(substr(body, 4, 2)) = $5
          AND length(body) >= $6
          AND ($7 = FALSE OR upper(substr(body, 13, 2)) = $8)
          AND ($9::TEXT IS NULL OR upper(substr(body, 10, 2)) = $9)
        ORDER BY received_at {}
        "#,
        order.as_sql()
    );
    if let Some(limit) = limit {
        sql.push_str(&format!("LIMIT {}", limit));
    }
    sql
}

/// 遥测帧仓库
#[derive(Clone)]
pub struct FrameRepository {
    pool: PostgresPool,
}

impl FrameRepository {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    async fn query(
        &self,
        query: &FrameQuery,
        order: Order,
        limit: Option<i64>,
    ) -> Result<Vec<FrameRow>, AppError> {
        let sql = frame_sql(order, limit);
        let rows = sqlx::query_as::<_, FrameRow>(&sql)
            .bind(&query.device_id)
            .bind(query.start)
            .bind(query.end)
            .bind(query.command_prefix)
            .bind(query.source_hex())
            .bind(query.min_hex_len() as i32)
            .bind(query.ok_only)
            .bind(format!("{:02X}", STATUS_OK))
            .bind(query.slot_hex())
            .fetch_all(self.pool.pool())
            .await?;

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl TelemetryStore for FrameRepository {
    async fn fetch_frames(&self, query: &FrameQuery) -> Result<Vec<FrameRow>, AppError> {
        let rows = self.query(query, Order::Asc, None).await?;
        tracing::debug!(
            device_id = %query.device_id,
            source = %query.source,
            rows = rows.len(),
            "已读取遥测帧"
        );
        Ok(rows)
    }

    async fn latest_frame(&self, query: &FrameQuery) -> Result<Option<FrameRow>, AppError> {
        Ok(self.query(query, Order::Desc, Some(1)).await?.pop())
    }

    async fn first_frame(&self, query: &FrameQuery) -> Result<Option<FrameRow>, AppError> {
        Ok(self.query(query, Order::Asc, Some(1)).await?.pop())
    }
}
