//! 时间处理工具
//!
//! 统计口径使用设备所在地的固定时区（UTC+9），与服务器时区无关。

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use once_cell::sync::Lazy;

/// 本地时区相对 UTC 的偏移（秒）
pub const LOCAL_UTC_OFFSET_SECS: i32 = 9 * 3600;

static LOCAL_OFFSET: Lazy<FixedOffset> = Lazy::new(|| {
    FixedOffset::east_opt(LOCAL_UTC_OFFSET_SECS).expect("UTC+9 为合法时区偏移")
});

/// 本地时区
pub fn local_offset() -> FixedOffset {
    *LOCAL_OFFSET
}

/// 转换为本地时间
pub fn to_local(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
    dt.with_timezone(&local_offset())
}

/// 本地日期
pub fn local_date(dt: DateTime<Utc>) -> NaiveDate {
    to_local(dt).date_naive()
}

/// 本地小时（0-23）
pub fn local_hour(dt: DateTime<Utc>) -> u32 {
    to_local(dt).hour()
}

/// 日分桶键 `YYYY-MM-DD`
pub fn day_key(dt: DateTime<Utc>) -> String {
    to_local(dt).format("%Y-%m-%d").to_string()
}

/// 月分桶键 `YYYY-MM`
pub fn month_key(dt: DateTime<Utc>) -> String {
    to_local(dt).format("%Y-%m").to_string()
}

/// 本地时间转换为 UTC
pub fn local_naive_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    (naive - Duration::seconds(i64::from(LOCAL_UTC_OFFSET_SECS))).and_utc()
}

/// 本地日期 0 点对应的 UTC 时间
pub fn local_day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    local_naive_to_utc(date.and_time(chrono::NaiveTime::MIN))
}

/// 本地日期的 [开始, 结束) UTC 区间
pub fn local_day_bounds_utc(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_day_start_utc(date);
    (start, start + Duration::days(1))
}

/// `dt` 所在本地日的 0 点（UTC 表示）
pub fn local_midnight_utc(dt: DateTime<Utc>) -> DateTime<Utc> {
    local_day_start_utc(local_date(dt))
}

/// `dt` 所在本地月的 1 日 0 点（UTC 表示）
pub fn local_month_start_utc(dt: DateTime<Utc>) -> DateTime<Utc> {
    local_day_start_utc(first_of_month(local_date(dt)))
}

/// 上一个本地月的 1 日 0 点（UTC 表示）
pub fn previous_local_month_start_utc(dt: DateTime<Utc>) -> DateTime<Utc> {
    let last_day_of_previous = first_of_month(local_date(dt)) - Duration::days(1);
    local_day_start_utc(first_of_month(last_day_of_previous))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bucket_keys_use_local_offset() {
        // UTC 2024-03-31 15:30 = 本地 2024-04-01 00:30
        let dt = Utc.with_ymd_and_hms(2024, 3, 31, 15, 30, 0).unwrap();
        assert_eq!(day_key(dt), "2024-04-01");
        assert_eq!(month_key(dt), "2024-04");
        assert_eq!(local_hour(dt), 0);

        let before = Utc.with_ymd_and_hms(2024, 3, 31, 14, 59, 59).unwrap();
        assert_eq!(day_key(before), "2024-03-31");
        assert_eq!(local_hour(before), 23);
    }

    #[test]
    fn test_local_midnight() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 10, 3, 0, 0).unwrap();
        assert_eq!(
            local_midnight_utc(dt),
            Utc.with_ymd_and_hms(2024, 5, 9, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_month_starts() {
        // 本地 2024-01-15
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(
            local_month_start_utc(dt),
            Utc.with_ymd_and_hms(2023, 12, 31, 15, 0, 0).unwrap()
        );
        assert_eq!(
            previous_local_month_start_utc(dt),
            Utc.with_ymd_and_hms(2023, 11, 30, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = local_day_bounds_utc(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 28, 15, 0, 0).unwrap());
        assert_eq!(end - start, Duration::days(1));
    }
}
