//! 分桶统计测试

#[macro_use]
mod helpers;

use chrono::{Duration, NaiveDate};
use helpers::{frame_hex, kst, solar_frame, wind_frame, PayloadBuilder};
use verbena::aggregation::{
    BucketAccumulator, BucketUnit, HourlyComputer, SeriesAggregator, ELECTRIC_EMISSION_FACTOR,
    KG_CO2_PER_TREE,
};
use verbena::models::FrameRow;
use verbena::protocol::EnergySource;

fn day_accumulator(source: EnergySource, pinned_slot: Option<u8>) -> BucketAccumulator {
    BucketAccumulator::calendar(source, BucketUnit::Day, pinned_slot, Duration::seconds(60))
}

mod series {
    use super::*;

    #[test]
    fn test_three_frames_in_one_day() {
        let rows = vec![
            FrameRow::new(kst(2024, 5, 1, 8, 0), solar_frame(0, 500, 480, 1000)),
            FrameRow::new(kst(2024, 5, 1, 12, 0), solar_frame(0, 500, 480, 1500)),
            FrameRow::new(kst(2024, 5, 1, 17, 0), solar_frame(0, 500, 480, 4000)),
        ];
        let mut acc = day_accumulator(EnergySource::Solar, None);
        acc.ingest(&rows);

        let summary = SeriesAggregator::aggregate(EnergySource::Solar, &acc.into_buckets());
        assert_eq!(summary.rows.len(), 1);

        let row = &summary.rows[0];
        let co2 = 3.0 * ELECTRIC_EMISSION_FACTOR;
        assert_eq!(row.bucket, "2024-05-01");
        assert_eq!(row.kwh, 3.0);
        assert!((row.co2_kg - co2).abs() < 0.01);
        assert_eq!(row.trees, (co2 / KG_CO2_PER_TREE).floor() as u64);
        assert_eq!(row.first_at, kst(2024, 5, 1, 8, 0));
        assert_eq!(row.last_at, kst(2024, 5, 1, 17, 0));
        assert!(!row.counter_reset);
    }

    #[test]
    fn test_local_midnight_splits_days() {
        // UTC 同一天，本地跨日
        let rows = vec![
            FrameRow::new(kst(2024, 5, 1, 23, 0), wind_frame(100, 1000)),
            FrameRow::new(kst(2024, 5, 1, 23, 50), wind_frame(100, 2000)),
            FrameRow::new(kst(2024, 5, 2, 0, 10), wind_frame(100, 2100)),
            FrameRow::new(kst(2024, 5, 2, 1, 0), wind_frame(100, 3100)),
        ];
        let mut acc = day_accumulator(EnergySource::Wind, None);
        acc.ingest(&rows);

        let summary = SeriesAggregator::aggregate(EnergySource::Wind, &acc.into_buckets());
        let buckets: Vec<(&str, f64)> = summary
            .rows
            .iter()
            .map(|r| (r.bucket.as_str(), r.kwh))
            .collect();
        assert_eq!(buckets, vec![("2024-05-01", 1.0), ("2024-05-02", 1.0)]);
        assert_eq!(summary.total.kwh, 2.0);
    }

    #[test]
    fn test_counter_reset_is_flagged_not_negative() {
        let rows = vec![
            FrameRow::new(kst(2024, 5, 1, 8, 0), wind_frame(100, 5000)),
            FrameRow::new(kst(2024, 5, 1, 9, 0), wind_frame(100, 100)),
        ];
        let mut acc = day_accumulator(EnergySource::Wind, None);
        acc.ingest(&rows);

        let summary = SeriesAggregator::aggregate(EnergySource::Wind, &acc.into_buckets());
        assert_eq!(summary.rows[0].kwh, 0.0);
        assert!(summary.rows[0].counter_reset);
        assert_eq!(summary.total.kwh, 0.0);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let rows = vec![
            FrameRow::new(kst(2024, 5, 1, 8, 0), wind_frame(100, 1000)),
            FrameRow::new(kst(2024, 5, 1, 9, 0), "14 04 01 00 00 01"),
            FrameRow::new(kst(2024, 5, 1, 10, 0), "not a frame"),
            FrameRow::new(kst(2024, 5, 1, 11, 0), solar_frame(0, 1, 1, 99_999)),
            FrameRow::new(kst(2024, 5, 1, 12, 0), wind_frame(100, 1500)),
        ];
        let mut acc = day_accumulator(EnergySource::Wind, None);
        acc.ingest(&rows);

        let stats = acc.stats();
        assert_eq!(stats.seen, 5);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.decode_failed, 2);
        assert_eq!(stats.source_mismatch, 1);

        let summary = SeriesAggregator::aggregate(EnergySource::Wind, &acc.into_buckets());
        assert_eq!(summary.rows[0].kwh, 0.5);
    }

    #[test]
    fn test_empty_window_has_no_rows() {
        let mut acc = day_accumulator(EnergySource::Solar, None);
        acc.ingest(&[]);
        assert!(acc.is_empty());

        let summary = SeriesAggregator::aggregate(EnergySource::Solar, &acc.into_buckets());
        assert!(summary.rows.is_empty());
        assert_eq!(summary.total.kwh, 0.0);
    }
}

mod sampling {
    use super::*;

    #[test]
    fn test_interior_rows_within_spacing_are_skipped() {
        let start = kst(2024, 5, 1, 10, 0);
        let rows: Vec<FrameRow> = (0..7)
            .map(|i| {
                FrameRow::new(
                    start + Duration::seconds(i * 10),
                    solar_frame(0, 100, 90, 1000 + i as u64 * 10),
                )
            })
            .collect();
        let mut acc = day_accumulator(EnergySource::Solar, None);
        acc.ingest(&rows);

        let stats = acc.stats();
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.sampled_out, 5);

        // 首尾行不受抽样影响，差值准确
        let summary = SeriesAggregator::aggregate(EnergySource::Solar, &acc.into_buckets());
        assert_eq!(summary.rows[0].kwh, 0.06);
    }

    #[test]
    fn test_spacing_measured_from_last_accepted_row() {
        let start = kst(2024, 5, 1, 10, 0);
        let rows = vec![
            FrameRow::new(start, wind_frame(100, 1000)),
            // 无法解析，不作为抽样锚点
            FrameRow::new(start + Duration::seconds(70), "14 04 01 00 00"),
            FrameRow::new(start + Duration::seconds(90), wind_frame(100, 1100)),
            FrameRow::new(start + Duration::seconds(120), wind_frame(100, 1200)),
            FrameRow::new(start + Duration::seconds(300), wind_frame(100, 1500)),
        ];
        let mut acc = day_accumulator(EnergySource::Wind, None);
        acc.ingest(&rows);

        let stats = acc.stats();
        assert_eq!(stats.decode_failed, 1);
        assert_eq!(stats.accepted, 3);
        assert_eq!(stats.sampled_out, 1);
    }
}

mod slots {
    use super::*;

    fn two_slot_rows() -> Vec<FrameRow> {
        vec![
            FrameRow::new(kst(2024, 5, 1, 8, 0), solar_frame(1, 100, 90, 1000)),
            FrameRow::new(kst(2024, 5, 1, 8, 5), solar_frame(2, 100, 90, 5000)),
            FrameRow::new(kst(2024, 5, 1, 12, 0), solar_frame(1, 100, 90, 2000)),
            FrameRow::new(kst(2024, 5, 1, 12, 5), solar_frame(2, 100, 90, 5500)),
        ]
    }

    #[test]
    fn test_slots_tracked_separately_and_summed() {
        let mut acc = day_accumulator(EnergySource::Solar, None);
        acc.ingest(&two_slot_rows());
        let buckets = acc.into_buckets();

        let slots: Vec<u8> = buckets.keys().map(|(_, slot)| *slot).collect();
        assert_eq!(slots, vec![1, 2]);

        let summary = SeriesAggregator::aggregate(EnergySource::Solar, &buckets);
        assert_eq!(summary.rows[0].kwh, 1.5);
    }

    #[test]
    fn test_pinned_slot_applies_to_every_row() {
        let mut acc = day_accumulator(EnergySource::Solar, Some(3));
        acc.ingest(&two_slot_rows());
        let buckets = acc.into_buckets();

        assert!(buckets.keys().all(|(_, slot)| *slot == 3));
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn test_single_slot_source_ignores_slot_byte() {
        let payload = PayloadBuilder::zeroed(26).u64(18, 1000).build();
        let later = PayloadBuilder::zeroed(26).u64(18, 3000).build();
        let rows = vec![
            FrameRow::new(kst(2024, 5, 1, 8, 0), frame_hex(0x04, 0x01, 2, 0x00, &payload)),
            FrameRow::new(kst(2024, 5, 1, 9, 0), frame_hex(0x04, 0x01, 1, 0x00, &later)),
        ];
        let mut acc = day_accumulator(EnergySource::Wind, Some(2));
        acc.ingest(&rows);
        let buckets = acc.into_buckets();

        assert!(buckets.keys().all(|(_, slot)| *slot == 0));
        let summary = SeriesAggregator::aggregate(EnergySource::Wind, &buckets);
        assert_eq!(summary.rows[0].kwh, 2.0);
    }
}

mod interleaved_slots {
    use super::*;

    /// 四个 slot 在同一时刻附近（秒级错开）各自上报
    fn interleaved_rows(ticks: i64, step_secs: i64, wh_per_tick: u64) -> Vec<FrameRow> {
        let start = kst(2024, 5, 1, 8, 0);
        let mut rows = Vec::new();
        for tick in 0..ticks {
            for slot in 0..4u8 {
                let at = start + Duration::seconds(tick * step_secs + i64::from(slot));
                let wh = 1_000_000 * (u64::from(slot) + 1) + tick as u64 * wh_per_tick;
                rows.push(FrameRow::new(at, solar_frame(slot, 100, 90, wh)));
            }
        }
        rows
    }

    #[test]
    fn test_each_slot_keeps_its_own_spacing() {
        let rows = interleaved_rows(600, 60, 1000);
        let mut acc = day_accumulator(EnergySource::Solar, None);
        acc.ingest(&rows);

        let stats = acc.stats();
        assert_eq!(stats.seen, 2400);
        assert_eq!(stats.accepted, 2400);
        assert_eq!(stats.sampled_out, 0);

        let buckets = acc.into_buckets();
        let slots: Vec<u8> = buckets.keys().map(|(_, slot)| *slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);

        let summary = SeriesAggregator::aggregate(EnergySource::Solar, &buckets);
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].kwh, 2396.0);
    }

    #[test]
    fn test_dense_slots_sampled_but_last_row_kept() {
        // 每 20 秒一帧，按 60 秒抽样；每个 slot 的末行仍计入
        let rows = interleaved_rows(31, 20, 10);
        let mut acc = day_accumulator(EnergySource::Solar, None);
        acc.ingest(&rows);

        let stats = acc.stats();
        assert_eq!(stats.accepted, 44);
        assert_eq!(stats.sampled_out, 80);

        let buckets = acc.into_buckets();
        for counters in buckets.values() {
            assert_eq!(counters.last_wh - counters.first_wh, 300);
        }
        let summary = SeriesAggregator::aggregate(EnergySource::Solar, &buckets);
        assert_eq!(summary.rows[0].kwh, 1.2);
    }

    #[test]
    fn test_hourly_sums_interleaved_slots() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let rows = interleaved_rows(61, 30, 5);
        let hours = HourlyComputer::new(EnergySource::Solar, None).compute(date, &rows);

        assert_eq!(hours[8].kwh, 1.2);
        assert_eq!(HourlyComputer::total_kwh(&hours), 1.2);
    }
}

mod yearly {
    use super::*;

    #[test]
    fn test_month_rows_equal_sum_of_day_rows() {
        let mut rows = Vec::new();
        let mut wh = 0u64;
        for (month, day) in [(4, 28), (4, 29), (4, 30), (5, 1), (5, 2)] {
            for hour in [8, 12, 17] {
                wh += 1_234 * u64::from(day);
                rows.push(FrameRow::new(
                    kst(2024, month, day, hour, 0),
                    wind_frame(100, wh),
                ));
            }
        }
        let mut acc = day_accumulator(EnergySource::Wind, None);
        acc.ingest(&rows);

        let days = SeriesAggregator::aggregate(EnergySource::Wind, &acc.into_buckets()).rows;
        let months = SeriesAggregator::roll_up_months(&days);

        assert_eq!(months.len(), 2);
        for month in &months {
            let day_sum: f64 = days
                .iter()
                .filter(|d| d.bucket.starts_with(&month.bucket))
                .map(|d| d.kwh)
                .sum();
            assert!((month.kwh - day_sum).abs() < 0.01, "{}", month.bucket);
        }
        assert_eq!(months[0].bucket, "2024-04");
        assert_eq!(months[0].first_at, kst(2024, 4, 28, 8, 0));
        assert_eq!(months[1].last_at, kst(2024, 5, 2, 17, 0));
    }
}

mod hourly {
    use super::*;

    #[test]
    fn test_hours_always_24_and_zero_filled() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let rows = vec![
            // 前一天的行被忽略
            FrameRow::new(kst(2024, 4, 30, 23, 0), solar_frame(0, 100, 90, 0)),
            FrameRow::new(kst(2024, 5, 1, 10, 0), solar_frame(0, 100, 90, 1000)),
            FrameRow::new(kst(2024, 5, 1, 10, 30), solar_frame(0, 100, 90, 1500)),
            FrameRow::new(kst(2024, 5, 1, 11, 0), solar_frame(0, 100, 90, 2200)),
            FrameRow::new(kst(2024, 5, 1, 11, 59), solar_frame(0, 100, 90, 2500)),
        ];
        let hours = HourlyComputer::new(EnergySource::Solar, None).compute(date, &rows);

        assert_eq!(hours.len(), 24);
        for (index, entry) in hours.iter().enumerate() {
            assert_eq!(entry.hour as usize, index);
            assert!(entry.kwh >= 0.0);
        }
        assert_eq!(hours[10].kwh, 0.5);
        assert_eq!(hours[11].kwh, 0.3);
        assert_eq!(hours[9].kwh, 0.0);
        assert_eq!(HourlyComputer::total_kwh(&hours), 0.8);
    }

    #[test]
    fn test_hourly_reset_flag() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let rows = vec![
            FrameRow::new(kst(2024, 5, 1, 3, 0), wind_frame(100, 900)),
            FrameRow::new(kst(2024, 5, 1, 3, 30), wind_frame(100, 10)),
        ];
        let hours = HourlyComputer::new(EnergySource::Wind, None).compute(date, &rows);
        assert!(hours[3].counter_reset);
        assert_eq!(hours[3].kwh, 0.0);
    }
}
