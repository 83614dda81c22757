use biofuse_core::normalizer::{normalize_bucketed, normalize_native};
use biofuse_core::timestamps::ReferenceClock;
use biofuse_parser::RawRecord;
use chrono::{Duration, NaiveDateTime};

fn parse_naive(ts: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").expect("parse timestamp")
}

fn air(ts: &str, co2: f64) -> RawRecord {
    RawRecord::new(ts).with_field("co2_ppm", co2)
}

#[test]
fn buckets_average_each_minute() {
    let records = vec![
        air("2025-07-28T00:00:10Z", 600.0),
        air("2025-07-28T00:00:40Z", 610.0),
        air("2025-07-28T00:01:05Z", 620.0),
        air("2025-07-28T00:01:50Z", 630.0),
        air("2025-07-28T00:02:30Z", 640.0),
    ];

    let normalized = normalize_bucketed(
        &records,
        "co2_ppm",
        Duration::seconds(60),
        &ReferenceClock::utc(),
    )
    .expect("normalize");

    let buckets: Vec<(NaiveDateTime, f64)> = normalized
        .series
        .samples()
        .iter()
        .map(|sample| (sample.timestamp, sample.number("co2_ppm").expect("co2")))
        .collect();
    assert_eq!(
        buckets,
        vec![
            (parse_naive("2025-07-28 00:00:00"), 605.0),
            (parse_naive("2025-07-28 00:01:00"), 625.0),
            (parse_naive("2025-07-28 00:02:00"), 640.0),
        ]
    );
    assert_eq!(normalized.series.bucket_width(), Some(Duration::seconds(60)));
    assert_eq!(normalized.stats.output, 3);
}

#[test]
fn bucketing_sorts_input_and_averages_secondary_fields_independently() {
    let records = vec![
        air("2025-07-28 00:01:30", 700.0).with_field("temp_c", 20.0),
        air("2025-07-28 00:00:59", 500.0),
        air("2025-07-28 00:01:00", 900.0).with_field("temp_c", 22.0),
        air("2025-07-28 00:00:00", 400.0).with_field("temp_c", 25.0),
    ];

    let normalized = normalize_bucketed(
        &records,
        "co2_ppm",
        Duration::seconds(60),
        &ReferenceClock::utc(),
    )
    .expect("normalize");

    let samples = normalized.series.samples();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].number("co2_ppm"), Some(450.0));
    assert_eq!(samples[0].number("temp_c"), Some(25.0));
    assert_eq!(samples[1].timestamp, parse_naive("2025-07-28 00:01:00"));
    assert_eq!(samples[1].number("co2_ppm"), Some(800.0));
    assert_eq!(samples[1].number("temp_c"), Some(21.0));
}

#[test]
fn empty_buckets_are_omitted() {
    let records = vec![
        air("2025-07-28 00:00:05", 500.0),
        air("2025-07-28 00:10:05", 510.0),
    ];
    let normalized = normalize_bucketed(
        &records,
        "co2_ppm",
        Duration::seconds(60),
        &ReferenceClock::utc(),
    )
    .expect("normalize");

    let times: Vec<NaiveDateTime> = normalized
        .series
        .samples()
        .iter()
        .map(|sample| sample.timestamp)
        .collect();
    assert_eq!(
        times,
        vec![
            parse_naive("2025-07-28 00:00:00"),
            parse_naive("2025-07-28 00:10:00")
        ]
    );
}

#[test]
fn droppable_records_are_counted() {
    let records = vec![
        air("2025-07-28T00:00:10Z", 600.0),
        air("yesterday-ish", 610.0),
        RawRecord::new("2025-07-28T00:00:20Z").with_field("temp_c", 24.0),
    ];

    let normalized = normalize_bucketed(
        &records,
        "co2_ppm",
        Duration::seconds(60),
        &ReferenceClock::utc(),
    )
    .expect("normalize");

    assert_eq!(normalized.stats.input, 3);
    assert_eq!(normalized.stats.unparsable_timestamps, 1);
    assert_eq!(normalized.stats.missing_primary, 1);
    assert_eq!(normalized.stats.output, 1);
}

#[test]
fn zero_width_is_rejected() {
    let records = vec![air("2025-07-28T00:00:10Z", 600.0)];
    assert!(normalize_bucketed(&records, "co2_ppm", Duration::zero(), &ReferenceClock::utc())
        .is_err());
}

#[test]
fn width_beyond_microsecond_range_is_an_error() {
    let records = vec![air("2025-07-28T00:00:10Z", 600.0)];
    let err = normalize_bucketed(&records, "co2_ppm", Duration::MAX, &ReferenceClock::utc())
        .expect_err("too wide");
    assert!(err.to_string().contains("does not fit in microseconds"));
}

#[test]
fn native_series_keeps_duplicates_and_drops_null_primary() {
    let beat = |ts: &str, bpm: f64, source: &str| {
        RawRecord::new(ts)
            .with_field("hr_bpm", bpm)
            .with_field("source", source)
    };
    let records = vec![
        beat("2025-07-27 17:02:00 -0700", 72.0, "b"),
        beat("2025-07-28T00:00:30Z", 70.0, "a"),
        beat("2025-07-28 00:02:00", 74.0, "c"),
        RawRecord::new("2025-07-28 00:03:00")
            .with_field("hr_bpm", biofuse_parser::FieldValue::Null),
    ];

    let normalized = normalize_native(&records, "hr_bpm", &ReferenceClock::utc());
    let samples = normalized.series.samples();

    assert_eq!(samples.len(), 3);
    assert_eq!(samples[0].timestamp, parse_naive("2025-07-28 00:00:30"));
    assert_eq!(samples[1].timestamp, parse_naive("2025-07-28 00:02:00"));
    assert_eq!(samples[2].timestamp, parse_naive("2025-07-28 00:02:00"));
    assert_eq!(
        samples[1].value("source").and_then(|v| v.as_text()),
        Some("b")
    );
    assert_eq!(normalized.series.bucket_width(), None);
    assert_eq!(normalized.stats.missing_primary, 1);
}
