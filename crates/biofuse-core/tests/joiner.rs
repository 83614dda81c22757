use biofuse_core::joiner::join_nearest;
use biofuse_core::types::{NormalizedSample, NormalizedSeries};
use chrono::{Duration, NaiveDate, NaiveDateTime};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 28).expect("date")
}

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    day().and_hms_opt(h, m, s).expect("time")
}

fn primary(times: &[NaiveDateTime]) -> NormalizedSeries {
    let samples = times
        .iter()
        .enumerate()
        .map(|(idx, ts)| NormalizedSample::new(*ts).with_value("co2_ppm", 600.0 + idx as f64))
        .collect();
    NormalizedSeries::from_samples(samples, Some(Duration::seconds(60))).expect("primary series")
}

fn beats(beats: &[(NaiveDateTime, f64)]) -> NormalizedSeries {
    let samples = beats
        .iter()
        .map(|(ts, bpm)| NormalizedSample::new(*ts).with_value("hr_bpm", *bpm))
        .collect();
    NormalizedSeries::from_samples(samples, None).expect("secondary series")
}

fn per_minute(count: u32) -> Vec<NaiveDateTime> {
    (0..count).map(|minute| at(0, minute, 0)).collect()
}

#[test]
fn tolerance_edge_is_inclusive() {
    let t = at(0, 1, 0);
    let tolerance = Duration::seconds(90);
    let left = primary(&[t]);

    let exact = beats(&[(t + tolerance, 70.0)]);
    let table = join_nearest(day(), &left, &exact, tolerance).expect("join");
    assert_eq!(table.rows[0].secondary_number("hr_bpm"), Some(70.0));
    assert_eq!(table.rows[0].matched_at, Some(t + tolerance));

    let beyond = beats(&[(t + tolerance + Duration::microseconds(1), 70.0)]);
    let table = join_nearest(day(), &left, &beyond, tolerance).expect("join");
    assert!(!table.rows[0].is_matched());

    let before = beats(&[(t - tolerance, 71.0)]);
    let table = join_nearest(day(), &left, &before, tolerance).expect("join");
    assert_eq!(table.rows[0].secondary_number("hr_bpm"), Some(71.0));

    let too_early = beats(&[(t - tolerance - Duration::microseconds(1), 71.0)]);
    let table = join_nearest(day(), &left, &too_early, tolerance).expect("join");
    assert!(!table.rows[0].is_matched());
}

#[test]
fn equidistant_candidates_resolve_to_the_earlier_one() {
    let left = primary(&[at(0, 1, 0)]);
    let right = beats(&[(at(0, 0, 30), 70.0), (at(0, 1, 30), 80.0)]);

    for _ in 0..3 {
        let table = join_nearest(day(), &left, &right, Duration::seconds(60)).expect("join");
        assert_eq!(table.rows[0].secondary_number("hr_bpm"), Some(70.0));
        assert_eq!(table.rows[0].matched_at, Some(at(0, 0, 30)));
    }
}

#[test]
fn duplicate_timestamps_pick_last_before_and_first_after() {
    let left = primary(&[at(0, 1, 0), at(0, 3, 0)]);
    let right = beats(&[
        (at(0, 0, 50), 70.0),
        (at(0, 0, 50), 75.0),
        (at(0, 3, 10), 80.0),
        (at(0, 3, 10), 85.0),
    ]);

    let table = join_nearest(day(), &left, &right, Duration::seconds(30)).expect("join");
    assert_eq!(table.rows[0].secondary_number("hr_bpm"), Some(75.0));
    assert_eq!(table.rows[1].secondary_number("hr_bpm"), Some(80.0));
}

#[test]
fn every_primary_row_survives() {
    let left = primary(&per_minute(1440));

    let empty = beats(&[]);
    let table = join_nearest(day(), &left, &empty, Duration::seconds(180)).expect("join");
    assert_eq!(table.len(), 1440);
    assert_eq!(table.matched_rows(), 0);

    let dense: Vec<(NaiveDateTime, f64)> = (0..20_000)
        .map(|idx| (at(0, 0, 0) + Duration::milliseconds(idx * 4_321), 60.0))
        .collect();
    let table = join_nearest(day(), &left, &beats(&dense), Duration::seconds(180)).expect("join");
    assert_eq!(table.len(), 1440);
    assert!(table
        .rows
        .iter()
        .zip(left.samples())
        .all(|(row, sample)| row.timestamp == sample.timestamp && row.primary == sample.values));
}

#[test]
fn single_beat_lands_on_the_closest_minute() {
    let left = primary(&per_minute(5));
    let right = beats(&[(at(0, 2, 5), 77.0)]);

    let table = join_nearest(day(), &left, &right, Duration::seconds(30)).expect("join");
    let matched: Vec<NaiveDateTime> = table
        .rows
        .iter()
        .filter(|row| row.is_matched())
        .map(|row| row.timestamp)
        .collect();
    assert_eq!(table.len(), 5);
    assert_eq!(matched, vec![at(0, 2, 0)]);
    assert!(table
        .rows
        .iter()
        .filter(|row| !row.is_matched())
        .all(|row| row.secondary.is_none() && row.matched_at.is_none()));

    // A 90 s window also reaches the neighbouring minutes (65 s and 55 s away).
    let table = join_nearest(day(), &left, &right, Duration::seconds(90)).expect("join");
    let matched: Vec<NaiveDateTime> = table
        .rows
        .iter()
        .filter(|row| row.is_matched())
        .map(|row| row.timestamp)
        .collect();
    assert_eq!(matched, vec![at(0, 1, 0), at(0, 2, 0), at(0, 3, 0)]);
}

#[test]
fn negative_tolerance_is_rejected() {
    let left = primary(&per_minute(2));
    let right = beats(&[(at(0, 0, 0), 60.0)]);
    assert!(join_nearest(day(), &left, &right, Duration::seconds(-1)).is_err());
}

#[test]
fn tolerance_beyond_microsecond_range_is_an_error() {
    let left = primary(&per_minute(2));
    let right = beats(&[(at(0, 0, 0), 60.0)]);
    let err = join_nearest(day(), &left, &right, Duration::MAX).expect_err("too wide");
    assert!(err.to_string().contains("does not fit in microseconds"));
}

#[test]
fn out_of_order_series_cannot_be_built() {
    let samples = vec![
        NormalizedSample::new(at(0, 1, 0)),
        NormalizedSample::new(at(0, 0, 0)),
    ];
    assert!(NormalizedSeries::from_samples(samples, None).is_err());
}
