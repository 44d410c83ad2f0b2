//! Tests for sleep-model types.

use chrono::NaiveTime;
use sleep_model::{Gender, SleepRecord, SleepStage, SubjectData};

fn record(heartbeats: Vec<f64>) -> SleepRecord {
    SleepRecord {
        id: "mesa-sleep-0001".to_string(),
        sleep_stages: vec![SleepStage::Wake, SleepStage::N1, SleepStage::N2],
        sleep_stage_duration: 30,
        recording_start_time: NaiveTime::from_hms_opt(21, 23, 31).unwrap(),
        heartbeat_times: heartbeats,
        subject_data: SubjectData::new()
            .with_gender(Some(Gender::Female))
            .with_age(Some(61)),
        activity_counts: None,
    }
}

#[test]
fn test_mean_heart_rate_from_beats() {
    // 61 beats spanning 60 seconds -> 60 bpm
    let beats: Vec<f64> = (0..61).map(f64::from).collect();
    let rate = record(beats).mean_heart_rate().unwrap();
    assert!((rate - 60.0).abs() < 1e-9);
}

#[test]
fn test_mean_heart_rate_needs_two_beats() {
    assert_eq!(record(vec![]).mean_heart_rate(), None);
    assert_eq!(record(vec![3.0]).mean_heart_rate(), None);
}

#[test]
fn test_stage_ordinals_follow_encoding() {
    assert_eq!(record(vec![]).stage_ordinals(), vec![5, 3, 2]);
}

#[test]
fn test_subject_data_absence_is_not_zero() {
    let subject = SubjectData::new().with_weight(None);
    assert!(subject.is_empty());
    assert_ne!(subject.weight, Some(0.0));
}

#[test]
fn test_record_serializes() {
    let original = record(vec![0.5, 1.25]);
    let json = serde_json::to_string(&original).expect("serialize record");
    assert!(json.contains("\"recording_start_time\":\"21:23:31\""));
    let round: SleepRecord = serde_json::from_str(&json).expect("deserialize record");
    assert_eq!(round, original);
}
