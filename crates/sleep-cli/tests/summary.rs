use chrono::NaiveTime;
use sleep_cli::summary::{ReadReport, RecordSummary, stats_line, summary_table};
use sleep_core::{Collaborators, Dataset, ReadOptions, ReadStats, RecordReader};
use sleep_model::{Gender, SleepRecord, SleepStage, SubjectData};

fn record(id: &str, heartbeats: Vec<f64>) -> SleepRecord {
    SleepRecord {
        id: id.to_string(),
        sleep_stages: vec![SleepStage::Wake, SleepStage::N1, SleepStage::N2, SleepStage::N3],
        sleep_stage_duration: 30,
        recording_start_time: NaiveTime::from_hms_opt(22, 4, 5).unwrap(),
        heartbeat_times: heartbeats,
        subject_data: SubjectData::new()
            .with_gender(Some(Gender::Female))
            .with_age(Some(61)),
        activity_counts: None,
    }
}

#[test]
fn test_summary_reflects_record() {
    let summary = RecordSummary::from(&record("0001", vec![0.0, 1.0, 2.0]));
    assert_eq!(summary.id, "0001");
    assert_eq!(summary.epochs, 4);
    assert_eq!(summary.heartbeats, 3);
    assert_eq!(summary.mean_heart_rate, Some(60.0));
    assert_eq!(summary.gender, Some(Gender::Female));
    assert_eq!(summary.weight, None);
    assert_eq!(summary.activity_counts, None);
}

#[test]
fn test_table_lists_records_and_totals() {
    let rows = vec![
        RecordSummary::from(&record("0001", vec![0.0, 1.0, 2.0])),
        RecordSummary::from(&record("0002", vec![5.0])),
    ];
    let rendered = summary_table(&rows).to_string();
    assert!(rendered.contains("0001"));
    assert!(rendered.contains("0002"));
    assert!(rendered.contains("22:04:05"));
    assert!(rendered.contains("FEMALE"));
    assert!(rendered.contains("60.0"));
    assert!(rendered.contains("TOTAL"));
}

#[test]
fn test_stats_line_mentions_integrity_violations_only_when_present() {
    let clean = ReadStats {
        requested: 3,
        emitted: 2,
        skipped: 1,
        integrity_violations: 0,
    };
    assert_eq!(stats_line(&clean), "3 requested, 2 emitted, 1 skipped");

    let broken = ReadStats {
        integrity_violations: 1,
        ..clean
    };
    assert!(stats_line(&broken).ends_with("(1 without subject data)"));
}

#[test]
fn test_summary_serializes_to_json() {
    let summary = RecordSummary::from(&record("0001", Vec::new()));
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["id"], "0001");
    assert_eq!(value["start_time"], "22:04:05");
    assert!(value["mean_heart_rate"].is_null());
}

#[test]
fn test_empty_offline_read_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let options = ReadOptions::new(dir.path()).offline(true);
    let mut reader = RecordReader::new(Dataset::Mesa, &options, Collaborators::default()).unwrap();
    let records: Vec<RecordSummary> = reader.by_ref().map(|r| RecordSummary::from(&r)).collect();
    let report = ReadReport {
        dataset: Dataset::Mesa,
        db_dir: reader.db_dir().to_path_buf(),
        records,
        stats: reader.stats(),
    };
    assert!(report.records.is_empty());
    assert!(!report.has_integrity_violations());
    assert!(report.db_dir.ends_with("mesa"));
}
