use kyrolabel::{
    process_labels, resolve_and_evaluate_sharded, AttributeRow, LabelError, LabelPipeline, LabelPriority,
    LabelRecord, LabelSource, LabelTable, PipelineConfig, RemovalAction, ResolutionReport, ShardConfig,
    ValidationError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kyrolabel=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn synthetic_table(len: usize) -> LabelTable {
    const CLASSES: [&str; 3] = ["dog", "cat", "bird"];
    (0..len)
        .map(|i| {
            let sensor = CLASSES[i % 3];
            let camera = if i % 2 == 0 { CLASSES[(i / 2) % 3] } else { "" };
            let manual = if i % 5 == 0 { CLASSES[(i / 5) % 3] } else { "" };
            LabelRecord::new(sensor).with_camera(camera).with_manual(manual)
        })
        .collect()
}

#[test]
fn camera_over_sensor_example() {
    init_tracing();
    let mut table: LabelTable = vec![LabelRecord::new("dog").with_camera("cat")].into_iter().collect();

    let processed = process_labels(&mut table).unwrap();

    assert_eq!(processed.labels, vec!["cat"]);
    assert_eq!(
        processed.matrix.row(0).unwrap(),
        AttributeRow {
            camera_indices: true,
            manual_indices: false,
            camera_sensor_match: false,
            manual_sensor_match: false,
            manual_camera_match: false,
        }
    );
    assert_eq!(processed.decisions.action(0), Some(RemovalAction::RemoveSensor));
    assert_eq!(table.get(0).unwrap(), LabelRecord::new("").with_camera("cat"));
}

#[test]
fn three_way_split_example() {
    init_tracing();
    let mut table: LabelTable = vec![LabelRecord::new("dog").with_camera("cat").with_manual("bird")]
        .into_iter()
        .collect();

    let processed = process_labels(&mut table).unwrap();

    assert_eq!(processed.labels, vec!["bird"]);
    assert!(processed.decisions.remove_both()[0]);
    assert_eq!(table.get(0).unwrap(), LabelRecord::new("").with_manual("bird"));
    assert_eq!(processed.report.removals.both_removed, 1);
    assert_eq!(processed.report.removals.cells_cleared, 2);
}

#[test]
fn agreeing_sources_example() {
    init_tracing();
    let mut table: LabelTable = vec![LabelRecord::new("dog").with_camera("dog")].into_iter().collect();
    let before = table.clone();

    let processed = process_labels(&mut table).unwrap();

    assert_eq!(processed.labels, vec!["dog"]);
    assert!(processed.matrix.camera_sensor_match()[0]);
    assert_eq!(processed.decisions.action(0), Some(RemovalAction::Keep));
    assert_eq!(table, before);
    assert_eq!(processed.report.removals.records_touched(), 0);
}

#[test]
fn json_ingestion_normalizes_missing_and_numeric_cells() {
    init_tracing();
    let json = r#"[
        {"sensorLabel": "dog", "cameraLabel": null, "manualLabel": null},
        {"sensorLabel": "dog", "cameraLabel": "cat"},
        {"sensorLabel": 3, "cameraLabel": 3, "manualLabel": 4}
    ]"#;
    let mut table = LabelTable::from_json(json).unwrap();
    assert_eq!(table.column(LabelSource::Camera), ["", "cat", "3"]);

    let processed = process_labels(&mut table).unwrap();
    assert_eq!(processed.labels, vec!["dog", "cat", "4"]);

    let out: serde_json::Value = serde_json::from_str(&table.to_json_pretty().unwrap()).unwrap();
    assert_eq!(
        out,
        serde_json::json!([
            {"sensorLabel": "dog", "cameraLabel": "", "manualLabel": ""},
            {"sensorLabel": "", "cameraLabel": "cat", "manualLabel": ""},
            {"sensorLabel": "", "cameraLabel": "", "manualLabel": "4"}
        ])
    );
}

#[test]
fn large_numeric_ids_are_not_merged() {
    init_tracing();
    let json = r#"[{"sensorLabel": 18446744073709551615, "cameraLabel": 18446744073709551614}]"#;
    let mut table = LabelTable::from_json(json).unwrap();
    assert_eq!(table.column(LabelSource::Sensor), ["18446744073709551615"]);
    assert_eq!(table.column(LabelSource::Camera), ["18446744073709551614"]);

    let processed = process_labels(&mut table).unwrap();
    assert!(!processed.matrix.camera_sensor_match()[0]);
    assert_eq!(processed.report.removals.sensor_removed, 1);
    assert_eq!(table.get(0).unwrap(), LabelRecord::new("").with_camera("18446744073709551614"));
}

#[test]
fn missing_sensor_label_fails_fast() {
    init_tracing();
    let err = LabelTable::from_json(r#"[{"sensorLabel": "dog"}, {"sensorLabel": null, "cameraLabel": "cat"}]"#)
        .unwrap_err();
    match err {
        LabelError::Validation(ValidationError::MissingField { field, row }) => {
            assert_eq!(field, "sensorLabel");
            assert_eq!(row, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn uncoercible_cell_fails_fast() {
    init_tracing();
    let err = LabelTable::from_json(r#"[{"sensorLabel": "dog", "manualLabel": {"label": "cat"}}]"#).unwrap_err();
    assert!(matches!(
        err,
        LabelError::Validation(ValidationError::TypeMismatch { row: 0, .. })
    ));
}

#[test]
fn sharded_pipeline_matches_inline_pipeline() {
    init_tracing();
    let original = synthetic_table(10_000);

    let mut inline_table = original.clone();
    let inline = process_labels(&mut inline_table).unwrap();

    let config = PipelineConfig {
        shards: ShardConfig {
            workers: 4,
            min_records_per_shard: 1_000,
        },
    };
    let pipeline = LabelPipeline::new(config).unwrap();
    let mut sharded_table = original.clone();
    let sharded = pipeline.run(&mut sharded_table).unwrap();

    assert_eq!(sharded.report.shards, 4);
    assert_eq!(inline.report.shards, 1);
    assert_eq!(sharded.labels, inline.labels);
    assert_eq!(sharded.matrix, inline.matrix);
    assert_eq!(sharded.decisions, inline.decisions);
    assert_eq!(sharded_table, inline_table);
    assert_eq!(sharded.report.removals, inline.report.removals);
    assert_eq!(sharded.report.input_fingerprint, inline.report.input_fingerprint);
    assert_ne!(sharded.report.run_id, inline.report.run_id);
}

#[test]
fn pipeline_config_from_json() {
    let config = PipelineConfig::from_json(r#"{"shards": {"workers": 2, "min_records_per_shard": 100}}"#).unwrap();
    let pipeline = LabelPipeline::new(config).unwrap();
    let mut table = synthetic_table(1_000);

    let processed = pipeline.run(&mut table).unwrap();
    assert_eq!(processed.report.shards, 2);
    assert_eq!(processed.labels.len(), 1_000);
}

#[test]
fn sharding_direct_call_matches_resolve() {
    let table = synthetic_table(2_048);
    let config = ShardConfig {
        workers: 3,
        min_records_per_shard: 256,
    };
    let (resolved, _) = resolve_and_evaluate_sharded(&table, &LabelPriority::default(), &config).unwrap();
    assert_eq!(resolved, kyrolabel::resolve(&table).unwrap());
}

#[test]
fn pipeline_output_is_stable_under_rerun() {
    init_tracing();
    let mut table = synthetic_table(500);
    process_labels(&mut table).unwrap();
    let once = table.clone();

    let second = process_labels(&mut table).unwrap();
    assert_eq!(table, once);
    assert_eq!(second.report.removals.cells_cleared, 0);
}

#[test]
fn report_serializes_for_audit() {
    let mut table = synthetic_table(30);
    let processed = process_labels(&mut table).unwrap();

    let json = serde_json::to_string(&processed.report).unwrap();
    let decoded: ResolutionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, processed.report);
    assert_eq!(decoded.input_fingerprint.len(), 64);
}
