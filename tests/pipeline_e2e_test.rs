// ==========================================
// 计算流水线端到端测试
// ==========================================
// 流程: CSV 参考库 + JSON 映射 + CSV 物料清单 → 记录 + 汇总 → 导出
// ==========================================


use test_helpers::{config_for, temp_file, FixtureFiles, FIXTURE_DATABASE_CSV};
use ubp_calculator::api::ReportApi;
use ubp_calculator::config::ConfigError;
use ubp_calculator::domain::{GeometryType, PrecedenceLevel, RowWarning, UnitKind, UnmatchedReason};
use ubp_calculator::engine::{ImpactPipeline, PipelineError};
use ubp_calculator::importer::ImportError;
use ubp_calculator::logging;

#[test]
fn test_full_run_from_csv_files() {
    logging::init_test();
    let files = FixtureFiles::new();
    let pipeline = ImpactPipeline::from_config(files.config()).unwrap();

    assert_eq!(pipeline.database().len(), 7);

    let output = pipeline.run_file(files.bom.path()).unwrap();
    let records = &output.records;
    let report = &output.report;

    // 汇总行被跳过，源顺序保留
    let positions: Vec<&str> = records.iter().map(|r| r.position.as_str()).collect();
    assert_eq!(positions, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(records[0].row_number, 4);

    assert_eq!(records[0].geometry, GeometryType::Profile);
    assert_eq!(records[0].total_impact, 400.0);
    assert_eq!(records[1].total_impact, 350.0);
    assert_eq!(records[1].precedence, Some(PrecedenceLevel::GenericCoating));
    assert_eq!(records[2].total_impact, 0.0);
    assert_eq!(records[3].geometry, GeometryType::Plate);
    assert_eq!(records[3].total_impact, 0.0);
    assert!(records[3].warnings.is_empty());

    // 螺栓：质量由 Ges.gew. / Anzahl 推导，关键字回退
    assert_eq!(records[4].quantity, 4);
    assert_eq!(records[4].precedence, Some(PrecedenceLevel::KeywordFallback));
    assert!((records[4].total_impact - 2.0).abs() < 1e-9);

    assert!((report.total_impact - 752.0).abs() < 1e-9);
    assert_eq!(report.components_total, 5);
    assert_eq!(report.components_matched, 4);
    assert_eq!(report.flagged_rows, 1);
    assert_eq!(report.unmatched_codes.iter().collect::<Vec<_>>(), vec!["UNKNOWN123"]);
    assert_eq!(report.by_coating["07.001"].impact, 200.0);
    assert_eq!(report.by_geometry[&GeometryType::Sheet].impact, 350.0);
}

#[test]
fn test_run_is_idempotent() {
    let files = FixtureFiles::new();
    let pipeline = ImpactPipeline::from_config(files.config()).unwrap();
    let api = ReportApi::new();

    let first = pipeline.run_file(files.bom.path()).unwrap();
    let second = pipeline.run_file(files.bom.path()).unwrap();
    assert_eq!(first, second);
    assert_eq!(api.to_json(&first).unwrap(), api.to_json(&second).unwrap());

    let rebuilt = ImpactPipeline::from_config(files.config()).unwrap();
    assert_eq!(rebuilt.run_file(files.bom.path()).unwrap(), first);
}

#[test]
fn test_exports() {
    let files = FixtureFiles::new();
    let pipeline = ImpactPipeline::from_config(files.config()).unwrap();
    let output = pipeline.run_file(files.bom.path()).unwrap();
    let api = ReportApi::new();

    let mut buffer = Vec::new();
    api.write_records_csv(&output.records, &mut buffer).unwrap();
    let csv_text = String::from_utf8(buffer).unwrap();
    assert_eq!(csv_text.lines().count(), 6);
    assert!(csv_text.contains("UNMATCHED(NO_MAPPING:UNKNOWN123)"));

    let summary = api.summary(&output.report);
    assert_eq!(summary.by_material[0].key, "06.013");
    assert_eq!(summary.match_rate_pct, 80.0);

    let pareto = api.pareto(&output.records, Some(2));
    assert_eq!(pareto.len(), 2);
    assert_eq!(pareto[0].position, "1");

    let json: serde_json::Value = serde_json::from_str(&api.to_json(&output).unwrap()).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 5);
    assert_eq!(json["records"][2]["warnings"][0]["kind"], "UNMATCHED_MATERIAL");
    assert_eq!(
        json["records"][2]["warnings"][0]["reason"],
        UnmatchedReason::NoMapping.to_string()
    );
}

#[test]
fn test_wrong_header_row_is_fatal() {
    let files = FixtureFiles::new();
    let mut config = files.config();
    config.bom_layout.header_row = 1;

    let pipeline = ImpactPipeline::from_config(config).unwrap();
    let err = pipeline.run_file(files.bom.path()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Import(ImportError::MissingColumn { .. })
    ));
}

#[test]
fn test_missing_required_column_is_fatal() {
    let files = FixtureFiles::new();
    let bom = temp_file(
        ".csv",
        "x;y\n;\nPos.;Anzahl;Bezeichnung;Typ;Gew. (kg)\n1;1;Stütze;Profil;10\n",
    );

    let pipeline = ImpactPipeline::from_config(files.config()).unwrap();
    match pipeline.run_file(bom.path()).unwrap_err() {
        PipelineError::Import(ImportError::MissingColumn { column, .. }) => {
            assert_eq!(column, "Material");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_conflicting_mapping_aborts_before_run() {
    let database = temp_file(".csv", FIXTURE_DATABASE_CSV);
    let mapping = temp_file(
        ".json",
        r#"{"coatings": {"verzinkt": "07.001", " Verzinkt ": "07.002"}}"#,
    );

    let err = ImpactPipeline::from_config(config_for(database.path(), mapping.path()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::RuleConflict { .. })
    ));
}

#[test]
fn test_unknown_rule_target_aborts() {
    let database = temp_file(".csv", FIXTURE_DATABASE_CSV);
    let mapping = temp_file(".json", r#"{"materials": {"S355": {"default": "06.999"}}}"#);

    let err = ImpactPipeline::from_config(config_for(database.path(), mapping.path()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::UnknownReference { .. })
    ));
}

#[test]
fn test_missing_database_file() {
    let files = FixtureFiles::new();
    let mut config = files.config();
    config.database_file = "does_not_exist.csv".into();

    let err = ImpactPipeline::from_config(config).err().unwrap();
    assert!(matches!(
        err,
        PipelineError::Import(ImportError::FileNotFound(_))
    ));
}

#[test]
fn test_units_and_invalid_counts_are_never_silent() {
    let files = FixtureFiles::new();
    let bom = temp_file(
        ".csv",
        "\
Projekt;25-009;;;;;;;
;;;;;;;;
Pos.;Anzahl;Bezeichnung;Material;Typ;Beschichtung;Fl. (m²);Gew. (kg);Ges.gew.
1;1;Stütze;S235JR;U - Profile;;;500 g;
2;1;Abdeckung;EN AW-6060;Bleche;Pulverbeschichtung;1500 mm;5;
3;0;Blech;S235JR;Bleche;;;3;
",
    );

    let pipeline = ImpactPipeline::from_config(files.config()).unwrap();
    let output = pipeline.run_file(bom.path()).unwrap();
    let records = &output.records;

    // 500 g → 0,5 kg × 40 UBP/kg
    assert_eq!(records[0].mass_kg, Some(0.5));
    assert_eq!(records[0].total_impact, 20.0);

    // 长度不是面积：涂层缺量，材料部分照常计入
    assert_eq!(records[1].area_m2, None);
    assert_eq!(records[1].total_impact, 150.0);
    assert_eq!(
        records[1].warnings,
        vec![RowWarning::MissingQuantity {
            reference_key: "07.001".to_string(),
            unit_kind: UnitKind::Area,
            coating: true,
        }]
    );

    // 件数 0：保留并标记
    assert_eq!(records[2].position, "3");
    assert_eq!(records[2].warnings, vec![RowWarning::InvalidQuantity]);

    let report = &output.report;
    assert_eq!(report.total_impact, 170.0);
    assert_eq!(report.components_total, 3);
    assert_eq!(report.computed_rows, 1);
    assert_eq!(report.flagged_rows, 2);
    assert_eq!(report.missing_quantity_rows, 1);
}

#[test]
fn test_synonym_chain_aborts_before_run() {
    let database = temp_file(".csv", FIXTURE_DATABASE_CSV);
    let mapping = temp_file(
        ".json",
        r#"{
            "synonyms": {"ST37-2": "S235JR", "S235JR": "S235JR+AR"},
            "materials": {"S235JR": {"default": "06.012"}}
        }"#,
    );

    let err = ImpactPipeline::from_config(config_for(database.path(), mapping.path()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::SynonymChain { .. })
    ));
}

#[test]
fn test_coating_rule_with_mass_target_aborts() {
    let database = temp_file(".csv", FIXTURE_DATABASE_CSV);
    let mapping = temp_file(".json", r#"{"coatings": {"verzinkt": "06.012"}}"#);

    let err = ImpactPipeline::from_config(config_for(database.path(), mapping.path()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::CoatingUnitMismatch { .. })
    ));
}
