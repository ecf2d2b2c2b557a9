// ==========================================
// 材料解析器集成测试
// ==========================================
// 覆盖: 优先级顺序、同义词、涂层通道、规则冲突
// ==========================================


use test_helpers::{fixture_database, fixture_rules, rules_from, ComponentBuilder};
use ubp_calculator::config::{ConfigError, MappingDocument};
use ubp_calculator::domain::{GeometryType, MatchResult, PrecedenceLevel, UnmatchedReason};
use ubp_calculator::engine::{resolve, RuleTable};

fn resolved_key(result: &MatchResult) -> Option<&str> {
    match result {
        MatchResult::Matched(m) => Some(m.entry.key.as_str()),
        MatchResult::Unmatched { .. } => None,
    }
}

#[test]
fn test_base_default_when_no_override_applies() {
    let rules = fixture_rules();

    for geometry in [GeometryType::Plate, GeometryType::Other] {
        let c = ComponentBuilder::new("S235JR").geometry(geometry).mass(1.0).build();
        let result = resolve(&c, &rules);
        assert_eq!(resolved_key(&result), Some("06.012"));
        assert_eq!(result.precedence(), Some(PrecedenceLevel::BaseDefault));
    }
}

#[test]
fn test_geometry_override_beats_base_default() {
    let rules = fixture_rules();

    let profile = ComponentBuilder::new("S235JR").geometry(GeometryType::Profile).build();
    let sheet = ComponentBuilder::new("S235JR").geometry(GeometryType::Sheet).build();

    assert_eq!(resolved_key(&resolve(&profile, &rules)), Some("06.013"));
    assert_eq!(resolved_key(&resolve(&sheet, &rules)), Some("06.014"));
    assert_eq!(
        resolve(&profile, &rules).precedence(),
        Some(PrecedenceLevel::GeometryOverride)
    );
}

#[test]
fn test_override_only_for_its_material() {
    // EN AW-6060 无几何覆写，型材也只走默认
    let rules = fixture_rules();
    let c = ComponentBuilder::new("EN AW-6060").geometry(GeometryType::Profile).build();
    let result = resolve(&c, &rules);
    assert_eq!(resolved_key(&result), Some("06.020"));
    assert_eq!(result.precedence(), Some(PrecedenceLevel::BaseDefault));
}

#[test]
fn test_synonyms_and_spelling_variants() {
    let rules = fixture_rules();

    for spelling in ["S235JR", "s235jr", "  S235JR\t", "St37-2", "ST37\u{2011}2", "S235"] {
        let c = ComponentBuilder::new(spelling).geometry(GeometryType::Other).build();
        assert_eq!(
            resolved_key(&resolve(&c, &rules)),
            Some("06.012"),
            "spelling {:?}",
            spelling
        );
    }

    let c = ComponentBuilder::new("en aw – 6060").build();
    assert_eq!(resolved_key(&resolve(&c, &rules)), Some("06.020"));
}

#[test]
fn test_coating_is_additive_and_reports_highest_level() {
    let rules = fixture_rules();
    let c = ComponentBuilder::new("S235JR")
        .geometry(GeometryType::Profile)
        .coating("feuerverzinkt")
        .build();

    match resolve(&c, &rules) {
        MatchResult::Matched(m) => {
            assert_eq!(m.entry.key, "06.013");
            assert_eq!(m.material_level, PrecedenceLevel::GeometryOverride);
            let coating = m.coating.as_ref().unwrap();
            assert_eq!(coating.entry.key, "07.002");
            assert_eq!(m.precedence(), PrecedenceLevel::CoatingOverride);
        }
        other => panic!("expected match, got {:?}", other),
    }
}

#[test]
fn test_material_coating_rule_not_applied_to_other_material() {
    // feuerverzinkt 仅为 S235JR 定义
    let rules = fixture_rules();
    let c = ComponentBuilder::new("EN AW-6060").coating("feuerverzinkt").build();

    match resolve(&c, &rules) {
        MatchResult::Matched(m) => {
            assert_eq!(m.entry.key, "06.020");
            assert!(m.coating.is_none());
        }
        other => panic!("expected match, got {:?}", other),
    }
}

#[test]
fn test_unmatched_is_not_fatal_and_carries_code() {
    let rules = fixture_rules();
    let c = ComponentBuilder::new(" UNKNOWN123 ").mass(8.0).build();
    assert_eq!(
        resolve(&c, &rules),
        MatchResult::Unmatched {
            material_code: "UNKNOWN123".to_string(),
            reason: UnmatchedReason::NoMapping,
        }
    );
}

#[test]
fn test_keyword_fallback_for_empty_material() {
    let rules = fixture_rules();

    let screw = ComponentBuilder::new("")
        .type_label("Schraube")
        .description("Sechskantschraube M12")
        .build();
    let result = resolve(&screw, &rules);
    assert_eq!(resolved_key(&result), Some("10.001"));
    assert_eq!(result.precedence(), Some(PrecedenceLevel::KeywordFallback));

    let seal = ComponentBuilder::new("").description("Dichtung").build();
    assert!(matches!(
        resolve(&seal, &rules),
        MatchResult::Unmatched { reason: UnmatchedReason::EmptyMaterial, .. }
    ));
}

#[test]
fn test_longest_coating_token_wins() {
    let rules = rules_from(
        r#"{
            "materials": {"S235JR": {"default": "06.012"}},
            "coatings": {"verzinkt": "07.001", "feuerverzinkt": "07.002"}
        }"#,
    );
    let c = ComponentBuilder::new("S235JR").coating("feuerverzinkt, gestrahlt").build();

    match resolve(&c, &rules) {
        MatchResult::Matched(m) => assert_eq!(m.coating.unwrap().entry.key, "07.002"),
        other => panic!("expected match, got {:?}", other),
    }
}

#[test]
fn test_same_level_conflict_is_configuration_error() {
    let doc = MappingDocument::from_json_str(
        r#"{"materials": {"S235JR": {"geometry": {"profile": "06.013", "Profile": "06.014"}}}}"#,
        "inline",
    )
    .unwrap();

    let err = RuleTable::build(&doc, &fixture_database()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::RuleConflict { level: PrecedenceLevel::GeometryOverride, .. }
    ));
}

#[test]
fn test_rules_at_different_levels_do_not_conflict() {
    // 同一材料的默认与覆写指向不同条目属于正常配置
    let rules = fixture_rules();
    assert!(rules.len() >= 6);
}
