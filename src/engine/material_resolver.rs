// ==========================================
// UBP 环境负荷计算系统 - 材料解析器
// ==========================================
// 职责: 构件 → 参考条目（MatchResult）
// 材料通道: 几何覆写 > 基础默认 > 关键字回退（仅材料号为空时）
// 涂层通道: 材料涂层覆写 > 通用涂层（叠加，不替换材料条目）
// 红线: 纯函数，结果只取决于 (构件, 规则表)
// ==========================================

use crate::domain::{
    CoatingMatch, Component, GeometryType, MatchResult, PrecedenceLevel, ResolvedMatch,
    UnmatchedReason,
};
use crate::engine::rule_table::{normalize_token, MappingRule, RuleQualifier, RuleTable};
use tracing::{debug, info, warn};

const MATERIAL_LANE: [PrecedenceLevel; 2] = [
    PrecedenceLevel::GeometryOverride,
    PrecedenceLevel::BaseDefault,
];
const FALLBACK_LANE: [PrecedenceLevel; 1] = [PrecedenceLevel::KeywordFallback];
const COATING_LANE: [PrecedenceLevel; 2] = [
    PrecedenceLevel::CoatingOverride,
    PrecedenceLevel::GenericCoating,
];

/// 规则比对所需的规范化构件视图
struct Subject {
    material: String,
    geometry: GeometryType,
    coating: Option<String>,
    type_label: String,
    description: String,
}

impl Subject {
    fn new(component: &Component, rules: &RuleTable) -> Self {
        Self {
            material: rules.canonical_material(&component.material_code),
            geometry: component.geometry,
            coating: component
                .coating
                .as_deref()
                .map(normalize_token)
                .filter(|c| !c.is_empty()),
            type_label: normalize_token(&component.type_label),
            description: normalize_token(&component.description),
        }
    }
}

/// 匹配精度：(完全相等, 关键字长度)，越大越具体
type Specificity = (bool, usize);

fn token_specificity(haystack: &str, token: &str) -> Option<Specificity> {
    if haystack == token {
        Some((true, token.chars().count()))
    } else if haystack.contains(token) {
        Some((false, token.chars().count()))
    } else {
        None
    }
}

fn rule_specificity(rule: &MappingRule, subject: &Subject) -> Option<Specificity> {
    if let Some(material) = &rule.material {
        if *material != subject.material {
            return None;
        }
    }

    match &rule.qualifier {
        RuleQualifier::Any => Some((true, 0)),
        RuleQualifier::Geometry(g) => (*g == subject.geometry).then_some((true, 0)),
        RuleQualifier::Coating(token) => subject
            .coating
            .as_deref()
            .and_then(|c| token_specificity(c, token)),
        RuleQualifier::TypeKeyword(token) => token_specificity(&subject.type_label, token),
        RuleQualifier::DescriptionKeyword(token) => {
            token_specificity(&subject.description, token)
        }
    }
}

/// 按优先级依次求值，首个有命中的级别内取最具体的一条
fn first_match<'r>(
    rules: &'r RuleTable,
    levels: &[PrecedenceLevel],
    subject: &Subject,
) -> Option<&'r MappingRule> {
    levels.iter().find_map(|level| {
        rules
            .rules_at(*level)
            .filter_map(|rule| rule_specificity(rule, subject).map(|s| (s, rule)))
            .min_by(|(a, rule_a), (b, rule_b)| {
                b.cmp(a)
                    .then_with(|| rule_a.qualifier.cmp(&rule_b.qualifier))
            })
            .map(|(_, rule)| rule)
    })
}

/// 解析单个构件
pub fn resolve(component: &Component, rules: &RuleTable) -> MatchResult {
    let subject = Subject::new(component, rules);

    let material_lane: &[PrecedenceLevel] = if subject.material.is_empty() {
        &FALLBACK_LANE
    } else {
        &MATERIAL_LANE
    };

    let Some(material_rule) = first_match(rules, material_lane, &subject) else {
        let reason = if subject.material.is_empty() {
            UnmatchedReason::EmptyMaterial
        } else {
            UnmatchedReason::NoMapping
        };
        debug!(
            row_number = component.row_number,
            material_code = %component.material_code,
            reason = %reason,
            "构件未匹配"
        );
        return MatchResult::Unmatched {
            material_code: component.material_code.trim().to_string(),
            reason,
        };
    };

    let coating = if subject.coating.is_some() {
        first_match(rules, &COATING_LANE, &subject).map(|rule| CoatingMatch {
            entry: rule.target.clone(),
            level: rule.level,
        })
    } else {
        None
    };

    debug!(
        row_number = component.row_number,
        material_code = %subject.material,
        reference_key = %material_rule.target.key,
        level = %material_rule.level,
        coating_key = coating.as_ref().map(|c| c.entry.key.as_str()).unwrap_or(""),
        "构件匹配完成"
    );

    MatchResult::Matched(ResolvedMatch {
        entry: material_rule.target.clone(),
        material_level: material_rule.level,
        coating,
    })
}

// ==========================================
// MaterialResolver - 批量解析
// ==========================================
pub struct MaterialResolver<'a> {
    rules: &'a RuleTable,
}

impl<'a> MaterialResolver<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    pub fn resolve(&self, component: &Component) -> MatchResult {
        resolve(component, self.rules)
    }

    /// 批量解析（保持输入顺序）
    pub fn resolve_all(&self, components: &[Component]) -> Vec<MatchResult> {
        let results: Vec<MatchResult> = components.iter().map(|c| self.resolve(c)).collect();

        let unmatched = results.iter().filter(|r| !r.is_matched()).count();
        if unmatched > 0 {
            warn!(unmatched, total = results.len(), "存在未匹配构件，需人工复核");
        }
        info!(
            matched = results.len() - unmatched,
            total = results.len(),
            "材料解析完成"
        );
        results
    }
}
