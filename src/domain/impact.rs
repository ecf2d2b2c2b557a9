// ==========================================
// UBP 环境负荷计算系统 - 匹配与影响结果模型
// ==========================================
// 职责: MatchResult / ImpactRecord / AggregateReport
// 红线: 全部为值对象，构造后不再修改；聚合生成新值
// ==========================================

use crate::domain::component::ReferenceEntry;
use crate::domain::types::{GeometryType, PrecedenceLevel, UnitKind, UnmatchedReason};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// MatchResult - 单构件匹配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchResult {
    Matched(ResolvedMatch),
    Unmatched {
        material_code: String,
        reason: UnmatchedReason,
    },
}

/// 已解析的匹配（材料通道 + 可选涂层通道）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMatch {
    pub entry: ReferenceEntry,
    pub material_level: PrecedenceLevel,
    pub coating: Option<CoatingMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoatingMatch {
    pub entry: ReferenceEntry,
    pub level: PrecedenceLevel,
}

impl ResolvedMatch {
    /// 实际生效的最高优先级（涂层命中时为涂层级别）
    pub fn precedence(&self) -> PrecedenceLevel {
        match &self.coating {
            Some(c) => c.level.max(self.material_level),
            None => self.material_level,
        }
    }
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }

    pub fn precedence(&self) -> Option<PrecedenceLevel> {
        match self {
            MatchResult::Matched(m) => Some(m.precedence()),
            MatchResult::Unmatched { .. } => None,
        }
    }
}

// ==========================================
// RowWarning - 行级非致命告警
// ==========================================
// 收集到记录上，不中断批处理
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowWarning {
    /// 任何优先级均未匹配，影响计 0
    UnmatchedMaterial {
        material_code: String,
        reason: UnmatchedReason,
    },
    /// 已匹配但缺少所需计量（质量/面积），该部分影响计 0
    MissingQuantity {
        reference_key: String,
        unit_kind: UnitKind,
        coating: bool,
    },
    /// 件数无效（源值 < 1），影响计 0
    InvalidQuantity,
}

// ==========================================
// ImpactRecord - 单构件计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRecord {
    // ===== 构件标识（继承自 Component）=====
    pub position: String,
    pub row_number: usize,
    pub description: String,
    pub material_code: String,
    pub type_label: String,
    pub geometry: GeometryType,
    pub coating: Option<String>,
    pub quantity: u32,
    pub mass_kg: Option<f64>,
    pub area_m2: Option<f64>,

    // ===== 材料通道 =====
    pub reference_key: Option<String>,
    pub reference_description: Option<String>,
    pub precedence: Option<PrecedenceLevel>,
    pub unit_kind: Option<UnitKind>,
    pub unit_impact: Option<f64>,
    pub material_impact: f64,

    // ===== 涂层通道 =====
    pub coating_key: Option<String>,
    pub coating_description: Option<String>,
    pub coating_unit_impact: Option<f64>,
    pub coating_impact: f64,

    // ===== 合计 =====
    pub total_impact: f64,
    pub warnings: Vec<RowWarning>,
}

impl ImpactRecord {
    pub fn is_matched(&self) -> bool {
        self.reference_key.is_some()
    }

    /// 无告警、影响完整计入
    pub fn is_fully_computed(&self) -> bool {
        self.is_matched() && self.warnings.is_empty()
    }

    pub fn has_missing_quantity(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, RowWarning::MissingQuantity { .. }))
    }
}

// ==========================================
// GroupTotal - 分组汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub label: String,
    pub impact: f64,
    pub mass_kg: f64,
    pub area_m2: f64,
    pub count: usize,
}

// ==========================================
// AggregateReport - 汇总报告
// ==========================================
// 红线: 与记录顺序无关（同一多重集合 → 相同报告）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    // ===== 总量 =====
    pub total_impact: f64,
    pub total_material_impact: f64,
    pub total_coating_impact: f64,
    pub total_mass_kg: f64,
    pub total_area_m2: f64,

    // ===== 行统计 =====
    pub components_total: usize,
    pub components_matched: usize,
    pub computed_rows: usize,          // 无告警、完整计入
    pub flagged_rows: usize,           // 带告警（未匹配或缺量）
    pub missing_quantity_rows: usize,
    pub match_rate: f64,               // 0.0 ~ 1.0

    // ===== 分组 =====
    pub by_material: BTreeMap<String, GroupTotal>,
    pub by_geometry: BTreeMap<GeometryType, GroupTotal>,
    pub by_coating: BTreeMap<String, GroupTotal>,

    // ===== 待人工复核 =====
    pub unmatched_codes: BTreeSet<String>,
    pub unmatched_coatings: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, unit_kind: UnitKind) -> ReferenceEntry {
        ReferenceEntry {
            key: key.to_string(),
            description: key.to_string(),
            unit_kind,
            unit_impact: 1.0,
            production_impact: None,
            disposal_impact: None,
        }
    }

    #[test]
    fn test_precedence_reports_coating_when_matched() {
        let m = ResolvedMatch {
            entry: entry("06.012", UnitKind::Mass),
            material_level: PrecedenceLevel::GeometryOverride,
            coating: Some(CoatingMatch {
                entry: entry("09.001", UnitKind::Area),
                level: PrecedenceLevel::CoatingOverride,
            }),
        };
        assert_eq!(m.precedence(), PrecedenceLevel::CoatingOverride);

        let without = ResolvedMatch { coating: None, ..m };
        assert_eq!(without.precedence(), PrecedenceLevel::GeometryOverride);
    }

    #[test]
    fn test_unmatched_has_no_precedence() {
        let r = MatchResult::Unmatched {
            material_code: "X".to_string(),
            reason: UnmatchedReason::NoMapping,
        };
        assert!(!r.is_matched());
        assert_eq!(r.precedence(), None);
    }
}
