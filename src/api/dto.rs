// ==========================================
// UBP 环境负荷计算系统 - 报告 DTO 定义
// ==========================================
// 职责: 展示层（图表/表格/导出）消费的扁平结构
// ==========================================

use serde::{Deserialize, Serialize};

/// 汇总摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDto {
    pub total_impact: f64,
    pub total_material_impact: f64,
    pub total_coating_impact: f64,
    pub total_mass_kg: f64,
    pub total_area_m2: f64,

    pub components_total: usize,
    pub components_matched: usize,
    /// 完整计入的行数
    pub computed_rows: usize,
    /// 因告警影响不完整的行数（未匹配或缺量）
    pub flagged_rows: usize,
    pub missing_quantity_rows: usize,
    pub match_rate_pct: f64,

    /// 按影响降序
    pub by_material: Vec<GroupDto>,
    pub by_geometry: Vec<GroupDto>,
    pub by_coating: Vec<GroupDto>,

    pub unmatched_codes: Vec<String>,
    pub unmatched_coatings: Vec<String>,
}

/// 分组汇总行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDto {
    pub key: String,
    pub label: String,
    pub impact: f64,
    /// 占总影响百分比（总影响为 0 时为 0）
    pub share_pct: f64,
    pub mass_kg: f64,
    pub area_m2: f64,
    pub count: usize,
}

/// 帕累托条目（按构件影响降序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoEntryDto {
    pub rank: usize,
    pub position: String,
    pub row_number: usize,
    pub description: String,
    pub material_code: String,
    pub reference_key: Option<String>,
    pub total_impact: f64,
    pub share_pct: f64,
    pub cumulative_pct: f64,
}

/// 结果表导出行（CSV 一行一构件）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRowDto {
    pub position: String,
    pub row_number: usize,
    pub description: String,
    pub material_code: String,
    pub type_label: String,
    pub geometry: String,
    pub coating: Option<String>,
    pub quantity: u32,
    pub mass_kg: Option<f64>,
    pub area_m2: Option<f64>,
    pub reference_key: Option<String>,
    pub reference_description: Option<String>,
    pub precedence: Option<String>,
    pub unit: Option<String>,
    pub unit_impact: Option<f64>,
    pub material_impact: f64,
    pub coating_key: Option<String>,
    pub coating_unit_impact: Option<f64>,
    pub coating_impact: f64,
    pub total_impact: f64,
    /// 告警（`;` 分隔）
    pub warnings: String,
}

/// 规则表列表行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDto {
    pub level: String,
    pub material: Option<String>,
    pub qualifier: String,
    pub target_key: String,
    pub target_description: String,
    pub unit: String,
    pub unit_impact: f64,
}
