// ==========================================
// UBP 环境负荷计算系统 - 报告 API
// ==========================================
// 职责: 流水线输出 → 摘要 / 帕累托 / 结果表 / JSON
// 红线: 只读转换，不重新计算影响值
// ==========================================

use crate::api::dto::{GroupDto, ParetoEntryDto, RecordRowDto, RuleDto, SummaryDto};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::{AggregateReport, GroupTotal, ImpactRecord, RowWarning};
use crate::engine::{PipelineOutput, RuleTable};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::info;

fn percent(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

fn warning_text(warning: &RowWarning) -> String {
    match warning {
        RowWarning::UnmatchedMaterial {
            material_code,
            reason,
        } => format!("UNMATCHED({}:{})", reason, material_code),
        RowWarning::MissingQuantity {
            reference_key,
            unit_kind,
            coating,
        } => {
            let lane = if *coating { "coating" } else { "material" };
            format!("MISSING_{}({}:{})", unit_kind, lane, reference_key)
        }
        RowWarning::InvalidQuantity => "INVALID_QUANTITY".to_string(),
    }
}

/// 分组行按影响降序，同值按键升序
fn group_rows<K: ToString>(groups: &BTreeMap<K, GroupTotal>, total: f64) -> Vec<GroupDto> {
    let mut rows: Vec<GroupDto> = groups
        .iter()
        .map(|(key, g)| GroupDto {
            key: key.to_string(),
            label: g.label.clone(),
            impact: g.impact,
            share_pct: percent(g.impact, total),
            mass_kg: g.mass_kg,
            area_m2: g.area_m2,
            count: g.count,
        })
        .collect();
    rows.sort_by(|a, b| b.impact.total_cmp(&a.impact).then_with(|| a.key.cmp(&b.key)));
    rows
}

/// 报告API
#[derive(Debug, Default)]
pub struct ReportApi;

impl ReportApi {
    pub fn new() -> Self {
        Self
    }

    /// 汇总摘要
    pub fn summary(&self, report: &AggregateReport) -> SummaryDto {
        let total = report.total_impact;

        SummaryDto {
            total_impact: report.total_impact,
            total_material_impact: report.total_material_impact,
            total_coating_impact: report.total_coating_impact,
            total_mass_kg: report.total_mass_kg,
            total_area_m2: report.total_area_m2,
            components_total: report.components_total,
            components_matched: report.components_matched,
            computed_rows: report.computed_rows,
            flagged_rows: report.flagged_rows,
            missing_quantity_rows: report.missing_quantity_rows,
            match_rate_pct: report.match_rate * 100.0,
            by_material: group_rows(&report.by_material, total),
            by_geometry: group_rows(&report.by_geometry, total),
            by_coating: group_rows(&report.by_coating, total),
            unmatched_codes: report.unmatched_codes.iter().cloned().collect(),
            unmatched_coatings: report.unmatched_coatings.iter().cloned().collect(),
        }
    }

    /// 帕累托列表
    ///
    /// # 参数
    /// - records: 影响记录
    /// - limit: 最多返回条数（None 返回全部）
    ///
    /// 仅包含影响大于 0 的构件
    pub fn pareto(&self, records: &[ImpactRecord], limit: Option<usize>) -> Vec<ParetoEntryDto> {
        let mut ranked: Vec<&ImpactRecord> =
            records.iter().filter(|r| r.total_impact > 0.0).collect();
        ranked.sort_by(|a, b| match b.total_impact.total_cmp(&a.total_impact) {
            Ordering::Equal => a.row_number.cmp(&b.row_number),
            other => other,
        });

        let total: f64 = crate::engine::stable_sum(ranked.iter().map(|r| r.total_impact));
        let mut cumulative = 0.0;
        ranked
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .enumerate()
            .map(|(idx, r)| {
                cumulative += r.total_impact;
                ParetoEntryDto {
                    rank: idx + 1,
                    position: r.position.clone(),
                    row_number: r.row_number,
                    description: r.description.clone(),
                    material_code: r.material_code.clone(),
                    reference_key: r.reference_key.clone(),
                    total_impact: r.total_impact,
                    share_pct: percent(r.total_impact, total),
                    cumulative_pct: percent(cumulative, total),
                }
            })
            .collect()
    }

    /// 结果表行（保持记录顺序）
    pub fn record_rows(&self, records: &[ImpactRecord]) -> Vec<RecordRowDto> {
        records
            .iter()
            .map(|r| RecordRowDto {
                position: r.position.clone(),
                row_number: r.row_number,
                description: r.description.clone(),
                material_code: r.material_code.clone(),
                type_label: r.type_label.clone(),
                geometry: r.geometry.to_string(),
                coating: r.coating.clone(),
                quantity: r.quantity,
                mass_kg: r.mass_kg,
                area_m2: r.area_m2,
                reference_key: r.reference_key.clone(),
                reference_description: r.reference_description.clone(),
                precedence: r.precedence.map(|p| p.to_string()),
                unit: r.unit_kind.map(|u| u.symbol().to_string()),
                unit_impact: r.unit_impact,
                material_impact: r.material_impact,
                coating_key: r.coating_key.clone(),
                coating_unit_impact: r.coating_unit_impact,
                coating_impact: r.coating_impact,
                total_impact: r.total_impact,
                warnings: r
                    .warnings
                    .iter()
                    .map(warning_text)
                    .collect::<Vec<_>>()
                    .join(";"),
            })
            .collect()
    }

    /// 导出结果表 CSV（带表头）
    pub fn write_records_csv<W: Write>(&self, records: &[ImpactRecord], writer: W) -> ApiResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in self.record_rows(records) {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        info!(rows = records.len(), "结果表导出完成");
        Ok(())
    }

    /// 完整输出 JSON（记录 + 汇总）
    pub fn to_json(&self, output: &PipelineOutput) -> ApiResult<String> {
        Ok(serde_json::to_string_pretty(output)?)
    }

    /// 规则表列表（优先级降序）
    pub fn rule_listing(&self, rules: &RuleTable) -> Vec<RuleDto> {
        rules
            .rules()
            .iter()
            .map(|rule| RuleDto {
                level: rule.level.to_string(),
                material: rule.material.clone(),
                qualifier: rule.qualifier.to_string(),
                target_key: rule.target.key.clone(),
                target_description: rule.target.description.clone(),
                unit: rule.target.unit_kind.symbol().to_string(),
                unit_impact: rule.target.unit_impact,
            })
            .collect()
    }

    /// 帕累托条数参数校验
    pub fn parse_limit(&self, raw: &str) -> ApiResult<Option<usize>> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        raw.parse::<usize>()
            .map(Some)
            .map_err(|_| ApiError::InvalidInput(format!("帕累托条数必须为正整数或 all: {}", raw)))
    }
}
