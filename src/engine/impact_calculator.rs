// ==========================================
// UBP 环境负荷计算系统 - 影响计算器
// ==========================================
// 公式: 影响 = 单件计量（kg 或 m²，由参考条目单位决定）× UBP/单位 × 件数
// 涂层: 按涂层条目单位单独计算，叠加到合计
// 红线: 单行缺量 / 件数无效不终止批处理，计 0 并记录告警
// ==========================================

use crate::domain::{
    Component, ImpactRecord, MatchResult, ReferenceEntry, ResolvedMatch, RowWarning,
};
use tracing::{info, warn};

/// 单通道计算结果：(影响, 缺量告警)
fn lane_impact(
    component: &Component,
    entry: &ReferenceEntry,
    coating: bool,
) -> (f64, Option<RowWarning>) {
    match component.measure(entry.unit_kind) {
        Some(measure) => (
            measure * entry.unit_impact * f64::from(component.quantity),
            None,
        ),
        None => {
            warn!(
                row_number = component.row_number,
                reference_key = %entry.key,
                unit = entry.unit_kind.symbol(),
                coating,
                "缺少计量值，影响计 0"
            );
            (
                0.0,
                Some(RowWarning::MissingQuantity {
                    reference_key: entry.key.clone(),
                    unit_kind: entry.unit_kind,
                    coating,
                }),
            )
        }
    }
}

fn base_record(component: &Component) -> ImpactRecord {
    ImpactRecord {
        position: component.position.clone(),
        row_number: component.row_number,
        description: component.description.clone(),
        material_code: component.material_code.clone(),
        type_label: component.type_label.clone(),
        geometry: component.geometry,
        coating: component.coating.clone(),
        quantity: component.quantity,
        mass_kg: component.mass_kg,
        area_m2: component.area_m2,
        reference_key: None,
        reference_description: None,
        precedence: None,
        unit_kind: None,
        unit_impact: None,
        material_impact: 0.0,
        coating_key: None,
        coating_description: None,
        coating_unit_impact: None,
        coating_impact: 0.0,
        total_impact: 0.0,
        warnings: Vec::new(),
    }
}

fn matched_record(component: &Component, resolved: &ResolvedMatch) -> ImpactRecord {
    let mut warnings = Vec::new();

    let (material_impact, missing) = lane_impact(component, &resolved.entry, false);
    warnings.extend(missing);

    let (coating_impact, coating_key, coating_description, coating_unit_impact) =
        match &resolved.coating {
            Some(coating) => {
                let (impact, missing) = lane_impact(component, &coating.entry, true);
                warnings.extend(missing);
                (
                    impact,
                    Some(coating.entry.key.clone()),
                    Some(coating.entry.description.clone()),
                    Some(coating.entry.unit_impact),
                )
            }
            None => (0.0, None, None, None),
        };

    ImpactRecord {
        reference_key: Some(resolved.entry.key.clone()),
        reference_description: Some(resolved.entry.description.clone()),
        precedence: Some(resolved.precedence()),
        unit_kind: Some(resolved.entry.unit_kind),
        unit_impact: Some(resolved.entry.unit_impact),
        material_impact,
        coating_key,
        coating_description,
        coating_unit_impact,
        coating_impact,
        total_impact: material_impact + coating_impact,
        warnings,
        ..base_record(component)
    }
}

/// 计算单个构件的影响记录
pub fn compute(component: &Component, result: &MatchResult) -> ImpactRecord {
    let mut record = compute_lanes(component, result);
    if !component.has_valid_quantity() {
        warn!(row_number = component.row_number, "件数无效，影响计 0");
        record.warnings.insert(0, RowWarning::InvalidQuantity);
    }
    record
}

fn compute_lanes(component: &Component, result: &MatchResult) -> ImpactRecord {
    match result {
        MatchResult::Matched(resolved) => matched_record(component, resolved),
        MatchResult::Unmatched {
            material_code,
            reason,
        } => ImpactRecord {
            warnings: vec![RowWarning::UnmatchedMaterial {
                material_code: material_code.clone(),
                reason: *reason,
            }],
            ..base_record(component)
        },
    }
}

// ==========================================
// ImpactCalculator - 影响计算引擎
// ==========================================
// 红线: 无状态引擎，所有方法都是纯函数
#[derive(Debug, Default)]
pub struct ImpactCalculator;

impl ImpactCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, component: &Component, result: &MatchResult) -> ImpactRecord {
        compute(component, result)
    }

    /// 批量计算（构件与匹配结果一一对应，保持顺序）
    pub fn compute_all(&self, components: &[Component], results: &[MatchResult]) -> Vec<ImpactRecord> {
        let records: Vec<ImpactRecord> = components
            .iter()
            .zip(results)
            .map(|(component, result)| compute(component, result))
            .collect();

        info!(
            records = records.len(),
            flagged = records.iter().filter(|r| !r.warnings.is_empty()).count(),
            "影响计算完成"
        );
        records
    }
}
