// ==========================================
// UBP 环境负荷计算系统 - 汇总器
// ==========================================
// 职责: ImpactRecord 序列 → AggregateReport
// 分组: 参考材料 / 几何类型 / 涂层条目
// 红线: 与记录顺序无关（排序后求和，浮点结果逐位一致）
// ==========================================

use crate::domain::{AggregateReport, GeometryType, GroupTotal, ImpactRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// 与输入顺序无关的求和
pub fn stable_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut values: Vec<f64> = values.into_iter().collect();
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

#[derive(Default)]
struct GroupAccumulator {
    label: String,
    impacts: Vec<f64>,
    masses: Vec<f64>,
    areas: Vec<f64>,
}

impl GroupAccumulator {
    fn add(&mut self, label: &str, impact: f64, record: &ImpactRecord) {
        // 标签取字典序最小者，保证与顺序无关
        if self.impacts.is_empty() || label < self.label.as_str() {
            self.label = label.to_string();
        }
        self.impacts.push(impact);
        self.masses.extend(record_mass(record));
        self.areas.extend(record_area(record));
    }

    fn finish(self) -> GroupTotal {
        GroupTotal {
            label: self.label,
            count: self.impacts.len(),
            impact: stable_sum(self.impacts),
            mass_kg: stable_sum(self.masses),
            area_m2: stable_sum(self.areas),
        }
    }
}

fn record_mass(record: &ImpactRecord) -> Option<f64> {
    record.mass_kg.map(|m| m * f64::from(record.quantity))
}

fn record_area(record: &ImpactRecord) -> Option<f64> {
    record.area_m2.map(|a| a * f64::from(record.quantity))
}

fn finish_groups<K: Ord>(groups: BTreeMap<K, GroupAccumulator>) -> BTreeMap<K, GroupTotal> {
    groups.into_iter().map(|(k, acc)| (k, acc.finish())).collect()
}

/// 汇总影响记录
pub fn aggregate(records: &[ImpactRecord]) -> AggregateReport {
    let mut by_material: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    let mut by_geometry: BTreeMap<GeometryType, GroupAccumulator> = BTreeMap::new();
    let mut by_coating: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    let mut unmatched_codes = BTreeSet::new();
    let mut unmatched_coatings = BTreeSet::new();

    for record in records {
        let Some(reference_key) = &record.reference_key else {
            let code = record.material_code.trim();
            if !code.is_empty() {
                unmatched_codes.insert(code.to_string());
            }
            continue;
        };

        let label = record.reference_description.as_deref().unwrap_or(reference_key);
        by_material
            .entry(reference_key.clone())
            .or_default()
            .add(label, record.total_impact, record);
        by_geometry
            .entry(record.geometry)
            .or_default()
            .add(&record.geometry.to_string(), record.total_impact, record);

        match (&record.coating_key, &record.coating) {
            (Some(coating_key), _) => {
                let label = record.coating_description.as_deref().unwrap_or(coating_key);
                by_coating
                    .entry(coating_key.clone())
                    .or_default()
                    .add(label, record.coating_impact, record);
            }
            (None, Some(coating)) if !coating.trim().is_empty() => {
                unmatched_coatings.insert(coating.trim().to_string());
            }
            _ => {}
        }
    }

    let components_total = records.len();
    let components_matched = records.iter().filter(|r| r.is_matched()).count();

    let report = AggregateReport {
        total_impact: stable_sum(records.iter().map(|r| r.total_impact)),
        total_material_impact: stable_sum(records.iter().map(|r| r.material_impact)),
        total_coating_impact: stable_sum(records.iter().map(|r| r.coating_impact)),
        total_mass_kg: stable_sum(records.iter().filter_map(record_mass)),
        total_area_m2: stable_sum(records.iter().filter_map(record_area)),
        components_total,
        components_matched,
        computed_rows: records.iter().filter(|r| r.is_fully_computed()).count(),
        flagged_rows: records.iter().filter(|r| !r.warnings.is_empty()).count(),
        missing_quantity_rows: records.iter().filter(|r| r.has_missing_quantity()).count(),
        match_rate: if components_total == 0 {
            0.0
        } else {
            components_matched as f64 / components_total as f64
        },
        by_material: finish_groups(by_material),
        by_geometry: finish_groups(by_geometry),
        by_coating: finish_groups(by_coating),
        unmatched_codes,
        unmatched_coatings,
    };

    info!(
        total_impact = report.total_impact,
        components = report.components_total,
        matched = report.components_matched,
        flagged = report.flagged_rows,
        "汇总完成"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PrecedenceLevel, RowWarning, UnitKind, UnmatchedReason};

    fn record(key: Option<&str>, geometry: GeometryType, impact: f64) -> ImpactRecord {
        ImpactRecord {
            position: "1".to_string(),
            row_number: 1,
            description: String::new(),
            material_code: "S235JR".to_string(),
            type_label: String::new(),
            geometry,
            coating: None,
            quantity: 2,
            mass_kg: Some(1.5),
            area_m2: None,
            reference_key: key.map(str::to_string),
            reference_description: key.map(|k| format!("Eintrag {}", k)),
            precedence: key.map(|_| PrecedenceLevel::BaseDefault),
            unit_kind: key.map(|_| UnitKind::Mass),
            unit_impact: key.map(|_| 1.0),
            material_impact: impact,
            coating_key: None,
            coating_description: None,
            coating_unit_impact: None,
            coating_impact: 0.0,
            total_impact: impact,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_stable_sum_is_order_independent() {
        let a = stable_sum(vec![1e16, 1.0, -1e16, 3.5]);
        let b = stable_sum(vec![3.5, -1e16, 1.0, 1e16]);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_groups_by_material_and_geometry() {
        let records = vec![
            record(Some("06.012"), GeometryType::Profile, 100.0),
            record(Some("06.012"), GeometryType::Sheet, 50.0),
            record(Some("06.020"), GeometryType::Sheet, 25.0),
        ];

        let report = aggregate(&records);
        assert_eq!(report.total_impact, 175.0);
        assert_eq!(report.by_material["06.012"].impact, 150.0);
        assert_eq!(report.by_material["06.012"].count, 2);
        assert_eq!(report.by_material["06.012"].mass_kg, 6.0);
        assert_eq!(report.by_geometry[&GeometryType::Sheet].impact, 75.0);
        assert_eq!(report.total_mass_kg, 9.0);
        assert_eq!(report.match_rate, 1.0);
    }

    #[test]
    fn test_unmatched_collected_and_counted() {
        let mut unmatched = record(None, GeometryType::Other, 0.0);
        unmatched.material_code = " UNKNOWN123 ".to_string();
        unmatched.warnings.push(RowWarning::UnmatchedMaterial {
            material_code: "UNKNOWN123".to_string(),
            reason: UnmatchedReason::NoMapping,
        });

        let mut uncoated = record(Some("06.012"), GeometryType::Profile, 10.0);
        uncoated.coating = Some("eloxiert".to_string());

        let report = aggregate(&[unmatched, uncoated]);
        assert!(report.unmatched_codes.contains("UNKNOWN123"));
        assert!(report.unmatched_coatings.contains("eloxiert"));
        assert_eq!(report.components_matched, 1);
        assert_eq!(report.flagged_rows, 1);
        assert_eq!(report.computed_rows, 1);
        assert_eq!(report.match_rate, 0.5);
        assert!(!report.by_geometry.contains_key(&GeometryType::Other));
    }

    #[test]
    fn test_coating_group_sums_coating_impact() {
        let mut r = record(Some("06.020"), GeometryType::Sheet, 150.0);
        r.coating = Some("Pulverbeschichtung".to_string());
        r.coating_key = Some("07.001".to_string());
        r.coating_description = Some("Pulverbeschichtung".to_string());
        r.coating_impact = 200.0;
        r.total_impact = 350.0;

        let report = aggregate(&[r]);
        assert_eq!(report.by_coating["07.001"].impact, 200.0);
        assert_eq!(report.total_coating_impact, 200.0);
        assert_eq!(report.total_material_impact, 150.0);
        assert_eq!(report.by_material["06.020"].impact, 350.0);
    }

    #[test]
    fn test_empty_input() {
        let report = aggregate(&[]);
        assert_eq!(report.total_impact, 0.0);
        assert_eq!(report.match_rate, 0.0);
        assert!(report.by_material.is_empty());
    }
}
