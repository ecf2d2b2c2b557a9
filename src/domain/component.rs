// ==========================================
// UBP 环境负荷计算系统 - 构件与参考数据模型
// ==========================================
// 职责: 物料清单行 (Component) / 生态平衡数据库行 (ReferenceEntry)
// 红线: 导入层创建后不可变，引擎层只读
// ==========================================

use crate::domain::types::{GeometryType, UnitKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

// ==========================================
// Component - 物料清单构件
// ==========================================
// 来源: CAD 导出 "Mengenliste" 一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    // ===== 标识 =====
    pub position: String,    // 位置号（Pos.）
    pub row_number: usize,   // 源表格行号（1 起始，用于回溯）

    // ===== 描述 =====
    pub description: String, // 名称（Bezeichnung）
    pub type_label: String,  // 原始类型文本（Typ）
    pub geometry: GeometryType,

    // ===== 材料 =====
    pub material_code: String,   // 源系统材料号（已 TRIM）
    pub coating: Option<String>, // 涂层描述（Beschichtung）

    // ===== 数量 =====
    pub quantity: u32,          // 件数（≥1；0 表示源值无效，计算时标记）
    pub mass_kg: Option<f64>,   // 单件质量（kg，≥0）
    pub area_m2: Option<f64>,   // 单件表面积（m²，≥0）
}

impl Component {
    pub fn has_valid_quantity(&self) -> bool {
        self.quantity >= 1
    }

    /// 总质量（单件质量 × 件数）
    pub fn total_mass_kg(&self) -> Option<f64> {
        self.mass_kg.map(|m| m * f64::from(self.quantity))
    }

    /// 总表面积（单件面积 × 件数）
    pub fn total_area_m2(&self) -> Option<f64> {
        self.area_m2.map(|a| a * f64::from(self.quantity))
    }

    /// 按计量单位取对应的单件量
    pub fn measure(&self, unit_kind: UnitKind) -> Option<f64> {
        match unit_kind {
            UnitKind::Mass => self.mass_kg,
            UnitKind::Area => self.area_m2,
        }
    }
}

// ==========================================
// ReferenceEntry - 生态平衡数据库条目
// ==========================================
// 来源: KBOB "Baumaterialien Matériaux" 一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub key: String,              // 规范材料键（ID-Nummer，如 "06.012"）
    pub description: String,      // 材料名称
    pub unit_kind: UnitKind,      // 计量单位
    pub unit_impact: f64,         // UBP / 单位（Total）
    pub production_impact: Option<f64>, // UBP / 单位（Herstellung）
    pub disposal_impact: Option<f64>,   // UBP / 单位（Entsorgung）
}

// ==========================================
// ReferenceDatabase - 只读参考库
// ==========================================
// 生命周期: 启动时加载一次，运行期只读
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferenceDatabase {
    entries: BTreeMap<String, ReferenceEntry>,
}

impl ReferenceDatabase {
    /// 从条目列表构建
    ///
    /// 键重复时保留首行，后续行记录警告
    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries {
            if map.contains_key(&entry.key) {
                warn!(key = %entry.key, "参考库键重复，保留首行");
                continue;
            }
            map.insert(entry.key.clone(), entry);
        }
        Self { entries: map }
    }

    pub fn get(&self, key: &str) -> Option<&ReferenceEntry> {
        self.entries.get(key.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.entries.values()
    }
}
