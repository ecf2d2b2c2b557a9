// ==========================================
// UBP 环境负荷计算系统 - 领域类型定义
// ==========================================
// 职责: 几何类型 / 计量单位 / 匹配优先级 / 未匹配原因
// 序列化格式: SCREAMING_SNAKE_CASE（与导出 JSON 一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 几何类型 (Geometry Type)
// ==========================================
// 红线: 只有 Profile / Sheet 参与类型覆写，其余只走基础材料默认规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeometryType {
    Profile, // 型材（挤压/线材）
    Sheet,   // 板材（薄板/折弯板）
    Plate,   // 厚板
    Other,   // 其它（紧固件、密封件等）
}

impl GeometryType {
    /// 是否允许类型覆写规则
    pub fn supports_override(&self) -> bool {
        matches!(self, GeometryType::Profile | GeometryType::Sheet)
    }

    /// 从配置键解析（不区分大小写）
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "profile" => Some(GeometryType::Profile),
            "sheet" => Some(GeometryType::Sheet),
            "plate" => Some(GeometryType::Plate),
            "other" => Some(GeometryType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryType::Profile => write!(f, "PROFILE"),
            GeometryType::Sheet => write!(f, "SHEET"),
            GeometryType::Plate => write!(f, "PLATE"),
            GeometryType::Other => write!(f, "OTHER"),
        }
    }
}

// ==========================================
// 计量单位 (Unit Kind)
// ==========================================
// 生态平衡数据库 "Bezug" 列: kg → Mass, m² → Area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitKind {
    Mass, // UBP / kg
    Area, // UBP / m²
}

impl UnitKind {
    /// 解析数据库单位文本，无法识别返回 None
    pub fn parse(unit: &str) -> Option<Self> {
        let normalized: String = unit
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        match normalized.as_str() {
            "kg" | "kilogramm" | "kilogram" => Some(UnitKind::Mass),
            "m2" | "m²" | "m^2" | "qm" => Some(UnitKind::Area),
            _ => None,
        }
    }

    /// 单位符号（用于展示）
    pub fn symbol(&self) -> &'static str {
        match self {
            UnitKind::Mass => "kg",
            UnitKind::Area => "m²",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Mass => write!(f, "MASS"),
            UnitKind::Area => write!(f, "AREA"),
        }
    }
}

// ==========================================
// 匹配优先级 (Precedence Level)
// ==========================================
// 顺序: KeywordFallback < BaseDefault < GeometryOverride < GenericCoating < CoatingOverride
// 红线: 同一优先级内最多一条规则生效，冲突在加载时报错
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrecedenceLevel {
    KeywordFallback,  // 无材料号时按类型/描述关键字兜底
    BaseDefault,      // 基础材料默认
    GeometryOverride, // 型材/板材类型覆写
    GenericCoating,   // 通用涂层（不限材料）
    CoatingOverride,  // 材料 + 涂层专用覆写
}

impl PrecedenceLevel {
    /// 是否属于涂层通道
    pub fn is_coating(&self) -> bool {
        matches!(
            self,
            PrecedenceLevel::GenericCoating | PrecedenceLevel::CoatingOverride
        )
    }
}

impl fmt::Display for PrecedenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecedenceLevel::KeywordFallback => write!(f, "KEYWORD_FALLBACK"),
            PrecedenceLevel::BaseDefault => write!(f, "BASE_DEFAULT"),
            PrecedenceLevel::GeometryOverride => write!(f, "GEOMETRY_OVERRIDE"),
            PrecedenceLevel::GenericCoating => write!(f, "GENERIC_COATING"),
            PrecedenceLevel::CoatingOverride => write!(f, "COATING_OVERRIDE"),
        }
    }
}

// ==========================================
// 未匹配原因 (Unmatched Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnmatchedReason {
    EmptyMaterial, // 材料号为空且无关键字兜底
    NoMapping,     // 任何优先级均无规则
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedReason::EmptyMaterial => write!(f, "EMPTY_MATERIAL"),
            UnmatchedReason::NoMapping => write!(f, "NO_MAPPING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        assert!(PrecedenceLevel::CoatingOverride > PrecedenceLevel::GenericCoating);
        assert!(PrecedenceLevel::GenericCoating > PrecedenceLevel::GeometryOverride);
        assert!(PrecedenceLevel::GeometryOverride > PrecedenceLevel::BaseDefault);
        assert!(PrecedenceLevel::BaseDefault > PrecedenceLevel::KeywordFallback);
    }

    #[test]
    fn test_unit_kind_parse() {
        assert_eq!(UnitKind::parse("kg"), Some(UnitKind::Mass));
        assert_eq!(UnitKind::parse(" KG "), Some(UnitKind::Mass));
        assert_eq!(UnitKind::parse("m2"), Some(UnitKind::Area));
        assert_eq!(UnitKind::parse("m²"), Some(UnitKind::Area));
        assert_eq!(UnitKind::parse("m3"), None);
        assert_eq!(UnitKind::parse("Stk"), None);
    }

    #[test]
    fn test_geometry_override_support() {
        assert!(GeometryType::Profile.supports_override());
        assert!(GeometryType::Sheet.supports_override());
        assert!(!GeometryType::Plate.supports_override());
        assert!(!GeometryType::Other.supports_override());
    }
}
