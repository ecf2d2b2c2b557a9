// ==========================================
// UBP 环境负荷计算系统 - 配置管理器
// ==========================================
// 职责: 运行配置加载、覆写、快照
// 层级: 内置默认值 < JSON 配置文件 < 环境变量
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ==========================================
// SheetLayout - 表格布局
// ==========================================
/// 工作表名 + 表头行号（1 起始）
///
/// CSV 输入忽略 `sheet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub sheet: Option<String>,
    pub header_row: usize,
}

impl SheetLayout {
    pub fn new(sheet: Option<&str>, header_row: usize) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            header_row,
        }
    }

    /// 物料清单默认布局
    pub fn bill_of_materials() -> Self {
        Self::new(Some("Mengenliste"), 8)
    }

    /// 参考数据库默认布局
    pub fn reference_database() -> Self {
        Self::new(Some("Baumaterialien Matériaux"), 9)
    }
}

// ==========================================
// GeometryKeywords - 几何分类关键字
// ==========================================
/// 构件类型文本 → 几何类别，子串匹配（忽略大小写）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryKeywords {
    pub sheet: Vec<String>,
    pub plate: Vec<String>,
    pub profile: Vec<String>,
}

impl Default for GeometryKeywords {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect();
        Self {
            sheet: words(&["blech", "sheet"]),
            plate: words(&["platte", "plate"]),
            profile: words(&[
                "profil",
                "rohr",
                "flachstahl",
                "winkel",
                "träger",
                "stab",
                "tube",
                "beam",
            ]),
        }
    }
}

// ==========================================
// AppConfig - 运行配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 参考数据库文件（KBOB 表）
    pub database_file: PathBuf,
    /// 映射规则文件（JSON）
    pub mapping_file: PathBuf,
    pub bom_layout: SheetLayout,
    pub database_layout: SheetLayout,
    /// CSV 分隔符（None 自动识别）
    pub csv_delimiter: Option<char>,
    pub geometry_keywords: GeometryKeywords,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_file: PathBuf::from(
                "Oekobilanzdaten_ Baubereich_Donne_ecobilans_construction_2009-1-2022_v7.0.xlsx",
            ),
            mapping_file: PathBuf::from("data/material_map.json"),
            bom_layout: SheetLayout::bill_of_materials(),
            database_layout: SheetLayout::reference_database(),
            csv_delimiter: None,
            geometry_keywords: GeometryKeywords::default(),
        }
    }
}

impl AppConfig {
    /// CSV 分隔符字节（已校验为 ASCII）
    pub fn csv_delimiter_byte(&self) -> Option<u8> {
        self.csv_delimiter
            .filter(char::is_ascii)
            .map(|c| c as u8)
    }

    /// 配置快照（JSON），随报告一并输出
    pub fn snapshot(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn validate(&self) -> ConfigResult<()> {
        for (key, layout) in [
            (config_keys::BOM_HEADER_ROW, &self.bom_layout),
            (config_keys::DATABASE_HEADER_ROW, &self.database_layout),
        ] {
            if layout.header_row == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: "0".to_string(),
                    message: "表头行号从 1 开始".to_string(),
                });
            }
        }

        if let Some(c) = self.csv_delimiter {
            if !c.is_ascii() {
                return Err(ConfigError::InvalidValue {
                    key: config_keys::CSV_DELIMITER.to_string(),
                    value: c.to_string(),
                    message: "分隔符必须为 ASCII 字符".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ==========================================
// ConfigManager - 配置加载
// ==========================================
pub struct ConfigManager;

impl ConfigManager {
    /// 加载运行配置
    ///
    /// # 参数
    /// - path: 可选 JSON 配置文件；None 时仅使用默认值 + 环境变量
    ///
    /// # 返回
    /// - Ok(AppConfig): 已校验的配置
    /// - Err: 文件读取/解析失败，或覆写值非法
    pub fn load(path: Option<&Path>) -> ConfigResult<AppConfig> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => AppConfig::default(),
        };
        let config = Self::apply_overrides(base, |key| std::env::var(key).ok())?;
        info!(
            database = %config.database_file.display(),
            mapping = %config.mapping_file.display(),
            "运行配置加载完成"
        );
        Ok(config)
    }

    /// 从 JSON 文件读取（缺省字段取默认值）
    pub fn from_file(path: &Path) -> ConfigResult<AppConfig> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// 应用覆写
    ///
    /// `lookup` 按键名返回覆写值（生产环境为环境变量）
    pub fn apply_overrides<F>(mut config: AppConfig, lookup: F) -> ConfigResult<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(config_keys::DATABASE_FILE)
            .or_else(|| non_empty(config_keys::LEGACY_DATABASE_FILE))
        {
            config.database_file = PathBuf::from(v.trim());
        }
        if let Some(v) = non_empty(config_keys::MAPPING_FILE) {
            config.mapping_file = PathBuf::from(v.trim());
        }
        if let Some(v) = non_empty(config_keys::BOM_SHEET) {
            config.bom_layout.sheet = Some(v.trim().to_string());
        }
        if let Some(v) = non_empty(config_keys::BOM_HEADER_ROW) {
            config.bom_layout.header_row = parse_row(config_keys::BOM_HEADER_ROW, &v)?;
        }
        if let Some(v) = non_empty(config_keys::DATABASE_SHEET) {
            config.database_layout.sheet = Some(v.trim().to_string());
        }
        if let Some(v) = non_empty(config_keys::DATABASE_HEADER_ROW) {
            config.database_layout.header_row = parse_row(config_keys::DATABASE_HEADER_ROW, &v)?;
        }
        if let Some(v) = lookup(config_keys::CSV_DELIMITER).filter(|v| !v.is_empty()) {
            let mut chars = v.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => config.csv_delimiter = Some(c),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: config_keys::CSV_DELIMITER.to_string(),
                        value: v,
                        message: "分隔符必须为单个字符".to_string(),
                    })
                }
            }
        }

        config.validate()?;
        debug!(snapshot = %config.snapshot(), "配置覆写完成");
        Ok(config)
    }
}

fn parse_row(key: &str, value: &str) -> ConfigResult<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: e.to_string(),
        })
}

// ==========================================
// 配置键常量（环境变量名）
// ==========================================
pub mod config_keys {
    // 输入文件
    pub const DATABASE_FILE: &str = "UBP_DATABASE_FILE";
    pub const LEGACY_DATABASE_FILE: &str = "OEKOBILANZ_FILE";
    pub const MAPPING_FILE: &str = "UBP_MAPPING_FILE";

    // 表格布局
    pub const BOM_SHEET: &str = "UBP_BOM_SHEET";
    pub const BOM_HEADER_ROW: &str = "UBP_BOM_HEADER_ROW";
    pub const DATABASE_SHEET: &str = "UBP_DATABASE_SHEET";
    pub const DATABASE_HEADER_ROW: &str = "UBP_DATABASE_HEADER_ROW";
    pub const CSV_DELIMITER: &str = "UBP_CSV_DELIMITER";
}
