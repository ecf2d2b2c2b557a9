// ==========================================
// UBP 环境负荷计算系统 - 配置层
// ==========================================
// 职责: 运行配置（文件 + 环境变量）与映射规则文档
// ==========================================

pub mod config_manager;
pub mod error;
pub mod mapping_document;

// 重导出核心配置类型
pub use config_manager::{config_keys, AppConfig, ConfigManager, GeometryKeywords, SheetLayout};
pub use error::{ConfigError, ConfigResult};
pub use mapping_document::{KeywordFallbackMapping, MappingDocument, MaterialMapping};
