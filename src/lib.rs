// ==========================================
// UBP 环境负荷计算系统 - 核心库
// ==========================================
// 流程: 表格读取 → 材料解析 → 影响计算 → 汇总
// 输入: 物料清单（CAD 导出）+ 生态平衡参考库（KBOB）+ 映射规则（JSON）
// 系统定位: 批处理计算，单线程单遍，无持久化状态
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值对象与类型
pub mod domain;

// 导入层 - 外部表格
pub mod importer;

// 配置层 - 运行配置与映射规则文档
pub mod config;

// 引擎层 - 规则表 / 解析 / 计算 / 汇总
pub mod engine;

// API 层 - 报告与导出
pub mod api;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AggregateReport, Component, GeometryType, ImpactRecord, MatchResult, PrecedenceLevel,
    ReferenceDatabase, ReferenceEntry, RowWarning, UnitKind, UnmatchedReason,
};

// 配置
pub use config::{AppConfig, ConfigError, ConfigManager, MappingDocument};

// 引擎
pub use engine::{
    aggregate, compute, resolve, ImpactPipeline, PipelineError, PipelineOutput, RuleTable,
};

// 导入
pub use importer::{ImportError, UniversalFileParser};

// API
pub use api::{ApiError, ReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "UBP 环境负荷计算系统";
