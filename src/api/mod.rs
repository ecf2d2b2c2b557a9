// ==========================================
// UBP 环境负荷计算系统 - API 层
// ==========================================
// 职责: 为展示层（CLI / 图表 / 导出）提供报告接口
// ==========================================

pub mod dto;
pub mod error;
pub mod report_api;

// 重导出核心类型
pub use dto::{GroupDto, ParetoEntryDto, RecordRowDto, RuleDto, SummaryDto};
pub use error::{ApiError, ApiResult};
pub use report_api::ReportApi;
