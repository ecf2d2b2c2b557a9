// ==========================================
// UBP 环境负荷计算系统 - 领域模型层
// ==========================================
// 职责: 定义构件、参考条目、匹配结果、影响记录与汇总报告
// 红线: 不含文件读取逻辑，不含规则求值逻辑
// ==========================================

pub mod component;
pub mod impact;
pub mod types;

// 重导出核心类型
pub use component::{Component, ReferenceDatabase, ReferenceEntry};
pub use impact::{
    AggregateReport, CoatingMatch, GroupTotal, ImpactRecord, MatchResult, ResolvedMatch,
    RowWarning,
};
pub use types::{GeometryType, PrecedenceLevel, UnitKind, UnmatchedReason};
