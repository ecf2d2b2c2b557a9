// ==========================================
// UBP 环境负荷计算系统 - 引擎层
// ==========================================
// 职责: 规则表构建、材料解析、影响计算、汇总
// 红线: 引擎不读文件（流水线入口除外），所有未匹配/缺量必须带原因
// ==========================================

pub mod aggregator;
pub mod error;
pub mod impact_calculator;
pub mod material_resolver;
pub mod pipeline;
pub mod rule_table;

// 重导出核心引擎
pub use aggregator::{aggregate, stable_sum};
pub use error::{PipelineError, PipelineResult};
pub use impact_calculator::{compute, ImpactCalculator};
pub use material_resolver::{resolve, MaterialResolver};
pub use pipeline::{ImpactPipeline, PipelineOutput};
pub use rule_table::{
    normalize_material_code, normalize_token, MappingRule, RuleQualifier, RuleTable,
};
