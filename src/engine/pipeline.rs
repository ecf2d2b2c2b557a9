// ==========================================
// UBP 环境负荷计算系统 - 计算流水线
// ==========================================
// 流程: 读取器 → 材料解析器 → 影响计算器 → 汇总器
// 加载: 参考库 + 映射规则在构造时一次性加载，运行期只读
// 红线: 单线程单遍处理，无反馈回路；同一输入结果逐位一致
// ==========================================

use crate::config::{AppConfig, MappingDocument};
use crate::domain::{AggregateReport, Component, ImpactRecord, ReferenceDatabase};
use crate::engine::aggregator::aggregate;
use crate::engine::error::PipelineResult;
use crate::engine::impact_calculator::ImpactCalculator;
use crate::engine::material_resolver::MaterialResolver;
use crate::engine::rule_table::RuleTable;
use crate::importer::{
    load_components, load_reference_database, FileParser, GeometryClassifier, UniversalFileParser,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

/// 流水线输出：逐行记录 + 汇总报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub records: Vec<ImpactRecord>,
    pub report: AggregateReport,
}

// ==========================================
// ImpactPipeline - 计算流水线
// ==========================================
pub struct ImpactPipeline {
    config: AppConfig,
    parser: UniversalFileParser,
    database: ReferenceDatabase,
    rules: RuleTable,
}

impl ImpactPipeline {
    /// 由已加载的参考库与规则表构建
    pub fn new(config: AppConfig, database: ReferenceDatabase, rules: RuleTable) -> Self {
        let parser = UniversalFileParser::new(config.csv_delimiter_byte());
        Self {
            config,
            parser,
            database,
            rules,
        }
    }

    /// 按配置加载参考库与映射规则
    ///
    /// # 返回
    /// - Err(Import): 参考库文件缺失或表结构不符
    /// - Err(Config): 映射文件无法读取 / 规则冲突 / 目标条目不存在
    #[instrument(skip(config), fields(database = %config.database_file.display()))]
    pub fn from_config(config: AppConfig) -> PipelineResult<Self> {
        let parser = UniversalFileParser::new(config.csv_delimiter_byte());
        let database =
            load_reference_database(&parser, &config.database_file, &config.database_layout)?;
        let document = MappingDocument::from_file(&config.mapping_file)?;
        let rules = RuleTable::build(&document, &database)?;
        Ok(Self::new(config, database, rules))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> &ReferenceDatabase {
        &self.database
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// 读取物料清单文件
    pub fn load_components(&self, bom_path: &Path) -> PipelineResult<Vec<Component>> {
        self.load_components_with(&self.parser, bom_path)
    }

    /// 使用指定解析器读取物料清单
    pub fn load_components_with(
        &self,
        parser: &dyn FileParser,
        bom_path: &Path,
    ) -> PipelineResult<Vec<Component>> {
        let classifier = GeometryClassifier::new(&self.config.geometry_keywords);
        Ok(load_components(
            parser,
            bom_path,
            &self.config.bom_layout,
            classifier,
        )?)
    }

    /// 对已读取的构件执行解析 → 计算 → 汇总
    pub fn run(&self, components: &[Component]) -> PipelineOutput {
        let matches = MaterialResolver::new(&self.rules).resolve_all(components);
        let records = ImpactCalculator::new().compute_all(components, &matches);
        let report = aggregate(&records);
        PipelineOutput { records, report }
    }

    /// 读取物料清单文件并计算
    #[instrument(skip(self), fields(file = %bom_path.display()))]
    pub fn run_file(&self, bom_path: &Path) -> PipelineResult<PipelineOutput> {
        let components = self.load_components(bom_path)?;
        let output = self.run(&components);
        info!(
            components = output.records.len(),
            total_impact = output.report.total_impact,
            "流水线执行完成"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeometryType, ReferenceEntry, UnitKind};

    fn pipeline() -> ImpactPipeline {
        let database = ReferenceDatabase::from_entries(vec![ReferenceEntry {
            key: "06.012".to_string(),
            description: "Stahlprofil".to_string(),
            unit_kind: UnitKind::Mass,
            unit_impact: 50.0,
            production_impact: None,
            disposal_impact: None,
        }]);
        let document = MappingDocument::from_json_str(
            r#"{"materials": {"S235JR": {"default": "06.012"}}}"#,
            "inline",
        )
        .unwrap();
        let rules = RuleTable::build(&document, &database).unwrap();
        ImpactPipeline::new(AppConfig::default(), database, rules)
    }

    fn component(position: &str, material: &str, mass: f64) -> Component {
        Component {
            position: position.to_string(),
            row_number: 9,
            description: String::new(),
            type_label: String::new(),
            geometry: GeometryType::Other,
            material_code: material.to_string(),
            coating: None,
            quantity: 1,
            mass_kg: Some(mass),
            area_m2: None,
        }
    }

    #[test]
    fn test_run_keeps_input_order() {
        let output = pipeline().run(&[
            component("2", "S235JR", 2.0),
            component("1", "UNKNOWN123", 8.0),
        ]);

        let positions: Vec<&str> = output.records.iter().map(|r| r.position.as_str()).collect();
        assert_eq!(positions, vec!["2", "1"]);
        assert_eq!(output.report.total_impact, 100.0);
        assert!(output.report.unmatched_codes.contains("UNKNOWN123"));
    }

    #[test]
    fn test_run_file_missing_bom_is_fatal() {
        let result = pipeline().run_file(Path::new("does_not_exist.csv"));
        assert!(result.is_err());
    }
}
