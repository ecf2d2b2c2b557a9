// ==========================================
// UBP 环境负荷计算系统 - 读取器 Trait
// ==========================================
// 职责: 定义文件解析与行映射接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::field_mapper::ColumnIndex;
use crate::importer::raw_table::{CellValue, RawTable};
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件 → RawTable（阶段 0）
// 实现者: ExcelParser, CsvParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件中的一个工作表
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - sheet: 工作表名（None 取第一个；CSV 忽略）
    ///
    /// # 返回
    /// - Ok(RawTable): 保持绝对行号的全部行
    /// - Err: 文件不存在、格式错误、工作表不存在
    fn parse_table(&self, file_path: &Path, sheet: Option<&str>) -> ImportResult<RawTable>;
}

// ==========================================
// RowMapper Trait
// ==========================================
// 用途: 单行 → 类型化记录（阶段 1）
// 实现者: BomRowMapper, ReferenceRowMapper
pub trait RowMapper: Send + Sync {
    type Record;

    /// 表头必须包含的列（用于表头校验）
    fn schema(&self) -> &crate::importer::field_mapper::TableSchema;

    /// 映射单行
    ///
    /// # 参数
    /// - columns: 已解析的列位置
    /// - row: 原始单元格
    /// - row_number: 1 起始行号（日志/回溯）
    ///
    /// # 返回
    /// - Some(Record): 数据行
    /// - None: 非数据行（空行、小计行、分类标题行）
    fn map_row(
        &self,
        columns: &ColumnIndex,
        row: &[CellValue],
        row_number: usize,
    ) -> Option<Self::Record>;
}
