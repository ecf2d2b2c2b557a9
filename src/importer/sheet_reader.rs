// ==========================================
// UBP 环境负荷计算系统 - 表格读取器
// ==========================================
// 职责: 表头识别 → 逐行映射 → 跳过非数据行
// 流程: 文件解析 (FileParser) → read_records (RowMapper)
// 红线: 纯转换，表结构不符即整体失败（不做部分恢复）
// ==========================================

use crate::config::SheetLayout;
use crate::domain::{Component, ReferenceDatabase, ReferenceEntry};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{
    resolve_header, BomRowMapper, GeometryClassifier, ReferenceRowMapper,
};
use crate::importer::raw_table::{CellValue, RawTable};
use crate::importer::reader_trait::{FileParser, RowMapper};
use std::path::Path;
use tracing::{debug, info, instrument};

/// 读取类型化记录
///
/// # 参数
/// - table: 原始表格
/// - header_row: 表头行号（1 起始）
/// - mapper: 行映射器
///
/// # 返回
/// - Ok(Vec<Record>): 数据行（源顺序）
/// - Err: 表头行越界 / 必需列缺失
pub fn read_records<M: RowMapper>(
    table: &RawTable,
    header_row: usize,
    mapper: &M,
) -> ImportResult<Vec<M::Record>> {
    let columns = resolve_header(table, header_row, mapper.schema())?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (idx, row) in table.rows_after(header_row - 1) {
        let row_number = idx + 1;

        if row.iter().all(CellValue::is_blank) {
            skipped += 1;
            continue;
        }

        match mapper.map_row(&columns, row, row_number) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                debug!(row_number, "跳过非数据行");
            }
        }
    }

    info!(
        sheet = table.sheet(),
        schema = mapper.schema().name,
        records = records.len(),
        skipped,
        "表格读取完成"
    );
    Ok(records)
}

/// 读取物料清单构件
pub fn read_components(
    table: &RawTable,
    header_row: usize,
    classifier: GeometryClassifier,
) -> ImportResult<Vec<Component>> {
    read_records(table, header_row, &BomRowMapper::new(classifier))
}

/// 读取参考数据库条目
pub fn read_reference_entries(
    table: &RawTable,
    header_row: usize,
) -> ImportResult<Vec<ReferenceEntry>> {
    read_records(table, header_row, &ReferenceRowMapper::new())
}

/// 从文件加载物料清单
#[instrument(skip(parser, layout, classifier), fields(file = %path.display()))]
pub fn load_components(
    parser: &dyn FileParser,
    path: &Path,
    layout: &SheetLayout,
    classifier: GeometryClassifier,
) -> ImportResult<Vec<Component>> {
    let table = parser.parse_table(path, layout.sheet.as_deref())?;
    read_components(&table, layout.header_row, classifier)
}

/// 从文件加载参考数据库
#[instrument(skip(parser, layout), fields(file = %path.display()))]
pub fn load_reference_database(
    parser: &dyn FileParser,
    path: &Path,
    layout: &SheetLayout,
) -> ImportResult<ReferenceDatabase> {
    let table = parser.parse_table(path, layout.sheet.as_deref())?;
    let entries = read_reference_entries(&table, layout.header_row)?;
    let database = ReferenceDatabase::from_entries(entries);
    info!(entries = database.len(), "参考数据库加载完成");
    Ok(database)
}
