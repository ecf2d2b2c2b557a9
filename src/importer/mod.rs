// ==========================================
// UBP 环境负荷计算系统 - 导入层（表格读取器）
// ==========================================
// 职责: 外部表格 → 类型化记录（Component / ReferenceEntry）
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod raw_table;
pub mod reader_trait;
pub mod sheet_reader;

// 重导出核心类型
pub use data_cleaner::{parse_measure, parse_number, Dimension};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{
    BomRowMapper, Column, ColumnIndex, GeometryClassifier, ReferenceRowMapper, TableSchema,
};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use raw_table::{CellValue, RawTable};
pub use sheet_reader::{
    load_components, load_reference_database, read_components, read_records,
    read_reference_entries,
};

// 重导出 Trait 接口
pub use reader_trait::{FileParser, RowMapper};
