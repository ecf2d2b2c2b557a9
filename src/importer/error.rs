// ==========================================
// UBP 环境负荷计算系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 导入错误均为致命错误（表结构不一致时下游无法匹配）
// ==========================================

use thiserror::Error;

/// 导入模块错误类型（输入格式错误）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作表不存在: {sheet}（可用: {available}）")]
    SheetNotFound { sheet: String, available: String },

    // ===== 表头结构错误 =====
    #[error("表头行超出范围 (工作表 {sheet}): 第 {header_row} 行，共 {row_count} 行")]
    HeaderRowOutOfRange {
        sheet: String,
        header_row: usize,
        row_count: usize,
    },

    #[error("缺少必需列 (工作表 {sheet}, 表头第 {header_row} 行): {column}（可接受列名: {aliases}）")]
    MissingColumn {
        sheet: String,
        header_row: usize,
        column: String,
        aliases: String,
    },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
