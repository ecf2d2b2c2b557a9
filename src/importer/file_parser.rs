// ==========================================
// UBP 环境负荷计算系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 红线: 不做表头识别，只产出保持绝对行号的 RawTable
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::raw_table::{CellValue, RawTable};
use crate::importer::reader_trait::FileParser;
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

// ==========================================
// CSV Parser 实现
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    delimiter: Option<u8>,
}

impl CsvParser {
    /// 指定分隔符（None 自动识别 `;` / `,`）
    pub fn new(delimiter: Option<u8>) -> Self {
        Self { delimiter }
    }

    /// 分隔符识别：前 10 个非空行中 `;` 多于 `,` 即取 `;`
    fn sniff_delimiter(content: &str) -> u8 {
        let (semicolons, commas) = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(10)
            .fold((0usize, 0usize), |(s, c), line| {
                (s + line.matches(';').count(), c + line.matches(',').count())
            });

        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }
}

impl FileParser for CsvParser {
    fn parse_table(&self, file_path: &Path, _sheet: Option<&str>) -> ImportResult<RawTable> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let content = fs::read_to_string(path)?;
        let content = content.trim_start_matches('\u{feff}');
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::sniff_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头行号由调用方给定
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(CellValue::from_text).collect());
        }

        let sheet = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        debug!(
            file = %path.display(),
            delimiter = %(delimiter as char),
            rows = rows.len(),
            "CSV 解析完成"
        );
        Ok(RawTable::new(sheet, rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ExcelParser;

impl ExcelParser {
    /// 选择工作表：精确匹配 → 忽略大小写匹配 → 未指定时取第一个
    fn select_sheet(available: &[String], wanted: Option<&str>) -> ImportResult<String> {
        match wanted {
            Some(name) => available
                .iter()
                .find(|s| s.as_str() == name)
                .or_else(|| {
                    available
                        .iter()
                        .find(|s| s.trim().eq_ignore_ascii_case(name.trim()))
                })
                .cloned()
                .ok_or_else(|| ImportError::SheetNotFound {
                    sheet: name.to_string(),
                    available: available.join(", "),
                }),
            None => available
                .first()
                .cloned()
                .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string())),
        }
    }

    /// Range → RawTable，补齐前导空行/空列以保持绝对坐标
    fn to_raw_table(sheet: &str, range: &Range<Data>) -> RawTable {
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];

        for data_row in range.rows() {
            let mut cells = vec![CellValue::Empty; start_col as usize];
            cells.extend(data_row.iter().map(cell_from_data));
            rows.push(cells);
        }

        RawTable::new(sheet, rows)
    }
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::from_text(s),
        other => CellValue::from_text(&other.to_string()),
    }
}

impl FileParser for ExcelParser {
    fn parse_table(&self, file_path: &Path, sheet: Option<&str>) -> ImportResult<RawTable> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" && ext != "xlsm" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 打开 Excel 文件
        let mut workbook = open_workbook_auto(path)?;
        let sheet_name = Self::select_sheet(&workbook.sheet_names(), sheet)?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let table = Self::to_raw_table(&sheet_name, &range);
        info!(
            file = %path.display(),
            sheet = %sheet_name,
            rows = table.row_count(),
            "Excel 工作表解析完成"
        );
        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct UniversalFileParser {
    csv: CsvParser,
}

impl UniversalFileParser {
    pub fn new(csv_delimiter: Option<u8>) -> Self {
        Self {
            csv: CsvParser::new(csv_delimiter),
        }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_table(&self, file_path: &Path, sheet: Option<&str>) -> ImportResult<RawTable> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => self.csv.parse_table(file_path, sheet),
            "xlsx" | "xls" | "xlsm" => ExcelParser.parse_table(file_path, sheet),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
