// ==========================================
// UBP 环境负荷计算系统 - 原始表格结构
// ==========================================
// 职责: 文件解析产物（异构单元格 → CellValue）
// 红线: 行号保持绝对位置，表头偏移与用户看到的行号一致
// ==========================================

use crate::importer::data_cleaner::{parse_measure, Dimension};

/// 单元格值（文件解析后、字段映射前）
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// 从文本构造（空白 → Empty）
    pub fn from_text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 文本视图（数字按整数/小数格式化，空值返回 None）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
        }
    }

    /// 纯数值视图（文本不允许单位后缀）
    pub fn as_number(&self) -> Option<f64> {
        self.as_measure(Dimension::Plain)
    }

    /// 按量纲读取数值（文本中的单位后缀换算到基准单位，数字单元格原样返回）
    pub fn as_measure(&self, dimension: Dimension) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => parse_measure(s, dimension),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ==========================================
// RawTable - 单个工作表的全部行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    sheet: String,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(sheet: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            sheet: sheet.into(),
            rows,
        }
    }

    /// 由文本行构造（测试与 CSV 共用）
    pub fn from_text_rows<S: AsRef<str>>(sheet: impl Into<String>, rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| CellValue::from_text(c.as_ref())).collect())
            .collect();
        Self::new(sheet, rows)
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 按 0 起始索引取行
    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// 表头之后的数据行（返回 0 起始索引）
    pub fn rows_after(&self, header_index: usize) -> impl Iterator<Item = (usize, &[CellValue])> {
        self.rows
            .iter()
            .enumerate()
            .skip(header_index + 1)
            .map(|(idx, r)| (idx, r.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_view() {
        assert_eq!(CellValue::Number(12.0).as_text(), Some("12".to_string()));
        assert_eq!(CellValue::Number(1.5).as_text(), Some("1.5".to_string()));
        assert_eq!(CellValue::from_text("   "), CellValue::Empty);
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_cell_number_view() {
        assert_eq!(CellValue::Text("12,5".to_string()).as_number(), Some(12.5));
        assert_eq!(CellValue::Text("12,5 kg".to_string()).as_number(), None);
        assert_eq!(
            CellValue::Text("500 g".to_string()).as_measure(Dimension::Mass),
            Some(0.5)
        );
        assert_eq!(CellValue::Number(3.0).as_measure(Dimension::Area), Some(3.0));
        assert_eq!(CellValue::Number(3.0).as_number(), Some(3.0));
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
        assert_eq!(CellValue::Bool(true).as_number(), None);
    }

    #[test]
    fn test_rows_after_keeps_absolute_index() {
        let table = RawTable::from_text_rows(
            "Mengenliste",
            &[vec!["meta"], vec!["Pos."], vec!["1"], vec!["2"]],
        );
        let indices: Vec<usize> = table.rows_after(1).map(|(idx, _)| idx).collect();
        assert_eq!(indices, vec![2, 3]);
    }
}
