// ==========================================
// UBP 环境负荷计算系统 - 数据清洗
// ==========================================
// 职责: 数值规范化（小数逗号/小数点、千分位、按量纲换算单位后缀）
//       表头文本规范化 / NULL 标准化
// ==========================================

/// 数值列的量纲（决定允许的单位后缀及换算）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// 纯数值，不允许单位后缀
    Plain,
    /// 件数（Stk / pcs）
    Count,
    /// 质量，换算到 kg
    Mass,
    /// 面积，换算到 m²
    Area,
    /// UBP 值（UBP / UBP/kg / UBP/m²）
    Impact,
}

impl Dimension {
    /// 单位后缀 → 换算比例（分子, 分母）
    ///
    /// 量纲不符的后缀返回 None（"500 g" 不能进入面积列，"1500 mm" 不是面积）
    fn unit_ratio(&self, suffix: &str) -> Option<(f64, f64)> {
        match (self, suffix) {
            (_, "") => Some((1.0, 1.0)),
            (Dimension::Count, "stk" | "stk." | "st" | "st." | "pcs" | "x") => Some((1.0, 1.0)),
            (Dimension::Mass, "kg") => Some((1.0, 1.0)),
            (Dimension::Mass, "g") => Some((1.0, 1_000.0)),
            (Dimension::Mass, "t") => Some((1_000.0, 1.0)),
            (Dimension::Area, "m2" | "m²") => Some((1.0, 1.0)),
            (Dimension::Area, "cm2" | "cm²") => Some((1.0, 10_000.0)),
            (Dimension::Area, "mm2" | "mm²") => Some((1.0, 1_000_000.0)),
            (Dimension::Impact, "ubp" | "ubp/kg" | "ubp/m2" | "ubp/m²") => Some((1.0, 1.0)),
            _ => None,
        }
    }
}

/// 解析纯数值文本（不接受单位后缀）
pub fn parse_number(raw: &str) -> Option<f64> {
    parse_measure(raw, Dimension::Plain)
}

/// 解析本地化数值文本并换算到量纲的基准单位
///
/// # 规则
/// 1. 去除空白（含不换行空格）与千分位撇号（`'` / `’`）
/// 2. 取最长数值前缀（数字、`.`、`,`、符号），余下部分必须是该量纲的单位后缀
/// 3. 同时出现 `,` 与 `.`：最后出现者为小数点，另一者为千分位
/// 4. 只有 `,`：单个视为小数逗号，多个视为千分位
/// 5. 只有 `.`：单个视为小数点，多个视为千分位
///
/// # 返回
/// - Some(f64): 换算后的有限数值（g → kg、cm² → m² 等）
/// - None: 空值 / 无法识别 / 单位与量纲不符
pub fn parse_measure(raw: &str, dimension: Dimension) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '’')
        .collect();

    if compact.is_empty() {
        return None;
    }

    let end = compact
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+')))
        .map(|(idx, _)| idx)
        .unwrap_or(compact.len());

    let (number, suffix) = compact.split_at(end);
    let (numerator, denominator) = dimension.unit_ratio(&suffix.to_lowercase())?;

    if !number.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = normalize_separators(number);
    normalized
        .parse::<f64>()
        .ok()
        .map(|v| v * numerator / denominator)
        .filter(|v| v.is_finite())
}

fn normalize_separators(number: &str) -> String {
    let commas = number.matches(',').count();
    let dots = number.matches('.').count();

    match (commas, dots) {
        (0, 0) => number.to_string(),
        (_, 0) if commas == 1 => number.replace(',', "."),
        (_, 0) => number.replace(',', ""),
        (0, 1) => number.to_string(),
        (0, _) => number.replace('.', ""),
        _ => {
            let last_comma = number.rfind(',').unwrap_or(0);
            let last_dot = number.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                number.replace('.', "").replace(',', ".")
            } else {
                number.replace(',', "")
            }
        }
    }
}

/// 表头规范化：TRIM + 小写 + 合并空白 + 统一撇号
pub fn normalize_header(value: &str) -> String {
    value
        .replace(['’', '‘', '`', '´'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 标准化 NULL 值（空字符串/空白 → None）
pub fn normalize_null(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
