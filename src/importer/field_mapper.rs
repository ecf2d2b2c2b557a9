// ==========================================
// UBP 环境负荷计算系统 - 字段映射器实现
// ==========================================
// 职责: 表头识别（按列名而非列位置） + 行 → 类型化记录
// 支持: HiCAD 物料清单 / KBOB 生态平衡数据库
// ==========================================

use crate::config::GeometryKeywords;
use crate::domain::{Component, GeometryType, ReferenceEntry, UnitKind};
use crate::importer::data_cleaner::{normalize_header, normalize_null, Dimension};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::raw_table::{CellValue, RawTable};
use crate::importer::reader_trait::RowMapper;
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ==========================================
// Column - 逻辑列
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    // ===== 物料清单 =====
    Position,
    Quantity,
    Description,
    Material,
    TypeLabel,
    Coating,
    Area,
    Mass,
    TotalMass,

    // ===== 参考数据库 =====
    ReferenceKey,
    ReferenceName,
    Unit,
    UnitImpact,
    ProductionImpact,
    DisposalImpact,
}

impl Column {
    /// 数值列的量纲（非数值列为 Plain）
    pub fn dimension(&self) -> Dimension {
        match self {
            Column::Quantity => Dimension::Count,
            Column::Mass | Column::TotalMass => Dimension::Mass,
            Column::Area => Dimension::Area,
            Column::UnitImpact | Column::ProductionImpact | Column::DisposalImpact => {
                Dimension::Impact
            }
            _ => Dimension::Plain,
        }
    }

    /// 错误信息中使用的列名
    pub fn label(&self) -> &'static str {
        match self {
            Column::Position => "Pos.",
            Column::Quantity => "Anzahl",
            Column::Description => "Bezeichnung",
            Column::Material => "Material",
            Column::TypeLabel => "Typ",
            Column::Coating => "Beschichtung",
            Column::Area => "Fl. (m²)",
            Column::Mass => "Gew. (kg)",
            Column::TotalMass => "Ges.gew.",
            Column::ReferenceKey => "ID-Nummer",
            Column::ReferenceName => "BAUMATERIALIEN",
            Column::Unit => "Bezug",
            Column::UnitImpact => "UBP'21 Total",
            Column::ProductionImpact => "UBP'21 Herstellung",
            Column::DisposalImpact => "UBP'21 Entsorgung",
        }
    }
}

/// 列定义：逻辑列 + 可接受的表头文本
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub column: Column,
    pub aliases: Vec<String>,
}

impl ColumnSpec {
    fn new(column: Column, aliases: &[&str]) -> Self {
        Self {
            column,
            aliases: aliases.iter().map(|a| normalize_header(a)).collect(),
        }
    }
}

// ==========================================
// TableSchema - 表结构定义
// ==========================================
// required_groups: 每组至少出现一列（如 质量 / 总质量）
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: Vec<ColumnSpec>,
    pub required_groups: Vec<Vec<Column>>,
}

impl TableSchema {
    /// HiCAD "Mengenliste" 导出
    pub fn bill_of_materials() -> Self {
        Self {
            name: "bill-of-materials",
            columns: vec![
                ColumnSpec::new(Column::Position, &["Pos.", "Pos", "Position"]),
                ColumnSpec::new(Column::Quantity, &["Anzahl", "Menge", "Stk.", "Quantity", "Qty"]),
                ColumnSpec::new(Column::Description, &["Bezeichnung", "Description"]),
                ColumnSpec::new(Column::Material, &["Material", "Werkstoff", "Material code"]),
                ColumnSpec::new(Column::TypeLabel, &["Typ", "Type", "Geometry", "Geometrie"]),
                ColumnSpec::new(Column::Coating, &["Beschichtung", "Oberfläche", "Coating"]),
                ColumnSpec::new(
                    Column::Area,
                    &["Fl. (m²)", "Fl. (m2)", "Fläche (m²)", "Fläche (m2)", "Fläche", "Area", "Area (m²)"],
                ),
                ColumnSpec::new(
                    Column::Mass,
                    &["Gew. (kg)", "Gewicht (kg)", "Gewicht", "Mass", "Mass (kg)"],
                ),
                ColumnSpec::new(
                    Column::TotalMass,
                    &["Ges.gew.", "Ges.gew. (kg)", "Gesamtgewicht", "Total mass"],
                ),
            ],
            required_groups: vec![
                vec![Column::Position],
                vec![Column::Material],
                vec![Column::Mass, Column::TotalMass],
            ],
        }
    }

    /// KBOB "Baumaterialien Matériaux" 数据库
    pub fn reference_database() -> Self {
        Self {
            name: "reference-database",
            columns: vec![
                ColumnSpec::new(Column::ReferenceKey, &["ID-Nummer", "ID", "Key", "Material key"]),
                ColumnSpec::new(
                    Column::ReferenceName,
                    &["BAUMATERIALIEN", "Baumaterialien Matériaux", "Name", "Description"],
                ),
                ColumnSpec::new(Column::Unit, &["Bezug", "Einheit", "Unit", "Unit kind"]),
                ColumnSpec::new(
                    Column::UnitImpact,
                    &["UBP'21 Total", "UBP Total", "UBP", "Unit impact"],
                ),
                ColumnSpec::new(
                    Column::ProductionImpact,
                    &["UBP'21 Herstellung", "UBP Herstellung"],
                ),
                ColumnSpec::new(
                    Column::DisposalImpact,
                    &["UBP'21 Entsorgung", "UBP Entsorgung"],
                ),
            ],
            required_groups: vec![
                vec![Column::ReferenceKey],
                vec![Column::Unit],
                vec![Column::UnitImpact],
            ],
        }
    }
}

// ==========================================
// ColumnIndex - 已识别的列位置
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnIndex {
    positions: BTreeMap<Column, usize>,
}

impl ColumnIndex {
    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.positions.contains_key(&column)
    }

    /// 取单元格（列缺失或行过短返回 Empty）
    pub fn cell<'a>(&self, row: &'a [CellValue], column: Column) -> &'a CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.position(column)
            .and_then(|idx| row.get(idx))
            .unwrap_or(&EMPTY)
    }
}

/// 识别表头
///
/// # 参数
/// - table: 原始表格
/// - header_row: 表头行号（1 起始，与表格软件显示一致）
/// - schema: 表结构定义
///
/// # 返回
/// - Ok(ColumnIndex): 列位置
/// - Err: 表头行越界 / 必需列缺失
pub fn resolve_header(
    table: &RawTable,
    header_row: usize,
    schema: &TableSchema,
) -> ImportResult<ColumnIndex> {
    let header = header_row
        .checked_sub(1)
        .and_then(|idx| table.row(idx))
        .ok_or_else(|| ImportError::HeaderRowOutOfRange {
            sheet: table.sheet().to_string(),
            header_row,
            row_count: table.row_count(),
        })?;

    let mut positions = BTreeMap::new();
    for (col_idx, cell) in header.iter().enumerate() {
        let Some(text) = cell.as_text() else {
            continue;
        };
        let normalized = normalize_header(&text);

        if let Some(spec) = schema
            .columns
            .iter()
            .find(|spec| spec.aliases.iter().any(|a| *a == normalized))
        {
            // 同名列重复时保留第一列
            if positions.contains_key(&spec.column) {
                debug!(column = spec.column.label(), col_idx, "重复列，忽略");
                continue;
            }
            positions.insert(spec.column, col_idx);
        }
    }

    for group in &schema.required_groups {
        if !group.iter().any(|c| positions.contains_key(c)) {
            let aliases = schema
                .columns
                .iter()
                .filter(|spec| group.contains(&spec.column))
                .flat_map(|spec| spec.aliases.iter().cloned())
                .collect::<Vec<_>>()
                .join(", ");

            return Err(ImportError::MissingColumn {
                sheet: table.sheet().to_string(),
                header_row,
                column: group
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join(" / "),
                aliases,
            });
        }
    }

    debug!(schema = schema.name, columns = positions.len(), "表头识别完成");
    Ok(ColumnIndex { positions })
}

// ==========================================
// GeometryClassifier - 类型文本 → 几何类型
// ==========================================
// 顺序: 板材 → 厚板 → 型材（"Profilblech" 归为板材）
#[derive(Debug, Clone)]
pub struct GeometryClassifier {
    sheet: Vec<String>,
    plate: Vec<String>,
    profile: Vec<String>,
}

impl GeometryClassifier {
    pub fn new(keywords: &GeometryKeywords) -> Self {
        let lower = |v: &[String]| v.iter().map(|k| k.trim().to_lowercase()).collect();
        Self {
            sheet: lower(&keywords.sheet),
            plate: lower(&keywords.plate),
            profile: lower(&keywords.profile),
        }
    }

    pub fn classify(&self, type_label: &str) -> GeometryType {
        let label = type_label.trim().to_lowercase();
        if label.is_empty() {
            return GeometryType::Other;
        }

        let hit = |keywords: &[String]| keywords.iter().any(|k| !k.is_empty() && label.contains(k.as_str()));
        if hit(&self.sheet) {
            GeometryType::Sheet
        } else if hit(&self.plate) {
            GeometryType::Plate
        } else if hit(&self.profile) {
            GeometryType::Profile
        } else {
            GeometryType::Other
        }
    }
}

impl Default for GeometryClassifier {
    fn default() -> Self {
        Self::new(&GeometryKeywords::default())
    }
}

// ==========================================
// 数值字段读取（按列量纲换算；无法解析或单位不符时记录警告并视为缺失）
// ==========================================
fn number_field(columns: &ColumnIndex, row: &[CellValue], column: Column, row_number: usize) -> Option<f64> {
    let cell = columns.cell(row, column);
    let value = cell.as_measure(column.dimension());
    if value.is_none() && !cell.is_blank() {
        warn!(
            row_number,
            column = column.label(),
            value = ?cell,
            "数值无法解析，视为缺失"
        );
    }
    value
}

fn non_negative(value: Option<f64>, column: Column, row_number: usize) -> Option<f64> {
    match value {
        Some(v) if v < 0.0 => {
            warn!(row_number, column = column.label(), value = v, "数值为负，视为缺失");
            None
        }
        other => other,
    }
}

fn text_field(columns: &ColumnIndex, row: &[CellValue], column: Column) -> Option<String> {
    normalize_null(columns.cell(row, column).as_text())
}

// ==========================================
// BomRowMapper - 物料清单行映射
// ==========================================
#[derive(Debug, Clone)]
pub struct BomRowMapper {
    schema: TableSchema,
    classifier: GeometryClassifier,
}

impl BomRowMapper {
    pub fn new(classifier: GeometryClassifier) -> Self {
        Self {
            schema: TableSchema::bill_of_materials(),
            classifier,
        }
    }

    /// 件数；小于 1 或超出范围返回 0（行保留，计算时标记为件数无效）
    fn quantity(&self, columns: &ColumnIndex, row: &[CellValue], row_number: usize) -> u32 {
        match number_field(columns, row, Column::Quantity, row_number) {
            None => 1,
            Some(q) => {
                let rounded = q.round();
                if (rounded - q).abs() > f64::EPSILON {
                    warn!(row_number, quantity = q, "件数非整数，四舍五入");
                }
                if rounded < 1.0 || rounded > f64::from(u32::MAX) {
                    warn!(row_number, quantity = q, "件数无效，该行标记后保留");
                    0
                } else {
                    rounded as u32
                }
            }
        }
    }
}

impl Default for BomRowMapper {
    fn default() -> Self {
        Self::new(GeometryClassifier::default())
    }
}

impl RowMapper for BomRowMapper {
    type Record = Component;

    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn map_row(&self, columns: &ColumnIndex, row: &[CellValue], row_number: usize) -> Option<Component> {
        // 无位置号：元数据行 / 小计行
        let position = text_field(columns, row, Column::Position)?;

        let material_code = text_field(columns, row, Column::Material).unwrap_or_default();
        let type_label = text_field(columns, row, Column::TypeLabel).unwrap_or_default();
        let description = text_field(columns, row, Column::Description).unwrap_or_default();

        // 无材料、无类型、无描述：汇总行
        if material_code.is_empty() && type_label.is_empty() && description.is_empty() {
            debug!(row_number, position = %position, "缺少材料/类型/描述，视为汇总行");
            return None;
        }

        let quantity = self.quantity(columns, row, row_number);

        let mass_kg = non_negative(
            number_field(columns, row, Column::Mass, row_number),
            Column::Mass,
            row_number,
        )
        .or_else(|| {
            non_negative(
                number_field(columns, row, Column::TotalMass, row_number),
                Column::TotalMass,
                row_number,
            )
            .filter(|_| quantity > 0)
            .map(|total| total / f64::from(quantity))
        });

        let area_m2 = non_negative(
            number_field(columns, row, Column::Area, row_number),
            Column::Area,
            row_number,
        );

        let coating = text_field(columns, row, Column::Coating).filter(|c| c != "-");

        Some(Component {
            position,
            row_number,
            geometry: self.classifier.classify(&type_label),
            description,
            type_label,
            material_code,
            coating,
            quantity,
            mass_kg,
            area_m2,
        })
    }
}

// ==========================================
// ReferenceRowMapper - 参考数据库行映射
// ==========================================
#[derive(Debug, Clone)]
pub struct ReferenceRowMapper {
    schema: TableSchema,
}

impl ReferenceRowMapper {
    pub fn new() -> Self {
        Self {
            schema: TableSchema::reference_database(),
        }
    }
}

impl Default for ReferenceRowMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RowMapper for ReferenceRowMapper {
    type Record = ReferenceEntry;

    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn map_row(
        &self,
        columns: &ColumnIndex,
        row: &[CellValue],
        row_number: usize,
    ) -> Option<ReferenceEntry> {
        let key = text_field(columns, row, Column::ReferenceKey)?;

        // 分类标题行没有 UBP 值
        let impact = |column: Column| columns.cell(row, column).as_measure(column.dimension());
        let unit_impact = impact(Column::UnitImpact)?;

        let unit = text_field(columns, row, Column::Unit).unwrap_or_default();
        let Some(unit_kind) = UnitKind::parse(&unit) else {
            debug!(row_number, key = %key, unit = %unit, "单位不支持（仅 kg / m²），跳过");
            return None;
        };

        Some(ReferenceEntry {
            description: text_field(columns, row, Column::ReferenceName).unwrap_or_default(),
            production_impact: impact(Column::ProductionImpact),
            disposal_impact: impact(Column::DisposalImpact),
            key,
            unit_kind,
            unit_impact,
        })
    }
}
