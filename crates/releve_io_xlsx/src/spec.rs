//! Shared XLSX specification models.

use std::collections::BTreeMap;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Border line weight for one cell edge.
///
/// An unset edge (`None` in [`SpecCellBorder`]) draws no line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumBorderWeight {
    /// Thin solid line.
    Thin,
    /// Medium solid line.
    Medium,
    /// Dotted light line.
    Dotted,
}

/// Per-edge border annotation for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpecCellBorder {
    /// Top edge.
    pub top: Option<EnumBorderWeight>,
    /// Bottom edge.
    pub bottom: Option<EnumBorderWeight>,
    /// Left edge.
    pub left: Option<EnumBorderWeight>,
    /// Right edge.
    pub right: Option<EnumBorderWeight>,
}

impl SpecCellBorder {
    /// Same weight on all four edges.
    pub fn all(weight: EnumBorderWeight) -> Self {
        Self {
            top: Some(weight),
            bottom: Some(weight),
            left: Some(weight),
            right: Some(weight),
        }
    }

    /// Overlay `patch` onto `self`; edges unset in `patch` are kept.
    pub fn merge(&self, patch: &SpecCellBorder) -> SpecCellBorder {
        SpecCellBorder {
            top: patch.top.or(self.top),
            bottom: patch.bottom.or(self.bottom),
            left: patch.left.or(self.left),
            right: patch.right.or(self.right),
        }
    }
}

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Top border.
    pub top: Option<EnumBorderWeight>,
    /// Bottom border.
    pub bottom: Option<EnumBorderWeight>,
    /// Left border.
    pub left: Option<EnumBorderWeight>,
    /// Right border.
    pub right: Option<EnumBorderWeight>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
        }
    }

    /// Return a new format carrying the edges of `border`.
    pub fn with_border(&self, border: &SpecCellBorder) -> SpecCellFormat {
        self.with_(SpecCellFormat {
            top: border.top,
            bottom: border.bottom,
            left: border.left,
            right: border.right,
            ..Default::default()
        })
    }
}

/// Normalized cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Text content, if this is a string cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EnumCellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for `None` and the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            EnumCellValue::None => true,
            EnumCellValue::String(s) => s.is_empty(),
            EnumCellValue::Number(_) => false,
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        EnumCellValue::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        EnumCellValue::String(value)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetGridSpecification

/// Horizontal merge plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetHorizontalMerge {
    /// Row index where merge is applied.
    pub row_idx: usize,
    /// Start column index (inclusive).
    pub col_idx_start: usize,
    /// End column index (inclusive).
    pub col_idx_end: usize,
}

impl SpecSheetHorizontalMerge {
    /// Number of columns covered by the merge.
    pub fn width(&self) -> usize {
        self.col_idx_end + 1 - self.col_idx_start
    }
}

/// Per-cell border annotations keyed by `(row, col)`.
pub type DictCellBorders = BTreeMap<(usize, usize), SpecCellBorder>;

/// Sparse sheet content: cell values, merges and column widths.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetGrid {
    /// Cell values keyed by `(row, col)`.
    pub cells: BTreeMap<(usize, usize), EnumCellValue>,
    /// Horizontal merge regions.
    pub merges: Vec<SpecSheetHorizontalMerge>,
    /// Column width hints, indexed by column.
    pub col_widths: Vec<f64>,
}

impl SpecSheetGrid {
    /// Set cell `(row, col)` to `value`, replacing any previous value.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<EnumCellValue>) {
        self.cells.insert((row, col), value.into());
    }

    /// Value at `(row, col)`, if present.
    pub fn get(&self, row: usize, col: usize) -> Option<&EnumCellValue> {
        self.cells.get(&(row, col))
    }

    /// Text at `(row, col)`, if it is a string cell.
    pub fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.get(row, col).and_then(EnumCellValue::as_str)
    }

    /// Number of rows spanned by present cells.
    pub fn height(&self) -> usize {
        self.cells.keys().map(|(row, _)| row + 1).max().unwrap_or(0)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-sheet write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Number of cells written, every merged cell included.
    pub n_cells: usize,
    /// Number of merge regions written.
    pub n_merges: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
