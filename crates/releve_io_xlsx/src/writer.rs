//! XLSX writer kernel that turns sparse sheet grids into workbook output.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use crate::conf::{
    EnumFmtKey, N_RGB_BORDER_DOTTED, N_RGB_BORDER_SOLID, derive_default_xlsx_formats,
};
use crate::spec::{
    DictCellBorders, EnumBorderWeight, EnumCellValue, SpecCellFormat, SpecSheetGrid,
    SpecXlsxReport,
};
use crate::util::{
    derive_horizontal_merge_tracker, derive_unique_sheet_name, sanitize_sheet_name,
    validate_horizontal_merges,
};

/// Destination for styled sheet grids, one workbook per sink instance.
pub trait WorkbookSink {
    /// Append one sheet built from `grid` + `borders`; returns the final sheet name.
    fn append_sheet(
        &mut self,
        grid: &SpecSheetGrid,
        borders: &DictCellBorders,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<String, String>;

    /// Encode the workbook to `path`.
    fn write_file(&mut self, path: &Path) -> Result<(), String>;
}

/// Per-sheet call options.
#[derive(Default, Debug, Clone)]
pub struct SpecXlsxSheetWriteOptions {
    /// Rows rendered with the header preset.
    pub rows_header: BTreeSet<usize>,
    /// Rows rendered with the title preset.
    pub rows_title: BTreeSet<usize>,
}

impl SpecXlsxSheetWriteOptions {
    fn derive_fmt_key(&self, row_idx: usize) -> EnumFmtKey {
        if self.rows_title.contains(&row_idx) {
            EnumFmtKey::Title
        } else if self.rows_header.contains(&row_idx) {
            EnumFmtKey::Header
        } else {
            EnumFmtKey::Text
        }
    }
}

/// Stateful workbook writer.
pub struct XlsxWriter {
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_header: SpecCellFormat,
    fmt_title: SpecCellFormat,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        let dict_fmt = derive_default_xlsx_formats();
        let derive_fmt = |key| dict_fmt.get(&key).cloned().unwrap_or_default();
        Self::new(
            derive_fmt(EnumFmtKey::Text),
            derive_fmt(EnumFmtKey::Header),
            derive_fmt(EnumFmtKey::Title),
        )
    }
}

impl XlsxWriter {
    /// Create writer with explicit format presets.
    ///
    /// The workbook is buffered in memory until [`WorkbookSink::write_file`] is called.
    pub fn new(
        fmt_text: SpecCellFormat,
        fmt_header: SpecCellFormat,
        fmt_title: SpecCellFormat,
    ) -> Self {
        Self {
            workbook: Workbook::new(),
            fmt_text,
            fmt_header,
            fmt_title,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    fn derive_base_format(&self, key: EnumFmtKey) -> &SpecCellFormat {
        match key {
            EnumFmtKey::Text => &self.fmt_text,
            EnumFmtKey::Header => &self.fmt_header,
            EnumFmtKey::Title => &self.fmt_title,
        }
    }

    /// Format of every cell to be written: present cells, bordered cells and
    /// every cell covered by a merge, each with its own border edges.
    pub fn plan_cell_formats(
        &self,
        grid: &SpecSheetGrid,
        borders: &DictCellBorders,
        options: &SpecXlsxSheetWriteOptions,
    ) -> BTreeMap<(usize, usize), SpecCellFormat> {
        let l_merged_cells = grid.merges.iter().flat_map(|merge| {
            (merge.col_idx_start..=merge.col_idx_end).map(move |col_idx| (merge.row_idx, col_idx))
        });

        grid.cells
            .keys()
            .chain(borders.keys())
            .copied()
            .chain(l_merged_cells)
            .map(|(row_idx, col_idx)| {
                let border = borders
                    .get(&(row_idx, col_idx))
                    .copied()
                    .unwrap_or_default();
                let fmt_spec = self
                    .derive_base_format(options.derive_fmt_key(row_idx))
                    .with_border(&border);
                ((row_idx, col_idx), fmt_spec)
            })
            .collect()
    }

    fn write_sheet(
        &mut self,
        grid: &SpecSheetGrid,
        borders: &DictCellBorders,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<String, String> {
        validate_horizontal_merges(&grid.merges)?;

        let mut report = SpecXlsxReport::default();

        let c_name_sanitized = sanitize_sheet_name(sheet_name, "");
        if c_name_sanitized != sheet_name {
            report.warn(format!(
                "Sheet name {sheet_name:?} adjusted to {c_name_sanitized:?}."
            ));
        }
        let c_name_unique =
            derive_unique_sheet_name(&c_name_sanitized, &mut self.set_sheet_names_existing);
        if c_name_unique != c_name_sanitized {
            report.warn(format!(
                "Duplicate sheet name {c_name_sanitized:?} renamed to {c_name_unique:?}."
            ));
        }

        let dict_fmt_plan = self.plan_cell_formats(grid, borders, options);
        let dict_merge_tracker = derive_horizontal_merge_tracker(&grid.merges);

        let mut dict_fmt_cache: HashMap<SpecCellFormat, Format> = HashMap::new();
        let l_cells_formatted: Vec<(usize, usize, Format)> = dict_fmt_plan
            .into_iter()
            .map(|((row_idx, col_idx), fmt_spec)| {
                let fmt_cell = dict_fmt_cache
                    .entry(fmt_spec)
                    .or_insert_with_key(derive_rust_xlsx_format)
                    .clone();
                (row_idx, col_idx, fmt_cell)
            })
            .collect();
        let dict_fmt_anchors: HashMap<(usize, usize), &Format> = l_cells_formatted
            .iter()
            .map(|(row_idx, col_idx, fmt_cell)| ((*row_idx, *col_idx), fmt_cell))
            .collect();

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&c_name_unique)
            .map_err(derive_xlsx_error_text)?;

        let set_merge_anchors: BTreeSet<(usize, usize)> = grid
            .merges
            .iter()
            .map(|merge| (merge.row_idx, merge.col_idx_start))
            .collect();

        for merge in &grid.merges {
            let c_text = match grid.get(merge.row_idx, merge.col_idx_start) {
                Some(EnumCellValue::String(val)) => val.clone(),
                Some(EnumCellValue::Number(val)) => val.to_string(),
                Some(EnumCellValue::None) | None => String::new(),
            };
            let fmt_merge = dict_fmt_anchors
                .get(&(merge.row_idx, merge.col_idx_start))
                .map(|fmt_anchor| (*fmt_anchor).clone())
                .unwrap_or_default();
            worksheet
                .merge_range(
                    cast_row_num(merge.row_idx)?,
                    cast_col_num(merge.col_idx_start)?,
                    cast_row_num(merge.row_idx)?,
                    cast_col_num(merge.col_idx_end)?,
                    &c_text,
                    &fmt_merge,
                )
                .map_err(derive_xlsx_error_text)?;
        }

        // Covered cells are rewritten as blanks so each keeps its own borders.
        for (row_idx, col_idx, fmt_cell) in &l_cells_formatted {
            if set_merge_anchors.contains(&(*row_idx, *col_idx)) {
                continue;
            }
            let value = if dict_merge_tracker.contains_key(&(*row_idx, *col_idx)) {
                EnumCellValue::None
            } else {
                grid.get(*row_idx, *col_idx)
                    .cloned()
                    .unwrap_or(EnumCellValue::None)
            };
            write_cell_with_format(worksheet, *row_idx, *col_idx, &value, fmt_cell)?;
        }

        for (col_idx, n_width) in grid.col_widths.iter().enumerate() {
            worksheet
                .set_column_width(cast_col_num(col_idx)?, *n_width)
                .map_err(derive_xlsx_error_text)?;
        }

        for c_warning in &report.warnings {
            warn!("{c_warning}");
        }
        debug!(
            sheet = %c_name_unique,
            cells = l_cells_formatted.len(),
            merges = grid.merges.len(),
            "sheet written"
        );

        report.sheet_name = c_name_unique.clone();
        report.n_cells = l_cells_formatted.len();
        report.n_merges = grid.merges.len();
        self.l_reports.push(report);
        Ok(c_name_unique)
    }
}

impl WorkbookSink for XlsxWriter {
    fn append_sheet(
        &mut self,
        grid: &SpecSheetGrid,
        borders: &DictCellBorders,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<String, String> {
        if self.if_closed {
            return Err("Cannot write after write_file().".to_string());
        }
        self.write_sheet(grid, borders, sheet_name, options)
    }

    /// Flush workbook to disk. Idempotent.
    fn write_file(&mut self, path: &Path) -> Result<(), String> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(path).map_err(derive_xlsx_error_text)?;
        self.if_closed = true;
        Ok(())
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    match value {
        EnumCellValue::String(val) if !val.is_empty() => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    *val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(_) | EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = spec.top {
        format = format
            .set_border_top(derive_format_border(val))
            .set_border_top_color(derive_border_color(val));
    }
    if let Some(val) = spec.bottom {
        format = format
            .set_border_bottom(derive_format_border(val))
            .set_border_bottom_color(derive_border_color(val));
    }
    if let Some(val) = spec.left {
        format = format
            .set_border_left(derive_format_border(val))
            .set_border_left_color(derive_border_color(val));
    }
    if let Some(val) = spec.right {
        format = format
            .set_border_right(derive_format_border(val))
            .set_border_right_color(derive_border_color(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: EnumBorderWeight) -> FormatBorder {
    match border {
        EnumBorderWeight::Thin => FormatBorder::Thin,
        EnumBorderWeight::Medium => FormatBorder::Medium,
        EnumBorderWeight::Dotted => FormatBorder::Dotted,
    }
}

fn derive_border_color(border: EnumBorderWeight) -> Color {
    match border {
        EnumBorderWeight::Dotted => Color::RGB(N_RGB_BORDER_DOTTED),
        EnumBorderWeight::Thin | EnumBorderWeight::Medium => Color::RGB(N_RGB_BORDER_SOLID),
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}
