//! `releve_io_xlsx` v1:
//! XLSX sink for pre-laid-out sheet grids.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : grid/border/format models
//! - `util`   : pure helper functions
//! - `writer` : `rust_xlsxwriter`-backed sink
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
pub use spec::{
    DictCellBorders, EnumBorderWeight, EnumCellValue, SpecCellBorder, SpecCellFormat,
    SpecSheetGrid, SpecSheetHorizontalMerge, SpecXlsxReport,
};
pub use util::{derive_unique_sheet_name, sanitize_sheet_name};
pub use writer::{SpecXlsxSheetWriteOptions, WorkbookSink, XlsxWriter};
