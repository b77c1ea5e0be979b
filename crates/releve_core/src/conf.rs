//! Survey sheet template constants and default export options.

use std::path::PathBuf;

use crate::spec::SpecPanelRegion;

////////////////////////////////////////////////////////////////////////////////
// #region StaticBlocks

pub const N_ROW_TITLE: usize = 0;
pub const C_TITLE: &str = "Liste des locaux";
pub const N_COL_COMPANY: usize = 48;
pub const C_COMPANY: &str = "RHÔNELECTRA ENGINEERING";
pub const N_ROW_PAGE: usize = 1;
pub const C_PAGE: &str = "page n°";

pub const N_ROW_SITE: usize = 2;
pub const C_SITE_LABEL: &str = "Désignation du site :";
pub const N_COL_SITE_NAME: usize = 3;

pub const N_COL_CONDITIONS: usize = 28;
pub const C_CONDITIONS_LABEL: &str = "Conditions du relevé :";
pub const N_ROW_CONDITIONS_FIRST: usize = 3;
pub const L_CONDITIONS: [&str; 6] = [
    "- visuelle uniquement et sans outil particulier",
    "- pas de manœuvre sur les raccordements électriques",
    "- pas de démontage, ni manutention de faux-plafond admis",
    "- seuls les diffuseurs et sources lumineuses peuvent être manipulés",
    "- démontage des downlight pour accès au diamètre d’encastrement si les conditions le permettent",
    "- consignes de sécurité à respecter et mise en œuvre dans le cadre de travaux en hauteur",
];

pub const N_COL_LEVEL_MARK: usize = 14;
pub const N_COL_LEVEL_NAME: usize = 16;
pub const C_LEVEL_LABEL: &str = "Niveau examiné";
pub const N_ROW_LEVEL_HEADER: usize = 3;
pub const C_LEVEL_MARK_HEADER: &str = "No du niveau";
pub const C_LEVEL_NAME_HEADER: &str = "Niveau";
pub const N_ROW_LEVEL_FIRST: usize = 4;
/// Floor-name vocabulary; the first entry found in the name is marked.
pub const L_LEVEL_VOCABULARY: [&str; 6] = ["sous-sol", "rez", "rez inf", "rez sup", "étage", "autre"];

pub const N_ROW_OBSERVATIONS: usize = 9;
pub const C_OBSERVATIONS_LABEL: &str = "Observations :";

/// Static template merges as `(row, col_start, col_end)`.
pub const L_TEMPLATE_MERGES: [(usize, usize, usize); 3] = [(0, 0, 10), (2, 14, 20), (2, 28, 47)];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Table

pub const N_ROW_HEADER_GROUP: usize = 11;
pub const N_ROW_HEADER_OPTION: usize = 12;
pub const N_ROW_DATA_FIRST: usize = 13;
pub const N_ROWS_DATA_MIN: usize = 20;
pub const N_COL_TABLE_LAST: usize = 50;

pub const L_STATIC_COLUMN_LABELS: [&str; 3] = [
    "N° de la salle\nou description",
    "Quantité de luminaires",
    "N° du luminaire-type",
];
pub const L_STATIC_COLUMN_WIDTHS: [f64; 3] = [30.0, 10.0, 20.0];
pub const N_WIDTH_OPTION_MIN: usize = 5;

/// Presence mark written in the matching option column.
pub const C_MARK: &str = "x";

/// Columns whose right edge is drawn medium.
pub const TUP_HEAVY_DIVIDER_COLS: [usize; 6] = [2, 19, 25, 35, 48, 50];

/// Level-examined, conditions and observations panels.
pub const L_SIDE_PANELS: [SpecPanelRegion; 3] = [
    SpecPanelRegion {
        row_first: 2,
        row_last: 9,
        col_first: 13,
        col_last: 17,
    },
    SpecPanelRegion {
        row_first: 2,
        row_last: 8,
        col_first: 28,
        col_last: 51,
    },
    SpecPanelRegion {
        row_first: 9,
        row_last: 10,
        col_first: 28,
        col_last: 51,
    },
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

pub const C_FILE_NAME_PREFIX: &str = "Relevé_";
pub const C_FILE_NAME_EXT: &str = "xlsx";

/// Workbook export options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportOptions {
    /// Directory receiving the workbook.
    pub dir_out: PathBuf,
    /// Data rows are padded with blanks up to this count.
    pub n_rows_data_min: usize,
    /// File name prefix placed before the school name.
    pub file_name_prefix: String,
    /// File extension without dot.
    pub file_name_ext: String,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        Self {
            dir_out: PathBuf::from("."),
            n_rows_data_min: N_ROWS_DATA_MIN,
            file_name_prefix: C_FILE_NAME_PREFIX.to_string(),
            file_name_ext: C_FILE_NAME_EXT.to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
