//! Border styling pass over a composed floor sheet.
//!
//! Regions are applied in order: main table, heavy dividers, side panels. A
//! later patch only replaces the edges it sets.

use releve_io_xlsx::{DictCellBorders, EnumBorderWeight, SpecCellBorder, SpecSheetGrid};
use tracing::debug;

use crate::conf::{
    L_SIDE_PANELS, N_COL_TABLE_LAST, N_ROW_DATA_FIRST, N_ROW_HEADER_GROUP, TUP_HEAVY_DIVIDER_COLS,
};
use crate::spec::{SpecFloorSheet, SpecPanelRegion, SpecStyledSheet};

/// Annotate the main table, divider columns and side panels with borders.
///
/// Styled cells missing from the grid are added as empty strings; present
/// values are never replaced. Running it again on its own output gives the
/// same grid and the same borders.
pub fn apply_border_styles(sheet: &SpecFloorSheet) -> SpecStyledSheet {
    let mut grid = sheet.grid.clone();
    let mut dict_borders = DictCellBorders::new();

    let n_row_table_last = N_ROW_DATA_FIRST + sheet.n_rows_data - 1;

    for row_idx in N_ROW_HEADER_GROUP..=n_row_table_last {
        for col_idx in 0..=N_COL_TABLE_LAST {
            patch_cell(
                &mut grid,
                &mut dict_borders,
                row_idx,
                col_idx,
                SpecCellBorder::all(EnumBorderWeight::Thin),
            );
        }
    }

    for row_idx in N_ROW_HEADER_GROUP..=n_row_table_last {
        for col_idx in TUP_HEAVY_DIVIDER_COLS {
            patch_cell(
                &mut grid,
                &mut dict_borders,
                row_idx,
                col_idx,
                SpecCellBorder {
                    right: Some(EnumBorderWeight::Medium),
                    ..Default::default()
                },
            );
            if col_idx < N_COL_TABLE_LAST {
                patch_cell(
                    &mut grid,
                    &mut dict_borders,
                    row_idx,
                    col_idx + 1,
                    SpecCellBorder {
                        left: Some(EnumBorderWeight::Medium),
                        ..Default::default()
                    },
                );
            }
        }
    }

    for region in &L_SIDE_PANELS {
        apply_panel_borders(&mut grid, &mut dict_borders, region);
    }

    debug!(
        cells_styled = dict_borders.len(),
        table_last_row = n_row_table_last,
        "borders applied"
    );

    SpecStyledSheet {
        grid,
        borders: dict_borders,
        n_rows_data: sheet.n_rows_data,
    }
}

fn apply_panel_borders(
    grid: &mut SpecSheetGrid,
    dict_borders: &mut DictCellBorders,
    region: &SpecPanelRegion,
) {
    for row_idx in region.row_first..=region.row_last {
        let top = if row_idx == region.row_first {
            EnumBorderWeight::Thin
        } else {
            EnumBorderWeight::Dotted
        };
        for col_idx in region.col_first..=region.col_last {
            let patch = SpecCellBorder {
                top: Some(top),
                bottom: (row_idx == region.row_last).then_some(EnumBorderWeight::Thin),
                left: (col_idx == region.col_first).then_some(EnumBorderWeight::Thin),
                right: (col_idx == region.col_last).then_some(EnumBorderWeight::Thin),
            };
            patch_cell(grid, dict_borders, row_idx, col_idx, patch);
        }
    }
}

fn patch_cell(
    grid: &mut SpecSheetGrid,
    dict_borders: &mut DictCellBorders,
    row_idx: usize,
    col_idx: usize,
    patch: SpecCellBorder,
) {
    grid.cells.entry((row_idx, col_idx)).or_insert_with(|| "".into());
    let border = dict_borders.entry((row_idx, col_idx)).or_default();
    *border = border.merge(&patch);
}
