//! Stateless helper utilities used by the XLSX writer kernel.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    C_SHEET_NAME_FALLBACK, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::SpecSheetHorizontalMerge;

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and cut to a valid Excel sheet name.
///
/// Leading/trailing apostrophes are dropped as well; Excel rejects them.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    let c_name: String = c_name
        .trim_matches('\'')
        .chars()
        .take(N_LEN_EXCEL_SHEET_NAME_MAX)
        .collect();

    let c_name = c_name.trim_end_matches('\'');
    if c_name.trim().is_empty() {
        return C_SHEET_NAME_FALLBACK.to_string();
    }
    c_name.to_string()
}

/// Create suffixed sheet name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx: usize) -> String {
    let c_sheet_name_suffix = format!("__{part_idx}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

/// Return `name` or the first free suffixed variant, and record it as taken.
///
/// Names are compared case-insensitively, as Excel does.
pub fn derive_unique_sheet_name(name: &str, set_names_existing: &mut BTreeSet<String>) -> String {
    if set_names_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let mut n_idx = 2usize;
    loop {
        let candidate = create_sheet_identifier(name, n_idx);
        if set_names_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeUtils

/// Check that merges span >= 2 columns, stay within Excel limits and never overlap.
pub fn validate_horizontal_merges(merges: &[SpecSheetHorizontalMerge]) -> Result<(), String> {
    let mut set_cells_covered = BTreeSet::new();
    for merge in merges {
        if merge.col_idx_end <= merge.col_idx_start {
            return Err(format!(
                "Merge must span >= 2 columns: row={} cols={}..={}",
                merge.row_idx, merge.col_idx_start, merge.col_idx_end
            ));
        }
        if merge.row_idx >= N_NROWS_EXCEL_MAX || merge.col_idx_end >= N_NCOLS_EXCEL_MAX {
            return Err(format!(
                "Merge exceeds Excel limits: row={} cols={}..={}",
                merge.row_idx, merge.col_idx_start, merge.col_idx_end
            ));
        }
        for col_idx in merge.col_idx_start..=merge.col_idx_end {
            if !set_cells_covered.insert((merge.row_idx, col_idx)) {
                return Err(format!(
                    "Overlapping merges at row={} col={col_idx}",
                    merge.row_idx
                ));
            }
        }
    }
    Ok(())
}

/// Build lookup map for cells covered by a horizontal merge (excluding anchor).
pub fn derive_horizontal_merge_tracker(
    merges: &[SpecSheetHorizontalMerge],
) -> BTreeMap<(usize, usize), bool> {
    let mut dict_merged_cells_tracker = BTreeMap::new();

    for merge in merges {
        for col_idx in (merge.col_idx_start + 1)..=merge.col_idx_end {
            dict_merged_cells_tracker.insert((merge.row_idx, col_idx), true);
        }
    }

    dict_merged_cells_tracker
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
