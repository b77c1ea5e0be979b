//! Floor sheet layout: two-row grouped header and the composed cell grid.

use releve_io_xlsx::{EnumCellValue, SpecSheetGrid, SpecSheetHorizontalMerge};
use tracing::debug;

use crate::conf::{
    C_COMPANY, C_CONDITIONS_LABEL, C_LEVEL_LABEL, C_LEVEL_MARK_HEADER, C_LEVEL_NAME_HEADER,
    C_MARK, C_OBSERVATIONS_LABEL, C_PAGE, C_SITE_LABEL, C_TITLE, L_CONDITIONS, L_LEVEL_VOCABULARY,
    L_STATIC_COLUMN_WIDTHS, L_TEMPLATE_MERGES, N_COL_COMPANY, N_COL_CONDITIONS, N_COL_LEVEL_MARK,
    N_COL_LEVEL_NAME, N_COL_SITE_NAME, N_ROW_CONDITIONS_FIRST, N_ROW_DATA_FIRST,
    N_ROW_HEADER_GROUP, N_ROW_HEADER_OPTION, N_ROW_LEVEL_FIRST, N_ROW_LEVEL_HEADER,
    N_ROW_OBSERVATIONS, N_ROW_PAGE, N_ROW_SITE, N_ROW_TITLE, N_WIDTH_OPTION_MIN,
};
use crate::registry::SpecAttributeGroup;
use crate::spec::{SpecFloor, SpecFloorSheet, SpecHeaderLayout};
use crate::util::{derive_fixture_type_label, derive_level_index, flatten_floor_rows};

////////////////////////////////////////////////////////////////////////////////
// #region HeaderLayout

/// Build the grouped header: static labels, then one column per option.
///
/// Groups start at `static_labels.len() + sum(previous option counts)`; groups
/// with a single option get no merge.
pub fn build_header_layout(
    groups: &[SpecAttributeGroup],
    static_labels: &[&str],
    row_idx_merge: usize,
) -> SpecHeaderLayout {
    let mut header_row_1: Vec<String> = static_labels.iter().map(|_| String::new()).collect();
    let mut header_row_2: Vec<String> = static_labels.iter().map(|c| c.to_string()).collect();
    let mut merges = Vec::new();
    let mut group_col_starts = Vec::with_capacity(groups.len());

    let mut n_col_current = static_labels.len();
    for group in groups {
        group_col_starts.push(n_col_current);

        header_row_1.push(group.display_label.to_string());
        header_row_1.extend((1..group.options.len()).map(|_| String::new()));
        header_row_2.extend(group.options.iter().map(|opt| opt.to_string()));

        if group.options.len() > 1 {
            merges.push(SpecSheetHorizontalMerge {
                row_idx: row_idx_merge,
                col_idx_start: n_col_current,
                col_idx_end: n_col_current + group.options.len() - 1,
            });
        }
        n_col_current += group.options.len();
    }

    SpecHeaderLayout {
        header_row_1,
        header_row_2,
        merges,
        group_col_starts,
    }
}

/// Fixed widths for the static columns, `max(5, label length)` for option columns.
pub fn derive_column_widths(header_row_2: &[String]) -> Vec<f64> {
    header_row_2
        .iter()
        .enumerate()
        .map(|(col_idx, label)| match L_STATIC_COLUMN_WIDTHS.get(col_idx) {
            Some(n_width) => *n_width,
            None => usize::max(N_WIDTH_OPTION_MIN, label.chars().count()) as f64,
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridComposer

/// Compose the full floor sheet: template blocks, header rows 11-12, data rows
/// from row 13 padded with blank rows up to `n_rows_data_min`.
pub fn compose_floor_grid(
    school_name: &str,
    floor: &SpecFloor,
    groups: &[SpecAttributeGroup],
    layout: &SpecHeaderLayout,
    n_rows_data_min: usize,
) -> SpecFloorSheet {
    let mut grid = SpecSheetGrid::default();

    write_template_blocks(&mut grid, school_name, &floor.name);

    for (col_idx, label) in layout.header_row_1.iter().enumerate() {
        grid.set(N_ROW_HEADER_GROUP, col_idx, label.as_str());
    }
    for (col_idx, label) in layout.header_row_2.iter().enumerate() {
        grid.set(N_ROW_HEADER_OPTION, col_idx, label.as_str());
    }

    let mut n_rows_real = 0;
    for (n_idx_row, row) in flatten_floor_rows(floor).enumerate() {
        let row_idx = N_ROW_DATA_FIRST + n_idx_row;
        n_rows_real += 1;

        grid.set(row_idx, 0, row.room_name);
        let Some(fixture) = row.fixture else {
            for col_idx in 1..layout.header_row_2.len() {
                grid.set(row_idx, col_idx, "");
            }
            continue;
        };

        if fixture.quantity == 0 {
            grid.set(row_idx, 1, "");
        } else {
            grid.set(row_idx, 1, EnumCellValue::Number(f64::from(fixture.quantity)));
        }
        grid.set(row_idx, 2, derive_fixture_type_label(fixture));

        for (group, n_col_start) in groups.iter().zip(&layout.group_col_starts) {
            let n_pos_marked = group.key.position(fixture.attributes.get(group.key));
            for n_pos in 0..group.options.len() {
                let c_value = if Some(n_pos) == n_pos_marked { C_MARK } else { "" };
                grid.set(row_idx, n_col_start + n_pos, c_value);
            }
        }
    }

    grid.merges = L_TEMPLATE_MERGES
        .iter()
        .map(|(row_idx, col_idx_start, col_idx_end)| SpecSheetHorizontalMerge {
            row_idx: *row_idx,
            col_idx_start: *col_idx_start,
            col_idx_end: *col_idx_end,
        })
        .chain(layout.merges.iter().cloned())
        .collect();
    grid.col_widths = derive_column_widths(&layout.header_row_2);

    let n_rows_data = usize::max(n_rows_real, n_rows_data_min);
    debug!(
        floor = %floor.name,
        rows_real = n_rows_real,
        rows_padding = n_rows_data - n_rows_real,
        "floor grid composed"
    );

    SpecFloorSheet {
        grid,
        n_rows_data,
        n_rows_real,
    }
}

fn write_template_blocks(grid: &mut SpecSheetGrid, school_name: &str, floor_name: &str) {
    grid.set(N_ROW_TITLE, 0, C_TITLE);
    grid.set(N_ROW_TITLE, N_COL_COMPANY, C_COMPANY);
    grid.set(N_ROW_PAGE, N_COL_COMPANY, C_PAGE);
    grid.set(N_ROW_SITE, 0, C_SITE_LABEL);
    grid.set(N_ROW_SITE, N_COL_SITE_NAME, school_name);

    grid.set(N_ROW_SITE, N_COL_CONDITIONS, C_CONDITIONS_LABEL);
    for (n_idx, c_line) in L_CONDITIONS.iter().enumerate() {
        grid.set(N_ROW_CONDITIONS_FIRST + n_idx, N_COL_CONDITIONS, *c_line);
    }

    grid.set(N_ROW_SITE, N_COL_LEVEL_MARK, C_LEVEL_LABEL);
    grid.set(N_ROW_LEVEL_HEADER, N_COL_LEVEL_MARK, C_LEVEL_MARK_HEADER);
    grid.set(N_ROW_LEVEL_HEADER, N_COL_LEVEL_NAME, C_LEVEL_NAME_HEADER);
    let n_idx_level_marked = derive_level_index(floor_name);
    for (n_idx, c_level) in L_LEVEL_VOCABULARY.iter().enumerate() {
        if Some(n_idx) == n_idx_level_marked {
            grid.set(N_ROW_LEVEL_FIRST + n_idx, N_COL_LEVEL_MARK, C_MARK);
        }
        grid.set(N_ROW_LEVEL_FIRST + n_idx, N_COL_LEVEL_NAME, *c_level);
    }

    grid.set(N_ROW_OBSERVATIONS, N_COL_CONDITIONS, C_OBSERVATIONS_LABEL);
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::conf::{L_STATIC_COLUMN_LABELS, N_ROWS_DATA_MIN};
    use crate::registry::{EnumAttributeKey, derive_attribute_groups};
    use crate::spec::{EnumAttributeValue, SpecFixture, SpecFixtureAttributes, SpecRoom};

    fn create_floor(name: &str, fixtures_per_room: &[usize]) -> SpecFloor {
        let rooms = fixtures_per_room
            .iter()
            .enumerate()
            .map(|(n_idx, n_fixtures)| {
                Arc::new(SpecRoom {
                    id: format!("r{n_idx}"),
                    name: format!("Salle {n_idx}"),
                    fixtures: (0..*n_fixtures)
                        .map(|n| {
                            Arc::new(SpecFixture {
                                id: format!("{n_idx}-{n}"),
                                quantity: 3,
                                type_number: format!("LT-{n}"),
                                attributes: SpecFixtureAttributes::default(),
                            })
                        })
                        .collect(),
                })
            })
            .collect();
        SpecFloor {
            id: "f".to_string(),
            name: name.to_string(),
            rooms,
        }
    }

    fn compose(floor: &SpecFloor) -> SpecFloorSheet {
        let groups = derive_attribute_groups();
        let layout = build_header_layout(&groups, &L_STATIC_COLUMN_LABELS, N_ROW_HEADER_GROUP);
        compose_floor_grid("Ecole A", floor, &groups, &layout, N_ROWS_DATA_MIN)
    }

    const fn create_group(
        key: EnumAttributeKey,
        display_label: &'static str,
        options: &'static [&'static str],
    ) -> SpecAttributeGroup {
        SpecAttributeGroup {
            key,
            display_label,
            options,
        }
    }

    #[test]
    fn test_header_layout_matches_registry() {
        let groups = derive_attribute_groups();
        let layout = build_header_layout(&groups, &L_STATIC_COLUMN_LABELS, N_ROW_HEADER_GROUP);

        let n_options: usize = groups.iter().map(|group| group.options.len()).sum();
        assert_eq!(layout.header_row_2.len(), 3 + n_options);
        assert_eq!(layout.header_row_2.len(), 51);
        assert_eq!(layout.header_row_1.len(), layout.header_row_2.len());
        assert_eq!(layout.group_col_starts, vec![3, 17, 20, 26, 36, 49]);

        assert_eq!(layout.header_row_1[..3], ["", "", ""]);
        assert_eq!(layout.header_row_1[3], "Type de luminaire");
        assert_eq!(layout.header_row_1[4], "");
        assert_eq!(layout.header_row_1[20], "Type de support");
        assert_eq!(layout.header_row_2[20], "Béton brut");

        assert_eq!(layout.merges.len(), groups.len());
        for (merge, group) in layout.merges.iter().zip(&groups) {
            assert_eq!(merge.row_idx, N_ROW_HEADER_GROUP);
            assert_eq!(merge.width(), group.options.len());
        }
    }

    #[test]
    fn test_header_layout_skips_merge_for_single_option_group() {
        let groups = [
            create_group(EnumAttributeKey::TypeLuminaire, "A", &["a1", "a2"]),
            create_group(EnumAttributeKey::SituationPose, "B", &["b1"]),
            create_group(EnumAttributeKey::TypeSupport, "C", &["c1", "c2", "c3"]),
        ];
        let layout = build_header_layout(&groups, &["s0", "s1", "s2"], 4);

        assert_eq!(
            layout.header_row_1,
            vec!["", "", "", "A", "", "B", "C", "", ""]
        );
        assert_eq!(
            layout.header_row_2,
            vec!["s0", "s1", "s2", "a1", "a2", "b1", "c1", "c2", "c3"]
        );
        assert_eq!(
            layout.merges,
            vec![
                SpecSheetHorizontalMerge {
                    row_idx: 4,
                    col_idx_start: 3,
                    col_idx_end: 4
                },
                SpecSheetHorizontalMerge {
                    row_idx: 4,
                    col_idx_start: 6,
                    col_idx_end: 8
                },
            ]
        );
    }

    #[test]
    fn test_column_widths_use_static_values_and_label_length() {
        let l_widths = derive_column_widths(&[
            "room".to_string(),
            "qty".to_string(),
            "type".to_string(),
            "spot".to_string(),
            "Tube fluorescent T5".to_string(),
        ]);
        assert_eq!(l_widths, vec![30.0, 10.0, 20.0, 5.0, 19.0]);
    }

    #[test]
    fn test_grid_pads_to_minimum_rows() {
        let sheet = compose(&create_floor("Rez", &[1, 1, 1]));
        assert_eq!(sheet.n_rows_real, 3);
        assert_eq!(sheet.n_rows_data, 20);
        assert_eq!(sheet.n_rows_data - sheet.n_rows_real, 17);
        assert!(sheet.grid.get(N_ROW_DATA_FIRST + 3, 0).is_none());

        let sheet = compose(&create_floor("Rez", &[10, 15]));
        assert_eq!(sheet.n_rows_real, 25);
        assert_eq!(sheet.n_rows_data, 25);
        assert_eq!(sheet.grid.height(), N_ROW_DATA_FIRST + 25);
    }

    #[test]
    fn test_grid_places_template_blocks() {
        let sheet = compose(&create_floor("Rez-de-chaussée", &[0]));
        let grid = &sheet.grid;

        assert_eq!(grid.text(0, 0), Some("Liste des locaux"));
        assert_eq!(grid.text(0, 48), Some("RHÔNELECTRA ENGINEERING"));
        assert_eq!(grid.text(1, 48), Some("page n°"));
        assert_eq!(grid.text(2, 0), Some("Désignation du site :"));
        assert_eq!(grid.text(2, 3), Some("Ecole A"));
        assert_eq!(grid.text(2, 28), Some("Conditions du relevé :"));
        for n_idx in 0..6 {
            assert_eq!(grid.text(3 + n_idx, 28), Some(L_CONDITIONS[n_idx]));
        }
        assert_eq!(grid.text(9, 28), Some("Observations :"));
        assert_eq!(grid.text(2, 14), Some("Niveau examiné"));
        assert_eq!(grid.text(3, 14), Some("No du niveau"));
        assert_eq!(grid.text(3, 16), Some("Niveau"));
        assert_eq!(grid.text(12, 0), Some(L_STATIC_COLUMN_LABELS[0]));

        // only "rez" is marked for "Rez-de-chaussée"
        let l_marked: Vec<usize> = (4..10)
            .filter(|row_idx| grid.text(*row_idx, 14) == Some("x"))
            .collect();
        assert_eq!(l_marked, vec![5]);
        assert_eq!(grid.text(5, 16), Some("rez"));

        assert!(grid.merges.iter().any(|merge| merge.row_idx == 0
            && merge.col_idx_start == 0
            && merge.col_idx_end == 10));
        assert_eq!(grid.merges.len(), 3 + 6);
        assert_eq!(grid.col_widths.len(), 51);
    }

    #[test]
    fn test_grid_level_unmatched_marks_nothing() {
        let sheet = compose(&create_floor("Combles", &[1]));
        assert!((4..10).all(|row_idx| sheet.grid.text(row_idx, 14).is_none()));
    }

    #[test]
    fn test_grid_marks_exactly_one_column_per_group() {
        let mut floor = create_floor("1er étage", &[1]);
        let room = Arc::make_mut(&mut floor.rooms[0]);
        let fixture = Arc::make_mut(&mut room.fixtures[0]);
        fixture.attributes = fixture.attributes.clone().with(
            EnumAttributeKey::TypeSupport,
            EnumAttributeValue::Known("Béton brut".to_string()),
        );
        fixture.attributes = fixture.attributes.clone().with(
            EnumAttributeKey::TypeSourceLumineuse,
            EnumAttributeValue::Other("sodium".to_string()),
        );

        let sheet = compose(&floor);
        let grid = &sheet.grid;
        let row_idx = N_ROW_DATA_FIRST;

        assert_eq!(grid.text(row_idx, 0), Some("Salle 0"));
        assert_eq!(grid.get(row_idx, 1), Some(&EnumCellValue::Number(3.0)));
        assert_eq!(grid.text(row_idx, 2), Some("LT-0 (source: sodium)"));

        // "Type de support" spans columns 20..=25, "Béton brut" first
        let l_support: Vec<&str> = (20..26)
            .map(|col_idx| grid.text(row_idx, col_idx).unwrap_or_default())
            .collect();
        assert_eq!(l_support, vec!["x", "", "", "", "", ""]);

        // "autre (préciser)" is the last source column (35)
        assert_eq!(grid.text(row_idx, 35), Some("x"));
        let n_marks = (3..51)
            .filter(|col_idx| grid.text(row_idx, *col_idx) == Some("x"))
            .count();
        assert_eq!(n_marks, 6);
    }

    #[test]
    fn test_grid_placeholder_row_is_blank_beyond_room_name() {
        let sheet = compose(&create_floor("Rez", &[0, 1]));
        let grid = &sheet.grid;

        assert_eq!(grid.text(13, 0), Some("Salle 0"));
        assert!((1..51).all(|col_idx| grid.get(13, col_idx).is_some_and(|v| v.is_blank())));
        assert_eq!(grid.text(14, 0), Some("Salle 1"));
    }

    #[test]
    fn test_grid_zero_quantity_is_blank() {
        let mut floor = create_floor("Rez", &[1]);
        let room = Arc::make_mut(&mut floor.rooms[0]);
        Arc::make_mut(&mut room.fixtures[0]).quantity = 0;

        let sheet = compose(&floor);
        assert_eq!(sheet.grid.text(13, 1), Some(""));
    }
}
