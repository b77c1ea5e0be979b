//! Pure helpers shared by the layout pipeline and the inventory session.

use std::collections::BTreeSet;

use releve_io_xlsx::sanitize_sheet_name;

use crate::conf::L_LEVEL_VOCABULARY;
use crate::registry::EnumAttributeKey;
use crate::spec::{
    EnumAttributeValue, InventoryError, SpecFixture, SpecFixtureAttributes, SpecFlattenedRow,
    SpecFloor, SpecRootData,
};

////////////////////////////////////////////////////////////////////////////////
// #region RowFlattening

/// Yield one row per (room, fixture), and one placeholder row per empty room.
///
/// Call again to restart; the floor is only borrowed.
pub fn flatten_floor_rows(
    floor: &SpecFloor,
) -> impl Iterator<Item = SpecFlattenedRow<'_>> + Clone {
    floor.rooms.iter().flat_map(|room| {
        let placeholder = room.fixtures.is_empty().then_some(None);
        placeholder
            .into_iter()
            .chain(room.fixtures.iter().map(|fixture| Some(&**fixture)))
            .map(move |fixture| SpecFlattenedRow {
                room_name: &room.name,
                fixture,
            })
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Labels

/// Index into [`L_LEVEL_VOCABULARY`] of the first entry contained in `floor_name`.
pub fn derive_level_index(floor_name: &str) -> Option<usize> {
    let c_name = floor_name.to_lowercase();
    L_LEVEL_VOCABULARY
        .iter()
        .position(|level| c_name.contains(level))
}

/// Type number with the free-text elaborations of `Other` values appended,
/// e.g. `LT-23 (type: applique; support: bois)`.
pub fn derive_fixture_type_label(fixture: &SpecFixture) -> String {
    let l_elaborations: Vec<String> = EnumAttributeKey::ALL
        .iter()
        .filter_map(|key| match fixture.attributes.get(*key) {
            EnumAttributeValue::Other(text) if !text.trim().is_empty() => {
                Some(format!("{}: {}", key.elaboration_key(), text.trim()))
            }
            _ => None,
        })
        .collect();

    if l_elaborations.is_empty() {
        return fixture.type_number.clone();
    }
    format!("{} ({})", fixture.type_number, l_elaborations.join("; "))
}

/// Sheet name for a floor: forbidden characters removed, at most 31 characters.
pub fn derive_sheet_name(floor_name: &str) -> String {
    sanitize_sheet_name(floor_name, "")
}

/// `<prefix><school name with spaces as underscores>.<ext>`
pub fn derive_export_file_name(school_name: &str, prefix: &str, ext: &str) -> String {
    format!("{prefix}{}.{ext}", school_name.replace(' ', "_"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Validation

/// Trimmed name, or [`InventoryError::EmptyName`].
pub fn validate_name(name: &str) -> Result<String, InventoryError> {
    let c_name = name.trim();
    if c_name.is_empty() {
        return Err(InventoryError::EmptyName);
    }
    Ok(c_name.to_string())
}

/// Check every attribute against its registry list.
pub fn validate_fixture_attributes(attributes: &SpecFixtureAttributes) -> Result<(), InventoryError> {
    for key in EnumAttributeKey::ALL {
        let value = attributes.get(key);
        if key.position(value).is_none() {
            let c_value = match value {
                EnumAttributeValue::Known(val) | EnumAttributeValue::Other(val) => val.clone(),
            };
            return Err(InventoryError::InvalidAttribute {
                label: key.display_label(),
                value: c_value,
            });
        }
    }
    Ok(())
}

/// Check id uniqueness per collection and registry validity of every fixture.
pub fn validate_root(root: &SpecRootData) -> Result<(), String> {
    fn check_unique<'a>(
        scope: &str,
        ids: impl Iterator<Item = &'a String>,
    ) -> Result<(), String> {
        let mut set_ids = BTreeSet::new();
        for id in ids {
            if !set_ids.insert(id) {
                return Err(format!("duplicate {scope} id {id:?}"));
            }
        }
        Ok(())
    }

    check_unique("school", root.schools.iter().map(|school| &school.id))?;
    for school in &root.schools {
        check_unique("floor", school.floors.iter().map(|floor| &floor.id))?;
        for floor in &school.floors {
            check_unique("room", floor.rooms.iter().map(|room| &room.id))?;
            for room in &floor.rooms {
                check_unique("fixture", room.fixtures.iter().map(|fixture| &fixture.id))?;
                for fixture in &room.fixtures {
                    validate_fixture_attributes(&fixture.attributes)
                        .map_err(|err| format!("fixture {:?}: {err}", fixture.id))?;
                }
            }
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
