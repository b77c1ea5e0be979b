//! Inventory data model, derived layout models and error types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use releve_io_xlsx::{
    DictCellBorders, SpecSheetGrid, SpecSheetHorizontalMerge, SpecXlsxReport,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{C_OPTION_OTHER, EnumAttributeKey};

////////////////////////////////////////////////////////////////////////////////
// #region Hierarchy

/// Whole persisted tree. Children sit behind `Arc` so that a mutation only
/// copies the nodes on the edited path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpecRootData {
    #[serde(rename = "ecoles", default)]
    pub schools: Vec<Arc<SpecSchool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecSchool {
    pub id: String,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "etages", default)]
    pub floors: Vec<Arc<SpecFloor>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecFloor {
    pub id: String,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "locaux", default)]
    pub rooms: Vec<Arc<SpecRoom>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecRoom {
    pub id: String,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "luminaires", default)]
    pub fixtures: Vec<Arc<SpecFixture>>,
}

/// One light fixture line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecFixture {
    pub id: String,
    #[serde(rename = "quantite")]
    pub quantity: u32,
    /// Free-text type number (e.g. `LT-23`).
    #[serde(rename = "numero_type", default)]
    pub type_number: String,
    #[serde(flatten)]
    pub attributes: SpecFixtureAttributes,
}

/// Value of one categorical attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumAttributeValue {
    /// One of the registry options.
    Known(String),
    /// The "other" sentinel with its free-text elaboration (may be empty).
    Other(String),
}

/// The six categorical attributes of a fixture.
///
/// Stored as plain registry strings; an "other" value is stored as the
/// sentinel option with its text under `autres_precisions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "SpecFixtureAttributesStored",
    into = "SpecFixtureAttributesStored"
)]
pub struct SpecFixtureAttributes {
    pub type_luminaire: EnumAttributeValue,
    pub situation_pose: EnumAttributeValue,
    pub type_support: EnumAttributeValue,
    pub type_source_lumineuse: EnumAttributeValue,
    pub affectation_luminaire: EnumAttributeValue,
    pub moyen_levage: EnumAttributeValue,
}

impl Default for SpecFixtureAttributes {
    fn default() -> Self {
        Self {
            type_luminaire: EnumAttributeKey::TypeLuminaire.default_value(),
            situation_pose: EnumAttributeKey::SituationPose.default_value(),
            type_support: EnumAttributeKey::TypeSupport.default_value(),
            type_source_lumineuse: EnumAttributeKey::TypeSourceLumineuse.default_value(),
            affectation_luminaire: EnumAttributeKey::AffectationLuminaire.default_value(),
            moyen_levage: EnumAttributeKey::MoyenLevage.default_value(),
        }
    }
}

impl SpecFixtureAttributes {
    pub fn get(&self, key: EnumAttributeKey) -> &EnumAttributeValue {
        match key {
            EnumAttributeKey::TypeLuminaire => &self.type_luminaire,
            EnumAttributeKey::SituationPose => &self.situation_pose,
            EnumAttributeKey::TypeSupport => &self.type_support,
            EnumAttributeKey::TypeSourceLumineuse => &self.type_source_lumineuse,
            EnumAttributeKey::AffectationLuminaire => &self.affectation_luminaire,
            EnumAttributeKey::MoyenLevage => &self.moyen_levage,
        }
    }

    /// Return a copy with `key` set to `value`.
    pub fn with(mut self, key: EnumAttributeKey, value: EnumAttributeValue) -> Self {
        let slot = match key {
            EnumAttributeKey::TypeLuminaire => &mut self.type_luminaire,
            EnumAttributeKey::SituationPose => &mut self.situation_pose,
            EnumAttributeKey::TypeSupport => &mut self.type_support,
            EnumAttributeKey::TypeSourceLumineuse => &mut self.type_source_lumineuse,
            EnumAttributeKey::AffectationLuminaire => &mut self.affectation_luminaire,
            EnumAttributeKey::MoyenLevage => &mut self.moyen_levage,
        };
        *slot = value;
        self
    }
}

#[derive(Serialize, Deserialize)]
struct SpecFixtureAttributesStored {
    type_luminaire: String,
    situation_pose: String,
    type_support: String,
    type_source_lumineuse: String,
    affectation_luminaire: String,
    moyen_levage: String,
    /// Elaboration text keyed by field name; only non-empty texts are kept.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    autres_precisions: BTreeMap<String, String>,
}

impl SpecFixtureAttributesStored {
    fn slot(&self, key: EnumAttributeKey) -> &String {
        match key {
            EnumAttributeKey::TypeLuminaire => &self.type_luminaire,
            EnumAttributeKey::SituationPose => &self.situation_pose,
            EnumAttributeKey::TypeSupport => &self.type_support,
            EnumAttributeKey::TypeSourceLumineuse => &self.type_source_lumineuse,
            EnumAttributeKey::AffectationLuminaire => &self.affectation_luminaire,
            EnumAttributeKey::MoyenLevage => &self.moyen_levage,
        }
    }
}

impl From<SpecFixtureAttributesStored> for SpecFixtureAttributes {
    fn from(stored: SpecFixtureAttributesStored) -> Self {
        EnumAttributeKey::ALL
            .into_iter()
            .fold(SpecFixtureAttributes::default(), |attributes, key| {
                let c_stored = stored.slot(key);
                let value = if key.allows_other() && c_stored == C_OPTION_OTHER {
                    let c_text = stored
                        .autres_precisions
                        .get(key.field_name())
                        .cloned()
                        .unwrap_or_default();
                    EnumAttributeValue::Other(c_text)
                } else {
                    EnumAttributeValue::Known(c_stored.clone())
                };
                attributes.with(key, value)
            })
    }
}

impl From<SpecFixtureAttributes> for SpecFixtureAttributesStored {
    fn from(attributes: SpecFixtureAttributes) -> Self {
        let mut autres_precisions = BTreeMap::new();
        let [
            type_luminaire,
            situation_pose,
            type_support,
            type_source_lumineuse,
            affectation_luminaire,
            moyen_levage,
        ] = EnumAttributeKey::ALL.map(|key| match attributes.get(key) {
            EnumAttributeValue::Known(val) => val.clone(),
            EnumAttributeValue::Other(text) => {
                if !text.is_empty() {
                    autres_precisions.insert(key.field_name().to_string(), text.clone());
                }
                C_OPTION_OTHER.to_string()
            }
        });
        Self {
            type_luminaire,
            situation_pose,
            type_support,
            type_source_lumineuse,
            affectation_luminaire,
            moyen_levage,
            autres_precisions,
        }
    }
}

/// Fixture form input. `id == None` creates a new fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFixtureDraft {
    pub id: Option<String>,
    pub quantity: u32,
    pub type_number: String,
    pub attributes: SpecFixtureAttributes,
}

impl Default for SpecFixtureDraft {
    fn default() -> Self {
        Self {
            id: None,
            quantity: 1,
            type_number: String::new(),
            attributes: SpecFixtureAttributes::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LayoutModels

/// One exported data row. `fixture == None` marks the placeholder of an empty room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecFlattenedRow<'a> {
    pub room_name: &'a str,
    pub fixture: Option<&'a SpecFixture>,
}

/// Two-row table header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHeaderLayout {
    /// Group labels on each group's first column, blanks elsewhere.
    pub header_row_1: Vec<String>,
    /// Static labels followed by every option label.
    pub header_row_2: Vec<String>,
    /// One merge per multi-option group, on header row 1.
    pub merges: Vec<SpecSheetHorizontalMerge>,
    /// First column of each group, in group order.
    pub group_col_starts: Vec<usize>,
}

/// Composed floor sheet before styling.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFloorSheet {
    pub grid: SpecSheetGrid,
    /// Data rows including blank padding.
    pub n_rows_data: usize,
    /// Data rows produced by rooms/fixtures.
    pub n_rows_real: usize,
}

/// Floor sheet with border annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecStyledSheet {
    pub grid: SpecSheetGrid,
    pub borders: DictCellBorders,
    pub n_rows_data: usize,
}

/// Inclusive rectangular side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecPanelRegion {
    pub row_first: usize,
    pub row_last: usize,
    pub col_first: usize,
    pub col_last: usize,
}

/// Outcome of one workbook export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportReport {
    /// Written file; `None` when exported to a caller-owned sink.
    pub path_file_out: Option<PathBuf>,
    /// Final sheet names, in floor order.
    pub sheet_names: Vec<String>,
    /// Data rows per sheet, excluding padding.
    pub rows_real_by_sheet: Vec<usize>,
    /// Writer reports (cell/merge counts, name warnings); empty for caller-owned sinks.
    pub reports_by_sheet: Vec<SpecXlsxReport>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Selection

/// Current navigation path. A cleared level implies cleared descendants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSelection {
    pub school_id: Option<String>,
    pub floor_id: Option<String>,
    pub room_id: Option<String>,
    pub fixture_id: Option<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Rejected CRUD operation. The tree is left unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Le nom ne peut pas être vide.")]
    EmptyName,
    #[error("Valeur {value:?} invalide pour « {label} ».")]
    InvalidAttribute { label: &'static str, value: String },
    #[error("Aucune école n'est sélectionnée.")]
    NoSchoolSelected,
    #[error("Aucun étage n'est sélectionné.")]
    NoFloorSelected,
    #[error("Local non trouvé.")]
    NoRoomSelected,
    #[error("Élément introuvable : {0}")]
    NotFound(String),
}

/// Export failure. No file is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("Veuillez sélectionner une école à exporter.")]
    NoSchoolSelected,
    #[error("Cette école n'a pas d'étages à exporter.")]
    NoFloors,
    #[error("Échec de la génération du classeur : {0}")]
    Sink(String),
}

/// Persistence failure. Never rolls back in-memory state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid stored data: {0}")]
    Invalid(String),
    #[error("storage error: {0}")]
    Storage(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
