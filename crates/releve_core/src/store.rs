//! Persistence of the inventory tree behind a load/save trait.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use crate::spec::{SpecRootData, StoreError};
use crate::util::validate_root;

/// Storage key used by [`MemoryStore`].
pub const C_STORE_KEY: &str = "luminaireAppData";

/// Load/save of the whole tree.
pub trait TreeStore {
    /// Stored tree, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<SpecRootData>, StoreError>;

    /// Replace the stored tree.
    fn save(&self, root: &SpecRootData) -> Result<(), StoreError>;
}

fn decode_root(text: &str) -> Result<SpecRootData, StoreError> {
    let root: SpecRootData = serde_json::from_str(text)?;
    validate_root(&root).map_err(StoreError::Invalid)?;
    Ok(root)
}

////////////////////////////////////////////////////////////////////////////////
// #region JsonFileStore

/// JSON document on disk. Saves go through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path_file: PathBuf,
}

impl JsonFileStore {
    pub fn new(path_file: impl Into<PathBuf>) -> Self {
        Self {
            path_file: path_file.into(),
        }
    }

    fn derive_temp_path(&self) -> PathBuf {
        let mut c_name = self
            .path_file
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        c_name.push(".tmp");
        self.path_file.with_file_name(c_name)
    }
}

impl TreeStore for JsonFileStore {
    fn load(&self) -> Result<Option<SpecRootData>, StoreError> {
        if !self.path_file.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path_file)?;
        decode_root(&text).map(Some)
    }

    fn save(&self, root: &SpecRootData) -> Result<(), StoreError> {
        if let Some(dir_parent) = self.path_file.parent()
            && !dir_parent.as_os_str().is_empty()
        {
            fs::create_dir_all(dir_parent)?;
        }
        let path_tmp = self.derive_temp_path();
        fs::write(&path_tmp, serde_json::to_vec_pretty(root)?)?;
        fs::rename(&path_tmp, &self.path_file)?;
        debug!(path = %self.path_file.display(), "tree saved");
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MemoryStore

/// In-process key/value store holding the serialized tree under [`C_STORE_KEY`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    dict_entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored document, if any.
    pub fn raw(&self) -> Result<Option<String>, StoreError> {
        let dict_entries = self
            .dict_entries
            .lock()
            .map_err(|err| StoreError::Storage(err.to_string()))?;
        Ok(dict_entries.get(C_STORE_KEY).cloned())
    }

    /// Replace the raw stored document.
    pub fn set_raw(&self, text: impl Into<String>) -> Result<(), StoreError> {
        let mut dict_entries = self
            .dict_entries
            .lock()
            .map_err(|err| StoreError::Storage(err.to_string()))?;
        dict_entries.insert(C_STORE_KEY.to_string(), text.into());
        Ok(())
    }
}

impl TreeStore for MemoryStore {
    fn load(&self) -> Result<Option<SpecRootData>, StoreError> {
        match self.raw()? {
            Some(text) => decode_root(&text).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, root: &SpecRootData) -> Result<(), StoreError> {
        self.set_raw(serde_json::to_string(root)?)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::EnumAttributeKey;
    use crate::spec::{
        EnumAttributeValue, SpecFixture, SpecFixtureAttributes, SpecFloor, SpecRoom, SpecSchool,
    };

    fn create_root() -> SpecRootData {
        let attributes = SpecFixtureAttributes::default().with(
            EnumAttributeKey::TypeSupport,
            EnumAttributeValue::Other("bois".to_string()),
        );
        SpecRootData {
            schools: vec![Arc::new(SpecSchool {
                id: "s1".to_string(),
                name: "Ecole A".to_string(),
                floors: vec![Arc::new(SpecFloor {
                    id: "f1".to_string(),
                    name: "Rez".to_string(),
                    rooms: vec![Arc::new(SpecRoom {
                        id: "r1".to_string(),
                        name: "Aula".to_string(),
                        fixtures: vec![Arc::new(SpecFixture {
                            id: "l1".to_string(),
                            quantity: 6,
                            type_number: "LT-9".to_string(),
                            attributes,
                        })],
                    })],
                })],
            })],
        }
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(tmp.path().join("data").join("releve.json"));

        assert!(store.load().expect("load empty").is_none());
        store.save(&create_root()).expect("save");
        assert_eq!(store.load().expect("load"), Some(create_root()));
        assert!(!tmp.path().join("data").join("releve.json.tmp").exists());
    }

    #[test]
    fn test_stored_document_keeps_french_keys() {
        let store = MemoryStore::new();
        store.save(&create_root()).expect("save");
        let text = store.raw().expect("raw").expect("document");

        for c_key in [
            "\"ecoles\"",
            "\"etages\"",
            "\"locaux\"",
            "\"luminaires\"",
            "\"nom\"",
            "\"quantite\"",
            "\"numero_type\"",
            "\"type_luminaire\"",
            "\"moyen_levage\"",
        ] {
            assert!(text.contains(c_key), "missing {c_key} in {text}");
        }
        assert!(text.contains("\"type_support\":\"autre (préciser)\""));
        assert!(text.contains("\"autres_precisions\":{\"type_support\":\"bois\"}"));
    }

    #[test]
    fn test_plain_string_documents_load() {
        let store = MemoryStore::new();
        store
            .set_raw(
                r#"{"ecoles":[{"id":"s1","nom":"Ecole A","etages":[{"id":"f1","nom":"Rez",
                "locaux":[{"id":"r1","nom":"Aula","luminaires":[{"id":"l1","quantite":2,
                "numero_type":"LT-3","type_luminaire":"autre (préciser)",
                "situation_pose":"au plafond","type_support":"Béton brut",
                "type_source_lumineuse":"Retrofit Led","affectation_luminaire":"Aula",
                "moyen_levage":"hauteur inf à 4m"}]}]}]}]}"#,
            )
            .expect("set");

        let root = store.load().expect("load").expect("tree");
        let fixture = &root.schools[0].floors[0].rooms[0].fixtures[0];
        assert_eq!(
            fixture.attributes.type_luminaire,
            EnumAttributeValue::Other(String::new())
        );
        assert_eq!(
            fixture.attributes.type_support,
            EnumAttributeValue::Known("Béton brut".to_string())
        );
        assert_eq!(fixture.type_number, "LT-3");
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        let store = MemoryStore::new();
        store.set_raw("not json").expect("set");
        assert!(matches!(store.load(), Err(StoreError::Serialization(_))));

        let mut root = create_root();
        let school = Arc::make_mut(&mut root.schools[0]);
        let floor = Arc::make_mut(&mut school.floors[0]);
        let room = Arc::make_mut(&mut floor.rooms[0]);
        Arc::make_mut(&mut room.fixtures[0]).attributes.moyen_levage =
            EnumAttributeValue::Known("grue".to_string());
        store.save(&root).expect("save");
        assert!(matches!(store.load(), Err(StoreError::Invalid(_))));
    }
}
