//! Headless inventory session: selection path, CRUD on the tree, export.
//!
//! Every mutation builds a new root snapshot, copying only the nodes along the
//! edited path, then saves it through the [`TreeStore`]. A failed save is
//! logged and the new snapshot is kept.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::conf::SpecExportOptions;
use crate::export::export_school_to_file;
use crate::spec::{
    ExportError, InventoryError, SpecExportReport, SpecFixture, SpecFixtureDraft, SpecFloor,
    SpecRoom, SpecRootData, SpecSchool, SpecSelection,
};
use crate::store::TreeStore;
use crate::util::{validate_fixture_attributes, validate_name};

fn create_id() -> String {
    Uuid::new_v4().to_string()
}

/// Tree nodes addressed by id.
trait NodeId {
    fn node_id(&self) -> &str;
}

macro_rules! impl_node_id {
    ($($ty:ty),+) => {
        $(impl NodeId for $ty {
            fn node_id(&self) -> &str {
                &self.id
            }
        })+
    };
}

impl_node_id!(SpecSchool, SpecFloor, SpecRoom, SpecFixture);

/// Node with `id`, made unique so it can be edited in place.
fn find_mut<'a, T: NodeId + Clone>(
    nodes: &'a mut [Arc<T>],
    id: &str,
    scope: &str,
) -> Result<&'a mut T, InventoryError> {
    nodes
        .iter_mut()
        .find(|node| node.node_id() == id)
        .map(Arc::make_mut)
        .ok_or_else(|| InventoryError::NotFound(format!("{scope} {id}")))
}

fn remove_by_id<T: NodeId>(
    nodes: &mut Vec<Arc<T>>,
    id: &str,
    scope: &str,
) -> Result<(), InventoryError> {
    let n_len_before = nodes.len();
    nodes.retain(|node| node.node_id() != id);
    if nodes.len() == n_len_before {
        return Err(InventoryError::NotFound(format!("{scope} {id}")));
    }
    Ok(())
}

/// Inventory session over a persisted tree.
pub struct Inventory<S: TreeStore> {
    store: S,
    root: Arc<SpecRootData>,
    selection: SpecSelection,
}

impl<S: TreeStore> Inventory<S> {
    /// Load the stored tree; start empty when nothing usable is stored.
    ///
    /// An unreadable or invalid document is logged and left in place, but the
    /// next successful mutation saves the in-memory tree over it.
    pub fn open(store: S) -> Self {
        let root = match store.load() {
            Ok(Some(root)) => {
                info!(schools = root.schools.len(), "inventory loaded");
                root
            }
            Ok(None) => SpecRootData::default(),
            Err(err) => {
                error!(%err, "stored inventory unusable, starting empty");
                SpecRootData::default()
            }
        };
        Self {
            store,
            root: Arc::new(root),
            selection: SpecSelection::default(),
        }
    }

    /// Current snapshot. Later mutations never alter a returned snapshot.
    pub fn root(&self) -> Arc<SpecRootData> {
        Arc::clone(&self.root)
    }

    pub fn selection(&self) -> &SpecSelection {
        &self.selection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Selection

    pub fn selected_school(&self) -> Option<&SpecSchool> {
        let school_id = self.selection.school_id.as_deref()?;
        self.root
            .schools
            .iter()
            .find(|school| school.id == school_id)
            .map(|school| &**school)
    }

    pub fn selected_floor(&self) -> Option<&SpecFloor> {
        let floor_id = self.selection.floor_id.as_deref()?;
        self.selected_school()?
            .floors
            .iter()
            .find(|floor| floor.id == floor_id)
            .map(|floor| &**floor)
    }

    pub fn selected_room(&self) -> Option<&SpecRoom> {
        let room_id = self.selection.room_id.as_deref()?;
        self.selected_floor()?
            .rooms
            .iter()
            .find(|room| room.id == room_id)
            .map(|room| &**room)
    }

    pub fn selected_fixture(&self) -> Option<&SpecFixture> {
        let fixture_id = self.selection.fixture_id.as_deref()?;
        self.selected_room()?
            .fixtures
            .iter()
            .find(|fixture| fixture.id == fixture_id)
            .map(|fixture| &**fixture)
    }

    /// Select a school (or clear with `None`); floor, room and fixture are cleared.
    pub fn select_school(&mut self, school_id: Option<&str>) -> Result<(), InventoryError> {
        if let Some(id) = school_id
            && !self.root.schools.iter().any(|school| school.id == id)
        {
            return Err(InventoryError::NotFound(format!("school {id}")));
        }
        self.selection = SpecSelection {
            school_id: school_id.map(str::to_string),
            ..Default::default()
        };
        Ok(())
    }

    /// Select a floor of the selected school; room and fixture are cleared.
    pub fn select_floor(&mut self, floor_id: Option<&str>) -> Result<(), InventoryError> {
        let school = self.selected_school().ok_or(InventoryError::NoSchoolSelected)?;
        if let Some(id) = floor_id
            && !school.floors.iter().any(|floor| floor.id == id)
        {
            return Err(InventoryError::NotFound(format!("floor {id}")));
        }
        self.selection.floor_id = floor_id.map(str::to_string);
        self.selection.room_id = None;
        self.selection.fixture_id = None;
        Ok(())
    }

    /// Select a room of the selected floor; fixture is cleared.
    pub fn select_room(&mut self, room_id: Option<&str>) -> Result<(), InventoryError> {
        let floor = self.selected_floor().ok_or(InventoryError::NoFloorSelected)?;
        if let Some(id) = room_id
            && !floor.rooms.iter().any(|room| room.id == id)
        {
            return Err(InventoryError::NotFound(format!("room {id}")));
        }
        self.selection.room_id = room_id.map(str::to_string);
        self.selection.fixture_id = None;
        Ok(())
    }

    /// Select a fixture of the selected room, e.g. to edit it.
    pub fn select_fixture(&mut self, fixture_id: Option<&str>) -> Result<(), InventoryError> {
        let room = self.selected_room().ok_or(InventoryError::NoRoomSelected)?;
        if let Some(id) = fixture_id
            && !room.fixtures.iter().any(|fixture| fixture.id == id)
        {
            return Err(InventoryError::NotFound(format!("fixture {id}")));
        }
        self.selection.fixture_id = fixture_id.map(str::to_string);
        Ok(())
    }

    fn require_school_id(&self) -> Result<String, InventoryError> {
        self.selected_school()
            .map(|school| school.id.clone())
            .ok_or(InventoryError::NoSchoolSelected)
    }

    fn require_floor_path(&self) -> Result<(String, String), InventoryError> {
        let school_id = self.require_school_id()?;
        let floor_id = self
            .selected_floor()
            .map(|floor| floor.id.clone())
            .ok_or(InventoryError::NoFloorSelected)?;
        Ok((school_id, floor_id))
    }

    fn require_room_path(&self) -> Result<(String, String, String), InventoryError> {
        let (school_id, floor_id) = self.require_floor_path()?;
        let room_id = self
            .selected_room()
            .map(|room| room.id.clone())
            .ok_or(InventoryError::NoRoomSelected)?;
        Ok((school_id, floor_id, room_id))
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Schools

    /// Add a school and select it. Returns the new id.
    pub fn add_school(&mut self, name: &str) -> Result<String, InventoryError> {
        let c_name = validate_name(name).inspect_err(|err| warn!(%err, "add school rejected"))?;

        let school = SpecSchool {
            id: create_id(),
            name: c_name,
            floors: Vec::new(),
        };
        let school_id = school.id.clone();

        let mut root = SpecRootData::clone(&self.root);
        root.schools.push(Arc::new(school));
        self.commit(root);

        self.selection = SpecSelection {
            school_id: Some(school_id.clone()),
            ..Default::default()
        };
        info!(school_id = %school_id, "school added");
        Ok(school_id)
    }

    /// Delete the selected school and clear the whole selection.
    pub fn delete_selected_school(&mut self) -> Result<(), InventoryError> {
        let school_id = self
            .require_school_id()
            .inspect_err(|err| warn!(%err, "delete school rejected"))?;

        let mut root = SpecRootData::clone(&self.root);
        remove_by_id(&mut root.schools, &school_id, "school")?;
        self.commit(root);

        self.selection = SpecSelection::default();
        info!(school_id = %school_id, "school deleted");
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Floors

    /// Add a floor to the selected school. Returns the new id.
    pub fn add_floor(&mut self, name: &str) -> Result<String, InventoryError> {
        let (school_id, c_name) = self
            .require_school_id()
            .and_then(|school_id| Ok((school_id, validate_name(name)?)))
            .inspect_err(|err| warn!(%err, "add floor rejected"))?;

        let floor = SpecFloor {
            id: create_id(),
            name: c_name,
            rooms: Vec::new(),
        };
        let floor_id = floor.id.clone();

        let mut root = SpecRootData::clone(&self.root);
        let school = find_mut(&mut root.schools, &school_id, "school")?;
        school.floors.push(Arc::new(floor));
        self.commit(root);

        info!(floor_id = %floor_id, "floor added");
        Ok(floor_id)
    }

    /// Delete a floor of the selected school. Clears floor, room and fixture
    /// selection when the deleted floor was selected.
    pub fn delete_floor(&mut self, floor_id: &str) -> Result<(), InventoryError> {
        let school_id = self
            .require_school_id()
            .inspect_err(|err| warn!(%err, "delete floor rejected"))?;

        let mut root = SpecRootData::clone(&self.root);
        let school = find_mut(&mut root.schools, &school_id, "school")?;
        remove_by_id(&mut school.floors, floor_id, "floor")
            .inspect_err(|err| warn!(%err, "delete floor rejected"))?;
        self.commit(root);

        if self.selection.floor_id.as_deref() == Some(floor_id) {
            self.selection.floor_id = None;
            self.selection.room_id = None;
            self.selection.fixture_id = None;
        }
        info!(floor_id = %floor_id, "floor deleted");
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Rooms

    /// Add a room to the selected floor. Returns the new id.
    pub fn add_room(&mut self, name: &str) -> Result<String, InventoryError> {
        let ((school_id, floor_id), c_name) = self
            .require_floor_path()
            .and_then(|path| Ok((path, validate_name(name)?)))
            .inspect_err(|err| warn!(%err, "add room rejected"))?;

        let room = SpecRoom {
            id: create_id(),
            name: c_name,
            fixtures: Vec::new(),
        };
        let room_id = room.id.clone();

        let mut root = SpecRootData::clone(&self.root);
        let school = find_mut(&mut root.schools, &school_id, "school")?;
        let floor = find_mut(&mut school.floors, &floor_id, "floor")?;
        floor.rooms.push(Arc::new(room));
        self.commit(root);

        info!(room_id = %room_id, "room added");
        Ok(room_id)
    }

    /// Delete a room of the selected floor. Clears room and fixture selection
    /// when the deleted room was selected.
    pub fn delete_room(&mut self, room_id: &str) -> Result<(), InventoryError> {
        let (school_id, floor_id) = self
            .require_floor_path()
            .inspect_err(|err| warn!(%err, "delete room rejected"))?;

        let mut root = SpecRootData::clone(&self.root);
        let school = find_mut(&mut root.schools, &school_id, "school")?;
        let floor = find_mut(&mut school.floors, &floor_id, "floor")?;
        remove_by_id(&mut floor.rooms, room_id, "room")
            .inspect_err(|err| warn!(%err, "delete room rejected"))?;
        self.commit(root);

        if self.selection.room_id.as_deref() == Some(room_id) {
            self.selection.room_id = None;
            self.selection.fixture_id = None;
        }
        info!(room_id = %room_id, "room deleted");
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Fixtures

    /// Create (draft without id) or update a fixture of the selected room.
    /// Returns the fixture id.
    pub fn save_fixture(&mut self, draft: SpecFixtureDraft) -> Result<String, InventoryError> {
        let (school_id, floor_id, room_id) = self
            .require_room_path()
            .and_then(|path| {
                validate_fixture_attributes(&draft.attributes)?;
                Ok(path)
            })
            .inspect_err(|err| warn!(%err, "save fixture rejected"))?;

        let mut root = SpecRootData::clone(&self.root);
        let school = find_mut(&mut root.schools, &school_id, "school")?;
        let floor = find_mut(&mut school.floors, &floor_id, "floor")?;
        let room = find_mut(&mut floor.rooms, &room_id, "room")?;

        let if_created = draft.id.is_none();
        let fixture_id = match draft.id {
            Some(fixture_id) => {
                let fixture = find_mut(&mut room.fixtures, &fixture_id, "fixture")
                    .inspect_err(|err| warn!(%err, "save fixture rejected"))?;
                fixture.quantity = draft.quantity;
                fixture.type_number = draft.type_number;
                fixture.attributes = draft.attributes;
                fixture_id
            }
            None => {
                let fixture_id = create_id();
                room.fixtures.push(Arc::new(SpecFixture {
                    id: fixture_id.clone(),
                    quantity: draft.quantity,
                    type_number: draft.type_number,
                    attributes: draft.attributes,
                }));
                fixture_id
            }
        };
        self.commit(root);

        info!(fixture_id = %fixture_id, created = if_created, "fixture saved");
        Ok(fixture_id)
    }

    /// Delete a fixture of the selected room.
    pub fn delete_fixture(&mut self, fixture_id: &str) -> Result<(), InventoryError> {
        let (school_id, floor_id, room_id) = self
            .require_room_path()
            .inspect_err(|err| warn!(%err, "delete fixture rejected"))?;

        let mut root = SpecRootData::clone(&self.root);
        let school = find_mut(&mut root.schools, &school_id, "school")?;
        let floor = find_mut(&mut school.floors, &floor_id, "floor")?;
        let room = find_mut(&mut floor.rooms, &room_id, "room")?;
        remove_by_id(&mut room.fixtures, fixture_id, "fixture")
            .inspect_err(|err| warn!(%err, "delete fixture rejected"))?;
        self.commit(root);

        if self.selection.fixture_id.as_deref() == Some(fixture_id) {
            self.selection.fixture_id = None;
        }
        info!(fixture_id = %fixture_id, "fixture deleted");
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////

    /// Export the selected school to a workbook file.
    pub fn export_selected(
        &self,
        options: &SpecExportOptions,
    ) -> Result<SpecExportReport, ExportError> {
        let school = self
            .selected_school()
            .ok_or(ExportError::NoSchoolSelected)
            .inspect_err(|err| warn!(%err, "export rejected"))?;
        export_school_to_file(school, options).inspect_err(|err| warn!(%err, "export failed"))
    }

    fn commit(&mut self, root: SpecRootData) {
        self.root = Arc::new(root);
        if let Err(err) = self.store.save(&self.root) {
            error!(%err, "inventory not saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EnumAttributeKey;
    use crate::spec::{EnumAttributeValue, SpecFixtureAttributes, StoreError};
    use crate::store::MemoryStore;

    struct BrokenStore;

    impl TreeStore for BrokenStore {
        fn load(&self) -> Result<Option<SpecRootData>, StoreError> {
            Err(StoreError::Storage("unavailable".to_string()))
        }

        fn save(&self, _root: &SpecRootData) -> Result<(), StoreError> {
            Err(StoreError::Storage("unavailable".to_string()))
        }
    }

    /// School > floor > room > fixture, all selected.
    fn create_session() -> (Inventory<MemoryStore>, [String; 4]) {
        let mut inventory = Inventory::open(MemoryStore::new());
        let school_id = inventory.add_school("Ecole A").expect("school");
        let floor_id = inventory.add_floor("Rez").expect("floor");
        inventory.select_floor(Some(floor_id.as_str())).expect("select floor");
        let room_id = inventory.add_room("Salle 1").expect("room");
        inventory.select_room(Some(room_id.as_str())).expect("select room");
        let fixture_id = inventory
            .save_fixture(SpecFixtureDraft {
                type_number: "LT-1".to_string(),
                ..Default::default()
            })
            .expect("fixture");
        inventory
            .select_fixture(Some(fixture_id.as_str()))
            .expect("select fixture");
        (inventory, [school_id, floor_id, room_id, fixture_id])
    }

    #[test]
    fn test_add_school_trims_and_selects() {
        let mut inventory = Inventory::open(MemoryStore::new());
        let school_id = inventory.add_school("  Ecole B ").expect("school");

        assert_eq!(inventory.selection().school_id.as_deref(), Some(school_id.as_str()));
        assert_eq!(inventory.selected_school().map(|s| s.name.as_str()), Some("Ecole B"));
        assert_eq!(inventory.add_school("   "), Err(InventoryError::EmptyName));
        assert_eq!(inventory.root().schools.len(), 1);
    }

    #[test]
    fn test_add_requires_selected_parent() {
        let mut inventory = Inventory::open(MemoryStore::new());
        assert_eq!(inventory.add_floor("Rez"), Err(InventoryError::NoSchoolSelected));

        inventory.add_school("Ecole").expect("school");
        assert_eq!(inventory.add_room("Aula"), Err(InventoryError::NoFloorSelected));
        assert_eq!(
            inventory.save_fixture(SpecFixtureDraft::default()),
            Err(InventoryError::NoFloorSelected)
        );

        let floor_id = inventory.add_floor("Rez").expect("floor");
        inventory.select_floor(Some(floor_id.as_str())).expect("select");
        assert_eq!(
            inventory.save_fixture(SpecFixtureDraft::default()),
            Err(InventoryError::NoRoomSelected)
        );
        assert_eq!(
            InventoryError::NoRoomSelected.to_string(),
            "Local non trouvé."
        );
    }

    #[test]
    fn test_deleting_selected_floor_clears_descendant_selection() {
        let (mut inventory, [school_id, floor_id, ..]) = create_session();
        assert!(inventory.selected_fixture().is_some());

        inventory.delete_floor(&floor_id).expect("delete");

        assert_eq!(
            inventory.selection(),
            &SpecSelection {
                school_id: Some(school_id),
                ..Default::default()
            }
        );
        assert!(inventory.selected_school().is_some_and(|s| s.floors.is_empty()));
    }

    #[test]
    fn test_deleting_unselected_floor_keeps_selection() {
        let (mut inventory, _) = create_session();
        let other_floor_id = inventory.add_floor("1er étage").expect("floor");
        let selection_before = inventory.selection().clone();

        inventory.delete_floor(&other_floor_id).expect("delete");

        assert_eq!(inventory.selection(), &selection_before);
        assert!(inventory.selected_fixture().is_some());
        assert_eq!(
            inventory.delete_floor(&other_floor_id),
            Err(InventoryError::NotFound(format!("floor {other_floor_id}")))
        );
    }

    #[test]
    fn test_deleting_room_and_fixture_cascade() {
        let (mut inventory, [_, _, room_id, fixture_id]) = create_session();

        inventory.delete_fixture(&fixture_id).expect("delete fixture");
        assert!(inventory.selection().fixture_id.is_none());
        assert!(inventory.selection().room_id.is_some());

        inventory.delete_room(&room_id).expect("delete room");
        assert!(inventory.selection().room_id.is_none());
        assert!(inventory.selection().floor_id.is_some());

        inventory.delete_selected_school().expect("delete school");
        assert_eq!(inventory.selection(), &SpecSelection::default());
        assert!(inventory.root().schools.is_empty());
        assert_eq!(
            inventory.delete_selected_school(),
            Err(InventoryError::NoSchoolSelected)
        );
    }

    #[test]
    fn test_selecting_parent_clears_descendants() {
        let (mut inventory, [school_id, ..]) = create_session();
        inventory.select_school(Some(school_id.as_str())).expect("select");
        assert!(inventory.selection().floor_id.is_none());
        assert!(inventory.selection().fixture_id.is_none());
        assert_eq!(
            inventory.select_school(Some("missing")),
            Err(InventoryError::NotFound("school missing".to_string()))
        );
    }

    #[test]
    fn test_save_fixture_updates_in_place() {
        let (mut inventory, [.., fixture_id]) = create_session();
        let attributes = SpecFixtureAttributes::default().with(
            EnumAttributeKey::TypeLuminaire,
            EnumAttributeValue::Other("applique".to_string()),
        );

        let saved_id = inventory
            .save_fixture(SpecFixtureDraft {
                id: Some(fixture_id.clone()),
                quantity: 12,
                type_number: "LT-2".to_string(),
                attributes: attributes.clone(),
            })
            .expect("update");

        assert_eq!(saved_id, fixture_id);
        let room = inventory.selected_room().expect("room");
        assert_eq!(room.fixtures.len(), 1);
        assert_eq!(room.fixtures[0].quantity, 12);
        assert_eq!(room.fixtures[0].attributes, attributes);
    }

    #[test]
    fn test_invalid_fixture_leaves_tree_unchanged() {
        let (mut inventory, _) = create_session();
        let root_before = inventory.root();

        let result = inventory.save_fixture(SpecFixtureDraft {
            attributes: SpecFixtureAttributes::default().with(
                EnumAttributeKey::MoyenLevage,
                EnumAttributeValue::Other("nacelle".to_string()),
            ),
            ..Default::default()
        });

        assert!(matches!(result, Err(InventoryError::InvalidAttribute { .. })));
        assert!(Arc::ptr_eq(&root_before, &inventory.root()));
        assert_eq!(
            inventory.save_fixture(SpecFixtureDraft {
                id: Some("missing".to_string()),
                ..Default::default()
            }),
            Err(InventoryError::NotFound("fixture missing".to_string()))
        );
        assert!(Arc::ptr_eq(&root_before, &inventory.root()));
    }

    #[test]
    fn test_mutation_copies_only_edited_path() {
        let (mut inventory, _) = create_session();
        let other_school_id = inventory.add_school("Ecole Z").expect("school");
        let snapshot = inventory.root();

        inventory.select_school(Some(other_school_id.as_str())).expect("select");
        inventory.add_floor("Rez").expect("floor");

        let root = inventory.root();
        assert!(Arc::ptr_eq(&snapshot.schools[0], &root.schools[0]));
        assert!(!Arc::ptr_eq(&snapshot.schools[1], &root.schools[1]));
        assert!(snapshot.schools[1].floors.is_empty());
        assert_eq!(root.schools[1].floors.len(), 1);
    }

    #[test]
    fn test_mutations_are_persisted_and_reloaded() {
        let (inventory, [school_id, ..]) = create_session();
        let root = inventory.root();

        let store = MemoryStore::new();
        store.save(&root).expect("save");
        assert_eq!(inventory.store().load().expect("load"), Some(SpecRootData::clone(&root)));

        let reopened = Inventory::open(store);
        assert_eq!(reopened.root().schools[0].id, school_id);
        assert_eq!(reopened.selection(), &SpecSelection::default());
    }

    #[test]
    fn test_unusable_store_starts_empty_and_keeps_mutations() {
        let store = MemoryStore::new();
        store.set_raw("{\"ecoles\": 3}").expect("set");
        assert!(Inventory::open(store).root().schools.is_empty());

        let mut inventory = Inventory::open(BrokenStore);
        inventory.add_school("Ecole").expect("school");
        assert_eq!(inventory.root().schools.len(), 1);
    }

    #[test]
    fn test_export_selected_checks_preconditions() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let options = SpecExportOptions {
            dir_out: tmp.path().to_path_buf(),
            ..Default::default()
        };

        let mut inventory = Inventory::open(MemoryStore::new());
        assert_eq!(
            inventory.export_selected(&options),
            Err(ExportError::NoSchoolSelected)
        );
        inventory.add_school("Ecole vide").expect("school");
        assert_eq!(inventory.export_selected(&options), Err(ExportError::NoFloors));

        let (inventory, _) = create_session();
        let report = inventory.export_selected(&options).expect("export");
        assert_eq!(report.sheet_names, vec!["Rez"]);
        assert!(tmp.path().join("Relevé_Ecole_A.xlsx").exists());
    }
}
