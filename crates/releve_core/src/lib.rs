//! `releve_core` v1:
//! Luminaire survey inventory and its per-floor XLSX export.
//!
//! Modules:
//! - `registry`  : categorical option lists and attribute keys
//! - `conf`      : sheet template constants and export options
//! - `spec`      : data model, layout models, errors
//! - `util`      : row flattening, labels, validation
//! - `layout`    : header builder and grid composer
//! - `border`    : border styling pass
//! - `export`    : per-school workbook export
//! - `store`     : tree persistence
//! - `inventory` : headless CRUD/selection session
pub mod border;
pub mod conf;
pub mod export;
pub mod inventory;
pub mod layout;
pub mod registry;
pub mod spec;
pub mod store;
pub mod util;

pub use border::apply_border_styles;
pub use conf::{N_ROWS_DATA_MIN, SpecExportOptions};
pub use export::{export_school, export_school_to_file};
pub use inventory::Inventory;
pub use layout::{build_header_layout, compose_floor_grid, derive_column_widths};
pub use registry::{C_OPTION_OTHER, EnumAttributeKey, SpecAttributeGroup, derive_attribute_groups};
pub use spec::{
    EnumAttributeValue, ExportError, InventoryError, SpecExportReport, SpecFixture,
    SpecFixtureAttributes, SpecFixtureDraft, SpecFloor, SpecFloorSheet, SpecHeaderLayout,
    SpecRoom, SpecRootData, SpecSchool, SpecSelection, SpecStyledSheet, StoreError,
};
pub use store::{C_STORE_KEY, JsonFileStore, MemoryStore, TreeStore};
pub use util::{derive_fixture_type_label, derive_level_index, flatten_floor_rows};
