pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod models;
pub mod placement;
pub mod repo;

mod memory;
pub use memory::MemoryStore;

pub use config::{Limits, PlacementDefaults};
pub use editor::{EditOutcome, Editor, Mode};
pub use error::{StoreError, StoreResult};
pub use geometry::{Coordinate, Polygon, Ring};
pub use models::{
    Antenna, Barrier, Beacon, Extent, MapData, NewProject, Project, ProjectUpdate, User, UserInfo,
};
pub use placement::{AntennaPlacement, MapAreas, PlacementError};
pub use repo::{apply_auto_placement, AutoPlacement, ProjectStore, Projects, Store, UserStore};
