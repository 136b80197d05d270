//! # Repository — owner-scoped project operations on an abstract store
//!
//! Persistence is split in two layers:
//!
//! - [`ProjectStore`] and [`UserStore`] are the raw async storage interfaces.
//!   They know nothing about ownership and are implemented by
//!   [`crate::MemoryStore`] (tests, local runs) and by the PostgreSQL store in
//!   the `api` crate.
//! - [`Projects`] is the service every caller goes through. It validates input
//!   and enforces that only the owner can read, change or delete a project.
//!
//! ## Ownership rules
//!
//! | Operation | Missing project | Other owner |
//! |-----------|-----------------|-------------|
//! | [`get`](Projects::get) | [`StoreError::ProjectNotFound`] | [`StoreError::Forbidden`] |
//! | [`update`](Projects::update) | [`StoreError::ProjectNotFound`] | [`StoreError::Forbidden`] |
//! | [`delete`](Projects::delete) | [`StoreError::ProjectNotFound`] | [`StoreError::Forbidden`] |
//! | [`auto_place`](Projects::auto_place) | [`StoreError::ProjectNotFound`] | [`StoreError::Forbidden`] |
//!
//! [`list`](Projects::list) only ever returns the caller's projects, newest first.
//! The owner recorded at creation time is never changed afterwards.

use std::future::Future;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Limits;
use crate::error::{StoreError, StoreResult};
use crate::models::{NewProject, Project, ProjectUpdate, User};
use crate::placement::{place_antennas, place_beacons, AntennaParams, BeaconParams};

/// Async storage for projects.
pub trait ProjectStore {
    /// All projects owned by `owner`, newest first.
    fn list_projects(
        &self,
        owner: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<Project>>> + Send;
    fn get_project(
        &self,
        id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Project>>> + Send;
    fn insert_project(
        &self,
        project: &Project,
    ) -> impl Future<Output = StoreResult<()>> + Send;
    fn update_project(
        &self,
        project: &Project,
    ) -> impl Future<Output = StoreResult<()>> + Send;
    /// Returns whether a row was removed.
    fn delete_project(
        &self,
        id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Async storage for user accounts.
pub trait UserStore {
    fn get_user(
        &self,
        id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;
    /// Look up by the already normalised (trimmed, lower-case) email.
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;
    /// Fails with [`StoreError::EmailTaken`] if the email is already registered.
    fn insert_user(
        &self,
        user: &User,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Everything the HTTP layer needs from a backend.
pub trait Store: ProjectStore + UserStore + Clone + Send + Sync + 'static {}

impl<T> Store for T where T: ProjectStore + UserStore + Clone + Send + Sync + 'static {}

/// Which device collection an auto-placement run regenerates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AutoPlacement {
    Beacons(BeaconParams),
    Antennas(AntennaParams),
}

/// Owner-checked project operations.
#[derive(Clone, Debug)]
pub struct Projects<S> {
    store: S,
    limits: Limits,
}

impl<S: ProjectStore> Projects<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub async fn list(&self, owner: Uuid) -> StoreResult<Vec<Project>> {
        self.store.list_projects(owner).await
    }

    /// Load a project and check that `owner` owns it.
    pub async fn get(&self, owner: Uuid, id: Uuid) -> StoreResult<Project> {
        let project = self
            .store
            .get_project(id)
            .await?
            .ok_or(StoreError::ProjectNotFound(id))?;
        if project.user_id != owner {
            debug!(%id, %owner, "Rejected access to foreign project");
            return Err(StoreError::Forbidden);
        }
        Ok(project)
    }

    pub async fn create(&self, owner: Uuid, new: NewProject) -> StoreResult<Project> {
        let name = new.name.as_deref().map(str::trim).unwrap_or_default();
        let map_data = new.map_data.filter(|v| !v.is_null());
        let (name, map_data) = match (name.is_empty(), map_data) {
            (false, Some(map_data)) => (name.to_string(), map_data),
            _ => {
                return Err(StoreError::invalid(
                    "Project name and map data are required",
                ))
            }
        };

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            user_id: owner,
            name,
            description: new.description,
            map_data,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_project(&project).await?;
        info!(id = %project.id, %owner, "Project created");
        Ok(project)
    }

    /// Apply a partial update. Absent fields keep their current value.
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        update: ProjectUpdate,
    ) -> StoreResult<Project> {
        let mut project = self.get(owner, id).await?;
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(StoreError::invalid("Project name must not be empty"));
            }
            project.name = name.to_string();
        }
        if let Some(description) = update.description {
            project.description = Some(description);
        }
        if let Some(map_data) = update.map_data.filter(|v| !v.is_null()) {
            project.map_data = map_data;
        }
        project.updated_at = Utc::now();
        self.store.update_project(&project).await?;
        info!(%id, "Project updated");
        Ok(project)
    }

    pub async fn delete(&self, owner: Uuid, id: Uuid) -> StoreResult<()> {
        self.get(owner, id).await?;
        if !self.store.delete_project(id).await? {
            return Err(StoreError::ProjectNotFound(id));
        }
        info!(%id, "Project deleted");
        Ok(())
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Regenerate one device collection of a stored layout on the placement
    /// grid, leaving every other field of `mapData` untouched.
    ///
    /// The grid scan runs on the calling task. Async callers that must not
    /// block can split this into [`get`](Self::get), [`apply_auto_placement`]
    /// on a blocking thread and [`save_layout`](Self::save_layout).
    pub async fn auto_place(
        &self,
        owner: Uuid,
        id: Uuid,
        placement: AutoPlacement,
    ) -> StoreResult<Project> {
        let mut project = self.get(owner, id).await?;
        apply_auto_placement(&mut project, placement, &self.limits)?;
        self.save_layout(owner, project).await
    }

    /// Persist a project whose layout was regenerated by
    /// [`apply_auto_placement`], re-checking ownership.
    pub async fn save_layout(&self, owner: Uuid, mut project: Project) -> StoreResult<Project> {
        let id = project.id;
        self.get(owner, id).await?;
        project.updated_at = Utc::now();
        self.store.update_project(&project).await?;
        info!(%id, "Project layout auto-placed");
        Ok(project)
    }
}

/// Replace the beacons or antennas of `project.map_data` with a freshly
/// placed grid. CPU-bound; other `mapData` fields are kept as they are.
pub fn apply_auto_placement(
    project: &mut Project,
    placement: AutoPlacement,
    limits: &Limits,
) -> StoreResult<()> {
    let layout = project.layout()?;
    let (key, devices) = match placement {
        AutoPlacement::Beacons(params) => {
            let beacons = place_beacons(layout.extent(), params, &layout.barriers, limits)?;
            ("beacons", serde_json::to_value(beacons)?)
        }
        AutoPlacement::Antennas(params) => {
            let placed = place_antennas(layout.extent(), params, &layout.barriers, limits)?;
            ("antennas", serde_json::to_value(placed.antennas)?)
        }
    };
    let Some(map) = project.map_data.as_object_mut() else {
        return Err(StoreError::invalid("Map data must be a JSON object"));
    };
    map.insert(key.to_string(), devices);
    debug!(id = %project.id, devices = key, "Layout regenerated");
    Ok(())
}
