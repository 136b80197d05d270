use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Project, User};
use crate::repo::{ProjectStore, UserStore};

/// In-memory store for testing and local runs without a database.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    projects: Arc<Mutex<HashMap<Uuid, Project>>>,
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex.lock().map_err(StoreError::backend)
}

impl ProjectStore for MemoryStore {
    async fn list_projects(&self, owner: Uuid) -> StoreResult<Vec<Project>> {
        let mut projects: Vec<Project> = lock(&self.projects)?
            .values()
            .filter(|p| p.user_id == owner)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(lock(&self.projects)?.get(&id).cloned())
    }

    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        lock(&self.projects)?.insert(project.id, project.clone());
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> StoreResult<()> {
        match lock(&self.projects)?.get_mut(&project.id) {
            Some(slot) => {
                *slot = project.clone();
                Ok(())
            }
            None => Err(StoreError::ProjectNotFound(project.id)),
        }
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(lock(&self.projects)?.remove(&id).is_some())
    }
}

impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}
