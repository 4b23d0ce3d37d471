// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory stores for users and tasks.
//!
//! ## Stores
//!
//! - [`UserStore`]: credentials (bcrypt hash) and role names, keyed by
//!   username. Implements [`CredentialStore`] for the token issuer.
//! - [`TaskStore`]: tasks keyed by numeric ID, each owned by one user.
//!   Implements [`ResourceLookup`] for ownership checks.
//!
//! IDs are assigned sequentially from 1. Nothing is persisted across
//! restarts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::auth::{CredentialStore, NewUserRecord, OwnedResource, ResourceLookup, StoredUser, UserId};
use crate::models::{CreateTaskRequest, ResourceId, Task, UpdateTaskRequest, UserAccount};

/// Store-level failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("username '{0}' is already registered")]
    DuplicateUsername(String),

    #[error("store lock poisoned")]
    Poisoned,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Default)]
struct UserTable {
    by_username: HashMap<String, StoredUser>,
    next_id: UserId,
}

/// Shared handle to the user table.
#[derive(Clone, Default)]
pub struct UserStore {
    inner: Arc<RwLock<UserTable>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Public view of a user, without the password hash.
    pub fn account(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.find_by_username(username)?.map(UserAccount::from))
    }
}

impl CredentialStore for UserStore {
    fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.by_username.get(username).cloned())
    }

    fn insert(&self, record: NewUserRecord) -> Result<StoredUser, StoreError> {
        let mut table = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if table.by_username.contains_key(&record.username) {
            return Err(StoreError::DuplicateUsername(record.username));
        }

        table.next_id += 1;
        let user = StoredUser {
            id: table.next_id,
            username: record.username,
            password_hash: record.password_hash,
            roles: record.roles,
        };
        table
            .by_username
            .insert(user.username.clone(), user.clone());
        Ok(user)
    }
}

impl From<StoredUser> for UserAccount {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            roles: user.roles,
        }
    }
}

// =============================================================================
// Tasks
// =============================================================================

#[derive(Default)]
pub struct TaskStore {
    tasks: BTreeMap<ResourceId, Task>,
    next_id: ResourceId,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, owner_id: UserId, request: CreateTaskRequest) -> Task {
        self.next_id += 1;
        let task = Task {
            id: self.next_id,
            title: request.title,
            description: request.description,
            completed: false,
            owner_id,
        };
        self.tasks.insert(task.id, task.clone());
        task
    }

    pub fn get(&self, id: ResourceId) -> Option<Task> {
        self.tasks.get(&id).cloned()
    }

    pub fn list_by_owner(&self, owner_id: UserId) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|task| task.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub fn list_all(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    /// Apply a partial update. Ownership never changes.
    pub fn update(&mut self, id: ResourceId, request: UpdateTaskRequest) -> Option<Task> {
        let task = self.tasks.get_mut(&id)?;
        if let Some(title) = request.title {
            task.title = title;
        }
        if let Some(description) = request.description {
            task.description = Some(description);
        }
        if let Some(completed) = request.completed {
            task.completed = completed;
        }
        Some(task.clone())
    }

    pub fn delete(&mut self, id: ResourceId) -> bool {
        self.tasks.remove(&id).is_some()
    }
}

impl OwnedResource for Task {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl ResourceLookup for TaskStore {
    type Resource = Task;

    fn find(&self, id: ResourceId) -> Option<Task> {
        self.get(id)
    }
}
