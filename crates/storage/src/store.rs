use async_trait::async_trait;
use auth::{CredentialStore, Principal, Role, StoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::model::{MenuItem, Order, ProfileUpdate, Promotion, Restaurant};
use crate::{Result, StorageError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collections {
    #[serde(default)]
    pub principals: HashMap<String, Principal>,
    #[serde(default)]
    pub restaurants: HashMap<String, Restaurant>,
    #[serde(default)]
    pub menu_items: HashMap<String, MenuItem>,
    #[serde(default)]
    pub promotions: HashMap<String, Promotion>,
    #[serde(default)]
    pub orders: HashMap<String, Order>,
}

/// In-process document store.
///
/// All writes go through a single write lock, which is what serializes
/// concurrent registrations for the same login identifier. When a snapshot
/// path is configured every write is persisted before the lock is released,
/// and rolled back in memory if persisting fails.
pub struct MemoryStore {
    collections: RwLock<Collections>,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store that is never persisted
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Collections::default()),
            snapshot_path: None,
        }
    }

    /// Open a store, loading the snapshot at `snapshot_path` if it exists
    ///
    /// # Arguments
    /// * `snapshot_path` - JSON snapshot file; `None` keeps the store in memory only
    pub async fn open(snapshot_path: Option<PathBuf>) -> Result<Self> {
        let collections = match &snapshot_path {
            Some(path) if fs::try_exists(path).await? => {
                let bytes = fs::read(path).await?;
                let collections: Collections = serde_json::from_slice(&bytes)?;
                info!(
                    path = %path.display(),
                    principals = collections.principals.len(),
                    restaurants = collections.restaurants.len(),
                    "loaded store snapshot"
                );
                collections
            }
            _ => Collections::default(),
        };

        Ok(Self {
            collections: RwLock::new(collections),
            snapshot_path,
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub(crate) async fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> T {
        let collections = self.collections.read().await;
        f(&collections)
    }

    /// Apply a mutation and persist it; the mutation is undone if persisting fails
    pub(crate) async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Collections) -> Result<T>,
    ) -> Result<T> {
        let mut collections = self.collections.write().await;

        let Some(path) = &self.snapshot_path else {
            return f(&mut collections);
        };

        let before = collections.clone();
        let value = f(&mut collections)?;

        if let Err(e) = write_snapshot(path, &collections).await {
            error!(path = %path.display(), error = %e, "failed to persist store snapshot");
            *collections = before;
            return Err(e);
        }

        Ok(value)
    }

    /// Look up a principal by ID for profile reads
    pub async fn principal_by_id(&self, id: &str) -> Option<Principal> {
        self.read(|c| c.principals.get(id).cloned()).await
    }

    /// Look up a principal by login identifier for profile reads
    pub async fn principal_by_login(&self, role: Role, login_identifier: &str) -> Option<Principal> {
        self.read(|c| find_login(c, role, login_identifier).cloned())
            .await
    }

    /// Look up a principal by display name.
    /// Display names are not unique; the oldest matching account wins.
    pub async fn principal_by_display_name(&self, role: Role, display_name: &str) -> Option<Principal> {
        self.read(|c| {
            c.principals
                .values()
                .filter(|p| p.role == role && p.display_name == display_name)
                .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
                .cloned()
        })
        .await
    }

    /// All principals of a role, oldest first
    pub async fn list_principals(&self, role: Role) -> Vec<Principal> {
        let mut principals: Vec<Principal> = self
            .read(|c| {
                c.principals
                    .values()
                    .filter(|p| p.role == role)
                    .cloned()
                    .collect()
            })
            .await;

        principals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        principals
    }

    /// Update the editable profile fields of a principal
    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<Principal> {
        if let Some(name) = &update.display_name {
            if name.trim().is_empty() {
                return Err(StorageError::Validation("Username cannot be empty.".to_string()));
            }
        }

        self.mutate(|c| {
            let principal = c
                .principals
                .get_mut(id)
                .ok_or_else(|| StorageError::NotFound("User".to_string()))?;

            if let Some(name) = update.display_name {
                principal.display_name = name.trim().to_string();
            }
            if let Some(mob_num) = update.mob_num {
                principal.profile.mob_num = Some(mob_num);
            }
            if let Some(address) = update.address {
                principal.profile.address = Some(address);
            }
            if let Some(dob) = update.dob {
                principal.profile.dob = Some(dob);
            }
            principal.updated_at = Utc::now();

            Ok(principal.clone())
        })
        .await
    }
}

fn find_login<'a>(c: &'a Collections, role: Role, login_identifier: &str) -> Option<&'a Principal> {
    c.principals
        .values()
        .find(|p| p.role == role && p.login_identifier == login_identifier)
}

async fn write_snapshot(path: &Path, collections: &Collections) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let bytes = serde_json::to_vec_pretty(collections)?;
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, &bytes).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_login(
        &self,
        role: Role,
        login_identifier: &str,
    ) -> std::result::Result<Option<Principal>, StoreError> {
        Ok(self.principal_by_login(role, login_identifier).await)
    }

    async fn find_by_id(&self, id: &str) -> std::result::Result<Option<Principal>, StoreError> {
        Ok(self.principal_by_id(id).await)
    }

    async fn insert(&self, principal: Principal) -> std::result::Result<Principal, StoreError> {
        let inserted = self
            .mutate(|c| {
                if find_login(c, principal.role, &principal.login_identifier).is_some() {
                    return Err(StoreError::Duplicate(principal.login_identifier.clone()).into());
                }
                c.principals.insert(principal.id.clone(), principal.clone());
                Ok(principal)
            })
            .await?;

        Ok(inserted)
    }

    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: String,
    ) -> std::result::Result<(), StoreError> {
        self.mutate(|c| {
            let principal = c
                .principals
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            principal.password_hash = password_hash;
            principal.updated_at = Utc::now();
            Ok(())
        })
        .await?;

        Ok(())
    }
}
