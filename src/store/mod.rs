//! In-memory resource store for SCIM Users and Groups.
//!
//! The store owns both resource maps behind a single lock. Every operation
//! acquires the lock once and finishes its read-modify-write before releasing
//! it, so a mutation is never observed half applied. Nothing is persisted:
//! a new store starts empty.
//!
//! Deleting a resource does not touch other groups' `members`; dangling
//! references are left in place.

mod error;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
pub use error::{StoreError, StoreResult};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::scim::{
    GroupInput, GroupPatchOp, MemberResolver, SCHEMA_GROUP, SCHEMA_USER, ScimGroup, ScimMeta,
    ScimName, ScimUser, UserInput, UserPatchOp, apply_group_patch, apply_user_patch,
};

/// Base path used when none is configured.
pub const DEFAULT_BASE_PATH: &str = "/scim/v2";

#[derive(Debug, Default)]
struct Resources {
    users: HashMap<String, ScimUser>,
    groups: HashMap<String, ScimGroup>,
}

impl MemberResolver for Resources {
    fn resolve_member(&self, id: &str) -> Option<String> {
        self.users
            .get(id)
            .map(|u| u.user_name.clone())
            .or_else(|| self.groups.get(id).map(|g| g.display_name.clone()))
    }
}

/// Thread-safe store of provisioned Users and Groups.
#[derive(Debug)]
pub struct ResourceStore {
    base_path: String,
    inner: RwLock<Resources>,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PATH)
    }
}

impl ResourceStore {
    /// Create an empty store whose resource locations live under `base_path`.
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            inner: RwLock::new(Resources::default()),
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create a user, filling in defaults for every absent field.
    pub fn create_user(&self, input: UserInput) -> ScimUser {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let name = input.name.unwrap_or_default();

        let user = ScimUser {
            schemas: vec![SCHEMA_USER.to_string()],
            external_id: input.external_id,
            user_name: input.user_name.unwrap_or_default(),
            active: input.active.unwrap_or(true),
            name: ScimName {
                given_name: name.given_name.unwrap_or_default(),
                family_name: name.family_name.unwrap_or_default(),
            },
            emails: input.emails.unwrap_or_default(),
            meta: ScimMeta::user(&self.base_path, &id, now),
            id,
        };

        self.inner
            .write()
            .users
            .insert(user.id.clone(), user.clone());
        tracing::info!(user_id = %user.id, user_name = %user.user_name, "Created user");
        user
    }

    pub fn get_user(&self, id: &str) -> StoreResult<ScimUser> {
        self.inner
            .read()
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))
    }

    /// Replace the mutable fields of a user.
    ///
    /// Only fields present in `input` overwrite the stored value; `externalId`
    /// is never changed here.
    pub fn update_user(&self, id: &str, input: UserInput) -> StoreResult<ScimUser> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))?;

        if let Some(active) = input.active {
            user.active = active;
        }
        if let Some(name) = input.name {
            if let Some(given_name) = name.given_name {
                user.name.given_name = given_name;
            }
            if let Some(family_name) = name.family_name {
                user.name.family_name = family_name;
            }
        }
        if let Some(emails) = input.emails {
            user.emails = emails;
        }
        if let Some(user_name) = input.user_name {
            user.user_name = user_name;
        }
        user.meta.touch(Utc::now());

        Ok(user.clone())
    }

    /// Apply classified PATCH operations to a user.
    pub fn patch_user(&self, id: &str, ops: &[UserPatchOp]) -> StoreResult<ScimUser> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))?;

        let applied = apply_user_patch(user, ops, Utc::now());
        tracing::debug!(user_id = %id, applied, total = ops.len(), "Patched user");
        Ok(user.clone())
    }

    pub fn delete_user(&self, id: &str) -> StoreResult<()> {
        if self.inner.write().users.remove(id).is_none() {
            return Err(StoreError::UserNotFound(id.to_string()));
        }
        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }

    /// All users, oldest first.
    pub fn list_users(&self) -> Vec<ScimUser> {
        let mut users: Vec<ScimUser> = self.inner.read().users.values().cloned().collect();
        users.sort_by(|a, b| creation_order(&a.meta.created, &a.id, &b.meta.created, &b.id));
        users
    }

    pub fn user_count(&self) -> usize {
        self.inner.read().users.len()
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Create a group. Members are copied verbatim, without resolution.
    pub fn create_group(&self, input: GroupInput) -> ScimGroup {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let group = ScimGroup {
            schemas: vec![SCHEMA_GROUP.to_string()],
            external_id: input.external_id,
            display_name: input.display_name.unwrap_or_default(),
            members: input.members.unwrap_or_default(),
            meta: ScimMeta::group(&self.base_path, &id, now),
            id,
        };

        self.inner
            .write()
            .groups
            .insert(group.id.clone(), group.clone());
        tracing::info!(group_id = %group.id, display_name = %group.display_name, "Created group");
        group
    }

    pub fn get_group(&self, id: &str) -> StoreResult<ScimGroup> {
        self.inner
            .read()
            .groups
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::GroupNotFound(id.to_string()))
    }

    /// Apply classified PATCH operations to a group.
    ///
    /// Member ids are resolved against the users and groups present at the
    /// time of the call, under the same lock as the write.
    pub fn patch_group(&self, id: &str, ops: &[GroupPatchOp]) -> StoreResult<ScimGroup> {
        let mut inner = self.inner.write();
        let mut group = inner
            .groups
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::GroupNotFound(id.to_string()))?;

        let applied = apply_group_patch(&mut group, ops, &*inner, Utc::now());
        tracing::debug!(group_id = %id, applied, total = ops.len(), "Patched group");

        inner.groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    pub fn delete_group(&self, id: &str) -> StoreResult<()> {
        if self.inner.write().groups.remove(id).is_none() {
            return Err(StoreError::GroupNotFound(id.to_string()));
        }
        tracing::info!(group_id = %id, "Deleted group");
        Ok(())
    }

    /// All groups, oldest first.
    pub fn list_groups(&self) -> Vec<ScimGroup> {
        let mut groups: Vec<ScimGroup> = self.inner.read().groups.values().cloned().collect();
        groups.sort_by(|a, b| creation_order(&a.meta.created, &a.id, &b.meta.created, &b.id));
        groups
    }

    pub fn group_count(&self) -> usize {
        self.inner.read().groups.len()
    }
}

fn creation_order(
    a_created: &DateTime<Utc>,
    a_id: &str,
    b_created: &DateTime<Utc>,
    b_id: &str,
) -> std::cmp::Ordering {
    a_created.cmp(b_created).then_with(|| a_id.cmp(b_id))
}
