//! SCIM 2.0 User and Group Provisioning Service
//!
//! This service sits between the SCIM routes and the [`ResourceStore`]. It
//! evaluates list filters, classifies PATCH bodies, wraps collections in
//! ListResponse envelopes and maps store errors to SCIM error responses.

use std::sync::Arc;

use tracing::debug;

use crate::{
    scim::{
        GroupInput, PatchRequest, ScimErrorResponse, ScimGroup, ScimListParams, ScimListResponse,
        ScimResult, ScimUser, UserInput, apply_filter,
    },
    store::{ResourceStore, StoreError},
};

impl From<StoreError> for ScimErrorResponse {
    fn from(e: StoreError) -> Self {
        ScimErrorResponse::not_found(e.to_string())
    }
}

/// SCIM User and Group Provisioning Service
#[derive(Debug, Clone)]
pub struct ScimProvisioningService {
    store: Arc<ResourceStore>,
}

impl ScimProvisioningService {
    pub fn new(store: Arc<ResourceStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    pub fn create_user(&self, input: UserInput) -> ScimUser {
        self.store.create_user(input)
    }

    pub fn get_user(&self, id: &str) -> ScimResult<ScimUser> {
        Ok(self.store.get_user(id)?)
    }

    pub fn replace_user(&self, id: &str, input: UserInput) -> ScimResult<ScimUser> {
        Ok(self.store.update_user(id, input)?)
    }

    /// Apply a PATCH body to a user. Unsupported operations are skipped.
    pub fn patch_user(&self, id: &str, request: &PatchRequest) -> ScimResult<ScimUser> {
        let ops = request.user_ops();
        debug!(user_id = %id, operations = ops.len(), "Applying user patch");
        Ok(self.store.patch_user(id, &ops)?)
    }

    pub fn delete_user(&self, id: &str) -> ScimResult<()> {
        Ok(self.store.delete_user(id)?)
    }

    /// List users, narrowed by the `filter` query parameter when it parses.
    pub fn list_users(&self, params: &ScimListParams) -> ScimListResponse<ScimUser> {
        let users = apply_filter(self.store.list_users(), params.filter.as_deref());
        debug!(filter = ?params.filter, total = users.len(), "Listed users");
        ScimListResponse::single_page(users)
    }

    // =========================================================================
    // Group Operations
    // =========================================================================

    pub fn create_group(&self, input: GroupInput) -> ScimGroup {
        self.store.create_group(input)
    }

    pub fn get_group(&self, id: &str) -> ScimResult<ScimGroup> {
        Ok(self.store.get_group(id)?)
    }

    /// Apply a PATCH body to a group. Unsupported operations are skipped.
    pub fn patch_group(&self, id: &str, request: &PatchRequest) -> ScimResult<ScimGroup> {
        let ops = request.group_ops();
        debug!(group_id = %id, operations = ops.len(), "Applying group patch");
        Ok(self.store.patch_group(id, &ops)?)
    }

    pub fn delete_group(&self, id: &str) -> ScimResult<()> {
        Ok(self.store.delete_group(id)?)
    }

    /// List groups, narrowed by the `filter` query parameter when it parses.
    pub fn list_groups(&self, params: &ScimListParams) -> ScimListResponse<ScimGroup> {
        let groups = apply_filter(self.store.list_groups(), params.filter.as_deref());
        debug!(filter = ?params.filter, total = groups.len(), "Listed groups");
        ScimListResponse::single_page(groups)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::scim::{RawPatchOp, ScimGroupMember};

    fn service() -> ScimProvisioningService {
        ScimProvisioningService::new(Arc::new(ResourceStore::default()))
    }

    fn filter(expr: &str) -> ScimListParams {
        ScimListParams {
            filter: Some(expr.to_string()),
            ..ScimListParams::default()
        }
    }

    #[test]
    fn test_not_found_maps_to_scim_404() {
        let err = service().get_user("abc").unwrap_err();

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.status, "404");
        assert_eq!(err.detail, "User with ID abc not found.");

        let err = service().delete_group("xyz").unwrap_err();
        assert_eq!(err.detail, "Group with ID xyz not found.");
    }

    #[test]
    fn test_list_users_filter_counts_match_resources() {
        let service = service();
        service.create_user(UserInput::with_user_name("alice"));
        service.create_user(UserInput::with_user_name("bob"));
        service.create_user(UserInput::with_user_name("bob"));

        let all = service.list_users(&ScimListParams::default());
        assert_eq!(all.total_results, 3);

        let bobs = service.list_users(&filter("userName eq \"bob\""));
        assert_eq!(bobs.total_results, 2);
        assert_eq!(bobs.items_per_page, 2);
        assert_eq!(bobs.resources.len(), 2);
        assert!(bobs.resources.iter().all(|u| u.user_name == "bob"));

        let nobody = service.list_users(&filter("userName eq \"carol\""));
        assert_eq!(nobody.total_results, 0);
        assert!(nobody.resources.is_empty());

        let unparsed = service.list_users(&filter("userName sw \"b\""));
        assert_eq!(unparsed.total_results, 3);
    }

    #[test]
    fn test_list_groups_by_display_name() {
        let service = service();
        let engineering = service.create_group(GroupInput::with_display_name("Engineering"));
        service.create_group(GroupInput::with_display_name("Sales"));

        let listed = service.list_groups(&filter("displayName eq \"Engineering\""));
        assert_eq!(listed.total_results, 1);
        assert_eq!(listed.resources[0].id, engineering.id);
    }

    #[test]
    fn test_patch_group_from_request_body() {
        let service = service();
        let alice = service.create_user(UserInput::with_user_name("alice@example.com"));
        let group = service.create_group(GroupInput::with_display_name("Engineering"));

        let add = PatchRequest::new(vec![RawPatchOp::new(
            "Add",
            "members",
            json!([{"value": alice.id}]),
        )]);
        let patched = service.patch_group(&group.id, &add).unwrap();
        assert_eq!(
            patched.members,
            vec![ScimGroupMember::with_display(
                alice.id.clone(),
                "alice@example.com"
            )]
        );

        let remove = PatchRequest::new(vec![RawPatchOp::new(
            "remove",
            "members",
            json!([{"value": alice.id}]),
        )]);
        let patched = service.patch_group(&group.id, &remove).unwrap();
        assert!(patched.members.is_empty());
    }

    #[test]
    fn test_patch_user_ignores_unsupported_operations() {
        let service = service();
        let user = service.create_user(UserInput::with_user_name("alice"));

        let request = PatchRequest::new(vec![
            RawPatchOp::new("replace", "userName", json!("mallory")),
            RawPatchOp::new("replace", "active", json!(false)),
        ]);
        let patched = service.patch_user(&user.id, &request).unwrap();

        assert_eq!(patched.user_name, "alice");
        assert!(!patched.active);
    }
}
