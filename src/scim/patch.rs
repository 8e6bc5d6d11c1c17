//! SCIM 2.0 PATCH Operations
//!
//! This module parses PATCH request bodies (RFC 7644 Section 3.5.2) into typed
//! operations and applies them to Users and Groups.
//!
//! Entra ID issues two kinds of PATCH during synchronization: toggling a
//! user's `active` flag and reconciling group `members`. Only those are
//! applied; every other operation is classified as `Unrecognized` and
//! skipped without error.
//!
//! ## Examples
//!
//! ```json
//! {
//!   "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
//!   "Operations": [
//!     { "op": "replace", "path": "active", "value": false },
//!     { "op": "Add", "path": "members", "value": [{"value": "user-123"}] },
//!     { "op": "remove", "path": "members", "value": [{"value": "user-456"}] }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    lenient::{self, parse_bool},
    types::{SCHEMA_PATCH_OP, ScimGroup, ScimGroupMember, ScimUser},
};

/// A SCIM PATCH request containing zero or more operations.
///
/// Both fields are optional on the wire; a body without `Operations` (or with
/// `null` or a non-array there) still counts as a (no-op) modification.
/// Elements that are not operation objects are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchRequest {
    /// SCIM schema URIs (normally the PatchOp schema)
    #[serde(default, deserialize_with = "lenient::list")]
    pub schemas: Vec<String>,

    /// List of patch operations to apply, in order
    #[serde(rename = "Operations", default, deserialize_with = "lenient::list")]
    pub operations: Vec<RawPatchOp>,
}

impl PatchRequest {
    /// Create a new patch request with operations
    pub fn new(operations: Vec<RawPatchOp>) -> Self {
        Self {
            schemas: vec![SCHEMA_PATCH_OP.to_string()],
            operations,
        }
    }

    /// Classify every operation for a User target
    pub fn user_ops(&self) -> Vec<UserPatchOp> {
        self.operations.iter().map(UserPatchOp::from_raw).collect()
    }

    /// Classify every operation for a Group target
    pub fn group_ops(&self) -> Vec<GroupPatchOp> {
        self.operations.iter().map(GroupPatchOp::from_raw).collect()
    }
}

/// A single operation exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPatchOp {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub op: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub path: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl RawPatchOp {
    pub fn new(op: impl Into<String>, path: impl Into<String>, value: Value) -> Self {
        Self {
            op: op.into(),
            path: Some(path.into()),
            value,
        }
    }

    /// `value[0].value` as a string, the member id carried by members ops
    fn first_member_id(&self) -> Option<String> {
        self.value
            .get(0)
            .and_then(|m| m.get("value"))
            .and_then(Value::as_str)
            .map(String::from)
    }

    fn path_is(&self, expected: &str, case_insensitive: bool) -> bool {
        match &self.path {
            Some(p) if case_insensitive => p.eq_ignore_ascii_case(expected),
            Some(p) => p == expected,
            None => false,
        }
    }
}

/// Operations understood on a User.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserPatchOp {
    /// `{"op": "replace", "path": "active", "value": <bool>}`
    ReplaceActive(bool),
    /// Anything else; accepted and ignored
    Unrecognized,
}

impl UserPatchOp {
    pub fn from_raw(raw: &RawPatchOp) -> Self {
        if raw.op == "replace"
            && raw.path_is("active", false)
            && let Some(active) = parse_bool(&raw.value)
        {
            return UserPatchOp::ReplaceActive(active);
        }
        UserPatchOp::Unrecognized
    }
}

/// Operations understood on a Group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPatchOp {
    /// `add` on `members` (op and path matched case-insensitively)
    AddMember(String),
    /// `remove` on `members` (op matched exactly, path case-insensitively)
    RemoveMember(String),
    /// Anything else; accepted and ignored
    Unrecognized,
}

impl GroupPatchOp {
    pub fn from_raw(raw: &RawPatchOp) -> Self {
        if !raw.path_is("members", true) {
            return GroupPatchOp::Unrecognized;
        }
        let Some(member_id) = raw.first_member_id() else {
            return GroupPatchOp::Unrecognized;
        };

        if raw.op.eq_ignore_ascii_case("add") {
            GroupPatchOp::AddMember(member_id)
        } else if raw.op == "remove" {
            GroupPatchOp::RemoveMember(member_id)
        } else {
            GroupPatchOp::Unrecognized
        }
    }
}

/// Lookup of member display labels by resource id.
///
/// Implementations must check Users before Groups.
pub trait MemberResolver {
    /// Display label of the User or Group with this id, if one exists
    fn resolve_member(&self, id: &str) -> Option<String>;
}

/// Apply operations to a user, then record the modification once.
///
/// Returns the number of operations that changed something.
pub fn apply_user_patch(user: &mut ScimUser, ops: &[UserPatchOp], now: DateTime<Utc>) -> usize {
    let mut applied = 0;
    for op in ops {
        match op {
            UserPatchOp::ReplaceActive(active) => {
                user.active = *active;
                applied += 1;
            }
            UserPatchOp::Unrecognized => {}
        }
    }
    user.meta.touch(now);
    applied
}

/// Apply operations to a group, resolving added members through `resolver`,
/// then record the modification once.
///
/// Unresolvable member ids are skipped with a warning. Returns the number of
/// operations that changed something.
pub fn apply_group_patch<R: MemberResolver + ?Sized>(
    group: &mut ScimGroup,
    ops: &[GroupPatchOp],
    resolver: &R,
    now: DateTime<Utc>,
) -> usize {
    let mut applied = 0;
    for op in ops {
        match op {
            GroupPatchOp::AddMember(member_id) => {
                let Some(display) = resolver.resolve_member(member_id) else {
                    tracing::warn!(
                        group_id = %group.id,
                        member_id = %member_id,
                        "Member not found as user or group, skipping add"
                    );
                    continue;
                };
                if !group.has_member(member_id) {
                    group
                        .members
                        .push(ScimGroupMember::with_display(member_id.clone(), display));
                    applied += 1;
                }
            }
            GroupPatchOp::RemoveMember(member_id) => {
                let before = group.members.len();
                group.members.retain(|m| &m.value != member_id);
                if group.members.len() != before {
                    applied += 1;
                }
            }
            GroupPatchOp::Unrecognized => {}
        }
    }
    group.meta.touch(now);
    applied
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::scim::types::{SCHEMA_GROUP, SCHEMA_USER, ScimMeta, ScimName};

    struct MapResolver(HashMap<String, String>);

    impl MemberResolver for MapResolver {
        fn resolve_member(&self, id: &str) -> Option<String> {
            self.0.get(id).cloned()
        }
    }

    fn resolver() -> MapResolver {
        MapResolver(HashMap::from([
            ("u1".to_string(), "alice@example.com".to_string()),
            ("g2".to_string(), "Platform".to_string()),
        ]))
    }

    fn user() -> ScimUser {
        ScimUser {
            schemas: vec![SCHEMA_USER.to_string()],
            id: "u1".to_string(),
            external_id: None,
            user_name: "alice@example.com".to_string(),
            active: true,
            name: ScimName::default(),
            emails: Vec::new(),
            meta: ScimMeta::user("/scim/v2", "u1", Utc::now()),
        }
    }

    fn group() -> ScimGroup {
        ScimGroup {
            schemas: vec![SCHEMA_GROUP.to_string()],
            id: "g1".to_string(),
            external_id: None,
            display_name: "Engineering".to_string(),
            members: Vec::new(),
            meta: ScimMeta::group("/scim/v2", "g1", Utc::now()),
        }
    }

    #[test]
    fn test_patch_request_deserialization() {
        let json = r#"{
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
            "Operations": [
                {"op": "replace", "path": "active", "value": false},
                {"op": "Add", "path": "members", "value": [{"value": "u1"}]},
                {"op": "replace", "value": {"displayName": "x"}}
            ]
        }"#;

        let request: PatchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.operations.len(), 3);
        assert_eq!(request.operations[2].path, None);
        assert_eq!(
            request.user_ops(),
            vec![
                UserPatchOp::ReplaceActive(false),
                UserPatchOp::Unrecognized,
                UserPatchOp::Unrecognized
            ]
        );
    }

    #[test]
    fn test_patch_request_without_operations() {
        let request: PatchRequest = serde_json::from_str("{}").unwrap();
        assert!(request.operations.is_empty());
        assert!(request.schemas.is_empty());
    }

    #[test]
    fn test_malformed_operations_are_dropped() {
        for body in [
            r#"{"Operations": null}"#,
            r#"{"Operations": {"op": "replace"}}"#,
            r#"{"schemas": "PatchOp", "Operations": "replace"}"#,
        ] {
            let request: PatchRequest = serde_json::from_str(body).unwrap();
            assert!(request.operations.is_empty(), "{body}");
        }

        let request: PatchRequest = serde_json::from_str(
            r#"{"Operations": [42, {"op": "replace", "path": 7, "value": false}]}"#,
        )
        .unwrap();
        assert_eq!(request.operations.len(), 1);
        assert_eq!(request.operations[0].path, None);
        assert_eq!(request.user_ops(), vec![UserPatchOp::Unrecognized]);
    }

    #[test]
    fn test_user_op_classification() {
        let op = |op: &str, path: &str, value: Value| {
            UserPatchOp::from_raw(&RawPatchOp::new(op, path, value))
        };

        assert_eq!(
            op("replace", "active", json!(true)),
            UserPatchOp::ReplaceActive(true)
        );
        assert_eq!(
            op("replace", "active", json!("False")),
            UserPatchOp::ReplaceActive(false)
        );
        assert_eq!(
            op("Replace", "active", json!(false)),
            UserPatchOp::Unrecognized
        );
        assert_eq!(
            op("replace", "userName", json!("bob")),
            UserPatchOp::Unrecognized
        );
        assert_eq!(
            op("replace", "active", json!("maybe")),
            UserPatchOp::Unrecognized
        );
        assert_eq!(op("add", "active", json!(true)), UserPatchOp::Unrecognized);
    }

    #[test]
    fn test_group_op_classification() {
        let members = json!([{"value": "u1"}]);
        let op = |op: &str, path: &str| {
            GroupPatchOp::from_raw(&RawPatchOp::new(op, path, members.clone()))
        };

        assert_eq!(op("add", "members"), GroupPatchOp::AddMember("u1".into()));
        assert_eq!(op("ADD", "Members"), GroupPatchOp::AddMember("u1".into()));
        assert_eq!(
            op("remove", "MEMBERS"),
            GroupPatchOp::RemoveMember("u1".into())
        );
        assert_eq!(op("Remove", "members"), GroupPatchOp::Unrecognized);
        assert_eq!(op("replace", "members"), GroupPatchOp::Unrecognized);
        assert_eq!(op("add", "displayName"), GroupPatchOp::Unrecognized);

        // No value[0].value to act on
        let raw = RawPatchOp::new("add", "members", json!([]));
        assert_eq!(GroupPatchOp::from_raw(&raw), GroupPatchOp::Unrecognized);
        let raw = RawPatchOp {
            op: "remove".into(),
            path: Some("members".into()),
            value: Value::Null,
        };
        assert_eq!(GroupPatchOp::from_raw(&raw), GroupPatchOp::Unrecognized);
    }

    #[test]
    fn test_replace_active_is_idempotent_but_touches() {
        let mut user = user();
        let created = user.meta.created;

        apply_user_patch(&mut user, &[UserPatchOp::ReplaceActive(false)], created);
        let first = user.clone();
        apply_user_patch(&mut user, &[UserPatchOp::ReplaceActive(false)], created);

        assert!(!user.active);
        assert_eq!(user.active, first.active);
        assert!(first.meta.last_modified > created);
        assert!(user.meta.last_modified > first.meta.last_modified);
    }

    #[test]
    fn test_empty_user_patch_still_touches() {
        let mut user = user();
        let before = user.meta.last_modified;

        let applied = apply_user_patch(&mut user, &[], Utc::now());

        assert_eq!(applied, 0);
        assert!(user.active);
        assert!(user.meta.last_modified > before);
    }

    #[test]
    fn test_add_member_resolves_and_dedups() {
        let mut group = group();
        let ops = vec![
            GroupPatchOp::AddMember("u1".into()),
            GroupPatchOp::AddMember("u1".into()),
            GroupPatchOp::AddMember("g2".into()),
        ];

        let applied = apply_group_patch(&mut group, &ops, &resolver(), Utc::now());

        assert_eq!(applied, 2);
        assert_eq!(
            group.members,
            vec![
                ScimGroupMember::with_display("u1", "alice@example.com"),
                ScimGroupMember::with_display("g2", "Platform"),
            ]
        );
    }

    #[test]
    fn test_add_unknown_member_is_dropped() {
        let mut group = group();
        let before = group.meta.last_modified;

        let applied = apply_group_patch(
            &mut group,
            &[GroupPatchOp::AddMember("missing".into())],
            &resolver(),
            Utc::now(),
        );

        assert_eq!(applied, 0);
        assert!(group.members.is_empty());
        assert!(group.meta.last_modified > before);
    }

    #[test]
    fn test_remove_member_and_remove_non_member() {
        let mut group = group();
        group
            .members
            .push(ScimGroupMember::with_display("u1", "alice@example.com"));

        let ops = vec![
            GroupPatchOp::RemoveMember("nobody".into()),
            GroupPatchOp::RemoveMember("u1".into()),
            GroupPatchOp::Unrecognized,
        ];
        let applied = apply_group_patch(&mut group, &ops, &resolver(), Utc::now());

        assert_eq!(applied, 1);
        assert!(group.members.is_empty());
    }
}
