//! SCIM 2.0 Resource and Protocol Types
//!
//! This module defines the SCIM resource types (User, Group), the request
//! payloads used to create and replace them, and the ListResponse envelope
//! per RFC 7643/7644.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;

// =============================================================================
// Schema URIs
// =============================================================================

/// SCIM Core User schema URI
pub const SCHEMA_USER: &str = "urn:ietf:params:scim:schemas:core:2.0:User";

/// SCIM Core Group schema URI
pub const SCHEMA_GROUP: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

/// SCIM ListResponse schema URI
pub const SCHEMA_LIST_RESPONSE: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";

/// SCIM Error schema URI
pub const SCHEMA_ERROR: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// SCIM PatchOp schema URI
pub const SCHEMA_PATCH_OP: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// Media type used for all SCIM responses.
pub const SCIM_CONTENT_TYPE: &str = "application/scim+json";

// =============================================================================
// Resource Metadata
// =============================================================================

/// Resource metadata common to all SCIM resources.
///
/// `created` and `location` are fixed at creation; `last_modified` moves
/// forward on every mutation (see [`ScimMeta::touch`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimMeta {
    /// The resource type ("User" or "Group")
    pub resource_type: String,

    /// When the resource was created
    pub created: DateTime<Utc>,

    /// When the resource was last modified
    pub last_modified: DateTime<Utc>,

    /// Canonical URI of the resource (e.g. `/scim/v2/Users/{id}`)
    pub location: String,
}

impl ScimMeta {
    /// Create metadata for a freshly created User
    pub fn user(base_path: &str, id: &str, now: DateTime<Utc>) -> Self {
        Self {
            resource_type: "User".to_string(),
            created: now,
            last_modified: now,
            location: format!("{}/Users/{}", base_path, id),
        }
    }

    /// Create metadata for a freshly created Group
    pub fn group(base_path: &str, id: &str, now: DateTime<Utc>) -> Self {
        Self {
            resource_type: "Group".to_string(),
            created: now,
            last_modified: now,
            location: format!("{}/Groups/{}", base_path, id),
        }
    }

    /// Record a mutation at `now`.
    ///
    /// The stored value always moves strictly forward, even when the wall
    /// clock has not advanced (or went backwards) since the last mutation.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = if now > self.last_modified {
            now
        } else {
            self.last_modified + chrono::Duration::microseconds(1)
        };
    }
}

// =============================================================================
// User Resource (RFC 7643)
// =============================================================================

/// SCIM User resource as stored and returned on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    /// SCIM schema URIs for this resource
    pub schemas: Vec<String>,

    /// Server-assigned unique identifier
    pub id: String,

    /// Client-assigned identifier for correlation with the IdP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Logical user name (typically the UPN or email)
    pub user_name: String,

    /// Whether the user is active
    pub active: bool,

    /// User's name components
    pub name: ScimName,

    /// Email addresses, in the order the IdP sent them
    pub emails: Vec<ScimEmail>,

    /// Resource metadata
    pub meta: ScimMeta,
}

/// User's name components. Both parts are always present on stored users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimName {
    /// Given name (first name)
    pub given_name: String,

    /// Family name (last name)
    pub family_name: String,
}

/// Email address with optional type and primary flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimEmail {
    /// Email address value
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub value: String,

    /// Email type (e.g., "work", "home")
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub email_type: Option<String>,

    /// Whether this is the primary email
    #[serde(
        default,
        deserialize_with = "lenient::optional_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary: Option<bool>,
}

impl ScimEmail {
    /// Create a work email
    pub fn work(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            email_type: Some("work".to_string()),
            primary: None,
        }
    }
}

/// Payload accepted by `POST /Users` and `PUT /Users/{id}`.
///
/// Every field is optional: creation fills in defaults, replacement keeps the
/// previous value of any field that is absent, `null` or of the wrong type.
/// `active` also accepts "True"/"False" strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_bool")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub name: Option<NameInput>,
    #[serde(default, deserialize_with = "lenient::optional_list")]
    pub emails: Option<Vec<ScimEmail>>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub external_id: Option<String>,
}

/// Name components as sent by the IdP.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameInput {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub given_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub family_name: Option<String>,
}

impl UserInput {
    /// Convenience constructor used by tests and tooling.
    pub fn with_user_name(user_name: impl Into<String>) -> Self {
        Self {
            user_name: Some(user_name.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Group Resource (RFC 7643)
// =============================================================================

/// SCIM Group resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroup {
    /// SCIM schema URIs for this resource
    pub schemas: Vec<String>,

    /// Server-assigned unique identifier
    pub id: String,

    /// Client-assigned identifier for correlation with the IdP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Human-readable group name
    pub display_name: String,

    /// Group members (users or nested groups)
    pub members: Vec<ScimGroupMember>,

    /// Resource metadata
    pub meta: ScimMeta,
}

impl ScimGroup {
    /// Whether a member with the given id is already present
    pub fn has_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|m| m.value == member_id)
    }
}

/// Group member reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroupMember {
    /// Id of the member User or Group
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub value: String,

    /// Display label of the member
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub display: Option<String>,
}

impl ScimGroupMember {
    /// Create a member reference with a display label
    pub fn with_display(value: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display: Some(display.into()),
        }
    }
}

/// Payload accepted by `POST /Groups`. Fields of the wrong type are absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInput {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub external_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_list")]
    pub members: Option<Vec<ScimGroupMember>>,
}

impl GroupInput {
    /// Convenience constructor used by tests and tooling.
    pub fn with_display_name(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Protocol Types (RFC 7644)
// =============================================================================

/// SCIM list response.
///
/// Every list is a single page: `startIndex` is 1 and `itemsPerPage`
/// equals `totalResults`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimListResponse<T> {
    /// SCIM schema URIs
    pub schemas: Vec<String>,

    /// Total number of matching resources
    pub total_results: usize,

    /// 1-based index of the first result in this response
    pub start_index: usize,

    /// Number of results returned in this response
    pub items_per_page: usize,

    /// The list of resources
    #[serde(rename = "Resources")]
    pub resources: Vec<T>,
}

impl<T> ScimListResponse<T> {
    /// Wrap a complete result set in a single-page list response
    pub fn single_page(resources: Vec<T>) -> Self {
        let total = resources.len();
        Self {
            schemas: vec![SCHEMA_LIST_RESPONSE.to_string()],
            total_results: total,
            start_index: 1,
            items_per_page: total,
            resources,
        }
    }
}

/// Query parameters for list operations.
///
/// `startIndex` and `count` are accepted for compatibility and ignored.
/// Built from raw query pairs so that no query string rejects the request.
#[derive(Debug, Clone, Default)]
pub struct ScimListParams {
    /// SCIM filter expression
    pub filter: Option<String>,

    /// Kept as raw strings so malformed values never reject the request
    pub start_index: Option<String>,

    pub count: Option<String>,
}

impl FromIterator<(String, String)> for ScimListParams {
    /// The first occurrence of a repeated parameter wins; unknown parameters
    /// are ignored.
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "filter" => &mut params.filter,
                "startIndex" => &mut params.start_index,
                "count" => &mut params.count,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

// =============================================================================
// Tests
// =============================================================================
