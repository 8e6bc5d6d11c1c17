//! SCIM 2.0 Protocol Implementation
//!
//! This module provides types and utilities for implementing the subset of
//! SCIM 2.0 (System for Cross-domain Identity Management) that Microsoft
//! Entra ID uses to provision users and groups.
//!
//! ## RFC References
//!
//! - RFC 7643: SCIM Core Schema
//! - RFC 7644: SCIM Protocol
//!
//! ## Module Structure
//!
//! - [`types`]: SCIM resource types (User, Group) and protocol types
//! - [`error`]: SCIM error responses per RFC 7644
//! - [`filter`]: `attr eq "value"` filter parsing and evaluation
//! - [`patch`]: PATCH operation classification and application
//! - `lenient`: field deserializers that treat wrong-typed values as absent

pub mod error;
pub mod filter;
mod lenient;
pub mod patch;
pub mod types;

pub use error::*;
pub use filter::{EqFilter, Filterable, apply_filter, parse_filter};
pub use patch::{
    GroupPatchOp, MemberResolver, PatchRequest, RawPatchOp, UserPatchOp, apply_group_patch,
    apply_user_patch,
};
pub use types::*;
