//! Consolidated test modules.
//!
//! This module contains router-level tests that drive the full SCIM stack
//! through `build_app`.
