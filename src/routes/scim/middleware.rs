//! SCIM Bearer Token Authentication Middleware
//!
//! Every SCIM request must present the single shared bearer token from
//! `scim.bearer_token`. The check runs before any handler sees the request
//! body, so a rejected request never touches the store.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::{AppState, scim::ScimErrorResponse};

/// SCIM bearer token authentication middleware.
///
/// Returns RFC 7644 error envelopes (`invalidCreds`) on failure.
pub async fn scim_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(&request) else {
        tracing::debug!("SCIM authentication failed: missing or malformed Authorization header");
        return ScimErrorResponse::invalid_creds("Authorization token not provided or is invalid.")
            .into_response();
    };

    if !token_matches(token, &state.config.scim.bearer_token) {
        tracing::debug!("SCIM authentication failed: invalid token");
        return ScimErrorResponse::invalid_creds("Invalid bearer token.").into_response();
    }

    next.run(request).await
}

/// Constant-time comparison of the presented token with the configured one.
fn token_matches(presented: &str, expected: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

/// Extract bearer token from the Authorization header.
///
/// Expects format: `Authorization: Bearer <token>`
/// Returns the text after "Bearer " up to the next space (may be empty if no
/// token was provided). Anything after that space is ignored.
fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;

    // Case-insensitive "Bearer " prefix check
    let (scheme, rest) = (auth_str.get(..7)?, auth_str.get(7..)?);
    if !scheme.eq_ignore_ascii_case("Bearer ") {
        return None;
    }
    Some(rest.split_once(' ').map_or(rest, |(token, _)| token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(value: &str) -> Request<Body> {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_bearer_token_valid() {
        let request = request_with("Bearer entra-secret");
        assert_eq!(extract_bearer_token(&request), Some("entra-secret"));
    }

    #[test]
    fn test_extract_bearer_token_case_insensitive() {
        assert_eq!(
            extract_bearer_token(&request_with("bearer entra-secret")),
            Some("entra-secret")
        );
        assert_eq!(
            extract_bearer_token(&request_with("BEARER entra-secret")),
            Some("entra-secret")
        );
    }

    #[test]
    fn test_extract_bearer_token_ignores_trailing_words() {
        assert_eq!(
            extract_bearer_token(&request_with("Bearer entra-secret extra")),
            Some("entra-secret")
        );
        // A second space right after the scheme leaves an empty token
        assert_eq!(
            extract_bearer_token(&request_with("Bearer  entra-secret")),
            Some("")
        );
    }

    #[test]
    fn test_extract_bearer_token_missing_header() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_bearer_token(&request), None);
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        assert_eq!(extract_bearer_token(&request_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&request_with("Bearer")), None);
        assert_eq!(extract_bearer_token(&request_with("entra-secret")), None);
    }

    #[test]
    fn test_extract_bearer_token_empty_token() {
        // Empty token is extracted and then rejected by the comparison
        let request = request_with("Bearer ");
        assert_eq!(extract_bearer_token(&request), Some(""));
        assert!(!token_matches("", "entra-secret"));
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("entra-secret", "entra-secret"));
        assert!(!token_matches("entra-secre", "entra-secret"));
        assert!(!token_matches("Entra-secret", "entra-secret"));
        assert!(!token_matches("entra-secret-longer", "entra-secret"));
    }
}
