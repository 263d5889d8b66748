//! Provider credential resolution.
//!
//! Precedence is request body, then header, then the server-held credential.

use axum::http::HeaderMap;
use thiserror::Error;

/// Primary credential header
pub const API_KEY_HEADER: &str = "x-api-key";

/// Alternative credential header, consulted when the primary one is absent
pub const API_KEY_HEADER_ALIAS: &str = "x-provider-api-key";

/// No credential could be found
#[derive(Debug, Error, PartialEq, Eq)]
#[error("No API key provided. Send one in the request body, the X-API-Key header, or configure CLIENT_API_KEY")]
pub struct MissingCredential;

/// Credential policy fixed at startup
#[derive(Clone, Default)]
pub struct CredentialResolver {
    server_key: Option<String>,
    allow_missing: bool,
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("server_key", &self.server_key.as_ref().map(|_| "<redacted>"))
            .field("allow_missing", &self.allow_missing)
            .finish()
    }
}

impl CredentialResolver {
    /// Create a resolver from the server-held credential and smoke-test flag
    pub fn new(server_key: Option<String>, allow_missing: bool) -> Self {
        Self {
            server_key: server_key.filter(|k| !k.trim().is_empty()),
            allow_missing,
        }
    }

    /// Pick the credential for one request
    ///
    /// Returns `Ok(None)` only when no credential exists and missing
    /// credentials are allowed.
    pub fn resolve(
        &self,
        body_key: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<Option<String>, MissingCredential> {
        let chosen = present(body_key)
            .or_else(|| header_value(headers, API_KEY_HEADER))
            .or_else(|| header_value(headers, API_KEY_HEADER_ALIAS))
            .or(self.server_key.as_deref());

        match chosen {
            Some(key) => Ok(Some(key.to_string())),
            None if self.allow_missing => Ok(None),
            None => Err(MissingCredential),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    present(headers.get(name).and_then(|v| v.to_str().ok()))
}
