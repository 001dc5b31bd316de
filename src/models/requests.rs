//! Request DTOs for the profiles and cache admin API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Maximum profile name length in characters
pub const MAX_NAME_LENGTH: usize = 128;

/// Request body for creating or replacing a profile
/// (POST /api/profiles, PUT /api/profiles/:id)
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRequest {
    /// Display name
    pub name: String,
    /// Optional job title shown on the card
    #[serde(default)]
    pub title: Option<String>,
}

impl ProfileRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("Name cannot be empty".to_string());
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Some(format!(
                "Name exceeds maximum length of {} characters",
                MAX_NAME_LENGTH
            ));
        }
        None
    }
}

/// Query string for GET /api/profiles
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive name filter
    #[serde(default)]
    pub q: Option<String>,
}

/// Request body for POST /cache/invalidate
///
/// Exactly one of the fields must be set:
/// - `pattern`: regular expression matched against cache keys
/// - `caller`: drop every entry cached for this caller identity
/// - `route`: drop every entry whose request path starts with this prefix
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateRequest {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub caller: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
}

impl InvalidateRequest {
    /// Validates that exactly one selector is present.
    pub fn validate(&self) -> Option<String> {
        let set = [&self.pattern, &self.caller, &self.route]
            .iter()
            .filter(|field| field.is_some())
            .count();
        if set != 1 {
            return Some("Exactly one of pattern, caller or route is required".to_string());
        }
        None
    }
}
