//! Tool and connection catalog types (spec §4.7).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single tool a provider exposes, returned from its `register_tools()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub provider: String,
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A tenant's connection to a provider: identity, enablement, and OAuth
/// token state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConnection {
    pub id: String,
    pub organization_id: String,
    pub provider: String,
    pub enabled: bool,
    pub oauth: Option<OAuthToken>,
}

impl ProviderConnection {
    #[must_use]
    pub fn is_oauth(&self) -> bool {
        self.oauth.is_some()
    }
}

/// OAuth access/refresh token pair with expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl OAuthToken {
    /// Past or within this margin of expiry — matches `ensure_fresh_token`'s
    /// "expires_at is past/imminent" wording with a small safety margin.
    const EXPIRY_MARGIN_SECS: i64 = 60;

    #[must_use]
    pub fn is_expiring(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => (expires_at - now).num_seconds() <= Self::EXPIRY_MARGIN_SECS,
            None => false,
        }
    }
}
