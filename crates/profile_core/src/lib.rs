//! Profile fetching core: one GET against a REST endpoint, response
//! validation, and JSON decoding into [`UserProfile`]. No retries, no
//! caching, platform-default timeouts.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Decoded user record. Either every field decodes or the payload is
/// rejected as a whole; callers never see a partially populated profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub avatar_url: String,
    /// Wire value may be `null` or absent; both read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bio: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("endpoint '{endpoint}' is not a well-formed URL: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    /// Non-200 status, or no recognizable status at all (transport failure).
    #[error("endpoint did not produce a usable response: {detail}")]
    InvalidResponse { status: Option<u16>, detail: String },
    #[error("response body does not decode into a profile: {source}")]
    InvalidPayload {
        #[source]
        source: serde_json::Error,
    },
    /// Anything the transport or decoder raises outside the categories above.
    #[error("profile transfer failed in an unclassified way: {source}")]
    Unexpected {
        #[source]
        source: reqwest::Error,
    },
}

/// HTTP side of the profile card: issues the profile GET and the avatar GET.
#[derive(Debug, Clone, Default)]
pub struct ProfileFetcher {
    http: Client,
}

impl ProfileFetcher {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Fetches and decodes one profile. The caller suspends until the
    /// response arrives or the transport gives up.
    pub async fn fetch_profile(&self, endpoint: &str) -> Result<UserProfile, ProfileError> {
        let body = self.get_checked(endpoint).await?;
        let profile: UserProfile = serde_json::from_slice(&body)
            .map_err(|source| ProfileError::InvalidPayload { source })?;
        debug!(login = %profile.login, "decoded profile payload");
        Ok(profile)
    }

    /// Raw image bytes from an avatar URL; decoding them is the caller's
    /// concern.
    pub async fn fetch_avatar(&self, url: &str) -> Result<Vec<u8>, ProfileError> {
        self.get_checked(url).await
    }

    async fn get_checked(&self, endpoint: &str) -> Result<Vec<u8>, ProfileError> {
        let url = Url::parse(endpoint).map_err(|source| ProfileError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let response =
            self.http
                .get(url)
                .send()
                .await
                .map_err(|err| ProfileError::InvalidResponse {
                    status: None,
                    detail: format!("transport failure: {err}"),
                })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProfileError::InvalidResponse {
                status: Some(status.as_u16()),
                detail: format!("status {status}"),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ProfileError::Unexpected { source })?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
