//! Email-link sign-in against a hosted auth service.
//!
//! The only thing the rest of the crate needs from here is an [`Identity`]:
//! a stable user id plus the bearer token that proves it.

use crate::errors::IdentityError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub access_token: String,
}

// Keep tokens out of logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Send a one-time sign-in link to `email`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidEmail` for an empty or malformed
    /// address, or `IdentityError::Unavailable` if the request fails.
    async fn send_login_link(&self, email: &str) -> Result<(), IdentityError>;

    /// Resolve the user behind a confirmed sign-in token.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Missing` if the token is not accepted.
    async fn current_user(&self, access_token: &str) -> Result<Identity, IdentityError>;
}

#[derive(Clone, Debug)]
pub struct SupabaseIdentity {
    client: Client,
    base_url: String,
    anon_key: String,
    redirect_url: Option<String>,
}

impl SupabaseIdentity {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        redirect_url: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            redirect_url,
        }
    }
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn send_login_link(&self, email: &str) -> Result<(), IdentityError> {
        let email = normalize_email(email)?;

        let mut request = self
            .client
            .post(format!("{}/auth/v1/otp", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&OtpRequest {
                email: &email,
                create_user: true,
            });
        if let Some(redirect) = &self.redirect_url {
            request = request.query(&[("redirect_to", redirect.as_str())]);
        }

        let response = request.send().await.map_err(IdentityError::unavailable)?;
        if !response.status().is_success() {
            return Err(IdentityError::Unavailable(format!(
                "sign-in link request failed with status {}",
                response.status()
            )));
        }

        info!("sent sign-in link");
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> Result<Identity, IdentityError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(IdentityError::Missing);
        }

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(IdentityError::unavailable)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(IdentityError::Missing),
            status => {
                return Err(IdentityError::Unavailable(format!(
                    "user lookup failed with status {status}"
                )));
            }
        }

        let user: UserResponse = response.json().await.map_err(IdentityError::unavailable)?;
        Ok(Identity {
            user_id: UserId::new(user.id),
            access_token: access_token.to_string(),
        })
    }
}

/// Trim and sanity-check an email address before it leaves the process.
pub fn normalize_email(email: &str) -> Result<String, IdentityError> {
    let email = email.trim();
    let (local, domain) = email.split_once('@').ok_or(IdentityError::InvalidEmail)?;
    let valid = !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@');
    if !valid {
        return Err(IdentityError::InvalidEmail);
    }
    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert_eq!(
            normalize_email("  learner@example.com ").unwrap(),
            "learner@example.com"
        );
    }

    #[test]
    fn rejects_empty_and_malformed_addresses() {
        for email in ["", "   ", "learner", "@example.com", "a@b", "a@.com", "a b@example.com", "a@b@c.com"] {
            assert!(
                matches!(normalize_email(email), Err(IdentityError::InvalidEmail)),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn debug_output_hides_token() {
        let identity = Identity {
            user_id: UserId::new("u-1"),
            access_token: "secret-token".into(),
        };
        let rendered = format!("{identity:?}");
        assert!(rendered.contains("u-1"));
        assert!(!rendered.contains("secret-token"));
    }
}
