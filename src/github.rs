// GitHub OAuth client: authorization-code exchange and user lookup.

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::error::{EditorError, Result};

const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";
const CLIENT_USER_AGENT: &str = "dstack-config-editor";

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// The subset of the GitHub user payload the editor cares about. Unknown
/// fields are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub user: GithubUser,
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl GithubClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            client_secret,
        }
    }

    /// Exchanges an OAuth authorization code for an access token and fetches
    /// the user behind it.
    pub async fn exchange_code(&self, code: &str, state: Option<&str>) -> Result<AuthSession> {
        let response = self
            .http
            .post(TOKEN_URL)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .json(&json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "code": code,
                "state": state,
            }))
            .send()
            .await?;

        let token: TokenResponse = response.json().await?;
        if let Some(error) = token.error {
            warn!(error, "github token exchange rejected");
            return Err(EditorError::ValidationError(
                token
                    .error_description
                    .unwrap_or_else(|| "Token exchange failed".to_string()),
            ));
        }
        let access_token = token.access_token.ok_or_else(|| {
            EditorError::ValidationError("No access token received from GitHub".to_string())
        })?;

        let user = self.fetch_user(&access_token).await?;
        Ok(AuthSession {
            access_token,
            token_type: token.token_type,
            scope: token.scope,
            user,
        })
    }

    /// Looks up the user for an access token. An unusable token maps to
    /// Unauthorized rather than a transport error.
    pub async fn fetch_user(&self, access_token: &str) -> Result<GithubUser> {
        let response = self
            .http
            .get(USER_URL)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "github user lookup failed");
            return Err(EditorError::Unauthorized);
        }

        let user = response.json().await?;
        Ok(user)
    }
}
