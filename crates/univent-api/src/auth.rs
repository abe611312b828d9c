// Session authentication
//
// `login` exchanges email/password for a bearer token and installs it on
// the client; `current_user` resolves the actor behind whatever token is
// installed (login or a pre-provisioned token from config).

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{LoginRequest, LoginResponse, UserProfile};

impl ApiClient {
    /// Authenticate with email/password.
    ///
    /// On success the returned token is stored on the client and used for
    /// all subsequent requests.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<UserProfile, Error> {
        let url = self.api_url("auth/login")?;
        debug!(email, "logging in");

        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };

        let resp: LoginResponse = self.post_anonymous(url, &body).await?;
        if resp.token.is_empty() {
            return Err(Error::Authentication {
                message: "backend returned an empty token".into(),
            });
        }
        self.set_token(SecretString::from(resp.token));

        debug!(role = ?resp.user.role, "login successful");
        Ok(resp.user)
    }

    /// Fetch the profile of the currently authenticated account.
    pub async fn current_user(&self) -> Result<UserProfile, Error> {
        let url = self.api_url("auth/me")?;
        self.get(url).await
    }
}
