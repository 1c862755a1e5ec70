// Login / logout
//
// The backend issues a bearer token from `POST /auth/login`. There is no
// server-side logout; dropping the token locally ends the session.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::rest::client::{ApiClient, error_message};
use crate::rest::models::LoginResponse;
use crate::session::Identity;

impl ApiClient {
    /// Authenticate with email and password.
    ///
    /// On success the token and the returned identity are stored in the
    /// shared [`Session`](crate::Session). A 401 here means bad credentials
    /// and is reported as [`Error::Authentication`] without touching the
    /// reauthentication signal.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Identity, Error> {
        let url = self.api_url("auth/login")?;
        debug!("logging in at {}", url);

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp = self
            .http_client()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.request_error(e))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            return Err(Error::Authentication {
                message: error_message(status, &text),
            });
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        let login: LoginResponse =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: String::new(),
            })?;

        let identity = Identity {
            email: login.email.or_else(|| Some(email.to_owned())),
            name: login.name,
            role: login.role,
        };
        self.session()
            .establish(SecretString::from(login.token), identity.clone());

        debug!("login successful");
        Ok(identity)
    }

    /// End the session locally.
    pub fn logout(&self) {
        self.session().clear();
        debug!("logged out");
    }
}
