use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::{Credentials, PORTAL_ORIGIN};

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("missing HANDSON_EMAIL or HANDSON_PASSWORD")]
    MissingCredentials,
    #[error("http error: {0}")]
    Http(String),
    #[error("login rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// An authenticated portal client; cookies from the login stick to it.
pub struct PortalSession {
    pub client: Client,
}

pub fn login(credentials: Option<&Credentials>) -> Result<PortalSession, LoginError> {
    login_at(PORTAL_ORIGIN, credentials)
}

pub(crate) fn login_at(
    origin: &str,
    credentials: Option<&Credentials>,
) -> Result<PortalSession, LoginError> {
    let credentials = credentials.ok_or(LoginError::MissingCredentials)?;
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(LoginError::MissingCredentials);
    }

    let client = Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(20))
        .user_agent("handson-sync/0.1")
        .build()
        .map_err(|err| LoginError::Http(err.to_string()))?;

    let url = format!("{}/login", origin.trim_end_matches('/'));
    tracing::info!(%url, "attempting portal login");
    let response = client
        .post(&url)
        .form(&[
            ("Email", credentials.email.as_str()),
            ("Password", credentials.password.as_str()),
        ])
        .send()
        .map_err(|err| LoginError::Http(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(LoginError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        });
    }

    tracing::info!("portal login succeeded");
    Ok(PortalSession { client })
}
