use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::auth::services::{authenticate, Principal};
use crate::error::Error;
use crate::state::AppState;

/// Extracts `Authorization: Basic` credentials and re-authenticates them
/// against the store. There is no session state; every request pays the
/// full credential check.
pub struct CurrentUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(Error::InvalidCredentials)?;

        let encoded = header
            .strip_prefix("Basic ")
            .or_else(|| header.strip_prefix("basic "))
            .ok_or(Error::InvalidCredentials)?;

        let decoded = BASE64
            .decode(encoded.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(Error::InvalidCredentials)?;

        let (email, password) = decoded.split_once(':').ok_or(Error::InvalidCredentials)?;
        let email = email.trim().to_lowercase();

        let principal = authenticate(
            state.store.as_ref(),
            &state.config.admin_email,
            &email,
            password,
        )
        .await?;

        Ok(CurrentUser(principal))
    }
}
