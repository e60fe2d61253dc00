use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::users::repo_types::User;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub new_password: String,
    pub new_password_repeat: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminPasswordChangeRequest {
    pub new_password: String,
}

/// Sanitized record view; the hash never leaves the store layer.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub phone: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            phone: user.phone,
        }
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserView>>,
}

impl ApiResponse {
    pub fn user(user: User) -> Self {
        Self {
            result: "ok",
            message: None,
            user: Some(user.into()),
            users: None,
        }
    }

    pub fn users(users: Vec<User>) -> Self {
        Self {
            result: "ok",
            message: None,
            user: None,
            users: Some(users.into_iter().map(UserView::from).collect()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            result: "ok",
            message: Some(message.into()),
            user: None,
            users: None,
        }
    }
}
