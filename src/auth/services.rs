use lazy_static::lazy_static;
use tracing::debug;

use crate::auth::password::{hash_password, verify_password};
use crate::error::Error;
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Standard,
    Administrator,
}

/// Authenticated identity for the current request. Rebuilt from the Basic
/// credentials on every call; nothing is cached between requests.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn from_user(user: &User, admin_email: &str) -> Self {
        let role = if user.email == admin_email {
            Role::Administrator
        } else {
            Role::Standard
        };
        Self {
            id: user.id,
            email: user.email.clone(),
            role,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role == Role::Administrator
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    ReadUser,
    ListUsers,
    UpdateProfile,
    ChangePassword,
    DeleteUser,
    AdminChangePassword,
}

lazy_static! {
    // Verified against whenever the email lookup misses, so unknown and
    // known-but-wrong credentials cost the same argon2 work.
    static ref THROWAWAY_HASH: String =
        hash_password("throwaway-equalizer").expect("hashing a constant cannot fail");
}

/// Check the presented credentials against the store. Unknown email and
/// wrong password fail with the same kind.
pub async fn authenticate(
    store: &dyn UserStore,
    admin_email: &str,
    email: &str,
    password: &str,
) -> Result<Principal, Error> {
    match store.find_by_email(email).await? {
        Some(user) => {
            if verify_password(password, &user.password_hash)? {
                let principal = Principal::from_user(&user, admin_email);
                debug!(user_id = principal.id, "authenticated");
                Ok(principal)
            } else {
                Err(Error::InvalidCredentials)
            }
        }
        None => {
            let _ = verify_password(password, &THROWAWAY_HASH);
            Err(Error::InvalidCredentials)
        }
    }
}

/// Ownership/role gate consulted by every endpoint. `target_id` is `None`
/// for self-service operations that implicitly target the caller.
/// First matching rule wins.
pub fn authorize(
    principal: Option<&Principal>,
    operation: Operation,
    target_id: Option<i64>,
) -> Result<(), Error> {
    if operation == Operation::Register {
        return Ok(());
    }

    let principal = principal.ok_or(Error::InvalidCredentials)?;
    let owns_target = target_id.map_or(true, |t| principal.id == t);

    match operation {
        Operation::ListUsers => Ok(()),
        Operation::ReadUser if owns_target || principal.is_privileged() => Ok(()),
        // No privileged override: the administrator edits others only through
        // the admin password-reset path and may never delete another record.
        Operation::UpdateProfile | Operation::ChangePassword | Operation::DeleteUser
            if owns_target =>
        {
            Ok(())
        }
        Operation::AdminChangePassword if principal.is_privileged() => Ok(()),
        _ => Err(Error::NotAuthorized),
    }
}
