use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::Error;
use crate::users::repo_types::{NewUser, ProfileChanges, User};

/// The persistence seam. One implementation per backing store; the core
/// only ever sees this trait.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, Error>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;
    async fn list(&self) -> Result<Vec<User>, Error>;
    /// Fails with [`Error::DuplicateEmail`] when the email is taken.
    async fn insert(&self, new: NewUser) -> Result<User, Error>;
    /// Fails with [`Error::DuplicateEmail`] on an email collision and
    /// [`Error::NotFound`] when the id has no record.
    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<User, Error>;
    async fn update_password_hash(&self, id: i64, hash: &str) -> Result<(), Error>;
    /// Returns whether a record was removed. Deleting an absent id is not
    /// an error at this layer.
    async fn delete(&self, id: i64) -> Result<bool, Error>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_db_error(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::DuplicateEmail,
        _ => Error::Database(e),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert(&self, new: NewUser) -> Result<User, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, phone, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(user)
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<User, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone)
            WHERE id = $1
            RETURNING id, name, email, password_hash, phone, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        user.ok_or(Error::NotFound)
    }

    async fn update_password_hash(&self, id: i64, hash: &str) -> Result<(), Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory store with the same contract as [`PgStore`]: unique emails,
/// monotonically assigned ids that are never reused after deletion. Wired
/// in by `AppState::fake()` for router-level tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: Vec<User>,
    last_id: i64,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, Error> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, Error> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.users.clone())
    }

    async fn insert(&self, new: NewUser) -> Result<User, Error> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(Error::DuplicateEmail);
        }
        inner.last_id += 1;
        let user = User {
            id: inner.last_id,
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            phone: new.phone,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<User, Error> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        if let Some(email) = &changes.email {
            if inner.users.iter().any(|u| u.email == *email && u.id != id) {
                return Err(Error::DuplicateEmail);
            }
        }
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(Error::NotFound)?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        Ok(user.clone())
    }

    async fn update_password_hash(&self, id: i64, hash: &str) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(Error::NotFound)?;
        user.password_hash = hash.to_string();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, Error> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        Ok(inner.users.len() < before)
    }
}
