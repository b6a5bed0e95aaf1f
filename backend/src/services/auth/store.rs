use std::path::Path;
use std::sync::Mutex;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Debug)]
pub enum StoreError {
    UsernameTaken,
    BadCredentials,
    Internal(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::UsernameTaken => write!(f, "username already exists"),
            StoreError::BadCredentials => write!(f, "invalid username or password"),
            StoreError::Internal(e) => write!(f, "database error: {e}"),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Internal(e.to_string())
    }
}

/// SQLite-backed user accounts with argon2 password hashes.
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn create_user(&self, username: &str, password: &str) -> Result<i64, StoreError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .to_string();
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Internal("store lock poisoned".into()))?;
        let result = conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![username, hash],
        );
        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the user id when the username exists and the password matches.
    pub fn verify_user(&self, username: &str, password: &str) -> Result<i64, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Internal("store lock poisoned".into()))?;
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (id, hash) = row.ok_or(StoreError::BadCredentials)?;
        let parsed =
            PasswordHash::new(&hash).map_err(|e| StoreError::Internal(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| StoreError::BadCredentials)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_login() {
        let store = UserStore::open_in_memory().unwrap();
        let id = store.create_user("alice", "hunter2!").unwrap();
        assert_eq!(store.verify_user("alice", "hunter2!").unwrap(), id);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let store = UserStore::open_in_memory().unwrap();
        store.create_user("bob", "pw1").unwrap();
        assert!(matches!(
            store.create_user("bob", "pw2"),
            Err(StoreError::UsernameTaken)
        ));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let store = UserStore::open_in_memory().unwrap();
        store.create_user("carol", "right").unwrap();
        assert!(matches!(
            store.verify_user("carol", "wrong"),
            Err(StoreError::BadCredentials)
        ));
        assert!(matches!(
            store.verify_user("nobody", "x"),
            Err(StoreError::BadCredentials)
        ));
    }
}
