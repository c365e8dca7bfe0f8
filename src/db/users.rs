use crate::db::{models::User, DbPool};
use crate::error::{Error, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// Create the users table if it doesn't exist
pub async fn create_table(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            password TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// SHA-256 hex digest of a password
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Check whether a username is taken
pub async fn user_exists(pool: &DbPool, username: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// Store a user with an already hashed password
pub async fn add_user(pool: &DbPool, username: &str, hashed_password: &str) -> Result<()> {
    sqlx::query("INSERT INTO users (username, password, created_at) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hashed_password)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    debug!("Added user {}", username);
    Ok(())
}

/// Check a username/password pair against the stored hash
pub async fn verify_user(pool: &DbPool, username: &str, password: &str) -> Result<bool> {
    let stored: Option<String> =
        sqlx::query_scalar("SELECT password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    Ok(stored.is_some_and(|hash| hash == hash_password(password)))
}

/// Validate a signup form and create the account
pub async fn register_user(
    pool: &DbPool,
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    let username = username.trim();

    if username.is_empty() || password.trim().is_empty() {
        return Err(Error::Validation("Please fill in all fields.".to_string()));
    }

    if password != confirm_password {
        return Err(Error::Validation("Passwords do not match.".to_string()));
    }

    if user_exists(pool, username).await? {
        return Err(Error::Validation("Username already exists.".to_string()));
    }

    add_user(pool, username, &hash_password(password)).await?;
    info!("Registered user {}", username);
    Ok(())
}

/// List all users, oldest first
pub async fn list_users(pool: &DbPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, username")
        .fetch_all(pool)
        .await?;

    Ok(users)
}

/// Write every stored account to a CSV file. Returns the number of rows written.
pub async fn export_users_csv(pool: &DbPool, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let users = list_users(pool).await?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["username", "password", "created_at"])?;
    for user in &users {
        writer.write_record([
            user.username.as_str(),
            user.password.as_str(),
            user.created_at.to_rfc3339().as_str(),
        ])?;
    }
    writer.flush()?;

    debug!("Exported {} users to {:?}", users.len(), path);
    Ok(users.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_pool;

    async fn pool() -> DbPool {
        let pool = init_pool("sqlite::memory:", 1).await.unwrap();
        create_table(&pool).await.unwrap();
        pool
    }

    #[test]
    fn test_hash_password() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[tokio::test]
    async fn test_add_and_verify_user() {
        let pool = pool().await;
        assert!(!user_exists(&pool, "alice").await.unwrap());

        add_user(&pool, "alice", &hash_password("s3cret")).await.unwrap();

        assert!(user_exists(&pool, "alice").await.unwrap());
        assert!(verify_user(&pool, "alice", "s3cret").await.unwrap());
        assert!(!verify_user(&pool, "alice", "wrong").await.unwrap());
        assert!(!verify_user(&pool, "bob", "s3cret").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_table_is_idempotent() {
        let pool = pool().await;
        add_user(&pool, "alice", &hash_password("pw")).await.unwrap();
        create_table(&pool).await.unwrap();
        assert!(user_exists(&pool, "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_user_validation() {
        let pool = pool().await;

        let err = register_user(&pool, "  ", "pw", "pw").await.unwrap_err();
        assert!(err.to_string().contains("fill in all fields"));

        let err = register_user(&pool, "alice", "pw", "other").await.unwrap_err();
        assert!(err.to_string().contains("do not match"));

        register_user(&pool, "alice", "pw", "pw").await.unwrap();
        let err = register_user(&pool, "alice", "pw2", "pw2").await.unwrap_err();
        assert!(err.to_string().contains("already exists"));

        assert!(verify_user(&pool, "alice", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn test_export_users_csv() {
        let pool = pool().await;
        register_user(&pool, "alice", "pw", "pw").await.unwrap();
        register_user(&pool, "bob", "hunter2", "hunter2").await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export").join("users.csv");
        let written = export_users_csv(&pool, &path).await.unwrap();
        assert_eq!(written, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("username,password,created_at"));
        assert!(contents.contains(&format!("bob,{}", hash_password("hunter2"))));
        assert!(!contents.contains("hunter2,"));
    }
}
