//! User authentication
//!
//! Salted SHA-256 password digests, opaque session tokens persisted in the
//! `auth_sessions` table, and the `AuthUser` extractor that resolves the
//! session cookie for protected handlers.

use crate::error::{Error, Result};
use crate::state::AppContext;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "literatus_session";

// ========================================
// Password Hashing
// ========================================

/// Hash a password with a random 16-byte salt.
///
/// Stored form: `{salt_hex}${digest_hex}` where digest = SHA-256(salt || password).
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = digest_password(&salt, password);
    format!("{}${}", hex_encode(&salt), digest)
}

/// Check a password against a stored `{salt_hex}${digest_hex}` value
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = hex_decode(salt_hex) else {
        return false;
    };
    digest_password(&salt, password) == digest_hex
}

fn digest_password(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

// ========================================
// Session Tokens
// ========================================

/// Create a session token for `user_id` and persist it
pub async fn create_session(db: &Pool<Sqlite>, user_id: Uuid) -> Result<String> {
    let token = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO auth_sessions (token, user_id) VALUES (?, ?)")
        .bind(&token)
        .bind(user_id.to_string())
        .execute(db)
        .await?;
    Ok(token)
}

/// Delete a session token (logout)
pub async fn delete_session(db: &Pool<Sqlite>, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM auth_sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}

/// Extract the session token from the request's Cookie header
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

// ========================================
// Authenticated User Extractor
// ========================================

/// The logged-in user, resolved from the session cookie.
///
/// Handlers taking `AuthUser` reject requests without a valid session
/// with 401 before running.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let ctx = AppContext::from_ref(state);
        let token = session_cookie(&parts.headers).ok_or(Error::Unauthorized)?;

        let row: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT u.guid, u.username
            FROM auth_sessions s
            JOIN users u ON u.guid = s.user_id
            WHERE s.token = ?
            "#,
        )
        .bind(&token)
        .fetch_optional(&ctx.db)
        .await?;

        let (guid, username) = row.ok_or(Error::Unauthorized)?;
        let id = Uuid::parse_str(&guid).map_err(|_| Error::Unauthorized)?;

        Ok(AuthUser {
            id,
            username,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let stored = hash_password("between the acts");
        assert!(verify_password("between the acts", &stored));
        assert!(!verify_password("between the act", &stored));
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = hash_password("orlando");
        let b = hash_password("orlando");
        assert_ne!(a, b);
        assert!(verify_password("orlando", &a));
        assert!(verify_password("orlando", &b));
    }

    #[test]
    fn test_garbage_stored_hash_rejected() {
        assert!(!verify_password("x", "not-a-hash"));
        assert!(!verify_password("x", "zz$deadbeef"));
    }

    #[test]
    fn test_session_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "other=1; literatus_session=abc-123; theme=dark".parse().unwrap(),
        );
        assert_eq!(session_cookie(&headers), Some("abc-123".to_string()));

        let empty = HeaderMap::new();
        assert_eq!(session_cookie(&empty), None);
    }
}
