//! User accounts: creation, credential checks and profile updates

use std::sync::OnceLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use tracing::{error, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    models::{NewUser, User, UserChanges, UserFields},
    repositories::UserRepository,
};

const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Lower-case the domain part of an email, leaving the local part alone
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Hash a password with Argon2 and a fresh salt
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::InternalServerError
        })?
        .to_string();

    Ok(hash)
}

/// Check a password against a user's stored hash
pub fn verify_password(user: &User, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(&user.password_hash) else {
        warn!("Stored password hash for user {} is unreadable", user.id);
        return false;
    };

    verify_parsed(&parsed_hash, password)
}

/// An unreadable hash never matches
fn matches_hash(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed_hash| verify_parsed(&parsed_hash, password))
}

fn verify_parsed(parsed_hash: &PasswordHash<'_>, password: &str) -> bool {
    Argon2::default()
        .verify_password(password.as_bytes(), parsed_hash)
        .is_ok()
}

/// Hash checked when no account matches, so a miss costs as much as a
/// wrong password
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();

    DUMMY_HASH.get_or_init(|| {
        hash_password("dummy-password-for-unknown-accounts").unwrap_or_default()
    })
}

/// Create a regular user
pub async fn create_user(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
    fields: UserFields,
) -> ApiResult<User> {
    insert_user(users, email, password, fields, false).await
}

/// Create a user flagged as both staff and superuser
pub async fn create_superuser(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> ApiResult<User> {
    let fields = UserFields {
        is_staff: true,
        ..UserFields::default()
    };
    insert_user(users, email, password, fields, true).await
}

async fn insert_user(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
    fields: UserFields,
    is_superuser: bool,
) -> ApiResult<User> {
    if email.is_empty() {
        return Err(ApiError::Validation("User email must be set.".to_string()));
    }

    let new_user = NewUser {
        email: normalize_email(email),
        password_hash: hash_password(password)?,
        name: fields.name,
        is_active: fields.is_active,
        is_staff: fields.is_staff,
        is_superuser,
    };

    let user = users.create(&new_user).await?;
    info!("Created user {}", user.id);
    Ok(user)
}

/// Resolve credentials to an active user.
///
/// An unknown email, a wrong password and an inactive account fail the same
/// way.
pub async fn authenticate(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> ApiResult<User> {
    let user = users.find_by_email(&normalize_email(email)).await?;

    // every path runs exactly one argon2 verification
    let password_ok = match &user {
        Some(user) => verify_password(user, password),
        None => matches_hash(dummy_hash(), password),
    };

    match user {
        Some(user) if password_ok && user.is_active => Ok(user),
        _ => {
            warn!("Rejected credentials for {}", email);
            Err(ApiError::Authentication(BAD_CREDENTIALS.to_string()))
        }
    }
}

/// Apply profile changes, re-hashing a new password
pub async fn update_user(
    users: &dyn UserRepository,
    mut user: User,
    changes: UserChanges,
) -> ApiResult<User> {
    if let Some(email) = changes.email {
        user.email = normalize_email(&email);
    }
    if let Some(password) = changes.password {
        user.password_hash = hash_password(&password)?;
    }
    if let Some(name) = changes.name {
        user.name = name;
    }

    Ok(users.update(&user).await?)
}

/// Make sure a superuser with the given email exists
pub async fn ensure_superuser(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> ApiResult<User> {
    if let Some(existing) = users.find_by_email(&normalize_email(email)).await? {
        info!("Superuser {} already present", existing.id);
        return Ok(existing);
    }

    create_superuser(users, email, password).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        let cases = [
            ("test1@EXAMPLE.com", "test1@example.com"),
            ("Test2@Example.com", "Test2@example.com"),
            ("TEST3@EXAMPLE.COM", "TEST3@example.com"),
            ("test4@example.COM", "test4@example.com"),
            ("no-at-sign", "no-at-sign"),
        ];

        for (raw, expected) in cases {
            assert_eq!(normalize_email(raw), expected);
        }
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("testpass123").unwrap();
        assert_ne!(hash, "testpass123");

        let now = chrono::Utc::now();
        let user = User {
            id: 1,
            email: "user@example.com".to_string(),
            password_hash: hash,
            name: String::new(),
            is_active: true,
            is_staff: true,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        };
        assert!(verify_password(&user, "testpass123"));
        assert!(!verify_password(&user, "wrong"));
    }

    #[tokio::test]
    async fn test_create_user_stores_hash_and_normalized_email() {
        let store = MemoryStore::new();
        let user = create_user(&store, "Test2@Example.com", "testpass123", UserFields::default())
            .await
            .unwrap();

        assert_eq!(user.email, "Test2@example.com");
        assert_ne!(user.password_hash, "testpass123");
        assert!(verify_password(&user, "testpass123"));
        assert!(!user.is_superuser);
    }

    #[tokio::test]
    async fn test_create_user_without_email_fails() {
        let store = MemoryStore::new();
        let result = create_user(&store, "", "testpass123", UserFields::default()).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_superuser_sets_flags() {
        let store = MemoryStore::new();
        let user = create_superuser(&store, "admin@example.com", "testpass123")
            .await
            .unwrap();

        assert!(user.is_staff);
        assert!(user.is_superuser);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = MemoryStore::new();
        create_user(&store, "user@example.com", "testpass123", UserFields::default())
            .await
            .unwrap();

        assert!(authenticate(&store, "user@EXAMPLE.com", "testpass123").await.is_ok());
        assert!(matches!(
            authenticate(&store, "user@example.com", "wrong").await,
            Err(ApiError::Authentication(_))
        ));
        assert!(matches!(
            authenticate(&store, "nobody@example.com", "testpass123").await,
            Err(ApiError::Authentication(_))
        ));
    }

    #[test]
    fn test_dummy_hash_is_a_real_hash_that_never_matches() {
        let hash = dummy_hash();

        assert!(PasswordHash::new(hash).is_ok());
        assert!(!matches_hash(hash, "testpass123"));
        assert!(!matches_hash(hash, ""));
    }

    #[tokio::test]
    async fn test_unknown_email_costs_as_much_as_wrong_password() {
        let store = MemoryStore::new();
        create_user(&store, "user@example.com", "testpass123", UserFields::default())
            .await
            .unwrap();
        // warm up the dummy hash so its one-off creation is not timed
        dummy_hash();

        let started = std::time::Instant::now();
        assert!(authenticate(&store, "user@example.com", "wrongpass").await.is_err());
        let known = started.elapsed();

        let started = std::time::Instant::now();
        assert!(authenticate(&store, "nobody@example.com", "wrongpass").await.is_err());
        let unknown = started.elapsed();

        assert!(unknown * 10 >= known, "unknown {:?} vs known {:?}", unknown, known);
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_authenticate() {
        let store = MemoryStore::new();
        let fields = UserFields {
            is_active: false,
            ..UserFields::default()
        };
        create_user(&store, "user@example.com", "testpass123", fields)
            .await
            .unwrap();

        assert!(authenticate(&store, "user@example.com", "testpass123").await.is_err());
    }

    #[tokio::test]
    async fn test_update_user_rehashes_password() {
        let store = MemoryStore::new();
        let user = create_user(&store, "user@example.com", "testpass123", UserFields::default())
            .await
            .unwrap();

        let changes = UserChanges {
            password: Some("newpass123".to_string()),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = update_user(&store, user, changes).await.unwrap();

        assert_eq!(updated.name, "Renamed");
        assert!(verify_password(&updated, "newpass123"));
        assert!(authenticate(&store, "user@example.com", "testpass123").await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_superuser_is_idempotent() {
        let store = MemoryStore::new();
        let first = ensure_superuser(&store, "admin@example.com", "testpass123")
            .await
            .unwrap();
        let second = ensure_superuser(&store, "admin@EXAMPLE.com", "other")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
    }
}
