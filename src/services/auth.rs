//! Authentication, registration and profile service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        NewUser, Profile, ProfileChanges, Registration, Role, UpdateProfileRequest, UserClaims,
    },
    repository::UserStore,
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Register a new account with the default user role
    pub async fn register(&self, registration: Registration) -> AppResult<()> {
        if registration.password != registration.password_confirm {
            return Err(AppError::BadRequest("password not match".to_string()));
        }

        // Check-then-insert; the store's unique constraint closes the race
        // by reporting the same conflict on the insert itself
        if self
            .users
            .find_by_username(&registration.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("username already exists".to_string()));
        }

        let password = self.hash_password(&registration.password)?;

        self.users
            .create(&NewUser {
                username: registration.username,
                name: registration.name,
                password,
                role: Role::User,
            })
            .await
    }

    /// Authenticate by username and password and return a JWT token.
    /// Unknown user and wrong password are deliberately indistinguishable.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<String> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("invalid username or password".to_string()))?;

        if !Self::verify_password(&user.password, password)? {
            return Err(AppError::Authentication(
                "invalid username or password".to_string(),
            ));
        }

        self.issue_token(&user.username, &user.name)
    }

    /// Update the caller's own profile; returns the refreshed identity and a
    /// fresh token bound to it, so a username change does not leave the
    /// caller holding a stale-keyed token.
    pub async fn update_profile(
        &self,
        current_username: &str,
        request: UpdateProfileRequest,
    ) -> AppResult<(Profile, String)> {
        // Unlike registration, the profile path reports the mismatch as a
        // validation message list
        if let Some(ref password) = request.password {
            if Some(password) != request.password_confirm.as_ref() {
                return Err(AppError::Validation(vec!["password not match".to_string()]));
            }
        }

        if let Some(ref username) = request.username {
            if self.users.find_by_username(username).await?.is_some() {
                return Err(AppError::Conflict("username already exists".to_string()));
            }
        }

        let password = match request.password {
            Some(ref password) => Some(self.hash_password(password)?),
            None => None,
        };

        let changes = ProfileChanges {
            username: request.username,
            name: request.name,
            password,
        };

        let user = self
            .users
            .update_profile(current_username, &changes)
            .await?;

        let token = self.issue_token(&user.username, &user.name)?;
        Ok((Profile::from(&user), token))
    }

    /// Create a signed, time-bound JWT token for a verified identity
    pub fn issue_token(&self, username: &str, name: &str) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: username.to_string(),
            name: name.to_string(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash (constant-time comparison)
    fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;
    use crate::repository::MockUserStore;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
        }
    }

    fn registration(password: &str, confirm: &str) -> Registration {
        Registration {
            username: "test".to_string(),
            name: "test".to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
        }
    }

    fn stored_user(username: &str, password_hash: &str) -> User {
        User {
            username: username.to_string(),
            name: "test".to_string(),
            password: password_hash.to_string(),
            role: Role::User,
        }
    }

    fn hash_for_tests(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn register_rejects_password_mismatch() {
        let users = MockUserStore::new();
        let service = AuthService::new(Arc::new(users), test_config());

        let err = service
            .register(registration("testtests", "testtest"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "password not match"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_username()
            .withf(|username| username == "test")
            .returning(|_| Ok(Some(stored_user("test", "irrelevant"))));
        let service = AuthService::new(Arc::new(users), test_config());

        let err = service
            .register(registration("testtest", "testtest"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "username already exists"));
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let mut users = MockUserStore::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|user: &NewUser| {
                user.username == "test"
                    && user.role == Role::User
                    && user.password != "testtest"
                    && user.password.starts_with("$argon2")
            })
            .returning(|_| Ok(()));
        let service = AuthService::new(Arc::new(users), test_config());

        service
            .register(registration("testtest", "testtest"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn authenticate_hides_unknown_user_from_wrong_password() {
        let mut users = MockUserStore::new();
        let hash = hash_for_tests("testtest");
        users
            .expect_find_by_username()
            .returning(move |username| match username {
                "test" => Ok(Some(stored_user("test", &hash))),
                _ => Ok(None),
            });
        let service = AuthService::new(Arc::new(users), test_config());

        let unknown = service.authenticate("ghost", "testtest").await.unwrap_err();
        let wrong = service.authenticate("test", "wrongpass").await.unwrap_err();

        let unknown_msg = match unknown {
            AppError::Authentication(msg) => msg,
            other => panic!("expected authentication error, got {:?}", other),
        };
        let wrong_msg = match wrong {
            AppError::Authentication(msg) => msg,
            other => panic!("expected authentication error, got {:?}", other),
        };
        assert_eq!(unknown_msg, wrong_msg);
    }

    #[tokio::test]
    async fn authenticate_returns_verifiable_token() {
        let mut users = MockUserStore::new();
        let hash = hash_for_tests("testtest");
        users
            .expect_find_by_username()
            .returning(move |_| Ok(Some(stored_user("test", &hash))));
        let service = AuthService::new(Arc::new(users), test_config());

        let token = service.authenticate("test", "testtest").await.unwrap();
        assert!(!token.is_empty());

        let claims = UserClaims::from_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "test");
        assert_eq!(claims.name, "test");
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn update_profile_rejects_taken_username() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_username()
            .withf(|username| username == "taken")
            .returning(|_| Ok(Some(stored_user("taken", "irrelevant"))));
        let service = AuthService::new(Arc::new(users), test_config());

        let request = UpdateProfileRequest {
            username: Some("taken".to_string()),
            name: None,
            password: None,
            password_confirm: None,
        };
        let err = service.update_profile("test", request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_profile_reissues_token_for_new_username() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_username()
            .withf(|username| username == "renamed")
            .returning(|_| Ok(None));
        users
            .expect_update_profile()
            .withf(|username, changes: &ProfileChanges| {
                username == "test" && changes.username.as_deref() == Some("renamed")
            })
            .returning(|_, changes| {
                Ok(User {
                    username: changes.username.clone().unwrap_or_default(),
                    name: "test".to_string(),
                    password: "irrelevant".to_string(),
                    role: Role::User,
                })
            });
        let service = AuthService::new(Arc::new(users), test_config());

        let request = UpdateProfileRequest {
            username: Some("renamed".to_string()),
            name: None,
            password: None,
            password_confirm: None,
        };
        let (profile, token) = service.update_profile("test", request).await.unwrap();

        assert_eq!(profile.username, "renamed");
        let claims = UserClaims::from_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "renamed");
    }

    #[tokio::test]
    async fn update_profile_password_requires_matching_confirmation() {
        let users = MockUserStore::new();
        let service = AuthService::new(Arc::new(users), test_config());

        let request = UpdateProfileRequest {
            username: None,
            name: None,
            password: Some("newpassword".to_string()),
            password_confirm: Some("different".to_string()),
        };
        let err = service.update_profile("test", request).await.unwrap_err();
        assert!(
            matches!(err, AppError::Validation(ref msgs) if msgs == &["password not match".to_string()])
        );
    }
}
