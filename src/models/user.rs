//! User model and related types

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as text)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    /// Login name, unique, primary identifier
    pub username: String,
    /// Display name
    pub name: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

/// Public identity returned by profile endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub username: String,
    pub name: String,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Profile {
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }
}

/// A fully validated account ready for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    /// Hashed password
    pub password: String,
    pub role: Role,
}

/// Validated profile changes ready for persistence; `password` is
/// already hashed
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "username must be longer than or equal to 3 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 3, message = "name must be longer than or equal to 3 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 8, message = "password must be longer than or equal to 8 characters"))]
    pub password: Option<String>,
    #[validate(length(
        min = 8,
        message = "password_confirm must be longer than or equal to 8 characters"
    ))]
    pub password_confirm: Option<String>,
}

impl RegisterRequest {
    /// Validate field constraints plus presence of all required fields.
    /// Returns the full list of field-level messages on failure.
    pub fn validate_complete(&self) -> Result<(), AppError> {
        let mut messages = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match AppError::from(errors) {
                AppError::Validation(messages) => messages,
                _ => Vec::new(),
            },
        };

        for (field, value) in [
            ("username", &self.username),
            ("name", &self.name),
            ("password", &self.password),
            ("password_confirm", &self.password_confirm),
        ] {
            if value.is_none() {
                messages.push(format!("{} should not be empty", field));
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            messages.sort();
            Err(AppError::Validation(messages))
        }
    }

    /// Validate and convert into a complete registration.
    pub fn into_registration(self) -> Result<Registration, AppError> {
        self.validate_complete()?;
        match (self.username, self.name, self.password, self.password_confirm) {
            (Some(username), Some(name), Some(password), Some(password_confirm)) => {
                Ok(Registration {
                    username,
                    name,
                    password,
                    password_confirm,
                })
            }
            _ => Err(AppError::Internal(
                "registration fields missing after validation".to_string(),
            )),
        }
    }
}

/// A fully validated registration request
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub name: String,
    pub password: String,
    pub password_confirm: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Update own profile request; all fields optional, password change
/// requires a matching confirmation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, message = "username must be longer than or equal to 3 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 3, message = "name must be longer than or equal to 3 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 8, message = "password must be longer than or equal to 8 characters"))]
    pub password: Option<String>,
    #[validate(length(
        min = 8,
        message = "password_confirm must be longer than or equal to 8 characters"
    ))]
    pub password_confirm: Option<String>,
}

impl UpdateProfileRequest {
    /// Validate field constraints; password_confirm is mandatory only when
    /// a new password is supplied.
    pub fn validate_complete(&self) -> Result<(), AppError> {
        let mut messages = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match AppError::from(errors) {
                AppError::Validation(messages) => messages,
                _ => Vec::new(),
            },
        };

        if self.password.is_some() && self.password_confirm.is_none() {
            messages.push("password_confirm should not be empty".to_string());
        }

        if messages.is_empty() {
            Ok(())
        } else {
            messages.sort();
            Err(AppError::Validation(messages))
        }
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Username the token was issued for
    pub sub: String,
    /// Display name at issue time
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token (signature and expiry)
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
