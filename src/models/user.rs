//! User model and related types

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::non_empty;
use crate::error::AppError;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Administrator => "administrator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reader" => Ok(Role::Reader),
            "administrator" => Ok(Role::Administrator),
            _ => Err(AppError::BadRequest("wrong user role".to_string())),
        }
    }
}

// SQLx conversion for Role (stored as text)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: &str = Decode::<Postgres>::decode(value)?;
        s.parse::<Role>()
            .map_err(|_| -> sqlx::error::BoxDynError { format!("unknown role in database: {}", s).into() })
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// User account as stored in the database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Hashed password (argon2), never sent to clients
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

/// Create user request
#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    /// `reader` or `administrator`
    pub role: String,
}

/// Update user request (merge-patch: empty or missing fields keep their value)
#[derive(Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UpdateUser {
    /// Drop empty strings so they read as "not supplied"
    pub fn normalized(self) -> Self {
        Self {
            username: non_empty(self.username),
            password: non_empty(self.password),
            role: non_empty(self.role),
        }
    }
}

/// Validated column changes for a user update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password_hash.is_none() && self.role.is_none()
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl UserClaims {
    /// Claims valid from now for `lifetime`
    pub fn new(username: impl Into<String>, role: Role, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            role,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    /// Create a new HS256 JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, errors::ErrorKind, EncodingKey, Header};

        if secret.is_empty() {
            return Err(ErrorKind::InvalidKeyFormat.into());
        }
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token. Only HMAC algorithms are accepted and
    /// `exp` is mandatory.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};

        if secret.is_empty() {
            return Err(ErrorKind::InvalidKeyFormat.into());
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// Require administrator privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("unauthorized".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    #[test]
    fn test_role_parsing() {
        assert_eq!("reader".parse::<Role>().unwrap(), Role::Reader);
        assert_eq!("administrator".parse::<Role>().unwrap(), Role::Administrator);
        assert!("admin".parse::<Role>().is_err());
        assert!("Reader".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Administrator).unwrap(), "\"administrator\"");
        assert_eq!(Role::Reader.to_string(), "reader");
    }

    #[test]
    fn test_user_json_omits_password() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            password: "$argon2id$v=19$...".into(),
            role: Role::Reader,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "reader");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_create_user_validation() {
        let valid = CreateUser {
            username: "alice".into(),
            password: "secret".into(),
            role: "reader".into(),
        };
        assert!(valid.validate().is_ok());

        let missing = CreateUser {
            username: String::new(),
            password: "secret".into(),
            role: "reader".into(),
        };
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_update_user_normalization() {
        let patch = UpdateUser {
            username: Some(String::new()),
            password: Some("new".into()),
            role: None,
        }
        .normalized();
        assert_eq!(patch.username, None);
        assert_eq!(patch.password.as_deref(), Some("new"));
        assert_eq!(patch.role, None);
    }

    #[test]
    fn test_token_round_trip() {
        let claims = UserClaims::new("alice", Role::Administrator, Duration::minutes(30));
        let token = claims.create_token(SECRET).unwrap();

        let decoded = UserClaims::from_token(&token, SECRET).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.exp - decoded.iat, 30 * 60);
        assert!(decoded.is_admin());
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = UserClaims::new("alice", Role::Reader, Duration::minutes(30))
            .create_token(SECRET)
            .unwrap();
        assert!(UserClaims::from_token(&token, "another_secret").is_err());
    }

    #[test]
    fn test_token_expired() {
        let claims = UserClaims::new("alice", Role::Reader, Duration::hours(-2));
        let token = claims.create_token(SECRET).unwrap();
        assert!(UserClaims::from_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_empty_secret_disables_tokens() {
        let claims = UserClaims::new("alice", Role::Reader, Duration::minutes(30));
        assert!(claims.create_token("").is_err());

        let token = claims.create_token(SECRET).unwrap();
        assert!(UserClaims::from_token(&token, "").is_err());
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                     eyJ1c2VybmFtZSI6Im1hbGxvcnkiLCJyb2xlIjoiYWRtaW5pc3RyYXRvciIsImlhdCI6MCwiZXhwIjo5OTk5OTk5OTk5fQ.";
        assert!(UserClaims::from_token(token, SECRET).is_err());
    }

    #[test]
    fn test_other_hmac_variants_accepted() {
        let claims = UserClaims::new("alice", Role::Reader, Duration::minutes(30));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(UserClaims::from_token(&token, SECRET).unwrap(), claims);
    }

    #[test]
    fn test_unknown_role_in_token_rejected() {
        let payload = serde_json::json!({
            "username": "mallory",
            "role": "superuser",
            "iat": 0,
            "exp": 9999999999i64,
        });
        let token = encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(UserClaims::from_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_missing_exp_rejected() {
        let payload = serde_json::json!({
            "username": "mallory",
            "role": "administrator",
            "iat": 0,
        });
        let token = encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(UserClaims::from_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_require_admin() {
        let admin = UserClaims::new("root", Role::Administrator, Duration::minutes(1));
        let reader = UserClaims::new("bob", Role::Reader, Duration::minutes(1));
        assert!(admin.require_admin().is_ok());
        assert!(matches!(reader.require_admin(), Err(AppError::Authorization(_))));
    }
}
