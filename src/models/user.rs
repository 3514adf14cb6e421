//! User model, roles and session token claims

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Capability tags a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Granted to every registered user
    ViewAll,
    /// May create and modify book records
    Creator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ViewAll => "VIEW_ALL",
            Role::Creator => "CREATOR",
        }
    }

    /// Drop duplicates, keeping first occurrence order
    pub fn normalize(roles: Vec<Role>) -> Vec<Role> {
        let mut out = Vec::with_capacity(roles.len());
        for role in roles {
            if !out.contains(&role) {
                out.push(role);
            }
        }
        out
    }

    /// Parse stored tags, skipping the ones this server does not know
    pub fn from_tags<I, S>(tags: I) -> Vec<Role>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = tags
            .into_iter()
            .filter_map(|tag| match tag.as_ref().parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    tracing::warn!("Ignoring stored role: {}", e);
                    None
                }
            })
            .collect();
        Self::normalize(roles)
    }

    pub fn to_tags(roles: &[Role]) -> Vec<String> {
        roles.iter().map(|r| r.as_str().to_string()).collect()
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
        match s {
            "VIEW_ALL" => Ok(Role::ViewAll),
            "CREATOR" => Ok(Role::Creator),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique, immutable key
    pub email: String,
    pub username: Option<String>,
    /// Argon2 PHC string. Absent for records created through a role upsert.
    pub password_hash: Option<String>,
    pub roles: Vec<Role>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            username: self.username.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Public view of a user, never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub email: String,
    pub username: Option<String>,
    pub roles: Vec<Role>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by register and login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub status: String,
    pub token: String,
    pub user: UserProfile,
    pub message: String,
}

/// Raw user insert (`/addUser`)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default, alias = "role")]
    pub roles: Option<Vec<Role>>,
}

/// Role update request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRolesRequest {
    pub email: String,
    #[serde(alias = "role")]
    #[validate(length(min = 1, message = "At least one role is required"))]
    pub roles: Vec<Role>,
}

/// Query for `/user`
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserLookupQuery {
    pub email: Option<String>,
}

/// Body returned by `/user` when the user exists
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserLookupResponse {
    pub result: UserProfile,
    pub token: String,
}

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl SessionClaims {
    /// Sign the claims into a compact HS256 token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Verify the signature and decode the claims.
    /// `exp` is checked whenever present and is mandatory when `require_exp` is set.
    pub fn from_token(
        token: &str,
        secret: &str,
        require_exp: bool,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let mut validation = Validation::default();
        validation.required_spec_claims.clear();
        if require_exp {
            validation.required_spec_claims.insert("exp".to_string());
        }
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }

    /// Authorization policy: the stored requester must hold CREATOR
    pub fn require_creator(&self, requester: Option<&User>) -> Result<(), AppError> {
        match requester {
            Some(user) if user.has_role(Role::Creator) => Ok(()),
            Some(_) => Err(AppError::NotAllowed(
                "You are not allowed to create books".to_string(),
            )),
            None => Err(AppError::NotAllowed(format!(
                "Requester {} is not a registered user",
                self.email
            ))),
        }
    }
}
