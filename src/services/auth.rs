//! Authentication, credential flows and the CREATOR policy

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{
            AddUserRequest, AuthResponse, LoginRequest, RegisterRequest, UpdateRolesRequest,
            UserLookupResponse,
        },
        InsertOneResult, Role, SessionClaims, UpdateResult, User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new user with the default VIEW_ALL role and open a session
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        if self
            .repository
            .users
            .get_by_email(&request.email)
            .await?
            .is_some()
        {
            tracing::info!(email = %request.email, "Registration rejected, email already registered");
            return Err(AppError::Conflict("User Already Registered".to_string()));
        }

        let password_hash = hash_password(request.password).await?;
        let user = User {
            email: request.email,
            username: Some(request.username),
            password_hash: Some(password_hash),
            roles: vec![Role::ViewAll],
        };

        let inserted = self.repository.users.insert(&user).await?;
        if !inserted.acknowledged {
            return Err(AppError::Internal("User insert was not acknowledged".to_string()));
        }

        let token = self.issue_token(&user.email)?;
        tracing::info!(email = %user.email, "User registered");

        Ok(AuthResponse {
            status: "success".to_string(),
            token,
            user: user.profile(),
            message: "Successfully registered".to_string(),
        })
    }

    /// Check credentials and open a session
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = self
            .repository
            .users
            .get_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication("No user found".to_string()))?;

        if !verify_password(user.password_hash.clone(), request.password).await? {
            tracing::info!(email = %user.email, "Login rejected, wrong password");
            return Err(AppError::Authentication("password doesn't match".to_string()));
        }

        let token = self.issue_token(&user.email)?;

        Ok(AuthResponse {
            status: "success".to_string(),
            token,
            user: user.profile(),
            message: "Successfully logged in".to_string(),
        })
    }

    /// Insert a user record as given
    pub async fn add_user(&self, request: AddUserRequest) -> AppResult<InsertOneResult> {
        request.validate()?;

        let password_hash = match request.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let roles = match request.roles {
            Some(roles) if !roles.is_empty() => Role::normalize(roles),
            _ => vec![Role::ViewAll],
        };

        self.repository
            .users
            .insert(&User {
                email: request.email,
                username: request.username,
                password_hash,
                roles,
            })
            .await
    }

    /// Look a user up by email and hand out a session for it
    pub async fn lookup_user(&self, email: &str) -> AppResult<UserLookupResponse> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::UserNotFound("User not found".to_string()))?;

        Ok(UserLookupResponse {
            result: user.profile(),
            token: self.issue_token(&user.email)?,
        })
    }

    /// Set the roles of any user. Only authentication is required of the caller.
    pub async fn update_roles(
        &self,
        requester: &SessionClaims,
        request: UpdateRolesRequest,
    ) -> AppResult<UpdateResult> {
        request.validate()?;

        let roles = Role::normalize(request.roles);
        tracing::info!(
            requester = %requester.email,
            target = %request.email,
            ?roles,
            "Updating user roles"
        );
        self.repository
            .users
            .upsert_roles(&request.email, &roles)
            .await
    }

    /// Load the requester and require the CREATOR role. Never mutates.
    pub async fn verify_creator(&self, claims: &SessionClaims) -> AppResult<User> {
        let requester = self.repository.users.get_by_email(&claims.email).await?;
        if let Err(e) = claims.require_creator(requester.as_ref()) {
            tracing::warn!(email = %claims.email, "CREATOR check failed");
            return Err(e);
        }
        requester.ok_or_else(|| AppError::NotAllowed("Unknown requester".to_string()))
    }

    /// Sign a session token for `email`
    pub fn issue_token(&self, email: &str) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            email: email.to_string(),
            iat: now,
            exp: self
                .config
                .jwt_expiration_hours
                .map(|hours| now + hours as i64 * 3600),
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify a presented session token
    pub fn verify_token(&self, token: &str) -> AppResult<SessionClaims> {
        SessionClaims::from_token(
            token,
            &self.config.jwt_secret,
            self.config.jwt_expiration_hours.is_some(),
        )
        .map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AppError::Authorization("Forbidden access".to_string())
        })
    }
}

/// Hash a password with Argon2 default parameters on the blocking pool
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// Verify a password against a stored PHC hash on the blocking pool.
/// A record without a hash never matches.
pub async fn verify_password(hash: Option<String>, password: String) -> AppResult<bool> {
    let Some(hash) = hash else {
        return Ok(false);
    };

    tokio::task::spawn_blocking(move || -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}
