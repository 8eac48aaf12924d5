use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::{AuthError, Result},
    jwt::{extract_bearer, Claims, ExtraClaims, SigningSecret, TokenIssuer, TokenVerifier},
    model::{Principal, Registration, Role},
    password::PasswordHasher,
    store::CredentialStore,
};

/// Minimum password length accepted at registration and password change
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Account rules applied by the registration and password-change flows
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    pub min_password_length: usize,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }
}

/// Login, registration and token checks on top of a credential store
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    policy: AuthPolicy,
    dummy_hash: String,
}

impl AuthService {
    /// Create a new AuthService
    ///
    /// # Arguments
    /// * `store` - Credential store holding users and admins
    /// * `secret` - Secret used both to sign and to verify tokens
    /// * `token_expiry_seconds` - Token lifetime (3600 for 1 hour)
    /// * `policy` - Password rules
    pub fn new(
        store: Arc<dyn CredentialStore>,
        secret: &SigningSecret,
        token_expiry_seconds: i64,
        policy: AuthPolicy,
    ) -> Result<Self> {
        let hasher = PasswordHasher::new();
        let dummy_hash = hasher.hash("dinehub-dummy-password")?;

        Ok(Self {
            store,
            hasher,
            issuer: TokenIssuer::new(secret, token_expiry_seconds)?,
            verifier: TokenVerifier::new(secret),
            policy,
            dummy_hash,
        })
    }

    /// Replace the password hasher, e.g. with cheaper parameters in tests
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Result<Self> {
        self.dummy_hash = hasher.hash("dinehub-dummy-password")?;
        self.hasher = hasher;
        Ok(self)
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Check credentials for a principal of the given role and issue a token.
    ///
    /// Unknown identifiers and wrong passwords fail identically with
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(
        &self,
        role: Role,
        login_identifier: &str,
        password: &str,
    ) -> Result<(String, Principal)> {
        let login_identifier = login_identifier.trim();
        if login_identifier.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Login identifier and password are required.".to_string(),
            ));
        }

        let Some(principal) = self.store.find_by_login(role, login_identifier).await? else {
            // Same hashing cost as a real mismatch
            self.verify_password(password, self.dummy_hash.clone()).await?;
            warn!(%role, login = login_identifier, "login rejected: unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_password(password, principal.password_hash.clone())
            .await?
        {
            warn!(%role, principal_id = %principal.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_for(&principal)?;
        info!(%role, principal_id = %principal.id, "login succeeded");

        Ok((token, principal))
    }

    /// Create a customer account and log it in
    pub async fn register(&self, registration: Registration) -> Result<(String, Principal)> {
        let display_name = registration.display_name.trim();
        let login_identifier = registration.login_identifier.trim();

        if display_name.is_empty() {
            return Err(AuthError::Validation("Username is required.".to_string()));
        }
        if login_identifier.is_empty() {
            return Err(AuthError::Validation("Email is required.".to_string()));
        }
        self.check_password_policy(&registration.password)?;

        if self
            .store
            .find_by_login(Role::User, login_identifier)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateAccount(login_identifier.to_string()));
        }

        let password_hash = self.hash_password(&registration.password).await?;
        let principal = Principal::new(
            Role::User,
            display_name.to_string(),
            login_identifier.to_string(),
            password_hash,
            registration.profile,
        );

        // The store rejects a concurrent registration that slipped past the check above
        let principal = self.store.insert(principal).await?;
        let token = self.issue_for(&principal)?;
        info!(principal_id = %principal.id, "registered new user");

        Ok((token, principal))
    }

    /// Ensure the admin account exists; an existing one is left untouched
    pub async fn provision_admin(&self, username: &str, password: &str) -> Result<Principal> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Configuration(
                "admin username and password must be set".to_string(),
            ));
        }

        if let Some(existing) = self.store.find_by_login(Role::Admin, username).await? {
            info!(principal_id = %existing.id, "admin account already provisioned");
            return Ok(existing);
        }

        let password_hash = self.hash_password(password).await?;
        let admin = Principal::new(
            Role::Admin,
            username.to_string(),
            username.to_string(),
            password_hash,
            Default::default(),
        );

        let admin = self.store.insert(admin).await?;
        info!(principal_id = %admin.id, "provisioned admin account");

        Ok(admin)
    }

    /// Replace a principal's password after checking the current one
    pub async fn change_password(
        &self,
        principal_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if current_password.is_empty() {
            return Err(AuthError::Validation(
                "Current password is required.".to_string(),
            ));
        }
        self.check_password_policy(new_password)?;

        let principal = self
            .store
            .find_by_id(principal_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(principal_id.to_string()))?;

        if !self
            .verify_password(current_password, principal.password_hash.clone())
            .await?
        {
            warn!(principal_id, "password change rejected: current password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.hash_password(new_password).await?;
        self.store
            .update_password_hash(principal_id, password_hash)
            .await?;
        info!(principal_id, "password changed");

        Ok(())
    }

    /// Verify the token carried by an `Authorization` header value
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<Claims> {
        let token = extract_bearer(header)?;
        Ok(self.verifier.verify(token)?)
    }

    fn issue_for(&self, principal: &Principal) -> Result<String> {
        self.issuer.issue(
            &principal.id,
            ExtraClaims::role(principal.role).with_name(principal.display_name.clone()),
        )
    }

    fn check_password_policy(&self, password: &str) -> Result<()> {
        let min = self.policy.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min} characters long."
            )));
        }
        Ok(())
    }

    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, hash: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

/// Check a verified principal against an optional role requirement
pub fn authorize(claims: &Claims, required: Option<Role>) -> Result<()> {
    match required {
        Some(role) if !claims.has_role(role) => Err(AuthError::Forbidden { required: role }),
        _ => Ok(()),
    }
}
