use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    error::BookstoreError,
    types::{Claims, HashedPassword, Username},
};

pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Clone)]
pub struct AuthConfig {
    /// The issuer for auth tokens. We will validate that all auth tokens match the given issuer.
    pub auth_token_issuer: String,
    /// The secret used to sign JWT authorization tokens.
    /// If the secret changes, all currently authenticated sessions will be terminated.
    pub auth_token_secret: String,
    /// How long auth tokens should remain valid for. After this interval, the client will have to re-login.
    pub auth_token_lifetime: Duration,
}

/// Issues and verifies stateless, signed identity tokens.
///
/// Nothing is stored server-side: a token stays valid until it expires, and
/// verification does not check that the named user still exists.
pub struct TokenService {
    issuer: String,
    lifetime: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.auth_token_secret.as_bytes();
        Self {
            issuer: config.auth_token_issuer.clone(),
            lifetime: config.auth_token_lifetime.as_secs(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, username: &Username) -> Result<String, BookstoreError> {
        self.issue_at(username, unix_now())
    }

    pub fn issue_at(&self, username: &Username, issued_at: u64) -> Result<String, BookstoreError> {
        let claims = Claims {
            sub: username.0.clone(),
            iss: self.issuer.clone(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.lifetime),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Username, BookstoreError> {
        self.verify_at(token, unix_now())
    }

    /// Accepts the token only within `[iat, exp)` as seen from `now`.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Username, BookstoreError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // expiry is checked below without leeway
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejected token");
                BookstoreError::INVALID_TOKEN
            })?
            .claims;

        if now < claims.iat || now >= claims.exp {
            tracing::debug!(sub = %claims.sub, exp = claims.exp, now, "token outside validity window");
            return Err(BookstoreError::INVALID_TOKEN);
        }

        Ok(Username(claims.sub))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Argon2-hash `password` under a fresh random salt, off the async executor.
pub async fn hash_password(password: &str) -> Result<HashedPassword, BookstoreError> {
    let password = password.to_owned();
    let encoded = tokio::task::spawn_blocking(move || {
        let salt = Uuid::new_v4();
        argon2::hash_encoded(password.as_bytes(), salt.as_bytes(), &argon2::Config::default())
    })
    .await??;

    Ok(HashedPassword(encoded))
}

pub async fn verify_password(password: &str, hash: &HashedPassword) -> Result<bool, BookstoreError> {
    let password = password.to_owned();
    let encoded = hash.0.clone();
    let matches =
        tokio::task::spawn_blocking(move || argon2::verify_encoded(&encoded, password.as_bytes()))
            .await??;

    Ok(matches)
}
