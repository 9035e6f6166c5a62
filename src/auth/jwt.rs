use std::sync::Arc;

use axum::extract::FromRef;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState};

/// The only algorithm this service issues or accepts.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Longest accepted token lifetime: one year.
pub const MAX_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("token is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

/// Issues and validates HS256 session tokens under one process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Result<Self, TokenError> {
        if cfg.secret.trim().is_empty() {
            return Err(TokenError::Signing("signing secret is empty".into()));
        }
        if !(1..=MAX_TTL_HOURS).contains(&cfg.ttl_hours) {
            return Err(TokenError::Signing(format!(
                "token lifetime must be between 1 and {MAX_TTL_HOURS} hours"
            )));
        }
        let ttl = TimeDuration::hours(cfg.ttl_hours);
        if OffsetDateTime::now_utc().checked_add(ttl).is_none() {
            return Err(TokenError::Signing("token lifetime overflows the clock".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl,
        })
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user_id: Uuid, email: &str, now: OffsetDateTime) -> Result<String, TokenError> {
        let exp = now
            .checked_add(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".into()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        debug!(user_id = %user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Returns the subject of a token that is correctly signed, HS256, and unexpired.
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        self.validate_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    fn validate_at(&self, token: &str, now: i64) -> Result<Uuid, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Invalid)?;
        if header.alg != TOKEN_ALGORITHM {
            warn!(alg = ?header.alg, "jwt algorithm rejected");
            return Err(TokenError::Invalid);
        }

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // Expiry is compared below against `now` with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::Invalid
        })?;

        if data.claims.exp <= now {
            return Err(TokenError::Expired);
        }

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)?;
        debug!(user_id = %user_id, "jwt verified");
        Ok(user_id)
    }
}
