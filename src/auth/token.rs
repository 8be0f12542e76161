use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::ResetTokenConfig, error::ApiError, state::AppState};

/// Claims carried by a password-reset token: the user it was issued for and
/// when it stops being accepted.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: i64,
    pub exp: usize,
}

#[derive(Clone)]
pub struct ResetTokenKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: TimeDuration,
}

impl FromRef<AppState> for ResetTokenKeys {
    fn from_ref(state: &AppState) -> Self {
        let ResetTokenConfig {
            secret,
            ttl_minutes,
        } = state.config.reset_token.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: TimeDuration::minutes(ttl_minutes),
        }
    }
}

impl ResetTokenKeys {
    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = ResetClaims {
            sub: user_id,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "reset token issued");
        Ok(token)
    }

    /// Returns the embedded user id, `ExpiredToken` once `exp` has passed,
    /// `InvalidToken` for anything else (bad signature, wrong secret, garbage).
    pub fn verify(&self, token: &str) -> Result<i64, ApiError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        match decode::<ResetClaims>(token, &self.decoding, &validation) {
            Ok(data) => {
                debug!(user_id = data.claims.sub, "reset token verified");
                Ok(data.claims.sub)
            }
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(ApiError::ExpiredToken),
                _ => Err(ApiError::InvalidToken),
            },
        }
    }
}

/// Tokens consumed by a successful password reset. Entries are kept for one
/// token lifetime; a token cannot outlive its `exp`, so anything older is
/// safe to drop.
#[derive(Clone, Default)]
pub struct UsedTokenSet {
    inner: Arc<Mutex<HashMap<String, OffsetDateTime>>>,
}

impl UsedTokenSet {
    pub fn is_used(&self, token: &str) -> bool {
        self.inner.lock().expect("used-token lock").contains_key(token)
    }

    pub fn mark_used(&self, token: &str, retain: TimeDuration) {
        let now = OffsetDateTime::now_utc();
        let mut inner = self.inner.lock().expect("used-token lock");
        inner.retain(|_, expires| *expires > now);
        inner.insert(token.to_string(), now + retain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, ttl: TimeDuration) -> ResetTokenKeys {
        ResetTokenKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    #[tokio::test]
    async fn keys_from_state_carry_configured_ttl() {
        let state = AppState::fake();
        let keys = ResetTokenKeys::from_ref(&state);
        assert_eq!(keys.ttl, TimeDuration::minutes(30));
        let token = keys.issue(7).expect("issue");
        assert_eq!(keys.verify(&token).expect("verify"), 7);
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", TimeDuration::minutes(30));
        let token = keys.issue(42).expect("issue");
        assert_eq!(keys.verify(&token).expect("verify"), 42);
    }

    #[test]
    fn verifies_with_most_of_ttl_elapsed() {
        // A token one minute from expiry is still accepted.
        let keys = make_keys("dev-secret", TimeDuration::minutes(1));
        let token = keys.issue(42).expect("issue");
        assert_eq!(keys.verify(&token).expect("verify"), 42);
    }

    #[test]
    fn rejects_expired_token() {
        let keys = make_keys("dev-secret", TimeDuration::minutes(-31));
        let token = keys.issue(42).expect("issue");
        match keys.verify(&token) {
            Err(ApiError::ExpiredToken) => {}
            other => panic!("expected ExpiredToken, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let issuer = make_keys("secret-a", TimeDuration::minutes(30));
        let verifier = make_keys("secret-b", TimeDuration::minutes(30));
        let token = issuer.issue(42).expect("issue");
        match verifier.verify(&token) {
            Err(ApiError::InvalidToken) => {}
            other => panic!("expected InvalidToken, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_tampered_token() {
        let keys = make_keys("dev-secret", TimeDuration::minutes(30));
        let mut token = keys.issue(42).expect("issue");
        token.push('x');
        match keys.verify(&token) {
            Err(ApiError::InvalidToken) => {}
            other => panic!("expected InvalidToken, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn rejects_garbage_token() {
        let keys = make_keys("dev-secret", TimeDuration::minutes(30));
        match keys.verify("not.a.jwt") {
            Err(ApiError::InvalidToken) => {}
            other => panic!("expected InvalidToken, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn used_token_set_rejects_second_use() {
        let used = UsedTokenSet::default();
        assert!(!used.is_used("tok"));
        used.mark_used("tok", TimeDuration::minutes(30));
        assert!(used.is_used("tok"));
        assert!(!used.is_used("other"));
    }

    #[test]
    fn used_token_set_prunes_stale_entries() {
        let used = UsedTokenSet::default();
        used.mark_used("stale", TimeDuration::minutes(-1));
        // The next insert sweeps anything already past its retention window.
        used.mark_used("fresh", TimeDuration::minutes(30));
        assert!(!used.is_used("stale"));
        assert!(used.is_used("fresh"));
    }
}
