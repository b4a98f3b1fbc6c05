use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{auth::claims::Claims, config::JwtConfig, error::ApiError, state::AppState};

/// HS256 keys plus the lifetimes of the two token flavours.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub session_ttl: Duration,
    pub reset_ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            session_ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
            reset_ttl: Duration::from_secs((cfg.reset_ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn sign_at(
        &self,
        user_id: i32,
        email: &str,
        ttl: Duration,
        issued_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = issued_at + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            id: user_id,
            email: email.to_string(),
            iat: issued_at.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, ttl_secs = ttl.as_secs(), "jwt signed");
        Ok(token)
    }

    pub fn sign_session(&self, user_id: i32, email: &str) -> anyhow::Result<String> {
        self.sign_at(user_id, email, self.session_ttl, OffsetDateTime::now_utc())
    }

    pub fn sign_reset(&self, user_id: i32, email: &str) -> anyhow::Result<String> {
        self.sign_at(user_id, email, self.reset_ttl, OffsetDateTime::now_utc())
    }

    /// Checks signature and expiry. No clock leeway: a token is dead the second it expires.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

/// Resolve an `Authorization` header value to verified claims.
///
/// A missing or empty bearer token is `Unauthorized`; a token that fails
/// verification is `Forbidden`.
pub fn authenticate(keys: &JwtKeys, authorization: Option<&str>) -> Result<Claims, ApiError> {
    let token = authorization
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

    keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        ApiError::Forbidden("Invalid token".into())
    })
}

/// Extractor guarding protected routes; yields the decoded claims.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        authenticate(&keys, header).map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            ttl_minutes: 60,
            reset_ttl_minutes: 15,
        })
    }

    #[test]
    fn session_token_carries_id_and_email() {
        let keys = make_keys("dev-secret");
        let token = keys.sign_session(42, "ana@example.com").expect("sign session");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.id, 42);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn session_token_rejected_after_an_hour() {
        let keys = make_keys("dev-secret");
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(61);
        let token = keys
            .sign_at(1, "ana@example.com", keys.session_ttl, issued)
            .expect("sign");
        assert!(keys.verify(&token).is_err());

        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(59);
        let token = keys
            .sign_at(1, "ana@example.com", keys.session_ttl, issued)
            .expect("sign");
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn reset_token_lives_fifteen_minutes() {
        let keys = make_keys("dev-secret");
        let token = keys.sign_reset(7, "b@example.com").expect("sign reset");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = make_keys("secret-a").sign_session(1, "a@b.co").unwrap();
        assert!(make_keys("secret-b").verify(&token).is_err());
    }

    #[test]
    fn authenticate_without_token_is_unauthorized() {
        let keys = make_keys("dev-secret");
        for header in [None, Some("Bearer "), Some("Token abc")] {
            let err = authenticate(&keys, header).unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized(_)), "header {:?}", header);
        }
    }

    #[test]
    fn authenticate_with_bad_token_is_forbidden() {
        let keys = make_keys("dev-secret");
        let err = authenticate(&keys, Some("Bearer not.a.jwt")).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn extractor_attaches_claims() {
        let state = testing::state();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_session(3, "c@example.com").unwrap();

        let (mut parts, _) = axum::http::Request::builder()
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(())
            .unwrap()
            .into_parts();
        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("authorized");
        assert_eq!(claims.id, 3);
        assert_eq!(claims.email, "c@example.com");
    }

    #[tokio::test]
    async fn extractor_rejects_missing_header() {
        let state = testing::state();
        let (mut parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("rejected");
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
