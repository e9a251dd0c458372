use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::{error::Error as StdError, fmt};

use crate::services::auth::Role;

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug)]
pub enum AccessJwtError {
    Jwt(jsonwebtoken::errors::Error),
    MissingOrInvalidAud,
    EmptyClaim(&'static str),
    InvalidSub,
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::MissingOrInvalidAud => write!(f, "missing or invalid 'aud' claim"),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
            Self::InvalidSub => write!(f, "invalid 'sub' (expected positive integer)"),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

fn aud_is_present_and_valid(aud: &serde_json::Value) -> bool {
    match aud {
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Array(arr) => arr.iter().any(|v| match v {
            serde_json::Value::String(s) => !s.trim().is_empty(),
            _ => false,
        }),
        // Missing claim ends up as Null due to #[serde(default)]
        _ => false,
    }
}

/// Access token (JWT) claims as issued by the external token service.
///
/// `sub` carries the numeric user id as a string. `role` is optional; the
/// role that is actually trusted comes from the users table, not from here.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    #[serde(default)]
    pub aud: serde_json::Value,

    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub role: Option<String>,
}

/// 検証済みトークンから取り出した値 (subject id と role claim)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedAccessToken {
    pub user_id: i64,
    pub role: Role,
}

/// Verifies a bearer token and extracts its subject.
///
/// Implementations are synchronous and side-effect free; expiry makes the
/// result time-dependent.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError>;
}

/// HS256 access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        secret: &str,
        issuer: &str,
        audience: &str,
        leeway_seconds: u64,
    ) -> Result<Self, String> {
        if secret.is_empty() {
            return Err("jwt secret must not be empty".to_string());
        }

        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    // Verify and decode a JWT access token.
    pub fn decode(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks signature, `exp`, `iss` and `aud`.
    /// This method additionally requires the claims to be non-empty and `sub`
    /// to be a positive integer.
    pub fn verify_strict(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let claims = self.decode(token)?;

        if claims.iss.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("iss"));
        }
        if claims.sub.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("sub"));
        }
        if claims.exp == 0 {
            return Err(AccessJwtError::EmptyClaim("exp"));
        }
        if !aud_is_present_and_valid(&claims.aud) {
            return Err(AccessJwtError::MissingOrInvalidAud);
        }

        Ok(claims)
    }

    pub fn parse_sub(sub: &str) -> Result<i64, AccessJwtError> {
        sub.trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(AccessJwtError::InvalidSub)
    }
}

impl TokenVerifier for AuthService {
    fn verify(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError> {
        let claims = self.verify_strict(token)?;
        let user_id = Self::parse_sub(&claims.sub)?;

        Ok(VerifiedAccessToken {
            user_id,
            role: claims.role.as_deref().map(Role::parse).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &str = "test-secret";
    const ISSUER: &str = "valanse-auth";
    const AUDIENCE: &str = "valanse-api";

    fn service() -> AuthService {
        AuthService::new(SECRET, ISSUER, AUDIENCE, 0).unwrap()
    }

    fn sign(secret: &str, claims: serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str, exp_offset: i64) -> serde_json::Value {
        json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": sub,
            "exp": chrono::Utc::now().timestamp() + exp_offset,
            "role": "admin",
        })
    }

    #[test]
    fn valid_token_yields_subject_and_role() {
        let token = sign(SECRET, claims("42", 600));

        let verified = service().verify(&token).unwrap();
        assert_eq!(verified.user_id, 42);
        assert_eq!(verified.role, Role::Admin);
    }

    #[test]
    fn role_claim_defaults_to_user() {
        let mut c = claims("7", 600);
        c.as_object_mut().unwrap().remove("role");
        let token = sign(SECRET, c);

        assert_eq!(service().verify(&token).unwrap().role, Role::User);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign(SECRET, claims("42", -3600));

        assert!(matches!(
            service().verify(&token),
            Err(AccessJwtError::Jwt(_))
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = sign("other-secret", claims("42", 600));

        assert!(matches!(
            service().verify(&token),
            Err(AccessJwtError::Jwt(_))
        ));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let mut c = claims("42", 600);
        c["aud"] = json!("someone-else");
        let token = sign(SECRET, c);

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        for sub in ["abc", "0", "-5", "1.5"] {
            let token = sign(SECRET, claims(sub, 600));
            assert!(
                matches!(service().verify(&token), Err(AccessJwtError::InvalidSub)),
                "sub {sub:?} should be rejected"
            );
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(service().verify("not.a.jwt").is_err());
        assert!(service().verify("").is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(AuthService::new("", ISSUER, AUDIENCE, 0).is_err());
    }
}
