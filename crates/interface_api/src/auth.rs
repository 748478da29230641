//! Authentication and tenant scoping

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::BusinessId;

/// JWT claims
///
/// Every token is bound to exactly one business; all queries downstream are
/// scoped by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Business the token grants access to
    pub business_id: Uuid,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// The authenticated business, inserted as a request extension
#[derive(Debug, Clone, Copy)]
pub struct BusinessScope(pub BusinessId);

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

/// Creates a new JWT token bound to a business
pub fn create_token(
    user_id: &str,
    business_id: BusinessId,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        business_id: business_id.into(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if e.to_string().contains("ExpiredSignature") {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips_business_scope() {
        let business_id = BusinessId::new();
        let token = create_token(
            "user-1",
            business_id,
            vec!["billing".to_string()],
            SECRET,
            300,
        )
        .unwrap();

        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(BusinessId::from(claims.business_id), business_id);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token =
            create_token("user-1", BusinessId::new(), vec![], SECRET, 300).unwrap();
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn admin_passes_any_role_check() {
        let claims = Claims {
            sub: "user-1".to_string(),
            business_id: Uuid::new_v4(),
            roles: vec!["admin".to_string()],
            exp: 0,
            iat: 0,
        };
        assert!(has_role(&claims, "billing"));
    }
}
