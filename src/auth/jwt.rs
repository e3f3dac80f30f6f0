use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub struct TokenInput {
    pub user_id: u64,
    pub username: String,
    pub tenant_id: u64,
    pub role: u8,
    pub employee_id: Option<u64>,
}

pub fn generate_access_token(input: &TokenInput, secret: &str, ttl: usize) -> String {
    let claims = Claims {
        user_id: input.user_id,
        sub: input.username.clone(),
        tenant_id: input.tenant_id,
        role: input.role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
        employee_id: input.employee_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn generate_refresh_token(input: &TokenInput, secret: &str, ttl: usize) -> (String, Claims) {
    let claims = Claims {
        user_id: input.user_id,
        sub: input.username.clone(),
        tenant_id: input.tenant_id,
        role: input.role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Refresh,
        employee_id: input.employee_id,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    (token, claims)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> TokenInput {
        TokenInput {
            user_id: 11,
            username: "jdoe".to_string(),
            tenant_id: 3,
            role: 4,
            employee_id: Some(1000),
        }
    }

    #[test]
    fn access_token_round_trips_tenant_claims() {
        let token = generate_access_token(&input(), "test-secret", 900);
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, 11);
        assert_eq!(claims.tenant_id, 3);
        assert_eq!(claims.employee_id, Some(1000));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = generate_access_token(&input(), "test-secret", 900);
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn refresh_token_carries_unique_jti() {
        let (_, a) = generate_refresh_token(&input(), "test-secret", 3600);
        let (_, b) = generate_refresh_token(&input(), "test-secret", 3600);
        assert_ne!(a.jti, b.jti);
        assert_eq!(a.token_type, TokenType::Refresh);
    }
}
