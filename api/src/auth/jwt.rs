//! Bearer token mint/decode: HS256 JWT with `sub` set to the user's email
//! and `exp` an integer Unix timestamp.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

fn parse_algorithm(name: &str) -> Algorithm {
    match name {
        "HS384" => Algorithm::HS384,
        "HS512" => Algorithm::HS512,
        _ => Algorithm::HS256,
    }
}

/// Mint a token for `subject` (the user's email) that expires in
/// `expires_in_minutes` minutes.
pub fn mint_token(
    subject: &str,
    secret_key: &str,
    algorithm: &str,
    expires_in_minutes: i64,
) -> jsonwebtoken::errors::Result<String> {
    let exp = (Utc::now() + Duration::minutes(expires_in_minutes)).timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        exp,
    };
    let header = Header::new(parse_algorithm(algorithm));
    jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(secret_key.as_bytes()))
}

/// Decode and validate a bearer token, rejecting expired or malformed ones.
pub fn decode_token(
    token: &str,
    secret_key: &str,
    algorithm: &str,
) -> jsonwebtoken::errors::Result<Claims> {
    let validation = Validation::new(parse_algorithm(algorithm));
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_key.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_subject() {
        let token = mint_token("ada@example.com", "sekrit", "HS256", 30).unwrap();
        let claims = decode_token(&token, "sekrit", "HS256").unwrap();
        assert_eq!(claims.sub, "ada@example.com");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = mint_token("ada@example.com", "sekrit", "HS256", 30).unwrap();
        assert!(decode_token(&token, "other", "HS256").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = mint_token("ada@example.com", "sekrit", "HS256", -1).unwrap();
        assert!(decode_token(&token, "sekrit", "HS256").is_err());
    }
}
