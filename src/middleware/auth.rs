use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, Result};
use crate::models::user::{Claims, User};
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn issue_token(secret: &str, expires_in: u64, user: &User) -> Result<String> {
    let exp = chrono::Utc::now().timestamp() as u64 + expires_in;
    let claims = Claims {
        email: user.email.clone(),
        user_id: user.id.to_hex(),
        exp: exp as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::TokenError(e.to_string()))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::NotAuthenticated
    })
}

/// Verifies the bearer token and stores its [`Claims`] in the request
/// extensions for the handler.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers()).ok_or(AppError::NotAuthenticated)?;
    let claims = verify_token(&state.config.jwt_secret, token)?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use mongodb::bson::oid::ObjectId;

    fn user() -> User {
        User {
            id: ObjectId::new(),
            email: "owner@example.com".to_string(),
            password: "hash".to_string(),
        }
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let user = user();
        let token = issue_token("secret", 3600, &user).unwrap();

        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.user_id, user.id.to_hex());
        assert_eq!(claims.email, user.email);

        assert!(matches!(
            verify_token("other-secret", &token),
            Err(AppError::NotAuthenticated)
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let claims = Claims {
            email: "a@example.com".to_string(),
            user_id: "u".to_string(),
            exp: (chrono::Utc::now().timestamp() - 3600) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(verify_token("secret", &token).is_err());
    }
}
