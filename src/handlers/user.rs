use axum::{extract::State, http::StatusCode, response::Json};
use axum_extra::extract::WithRejection;
use bcrypt::{hash, verify};
use serde_json::{json, Value};
use validator::Validate;

use crate::database::StoreError;
use crate::dtos::auth_dtos::{LoginRequest, SignupRequest};
use crate::errors::{AppError, Result};
use crate::middleware::auth::issue_token;
use crate::models::user::{LoginResponse, NewUser, UserResponse};
use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SignupRequest>, AppError>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let password_hash = hash(&payload.password, state.config.bcrypt_cost)
        .map_err(|e| AppError::configuration(format!("Password could not be hashed: {}", e)))?;

    let user = state
        .users
        .insert(NewUser {
            email: payload.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateKey => AppError::DuplicateKey,
            other => AppError::database("Creating a user failed")(other),
        })?;

    tracing::info!("Created user {}", user.id.to_hex());

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created!",
            "result": UserResponse::from(user),
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<LoginResponse>> {
    let user = state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(AppError::database("Login failed"))?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = verify(&payload.password, &user.password).unwrap_or(false);
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(
        &state.config.jwt_secret,
        state.config.jwt_expires_in,
        &user,
    )?;

    Ok(Json(LoginResponse {
        token,
        expires_in: state.config.jwt_expires_in,
        user_id: user.id.to_hex(),
    }))
}
