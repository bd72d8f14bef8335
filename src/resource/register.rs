use actix_web::{web, HttpResponse};
use log::info;

use crate::error::AppError;
use crate::models::{validate_username, Credentials, UserResponse};
use crate::{store, AppState};

pub async fn register(
    params: web::Json<Credentials>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let Credentials { username, password } = params.into_inner();
    validate_username(&username)?;
    state.hasher.check_strength(&password)?;

    let user = web::block(move || -> Result<_, AppError> {
        let mut conn = state.pool.get()?;

        // fast path only; the primary key still decides a race
        if store::get_user(&mut conn, &username)?.is_some() {
            return Err(AppError::Conflict(format!(
                "username {} is already registered",
                username
            )));
        }

        let hashed = state.hasher.hash(&password)?;
        store::create_user(&mut conn, &username, &hashed)
    })
    .await??;

    info!("registered user {}", user.username);
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}
