use actix_web::{web, HttpResponse};
use log::info;

use crate::error::AppError;
use crate::models::{Credentials, UserResponse};
use crate::{store, AppState};

/// Check a username/password pair. Unknown users and wrong passwords are
/// indistinguishable: same status, same body, same Argon2 work.
pub async fn login(
    params: web::Json<Credentials>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let Credentials { username, password } = params.into_inner();

    let (username, user) = web::block(move || -> Result<_, AppError> {
        let mut conn = state.pool.get()?;
        let stored = store::get_password_hash(&mut conn, &username)?;

        let valid = match &stored {
            Some(hash) => state.hasher.verify(&password, hash),
            None => {
                state.hasher.verify(&password, state.hasher.decoy());
                false
            }
        };

        let user = if valid {
            store::get_user(&mut conn, &username)?
        } else {
            None
        };
        Ok((username, user))
    })
    .await??;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(UserResponse::from(user))),
        None => {
            info!("failed login for {}", username);
            Err(AppError::Unauthorized)
        }
    }
}
