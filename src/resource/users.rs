use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::UserResponse;
use crate::{store, AppState};

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Deserialize)]
pub struct Page {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    MAX_PAGE_SIZE
}

pub async fn list_users(
    page: web::Query<Page>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let skip = i64::from(page.skip);
    let limit = i64::from(page.limit.min(MAX_PAGE_SIZE));

    let users = web::block(move || -> Result<_, AppError> {
        let mut conn = state.pool.get()?;
        store::list_profiles(&mut conn, skip, limit)
    })
    .await??;

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

pub async fn get_user(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = path.into_inner();

    let user = web::block(move || -> Result<_, AppError> {
        let mut conn = state.pool.get()?;
        store::get_user(&mut conn, &username)
    })
    .await??
    .ok_or_else(AppError::user_not_found)?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
