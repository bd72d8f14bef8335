use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use log::info;

use crate::error::AppError;
use crate::images::allowed_type;
use crate::{store, AppState};

static FILE_FIELD: &str = "file";

pub async fn get_image(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = path.into_inner();

    let image = web::block(move || -> Result<_, AppError> {
        let url = {
            let mut conn = state.pool.get()?;
            store::get_profile_image_url(&mut conn, &username)?
        }
        .ok_or_else(AppError::user_not_found)?;
        Ok(state.images.load(&url)?)
    })
    .await??;

    Ok(HttpResponse::Ok()
        .content_type(image.content_type)
        .body(image.bytes))
}

pub async fn set_image(
    path: web::Path<String>,
    mut payload: Multipart,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = path.into_inner();

    let exists = {
        let state = state.clone();
        let username = username.clone();
        web::block(move || -> Result<_, AppError> {
            let mut conn = state.pool.get()?;
            Ok(store::get_user(&mut conn, &username)?.is_some())
        })
        .await??
    };
    if !exists {
        return Err(AppError::user_not_found());
    }

    let (content_type, bytes) = read_image(&mut payload, state.images.max_bytes()).await?;

    let url = web::block(move || -> Result<_, AppError> {
        let url = state.images.save(&username, content_type, &bytes)?;
        let mut conn = state.pool.get()?;
        if !store::set_profile_image_url(&mut conn, &username, &url)? {
            return Err(AppError::user_not_found());
        }
        Ok(url)
    })
    .await??;

    info!("stored profile image {}", url);
    Ok(HttpResponse::NoContent().finish())
}

fn bad_multipart(e: actix_multipart::MultipartError) -> AppError {
    AppError::Validation(format!("malformed multipart body: {}", e))
}

/// Pull the `file` field out of the upload, checking its type before reading it.
async fn read_image(
    payload: &mut Multipart,
    max_bytes: usize,
) -> Result<(&'static str, Vec<u8>), AppError> {
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(bad_multipart)?;
        if field.name() != Some(FILE_FIELD) {
            drain(&mut field).await?;
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        let content_type = allowed_type(&content_type).ok_or_else(|| {
            AppError::Validation(format!("unsupported image type {:?}", content_type))
        })?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(bad_multipart)?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::Validation(format!(
                    "image exceeds {} bytes",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((content_type, bytes));
    }

    Err(AppError::Validation(format!(
        "missing multipart field {:?}",
        FILE_FIELD
    )))
}

async fn drain(field: &mut Field) -> Result<(), AppError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(bad_multipart)?;
    }
    Ok(())
}
