pub mod config;
pub mod error;
pub mod hash;
pub mod images;
pub mod models;
pub mod resource;
pub mod schema;
pub mod secret;
pub mod store;

use actix_web::web;

use config::Config;
use error::AppError;
use hash::CredentialHasher;
use images::ImageStore;
use store::Pool;

/// Everything a request handler needs, shared by all workers.
pub struct AppState {
    pub pool: Pool,
    pub hasher: CredentialHasher,
    pub images: ImageStore,
}

impl AppState {
    /// Open the database, create the schema if needed, and set up image storage.
    pub fn from_config(config: &Config, pepper: Vec<u8>) -> Result<Self, AppError> {
        let pool = store::build_pool(&config.database_url, config.pool_size)?;
        store::init_schema(&mut *pool.get()?)?;

        Ok(AppState {
            pool,
            hasher: CredentialHasher::new(config.hash_cost, pepper, config.min_password_len)?,
            images: ImageStore::new(&config.image_dir, config.max_image_bytes)?,
        })
    }
}

/// API Guide (keep updated!)
/// - /users
///     - POST { username, password }: register user
///     - GET ?skip=&limit=: list users
/// - /users/{username}
///     - GET: get one user
/// - /users/{username}/profile/image
///     - GET: profile image, or the placeholder
///     - PUT/POST multipart `file`: replace profile image
/// - /auth
///     - POST { username, password }: check credentials
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(4096))
        .service(
            web::resource(vec!["/users", "/users/"])
                .route(web::post().to(resource::register))
                .route(web::get().to(resource::list_users)),
        )
        .service(web::resource("/users/{username}").route(web::get().to(resource::get_user)))
        .service(
            web::resource("/users/{username}/profile/image")
                .route(web::get().to(resource::get_image))
                .route(web::put().to(resource::set_image))
                .route(web::post().to(resource::set_image)),
        )
        .service(web::resource("/auth").route(web::post().to(resource::login)));
}
