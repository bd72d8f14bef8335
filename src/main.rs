use actix_web::{middleware, web, App, HttpServer};
use log::{error, info};
use pandas_users::{config::Config, secret, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("pandas_users=info,actix_web=info"),
    )
    .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let pepper = match secret::pepper(&config.secrets_dir) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::from_config(&config, pepper) {
        Ok(s) => web::Data::new(s),
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting HTTP server on {}...", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(pandas_users::configure)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
