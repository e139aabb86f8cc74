use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware, web, App, HttpServer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use booknest::{
    api::HttpBookingApi,
    config::AppConfig,
    db::{self, SqliteProviderSource},
    routes,
    state::{spawn_idle_sweeper, AppState},
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    db::ensure_sqlite_dir(&config.database_url)?;

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    db::run_migrations(&pool).await?;
    if config.seed_providers {
        db::seed_providers(&pool).await?;
    }

    let backend = Arc::new(HttpBookingApi::new(&config.booking_api_url, config.api_timeout)?);
    log::info!("Using booking backend at {}", config.booking_api_url);

    let address = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(
        config,
        Arc::new(SqliteProviderSource::new(pool)),
        backend.clone(),
        backend,
    );

    spawn_idle_sweeper(state.sessions.clone(), SESSION_SWEEP_INTERVAL);

    log::info!("Starting Booknest on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::public::configure)
            .configure(routes::booking::configure)
            .configure(routes::confirmation::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
