use std::sync::Arc;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};

use barbershop::{config::AppConfig, db, routes, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = AppConfig::from_env()?;
    db::ensure_sqlite_dir(&config.database_url)?;

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    db::seed_defaults(&pool, &config.admin_password).await?;

    let address = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(pool, config, Arc::new(mockable::DefaultClock));

    log::info!("Starting barbershop on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .configure(routes::api::configure)
            .configure(routes::public::configure)
            .configure(routes::admin::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
