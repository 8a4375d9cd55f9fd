use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use hrm_leave::config::Config;
use hrm_leave::db::init_db;
use hrm_leave::docs::ApiDoc;
use hrm_leave::leave::service::LeaveService;
use hrm_leave::routes;
use hrm_leave::store::holiday_cache::CachedHolidays;
use hrm_leave::store::mysql::{
    MySqlConfigStore, MySqlCreditStore, MySqlHolidays, MySqlRequestStore,
};
use hrm_leave::store::snapshot::SnapshotWriter;

#[get("/")]
async fn index() -> impl Responder {
    "Leave service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let holidays = CachedHolidays::new(
        MySqlHolidays::new(pool.clone()),
        Duration::from_secs(config.holiday_cache_ttl_secs),
    );
    let snapshots = SnapshotWriter::new(&config.snapshot_dir);
    info!(root = %snapshots.root().display(), "Request snapshots enabled");

    let service = Data::new(LeaveService::new(
        Arc::new(MySqlConfigStore::new(pool.clone())),
        Arc::new(MySqlCreditStore::new(pool.clone())),
        Arc::new(holidays),
        Arc::new(MySqlRequestStore::new(pool.clone())),
        snapshots,
    ));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
