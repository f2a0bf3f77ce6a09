//! Planwatch
//!
//! Proactive weather backend for outdoor plans: keeps a live weather feed,
//! evaluates every plan's condition spec against each reading and raises
//! alerts when a plan's verdict changes.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod display;
mod error;
mod evaluator;
mod feed;
mod handlers;
mod models;
mod notify;
mod plans;
mod state;
mod templates;
mod validation;
mod watcher;
mod websocket;

use crate::config::Settings;
use crate::evaluator::ConditionEvaluator;
use crate::feed::WeatherFeed;
use crate::notify::{LogNotifier, Notifier};
use crate::state::AppState;
use crate::watcher::PlanWatcher;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenv::dotenv().ok();

    // Logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,planwatch=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();

    // Load configuration
    let settings = Settings::from_env()?;
    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);

    info!("Starting planwatch backend");
    info!("Binding server to {}", bind_address);

    // Shared application state
    let app_state = Arc::new(RwLock::new(AppState::new()));
    let evaluator = ConditionEvaluator::new(settings.evaluator);

    // ---------------------------------------------------------------------
    // Weather feed background task
    // IMPORTANT: use actix_rt::spawn (NOT tokio::spawn)
    // ---------------------------------------------------------------------
    let feed_state = app_state.clone();
    let feed_interval_ms = settings.feed.interval_ms;

    actix_rt::spawn(async move {
        let feed = WeatherFeed::new(feed_interval_ms);
        feed.run(feed_state).await;
    });

    // ---------------------------------------------------------------------
    // Plan watcher background task
    // ---------------------------------------------------------------------
    let watcher_state = app_state.clone();
    let watcher_interval_ms = settings.watcher.interval_ms;

    actix_rt::spawn(async move {
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let watcher = PlanWatcher::new(watcher_interval_ms, evaluator, notifier);
        watcher.run(watcher_state).await;
    });

    // ---------------------------------------------------------------------
    // HTTP + WebSocket server
    // ---------------------------------------------------------------------
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(evaluator))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
