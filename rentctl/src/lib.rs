//! # rentctl: Room Rental Control Service
//!
//! `rentctl` runs the back office of a small rental building: which tenant lives in which room,
//! and what each tenancy owes for the month.
//!
//! ## Overview
//!
//! Two components do the work, both over a transactional [`store::Store`]:
//!
//! - [`occupancy::OccupancyManager`] moves tenants in, between rooms and out, and keeps the
//!   two-way reference between a room and its tenant consistent. A room is occupied exactly when
//!   it points at a tenant, and that tenant points back.
//! - [`billing::BillingCalculator`] computes monthly charges (room price, a flat water charge per
//!   fixture, metered electricity), records payment, rolls tenancies into the next billing period
//!   and reports unpaid tenancies once the month is past the alert day.
//!
//! Meter readings arrive through a [`meters::MeterReadingSource`], invoices and reminders leave
//! through an [`email::NotificationSender`], and billing snapshots are written to an
//! [`export::ExportSink`].
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum), with every resource route nested
//! under `/api/v1` and documented with `utoipa`. Records live either in process memory
//! (`database.type: memory`, the default) or in PostgreSQL (`database.type: external`, or
//! `DATABASE_URL`), in which case migrations run at startup.
//!
//! ## Configuration
//!
//! See [`config`] for the YAML layout and environment overrides.
//!
//! ## Getting Started
//!
//! ```bash
//! rentctl -f config.yaml
//! curl http://localhost:3001/healthz
//! ```
//!
//! Interactive API docs are served at `/docs`.

pub mod api;
pub mod billing;
pub mod config;
pub mod db;
pub mod email;
pub mod errors;
pub mod export;
pub mod meters;
pub mod occupancy;
pub mod openapi;
pub mod store;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    billing::BillingCalculator,
    config::{Config, CorsOrigin, DatabaseConfig},
    email::{EmailService, NotificationSender},
    export::{ExportSink, JsonFileSink},
    meters::StoredMeterFeed,
    occupancy::OccupancyManager,
    openapi::ApiDoc,
    store::{InMemoryStore, PostgresStore, Store},
};
use axum::{
    Router,
    http::{self, HeaderValue},
    routing::{get, post, put},
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Shared state handed to every request handler.
///
/// ```ignore
/// let state = AppState::builder()
///     .store(Arc::new(InMemoryStore::new()))
///     .config(config)
///     .export_sink(Arc::new(JsonFileSink::new("./exports")))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    /// `None` when email is disabled
    pub notifier: Option<Arc<dyn NotificationSender>>,
    pub export_sink: Arc<dyn ExportSink>,
}

impl AppState {
    pub fn occupancy(&self) -> OccupancyManager {
        OccupancyManager::new(self.store.clone(), self.config.billing.rates())
    }

    pub fn billing(&self) -> BillingCalculator {
        BillingCalculator::new(self.store.clone(), self.config.billing.clone())
    }

    pub fn meter_feed(&self) -> StoredMeterFeed {
        StoredMeterFeed::new(self.store.clone())
    }
}

/// Get the rentctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the configured store. Returns the pool too when the store is PostgreSQL, so it can be
/// closed on shutdown.
async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::Memory => {
            info!("Using in-memory store; data will be lost on shutdown");
            Ok((Arc::new(InMemoryStore::new()), None))
        }
        DatabaseConfig::External { url, pool } => {
            info!("Using external database");
            let mut options = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs));
            // 0 means never
            if pool.idle_timeout_secs > 0 {
                options = options.idle_timeout(Duration::from_secs(pool.idle_timeout_secs));
            }
            if pool.max_lifetime_secs > 0 {
                options = options.max_lifetime(Duration::from_secs(pool.max_lifetime_secs));
            }

            let pg_pool = options.connect(url).await?;
            migrator().run(&pg_pool).await?;
            Ok((Arc::new(PostgresStore::new(pg_pool.clone())), Some(pg_pool)))
        }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Origin(origin) => origin.parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

fn api_routes() -> Router<AppState> {
    use api::handlers::{billing, bills, maintenance, meter_readings, rooms, tenants};

    Router::new()
        // Rooms
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route(
            "/rooms/{id}",
            get(rooms::get_room).patch(rooms::update_room).delete(rooms::delete_room),
        )
        // Tenants
        .route("/tenants", get(tenants::list_tenants).post(tenants::assign_tenant))
        .route("/tenants/{id}", get(tenants::get_tenant).patch(tenants::reassign_tenant))
        .route("/tenants/{id}/meter-reading", put(tenants::record_meter_reading))
        .route("/tenants/{id}/bills", post(tenants::issue_bill))
        .route(
            "/tenants/by-citizen-id/{citizen_id}",
            get(tenants::get_tenant_by_citizen_id).delete(tenants::release_tenant),
        )
        .route("/tenants/by-citizen-id/{citizen_id}/payment", post(tenants::confirm_payment))
        // Billing
        .route("/billing/statements", get(billing::list_statements))
        .route("/billing/unpaid", get(billing::list_unpaid))
        .route("/billing/summary", get(billing::get_summary))
        .route("/billing/charges", post(billing::apply_charges))
        .route("/billing/periods/{period}/reset", post(billing::reset_period))
        .route("/billing/export", get(billing::preview_export).post(billing::write_export))
        .route("/billing/notifications/invoices", post(billing::send_invoices))
        .route("/billing/notifications/reminders", post(billing::send_reminders))
        // Bills
        .route("/bills", get(bills::list_bills).post(bills::create_bill))
        .route(
            "/bills/{id}",
            get(bills::get_bill).patch(bills::update_bill).delete(bills::delete_bill),
        )
        // Meter feed
        .route("/meter-readings", get(meter_readings::list_meter_readings))
        .route("/meter-readings/{room_number}", put(meter_readings::upsert_meter_reading))
        // Maintenance
        .route("/maintenance/reconcile", post(maintenance::reconcile))
}

/// Build the application router
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// A configured, ready-to-serve application
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Open the store and wire services according to the configuration
    #[instrument(skip_all, err)]
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting rentctl with configuration: {:#?}", config);

        let (store, pool) = setup_store(&config).await?;

        let notifier: Option<Arc<dyn NotificationSender>> = if config.email.enabled {
            Some(Arc::new(EmailService::new(&config.email)?))
        } else {
            info!("Email notifications disabled");
            None
        };

        let state = AppState::builder()
            .store(store)
            .config(config.clone())
            .maybe_notifier(notifier)
            .export_sink(Arc::new(JsonFileSink::new(&config.export.directory)) as Arc<dyn ExportSink>)
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Serve until `shutdown` resolves, then release resources
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "rentctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
