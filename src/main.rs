// main.rs
// Axum server wiring: initializes MongoDB-backed state, builds the router,
// and serves on BIND_ADDR (default :8080).
//
// Public endpoints:
// - POST /login                      -> validates {"email","code"} against current TOTP
// - GET  /files/reports/{filename}   -> generated daily spreadsheet
// - GET  /files/logos/{filename}     -> uploaded organization logo
// Everything else sits behind the session middleware, which also resolves
// the active tenant for the request.

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use dotenvy::dotenv;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use commerceos::{routes, session, state};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = Arc::new(
        state::init_state()
            .await
            .expect("failed to initialize MongoDB state"),
    );

    let protected = Router::new()
        .route("/setup", get(routes::setup))
        .route("/qrcode", get(routes::qrcode))
        .route("/logout", post(routes::logout))
        .route("/org/switch", post(routes::org_switch))
        .route("/api/me/orgs", get(routes::me_orgs))
        .route("/api/orgs", post(routes::orgs_create))
        .route("/api/org", get(routes::org_show).put(routes::org_update))
        .route(
            "/api/org/settings",
            get(routes::settings_show).put(routes::settings_update),
        )
        .route("/api/org/logo", post(routes::logo_upload))
        .route(
            "/api/products",
            get(routes::products_index).post(routes::products_create),
        )
        .route(
            "/api/products/{id}",
            get(routes::products_show)
                .put(routes::products_update)
                .delete(routes::products_delete),
        )
        .route("/api/products/{id}/history", get(routes::products_history))
        .route(
            "/api/supplies",
            get(routes::supplies_index).post(routes::supplies_create),
        )
        .route(
            "/api/supplies/{id}",
            put(routes::supplies_update).delete(routes::supplies_delete),
        )
        .route(
            "/api/providers",
            get(routes::providers_index).post(routes::providers_create),
        )
        .route(
            "/api/providers/{id}",
            put(routes::providers_update).delete(routes::providers_delete),
        )
        .route(
            "/api/commitments",
            get(routes::commitments_index).post(routes::commitments_create),
        )
        .route(
            "/api/commitments/{id}",
            put(routes::commitments_update).delete(routes::commitments_delete),
        )
        .route("/api/commitments/{id}/pay", post(routes::commitments_pay))
        .route(
            "/api/wastage",
            get(routes::wastage_index).post(routes::wastage_create),
        )
        .route("/api/wastage/{id}", delete(routes::wastage_delete))
        .route(
            "/api/cash/session",
            get(routes::session_show).post(routes::session_open),
        )
        .route(
            "/api/cash/session/opening",
            put(routes::session_opening_update),
        )
        .route("/api/cash/session/sales", post(routes::sales_create))
        .route("/api/cash/session/incomes", post(routes::incomes_create))
        .route("/api/cash/session/expenses", post(routes::expenses_create))
        .route("/api/cash/close", post(routes::session_close))
        .route("/api/cash/audits", get(routes::audits_index))
        .route(
            "/api/cash/audits/{id}",
            get(routes::audits_show)
                .put(routes::audits_update)
                .delete(routes::audits_delete),
        )
        .route(
            "/api/cash/audits/{id}/report",
            post(routes::audits_regenerate_report),
        )
        .route("/api/stats/monthly", get(routes::monthly_stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let app = Router::new()
        .route("/login", post(routes::login))
        .route("/files/reports/{filename}", get(routes::report_download))
        .route("/files/logos/{filename}", get(routes::logo_download))
        .merge(protected)
        .with_state(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));
    tracing::info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
