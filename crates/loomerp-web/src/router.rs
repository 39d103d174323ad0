//! Axum router: maps all URL paths to handlers.

use std::path::Path;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use loomerp_config::ServerConfig;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::handlers::{
    accounting, attendance, auth, dashboard, departments, equipment, health, incidents, inventory,
    maintenance, production, roles, spare_parts, users,
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let server = state.config.server.clone();
    let shared: SharedState = Arc::new(state);

    let router = Router::new()
        .route("/health", get(health::health))
        .nest("/api", api_routes());

    let router = match &server.static_dir {
        Some(dir) => {
            info!(dir = %dir, "serving static bundle");
            let index = Path::new(dir).join("index.html");
            router.fallback_service(ServeDir::new(dir).not_found_service(ServeFile::new(index)))
        }
        None => router,
    };

    router
        .layer(cors_layer(&server))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/auth/login",    post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/me",       get(auth::me))
        .route("/auth/password", put(auth::change_password))

        // Identity
        .route("/users",      get(users::list_users).post(users::create_user_handler))
        .route("/users/{id}", get(users::get_user).put(users::update_user).delete(users::delete_user))
        .route("/roles",      get(roles::list_roles).post(roles::create_role))
        .route("/roles/{id}", get(roles::get_role).put(roles::update_role).delete(roles::delete_role))
        .route("/departments",      get(departments::list_departments).post(departments::create_department))
        .route("/departments/{id}", get(departments::get_department)
            .put(departments::update_department)
            .delete(departments::delete_department))

        // Plant
        .route("/equipment",             get(equipment::list_equipment).post(equipment::create_equipment))
        .route("/equipment/{id}",        get(equipment::get_equipment)
            .put(equipment::update_equipment)
            .delete(equipment::delete_equipment))
        .route("/equipment/{id}/status", put(equipment::set_equipment_status))
        .route("/maintenance-orders",               get(maintenance::list_orders).post(maintenance::create_order))
        .route("/maintenance-orders/{id}",          get(maintenance::get_order)
            .put(maintenance::update_order)
            .delete(maintenance::delete_order))
        .route("/maintenance-orders/{id}/complete", post(maintenance::complete_order))
        .route("/spare-parts",             get(spare_parts::list_parts).post(spare_parts::create_part))
        .route("/spare-parts/low-stock",   get(spare_parts::low_stock_parts))
        .route("/spare-parts/{id}",        get(spare_parts::get_part)
            .put(spare_parts::update_part)
            .delete(spare_parts::delete_part))
        .route("/spare-parts/{id}/adjust", post(spare_parts::adjust_part))
        .route("/production-lines",             get(production::list_lines).post(production::create_line))
        .route("/production-lines/{id}",        get(production::get_line)
            .put(production::update_line)
            .delete(production::delete_line))
        .route("/production-lines/{id}/output", post(production::record_output))

        // Stock & finance
        .route("/inventory",             get(inventory::list_items).post(inventory::create_item))
        .route("/inventory/low-stock",   get(inventory::low_stock_items))
        .route("/inventory/{id}",        get(inventory::get_item)
            .put(inventory::update_item)
            .delete(inventory::delete_item))
        .route("/inventory/{id}/adjust", post(inventory::adjust_item))
        .route("/accounting",        get(accounting::list_records).post(accounting::create_record))
        .route("/accounting/totals", get(accounting::totals))
        .route("/accounting/{id}",   get(accounting::get_record)
            .put(accounting::update_record)
            .delete(accounting::delete_record))

        // People & safety
        .route("/incidents",              get(incidents::list_incidents).post(incidents::report_incident))
        .route("/incidents/{id}",         get(incidents::get_incident)
            .put(incidents::update_incident)
            .delete(incidents::delete_incident))
        .route("/incidents/{id}/resolve", post(incidents::resolve_incident))
        .route("/attendance",           get(attendance::list_attendance).post(attendance::create_attendance))
        .route("/attendance/me",        get(attendance::my_attendance))
        .route("/attendance/check-in",  post(attendance::check_in))
        .route("/attendance/check-out", post(attendance::check_out))
        .route("/attendance/{id}",      get(attendance::get_attendance)
            .put(attendance::update_attendance)
            .delete(attendance::delete_attendance))

        // Dashboard
        .route("/dashboard/summary",     get(dashboard::summary))
        .route("/dashboard/production",  get(dashboard::production))
        .route("/dashboard/accounting",  get(dashboard::accounting))
        .route("/dashboard/incidents",   get(dashboard::incidents))
        .route("/dashboard/maintenance", get(dashboard::maintenance))
        .route("/dashboard/attendance",  get(dashboard::attendance))
        .route("/dashboard/inventory",   get(dashboard::inventory))
}

/// Permissive when no origins are configured.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    if server.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
