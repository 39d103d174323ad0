//! loomerp-web: REST API for LoomERP.
//! Provides:
//!   - JWT login and role-guarded CRUD routes for every ERP entity
//!   - Dashboard aggregations for the SPA charts
//!   - Optional hosting of the built SPA bundle

pub mod auth;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;
