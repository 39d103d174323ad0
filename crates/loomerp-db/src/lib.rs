//! MySQL storage for LoomERP.
//!
//! One table and one repository per entity. Repositories are thin wrappers
//! over a shared [`Database`] pool and return [`DbError`] on failure.

mod types;

pub mod accounting;
pub mod attendance;
pub mod dashboard;
pub mod database;
pub mod departments;
pub mod equipment;
pub mod error;
pub mod incidents;
pub mod inventory;
pub mod maintenance;
pub mod production;
pub mod roles;
pub mod schema;
pub mod spare_parts;
pub mod users;

pub use accounting::AccountingRepository;
pub use attendance::AttendanceRepository;
pub use dashboard::DashboardRepository;
pub use database::Database;
pub use departments::DepartmentRepository;
pub use equipment::EquipmentRepository;
pub use error::{DbError, Result};
pub use incidents::IncidentRepository;
pub use inventory::InventoryRepository;
pub use maintenance::MaintenanceRepository;
pub use production::ProductionLineRepository;
pub use roles::RoleRepository;
pub use spare_parts::SparePartRepository;
pub use types::Page;
pub use users::UserRepository;
