//! Shared application state for the web server.

use std::sync::Arc;

use loomerp_config::{AuthConfig, Config};
use loomerp_db::{
    AccountingRepository, AttendanceRepository, DashboardRepository, Database,
    DepartmentRepository, EquipmentRepository, IncidentRepository, InventoryRepository,
    MaintenanceRepository, ProductionLineRepository, RoleRepository, SparePartRepository,
    UserRepository,
};

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config: Arc::new(config) }
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.config.auth
    }

    pub fn users(&self) -> UserRepository { UserRepository::new(self.db.clone()) }
    pub fn roles(&self) -> RoleRepository { RoleRepository::new(self.db.clone()) }
    pub fn departments(&self) -> DepartmentRepository { DepartmentRepository::new(self.db.clone()) }
    pub fn equipment(&self) -> EquipmentRepository { EquipmentRepository::new(self.db.clone()) }
    pub fn maintenance(&self) -> MaintenanceRepository { MaintenanceRepository::new(self.db.clone()) }
    pub fn spare_parts(&self) -> SparePartRepository { SparePartRepository::new(self.db.clone()) }
    pub fn production(&self) -> ProductionLineRepository { ProductionLineRepository::new(self.db.clone()) }
    pub fn inventory(&self) -> InventoryRepository { InventoryRepository::new(self.db.clone()) }
    pub fn accounting(&self) -> AccountingRepository { AccountingRepository::new(self.db.clone()) }
    pub fn incidents(&self) -> IncidentRepository { IncidentRepository::new(self.db.clone()) }
    pub fn attendance(&self) -> AttendanceRepository { AttendanceRepository::new(self.db.clone()) }
    pub fn dashboard(&self) -> DashboardRepository { DashboardRepository::new(self.db.clone()) }
}

pub type SharedState = Arc<AppState>;
