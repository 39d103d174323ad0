//! Table definitions for the MySQL store.
//!
//! Every statement is idempotent so `Database::initialize` can run on each
//! start. Statements are ordered so referenced tables exist first.

pub const TABLE_ROLES: &str = "roles";
pub const TABLE_DEPARTMENTS: &str = "departments";
pub const TABLE_USERS: &str = "users";
pub const TABLE_PRODUCTION_LINES: &str = "production_lines";
pub const TABLE_EQUIPMENT: &str = "equipment";
pub const TABLE_MAINTENANCE_ORDERS: &str = "maintenance_orders";
pub const TABLE_SPARE_PARTS: &str = "spare_parts";
pub const TABLE_INVENTORY: &str = "inventory_items";
pub const TABLE_ACCOUNTING: &str = "accounting_records";
pub const TABLE_INCIDENTS: &str = "incidents";
pub const TABLE_ATTENDANCE: &str = "attendance";

// =============================================================================
// Identity
// =============================================================================

const CREATE_ROLES: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    id          BIGINT AUTO_INCREMENT PRIMARY KEY,
    name        VARCHAR(64)  NOT NULL,
    description VARCHAR(255) NULL,
    created_at  TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE KEY uq_roles_name (name)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

// manager_id is a plain column: users reference departments, so a foreign key
// back to users would make the two tables mutually dependent.
const CREATE_DEPARTMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS departments (
    id          BIGINT AUTO_INCREMENT PRIMARY KEY,
    name        VARCHAR(128) NOT NULL,
    code        VARCHAR(32)  NOT NULL,
    description TEXT         NULL,
    manager_id  BIGINT       NULL,
    created_at  TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at  TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_departments_code (code),
    KEY ix_departments_manager (manager_id)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGINT AUTO_INCREMENT PRIMARY KEY,
    username      VARCHAR(64)  NOT NULL,
    email         VARCHAR(255) NOT NULL,
    full_name     VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    role_id       BIGINT       NOT NULL,
    department_id BIGINT       NULL,
    active        TINYINT(1)   NOT NULL DEFAULT 1,
    created_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_users_username (username),
    UNIQUE KEY uq_users_email (email),
    CONSTRAINT fk_users_role FOREIGN KEY (role_id) REFERENCES roles (id),
    CONSTRAINT fk_users_department FOREIGN KEY (department_id) REFERENCES departments (id)
        ON DELETE SET NULL
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

// =============================================================================
// Plant
// =============================================================================

const CREATE_PRODUCTION_LINES: &str = r#"
CREATE TABLE IF NOT EXISTS production_lines (
    id              BIGINT AUTO_INCREMENT PRIMARY KEY,
    name            VARCHAR(128) NOT NULL,
    department_id   BIGINT       NULL,
    product         VARCHAR(128) NULL,
    target_output   DOUBLE       NOT NULL DEFAULT 0,
    produced_output DOUBLE       NOT NULL DEFAULT 0,
    efficiency      DOUBLE GENERATED ALWAYS AS (
        CASE WHEN target_output > 0
             THEN ROUND(produced_output / target_output * 100, 2)
             ELSE 0 END
    ) STORED,
    status          VARCHAR(32)  NOT NULL DEFAULT 'idle',
    supervisor_id   BIGINT       NULL,
    created_at      TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at      TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_production_lines_name (name),
    CONSTRAINT fk_lines_department FOREIGN KEY (department_id) REFERENCES departments (id)
        ON DELETE SET NULL,
    CONSTRAINT fk_lines_supervisor FOREIGN KEY (supervisor_id) REFERENCES users (id)
        ON DELETE SET NULL
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const CREATE_EQUIPMENT: &str = r#"
CREATE TABLE IF NOT EXISTS equipment (
    id                    BIGINT AUTO_INCREMENT PRIMARY KEY,
    name                  VARCHAR(128) NOT NULL,
    code                  VARCHAR(64)  NOT NULL,
    model                 VARCHAR(128) NULL,
    manufacturer          VARCHAR(128) NULL,
    department_id         BIGINT       NULL,
    production_line_id    BIGINT       NULL,
    status                VARCHAR(32)  NOT NULL DEFAULT 'operational',
    purchase_date         DATE         NULL,
    last_maintenance_date DATE         NULL,
    created_at            TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at            TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_equipment_code (code),
    CONSTRAINT fk_equipment_department FOREIGN KEY (department_id) REFERENCES departments (id)
        ON DELETE SET NULL,
    CONSTRAINT fk_equipment_line FOREIGN KEY (production_line_id) REFERENCES production_lines (id)
        ON DELETE SET NULL
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const CREATE_MAINTENANCE_ORDERS: &str = r#"
CREATE TABLE IF NOT EXISTS maintenance_orders (
    id             BIGINT AUTO_INCREMENT PRIMARY KEY,
    equipment_id   BIGINT       NOT NULL,
    order_type     VARCHAR(32)  NOT NULL,
    priority       VARCHAR(16)  NOT NULL DEFAULT 'medium',
    status         VARCHAR(32)  NOT NULL DEFAULT 'open',
    description    TEXT         NOT NULL,
    scheduled_date DATE         NULL,
    assigned_to    BIGINT       NULL,
    cost           DOUBLE       NOT NULL DEFAULT 0,
    completed_at   DATETIME     NULL,
    created_at     TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at     TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    KEY ix_maintenance_status (status),
    CONSTRAINT fk_maintenance_equipment FOREIGN KEY (equipment_id) REFERENCES equipment (id)
        ON DELETE CASCADE,
    CONSTRAINT fk_maintenance_assignee FOREIGN KEY (assigned_to) REFERENCES users (id)
        ON DELETE SET NULL
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const CREATE_SPARE_PARTS: &str = r#"
CREATE TABLE IF NOT EXISTS spare_parts (
    id           BIGINT AUTO_INCREMENT PRIMARY KEY,
    name         VARCHAR(128) NOT NULL,
    part_number  VARCHAR(64)  NOT NULL,
    quantity     INT          NOT NULL DEFAULT 0,
    min_quantity INT          NOT NULL DEFAULT 0,
    unit_cost    DOUBLE       NOT NULL DEFAULT 0,
    equipment_id BIGINT       NULL,
    location     VARCHAR(128) NULL,
    created_at   TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at   TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_spare_parts_number (part_number),
    CONSTRAINT ck_spare_parts_quantity CHECK (quantity >= 0),
    CONSTRAINT fk_spare_parts_equipment FOREIGN KEY (equipment_id) REFERENCES equipment (id)
        ON DELETE SET NULL
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

// =============================================================================
// Stock & finance
// =============================================================================

const CREATE_INVENTORY: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_items (
    id            BIGINT AUTO_INCREMENT PRIMARY KEY,
    sku           VARCHAR(64)  NOT NULL,
    name          VARCHAR(128) NOT NULL,
    category      VARCHAR(32)  NOT NULL,
    unit          VARCHAR(16)  NOT NULL DEFAULT 'kg',
    quantity      DOUBLE       NOT NULL DEFAULT 0,
    unit_cost     DOUBLE       NOT NULL DEFAULT 0,
    reorder_level DOUBLE       NOT NULL DEFAULT 0,
    total_value   DOUBLE GENERATED ALWAYS AS (ROUND(quantity * unit_cost, 2)) STORED,
    warehouse     VARCHAR(128) NULL,
    created_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_inventory_sku (sku),
    KEY ix_inventory_category (category),
    CONSTRAINT ck_inventory_quantity CHECK (quantity >= 0)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const CREATE_ACCOUNTING: &str = r#"
CREATE TABLE IF NOT EXISTS accounting_records (
    id            BIGINT AUTO_INCREMENT PRIMARY KEY,
    entry_date    DATE         NOT NULL,
    kind          VARCHAR(16)  NOT NULL,
    category      VARCHAR(64)  NOT NULL,
    amount        DOUBLE       NOT NULL,
    description   TEXT         NULL,
    reference     VARCHAR(128) NULL,
    department_id BIGINT       NULL,
    created_by    BIGINT       NULL,
    created_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    KEY ix_accounting_date (entry_date),
    CONSTRAINT ck_accounting_amount CHECK (amount > 0),
    CONSTRAINT fk_accounting_department FOREIGN KEY (department_id) REFERENCES departments (id)
        ON DELETE SET NULL,
    CONSTRAINT fk_accounting_creator FOREIGN KEY (created_by) REFERENCES users (id)
        ON DELETE SET NULL
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

// =============================================================================
// People & safety
// =============================================================================

const CREATE_INCIDENTS: &str = r#"
CREATE TABLE IF NOT EXISTS incidents (
    id            BIGINT AUTO_INCREMENT PRIMARY KEY,
    title         VARCHAR(255) NOT NULL,
    description   TEXT         NULL,
    severity      VARCHAR(16)  NOT NULL DEFAULT 'low',
    status        VARCHAR(32)  NOT NULL DEFAULT 'open',
    reported_by   BIGINT       NULL,
    department_id BIGINT       NULL,
    equipment_id  BIGINT       NULL,
    occurred_at   DATETIME     NOT NULL,
    resolution    TEXT         NULL,
    resolved_at   DATETIME     NULL,
    created_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    KEY ix_incidents_status (status),
    CONSTRAINT fk_incidents_reporter FOREIGN KEY (reported_by) REFERENCES users (id)
        ON DELETE SET NULL,
    CONSTRAINT fk_incidents_department FOREIGN KEY (department_id) REFERENCES departments (id)
        ON DELETE SET NULL,
    CONSTRAINT fk_incidents_equipment FOREIGN KEY (equipment_id) REFERENCES equipment (id)
        ON DELETE SET NULL
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const CREATE_ATTENDANCE: &str = r#"
CREATE TABLE IF NOT EXISTS attendance (
    id           BIGINT AUTO_INCREMENT PRIMARY KEY,
    user_id      BIGINT      NOT NULL,
    work_date    DATE        NOT NULL,
    check_in     DATETIME    NULL,
    check_out    DATETIME    NULL,
    status       VARCHAR(16) NOT NULL DEFAULT 'present',
    hours_worked DOUBLE GENERATED ALWAYS AS (
        CASE WHEN check_in IS NOT NULL AND check_out IS NOT NULL AND check_out >= check_in
             THEN ROUND(TIMESTAMPDIFF(MINUTE, check_in, check_out) / 60, 2)
             ELSE NULL END
    ) STORED,
    notes        VARCHAR(255) NULL,
    created_at   TIMESTAMP   NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at   TIMESTAMP   NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_attendance_user_day (user_id, work_date),
    CONSTRAINT fk_attendance_user FOREIGN KEY (user_id) REFERENCES users (id)
        ON DELETE CASCADE
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

/// DDL in creation order.
pub const CREATE_STATEMENTS: &[(&str, &str)] = &[
    (TABLE_ROLES, CREATE_ROLES),
    (TABLE_DEPARTMENTS, CREATE_DEPARTMENTS),
    (TABLE_USERS, CREATE_USERS),
    (TABLE_PRODUCTION_LINES, CREATE_PRODUCTION_LINES),
    (TABLE_EQUIPMENT, CREATE_EQUIPMENT),
    (TABLE_MAINTENANCE_ORDERS, CREATE_MAINTENANCE_ORDERS),
    (TABLE_SPARE_PARTS, CREATE_SPARE_PARTS),
    (TABLE_INVENTORY, CREATE_INVENTORY),
    (TABLE_ACCOUNTING, CREATE_ACCOUNTING),
    (TABLE_INCIDENTS, CREATE_INCIDENTS),
    (TABLE_ATTENDANCE, CREATE_ATTENDANCE),
];
