pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS customers (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name);

CREATE TABLE IF NOT EXISTS expenses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id   INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    expense_type TEXT NOT NULL,
    amount       TEXT NOT NULL,
    description  TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expenses_project ON expenses(project_id);

CREATE TABLE IF NOT EXISTS project_customers (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id      INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    customer_id     INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    cost_percentage TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE(project_id, customer_id),
    CHECK (CAST(cost_percentage AS REAL) > 0 AND CAST(cost_percentage AS REAL) <= 100)
);

CREATE INDEX IF NOT EXISTS idx_pc_project ON project_customers(project_id);
CREATE INDEX IF NOT EXISTS idx_pc_customer ON project_customers(customer_id);

CREATE TRIGGER IF NOT EXISTS trg_pc_total_insert
BEFORE INSERT ON project_customers
BEGIN
    SELECT RAISE(ABORT, 'Allocation exceeds 100%')
    WHERE (SELECT COALESCE(SUM(CAST(cost_percentage AS REAL)), 0)
           FROM project_customers WHERE project_id = NEW.project_id)
          + CAST(NEW.cost_percentage AS REAL) > 100.000000001;
END;

CREATE TRIGGER IF NOT EXISTS trg_pc_total_update
BEFORE UPDATE OF cost_percentage ON project_customers
BEGIN
    SELECT RAISE(ABORT, 'Allocation exceeds 100%')
    WHERE (SELECT COALESCE(SUM(CAST(cost_percentage AS REAL)), 0)
           FROM project_customers WHERE project_id = NEW.project_id AND id != OLD.id)
          + CAST(NEW.cost_percentage AS REAL) > 100.000000001;
END;
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];

/// Customers created on an empty database.
pub(crate) const DEFAULT_CUSTOMERS: &[(&str, &str)] = &[
    ("Acme Corp", "Acme Corporation"),
    ("TechStart Inc", "TechStart Industries"),
    ("Global Solutions", "Global Solutions Ltd"),
];
