// grc-core/src/infrastructure/adapters/duckdb/schema.rs

// Each table keeps the columns it is filtered or ordered on, plus the full entity as JSON in `body`.
// Timestamps are RFC 3339 UTC text (micros), dates are ISO text: both sort lexicographically.
// Only `id` is indexed; updates rewrite every other column. Pair uniqueness is checked by the services.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id VARCHAR PRIMARY KEY,
    email VARCHAR NOT NULL,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS policies (
    id VARCHAR PRIMARY KEY,
    identifier VARCHAR NOT NULL,
    title VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    owner_id VARCHAR,
    created_year INTEGER NOT NULL,
    created_at VARCHAR NOT NULL,
    deleted_at VARCHAR,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS policy_assignments (
    id VARCHAR PRIMARY KEY,
    policy_id VARCHAR NOT NULL,
    user_id VARCHAR NOT NULL,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS policy_approvals (
    id VARCHAR PRIMARY KEY,
    policy_id VARCHAR NOT NULL,
    approver_id VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    sequence_order INTEGER NOT NULL,
    created_at VARCHAR NOT NULL,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS policy_versions (
    id VARCHAR PRIMARY KEY,
    policy_id VARCHAR NOT NULL,
    version_number INTEGER NOT NULL,
    created_at VARCHAR NOT NULL,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS unified_controls (
    id VARCHAR PRIMARY KEY,
    identifier VARCHAR NOT NULL,
    created_at VARCHAR NOT NULL,
    deleted_at VARCHAR,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS control_asset_mappings (
    id VARCHAR PRIMARY KEY,
    control_id VARCHAR NOT NULL,
    mapped_at VARCHAR NOT NULL,
    deleted_at VARCHAR,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS control_objectives (
    id VARCHAR PRIMARY KEY,
    policy_id VARCHAR NOT NULL,
    created_at VARCHAR NOT NULL,
    deleted_at VARCHAR,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS compliance_reports (
    id VARCHAR PRIMARY KEY,
    report_period VARCHAR NOT NULL,
    period_start_date VARCHAR NOT NULL,
    period_end_date VARCHAR NOT NULL,
    overall_compliance_rating VARCHAR NOT NULL,
    is_archived BOOLEAN NOT NULL,
    generated_at VARCHAR NOT NULL,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS report_schedules (
    id VARCHAR PRIMARY KEY,
    is_active BOOLEAN NOT NULL,
    created_at VARCHAR NOT NULL,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id VARCHAR PRIMARY KEY,
    user_id VARCHAR NOT NULL,
    is_read BOOLEAN NOT NULL,
    created_at VARCHAR NOT NULL,
    body VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS reminder_log (
    policy_id VARCHAR NOT NULL,
    reminder_date VARCHAR NOT NULL,
    threshold VARCHAR NOT NULL,
    PRIMARY KEY (policy_id, reminder_date, threshold)
);
"#;
