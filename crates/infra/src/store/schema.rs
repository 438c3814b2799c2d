//! Postgres schema for the commercial core.
//!
//! Statements are idempotent (`IF NOT EXISTS`) and applied on startup by
//! [`super::PostgresCommercialStore::migrate`]. Every table is keyed by
//! `tenant_id` first; foreign keys include it so rows can never reference
//! another tenant's records.

pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS price_groups (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    name TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    PRIMARY KEY (tenant_id, id)
);

CREATE TABLE IF NOT EXISTS price_tables (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    group_id UUID NOT NULL,
    name TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    default_discount NUMERIC(5, 2) NOT NULL DEFAULT 0
        CHECK (default_discount >= 0 AND default_discount <= 100),
    client_activity TEXT,
    PRIMARY KEY (tenant_id, id),
    FOREIGN KEY (tenant_id, group_id)
        REFERENCES price_groups (tenant_id, id) ON DELETE RESTRICT
);

CREATE TABLE IF NOT EXISTS price_items (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    table_id UUID NOT NULL,
    product_id UUID NOT NULL,
    unit_price NUMERIC(18, 2) NOT NULL CHECK (unit_price >= 0),
    PRIMARY KEY (tenant_id, id),
    UNIQUE (tenant_id, table_id, product_id),
    FOREIGN KEY (tenant_id, table_id)
        REFERENCES price_tables (tenant_id, id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS products (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    name TEXT NOT NULL,
    list_price NUMERIC(18, 2) NOT NULL DEFAULT 0,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    PRIMARY KEY (tenant_id, id)
);

CREATE TABLE IF NOT EXISTS clients (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    name TEXT NOT NULL,
    price_group_id UUID,
    commercial_area_id UUID,
    PRIMARY KEY (tenant_id, id)
);

CREATE TABLE IF NOT EXISTS salespeople (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (tenant_id, id)
);

CREATE TABLE IF NOT EXISTS order_sequences (
    tenant_id UUID PRIMARY KEY,
    last_number BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    number BIGINT NOT NULL,
    client_id UUID NOT NULL,
    salesperson_id UUID,
    status TEXT NOT NULL,
    valid_until DATE,
    payment_condition_id UUID,
    notes TEXT,
    subtotal NUMERIC(18, 2) NOT NULL,
    total_discount NUMERIC(18, 2) NOT NULL,
    total NUMERIC(18, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (tenant_id, id),
    UNIQUE (tenant_id, number)
);

CREATE TABLE IF NOT EXISTS order_lines (
    tenant_id UUID NOT NULL,
    order_id UUID NOT NULL,
    line_no INTEGER NOT NULL,
    product_id UUID NOT NULL,
    quantity NUMERIC NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(18, 2) NOT NULL CHECK (unit_price >= 0),
    discount NUMERIC(18, 2) NOT NULL CHECK (discount >= 0),
    line_total NUMERIC(18, 2) NOT NULL,
    PRIMARY KEY (tenant_id, order_id, line_no),
    FOREIGN KEY (tenant_id, order_id)
        REFERENCES orders (tenant_id, id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS commercial_areas (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    PRIMARY KEY (tenant_id, id)
);

CREATE TABLE IF NOT EXISTS area_representatives (
    tenant_id UUID NOT NULL,
    id UUID NOT NULL,
    area_id UUID NOT NULL,
    position INTEGER NOT NULL,
    salesperson_id UUID NOT NULL,
    function TEXT NOT NULL,
    commission_profile_id UUID NOT NULL,
    PRIMARY KEY (tenant_id, id),
    UNIQUE (tenant_id, area_id, function),
    FOREIGN KEY (tenant_id, area_id)
        REFERENCES commercial_areas (tenant_id, id) ON DELETE CASCADE
);
"#;
