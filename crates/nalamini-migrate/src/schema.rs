//! Typed definitions of the platform's tables.
//!
//! Each table is a `static` [`TableDef`]; [`TABLES`] lists them in creation
//! order. A column's `references` names the table it logically points at.
//! References are recorded for ordering and documentation only and are never
//! rendered as foreign-key constraints.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Serial,
    Integer,
    Text,
    Boolean,
    Timestamptz,
    Numeric { precision: u8, scale: u8 },
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Serial => f.write_str("SERIAL"),
            SqlType::Integer => f.write_str("INTEGER"),
            SqlType::Text => f.write_str("TEXT"),
            SqlType::Boolean => f.write_str("BOOLEAN"),
            SqlType::Timestamptz => f.write_str("TIMESTAMPTZ"),
            SqlType::Numeric { precision, scale } => write!(f, "NUMERIC({precision}, {scale})"),
        }
    }
}

/// Monetary amounts.
const MONEY: SqlType = SqlType::Numeric {
    precision: 10,
    scale: 2,
};

/// Percentages.
const PERCENT: SqlType = SqlType::Numeric {
    precision: 5,
    scale: 2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    CurrentTimestamp,
    /// A string literal, rendered quoted.
    Text(&'static str),
    /// A numeric or boolean literal, rendered as-is.
    Literal(&'static str),
}

impl fmt::Display for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDefault::CurrentTimestamp => f.write_str("CURRENT_TIMESTAMP"),
            ColumnDefault::Text(s) => f.write_str(&quote_literal(s)),
            ColumnDefault::Literal(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
    pub references: Option<&'static str>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            primary_key: false,
            not_null: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    /// Auto-incrementing primary key.
    pub const fn id() -> Self {
        Self {
            primary_key: true,
            ..Self::new("id", SqlType::Serial)
        }
    }

    /// Row creation timestamp, defaulting to the insert time.
    pub const fn created_at() -> Self {
        Self::new("created_at", SqlType::Timestamptz).with_default(ColumnDefault::CurrentTimestamp)
    }

    pub const fn updated_at() -> Self {
        Self::new("updated_at", SqlType::Timestamptz).with_default(ColumnDefault::CurrentTimestamp)
    }

    pub const fn not_null(self) -> Self {
        Self {
            not_null: true,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    pub const fn with_default(self, default: ColumnDefault) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn references(self, table: &'static str) -> Self {
        Self {
            references: Some(table),
            ..self
        }
    }

    /// Column definition as it appears inside `CREATE TABLE`.
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(default) = &self.default {
            def.push_str(&format!(" DEFAULT {default}"));
        }
        def
    }
}

/// A uniqueness key created as its own index, after the table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl UniqueKey {
    pub fn create_sql(&self, table: &str) -> String {
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            self.name,
            table,
            self.columns.join(", ")
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    pub unique_keys: &'static [UniqueKey],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Tables this one logically points at, excluding itself.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .filter_map(|c| c.references)
            .filter(move |t| *t != self.name)
    }

    /// Sets of columns that must be unique: single-column `UNIQUE`s plus the
    /// separately created keys.
    pub fn uniqueness_sets(&self) -> Vec<Vec<&'static str>> {
        let mut sets: Vec<Vec<&'static str>> = self
            .columns
            .iter()
            .filter(|c| c.unique || c.primary_key)
            .map(|c| vec![c.name])
            .collect();
        sets.extend(self.unique_keys.iter().map(|k| k.columns.to_vec()));
        sets
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.definition()))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.name,
            columns.join(",\n")
        )
    }
}

/// Quote a string as a SQL literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ── Tables ─────────────────────────────────────────────────────

pub static USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("username", SqlType::Text).not_null().unique(),
        ColumnDef::new("email", SqlType::Text),
        ColumnDef::new("password", SqlType::Text).not_null(),
        ColumnDef::new("role", SqlType::Text).with_default(ColumnDefault::Text("user")),
        ColumnDef::created_at(),
        ColumnDef::new("wallet_balance", MONEY).with_default(ColumnDefault::Literal("0.00")),
        ColumnDef::new("full_name", SqlType::Text),
        ColumnDef::new("phone", SqlType::Text),
        ColumnDef::new("pincode", SqlType::Text),
        ColumnDef::new("district", SqlType::Text),
        ColumnDef::new("state", SqlType::Text).with_default(ColumnDefault::Text("Tamil Nadu")),
        ColumnDef::new("taluk", SqlType::Text),
        ColumnDef::new("address", SqlType::Text),
        ColumnDef::new("referrer_id", SqlType::Integer).references("users"),
        ColumnDef::new("commission_percentage", PERCENT)
            .with_default(ColumnDefault::Literal("1.00")),
        ColumnDef::new("profile_image_url", SqlType::Text),
        ColumnDef::new("stripe_customer_id", SqlType::Text),
        ColumnDef::new("stripe_subscription_id", SqlType::Text),
    ],
    unique_keys: &[],
};

/// Append-only wallet ledger.
pub static WALLET_TRANSACTIONS: TableDef = TableDef {
    name: "wallet_transactions",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", SqlType::Integer).not_null().references("users"),
        ColumnDef::new("amount", MONEY).not_null(),
        ColumnDef::new("description", SqlType::Text),
        ColumnDef::new("transaction_type", SqlType::Text).not_null(),
        ColumnDef::new("transaction_id", SqlType::Text),
        ColumnDef::created_at(),
        ColumnDef::new("reference_id", SqlType::Integer),
        ColumnDef::new("service_type", SqlType::Text),
    ],
    unique_keys: &[],
};

/// Agent-to-territory assignment.
pub static SERVICE_AGENTS: TableDef = TableDef {
    name: "service_agents",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", SqlType::Integer).not_null().references("users"),
        ColumnDef::new("pincode", SqlType::Text).not_null(),
        ColumnDef::new("district", SqlType::Text).not_null(),
        ColumnDef::new("taluk", SqlType::Text).not_null(),
    ],
    unique_keys: &[],
};

/// Status moves pending -> completed | failed.
pub static RECHARGES: TableDef = TableDef {
    name: "recharges",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", SqlType::Integer).not_null().references("users"),
        ColumnDef::new("phone_number", SqlType::Text).not_null(),
        ColumnDef::new("amount", MONEY).not_null(),
        ColumnDef::new("provider", SqlType::Text).not_null(),
        ColumnDef::new("status", SqlType::Text).with_default(ColumnDefault::Text("pending")),
        ColumnDef::created_at(),
        ColumnDef::new("reference_id", SqlType::Text),
        ColumnDef::new("service_type", SqlType::Text).with_default(ColumnDefault::Text("mobile")),
    ],
    unique_keys: &[],
};

/// Status moves new -> assigned -> completed.
pub static RECYCLING_REQUESTS: TableDef = TableDef {
    name: "recycling_requests",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", SqlType::Integer).not_null().references("users"),
        ColumnDef::new("material_type", SqlType::Text).not_null(),
        ColumnDef::new("quantity", MONEY).not_null(),
        ColumnDef::new("status", SqlType::Text).with_default(ColumnDefault::Text("new")),
        ColumnDef::created_at(),
        ColumnDef::new("assigned_to", SqlType::Integer).references("users"),
        ColumnDef::new("address", SqlType::Text),
        ColumnDef::new("pincode", SqlType::Text),
        ColumnDef::new("scheduled_date", SqlType::Text),
        ColumnDef::new("completed_date", SqlType::Timestamptz),
        ColumnDef::new("payment_amount", MONEY),
        ColumnDef::new("description", SqlType::Text),
        ColumnDef::new("request_number", SqlType::Text),
    ],
    unique_keys: &[],
};

pub static RECYCLING_RATES: TableDef = TableDef {
    name: "recycling_rates",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("material_type", SqlType::Text).not_null(),
        ColumnDef::new("rate_per_kg", MONEY).not_null(),
        ColumnDef::updated_at(),
    ],
    unique_keys: &[UniqueKey {
        name: "recycling_rates_material_type_key",
        columns: &["material_type"],
    }],
};

/// One row per (service_type, role).
pub static COMMISSION_CONFIGS: TableDef = TableDef {
    name: "commission_configs",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("service_type", SqlType::Text).not_null(),
        ColumnDef::new("commission_type", SqlType::Text).not_null(),
        ColumnDef::new("percentage", PERCENT).not_null(),
        ColumnDef::new("role", SqlType::Text).not_null(),
        ColumnDef::created_at(),
        ColumnDef::updated_at(),
    ],
    unique_keys: &[UniqueKey {
        name: "commission_configs_service_type_role_key",
        columns: &["service_type", "role"],
    }],
};

pub static COMMISSION_TRANSACTIONS: TableDef = TableDef {
    name: "commission_transactions",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("user_id", SqlType::Integer).not_null().references("users"),
        ColumnDef::new("amount", MONEY).not_null(),
        ColumnDef::new("service_type", SqlType::Text).not_null(),
        ColumnDef::new("reference_id", SqlType::Integer).not_null(),
        ColumnDef::created_at(),
        ColumnDef::new("status", SqlType::Text).with_default(ColumnDefault::Text("pending")),
    ],
    unique_keys: &[],
};

pub static CHAT_MESSAGES: TableDef = TableDef {
    name: "chat_messages",
    columns: &[
        ColumnDef::id(),
        ColumnDef::new("sender_id", SqlType::Integer).not_null().references("users"),
        ColumnDef::new("receiver_id", SqlType::Integer).not_null().references("users"),
        ColumnDef::new("message", SqlType::Text).not_null(),
        ColumnDef::created_at(),
        ColumnDef::new("read", SqlType::Boolean).with_default(ColumnDefault::Literal("FALSE")),
    ],
    unique_keys: &[],
};

/// Every table, in creation order.
pub static TABLES: [&TableDef; 9] = [
    &USERS,
    &WALLET_TRANSACTIONS,
    &SERVICE_AGENTS,
    &RECHARGES,
    &RECYCLING_REQUESTS,
    &RECYCLING_RATES,
    &COMMISSION_CONFIGS,
    &COMMISSION_TRANSACTIONS,
    &CHAT_MESSAGES,
];

pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().copied().find(|t| t.name == name)
}
