//! Reference rows inserted once and preserved thereafter.

use std::fmt;

use crate::schema::{COMMISSION_CONFIGS, RECYCLING_RATES, TableDef, quote_literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedValue {
    Text(&'static str),
    Numeric(&'static str),
}

impl SeedValue {
    /// The value as the store reports it back, without quoting.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedValue::Text(s) | SeedValue::Numeric(s) => *s,
        }
    }
}

impl fmt::Display for SeedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedValue::Text(s) => f.write_str(&quote_literal(s)),
            SeedValue::Numeric(s) => f.write_str(s),
        }
    }
}

/// A batch of default rows for one table, skipped on conflict with `conflict_key`.
#[derive(Debug)]
pub struct SeedSet {
    pub table: &'static TableDef,
    pub columns: &'static [&'static str],
    pub conflict_key: &'static [&'static str],
    pub rows: &'static [&'static [SeedValue]],
}

impl SeedSet {
    pub fn insert_sql(&self) -> String {
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(ToString::to_string).collect();
                format!("    ({})", values.join(", "))
            })
            .collect();
        format!(
            "INSERT INTO {} ({})\nVALUES\n{}\nON CONFLICT ({}) DO NOTHING",
            self.table.name,
            self.columns.join(", "),
            rows.join(",\n"),
            self.conflict_key.join(", ")
        )
    }
}

use SeedValue::{Numeric, Text};

pub static RECYCLING_RATES_SEED: SeedSet = SeedSet {
    table: &RECYCLING_RATES,
    columns: &["material_type", "rate_per_kg"],
    conflict_key: &["material_type"],
    rows: &[
        &[Text("plastic"), Numeric("10.00")],
        &[Text("aluminum"), Numeric("60.00")],
        &[Text("copper"), Numeric("400.00")],
        &[Text("brass"), Numeric("300.00")],
    ],
};

pub static COMMISSION_CONFIGS_SEED: SeedSet = SeedSet {
    table: &COMMISSION_CONFIGS,
    columns: &["service_type", "commission_type", "percentage", "role"],
    conflict_key: &["service_type", "role"],
    rows: &[
        &[Text("mobile_recharge"), Text("percentage"), Numeric("0.5"), Text("admin")],
        &[Text("mobile_recharge"), Text("percentage"), Numeric("0.5"), Text("branch_manager")],
        &[Text("mobile_recharge"), Text("percentage"), Numeric("1.0"), Text("taluk_manager")],
        &[Text("mobile_recharge"), Text("percentage"), Numeric("3.0"), Text("service_agent")],
        &[Text("mobile_recharge"), Text("percentage"), Numeric("1.0"), Text("user")],
    ],
};

/// Every seed set, in insertion order.
pub static SEEDS: [&SeedSet; 2] = [&RECYCLING_RATES_SEED, &COMMISSION_CONFIGS_SEED];
