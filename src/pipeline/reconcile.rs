//! Column reconciliation: the compatibility boundary between whatever headers
//! a sheet export produced and the canonical schema the rest of the pipeline
//! assumes.
//!
//! Sources have shipped several header generations (legacy Italian names,
//! per-export renames, stray whitespace). Reconciliation maps known aliases
//! onto canonical names and synthesizes still-missing columns with
//! type-appropriate defaults so a schema drift never takes down a run.

use std::collections::BTreeMap;

use crate::constants::{
    COL_CATEGORY, COL_COMP_NAME, COL_COMP_PRICE, COL_DATE, COL_EXECUTION_DATE, COL_PRICE,
    COL_PRODUCT, COL_RANK, COL_REVENUE, COL_SKU, COL_UNITS, DEFAULT_CATEGORY, NO_COMPETITOR,
};
use crate::observability::metrics;
use crate::table::RawTable;

/// Bumped whenever a header generation is added to the built-in alias table.
pub const ALIAS_MAP_VERSION: u32 = 3;

/// Alias -> canonical header pairs, exact match after whitespace trimming.
/// Order is priority: when two aliases for the same canonical name are both
/// present, the earlier one wins.
static BUILTIN_ALIASES: &[(&str, &str)] = &[
    // Identifier generations
    ("Codice", COL_SKU),
    ("id", COL_SKU),
    // Legacy Italian price sheet headers
    ("Prodotto", COL_PRODUCT),
    ("Prezzo", COL_PRICE),
    ("Posizione", COL_RANK),
    ("Comp_1_Prezzo", COL_COMP_PRICE),
    ("Comp_1_Nome", COL_COMP_NAME),
    ("Categoria", COL_CATEGORY),
    ("Data", COL_DATE),
    ("Data_esecuzione", COL_EXECUTION_DATE),
    ("Data_Esecuzione", COL_EXECUTION_DATE),
    // Legacy revenue sheet headers
    ("Entrate", COL_REVENUE),
    ("Vendite", COL_UNITS),
];

/// The alias table reconciliation runs with: the built-ins, optionally
/// extended from configuration when an export ships a header nobody has
/// seen before.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    version: u32,
    aliases: Vec<(String, String)>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap {
            version: ALIAS_MAP_VERSION,
            aliases: BUILTIN_ALIASES
                .iter()
                .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
                .collect(),
        }
    }
}

impl ColumnMap {
    /// Built-ins extended with configured overrides. Overrides are consulted
    /// before the built-ins; among themselves they apply in alphabetical
    /// order of the alias.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut aliases: Vec<(String, String)> = overrides
            .iter()
            .map(|(alias, canonical)| (alias.clone(), canonical.clone()))
            .collect();
        aliases.extend(
            BUILTIN_ALIASES
                .iter()
                .map(|(alias, canonical)| (alias.to_string(), canonical.to_string())),
        );
        ColumnMap {
            version: ALIAS_MAP_VERSION,
            aliases,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
    }
}

/// Which canonical schema a table is being reconciled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSchema {
    Prices,
    Revenue,
}

struct ColumnSpec {
    canonical: &'static str,
    default: &'static str,
    /// Required columns still get defaulted, but their absence is a
    /// diagnostic rather than routine synthesis.
    required: bool,
}

impl SheetSchema {
    fn columns(&self) -> &'static [ColumnSpec] {
        // Date columns are deliberately absent here: their fallback chain
        // belongs to normalization, which must distinguish "column missing"
        // from "cell unparseable".
        match self {
            SheetSchema::Prices => &[
                ColumnSpec { canonical: COL_SKU, default: "", required: true },
                ColumnSpec { canonical: COL_PRODUCT, default: "", required: false },
                ColumnSpec { canonical: COL_PRICE, default: "0", required: true },
                ColumnSpec { canonical: COL_RANK, default: "99", required: false },
                ColumnSpec { canonical: COL_COMP_PRICE, default: "0", required: false },
                ColumnSpec { canonical: COL_COMP_NAME, default: NO_COMPETITOR, required: false },
                ColumnSpec { canonical: COL_CATEGORY, default: DEFAULT_CATEGORY, required: false },
            ],
            SheetSchema::Revenue => &[
                ColumnSpec { canonical: COL_SKU, default: "", required: true },
                ColumnSpec { canonical: COL_REVENUE, default: "0", required: true },
                ColumnSpec { canonical: COL_UNITS, default: "0", required: false },
            ],
        }
    }
}

/// What reconciliation did to one table. The quality pass turns this into
/// severity-ranked issues for the run report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaReport {
    pub renamed: Vec<(String, String)>,
    pub synthesized: Vec<String>,
    /// Required columns that were unrecoverable and had to be defaulted.
    pub missing_required: Vec<String>,
}

/// Reconcile a table's headers in place against the given schema.
///
/// A table with no columns at all is an absent sheet, not schema drift: the
/// canonical columns are still synthesized so downstream stages see one
/// shape, but nothing is reported.
pub fn reconcile(table: &mut RawTable, schema: SheetSchema, map: &ColumnMap) -> SchemaReport {
    metrics::reconcile::table_processed();
    let mut report = SchemaReport::default();
    let had_headers = !table.headers().is_empty();

    // Stray header whitespace precedes everything so padded aliases still match.
    trim_headers(table);

    for (alias, canonical) in map.pairs() {
        if table.has_column(canonical) {
            continue;
        }
        if table.rename_column(alias, canonical) {
            metrics::reconcile::alias_applied(canonical);
            report.renamed.push((alias.to_string(), canonical.to_string()));
        }
    }

    for spec in schema.columns() {
        if table.has_column(spec.canonical) {
            continue;
        }
        table.add_column(spec.canonical, spec.default);
        if had_headers {
            metrics::reconcile::column_synthesized(spec.canonical);
            report.synthesized.push(spec.canonical.to_string());
            if spec.required {
                report.missing_required.push(spec.canonical.to_string());
            }
        }
    }

    report
}

fn trim_headers(table: &mut RawTable) {
    let trimmed: Vec<(String, String)> = table
        .headers()
        .iter()
        .filter(|h| h.trim() != h.as_str())
        .map(|h| (h.clone(), h.trim().to_string()))
        .collect();
    for (from, to) in trimmed {
        table.rename_column(&from, &to);
    }
}
