//! Canonical column names and domain sentinels used across the pipeline.
//! Downstream stages rely on these exact header strings after reconciliation.

// Canonical price-sheet columns
pub const COL_SKU: &str = "Sku";
pub const COL_PRODUCT: &str = "Product";
pub const COL_PRICE: &str = "Price";
pub const COL_RANK: &str = "Rank";
pub const COL_COMP_PRICE: &str = "Comp_1_Price";
pub const COL_COMP_NAME: &str = "Comp_1_Name";
pub const COL_CATEGORY: &str = "Category";
pub const COL_DATE: &str = "Date";
pub const COL_EXECUTION_DATE: &str = "Execution_Date";

// Canonical revenue-sheet columns
pub const COL_REVENUE: &str = "Revenue";
pub const COL_UNITS: &str = "Units_Sold";

// Derived column in the output views
pub const COL_PRICE_INDEX: &str = "Price_Index";

// Sheet names inside a workbook directory
pub const PRICES_SHEET: &str = "prices";
pub const REVENUE_SHEET: &str = "revenue";

/// Rank recorded when no valid rank could be determined; sorts as worst-case.
pub const RANK_SENTINEL: u32 = 99;

/// Price index reported when the competitor price is zero (no comparison available).
pub const PRICE_INDEX_NEUTRAL: f64 = 100.0;

/// Category assigned to rows whose source carries none.
pub const DEFAULT_CATEGORY: &str = "General";

/// Competitor name placeholder for rows without a competitor offer.
pub const NO_COMPETITOR: &str = "-";

// Offers flattening
pub const MAX_COMPETITORS: usize = 10;
pub const FEED_PRODUCT_LIMIT: usize = 500;

// Model sampling
pub const CLUSTER_SAMPLE_SIZE: usize = 15;
