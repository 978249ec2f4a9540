//! Shared primitive types and well-known column names.

/// A column header as it appears in the uploaded sheet.
pub type ColumnName = String;

/// The canonical session identifier.
pub type SessionId = String;

pub const COL_PRODUCT: &str = "Product";
pub const COL_MARKET:  &str = "Market";
pub const COL_ZONE:    &str = "Zone";
pub const COL_SALES:   &str = "Sales";
pub const COL_PROFIT:  &str = "Profit";
pub const COL_YEAR:    &str = "Year";

/// Columns both the aggregator and the simulator need.
pub const SALES_COLUMNS: [&str; 3] = [COL_PRODUCT, COL_MARKET, COL_SALES];
