//! Static bond reference data.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Asset class excluded from the most traded and most quoted rankings.
pub const ASSET_BACKED_SECURITY: &str = "asset-backed security";

/// Descriptive record for one ISIN from the `bonds` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BondRecord {
    pub isin: String,
    pub ticker: Option<String>,
    pub issuer: Option<String>,
    pub coupon: Option<Decimal>,
    pub maturity_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub issuer_type: Option<String>,
    pub asset_class: Option<String>,
    pub country: Option<String>,
    pub tp_sector: Option<String>,
}

impl BondRecord {
    #[must_use]
    pub fn is_asset_backed(&self) -> bool {
        self.asset_class.as_deref() == Some(ASSET_BACKED_SECURITY)
    }
}
