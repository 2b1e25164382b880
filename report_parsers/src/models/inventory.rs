use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Product;

/// Largest gap tolerated between `total` and `registered + eligible`.
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// One depository's inventory on one business date.
///
/// Natural key: (`activity_date`, `product`, `depository`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Business date the snapshot pertains to (not the publication date).
    pub activity_date: NaiveDate,
    /// Commodity, determined by the file identity.
    pub product: Product,
    /// Warehouse / depository name as printed.
    pub depository: String,
    /// Registered (warranted) quantity.
    pub registered: Option<f64>,
    /// Eligible (non-warranted) quantity.
    pub eligible: Option<f64>,
    /// Total quantity on hand.
    pub total: Option<f64>,
    /// Unit of measure, e.g. "Troy Ounces".
    pub unit: String,
    /// Date the report was published, when printed.
    pub report_date: Option<NaiveDate>,
}

impl InventoryRecord {
    /// Difference `total - (registered + eligible)` when all three are present.
    pub fn imbalance(&self) -> Option<f64> {
        match (self.registered, self.eligible, self.total) {
            (Some(r), Some(e), Some(t)) => Some(t - (r + e)),
            _ => None,
        }
    }

    /// `false` only when all three quantities are present and disagree.
    pub fn is_balanced(&self) -> bool {
        self.imbalance()
            .is_none_or(|gap| gap.abs() <= BALANCE_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(r: Option<f64>, e: Option<f64>, t: Option<f64>) -> InventoryRecord {
        InventoryRecord {
            activity_date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            product: Product::Gold,
            depository: "BRINKS".into(),
            registered: r,
            eligible: e,
            total: t,
            unit: "Troy Ounces".into(),
            report_date: None,
        }
    }

    #[test]
    fn balance_check_needs_all_three() {
        assert!(record(Some(10_500.25), Some(2_000.0), Some(12_500.25)).is_balanced());
        assert!(!record(Some(1.0), Some(1.0), Some(3.0)).is_balanced());
        assert!(record(Some(1.0), None, Some(3.0)).is_balanced());
        assert_eq!(record(None, Some(1.0), Some(1.0)).imbalance(), None);
    }
}
