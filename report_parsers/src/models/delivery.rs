use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Product;

/// Delivery notice report variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    Daily,
    Monthly,
    /// Year-to-date; recognized but never parsed.
    #[serde(rename = "YTD")]
    Ytd,
}

impl ReportType {
    /// Value stored in the `report_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Daily => "Daily",
            ReportType::Monthly => "Monthly",
            ReportType::Ytd => "YTD",
        }
    }

    /// Hint carried by the download stage's file name
    /// (`metal_delivery_daily`, `metal_delivery_monthly`, `metal_delivery_ytd`).
    pub fn from_file_name(name: &str) -> Option<ReportType> {
        let lower = name.to_lowercase();
        if lower.contains("daily") {
            Some(ReportType::Daily)
        } else if lower.contains("monthly") {
            Some(ReportType::Monthly)
        } else if lower.contains("ytd") || lower.contains("year") {
            Some(ReportType::Ytd)
        } else {
            None
        }
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(ReportType::Daily),
            "monthly" => Ok(ReportType::Monthly),
            "ytd" => Ok(ReportType::Ytd),
            other => Err(format!("unknown report type: {other}")),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issued/stopped figures for one contract on one intent date.
///
/// Natural key: (`intent_date`, `product`, `contract_month`, `report_type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub intent_date: NaiveDate,
    pub product: Product,
    /// Month and year label, e.g. "JANUARY 2026".
    pub contract_month: String,
    /// Current period figure (the TOTAL row).
    pub daily_total: u64,
    /// Running total for the reporting period (the MONTH TO DATE row).
    pub cumulative: u64,
    pub report_type: ReportType,
    /// File the record came from.
    pub source_file: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_type_from_file_name() {
        assert_eq!(
            ReportType::from_file_name("20260112_metal_delivery_daily_MetalsIssuesAndStopsReport.pdf"),
            Some(ReportType::Daily)
        );
        assert_eq!(
            ReportType::from_file_name("20260112_metal_delivery_monthly_MetalsIssuesAndStopsMTDReport.pdf"),
            Some(ReportType::Monthly)
        );
        assert_eq!(
            ReportType::from_file_name("20260112_metal_delivery_ytd_MetalsIssuesAndStopsYTDReport.pdf"),
            Some(ReportType::Ytd)
        );
        assert_eq!(ReportType::from_file_name("notice.pdf"), None);
    }

    #[test]
    fn stored_names_parse_back() {
        for rt in [ReportType::Daily, ReportType::Monthly, ReportType::Ytd] {
            assert_eq!(rt.as_str().parse::<ReportType>().unwrap(), rt);
        }
    }
}
