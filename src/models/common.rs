use chrono::NaiveDate;
use serde::Deserialize;

// Query parameters for the slot listing endpoint
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

// Query parameters for consultant listing
#[derive(Debug, Deserialize)]
pub struct ConsultantFilter {
    pub specialty: Option<String>,
}

// Inclusive date range for the development-only appointment listing
#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}
