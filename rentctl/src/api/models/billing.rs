//! API request/response models for billing runs and reports.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::billing::Statement;

/// Query parameters for the unpaid report and payment reminders
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AsOfQuery {
    /// Date to evaluate the alert day against (`YYYY-MM-DD`, defaults to today)
    #[param(value_type = Option<String>, format = "date")]
    pub as_of: Option<NaiveDate>,
}

impl AsOfQuery {
    pub fn date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Result of applying the meter feed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingRunResponse {
    pub billed: usize,
    pub statements: Vec<Statement>,
}
