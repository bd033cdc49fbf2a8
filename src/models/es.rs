use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Screening result of a submitted entry sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EsResult {
    Unknown,
    Pass,
    Fail,
}

impl EsResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            EsResult::Unknown => "UNKNOWN",
            EsResult::Pass => "PASS",
            EsResult::Fail => "FAIL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNKNOWN" => Some(EsResult::Unknown),
            "PASS" => Some(EsResult::Pass),
            "FAIL" => Some(EsResult::Fail),
            _ => None,
        }
    }
}

impl Default for EsResult {
    fn default() -> Self {
        EsResult::Unknown
    }
}

/// One submitted (or drafted) version of an entry sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsVersion {
    pub id: Option<i64>,
    pub company_id: i64,
    pub body: String,
    pub submitted_at: Option<NaiveDate>,
    pub submitted_via: String,
    pub result: EsResult,
    pub memo: String,
    /// Absolute path of the attached file, empty when none
    pub file: String,
    pub created_ts: i64,
    pub updated_ts: i64,
}

impl EsVersion {
    pub fn new(company_id: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            company_id,
            body: String::new(),
            submitted_at: None,
            submitted_via: String::new(),
            result: EsResult::default(),
            memo: String::new(),
            file: String::new(),
            created_ts: now,
            updated_ts: now,
        }
    }
}
