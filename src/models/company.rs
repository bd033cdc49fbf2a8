use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::status::{self, StatusData};

/// Company under application.
///
/// `status_text` is kept exactly as stored; it may hold any of the legacy
/// encodings and is only interpreted through [`crate::status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Option<i64>,
    pub name: String,
    pub job_role: String,
    pub apply_route: String,
    pub deadline: Option<NaiveDate>,
    pub memo: String,
    pub status_text: String,
    pub created_ts: i64,
    pub updated_ts: i64,
}

impl Company {
    /// Create a new company
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            name,
            job_role: String::new(),
            apply_route: String::new(),
            deadline: None,
            memo: String::new(),
            status_text: String::new(),
            created_ts: now,
            updated_ts: now,
        }
    }

    pub fn status_data(&self) -> StatusData {
        status::parse(Some(&self.status_text))
    }

    pub fn status_label(&self) -> String {
        status::short_label(Some(&self.status_text))
    }

    /// Case-insensitive match on name, role and route
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.name, &self.job_role, &self.apply_route]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}
