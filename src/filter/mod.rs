//! Company list filtering
//!
//! A listing is narrowed in two steps: a free-text search over name, role
//! and route, then a status filter built on the status predicates.
//!
//! # Status filters
//!
//! - `all` - Every company
//! - `offer` - An offer has been recorded
//! - `interview` - A first, second or final interview is recorded
//! - `pending` - The ES has not been submitted yet
//! - `in-progress` - Some status is recorded, but no offer

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::Company;
use crate::status;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown filter '{0}'. Valid filters: all, offer, interview, pending, in-progress")]
pub struct UnknownFilter(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Offer,
    Interview,
    Pending,
    InProgress,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Offer => "offer",
            StatusFilter::Interview => "interview",
            StatusFilter::Pending => "pending",
            StatusFilter::InProgress => "in-progress",
        }
    }

    pub fn matches(&self, company: &Company) -> bool {
        let text = Some(company.status_text.as_str());
        match self {
            StatusFilter::All => true,
            StatusFilter::Offer => status::has_offer(text),
            StatusFilter::Interview => status::has_interview(text),
            StatusFilter::Pending => status::is_pending_es(text),
            // Raw text check: an empty `{"statuses":{}}` still counts here
            StatusFilter::InProgress => {
                !status::has_offer(text) && !company.status_text.is_empty()
            }
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "offer" => Ok(StatusFilter::Offer),
            "interview" => Ok(StatusFilter::Interview),
            "pending" => Ok(StatusFilter::Pending),
            "in-progress" | "inprogress" | "progress" => Ok(StatusFilter::InProgress),
            _ => Err(UnknownFilter(s.to_string())),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply search and status filter, keeping the input order
pub fn filter_companies(companies: Vec<Company>, search: Option<&str>, filter: StatusFilter) -> Vec<Company> {
    companies
        .into_iter()
        .filter(|c| search.map_or(true, |q| c.matches_search(q)))
        .filter(|c| filter.matches(c))
        .collect()
}
