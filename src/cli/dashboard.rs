// Dashboard and calendar computations over the company list

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::deadline::{days_until_from, UrgencyLevel, APPROACHING_DAYS};
use crate::models::Company;

/// Days before and after today covered by the upcoming-deadline list
pub const UPCOMING_WINDOW_DAYS: i64 = 7;
/// Maximum number of upcoming deadlines shown
pub const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub with_deadline: usize,
    pub in_progress: usize,
    pub interviews: usize,
    pub pending_es: usize,
    pub offers: usize,
    pub urgent: usize,
    pub approaching: usize,
}

/// Compute dashboard counters
pub fn compute_stats(companies: &[Company], today: NaiveDate) -> DashboardStats {
    let mut stats = DashboardStats {
        total: companies.len(),
        ..Default::default()
    };

    for company in companies {
        let data = company.status_data();
        if data.is_in_progress() {
            stats.in_progress += 1;
        }
        if data.has_interview() {
            stats.interviews += 1;
        }
        if crate::status::is_pending_es(Some(&company.status_text)) {
            stats.pending_es += 1;
        }
        if data.has_offer() {
            stats.offers += 1;
        }

        if let Some(deadline) = company.deadline {
            stats.with_deadline += 1;
            match UrgencyLevel::from_days(days_until_from(deadline, today)) {
                UrgencyLevel::Urgent => stats.urgent += 1,
                UrgencyLevel::Approaching => stats.approaching += 1,
                UrgencyLevel::Expired | UrgencyLevel::Normal => {}
            }
        }
    }

    stats
}

/// Companies whose deadline lies within a week either side of today,
/// earliest first, capped at [`UPCOMING_LIMIT`]
pub fn upcoming_deadlines(companies: &[Company], today: NaiveDate) -> Vec<&Company> {
    let from = today - Duration::days(UPCOMING_WINDOW_DAYS);
    let to = today + Duration::days(UPCOMING_WINDOW_DAYS);

    let mut upcoming: Vec<&Company> = companies
        .iter()
        .filter(|c| c.deadline.map_or(false, |d| d >= from && d <= to))
        .collect();
    upcoming.sort_by_key(|c| (c.deadline, c.id));
    upcoming.truncate(UPCOMING_LIMIT);
    upcoming
}

/// Deadlines in a month, grouped by day of month
pub fn deadlines_by_day(companies: &[Company], year: i32, month: u32) -> BTreeMap<u32, Vec<&Company>> {
    let mut days: BTreeMap<u32, Vec<&Company>> = BTreeMap::new();
    for company in companies {
        if let Some(deadline) = company.deadline {
            if deadline.year() == year && deadline.month() == month {
                days.entry(deadline.day()).or_default().push(company);
            }
        }
    }
    days
}

/// True when a deadline needs attention this week
pub fn is_due_this_week(company: &Company, today: NaiveDate) -> bool {
    company
        .deadline
        .map(|d| days_until_from(d, today))
        .map_or(false, |days| (0..=APPROACHING_DAYS).contains(&days))
}
