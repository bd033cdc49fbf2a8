//! Deadline urgency.
//!
//! Deadlines are calendar dates. Day counts compare the deadline with
//! today's local date, so the time of day never matters: today is day 0,
//! tomorrow day 1, yesterday day -1.

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

/// Upper bound (inclusive) of the urgent tier, in days
pub const URGENT_DAYS: i64 = 3;
/// Upper bound (inclusive) of the approaching tier, in days
pub const APPROACHING_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Expired,
    Urgent,
    Approaching,
    Normal,
}

impl UrgencyLevel {
    pub fn from_days(days: i64) -> Self {
        if days < 0 {
            UrgencyLevel::Expired
        } else if days <= URGENT_DAYS {
            UrgencyLevel::Urgent
        } else if days <= APPROACHING_DAYS {
            UrgencyLevel::Approaching
        } else {
            UrgencyLevel::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Expired => "expired",
            UrgencyLevel::Urgent => "urgent",
            UrgencyLevel::Approaching => "approaching",
            UrgencyLevel::Normal => "normal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UrgencyLevel::Expired => "期限切れ",
            UrgencyLevel::Urgent => "緊急",
            UrgencyLevel::Approaching => "期限接近",
            UrgencyLevel::Normal => "余裕あり",
        }
    }

    /// Foreground color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            UrgencyLevel::Expired => "#94A3B8",
            UrgencyLevel::Urgent => "#EF4444",
            UrgencyLevel::Approaching => "#F59E0B",
            UrgencyLevel::Normal => "#10B981",
        }
    }

    /// Background color (hex)
    pub fn bg_color(&self) -> &'static str {
        match self {
            UrgencyLevel::Expired => "#F1F5F9",
            UrgencyLevel::Urgent => "#FEF2F2",
            UrgencyLevel::Approaching => "#FFF7ED",
            UrgencyLevel::Normal => "#F0FDF4",
        }
    }
}

/// Classified deadline with its display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Urgency {
    pub level: UrgencyLevel,
    pub days: i64,
    pub label: &'static str,
    pub color: &'static str,
    pub bg_color: &'static str,
}

impl Urgency {
    pub fn from_days(days: i64) -> Self {
        let level = UrgencyLevel::from_days(days);
        Self {
            level,
            days,
            label: level.label(),
            color: level.color(),
            bg_color: level.bg_color(),
        }
    }
}

/// Today's local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days from `today` to `deadline` (negative once passed)
pub fn days_until_from(deadline: NaiveDate, today: NaiveDate) -> i64 {
    deadline.signed_duration_since(today).num_days()
}

pub fn days_until(deadline: NaiveDate) -> i64 {
    days_until_from(deadline, today())
}

pub fn classify_on(deadline: Option<NaiveDate>, today: NaiveDate) -> Option<Urgency> {
    deadline.map(|d| Urgency::from_days(days_until_from(d, today)))
}

pub fn classify(deadline: Option<NaiveDate>) -> Option<Urgency> {
    classify_on(deadline, today())
}

/// Short Japanese date, e.g. `10月18日`
pub fn format_short_date(date: NaiveDate) -> String {
    format!("{}月{}日", date.month(), date.day())
}

/// Deadline for list rows: short date plus a proximity hint within a week
pub fn format_display_on(deadline: Option<NaiveDate>, today: NaiveDate) -> String {
    let deadline = match deadline {
        Some(d) => d,
        None => return "-".to_string(),
    };
    let date_str = format_short_date(deadline);
    let days = days_until_from(deadline, today);

    // Tomorrow must be checked before the 1..=7 range
    if days == 0 {
        format!("{} (今日)", date_str)
    } else if days == 1 {
        format!("{} (明日)", date_str)
    } else if days > 1 && days <= APPROACHING_DAYS {
        format!("{} (あと{}日)", date_str, days)
    } else {
        date_str
    }
}

pub fn format_display(deadline: Option<NaiveDate>) -> String {
    format_display_on(deadline, today())
}
