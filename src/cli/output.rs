// Output formatting utilities

use std::collections::BTreeMap;
use std::io::IsTerminal;

use chrono::{Datelike, Local, NaiveDate};
use serde_json::json;

use crate::cli::dashboard::{is_due_this_week, DashboardStats};
use crate::deadline::{self, UrgencyLevel};
use crate::models::{AuditEvent, Company, EsVersion};
use crate::status;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

// ANSI foreground colors
const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";

/// Terminal color closest to each urgency tier's display color
fn urgency_fg(level: UrgencyLevel) -> &'static str {
    match level {
        UrgencyLevel::Expired => ANSI_FG_BRIGHT_BLACK,
        UrgencyLevel::Urgent => ANSI_FG_RED,
        UrgencyLevel::Approaching => ANSI_FG_YELLOW,
        UrgencyLevel::Normal => ANSI_FG_GREEN,
    }
}

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn color_if_tty(text: &str, color: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", color, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Display width in terminal columns (CJK characters take two)
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// East Asian wide and fullwidth ranges. Ambiguous-width symbols and
/// half-width katakana (U+FF61..U+FF9F) stay at one column.
const WIDE_RANGES: [(u32, u32); 14] = [
    (0x1100, 0x115F),
    (0x2E80, 0x303E),
    (0x3041, 0x3098),
    (0x309B, 0x33FF),
    (0x3400, 0x4DBF),
    (0x4E00, 0x9FFF),
    (0xA000, 0xA4CF),
    (0xAC00, 0xD7A3),
    (0xF900, 0xFAFF),
    (0xFE30, 0xFE4F),
    (0xFF00, 0xFF60),
    (0xFFE0, 0xFFE6),
    (0x1F300, 0x1F64F),
    (0x20000, 0x3FFFD),
];

fn char_width(c: char) -> usize {
    let cp = c as u32;
    // Combining (han)dakuten
    if cp == 0x3099 || cp == 0x309A {
        return 0;
    }
    if WIDE_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp)) {
        2
    } else {
        1
    }
}

/// Cut text to at most `width` columns, marking the cut with ".."
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = char_width(c);
        if used + w + 2 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str("..");
    out
}

fn pad_right(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(text));
    format!("{}{}", text, " ".repeat(pad))
}

/// Format timestamp for display
pub fn format_timestamp(ts: i64) -> String {
    use chrono::TimeZone;
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Format an optional calendar date as ISO text
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn or_dash(text: &str) -> &str {
    if text.is_empty() { "-" } else { text }
}

/// Company record as JSON, with derived status and urgency
pub fn company_json(company: &Company, today: NaiveDate) -> serde_json::Value {
    let parsed = status::parse_with_origin(Some(&company.status_text));
    let stage = parsed.data.stage();
    json!({
        "id": company.id,
        "name": company.name,
        "job_role": company.job_role,
        "apply_route": company.apply_route,
        "deadline": company.deadline,
        "memo": company.memo,
        "status_text": company.status_text,
        "statuses": parsed.data,
        "status_label": company.status_label(),
        "status_origin": parsed.origin,
        "stage": stage.key().map(|k| k.as_str()),
        "stage_state": stage.state().map(|s| s.as_str()),
        "in_interview": stage.is_interview(),
        "urgency": deadline::classify_on(company.deadline, today),
        "deadline_display": deadline::format_display_on(company.deadline, today),
        "created_at": format_timestamp(company.created_ts),
        "updated_at": format_timestamp(company.updated_ts),
    })
}

fn or_null(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// ES version as JSON
pub fn es_json(es: &EsVersion) -> serde_json::Value {
    json!({
        "id": es.id,
        "company": es.company_id,
        "body": es.body,
        "submitted_at": es.submitted_at,
        "submitted_via": es.submitted_via,
        "result": es.result,
        "memo": es.memo,
        "file": or_null(&es.file),
        "created_at": format_timestamp(es.created_ts),
        "updated_at": format_timestamp(es.updated_ts),
    })
}

struct Column {
    label: &'static str,
    max_width: usize,
}

/// Render rows as an aligned table. `colors` holds an optional color per cell.
fn render_table(columns: &[Column], rows: &[Vec<String>], colors: &[Vec<Option<&'static str>>], is_tty: bool) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(columns)
                .map(|(cell, col)| truncate_to_width(cell, col.max_width))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|row| display_width(&row[i]))
                .chain(std::iter::once(display_width(col.label)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| pad_right(col.label, *w))
        .collect();
    output.push_str(&bold_if_tty(header.join("  ").trim_end(), is_tty));
    output.push('\n');

    for (row_idx, row) in cells.iter().enumerate() {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                let padded = pad_right(cell, *w);
                match colors.get(row_idx).and_then(|c| c.get(i)).copied().flatten() {
                    Some(color) => color_if_tty(&padded, color, is_tty),
                    None => padded,
                }
            })
            .collect();
        output.push_str(line.join("  ").trim_end());
        output.push('\n');
    }

    output
}

/// Format the company list as a table
pub fn format_company_table(companies: &[Company], today: NaiveDate, is_tty: bool) -> String {
    if companies.is_empty() {
        return "No companies found.\n".to_string();
    }

    // Give text columns whatever the terminal leaves after the fixed ones
    let flexible = get_terminal_width().saturating_sub(50).max(24);
    let columns = [
        Column { label: "ID", max_width: 6 },
        Column { label: "Name", max_width: flexible / 2 },
        Column { label: "Role", max_width: flexible / 4 },
        Column { label: "Deadline", max_width: 20 },
        Column { label: "Urgency", max_width: 10 },
        Column { label: "Status", max_width: flexible / 4 + 8 },
    ];

    let mut rows = Vec::new();
    let mut colors = Vec::new();
    for company in companies {
        let urgency = deadline::classify_on(company.deadline, today);
        rows.push(vec![
            company.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
            company.name.clone(),
            or_dash(&company.job_role).to_string(),
            deadline::format_display_on(company.deadline, today),
            urgency.as_ref().map(|u| u.label.to_string()).unwrap_or_else(|| "-".to_string()),
            or_dash(&company.status_label()).to_string(),
        ]);
        let urgency_color = urgency.map(|u| urgency_fg(u.level));
        colors.push(vec![None, None, None, urgency_color, urgency_color, None]);
    }

    render_table(&columns, &rows, &colors, is_tty)
}

/// Format detailed view of one company
pub fn format_company_summary(company: &Company, es_versions: &[EsVersion], today: NaiveDate, is_tty: bool) -> String {
    let mut output = String::new();
    let id = company.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string());
    let parsed = status::parse_with_origin(Some(&company.status_text));

    output.push_str(&bold_if_tty(&format!("Company {}: {}", id, company.name), is_tty));
    output.push('\n');
    output.push_str(&format!("  Role:      {}\n", or_dash(&company.job_role)));
    output.push_str(&format!("  Route:     {}\n", or_dash(&company.apply_route)));

    let deadline_line = match deadline::classify_on(company.deadline, today) {
        Some(urgency) => format!(
            "{} [{}]",
            deadline::format_display_on(company.deadline, today),
            color_if_tty(urgency.label, urgency_fg(urgency.level), is_tty)
        ),
        None => "-".to_string(),
    };
    output.push_str(&format!("  Deadline:  {}\n", deadline_line));
    output.push_str(&format!("  Status:    {}\n", or_dash(&company.status_label())));
    if parsed.origin.needs_migration() {
        output.push_str("             (legacy format; run `shukatsu migrate` to convert)\n");
    }
    output.push_str(&format!("  Updated:   {}\n", format_timestamp(company.updated_ts)));

    if !company.memo.is_empty() {
        output.push_str("\nMemo:\n");
        for line in company.memo.lines() {
            output.push_str(&format!("  {}\n", line));
        }
    }

    output.push_str(&format!("\nES versions ({}):\n", es_versions.len()));
    if es_versions.is_empty() {
        output.push_str("  none\n");
    } else {
        for es in es_versions {
            output.push_str(&format!(
                "  [{}] submitted {} via {} result {}\n",
                es.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
                format_date(es.submitted_at),
                or_dash(&es.submitted_via),
                es.result.as_str(),
            ));
        }
    }

    output
}

/// Format ES versions as a table. `names` maps company id to name.
pub fn format_es_table(versions: &[EsVersion], names: &BTreeMap<i64, String>, is_tty: bool) -> String {
    if versions.is_empty() {
        return "No ES versions found.\n".to_string();
    }

    let columns = [
        Column { label: "ID", max_width: 6 },
        Column { label: "Company", max_width: 30 },
        Column { label: "Submitted", max_width: 10 },
        Column { label: "Via", max_width: 20 },
        Column { label: "Result", max_width: 7 },
        Column { label: "Memo", max_width: 40 },
    ];

    let rows: Vec<Vec<String>> = versions
        .iter()
        .map(|es| {
            vec![
                es.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
                names.get(&es.company_id).cloned().unwrap_or_else(|| es.company_id.to_string()),
                format_date(es.submitted_at),
                or_dash(&es.submitted_via).to_string(),
                es.result.as_str().to_string(),
                or_dash(es.memo.lines().next().unwrap_or_default()).to_string(),
            ]
        })
        .collect();

    render_table(&columns, &rows, &[], is_tty)
}

/// Audit event as JSON
pub fn event_json(event: &AuditEvent) -> serde_json::Value {
    json!({
        "id": event.id,
        "time": format_timestamp(event.ts),
        "action": event.action,
        "target_type": event.target_type,
        "target_id": event.target_id,
        "payload": event.payload,
    })
}

/// Short description of an event payload: record name and touched fields
fn event_detail(event: &AuditEvent) -> String {
    let mut parts = Vec::new();
    if let Some(name) = event.payload["name"].as_str() {
        parts.push(name.to_string());
    }
    if let Some(company) = event.payload["company"].as_i64() {
        parts.push(format!("company {}", company));
    }
    if let Some(fields) = event.payload["fields"].as_array() {
        let fields: Vec<&str> = fields.iter().filter_map(|f| f.as_str()).collect();
        if !fields.is_empty() {
            parts.push(format!("[{}]", fields.join(", ")));
        }
    }
    or_dash(&parts.join(" ")).to_string()
}

/// Format the change history as a table
pub fn format_event_table(events: &[AuditEvent], is_tty: bool) -> String {
    if events.is_empty() {
        return "No changes recorded.\n".to_string();
    }

    let columns = [
        Column { label: "ID", max_width: 6 },
        Column { label: "Time", max_width: 16 },
        Column { label: "Action", max_width: 14 },
        Column { label: "Target", max_width: 14 },
        Column { label: "Detail", max_width: 50 },
    ];

    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|event| {
            vec![
                event.id.to_string(),
                format_timestamp(event.ts),
                event.action.as_str().to_string(),
                format!("{} {}", event.target_type, event.target_id),
                event_detail(event),
            ]
        })
        .collect();

    render_table(&columns, &rows, &[], is_tty)
}

/// Format detailed view of one ES version
pub fn format_es_summary(es: &EsVersion, company_name: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "ES {} for company {} ({})\n",
        es.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
        es.company_id,
        company_name
    ));
    output.push_str(&format!("  Submitted: {}\n", format_date(es.submitted_at)));
    output.push_str(&format!("  Via:       {}\n", or_dash(&es.submitted_via)));
    output.push_str(&format!("  Result:    {}\n", es.result.as_str()));
    output.push_str(&format!("  Updated:   {}\n", format_timestamp(es.updated_ts)));
    if !es.memo.is_empty() {
        output.push_str(&format!("  Memo:      {}\n", es.memo));
    }
    if !es.file.is_empty() {
        output.push_str(&format!("  File:      {}\n", es.file));
    }
    output.push_str("\nBody:\n");
    if es.body.is_empty() {
        output.push_str("  (empty)\n");
    } else {
        for line in es.body.lines() {
            output.push_str(&format!("  {}\n", line));
        }
    }
    output
}

/// Format the dashboard
pub fn format_dashboard(stats: &DashboardStats, upcoming: &[&Company], today: NaiveDate, is_tty: bool) -> String {
    let mut output = String::new();

    output.push_str("=== Selection Status ===\n");
    output.push_str(&format!("In progress: {}\n", stats.in_progress));
    output.push_str(&format!("Interviews:  {}\n", stats.interviews));
    output.push_str(&format!("Pending ES:  {}\n", stats.pending_es));
    output.push_str(&format!("Offers:      {}\n", stats.offers));
    output.push('\n');

    output.push_str("=== Deadlines ===\n");
    output.push_str(&format!(
        "{} companies, {} with a deadline, {} urgent (<=3 days), {} approaching (<=7 days)\n",
        stats.total, stats.with_deadline, stats.urgent, stats.approaching
    ));
    output.push('\n');

    output.push_str("=== Upcoming Deadlines (±7 days) ===\n");
    if upcoming.is_empty() {
        output.push_str("No deadlines within a week.\n");
    } else {
        for company in upcoming {
            let urgency = deadline::classify_on(company.deadline, today);
            let label = urgency
                .as_ref()
                .map(|u| color_if_tty(u.label, urgency_fg(u.level), is_tty))
                .unwrap_or_default();
            let status_label = company.status_label();
            let status_str = if status_label.is_empty() {
                String::new()
            } else {
                format!(" status={}", status_label)
            };
            output.push_str(&format!(
                "{}: {} {} [{}]{}\n",
                company.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
                company.name,
                deadline::format_display_on(company.deadline, today),
                label,
                status_str,
            ));
        }
    }

    output
}

/// Format a month calendar with deadline markers and the list of deadlines
pub fn format_calendar(year: i32, month: u32, days: &BTreeMap<u32, Vec<&Company>>, today: NaiveDate) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}年{}月\n", year, month));
    // Each weekday glyph is two columns wide, over its cell's two digits
    output.push_str("日  月  火  水  木  金  土\n");

    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d,
        None => return output,
    };
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let days_in_month = next_month
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28);

    let mut cells: Vec<String> = vec!["   ".to_string(); first.weekday().num_days_from_sunday() as usize];
    for day in 1..=days_in_month {
        let is_today = today.year() == year && today.month() == month && today.day() == day;
        let mark = if days.contains_key(&day) {
            '*'
        } else if is_today {
            '<'
        } else {
            ' '
        };
        cells.push(format!("{:>2}{}", day, mark));
    }
    for week in cells.chunks(7) {
        output.push_str(week.join(" ").trim_end());
        output.push('\n');
    }

    output.push('\n');
    if days.is_empty() {
        output.push_str("No deadlines this month.\n");
    } else {
        output.push_str("Deadlines:\n");
        for (day, companies) in days {
            let names: Vec<String> = companies
                .iter()
                .map(|c| {
                    if is_due_this_week(c, today) {
                        format!("{} (!)", c.name)
                    } else {
                        c.name.clone()
                    }
                })
                .collect();
            output.push_str(&format!("  {:>2}日: {}\n", day, names.join(", ")));
        }
    }

    output
}
