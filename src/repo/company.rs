use rusqlite::{Connection, OptionalExtension, Row};
use chrono::NaiveDate;
use crate::models::{AuditAction, Company};
use crate::repo::EventRepo;
use crate::utils::parse_stored_date;
use anyhow::{Context, Result};

const COMPANY_COLUMNS: &str =
    "id, name, job_role, apply_route, deadline, memo, status_text, created_ts, updated_ts";

/// Sort order for company listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompanyOrdering {
    /// Most recently updated first
    #[default]
    Updated,
    /// Earliest deadline first, companies without a deadline last
    Deadline,
    Name,
}

impl CompanyOrdering {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "updated" => Some(CompanyOrdering::Updated),
            "deadline" => Some(CompanyOrdering::Deadline),
            "name" => Some(CompanyOrdering::Name),
            _ => None,
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            CompanyOrdering::Updated => "updated_ts DESC, id DESC",
            CompanyOrdering::Deadline => "deadline IS NULL, deadline ASC, id ASC",
            CompanyOrdering::Name => "name COLLATE NOCASE ASC, id ASC",
        }
    }
}

/// Partial update of company fields. `None` leaves a field untouched;
/// `deadline: Some(None)` clears the deadline.
#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub job_role: Option<String>,
    pub apply_route: Option<String>,
    pub deadline: Option<Option<NaiveDate>>,
    pub memo: Option<String>,
}

impl CompanyUpdate {
    /// Names of the fields this update touches
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.job_role.is_some() {
            fields.push("job_role");
        }
        if self.apply_route.is_some() {
            fields.push("apply_route");
        }
        if self.deadline.is_some() {
            fields.push("deadline");
        }
        if self.memo.is_some() {
            fields.push("memo");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.job_role.is_none()
            && self.apply_route.is_none()
            && self.deadline.is_none()
            && self.memo.is_none()
    }
}

fn row_to_company(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        job_role: row.get(2)?,
        apply_route: row.get(3)?,
        deadline: parse_stored_date(row.get(4)?),
        memo: row.get(5)?,
        status_text: row.get(6)?,
        created_ts: row.get(7)?,
        updated_ts: row.get(8)?,
    })
}

fn date_column(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Company repository for database operations
///
/// `status_text` is written exactly as given: callers encode it with
/// [`crate::status::serialize`] before saving a stage change.
pub struct CompanyRepo;

impl CompanyRepo {
    /// Insert a company record
    pub fn create(conn: &Connection, company: &Company) -> Result<Company> {
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO companies (name, job_role, apply_route, deadline, memo, status_text,
                    created_ts, updated_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                company.name,
                company.job_role,
                company.apply_route,
                date_column(company.deadline),
                company.memo,
                company.status_text,
                now,
                now
            ],
        )
        .with_context(|| format!("Failed to create company: {}", company.name))?;

        let id = conn.last_insert_rowid();
        log::debug!("Created company {} ({})", id, company.name);
        EventRepo::record(conn, AuditAction::CompanyCreate, id, serde_json::json!({ "name": company.name }))?;

        Ok(Company {
            id: Some(id),
            created_ts: now,
            updated_ts: now,
            ..company.clone()
        })
    }

    /// Get company by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE id = ?1", COMPANY_COLUMNS);
        let company = conn
            .query_row(&sql, [id], row_to_company)
            .optional()
            .with_context(|| format!("Failed to load company {}", id))?;
        Ok(company)
    }

    /// List all companies in the given order
    pub fn list(conn: &Connection, ordering: CompanyOrdering) -> Result<Vec<Company>> {
        let sql = format!(
            "SELECT {} FROM companies ORDER BY {}",
            COMPANY_COLUMNS,
            ordering.order_by()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_company)?;

        let mut companies = Vec::new();
        for row in rows {
            companies.push(row?);
        }
        Ok(companies)
    }

    /// Apply a partial update and return the stored record
    pub fn update(conn: &Connection, id: i64, update: &CompanyUpdate) -> Result<Company> {
        let mut sets = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(name) = &update.name {
            sets.push("name = ?");
            params.push(Box::new(name.clone()));
        }
        if let Some(job_role) = &update.job_role {
            sets.push("job_role = ?");
            params.push(Box::new(job_role.clone()));
        }
        if let Some(apply_route) = &update.apply_route {
            sets.push("apply_route = ?");
            params.push(Box::new(apply_route.clone()));
        }
        if let Some(deadline) = update.deadline {
            sets.push("deadline = ?");
            params.push(Box::new(date_column(deadline)));
        }
        if let Some(memo) = &update.memo {
            sets.push("memo = ?");
            params.push(Box::new(memo.clone()));
        }
        sets.push("updated_ts = ?");
        params.push(Box::new(chrono::Utc::now().timestamp()));

        // Number the parameters
        let numbered_sets: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, set)| set.replace('?', &format!("?{}", i + 1)))
            .collect();
        let sql = format!(
            "UPDATE companies SET {} WHERE id = ?{}",
            numbered_sets.join(", "),
            params.len() + 1
        );
        params.push(Box::new(id));

        let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let updated = conn.execute(&sql, param_refs.as_slice())
            .with_context(|| format!("Failed to update company {}", id))?;
        if updated == 0 {
            anyhow::bail!("Company {} not found", id);
        }
        log::debug!("Updated company {}", id);

        let company = Self::get_by_id(conn, id)?
            .ok_or_else(|| anyhow::anyhow!("Company {} not found", id))?;
        EventRepo::record(
            conn,
            AuditAction::CompanyUpdate,
            id,
            serde_json::json!({ "name": company.name, "fields": update.field_names() }),
        )?;
        Ok(company)
    }

    /// Replace the stored status_text
    pub fn update_status_text(conn: &Connection, id: i64, status_text: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let updated = conn.execute(
            "UPDATE companies SET status_text = ?1, updated_ts = ?2 WHERE id = ?3",
            rusqlite::params![status_text, now, id],
        )
        .with_context(|| format!("Failed to update status of company {}", id))?;
        if updated == 0 {
            anyhow::bail!("Company {} not found", id);
        }
        log::debug!("Company {} status_text set to {}", id, status_text);
        EventRepo::record(
            conn,
            AuditAction::CompanyUpdate,
            id,
            serde_json::json!({ "fields": ["status_text"], "status_text": status_text }),
        )?;
        Ok(())
    }

    /// Delete a company (its ES versions go with it). Returns false if absent.
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let Some(company) = Self::get_by_id(conn, id)? else {
            return Ok(false);
        };
        conn.execute("DELETE FROM companies WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete company {}", id))?;
        EventRepo::record(conn, AuditAction::CompanyDelete, id, serde_json::json!({ "name": company.name }))?;
        Ok(true)
    }
}
