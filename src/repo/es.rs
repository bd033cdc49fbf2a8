use rusqlite::{Connection, OptionalExtension, Row};
use chrono::NaiveDate;
use crate::models::{AuditAction, EsResult, EsVersion};
use crate::repo::{CompanyRepo, EventRepo};
use crate::utils::parse_stored_date;
use anyhow::{Context, Result};

const ES_COLUMNS: &str =
    "id, company_id, body, submitted_at, submitted_via, result, memo, file, created_ts, updated_ts";

/// Partial update of an ES version
#[derive(Debug, Clone, Default)]
pub struct EsUpdate {
    pub body: Option<String>,
    pub submitted_at: Option<Option<NaiveDate>>,
    pub submitted_via: Option<String>,
    pub result: Option<EsResult>,
    pub memo: Option<String>,
    /// Attachment path; `Some(String::new())` removes it
    pub file: Option<String>,
}

impl EsUpdate {
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
            && self.submitted_at.is_none()
            && self.submitted_via.is_none()
            && self.result.is_none()
            && self.memo.is_none()
            && self.file.is_none()
    }
}

fn row_to_es(row: &Row) -> rusqlite::Result<EsVersion> {
    let result: String = row.get(5)?;
    Ok(EsVersion {
        id: Some(row.get(0)?),
        company_id: row.get(1)?,
        body: row.get(2)?,
        submitted_at: parse_stored_date(row.get(3)?),
        submitted_via: row.get(4)?,
        result: EsResult::from_str(&result).unwrap_or_default(),
        memo: row.get(6)?,
        file: row.get(7)?,
        created_ts: row.get(8)?,
        updated_ts: row.get(9)?,
    })
}

/// Entry-sheet version repository
pub struct EsRepo;

impl EsRepo {
    /// Insert an ES version. The owning company must exist.
    pub fn create(conn: &Connection, es: &EsVersion) -> Result<EsVersion> {
        if CompanyRepo::get_by_id(conn, es.company_id)?.is_none() {
            anyhow::bail!("Company {} not found", es.company_id);
        }
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO es_versions (company_id, body, submitted_at, submitted_via, result, memo,
                    file, created_ts, updated_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                es.company_id,
                es.body,
                es.submitted_at.map(|d| d.format("%Y-%m-%d").to_string()),
                es.submitted_via,
                es.result.as_str(),
                es.memo,
                es.file,
                now,
                now
            ],
        )
        .with_context(|| format!("Failed to create ES version for company {}", es.company_id))?;

        let id = conn.last_insert_rowid();
        log::debug!("Created ES version {} for company {}", id, es.company_id);
        EventRepo::record(conn, AuditAction::EsCreate, id, serde_json::json!({ "company": es.company_id }))?;

        Ok(EsVersion {
            id: Some(id),
            created_ts: now,
            updated_ts: now,
            ..es.clone()
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<EsVersion>> {
        let sql = format!("SELECT {} FROM es_versions WHERE id = ?1", ES_COLUMNS);
        let es = conn
            .query_row(&sql, [id], row_to_es)
            .optional()
            .with_context(|| format!("Failed to load ES version {}", id))?;
        Ok(es)
    }

    /// List ES versions, newest first, optionally for one company
    pub fn list(conn: &Connection, company_id: Option<i64>) -> Result<Vec<EsVersion>> {
        let mut versions = Vec::new();
        match company_id {
            Some(company_id) => {
                let sql = format!(
                    "SELECT {} FROM es_versions WHERE company_id = ?1 ORDER BY created_ts DESC, id DESC",
                    ES_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                for row in stmt.query_map([company_id], row_to_es)? {
                    versions.push(row?);
                }
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM es_versions ORDER BY created_ts DESC, id DESC",
                    ES_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                for row in stmt.query_map([], row_to_es)? {
                    versions.push(row?);
                }
            }
        }
        Ok(versions)
    }

    pub fn update(conn: &Connection, id: i64, update: &EsUpdate) -> Result<EsVersion> {
        let mut es = Self::get_by_id(conn, id)?
            .ok_or_else(|| anyhow::anyhow!("ES version {} not found", id))?;

        if let Some(body) = &update.body {
            es.body = body.clone();
        }
        if let Some(submitted_at) = update.submitted_at {
            es.submitted_at = submitted_at;
        }
        if let Some(via) = &update.submitted_via {
            es.submitted_via = via.clone();
        }
        if let Some(result) = update.result {
            es.result = result;
        }
        if let Some(memo) = &update.memo {
            es.memo = memo.clone();
        }
        if let Some(file) = &update.file {
            es.file = file.clone();
        }
        es.updated_ts = chrono::Utc::now().timestamp();

        conn.execute(
            "UPDATE es_versions SET body = ?1, submitted_at = ?2, submitted_via = ?3, result = ?4,
                    memo = ?5, file = ?6, updated_ts = ?7
             WHERE id = ?8",
            rusqlite::params![
                es.body,
                es.submitted_at.map(|d| d.format("%Y-%m-%d").to_string()),
                es.submitted_via,
                es.result.as_str(),
                es.memo,
                es.file,
                es.updated_ts,
                id
            ],
        )
        .with_context(|| format!("Failed to update ES version {}", id))?;
        log::debug!("Updated ES version {}", id);
        EventRepo::record(conn, AuditAction::EsUpdate, id, serde_json::json!({ "company": es.company_id }))?;

        Ok(es)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let Some(es) = Self::get_by_id(conn, id)? else {
            return Ok(false);
        };
        conn.execute("DELETE FROM es_versions WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete ES version {}", id))?;
        EventRepo::record(conn, AuditAction::EsDelete, id, serde_json::json!({ "company": es.company_id }))?;
        Ok(true)
    }

    /// Number of ES versions per company
    pub fn count_for_company(conn: &Connection, company_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM es_versions WHERE company_id = ?1",
            [company_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::Company;

    fn setup() -> (Connection, i64) {
        let conn = DbConnection::connect_in_memory().unwrap();
        let company = CompanyRepo::create(&conn, &Company::new("Acme".to_string())).unwrap();
        (conn, company.id.unwrap())
    }

    #[test]
    fn test_create_requires_company() {
        let (conn, _) = setup();
        assert!(EsRepo::create(&conn, &EsVersion::new(42)).is_err());
    }

    #[test]
    fn test_create_list_update() {
        let (conn, company_id) = setup();
        let mut es = EsVersion::new(company_id);
        es.body = "志望動機".to_string();
        es.submitted_at = NaiveDate::from_ymd_opt(2026, 10, 1);
        let first = EsRepo::create(&conn, &es).unwrap();
        let second = EsRepo::create(&conn, &EsVersion::new(company_id)).unwrap();

        let listed = EsRepo::list(&conn, Some(company_id)).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(EsRepo::list(&conn, None).unwrap().len(), 2);

        let update = EsUpdate { result: Some(EsResult::Pass), submitted_at: Some(None), ..Default::default() };
        let updated = EsRepo::update(&conn, first.id.unwrap(), &update).unwrap();
        assert_eq!(updated.result, EsResult::Pass);
        assert!(updated.submitted_at.is_none());
        assert_eq!(updated.body, "志望動機");

        let reloaded = EsRepo::get_by_id(&conn, first.id.unwrap()).unwrap().unwrap();
        assert_eq!(reloaded.result, EsResult::Pass);
    }

    #[test]
    fn test_attachment_path_round_trip() {
        let (conn, company_id) = setup();
        let mut es = EsVersion::new(company_id);
        es.file = "/home/me/es/final.pdf".to_string();
        let id = EsRepo::create(&conn, &es).unwrap().id.unwrap();
        assert_eq!(EsRepo::get_by_id(&conn, id).unwrap().unwrap().file, "/home/me/es/final.pdf");

        let update = EsUpdate { file: Some(String::new()), ..Default::default() };
        assert!(!update.is_empty());
        assert_eq!(EsRepo::update(&conn, id, &update).unwrap().file, "");
        assert!(EsUpdate::default().is_empty());
    }

    #[test]
    fn test_company_delete_cascades() {
        let (conn, company_id) = setup();
        EsRepo::create(&conn, &EsVersion::new(company_id)).unwrap();
        assert_eq!(EsRepo::count_for_company(&conn, company_id).unwrap(), 1);

        CompanyRepo::delete(&conn, company_id).unwrap();
        assert_eq!(EsRepo::count_for_company(&conn, company_id).unwrap(), 0);
    }
}
