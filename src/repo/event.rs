use rusqlite::{Connection, Row};
use anyhow::{Context, Result};
use crate::models::{AuditAction, AuditEvent};

fn row_to_event(row: &Row) -> rusqlite::Result<(i64, i64, String, String, i64, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

/// Append-only history of company and ES writes.
///
/// Repositories record an event after every successful write. Events are
/// never updated or deleted, and survive deletion of their target.
pub struct EventRepo;

impl EventRepo {
    pub fn record(conn: &Connection, action: AuditAction, target_id: i64, payload: serde_json::Value) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO audit_events (ts, action, target_type, target_id, payload_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                now,
                action.as_str(),
                action.target_type(),
                target_id,
                payload.to_string()
            ],
        )
        .with_context(|| format!("Failed to record {} event for {}", action.as_str(), target_id))?;
        log::debug!("Recorded {} for {} {}", action.as_str(), action.target_type(), target_id);
        Ok(())
    }

    /// Most recent events first, capped at `limit` when given
    pub fn list(conn: &Connection, limit: Option<usize>) -> Result<Vec<AuditEvent>> {
        let mut sql = "SELECT id, ts, action, target_type, target_id, payload_json
             FROM audit_events ORDER BY ts DESC, id DESC"
            .to_string();
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_event)?;

        let mut events = Vec::new();
        for row in rows {
            let (id, ts, action, target_type, target_id, payload_json) = row?;
            let Some(action) = AuditAction::from_str(&action) else {
                log::warn!("Skipping audit event {} with unknown action {:?}", id, action);
                continue;
            };
            let payload = serde_json::from_str(&payload_json).unwrap_or(serde_json::Value::Null);
            events.push(AuditEvent { id, ts, action, target_type, target_id, payload });
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::{Company, EsVersion};
    use crate::repo::{CompanyRepo, CompanyUpdate, EsRepo, EsUpdate};

    fn actions(conn: &Connection) -> Vec<(AuditAction, i64)> {
        let mut events = EventRepo::list(conn, None).unwrap();
        events.reverse();
        events.into_iter().map(|e| (e.action, e.target_id)).collect()
    }

    #[test]
    fn test_company_writes_are_recorded() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let id = CompanyRepo::create(&conn, &Company::new("Acme".to_string())).unwrap().id.unwrap();
        let update = CompanyUpdate { memo: Some("OB訪問".to_string()), ..Default::default() };
        CompanyRepo::update(&conn, id, &update).unwrap();
        CompanyRepo::update_status_text(&conn, id, r#"{"statuses":{"es":"済"}}"#).unwrap();
        CompanyRepo::delete(&conn, id).unwrap();

        assert_eq!(
            actions(&conn),
            vec![
                (AuditAction::CompanyCreate, id),
                (AuditAction::CompanyUpdate, id),
                (AuditAction::CompanyUpdate, id),
                (AuditAction::CompanyDelete, id),
            ]
        );
        let latest = &EventRepo::list(&conn, Some(1)).unwrap()[0];
        assert_eq!(latest.target_type, "company");
        assert_eq!(latest.payload["name"], "Acme");
    }

    #[test]
    fn test_es_writes_are_recorded() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let company_id = CompanyRepo::create(&conn, &Company::new("Acme".to_string())).unwrap().id.unwrap();
        let es_id = EsRepo::create(&conn, &EsVersion::new(company_id)).unwrap().id.unwrap();
        let update = EsUpdate { body: Some("v2".to_string()), ..Default::default() };
        EsRepo::update(&conn, es_id, &update).unwrap();
        EsRepo::delete(&conn, es_id).unwrap();

        let es_events: Vec<(AuditAction, i64)> = actions(&conn)
            .into_iter()
            .filter(|(action, _)| action.target_type() == "es")
            .collect();
        assert_eq!(
            es_events,
            vec![
                (AuditAction::EsCreate, es_id),
                (AuditAction::EsUpdate, es_id),
                (AuditAction::EsDelete, es_id),
            ]
        );
    }

    #[test]
    fn test_failed_delete_is_not_recorded() {
        let conn = DbConnection::connect_in_memory().unwrap();
        assert!(!CompanyRepo::delete(&conn, 42).unwrap());
        assert!(!EsRepo::delete(&conn, 42).unwrap());
        assert!(EventRepo::list(&conn, None).unwrap().is_empty());
    }

    #[test]
    fn test_list_limit() {
        let conn = DbConnection::connect_in_memory().unwrap();
        for name in ["A", "B", "C"] {
            CompanyRepo::create(&conn, &Company::new(name.to_string())).unwrap();
        }
        let events = EventRepo::list(&conn, Some(2)).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].id > events[1].id);
    }
}
