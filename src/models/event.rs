use serde::{Deserialize, Serialize};

/// Kind of data write recorded in the audit history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CompanyCreate,
    CompanyUpdate,
    CompanyDelete,
    EsCreate,
    EsUpdate,
    EsDelete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CompanyCreate => "COMPANY_CREATE",
            AuditAction::CompanyUpdate => "COMPANY_UPDATE",
            AuditAction::CompanyDelete => "COMPANY_DELETE",
            AuditAction::EsCreate => "ES_CREATE",
            AuditAction::EsUpdate => "ES_UPDATE",
            AuditAction::EsDelete => "ES_DELETE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "COMPANY_CREATE" => Some(AuditAction::CompanyCreate),
            "COMPANY_UPDATE" => Some(AuditAction::CompanyUpdate),
            "COMPANY_DELETE" => Some(AuditAction::CompanyDelete),
            "ES_CREATE" => Some(AuditAction::EsCreate),
            "ES_UPDATE" => Some(AuditAction::EsUpdate),
            "ES_DELETE" => Some(AuditAction::EsDelete),
            _ => None,
        }
    }

    /// Record type the action applies to
    pub fn target_type(&self) -> &'static str {
        match self {
            AuditAction::CompanyCreate | AuditAction::CompanyUpdate | AuditAction::CompanyDelete => "company",
            AuditAction::EsCreate | AuditAction::EsUpdate | AuditAction::EsDelete => "es",
        }
    }
}

/// One immutable entry of the audit history
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: i64,
    pub ts: i64,
    pub action: AuditAction,
    pub target_type: String,
    pub target_id: i64,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(AuditAction::EsDelete.as_str(), "ES_DELETE");
        assert_eq!(AuditAction::from_str("COMPANY_UPDATE"), Some(AuditAction::CompanyUpdate));
        assert_eq!(AuditAction::from_str("LOGIN_SUCCESS"), None);
        assert_eq!(AuditAction::CompanyCreate.target_type(), "company");
        assert_eq!(AuditAction::EsUpdate.target_type(), "es");
        assert_eq!(
            serde_json::to_string(&AuditAction::CompanyDelete).unwrap(),
            "\"COMPANY_DELETE\""
        );
    }
}
