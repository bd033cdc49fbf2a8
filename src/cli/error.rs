// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing records, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// True when the error chain contains a storage or I/O failure.
/// Internal errors exit with code 2, everything else is a user error.
pub fn is_internal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<rusqlite::Error>().is_some()
            || cause.downcast_ref::<std::io::Error>().is_some()
    })
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate a record ID (positive integer)
pub fn validate_id(id_str: &str, kind: &str) -> Result<i64, String> {
    id_str.trim().parse::<i64>()
        .map_err(|_| format!("Invalid {} ID: '{}'. ID must be a number.", kind, id_str))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid {} ID: {}. ID must be positive.", kind, id))
            }
        })
}

pub fn validate_company_id(id_str: &str) -> Result<i64, String> {
    validate_id(id_str, "company")
}

pub fn validate_es_id(id_str: &str) -> Result<i64, String> {
    validate_id(id_str, "ES")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("test", "field").is_ok());
        assert!(validate_non_empty("", "field").is_err());
        assert!(validate_non_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_company_id() {
        assert_eq!(validate_company_id("1"), Ok(1));
        assert_eq!(validate_company_id("42"), Ok(42));
        assert!(validate_company_id("0").is_err());
        assert!(validate_company_id("-1").is_err());
        assert!(validate_company_id("abc").is_err());
        assert!(validate_company_id("").is_err());
    }

    #[test]
    fn test_validate_es_id_message() {
        let err = validate_es_id("x").unwrap_err();
        assert!(err.contains("Invalid ES ID"));
    }

    #[test]
    fn test_is_internal() {
        let user = anyhow::anyhow!("Company 3 not found");
        assert!(!is_internal(&user));

        let io = anyhow::Error::new(std::io::Error::new(std::io::ErrorKind::Other, "disk"))
            .context("Failed to open database");
        assert!(is_internal(&io));
    }
}
