//! Shukatsu - a command-line ledger for job applications
//!
//! This library provides the core functionality for Shukatsu, including:
//! - Selection-status encoding, legacy formats included ([`status`])
//! - Deadline urgency classification ([`deadline`])
//! - Database operations and migrations
//! - Data models for companies, stages and ES versions
//! - Repository layer for data access
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```
//! use shukatsu::status;
//!
//! let data = status::parse(Some(r#"{"statuses":{"es":"済"}}"#));
//! assert_eq!(data.get("es"), Some("済"));
//! assert_eq!(status::short_label(Some("内定承諾")), "内定");
//! ```

pub mod db;
pub mod models;
pub mod repo;
pub mod cli;
pub mod utils;
pub mod filter;
pub mod status;
pub mod deadline;
