// Entry-sheet version commands

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::commands::confirm;
use crate::cli::error::{user_error, validate_company_id, validate_es_id};
use crate::cli::output::{es_json, format_es_summary, format_es_table, is_tty};
use crate::db::DbConnection;
use crate::models::{EsResult, EsVersion};
use crate::repo::{CompanyOrdering, CompanyRepo, EsRepo, EsUpdate};
use crate::utils::{parse_date_expr, parse_optional_date, validate_attachment};

#[derive(Subcommand)]
pub enum EsCommands {
    /// Record a new ES version for a company
    Add {
        /// Company ID
        company_id: String,
        /// ES text
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,
        /// Read the ES text from a file
        #[arg(long)]
        body_file: Option<PathBuf>,
        /// Submission date
        #[arg(long, allow_hyphen_values = true)]
        submitted: Option<String>,
        /// Where it was submitted (job site, mail, ...)
        #[arg(long)]
        via: Option<String>,
        /// unknown, pass or fail
        #[arg(long)]
        result: Option<String>,
        #[arg(long)]
        memo: Option<String>,
        /// Attach a file (pdf, doc, docx, txt or md; at most 10MB)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List ES versions, newest first
    List {
        /// Only versions of this company
        company_id: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show one ES version with its text
    Show {
        /// ES version ID
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Modify an ES version
    Modify {
        /// ES version ID
        id: String,
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
        /// Submission date, or "none" to clear it
        #[arg(long, allow_hyphen_values = true)]
        submitted: Option<String>,
        #[arg(long)]
        via: Option<String>,
        /// unknown, pass or fail
        #[arg(long)]
        result: Option<String>,
        #[arg(long)]
        memo: Option<String>,
        /// Attach a file, or "none" to remove the attachment
        #[arg(long)]
        file: Option<String>,
    },
    /// Delete an ES version
    Delete {
        /// ES version ID
        id: String,
        /// Delete without confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

pub fn handle_es(cmd: EsCommands) -> Result<()> {
    match cmd {
        EsCommands::Add { company_id, body, body_file, submitted, via, result, memo, file } => {
            let file = file.map(|path| attachment_path(&path));
            handle_es_add(company_id, read_body(body, body_file), submitted, via, result, memo, file)
        }
        EsCommands::List { company_id, json } => handle_es_list(company_id, json),
        EsCommands::Show { id, json } => handle_es_show(id, json),
        EsCommands::Modify { id, body, body_file, submitted, via, result, memo, file } => {
            let update = EsUpdate {
                body: read_body(body, body_file),
                submitted_at: submitted.map(|expr| {
                    parse_optional_date(&expr).unwrap_or_else(|e| user_error(&e.to_string()))
                }),
                submitted_via: via,
                result: result.map(|r| parse_result(&r)),
                memo,
                file: file.map(|f| {
                    let trimmed = f.trim();
                    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                        String::new()
                    } else {
                        attachment_path(Path::new(trimmed))
                    }
                }),
            };
            handle_es_modify(id, update)
        }
        EsCommands::Delete { id, yes } => handle_es_delete(id, yes),
    }
}

fn read_body(body: Option<String>, body_file: Option<PathBuf>) -> Option<String> {
    match body_file {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => user_error(&format!("Cannot read {}: {}", path.display(), e)),
        },
        None => body,
    }
}

/// Validated absolute attachment path, as stored
fn attachment_path(path: &Path) -> String {
    match validate_attachment(path) {
        Ok(path) => path.display().to_string(),
        Err(e) => user_error(&e.to_string()),
    }
}

fn parse_result(s: &str) -> EsResult {
    EsResult::from_str(s)
        .unwrap_or_else(|| user_error(&format!("Invalid result '{}'. Use unknown, pass or fail", s)))
}

fn handle_es_add(
    company_id: String,
    body: Option<String>,
    submitted: Option<String>,
    via: Option<String>,
    result: Option<String>,
    memo: Option<String>,
    file: Option<String>,
) -> Result<()> {
    let company_id = validate_company_id(&company_id).unwrap_or_else(|e| user_error(&e));

    let mut es = EsVersion::new(company_id);
    es.body = body.unwrap_or_default();
    es.submitted_at = submitted.map(|expr| {
        parse_date_expr(&expr).unwrap_or_else(|e| user_error(&e.to_string()))
    });
    es.submitted_via = via.unwrap_or_default();
    es.result = result.map(|r| parse_result(&r)).unwrap_or_default();
    es.memo = memo.unwrap_or_default();
    es.file = file.unwrap_or_default();

    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    if CompanyRepo::get_by_id(&conn, company_id)?.is_none() {
        user_error(&format!("Company {} not found", company_id));
    }
    let created = EsRepo::create(&conn, &es)
        .context("Failed to create ES version")?;

    println!("Created ES version {} for company {}", created.id.unwrap_or_default(), company_id);
    Ok(())
}

fn handle_es_list(company_id: Option<String>, json: bool) -> Result<()> {
    let company_id = company_id.map(|id| validate_company_id(&id).unwrap_or_else(|e| user_error(&e)));

    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    if let Some(id) = company_id {
        if CompanyRepo::get_by_id(&conn, id)?.is_none() {
            user_error(&format!("Company {} not found", id));
        }
    }
    let versions = EsRepo::list(&conn, company_id)
        .context("Failed to list ES versions")?;

    if json {
        let json_versions: Vec<serde_json::Value> = versions.iter().map(es_json).collect();
        println!("{}", serde_json::to_string_pretty(&json_versions)?);
    } else {
        let names: BTreeMap<i64, String> = CompanyRepo::list(&conn, CompanyOrdering::Name)?
            .into_iter()
            .filter_map(|c| c.id.map(|id| (id, c.name)))
            .collect();
        print!("{}", format_es_table(&versions, &names, is_tty()));
    }
    Ok(())
}

fn load_es(conn: &rusqlite::Connection, id_str: &str) -> Result<EsVersion> {
    let id = validate_es_id(id_str).unwrap_or_else(|e| user_error(&e));
    match EsRepo::get_by_id(conn, id)? {
        Some(es) => Ok(es),
        None => user_error(&format!("ES version {} not found", id)),
    }
}

fn handle_es_show(id: String, json: bool) -> Result<()> {
    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let es = load_es(&conn, &id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&es_json(&es))?);
    } else {
        let company_name = CompanyRepo::get_by_id(&conn, es.company_id)?
            .map(|c| c.name)
            .unwrap_or_default();
        print!("{}", format_es_summary(&es, &company_name));
    }
    Ok(())
}

fn handle_es_modify(id: String, update: EsUpdate) -> Result<()> {
    if update.is_empty() {
        user_error("No changes specified. Use --body, --body-file, --submitted, --via, --result, --memo or --file");
    }

    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let es = load_es(&conn, &id)?;
    let es_id = es.id.unwrap_or_default();
    EsRepo::update(&conn, es_id, &update)
        .context("Failed to modify ES version")?;

    println!("Modified ES version {}", es_id);
    Ok(())
}

fn handle_es_delete(id: String, yes: bool) -> Result<()> {
    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let es = load_es(&conn, &id)?;
    let es_id = es.id.unwrap_or_default();

    if !yes && !confirm(&format!("Delete ES version {} of company {}?", es_id, es.company_id))? {
        println!("Cancelled.");
        return Ok(());
    }

    EsRepo::delete(&conn, es_id)
        .context("Failed to delete ES version")?;
    println!("Deleted ES version {}", es_id);
    Ok(())
}
