use clap::{Parser, Subcommand};
use rusqlite::Connection;
use crate::db::DbConnection;
use crate::models::{Company, Stage, StageKey, StageState};
use crate::repo::{CompanyOrdering, CompanyRepo, CompanyUpdate, EsRepo, EventRepo};
use crate::cli::commands_es::{handle_es, EsCommands};
use crate::cli::dashboard::{compute_stats, deadlines_by_day, upcoming_deadlines};
use crate::cli::output::{
    company_json, es_json, event_json, format_calendar, format_company_summary, format_company_table,
    format_dashboard, format_event_table, is_tty,
};
use crate::cli::error::{user_error, validate_company_id, validate_non_empty};
use crate::deadline;
use crate::filter::{filter_companies, StatusFilter};
use crate::status::{self, StatusData, StatusError, StatusOrigin};
use crate::utils::{parse_date_expr, parse_month, parse_optional_date};
use chrono::Datelike;
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "shukatsu")]
#[command(about = "Job-application ledger - track companies, selection stages, ES versions and deadlines")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a company
    Add {
        /// Company name
        name: String,
        /// Job role applied for
        #[arg(long)]
        role: Option<String>,
        /// Application route (job site, referral, ...)
        #[arg(long)]
        route: Option<String>,
        /// Deadline (YYYY-MM-DD, today, tomorrow, +3d, ...)
        #[arg(long, allow_hyphen_values = true)]
        deadline: Option<String>,
        /// Free-form memo
        #[arg(long)]
        memo: Option<String>,
        /// Initial stage as STAGE[:STATE], e.g. es:済 or offer
        #[arg(long)]
        status: Option<String>,
    },
    /// List companies
    List {
        /// Case-insensitive search over name, role and route
        #[arg(long)]
        search: Option<String>,
        /// all, offer, interview, pending or in-progress
        #[arg(long, default_value = "all")]
        filter: String,
        /// updated, deadline or name
        #[arg(long, default_value = "updated")]
        sort: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show detailed summary of a company
    Show {
        /// Company ID
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Modify company fields
    Modify {
        /// Company ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        route: Option<String>,
        /// New deadline, or "none" to clear it
        #[arg(long, allow_hyphen_values = true)]
        deadline: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Permanently delete a company and its ES versions
    Delete {
        /// Company ID
        id: String,
        /// Delete without confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Select the current selection stage of a company
    Stage {
        /// Company ID
        id: String,
        /// briefing, es, first, second, final, other or offer
        stage: String,
        /// 予約 (reserved) or 済 (done); not needed for offer
        state: Option<String>,
        /// Free-text detail for the 'other' stage
        #[arg(long)]
        custom: Option<String>,
        /// Clear the stage instead of selecting it
        #[arg(long, conflicts_with_all = ["state", "custom"])]
        clear: bool,
    },
    /// Entry-sheet version commands
    Es {
        #[command(subcommand)]
        subcommand: EsCommands,
    },
    /// Show dashboard with selection counts and upcoming deadlines
    Dashboard {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the deadlines of a month
    Calendar {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Rewrite legacy status values in the current format
    Migrate {
        /// Only list the companies that would change
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the history of company and ES changes, newest first
    Log {
        /// Number of entries to show (0 for all)
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // `shukatsu 3` is shorthand for `shukatsu show 3`
    if args.len() == 1 && validate_company_id(&args[0]).is_ok() {
        args.insert(0, "show".to_string());
    }

    let clap_args = std::iter::once("shukatsu".to_string())
        .chain(args)
        .collect::<Vec<_>>();
    let cli = match Cli::try_parse_from(clap_args) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Add { name, role, route, deadline, memo, status } => {
            handle_company_add(name, role, route, deadline, memo, status)
        }
        Commands::List { search, filter, sort, json } => handle_company_list(search, filter, sort, json),
        Commands::Show { id, json } => handle_company_show(id, json),
        Commands::Modify { id, name, role, route, deadline, memo } => {
            handle_company_modify(id, name, role, route, deadline, memo)
        }
        Commands::Delete { id, yes } => handle_company_delete(id, yes),
        Commands::Stage { id, stage, state, custom, clear } => handle_stage(id, stage, state, custom, clear),
        Commands::Es { subcommand } => handle_es(subcommand),
        Commands::Dashboard { json } => handle_dashboard(json),
        Commands::Calendar { month } => handle_calendar(month),
        Commands::Migrate { dry_run } => handle_migrate(dry_run),
        Commands::Log { limit, json } => handle_log(limit, json),
    }
}

/// Ask a yes/no question on stdout. Anything but y/yes (including EOF) is no.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    use std::io::{self, Write};
    print!("{} (y/n): ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Load a company or exit with a user error
fn load_company(conn: &Connection, id_str: &str) -> Result<Company> {
    let id = validate_company_id(id_str).unwrap_or_else(|e| user_error(&e));
    match CompanyRepo::get_by_id(conn, id)? {
        Some(company) => Ok(company),
        None => user_error(&format!("Company {} not found", id)),
    }
}

/// Select `key` on top of `current` from command-line input
fn apply_stage(
    current: &StatusData,
    key: StageKey,
    state: Option<&str>,
    custom: Option<&str>,
) -> Result<StatusData, StatusError> {
    if custom.is_some() && !key.definition().allows_custom {
        return Err(StatusError::CustomNotAllowed(key));
    }

    let value = if key.has_state() {
        let state = state.ok_or(StatusError::StateRequired(key))?;
        StageState::parse(state)?
    } else {
        // Offer is a terminal stage and is always stored as done
        if let Some(state) = state {
            StageState::parse(state)?;
        }
        StageState::Done
    };

    let next = status::set_active_stage(current, key, Some(value.as_str()));
    Ok(match custom {
        Some(custom) => status::set_other_custom(&next, custom),
        None => next,
    })
}

/// Parse `STAGE[:STATE]`
fn parse_stage_spec(spec: &str) -> Result<StatusData, StatusError> {
    let (stage, state) = match spec.split_once(':') {
        Some((stage, state)) => (stage, Some(state)),
        None => (spec, None),
    };
    let key: StageKey = stage.parse()?;
    let state = match state {
        Some(state) => StageState::parse(state)?,
        None if key.has_state() => return Err(StatusError::StateRequired(key)),
        None => StageState::Done,
    };
    Ok(StatusData::from_stage(&Stage::from_parts(key, state, None)))
}

fn parse_deadline_arg(expr: &str) -> Option<chrono::NaiveDate> {
    match parse_optional_date(expr) {
        Ok(date) => date,
        Err(e) => user_error(&e.to_string()),
    }
}

fn handle_company_add(
    name: String,
    role: Option<String>,
    route: Option<String>,
    deadline: Option<String>,
    memo: Option<String>,
    status_spec: Option<String>,
) -> Result<()> {
    if let Err(e) = validate_non_empty(&name, "Company name") {
        user_error(&e);
    }

    let mut company = Company::new(name.trim().to_string());
    company.job_role = role.unwrap_or_default();
    company.apply_route = route.unwrap_or_default();
    company.memo = memo.unwrap_or_default();
    if let Some(expr) = deadline {
        company.deadline = match parse_date_expr(&expr) {
            Ok(date) => Some(date),
            Err(e) => user_error(&e.to_string()),
        };
    }
    if let Some(spec) = status_spec {
        let data = parse_stage_spec(&spec).unwrap_or_else(|e| user_error(&e.to_string()));
        company.status_text = status::serialize(&data);
    }

    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let created = CompanyRepo::create(&conn, &company)
        .context("Failed to create company")?;

    let id = created.id.unwrap_or_default();
    println!("Created company {}: {}", id, created.name);
    Ok(())
}

fn handle_company_list(search: Option<String>, filter: String, sort: String, json: bool) -> Result<()> {
    let filter: StatusFilter = filter.parse().unwrap_or_else(|e: crate::filter::UnknownFilter| user_error(&e.to_string()));
    let ordering = CompanyOrdering::from_str(&sort)
        .unwrap_or_else(|| user_error(&format!("Unknown sort '{}'. Use updated, deadline or name", sort)));

    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let companies = CompanyRepo::list(&conn, ordering)
        .context("Failed to list companies")?;
    let companies = filter_companies(companies, search.as_deref(), filter);
    let today = deadline::today();

    if json {
        let json_companies: Vec<serde_json::Value> = companies
            .iter()
            .map(|c| company_json(c, today))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_companies)?);
    } else {
        print!("{}", format_company_table(&companies, today, is_tty()));
    }
    Ok(())
}

fn handle_company_show(id: String, json: bool) -> Result<()> {
    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let company = load_company(&conn, &id)?;
    let es_versions = EsRepo::list(&conn, company.id)?;
    let today = deadline::today();

    if json {
        let mut value = company_json(&company, today);
        value["es_versions"] = es_versions.iter().map(es_json).collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", format_company_summary(&company, &es_versions, today, is_tty()));
    }
    Ok(())
}

fn handle_company_modify(
    id: String,
    name: Option<String>,
    role: Option<String>,
    route: Option<String>,
    deadline: Option<String>,
    memo: Option<String>,
) -> Result<()> {
    if let Some(name) = &name {
        if let Err(e) = validate_non_empty(name, "Company name") {
            user_error(&e);
        }
    }
    let update = CompanyUpdate {
        name: name.map(|n| n.trim().to_string()),
        job_role: role,
        apply_route: route,
        deadline: deadline.map(|expr| parse_deadline_arg(&expr)),
        memo,
    };
    if update.is_empty() {
        user_error("No changes specified. Use --name, --role, --route, --deadline or --memo");
    }

    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let company = load_company(&conn, &id)?;
    let company_id = company.id.unwrap_or_default();
    CompanyRepo::update(&conn, company_id, &update)
        .context("Failed to modify company")?;

    println!("Modified company {}", company_id);
    Ok(())
}

fn handle_company_delete(id: String, yes: bool) -> Result<()> {
    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let company = load_company(&conn, &id)?;
    let company_id = company.id.unwrap_or_default();
    let es_count = EsRepo::count_for_company(&conn, company_id)?;

    if !yes {
        let question = if es_count > 0 {
            format!("Delete company {} ({}) and its {} ES version(s)?", company_id, company.name, es_count)
        } else {
            format!("Delete company {} ({})?", company_id, company.name)
        };
        if !confirm(&question)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    CompanyRepo::delete(&conn, company_id)
        .context("Failed to delete company")?;
    println!("Deleted company {}", company_id);
    Ok(())
}

fn handle_stage(
    id: String,
    stage: String,
    state: Option<String>,
    custom: Option<String>,
    clear: bool,
) -> Result<()> {
    let key: StageKey = stage.parse().unwrap_or_else(|e: StatusError| user_error(&e.to_string()));

    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let company = load_company(&conn, &id)?;
    let company_id = company.id.unwrap_or_default();

    let parsed = status::parse_with_origin(Some(&company.status_text));
    let next = if clear {
        status::set_active_stage(&parsed.data, key, None)
    } else {
        apply_stage(&parsed.data, key, state.as_deref(), custom.as_deref())
            .unwrap_or_else(|e| user_error(&e.to_string()))
    };

    let status_text = status::serialize(&next);
    log::debug!("Company {} stage {} -> {}", company_id, key, status_text);
    CompanyRepo::update_status_text(&conn, company_id, &status_text)
        .context("Failed to update stage")?;

    if parsed.origin.needs_migration() {
        println!("Converted legacy status '{}' to the current format.", company.status_text);
    }
    let label = status::short_label(Some(&status_text));
    if label.is_empty() {
        println!("Cleared stage of company {}", company_id);
    } else {
        println!("Company {} stage: {}", company_id, label);
    }
    Ok(())
}

fn handle_dashboard(json: bool) -> Result<()> {
    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let companies = CompanyRepo::list(&conn, CompanyOrdering::Deadline)
        .context("Failed to list companies")?;
    let today = deadline::today();

    let stats = compute_stats(&companies, today);
    let upcoming = upcoming_deadlines(&companies, today);

    if json {
        let dashboard_json = serde_json::json!({
            "today": today,
            "stats": stats,
            "upcoming": upcoming.iter().map(|c| company_json(c, today)).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&dashboard_json)?);
    } else {
        print!("{}", format_dashboard(&stats, &upcoming, today, is_tty()));
    }
    Ok(())
}

fn handle_calendar(month: Option<String>) -> Result<()> {
    let today = deadline::today();
    let (year, month) = match month {
        Some(expr) => parse_month(&expr).unwrap_or_else(|e| user_error(&e.to_string())),
        None => (today.year(), today.month()),
    };

    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let companies = CompanyRepo::list(&conn, CompanyOrdering::Deadline)
        .context("Failed to list companies")?;
    let days = deadlines_by_day(&companies, year, month);

    print!("{}", format_calendar(year, month, &days, today));
    Ok(())
}

/// Prefix for legacy status text preserved in the memo
const LEGACY_MEMO_PREFIX: &str = "[旧ステータス] ";

fn handle_migrate(dry_run: bool) -> Result<()> {
    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let companies = CompanyRepo::list(&conn, CompanyOrdering::Name)
        .context("Failed to list companies")?;

    let mut migrated = 0;
    for company in &companies {
        let parsed = status::parse_with_origin(Some(&company.status_text));
        if !parsed.origin.needs_migration() {
            continue;
        }
        let company_id = company.id.unwrap_or_default();
        let status_text = status::serialize(&parsed.data);
        println!("{}: {}: {} -> {}", company_id, company.name, company.status_text, status_text);
        migrated += 1;
        if dry_run {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        // The offer keyword wins over the rest of the text, so keep the text in the memo
        if parsed.origin == StatusOrigin::LegacyOfferText {
            let line = format!("{}{}", LEGACY_MEMO_PREFIX, company.status_text);
            let memo = if company.memo.is_empty() {
                line
            } else {
                format!("{}\n{}", company.memo, line)
            };
            let update = CompanyUpdate { memo: Some(memo), ..Default::default() };
            CompanyRepo::update(&tx, company_id, &update)?;
        }
        CompanyRepo::update_status_text(&tx, company_id, &status_text)?;
        tx.commit()
            .with_context(|| format!("Failed to migrate company {}", company_id))?;
    }

    if migrated == 0 {
        println!("No legacy statuses found.");
    } else if dry_run {
        println!("{} company(ies) would be migrated.", migrated);
    } else {
        log::debug!("Migrated {} legacy status value(s)", migrated);
        println!("Migrated {} company(ies).", migrated);
    }
    Ok(())
}

fn handle_log(limit: usize, json: bool) -> Result<()> {
    let conn = DbConnection::connect()
        .context("Failed to connect to database")?;
    let limit = if limit == 0 { None } else { Some(limit) };
    let events = EventRepo::list(&conn, limit)
        .context("Failed to read change history")?;

    if json {
        let json_events: Vec<serde_json::Value> = events.iter().map(event_json).collect();
        println!("{}", serde_json::to_string_pretty(&json_events)?);
    } else {
        print!("{}", format_event_table(&events, is_tty()));
    }
    Ok(())
}
