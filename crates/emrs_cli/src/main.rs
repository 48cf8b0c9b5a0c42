//! Records-management admin CLI.
//!
//! # Responsibility
//! - Exercise the records core against a local SQLite file from a shell.
//! - Keep output line-oriented and deterministic for scripting.

use clap::{Parser, Subcommand};
use emrs_core::db::{open_db, open_db_in_memory};
use emrs_core::{
    init_logging_from_config, AuditQuery, AuditStore, CoreConfig, Department, DepartmentService,
    Employee, EmployeeService, EmploymentStatus, InvocationContext, SqliteAuditStore,
};
use log::info;
use rusqlite::Connection;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "emrs", version, about = "Employee records batch/audit tooling")]
struct Cli {
    /// SQLite database file; overrides EMRS_DB_PATH. In-memory when unset.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Rows per flush+clear cycle; overrides EMRS_BATCH_SIZE.
    #[arg(long, global = true)]
    batch_size: Option<std::num::NonZeroUsize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints health and version.
    Ping,
    /// Inserts generated departments and employees.
    Seed {
        #[arg(long, default_value_t = 3)]
        departments: usize,
        #[arg(long, default_value_t = 25)]
        employees: usize,
    },
    /// Prints one id-ordered page of employees.
    Page {
        #[arg(long, default_value_t = 0)]
        page: i64,
        #[arg(long, default_value_t = 10)]
        size: i64,
    },
    /// Lists audit records.
    Audit {
        #[arg(long)]
        operation: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch.chunk_size = batch_size;
    }
    init_logging_from_config(&config)?;

    if let Command::Ping = cli.command {
        println!("emrs_core ping={}", emrs_core::ping());
        println!("emrs_core version={}", emrs_core::core_version());
        return Ok(());
    }

    let conn = match config.db_path.as_ref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let ctx = InvocationContext::anonymous(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));

    match cli.command {
        Command::Ping => {}
        Command::Seed {
            departments,
            employees,
        } => seed(&conn, &config, &ctx, departments, employees)?,
        Command::Page { page, size } => {
            let page = EmployeeService::new(&conn, config.batch).employees_page(page, size)?;
            println!(
                "page={} size={} total_elements={} total_pages={}",
                page.page, page.size, page.total_elements, page.total_pages
            );
            for employee in page.content {
                println!(
                    "{}\t{}\t{}\t{}",
                    employee.id.unwrap_or_default(),
                    employee.employee_number,
                    employee.full_name,
                    employee.employment_status.as_str()
                );
            }
        }
        Command::Audit { operation, limit } => {
            let records = SqliteAuditStore::new(&conn).list(&AuditQuery {
                operation,
                limit: Some(limit),
                ..AuditQuery::default()
            })?;
            for record in records {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    record.id.unwrap_or_default(),
                    record.status.as_str(),
                    record.operation,
                    record.caller_id,
                    record.ip_address,
                    record.updated_at
                );
            }
        }
    }

    Ok(())
}

fn seed(
    conn: &Connection,
    config: &CoreConfig,
    ctx: &InvocationContext,
    departments: usize,
    employees: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let created_departments = DepartmentService::new(conn, config.batch).create_departments(
        ctx,
        (0..departments.max(1))
            .map(|index| Department::new(format!("Department {}", index + 1)))
            .collect(),
    )?;
    let department_ids: Vec<i64> = created_departments
        .iter()
        .filter_map(|department| department.id)
        .collect();

    let batch = (0..employees)
        .map(|index| Employee {
            id: None,
            full_name: format!("Employee {}", index + 1),
            employee_number: 10_000 + index as i64,
            job_title: "Associate".to_string(),
            employment_status: EmploymentStatus::FullTime,
            address: format!("{} Main Street", index + 1),
            phone: format!("555-{:04}", index),
            email: format!("employee{}@example.org", index + 1),
            department_id: department_ids[index % department_ids.len()],
            created_at: None,
            updated_at: None,
        })
        .collect();
    let created = EmployeeService::new(conn, config.batch).create_employees_in_batch(ctx, batch)?;

    info!(
        "event=cli_seed module=cli status=ok departments={} employees={}",
        department_ids.len(),
        created.len()
    );
    println!(
        "seeded departments={} employees={}",
        department_ids.len(),
        created.len()
    );
    Ok(())
}
