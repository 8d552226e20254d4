//! Linkboard maintenance CLI for the board store.
//!
//! Usage:
//!   linkboard stats
//!   linkboard export <file>
//!   linkboard import <file>
//!   linkboard seed <file>
//!   linkboard backups [restore <id>]

use std::process::ExitCode;

use linkboard::app::{App, AppConfig};
use linkboard::logging;
use linkboard::services::persistence_gateway::PersistenceGatewayTrait;
use linkboard::services::seed_import;

const USAGE: &str = "usage: linkboard <stats | export <file> | import <file> | seed <file> | backups [restore <id>]>";

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = AppConfig::from_env();
    let mut app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("error: cannot open {}: {}", config.db_path().display(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&mut app, &args);
    app.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run(app: &mut App, args: &[String]) -> Result<(), String> {
    let command = args.first().map(String::as_str).unwrap_or("stats");
    let arg = |n: usize| args.get(n).map(String::as_str).ok_or_else(|| USAGE.to_string());

    match command {
        "stats" => {
            let stats = app.model.state().stats();
            println!("sections: {}", stats.section_count);
            println!("links:    {}", stats.link_count);
            println!("trash:    {}", stats.trash_count);
            println!("columns:  {}", stats.columns);
            Ok(())
        }
        "export" => {
            let path = arg(1)?;
            let bytes = app.export().map_err(|e| e.to_string())?;
            std::fs::write(path, bytes).map_err(|e| format!("{}: {}", path, e))?;
            println!("exported to {}", path);
            Ok(())
        }
        "import" => {
            let path = arg(1)?;
            let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path, e))?;
            let stats = app.import(&bytes).map_err(|e| e.to_string())?;
            println!(
                "imported {} sections, {} links ({} in trash)",
                stats.section_count, stats.link_count, stats.trash_count
            );
            Ok(())
        }
        "seed" => {
            let path = arg(1)?;
            let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path, e))?;
            let records = seed_import::parse_records(&bytes).map_err(|e| e.to_string())?;
            let report = app.seed(records);
            println!(
                "added {} links, skipped {}, created {} sections",
                report.added, report.skipped, report.sections_created
            );
            Ok(())
        }
        "backups" => match args.get(1).map(String::as_str) {
            None => {
                let backups = app.persistence.list_backups().map_err(|e| e.to_string())?;
                if backups.is_empty() {
                    println!("no backups");
                }
                for b in backups {
                    println!("{}  {:<12}  {}", b.id, b.reason, b.created_at);
                }
                Ok(())
            }
            Some("restore") => {
                let id = arg(2)?;
                app.restore_backup(id).map_err(|e| e.to_string())?;
                println!("restored backup {}", id);
                Ok(())
            }
            Some(_) => Err(USAGE.to_string()),
        },
        _ => Err(USAGE.to_string()),
    }
}
