mod cli;
mod commands;
mod ui;

use anyhow::Result;
use clap::Parser;
use prodcal::logging;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let _logger = match logging::init_logging() {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("logging disabled: {:#}", err);
            None
        }
    };
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Init { name } => commands::init(name),
        cli::Command::Projects { all } => commands::projects(all),
        cli::Command::AddProject {
            name,
            engagement,
            event,
            tour,
            stops,
            color,
        } => commands::add_project(name, engagement, event, tour, stops, color),
        cli::Command::AddTask {
            project_id,
            label,
            date,
        } => commands::add_task(project_id, label, date),
        cli::Command::Archive { project_id } => commands::archive(project_id),
        cli::Command::Month { offset, packed } => commands::month(offset, packed),
        cli::Command::Gantt { day, offset } => commands::gantt(day, offset),
        cli::Command::Tui => commands::tui(),
    }
}
