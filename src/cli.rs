use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "prodcal",
    version,
    about = "Terminal production calendar for projects, events and workback"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a calendar in the current directory
    Init {
        /// Optional calendar name
        #[arg(long)]
        name: Option<String>,
    },
    /// List projects and their date ranges
    Projects {
        /// Include archived projects
        #[arg(long)]
        all: bool,
    },
    /// Add a project
    AddProject {
        /// Project name
        name: String,
        /// Engagement range as START..END (YYYY-MM-DD or "today")
        #[arg(long)]
        engagement: Option<String>,
        /// Event range as START..END
        #[arg(long)]
        event: Option<String>,
        /// Mark the project as a tour
        #[arg(long)]
        tour: bool,
        /// Tour stop dates (repeatable, tours only)
        #[arg(long = "stop")]
        stops: Vec<String>,
        /// Display color hint
        #[arg(long)]
        color: Option<String>,
    },
    /// Add a workback task to a project
    AddTask {
        /// Owning project id
        project_id: String,
        /// Task label
        label: String,
        /// Due date (YYYY-MM-DD or "today")
        #[arg(long)]
        date: String,
    },
    /// Archive a project so it no longer appears on the calendar
    Archive {
        /// Project id to archive
        project_id: String,
    },
    /// Print the month grid lane layout
    Month {
        /// Months relative to the current one
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
        /// Reuse lanes once they free up
        #[arg(long)]
        packed: bool,
    },
    /// Print the week (or day) gantt rows
    Gantt {
        /// Lay out a single day instead of a week
        #[arg(long)]
        day: bool,
        /// Weeks (or days) relative to the current one
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },
    /// Launch the interactive calendar
    Tui,
}
