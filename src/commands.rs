use crate::ui;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use log::info;
use prodcal::layout::{
    assign_lanes_with, build_gantt, lane_count, month_weeks, range_label, visible_range,
    GanttWindow, ViewMode,
};
use prodcal::model::{
    format_date, parse_date, CalendarFile, LanePolicy, PartialRange, Project, TourDate,
    WorkbackTask,
};
use prodcal::spans::extract_spans;
use prodcal::storage::{
    init_calendar, load_calendar, locate_calendar, save_calendar, CalendarLocation,
};
use rand::{distributions::Alphanumeric, Rng};
use std::env;

pub fn init(name: Option<String>) -> Result<()> {
    let location = init_calendar(name)?;
    println!("Initialized calendar at {}", location.path.display());
    Ok(())
}

pub fn projects(all: bool) -> Result<()> {
    let (calendar, location) = load_current_calendar()?;
    println!("Calendar: {} ({})", calendar.name, location.scope.label());
    let mut shown = 0;
    for project in calendar.projects.iter().filter(|p| all || !p.archived) {
        print_project(project, calendar.tasks_for(&project.id).len());
        shown += 1;
    }
    if shown == 0 {
        println!("  (no projects)");
    }
    Ok(())
}

pub fn add_project(
    name: String,
    engagement: Option<String>,
    event: Option<String>,
    tour: bool,
    stops: Vec<String>,
    color: Option<String>,
) -> Result<()> {
    if !tour && !stops.is_empty() {
        bail!("--stop only applies to tours (add --tour)");
    }
    let (mut calendar, location) = load_current_calendar()?;
    let today = Local::now().date_naive();
    let mut project = Project::new(generate_id(), name);
    project.color = color;
    project.is_tour = tour;
    if let Some(raw) = engagement.as_deref() {
        project.engagement = parse_range_arg(raw, today).context("parsing --engagement")?;
    }
    if let Some(raw) = event.as_deref() {
        project.event = parse_range_arg(raw, today).context("parsing --event")?;
    }
    for stop in &stops {
        project.tour_dates.push(TourDate {
            date: Some(parse_date_arg(stop, today)?),
            label: None,
        });
    }
    let id = project.id.clone();
    calendar
        .add_project(project)
        .with_context(|| format!("adding project {}", id))?;
    save_calendar(&location, &calendar)?;
    info!("added project {}", id);
    println!("Added project {}", id);
    Ok(())
}

pub fn add_task(project_id: String, label: String, date: String) -> Result<()> {
    let (mut calendar, location) = load_current_calendar()?;
    let today = Local::now().date_naive();
    let date = parse_date_arg(&date, today)?;
    let id = generate_id();
    calendar
        .add_task(&project_id, WorkbackTask::new(id.clone(), label, date))
        .with_context(|| format!("adding task to project {}", project_id))?;
    save_calendar(&location, &calendar)?;
    info!("added task {} to {}", id, project_id);
    println!("Added task {} to {}", id, project_id);
    Ok(())
}

pub fn archive(project_id: String) -> Result<()> {
    let (mut calendar, location) = load_current_calendar()?;
    calendar
        .archive_project(&project_id)
        .with_context(|| format!("archiving project {}", project_id))?;
    save_calendar(&location, &calendar)?;
    println!("Archived project {}", project_id);
    Ok(())
}

pub fn month(offset: i64, packed: bool) -> Result<()> {
    let (calendar, _) = load_current_calendar()?;
    let policy = if packed {
        LanePolicy::Packed
    } else {
        calendar.settings.lane_policy
    };
    let today = Local::now().date_naive();
    for line in month_report(&calendar, offset, today, policy) {
        println!("{}", line);
    }
    Ok(())
}

pub fn gantt(day: bool, offset: i64) -> Result<()> {
    let (calendar, _) = load_current_calendar()?;
    let mode = if day { ViewMode::Day } else { ViewMode::Week };
    let today = Local::now().date_naive();
    for line in gantt_report(&calendar, mode, offset, today) {
        println!("{}", line);
    }
    Ok(())
}

pub fn tui() -> Result<()> {
    let (calendar, location) = load_current_calendar()?;
    ui::run(calendar, location)
}

fn load_current_calendar() -> Result<(CalendarFile, CalendarLocation)> {
    let cwd = env::current_dir()?;
    let location = locate_calendar(&cwd)?;
    let calendar = load_calendar(&location)?;
    Ok((calendar, location))
}

fn month_report(
    calendar: &CalendarFile,
    offset: i64,
    today: NaiveDate,
    policy: LanePolicy,
) -> Vec<String> {
    let (first, _) = visible_range(ViewMode::Month, offset, today);
    let spans = extract_spans(&calendar.projects);
    let mut lines = vec![format!(
        "{} ({} lanes)",
        range_label(ViewMode::Month, offset, today),
        policy.label()
    )];
    for week in month_weeks(first.year(), first.month()) {
        let days: String = week
            .slots()
            .iter()
            .map(|slot| match slot {
                Some(date) => format!("{:>3}", date.day()),
                None => "   ".to_string(),
            })
            .collect();
        lines.push(days);
        let placed = assign_lanes_with(&spans, &week, policy);
        for lane in 0..lane_count(&placed) {
            let mut cells = vec!["  ·"; 7];
            let mut labels = Vec::new();
            for assignment in placed.iter().filter(|a| a.lane == lane) {
                for cell in &mut cells[assignment.start_col..=assignment.end_col] {
                    *cell = "███";
                }
                if let Some(span) = assignment.span(&spans) {
                    labels.push(span.label.as_str());
                }
            }
            lines.push(format!("{}  {}", cells.concat(), labels.join(", ")));
        }
    }
    lines
}

fn gantt_report(
    calendar: &CalendarFile,
    mode: ViewMode,
    offset: i64,
    today: NaiveDate,
) -> Vec<String> {
    let (start, end) = visible_range(mode, offset, today);
    let days = (end - start).num_days() as u32 + 1;
    let window = GanttWindow::new(start, days);
    let layout = build_gantt(&calendar.projects, &calendar.workback, &window);
    let mut lines = vec![range_label(mode, offset, today)];
    if layout.is_empty() {
        lines.push("  (nothing scheduled)".to_string());
        return lines;
    }
    for row in &layout.rows {
        let mut cells = vec!["  ·"; window.days as usize];
        for cell in &mut cells[row.start_col..row.start_col + row.span] {
            *cell = "███";
        }
        for overlay in layout.overlays_on(row.lane) {
            cells[overlay.col] = "  ◆";
        }
        lines.push(format!("{}  [{}] {}", cells.concat(), row.kind.label(), row.label));
        for overlay in layout.overlays_on(row.lane) {
            let dates = window.dates();
            let when = dates
                .get(overlay.col)
                .map(|d| format_date(*d))
                .unwrap_or_default();
            let mark = if overlay.done { "x" } else { " " };
            lines.push(format!(
                "    [{}] {} {} ({})",
                mark, when, overlay.label, overlay.task_id
            ));
        }
    }
    lines
}

fn parse_date_arg(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("today") {
        return Ok(today);
    }
    parse_date(trimmed).ok_or_else(|| anyhow!("invalid date (use YYYY-MM-DD or today): {}", raw))
}

fn parse_range_arg(raw: &str, today: NaiveDate) -> Result<PartialRange> {
    let (start, end) = raw
        .split_once("..")
        .ok_or_else(|| anyhow!("invalid range (use START..END): {}", raw))?;
    let start = parse_date_arg(start, today)?;
    let end = parse_date_arg(end, today)?;
    if start > end {
        bail!("range starts after it ends: {}", raw);
    }
    Ok(PartialRange::new(start, end))
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

fn print_project(project: &Project, task_count: usize) {
    let mut flags = Vec::new();
    if project.is_tour {
        flags.push("tour");
    }
    if project.archived {
        flags.push("archived");
    }
    if flags.is_empty() {
        println!("  - {}: {}", project.id, project.name);
    } else {
        println!("  - {}: {} [{}]", project.id, project.name, flags.join(", "));
    }
    if let Some(range) = describe_range(&project.engagement) {
        println!("    engagement: {}", range);
    }
    if let Some(range) = describe_range(&project.event) {
        println!("    event: {}", range);
    }
    if !project.tour_dates.is_empty() {
        let stops: Vec<String> = project
            .tour_dates
            .iter()
            .filter_map(|t| t.date.map(format_date))
            .collect();
        println!("    stops: {}", stops.join(", "));
    }
    if task_count > 0 {
        println!("    workback: {} tasks", task_count);
    }
}

fn describe_range(range: &PartialRange) -> Option<String> {
    match (range.start, range.end) {
        (None, None) => None,
        (start, end) => Some(format!(
            "{} .. {}",
            start.map(format_date).unwrap_or_else(|| "?".into()),
            end.map(format_date).unwrap_or_else(|| "?".into())
        )),
    }
}
