use crate::model::{DateRange, PartialRange, Project, ProjectId, WorkbackTask};
use crate::spans::EVENT_PREFIX;
use chrono::{Days, NaiveDate};
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};

/// Row kinds in render priority order; the derived `Ord` is the sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowKind {
    Project,
    Event,
    SubEvent,
}

impl RowKind {
    pub fn label(self) -> &'static str {
        match self {
            RowKind::Project => "project",
            RowKind::Event => "event",
            RowKind::SubEvent => "subevent",
        }
    }
}

/// A run of consecutive days shown as columns: one for the day view, seven
/// for the week view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GanttWindow {
    pub start: NaiveDate,
    pub days: u32,
}

impl GanttWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        GanttWindow {
            start,
            days: days.max(1),
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        GanttWindow::new(date, 1)
    }

    pub fn week(start: NaiveDate) -> Self {
        GanttWindow::new(start, 7)
    }

    pub fn last(&self) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(u64::from(self.days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take(self.days as usize)
            .collect()
    }

    pub fn column_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date > self.last() {
            return None;
        }
        Some((date - self.start).num_days() as usize)
    }

    /// `(start_col, span)` of the part of `range` inside the window.
    fn clip(&self, range: &DateRange) -> Option<(usize, usize)> {
        let last = self.last();
        if !range.overlaps(self.start, last) {
            return None;
        }
        let first = range.start().max(self.start);
        let end = range.end().min(last);
        let start_col = (first - self.start).num_days() as usize;
        let span = (end - first).num_days() as usize + 1;
        Some((start_col, span))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GanttRow {
    pub kind: RowKind,
    pub label: String,
    pub start_col: usize,
    pub span: usize,
    pub project_id: ProjectId,
    pub lane: usize,
    pub color: Option<String>,
}

/// A workback marker drawn on top of its project's first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GanttOverlay {
    pub task_id: String,
    pub project_id: ProjectId,
    pub label: String,
    pub col: usize,
    pub lane: usize,
    pub done: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GanttLayout {
    pub rows: Vec<GanttRow>,
    pub overlays: Vec<GanttOverlay>,
}

impl GanttLayout {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn overlays_on(&self, lane: usize) -> impl Iterator<Item = &GanttOverlay> {
        self.overlays.iter().filter(move |o| o.lane == lane)
    }
}

/// Lays out the day/week view.
///
/// Each non-archived project contributes an engagement row, an event row
/// (non-tours only) and a one-day row per sub-event or tour date, whenever
/// those intersect the window. Rows are ordered by kind, then project order.
/// Workback tasks become overlays on their project's first row; tasks whose
/// project has no row in this window are not shown.
pub fn build_gantt(
    projects: &[Project],
    workback: &BTreeMap<ProjectId, Vec<WorkbackTask>>,
    window: &GanttWindow,
) -> GanttLayout {
    let mut rows = Vec::new();
    for project in projects.iter().filter(|p| !p.archived) {
        if let Some(row) = range_row(window, project, RowKind::Project, &project.engagement) {
            rows.push(row);
        }
        if !project.is_tour {
            if let Some(row) = range_row(window, project, RowKind::Event, &project.event) {
                rows.push(row);
            }
        }
        for sub in &project.sub_events {
            if let Some(row) = day_row(window, project, sub.date, sub.label.clone()) {
                rows.push(row);
            }
        }
        if project.is_tour {
            for stop in &project.tour_dates {
                let label = stop
                    .label
                    .clone()
                    .unwrap_or_else(|| project.name.clone());
                if let Some(row) = day_row(window, project, stop.date, format!("♪ {}", label)) {
                    rows.push(row);
                }
            }
        }
    }

    rows.sort_by_key(|row| row.kind);
    let mut first_lane: HashMap<&str, usize> = HashMap::new();
    for (lane, row) in rows.iter_mut().enumerate() {
        row.lane = lane;
    }
    for row in &rows {
        first_lane.entry(row.project_id.as_str()).or_insert(row.lane);
    }

    let mut overlays = Vec::new();
    for (project_id, tasks) in workback {
        for task in tasks {
            let col = match task.date.and_then(|date| window.column_of(date)) {
                Some(col) => col,
                None => continue,
            };
            // TODO: collect these into an "unscheduled" list once the calendar
            // has somewhere to show tasks without a row in view.
            let lane = match first_lane.get(project_id.as_str()) {
                Some(&lane) => lane,
                None => {
                    trace!("task {} of {} has no row in view", task.id, project_id);
                    continue;
                }
            };
            overlays.push(GanttOverlay {
                task_id: task.id.clone(),
                project_id: project_id.clone(),
                label: task.label.clone(),
                col,
                lane,
                done: task.done,
            });
        }
    }

    debug!(
        "gantt {}..{}: {} rows, {} overlays",
        window.start,
        window.last(),
        rows.len(),
        overlays.len()
    );
    GanttLayout { rows, overlays }
}

fn range_row(
    window: &GanttWindow,
    project: &Project,
    kind: RowKind,
    range: &PartialRange,
) -> Option<GanttRow> {
    let range = range.resolve()?.ok()?;
    let (start_col, span) = window.clip(&range)?;
    let label = match kind {
        RowKind::Event => format!("{}{}", EVENT_PREFIX, project.name),
        _ => project.name.clone(),
    };
    Some(GanttRow {
        kind,
        label,
        start_col,
        span,
        project_id: project.id.clone(),
        lane: 0,
        color: project.color.clone(),
    })
}

fn day_row(
    window: &GanttWindow,
    project: &Project,
    date: Option<NaiveDate>,
    label: String,
) -> Option<GanttRow> {
    let start_col = window.column_of(date?)?;
    Some(GanttRow {
        kind: RowKind::SubEvent,
        label,
        start_col,
        span: 1,
        project_id: project.id.clone(),
        lane: 0,
        color: project.color.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_date, SubEvent, TourDate};

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn range(start: &str, end: &str) -> PartialRange {
        PartialRange::new(date(start), date(end))
    }

    fn week() -> GanttWindow {
        GanttWindow::week(date("2026-01-04"))
    }

    fn gala() -> Project {
        let mut gala = Project::new("gala", "Gala");
        gala.engagement = range("2025-12-01", "2026-01-07");
        gala.event = range("2026-01-09", "2026-01-12");
        gala.sub_events.push(SubEvent {
            id: "walk".into(),
            date: parse_date("2026-01-08"),
            label: "Walkthrough".into(),
        });
        gala
    }

    #[test]
    fn window_columns_and_clipping() {
        let window = week();
        assert_eq!(window.last(), date("2026-01-10"));
        assert_eq!(window.column_of(date("2026-01-04")), Some(0));
        assert_eq!(window.column_of(date("2026-01-11")), None);
        assert_eq!(window.dates().len(), 7);
        assert_eq!(GanttWindow::new(date("2026-01-04"), 0).days, 1);
    }

    #[test]
    fn rows_follow_kind_priority_then_project_order() {
        let mut launch = Project::new("launch", "Launch");
        launch.engagement = range("2026-01-06", "2026-01-06");
        launch.event = range("2026-01-05", "2026-01-05");

        let layout = build_gantt(&[gala(), launch], &BTreeMap::new(), &week());
        let summary: Vec<(RowKind, &str, usize, usize)> = layout
            .rows
            .iter()
            .map(|r| (r.kind, r.project_id.as_str(), r.start_col, r.span))
            .collect();
        assert_eq!(
            summary,
            [
                (RowKind::Project, "gala", 0, 4),
                (RowKind::Project, "launch", 2, 1),
                (RowKind::Event, "gala", 5, 2),
                (RowKind::Event, "launch", 1, 1),
                (RowKind::SubEvent, "gala", 4, 1),
            ]
        );
        assert!(layout.rows.iter().enumerate().all(|(i, r)| r.lane == i));
        assert_eq!(layout.rows[2].label, "★ EVENT: Gala");
    }

    #[test]
    fn tour_dates_are_single_day_rows_and_tour_events_are_skipped() {
        let mut tour = Project::new("tour", "Arena Tour");
        tour.is_tour = true;
        tour.event = range("2026-01-05", "2026-01-06");
        tour.tour_dates.push(TourDate {
            date: parse_date("2026-01-07"),
            label: Some("Berlin".into()),
        });
        tour.tour_dates.push(TourDate {
            date: parse_date("2026-02-07"),
            label: None,
        });

        let layout = build_gantt(&[tour], &BTreeMap::new(), &week());
        assert_eq!(layout.rows.len(), 1);
        assert_eq!(layout.rows[0].kind, RowKind::SubEvent);
        assert_eq!(layout.rows[0].label, "♪ Berlin");
        assert_eq!(layout.rows[0].start_col, 3);
    }

    #[test]
    fn overlays_sit_on_the_project_first_row() {
        let mut workback = BTreeMap::new();
        workback.insert(
            "gala".to_string(),
            vec![
                WorkbackTask::new("t1", "Print badges", date("2026-01-06")),
                WorkbackTask::new("t2", "Out of view", date("2026-02-01")),
            ],
        );
        let mut launch = Project::new("launch", "Launch");
        launch.event = range("2026-01-05", "2026-01-05");

        let layout = build_gantt(&[launch, gala()], &workback, &week());
        assert_eq!(layout.overlays.len(), 1);
        let overlay = &layout.overlays[0];
        assert_eq!(overlay.task_id, "t1");
        assert_eq!(overlay.col, 2);
        // gala's engagement row sorts above launch's event row
        assert_eq!(overlay.lane, 0);
        assert_eq!(layout.overlays_on(0).count(), 1);
    }

    #[test]
    fn day_view_uses_a_single_column() {
        let layout = build_gantt(&[gala()], &BTreeMap::new(), &GanttWindow::day(date("2026-01-08")));
        let kinds: Vec<RowKind> = layout.rows.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, [RowKind::SubEvent]);
        assert_eq!((layout.rows[0].start_col, layout.rows[0].span), (0, 1));
    }
}
