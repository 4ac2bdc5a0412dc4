use chrono::NaiveDate;
use prodcal::layout::{build_gantt, GanttWindow, RowKind};
use prodcal::model::{parse_date, CalendarFile, PartialRange, Project, SubEvent, WorkbackTask};

fn date(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

fn calendar() -> CalendarFile {
    let mut calendar = CalendarFile::default_named("season");

    let mut gala = Project::new("gala", "Spring Gala");
    gala.engagement = PartialRange::new(date("2026-01-05"), date("2026-01-09"));
    gala.sub_events.push(SubEvent {
        id: "tasting".into(),
        date: parse_date("2026-01-07"),
        label: "Menu tasting".into(),
    });
    calendar.add_project(gala).unwrap();

    let mut summit = Project::new("summit", "Leadership Summit");
    summit.engagement = PartialRange::new(date("2026-03-01"), date("2026-03-31"));
    calendar.add_project(summit).unwrap();

    calendar
        .add_task("gala", WorkbackTask::new("badges", "Print badges", date("2026-01-08")))
        .unwrap();
    calendar
        .add_task("summit", WorkbackTask::new("deck", "Send deck", date("2026-01-06")))
        .unwrap();
    calendar
}

#[test]
fn scenario_e_task_without_a_row_is_dropped() {
    let calendar = calendar();
    let window = GanttWindow::week(date("2026-01-04"));
    let layout = build_gantt(&calendar.projects, &calendar.workback, &window);

    assert!(layout.rows.iter().all(|r| r.project_id == "gala"));
    assert!(layout.overlays.iter().all(|o| o.task_id != "deck"));
    assert_eq!(layout.overlays.len(), 1);
    assert_eq!(layout.overlays[0].task_id, "badges");
    assert_eq!(layout.overlays[0].col, 4);
}

#[test]
fn engagement_renders_above_sub_events() {
    let calendar = calendar();
    let window = GanttWindow::week(date("2026-01-04"));
    let layout = build_gantt(&calendar.projects, &calendar.workback, &window);

    let kinds: Vec<RowKind> = layout.rows.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, [RowKind::Project, RowKind::SubEvent]);
    assert_eq!((layout.rows[0].start_col, layout.rows[0].span), (1, 5));
    assert_eq!((layout.rows[1].start_col, layout.rows[1].span), (3, 1));
    assert_eq!(layout.overlays[0].lane, layout.rows[0].lane);
}

#[test]
fn archived_projects_and_their_tasks_disappear() {
    let mut calendar = calendar();
    calendar.archive_project("gala").unwrap();
    let window = GanttWindow::week(date("2026-01-04"));
    let layout = build_gantt(&calendar.projects, &calendar.workback, &window);
    assert!(layout.rows.is_empty());
    assert!(layout.overlays.is_empty());
}

#[test]
fn layout_is_a_pure_function_of_its_inputs() {
    let calendar = calendar();
    let window = GanttWindow::day(date("2026-01-08"));
    let first = build_gantt(&calendar.projects, &calendar.workback, &window);
    let second = build_gantt(&calendar.projects, &calendar.workback, &window);
    assert_eq!(first, second);
    assert_eq!(first.rows.len(), 1);
    assert_eq!(first.overlays[0].col, 0);
}
