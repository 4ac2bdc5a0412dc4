use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ProjectId = String;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("range starts on {start} but ends on {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

#[derive(thiserror::Error, Debug)]
pub enum CalendarError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("project already exists: {0}")]
    DuplicateProject(String),
}

/// An inclusive calendar range whose start never falls after its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, LayoutError> {
        if start > end {
            return Err(LayoutError::InvertedRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        DateRange {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Length as `end - start` in days, so a one-day range is 0.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Inclusive on both ends.
    pub fn overlaps(&self, first: NaiveDate, last: NaiveDate) -> bool {
        self.start <= last && self.end >= first
    }
}

/// A date range as it arrives from the calendar file. Either end may be
/// missing, or unparseable (which reads as missing).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialRange {
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl PartialRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        PartialRange {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// `None` unless both ends are present.
    pub fn resolve(&self) -> Option<Result<DateRange, LayoutError>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Engagement,
    Event,
    TourDate,
}

impl SpanKind {
    /// Events go to the lowest lanes; every other kind shares one tier.
    pub fn lane_priority(self) -> u8 {
        match self {
            SpanKind::Event => 0,
            SpanKind::Engagement | SpanKind::TourDate => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpanKind::Engagement => "engagement",
            SpanKind::Event => "event",
            SpanKind::TourDate => "tour date",
        }
    }
}

/// A labelled date range to be laid out on a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub id: String,
    pub label: String,
    pub kind: SpanKind,
    pub range: DateRange,
    pub color: Option<String>,
    pub owner_id: ProjectId,
}

impl Span {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        kind: SpanKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, LayoutError> {
        Ok(Span {
            id: id.into(),
            label: label.into(),
            kind,
            range: DateRange::new(start, end)?,
            color: None,
            owner_id: String::new(),
        })
    }

    pub fn with_owner(mut self, owner_id: impl Into<ProjectId>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    pub fn start(&self) -> NaiveDate {
        self.range.start()
    }

    pub fn end(&self) -> NaiveDate {
        self.range.end()
    }

    pub fn duration_days(&self) -> i64 {
        self.range.duration_days()
    }

    pub fn overlaps(&self, first: NaiveDate, last: NaiveDate) -> bool {
        self.range.overlaps(first, last)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TourDate {
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "PartialRange::is_empty")]
    pub engagement: PartialRange,
    #[serde(default, skip_serializing_if = "PartialRange::is_empty")]
    pub event: PartialRange,
    #[serde(default)]
    pub is_tour: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tour_dates: Vec<TourDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_events: Vec<SubEvent>,
    #[serde(default)]
    pub archived: bool,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>) -> Self {
        Project {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A workback item; its owning project is the key it is filed under.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkbackTask {
    pub id: String,
    pub label: String,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub done: bool,
}

impl WorkbackTask {
    pub fn new(id: impl Into<String>, label: impl Into<String>, date: NaiveDate) -> Self {
        WorkbackTask {
            id: id.into(),
            label: label.into(),
            date: Some(date),
            done: false,
        }
    }
}

/// How the month view stacks overlapping spans.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LanePolicy {
    /// One lane per span in sort order, never reused.
    #[default]
    Stacked,
    /// Lowest lane whose occupants leave the span's columns free.
    Packed,
}

impl LanePolicy {
    pub fn label(self) -> &'static str {
        match self {
            LanePolicy::Stacked => "stacked",
            LanePolicy::Packed => "packed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            LanePolicy::Stacked => LanePolicy::Packed,
            LanePolicy::Packed => LanePolicy::Stacked,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub lane_policy: LanePolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CalendarFile {
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub workback: BTreeMap<ProjectId, Vec<WorkbackTask>>,
}

impl CalendarFile {
    pub fn default_named(name: impl Into<String>) -> Self {
        CalendarFile {
            name: name.into(),
            settings: Settings::default(),
            projects: Vec::new(),
            workback: BTreeMap::new(),
        }
    }

    pub fn find_project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn active_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| !p.archived)
    }

    pub fn tasks_for(&self, project_id: &str) -> &[WorkbackTask] {
        self.workback
            .get(project_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn add_project(&mut self, project: Project) -> Result<(), CalendarError> {
        if self.find_project(&project.id).is_some() {
            return Err(CalendarError::DuplicateProject(project.id));
        }
        self.projects.push(project);
        Ok(())
    }

    pub fn add_task(&mut self, project_id: &str, task: WorkbackTask) -> Result<(), CalendarError> {
        if self.find_project(project_id).is_none() {
            return Err(CalendarError::ProjectNotFound(project_id.to_string()));
        }
        self.workback
            .entry(project_id.to_string())
            .or_default()
            .push(task);
        Ok(())
    }

    pub fn archive_project(&mut self, project_id: &str) -> Result<(), CalendarError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| CalendarError::ProjectNotFound(project_id.to_string()))?;
        project.archived = true;
        Ok(())
    }
}

/// Parses `YYYY-MM-DD`; un-padded months and days are accepted.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde helper: dates that fail to parse deserialize as `None`.
mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        date.map(super::format_date).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::new(date("2026-01-09"), date("2026-01-05")).unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvertedRange {
                start: date("2026-01-09"),
                end: date("2026-01-05"),
            }
        );
        assert!(Span::new("x", "x", SpanKind::Event, date("2026-01-09"), date("2026-01-05")).is_err());
    }

    #[test]
    fn overlap_is_inclusive_on_both_ends() {
        let range = DateRange::new(date("2026-01-05"), date("2026-01-09")).unwrap();
        assert!(range.overlaps(date("2026-01-09"), date("2026-01-12")));
        assert!(range.overlaps(date("2026-01-01"), date("2026-01-05")));
        assert!(!range.overlaps(date("2026-01-10"), date("2026-01-12")));
        assert_eq!(range.duration_days(), 4);
        assert_eq!(DateRange::single(date("2026-01-05")).duration_days(), 0);
    }

    #[test]
    fn unpadded_dates_parse() {
        assert_eq!(parse_date("2026-1-5"), Some(date("2026-01-05")));
        assert_eq!(parse_date("05/01/2026"), None);
    }

    #[test]
    fn malformed_dates_load_as_missing() {
        let yaml = r#"
name: demo
projects:
  - id: gala
    name: Spring Gala
    engagement:
      start: "2026-03-01"
      end: "sometime in march"
    event:
      start: 2026-03-20
      end: 2026-03-21
"#;
        let calendar: CalendarFile = serde_yaml::from_str(yaml).unwrap();
        let gala = calendar.find_project("gala").unwrap();
        assert_eq!(gala.engagement.start, Some(date("2026-03-01")));
        assert_eq!(gala.engagement.end, None);
        assert!(gala.engagement.resolve().is_none());
        assert_eq!(
            gala.event.resolve(),
            Some(DateRange::new(date("2026-03-20"), date("2026-03-21")))
        );
        assert_eq!(calendar.settings.lane_policy, LanePolicy::Stacked);
    }

    #[test]
    fn add_task_requires_known_project() {
        let mut calendar = CalendarFile::default_named("demo");
        calendar.add_project(Project::new("gala", "Gala")).unwrap();
        let err = calendar
            .add_task("nope", WorkbackTask::new("t1", "Book venue", date("2026-02-01")))
            .unwrap_err();
        assert!(matches!(err, CalendarError::ProjectNotFound(id) if id == "nope"));

        calendar
            .add_task("gala", WorkbackTask::new("t1", "Book venue", date("2026-02-01")))
            .unwrap();
        assert_eq!(calendar.tasks_for("gala").len(), 1);
        assert!(calendar.tasks_for("other").is_empty());
    }

    #[test]
    fn duplicate_projects_and_archiving() {
        let mut calendar = CalendarFile::default_named("demo");
        calendar.add_project(Project::new("gala", "Gala")).unwrap();
        assert!(matches!(
            calendar.add_project(Project::new("gala", "Again")),
            Err(CalendarError::DuplicateProject(_))
        ));
        calendar.archive_project("gala").unwrap();
        assert_eq!(calendar.active_projects().count(), 0);
        assert!(calendar.archive_project("missing").is_err());
    }
}
