use crate::model::{LanePolicy, Span};
use chrono::{Datelike, Days, NaiveDate};
use log::debug;

pub const WEEK_LEN: usize = 7;

/// Seven Sunday-first slots. `None` marks a blank outside the rendered month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekWindow {
    slots: [Option<NaiveDate>; WEEK_LEN],
}

impl WeekWindow {
    pub fn new(slots: [Option<NaiveDate>; WEEK_LEN]) -> Self {
        WeekWindow { slots }
    }

    /// Seven consecutive dates starting at `start`.
    pub fn from_start(start: NaiveDate) -> Self {
        let mut slots = [None; WEEK_LEN];
        for (idx, slot) in slots.iter_mut().enumerate() {
            *slot = start.checked_add_days(Days::new(idx as u64));
        }
        WeekWindow { slots }
    }

    pub fn slots(&self) -> &[Option<NaiveDate>; WEEK_LEN] {
        &self.slots
    }

    pub fn first_visible(&self) -> Option<NaiveDate> {
        self.slots.iter().flatten().min().copied()
    }

    pub fn last_visible(&self) -> Option<NaiveDate> {
        self.slots.iter().flatten().max().copied()
    }

    pub fn column_of(&self, date: NaiveDate) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(date))
    }

    pub fn is_blank(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// One span placed in one week. `span_index` points into the slice the
/// assignment was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneAssignment {
    pub span_index: usize,
    pub lane: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl LaneAssignment {
    pub fn span<'a>(&self, spans: &'a [Span]) -> Option<&'a Span> {
        spans.get(self.span_index)
    }

    pub fn width(&self) -> usize {
        self.end_col - self.start_col + 1
    }
}

pub fn assign_lanes(spans: &[Span], window: &WeekWindow) -> Vec<LaneAssignment> {
    assign_lanes_with(spans, window, LanePolicy::Stacked)
}

/// Places every span overlapping `window` on a lane.
///
/// Order: events first, then longer spans, then input order. Columns are
/// clipped to the window's dated slots. Under [`LanePolicy::Stacked`] the
/// output position is the lane; [`LanePolicy::Packed`] reuses the lowest lane
/// whose occupants leave the span's columns free.
pub fn assign_lanes_with(
    spans: &[Span],
    window: &WeekWindow,
    policy: LanePolicy,
) -> Vec<LaneAssignment> {
    let (first, last) = match (window.first_visible(), window.last_visible()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut visible: Vec<usize> = spans
        .iter()
        .enumerate()
        .filter(|(_, span)| span.overlaps(first, last))
        .map(|(idx, _)| idx)
        .collect();
    // sort_by is stable, so equal spans keep input order
    visible.sort_by(|&a, &b| {
        let (a, b) = (&spans[a], &spans[b]);
        a.kind
            .lane_priority()
            .cmp(&b.kind.lane_priority())
            .then_with(|| b.duration_days().cmp(&a.duration_days()))
    });

    let mut placed: Vec<LaneAssignment> = Vec::with_capacity(visible.len());
    let mut occupied: Vec<Vec<(usize, usize)>> = Vec::new();
    for span_index in visible {
        let (start_col, end_col) = match clip_columns(&spans[span_index], window) {
            Some(cols) => cols,
            None => continue,
        };
        let lane = match policy {
            LanePolicy::Stacked => placed.len(),
            LanePolicy::Packed => claim_lane(&mut occupied, start_col, end_col),
        };
        placed.push(LaneAssignment {
            span_index,
            lane,
            start_col,
            end_col,
        });
    }
    debug!(
        "week {}..{}: {} of {} spans placed ({})",
        first,
        last,
        placed.len(),
        spans.len(),
        policy.label()
    );
    placed
}

pub fn lane_count(assignments: &[LaneAssignment]) -> usize {
    assignments.iter().map(|a| a.lane + 1).max().unwrap_or(0)
}

/// Sunday-first weeks covering a month, blanks outside it.
pub fn month_weeks(year: i32, month: u32) -> Vec<WeekWindow> {
    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first,
        None => return Vec::new(),
    };
    let lead = first.weekday().num_days_from_sunday() as usize;
    let days = days_in_month(year, month) as usize;

    let mut weeks = Vec::new();
    let mut slots = [None; WEEK_LEN];
    let mut col = lead;
    for day in 1..=days {
        slots[col] = NaiveDate::from_ymd_opt(year, month, day as u32);
        col += 1;
        if col == WEEK_LEN {
            weeks.push(WeekWindow::new(slots));
            slots = [None; WEEK_LEN];
            col = 0;
        }
    }
    if col > 0 {
        weeks.push(WeekWindow::new(slots));
    }
    weeks
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

fn clip_columns(span: &Span, window: &WeekWindow) -> Option<(usize, usize)> {
    let mut cols = window
        .slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.map_or(false, |date| span.range.contains(date)))
        .map(|(idx, _)| idx);
    let start = cols.next()?;
    let end = cols.last().unwrap_or(start);
    Some((start, end))
}

fn claim_lane(occupied: &mut Vec<Vec<(usize, usize)>>, start: usize, end: usize) -> usize {
    let free = occupied
        .iter()
        .position(|lane| lane.iter().all(|&(s, e)| e < start || s > end));
    match free {
        Some(lane) => {
            occupied[lane].push((start, end));
            lane
        }
        None => {
            occupied.push(vec![(start, end)]);
            occupied.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_date, SpanKind};

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn span(id: &str, kind: SpanKind, start: &str, end: &str) -> Span {
        Span::new(id, id, kind, date(start), date(end)).unwrap()
    }

    fn week() -> WeekWindow {
        WeekWindow::from_start(date("2026-01-04"))
    }

    #[test]
    fn january_2026_grid_has_leading_blanks() {
        let weeks = month_weeks(2026, 1);
        assert_eq!(weeks.len(), 5);
        // Jan 1 2026 is a Thursday
        assert_eq!(weeks[0].slots()[..4], [None, None, None, None]);
        assert_eq!(weeks[0].slots()[4], Some(date("2026-01-01")));
        assert_eq!(weeks[1], week());
        assert_eq!(weeks[4].last_visible(), Some(date("2026-01-31")));
        assert_eq!(weeks[4].slots()[6], Some(date("2026-01-31")));
    }

    #[test]
    fn february_2026_fills_exactly_four_weeks() {
        let weeks = month_weeks(2026, 2);
        assert_eq!(weeks.len(), 4);
        assert!(weeks.iter().all(|w| w.slots().iter().all(Option::is_some)));
        assert!(month_weeks(2026, 13).is_empty());
    }

    #[test]
    fn blank_window_places_nothing() {
        let spans = vec![span("a", SpanKind::Engagement, "2026-01-01", "2026-12-31")];
        let window = WeekWindow::new([None; WEEK_LEN]);
        assert!(window.is_blank());
        assert!(assign_lanes(&spans, &window).is_empty());
    }

    #[test]
    fn partial_week_clips_to_dated_slots() {
        let spans = vec![span("a", SpanKind::Engagement, "2025-12-20", "2026-01-02")];
        let weeks = month_weeks(2026, 1);
        let placed = assign_lanes(&spans, &weeks[0]);
        assert_eq!(placed.len(), 1);
        assert_eq!((placed[0].start_col, placed[0].end_col), (4, 5));
    }

    #[test]
    fn stacked_lanes_are_never_reused() {
        let spans = vec![
            span("early", SpanKind::Engagement, "2026-01-04", "2026-01-06"),
            span("late", SpanKind::Engagement, "2026-01-08", "2026-01-10"),
        ];
        let placed = assign_lanes(&spans, &week());
        assert_eq!(placed.iter().map(|a| a.lane).collect::<Vec<_>>(), [0, 1]);
        assert_eq!(lane_count(&placed), 2);
    }

    #[test]
    fn packed_lanes_reuse_free_columns() {
        let spans = vec![
            span("long", SpanKind::Engagement, "2026-01-04", "2026-01-10"),
            span("early", SpanKind::Engagement, "2026-01-04", "2026-01-06"),
            span("late", SpanKind::Engagement, "2026-01-08", "2026-01-10"),
            span("middle", SpanKind::Engagement, "2026-01-06", "2026-01-08"),
        ];
        let placed = assign_lanes_with(&spans, &week(), LanePolicy::Packed);
        let lanes: Vec<(usize, usize)> = placed.iter().map(|a| (a.span_index, a.lane)).collect();
        assert_eq!(lanes, [(0, 0), (1, 1), (2, 1), (3, 2)]);
        assert_eq!(lane_count(&placed), 3);
    }

    #[test]
    fn equal_spans_keep_input_order() {
        let spans = vec![
            span("first", SpanKind::Engagement, "2026-01-05", "2026-01-06"),
            span("second", SpanKind::Engagement, "2026-01-07", "2026-01-08"),
        ];
        let placed = assign_lanes(&spans, &week());
        assert_eq!(placed[0].span(&spans).map(|s| s.id.as_str()), Some("first"));
        assert_eq!(placed[1].span(&spans).map(|s| s.id.as_str()), Some("second"));
        assert_eq!(placed[1].width(), 2);
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2026, 12), 31);
    }
}
