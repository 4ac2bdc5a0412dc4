use chrono::{Datelike, Days, Duration, Months, NaiveDate};

const MAX_DAY_SHIFT: u64 = 200_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
            ViewMode::Quarter => "Quarter",
        }
    }

    /// Whether the view is drawn as month grids rather than gantt rows.
    pub fn is_grid(&self) -> bool {
        matches!(self, ViewMode::Month | ViewMode::Quarter)
    }
}

/// First and last date shown by `mode` after stepping `offset` units from
/// `today`. A step that leaves chrono's range falls back to `today`.
pub fn visible_range(mode: ViewMode, offset: i64, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match mode {
        ViewMode::Day => {
            let day = shift_days(today, offset).unwrap_or(today);
            (day, day)
        }
        ViewMode::Week => {
            let sunday = week_start(today);
            let start = offset
                .checked_mul(7)
                .and_then(|days| shift_days(sunday, days))
                .unwrap_or(sunday);
            let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
            (start, end)
        }
        ViewMode::Month => {
            let first = shift_months(month_start(today), offset);
            (first, month_end(first, 0))
        }
        ViewMode::Quarter => {
            let first = shift_months(month_start(today), offset.saturating_mul(3));
            (first, month_end(first, 2))
        }
    }
}

/// Human-readable title for the range `visible_range` returns.
pub fn range_label(mode: ViewMode, offset: i64, today: NaiveDate) -> String {
    let (start, end) = visible_range(mode, offset, today);
    match mode {
        ViewMode::Day => start.format("%A, %B %-d, %Y").to_string(),
        ViewMode::Week if start.year() == end.year() => format!(
            "{} – {}, {}",
            start.format("%b %-d"),
            end.format("%b %-d"),
            end.year()
        ),
        ViewMode::Week => format!(
            "{} – {}",
            start.format("%b %-d, %Y"),
            end.format("%b %-d, %Y")
        ),
        ViewMode::Month => start.format("%B %Y").to_string(),
        ViewMode::Quarter if start.year() == end.year() => {
            format!("{} – {} {}", start.format("%B"), end.format("%B"), end.year())
        }
        ViewMode::Quarter => format!("{} – {}", start.format("%B %Y"), end.format("%B %Y")),
    }
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    // well past chrono's representable range; Duration::days panics beyond it
    if days.unsigned_abs() > MAX_DAY_SHIFT {
        return None;
    }
    date.checked_add_signed(Duration::days(days))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn shift_months(first: NaiveDate, offset: i64) -> NaiveDate {
    let months = match u32::try_from(offset.unsigned_abs()) {
        Ok(months) => Months::new(months),
        Err(_) => return first,
    };
    let shifted = if offset >= 0 {
        first.checked_add_months(months)
    } else {
        first.checked_sub_months(months)
    };
    shifted.unwrap_or(first)
}

/// Last day of the month `extra` months after `first`'s.
fn month_end(first: NaiveDate, extra: u32) -> NaiveDate {
    first
        .checked_add_months(Months::new(extra + 1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}
