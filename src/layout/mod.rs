//! Pure calendar layout: spans and windows in, lane and row placements out.

pub mod cache;
pub mod gantt;
pub mod label;
pub mod month;

pub use cache::LayoutCache;
pub use gantt::{build_gantt, GanttLayout, GanttOverlay, GanttRow, GanttWindow, RowKind};
pub use label::{range_label, visible_range, ViewMode};
pub use month::{assign_lanes, assign_lanes_with, lane_count, month_weeks, LaneAssignment, WeekWindow};
