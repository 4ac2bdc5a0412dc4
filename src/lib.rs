pub mod layout;
pub mod logging;
pub mod model;
pub mod spans;
pub mod storage;

pub use model::{
    CalendarError, CalendarFile, DateRange, LanePolicy, LayoutError, Project, Span, SpanKind,
    WorkbackTask,
};
pub use spans::extract_spans;
