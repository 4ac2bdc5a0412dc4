use crate::model::{PartialRange, Project, Span, SpanKind};
use log::{trace, warn};

pub const EVENT_PREFIX: &str = "★ EVENT: ";

/// Flattens projects into month-view spans, in project order.
///
/// Archived projects contribute nothing. Engagement and event ranges are
/// judged independently: a range missing either end is skipped, and so is an
/// inverted one. Tour dates are single-day markers and stay out of this list.
pub fn extract_spans(projects: &[Project]) -> Vec<Span> {
    let mut spans = Vec::new();
    for project in projects.iter().filter(|p| !p.archived) {
        push_range(
            &mut spans,
            project,
            SpanKind::Engagement,
            project.name.clone(),
            &project.engagement,
        );
        if !project.is_tour {
            push_range(
                &mut spans,
                project,
                SpanKind::Event,
                format!("{}{}", EVENT_PREFIX, project.name),
                &project.event,
            );
        }
    }
    trace!("extracted {} spans from {} projects", spans.len(), projects.len());
    spans
}

pub fn span_id(project_id: &str, kind: SpanKind) -> String {
    match kind {
        SpanKind::Engagement => format!("{}:engagement", project_id),
        SpanKind::Event => format!("{}:event", project_id),
        SpanKind::TourDate => format!("{}:tour", project_id),
    }
}

fn push_range(
    spans: &mut Vec<Span>,
    project: &Project,
    kind: SpanKind,
    label: String,
    range: &PartialRange,
) {
    let (start, end) = match (range.start, range.end) {
        (Some(start), Some(end)) => (start, end),
        _ => return,
    };
    match Span::new(span_id(&project.id, kind), label, kind, start, end) {
        Ok(span) => spans.push(
            span.with_owner(project.id.clone())
                .with_color(project.color.clone()),
        ),
        Err(err) => warn!("dropping {} of project {}: {}", kind.label(), project.id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_date, TourDate};

    fn range(start: &str, end: &str) -> PartialRange {
        PartialRange::new(parse_date(start).unwrap(), parse_date(end).unwrap())
    }

    #[test]
    fn engagement_and_event_are_emitted_in_project_order() {
        let mut gala = Project::new("gala", "Spring Gala");
        gala.engagement = range("2026-03-01", "2026-03-31");
        gala.event = range("2026-03-20", "2026-03-21");
        let mut launch = Project::new("launch", "Product Launch");
        launch.engagement = range("2026-02-01", "2026-02-10");

        let spans = extract_spans(&[gala, launch]);
        let ids: Vec<&str> = spans.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["gala:engagement", "gala:event", "launch:engagement"]);
        assert_eq!(spans[0].label, "Spring Gala");
        assert_eq!(spans[1].label, "★ EVENT: Spring Gala");
        assert_eq!(spans[1].kind, SpanKind::Event);
        assert_eq!(spans[2].owner_id, "launch");
    }

    #[test]
    fn tours_and_archived_projects_are_filtered() {
        let mut tour = Project::new("tour", "Arena Tour");
        tour.is_tour = true;
        tour.engagement = range("2026-05-01", "2026-06-30");
        tour.event = range("2026-05-10", "2026-05-10");
        tour.tour_dates.push(TourDate {
            date: parse_date("2026-05-12"),
            label: Some("Berlin".into()),
        });
        let mut old = Project::new("old", "Old Show");
        old.archived = true;
        old.engagement = range("2026-05-01", "2026-05-02");

        let spans = extract_spans(&[tour, old]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].id, "tour:engagement");
    }

    #[test]
    fn partial_and_inverted_ranges_are_skipped() {
        let mut half = Project::new("half", "Half Dated");
        half.engagement.start = parse_date("2026-04-01");
        half.event = range("2026-04-09", "2026-04-02");
        assert!(extract_spans(&[half]).is_empty());
    }
}
