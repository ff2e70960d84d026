// Occurrence module
// One date-bound materialization of a calendar incidence

use chrono::{DateTime, Duration, Local, NaiveDate};

/// Stable identity of one occurrence. A recurring incidence materializes
/// many occurrences, so the occurrence date is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceId {
    pub incidence_id: i64,
    pub date: NaiveDate,
}

impl OccurrenceId {
    pub fn new(incidence_id: i64, date: NaiveDate) -> Self {
        Self { incidence_id, date }
    }
}

impl std::fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.incidence_id, self.date)
    }
}

/// Kind of the underlying incidence. Behavior differences are selected by
/// matching on the tag: to-dos have no end-anchored resize, journals are
/// point-like and cannot be resized at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidenceKind {
    Event,
    Todo,
    Journal,
}

impl IncidenceKind {
    /// Whether the end edge (bottom/right) of an item may be dragged.
    pub fn supports_end_resize(&self) -> bool {
        matches!(self, IncidenceKind::Event)
    }

    /// Whether the start edge (top/left) of an item may be dragged.
    pub fn supports_start_resize(&self) -> bool {
        matches!(self, IncidenceKind::Event | IncidenceKind::Todo)
    }
}

/// One calendar item's materialization on a specific date.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub id: OccurrenceId,
    pub kind: IncidenceKind,
    pub title: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub all_day: bool,
    pub read_only: bool,
    pub recurs: bool,
    pub color_key: Option<String>,
}

impl Occurrence {
    /// Create a new occurrence. A malformed span (end before start) is
    /// clamped here, at the point of construction, and never propagated.
    pub fn new(
        id: OccurrenceId,
        title: impl Into<String>,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Self {
        let end = if end < start {
            log::warn!("occurrence {} has end before start, clamping", id);
            start
        } else {
            end
        };
        Self {
            id,
            kind: IncidenceKind::Event,
            title: title.into(),
            start,
            end,
            all_day: false,
            read_only: false,
            recurs: false,
            color_key: None,
        }
    }

    /// Create a builder for constructing occurrences with optional fields.
    pub fn builder() -> OccurrenceBuilder {
        OccurrenceBuilder::new()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// True if the occurrence visually spans more than one day.
    pub fn is_multi_day(&self) -> bool {
        self.first_day() != self.last_day()
    }

    pub fn covers_date(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }
}

/// Builder for occurrences with optional fields.
pub struct OccurrenceBuilder {
    incidence_id: Option<i64>,
    date: Option<NaiveDate>,
    kind: IncidenceKind,
    title: Option<String>,
    start: Option<DateTime<Local>>,
    end: Option<DateTime<Local>>,
    all_day: bool,
    read_only: bool,
    recurs: bool,
    color_key: Option<String>,
}

impl OccurrenceBuilder {
    pub fn new() -> Self {
        Self {
            incidence_id: None,
            date: None,
            kind: IncidenceKind::Event,
            title: None,
            start: None,
            end: None,
            all_day: false,
            read_only: false,
            recurs: false,
            color_key: None,
        }
    }

    pub fn incidence_id(mut self, id: i64) -> Self {
        self.incidence_id = Some(id);
        self
    }

    /// Occurrence date. Defaults to the start date when not given.
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn kind(mut self, kind: IncidenceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn start(mut self, start: DateTime<Local>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Local>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn recurs(mut self, recurs: bool) -> Self {
        self.recurs = recurs;
        self
    }

    pub fn color_key(mut self, key: impl Into<String>) -> Self {
        self.color_key = Some(key.into());
        self
    }

    pub fn build(self) -> Result<Occurrence, String> {
        let incidence_id = self.incidence_id.ok_or("Occurrence incidence id is required")?;
        let title = self.title.ok_or("Occurrence title is required")?;
        let start = self.start.ok_or("Occurrence start time is required")?;
        let end = self.end.ok_or("Occurrence end time is required")?;
        let date = self.date.unwrap_or_else(|| start.date_naive());

        let mut occurrence =
            Occurrence::new(OccurrenceId::new(incidence_id, date), title, start, end);
        occurrence.kind = self.kind;
        occurrence.all_day = self.all_day;
        occurrence.read_only = self.read_only;
        occurrence.recurs = self.recurs;
        occurrence.color_key = self.color_key;
        Ok(occurrence)
    }
}

impl Default for OccurrenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_new_clamps_inverted_span() {
        let start = at(2026, 3, 10, 12, 0);
        let end = at(2026, 3, 10, 10, 0);
        let occ = Occurrence::new(OccurrenceId::new(1, start.date_naive()), "X", start, end);
        assert_eq!(occ.start, occ.end);
    }

    #[test]
    fn test_multi_day_detection() {
        let occ = Occurrence::new(
            OccurrenceId::new(1, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()),
            "Trip",
            at(2026, 3, 10, 18, 0),
            at(2026, 3, 12, 9, 0),
        );
        assert!(occ.is_multi_day());
        assert!(occ.covers_date(NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()));
        assert!(!occ.covers_date(NaiveDate::from_ymd_opt(2026, 3, 13).unwrap()));
    }

    #[test]
    fn test_builder_requires_core_fields() {
        let result = Occurrence::builder().title("No times").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_defaults_date_to_start_day() {
        let start = at(2026, 3, 10, 9, 0);
        let occ = Occurrence::builder()
            .incidence_id(7)
            .title("Standup")
            .start(start)
            .end(start + Duration::minutes(30))
            .build()
            .unwrap();
        assert_eq!(occ.id.date, start.date_naive());
        assert_eq!(occ.kind, IncidenceKind::Event);
    }

    #[test]
    fn test_todo_has_no_end_resize() {
        assert!(!IncidenceKind::Todo.supports_end_resize());
        assert!(IncidenceKind::Todo.supports_start_resize());
        assert!(!IncidenceKind::Journal.supports_start_resize());
    }
}
