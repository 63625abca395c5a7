//! Column sorting and text filtering for tabular listings.

use crate::services::challenges::LeaderboardEntry;
use crate::services::{Activity, Peak};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Current sort column and direction. No column means input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSort {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl TableSort {
    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    /// Header click: flip direction on the current column, otherwise sort
    /// ascending by the new one.
    pub fn click(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.direction = self.direction.toggled();
        } else {
            self.column = Some(column.to_string());
            self.direction = SortDirection::Ascending;
        }
    }

    /// Stable sort of `rows` by the current column. Missing values go last
    /// in either direction.
    pub fn apply<R: TableRow>(&self, rows: &mut [R]) {
        let Some(column) = self.column.as_deref() else {
            return;
        };
        let direction = self.direction;
        rows.sort_by(|a, b| {
            let (a, b) = (a.cell(column), b.cell(column));
            match (a.is_missing(), b.is_missing()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = a.compare(&b);
                    match direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                }
            }
        });
    }
}

/// A sortable cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => compare_text(a, b),
            (a, b) => compare_text(&a.to_string(), &b.to_string()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Missing, Into::into)
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Something that can be shown as a table row.
pub trait TableRow {
    /// Value of `column`, or [`CellValue::Missing`] for unknown columns.
    fn cell(&self, column: &str) -> CellValue;

    /// Text searched by [`filter_rows`].
    fn search_text(&self) -> String;
}

/// Rows whose search text contains `query`, ignoring case. A blank query
/// keeps every row.
pub fn filter_rows<'a, R: TableRow>(rows: &'a [R], query: &str) -> Vec<&'a R> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|row| row.search_text().to_lowercase().contains(&query))
        .collect()
}

// =============================================================================
// Row implementations
// =============================================================================

impl TableRow for Activity {
    fn cell(&self, column: &str) -> CellValue {
        match column {
            "name" => self.name.as_str().into(),
            "distance" => self.distance_km().into(),
            "date" | "start_date" => CellValue::Number(self.start_date.timestamp() as f64),
            "summit" | "has_summit" => CellValue::Number(f64::from(u8::from(self.has_summit))),
            _ => CellValue::Missing,
        }
    }

    fn search_text(&self) -> String {
        match &self.description {
            Some(d) => format!("{} {}", self.name, d),
            None => self.name.clone(),
        }
    }
}

impl TableRow for Peak {
    fn cell(&self, column: &str) -> CellValue {
        match column {
            "name" => self.name.as_str().into(),
            "elevation" => self.elevation_meters.into(),
            "summited" => CellValue::Number(f64::from(u8::from(self.is_summited))),
            _ => CellValue::Missing,
        }
    }

    fn search_text(&self) -> String {
        self.name.clone()
    }
}

impl TableRow for LeaderboardEntry {
    fn cell(&self, column: &str) -> CellValue {
        match column {
            "rank" => self.rank.into(),
            "name" => self.user_name.as_str().into(),
            "peaks" => self.peaks_completed.into(),
            "progress" => self.progress.into(),
            "completed" => self.completed_at.as_deref().into(),
            _ => CellValue::Missing,
        }
    }

    fn search_text(&self) -> String {
        self.user_name.clone()
    }
}
