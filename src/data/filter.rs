use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Dataset, Metric, Record, TenureCategory};

// ---------------------------------------------------------------------------
// Date range written by the timeline brush
// ---------------------------------------------------------------------------

/// A brushed date range. Both ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `start < date < end`. An inverted range contains nothing.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start < date && date < self.end
    }
}

/// What a selection toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Applied,
    /// Refused: it would deselect the last remaining value.
    LastValue,
    /// Refused: the value does not occur in the dataset.
    UnknownValue,
}

// ---------------------------------------------------------------------------
// Filter state: selected values per dimension
// ---------------------------------------------------------------------------

/// Categorical dimensions the selection lists edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Tenure,
    PropertyType,
    Location,
}

/// Current selections shared by every view.
///
/// An empty set means "no filter" for that dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub tenure: BTreeSet<TenureCategory>,
    pub property_type: BTreeSet<String>,
    pub location: BTreeSet<String>,
    pub metric: Metric,
    pub date_range: Option<DateRange>,
}

impl FilterState {
    pub fn with_metric(metric: Metric) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }

    /// Full predicate: the three categorical dimensions and the date range.
    ///
    /// A record without a date never passes while a range is set.
    pub fn accepts(&self, record: &Record) -> bool {
        self.accepts_categories(record)
            && match &self.date_range {
                None => true,
                Some(range) => record.date.is_some_and(|d| range.contains(d)),
            }
    }

    /// Categorical dimensions only; the timeline uses this so brushing does
    /// not shrink its own axis.
    pub fn accepts_categories(&self, record: &Record) -> bool {
        (self.tenure.is_empty() || self.tenure.contains(&record.tenure))
            && (self.property_type.is_empty() || self.property_type.contains(&record.property_type))
            && (self.location.is_empty() || self.location.contains(&record.planning_area))
    }

    /// Whether `value` is currently shown for `dim`.
    pub fn is_selected(&self, dim: Dimension, value: &str) -> bool {
        match dim {
            Dimension::Tenure => {
                self.tenure.is_empty() || self.tenure.iter().any(|t| t.label() == value)
            }
            Dimension::PropertyType => {
                self.property_type.is_empty() || self.property_type.contains(value)
            }
            Dimension::Location => self.location.is_empty() || self.location.contains(value),
        }
    }

    /// Number of selected values for `dim` given the size of its universe.
    pub fn selected_count(&self, dim: Dimension, total: usize) -> usize {
        let n = match dim {
            Dimension::Tenure => self.tenure.len(),
            Dimension::PropertyType => self.property_type.len(),
            Dimension::Location => self.location.len(),
        };
        if n == 0 {
            total
        } else {
            n
        }
    }

    /// Toggle one value of `dim`; refused toggles leave the state unchanged.
    pub fn toggle(&mut self, dataset: &Dataset, dim: Dimension, value: &str) -> ToggleOutcome {
        match dim {
            Dimension::Tenure => {
                let Some(cat) = dataset.tenures.iter().copied().find(|t| t.label() == value) else {
                    return ToggleOutcome::UnknownValue;
                };
                toggle_in(&mut self.tenure, &dataset.tenures, cat)
            }
            Dimension::PropertyType => toggle_in(
                &mut self.property_type,
                &dataset.property_types,
                value.to_string(),
            ),
            Dimension::Location => toggle_in(
                &mut self.location,
                &dataset.planning_areas,
                value.to_string(),
            ),
        }
    }

    /// Drop every selection of `dim` ("All").
    pub fn clear(&mut self, dim: Dimension) {
        match dim {
            Dimension::Tenure => self.tenure.clear(),
            Dimension::PropertyType => self.property_type.clear(),
            Dimension::Location => self.location.clear(),
        }
    }
}

/// Toggle `value` in `selected`, where an empty set stands for `universe`.
fn toggle_in<T: Ord + Clone>(
    selected: &mut BTreeSet<T>,
    universe: &BTreeSet<T>,
    value: T,
) -> ToggleOutcome {
    if !universe.contains(&value) {
        return ToggleOutcome::UnknownValue;
    }
    if selected.is_empty() {
        *selected = universe.clone();
    }
    if selected.contains(&value) {
        if selected.len() == 1 {
            if selected == universe {
                selected.clear();
            }
            return ToggleOutcome::LastValue;
        }
        selected.remove(&value);
    } else {
        selected.insert(value);
    }
    if selected == universe {
        selected.clear();
    }
    ToggleOutcome::Applied
}

/// Records passing the full predicate.
pub fn filtered<'a>(dataset: &'a Dataset, filters: &FilterState) -> Vec<&'a Record> {
    dataset.records.iter().filter(|r| filters.accepts(r)).collect()
}
