use std::path::Path;

use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::data::aggregate::DashboardViews;
use crate::data::filter::{DateRange, Dimension, FilterState, ToggleOutcome};
use crate::data::geo::Boundaries;
use crate::data::loader;
use crate::data::model::{axis_to_date, Dataset, Metric};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
///
/// Every mutation goes through a method here and ends in [`AppState::update`],
/// which recomputes all four view models from scratch.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a file is opened).
    pub dataset: Option<Dataset>,

    /// Planning-area boundaries for the map (None until a file is opened).
    pub boundaries: Option<Boundaries>,

    /// Selections shared by every view.
    pub filters: FilterState,

    /// Aggregates for the current `filters` (cached).
    pub views: DashboardViews,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let filters = FilterState::with_metric(config.default_metric);
        Self {
            config,
            dataset: None,
            boundaries: None,
            filters,
            views: DashboardViews::default(),
            status_message: None,
        }
    }

    /// Open whatever the config points at. Failures are reported, not fatal.
    pub fn load_configured_files(&mut self) {
        if let Some(path) = self.config.data_path.clone() {
            self.open_dataset(&path);
        }
        if let Some(path) = self.config.boundaries_path.clone() {
            self.open_boundaries(&path);
        }
    }

    /// Ingest a newly loaded dataset and reset the selections.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = FilterState::with_metric(self.filters.metric);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.update();
    }

    pub fn set_boundaries(&mut self, boundaries: Boundaries) {
        self.boundaries = Some(boundaries);
        self.status_message = None;
    }

    pub fn open_dataset(&mut self, path: &Path) {
        match loader::load_file(path, &self.config) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load dataset: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn open_boundaries(&mut self, path: &Path) {
        match Boundaries::load(path, &self.config.boundary_name_property) {
            Ok(boundaries) => {
                log::info!(
                    "Loaded {} boundary features from {}",
                    boundaries.districts.len(),
                    path.display()
                );
                self.set_boundaries(boundaries);
            }
            Err(e) => {
                log::error!("Failed to load boundaries: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Recompute every view from the current filters.
    pub fn update(&mut self) {
        let Some(ds) = &self.dataset else {
            self.views = DashboardViews::default();
            return;
        };
        self.views = DashboardViews::compute(ds, &self.filters);
        log::debug!(
            "recomputed views: {} of {} records visible, metric {}",
            self.views.visible,
            ds.len(),
            self.filters.metric
        );
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.filters.metric = metric;
        self.update();
    }

    /// Toggle a single value of one dimension.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        let Some(ds) = &self.dataset else {
            return;
        };
        match self.filters.toggle(ds, dim, value) {
            ToggleOutcome::Applied => {}
            ToggleOutcome::LastValue => {
                self.status_message = Some("At least one value must stay selected.".to_string());
                return;
            }
            ToggleOutcome::UnknownValue => {
                log::warn!("ignored toggle of unknown {dim:?} value '{value}'");
                return;
            }
        }
        self.status_message = None;
        self.update();
    }

    /// Select all values in a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        self.filters.clear(dim);
        self.update();
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.filters.date_range = range;
        self.update();
    }

    /// Commit a timeline brush given in axis units (days since epoch).
    ///
    /// A zero-width brush clears the range.
    pub fn brush(&mut self, x0: f64, x1: f64) {
        let (lo, hi) = (x0.min(x1), x0.max(x1));
        let range = match (axis_to_date(lo), axis_to_date(hi)) {
            (Some(start), Some(end)) if start != end => Some(DateRange::new(start, end)),
            _ => None,
        };
        log::debug!("brush committed: {range:?}");
        self.set_date_range(range);
    }

    pub fn clear_brush(&mut self) {
        self.set_date_range(None);
    }

    /// Drop every selection and the brush; the metric stays.
    pub fn reset_filters(&mut self) {
        self.filters = FilterState::with_metric(self.filters.metric);
        self.update();
    }

    pub fn total_count(&self) -> usize {
        self.dataset.as_ref().map_or(0, Dataset::len)
    }

    /// Date extent of the dataset, used to seed the date pickers.
    pub fn date_extent(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.dataset.as_ref().and_then(|ds| ds.date_extent)
    }

    /// Smallest exclusive range that still contains every dated sale.
    pub fn full_date_range(&self) -> Option<DateRange> {
        let (first, last) = self.date_extent()?;
        Some(DateRange::new(
            first.pred_opt().unwrap_or(first),
            last.succ_opt().unwrap_or(last),
        ))
    }
}
