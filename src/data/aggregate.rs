use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;

use super::filter::{filtered, FilterState};
use super::model::{Dataset, Metric, Record, TenureCategory};

// ---------------------------------------------------------------------------
// Rollup primitives
// ---------------------------------------------------------------------------

/// Group `rows` by `key` and reduce every group with `reduce`.
///
/// Groups come out in order of first occurrence.
pub fn rollup<'a, K, V, I, F, G>(rows: I, key: F, reduce: G) -> Vec<(K, V)>
where
    I: IntoIterator<Item = &'a Record>,
    K: Eq + Hash + Clone,
    F: Fn(&Record) -> K,
    G: Fn(&[&'a Record]) -> V,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a Record>)> = Vec::new();

    for rec in rows {
        let k = key(rec);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(rec),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![rec]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(k, members)| {
            let v = reduce(&members);
            (k, v)
        })
        .collect()
}

/// Sum of `field`, skipping `NaN`s.
pub fn sum_of(rows: &[&Record], field: impl Fn(&Record) -> f64) -> f64 {
    rows.iter().map(|&r| field(r)).filter(|v| !v.is_nan()).sum()
}

/// Mean of `field` over the non-`NaN` values; `None` when there are none.
pub fn mean_of(rows: &[&Record], field: impl Fn(&Record) -> f64) -> Option<f64> {
    let (sum, n) = rows
        .iter()
        .map(|&r| field(r))
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ---------------------------------------------------------------------------
// Bar chart: tenure category → {count, mean(metric)}
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBar {
    pub category: TenureCategory,
    pub count: usize,
    /// Mean of the selected metric, 0 when no value was usable.
    pub metric_value: f64,
}

pub fn tenure_bars(rows: &[&Record], metric: Metric) -> Vec<CategoryBar> {
    rollup(
        rows.iter().copied(),
        |r| r.tenure,
        |group| (group.len(), mean_of(group, |r| metric.value(r)).unwrap_or(0.0)),
    )
    .into_iter()
    .map(|(category, (count, metric_value))| CategoryBar {
        category,
        count,
        metric_value,
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Timeline: sale date → count
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineSeries {
    /// Counts per date, ascending by date.
    pub points: Vec<TimelinePoint>,
    /// Records without a sale date; they cannot be placed on the axis.
    pub undated: usize,
}

impl TimelineSeries {
    pub fn max_count(&self) -> usize {
        self.points.iter().map(|p| p.count).max().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.points.iter().map(|p| p.count).sum::<usize>() + self.undated
    }
}

pub fn timeline<'a>(rows: impl IntoIterator<Item = &'a Record>) -> TimelineSeries {
    let mut undated = 0;
    let grouped = rollup(
        rows.into_iter().filter(|r| {
            if r.date.is_none() {
                undated += 1;
            }
            r.date.is_some()
        }),
        |r| r.date,
        |group| group.len(),
    );

    let mut points: Vec<TimelinePoint> = grouped
        .into_iter()
        .filter_map(|(date, count)| Some(TimelinePoint { date: date?, count }))
        .collect();
    points.sort_by_key(|p| p.date);

    TimelineSeries { points, undated }
}

// ---------------------------------------------------------------------------
// Map: planning area → totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DistrictAggregate {
    pub planning_area: String,
    /// Region of the first record seen for this planning area.
    pub region: String,
    pub count: usize,
    pub total_price: f64,
    pub total_area: f64,
    pub mean_unit_price: f64,
}

impl DistrictAggregate {
    /// The value the choropleth encodes for `metric`.
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::TransactedPrice => self.total_price,
            Metric::Area => self.total_area,
            Metric::UnitPrice => self.mean_unit_price,
        }
    }
}

pub fn district_totals(rows: &[&Record]) -> Vec<DistrictAggregate> {
    rollup(
        rows.iter().copied(),
        |r| r.planning_area.clone(),
        |group| DistrictAggregate {
            planning_area: group[0].planning_area.clone(),
            region: group[0].region.clone(),
            count: group.len(),
            total_price: sum_of(group, |r| r.price),
            total_area: sum_of(group, |r| r.area),
            mean_unit_price: mean_of(group, |r| r.unit_price).unwrap_or(0.0),
        },
    )
    .into_iter()
    .map(|(_, agg)| agg)
    .collect()
}

// ---------------------------------------------------------------------------
// Stacked chart: (region, property type) → metrics, pivoted per region
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CellAggregate {
    pub property_type: String,
    pub count: usize,
    pub total_price: f64,
    pub total_area: f64,
    pub mean_unit_price: f64,
}

impl CellAggregate {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::TransactedPrice => self.total_price,
            Metric::Area => self.total_area,
            Metric::UnitPrice => self.mean_unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    pub region: String,
    pub cells: Vec<CellAggregate>,
}

impl RegionRow {
    pub fn cell(&self, property_type: &str) -> Option<&CellAggregate> {
        self.cells.iter().find(|c| c.property_type == property_type)
    }

    /// Height of this region's stack for `metric`.
    pub fn total(&self, metric: Metric) -> f64 {
        self.cells.iter().map(|c| c.value(metric)).sum()
    }
}

/// One stacked series: the `[lower, upper]` segment of `key` in every region.
#[derive(Debug, Clone, PartialEq)]
pub struct StackLayer {
    pub key: String,
    /// Aligned with [`StackedAggregate::rows`].
    pub segments: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackedAggregate {
    pub rows: Vec<RegionRow>,
}

impl StackedAggregate {
    /// Stack `metric` over `keys` (bottom to top). A missing cell adds 0.
    pub fn stack(&self, keys: &[String], metric: Metric) -> Vec<StackLayer> {
        let mut baselines = vec![0.0; self.rows.len()];
        keys.iter()
            .map(|key| {
                let segments = self
                    .rows
                    .iter()
                    .zip(baselines.iter_mut())
                    .map(|(row, base)| {
                        let v = row.cell(key).map_or(0.0, |c| c.value(metric));
                        let seg = [*base, *base + v];
                        *base += v;
                        seg
                    })
                    .collect();
                StackLayer {
                    key: key.clone(),
                    segments,
                }
            })
            .collect()
    }

    /// Upper end of the y domain: the tallest region stack.
    pub fn y_max(&self, metric: Metric) -> f64 {
        self.rows
            .iter()
            .map(|r| r.total(metric))
            .fold(0.0, f64::max)
    }
}

pub fn region_type_pivot(rows: &[&Record]) -> StackedAggregate {
    let cells = rollup(
        rows.iter().copied(),
        |r| (r.region.clone(), r.property_type.clone()),
        |group| CellAggregate {
            property_type: group[0].property_type.clone(),
            count: group.len(),
            total_price: sum_of(group, |r| r.price),
            total_area: sum_of(group, |r| r.area),
            mean_unit_price: mean_of(group, |r| r.unit_price).unwrap_or(0.0),
        },
    );

    let mut pivot: Vec<RegionRow> = Vec::new();
    for ((region, _), cell) in cells {
        match pivot.iter_mut().find(|row| row.region == region) {
            Some(row) => row.cells.push(cell),
            None => pivot.push(RegionRow {
                region,
                cells: vec![cell],
            }),
        }
    }
    StackedAggregate { rows: pivot }
}

// ---------------------------------------------------------------------------
// All four view models, recomputed together
// ---------------------------------------------------------------------------

/// Aggregates behind every view for one filter state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardViews {
    pub metric: Metric,
    /// Records passing the full predicate.
    pub visible: usize,
    pub bars: Vec<CategoryBar>,
    pub timeline: TimelineSeries,
    pub districts: Vec<DistrictAggregate>,
    pub stacked: StackedAggregate,
    /// Stack order: every property type of the dataset.
    pub stack_keys: Vec<String>,
}

impl DashboardViews {
    /// Full recompute over the whole dataset.
    pub fn compute(dataset: &Dataset, filters: &FilterState) -> Self {
        let rows = filtered(dataset, filters);

        DashboardViews {
            metric: filters.metric,
            visible: rows.len(),
            bars: tenure_bars(&rows, filters.metric),
            timeline: timeline(dataset.records.iter().filter(|r| filters.accepts_categories(r))),
            districts: district_totals(&rows),
            stacked: region_type_pivot(&rows),
            stack_keys: dataset.property_types.iter().cloned().collect(),
        }
    }

    pub fn layers(&self) -> Vec<StackLayer> {
        self.stacked.stack(&self.stack_keys, self.metric)
    }

    pub fn district(&self, name: &str) -> Option<&DistrictAggregate> {
        self.districts
            .iter()
            .find(|d| d.planning_area.eq_ignore_ascii_case(name))
    }
}
