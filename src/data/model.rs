use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use super::error::DataError;

// ---------------------------------------------------------------------------
// TenureCategory – derived bucket of the remaining lease
// ---------------------------------------------------------------------------

/// Bucket of the remaining tenure at the time of sale.
///
/// Derived once at load time from the raw "Tenure Remaining" cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TenureCategory {
    Freehold,
    UpTo50,
    From51To100,
    Over100,
    Unknown,
}

impl TenureCategory {
    /// Bin a raw tenure cell: `Freehold`, or a number of years remaining.
    ///
    /// A blank cell counts as zero years. Numbers falling between the
    /// integer bins (e.g. `50.5`) and negative values are `Unknown`, as is
    /// any other text.
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "Freehold" {
            return TenureCategory::Freehold;
        }
        if raw.is_empty() {
            return TenureCategory::UpTo50;
        }
        match raw.parse::<f64>() {
            Ok(n) if (0.0..=50.0).contains(&n) => TenureCategory::UpTo50,
            Ok(n) if (51.0..=100.0).contains(&n) => TenureCategory::From51To100,
            Ok(n) if n >= 101.0 => TenureCategory::Over100,
            _ => TenureCategory::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TenureCategory::Freehold => "Freehold",
            TenureCategory::UpTo50 => "0-50 years",
            TenureCategory::From51To100 => "51-100 years",
            TenureCategory::Over100 => "> 100 years",
            TenureCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TenureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Metric – the numeric field the views encode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    #[default]
    TransactedPrice,
    Area,
    UnitPrice,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::TransactedPrice, Metric::Area, Metric::UnitPrice];

    /// Human label, identical to the dataset header of the field.
    pub fn label(self) -> &'static str {
        match self {
            Metric::TransactedPrice => "Transacted Price ($)",
            Metric::Area => "Area (SQM)",
            Metric::UnitPrice => "Unit Price ($ PSM)",
        }
    }

    pub fn value(self, record: &Record) -> f64 {
        match self {
            Metric::TransactedPrice => record.price,
            Metric::Area => record.area,
            Metric::UnitPrice => record.unit_price,
        }
    }

    /// Tooltip text for a value of this metric.
    pub fn format_value(self, value: f64) -> String {
        match self {
            Metric::TransactedPrice => format!("${}", with_commas(value)),
            Metric::Area => format!("{} m²", with_commas(value)),
            Metric::UnitPrice => with_commas(value),
        }
    }

    /// Axis tick text; prices are shown in millions.
    pub fn format_axis(self, value: f64) -> String {
        match self {
            Metric::TransactedPrice => format!("{}M", with_commas(value / 1e6)),
            _ => with_commas(value),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Metric {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(m) = Metric::ALL.into_iter().find(|m| m.label() == s) {
            return Ok(m);
        }
        match s.to_ascii_lowercase().as_str() {
            "price" | "transacted-price" => Ok(Metric::TransactedPrice),
            "area" => Ok(Metric::Area),
            "unit-price" | "unit_price" => Ok(Metric::UnitPrice),
            _ => Err(DataError::UnknownMetric(s.to_string())),
        }
    }
}

/// Format with thousands separators and at most two decimals.
pub fn with_commas(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 && (int_part != "0" || !frac.is_empty()) { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

// ---------------------------------------------------------------------------
// Record – one transaction
// ---------------------------------------------------------------------------

/// A single transaction after the derivation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub planning_area: String,
    pub property_type: String,
    pub region: String,
    /// Transacted price in dollars; `NaN` when the cell was unusable.
    pub price: f64,
    /// Area in square metres; `NaN` when the cell was unusable.
    pub area: f64,
    /// Price per square metre; `NaN` when the cell was unusable.
    pub unit_price: f64,
    pub tenure: TenureCategory,
    /// Sale date, `None` when the raw value could not be parsed.
    pub date: Option<NaiveDate>,
}

/// Strip everything but digits, `.` and `-`, then parse.
///
/// Nothing left after stripping (a blank or all-text cell) reads as `0`;
/// a remainder that still does not parse, such as `1.2.3`, is `NaN`.
pub fn clean_numeric(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a sale date trying each format in turn.
///
/// Formats without a day component (e.g. `%b-%y`) resolve to the first of
/// the month.
pub fn parse_sale_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    formats.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(raw, fmt).ok().or_else(|| {
            NaiveDate::parse_from_str(&format!("{raw}-01"), &format!("{fmt}-%d")).ok()
        })
    })
}

// Timeline x axis: days since 1970-01-01.

fn epoch() -> NaiveDate {
    // chrono's default date is 1970-01-01
    NaiveDate::default()
}

pub fn date_to_axis(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}

pub fn axis_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    epoch().checked_add_signed(TimeDelta::try_days(x.round() as i64)?)
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All records plus the unique values the filter widgets offer.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub tenures: BTreeSet<TenureCategory>,
    pub property_types: BTreeSet<String>,
    pub planning_areas: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    /// Earliest and latest parsed sale date.
    pub date_extent: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Build the unique-value indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut ds = Dataset::default();
        for rec in &records {
            ds.tenures.insert(rec.tenure);
            ds.property_types.insert(rec.property_type.clone());
            ds.planning_areas.insert(rec.planning_area.clone());
            ds.regions.insert(rec.region.clone());
            if let Some(d) = rec.date {
                ds.date_extent = Some(match ds.date_extent {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
        }
        ds.records = records;
        ds
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
