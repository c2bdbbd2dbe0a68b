use std::io::Write;

use chrono::NaiveDate;
use realty_lens::data::geo::mercator;
use realty_lens::data::model::date_to_axis;
use realty_lens::{AppState, DashboardConfig, Dimension, Metric, TenureCategory};

const TRANSACTIONS: &str = "\
Planning Area,Property Type,Region,Transacted Price ($),Area (SQM),Unit Price ($ PSM),Sale Date,Tenure Remaining
Bedok,Retail,East Region,\"$1,000,000\",100,\"10,000\",Jan-21,Freehold
Bedok,Office,East Region,2000000,200,10000,Mar-21,60
Tampines,Retail,East Region,500000,50,10000,Mar-21,30
Novena,Office,Central Region,3000000,150,20000,Jun-21,999
Novena,Retail,Central Region,1500000,100,15000,Sep-21,Freehold
Novena,Office,Central Region,1000000,50,20000,,
";

fn square(name: Option<&str>, lon: f64, lat: f64) -> String {
    let props = match name {
        Some(n) => format!(r#"{{"planning_area": "{n}"}}"#),
        None => "{}".to_string(),
    };
    format!(
        r#"{{"type": "Feature", "properties": {props}, "geometry": {{"type": "Polygon",
            "coordinates": [[[{lon}, {lat}], [{x1}, {lat}], [{x1}, {y1}], [{lon}, {y1}], [{lon}, {lat}]]]}}}}"#,
        x1 = lon + 0.05,
        y1 = lat + 0.05,
    )
}

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

struct Fixture {
    state: AppState,
    _files: Vec<tempfile::NamedTempFile>,
}

fn loaded() -> Fixture {
    let data = write_temp(".csv", TRANSACTIONS);
    let features = [
        square(Some("BEDOK"), 103.90, 1.30),
        square(Some("TAMPINES"), 103.95, 1.35),
        square(Some("NOVENA"), 103.83, 1.32),
        square(None, 103.70, 1.30),
    ];
    let geo = write_temp(
        ".geojson",
        &format!(r#"{{"type": "FeatureCollection", "features": [{}]}}"#, features.join(",")),
    );

    let config = DashboardConfig {
        data_path: Some(data.path().to_path_buf()),
        boundaries_path: Some(geo.path().to_path_buf()),
        ..DashboardConfig::default()
    };
    let mut state = AppState::new(config);
    state.load_configured_files();
    Fixture {
        state,
        _files: vec![data, geo],
    }
}

fn axis(y: i32, m: u32, d: u32) -> f64 {
    date_to_axis(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

#[test]
fn startup_loads_every_view() {
    let fx = loaded();
    let state = &fx.state;
    assert!(state.status_message.is_none());
    assert_eq!(state.total_count(), 6);
    assert_eq!(state.boundaries.as_ref().map(|b| b.districts.len()), Some(3));

    let views = &state.views;
    assert_eq!(views.visible, 6);
    assert_eq!(views.timeline.points.len(), 4);
    assert_eq!(views.timeline.undated, 1);
    assert_eq!(views.timeline.max_count(), 2);
    assert_eq!(views.stack_keys, vec!["Office".to_string(), "Retail".to_string()]);

    let bedok = views.district("BEDOK").unwrap();
    assert_eq!(bedok.count, 2);
    assert_eq!(bedok.total_price, 3_000_000.0);
    assert_eq!(bedok.region, "East Region");
}

#[test]
fn stacked_layers_reach_region_totals() {
    let fx = loaded();
    let views = &fx.state.views;
    let layers = views.layers();
    assert_eq!(layers.len(), 2);

    let top = layers.last().unwrap();
    for (row, seg) in views.stacked.rows.iter().zip(&top.segments) {
        assert_eq!(seg[1], row.total(Metric::TransactedPrice));
    }
    assert_eq!(views.stacked.y_max(Metric::TransactedPrice), 5_500_000.0);
    // every layer starts where the one below ended
    for (below, above) in layers.iter().zip(layers.iter().skip(1)) {
        for (b, a) in below.segments.iter().zip(&above.segments) {
            assert_eq!(b[1], a[0]);
        }
    }
}

#[test]
fn brush_and_location_toggle_cross_filter() {
    let mut fx = loaded();
    let state = &mut fx.state;

    state.brush(axis(2021, 7, 1), axis(2021, 2, 1));
    assert_eq!(state.views.visible, 3);
    assert_eq!(state.views.timeline.total(), 6);

    state.toggle_filter_value(Dimension::Location, "Novena");
    assert_eq!(state.views.visible, 2);
    assert_eq!(state.views.timeline.total(), 3);
    assert!(state.views.district("Novena").is_none());
    assert_eq!(state.views.stacked.rows.len(), 1);

    state.reset_filters();
    assert_eq!(state.views.visible, 6);
    assert_eq!(state.filters.date_range, None);
}

#[test]
fn brush_bounds_are_exclusive() {
    let mut fx = loaded();
    let state = &mut fx.state;
    // Mar 1 and Sep 1 sit exactly on the ends
    state.brush(axis(2021, 3, 1), axis(2021, 9, 1));
    assert_eq!(state.views.visible, 1);
}

#[test]
fn metric_switch_changes_bar_means() {
    let mut fx = loaded();
    let state = &mut fx.state;
    state.set_metric(Metric::UnitPrice);

    let freehold = state
        .views
        .bars
        .iter()
        .find(|b| b.category == TenureCategory::Freehold)
        .unwrap();
    assert_eq!(freehold.count, 2);
    assert_eq!(freehold.metric_value, 12_500.0);

    // the blank tenure cell counts as zero years remaining
    assert!(state
        .views
        .bars
        .iter()
        .any(|b| b.category == TenureCategory::UpTo50 && b.count == 2));
    assert!(!state.views.bars.iter().any(|b| b.category == TenureCategory::Unknown));
}

#[test]
fn map_hit_resolves_to_district_aggregate() {
    let fx = loaded();
    let boundaries = fx.state.boundaries.as_ref().unwrap();

    let inside = mercator(103.925, 1.325);
    let hit = boundaries.hit(inside).unwrap();
    assert_eq!(hit.name, "BEDOK");
    assert_eq!(fx.state.views.district(&hit.name).map(|d| d.count), Some(2));

    assert!(boundaries.hit(mercator(100.0, 1.0)).is_none());
}

#[test]
fn config_file_sets_metric_and_paths() {
    let data = write_temp(".csv", TRANSACTIONS);
    let config_file = write_temp(
        ".json",
        &format!(
            r#"{{"data_path": {:?}, "default_metric": "area"}}"#,
            data.path().display().to_string()
        ),
    );

    let config = DashboardConfig::load(config_file.path()).unwrap();
    assert_eq!(config.default_metric, Metric::Area);

    let mut state = AppState::new(config);
    state.load_configured_files();
    assert_eq!(state.views.metric, Metric::Area);
    assert_eq!(state.views.stacked.y_max(Metric::Area), 350.0);
    assert!(state.boundaries.is_none());
}
