use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde_json::json;

use realty_lens::config::ColumnNames;
use realty_lens::data::model::with_commas;

/// Write a synthetic transaction dataset and matching planning-area
/// boundaries.
#[derive(Parser, Debug)]
#[command(about)]
struct Cli {
    /// Output directory.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Number of transactions.
    #[arg(long, default_value_t = 2_000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Planning areas on a coarse grid over the island: (name, region, column, row).
const AREAS: &[(&str, &str, usize, usize)] = &[
    ("Jurong West", "West Region", 0, 1),
    ("Clementi", "West Region", 1, 0),
    ("Bukit Timah", "Central Region", 2, 1),
    ("Queenstown", "Central Region", 2, 0),
    ("Downtown Core", "Central Region", 3, 0),
    ("Novena", "Central Region", 3, 1),
    ("Woodlands", "North Region", 2, 3),
    ("Yishun", "North Region", 3, 3),
    ("Ang Mo Kio", "North-East Region", 3, 2),
    ("Hougang", "North-East Region", 4, 2),
    ("Bedok", "East Region", 5, 1),
    ("Tampines", "East Region", 5, 2),
];

const TYPES: &[(&str, f64)] = &[
    ("Office", 18_000.0),
    ("Retail", 22_000.0),
    ("Shop House", 15_000.0),
    ("Factory", 4_500.0),
    ("Warehouse", 3_800.0),
];

const LON0: f64 = 103.62;
const LAT0: f64 = 1.27;
const CELL: f64 = 0.06;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Sale {
    planning_area: &'static str,
    region: &'static str,
    property_type: &'static str,
    price: f64,
    area: f64,
    unit_price: f64,
    date: Option<NaiveDate>,
    tenure: String,
}

fn generate(rows: usize, rng: &mut SimpleRng) -> Vec<Sale> {
    let first = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default();
    (0..rows)
        .map(|_| {
            let (planning_area, region, _, _) = AREAS[rng.below(AREAS.len())];
            let (property_type, base_psm) = TYPES[rng.below(TYPES.len())];

            let area = rng.gauss(180.0, 60.0).max(20.0).round();
            let unit_price = (base_psm * rng.gauss(1.0, 0.2).max(0.3)).round();
            let month = rng.below(60) as u32;
            let date = first.checked_add_months(chrono::Months::new(month));
            // a few dates are lost in the source data
            let date = if rng.next_f64() < 0.01 { None } else { date };

            let tenure = match rng.below(10) {
                0..=3 => "Freehold".to_string(),
                4 => String::new(),
                5 => (rng.below(50) + 1).to_string(),
                6..=7 => (rng.below(50) + 51).to_string(),
                _ => (rng.below(900) + 101).to_string(),
            };

            Sale {
                planning_area,
                region,
                property_type,
                price: area * unit_price,
                area,
                unit_price,
                date,
                tenure,
            }
        })
        .collect()
}

fn write_csv(path: &Path, sales: &[Sale], cols: &ColumnNames) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record([
        &cols.planning_area,
        &cols.property_type,
        &cols.region,
        &cols.price,
        &cols.area,
        &cols.unit_price,
        &cols.sale_date,
        &cols.tenure,
    ])?;
    for s in sales {
        let date = s
            .date
            .map(|d| d.format("%b-%y").to_string())
            .unwrap_or_default();
        writer.write_record([
            s.planning_area.to_string(),
            s.property_type.to_string(),
            s.region.to_string(),
            format!("${}", with_commas(s.price)),
            with_commas(s.area),
            with_commas(s.unit_price),
            date,
            s.tenure.clone(),
        ])?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, sales: &[Sale], cols: &ColumnNames) -> Result<()> {
    let text = |f: fn(&Sale) -> &str| StringArray::from(sales.iter().map(f).collect::<Vec<_>>());
    let number = |f: fn(&Sale) -> f64| Float64Array::from(sales.iter().map(f).collect::<Vec<_>>());
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    let dates = Date32Array::from(
        sales
            .iter()
            .map(|s| s.date.map(|d| (d - epoch).num_days() as i32))
            .collect::<Vec<_>>(),
    );

    let schema = Arc::new(Schema::new(vec![
        Field::new(&cols.planning_area, DataType::Utf8, false),
        Field::new(&cols.property_type, DataType::Utf8, false),
        Field::new(&cols.region, DataType::Utf8, false),
        Field::new(&cols.price, DataType::Float64, false),
        Field::new(&cols.area, DataType::Float64, false),
        Field::new(&cols.unit_price, DataType::Float64, false),
        Field::new(&cols.sale_date, DataType::Date32, true),
        Field::new(&cols.tenure, DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text(|s| s.planning_area)),
            Arc::new(text(|s| s.property_type)),
            Arc::new(text(|s| s.region)),
            Arc::new(number(|s| s.price)),
            Arc::new(number(|s| s.area)),
            Arc::new(number(|s| s.unit_price)),
            Arc::new(dates),
            Arc::new(text(|s| s.tenure.as_str())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// One square per planning area, lon/lat, counter-clockwise.
fn boundaries_geojson() -> serde_json::Value {
    let features: Vec<serde_json::Value> = AREAS
        .iter()
        .map(|&(name, region, col, row)| {
            let x0 = LON0 + col as f64 * CELL;
            let y0 = LAT0 + row as f64 * CELL;
            let ring = [
                [x0, y0],
                [x0 + CELL, y0],
                [x0 + CELL, y0 + CELL],
                [x0, y0 + CELL],
                [x0, y0],
            ];
            json!({
                "type": "Feature",
                "properties": { "planning_area": name.to_uppercase(), "region": region },
                "geometry": { "type": "Polygon", "coordinates": [ring] },
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);
    let cols = ColumnNames::default();

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    let sales = generate(cli.rows, &mut rng);

    let csv_path = cli.out_dir.join("sample_transactions.csv");
    write_csv(&csv_path, &sales, &cols)?;
    let parquet_path = cli.out_dir.join("sample_transactions.parquet");
    write_parquet(&parquet_path, &sales, &cols)?;

    let geo_path = cli.out_dir.join("sample_boundaries.geojson");
    let geojson = serde_json::to_string_pretty(&boundaries_geojson())?;
    std::fs::write(&geo_path, geojson).context("writing GeoJSON file")?;

    println!(
        "Wrote {} transactions to {} and {}, {} planning areas to {}",
        sales.len(),
        csv_path.display(),
        parquet_path.display(),
        AREAS.len(),
        geo_path.display()
    );
    Ok(())
}
