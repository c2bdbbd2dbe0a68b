use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type};
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{clean_numeric, parse_sale_date, Dataset, Record, TenureCategory};
use crate::config::DashboardConfig;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a transaction dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the configured column names
/// * `.json`    – `[{ "Planning Area": "...", ... }, ...]`
/// * `.parquet` – one column per field; text, integer, float or date32
pub fn load_file(path: &Path, config: &DashboardConfig) -> Result<Dataset> {
    let table = read_table(path)?;
    let dataset = derive_records(&table, config)
        .with_context(|| format!("building records from {}", path.display()))?;
    log::info!(
        "loaded {} transactions from {} ({} undated)",
        dataset.len(),
        path.display(),
        dataset.records.iter().filter(|r| r.date.is_none()).count()
    );
    Ok(dataset)
}

/// One cell before the derivation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Text(String),
    /// Already typed by the source (Parquet `Date32`); never re-parsed.
    Date(NaiveDate),
}

impl RawCell {
    fn text(&self) -> Cow<'_, str> {
        match self {
            RawCell::Text(s) => Cow::Borrowed(s),
            RawCell::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Raw cells, before the derivation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    fn column(&self, name: &str) -> Result<usize, DataError> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }
}

pub fn read_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "json" => read_json(path),
        "parquet" | "pq" => read_parquet(path),
        other => Err(DataError::UnsupportedFormat(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// Derivation pass
// ---------------------------------------------------------------------------

/// Turn raw cells into typed records: clean numerics, bin tenure, parse
/// dates. Runs once per load; records are never touched again.
pub fn derive_records(table: &RawTable, config: &DashboardConfig) -> Result<Dataset, DataError> {
    let cols = &config.columns;
    let planning_area = table.column(&cols.planning_area)?;
    let property_type = table.column(&cols.property_type)?;
    let region = table.column(&cols.region)?;
    let price = table.column(&cols.price)?;
    let area = table.column(&cols.area)?;
    let unit_price = table.column(&cols.unit_price)?;
    let sale_date = table.column(&cols.sale_date)?;
    let tenure = table.column(&cols.tenure)?;

    let records = table
        .rows
        .iter()
        .map(|row| {
            let cell = |i: usize| row.get(i).map(RawCell::text).unwrap_or_default();
            let date = match row.get(sale_date) {
                Some(RawCell::Date(d)) => Some(*d),
                Some(RawCell::Text(raw)) => parse_sale_date(raw, &config.sale_date_formats),
                None => None,
            };
            Record {
                planning_area: cell(planning_area).into_owned(),
                property_type: cell(property_type).into_owned(),
                region: cell(region).into_owned(),
                price: clean_numeric(&cell(price)),
                area: clean_numeric(&cell(area)),
                unit_price: clean_numeric(&cell(unit_price)),
                tenure: TenureCategory::from_raw(&cell(tenure)),
                date,
            }
        })
        .collect();

    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(|v| RawCell::Text(v.to_string())).collect());
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`).
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| RawCell::Text(obj.get(h).map(json_to_text).unwrap_or_default()))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { headers, rows })
}

/// Read a single Arrow cell: dates stay typed, everything else becomes the
/// text the derivation pass expects.
fn extract_cell(col: &ArrayRef, row: usize) -> RawCell {
    if col.is_null(row) {
        return RawCell::Text(String::new());
    }
    if let DataType::Date32 = col.data_type() {
        return match col.as_primitive::<Date32Type>().value_as_date(row) {
            Some(d) => RawCell::Date(d),
            None => RawCell::Text(String::new()),
        };
    }
    RawCell::Text(match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        DataType::Boolean => col.as_boolean().value(row).to_string(),
        other => {
            log::warn!("unsupported parquet column type {other:?}, read as empty");
            String::new()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;

    const CSV: &str = "\
Planning Area,Property Type,Region,Transacted Price ($),Area (SQM),Unit Price ($ PSM),Sale Date,Tenure Remaining
Bedok,Retail,East Region,\"$1,200,000\",100,\"12,000\",Mar-21,Freehold
Orchard,Office,Central Region,2500000,250.5,9980,bad-date,75
Outram,Shop House,Central Region,,80,,Jan-19,
";

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_rows_are_derived() {
        let file = write_temp(".csv", CSV);
        let ds = load_file(file.path(), &DashboardConfig::default()).unwrap();
        assert_eq!(ds.len(), 3);

        let bedok = &ds.records[0];
        assert_eq!(bedok.price, 1_200_000.0);
        assert_eq!(bedok.unit_price, 12_000.0);
        assert_eq!(bedok.tenure, TenureCategory::Freehold);
        assert_eq!(bedok.date, NaiveDate::from_ymd_opt(2021, 3, 1));

        let orchard = &ds.records[1];
        assert_eq!(orchard.area, 250.5);
        assert_eq!(orchard.tenure, TenureCategory::From51To100);
        assert_eq!(orchard.date, None);

        let outram = &ds.records[2];
        assert_eq!(outram.price, 0.0);
        assert_eq!(outram.unit_price, 0.0);
        assert_eq!(outram.tenure, TenureCategory::UpTo50);
        assert_eq!(ds.regions.len(), 2);
    }

    #[test]
    fn json_records_are_read() {
        let file = write_temp(
            ".json",
            r#"[
                {"Planning Area": "Bedok", "Property Type": "Retail", "Region": "East",
                 "Transacted Price ($)": 900000, "Area (SQM)": 90, "Unit Price ($ PSM)": 10000,
                 "Sale Date": "2020-02-14", "Tenure Remaining": 999},
                {"Planning Area": "Bedok", "Property Type": "Office", "Region": "East",
                 "Transacted Price ($)": null, "Area (SQM)": 10.5, "Unit Price ($ PSM)": null,
                 "Sale Date": null, "Tenure Remaining": "Freehold"}
            ]"#,
        );
        let ds = load_file(file.path(), &DashboardConfig::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].tenure, TenureCategory::Over100);
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2020, 2, 14));
        assert_eq!(ds.records[1].price, 0.0);
        assert_eq!(ds.records[1].area, 10.5);
        assert_eq!(ds.planning_areas.len(), 1);
    }

    #[test]
    fn parquet_columns_are_read() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Planning Area", DataType::Utf8, false),
            Field::new("Property Type", DataType::Utf8, false),
            Field::new("Region", DataType::Utf8, false),
            Field::new("Transacted Price ($)", DataType::Int64, false),
            Field::new("Area (SQM)", DataType::Float64, false),
            Field::new("Unit Price ($ PSM)", DataType::Float64, true),
            Field::new("Sale Date", DataType::Date32, true),
            Field::new("Tenure Remaining", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Bedok", "Yishun"])),
                Arc::new(StringArray::from(vec!["Retail", "Office"])),
                Arc::new(StringArray::from(vec!["East", "North"])),
                Arc::new(Int64Array::from(vec![1_000_000, 750_000])),
                Arc::new(Float64Array::from(vec![100.0, 75.0])),
                Arc::new(Float64Array::from(vec![Some(10_000.0), None])),
                Arc::new(Date32Array::from(vec![Some(18_700), None])),
                Arc::new(StringArray::from(vec!["42", "Freehold"])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path(), &DashboardConfig::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].price, 1_000_000.0);
        assert_eq!(ds.records[0].tenure, TenureCategory::UpTo50);
        assert_eq!(
            ds.records[0].date,
            NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d + chrono::Days::new(18_700))
        );
        assert_eq!(ds.records[1].unit_price, 0.0);
        assert_eq!(ds.records[1].date, None);

        // typed dates do not depend on the configured text formats
        let config = DashboardConfig {
            sale_date_formats: vec!["%b-%y".to_string()],
            ..DashboardConfig::default()
        };
        let ds = load_file(file.path(), &config).unwrap();
        assert_eq!(
            ds.records[0].date,
            NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d + chrono::Days::new(18_700))
        );
    }

    #[test]
    fn blank_unit_price_counts_as_zero_in_district_mean() {
        let table = RawTable {
            headers: [
                "Planning Area",
                "Property Type",
                "Region",
                "Transacted Price ($)",
                "Area (SQM)",
                "Unit Price ($ PSM)",
                "Sale Date",
                "Tenure Remaining",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            rows: vec![
                ["A", "Office", "East", "100", "5", "", "Jan-21", ""],
                ["A", "Office", "East", "200", "10", "20", "Feb-21", "Freehold"],
            ]
            .iter()
            .map(|row| row.iter().map(|c| RawCell::Text(c.to_string())).collect::<Vec<_>>())
            .collect(),
        };
        let ds = derive_records(&table, &DashboardConfig::default()).unwrap();
        assert_eq!(ds.records[0].tenure, TenureCategory::UpTo50);

        let views = crate::data::aggregate::DashboardViews::compute(
            &ds,
            &crate::data::filter::FilterState::default(),
        );
        assert_eq!(views.district("A").map(|d| d.mean_unit_price), Some(10.0));
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let file = write_temp(".csv", "Planning Area,Region\nBedok,East\n");
        let err = load_file(file.path(), &DashboardConfig::default()).unwrap_err();
        let missing = err
            .chain()
            .find_map(|e| e.downcast_ref::<DataError>())
            .map(|e| e.to_string());
        assert_eq!(missing.as_deref(), Some("dataset is missing column 'Property Type'"));
    }

    #[test]
    fn custom_column_names_are_honoured() {
        let file = write_temp(
            ".csv",
            "area,type,region,price,sqm,psm,date,tenure\nBedok,Retail,East,10,1,10,2021-01-05,60\n",
        );
        let mut config = DashboardConfig::default();
        config.columns = crate::config::ColumnNames {
            planning_area: "area".into(),
            property_type: "type".into(),
            region: "region".into(),
            price: "price".into(),
            area: "sqm".into(),
            unit_price: "psm".into(),
            sale_date: "date".into(),
            tenure: "tenure".into(),
        };
        let ds = load_file(file.path(), &config).unwrap();
        assert_eq!(ds.records[0].tenure, TenureCategory::From51To100);
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2021, 1, 5));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = read_table(Path::new("data.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
