use anyhow::{Context, Result, anyhow};
use polars::prelude::*;
use std::io::Cursor;

/// Columns the raw denormalized export must carry. One data row is one
/// order; the last five columns hold semicolon-separated per-line lists.
pub const RAW_COLUMNS: &[&str] = &[
    "customer",
    "region",
    "order_date",
    "products",
    "categories",
    "unit_prices",
    "quantities",
    "line_totals",
];

/// Read the raw tab-separated export into a DataFrame.
///
/// Schema inference is disabled so every column comes in as a string;
/// the source data is too messy to trust automatic typing, and the
/// cleaning stage owns all coercion.
pub fn read_raw_frame(path: &str) -> Result<DataFrame> {
    let df = read_options()
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to open raw data file: {}", path))?
        .finish()
        .with_context(|| format!("Failed to parse raw data file: {}", path))?;

    validate_columns(&df)?;
    Ok(df)
}

/// Same as `read_raw_frame` but from an in-memory TSV string.
pub fn raw_frame_from_str(tsv: &str) -> Result<DataFrame> {
    let df = read_options()
        .into_reader_with_file_handle(Cursor::new(tsv.as_bytes().to_vec()))
        .finish()
        .context("Failed to parse raw TSV data")?;

    validate_columns(&df)?;
    Ok(df)
}

fn read_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(b'\t'))
}

fn validate_columns(df: &DataFrame) -> Result<()> {
    for col in RAW_COLUMNS {
        if df.column(col).is_err() {
            return Err(anyhow!("Raw data is missing required column: {}", col));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_all_columns_as_strings() {
        let tsv = "customer\tregion\torder_date\tproducts\tcategories\tunit_prices\tquantities\tline_totals\n\
                   Jane Doe\tEurope\t20210105\tWidget\tTools\t2.50\t4\t10.00\n";
        let df = raw_frame_from_str(tsv).unwrap();
        assert_eq!(df.height(), 1);
        // order_date must not be inferred as an integer
        assert!(df.column("order_date").unwrap().str().is_ok());
        assert!(df.column("unit_prices").unwrap().str().is_ok());
    }

    #[test]
    fn test_missing_column_rejected() {
        let tsv = "customer\tregion\torder_date\n\
                   Jane Doe\tEurope\t20210105\n";
        let result = raw_frame_from_str(tsv);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("products"));
    }
}
