use anyhow::Result;
use polars::prelude::*;

use super::raw_frame::RAW_COLUMNS;

/// Column-level normalization applied before decomposition: trims every
/// raw column and collapses internal whitespace on the natural-key
/// columns so that " Jane   Doe " and "Jane Doe" compare equal.
pub struct FrameNormalizer;

impl FrameNormalizer {
    pub fn normalize_frame(&self, df: &mut DataFrame) -> Result<()> {
        for col_name in RAW_COLUMNS {
            if df.column(col_name).is_ok() {
                self.trim_column(df, col_name)?;
            }
        }

        // Natural keys get full whitespace collapsing
        self.collapse_whitespace_column(df, "customer")?;
        self.collapse_whitespace_column(df, "region")?;

        Ok(())
    }

    fn trim_column(&self, df: &mut DataFrame, col_name: &str) -> Result<()> {
        let series = df.column(col_name)?.str()?;

        let trimmed: Vec<Option<String>> = series
            .into_iter()
            .map(|opt| opt.map(|s| s.trim().to_string()))
            .collect();

        let new_series = Series::new(col_name.into(), trimmed);
        df.with_column(new_series)?;

        Ok(())
    }

    fn collapse_whitespace_column(&self, df: &mut DataFrame, col_name: &str) -> Result<()> {
        let series = df.column(col_name)?.str()?;

        let collapsed: Vec<Option<String>> = series
            .into_iter()
            .map(|opt| opt.map(|s| s.split_whitespace().collect::<Vec<_>>().join(" ")))
            .collect();

        let new_series = Series::new(col_name.into(), collapsed);
        df.with_column(new_series)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::raw_frame::raw_frame_from_str;

    #[test]
    fn test_collapses_whitespace_in_natural_keys() {
        let tsv = "customer\tregion\torder_date\tproducts\tcategories\tunit_prices\tquantities\tline_totals\n\
                   Jane    Doe \t North   America\t20210105\tWidget\tTools\t2.50\t4\t10.00\n";
        let mut df = raw_frame_from_str(tsv).unwrap();

        FrameNormalizer.normalize_frame(&mut df).unwrap();

        let customer = df.column("customer").unwrap().str().unwrap();
        assert_eq!(customer.get(0), Some("Jane Doe"));
        let region = df.column("region").unwrap().str().unwrap();
        assert_eq!(region.get(0), Some("North America"));
    }

    #[test]
    fn test_preserves_nulls() {
        let tsv = "customer\tregion\torder_date\tproducts\tcategories\tunit_prices\tquantities\tline_totals\n\
                   \tEurope\t20210105\tWidget\tTools\t2.50\t4\t10.00\n";
        let mut df = raw_frame_from_str(tsv).unwrap();

        FrameNormalizer.normalize_frame(&mut df).unwrap();

        let customer = df.column("customer").unwrap().str().unwrap();
        assert_eq!(customer.get(0), None);
    }
}
