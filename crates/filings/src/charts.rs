//! Chart-data transforms for the presentation collaborator.
//!
//! Category outputs are re-shaped into JSON documents consumed by the
//! charting layer, one file per chart type. The transforms are generic over
//! the numeric columns of a category frame.

use polars::prelude::{DataFrame, DataType};
use serde_json::{Map, Value, json};

use filings_core::Result;

/// Chart types produced for every category dataset.
pub const CHART_TYPES: [&str; 2] = ["line_chart", "bar_chart"];

/// Builds every chart document for a category frame.
pub fn category_charts(df: &DataFrame) -> Result<Vec<(&'static str, Value)>> {
    Ok(vec![
        ("line_chart", line_chart(df)?),
        ("bar_chart", bar_chart(df)?),
    ])
}

/// One series per numeric column, with the quarter label on the x axis.
pub fn line_chart(df: &DataFrame) -> Result<Value> {
    let quarters = df.column("Quarter")?.str()?;

    let mut series = Vec::new();
    for column in df.get_columns() {
        if column.dtype() != &DataType::Float64 {
            continue;
        }
        let values = column.f64()?;
        let data: Vec<Value> = quarters
            .into_iter()
            .zip(values)
            .map(|(x, y)| json!({"x": x, "y": y}))
            .collect();
        series.push(json!({"id": column.name().as_str(), "data": data}));
    }
    Ok(Value::Array(series))
}

/// One object per row, keyed by quarter, with a `{column}Value` entry per
/// numeric column.
pub fn bar_chart(df: &DataFrame) -> Result<Value> {
    let quarters = df.column("Quarter")?.str()?;

    let numeric: Vec<(&str, &polars::prelude::Float64Chunked)> = df
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::Float64)
        .map(|column| Ok((column.name().as_str(), column.f64()?)))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let mut row = Map::new();
        row.insert("quarter".to_string(), json!(quarters.get(i)));
        for (name, values) in &numeric {
            row.insert(format!("{name}Value"), json!(values.get(i)));
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("EntityName".into(), vec!["Caterpillar Inc.", "Caterpillar Inc."]),
            Column::new("Revenues".into(), vec![Some(50_971.0), Some(59_427.0)]),
            Column::new("ProfitMarginPercent".into(), vec![Some(12.74), None]),
            Column::new("Quarter".into(), vec!["Q4-2021", "Q4-2022"]),
        ])
        .unwrap()
    }

    #[test]
    fn line_chart_has_one_series_per_numeric_column() {
        let chart = line_chart(&frame()).unwrap();
        let series = chart.as_array().unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["id"], "Revenues");
        assert_eq!(series[0]["data"][0]["x"], "Q4-2021");
        assert_eq!(series[0]["data"][0]["y"], 50_971.0);
        // Nulls propagate as JSON null.
        assert_eq!(series[1]["data"][1]["y"], Value::Null);
    }

    #[test]
    fn bar_chart_has_one_object_per_row() {
        let chart = bar_chart(&frame()).unwrap();
        let rows = chart.as_array().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["quarter"], "Q4-2021");
        assert_eq!(rows[0]["RevenuesValue"], 50_971.0);
        assert_eq!(rows[1]["ProfitMarginPercentValue"], Value::Null);
    }
}
