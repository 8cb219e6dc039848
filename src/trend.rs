use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::ranking::{GroupKey, Measure};
use crate::schema::derived;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearValue {
    pub year: i64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Growth,
    Decline,
    Stable,
}

/// Least-squares line through the yearly values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, year: i64) -> f64 {
        self.slope * year as f64 + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSummary {
    /// Ascending by year, one point per distinct year.
    pub points: Vec<YearValue>,
    pub start_year: i64,
    pub end_year: i64,
    pub first_value: f64,
    pub last_value: f64,
    /// Rounded to one decimal; 0 when the first value is 0.
    pub percent_change: f64,
    pub peak_year: i64,
    pub trough_year: i64,
    pub direction: TrendDirection,
    /// Present from three points on.
    pub linear_fit: Option<LinearFit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trend {
    /// Fewer than two distinct years; no trend is computed.
    Insufficient { distinct_years: usize },
    Series(TrendSummary),
}

impl Trend {
    pub fn summary(&self) -> Option<&TrendSummary> {
        match self {
            Trend::Series(s) => Some(s),
            Trend::Insufficient { .. } => None,
        }
    }
}

/// Yearly totals of `measure` for the rows where `group_key == selected`.
pub fn time_series(
    records: &DataFrame,
    group_key: GroupKey,
    selected: &str,
    year_column: &str,
    measure: Measure,
) -> Result<Trend> {
    let df = records
        .clone()
        .lazy()
        .filter(group_key.expr().eq(lit(selected.to_string())))
        .group_by([col(year_column)
            .cast(DataType::Int64)
            .fill_null(lit(0i64))
            .alias(year_column)])
        .agg([measure.expr().sum().cast(DataType::Float64).alias(derived::VALUE)])
        .sort([year_column], SortMultipleOptions::default())
        .collect()?;

    let years = df.column(year_column)?.i64()?;
    let values = df.column(derived::VALUE)?.f64()?;
    let points: Vec<YearValue> = years
        .into_iter()
        .zip(values)
        .map(|(y, v)| YearValue {
            year: y.unwrap_or(0),
            value: v.unwrap_or(0.0),
        })
        .collect();

    debug!(?group_key, selected, years = points.len(), "time series computed");
    Ok(summarize(points))
}

/// Derive the trend statistics from ascending yearly points.
pub fn summarize(points: Vec<YearValue>) -> Trend {
    if points.len() < 2 {
        return Trend::Insufficient {
            distinct_years: points.len(),
        };
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let percent_change = if first.value > 0.0 {
        round1((last.value - first.value) / first.value * 100.0)
    } else {
        0.0
    };

    let mut peak = first;
    let mut trough = first;
    for p in &points[1..] {
        if p.value > peak.value {
            peak = *p;
        }
        if p.value < trough.value {
            trough = *p;
        }
    }

    let direction = if percent_change > 0.0 {
        TrendDirection::Growth
    } else if percent_change < 0.0 {
        TrendDirection::Decline
    } else {
        TrendDirection::Stable
    };

    let linear_fit = if points.len() >= 3 {
        linear_fit(&points)
    } else {
        None
    };

    Trend::Series(TrendSummary {
        start_year: first.year,
        end_year: last.year,
        first_value: first.value,
        last_value: last.value,
        percent_change,
        peak_year: peak.year,
        trough_year: trough.year,
        direction,
        linear_fit,
        points,
    })
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn linear_fit(points: &[YearValue]) -> Option<LinearFit> {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.year as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.value).sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for p in points {
        let dx = p.year as f64 - mean_x;
        sxy += dx * (p.value - mean_y);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}
