use polars::prelude::*;

use crate::schema::*;

/// One registered farming family, as read from a loaded survey frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FarmRecord {
    pub family: String,
    pub municipality: String,
    pub community: String,
    pub state: String,
    pub region: String,
    pub gender: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub primary_product: String,
    pub secondary_product: Option<String>,
    pub certification: String,
    pub area_ha: f64,
    pub volume_kg: f64,
    pub year: i64,
    pub sale_method: Option<String>,
    pub association: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl FarmRecord {
    /// Both coordinates are present.
    pub fn is_map_eligible(&self) -> bool {
        self.coordinates().is_some()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    /// Volume per cultivated hectare; zero area yields zero.
    pub fn productivity(&self) -> f64 {
        if self.area_ha > 0.0 {
            self.volume_kg / self.area_ha
        } else {
            0.0
        }
    }
}

/// Extract every row of `df` as a [`FarmRecord`].
///
/// Columns that are absent read as missing: categorical fields fall back to
/// [`sentinel::NOT_INFORMED`], numeric fields to zero.
pub fn records(df: &DataFrame) -> Vec<FarmRecord> {
    (0..df.height()).map(|i| record_at(df, i)).collect()
}

/// Extract a single row. Out-of-range indices read as an all-missing record.
pub fn record_at(df: &DataFrame, i: usize) -> FarmRecord {
    let category = |name: &str| text_at(df, name, i).unwrap_or_else(not_informed);
    FarmRecord {
        family: category(identity::FAMILY),
        municipality: category(identity::MUNICIPALITY),
        community: category(identity::COMMUNITY),
        state: category(identity::STATE),
        region: category(identity::REGION),
        gender: category(identity::GENDER),
        latitude: float_at(df, geo::LATITUDE, i),
        longitude: float_at(df, geo::LONGITUDE, i),
        primary_product: category(production::PRIMARY_PRODUCT),
        secondary_product: text_at(df, production::SECONDARY_PRODUCT, i),
        certification: category(commerce::CERTIFICATION),
        area_ha: float_at(df, production::AREA_HA, i).unwrap_or(0.0),
        volume_kg: float_at(df, production::VOLUME_KG, i).unwrap_or(0.0),
        year: float_at(df, production::YEAR, i)
            .map(|y| y as i64)
            .unwrap_or(0),
        sale_method: text_at(df, commerce::SALE_METHOD, i),
        association: text_at(df, commerce::ASSOCIATION, i),
        phone: text_at(df, commerce::PHONE, i),
        email: text_at(df, commerce::EMAIL, i),
    }
}

fn not_informed() -> String {
    sentinel::NOT_INFORMED.to_string()
}

/// String form of a cell; `None` for nulls, blanks and absent columns.
pub(crate) fn text_at(df: &DataFrame, name: &str, i: usize) -> Option<String> {
    let val = df.column(name).ok()?.get(i).ok()?;
    let s = value_text(&val)?;
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn float_at(df: &DataFrame, name: &str, i: usize) -> Option<f64> {
    let val = df.column(name).ok()?.get(i).ok()?;
    match val {
        AnyValue::Null => None,
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.trim().parse().ok(),
        other => other.extract::<f64>(),
    }
}

/// Display text of a cell, `None` for null.
pub(crate) fn value_text(val: &AnyValue) -> Option<String> {
    match val {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        other => Some(format!("{other}")),
    }
}
