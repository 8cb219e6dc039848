use std::collections::BTreeSet;
use std::str::FromStr;

use polars::prelude::*;
use tracing::debug;

use crate::error::{PanelError, Result};
use crate::record::value_text;
use crate::schema::*;

/// One of the six user-facing filter widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Search,
    Municipality,
    Product,
    Certification,
    Gender,
    Community,
}

impl FilterField {
    pub const ALL: [FilterField; 6] = [
        FilterField::Search,
        FilterField::Municipality,
        FilterField::Product,
        FilterField::Certification,
        FilterField::Gender,
        FilterField::Community,
    ];

    /// Column compared by a selector; `None` for the free-text search.
    pub fn column(self) -> Option<&'static str> {
        match self {
            FilterField::Search => None,
            FilterField::Municipality => Some(identity::MUNICIPALITY),
            FilterField::Product => Some(production::PRIMARY_PRODUCT),
            FilterField::Certification => Some(commerce::CERTIFICATION),
            FilterField::Gender => Some(identity::GENDER),
            FilterField::Community => Some(identity::COMMUNITY),
        }
    }

    /// Value meaning "no constraint" for this field.
    pub fn unconstrained(self) -> &'static str {
        match self {
            FilterField::Search => "",
            _ => sentinel::ALL,
        }
    }

    pub fn is_unconstrained(self, value: &str) -> bool {
        value == self.unconstrained()
    }
}

impl FromStr for FilterField {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "search" | "busca" => Ok(FilterField::Search),
            "municipality" | "municipio" | "município" => Ok(FilterField::Municipality),
            "product" | "produto" => Ok(FilterField::Product),
            "certification" | "certificacao" | "certificação" => Ok(FilterField::Certification),
            "gender" | "genero" | "gênero" => Ok(FilterField::Gender),
            "community" | "comunidade" => Ok(FilterField::Community),
            other => Err(PanelError::InvalidData(format!(
                "Unknown filter field: {other}"
            ))),
        }
    }
}

/// Active filter selections for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub municipality: String,
    pub product: String,
    pub certification: String,
    pub gender: String,
    pub community: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            municipality: sentinel::ALL.to_string(),
            product: sentinel::ALL.to_string(),
            certification: sentinel::ALL.to_string(),
            gender: sentinel::ALL.to_string(),
            community: sentinel::ALL.to_string(),
        }
    }
}

impl FilterCriteria {
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::Search => &self.search,
            FilterField::Municipality => &self.municipality,
            FilterField::Product => &self.product,
            FilterField::Certification => &self.certification,
            FilterField::Gender => &self.gender,
            FilterField::Community => &self.community,
        }
    }

    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FilterField::Search => self.search = value,
            FilterField::Municipality => self.municipality = value,
            FilterField::Product => self.product = value,
            FilterField::Certification => self.certification = value,
            FilterField::Gender => self.gender = value,
            FilterField::Community => self.community = value,
        }
    }

    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Fields currently constraining the result.
    pub fn active_fields(&self) -> Vec<FilterField> {
        FilterField::ALL
            .into_iter()
            .filter(|f| !f.is_unconstrained(self.get(*f)))
            .collect()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active_fields().is_empty()
    }
}

/// Narrow `records` to the rows satisfying every active criterion.
///
/// The search matches case-insensitively against the text of any field in
/// the row. Selectors compare for equality after nulls are read as
/// [`sentinel::NOT_INFORMED`]. Row order is preserved.
pub fn apply_filters(records: &DataFrame, criteria: &FilterCriteria) -> Result<DataFrame> {
    if criteria.is_unconstrained() {
        return Ok(records.clone());
    }

    let mut df = records.clone();

    if !criteria.search.is_empty() {
        let mask = search_mask(&df, &criteria.search.to_lowercase());
        df = df.filter(&mask)?;
    }

    let predicate = FilterField::ALL
        .into_iter()
        .filter_map(|field| {
            let column = field.column()?;
            let value = criteria.get(field);
            if field.is_unconstrained(value) {
                return None;
            }
            Some(category(column).eq(lit(value.to_string())))
        })
        .reduce(|a, b| a.and(b));

    if let Some(predicate) = predicate {
        df = df.lazy().filter(predicate).collect()?;
    }

    debug!(
        input_rows = records.height(),
        output_rows = df.height(),
        active = ?criteria.active_fields(),
        "filters applied"
    );
    Ok(df)
}

/// Column as text with nulls read as [`sentinel::NOT_INFORMED`].
pub(crate) fn category(column: &str) -> Expr {
    col(column)
        .cast(DataType::String)
        .fill_null(lit(sentinel::NOT_INFORMED))
}

fn search_mask(df: &DataFrame, needle: &str) -> BooleanChunked {
    let columns: Vec<&Series> = df
        .get_columns()
        .iter()
        .map(|c| c.as_materialized_series())
        .collect();

    let mask: Vec<bool> = (0..df.height())
        .map(|i| {
            columns.iter().any(|s| {
                s.get(i)
                    .ok()
                    .and_then(|v| value_text(&v))
                    .is_some_and(|text| text.to_lowercase().contains(needle))
            })
        })
        .collect();

    BooleanChunked::from_slice(PlSmallStr::from_static("search"), &mask)
}

/// Dropdown options for `column`: the "no constraint" sentinel followed by
/// the sorted distinct values.
pub fn filter_options(records: &DataFrame, column: &str) -> Result<Vec<String>> {
    let mut options = vec![sentinel::ALL.to_string()];
    options.extend(distinct_values(records, column)?);
    Ok(options)
}

/// Sorted distinct communities registered in `municipality`.
pub fn communities_in(records: &DataFrame, municipality: &str) -> Result<Vec<String>> {
    let df = records
        .clone()
        .lazy()
        .filter(category(identity::MUNICIPALITY).eq(lit(municipality.to_string())))
        .collect()?;
    distinct_values(&df, identity::COMMUNITY)
}

pub(crate) fn distinct_values(records: &DataFrame, column: &str) -> Result<Vec<String>> {
    let text = records.column(column)?.cast(&DataType::String)?;
    let values: BTreeSet<String> = text
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(sentinel::NOT_INFORMED).to_string())
        .collect();
    Ok(values.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_records, three_rows};
    use crate::record::records as to_records;

    fn families(df: &DataFrame) -> Vec<String> {
        to_records(df).into_iter().map(|r| r.family).collect()
    }

    #[test]
    fn default_criteria_is_identity() {
        let df = sample_records();
        let out = apply_filters(&df, &FilterCriteria::default()).unwrap();
        assert!(out.equals_missing(&df));
    }

    #[test]
    fn municipality_selector_keeps_matching_rows_in_order() {
        let df = three_rows();
        let criteria = FilterCriteria::default().with(FilterField::Municipality, "A");
        let out = apply_filters(&df, &criteria).unwrap();
        assert_eq!(out.height(), 2);
        let vol = out.column(production::VOLUME_KG).unwrap().f64().unwrap();
        assert_eq!(vol.get(0), Some(100.0));
        assert_eq!(vol.get(1), Some(50.0));
    }

    #[test]
    fn search_is_case_insensitive_across_all_fields() {
        let df = sample_records();
        let criteria = FilterCriteria::default().with(FilterField::Search, "MANGA");
        assert_eq!(families(&apply_filters(&df, &criteria).unwrap()), vec!["Lima"]);

        // matches a contact column, not only names
        let criteria = FilterCriteria::default().with(FilterField::Search, "oliveira@");
        assert_eq!(
            families(&apply_filters(&df, &criteria).unwrap()),
            vec!["Oliveira"]
        );
    }

    #[test]
    fn selectors_combine_with_and() {
        let df = sample_records();
        let criteria = FilterCriteria::default()
            .with(FilterField::Municipality, "Lagarto")
            .with(FilterField::Gender, "Feminino");
        assert_eq!(families(&apply_filters(&df, &criteria).unwrap()), vec!["Silva"]);
    }

    #[test]
    fn missing_certification_is_selectable_as_not_informed() {
        let df = sample_records();
        let criteria =
            FilterCriteria::default().with(FilterField::Certification, sentinel::NOT_INFORMED);
        assert_eq!(families(&apply_filters(&df, &criteria).unwrap()), vec!["Souza"]);
    }

    #[test]
    fn unmatched_search_yields_empty_frame() {
        let df = sample_records();
        let criteria = FilterCriteria::default().with(FilterField::Search, "zzz-nada");
        assert_eq!(apply_filters(&df, &criteria).unwrap().height(), 0);
    }

    #[test]
    fn options_start_with_sentinel_and_are_sorted() {
        let df = sample_records();
        let opts = filter_options(&df, commerce::CERTIFICATION).unwrap();
        assert_eq!(
            opts,
            vec![
                sentinel::ALL.to_string(),
                sentinel::NOT_INFORMED.to_string(),
                "OCS".to_string(),
                "Orgânico por Auditoria".to_string(),
            ]
        );
    }

    #[test]
    fn options_read_frames_split_into_chunks() {
        let mut df = sample_records();
        df.vstack_mut(&extra_row()).unwrap();
        assert!(df.column(identity::MUNICIPALITY).unwrap().n_chunks() > 1);

        let opts = filter_options(&df, identity::MUNICIPALITY).unwrap();
        assert_eq!(
            opts,
            vec![sentinel::ALL, "Itabaiana", "Juazeiro", "Lagarto", "Propriá"]
        );
        assert_eq!(
            communities_in(&df, "Propriá").unwrap(),
            vec!["Ilha".to_string()]
        );
    }

    /// One extra row with the full sample schema, to stack under the sample.
    fn extra_row() -> DataFrame {
        let mut extra = sample_records().head(Some(1));
        for (name, value) in [
            (identity::FAMILY, "Costa"),
            (identity::MUNICIPALITY, "Propriá"),
            (identity::COMMUNITY, "Ilha"),
        ] {
            extra
                .with_column(Column::new(name.into(), [value]))
                .unwrap();
        }
        extra
    }

    #[test]
    fn communities_follow_the_selected_municipality() {
        let df = sample_records();
        assert_eq!(communities_in(&df, "Itabaiana").unwrap(), vec!["Serra"]);
        assert!(communities_in(&df, "Aracaju").unwrap().is_empty());
    }

    #[test]
    fn parses_field_names() {
        assert_eq!("Município".parse::<FilterField>().unwrap(), FilterField::Municipality);
        assert_eq!("busca".parse::<FilterField>().unwrap(), FilterField::Search);
        assert!("cor".parse::<FilterField>().is_err());
    }

    #[test]
    fn active_fields_ignore_sentinels() {
        let criteria = FilterCriteria::default()
            .with(FilterField::Product, "Mandioca")
            .with(FilterField::Search, "");
        assert_eq!(criteria.active_fields(), vec![FilterField::Product]);
    }
}
