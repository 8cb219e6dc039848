use polars::prelude::*;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyModule};
use pyo3_polars::PyDataFrame;

use crate::config::PanelConfig;
use crate::contacts::contacts_csv;
use crate::error::PanelError;
use crate::filter::{apply_filters, communities_in, filter_options, FilterCriteria, FilterField};
use crate::loader::load_records;
use crate::narrative::load_narratives;
use crate::pages::farmer_page;
use crate::ranking::{rank_in_scope, GroupKey, Measure, RankingScope, Reducer};
use crate::record::records as to_records;
use crate::render::{farm_sheet_html, story_page_html, trend_box_html, Notice};
use crate::schema;
use crate::session::{FilterLock, SessionState};
use crate::trend::{time_series, Trend};

/// Yearly trend exposed to Python.
#[pyclass(name = "Trend", get_all)]
#[derive(Clone)]
pub struct PyTrend {
    years: Vec<i64>,
    values: Vec<f64>,
    sufficient: bool,
    percent_change: Option<f64>,
    peak_year: Option<i64>,
    trough_year: Option<i64>,
    html: String,
}

impl PyTrend {
    fn new(trend: &Trend, selected: &str) -> Self {
        match trend {
            Trend::Insufficient { .. } => Self {
                years: Vec::new(),
                values: Vec::new(),
                sufficient: false,
                percent_change: None,
                peak_year: None,
                trough_year: None,
                html: Notice::insufficient_history(selected).to_html(),
            },
            Trend::Series(s) => Self {
                years: s.points.iter().map(|p| p.year).collect(),
                values: s.points.iter().map(|p| p.value).collect(),
                sufficient: true,
                percent_change: Some(s.percent_change),
                peak_year: Some(s.peak_year),
                trough_year: Some(s.trough_year),
                html: trend_box_html(s),
            },
        }
    }
}

#[pyclass]
pub struct PanelModel {
    config: PanelConfig,
    records: Option<DataFrame>,
    session: SessionState,
    lock: FilterLock,
}

#[pymethods]
impl PanelModel {
    #[new]
    #[pyo3(signature = (base_path, records_file=None, narratives_file=None))]
    fn new(base_path: String, records_file: Option<String>, narratives_file: Option<String>) -> Self {
        let mut config = PanelConfig::new(base_path);
        if let Some(f) = records_file {
            config = config.with_records_file(f);
        }
        if let Some(f) = narratives_file {
            config = config.with_narratives_file(f);
        }
        Self {
            config,
            records: None,
            session: SessionState::new(),
            lock: FilterLock::Open,
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    fn load_records(&mut self) -> PyResult<PyDataFrame> {
        let df = load_records(&self.config)?;
        self.records = Some(df.clone());
        Ok(PyDataFrame(df))
    }

    #[getter]
    fn records_df(&self) -> PyResult<Option<PyDataFrame>> {
        Ok(self.records.clone().map(PyDataFrame))
    }

    // ── Filters ─────────────────────────────────────────────────────────────

    /// Select a filter value. Returns False when another filter holds the lock.
    fn select_filter(&mut self, field: &str, value: &str) -> PyResult<bool> {
        let field: FilterField = field.parse()?;
        let mut criteria = FilterCriteria::from_session(&self.session);
        let accepted = self.lock.select(&mut criteria, field, value);
        if accepted {
            criteria.store_in(&mut self.session);
        }
        Ok(accepted)
    }

    fn is_filter_enabled(&self, field: &str) -> PyResult<bool> {
        Ok(self.lock.is_enabled(field.parse()?))
    }

    fn clear_filters(&mut self) {
        self.lock.reset(&mut self.session);
    }

    /// Records matching the stored filter selections.
    fn apply_filters(&self) -> PyResult<PyDataFrame> {
        let criteria = FilterCriteria::from_session(&self.session);
        Ok(PyDataFrame(apply_filters(self.loaded()?, &criteria)?))
    }

    fn filter_options(&self, column: &str) -> PyResult<Vec<String>> {
        Ok(filter_options(self.loaded()?, column)?)
    }

    fn communities_in(&self, municipality: &str) -> PyResult<Vec<String>> {
        Ok(communities_in(self.loaded()?, municipality)?)
    }

    // ── Rankings and trends ─────────────────────────────────────────────────

    /// Ranked (key, value) pairs. `scope` is "national", "state:<UF>" or
    /// "region:<name>".
    #[pyo3(signature = (group_key, measure="volume", reducer="sum", scope="national"))]
    fn rank(
        &self,
        group_key: &str,
        measure: &str,
        reducer: &str,
        scope: &str,
    ) -> PyResult<Vec<(String, f64)>> {
        let group_key: GroupKey = group_key.parse()?;
        let measure: Measure = measure.parse()?;
        let reducer: Reducer = reducer.parse()?;
        let scope = parse_scope(scope)?;
        let ranking = rank_in_scope(self.loaded()?, &scope, group_key, measure, reducer)?;
        Ok(ranking.entries.into_iter().map(|e| (e.key, e.value)).collect())
    }

    #[pyo3(signature = (group_key, selected, measure="volume"))]
    fn time_series(&self, group_key: &str, selected: &str, measure: &str) -> PyResult<PyTrend> {
        let group_key: GroupKey = group_key.parse()?;
        let measure: Measure = measure.parse()?;
        let trend = time_series(
            self.loaded()?,
            group_key,
            selected,
            schema::production::YEAR,
            measure,
        )?;
        Ok(PyTrend::new(&trend, selected))
    }

    // ── Pages ───────────────────────────────────────────────────────────────

    /// Contact export of the filtered records as CSV bytes.
    fn contacts_csv<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let criteria = FilterCriteria::from_session(&self.session);
        let subset = apply_filters(self.loaded()?, &criteria)?;
        let bytes = contacts_csv(&subset)?;
        Ok(PyBytes::new(py, &bytes))
    }

    fn export_contacts(&self, path: &str) -> PyResult<()> {
        let criteria = FilterCriteria::from_session(&self.session);
        let subset = apply_filters(self.loaded()?, &criteria)?;
        let bytes = contacts_csv(&subset)?;
        std::fs::write(path, bytes).map_err(PanelError::from)?;
        Ok(())
    }

    fn farm_sheet(&self, row: usize) -> PyResult<Option<String>> {
        let recs = to_records(self.loaded()?);
        Ok(recs.get(row).map(farm_sheet_html))
    }

    /// Community summary members, or None when the community is empty.
    fn community_members(
        &self,
        municipality: &str,
        community: &str,
    ) -> PyResult<Option<PyDataFrame>> {
        let page = farmer_page(self.loaded()?, municipality, community, &self.config)?;
        Ok(page.ready().map(|s| PyDataFrame(s.members)))
    }

    fn stories_html(&self) -> String {
        story_page_html(&load_narratives(&self.config.narratives_path()))
    }
}

impl PanelModel {
    fn loaded(&self) -> Result<&DataFrame, PanelError> {
        self.records
            .as_ref()
            .ok_or_else(|| PanelError::NotLoaded("records".into()))
    }
}

fn parse_scope(scope: &str) -> Result<RankingScope, PanelError> {
    match scope.split_once(':') {
        None if scope.eq_ignore_ascii_case("national") => Ok(RankingScope::National),
        Some(("state", s)) => Ok(RankingScope::State(s.to_string())),
        Some(("region", r)) => Ok(RankingScope::Region(r.to_string())),
        _ => Err(PanelError::InvalidData(format!("Unknown scope: {scope}"))),
    }
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let identity = PyModule::new(m.py(), "identity")?;
    identity.add("FAMILY", schema::identity::FAMILY)?;
    identity.add("MUNICIPALITY", schema::identity::MUNICIPALITY)?;
    identity.add("COMMUNITY", schema::identity::COMMUNITY)?;
    identity.add("GENDER", schema::identity::GENDER)?;
    identity.add("STATE", schema::identity::STATE)?;
    identity.add("REGION", schema::identity::REGION)?;
    m.add_submodule(&identity)?;

    let geo = PyModule::new(m.py(), "geo")?;
    geo.add("LATITUDE", schema::geo::LATITUDE)?;
    geo.add("LONGITUDE", schema::geo::LONGITUDE)?;
    m.add_submodule(&geo)?;

    let production = PyModule::new(m.py(), "production")?;
    production.add("PRIMARY_PRODUCT", schema::production::PRIMARY_PRODUCT)?;
    production.add("SECONDARY_PRODUCT", schema::production::SECONDARY_PRODUCT)?;
    production.add("AREA_HA", schema::production::AREA_HA)?;
    production.add("VOLUME_KG", schema::production::VOLUME_KG)?;
    production.add("YEAR", schema::production::YEAR)?;
    m.add_submodule(&production)?;

    let commerce = PyModule::new(m.py(), "commerce")?;
    commerce.add("CERTIFICATION", schema::commerce::CERTIFICATION)?;
    commerce.add("SALE_METHOD", schema::commerce::SALE_METHOD)?;
    commerce.add("ASSOCIATION", schema::commerce::ASSOCIATION)?;
    commerce.add("PHONE", schema::commerce::PHONE)?;
    commerce.add("EMAIL", schema::commerce::EMAIL)?;
    m.add_submodule(&commerce)?;

    let sentinel = PyModule::new(m.py(), "sentinel")?;
    sentinel.add("ALL", schema::sentinel::ALL)?;
    sentinel.add("NOT_INFORMED", schema::sentinel::NOT_INFORMED)?;
    m.add_submodule(&sentinel)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PanelModel>()?;
    m.add_class::<PyTrend>()?;
    add_schema_exports(m)?;
    Ok(())
}
