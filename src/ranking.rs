use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use tracing::debug;

use crate::config::PanelConfig;
use crate::error::{PanelError, Result};
use crate::filter::category;
use crate::record::text_at;
use crate::schema::*;

/// Categorical attribute used to bucket records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Municipality,
    Product,
    Community,
}

impl GroupKey {
    pub fn column(self) -> &'static str {
        match self {
            GroupKey::Municipality => identity::MUNICIPALITY,
            GroupKey::Product => production::PRIMARY_PRODUCT,
            GroupKey::Community => identity::COMMUNITY,
        }
    }

    /// Attribute used to break down a selected group's production.
    pub fn secondary(self) -> GroupKey {
        match self {
            GroupKey::Municipality | GroupKey::Community => GroupKey::Product,
            GroupKey::Product => GroupKey::Municipality,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupKey::Municipality => "Município",
            GroupKey::Product => "Produto",
            GroupKey::Community => "Comunidade",
        }
    }

    /// Key column as text, nulls read as [`sentinel::NOT_INFORMED`].
    pub(crate) fn expr(self) -> Expr {
        category(self.column())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GroupKey {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "municipality" | "município" | "municipio" => Ok(GroupKey::Municipality),
            "product" | "produto" => Ok(GroupKey::Product),
            "community" | "comunidade" => Ok(GroupKey::Community),
            _ => Err(PanelError::InvalidData(format!(
                "Invalid group key: '{s}'. Must be 'municipality', 'product' or 'community'"
            ))),
        }
    }
}

/// Numeric quantity reduced per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Volume,
    Area,
    /// Volume per hectare; rows with zero area count as zero.
    Productivity,
}

impl Measure {
    pub(crate) fn expr(self) -> Expr {
        match self {
            Measure::Volume => numeric(production::VOLUME_KG),
            Measure::Area => numeric(production::AREA_HA),
            Measure::Productivity => {
                let area = numeric(production::AREA_HA);
                when(area.clone().gt(lit(0.0)))
                    .then(numeric(production::VOLUME_KG) / area)
                    .otherwise(lit(0.0))
            }
        }
    }
}

impl FromStr for Measure {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "volume" => Ok(Measure::Volume),
            "area" => Ok(Measure::Area),
            "productivity" => Ok(Measure::Productivity),
            _ => Err(PanelError::InvalidData(format!(
                "Invalid measure: '{s}'. Must be 'volume', 'area' or 'productivity'"
            ))),
        }
    }
}

/// How a group's measure is reduced to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reducer {
    Sum,
    Mean,
    /// Number of distinct family names; ignores the measure.
    DistinctFamilies,
}

impl Reducer {
    fn agg(self, measure: Measure) -> Expr {
        let reduced = match self {
            Reducer::Sum => measure.expr().sum(),
            Reducer::Mean => measure.expr().mean(),
            Reducer::DistinctFamilies => col(identity::FAMILY).n_unique(),
        };
        reduced.cast(DataType::Float64).alias(derived::VALUE)
    }
}

impl FromStr for Reducer {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Reducer::Sum),
            "mean" | "avg" => Ok(Reducer::Mean),
            "count" | "families" => Ok(Reducer::DistinctFamilies),
            _ => Err(PanelError::InvalidData(format!(
                "Invalid reducer: '{s}'. Must be 'sum', 'mean' or 'count'"
            ))),
        }
    }
}

fn numeric(column: &str) -> Expr {
    col(column).cast(DataType::Float64).fill_null(lit(0.0))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub key: String,
    pub value: f64,
}

/// 1-based position of a group among `total` groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankPosition {
    pub position: usize,
    pub total: usize,
}

/// Groups sorted by reduced value, descending; ties ordered by key.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub group_key: GroupKey,
    pub entries: Vec<RankEntry>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self, n: usize) -> &[RankEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn get(&self, key: &str) -> Option<&RankEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// 1 + the number of groups with a strictly greater value, so tied
    /// groups share a position. `None` when `key` is not ranked.
    pub fn position_of(&self, key: &str) -> Option<RankPosition> {
        let entry = self.get(key)?;
        let greater = self
            .entries
            .iter()
            .filter(|e| e.value > entry.value)
            .count();
        Some(RankPosition {
            position: greater + 1,
            total: self.entries.len(),
        })
    }

    /// The first `n` entries, plus the selected entry when it ranks below
    /// them. Order stays descending.
    pub fn top_with_selected(&self, n: usize, selected: &str) -> Vec<RankEntry> {
        let mut shown = self.top(n).to_vec();
        if !shown.iter().any(|e| e.key == selected) {
            if let Some(entry) = self.get(selected) {
                shown.push(entry.clone());
            }
        }
        shown
    }
}

/// Group `records` by `group_key`, reduce `measure` with `reducer`, and sort
/// descending.
pub fn rank(
    records: &DataFrame,
    group_key: GroupKey,
    measure: Measure,
    reducer: Reducer,
) -> Result<Ranking> {
    let entries = grouped(
        records.clone().lazy(),
        group_key.expr(),
        reducer.agg(measure),
        true,
    )?;
    debug!(?group_key, ?measure, ?reducer, groups = entries.len(), "ranking computed");
    Ok(Ranking { group_key, entries })
}

/// Geographic scope a ranking is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingScope {
    National,
    State(String),
    Region(String),
}

impl RankingScope {
    pub fn name(&self) -> String {
        match self {
            RankingScope::National => "Nacional".to_string(),
            RankingScope::State(s) => format!("Estadual ({s})"),
            RankingScope::Region(r) => format!("Regional ({r})"),
        }
    }

    fn predicate(&self) -> Option<Expr> {
        match self {
            RankingScope::National => None,
            RankingScope::State(s) => Some(category(identity::STATE).eq(lit(s.clone()))),
            RankingScope::Region(r) => Some(category(identity::REGION).eq(lit(r.clone()))),
        }
    }
}

/// [`rank`] over the rows inside `scope`. An empty scope gives an empty
/// ranking.
pub fn rank_in_scope(
    records: &DataFrame,
    scope: &RankingScope,
    group_key: GroupKey,
    measure: Measure,
    reducer: Reducer,
) -> Result<Ranking> {
    match scope.predicate() {
        None => rank(records, group_key, measure, reducer),
        Some(predicate) => {
            let scoped = records.clone().lazy().filter(predicate).collect()?;
            rank(&scoped, group_key, measure, reducer)
        }
    }
}

/// State and region of the first row carrying `selected`, falling back to
/// the configured defaults.
pub fn scope_of(
    records: &DataFrame,
    group_key: GroupKey,
    selected: &str,
    config: &PanelConfig,
) -> Result<(String, String)> {
    let first = records
        .clone()
        .lazy()
        .filter(group_key.expr().eq(lit(selected.to_string())))
        .limit(1)
        .collect()?;

    let state = text_at(&first, identity::STATE, 0).unwrap_or_else(|| config.default_state.clone());
    let region =
        text_at(&first, identity::REGION, 0).unwrap_or_else(|| config.default_region.clone());
    Ok((state, region))
}

/// Volume of the rows where `group_key == selected`, summed per `by` key,
/// ascending.
pub fn distribution(
    records: &DataFrame,
    group_key: GroupKey,
    selected: &str,
    by: GroupKey,
) -> Result<Vec<RankEntry>> {
    let lazy = records
        .clone()
        .lazy()
        .filter(group_key.expr().eq(lit(selected.to_string())));
    grouped(lazy, by.expr(), Reducer::Sum.agg(Measure::Volume), false)
}

/// Group by `key`, aggregate to [`derived::VALUE`], and read back sorted
/// entries (by value, then key ascending).
pub(crate) fn grouped(
    lazy: LazyFrame,
    key: Expr,
    value: Expr,
    descending: bool,
) -> Result<Vec<RankEntry>> {
    let df = lazy
        .group_by([key.alias(derived::KEY)])
        .agg([value])
        .sort(
            [derived::VALUE, derived::KEY],
            SortMultipleOptions::default().with_order_descending_multi([descending, false]),
        )
        .collect()?;

    let keys = df.column(derived::KEY)?.str()?;
    let values = df.column(derived::VALUE)?.f64()?;

    Ok(keys
        .into_iter()
        .zip(values)
        .map(|(k, v)| RankEntry {
            key: k.unwrap_or(sentinel::NOT_INFORMED).to_string(),
            value: v.unwrap_or(0.0),
        })
        .collect())
}
