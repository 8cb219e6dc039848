use std::collections::HashSet;

use polars::prelude::*;

use crate::error::Result;
use crate::filter::category;
use crate::ranking::{grouped, rank, GroupKey, Measure, RankEntry, Reducer};
use crate::record::records as to_records;
use crate::schema::*;

// ── Overview charts ─────────────────────────────────────────────────────────

/// Products with the largest total volume, descending.
pub fn top_products(records: &DataFrame, n: usize) -> Result<Vec<RankEntry>> {
    let ranking = rank(records, GroupKey::Product, Measure::Volume, Reducer::Sum)?;
    Ok(ranking.top(n).to_vec())
}

/// Municipalities with the largest total volume, descending.
pub fn top_municipalities(records: &DataFrame, n: usize) -> Result<Vec<RankEntry>> {
    let ranking = rank(records, GroupKey::Municipality, Measure::Volume, Reducer::Sum)?;
    Ok(ranking.top(n).to_vec())
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenderShare {
    pub label: String,
    pub count: usize,
    pub fraction: f64,
}

/// Records per responsible-party gender, most frequent first.
pub fn gender_shares(records: &DataFrame) -> Result<Vec<GenderShare>> {
    let counts = grouped(
        records.clone().lazy(),
        category(identity::GENDER),
        len().cast(DataType::Float64).alias(derived::VALUE),
        true,
    )?;
    let total = records.height().max(1) as f64;

    Ok(counts
        .into_iter()
        .map(|e| GenderShare {
            label: e.key,
            count: e.value as usize,
            fraction: e.value / total,
        })
        .collect())
}

// ── Farmer panel ────────────────────────────────────────────────────────────

/// What a farmer sees about their own community.
#[derive(Debug, Clone)]
pub struct CommunitySummary {
    pub municipality: String,
    pub community: String,
    /// Distinct family names.
    pub families: usize,
    pub total_volume_kg: f64,
    pub top_products: Vec<RankEntry>,
    /// Family, primary product, certification and phone of each member.
    pub members: DataFrame,
}

/// `None` when nothing is registered for the community.
pub fn community_summary(
    records: &DataFrame,
    municipality: &str,
    community: &str,
    top_n: usize,
) -> Result<Option<CommunitySummary>> {
    let rows = records
        .clone()
        .lazy()
        .filter(
            category(identity::MUNICIPALITY)
                .eq(lit(municipality.to_string()))
                .and(category(identity::COMMUNITY).eq(lit(community.to_string()))),
        )
        .collect()?;

    if rows.height() == 0 {
        return Ok(None);
    }

    let recs = to_records(&rows);
    let families = recs
        .iter()
        .map(|r| r.family.as_str())
        .collect::<HashSet<_>>()
        .len();
    let total_volume_kg = recs.iter().map(|r| r.volume_kg).sum();

    Ok(Some(CommunitySummary {
        municipality: municipality.to_string(),
        community: community.to_string(),
        families,
        total_volume_kg,
        top_products: top_products(&rows, top_n)?,
        members: rows.select([
            identity::FAMILY,
            production::PRIMARY_PRODUCT,
            commerce::CERTIFICATION,
            commerce::PHONE,
        ])?,
    }))
}
