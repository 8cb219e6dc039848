//! Per-page data assembly.
//!
//! Each function gathers what one dashboard page shows. A page that cannot
//! render comes back as [`Page::Halted`] with the notice to display instead;
//! only unexpected data errors are returned as `Err`.

use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::{info, warn};

use crate::config::PanelConfig;
use crate::contacts::{contacts_csv, directions_link, email_link};
use crate::error::Result;
use crate::filter::{apply_filters, FilterCriteria};
use crate::loader::load_records;
use crate::map::{map_center, map_points, municipality_colors, record_at, MapPoint};
use crate::narrative::load_narratives;
use crate::ranking::{
    distribution, rank_in_scope, scope_of, GroupKey, Measure, RankEntry, Ranking, RankingScope,
    Reducer,
};
use crate::record::{records as to_records, FarmRecord};
use crate::render::{farm_sheet_html, rank_caption, story_page_html, trend_box_html, Notice};
use crate::schema::production;
use crate::summary::{
    community_summary, gender_shares, top_municipalities, top_products, CommunitySummary,
    GenderShare,
};
use crate::trend::{time_series, Trend};

#[derive(Debug, Clone)]
pub enum Page<T> {
    Ready(T),
    Halted(Notice),
}

impl<T> Page<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Page::Ready(v) => Some(v),
            Page::Halted(_) => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Page::Ready(_) => None,
            Page::Halted(n) => Some(n),
        }
    }
}

/// Records for any page; a load failure becomes an error notice.
pub fn load_page_records(config: &PanelConfig) -> Page<DataFrame> {
    match load_records(config) {
        Ok(df) => Page::Ready(df),
        Err(e) => {
            warn!(error = %e, "records unavailable");
            Page::Halted(Notice::from(&e))
        }
    }
}

/// Filtered rows or the "no results" warning.
fn filtered(records: &DataFrame, criteria: &FilterCriteria) -> Result<Page<DataFrame>> {
    let subset = apply_filters(records, criteria)?;
    if subset.height() == 0 {
        info!(active = ?criteria.active_fields(), "filters matched nothing");
        return Ok(Page::Halted(Notice::no_results()));
    }
    Ok(Page::Ready(subset))
}

// ── Map ─────────────────────────────────────────────────────────────────────

pub struct MapPage {
    pub records: DataFrame,
    pub points: Vec<MapPoint>,
    pub center: (f64, f64),
    pub colors: BTreeMap<String, String>,
    pub top_products: Vec<RankEntry>,
    pub top_municipalities: Vec<RankEntry>,
    pub gender_shares: Vec<GenderShare>,
}

pub fn map_page(
    records: &DataFrame,
    criteria: &FilterCriteria,
    config: &PanelConfig,
) -> Result<Page<MapPage>> {
    let subset = match filtered(records, criteria)? {
        Page::Ready(df) => df,
        Page::Halted(n) => return Ok(Page::Halted(n)),
    };

    let recs = to_records(&subset);
    let points = map_points(&recs);
    let center = map_center(&points, config);
    let colors = municipality_colors(&points);

    Ok(Page::Ready(MapPage {
        top_products: top_products(&subset, config.ranking_top_n)?,
        top_municipalities: top_municipalities(&subset, config.ranking_top_n)?,
        gender_shares: gender_shares(&subset)?,
        records: subset,
        points,
        center,
        colors,
    }))
}

/// Technical sheet of the family behind a clicked marker.
pub fn marker_sheet(
    page: &MapPage,
    lat: f64,
    lon: f64,
    config: &PanelConfig,
) -> Option<String> {
    let recs = to_records(&page.records);
    record_at(&recs, lat, lon, config.marker_tolerance)
        .map(farm_sheet_html)
}

// ── Trends ──────────────────────────────────────────────────────────────────

/// One of the three rankings beside the trend chart.
pub struct ScopedRanking {
    pub scope: RankingScope,
    pub ranking: Ranking,
    /// Top entries plus the selected key, for the highlighted bar chart.
    pub shown: Vec<RankEntry>,
    pub caption: String,
    pub notice: Option<Notice>,
}

pub struct TrendsPage {
    pub group_key: GroupKey,
    pub selected: String,
    pub rankings: Vec<ScopedRanking>,
    pub distribution: Vec<RankEntry>,
    pub trend: Trend,
    /// Trend box, or the insufficient-history warning.
    pub trend_html: String,
}

pub fn trends_page(
    records: &DataFrame,
    group_key: GroupKey,
    selected: &str,
    config: &PanelConfig,
) -> Result<TrendsPage> {
    let (state, region) = scope_of(records, group_key, selected, config)?;
    let scopes = [
        RankingScope::National,
        RankingScope::State(state),
        RankingScope::Region(region),
    ];

    let mut rankings = Vec::with_capacity(scopes.len());
    for scope in scopes {
        let ranking = rank_in_scope(records, &scope, group_key, Measure::Volume, Reducer::Sum)?;
        let name = scope.name();
        let notice = ranking.is_empty().then(|| Notice::empty_ranking(&name));
        let caption = rank_caption(group_key, selected, &name, ranking.position_of(selected));
        rankings.push(ScopedRanking {
            shown: ranking.top_with_selected(config.ranking_top_n, selected),
            scope,
            ranking,
            caption,
            notice,
        });
    }

    let trend = time_series(records, group_key, selected, production::YEAR, Measure::Volume)?;
    let trend_html = match trend.summary() {
        Some(summary) => trend_box_html(summary),
        None => Notice::insufficient_history(selected).to_html(),
    };

    Ok(TrendsPage {
        group_key,
        selected: selected.to_string(),
        rankings,
        distribution: distribution(records, group_key, selected, group_key.secondary())?,
        trend,
        trend_html,
    })
}

// ── Where to buy ────────────────────────────────────────────────────────────

pub struct ContactRow {
    pub record: FarmRecord,
    pub email_link: Option<String>,
    pub directions_link: Option<String>,
}

pub struct WhereToBuyPage {
    pub rows: Vec<ContactRow>,
    pub csv: Vec<u8>,
}

pub fn where_to_buy_page(
    records: &DataFrame,
    criteria: &FilterCriteria,
) -> Result<Page<WhereToBuyPage>> {
    let subset = match filtered(records, criteria)? {
        Page::Ready(df) => df,
        Page::Halted(n) => return Ok(Page::Halted(n)),
    };

    let rows = to_records(&subset)
        .into_iter()
        .map(|record| ContactRow {
            email_link: email_link(&record),
            directions_link: directions_link(&record),
            record,
        })
        .collect();

    Ok(Page::Ready(WhereToBuyPage {
        rows,
        csv: contacts_csv(&subset)?,
    }))
}

// ── Farmer panel and stories ────────────────────────────────────────────────

pub fn farmer_page(
    records: &DataFrame,
    municipality: &str,
    community: &str,
    config: &PanelConfig,
) -> Result<Page<CommunitySummary>> {
    Ok(
        match community_summary(records, municipality, community, config.community_top_products)? {
            Some(summary) => Page::Ready(summary),
            None => Page::Halted(Notice::info(format!(
                "Nenhuma família cadastrada na comunidade {community} ({municipality})."
            ))),
        },
    )
}

pub fn stories_page(config: &PanelConfig) -> String {
    story_page_html(&load_narratives(&config.narratives_path()))
}
