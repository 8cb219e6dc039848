//! Data core of the family-farm dashboard: survey loading, filtering,
//! rankings and yearly trends, map/contact/story page data.

pub mod config;
pub mod contacts;
pub mod error;
pub mod filter;
pub mod loader;
pub mod map;
pub mod narrative;
pub mod pages;
pub mod ranking;
pub mod record;
pub mod render;
pub mod schema;
pub mod session;
pub mod summary;
pub mod trend;

#[cfg(feature = "python")]
mod python;

pub use config::PanelConfig;
pub use error::{PanelError, Result};
pub use filter::{apply_filters, FilterCriteria, FilterField};
pub use loader::{load_records, load_records_from};
pub use ranking::{rank, GroupKey, Measure, RankEntry, RankPosition, Ranking, Reducer};
pub use record::FarmRecord;
pub use session::{FilterLock, SessionState};
pub use trend::{time_series, Trend, TrendSummary};

#[cfg(test)]
pub(crate) mod fixtures {
    use polars::prelude::*;

    use crate::schema::*;

    /// Two municipalities, three rows: A=100+50, B=200.
    pub fn three_rows() -> DataFrame {
        df!(
            identity::FAMILY => &["f1", "f2", "f3"],
            identity::MUNICIPALITY => &["A", "A", "B"],
            production::VOLUME_KG => &[100.0, 50.0, 200.0],
        )
        .unwrap()
    }

    /// Five families across three municipalities, as they look after loading.
    /// Souza has no certification and Oliveira no longitude.
    pub fn sample_records() -> DataFrame {
        df!(
            identity::FAMILY => &["Silva", "Santos", "Oliveira", "Souza", "Lima"],
            identity::MUNICIPALITY => &["Lagarto", "Lagarto", "Itabaiana", "Itabaiana", "Juazeiro"],
            identity::COMMUNITY => &["Colônia Treze", "Colônia Treze", "Serra", "Serra", "Vale"],
            identity::GENDER => &["Feminino", "Masculino", "Feminino", "Masculino", "Feminino"],
            production::PRIMARY_PRODUCT => &["Mandioca", "Hortaliças", "Hortaliças", "Mandioca", "Manga"],
            production::SECONDARY_PRODUCT => &[Some("Feijão"), None, Some("Frutas"), None, None],
            commerce::CERTIFICATION => &[
                Some("Orgânico por Auditoria"),
                Some("OCS"),
                Some("Orgânico por Auditoria"),
                None,
                Some("OCS"),
            ],
            production::AREA_HA => &[2.0, 1.5, 0.0, 3.0, 5.0],
            production::VOLUME_KG => &[1200.0, 800.0, 500.0, 2000.0, 3000.0],
            commerce::SALE_METHOD => &[Some("Feira"), Some("Cesta"), Some("Feira"), Some("Feira"), Some("Mercado")],
            commerce::ASSOCIATION => &[Some("Coopertreze"), None, Some("Assoc Serra"), None, None],
            commerce::PHONE => &[Some("79999990001"), Some("79999990002"), None, Some("79999990004"), None],
            commerce::EMAIL => &[Some("silva@exemplo.org"), None, Some("oliveira@exemplo.org"), None, None],
            geo::LATITUDE => &[Some(-10.91), Some(-10.92), Some(-10.68), Some(-10.69), Some(-9.41)],
            geo::LONGITUDE => &[Some(-37.65), Some(-37.66), None, Some(-37.42), Some(-40.50)],
            production::YEAR => &[2021i64, 2022, 2021, 2022, 2022],
            identity::STATE => &["SE", "SE", "SE", "SE", "BA"],
            identity::REGION => &["Nordeste", "Nordeste", "Nordeste", "Nordeste", "Nordeste"],
        )
        .unwrap()
    }
}
