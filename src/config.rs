use std::path::{Path, PathBuf};

/// Paths and defaults shared by every page.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub base_path: PathBuf,
    pub records_file: String,
    pub narratives_file: String,
    /// Used when the survey file has no `Estado` column.
    pub default_state: String,
    /// Used when the survey file has no `Região` column.
    pub default_region: String,
    /// (latitude, longitude) shown when no record is map-eligible.
    pub map_fallback_center: (f64, f64),
    /// Max coordinate distance between a clicked marker and its record.
    pub marker_tolerance: f64,
    pub ranking_top_n: usize,
    pub community_top_products: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            records_file: "data/familias_agricultoras.csv".to_string(),
            narratives_file: "historias.json".to_string(),
            default_state: "SE".to_string(),
            default_region: "Nordeste".to_string(),
            map_fallback_center: (-10.57, -37.38),
            marker_tolerance: 0.00001,
            ranking_top_n: 10,
            community_top_products: 3,
        }
    }
}

impl PanelConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    pub fn with_records_file(mut self, name: impl Into<String>) -> Self {
        self.records_file = name.into();
        self
    }

    pub fn with_narratives_file(mut self, name: impl Into<String>) -> Self {
        self.narratives_file = name.into();
        self
    }

    pub fn with_defaults(mut self, state: impl Into<String>, region: impl Into<String>) -> Self {
        self.default_state = state.into();
        self.default_region = region.into();
        self
    }

    pub fn records_path(&self) -> PathBuf {
        self.resolve(&self.records_file)
    }

    pub fn narratives_path(&self) -> PathBuf {
        self.resolve(&self.narratives_file)
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let p = Path::new(name);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_path.join(p)
        }
    }
}
