use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Data file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Missing columns {missing:?}; columns found: {found:?}")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, PanelError>;

#[cfg(feature = "python")]
impl From<PanelError> for pyo3::PyErr {
    fn from(err: PanelError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_found_columns() {
        let err = PanelError::MissingColumns {
            missing: vec!["Latitude".into()],
            found: vec!["Município".into(), "Longitude".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Latitude"));
        assert!(msg.contains("Município"));
    }
}
