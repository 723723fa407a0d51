use std::path::PathBuf;

/// Failures loading the reference catalog. All of these abort startup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read reference catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reference catalog {path} is not a JSON object of ranges: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("reference entry '{name}' is invalid: {reason}")]
    InvalidEntry { name: String, reason: String },
    #[error("reference catalog {path} contains no entries")]
    Empty { path: PathBuf },
    #[error("cannot build value matcher for '{name}': {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Per-document and per-query failures.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no text could be extracted from the document")]
    ExtractionFailed,
    #[error("no lab values could be extracted from the document ({catalog_size} tests checked)")]
    NoMeasurementsFound { catalog_size: usize },
    #[error("test '{0}' not found in the reference catalog")]
    UnknownTest(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("corrupt history record: {0}")]
    CorruptRecord(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LabError {
    /// True when the caller supplied something unusable, as opposed to a
    /// misconfigured catalog or a failing store.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, LabError::Analysis(_))
    }
}

pub type LabResult<T> = Result<T, LabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_failures_count_as_bad_input() {
        let err = LabError::from(AnalysisError::NoMeasurementsFound { catalog_size: 3 });
        assert!(err.is_bad_input());
        assert!(err.to_string().contains("3 tests checked"));
    }

    #[test]
    fn catalog_failures_are_misconfiguration() {
        let err = LabError::from(CatalogError::Empty {
            path: PathBuf::from("ranges.json"),
        });
        assert!(!err.is_bad_input());
    }
}
