use thiserror::Error;

#[derive(Error, Debug)]
pub enum KinshipError {
    #[error("Pedigree contains a parentage cycle ({unresolved} individuals could not be leveled)")]
    CycleDetected { unresolved: usize },

    #[error("Individuals '{first}' and '{second}' must belong to the same tree")]
    SameTreeRequired { first: String, second: String },

    #[error("Individual '{0}' not found")]
    IndividualNotFound(String),

    #[error("Individual '{0}' has no order in the topology")]
    NotInTopology(String),

    #[error("Pedigree error: {0}")]
    Pedigree(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl KinshipError {
    /// Whether the error points at inconsistent pedigree data rather than a
    /// caller mistake.
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::CycleDetected { .. } | Self::Pedigree(_))
    }
}

pub type Result<T> = std::result::Result<T, KinshipError>;
