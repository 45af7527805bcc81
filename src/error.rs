//! Error types
//!
//! Ineligibility is never an error: formulas report it through their result
//! record. These types only cover refused inputs and barème loading.

use std::path::PathBuf;
use thiserror::Error;

/// Input refused by a formula (negative income, zero tax parts, ...)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculError {
    #[error("entrée invalide pour `{champ}`: {raison}")]
    InvalidInput {
        champ: &'static str,
        raison: String,
    },
}

impl CalculError {
    pub fn invalid(champ: &'static str, raison: impl Into<String>) -> Self {
        CalculError::InvalidInput {
            champ,
            raison: raison.into(),
        }
    }
}

/// Failure while loading barèmes from a directory of CSV files
#[derive(Debug, Error)]
pub enum BaremeError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {fichier}: {source}")]
    Csv {
        fichier: String,
        #[source]
        source: csv::Error,
    },

    #[error("{fichier} line {ligne}: cannot parse `{valeur}`")]
    Parse {
        fichier: String,
        ligne: usize,
        valeur: String,
    },

    #[error("{fichier} line {ligne}: unknown DMTO category `{categorie}`")]
    UnknownCategory {
        fichier: String,
        ligne: usize,
        categorie: String,
    },

    #[error("{fichier}: band ceilings must be strictly ascending (line {ligne})")]
    BandsNotAscending { fichier: String, ligne: usize },

    #[error("{fichier} is empty")]
    Empty { fichier: String },
}

/// Refused addition to a scenario comparison
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComparaisonError {
    #[error("Vous ne pouvez comparer que {capacite} scénarios maximum")]
    Pleine { capacite: usize },
}

/// Failure while exporting results to CSV
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot serialise result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
