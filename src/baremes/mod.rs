//! Rate tables (barèmes) for every formula
//!
//! The 2026 values are embedded as each barème's `Default`. A directory of
//! CSV files can override them without recompiling; keys it does not
//! define keep their embedded value.

pub mod audit;
pub mod loader;

pub use audit::{auditer, Anomalie, Gravite};
pub use loader::LoadedBaremes;

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocations::{
    AahBareme, AplBareme, AplEtudiantBareme, AreBareme, AsfBareme, PrimeActiviteBareme, RsaBareme,
};
use crate::error::BaremeError;
use crate::fiscalite::{BaremeIr, IkBareme, NotaireBareme, SalaireBareme};

/// One band of a progressive barème; `plafond` is the cumulative upper bound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tranche {
    pub plafond: f64,
    pub taux: f64,
}

impl Tranche {
    pub const fn new(plafond: f64, taux: f64) -> Self {
        Self { plafond, taux }
    }
}

/// Sum of `assiette` split across cumulative bands, each slice at its band's rate
pub fn cumul_tranches(assiette: f64, tranches: &[Tranche]) -> f64 {
    let mut total = 0.0;
    let mut precedent = 0.0;
    for tranche in tranches {
        let base = (assiette.min(tranche.plafond) - precedent).max(0.0);
        total += base * tranche.taux;
        precedent = tranche.plafond;
        if assiette <= tranche.plafond {
            break;
        }
    }
    total
}

/// Year the barèmes apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Millesime {
    pub annee: u16,
    pub date_effet: NaiveDate,
}

impl Default for Millesime {
    fn default() -> Self {
        Self {
            annee: 2026,
            date_effet: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Container for every formula's barème
#[derive(Debug, Clone, PartialEq)]
pub struct Baremes {
    pub millesime: Millesime,
    pub are: AreBareme,
    pub asf: AsfBareme,
    pub apl: AplBareme,
    pub apl_etudiant: AplEtudiantBareme,
    pub aah: AahBareme,
    pub rsa: RsaBareme,
    pub prime_activite: PrimeActiviteBareme,
    pub impot: BaremeIr,
    pub salaire: SalaireBareme,
    pub notaire: NotaireBareme,
    pub ik: IkBareme,
}

impl Baremes {
    /// Embedded 2026 barèmes
    pub fn officiels_2026() -> Self {
        Self {
            millesime: Millesime::default(),
            are: AreBareme::default(),
            asf: AsfBareme::default(),
            apl: AplBareme::default(),
            apl_etudiant: AplEtudiantBareme::default(),
            aah: AahBareme::default(),
            rsa: RsaBareme::default(),
            prime_activite: PrimeActiviteBareme::default(),
            impot: BaremeIr::default(),
            salaire: SalaireBareme::default(),
            notaire: NotaireBareme::default(),
            ik: IkBareme::default(),
        }
    }

    /// Load barèmes from CSV files in the default location (data/baremes/)
    pub fn from_csv() -> Result<Self, BaremeError> {
        Self::from_csv_path(Path::new(loader::DEFAULT_BAREMES_PATH))
    }

    /// Load barèmes from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self, BaremeError> {
        let loaded = LoadedBaremes::load_from(path)?;
        Ok(Self::from_loaded(&loaded))
    }

    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        Self {
            millesime: loaded.millesime,
            are: AreBareme::from_loaded(loaded),
            asf: AsfBareme::from_loaded(loaded),
            apl: AplBareme::from_loaded(loaded),
            apl_etudiant: AplEtudiantBareme::from_loaded(loaded),
            aah: AahBareme::from_loaded(loaded),
            rsa: RsaBareme::from_loaded(loaded),
            prime_activite: PrimeActiviteBareme::from_loaded(loaded),
            impot: BaremeIr::from_loaded(loaded),
            salaire: SalaireBareme::from_loaded(loaded),
            notaire: NotaireBareme::from_loaded(loaded),
            ik: IkBareme::from_loaded(loaded),
        }
    }
}

impl Default for Baremes {
    fn default() -> Self {
        Self::officiels_2026()
    }
}
