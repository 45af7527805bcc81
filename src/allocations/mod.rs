//! Social allowance estimators (CAF / France Travail)
//!
//! Each formula is an independent pure function taking an input record and
//! its barème, and returning a result record. Ineligibility is reported in
//! the result (`eligible: false` plus a French explanation), never as an
//! error. The only exception is [`apl::calculer_apl`], which refuses
//! negative or non-finite amounts.

pub mod are;
pub mod asf;
pub mod apl;
pub mod apl_etudiant;
pub mod aah;
pub mod rsa;
pub mod prime_activite;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use are::{calculer_are, AreBareme, AreInput, AreResult};
pub use asf::{calculer_asf, AsfBareme, AsfInput, AsfResult, SituationAsf};
pub use apl::{calculer_apl, AplBareme, AplData, AplInput, SituationApl, TypeLogement, Zone};
pub use apl_etudiant::{calculer_apl_etudiant, AplEtudiantBareme, AplEtudiantInput, AplEtudiantResult};
pub use aah::{calculer_aah, AahBareme, AahInput, AahResult, LogementAah};
pub use rsa::{calculer_rsa, Activite, LogementRsa, RsaBareme, RsaInput, RsaResult};
pub use prime_activite::{
    calculer_prime_activite, LogementPrime, PrimeActiviteBareme, PrimeActiviteInput,
    PrimeActiviteResult, TypeActivite,
};

/// Household situation used by the ARE and student APL forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SituationFoyer {
    Seul,
    Couple,
    Parent,
}

/// Family situation used by the AAH, RSA and prime d'activité forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SituationFamiliale {
    Seul,
    Couple,
    Monoparental,
}

/// Eligibility label shown next to the amount on income-tested allowances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibilite {
    #[serde(rename = "Probablement éligible")]
    ProbablementEligible,
    /// Eligible, but the amount falls under the "very small" threshold
    #[serde(rename = "Éligible (montant très réduit)")]
    MontantReduit,
    /// Same as `MontantReduit`, worded as on the prime d'activité page
    #[serde(rename = "Éligible (montant très faible)")]
    MontantTresFaible,
    #[serde(rename = "Non éligible")]
    NonEligible,
    /// Income above the indicative ceiling
    #[serde(rename = "Probablement non éligible")]
    ProbablementNonEligible,
}

impl Eligibilite {
    pub fn libelle(&self) -> &'static str {
        match self {
            Eligibilite::ProbablementEligible => "Probablement éligible",
            Eligibilite::MontantReduit => "Éligible (montant très réduit)",
            Eligibilite::MontantTresFaible => "Éligible (montant très faible)",
            Eligibilite::NonEligible => "Non éligible",
            Eligibilite::ProbablementNonEligible => "Probablement non éligible",
        }
    }
}

impl std::fmt::Display for Eligibilite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.libelle())
    }
}
