//! APL for students and young workers (simplified model)
//!
//! Covers a fixed share of the rent, capped by situation, for households
//! under a resource ceiling and paying at least a minimum rent.

use log::debug;
use serde::{Deserialize, Serialize};

use super::SituationFoyer;
use crate::baremes::loader::LoadedBaremes;
use crate::format::arrondi_centimes;

#[derive(Debug, Clone, PartialEq)]
pub struct AplEtudiantBareme {
    pub ressources_seul: f64,
    pub ressources_couple: f64,
    pub ressources_parent: f64,
    pub ressources_par_personne_charge: f64,

    /// Share of the rent covered
    pub pourcentage_loyer: f64,

    /// Rent below this amount is not covered
    pub loyer_minimum: f64,

    pub plafond_seul: f64,
    pub plafond_couple: f64,
    pub plafond_parent: f64,
    pub plafond_par_personne_charge: f64,
}

impl Default for AplEtudiantBareme {
    fn default() -> Self {
        Self {
            ressources_seul: 1500.0,
            ressources_couple: 2200.0,
            ressources_parent: 1800.0,
            ressources_par_personne_charge: 600.0,
            pourcentage_loyer: 0.55,
            loyer_minimum: 150.0,
            plafond_seul: 350.0,
            plafond_couple: 420.0,
            plafond_parent: 380.0,
            plafond_par_personne_charge: 50.0,
        }
    }
}

impl AplEtudiantBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        let p = |cle: &str, v: f64| loaded.param_or(&format!("apl_etudiant.{}", cle), v);
        Self {
            ressources_seul: p("ressources_seul", d.ressources_seul),
            ressources_couple: p("ressources_couple", d.ressources_couple),
            ressources_parent: p("ressources_parent", d.ressources_parent),
            ressources_par_personne_charge: p(
                "ressources_par_personne_charge",
                d.ressources_par_personne_charge,
            ),
            pourcentage_loyer: p("pourcentage_loyer", d.pourcentage_loyer),
            loyer_minimum: p("loyer_minimum", d.loyer_minimum),
            plafond_seul: p("plafond_seul", d.plafond_seul),
            plafond_couple: p("plafond_couple", d.plafond_couple),
            plafond_parent: p("plafond_parent", d.plafond_parent),
            plafond_par_personne_charge: p(
                "plafond_par_personne_charge",
                d.plafond_par_personne_charge,
            ),
        }
    }

    /// Monthly resource ceiling
    pub fn ressources_maxi(&self, situation: SituationFoyer, personnes_charge: u32) -> f64 {
        match situation {
            SituationFoyer::Seul => self.ressources_seul,
            SituationFoyer::Couple => self.ressources_couple,
            SituationFoyer::Parent => {
                self.ressources_parent
                    + personnes_charge as f64 * self.ressources_par_personne_charge
            }
        }
    }

    /// Monthly allowance ceiling
    pub fn plafond_mensuel(&self, situation: SituationFoyer, personnes_charge: u32) -> f64 {
        match situation {
            SituationFoyer::Seul => self.plafond_seul,
            SituationFoyer::Couple => self.plafond_couple,
            SituationFoyer::Parent => {
                self.plafond_parent + personnes_charge as f64 * self.plafond_par_personne_charge
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AplEtudiantInput {
    pub situation: SituationFoyer,
    pub age: u32,
    /// Monthly income
    pub revenus: f64,
    /// Monthly rent
    pub charges_locatives: f64,
    pub personnes_charge: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AplEtudiantDetails {
    pub ressources_maxi: f64,
    pub pourcentage_loyer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AplEtudiantResult {
    pub eligible: bool,
    pub montant_estime: f64,
    pub explication: String,
    pub details: AplEtudiantDetails,
}

/// Estimate the student APL
pub fn calculer_apl_etudiant(
    input: &AplEtudiantInput,
    bareme: &AplEtudiantBareme,
) -> AplEtudiantResult {
    let ressources_maxi = bareme.ressources_maxi(input.situation, input.personnes_charge);

    if input.revenus > ressources_maxi {
        debug!("APL étudiant: income {} above ceiling {}", input.revenus, ressources_maxi);
        return AplEtudiantResult {
            eligible: false,
            montant_estime: 0.0,
            explication: format!(
                "Vos revenus ({}€) dépassent le plafond autorisé ({}€). \
                 Vous ne pouvez pas bénéficier de l'APL étudiant.",
                input.revenus, ressources_maxi
            ),
            details: AplEtudiantDetails {
                ressources_maxi,
                pourcentage_loyer: 0.0,
            },
        };
    }

    if input.charges_locatives < bareme.loyer_minimum {
        return AplEtudiantResult {
            eligible: false,
            montant_estime: 0.0,
            explication: format!(
                "Le loyer ({}€) est inférieur au minimum requis ({}€).",
                input.charges_locatives, bareme.loyer_minimum
            ),
            details: AplEtudiantDetails {
                ressources_maxi,
                pourcentage_loyer: 0.0,
            },
        };
    }

    let plafond = bareme.plafond_mensuel(input.situation, input.personnes_charge);
    let montant = arrondi_centimes((input.charges_locatives * bareme.pourcentage_loyer).min(plafond));

    debug!(
        "APL étudiant: rent {} × {} capped at {} -> {:.2}",
        input.charges_locatives, bareme.pourcentage_loyer, plafond, montant
    );

    AplEtudiantResult {
        eligible: true,
        montant_estime: montant,
        explication: format!(
            "En fonction de votre situation, vous pourriez percevoir environ {:.2}€ par mois. \
             Ce montant dépend notamment de la zone géographique du logement, du loyer retenu par la CAF \
             et de votre situation personnelle. Consultez la CAF pour confirmer.",
            montant
        ),
        details: AplEtudiantDetails {
            ressources_maxi,
            pourcentage_loyer: bareme.pourcentage_loyer,
        },
    }
}
