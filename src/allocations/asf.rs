//! ASF (Allocation de soutien familial) - single-parent and orphan support

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::baremes::loader::LoadedBaremes;
use crate::format::arrondi_centimes;

/// ASF amounts and resource ceiling
#[derive(Debug, Clone, PartialEq)]
pub struct AsfBareme {
    /// Monthly amount per eligible child
    pub montant_par_enfant: f64,

    /// Resource ceiling = base + per child × number of children
    pub plafond_base: f64,
    pub plafond_par_enfant: f64,

    /// Children counted for the amount
    pub enfants_max: u32,
}

impl Default for AsfBareme {
    fn default() -> Self {
        // service-public.fr, montant au 1er avril 2025 (taux de base)
        Self {
            montant_par_enfant: 199.19,
            plafond_base: 945.0,
            plafond_par_enfant: 250.0,
            enfants_max: 3,
        }
    }
}

impl AsfBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        Self {
            montant_par_enfant: loaded.param_or("asf.montant_par_enfant", d.montant_par_enfant),
            plafond_base: loaded.param_or("asf.plafond_base", d.plafond_base),
            plafond_par_enfant: loaded.param_or("asf.plafond_par_enfant", d.plafond_par_enfant),
            enfants_max: loaded.param_u32_or("asf.enfants_max", d.enfants_max),
        }
    }

    /// Resource ceiling for a household with `nombre_enfants` children
    pub fn ressources_maxi(&self, nombre_enfants: u32) -> f64 {
        self.plafond_base + nombre_enfants as f64 * self.plafond_par_enfant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SituationAsf {
    /// Parent raising children alone
    ParentIsole,
    Orphelin,
    /// Child deprived of one parent's support
    Depourvu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AsfInput {
    pub situation: SituationAsf,
    /// Children under 21
    pub nombre_enfants: u32,
    /// Monthly household income
    pub revenus: f64,
    /// At least one dependent child under 21
    pub enfant_a_charge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsfDetails {
    pub montant_par_enfant: f64,
    pub ressources_maxi: f64,
    pub nombre_enfants_eligibles: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsfResult {
    pub eligible: bool,
    pub montant_estime: f64,
    pub explication: String,
    pub details: AsfDetails,
}

/// Estimate the monthly ASF
pub fn calculer_asf(input: &AsfInput, bareme: &AsfBareme) -> AsfResult {
    if !input.enfant_a_charge || input.nombre_enfants == 0 {
        return AsfResult {
            eligible: false,
            montant_estime: 0.0,
            explication: "L'ASF nécessite d'avoir au moins un enfant à charge de moins de 21 ans."
                .to_string(),
            details: AsfDetails::default(),
        };
    }

    let ressources_maxi = bareme.ressources_maxi(input.nombre_enfants);

    // Income equal to the ceiling is still eligible
    if input.revenus > ressources_maxi {
        debug!("ASF: income {} above ceiling {}", input.revenus, ressources_maxi);
        return AsfResult {
            eligible: false,
            montant_estime: 0.0,
            explication: format!(
                "Vos ressources ({}€) dépassent le plafond autorisé ({:.2}€). \
                 Vous ne pouvez pas bénéficier de l'ASF actuellement.",
                input.revenus, ressources_maxi
            ),
            details: AsfDetails {
                montant_par_enfant: bareme.montant_par_enfant,
                ressources_maxi,
                nombre_enfants_eligibles: 0,
            },
        };
    }

    let nombre_enfants_eligibles = input.nombre_enfants.min(bareme.enfants_max);
    let montant = arrondi_centimes(bareme.montant_par_enfant * nombre_enfants_eligibles as f64);

    debug!(
        "ASF: {:?}, {} eligible children -> {:.2}",
        input.situation, nombre_enfants_eligibles, montant
    );

    AsfResult {
        eligible: true,
        montant_estime: montant,
        explication: format!(
            "En fonction de votre situation familiale (parent isolé, nombre d'enfants à charge), \
             vous pourriez recevoir environ {:.2}€ par mois pour {} enfant(s). Ce montant est indicatif \
             et dépend de l'examen complet de votre dossier par la CAF.",
            montant, nombre_enfants_eligibles
        ),
        details: AsfDetails {
            montant_par_enfant: bareme.montant_par_enfant,
            ressources_maxi,
            nombre_enfants_eligibles,
        },
    }
}
