//! Gross to net salary conversion with the withholding tax (PAS)

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::baremes::loader::LoadedBaremes;
use crate::error::CalculError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StatutSalarie {
    Cadre,
    #[value(alias = "non_cadre")]
    NonCadre,
}

/// Flat employee contribution rates
#[derive(Debug, Clone, PartialEq)]
pub struct SalaireBareme {
    pub taux_cadre: f64,
    pub taux_non_cadre: f64,
}

impl Default for SalaireBareme {
    fn default() -> Self {
        Self {
            taux_cadre: 0.25,
            taux_non_cadre: 0.23,
        }
    }
}

impl SalaireBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        Self {
            taux_cadre: loaded.param_or("salaire.taux_cadre", d.taux_cadre),
            taux_non_cadre: loaded.param_or("salaire.taux_non_cadre", d.taux_non_cadre),
        }
    }

    pub fn taux_salarial(&self, statut: StatutSalarie) -> f64 {
        match statut {
            StatutSalarie::Cadre => self.taux_cadre,
            StatutSalarie::NonCadre => self.taux_non_cadre,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SalaireInput {
    pub brut_mensuel: f64,
    pub statut: StatutSalarie,
    /// Withholding rate in percent
    #[serde(default, rename = "tauxPAS")]
    pub taux_pas: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaireResult {
    pub brut: f64,
    pub statut: StatutSalarie,
    pub taux_salarial: f64,
    pub net_avant_impot: f64,
    pub pas_mensuel: f64,
    pub net_apres_impot: f64,
    pub brut_annuel: f64,
    pub net_avant_impot_annuel: f64,
    pub pas_annuel: f64,
    pub net_apres_impot_annuel: f64,
    #[serde(rename = "tauxPAS")]
    pub taux_pas: f64,
}

/// Convert a monthly gross salary to net before and after withholding
pub fn calculer_salaire(
    input: &SalaireInput,
    bareme: &SalaireBareme,
) -> Result<SalaireResult, CalculError> {
    let brut = input.brut_mensuel;
    if !brut.is_finite() || brut <= 0.0 {
        return Err(CalculError::invalid("brut_mensuel", "Brut invalide"));
    }
    if !input.taux_pas.is_finite() || !(0.0..=100.0).contains(&input.taux_pas) {
        return Err(CalculError::invalid("taux_pas", "Taux PAS invalide"));
    }

    let taux_salarial = bareme.taux_salarial(input.statut);
    let net_avant_impot = brut * (1.0 - taux_salarial);
    let pas_mensuel = net_avant_impot * input.taux_pas / 100.0;
    let net_apres_impot = net_avant_impot - pas_mensuel;

    debug!(
        "salaire: brut {} ({:?}) -> net {:.2}, PAS {}% -> {:.2}",
        brut, input.statut, net_avant_impot, input.taux_pas, net_apres_impot
    );

    Ok(SalaireResult {
        brut,
        statut: input.statut,
        taux_salarial,
        net_avant_impot,
        pas_mensuel,
        net_apres_impot,
        brut_annuel: brut * 12.0,
        net_avant_impot_annuel: net_avant_impot * 12.0,
        pas_annuel: pas_mensuel * 12.0,
        net_apres_impot_annuel: net_apres_impot * 12.0,
        taux_pas: input.taux_pas,
    })
}
