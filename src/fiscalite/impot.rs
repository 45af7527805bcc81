//! Income tax (impôt sur le revenu) with the family quotient
//!
//! The taxable income is divided by the number of parts, the progressive
//! barème is applied to one part, and the result is multiplied back.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::baremes::loader::LoadedBaremes;
use crate::baremes::{cumul_tranches, Tranche};
use crate::error::CalculError;

/// Progressive income tax barème
#[derive(Debug, Clone, PartialEq)]
pub struct BaremeIr {
    /// Ascending ceilings, the last one unbounded
    pub tranches: Vec<Tranche>,
}

impl Default for BaremeIr {
    fn default() -> Self {
        // Article 197 du CGI, revenus 2025
        Self {
            tranches: vec![
                Tranche::new(11_497.0, 0.0),
                Tranche::new(29_315.0, 0.11),
                Tranche::new(83_823.0, 0.30),
                Tranche::new(180_000.0, 0.41),
                Tranche::new(f64::INFINITY, 0.45),
            ],
        }
    }
}

impl BaremeIr {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        Self {
            tranches: loaded.tranches_ir.clone(),
        }
    }

    /// Tax for one part of quotient `qf`
    pub fn impot_par_part(&self, qf: f64) -> f64 {
        cumul_tranches(qf, &self.tranches)
    }

    /// Share of `qf` falling in each band it reaches, with the tax on that share
    pub fn repartition(&self, qf: f64) -> Vec<PartTranche> {
        let mut parts = Vec::new();
        let mut precedent = 0.0;
        for (i, tranche) in self.tranches.iter().enumerate() {
            if qf <= precedent {
                break;
            }
            let a = qf.min(tranche.plafond);
            let montant = a - precedent;
            parts.push(PartTranche {
                tranche: i + 1,
                de: precedent,
                a,
                montant,
                taux: tranche.taux,
                impot_par_part: montant * tranche.taux,
            });
            precedent = tranche.plafond;
        }
        parts
    }

    /// Rate of the band containing `qf`
    pub fn taux_marginal(&self, qf: f64) -> f64 {
        self.tranches
            .iter()
            .find(|t| qf <= t.plafond)
            .or_else(|| self.tranches.last())
            .map(|t| t.taux)
            .unwrap_or(0.0)
    }
}

/// Slice of the family quotient taxed in one band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartTranche {
    /// Band number, from 1
    pub tranche: usize,
    pub de: f64,
    pub a: f64,
    pub montant: f64,
    pub taux: f64,
    pub impot_par_part: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IrInput {
    /// Annual net taxable income
    pub revenu: f64,
    /// Number of family quotient parts
    pub parts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrResult {
    pub revenu: f64,
    pub parts: f64,
    /// Family quotient (income per part)
    pub qf: f64,
    pub ir_brut: f64,
    pub taux_moyen: f64,
    pub taux_marginal: f64,
    pub mensualite_moyenne: f64,
    pub repartition: Vec<PartTranche>,
}

/// Compute the gross income tax
pub fn calculer_ir(input: &IrInput, bareme: &BaremeIr) -> Result<IrResult, CalculError> {
    if !input.revenu.is_finite() || input.revenu < 0.0 {
        return Err(CalculError::invalid("revenu", "Entrées invalides"));
    }
    if !input.parts.is_finite() || input.parts <= 0.0 {
        return Err(CalculError::invalid("parts", "Entrées invalides"));
    }

    let qf = input.revenu / input.parts;
    let ir_brut = bareme.impot_par_part(qf) * input.parts;
    let taux_moyen = if input.revenu > 0.0 {
        ir_brut / input.revenu
    } else {
        0.0
    };
    let taux_marginal = bareme.taux_marginal(qf);

    debug!(
        "IR: revenu {} / {} parts = qf {:.2}, ir {:.2}, TMI {}",
        input.revenu, input.parts, qf, ir_brut, taux_marginal
    );

    Ok(IrResult {
        revenu: input.revenu,
        parts: input.parts,
        qf,
        ir_brut,
        taux_moyen,
        taux_marginal,
        mensualite_moyenne: ir_brut / 12.0,
        repartition: bareme.repartition(qf),
    })
}
