//! AAH (Allocation aux adultes handicapés)
//!
//! Since the 2023 deconjugalisation the base amount no longer depends on
//! the couple situation, and children never increase the AAH.

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{Eligibilite, SituationFamiliale};
use crate::baremes::loader::LoadedBaremes;
use crate::format::arrondi_centimes;

#[derive(Debug, Clone, PartialEq)]
pub struct AahBareme {
    /// Full-rate monthly amount
    pub montant_base: f64,

    /// Regulatory ceiling, never exceeded
    pub plafond: f64,

    /// Minimum incapacity rate, percent
    pub seuil_incapacite: f64,

    /// Share of income not counted
    pub taux_abattement: f64,

    /// Indicative income ceiling
    pub seuil_revenus: f64,

    /// Amounts under this are flagged as very small
    pub seuil_montant_reduit: f64,
}

impl Default for AahBareme {
    fn default() -> Self {
        // Décret du 29 mars 2025, applicable au 1er avril 2025
        Self {
            montant_base: 1033.32,
            plafond: 1033.32,
            seuil_incapacite: 50.0,
            taux_abattement: 0.10,
            seuil_revenus: 1500.0,
            seuil_montant_reduit: 50.0,
        }
    }
}

impl AahBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        Self {
            montant_base: loaded.param_or("aah.montant_base", d.montant_base),
            plafond: loaded.param_or("aah.plafond", d.plafond),
            seuil_incapacite: loaded.param_or("aah.seuil_incapacite", d.seuil_incapacite),
            taux_abattement: loaded.param_or("aah.taux_abattement", d.taux_abattement),
            seuil_revenus: loaded.param_or("aah.seuil_revenus", d.seuil_revenus),
            seuil_montant_reduit: loaded
                .param_or("aah.seuil_montant_reduit", d.seuil_montant_reduit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogementAah {
    Locataire,
    Proprio,
    Heberge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AahInput {
    pub situation: SituationFamiliale,
    pub enfants: u32,
    /// Incapacity rate recognised by the MDPH, percent
    pub taux_incapacite: f64,
    /// Monthly household income
    pub revenus: f64,
    pub logement: LogementAah,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AahDetails {
    pub montant_base: f64,
    pub majorations: f64,
    pub revenus_comptabilises: f64,
    pub abattement: f64,
    pub montant_final: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AahResult {
    pub eligible: bool,
    pub montant_estime: f64,
    pub eligibilite: Eligibilite,
    pub explication: String,
    pub details: AahDetails,
}

/// Estimate the monthly AAH
pub fn calculer_aah(input: &AahInput, bareme: &AahBareme) -> AahResult {
    if input.taux_incapacite < bareme.seuil_incapacite {
        return AahResult {
            eligible: false,
            montant_estime: 0.0,
            eligibilite: Eligibilite::NonEligible,
            explication: format!(
                "L'AAH nécessite un taux d'incapacité d'au minimum {}% reconnu par la MDPH. \
                 Votre situation ne semble pas correspondre.",
                bareme.seuil_incapacite
            ),
            details: AahDetails::default(),
        };
    }

    let montant_base = bareme.montant_base;
    let majorations = 0.0;

    let revenus_comptabilises = (input.revenus * (1.0 - bareme.taux_abattement)).max(0.0);
    let abattement = input.revenus - revenus_comptabilises;

    let mut montant = (montant_base + majorations - revenus_comptabilises)
        .max(0.0)
        .min(bareme.plafond);

    let (eligibilite, explication) = if input.revenus > bareme.seuil_revenus {
        montant = 0.0;
        (
            Eligibilite::ProbablementNonEligible,
            "Vos revenus totaux semblent dépasser les plafonds d'éligibilité à l'AAH selon les règles CAF."
                .to_string(),
        )
    } else if montant <= 0.0 {
        (
            Eligibilite::NonEligible,
            "Vos ressources dépassent le montant de base de l'AAH. Vous ne semblez pas pouvoir en \
             bénéficier selon les informations renseignées."
                .to_string(),
        )
    } else if montant < bareme.seuil_montant_reduit {
        (
            Eligibilite::MontantReduit,
            format!(
                "Vous pourriez percevoir environ {:.2}€ par mois. Ce montant est plafonné au plafond \
                 réglementaire de l'AAH (≈ {}€). La CAF évaluera votre dossier complètement en prenant \
                 en compte votre taux d'incapacité reconnu par la MDPH, vos ressources exactes et votre \
                 composition familiale.",
                montant, bareme.plafond
            ),
        )
    } else {
        (
            Eligibilite::ProbablementEligible,
            format!(
                "Vous pourriez percevoir environ {:.2}€ par mois. Ce montant est plafonné au plafond \
                 réglementaire de l'AAH. L'estimation dépend de votre situation exacte et de la décision \
                 finale de la CAF, qui prendra en compte votre taux d'incapacité reconnu par la MDPH, vos \
                 ressources et votre situation familiale.",
                montant
            ),
        )
    };

    debug!(
        "AAH: {:?}, income {} counted {:.2} -> {:.2} ({})",
        input.situation, input.revenus, revenus_comptabilises, montant, eligibilite
    );

    AahResult {
        eligible: montant > 0.0,
        montant_estime: montant,
        eligibilite,
        explication,
        details: AahDetails {
            montant_base,
            majorations,
            revenus_comptabilises: arrondi_centimes(revenus_comptabilises),
            abattement: arrondi_centimes(abattement),
            montant_final: arrondi_centimes(montant),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input(taux: f64, revenus: f64) -> AahInput {
        AahInput {
            situation: SituationFamiliale::Seul,
            enfants: 0,
            taux_incapacite: taux,
            revenus,
            logement: LogementAah::Locataire,
        }
    }

    #[test]
    fn test_incapacity_threshold() {
        let bareme = AahBareme::default();

        let r = calculer_aah(&input(49.0, 0.0), &bareme);
        assert!(!r.eligible);
        assert_eq!(r.montant_estime, 0.0);
        assert_eq!(r.details, AahDetails::default());

        assert!(calculer_aah(&input(50.0, 0.0), &bareme).eligible);
    }

    #[test]
    fn test_full_rate_without_income() {
        let r = calculer_aah(&input(80.0, 0.0), &AahBareme::default());
        assert_eq!(r.montant_estime, 1033.32);
        assert_eq!(r.eligibilite, Eligibilite::ProbablementEligible);
    }

    #[test]
    fn test_income_reduces_amount() {
        let r = calculer_aah(&input(80.0, 500.0), &AahBareme::default());
        // 1033.32 - 450
        assert_abs_diff_eq!(r.montant_estime, 583.32, epsilon = 1e-9);
        assert_abs_diff_eq!(r.details.revenus_comptabilises, 450.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.details.abattement, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_children_do_not_increase() {
        let bareme = AahBareme::default();
        let sans = calculer_aah(&input(80.0, 200.0), &bareme);
        let avec = calculer_aah(
            &AahInput {
                situation: SituationFamiliale::Monoparental,
                enfants: 3,
                ..input(80.0, 200.0)
            },
            &bareme,
        );
        assert_eq!(sans.montant_estime, avec.montant_estime);
        assert_eq!(avec.details.majorations, 0.0);
    }

    #[test]
    fn test_labels() {
        let bareme = AahBareme::default();

        // 1033.32 - 0.9 × 1120 = 25.32
        let small = calculer_aah(&input(80.0, 1120.0), &bareme);
        assert_eq!(small.eligibilite, Eligibilite::MontantReduit);
        assert!(small.eligible);

        let zero = calculer_aah(&input(80.0, 1200.0), &bareme);
        assert_eq!(zero.eligibilite, Eligibilite::NonEligible);
        assert_eq!(zero.montant_estime, 0.0);

        let high = calculer_aah(&input(80.0, 1600.0), &bareme);
        assert_eq!(high.eligibilite, Eligibilite::ProbablementNonEligible);
        assert_eq!(high.montant_estime, 0.0);
    }

    #[test]
    fn test_never_above_ceiling() {
        let bareme = AahBareme {
            montant_base: 1200.0,
            ..AahBareme::default()
        };
        let r = calculer_aah(&input(90.0, 0.0), &bareme);
        assert_eq!(r.montant_estime, bareme.plafond);
    }

    #[test]
    fn test_income_ceiling_is_inclusive() {
        let bareme = AahBareme::default();
        assert_eq!(
            calculer_aah(&input(80.0, 1500.0), &bareme).eligibilite,
            Eligibilite::NonEligible
        );
        assert_eq!(
            calculer_aah(&input(80.0, 1500.01), &bareme).eligibilite,
            Eligibilite::ProbablementNonEligible
        );

        // A base high enough to leave an amount at the ceiling
        let large = AahBareme {
            montant_base: 1500.0,
            plafond: 1500.0,
            ..AahBareme::default()
        };
        let au_plafond = calculer_aah(&input(80.0, 1500.0), &large);
        assert!(au_plafond.eligible);
        assert_abs_diff_eq!(au_plafond.montant_estime, 150.0, epsilon = 1e-9);

        let au_dessus = calculer_aah(&input(80.0, 1500.01), &large);
        assert!(!au_dessus.eligible);
        assert_eq!(au_dessus.montant_estime, 0.0);
    }

    #[test]
    fn test_non_increasing_in_income() {
        let bareme = AahBareme::default();
        let mut previous = f64::MAX;
        for step in 0..40 {
            let r = calculer_aah(&input(80.0, step as f64 * 50.0), &bareme);
            assert!(r.montant_estime <= previous, "increased at income {}", step * 50);
            assert!(r.montant_estime <= bareme.plafond);
            previous = r.montant_estime;
        }
    }
}
