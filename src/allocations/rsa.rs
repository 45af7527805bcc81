//! RSA (Revenu de solidarité active)

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{Eligibilite, SituationFamiliale};
use crate::baremes::loader::LoadedBaremes;
use crate::format::arrondi_centimes;

#[derive(Debug, Clone, PartialEq)]
pub struct RsaBareme {
    pub montant_seul: f64,
    pub montant_couple: f64,
    /// Single parent with 1, 2 and 3+ children
    pub montant_monoparental: [f64; 3],

    /// Per child beyond the third for a single parent, per child otherwise
    pub majoration_enfant: f64,

    /// Share of income counted after the 38% allowance
    pub taux_revenus_pris: f64,

    /// Indicative income ceiling
    pub seuil_revenus: f64,

    pub seuil_montant_reduit: f64,
}

impl Default for RsaBareme {
    fn default() -> Self {
        // Légifrance, applicable au 1er avril 2025, sans aide au logement
        Self {
            montant_seul: 646.52,
            montant_couple: 969.78,
            montant_monoparental: [1106.94, 1383.68, 1660.41],
            majoration_enfant: 258.61,
            taux_revenus_pris: 0.62,
            seuil_revenus: 1500.0,
            seuil_montant_reduit: 50.0,
        }
    }
}

impl RsaBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        let p = |cle: &str, v: f64| loaded.param_or(&format!("rsa.{}", cle), v);
        Self {
            montant_seul: p("montant_seul", d.montant_seul),
            montant_couple: p("montant_couple", d.montant_couple),
            montant_monoparental: [
                p("montant_monoparental_1", d.montant_monoparental[0]),
                p("montant_monoparental_2", d.montant_monoparental[1]),
                p("montant_monoparental_3", d.montant_monoparental[2]),
            ],
            majoration_enfant: p("majoration_enfant", d.majoration_enfant),
            taux_revenus_pris: p("taux_revenus_pris", d.taux_revenus_pris),
            seuil_revenus: p("seuil_revenus", d.seuil_revenus),
            seuil_montant_reduit: p("seuil_montant_reduit", d.seuil_montant_reduit),
        }
    }

    /// Base amount before child majorations
    pub fn montant_base(&self, situation: SituationFamiliale, enfants: u32) -> f64 {
        match (situation, enfants) {
            (SituationFamiliale::Seul, _) => self.montant_seul,
            (SituationFamiliale::Couple, _) => self.montant_couple,
            // A single parent without children is counted as single
            (SituationFamiliale::Monoparental, 0) => self.montant_seul,
            (SituationFamiliale::Monoparental, n) => {
                self.montant_monoparental[(n.min(3) - 1) as usize]
            }
        }
    }

    pub fn majorations(&self, situation: SituationFamiliale, enfants: u32) -> f64 {
        let enfants_majores = match situation {
            SituationFamiliale::Monoparental => enfants.saturating_sub(3),
            _ => enfants,
        };
        enfants_majores as f64 * self.majoration_enfant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LogementRsa {
    Loue,
    Proprio,
    Gratuit,
    SansAbri,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Activite {
    Actif,
    Inactif,
    Chomage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RsaInput {
    pub situation: SituationFamiliale,
    pub enfants: u32,
    /// Monthly household income
    pub revenus: f64,
    pub logement: LogementRsa,
    pub activite: Activite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsaDetails {
    pub montant_base: f64,
    pub majorations: f64,
    pub revenus_pris: f64,
    pub abattement: f64,
    pub montant_final: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsaResult {
    pub eligible: bool,
    pub montant_estime: f64,
    pub eligibilite: Eligibilite,
    pub explication: String,
    pub details: RsaDetails,
}

/// Estimate the monthly RSA
pub fn calculer_rsa(input: &RsaInput, bareme: &RsaBareme) -> RsaResult {
    let montant_base = bareme.montant_base(input.situation, input.enfants);
    let majorations = bareme.majorations(input.situation, input.enfants);

    let revenus_pris = input.revenus * bareme.taux_revenus_pris;
    let mut montant = (montant_base + majorations - revenus_pris).max(0.0);

    let (eligibilite, mut explication) = if input.revenus > bareme.seuil_revenus {
        montant = 0.0;
        (
            Eligibilite::ProbablementNonEligible,
            "Vos revenus semblent dépasser les plafonds d'éligibilité au RSA.".to_string(),
        )
    } else if montant <= 0.0 {
        (
            Eligibilite::NonEligible,
            "Vos revenus dépassent le montant de base du RSA. Vous ne pouvez pas en bénéficier."
                .to_string(),
        )
    } else if montant < bareme.seuil_montant_reduit {
        (
            Eligibilite::MontantReduit,
            format!(
                "Vous pourriez être éligible au RSA, mais le montant estimé est très faible ({:.2}€). \
                 La CAF évaluera votre dossier complètement.",
                montant
            ),
        )
    } else {
        (
            Eligibilite::ProbablementEligible,
            "Vous pourriez être éligible au RSA selon les informations renseignées. Le montant estimé \
             dépend de votre situation exacte et de la décision de la CAF. Le montant du RSA peut évoluer \
             en fonction des ressources du foyer, de la composition familiale et des aides perçues."
                .to_string(),
        )
    };

    if input.logement == LogementRsa::SansAbri {
        explication.push_str(
            " (La CAF peut appliquer des règles ou ajustements spécifiques selon votre situation.)",
        );
    }

    debug!(
        "RSA: {:?} with {} children, base {} + {} - {:.2} -> {:.2}",
        input.situation, input.enfants, montant_base, majorations, revenus_pris, montant
    );

    RsaResult {
        eligible: montant > 0.0,
        montant_estime: montant,
        eligibilite,
        explication,
        details: RsaDetails {
            montant_base,
            majorations,
            revenus_pris: arrondi_centimes(revenus_pris),
            abattement: arrondi_centimes(input.revenus - revenus_pris),
            montant_final: arrondi_centimes(montant),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input(situation: SituationFamiliale, enfants: u32, revenus: f64) -> RsaInput {
        RsaInput {
            situation,
            enfants,
            revenus,
            logement: LogementRsa::Loue,
            activite: Activite::Inactif,
        }
    }

    #[test]
    fn test_no_income_single() {
        let r = calculer_rsa(&input(SituationFamiliale::Seul, 0, 0.0), &RsaBareme::default());
        assert!(r.eligible);
        assert_eq!(r.montant_estime, 646.52);
        assert_eq!(r.eligibilite, Eligibilite::ProbablementEligible);
    }

    #[test]
    fn test_very_high_income() {
        let r = calculer_rsa(&input(SituationFamiliale::Seul, 0, 2000.0), &RsaBareme::default());
        assert!(!r.eligible);
        assert_eq!(r.montant_estime, 0.0);
        assert!(r.eligibilite.libelle().to_lowercase().contains("non"));
    }

    #[test]
    fn test_single_parent_bases_and_majorations() {
        let bareme = RsaBareme::default();
        assert_eq!(bareme.montant_base(SituationFamiliale::Monoparental, 0), 646.52);
        assert_eq!(bareme.montant_base(SituationFamiliale::Monoparental, 1), 1106.94);
        assert_eq!(bareme.montant_base(SituationFamiliale::Monoparental, 2), 1383.68);
        assert_eq!(bareme.montant_base(SituationFamiliale::Monoparental, 5), 1660.41);

        assert_eq!(bareme.majorations(SituationFamiliale::Monoparental, 3), 0.0);
        assert_abs_diff_eq!(
            bareme.majorations(SituationFamiliale::Monoparental, 5),
            2.0 * 258.61,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            bareme.majorations(SituationFamiliale::Couple, 2),
            2.0 * 258.61,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_income_allowance() {
        let r = calculer_rsa(&input(SituationFamiliale::Couple, 0, 500.0), &RsaBareme::default());
        // 969.78 - 310
        assert_abs_diff_eq!(r.montant_estime, 659.78, epsilon = 1e-9);
        assert_abs_diff_eq!(r.details.revenus_pris, 310.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.details.abattement, 190.0, epsilon = 1e-9);
    }

    #[test]
    fn test_small_and_zero_amounts() {
        let bareme = RsaBareme::default();

        // 646.52 - 0.62 × 1000 = 26.52
        let small = calculer_rsa(&input(SituationFamiliale::Seul, 0, 1000.0), &bareme);
        assert_eq!(small.eligibilite, Eligibilite::MontantReduit);

        let zero = calculer_rsa(&input(SituationFamiliale::Seul, 0, 1100.0), &bareme);
        assert_eq!(zero.eligibilite, Eligibilite::NonEligible);
        assert_eq!(zero.montant_estime, 0.0);
    }

    #[test]
    fn test_homeless_note() {
        let r = calculer_rsa(
            &RsaInput {
                logement: LogementRsa::SansAbri,
                ..input(SituationFamiliale::Seul, 0, 0.0)
            },
            &RsaBareme::default(),
        );
        assert!(r.explication.ends_with("selon votre situation.)"));
    }

    #[test]
    fn test_non_increasing_in_income() {
        let bareme = RsaBareme::default();
        let mut previous = f64::MAX;
        for step in 0..40 {
            let r = calculer_rsa(
                &input(SituationFamiliale::Monoparental, 2, step as f64 * 50.0),
                &bareme,
            );
            assert!(r.montant_estime <= previous);
            previous = r.montant_estime;
        }
    }

    #[test]
    fn test_income_ceiling_is_inclusive() {
        let bareme = RsaBareme::default();

        // 1660.41 + 2 × 258.61 - 0.62 × 1500
        let au_plafond = calculer_rsa(&input(SituationFamiliale::Monoparental, 5, 1500.0), &bareme);
        assert!(au_plafond.eligible);
        assert_abs_diff_eq!(au_plafond.montant_estime, 1247.63, epsilon = 1e-9);
        assert_eq!(au_plafond.eligibilite, Eligibilite::ProbablementEligible);

        let au_dessus = calculer_rsa(&input(SituationFamiliale::Monoparental, 5, 1500.01), &bareme);
        assert!(!au_dessus.eligible);
        assert_eq!(au_dessus.montant_estime, 0.0);
        assert_eq!(au_dessus.eligibilite, Eligibilite::ProbablementNonEligible);
    }

    #[test]
    fn test_logement_tag() {
        let parsed: LogementRsa = serde_json::from_str("\"sans-abri\"").unwrap();
        assert_eq!(parsed, LogementRsa::SansAbri);
    }
}
