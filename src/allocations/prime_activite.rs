//! Prime d'activité - top-up for low-income workers

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{Eligibilite, SituationFamiliale};
use crate::baremes::loader::LoadedBaremes;
use crate::format::arrondi_centimes;

#[derive(Debug, Clone, PartialEq)]
pub struct PrimeActiviteBareme {
    pub montant_seul: f64,
    pub montant_couple: f64,
    /// Single parent with 1, 2 and 3+ children
    pub montant_monoparental: [f64; 3],
    pub majoration_enfant: f64,

    /// Minimum monthly earned income
    pub seuil_revenu_activite: f64,

    /// Share of earned income not counted
    pub taux_abattement: f64,

    /// Indicative ceiling on total income
    pub seuil_revenus: f64,

    pub seuil_montant_faible: f64,
}

impl Default for PrimeActiviteBareme {
    fn default() -> Self {
        // Références CAF indicatives 2026
        Self {
            montant_seul: 163.83,
            montant_couple: 245.74,
            montant_monoparental: [196.38, 235.54, 274.71],
            majoration_enfant: 39.17,
            seuil_revenu_activite: 150.0,
            taux_abattement: 0.12,
            seuil_revenus: 2000.0,
            seuil_montant_faible: 15.0,
        }
    }
}

impl PrimeActiviteBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        let p = |cle: &str, v: f64| loaded.param_or(&format!("prime_activite.{}", cle), v);
        Self {
            montant_seul: p("montant_seul", d.montant_seul),
            montant_couple: p("montant_couple", d.montant_couple),
            montant_monoparental: [
                p("montant_monoparental_1", d.montant_monoparental[0]),
                p("montant_monoparental_2", d.montant_monoparental[1]),
                p("montant_monoparental_3", d.montant_monoparental[2]),
            ],
            majoration_enfant: p("majoration_enfant", d.majoration_enfant),
            seuil_revenu_activite: p("seuil_revenu_activite", d.seuil_revenu_activite),
            taux_abattement: p("taux_abattement", d.taux_abattement),
            seuil_revenus: p("seuil_revenus", d.seuil_revenus),
            seuil_montant_faible: p("seuil_montant_faible", d.seuil_montant_faible),
        }
    }

    pub fn montant_base(&self, situation: SituationFamiliale, enfants: u32) -> f64 {
        match (situation, enfants) {
            (SituationFamiliale::Seul, _) => self.montant_seul,
            (SituationFamiliale::Couple, _) => self.montant_couple,
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
#[serde(rename_all = "lowercase")]
pub enum LogementPrime {
    Loue,
    Proprio,
    Gratuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TypeActivite {
    Salarie,
    Independant,
    Apprenti,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrimeActiviteInput {
    pub situation: SituationFamiliale,
    pub enfants: u32,
    /// Monthly earned income
    pub revenus_prof: f64,
    /// Other monthly income (allowances, ...), counted in full
    pub autres_revenus: f64,
    pub logement: LogementPrime,
    pub type_activite: TypeActivite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimeActiviteDetails {
    pub montant_base: f64,
    pub majorations: f64,
    pub revenus_profs_comptabilises: f64,
    pub autres_revenus_comptabilises: f64,
    pub total_revenus_comptabilises: f64,
    pub montant_final: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimeActiviteResult {
    pub eligible: bool,
    pub montant_estime: f64,
    pub eligibilite: Eligibilite,
    pub explication: String,
    pub details: PrimeActiviteDetails,
}

/// Estimate the monthly prime d'activité
pub fn calculer_prime_activite(
    input: &PrimeActiviteInput,
    bareme: &PrimeActiviteBareme,
) -> PrimeActiviteResult {
    if input.revenus_prof < bareme.seuil_revenu_activite {
        return PrimeActiviteResult {
            eligible: false,
            montant_estime: 0.0,
            eligibilite: Eligibilite::NonEligible,
            explication: format!(
                "La Prime d'activité est réservée aux personnes exerçant une activité professionnelle. \
                 Vos revenus d'activité doivent être au minimum {}€/mois.",
                bareme.seuil_revenu_activite
            ),
            details: PrimeActiviteDetails {
                revenus_profs_comptabilises: input.revenus_prof,
                autres_revenus_comptabilises: input.autres_revenus,
                total_revenus_comptabilises: input.revenus_prof + input.autres_revenus,
                ..PrimeActiviteDetails::default()
            },
        };
    }

    let montant_base = bareme.montant_base(input.situation, input.enfants);
    let majorations = bareme.majorations(input.situation, input.enfants);

    let revenus_profs = input.revenus_prof * (1.0 - bareme.taux_abattement);
    let autres_revenus = input.autres_revenus;
    let total = revenus_profs + autres_revenus;

    let mut montant = (montant_base + majorations - total).max(0.0);

    let (eligibilite, explication) = if input.revenus_prof + input.autres_revenus
        > bareme.seuil_revenus
    {
        montant = 0.0;
        (
            Eligibilite::ProbablementNonEligible,
            "Vos revenus totaux semblent dépasser les plafonds d'éligibilité à la Prime d'activité."
                .to_string(),
        )
    } else if montant <= 0.0 {
        (
            Eligibilite::NonEligible,
            "Vos revenus dépassent le montant de base de la Prime d'activité. Vous ne semblez pas pouvoir \
             en bénéficier selon les informations renseignées. La Prime d'activité dépend de seuils précis \
             et peut évoluer en cas de changement de revenus ou de situation."
                .to_string(),
        )
    } else if montant < bareme.seuil_montant_faible {
        (
            Eligibilite::MontantTresFaible,
            format!(
                "Vous pourriez être éligible à la Prime d'activité, mais le montant estimé est très réduit \
                 ({:.2}€). La CAF évaluera votre dossier.",
                montant
            ),
        )
    } else {
        (
            Eligibilite::ProbablementEligible,
            "Vous pourriez être éligible à la Prime d'activité. Le montant estimé dépend de votre \
             situation exacte et de la validation par la CAF."
                .to_string(),
        )
    };

    debug!(
        "Prime d'activité: {:?} ({:?}), base {} + {} - {:.2} -> {:.2}",
        input.situation, input.type_activite, montant_base, majorations, total, montant
    );

    PrimeActiviteResult {
        eligible: montant > 0.0,
        montant_estime: montant,
        eligibilite,
        explication,
        details: PrimeActiviteDetails {
            montant_base,
            majorations,
            revenus_profs_comptabilises: arrondi_centimes(revenus_profs),
            autres_revenus_comptabilises: arrondi_centimes(autres_revenus),
            total_revenus_comptabilises: arrondi_centimes(total),
            montant_final: arrondi_centimes(montant),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input(situation: SituationFamiliale, enfants: u32, prof: f64, autres: f64) -> PrimeActiviteInput {
        PrimeActiviteInput {
            situation,
            enfants,
            revenus_prof: prof,
            autres_revenus: autres,
            logement: LogementPrime::Loue,
            type_activite: TypeActivite::Salarie,
        }
    }

    #[test]
    fn test_requires_earned_income() {
        let bareme = PrimeActiviteBareme::default();

        let r = calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 149.0, 20.0), &bareme);
        assert!(!r.eligible);
        assert_eq!(r.montant_estime, 0.0);
        assert_eq!(r.eligibilite, Eligibilite::NonEligible);
        assert_eq!(r.details.total_revenus_comptabilises, 169.0);

        let r = calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 150.0, 0.0), &bareme);
        assert!(r.eligible);
    }

    #[test]
    fn test_amount_after_allowance() {
        let r = calculer_prime_activite(
            &input(SituationFamiliale::Couple, 1, 200.0, 0.0),
            &PrimeActiviteBareme::default(),
        );
        // 245.74 + 39.17 - 176
        assert_abs_diff_eq!(r.montant_estime, 108.91, epsilon = 1e-9);
        assert_abs_diff_eq!(r.details.revenus_profs_comptabilises, 176.0, epsilon = 1e-9);
        assert_eq!(r.eligibilite, Eligibilite::ProbablementEligible);
    }

    #[test]
    fn test_other_income_counted_in_full() {
        let bareme = PrimeActiviteBareme::default();
        let a = calculer_prime_activite(&input(SituationFamiliale::Monoparental, 2, 200.0, 0.0), &bareme);
        let b = calculer_prime_activite(&input(SituationFamiliale::Monoparental, 2, 200.0, 50.0), &bareme);
        assert_abs_diff_eq!(a.montant_estime - b.montant_estime, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_labels() {
        let bareme = PrimeActiviteBareme::default();

        // 163.83 - 0.88 × 170 = 14.23
        let faible = calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 170.0, 0.0), &bareme);
        assert_eq!(faible.eligibilite, Eligibilite::MontantTresFaible);

        let zero = calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 1000.0, 0.0), &bareme);
        assert_eq!(zero.eligibilite, Eligibilite::NonEligible);

        let haut = calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 1900.0, 200.0), &bareme);
        assert_eq!(haut.eligibilite, Eligibilite::ProbablementNonEligible);
        assert_eq!(haut.montant_estime, 0.0);
    }

    #[test]
    fn test_total_income_ceiling_is_inclusive() {
        let bareme = PrimeActiviteBareme::default();

        let au_plafond =
            calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 1900.0, 100.0), &bareme);
        assert_eq!(au_plafond.eligibilite, Eligibilite::NonEligible);

        let au_dessus =
            calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 1900.0, 100.01), &bareme);
        assert_eq!(au_dessus.eligibilite, Eligibilite::ProbablementNonEligible);

        // A base high enough to leave an amount at the ceiling
        let large = PrimeActiviteBareme {
            montant_seul: 2000.0,
            ..PrimeActiviteBareme::default()
        };
        let r = calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 1000.0, 1000.0), &large);
        // 2000 - (880 + 1000)
        assert!(r.eligible);
        assert_abs_diff_eq!(r.montant_estime, 120.0, epsilon = 1e-9);
        let r = calculer_prime_activite(&input(SituationFamiliale::Seul, 0, 1000.0, 1000.01), &large);
        assert!(!r.eligible);
    }

    #[test]
    fn test_non_increasing_in_income() {
        let bareme = PrimeActiviteBareme::default();
        for (situation, enfants) in [
            (SituationFamiliale::Seul, 0),
            (SituationFamiliale::Couple, 2),
            (SituationFamiliale::Monoparental, 3),
        ] {
            let mut previous = f64::MAX;
            for step in 0..50 {
                let revenus = 150.0 + step as f64 * 50.0;
                let r = calculer_prime_activite(&input(situation, enfants, revenus, 0.0), &bareme);
                assert!(r.montant_estime <= previous, "increased at income {}", revenus);
                assert!(r.montant_estime >= 0.0);
                previous = r.montant_estime;
            }
        }
    }
}
