//! ARE (Allocation de retour à l'emploi) - unemployment benefit estimate
//!
//! France Travail rules, simplified:
//! - eligibility requires a minimum number of months worked in the last 28
//! - monthly amount is a fixed share of the reference salary, clamped
//!   between the daily minimum and maximum times 30 days
//! - maximum duration depends on age

use log::debug;
use serde::{Deserialize, Serialize};

use super::SituationFoyer;
use crate::baremes::loader::LoadedBaremes;
use crate::format::{arrondi_centimes, arrondi_euro};

/// ARE rates and thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct AreBareme {
    /// Minimum months worked in the last 28 months (inclusive)
    pub anciennete_minimum_mois: u32,

    /// Share of the reference salary paid out
    pub taux_remplacement: f64,

    /// Daily minimum, euros
    pub minimum_journalier: f64,

    /// Daily maximum, euros
    pub maximum_journalier: f64,

    /// Days per month used to convert the daily bounds
    pub jours_par_mois: f64,

    /// Age from which the longer duration applies
    pub age_duree_longue: u32,

    pub duree_standard_mois: u32,
    pub duree_longue_mois: u32,
}

impl Default for AreBareme {
    fn default() -> Self {
        // France Travail - barèmes au 1er janvier 2026
        Self {
            anciennete_minimum_mois: 4,
            taux_remplacement: 0.5743,
            minimum_journalier: 31.50,
            maximum_journalier: 91.82,
            jours_par_mois: 30.0,
            age_duree_longue: 53,
            duree_standard_mois: 24,
            duree_longue_mois: 36,
        }
    }
}

impl AreBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        Self {
            anciennete_minimum_mois: loaded
                .param_u32_or("are.anciennete_minimum_mois", d.anciennete_minimum_mois),
            taux_remplacement: loaded.param_or("are.taux_remplacement", d.taux_remplacement),
            minimum_journalier: loaded.param_or("are.minimum_journalier", d.minimum_journalier),
            maximum_journalier: loaded.param_or("are.maximum_journalier", d.maximum_journalier),
            jours_par_mois: loaded.param_or("are.jours_par_mois", d.jours_par_mois),
            age_duree_longue: loaded.param_u32_or("are.age_duree_longue", d.age_duree_longue),
            duree_standard_mois: loaded
                .param_u32_or("are.duree_standard_mois", d.duree_standard_mois),
            duree_longue_mois: loaded.param_u32_or("are.duree_longue_mois", d.duree_longue_mois),
        }
    }

    /// Monthly floor
    pub fn minimum_mensuel(&self) -> f64 {
        self.minimum_journalier * self.jours_par_mois
    }

    /// Monthly ceiling
    pub fn maximum_mensuel(&self) -> f64 {
        self.maximum_journalier * self.jours_par_mois
    }

    /// Maximum benefit duration in months for a given age
    pub fn duree_max(&self, age: u32) -> u32 {
        if age >= self.age_duree_longue {
            self.duree_longue_mois
        } else {
            self.duree_standard_mois
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AreInput {
    pub situation: SituationFoyer,
    /// Months worked in the last 28 months
    pub anciennete_emploi: u32,
    /// Average monthly gross salary
    pub salaire_referent: f64,
    pub personnes_charge: u32,
    pub age_personne: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreDetails {
    pub taux_remplacement: f64,
    /// Monthly floor, rounded to the euro
    pub montant_minimum: f64,
    /// Monthly ceiling, rounded to the euro
    pub montant_maximum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreResult {
    pub eligible: bool,
    /// Gross monthly amount
    pub montant_estime: f64,
    /// Maximum duration in months
    #[serde(rename = "durationMax")]
    pub duree_max: u32,
    pub explication: String,
    pub details: AreDetails,
}

/// Estimate the ARE monthly amount and maximum duration
pub fn calculer_are(input: &AreInput, bareme: &AreBareme) -> AreResult {
    if input.anciennete_emploi < bareme.anciennete_minimum_mois {
        debug!(
            "ARE: {} months worked, below minimum {}",
            input.anciennete_emploi, bareme.anciennete_minimum_mois
        );
        return AreResult {
            eligible: false,
            montant_estime: 0.0,
            duree_max: 0,
            explication: format!(
                "Vous devez justifier d'au minimum {} mois d'activité dans les 28 derniers mois. \
                 Votre durée ({} mois) est insuffisante.",
                bareme.anciennete_minimum_mois, input.anciennete_emploi
            ),
            details: AreDetails::default(),
        };
    }

    let base = input.salaire_referent * bareme.taux_remplacement;
    let minimum = bareme.minimum_mensuel();
    let maximum = bareme.maximum_mensuel();

    // Floor first, then ceiling: a misconfigured barème with min > max caps at max
    let montant = arrondi_centimes(base.max(minimum).min(maximum));
    let duree_max = bareme.duree_max(input.age_personne);

    debug!(
        "ARE: base {:.2}, bounds [{:.2}, {:.2}] -> {:.2}, {} months",
        base, minimum, maximum, montant, duree_max
    );

    AreResult {
        eligible: true,
        montant_estime: montant,
        duree_max,
        explication: format!(
            "Montant estimé: {:.2}€ brut/mois (base: {}€ × {:.2}% = {:.2}€, plafonné entre {:.0}€ et {:.0}€). \
             Durée max: {} mois. France Travail confirmera le montant définitif lors de l'étude de votre dossier.",
            montant,
            input.salaire_referent,
            bareme.taux_remplacement * 100.0,
            base,
            minimum,
            maximum,
            duree_max
        ),
        details: AreDetails {
            taux_remplacement: bareme.taux_remplacement,
            montant_minimum: arrondi_euro(minimum),
            montant_maximum: arrondi_euro(maximum),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input(anciennete: u32, salaire: f64, age: u32) -> AreInput {
        AreInput {
            situation: SituationFoyer::Seul,
            anciennete_emploi: anciennete,
            salaire_referent: salaire,
            personnes_charge: 0,
            age_personne: age,
        }
    }

    #[test]
    fn test_below_minimum_months() {
        let r = calculer_are(&input(2, 2500.0, 40), &AreBareme::default());

        assert!(!r.eligible);
        assert_eq!(r.montant_estime, 0.0);
        assert_eq!(r.duree_max, 0);
        assert_eq!(r.details, AreDetails::default());
        assert!(r.explication.contains("4 mois"));
        assert!(r.explication.contains("(2 mois)"));
    }

    #[test]
    fn test_minimum_months_is_inclusive() {
        let bareme = AreBareme::default();
        assert!(!calculer_are(&input(3, 2500.0, 40), &bareme).eligible);
        assert!(calculer_are(&input(4, 2500.0, 40), &bareme).eligible);
    }

    #[test]
    fn test_replacement_rate_in_band() {
        let r = calculer_are(&input(12, 2500.0, 40), &AreBareme::default());

        assert!(r.eligible);
        // 2500 × 57.43% = 1435.75
        assert_abs_diff_eq!(r.montant_estime, 1435.75, epsilon = 1e-9);
        assert_eq!(r.details.taux_remplacement, 0.5743);
        assert_eq!(r.details.montant_minimum, 945.0);
        assert_eq!(r.details.montant_maximum, 2755.0);
    }

    #[test]
    fn test_clamping() {
        let bareme = AreBareme::default();

        let low = calculer_are(&input(12, 500.0, 40), &bareme);
        assert_abs_diff_eq!(low.montant_estime, 945.0, epsilon = 1e-9);

        let high = calculer_are(&input(12, 10_000.0, 40), &bareme);
        assert_abs_diff_eq!(high.montant_estime, 2754.6, epsilon = 1e-9);

        for salaire in [0.0, 800.0, 1600.0, 3200.0, 4800.0, 6400.0, 50_000.0] {
            let r = calculer_are(&input(6, salaire, 30), &bareme);
            assert!(r.montant_estime >= bareme.minimum_mensuel() - 1e-9);
            assert!(r.montant_estime <= bareme.maximum_mensuel() + 1e-9);
        }
    }

    #[test]
    fn test_monotonic_in_salary() {
        let bareme = AreBareme::default();
        let mut previous = 0.0;
        for step in 0..=80 {
            let salaire = step as f64 * 100.0;
            let r = calculer_are(&input(10, salaire, 45), &bareme);
            assert!(r.montant_estime >= previous, "decreased at salary {}", salaire);
            previous = r.montant_estime;
        }
        // Strictly increasing inside the band
        let a = calculer_are(&input(10, 2000.0, 45), &bareme).montant_estime;
        let b = calculer_are(&input(10, 2100.0, 45), &bareme).montant_estime;
        assert!(b > a);
    }

    #[test]
    fn test_duration_by_age() {
        let bareme = AreBareme::default();
        assert_eq!(calculer_are(&input(12, 2000.0, 52), &bareme).duree_max, 24);
        assert_eq!(calculer_are(&input(12, 2000.0, 53), &bareme).duree_max, 36);
        assert_eq!(calculer_are(&input(12, 2000.0, 60), &bareme).duree_max, 36);
    }

    #[test]
    fn test_json_shape() {
        let r = calculer_are(&input(12, 2500.0, 40), &AreBareme::default());
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("montantEstime").is_some());
        assert_eq!(json["durationMax"], 24);
        assert!(json.get("dureeMax").is_none());
    }

    #[test]
    fn test_form_json_input() {
        let json = r#"{"situation":"seul","ancienneteEmploi":12,"salaireReferent":2500,"personnesCharge":0,"agePersonne":55}"#;
        let parsed: AreInput = serde_json::from_str(json).unwrap();
        assert_eq!(calculer_are(&parsed, &AreBareme::default()).duree_max, 36);

        let faute = r#"{"situation":"seul","anciennete":12,"salaireReferent":2500,"personnesCharge":0,"agePersonne":55}"#;
        assert!(serde_json::from_str::<AreInput>(faute).is_err());
    }
}
