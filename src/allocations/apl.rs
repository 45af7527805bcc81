//! APL (Aide personnalisée au logement) - simplified CAF model
//!
//! Steps:
//! 1. Rent ceiling from zone, couple bonus and children
//! 2. Personal participation = 30% of income minus the housing forfait,
//!    never below the CAF floor
//! 3. If participation covers the retained rent, APL is zero
//! 4. Raw APL is capped by a realistic per-profile ceiling
//!
//! Amounts are floored to the euro, as CAF does.

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::baremes::loader::LoadedBaremes;
use crate::error::CalculError;
use crate::format::arrondi_euro;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SituationApl {
    Seul,
    Couple,
    Monoparental,
    Autre,
}

impl SituationApl {
    pub fn libelle(&self) -> &'static str {
        match self {
            SituationApl::Seul => "Célibataire",
            SituationApl::Couple => "Couple",
            SituationApl::Monoparental => "Parent isolé",
            SituationApl::Autre => "Autre",
        }
    }
}

/// APL geographic zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Idf,
    Province,
    Dom,
}

impl Zone {
    pub fn libelle(&self) -> &'static str {
        match self {
            Zone::Idf => "Île-de-France",
            Zone::Province => "Province",
            Zone::Dom => "DOM-TOM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TypeLogement {
    Location,
    Accession,
    Hlm,
    Colocation,
}

/// CAF 2026 rent ceilings, forfaits and realistic caps
#[derive(Debug, Clone, PartialEq)]
pub struct AplBareme {
    pub plafond_loyer_idf: f64,
    pub plafond_loyer_province: f64,
    pub plafond_loyer_dom: f64,
    pub bonus_loyer_couple: f64,
    pub bonus_loyer_par_enfant: f64,

    pub forfait_seul: f64,
    pub forfait_couple: f64,
    pub forfait_monoparental: f64,
    pub forfait_autre: f64,

    /// Share of income counted as personal participation
    pub taux_participation: f64,
    pub participation_minimum: f64,

    pub plafond_apl_seul: f64,
    pub plafond_apl_couple: f64,
    pub plafond_apl_monoparental: f64,
    pub plafond_apl_autre: f64,
    pub plafond_apl_par_enfant: f64,
    /// Children counted for the realistic cap
    pub plafond_apl_enfants_max: u32,
    /// Absolute cap whatever the profile
    pub plafond_apl_absolu: f64,
}

impl Default for AplBareme {
    fn default() -> Self {
        Self {
            plafond_loyer_idf: 610.0,
            plafond_loyer_province: 510.0,
            plafond_loyer_dom: 430.0,
            bonus_loyer_couple: 60.0,
            bonus_loyer_par_enfant: 60.0,
            forfait_seul: 72.0,
            forfait_couple: 102.0,
            forfait_monoparental: 87.0,
            forfait_autre: 72.0,
            taux_participation: 0.30,
            participation_minimum: 35.0,
            plafond_apl_seul: 320.0,
            plafond_apl_couple: 420.0,
            plafond_apl_monoparental: 500.0,
            plafond_apl_autre: 350.0,
            plafond_apl_par_enfant: 150.0,
            plafond_apl_enfants_max: 3,
            plafond_apl_absolu: 900.0,
        }
    }
}

impl AplBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        let p = |cle: &str, v: f64| loaded.param_or(&format!("apl.{}", cle), v);
        Self {
            plafond_loyer_idf: p("plafond_loyer_idf", d.plafond_loyer_idf),
            plafond_loyer_province: p("plafond_loyer_province", d.plafond_loyer_province),
            plafond_loyer_dom: p("plafond_loyer_dom", d.plafond_loyer_dom),
            bonus_loyer_couple: p("bonus_loyer_couple", d.bonus_loyer_couple),
            bonus_loyer_par_enfant: p("bonus_loyer_par_enfant", d.bonus_loyer_par_enfant),
            forfait_seul: p("forfait_seul", d.forfait_seul),
            forfait_couple: p("forfait_couple", d.forfait_couple),
            forfait_monoparental: p("forfait_monoparental", d.forfait_monoparental),
            forfait_autre: p("forfait_autre", d.forfait_autre),
            taux_participation: p("taux_participation", d.taux_participation),
            participation_minimum: p("participation_minimum", d.participation_minimum),
            plafond_apl_seul: p("plafond_apl_seul", d.plafond_apl_seul),
            plafond_apl_couple: p("plafond_apl_couple", d.plafond_apl_couple),
            plafond_apl_monoparental: p("plafond_apl_monoparental", d.plafond_apl_monoparental),
            plafond_apl_autre: p("plafond_apl_autre", d.plafond_apl_autre),
            plafond_apl_par_enfant: p("plafond_apl_par_enfant", d.plafond_apl_par_enfant),
            plafond_apl_enfants_max: loaded
                .param_u32_or("apl.plafond_apl_enfants_max", d.plafond_apl_enfants_max),
            plafond_apl_absolu: p("plafond_apl_absolu", d.plafond_apl_absolu),
        }
    }

    /// Rent ceiling for the zone, situation and number of children
    pub fn plafond_loyer(&self, zone: Zone, situation: SituationApl, enfants: u32) -> f64 {
        let base = match zone {
            Zone::Idf => self.plafond_loyer_idf,
            Zone::Province => self.plafond_loyer_province,
            Zone::Dom => self.plafond_loyer_dom,
        };
        let couple = if situation == SituationApl::Couple {
            self.bonus_loyer_couple
        } else {
            0.0
        };
        base + couple + enfants as f64 * self.bonus_loyer_par_enfant
    }

    pub fn forfait_logement(&self, situation: SituationApl) -> f64 {
        match situation {
            SituationApl::Seul => self.forfait_seul,
            SituationApl::Couple => self.forfait_couple,
            SituationApl::Monoparental => self.forfait_monoparental,
            SituationApl::Autre => self.forfait_autre,
        }
    }

    /// Realistic APL cap for a profile
    pub fn plafond_apl(&self, situation: SituationApl, enfants: u32) -> f64 {
        let base = match situation {
            SituationApl::Seul => self.plafond_apl_seul,
            SituationApl::Couple => self.plafond_apl_couple,
            SituationApl::Monoparental => self.plafond_apl_monoparental,
            SituationApl::Autre => self.plafond_apl_autre,
        };
        let enfants_comptes = enfants.min(self.plafond_apl_enfants_max) as f64;
        (base + enfants_comptes * self.plafond_apl_par_enfant).min(self.plafond_apl_absolu)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AplInput {
    pub situation: SituationApl,
    pub enfants: u32,
    pub revenus_mensuels: f64,
    pub loyer_mensuel: f64,
    #[serde(alias = "region")]
    pub zone: Zone,
    #[serde(default)]
    pub type_logement: Option<TypeLogement>,
}

/// Detailed APL estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AplData {
    pub apl_estimee: f64,
    /// Before the realistic cap
    pub apl_brute: f64,
    pub loyer_mensuel: f64,
    pub loyer_pris_compte: f64,
    pub participation: f64,
    pub forfait_logement: f64,
    pub reste_charge: f64,
    pub situation: SituationApl,
    pub enfants: u32,
    pub revenus_mensuels: f64,
    pub zone: Zone,
    pub plafond_loyer: f64,
    pub plafond_apl: f64,
    pub is_plafonne: bool,
    /// Set when the APL is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raison_zero: Option<String>,
}

impl AplData {
    pub fn eligible(&self) -> bool {
        self.apl_estimee > 0.0
    }
}

pub const MESSAGE_APL_ZERO: &str = "Avec vos revenus actuels et le plafond de loyer applicable, \
l'APL est généralement nulle selon les règles CAF.";

pub const MESSAGE_APL_PLAFONNE: &str =
    "Montant plafonné selon les règles généralement constatées par la CAF.";

fn valider(input: &AplInput) -> Result<(), CalculError> {
    if !input.revenus_mensuels.is_finite() || input.revenus_mensuels < 0.0 {
        return Err(CalculError::invalid("revenus_mensuels", "Revenus invalides"));
    }
    if !input.loyer_mensuel.is_finite() || input.loyer_mensuel < 0.0 {
        return Err(CalculError::invalid("loyer_mensuel", "Loyer invalide"));
    }
    Ok(())
}

/// Estimate the APL
pub fn calculer_apl(input: &AplInput, bareme: &AplBareme) -> Result<AplData, CalculError> {
    valider(input)?;

    let revenus = input.revenus_mensuels;
    let loyer = input.loyer_mensuel;

    let plafond_loyer = bareme.plafond_loyer(input.zone, input.situation, input.enfants);
    let loyer_pris_compte = loyer.min(plafond_loyer);

    let forfait_logement = bareme.forfait_logement(input.situation);
    let participation =
        (revenus * bareme.taux_participation - forfait_logement).max(bareme.participation_minimum);

    let mut raison_zero = None;
    let apl_brute = if participation >= loyer_pris_compte {
        raison_zero = Some(MESSAGE_APL_ZERO.to_string());
        0.0
    } else {
        loyer_pris_compte - participation
    };

    let plafond_apl = bareme.plafond_apl(input.situation, input.enfants);
    let is_plafonne = apl_brute > plafond_apl;
    let apl_estimee = apl_brute.min(plafond_apl).floor();
    let apl_brute = apl_brute.floor();

    debug!(
        "APL: rent {} (retained {}), participation {:.2}, raw {}, cap {} -> {}",
        loyer, loyer_pris_compte, participation, apl_brute, plafond_apl, apl_estimee
    );

    Ok(AplData {
        apl_estimee,
        apl_brute,
        loyer_mensuel: loyer,
        loyer_pris_compte,
        participation: arrondi_euro(participation),
        forfait_logement,
        reste_charge: (loyer - apl_estimee).max(0.0),
        situation: input.situation,
        enfants: input.enfants,
        revenus_mensuels: revenus,
        zone: input.zone,
        plafond_loyer,
        plafond_apl,
        is_plafonne,
        raison_zero,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(situation: SituationApl, enfants: u32, revenus: f64, loyer: f64, zone: Zone) -> AplInput {
        AplInput {
            situation,
            enfants,
            revenus_mensuels: revenus,
            loyer_mensuel: loyer,
            zone,
            type_logement: None,
        }
    }

    #[test]
    fn test_refuses_negative_income() {
        let r = calculer_apl(
            &input(SituationApl::Seul, 0, -10.0, 500.0, Zone::Province),
            &AplBareme::default(),
        );
        assert!(matches!(
            r,
            Err(CalculError::InvalidInput { champ: "revenus_mensuels", .. })
        ));

        let r = calculer_apl(
            &input(SituationApl::Seul, 0, 1000.0, f64::NAN, Zone::Province),
            &AplBareme::default(),
        );
        assert!(r.is_err());
    }

    #[test]
    fn test_high_income_gives_zero_with_reason() {
        let d = calculer_apl(
            &input(SituationApl::Seul, 0, 8000.0, 400.0, Zone::Province),
            &AplBareme::default(),
        )
        .unwrap();

        assert_eq!(d.apl_estimee, 0.0);
        assert!(d.raison_zero.is_some());
        assert!(!d.eligible());
        assert_eq!(d.reste_charge, 400.0);
    }

    #[test]
    fn test_modest_income_high_rent_is_capped() {
        let d = calculer_apl(
            &input(SituationApl::Seul, 0, 900.0, 800.0, Zone::Idf),
            &AplBareme::default(),
        )
        .unwrap();

        // Rent retained 610, participation max(35, 270 - 72) = 198, raw 412, cap 320
        assert_eq!(d.loyer_pris_compte, 610.0);
        assert_eq!(d.participation, 198.0);
        assert_eq!(d.apl_brute, 412.0);
        assert_eq!(d.plafond_apl, 320.0);
        assert_eq!(d.apl_estimee, 320.0);
        assert!(d.is_plafonne);
        assert_eq!(d.reste_charge, 480.0);
        assert!(d.raison_zero.is_none());
    }

    #[test]
    fn test_participation_floor() {
        let d = calculer_apl(
            &input(SituationApl::Couple, 1, 0.0, 450.0, Zone::Province),
            &AplBareme::default(),
        )
        .unwrap();

        assert_eq!(d.participation, 35.0);
        assert_eq!(d.plafond_loyer, 630.0);
        // 450 - 35 = 415, cap 420 + 150 = 570
        assert_eq!(d.apl_estimee, 415.0);
        assert!(!d.is_plafonne);
    }

    #[test]
    fn test_cap_saturates() {
        let bareme = AplBareme::default();
        assert_eq!(bareme.plafond_apl(SituationApl::Seul, 0), 320.0);
        assert_eq!(bareme.plafond_apl(SituationApl::Monoparental, 2), 800.0);
        // 500 + 3 × 150 = 950, absolute cap 900
        assert_eq!(bareme.plafond_apl(SituationApl::Monoparental, 5), 900.0);
    }

    #[test]
    fn test_decreasing_in_income() {
        let bareme = AplBareme::default();
        let mut previous = f64::MAX;
        for step in 0..60 {
            let revenus = step as f64 * 50.0;
            let d = calculer_apl(
                &input(SituationApl::Monoparental, 2, revenus, 700.0, Zone::Province),
                &bareme,
            )
            .unwrap();
            assert!(d.apl_estimee <= previous);
            assert!(d.apl_estimee <= d.plafond_apl);
            assert!(d.apl_estimee >= 0.0);
            previous = d.apl_estimee;
        }
    }

    #[test]
    fn test_region_alias() {
        let json = r#"{"situation":"seul","enfants":0,"revenus_mensuels":900,"loyer_mensuel":800,"region":"idf"}"#;
        let parsed: AplInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.zone, Zone::Idf);
        assert_eq!(parsed.type_logement, None);
    }
}
