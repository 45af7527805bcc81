//! Notary fees (frais de notaire) for a property purchase
//!
//! Total = transfer duties (DMTO) + notary émoluments + TVA on émoluments
//! + CSI + débours + formalités. The DMTO rate depends on the department
//! for old properties and land, and is a flat reduced rate for new builds.

use std::collections::HashMap;
use std::str::FromStr;

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::baremes::loader::LoadedBaremes;
use crate::baremes::{cumul_tranches, Tranche};
use crate::format::{arrondi_centimes, arrondi_euro};

/// DMTO rate category of a department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorieDmto {
    Reduit,
    Standard,
    Majore,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("catégorie DMTO inconnue: `{0}`")]
pub struct CategorieInconnue(pub String);

impl FromStr for CategorieDmto {
    type Err = CategorieInconnue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reduit" | "réduit" => Ok(CategorieDmto::Reduit),
            "standard" => Ok(CategorieDmto::Standard),
            "majore" | "majoré" => Ok(CategorieDmto::Majore),
            _ => Err(CategorieInconnue(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TypeBien {
    Ancien,
    Neuf,
    Terrain,
}

/// How the DMTO rate is chosen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DmtoSource {
    /// Department code, e.g. `"75"`, `"2A"`, `"971"`
    Departement(String),
    /// Explicit rate, used as is
    Taux(f64),
    /// Falls back to the majoré rate
    #[default]
    Aucun,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotaireBareme {
    pub taux_reduit: f64,
    pub taux_standard: f64,
    pub taux_majore: f64,
    /// Flat duties on new builds
    pub taux_neuf: f64,

    /// Progressive émoluments, cumulative ceilings
    pub tranches_emoluments: Vec<Tranche>,
    pub taux_tva: f64,

    /// Contribution de sécurité immobilière
    pub csi_taux: f64,
    pub csi_minimum: f64,

    pub debours: f64,
    pub formalites: f64,

    /// Departments not listed here are majoré
    pub departements: HashMap<String, CategorieDmto>,

    /// Indicative total range shown on the pages, as a share of the price
    pub fourchette_ancien: (f64, f64),
    pub fourchette_neuf: (f64, f64),
}

impl Default for NotaireBareme {
    fn default() -> Self {
        // DMTO au 1er janvier 2026 (impots.gouv.fr), émoluments inchangés depuis 2021
        let mut departements = HashMap::new();
        for code in ["36", "976"] {
            departements.insert(code.to_string(), CategorieDmto::Reduit);
        }
        for code in [
            "05", "06", "07", "16", "26", "27", "48", "60", "65", "71", "971", "972",
        ] {
            departements.insert(code.to_string(), CategorieDmto::Standard);
        }

        Self {
            taux_reduit: 0.0509,
            taux_standard: 0.058,
            taux_majore: 0.0632,
            taux_neuf: 0.00715,
            tranches_emoluments: vec![
                Tranche::new(6_500.0, 0.0387),
                Tranche::new(17_000.0, 0.01596),
                Tranche::new(60_000.0, 0.01064),
                Tranche::new(f64::INFINITY, 0.00799),
            ],
            taux_tva: 0.20,
            csi_taux: 0.001,
            csi_minimum: 15.0,
            debours: 800.0,
            formalites: 400.0,
            departements,
            fourchette_ancien: (0.07, 0.08),
            fourchette_neuf: (0.02, 0.03),
        }
    }
}

impl NotaireBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        let p = |cle: &str, v: f64| loaded.param_or(&format!("notaire.{}", cle), v);
        Self {
            taux_reduit: p("taux_reduit", d.taux_reduit),
            taux_standard: p("taux_standard", d.taux_standard),
            taux_majore: p("taux_majore", d.taux_majore),
            taux_neuf: p("taux_neuf", d.taux_neuf),
            tranches_emoluments: loaded.tranches_emoluments.clone(),
            taux_tva: p("taux_tva", d.taux_tva),
            csi_taux: p("csi_taux", d.csi_taux),
            csi_minimum: p("csi_minimum", d.csi_minimum),
            debours: p("debours", d.debours),
            formalites: p("formalites", d.formalites),
            departements: loaded.departements_dmto.clone(),
            fourchette_ancien: (
                p("fourchette_ancien_min", d.fourchette_ancien.0),
                p("fourchette_ancien_max", d.fourchette_ancien.1),
            ),
            fourchette_neuf: (
                p("fourchette_neuf_min", d.fourchette_neuf.0),
                p("fourchette_neuf_max", d.fourchette_neuf.1),
            ),
        }
    }

    pub fn categorie(&self, departement: &str) -> CategorieDmto {
        self.departements
            .get(&departement.trim().to_uppercase())
            .copied()
            .unwrap_or(CategorieDmto::Majore)
    }

    pub fn taux_categorie(&self, categorie: CategorieDmto) -> f64 {
        match categorie {
            CategorieDmto::Reduit => self.taux_reduit,
            CategorieDmto::Standard => self.taux_standard,
            CategorieDmto::Majore => self.taux_majore,
        }
    }

    /// DMTO rate for a property type and rate source
    pub fn taux_dmto(&self, type_bien: TypeBien, source: &DmtoSource) -> f64 {
        if type_bien == TypeBien::Neuf {
            return self.taux_neuf;
        }
        match source {
            DmtoSource::Departement(code) => self.taux_categorie(self.categorie(code)),
            DmtoSource::Taux(taux) => *taux,
            DmtoSource::Aucun => self.taux_majore,
        }
    }
}

/// Émoluments before tax on the progressive barème
pub fn calcul_emoluments(prix: f64, bareme: &NotaireBareme) -> f64 {
    cumul_tranches(prix, &bareme.tranches_emoluments)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotaireInput {
    pub prix: f64,
    pub type_bien: TypeBien,
    #[serde(default)]
    pub dmto: DmtoSource,
}

/// Fee breakdown, each component rounded to the euro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotaireResult {
    pub prix: f64,
    pub type_bien: TypeBien,
    pub dmto_taux: f64,
    pub droits: f64,
    pub emoluments: f64,
    pub csi: f64,
    pub tva: f64,
    pub debours: f64,
    pub formalites: f64,
    pub total: f64,
    /// Total as a percentage of the price, two decimals
    pub pourcentage: f64,
}

/// Estimate the notary fees of a purchase
pub fn calculer_frais_notaire(input: &NotaireInput, bareme: &NotaireBareme) -> NotaireResult {
    let prix = input.prix;
    let dmto_taux = bareme.taux_dmto(input.type_bien, &input.dmto);

    let droits = prix * dmto_taux;
    let emoluments = calcul_emoluments(prix, bareme);
    let csi = (prix * bareme.csi_taux).max(bareme.csi_minimum);
    let tva = emoluments * bareme.taux_tva;
    let total = droits + emoluments + csi + tva + bareme.debours + bareme.formalites;

    let pourcentage = if prix > 0.0 {
        arrondi_centimes(total / prix * 100.0)
    } else {
        0.0
    };

    debug!(
        "notaire: {:?} {} at DMTO {} -> total {:.2} ({}%)",
        input.type_bien, prix, dmto_taux, total, pourcentage
    );

    NotaireResult {
        prix,
        type_bien: input.type_bien,
        dmto_taux,
        droits: arrondi_euro(droits),
        emoluments: arrondi_euro(emoluments),
        csi: arrondi_euro(csi),
        tva: arrondi_euro(tva),
        debours: bareme.debours,
        formalites: bareme.formalites,
        total: arrondi_euro(total),
        pourcentage,
    }
}

/// Old and new property fees for the same price and department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParDepartement {
    pub ancien: NotaireResult,
    pub neuf: NotaireResult,
}

pub fn calculer_par_departement(
    prix: f64,
    departement: &str,
    bareme: &NotaireBareme,
) -> ParDepartement {
    ParDepartement {
        ancien: calculer_frais_notaire(
            &NotaireInput {
                prix,
                type_bien: TypeBien::Ancien,
                dmto: DmtoSource::Departement(departement.to_string()),
            },
            bareme,
        ),
        neuf: calculer_frais_notaire(
            &NotaireInput {
                prix,
                type_bien: TypeBien::Neuf,
                dmto: DmtoSource::Aucun,
            },
            bareme,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input(prix: f64, type_bien: TypeBien, dmto: DmtoSource) -> NotaireInput {
        NotaireInput {
            prix,
            type_bien,
            dmto,
        }
    }

    #[test]
    fn test_emoluments_200k() {
        // 251.55 + 167.58 + 457.52 + 1118.60
        assert_abs_diff_eq!(
            calcul_emoluments(200_000.0, &NotaireBareme::default()),
            1995.25,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_emoluments_first_band_only() {
        assert_abs_diff_eq!(
            calcul_emoluments(5_000.0, &NotaireBareme::default()),
            193.5,
            epsilon = 1e-9
        );
        assert_eq!(calcul_emoluments(0.0, &NotaireBareme::default()), 0.0);
    }

    #[test]
    fn test_ancien_majore_200k() {
        let r = calculer_frais_notaire(
            &input(200_000.0, TypeBien::Ancien, DmtoSource::Aucun),
            &NotaireBareme::default(),
        );
        assert_eq!(r.dmto_taux, 0.0632);
        assert_eq!(r.droits, 12_640.0);
        assert_eq!(r.emoluments, 1995.0);
        assert_eq!(r.csi, 200.0);
        assert_eq!(r.tva, 399.0);
        assert_eq!(r.total, 16_434.0);
        assert_abs_diff_eq!(r.pourcentage, 8.22, epsilon = 1e-9);
    }

    #[test]
    fn test_department_categories() {
        let bareme = NotaireBareme::default();
        assert_eq!(bareme.categorie("36"), CategorieDmto::Reduit);
        assert_eq!(bareme.categorie("976"), CategorieDmto::Reduit);
        assert_eq!(bareme.categorie("06"), CategorieDmto::Standard);
        assert_eq!(bareme.categorie("972"), CategorieDmto::Standard);
        assert_eq!(bareme.categorie("75"), CategorieDmto::Majore);
        assert_eq!(bareme.categorie("2a"), CategorieDmto::Majore);
    }

    #[test]
    fn test_neuf_ignores_department() {
        let bareme = NotaireBareme::default();
        let r = calculer_frais_notaire(
            &input(200_000.0, TypeBien::Neuf, DmtoSource::Departement("36".to_string())),
            &bareme,
        );
        assert_eq!(r.dmto_taux, 0.00715);
        assert_eq!(r.droits, 1430.0);
        assert_eq!(r.total, 5224.0);
    }

    #[test]
    fn test_terrain_uses_department_rate() {
        let r = calculer_frais_notaire(
            &input(50_000.0, TypeBien::Terrain, DmtoSource::Departement("36".to_string())),
            &NotaireBareme::default(),
        );
        assert_eq!(r.dmto_taux, 0.0509);
    }

    #[test]
    fn test_explicit_rate_and_csi_minimum() {
        let r = calculer_frais_notaire(
            &input(10_000.0, TypeBien::Ancien, DmtoSource::Taux(0.05)),
            &NotaireBareme::default(),
        );
        assert_eq!(r.dmto_taux, 0.05);
        assert_eq!(r.droits, 500.0);
        assert_eq!(r.csi, 15.0);
    }

    #[test]
    fn test_zero_price() {
        let r = calculer_frais_notaire(
            &input(0.0, TypeBien::Ancien, DmtoSource::Aucun),
            &NotaireBareme::default(),
        );
        assert_eq!(r.pourcentage, 0.0);
        assert_eq!(r.total, 1215.0);
    }

    #[test]
    fn test_par_departement() {
        let r = calculer_par_departement(200_000.0, "05", &NotaireBareme::default());
        assert_eq!(r.ancien.dmto_taux, 0.058);
        assert_eq!(r.neuf.dmto_taux, 0.00715);
        assert!(r.ancien.total > r.neuf.total);
    }

    #[test]
    fn test_categorie_from_str() {
        assert_eq!("majoré".parse::<CategorieDmto>(), Ok(CategorieDmto::Majore));
        assert_eq!(" Reduit ".parse::<CategorieDmto>(), Ok(CategorieDmto::Reduit));
        assert!("inconnue".parse::<CategorieDmto>().is_err());
    }

    #[test]
    fn test_dmto_source_from_json() {
        let parsed: NotaireInput =
            serde_json::from_str(r#"{"prix": 150000, "typeBien": "ancien", "dmto": "2A"}"#).unwrap();
        assert_eq!(parsed.dmto, DmtoSource::Departement("2A".to_string()));

        let parsed: NotaireInput =
            serde_json::from_str(r#"{"prix": 150000, "typeBien": "ancien", "dmto": 0.058}"#).unwrap();
        assert_eq!(parsed.dmto, DmtoSource::Taux(0.058));

        let parsed: NotaireInput =
            serde_json::from_str(r#"{"prix": 150000, "typeBien": "neuf"}"#).unwrap();
        assert_eq!(parsed.dmto, DmtoSource::Aucun);
    }
}
