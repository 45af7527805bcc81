//! CSV-based barème loader
//!
//! Loads rate tables from CSV files in data/baremes/

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use chrono::NaiveDate;
use log::{info, warn};

use super::{Millesime, Tranche};
use crate::error::BaremeError;
use crate::fiscalite::notaire::CategorieDmto;

/// Default path to the barèmes directory
pub const DEFAULT_BAREMES_PATH: &str = "data/baremes";

pub const FICHIER_PARAMETRES: &str = "parametres.csv";
pub const FICHIER_BAREME_IR: &str = "bareme_ir.csv";
pub const FICHIER_EMOLUMENTS: &str = "emoluments_notaire.csv";
pub const FICHIER_DMTO: &str = "dmto_departements.csv";
pub const FICHIER_MILLESIME: &str = "millesime.csv";

/// Parameters read as counts, ages or months: must be whole and non-negative
pub const CLES_ENTIERES: [&str; 6] = [
    "are.anciennete_minimum_mois",
    "are.age_duree_longue",
    "are.duree_standard_mois",
    "are.duree_longue_mois",
    "asf.enfants_max",
    "apl.plafond_apl_enfants_max",
];

fn open_reader(path: &Path, fichier: &str) -> Result<csv::Reader<File>, BaremeError> {
    let full = path.join(fichier);
    let file = File::open(&full).map_err(|source| BaremeError::Io {
        path: full.clone(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file))
}

fn records<R: io::Read>(
    reader: &mut csv::Reader<R>,
    fichier: &str,
) -> Result<Vec<csv::StringRecord>, BaremeError> {
    reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| BaremeError::Csv {
            fichier: fichier.to_string(),
            source,
        })
}

fn parse_f64(fichier: &str, ligne: usize, valeur: Option<&str>) -> Result<f64, BaremeError> {
    let valeur = valeur.unwrap_or("");
    valeur.parse::<f64>().map_err(|_| BaremeError::Parse {
        fichier: fichier.to_string(),
        ligne,
        valeur: valeur.to_string(),
    })
}

fn valeur_acceptable(cle: &str, valeur: f64) -> bool {
    if !valeur.is_finite() {
        return false;
    }
    if CLES_ENTIERES.contains(&cle) {
        return valeur >= 0.0 && valeur.fract() == 0.0 && valeur <= u32::MAX as f64;
    }
    true
}

/// Load scalar parameters (`cle,valeur`)
/// Returns HashMap<key, value>
pub fn load_parametres(path: &Path) -> Result<HashMap<String, f64>, BaremeError> {
    let mut reader = open_reader(path, FICHIER_PARAMETRES)?;
    read_parametres(&mut reader)
}

/// Values must be finite; integer keys must be whole and non-negative
fn read_parametres<R: io::Read>(
    reader: &mut csv::Reader<R>,
) -> Result<HashMap<String, f64>, BaremeError> {
    let mut parametres = HashMap::new();

    // Line numbers are 1-based and count the header
    for (idx, record) in records(reader, FICHIER_PARAMETRES)?.iter().enumerate() {
        let ligne = idx + 2;
        let cle = record.get(0).unwrap_or("").to_string();
        if cle.is_empty() {
            warn!("{}: skipping line {} with empty key", FICHIER_PARAMETRES, ligne);
            continue;
        }
        let valeur = parse_f64(FICHIER_PARAMETRES, ligne, record.get(1))?;
        if !valeur_acceptable(&cle, valeur) {
            return Err(BaremeError::Parse {
                fichier: FICHIER_PARAMETRES.to_string(),
                ligne,
                valeur: record.get(1).unwrap_or("").to_string(),
            });
        }
        if parametres.insert(cle.clone(), valeur).is_some() {
            warn!("{}: key `{}` redefined on line {}", FICHIER_PARAMETRES, cle, ligne);
        }
    }

    Ok(parametres)
}

/// Load a progressive band table (`plafond,taux`); the last ceiling may be `inf`
/// Ceilings must be strictly ascending
pub fn load_tranches(path: &Path, fichier: &str) -> Result<Vec<Tranche>, BaremeError> {
    let mut reader = open_reader(path, fichier)?;
    let mut tranches: Vec<Tranche> = Vec::new();

    for (idx, record) in records(&mut reader, fichier)?.iter().enumerate() {
        let ligne = idx + 2;
        let plafond = parse_f64(fichier, ligne, record.get(0))?;
        let taux = parse_f64(fichier, ligne, record.get(1))?;

        if let Some(prev) = tranches.last() {
            if plafond <= prev.plafond {
                return Err(BaremeError::BandsNotAscending {
                    fichier: fichier.to_string(),
                    ligne,
                });
            }
        }
        tranches.push(Tranche { plafond, taux });
    }

    if tranches.is_empty() {
        return Err(BaremeError::Empty {
            fichier: fichier.to_string(),
        });
    }

    Ok(tranches)
}

/// Load the DMTO category of each department (`departement,categorie`)
/// Departments not listed fall back to the majoré rate
pub fn load_dmto_departements(path: &Path) -> Result<HashMap<String, CategorieDmto>, BaremeError> {
    let mut reader = open_reader(path, FICHIER_DMTO)?;
    let mut departements = HashMap::new();

    for (idx, record) in records(&mut reader, FICHIER_DMTO)?.iter().enumerate() {
        let ligne = idx + 2;
        let code = record.get(0).unwrap_or("").to_uppercase();
        let categorie_txt = record.get(1).unwrap_or("");
        let categorie: CategorieDmto =
            categorie_txt
                .parse()
                .map_err(|_| BaremeError::UnknownCategory {
                    fichier: FICHIER_DMTO.to_string(),
                    ligne,
                    categorie: categorie_txt.to_string(),
                })?;
        departements.insert(code, categorie);
    }

    Ok(departements)
}

/// Load the vintage of the barèmes (`annee,date_effet`), first row only
pub fn load_millesime(path: &Path) -> Result<Millesime, BaremeError> {
    let mut reader = open_reader(path, FICHIER_MILLESIME)?;
    let rows = records(&mut reader, FICHIER_MILLESIME)?;
    let record = rows.first().ok_or_else(|| BaremeError::Empty {
        fichier: FICHIER_MILLESIME.to_string(),
    })?;

    let annee_txt = record.get(0).unwrap_or("");
    let annee: u16 = annee_txt.parse().map_err(|_| BaremeError::Parse {
        fichier: FICHIER_MILLESIME.to_string(),
        ligne: 2,
        valeur: annee_txt.to_string(),
    })?;
    let date_txt = record.get(1).unwrap_or("");
    let date_effet =
        NaiveDate::parse_from_str(date_txt, "%Y-%m-%d").map_err(|_| BaremeError::Parse {
            fichier: FICHIER_MILLESIME.to_string(),
            ligne: 2,
            valeur: date_txt.to_string(),
        })?;

    Ok(Millesime { annee, date_effet })
}

/// Raw barème data loaded from one directory
#[derive(Debug, Clone)]
pub struct LoadedBaremes {
    pub millesime: Millesime,
    pub parametres: HashMap<String, f64>,
    pub tranches_ir: Vec<Tranche>,
    pub tranches_emoluments: Vec<Tranche>,
    pub departements_dmto: HashMap<String, CategorieDmto>,
}

impl LoadedBaremes {
    /// Load all barèmes from the default path
    pub fn load_default() -> Result<Self, BaremeError> {
        Self::load_from(Path::new(DEFAULT_BAREMES_PATH))
    }

    /// Load all barèmes from a specific path
    pub fn load_from(path: &Path) -> Result<Self, BaremeError> {
        let loaded = Self {
            millesime: load_millesime(path)?,
            parametres: load_parametres(path)?,
            tranches_ir: load_tranches(path, FICHIER_BAREME_IR)?,
            tranches_emoluments: load_tranches(path, FICHIER_EMOLUMENTS)?,
            departements_dmto: load_dmto_departements(path)?,
        };
        info!(
            "loaded barèmes {} from {} ({} parameters)",
            loaded.millesime.annee,
            path.display(),
            loaded.parametres.len()
        );
        Ok(loaded)
    }

    /// Scalar parameter, or `default` when the key is absent
    pub fn param_or(&self, cle: &str, default: f64) -> f64 {
        self.parametres.get(cle).copied().unwrap_or(default)
    }

    /// Integer parameter (counts, ages, months), or `default` when absent
    /// or not a whole number in u32 range
    pub fn param_u32_or(&self, cle: &str, default: u32) -> u32 {
        match self.parametres.get(cle) {
            Some(v)
                if v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64 =>
            {
                *v as u32
            }
            Some(v) => {
                warn!("parameter `{}` is not a whole count ({}), keeping {}", cle, v, default);
                default
            }
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_baremes() {
        let result = LoadedBaremes::load_default();
        assert!(result.is_ok(), "Failed to load barèmes: {:?}", result.err());

        let loaded = result.unwrap();

        assert_eq!(loaded.millesime.annee, 2026);
        assert_eq!(loaded.tranches_ir.len(), 5);
        assert!(loaded.tranches_ir.last().unwrap().plafond.is_infinite());
        assert_eq!(loaded.tranches_emoluments.len(), 4);
        assert_eq!(loaded.departements_dmto.get("36"), Some(&CategorieDmto::Reduit));
        assert_eq!(loaded.departements_dmto.get("971"), Some(&CategorieDmto::Standard));
        assert_eq!(loaded.param_or("asf.montant_par_enfant", 0.0), 199.19);
        assert_eq!(loaded.param_u32_or("are.anciennete_minimum_mois", 0), 4);
    }

    #[test]
    fn test_missing_directory() {
        let err = LoadedBaremes::load_from(Path::new("data/does_not_exist")).unwrap_err();
        assert!(matches!(err, BaremeError::Io { .. }));
    }

    #[test]
    fn test_param_defaults() {
        let mut loaded = LoadedBaremes::load_default().unwrap();
        loaded.parametres.insert("x.negatif".to_string(), -3.0);

        assert_eq!(loaded.param_or("x.absent", 1.5), 1.5);
        assert_eq!(loaded.param_u32_or("x.absent", 7), 7);
        assert_eq!(loaded.param_u32_or("x.negatif", 7), 7);
    }

    #[test]
    fn test_param_u32_rejects_fractions_and_non_finite() {
        let mut loaded = LoadedBaremes::load_default().unwrap();
        for (cle, valeur) in [
            ("x.fraction", 4.7),
            ("x.infini", f64::INFINITY),
            ("x.nan", f64::NAN),
            ("x.trop_grand", 1e12),
        ] {
            loaded.parametres.insert(cle.to_string(), valeur);
            assert_eq!(loaded.param_u32_or(cle, 7), 7, "{}", cle);
        }
        loaded.parametres.insert("x.entier".to_string(), 12.0);
        assert_eq!(loaded.param_u32_or("x.entier", 7), 12);
    }

    fn parse(contenu: &str) -> Result<HashMap<String, f64>, BaremeError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(contenu.as_bytes());
        read_parametres(&mut reader)
    }

    #[test]
    fn test_rejects_fractional_count_on_its_line() {
        let err = parse("cle,valeur\nrsa.montant_seul,651.69\nare.duree_standard_mois,4.7\n")
            .unwrap_err();
        match err {
            BaremeError::Parse { ligne, valeur, .. } => {
                assert_eq!(ligne, 3);
                assert_eq!(valeur, "4.7");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(parse("cle,valeur\nasf.enfants_max,-1\n").is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        assert!(parse("cle,valeur\nrsa.montant_seul,inf\n").is_err());
        assert!(parse("cle,valeur\nrsa.montant_seul,NaN\n").is_err());

        let ok = parse("cle,valeur\nare.age_duree_longue,55\nrsa.taux_revenus_pris,0.62\n").unwrap();
        assert_eq!(ok.get("are.age_duree_longue"), Some(&55.0));
        assert_eq!(ok.get("rsa.taux_revenus_pris"), Some(&0.62));
    }
}
