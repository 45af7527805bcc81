//! Side-by-side comparison of formula results
//!
//! A comparison holds a bounded list of scenarios for one formula. Keyed
//! scenarios (a department, a profile label) replace any earlier scenario
//! with the same key instead of being added twice.

use log::warn;
use serde::Serialize;

use crate::error::ComparaisonError;
use crate::fiscalite::{
    calculer_frais_notaire, DmtoSource, NotaireBareme, NotaireInput, NotaireResult, TypeBien,
};

/// Default number of scenarios compared at once
pub const CAPACITE_DEFAUT: usize = 6;

/// Notary comparisons are limited to four departments
pub const CAPACITE_NOTAIRE: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario<T> {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cle: Option<String>,
    pub libelle: String,
    pub resultat: T,
}

/// Bounded list of scenarios for one formula
///
/// # Example
/// ```ignore
/// let mut comparaison = Comparaison::pour_notaire();
/// for dept in ["75", "36", "05"] {
///     let r = calculer_par_departement(250_000.0, dept, &bareme).ancien;
///     comparaison.ajouter_cle(dept, format!("Département {}", dept), r)?;
/// }
/// let moins_cher = comparaison.min_par(|r| r.total);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Comparaison<T> {
    scenarios: Vec<Scenario<T>>,
    capacite: usize,
    #[serde(skip)]
    prochain_id: u64,
}

impl<T> Comparaison<T> {
    pub fn new() -> Self {
        Self::avec_capacite(CAPACITE_DEFAUT)
    }

    pub fn avec_capacite(capacite: usize) -> Self {
        Self {
            scenarios: Vec::with_capacity(capacite),
            capacite,
            prochain_id: 1,
        }
    }

    pub fn pour_notaire() -> Self {
        Self::avec_capacite(CAPACITE_NOTAIRE)
    }

    fn pousser(&mut self, cle: Option<String>, libelle: String, resultat: T) -> u64 {
        let id = self.prochain_id;
        self.prochain_id += 1;
        self.scenarios.push(Scenario {
            id,
            cle,
            libelle,
            resultat,
        });
        id
    }

    /// Add an unkeyed scenario, returns its id
    pub fn ajouter(
        &mut self,
        libelle: impl Into<String>,
        resultat: T,
    ) -> Result<u64, ComparaisonError> {
        if self.est_pleine() {
            return Err(ComparaisonError::Pleine {
                capacite: self.capacite,
            });
        }
        Ok(self.pousser(None, libelle.into(), resultat))
    }

    /// Add a keyed scenario; an existing scenario with the same key is
    /// replaced, even when the comparison is full
    pub fn ajouter_cle(
        &mut self,
        cle: impl Into<String>,
        libelle: impl Into<String>,
        resultat: T,
    ) -> Result<u64, ComparaisonError> {
        let cle = cle.into();
        let existant = self
            .scenarios
            .iter()
            .position(|s| s.cle.as_deref() == Some(cle.as_str()));

        match existant {
            Some(index) => {
                self.scenarios.remove(index);
            }
            None if self.est_pleine() => {
                return Err(ComparaisonError::Pleine {
                    capacite: self.capacite,
                })
            }
            None => {}
        }
        Ok(self.pousser(Some(cle), libelle.into(), resultat))
    }

    pub fn supprimer(&mut self, id: u64) -> Option<Scenario<T>> {
        let index = self.scenarios.iter().position(|s| s.id == id)?;
        Some(self.scenarios.remove(index))
    }

    pub fn reinitialiser(&mut self) {
        self.scenarios.clear();
    }

    pub fn scenarios(&self) -> &[Scenario<T>] {
        &self.scenarios
    }

    pub fn capacite(&self) -> usize {
        self.capacite
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn est_pleine(&self) -> bool {
        self.scenarios.len() >= self.capacite
    }

    /// Scenario with the smallest value of `f` (first one on ties)
    pub fn min_par(&self, f: impl Fn(&T) -> f64) -> Option<&Scenario<T>> {
        self.scenarios.iter().fold(None, |best, s| match best {
            Some(b) if f(&b.resultat) <= f(&s.resultat) => Some(b),
            _ => Some(s),
        })
    }

    /// Scenario with the largest value of `f` (first one on ties)
    pub fn max_par(&self, f: impl Fn(&T) -> f64) -> Option<&Scenario<T>> {
        self.scenarios.iter().fold(None, |best, s| match best {
            Some(b) if f(&b.resultat) >= f(&s.resultat) => Some(b),
            _ => Some(s),
        })
    }
}

impl<T> Default for Comparaison<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare the fees of one purchase across departments, keyed by department
///
/// Departments past the notary capacity are ignored; a repeated code keeps
/// only its last occurrence.
pub fn comparer_departements(
    prix: f64,
    type_bien: TypeBien,
    departements: &[&str],
    bareme: &NotaireBareme,
) -> Comparaison<NotaireResult> {
    let mut comparaison = Comparaison::pour_notaire();
    for code in departements {
        let resultat = calculer_frais_notaire(
            &NotaireInput {
                prix,
                type_bien,
                dmto: DmtoSource::Departement(code.to_string()),
            },
            bareme,
        );
        if comparaison
            .ajouter_cle(*code, format!("Département {}", code), resultat)
            .is_err()
        {
            warn!("comparison full, department {} ignored", code);
        }
    }
    comparaison
}
