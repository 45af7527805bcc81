//! Structural sanity checks on a set of barèmes
//!
//! Catches the kind of drift that creeps in when rates are copied by hand:
//! wrong vintage, bands out of order, rates outside [0, 1], a minimum above
//! its maximum, DMTO categories in the wrong order.

use std::fmt;

use serde::Serialize;

use super::{Baremes, Tranche};
use crate::fiscalite::PuissanceFiscale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gravite {
    Critique,
    Majeur,
    Mineur,
}

impl fmt::Display for Gravite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gravite::Critique => "CRITIQUE",
            Gravite::Majeur => "MAJEUR",
            Gravite::Mineur => "MINEUR",
        })
    }
}

/// One finding of the audit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomalie {
    pub domaine: &'static str,
    pub gravite: Gravite,
    pub description: String,
    pub valeur: String,
    pub attendu: String,
}

struct Rapport {
    anomalies: Vec<Anomalie>,
}

impl Rapport {
    fn signaler(
        &mut self,
        domaine: &'static str,
        gravite: Gravite,
        description: impl Into<String>,
        valeur: impl ToString,
        attendu: impl Into<String>,
    ) {
        self.anomalies.push(Anomalie {
            domaine,
            gravite,
            description: description.into(),
            valeur: valeur.to_string(),
            attendu: attendu.into(),
        });
    }

    fn taux(&mut self, domaine: &'static str, nom: &str, taux: f64) {
        if !(0.0..=1.0).contains(&taux) {
            self.signaler(
                domaine,
                Gravite::Critique,
                format!("{} hors de [0, 1]", nom),
                taux,
                "0 ≤ taux ≤ 1",
            );
        }
    }

    fn bornes(&mut self, domaine: &'static str, nom: &str, min: f64, max: f64) {
        if min > max {
            self.signaler(
                domaine,
                Gravite::Critique,
                format!("{}: minimum supérieur au maximum", nom),
                format!("{} > {}", min, max),
                "min ≤ max",
            );
        }
    }

    fn croissant(&mut self, domaine: &'static str, nom: &str, valeurs: &[f64]) {
        if valeurs.windows(2).any(|w| w[0] > w[1]) {
            self.signaler(
                domaine,
                Gravite::Mineur,
                format!("{} non croissants", nom),
                format!("{:?}", valeurs),
                "valeurs croissantes",
            );
        }
    }

    fn tranches(&mut self, domaine: &'static str, tranches: &[Tranche]) {
        if tranches.is_empty() {
            self.signaler(domaine, Gravite::Critique, "barème vide", 0, "au moins une tranche");
            return;
        }
        if tranches.windows(2).any(|w| w[0].plafond >= w[1].plafond) {
            self.signaler(
                domaine,
                Gravite::Critique,
                "plafonds de tranches non strictement croissants",
                format!("{:?}", tranches.iter().map(|t| t.plafond).collect::<Vec<_>>()),
                "plafonds croissants",
            );
        }
        if let Some(derniere) = tranches.last() {
            if derniere.plafond.is_finite() {
                self.signaler(
                    domaine,
                    Gravite::Majeur,
                    "la dernière tranche doit être illimitée",
                    derniere.plafond,
                    "inf",
                );
            }
        }
        for (i, t) in tranches.iter().enumerate() {
            self.taux(domaine, &format!("taux de la tranche {}", i + 1), t.taux);
        }
    }
}

/// Audit a set of barèmes against the year they should apply to
pub fn auditer(baremes: &Baremes, annee_attendue: u16) -> Vec<Anomalie> {
    let mut r = Rapport {
        anomalies: Vec::new(),
    };

    if baremes.millesime.annee != annee_attendue {
        r.signaler(
            "millesime",
            Gravite::Critique,
            "barèmes d'un autre millésime",
            baremes.millesime.annee,
            annee_attendue.to_string(),
        );
    }

    let are = &baremes.are;
    r.taux("are", "taux de remplacement", are.taux_remplacement);
    r.bornes("are", "allocation journalière", are.minimum_journalier, are.maximum_journalier);
    if are.duree_standard_mois > are.duree_longue_mois {
        r.signaler(
            "are",
            Gravite::Majeur,
            "durée standard supérieure à la durée longue",
            are.duree_standard_mois,
            format!("≤ {}", are.duree_longue_mois),
        );
    }

    let apl = &baremes.apl;
    r.taux("apl", "taux de participation", apl.taux_participation);
    for (nom, plafond) in [
        ("plafond seul", apl.plafond_apl_seul),
        ("plafond couple", apl.plafond_apl_couple),
        ("plafond monoparental", apl.plafond_apl_monoparental),
        ("plafond autre", apl.plafond_apl_autre),
    ] {
        r.bornes("apl", nom, plafond, apl.plafond_apl_absolu);
    }

    r.taux("apl_etudiant", "part du loyer", baremes.apl_etudiant.pourcentage_loyer);

    let aah = &baremes.aah;
    r.taux("aah", "abattement", aah.taux_abattement);
    if aah.montant_base > aah.plafond {
        r.signaler(
            "aah",
            Gravite::Mineur,
            "montant de base au-dessus du plafond (toujours écrêté)",
            aah.montant_base,
            format!("≤ {}", aah.plafond),
        );
    }

    r.taux("rsa", "part des revenus retenue", baremes.rsa.taux_revenus_pris);
    r.croissant("rsa", "montants parent isolé", &baremes.rsa.montant_monoparental);

    r.taux("prime_activite", "abattement", baremes.prime_activite.taux_abattement);
    r.croissant(
        "prime_activite",
        "montants parent isolé",
        &baremes.prime_activite.montant_monoparental,
    );

    r.tranches("impot", &baremes.impot.tranches);

    r.taux("salaire", "taux cadre", baremes.salaire.taux_cadre);
    r.taux("salaire", "taux non cadre", baremes.salaire.taux_non_cadre);

    let notaire = &baremes.notaire;
    r.tranches("notaire", &notaire.tranches_emoluments);
    for (nom, taux) in [
        ("DMTO réduit", notaire.taux_reduit),
        ("DMTO standard", notaire.taux_standard),
        ("DMTO majoré", notaire.taux_majore),
        ("droits neuf", notaire.taux_neuf),
        ("TVA", notaire.taux_tva),
        ("CSI", notaire.csi_taux),
    ] {
        r.taux("notaire", nom, taux);
    }
    if !(notaire.taux_reduit <= notaire.taux_standard && notaire.taux_standard <= notaire.taux_majore)
    {
        r.signaler(
            "notaire",
            Gravite::Majeur,
            "taux DMTO incohérents",
            format!(
                "{} / {} / {}",
                notaire.taux_reduit, notaire.taux_standard, notaire.taux_majore
            ),
            "réduit ≤ standard ≤ majoré",
        );
    }
    if notaire.taux_neuf >= notaire.taux_reduit {
        r.signaler(
            "notaire",
            Gravite::Majeur,
            "droits du neuf au moins égaux au DMTO réduit",
            notaire.taux_neuf,
            format!("< {}", notaire.taux_reduit),
        );
    }
    r.bornes(
        "notaire",
        "fourchette ancien",
        notaire.fourchette_ancien.0,
        notaire.fourchette_ancien.1,
    );
    r.bornes(
        "notaire",
        "fourchette neuf",
        notaire.fourchette_neuf.0,
        notaire.fourchette_neuf.1,
    );

    let ik = &baremes.ik;
    for puissance in PuissanceFiscale::TOUTES {
        r.tranches("ik", &ik.tranches(puissance));
    }
    let premieres: Vec<f64> = ik.voiture.iter().map(|taux| taux[0]).collect();
    r.croissant("ik", "taux voiture jusqu'au premier seuil", &premieres);
    for taux in ik.deux_roues {
        r.taux("ik", "taux deux-roues", taux);
    }
    r.croissant("ik", "taux deux-roues", &ik.deux_roues);

    r.anomalies.sort_by_key(|a| a.gravite);
    r.anomalies
}
