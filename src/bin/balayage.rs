//! Sweep one formula over an income range and write the results to CSV
//!
//! Useful to eyeball monotonicity, thresholds and clamping of a formula
//! against a set of barèmes.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use rayon::prelude::*;
use serde::Serialize;

use simulateurs::allocations::{
    calculer_aah, calculer_apl, calculer_apl_etudiant, calculer_are, calculer_asf,
    calculer_prime_activite, calculer_rsa, Activite, AahInput, AplEtudiantInput, AplInput,
    AreInput, AsfInput, LogementAah, LogementPrime, LogementRsa, PrimeActiviteInput, RsaInput,
    SituationApl, SituationAsf, SituationFamiliale, SituationFoyer, TypeActivite, Zone,
};
use simulateurs::fiscalite::{
    calculer_frais_notaire, calculer_ik, calculer_ir, calculer_salaire, DmtoSource, IkInput,
    IrInput, NotaireInput, PuissanceFiscale, SalaireInput, StatutSalarie, TypeBien, TypeVehicule,
};
use simulateurs::Baremes;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Formule {
    /// Reference salary
    Are,
    /// Household income
    Asf,
    /// Monthly income, 600 € rent
    Apl,
    /// Monthly income, 500 € rent
    AplEtudiant,
    Aah,
    Rsa,
    /// Earned income
    PrimeActivite,
    /// Annual taxable income, one part
    Ir,
    /// Monthly gross salary
    Salaire,
    /// Purchase price
    Notaire,
    /// Yearly kilometres, 5CV car
    Ik,
}

/// Upper bound on the number of evaluated points
const MAX_POINTS: usize = 1_000_000;

#[derive(Debug, Parser)]
#[command(name = "balayage", about = "Sweep a formula over a range of amounts")]
struct Args {
    #[arg(value_enum)]
    formule: Formule,
    #[arg(long, default_value_t = 0.0)]
    de: f64,
    #[arg(long, default_value_t = 3000.0)]
    a: f64,
    #[arg(long, default_value_t = 50.0)]
    pas: f64,
    #[arg(long)]
    baremes: Option<PathBuf>,
    #[arg(long, default_value = "balayage.csv")]
    sortie: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
struct Ligne {
    valeur: f64,
    eligible: bool,
    montant: f64,
}

fn evaluer(formule: Formule, valeur: f64, baremes: &Baremes) -> Result<Ligne> {
    let (eligible, montant) = match formule {
        Formule::Are => {
            let r = calculer_are(
                &AreInput {
                    situation: SituationFoyer::Seul,
                    anciennete_emploi: 12,
                    salaire_referent: valeur,
                    personnes_charge: 0,
                    age_personne: 35,
                },
                &baremes.are,
            );
            (r.eligible, r.montant_estime)
        }
        Formule::Asf => {
            let r = calculer_asf(
                &AsfInput {
                    situation: SituationAsf::ParentIsole,
                    nombre_enfants: 2,
                    revenus: valeur,
                    enfant_a_charge: true,
                },
                &baremes.asf,
            );
            (r.eligible, r.montant_estime)
        }
        Formule::Apl => {
            let r = calculer_apl(
                &AplInput {
                    situation: SituationApl::Seul,
                    enfants: 0,
                    revenus_mensuels: valeur,
                    loyer_mensuel: 600.0,
                    zone: Zone::Province,
                    type_logement: None,
                },
                &baremes.apl,
            )?;
            (r.eligible(), r.apl_estimee)
        }
        Formule::AplEtudiant => {
            let r = calculer_apl_etudiant(
                &AplEtudiantInput {
                    situation: SituationFoyer::Seul,
                    age: 20,
                    revenus: valeur,
                    charges_locatives: 500.0,
                    personnes_charge: 0,
                },
                &baremes.apl_etudiant,
            );
            (r.eligible, r.montant_estime)
        }
        Formule::Aah => {
            let r = calculer_aah(
                &AahInput {
                    situation: SituationFamiliale::Seul,
                    enfants: 0,
                    taux_incapacite: 80.0,
                    revenus: valeur,
                    logement: LogementAah::Locataire,
                },
                &baremes.aah,
            );
            (r.eligible, r.montant_estime)
        }
        Formule::Rsa => {
            let r = calculer_rsa(
                &RsaInput {
                    situation: SituationFamiliale::Seul,
                    enfants: 0,
                    revenus: valeur,
                    logement: LogementRsa::Loue,
                    activite: Activite::Inactif,
                },
                &baremes.rsa,
            );
            (r.eligible, r.montant_estime)
        }
        Formule::PrimeActivite => {
            let r = calculer_prime_activite(
                &PrimeActiviteInput {
                    situation: SituationFamiliale::Seul,
                    enfants: 0,
                    revenus_prof: valeur,
                    autres_revenus: 0.0,
                    logement: LogementPrime::Loue,
                    type_activite: TypeActivite::Salarie,
                },
                &baremes.prime_activite,
            );
            (r.eligible, r.montant_estime)
        }
        Formule::Ir => {
            let r = calculer_ir(&IrInput { revenu: valeur, parts: 1.0 }, &baremes.impot)?;
            (true, r.ir_brut)
        }
        Formule::Salaire => {
            let r = calculer_salaire(
                &SalaireInput {
                    brut_mensuel: valeur,
                    statut: StatutSalarie::NonCadre,
                    taux_pas: 0.0,
                },
                &baremes.salaire,
            )?;
            (true, r.net_avant_impot)
        }
        Formule::Notaire => {
            let r = calculer_frais_notaire(
                &NotaireInput {
                    prix: valeur,
                    type_bien: TypeBien::Ancien,
                    dmto: DmtoSource::Aucun,
                },
                &baremes.notaire,
            );
            (true, r.total)
        }
        Formule::Ik => {
            let r = calculer_ik(
                &IkInput {
                    type_vehicule: TypeVehicule::Voiture,
                    kilometres: valeur,
                    puissance: Some(PuissanceFiscale::Cv5),
                    cylindree: None,
                },
                &baremes.ik,
            )?;
            (true, r.total)
        }
    };
    Ok(Ligne {
        valeur,
        eligible,
        montant,
    })
}

/// Points `de, de + pas, ...` up to `a` inclusive
fn points(de: f64, a: f64, pas: f64) -> Result<Vec<f64>> {
    ensure!(pas > 0.0, "--pas must be positive");
    ensure!(de.is_finite() && a.is_finite(), "--de and --a must be finite");
    ensure!(a >= de, "--a must not be below --de");

    let intervalles = ((a - de) / pas).floor();
    ensure!(
        intervalles < MAX_POINTS as f64,
        "{} points requested, at most {} allowed",
        intervalles + 1.0,
        MAX_POINTS
    );

    let nb_points = intervalles as usize + 1;
    Ok((0..nb_points).map(|i| de + i as f64 * pas).collect())
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let valeurs = points(args.de, args.a, args.pas)?;

    let baremes = match &args.baremes {
        Some(dir) => Baremes::from_csv_path(dir)
            .with_context(|| format!("loading barèmes from {}", dir.display()))?,
        None => Baremes::officiels_2026(),
    };

    let start = Instant::now();
    // Invalid points (e.g. a zero gross salary) are skipped
    let lignes: Vec<Ligne> = valeurs
        .par_iter()
        .filter_map(|&v| match evaluer(args.formule, v, &baremes) {
            Ok(ligne) => Some(ligne),
            Err(e) => {
                log::warn!("{:?} at {}: {}", args.formule, v, e);
                None
            }
        })
        .collect();
    info!("{} points evaluated in {:?}", lignes.len(), start.elapsed());

    let file = File::create(&args.sortie)
        .with_context(|| format!("creating {}", args.sortie.display()))?;
    let mut wtr = csv::Writer::from_writer(file);
    for ligne in &lignes {
        wtr.serialize(ligne)?;
    }
    wtr.flush()?;

    let eligibles = lignes.iter().filter(|l| l.eligible).count();
    let max = lignes.iter().map(|l| l.montant).fold(0.0, f64::max);
    println!(
        "{:?}: {} points, {} eligible, max {:.2} -> {}",
        args.formule,
        lignes.len(),
        eligibles,
        max,
        args.sortie.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_include_both_ends() {
        let valeurs = points(0.0, 100.0, 50.0).unwrap();
        assert_eq!(valeurs, vec![0.0, 50.0, 100.0]);
        assert_eq!(points(10.0, 10.0, 1.0).unwrap(), vec![10.0]);
    }

    #[test]
    fn test_points_rejects_bad_ranges() {
        assert!(points(0.0, 100.0, 0.0).is_err());
        assert!(points(0.0, 100.0, f64::NAN).is_err());
        assert!(points(100.0, 0.0, 1.0).is_err());
        assert!(points(0.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_points_are_bounded() {
        assert_eq!(points(0.0, 999_999.0, 1.0).unwrap().len(), MAX_POINTS);
        assert!(points(0.0, 1_000_000.0, 1.0).is_err());
        assert!(points(0.0, 1e12, 0.001).is_err());
    }

    #[test]
    fn test_mileage_sweep_skips_zero_km() {
        let baremes = Baremes::officiels_2026();
        assert!(evaluer(Formule::Ik, 0.0, &baremes).is_err());
        let ligne = evaluer(Formule::Ik, 5_000.0, &baremes).unwrap();
        assert!((ligne.montant - 3_015.0).abs() < 1e-9);
    }
}
