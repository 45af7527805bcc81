//! Simulateurs CLI
//!
//! Runs one formula from the command line and prints a French summary,
//! JSON or a `Propriété,Valeur` CSV.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;

use simulateurs::allocations::{
    calculer_aah, calculer_apl, calculer_apl_etudiant, calculer_are, calculer_asf,
    calculer_prime_activite, calculer_rsa, Activite, AahInput, AplEtudiantInput, AplInput,
    AreInput, AsfInput, LogementAah, LogementPrime, LogementRsa, PrimeActiviteInput, RsaInput,
    SituationApl, SituationAsf, SituationFamiliale, SituationFoyer, TypeActivite, TypeLogement,
    Zone,
};
use simulateurs::export::{ecrire_cle_valeur, ecrire_enregistrements};
use simulateurs::fiscalite::{
    calculer_frais_notaire, calculer_ik, calculer_ir, calculer_salaire, Cylindree, DmtoSource,
    IkInput, IrInput, NotaireInput, PuissanceFiscale, SalaireInput, StatutSalarie, TypeBien,
    TypeVehicule,
};
use simulateurs::format::{
    format_euro, format_euro_centimes, format_fourchette_pct, format_montant_mensuel, format_pct,
    format_pct_direct,
};
use simulateurs::scenario::comparer_departements;
use simulateurs::{detecter_zone, Baremes};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Texte,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "simulateurs", version, about = "Simulateurs d'aides, d'impôt et de frais de notaire")]
struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = Format::Texte)]
    format: Format,

    /// Directory of barème CSV files (embedded 2026 values when omitted)
    #[arg(long, global = true)]
    baremes: Option<PathBuf>,

    #[command(subcommand)]
    commande: Commande,
}

#[derive(Debug, Subcommand)]
enum Commande {
    /// Allocation de retour à l'emploi
    Are {
        #[arg(long, value_enum, default_value_t = SituationFoyer::Seul)]
        situation: SituationFoyer,
        /// Months worked in the last 28 months
        #[arg(long)]
        anciennete: u32,
        /// Average monthly gross salary
        #[arg(long)]
        salaire: f64,
        #[arg(long, default_value_t = 0)]
        personnes_charge: u32,
        #[arg(long)]
        age: u32,
    },
    /// Allocation de soutien familial
    Asf {
        #[arg(long, value_enum, default_value_t = SituationAsf::ParentIsole)]
        situation: SituationAsf,
        #[arg(long)]
        enfants: u32,
        #[arg(long)]
        revenus: f64,
        /// No dependent child under 21
        #[arg(long)]
        sans_enfant_a_charge: bool,
    },
    /// Aide personnalisée au logement
    Apl {
        #[arg(long, value_enum, default_value_t = SituationApl::Seul)]
        situation: SituationApl,
        #[arg(long, default_value_t = 0)]
        enfants: u32,
        #[arg(long)]
        revenus: f64,
        #[arg(long)]
        loyer: f64,
        #[arg(long, value_enum, conflicts_with = "code_postal")]
        zone: Option<Zone>,
        /// Detect the zone from a postal code
        #[arg(long)]
        code_postal: Option<String>,
        #[arg(long, value_enum)]
        type_logement: Option<TypeLogement>,
    },
    /// APL étudiant / jeune actif
    AplEtudiant {
        #[arg(long, value_enum, default_value_t = SituationFoyer::Seul)]
        situation: SituationFoyer,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        revenus: f64,
        #[arg(long)]
        loyer: f64,
        #[arg(long, default_value_t = 0)]
        personnes_charge: u32,
    },
    /// Allocation aux adultes handicapés
    Aah {
        #[arg(long, value_enum, default_value_t = SituationFamiliale::Seul)]
        situation: SituationFamiliale,
        #[arg(long, default_value_t = 0)]
        enfants: u32,
        /// Incapacity rate, percent
        #[arg(long)]
        taux_incapacite: f64,
        #[arg(long)]
        revenus: f64,
        #[arg(long, value_enum, default_value_t = LogementAah::Locataire)]
        logement: LogementAah,
    },
    /// Revenu de solidarité active
    Rsa {
        #[arg(long, value_enum, default_value_t = SituationFamiliale::Seul)]
        situation: SituationFamiliale,
        #[arg(long, default_value_t = 0)]
        enfants: u32,
        #[arg(long)]
        revenus: f64,
        #[arg(long, value_enum, default_value_t = LogementRsa::Loue)]
        logement: LogementRsa,
        #[arg(long, value_enum, default_value_t = Activite::Inactif)]
        activite: Activite,
    },
    /// Prime d'activité
    PrimeActivite {
        #[arg(long, value_enum, default_value_t = SituationFamiliale::Seul)]
        situation: SituationFamiliale,
        #[arg(long, default_value_t = 0)]
        enfants: u32,
        #[arg(long)]
        revenus_prof: f64,
        #[arg(long, default_value_t = 0.0)]
        autres_revenus: f64,
        #[arg(long, value_enum, default_value_t = LogementPrime::Loue)]
        logement: LogementPrime,
        #[arg(long, value_enum, default_value_t = TypeActivite::Salarie)]
        type_activite: TypeActivite,
    },
    /// Impôt sur le revenu
    Ir {
        /// Annual net taxable income
        #[arg(long)]
        revenu: f64,
        #[arg(long, default_value_t = 1.0)]
        parts: f64,
    },
    /// Salaire brut → net
    Salaire {
        #[arg(long)]
        brut: f64,
        #[arg(long, value_enum, default_value_t = StatutSalarie::NonCadre)]
        statut: StatutSalarie,
        /// Withholding rate, percent
        #[arg(long, default_value_t = 0.0)]
        taux_pas: f64,
    },
    /// Frais de notaire
    Notaire {
        #[arg(long)]
        prix: f64,
        #[arg(long, value_enum, default_value_t = TypeBien::Ancien)]
        type_bien: TypeBien,
        #[arg(long, conflicts_with = "taux")]
        departement: Option<String>,
        /// Explicit DMTO rate, e.g. 0.058
        #[arg(long)]
        taux: Option<f64>,
    },
    /// Indemnités kilométriques
    Ik {
        #[arg(long, value_enum, default_value_t = TypeVehicule::Voiture)]
        type_vehicule: TypeVehicule,
        /// Business kilometres over the year
        #[arg(long)]
        km: f64,
        #[arg(long, value_enum)]
        puissance: Option<PuissanceFiscale>,
        #[arg(long, value_enum)]
        cylindree: Option<Cylindree>,
    },
    /// Compare notary fees across departments
    Comparer {
        #[arg(long)]
        prix: f64,
        #[arg(long, value_enum, default_value_t = TypeBien::Ancien)]
        type_bien: TypeBien,
        #[arg(required = true)]
        departements: Vec<String>,
    },
    /// APL zone of a postal code
    Zone { code_postal: String },
}

/// Print a result in the requested format; `texte` builds the summary
fn afficher<T: Serialize>(format: Format, resultat: &T, texte: impl FnOnce() -> String) -> Result<()> {
    match format {
        Format::Texte => println!("{}", texte()),
        Format::Json => println!("{}", serde_json::to_string_pretty(resultat)?),
        Format::Csv => ecrire_cle_valeur(io::stdout().lock(), resultat)?,
    }
    Ok(())
}

fn charger_baremes(chemin: Option<&PathBuf>) -> Result<Baremes> {
    match chemin {
        Some(dir) => Baremes::from_csv_path(dir)
            .with_context(|| format!("loading barèmes from {}", dir.display())),
        None => Ok(Baremes::officiels_2026()),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let baremes = charger_baremes(cli.baremes.as_ref())?;
    info!("barèmes {} (effet {})", baremes.millesime.annee, baremes.millesime.date_effet);

    let format = cli.format;
    match cli.commande {
        Commande::Are {
            situation,
            anciennete,
            salaire,
            personnes_charge,
            age,
        } => {
            let r = calculer_are(
                &AreInput {
                    situation,
                    anciennete_emploi: anciennete,
                    salaire_referent: salaire,
                    personnes_charge,
                    age_personne: age,
                },
                &baremes.are,
            );
            afficher(format, &r, || {
                format!(
                    "ARE: {} (durée max {} mois)\n{}",
                    format_montant_mensuel(r.montant_estime),
                    r.duree_max,
                    r.explication
                )
            })
        }
        Commande::Asf {
            situation,
            enfants,
            revenus,
            sans_enfant_a_charge,
        } => {
            let r = calculer_asf(
                &AsfInput {
                    situation,
                    nombre_enfants: enfants,
                    revenus,
                    enfant_a_charge: !sans_enfant_a_charge,
                },
                &baremes.asf,
            );
            afficher(format, &r, || {
                format!(
                    "ASF: {}\n{}",
                    format_montant_mensuel(r.montant_estime),
                    r.explication
                )
            })
        }
        Commande::Apl {
            situation,
            enfants,
            revenus,
            loyer,
            zone,
            code_postal,
            type_logement,
        } => {
            let zone = match (zone, code_postal) {
                (Some(zone), _) => zone,
                (None, Some(code)) => {
                    let info = detecter_zone(&code);
                    info!("{} → {}", code, info);
                    info.zone_apl()
                }
                (None, None) => Zone::Province,
            };
            let r = calculer_apl(
                &AplInput {
                    situation,
                    enfants,
                    revenus_mensuels: revenus,
                    loyer_mensuel: loyer,
                    zone,
                    type_logement,
                },
                &baremes.apl,
            )
            .context("APL")?;
            afficher(format, &r, || {
                let mut texte = format!(
                    "APL ({}, {}): {}\nLoyer retenu {} sur {}, participation {}, reste à charge {}",
                    r.situation.libelle(),
                    r.zone.libelle(),
                    format_montant_mensuel(r.apl_estimee),
                    format_euro(r.loyer_pris_compte),
                    format_euro(r.loyer_mensuel),
                    format_euro(r.participation),
                    format_euro(r.reste_charge)
                );
                if let Some(raison) = &r.raison_zero {
                    texte.push('\n');
                    texte.push_str(raison);
                }
                texte
            })
        }
        Commande::AplEtudiant {
            situation,
            age,
            revenus,
            loyer,
            personnes_charge,
        } => {
            let r = calculer_apl_etudiant(
                &AplEtudiantInput {
                    situation,
                    age,
                    revenus,
                    charges_locatives: loyer,
                    personnes_charge,
                },
                &baremes.apl_etudiant,
            );
            afficher(format, &r, || {
                format!(
                    "APL étudiant: {}\n{}",
                    format_montant_mensuel(r.montant_estime),
                    r.explication
                )
            })
        }
        Commande::Aah {
            situation,
            enfants,
            taux_incapacite,
            revenus,
            logement,
        } => {
            let r = calculer_aah(
                &AahInput {
                    situation,
                    enfants,
                    taux_incapacite,
                    revenus,
                    logement,
                },
                &baremes.aah,
            );
            afficher(format, &r, || {
                format!(
                    "AAH: {} - {}\n{}",
                    format_euro_centimes(r.montant_estime),
                    r.eligibilite,
                    r.explication
                )
            })
        }
        Commande::Rsa {
            situation,
            enfants,
            revenus,
            logement,
            activite,
        } => {
            let r = calculer_rsa(
                &RsaInput {
                    situation,
                    enfants,
                    revenus,
                    logement,
                    activite,
                },
                &baremes.rsa,
            );
            afficher(format, &r, || {
                format!(
                    "RSA: {} - {}\n{}",
                    format_euro_centimes(r.montant_estime),
                    r.eligibilite,
                    r.explication
                )
            })
        }
        Commande::PrimeActivite {
            situation,
            enfants,
            revenus_prof,
            autres_revenus,
            logement,
            type_activite,
        } => {
            let r = calculer_prime_activite(
                &PrimeActiviteInput {
                    situation,
                    enfants,
                    revenus_prof,
                    autres_revenus,
                    logement,
                    type_activite,
                },
                &baremes.prime_activite,
            );
            afficher(format, &r, || {
                format!(
                    "Prime d'activité: {} - {}\n{}",
                    format_euro_centimes(r.montant_estime),
                    r.eligibilite,
                    r.explication
                )
            })
        }
        Commande::Ir { revenu, parts } => {
            let r = calculer_ir(&IrInput { revenu, parts }, &baremes.impot).context("IR")?;
            afficher(format, &r, || {
                let mut texte = format!(
                    "Impôt brut: {} ({} / mois)\nQuotient familial {}, taux moyen {}, TMI {}",
                    format_euro(r.ir_brut),
                    format_euro(r.mensualite_moyenne),
                    format_euro(r.qf),
                    format_pct(r.taux_moyen),
                    format_pct(r.taux_marginal)
                );
                for part in &r.repartition {
                    texte.push_str(&format!(
                        "\n  tranche {}: {} à {} à {} → {} par part",
                        part.tranche,
                        format_euro(part.de),
                        format_euro(part.a),
                        format_pct(part.taux),
                        format_euro(part.impot_par_part)
                    ));
                }
                texte
            })
        }
        Commande::Salaire {
            brut,
            statut,
            taux_pas,
        } => {
            let r = calculer_salaire(
                &SalaireInput {
                    brut_mensuel: brut,
                    statut,
                    taux_pas,
                },
                &baremes.salaire,
            )
            .context("salaire")?;
            afficher(format, &r, || {
                format!(
                    "Net avant impôt: {} / mois ({} / an)\nPAS {}: {}\nNet après impôt: {} / mois",
                    format_euro_centimes(r.net_avant_impot),
                    format_euro(r.net_avant_impot_annuel),
                    format_pct_direct(r.taux_pas),
                    format_euro_centimes(r.pas_mensuel),
                    format_euro_centimes(r.net_apres_impot)
                )
            })
        }
        Commande::Notaire {
            prix,
            type_bien,
            departement,
            taux,
        } => {
            let dmto = match (departement, taux) {
                (Some(code), _) => DmtoSource::Departement(code),
                (None, Some(taux)) => DmtoSource::Taux(taux),
                (None, None) => DmtoSource::Aucun,
            };
            let r = calculer_frais_notaire(
                &NotaireInput {
                    prix,
                    type_bien,
                    dmto,
                },
                &baremes.notaire,
            );
            let fourchette = match type_bien {
                TypeBien::Neuf => baremes.notaire.fourchette_neuf,
                _ => baremes.notaire.fourchette_ancien,
            };
            afficher(format, &r, || {
                format!(
                    "Frais de notaire: {} ({} du prix, repère {})\n\
                     Droits {} ({}), émoluments {}, TVA {}, CSI {}, débours {}, formalités {}",
                    format_euro(r.total),
                    format_pct_direct(r.pourcentage),
                    format_fourchette_pct(fourchette.0, fourchette.1),
                    format_euro(r.droits),
                    format_pct(r.dmto_taux),
                    format_euro(r.emoluments),
                    format_euro(r.tva),
                    format_euro(r.csi),
                    format_euro(r.debours),
                    format_euro(r.formalites)
                )
            })
        }
        Commande::Ik {
            type_vehicule,
            km,
            puissance,
            cylindree,
        } => {
            let r = calculer_ik(
                &IkInput {
                    type_vehicule,
                    kilometres: km,
                    puissance,
                    cylindree,
                },
                &baremes.ik,
            )
            .context("IK")?;
            afficher(format, &r, || {
                format!(
                    "Indemnités kilométriques: {} pour {} km ({} / km)",
                    format_euro_centimes(r.total),
                    r.kilometres,
                    format_euro_centimes(r.indemnite_par_km)
                )
            })
        }
        Commande::Comparer {
            prix,
            type_bien,
            departements,
        } => {
            let codes: Vec<&str> = departements.iter().map(String::as_str).collect();
            let comparaison = comparer_departements(prix, type_bien, &codes, &baremes.notaire);
            match format {
                Format::Csv => {
                    let resultats: Vec<_> =
                        comparaison.scenarios().iter().map(|s| &s.resultat).collect();
                    ecrire_enregistrements(io::stdout().lock(), &resultats)?;
                    Ok(())
                }
                _ => afficher(format, &comparaison, || {
                    let moins_cher = comparaison.min_par(|r| r.total).map(|s| s.id);
                    comparaison
                        .scenarios()
                        .iter()
                        .map(|s| {
                            format!(
                                "{}: {} ({}){}",
                                s.libelle,
                                format_euro(s.resultat.total),
                                format_pct(s.resultat.dmto_taux),
                                if Some(s.id) == moins_cher { "  ← moins cher" } else { "" }
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }),
            }
        }
        Commande::Zone { code_postal } => {
            let info = detecter_zone(&code_postal);
            afficher(format, &info, || {
                format!(
                    "{}\nLoyer moyen T2: {}, APL estimée (seul): {}",
                    info, info.loyer_moyen_t2, info.apl_estimee_seul
                )
            })
        }
    }
}
