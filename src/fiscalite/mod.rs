//! Tax and fee formulas: income tax, net salary, notary fees and
//! mileage allowance
//!
//! Unlike the allowances, these formulas refuse meaningless inputs
//! (negative income, zero tax parts, ...) with a [`CalculError`].
//!
//! [`CalculError`]: crate::error::CalculError

pub mod ik;
pub mod impot;
pub mod notaire;
pub mod salaire;

pub use ik::{calculer_ik, Cylindree, IkBareme, IkInput, IkResult, PuissanceFiscale, TypeVehicule};
pub use impot::{calculer_ir, BaremeIr, IrInput, IrResult, PartTranche};
pub use notaire::{
    calcul_emoluments, calculer_frais_notaire, calculer_par_departement, CategorieDmto, DmtoSource,
    NotaireBareme, NotaireInput, NotaireResult, TypeBien,
};
pub use salaire::{calculer_salaire, SalaireBareme, SalaireInput, SalaireResult, StatutSalarie};
