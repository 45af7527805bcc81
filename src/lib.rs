//! Simulateurs - French benefit, tax and notary fee estimators
//!
//! This library provides:
//! - Social allowance estimates (ARE, ASF, APL, APL étudiant, AAH, RSA, prime d'activité)
//! - Income tax, net salary, notary fee and mileage allowance calculations
//! - 2026 barèmes, embedded or loaded from CSV, with a structural audit
//! - APL zone detection, scenario comparison and CSV export

pub mod allocations;
pub mod baremes;
pub mod error;
pub mod export;
pub mod fiscalite;
pub mod format;
pub mod scenario;
pub mod zones;

// Re-export commonly used types
pub use baremes::{Baremes, Millesime, Tranche};
pub use error::{BaremeError, CalculError, ComparaisonError, ExportError};
pub use scenario::Comparaison;
pub use zones::{detecter_zone, ZoneInfo};
