//! Indemnités kilométriques (mileage allowance)
//!
//! Cars use cumulative bands per fiscal power: one rate up to the first
//! threshold, a second up to the next, a third beyond. Two-wheelers are
//! paid a flat rate per km depending on engine size.

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::baremes::loader::LoadedBaremes;
use crate::baremes::{cumul_tranches, Tranche};
use crate::error::CalculError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TypeVehicule {
    Voiture,
    #[value(alias = "deux_roues")]
    DeuxRoues,
}

/// Fiscal power of a car, tagged as on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum PuissanceFiscale {
    #[serde(rename = "3CV et moins")]
    #[value(name = "3cv")]
    Cv3EtMoins,
    #[serde(rename = "4CV")]
    #[value(name = "4cv")]
    Cv4,
    #[serde(rename = "5CV")]
    #[value(name = "5cv")]
    Cv5,
    #[serde(rename = "6CV")]
    #[value(name = "6cv")]
    Cv6,
    #[serde(rename = "7CV et plus")]
    #[value(name = "7cv")]
    Cv7EtPlus,
}

impl PuissanceFiscale {
    pub const TOUTES: [PuissanceFiscale; 5] = [
        PuissanceFiscale::Cv3EtMoins,
        PuissanceFiscale::Cv4,
        PuissanceFiscale::Cv5,
        PuissanceFiscale::Cv6,
        PuissanceFiscale::Cv7EtPlus,
    ];

    fn index(self) -> usize {
        match self {
            PuissanceFiscale::Cv3EtMoins => 0,
            PuissanceFiscale::Cv4 => 1,
            PuissanceFiscale::Cv5 => 2,
            PuissanceFiscale::Cv6 => 3,
            PuissanceFiscale::Cv7EtPlus => 4,
        }
    }

    /// Key fragment in `parametres.csv`
    fn cle(self) -> &'static str {
        match self {
            PuissanceFiscale::Cv3EtMoins => "3cv",
            PuissanceFiscale::Cv4 => "4cv",
            PuissanceFiscale::Cv5 => "5cv",
            PuissanceFiscale::Cv6 => "6cv",
            PuissanceFiscale::Cv7EtPlus => "7cv",
        }
    }
}

/// Engine size of a two-wheeler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Cylindree {
    #[serde(rename = "moins_50cc")]
    #[value(name = "moins-50cc")]
    Moins50,
    #[serde(rename = "50cc_125cc")]
    #[value(name = "50-125cc")]
    De50A125,
    #[serde(rename = "plus_125cc")]
    #[value(name = "plus-125cc")]
    Plus125,
}

impl Cylindree {
    fn index(self) -> usize {
        match self {
            Cylindree::Moins50 => 0,
            Cylindree::De50A125 => 1,
            Cylindree::Plus125 => 2,
        }
    }

    fn cle(self) -> &'static str {
        match self {
            Cylindree::Moins50 => "moins_50cc",
            Cylindree::De50A125 => "50cc_125cc",
            Cylindree::Plus125 => "plus_125cc",
        }
    }
}

/// Mileage allowance rates, euros per km
#[derive(Debug, Clone, PartialEq)]
pub struct IkBareme {
    /// End of the first band, km
    pub seuil_bas: f64,
    /// End of the second band, km
    pub seuil_haut: f64,
    /// Per fiscal power, rates of the three bands
    pub voiture: [[f64; 3]; 5],
    /// Per engine size
    pub deux_roues: [f64; 3],
}

impl Default for IkBareme {
    fn default() -> Self {
        // Barème fiscal simplifié (taux par tranche), revenus 2024
        Self {
            seuil_bas: 5_000.0,
            seuil_haut: 20_000.0,
            voiture: [
                [0.502, 0.300, 0.360],
                [0.575, 0.323, 0.387],
                [0.603, 0.339, 0.407],
                [0.631, 0.355, 0.427],
                [0.659, 0.371, 0.447],
            ],
            deux_roues: [0.315, 0.388, 0.453],
        }
    }
}

impl IkBareme {
    /// Create from loaded CSV barèmes
    pub fn from_loaded(loaded: &LoadedBaremes) -> Self {
        let d = Self::default();
        let p = |cle: &str, v: f64| loaded.param_or(&format!("ik.{}", cle), v);

        let mut voiture = d.voiture;
        for puissance in PuissanceFiscale::TOUTES {
            let taux = &mut voiture[puissance.index()];
            for (bande, valeur) in taux.iter_mut().enumerate() {
                *valeur = p(&format!("voiture_{}_tranche_{}", puissance.cle(), bande + 1), *valeur);
            }
        }

        let mut deux_roues = d.deux_roues;
        for cylindree in [Cylindree::Moins50, Cylindree::De50A125, Cylindree::Plus125] {
            let valeur = &mut deux_roues[cylindree.index()];
            *valeur = p(&format!("deux_roues_{}", cylindree.cle()), *valeur);
        }

        Self {
            seuil_bas: p("seuil_bas", d.seuil_bas),
            seuil_haut: p("seuil_haut", d.seuil_haut),
            voiture,
            deux_roues,
        }
    }

    /// Cumulative bands of a fiscal power
    pub fn tranches(&self, puissance: PuissanceFiscale) -> [Tranche; 3] {
        let [t1, t2, t3] = self.voiture[puissance.index()];
        [
            Tranche::new(self.seuil_bas, t1),
            Tranche::new(self.seuil_haut, t2),
            Tranche::new(f64::INFINITY, t3),
        ]
    }

    pub fn taux_deux_roues(&self, cylindree: Cylindree) -> f64 {
        self.deux_roues[cylindree.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IkInput {
    pub type_vehicule: TypeVehicule,
    /// Business kilometres over the year
    pub kilometres: f64,
    /// Required for cars
    #[serde(default)]
    pub puissance: Option<PuissanceFiscale>,
    /// Required for two-wheelers
    #[serde(default, alias = "cylindreeMoto")]
    pub cylindree: Option<Cylindree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IkResult {
    pub total: f64,
    /// Average allowance per km
    pub indemnite_par_km: f64,
    pub kilometres: f64,
    pub type_vehicule: TypeVehicule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puissance: Option<PuissanceFiscale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cylindree: Option<Cylindree>,
}

/// Compute the yearly mileage allowance
pub fn calculer_ik(input: &IkInput, bareme: &IkBareme) -> Result<IkResult, CalculError> {
    let km = input.kilometres;
    if !km.is_finite() || km <= 0.0 {
        return Err(CalculError::invalid(
            "kilometres",
            "Veuillez saisir un nombre de kilomètres valide.",
        ));
    }

    let total = match input.type_vehicule {
        TypeVehicule::Voiture => {
            let puissance = input.puissance.ok_or_else(|| {
                CalculError::invalid("puissance", "Veuillez sélectionner la puissance fiscale (CV).")
            })?;
            cumul_tranches(km, &bareme.tranches(puissance))
        }
        TypeVehicule::DeuxRoues => {
            let cylindree = input.cylindree.ok_or_else(|| {
                CalculError::invalid("cylindree", "Veuillez sélectionner la cylindrée (deux-roues).")
            })?;
            km * bareme.taux_deux_roues(cylindree)
        }
    };

    debug!(
        "IK: {:?} {:?}{:?}, {} km -> {:.2}",
        input.type_vehicule, input.puissance, input.cylindree, km, total
    );

    Ok(IkResult {
        total,
        indemnite_par_km: total / km,
        kilometres: km,
        type_vehicule: input.type_vehicule,
        puissance: input.puissance,
        cylindree: input.cylindree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn voiture(km: f64, puissance: PuissanceFiscale) -> IkInput {
        IkInput {
            type_vehicule: TypeVehicule::Voiture,
            kilometres: km,
            puissance: Some(puissance),
            cylindree: None,
        }
    }

    fn ik(input: &IkInput) -> IkResult {
        calculer_ik(input, &IkBareme::default()).unwrap()
    }

    #[test]
    fn test_first_band() {
        let r = ik(&voiture(5_000.0, PuissanceFiscale::Cv5));
        assert_abs_diff_eq!(r.total, 3_015.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.indemnite_par_km, 0.603, epsilon = 1e-12);
    }

    #[test]
    fn test_second_band_boundaries() {
        // 5000 × 0.603 + 1 × 0.339
        let juste_apres = ik(&voiture(5_001.0, PuissanceFiscale::Cv5));
        assert_abs_diff_eq!(juste_apres.total, 3_015.339, epsilon = 1e-9);

        // 5000 × 0.603 + 15000 × 0.339
        let r = ik(&voiture(20_000.0, PuissanceFiscale::Cv5));
        assert_abs_diff_eq!(r.total, 8_100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.indemnite_par_km, 0.405, epsilon = 1e-12);
    }

    #[test]
    fn test_third_band() {
        let r = ik(&voiture(20_001.0, PuissanceFiscale::Cv5));
        assert_abs_diff_eq!(r.total, 8_100.407, epsilon = 1e-9);

        let r = ik(&voiture(30_000.0, PuissanceFiscale::Cv7EtPlus));
        // 5000 × 0.659 + 15000 × 0.371 + 10000 × 0.447
        assert_abs_diff_eq!(r.total, 3_295.0 + 5_565.0 + 4_470.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_wheelers_flat_rate() {
        let r = ik(&IkInput {
            type_vehicule: TypeVehicule::DeuxRoues,
            kilometres: 3_000.0,
            puissance: None,
            cylindree: Some(Cylindree::De50A125),
        });
        assert_abs_diff_eq!(r.total, 1_164.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.indemnite_par_km, 0.388, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_km() {
        let bareme = IkBareme::default();
        for km in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(calculer_ik(&voiture(km, PuissanceFiscale::Cv4), &bareme).is_err());
        }
    }

    #[test]
    fn test_requires_vehicle_detail() {
        let bareme = IkBareme::default();
        let sans_puissance = IkInput {
            puissance: None,
            ..voiture(1_000.0, PuissanceFiscale::Cv4)
        };
        assert!(calculer_ik(&sans_puissance, &bareme).is_err());

        let sans_cylindree = IkInput {
            type_vehicule: TypeVehicule::DeuxRoues,
            kilometres: 1_000.0,
            puissance: None,
            cylindree: None,
        };
        assert!(calculer_ik(&sans_cylindree, &bareme).is_err());
    }

    #[test]
    fn test_monotonic_in_km_and_power() {
        let bareme = IkBareme::default();
        for puissance in PuissanceFiscale::TOUTES {
            let mut previous = 0.0;
            for step in 1..60 {
                let r = calculer_ik(&voiture(step as f64 * 500.0, puissance), &bareme).unwrap();
                assert!(r.total > previous);
                previous = r.total;
            }
        }
        let faible = ik(&voiture(12_000.0, PuissanceFiscale::Cv3EtMoins)).total;
        let forte = ik(&voiture(12_000.0, PuissanceFiscale::Cv7EtPlus)).total;
        assert!(forte > faible);
    }

    #[test]
    fn test_form_json() {
        let json = r#"{"typeVehicule":"voiture","kilometres":8000,"puissance":"7CV et plus"}"#;
        let parsed: IkInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.puissance, Some(PuissanceFiscale::Cv7EtPlus));

        let json = r#"{"typeVehicule":"deux_roues","kilometres":800,"cylindreeMoto":"plus_125cc"}"#;
        let parsed: IkInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.cylindree, Some(Cylindree::Plus125));

        let r = serde_json::to_value(ik(&voiture(100.0, PuissanceFiscale::Cv4))).unwrap();
        assert!(r.get("indemniteParKm").is_some());
        assert!(r.get("cylindree").is_none());
    }
}
