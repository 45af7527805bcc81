//! APL zone detection from a postal code
//!
//! Department → zone 1 (Île-de-France), 2 (agglomérations), 3 (communes
//! rurales, also the fallback) or 4 (outre-mer).

use serde::Serialize;

use crate::allocations::Zone;

/// Departments in zone 1
const ZONE_1: &[&str] = &["75", "77", "78", "91", "92", "93", "94", "95"];

/// Departments in zone 2
const ZONE_2: &[&str] = &[
    "13", "14", "21", "25", "33", "34", "35", "38", "44", "51", "54", "55", "57", "59", "60", "62",
    "63", "64", "66", "67", "68", "69", "70", "71", "72", "73", "74", "76", "80", "83", "85", "86",
    "87", "89", "90",
];

/// Overseas departments in zone 4
const ZONE_4: &[&str] = &["971", "972", "973", "974", "976"];

/// Display information for a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInfo {
    pub zone: u8,
    pub nom: &'static str,
    pub description: &'static str,
    pub loyer_moyen_t2: &'static str,
    pub apl_estimee_seul: &'static str,
}

impl ZoneInfo {
    pub fn pour_zone(zone: u8) -> Self {
        match zone {
            1 => ZoneInfo {
                zone: 1,
                nom: "Zone 1 - Île-de-France",
                description: "Région avec les loyers les plus élevés de France",
                loyer_moyen_t2: "900–1200 €",
                apl_estimee_seul: "200–280 €",
            },
            2 => ZoneInfo {
                zone: 2,
                nom: "Zone 2 - Agglomérations",
                description: "Villes principales et agglomérations",
                loyer_moyen_t2: "600–800 €",
                apl_estimee_seul: "160–220 €",
            },
            4 => ZoneInfo {
                zone: 4,
                nom: "DOM-TOM - Outre-mer",
                description: "Départements et collectivités d'outre-mer",
                loyer_moyen_t2: "500–700 €",
                apl_estimee_seul: "150–250 €",
            },
            _ => ZoneInfo {
                zone: 3,
                nom: "Zone 3 - Communes rurales",
                description: "Communes isolées et zones peu denses",
                loyer_moyen_t2: "400–500 €",
                apl_estimee_seul: "140–190 €",
            },
        }
    }

    /// Zone used by the APL formula
    pub fn zone_apl(&self) -> Zone {
        match self.zone {
            1 => Zone::Idf,
            4 => Zone::Dom,
            _ => Zone::Province,
        }
    }
}

impl std::fmt::Display for ZoneInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.nom, self.description)
    }
}

/// Department code of a postal code: two characters, `2A`/`2B` for
/// Corsica and three digits overseas (`97x`)
pub fn departement(code_postal: &str) -> String {
    let code = code_postal.trim().to_uppercase();
    if code.starts_with("2A") || code.starts_with("2B") {
        return code[..2].to_string();
    }
    if let Some(reste) = code.strip_prefix("20") {
        // 200xx-201xx Corse-du-Sud, 202xx-206xx Haute-Corse
        return match reste.chars().next() {
            Some('0') | Some('1') => "2A".to_string(),
            Some(_) => "2B".to_string(),
            None => code,
        };
    }
    let longueur = if code.starts_with("97") { 3 } else { 2 };
    code.chars().take(longueur).collect()
}

/// Zone number (1 to 4) of a department code
pub fn zone_departement(departement: &str) -> u8 {
    if ZONE_1.contains(&departement) {
        1
    } else if ZONE_2.contains(&departement) {
        2
    } else if ZONE_4.contains(&departement) {
        4
    } else {
        3
    }
}

/// Detect the APL zone of a postal code
pub fn detecter_zone(code_postal: &str) -> ZoneInfo {
    ZoneInfo::pour_zone(zone_departement(&departement(code_postal)))
}
