//! CSV export of results
//!
//! Nested records are flattened with dotted keys (`details.montantBase`).
//! Every field is quoted.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::error::ExportError;

fn aplatir_valeur(prefixe: &str, valeur: &Value, out: &mut Vec<(String, String)>) {
    let cle = |suffixe: &str| {
        if prefixe.is_empty() {
            suffixe.to_string()
        } else {
            format!("{}.{}", prefixe, suffixe)
        }
    };
    match valeur {
        Value::Object(map) => {
            for (k, v) in map {
                aplatir_valeur(&cle(k), v, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                aplatir_valeur(&cle(&i.to_string()), v, out);
            }
        }
        Value::Null => out.push((prefixe.to_string(), String::new())),
        Value::String(s) => out.push((prefixe.to_string(), s.clone())),
        Value::Bool(b) => out.push((prefixe.to_string(), b.to_string())),
        Value::Number(n) => out.push((prefixe.to_string(), n.to_string())),
    }
}

/// Flatten a record into `(key, value)` pairs, in field order
pub fn aplatir<S: Serialize>(record: &S) -> Result<Vec<(String, String)>, ExportError> {
    let valeur = serde_json::to_value(record)?;
    let mut out = Vec::new();
    aplatir_valeur("", &valeur, &mut out);
    Ok(out)
}

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(out)
}

/// Write one record as `Propriété,Valeur` rows
pub fn ecrire_cle_valeur<W: Write, S: Serialize>(out: W, record: &S) -> Result<(), ExportError> {
    let mut wtr = writer(out);
    wtr.write_record(["Propriété", "Valeur"])?;
    for (cle, valeur) in aplatir(record)? {
        wtr.write_record([cle, valeur])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records as a table; columns come from the first record
pub fn ecrire_enregistrements<W: Write, S: Serialize>(
    out: W,
    records: &[S],
) -> Result<(), ExportError> {
    let lignes = records.iter().map(aplatir).collect::<Result<Vec<_>, _>>()?;
    let Some(premiere) = lignes.first() else {
        return Ok(());
    };

    let entetes: Vec<String> = premiere.iter().map(|(k, _)| k.clone()).collect();
    let mut wtr = writer(out);
    wtr.write_record(&entetes)?;
    for ligne in &lignes {
        let valeurs = entetes.iter().map(|entete| {
            ligne
                .iter()
                .find(|(k, _)| k == entete)
                .map(|(_, v)| v.as_str())
                .unwrap_or("")
        });
        wtr.write_record(valeurs)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocations::{calculer_asf, AsfBareme, AsfInput, SituationAsf};

    fn asf() -> crate::allocations::AsfResult {
        calculer_asf(
            &AsfInput {
                situation: SituationAsf::ParentIsole,
                nombre_enfants: 2,
                revenus: 900.0,
                enfant_a_charge: true,
            },
            &AsfBareme::default(),
        )
    }

    #[test]
    fn test_flatten_nested_details() {
        let paires = aplatir(&asf()).unwrap();
        assert!(paires.contains(&("eligible".to_string(), "true".to_string())));
        assert!(paires.contains(&("details.nombreEnfantsEligibles".to_string(), "2".to_string())));
    }

    #[test]
    fn test_key_value_export_quotes_everything() {
        let mut buf = Vec::new();
        ecrire_cle_valeur(&mut buf, &asf()).unwrap();
        let texte = String::from_utf8(buf).unwrap();

        let mut lignes = texte.lines();
        assert_eq!(lignes.next(), Some("\"Propriété\",\"Valeur\""));
        assert!(texte.contains("\"montantEstime\",\"398.38\""));
    }

    #[test]
    fn test_records_export() {
        let mut buf = Vec::new();
        ecrire_enregistrements(&mut buf, &[asf(), asf()]).unwrap();
        let texte = String::from_utf8(buf).unwrap();
        assert_eq!(texte.lines().count(), 3);
        assert!(texte.starts_with("\"eligible\","));
    }

    #[test]
    fn test_empty_records() {
        let mut buf = Vec::new();
        let vide: [crate::allocations::AsfResult; 0] = [];
        ecrire_enregistrements(&mut buf, &vide).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        #[derive(Serialize)]
        struct Note {
            texte: &'static str,
        }
        let mut buf = Vec::new();
        ecrire_cle_valeur(&mut buf, &Note { texte: "dit \"oui\"" }).unwrap();
        let texte = String::from_utf8(buf).unwrap();
        assert!(texte.contains("\"texte\",\"dit \"\"oui\"\"\""));
    }
}
