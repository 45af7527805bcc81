//! Rounding and French display formatting
//!
//! Rounding follows the half-up convention used by the site's forms
//! (`floor(x + 0.5)`), not Rust's half-away-from-zero `f64::round`.

/// Narrow no-break space used by fr-FR as the thousands separator
const SEPARATEUR_MILLIERS: char = '\u{202f}';

/// No-break space placed before the currency sign
const ESPACE_INSECABLE: char = '\u{a0}';

/// Round half-up to the nearest euro
pub fn arrondi_euro(montant: f64) -> f64 {
    (montant + 0.5).floor()
}

/// Round half-up to the nearest cent
pub fn arrondi_centimes(montant: f64) -> f64 {
    (montant * 100.0 + 0.5).floor() / 100.0
}

/// Group the digits of a non-negative integer string by thousands
fn grouper_milliers(entier: &str) -> String {
    let mut out = String::with_capacity(entier.len() + entier.len() / 3);
    for (i, c) in entier.chars().enumerate() {
        if i > 0 && (entier.len() - i) % 3 == 0 {
            out.push(SEPARATEUR_MILLIERS);
        }
        out.push(c);
    }
    out
}

/// Format an amount in whole euros, e.g. `16 434 €`
pub fn format_euro(montant: f64) -> String {
    let arrondi = arrondi_euro(montant);
    let signe = if arrondi < 0.0 { "-" } else { "" };
    let entier = format!("{:.0}", arrondi.abs());
    format!("{}{}{}€", signe, grouper_milliers(&entier), ESPACE_INSECABLE)
}

/// Format an amount with cents, e.g. `1 234,56 €`
pub fn format_euro_centimes(montant: f64) -> String {
    let arrondi = arrondi_centimes(montant);
    let signe = if arrondi < 0.0 { "-" } else { "" };
    let texte = format!("{:.2}", arrondi.abs());
    let (entier, decimales) = texte.split_once('.').unwrap_or((texte.as_str(), "00"));
    format!(
        "{}{},{}{}€",
        signe,
        grouper_milliers(entier),
        decimales,
        ESPACE_INSECABLE
    )
}

/// Format a decimal rate as a percentage, e.g. `0.0632` → `6,32 %`
pub fn format_pct(valeur: f64) -> String {
    format_pct_direct(valeur * 100.0)
}

/// Format a value already expressed in percent, e.g. `6.32` → `6,32 %`
pub fn format_pct_direct(valeur: f64) -> String {
    format!("{:.2}", valeur).replace('.', ",") + " %"
}

/// Format a range of rates, e.g. `(0.07, 0.08)` → `7 à 8 %`
pub fn format_fourchette_pct(min: f64, max: f64) -> String {
    format!(
        "{} à {} %",
        arrondi_euro(min * 100.0),
        arrondi_euro(max * 100.0)
    )
}

/// Short monthly display used on the result cards
pub fn format_montant_mensuel(montant: f64) -> String {
    if montant > 0.0 {
        format!("{}€ / mois", arrondi_euro(montant))
    } else {
        "Non éligible".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrondi_half_up() {
        assert_eq!(arrondi_euro(2754.6), 2755.0);
        assert_eq!(arrondi_euro(2.5), 3.0);
        assert_eq!(arrondi_euro(-2.5), -2.0);
        assert!((arrondi_centimes(398.375) - 398.38).abs() < 1e-9);
    }

    #[test]
    fn test_format_euro() {
        assert_eq!(format_euro(16434.4), "16\u{202f}434\u{a0}€");
        assert_eq!(format_euro(800.0), "800\u{a0}€");
        assert_eq!(format_euro(1_234_567.0), "1\u{202f}234\u{202f}567\u{a0}€");
        assert_eq!(format_euro_centimes(1234.5), "1\u{202f}234,50\u{a0}€");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(0.0632), "6,32 %");
        assert_eq!(format_pct_direct(5.8), "5,80 %");
        assert_eq!(format_fourchette_pct(0.07, 0.08), "7 à 8 %");
    }

    #[test]
    fn test_format_montant_mensuel() {
        assert_eq!(format_montant_mensuel(646.52), "647€ / mois");
        assert_eq!(format_montant_mensuel(0.0), "Non éligible");
    }
}
