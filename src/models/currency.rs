// ============================================================================
// Devises : conversion et formatage des prix
// ============================================================================
// Tous les prix arrivent de CoinGecko en USD. L'affichage les convertit
// dans la devise choisie avec la table de taux d'exchangerate-api.
//
// CONCEPTS RUST :
// 1. Fonctions pures : pas d'état, pas d'effet de bord
// 2. HashMap<String, f64> : table de taux indexée par code ISO
// 3. #[serde(transparent)] : le newtype se (dé)sérialise comme son champ
// ============================================================================

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Devises proposées par le sélecteur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    /// Dollar américain (devise de référence des APIs)
    #[default]
    Usd,
    /// Rouble russe
    Rub,
    /// Sum ouzbek
    Uzs,
}

impl Currency {
    /// Code ISO 4217 (clé de la table de taux)
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Rub => "RUB",
            Currency::Uzs => "UZS",
        }
    }

    /// Préfixe d'affichage en locale en-US
    ///
    /// Le rouble et le sum n'ont pas de symbole en en-US : on affiche le code
    /// suivi d'un espace, comme `Intl.NumberFormat`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Rub => "RUB ",
            Currency::Uzs => "UZS ",
        }
    }

    /// Toutes les devises, dans l'ordre du sélecteur
    pub fn all() -> [Currency; 3] {
        [Currency::Usd, Currency::Rub, Currency::Uzs]
    }

    /// Devise suivante (cycle USD → RUB → UZS → USD)
    pub fn next(&self) -> Currency {
        match self {
            Currency::Usd => Currency::Rub,
            Currency::Rub => Currency::Uzs,
            Currency::Uzs => Currency::Usd,
        }
    }

    /// Devise précédente (cycle inverse)
    pub fn previous(&self) -> Currency {
        match self {
            Currency::Usd => Currency::Uzs,
            Currency::Rub => Currency::Usd,
            Currency::Uzs => Currency::Rub,
        }
    }

    /// Retrouve une devise depuis son code (insensible à la casse)
    pub fn from_code(code: &str) -> Option<Currency> {
        Currency::all()
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Table de taux : code devise → multiplicateur par rapport à l'USD
///
/// Chargée une seule fois au démarrage. Une entrée absente signifie que la
/// conversion retombe sur le montant USD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute ou remplace un taux
    pub fn insert(&mut self, code: impl Into<String>, multiplier: f64) {
        self.rates.insert(code.into(), multiplier);
    }

    /// Taux pour une devise, s'il est connu
    pub fn rate(&self, currency: Currency) -> Option<f64> {
        self.rates.get(currency.code()).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Convertit un montant USD dans la devise cible
///
/// - USD : identité
/// - taux connu : `montant * taux`
/// - taux absent (échec du fetch, devise inconnue) : identité
pub fn convert(amount_usd: f64, target: Currency, rates: &RateTable) -> f64 {
    if target == Currency::Usd {
        return amount_usd;
    }

    match rates.rate(target) {
        Some(rate) => amount_usd * rate,
        None => amount_usd,
    }
}

/// Formate un montant avec exactement 2 décimales et séparateurs de milliers
///
/// Exemples : `$1,234.56`, `RUB 98,765.43`, `-$0.50`
pub fn format_price(amount: f64, currency: Currency) -> String {
    if !amount.is_finite() {
        return "N/A".to_string();
    }

    let grouped = group_thousands(&format!("{:.2}", amount.abs()));
    let negative = amount < 0.0 && grouped.chars().any(|c| c != '0' && c != '.' && c != ',');

    if negative {
        format!("-{}{}", currency.prefix(), grouped)
    } else {
        format!("{}{}", currency.prefix(), grouped)
    }
}

/// Formate la variation sur 24h (`+1.23%`, `-4.56%`, `N/A`)
pub fn format_change(percent: Option<f64>) -> String {
    match percent {
        Some(p) if p.is_finite() => format!("{:+.2}%", p),
        _ => "N/A".to_string(),
    }
}

/// Formate un montant en millions (`1,234.57 M`) pour la capitalisation
pub fn format_compact_millions(amount: f64, currency: Currency) -> String {
    format!("{} M", format_price(amount / 1_000_000.0, currency))
}

/// Insère des virgules tous les 3 chiffres dans la partie entière
///
/// Attend une chaîne positive déjà arrondie (`"1234567.89"`).
fn group_thousands(formatted: &str) -> String {
    let (integer, fraction) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted, None),
    };

    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match fraction {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
