// ============================================================================
// Historique de prix : Timeframe, PricePoint, PriceHistory
// ============================================================================
// L'endpoint /coins/{id}/market_chart retourne `prices: [[ts_ms, prix], ...]`.
// Chaque série est liée à un Timeframe (24h, 30j, 3 mois, 1 an) qui fixe
// à la fois le paramètre `days` de la requête et le format des labels.
//
// CONCEPT : Remplacement complet
// - Une nouvelle série remplace toujours l'ancienne, jamais de fusion
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Période affichée sur le graphique de détail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    /// "24 Hours" → days=1
    #[default]
    TwentyFourHours,
    /// "30 Days" → days=30
    ThirtyDays,
    /// "3 Months" → days=90
    ThreeMonths,
    /// "1 Year" → days=365
    OneYear,
}

impl Timeframe {
    /// Nombre de jours demandés à l'API
    pub fn to_days(&self) -> u32 {
        match self {
            Timeframe::TwentyFourHours => 1,
            Timeframe::ThirtyDays => 30,
            Timeframe::ThreeMonths => 90,
            Timeframe::OneYear => 365,
        }
    }

    /// Label du bouton
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::TwentyFourHours => "24 Hours",
            Timeframe::ThirtyDays => "30 Days",
            Timeframe::ThreeMonths => "3 Months",
            Timeframe::OneYear => "1 Year",
        }
    }

    /// Retrouve un Timeframe depuis son label
    ///
    /// Un label inconnu donne le Timeframe par défaut (24 Hours, 1 jour).
    pub fn from_label(label: &str) -> Timeframe {
        Timeframe::all()
            .into_iter()
            .find(|tf| tf.label() == label)
            .unwrap_or_default()
    }

    /// Les quatre choix, dans l'ordre des boutons
    pub fn all() -> [Timeframe; 4] {
        [
            Timeframe::TwentyFourHours,
            Timeframe::ThirtyDays,
            Timeframe::ThreeMonths,
            Timeframe::OneYear,
        ]
    }

    /// Position (0..4) dans la rangée de boutons
    pub fn index(&self) -> usize {
        match self {
            Timeframe::TwentyFourHours => 0,
            Timeframe::ThirtyDays => 1,
            Timeframe::ThreeMonths => 2,
            Timeframe::OneYear => 3,
        }
    }

    /// Timeframe à la position donnée (touches 1 à 4)
    pub fn from_index(index: usize) -> Option<Timeframe> {
        Timeframe::all().get(index).copied()
    }

    pub fn next(&self) -> Timeframe {
        Timeframe::all()[(self.index() + 1) % 4]
    }

    pub fn previous(&self) -> Timeframe {
        Timeframe::all()[(self.index() + 3) % 4]
    }

    /// Format chrono des labels de l'axe X
    ///
    /// - 24 Hours : heure et minutes
    /// - 30 Days / 3 Months : mois abrégé et jour
    /// - 1 Year : mois abrégé et année
    pub fn label_format(&self) -> &'static str {
        match self {
            Timeframe::TwentyFourHours => "%H:%M",
            Timeframe::ThirtyDays | Timeframe::ThreeMonths => "%b %-d",
            Timeframe::OneYear => "%b %Y",
        }
    }
}

/// Un point (timestamp, prix) de la série
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Timestamp Unix en millisecondes (format CoinGecko)
    pub timestamp_ms: i64,
    /// Prix en USD
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp_ms: i64, price: f64) -> Self {
        Self {
            timestamp_ms,
            price,
        }
    }

    /// Date UTC du point (None si le timestamp est hors plage)
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }

    /// Label du point selon le Timeframe
    pub fn label(&self, timeframe: Timeframe) -> String {
        match self.datetime() {
            Some(dt) => dt.format(timeframe.label_format()).to_string(),
            None => String::new(),
        }
    }
}

/// Série de prix pour un Timeframe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub timeframe: Timeframe,
    /// Points triés par timestamp croissant (ordre de l'API)
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn new(timeframe: Timeframe, points: Vec<PricePoint>) -> Self {
        Self { timeframe, points }
    }

    /// Série vide (utilisée quand le fetch échoue)
    pub fn empty(timeframe: Timeframe) -> Self {
        Self::new(timeframe, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Labels de tous les points
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label(self.timeframe)).collect()
    }

    /// Points (x, y) pour le widget Chart : x = index, y = prix
    pub fn chart_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.price))
            .collect()
    }

    /// (min, max) des prix, None si la série est vide
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }

        Some(self.points.iter().fold((f64::MAX, f64::MIN), |(min, max), p| {
            (min.min(p.price), max.max(p.price))
        }))
    }

    /// Variation en % entre le premier et le dernier point
    pub fn change_percent(&self) -> Option<f64> {
        let first = self.points.first()?.price;
        let last = self.points.last()?.price;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_days() {
        assert_eq!(Timeframe::TwentyFourHours.to_days(), 1);
        assert_eq!(Timeframe::ThirtyDays.to_days(), 30);
        assert_eq!(Timeframe::ThreeMonths.to_days(), 90);
        assert_eq!(Timeframe::OneYear.to_days(), 365);
    }

    #[test]
    fn test_timeframe_label_round_trip() {
        for tf in Timeframe::all() {
            assert_eq!(Timeframe::from_label(tf.label()), tf);
        }
        assert_eq!(Timeframe::from_label("5 Years"), Timeframe::TwentyFourHours);
    }

    #[test]
    fn test_timeframe_cycle() {
        assert_eq!(Timeframe::OneYear.next(), Timeframe::TwentyFourHours);
        assert_eq!(Timeframe::TwentyFourHours.previous(), Timeframe::OneYear);
        assert_eq!(Timeframe::from_index(2), Some(Timeframe::ThreeMonths));
        assert_eq!(Timeframe::from_index(4), None);
    }

    #[test]
    fn test_point_labels_per_timeframe() {
        // 2024-03-05T14:07:00Z
        let point = PricePoint::new(1_709_647_620_000, 1.0);
        assert_eq!(point.label(Timeframe::TwentyFourHours), "14:07");
        assert_eq!(point.label(Timeframe::ThirtyDays), "Mar 5");
        assert_eq!(point.label(Timeframe::ThreeMonths), "Mar 5");
        assert_eq!(point.label(Timeframe::OneYear), "Mar 2024");
    }

    #[test]
    fn test_price_bounds_and_change() {
        let history = PriceHistory::new(
            Timeframe::ThirtyDays,
            vec![
                PricePoint::new(0, 100.0),
                PricePoint::new(1, 80.0),
                PricePoint::new(2, 120.0),
            ],
        );
        assert_eq!(history.price_bounds(), Some((80.0, 120.0)));
        assert_eq!(history.change_percent(), Some(20.0));
        assert_eq!(history.chart_points()[2], (2.0, 120.0));
        assert_eq!(PriceHistory::empty(Timeframe::OneYear).price_bounds(), None);
    }
}
