// ============================================================================
// Gestion des événements
// ============================================================================
// Lit les événements clavier et les convertit en actions de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching : reconnaître une touche avec matches!
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

use crate::models::Timeframe;

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (bandeau, résultats réseau)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// Sans événement avant `tick_rate`, retourne `Event::Tick`.
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Sur certains OS, on reçoit Press ET Release
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            _ => Ok(Event::Tick),
        }
    }
}

// ============================================================================
// Helpers : reconnaître une touche
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

/// 'q' (quitter, two-step)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    )
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    )
}

/// Page suivante : flèche droite ou 'n'
pub fn is_next_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Right | KeyCode::Char('n')))
}

/// Page précédente : flèche gauche ou 'p'
pub fn is_previous_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Left | KeyCode::Char('p')))
}

/// Espace : ajoute/retire la crypto sélectionnée de la watchlist
pub fn is_toggle_watch_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(' ')))
}

/// 'w' : ouvre/ferme le panneau de watchlist
pub fn is_watchlist_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('w') | KeyCode::Char('W')))
}

/// 'd' : retire la crypto surlignée du panneau (two-step)
pub fn is_delete_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('d') | KeyCode::Char('D')))
}

/// '/' ou 's' : mode recherche
pub fn is_search_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('/') | KeyCode::Char('s')))
}

/// 'x' : efface le filtre de recherche
pub fn is_clear_search_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('x')))
}

/// 'c' : devise suivante
pub fn is_next_currency_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('c')))
}

/// 'C' : devise précédente
pub fn is_previous_currency_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('C')))
}

/// 'l' : Timeframe suivant
pub fn is_next_timeframe_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('l') | KeyCode::Right))
}

/// 'h' : Timeframe précédent
pub fn is_previous_timeframe_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('h') | KeyCode::Left))
}

/// '1'..'4' : sélection directe d'un Timeframe
pub fn timeframe_from_event(event: &Event) -> Option<Timeframe> {
    match key_code(event)? {
        KeyCode::Char(c @ '1'..='4') => Timeframe::from_index(c as usize - '1' as usize),
        _ => None,
    }
}

/// Caractère imprimable (saisie de la recherche)
pub fn is_search_char_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(c)) if c.is_alphanumeric() || c == '-' || c == ' ')
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event)? {
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
