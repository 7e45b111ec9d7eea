// ============================================================================
// Panneau de watchlist
// ============================================================================
// Liste des cryptos surveillées à droite du tableau. Les prix sont ceux du
// moment de l'ajout, convertis dans la devise courante.
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::format_change;
use crate::ui::dashboard::change_color;

/// Dessine le panneau de watchlist
pub fn render_watchlist_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" ★ Watchlist ");

    if app.watchlist.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No coins in watchlist",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .watchlist
        .coins()
        .iter()
        .map(|coin| {
            let line = Line::from(vec![
                Span::styled(
                    format!("{:<6}", coin.display_symbol()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{:<14} ", coin.name)),
                Span::raw(format!("{:>16} ", app.display_price(coin.current_price))),
                Span::styled(
                    format_change(coin.price_change_percentage_24h),
                    Style::default().fg(change_color(coin)),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default().with_selected(Some(app.watchlist_index));
    frame.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoinSummary, Currency, RateTable};
    use crate::storage::{MemoryStore, WatchlistStore};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal
            .draw(|frame| render_watchlist_panel(frame, app, frame.size()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        App::new(WatchlistStore::load(Box::new(MemoryStore::new())))
    }

    #[test]
    fn test_empty_watchlist_message() {
        assert!(draw(&app()).contains("No coins in watchlist"));
    }

    #[test]
    fn test_watched_coin_price_is_converted() {
        let mut app = app();
        let mut ada = CoinSummary::new("cardano", "Cardano", "ada");
        ada.current_price = 2.0;
        ada.price_change_percentage_24h = Some(3.25);
        assert!(app.toggle_watch(&ada));

        let mut rates = RateTable::new();
        rates.insert("RUB", 90.0);
        app.apply_rates(Ok(rates));
        app.set_currency(Currency::Rub);

        let text = draw(&app);
        assert!(!text.contains("No coins in watchlist"));
        assert!(text.contains("ADA"));
        assert!(text.contains("Cardano"));
        assert!(text.contains("RUB 180.00"));
        assert!(text.contains("+3.25%"));
    }
}
