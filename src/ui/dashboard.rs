// ============================================================================
// Dashboard - Rendu de l'écran principal
// ============================================================================
// Dessine la liste des cryptos : header (devise, page), bandeau des cryptos
// en vedette, tableau du classement, panneau de watchlist et footer.
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Table + TableState : tableau avec ligne sélectionnée
// 4. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::api::{MAX_PAGE, PAGE_SIZE};
use crate::app::{App, ListState, Screen};
use crate::models::{format_change, CoinSummary, Currency};
use crate::ui::{chart, slider, watchlist_panel};

/// Couleur d'une variation sur 24h
pub(crate) fn change_color(coin: &CoinSummary) -> Color {
    match coin.price_change_percentage_24h {
        Some(_) if coin.is_up() => Color::Green,
        Some(_) => Color::Red,
        None => Color::Gray,
    }
}

/// Style des raccourcis dans les footers
pub(crate) fn key_style(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le compilateur garantit l'exhaustivité (tous les écrans gérés)
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::CoinList | Screen::InputMode => render_coin_list(frame, app),
        Screen::CoinDetail => chart::render_detail(frame, app, frame.size()),
    }
}

/// Dessine la liste des cryptos
fn render_coin_list(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    slider::render_slider(frame, app, chunks[1]);

    if app.watchlist_open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(chunks[2]);
        render_main_content(frame, app, columns[0]);
        watchlist_panel::render_watchlist_panel(frame, app, columns[1]);
    } else {
        render_main_content(frame, app, chunks[2]);
    }

    if app.is_in_input_mode() {
        render_input_footer(frame, app, chunks[3]);
    } else {
        render_footer(frame, app, chunks[3]);
    }
}

/// Header (3), bandeau (5), contenu, footer (3)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : devise et pagination
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Cryptofolio ")
        .title_alignment(Alignment::Center);

    let mut spans = vec![Span::raw("Currency: ")];
    for currency in Currency::all() {
        let style = if currency == app.currency {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", currency.code()), style));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::raw("   Page "));
    spans.push(Span::styled(
        format!("{}/{}", app.page, MAX_PAGE),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ));

    spans.push(Span::raw("   Watchlist "));
    spans.push(Span::styled(
        app.watchlist.len().to_string(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ));

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Main Content : tableau du classement
// ============================================================================

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.search_query.is_empty() {
        " Market ".to_string()
    } else {
        format!(" Market (filter: {}) ", app.search_query)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    match &app.list_state {
        ListState::Loading => {
            render_message(frame, area, block, "Loading coins...", Color::Gray);
            return;
        }
        ListState::Error(message) => {
            render_message(frame, area, block, message, Color::Red);
            return;
        }
        ListState::Ready => {}
    }

    let visible = app.visible_coins();
    if visible.is_empty() {
        render_message(frame, area, block, "No coins match", Color::Gray);
        return;
    }

    let header = Row::new(vec!["", "#", "Coin", "Price", "24h", "Market Cap"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = visible
        .iter()
        .map(|coin| {
            let marker = if app.is_watched(&coin.id) { "★" } else { " " };
            let rank = app
                .coins
                .iter()
                .position(|c| c.id == coin.id)
                .map(|i| ((app.page - 1) * PAGE_SIZE) as usize + i + 1)
                .unwrap_or(0);

            Row::new(vec![
                Cell::from(marker).style(Style::default().fg(Color::Yellow)),
                Cell::from(rank.to_string()),
                Cell::from(format!("{} ({})", coin.name, coin.display_symbol())),
                Cell::from(app.display_price(coin.current_price)),
                Cell::from(format_change(coin.price_change_percentage_24h))
                    .style(Style::default().fg(change_color(coin))),
                Cell::from(app.display_price(coin.market_cap)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(20),
        Constraint::Length(9),
        Constraint::Length(30),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD));

    let mut state = TableState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

/// Message centré dans un bloc (chargement, erreur, liste vide)
fn render_message(frame: &mut Frame, area: Rect, block: Block, message: &str, color: Color) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer : raccourcis et confirmations
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = if app.is_awaiting_delete_confirmation() {
        let name = app
            .selected_watched()
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        confirmation_line("[d]", &format!(" again to remove {}, any other key to cancel", name))
    } else if app.is_awaiting_quit_confirmation() {
        confirmation_line("[q]", " again to quit, any other key to cancel")
    } else if let Some(status) = &app.status_message {
        Line::from(Span::styled(status.clone(), Style::default().fg(Color::Red)))
    } else if app.watchlist_open {
        Line::from(vec![
            Span::styled("[↑↓]", key_style(Color::Yellow)),
            Span::raw(" Select  "),
            Span::styled("[d]", key_style(Color::Red)),
            Span::raw(" Remove  "),
            Span::styled("[w/ESC]", key_style(Color::Yellow)),
            Span::raw(" Close"),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key_style(Color::Yellow)),
            Span::raw(" Quit  "),
            Span::styled("[↑↓]", key_style(Color::Yellow)),
            Span::raw(" Select  "),
            Span::styled("[←→]", key_style(Color::Yellow)),
            Span::raw(" Page  "),
            Span::styled("[Enter]", key_style(Color::Yellow)),
            Span::raw(" Details  "),
            Span::styled("[Space]", key_style(Color::Green)),
            Span::raw(" Watch  "),
            Span::styled("[w]", key_style(Color::Green)),
            Span::raw(" Watchlist  "),
            Span::styled("[c]", key_style(Color::Cyan)),
            Span::raw(" Currency  "),
            Span::styled("[/]", key_style(Color::Cyan)),
            Span::raw(" Search"),
        ])
    };

    let paragraph = Paragraph::new(vec![line])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn confirmation_line(key: &str, message: &str) -> Line<'static> {
    let warning = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled("⚠  Press ", warning),
        Span::styled(
            key.to_string(),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::styled(format!("{} ⚠", message), warning),
    ])
}

// ============================================================================
// Input Mode : saisie de la recherche
// ============================================================================

/// Footer en mode input avec la ligne de saisie
///
/// CONCEPT : Modal input (Vim-like)
/// - ESC annule, Enter valide
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" [Enter] Confirm  [ESC] Cancel ");

    let input_line = Line::from(vec![
        Span::styled(
            app.input_prompt.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let paragraph = Paragraph::new(vec![input_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FetchError, FetchOperation};
    use crate::storage::{MemoryStore, WatchlistStore};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn buffer_text(buffer: &Buffer) -> String {
        buffer
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn app() -> App {
        App::new(WatchlistStore::load(Box::new(MemoryStore::new())))
    }

    #[test]
    fn test_renders_loading_state() {
        let text = draw(&app());
        assert!(text.contains("Loading coins..."));
        assert!(text.contains("Page 1/10"));
    }

    #[test]
    fn test_renders_error_message() {
        let mut app = app();
        let request = app.page_request();
        app.apply_page_result(
            request,
            Err(FetchError::Status {
                operation: FetchOperation::CoinsPage(1),
                status: 429,
            }),
        );
        assert!(draw(&app).contains("HTTP 429"));
    }

    #[test]
    fn test_renders_converted_prices() {
        let mut app = app();
        let mut btc = CoinSummary::new("bitcoin", "Bitcoin", "btc");
        btc.current_price = 64000.0;
        btc.price_change_percentage_24h = Some(1.5);
        let request = app.page_request();
        app.apply_page_result(request, Ok(vec![btc]));

        let text = draw(&app);
        assert!(text.contains("Bitcoin (BTC)"));
        assert!(text.contains("$64,000.00"));
        assert!(text.contains("+1.50%"));
    }

    #[test]
    fn test_market_cap_column_shows_full_amount() {
        let mut app = app();
        let mut btc = CoinSummary::new("bitcoin", "Bitcoin", "btc");
        btc.current_price = 64000.0;
        btc.market_cap = 1_260_000_000_000.0;
        let request = app.page_request();
        app.apply_page_result(request, Ok(vec![btc]));

        let text = draw(&app);
        assert!(text.contains("$1,260,000,000,000.00"));
    }
}
