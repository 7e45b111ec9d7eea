// ============================================================================
// Slider - Bandeau des cryptos en vedette
// ============================================================================
// Jusqu'à 4 cartes côte à côte, à partir de app.slider_index. L'index tourne
// dans App::tick_at, ce module ne fait que dessiner.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, SLIDER_WIDTH};
use crate::models::{format_change, CoinSummary};
use crate::ui::dashboard::change_color;

/// Dessine le bandeau
pub fn render_slider(frame: &mut Frame, app: &App, area: Rect) {
    let featured = app.featured_coins();

    if featured.is_empty() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Featured ");
        frame.render_widget(block, area);
        return;
    }

    // Toujours SLIDER_WIDTH colonnes pour que les cartes gardent leur taille
    let constraints = vec![Constraint::Ratio(1, SLIDER_WIDTH as u32); SLIDER_WIDTH];
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (coin, card) in featured.iter().zip(cards.iter()) {
        render_card(frame, app, coin, *card);
    }
}

fn render_card(frame: &mut Frame, app: &App, coin: &CoinSummary, area: Rect) {
    let color = change_color(coin);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", coin.display_symbol()));

    let text = vec![
        Line::from(Span::styled(
            coin.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(app.display_price(coin.current_price)),
        Line::from(Span::styled(
            format_change(coin.price_change_percentage_24h),
            Style::default().fg(color),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
