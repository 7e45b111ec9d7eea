// ============================================================================
// Chart - Vue détail d'une crypto
// ============================================================================
// Fiche (rang, prix, capitalisation, description) + graphique ligne de
// l'historique des prix sur le Timeframe choisi.
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DetailView};
use crate::models::{format_compact_millions, format_price, CoinDetail, PriceHistory, Timeframe};
use crate::ui::dashboard::key_style;

/// Dessine la vue détail
pub fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let view = match &app.detail {
        Some(view) => view,
        None => {
            render_no_data(frame, area, "No coin selected");
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Fiche
            Constraint::Length(4), // Description
            Constraint::Length(3), // Timeframes
            Constraint::Min(0),    // Graphique
        ])
        .split(area)
        .to_vec();

    render_detail_header(frame, app, view, chunks[0]);
    render_description(frame, view, chunks[1]);
    render_timeframes(frame, view.request.timeframe, chunks[2]);
    render_history(frame, app, view, chunks[3]);
}

// ============================================================================
// Fiche
// ============================================================================

/// Prix dans la devise courante : valeur CoinGecko si disponible, sinon
/// conversion du prix USD
fn detail_price(app: &App, detail: &CoinDetail) -> Option<f64> {
    detail.current_price(app.currency).or_else(|| {
        detail
            .market_data
            .current_price
            .get("usd")
            .map(|usd| app.convert_price(*usd))
    })
}

fn detail_market_cap(app: &App, detail: &CoinDetail) -> Option<f64> {
    detail.market_cap(app.currency).or_else(|| {
        detail
            .market_data
            .market_cap
            .get("usd")
            .map(|usd| app.convert_price(*usd))
    })
}

fn render_detail_header(frame: &mut Frame, app: &App, view: &DetailView, area: Rect) {
    let title = match &view.detail {
        Some(detail) if !detail.name.is_empty() => format!(" 📈 {} ", detail.name),
        _ => format!(" 📈 {} ", view.request.coin_id),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let mut lines = Vec::new();

    match &view.detail {
        Some(detail) => {
            let rank = detail
                .market_cap_rank
                .map(|r| format!("#{}", r))
                .unwrap_or_else(|| "N/A".to_string());
            let price = detail_price(app, detail)
                .map(|p| format_price(p, app.currency))
                .unwrap_or_else(|| "N/A".to_string());
            let market_cap = detail_market_cap(app, detail)
                .map(|m| format_compact_millions(m, app.currency))
                .unwrap_or_else(|| "N/A".to_string());

            lines.push(Line::from(vec![
                Span::raw("Rank: "),
                Span::styled(rank, key_style(Color::Yellow)),
                Span::raw("   Price: "),
                Span::styled(price, key_style(Color::White)),
                Span::raw("   Market Cap: "),
                Span::styled(market_cap, key_style(Color::White)),
            ]));
        }
        None if view.is_loading() => lines.push(Line::from("Loading...")),
        None => lines.push(Line::from(Span::styled(
            "Coin details unavailable",
            Style::default().fg(Color::Gray),
        ))),
    }

    if let Some(notice) = &view.notice {
        lines.push(Line::from(Span::styled(
            format!("⚠ {}", notice),
            Style::default().fg(Color::Yellow),
        )));
    }

    lines.push(Line::from(vec![
        Span::styled("[1-4]", key_style(Color::Yellow)),
        Span::raw(" Timeframe  "),
        Span::styled("[h/l]", key_style(Color::Yellow)),
        Span::raw(" Previous/Next  "),
        Span::styled("[c]", key_style(Color::Cyan)),
        Span::raw(format!(" Currency ({})  ", app.currency.code())),
        Span::styled("[ESC]", key_style(Color::Yellow)),
        Span::raw(" Back"),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn render_description(frame: &mut Frame, view: &DetailView, area: Rect) {
    let text = view
        .detail
        .as_ref()
        .map(|d| d.short_description())
        .unwrap_or_default();

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::LEFT | Borders::RIGHT))
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

/// Boutons de Timeframe, l'actif en surbrillance
fn render_timeframes(frame: &mut Frame, active: Timeframe, area: Rect) {
    let mut spans = Vec::new();
    for (i, timeframe) in Timeframe::all().iter().enumerate() {
        let style = if *timeframe == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, timeframe.label()), style));
        spans.push(Span::raw("  "));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Graphique
// ============================================================================

/// Labels de l'axe X : premier, milieu et dernier point
fn x_labels(history: &PriceHistory) -> Vec<Span<'static>> {
    let labels = history.labels();
    match labels.len() {
        0 => Vec::new(),
        1 => vec![Span::raw(labels[0].clone())],
        n => vec![
            Span::raw(labels[0].clone()),
            Span::raw(labels[n / 2].clone()),
            Span::raw(labels[n - 1].clone()),
        ],
    }
}

fn render_history(frame: &mut Frame, app: &App, view: &DetailView, area: Rect) {
    if view.is_loading() {
        render_placeholder(frame, area, "Loading price history...", Color::Gray);
        return;
    }

    let history = &view.history;
    let (min_price, max_price) = match history.price_bounds() {
        Some(bounds) => bounds,
        None => {
            render_placeholder(frame, area, "No price history", Color::Gray);
            return;
        }
    };

    // La série est en USD : on convertit chaque point dans la devise courante
    let points: Vec<(f64, f64)> = history
        .chart_points()
        .into_iter()
        .map(|(x, y)| (x, app.convert_price(y)))
        .collect();

    let min_price = app.convert_price(min_price);
    let max_price = app.convert_price(max_price);
    let margin = ((max_price - min_price) * 0.05).max(max_price.abs() * 0.001);
    let y_min = (min_price - margin).max(0.0);
    let y_max = max_price + margin;

    let color = match history.change_percent() {
        Some(change) if change > 0.0 => Color::Green,
        Some(_) => Color::Red,
        None => Color::Gray,
    };

    let datasets = vec![Dataset::default()
        .name(format!("Price ({})", app.currency.code()))
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, (points.len().saturating_sub(1)).max(1) as f64])
        .labels(x_labels(history));

    let y_axis = Axis::default()
        .title(app.currency.code())
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format_price(y_min, app.currency)),
            Span::raw(format_price((y_min + y_max) / 2.0, app.currency)),
            Span::raw(format_price(y_max, app.currency)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", history.timeframe.label())),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

fn render_placeholder(frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
    ])
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Affiche un message quand il n'y a rien à afficher
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" ⚠ Error ");

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled("[ESC] Back", Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
