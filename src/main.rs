// ============================================================================
// Cryptofolio - Dashboard des cours des cryptos dans le terminal
// ============================================================================
// Classement CoinGecko paginé, watchlist persistée, conversion USD/RUB/UZS
// et vue détail avec graphique par Timeframe.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère résultats, rendering, événements
// 3. Async dans sync : un worker thread possède le runtime tokio
// 4. Channels : commandes vers le worker, résultats vers l'UI
// ============================================================================

use std::io;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use cryptofolio::api::{CoinGeckoClient, ExchangeRateClient, FetchError};
use cryptofolio::app::{App, DetailRequest, PageRequest};
use cryptofolio::config::{Args, Config};
use cryptofolio::models::{CoinDetail, CoinSummary, PriceHistory, RateTable};
use cryptofolio::storage::{DynStore, FileStore, WatchlistStore};
use cryptofolio::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand / AppResult : protocole UI ↔ worker
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Taux de change USD → devises (une seule fois au démarrage)
    FetchRates,

    /// Page du classement par capitalisation
    FetchPage { request: PageRequest },

    /// Fiche + historique d'une crypto, en parallèle
    FetchDetail { request: DetailRequest },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    RatesLoaded(Result<RateTable, FetchError>),

    PageLoaded {
        request: PageRequest,
        result: Result<Vec<CoinSummary>, FetchError>,
    },

    DetailLoaded {
        request: DetailRequest,
        detail: Result<CoinDetail, FetchError>,
        history: Result<PriceHistory, FetchError>,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne.
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// ```bash
/// tail -f logs/cryptofolio.log.*
/// RUST_LOG=cryptofolio=trace cargo run
/// ```
fn init_logging(config: &Config) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = config.log_dir.clone();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "cryptofolio.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour cryptofolio, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cryptofolio=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::from_args(Args::parse());

    // Si init échoue, on affiche l'erreur et continue quand même
    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(?config, "Cryptofolio starting up");

    // Clients HTTP construits avant le TUI : une erreur ici s'affiche
    // normalement dans le terminal
    let coingecko = CoinGeckoClient::new(&config.coingecko_url, config.timeout)
        .context("Failed to build CoinGecko client")?;
    let rates = ExchangeRateClient::new(&config.rates_url, config.timeout)
        .context("Failed to build exchange rate client")?;

    let storage: DynStore = Box::new(FileStore::new(&config.storage_path));
    info!(path = ?config.storage_path, "Using watchlist storage");
    let mut app = App::new(WatchlistStore::load(storage));
    app.set_currency(config.initial_currency);

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx, coingecko, rates)?;

    // Chargements initiaux : taux, page, et éventuellement la vue détail
    send_command(&command_tx, AppCommand::FetchRates);
    let request = if app.handle_page_change(config.initial_page) {
        app.page_request()
    } else {
        app.begin_page_load()
    };
    send_command(&command_tx, AppCommand::FetchPage { request });
    if let Some(coin_id) = &config.initial_coin {
        let request = app.open_detail(coin_id);
        send_command(&command_tx, AppCommand::FetchDetail { request });
    }

    debug!("Setting up terminal");
    let mut terminal = setup_terminal().context("Failed to set up terminal")?;

    let events = EventHandler::default();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

fn send_command(command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    if let Err(e) = command_tx.send(command) {
        error!(command = ?e.0, "Worker thread is gone, command dropped");
    }
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Thread + async runtime
// - std::thread : thread OS qui possède le runtime tokio
// - Chaque commande devient une tâche tokio : un fetch de détail lent ne
//   bloque pas le fetch d'une page
// - Pas d'annulation : les résultats périmés sont écartés par App
// ============================================================================

fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    coingecko: CoinGeckoClient,
    rates: ExchangeRateClient,
) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    std::thread::Builder::new()
        .name("fetch-worker".to_string())
        .spawn(move || {
            // recv() bloque ce thread (pas l'UI) ; Err = channel fermé
            while let Ok(command) = command_rx.recv() {
                debug!(?command, "Worker received command");

                let coingecko = coingecko.clone();
                let rates = rates.clone();
                let result_tx = result_tx.clone();

                runtime.spawn(async move {
                    let result = match command {
                        AppCommand::FetchRates => AppResult::RatesLoaded(rates.fetch_rates().await),
                        AppCommand::FetchPage { request } => AppResult::PageLoaded {
                            request,
                            result: coingecko.fetch_coins_page(request.page).await,
                        },
                        AppCommand::FetchDetail { request } => {
                            let (detail, history) = coingecko
                                .fetch_detail_and_history(&request.coin_id, request.timeframe)
                                .await;
                            AppResult::DetailLoaded {
                                request,
                                detail,
                                history,
                            }
                        }
                    };

                    if result_tx.send(result).is_err() {
                        debug!("UI loop is gone, result dropped");
                    }
                });
            }

            info!("Worker thread exiting (channel closed)");
        })
        .context("Failed to spawn worker thread")?;

    Ok(())
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Appliquer les résultats du worker
//   1. Dessiner l'interface
//   2. Traiter l'événement clavier (ou le tick)
//   3. Mettre à jour l'état (rotation du bandeau)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
) -> Result<()> {
    while app.is_running() {
        // try_recv() ne bloque pas : on vide tout ce qui est arrivé
        loop {
            match result_rx.try_recv() {
                Ok(result) => apply_result(app, result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    warn!("Worker thread disconnected");
                    break;
                }
            }
        }

        terminal.draw(|frame| render(frame, app))?;

        match events.next() {
            Ok(event) => handle_event(app, event, command_tx),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }

        app.tick();
    }

    Ok(())
}

/// Applique un résultat du worker à l'état
fn apply_result(app: &mut App, result: AppResult) {
    match result {
        AppResult::RatesLoaded(result) => app.apply_rates(result),
        AppResult::PageLoaded { request, result } => {
            app.apply_page_result(request, result);
        }
        AppResult::DetailLoaded {
            request,
            detail,
            history,
        } => {
            app.apply_detail_result(&request, detail, history);
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================
// Navigation contextuelle selon l'écran : mode input, panneau de
// watchlist, vue détail, puis liste.
// ============================================================================

fn handle_event(app: &mut App, event: cryptofolio::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use cryptofolio::ui::events::{
        get_char_from_event, is_backspace_event, is_clear_search_event, is_delete_event,
        is_down_event, is_enter_event, is_escape_event, is_next_currency_event,
        is_next_page_event, is_next_timeframe_event, is_previous_currency_event,
        is_previous_page_event, is_previous_timeframe_event, is_quit_event,
        is_search_char_event, is_search_event, is_toggle_watch_event, is_up_event,
        is_watchlist_event, timeframe_from_event, Event,
    };

    if let Event::Tick = event {
        return;
    }

    // ========================================
    // Input Mode : saisie de la recherche
    // ========================================
    if app.is_in_input_mode() {
        if is_escape_event(&event) {
            app.cancel_input();
        } else if is_enter_event(&event) {
            let query = app.submit_input();
            info!(%query, "Search filter applied");
        } else if is_backspace_event(&event) {
            app.backspace();
        } else if is_search_char_event(&event) {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }
        return;
    }

    // Two-step quit, valable sur tous les écrans
    if is_quit_event(&event) {
        app.cancel_delete();
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            app.request_quit();
        }
        return;
    }
    app.cancel_quit();

    // Devise : sans re-fetch, sur tous les écrans
    if is_next_currency_event(&event) {
        app.next_currency();
        return;
    }
    if is_previous_currency_event(&event) {
        app.previous_currency();
        return;
    }

    // ========================================
    // Vue détail
    // ========================================
    if app.is_on_detail() {
        let request = if let Some(timeframe) = timeframe_from_event(&event) {
            app.select_timeframe(timeframe)
        } else if is_next_timeframe_event(&event) {
            app.next_timeframe()
        } else if is_previous_timeframe_event(&event) {
            app.previous_timeframe()
        } else {
            if is_escape_event(&event) {
                debug!("User returned to coin list");
                app.close_detail();
            }
            None
        };

        if let Some(request) = request {
            send_command(command_tx, AppCommand::FetchDetail { request });
        }
        return;
    }

    // ========================================
    // Panneau de watchlist
    // ========================================
    if app.watchlist_open {
        if is_delete_event(&event) {
            // Two-step delete : première pression → confirmation
            if app.is_awaiting_delete_confirmation() {
                app.delete_selected_watched();
            } else if app.selected_watched().is_some() {
                app.request_delete();
            }
            return;
        }

        app.cancel_delete();
        if is_escape_event(&event) || is_watchlist_event(&event) {
            app.close_watchlist_panel();
        } else if is_up_event(&event) {
            app.watchlist_navigate_up();
        } else if is_down_event(&event) {
            app.watchlist_navigate_down();
        }
        return;
    }

    // ========================================
    // Liste des cryptos
    // ========================================
    if is_up_event(&event) {
        app.navigate_up();
    } else if is_down_event(&event) {
        app.navigate_down();
    } else if is_next_page_event(&event) {
        if app.next_page() {
            send_command(command_tx, AppCommand::FetchPage { request: app.page_request() });
        }
    } else if is_previous_page_event(&event) {
        if app.previous_page() {
            send_command(command_tx, AppCommand::FetchPage { request: app.page_request() });
        }
    } else if is_enter_event(&event) {
        if let Some(request) = app.open_selected() {
            info!(coin = %request.coin_id, "User opened coin detail");
            send_command(command_tx, AppCommand::FetchDetail { request });
        }
    } else if is_toggle_watch_event(&event) {
        app.toggle_watch_selected();
    } else if is_watchlist_event(&event) {
        app.toggle_watchlist_panel();
    } else if is_search_event(&event) {
        app.start_search();
    } else if is_clear_search_event(&event) || is_escape_event(&event) {
        app.clear_search();
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
