// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Enums pour les machines à états (écran, chargement de la liste,
//    chargement du détail)
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les appels réseau sont faits ailleurs (worker) : App ne fait que
//   démarrer un chargement et appliquer son résultat
// ============================================================================

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::api::{FetchError, MAX_PAGE, MIN_PAGE};
use crate::models::{
    convert, format_price, CoinDetail, CoinSummary, Currency, PriceHistory, RateTable, Timeframe,
};
use crate::storage::{DynStore, WatchlistStore};

/// Période de rotation du bandeau des cryptos en vedette
pub const SLIDER_PERIOD: Duration = Duration::from_secs(3);

/// Nombre de cryptos visibles dans le bandeau
pub const SLIDER_WIDTH: usize = 4;

// ============================================================================
// Enums : machines à états
// ============================================================================

/// Écrans de l'application
///
/// CoinList et CoinDetail sont les deux "routes" de l'application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : tableau des cryptos (route racine)
    CoinList,

    /// Vue détail : fiche + graphique d'une crypto
    CoinDetail,

    /// Mode saisie : recherche dans la page courante
    /// CONCEPT : Modal input mode (Vim-like)
    /// - Capture les touches pour construire un buffer
    /// - Enter valide, ESC annule
    InputMode,
}

/// État du chargement de la page de cryptos
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Loading,
    /// Message d'erreur affiché jusqu'au prochain changement de page
    Error(String),
    Ready,
}

/// État du chargement de la vue détail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Ready,
}

/// Jeton de génération d'une requête de page
///
/// Même principe que `DetailRequest` : revenir sur une page déjà demandée
/// (1 → 2 → 1) donne un nouveau jeton, la première réponse est alors périmée.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub generation: u64,
}

/// Jeton de génération d'une requête de détail
///
/// Capturé au lancement du fetch ; le résultat n'est appliqué que si le
/// jeton est toujours le jeton courant. Un changement de crypto ou de
/// Timeframe (même identique) incrémente la génération.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub coin_id: String,
    pub timeframe: Timeframe,
    pub generation: u64,
}

/// Données de la vue détail
#[derive(Debug, Clone)]
pub struct DetailView {
    pub request: DetailRequest,
    pub state: DetailState,
    /// None tant que rien n'est chargé, ou si le fetch de la fiche a échoué
    pub detail: Option<CoinDetail>,
    /// Série courante (vide tant que rien n'est chargé ou en cas d'échec)
    pub history: PriceHistory,
    /// Avertissement non bloquant (fetch échoué)
    pub notice: Option<String>,
}

impl DetailView {
    fn loading(request: DetailRequest) -> Self {
        let timeframe = request.timeframe;
        Self {
            request,
            state: DetailState::Loading,
            detail: None,
            history: PriceHistory::empty(timeframe),
            notice: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == DetailState::Loading
    }
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Page courante du classement, toujours dans [MIN_PAGE, MAX_PAGE]
    pub page: u32,

    /// État du chargement de la page
    pub list_state: ListState,

    /// Cryptos de la page courante (remplacées en bloc à chaque chargement)
    pub coins: Vec<CoinSummary>,

    /// Index de la ligne sélectionnée parmi les cryptos visibles
    pub selected_index: usize,

    /// Filtre de recherche appliqué à la page courante
    pub search_query: String,

    /// Devise d'affichage
    pub currency: Currency,

    /// Taux de change (vide si le fetch a échoué)
    pub rates: RateTable,

    /// Watchlist persistée
    pub watchlist: WatchlistStore<DynStore>,

    /// Panneau de watchlist ouvert
    pub watchlist_open: bool,

    /// Index sélectionné dans le panneau de watchlist
    pub watchlist_index: usize,

    /// Vue détail (None quand on est sur la liste)
    pub detail: Option<DetailView>,

    /// Compteur de générations des requêtes de page
    page_generation: u64,

    /// Compteur de générations des requêtes de détail
    detail_generation: u64,

    /// Premier index du bandeau des cryptos en vedette
    pub slider_index: usize,

    /// Dernière rotation du bandeau
    slider_last_advance: Instant,

    /// Message d'état ponctuel (erreur de stockage, etc.)
    pub status_message: Option<String>,

    /// Two-step quit : première pression de 'q' → confirmation
    pub confirm_quit: bool,

    /// Two-step delete dans le panneau de watchlist
    pub confirm_delete: bool,

    /// Buffer de saisie pour le mode Input
    pub input_buffer: String,

    /// Prompt affiché en mode Input
    pub input_prompt: String,
}

impl App {
    /// Crée l'application avec une watchlist déjà chargée
    ///
    /// La liste démarre en `Loading` : le premier fetch de page est émis
    /// par la boucle principale.
    pub fn new(watchlist: WatchlistStore<DynStore>) -> Self {
        Self {
            running: true,
            current_screen: Screen::CoinList,
            page: MIN_PAGE,
            list_state: ListState::Loading,
            coins: Vec::new(),
            selected_index: 0,
            search_query: String::new(),
            currency: Currency::default(),
            rates: RateTable::new(),
            watchlist,
            watchlist_open: false,
            watchlist_index: 0,
            detail: None,
            page_generation: 0,
            detail_generation: 0,
            slider_index: 0,
            slider_last_advance: Instant::now(),
            status_message: None,
            confirm_quit: false,
            confirm_delete: false,
            input_buffer: String::new(),
            input_prompt: String::new(),
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Liste : pagination et chargement
    // ========================================================================

    /// Change de page
    ///
    /// Hors de [1, 10] : refusé, aucun état modifié, retourne false.
    /// Sinon : curseur mis à jour, passage en `Loading`, retourne true
    /// (l'appelant lance le fetch avec `page_request()`).
    pub fn handle_page_change(&mut self, new_page: u32) -> bool {
        if !(MIN_PAGE..=MAX_PAGE).contains(&new_page) {
            debug!(page = new_page, "Page change rejected (out of range)");
            return false;
        }

        info!(from = self.page, to = new_page, "Page change");
        self.page = new_page;
        self.begin_page_load();
        true
    }

    /// Page suivante (refusée sur la dernière page)
    pub fn next_page(&mut self) -> bool {
        self.handle_page_change(self.page.saturating_add(1))
    }

    /// Page précédente (refusée sur la première page)
    pub fn previous_page(&mut self) -> bool {
        self.handle_page_change(self.page.saturating_sub(1))
    }

    /// Entre en `Loading` pour la page courante avec un nouveau jeton
    pub fn begin_page_load(&mut self) -> PageRequest {
        self.page_generation += 1;
        self.list_state = ListState::Loading;
        self.page_request()
    }

    /// Jeton du chargement de page en cours
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            generation: self.page_generation,
        }
    }

    /// Applique le résultat du fetch d'une page
    ///
    /// Ignoré si le jeton n'est plus le jeton courant (autre page, ou même
    /// page redemandée depuis). Retourne true si le résultat a été appliqué.
    pub fn apply_page_result(
        &mut self,
        request: PageRequest,
        result: Result<Vec<CoinSummary>, FetchError>,
    ) -> bool {
        if request != self.page_request() {
            debug!(page = request.page, generation = request.generation, "Discarding stale page result");
            return false;
        }

        let page = request.page;

        match result {
            Ok(coins) => {
                info!(page, count = coins.len(), "Coins page loaded");
                self.coins = coins;
                self.list_state = ListState::Ready;
                self.selected_index = 0;
                self.slider_index = 0;
            }
            Err(e) => {
                error!(page, error = %e, "Failed to load coins page");
                self.list_state = ListState::Error(e.to_string());
            }
        }
        true
    }

    pub fn is_loading(&self) -> bool {
        self.list_state == ListState::Loading
    }

    /// Message d'erreur de la liste, s'il y en a un
    pub fn list_error(&self) -> Option<&str> {
        match &self.list_state {
            ListState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Applique le résultat du fetch des taux (appelé une seule fois)
    ///
    /// Un échec est journalisé et laisse la table vide : les conversions
    /// retombent alors sur le montant USD.
    pub fn apply_rates(&mut self, result: Result<RateTable, FetchError>) {
        match result {
            Ok(rates) => {
                info!(currencies = rates.len(), "Exchange rates loaded");
                self.rates = rates;
            }
            Err(e) => {
                warn!(error = %e, "Exchange rates unavailable, prices stay in USD");
            }
        }
    }

    // ========================================================================
    // Liste : sélection et recherche
    // ========================================================================

    /// Cryptos de la page qui passent le filtre de recherche
    pub fn visible_coins(&self) -> Vec<&CoinSummary> {
        self.coins
            .iter()
            .filter(|c| c.matches(&self.search_query))
            .collect()
    }

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.visible_coins().len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Crypto sélectionnée dans le tableau
    ///
    /// None tant que la page n'est pas `Ready` : les lignes de la page
    /// précédente ne sont plus affichées.
    pub fn selected_coin(&self) -> Option<&CoinSummary> {
        if self.list_state != ListState::Ready {
            return None;
        }
        self.visible_coins().get(self.selected_index).copied()
    }

    /// Entre en mode recherche
    pub fn start_search(&mut self) {
        self.start_input("Search: ".to_string());
        self.input_buffer = self.search_query.clone();
    }

    /// Efface le filtre de recherche
    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.selected_index = 0;
    }

    // ========================================================================
    // Devise
    // ========================================================================

    /// Change de devise (pas de re-fetch, seul l'affichage change)
    pub fn set_currency(&mut self, currency: Currency) {
        debug!(currency = %currency, "Currency changed");
        self.currency = currency;
    }

    pub fn next_currency(&mut self) {
        self.set_currency(self.currency.next());
    }

    pub fn previous_currency(&mut self) {
        self.set_currency(self.currency.previous());
    }

    /// Convertit un montant USD dans la devise courante
    pub fn convert_price(&self, amount_usd: f64) -> f64 {
        convert(amount_usd, self.currency, &self.rates)
    }

    /// Convertit puis formate un montant USD
    pub fn display_price(&self, amount_usd: f64) -> String {
        format_price(self.convert_price(amount_usd), self.currency)
    }

    // ========================================================================
    // Watchlist
    // ========================================================================

    pub fn is_watched(&self, coin_id: &str) -> bool {
        self.watchlist.is_watched(coin_id)
    }

    /// Ajoute/retire une crypto de la watchlist
    ///
    /// Une erreur d'écriture est journalisée et affichée, la watchlist reste
    /// inchangée. Retourne l'état "surveillé" après l'appel.
    pub fn toggle_watch(&mut self, coin: &CoinSummary) -> bool {
        match self.watchlist.toggle_watch(coin) {
            Ok(watched) => {
                info!(coin = %coin.id, watched, "Watchlist toggled");
                self.status_message = None;
                watched
            }
            Err(e) => {
                error!(coin = %coin.id, error = %e, "Failed to persist watchlist");
                self.status_message = Some(format!("Watchlist not saved: {}", e));
                self.watchlist.is_watched(&coin.id)
            }
        }
    }

    /// Ajoute/retire la crypto sélectionnée
    pub fn toggle_watch_selected(&mut self) -> Option<bool> {
        let coin = self.selected_coin()?.clone();
        Some(self.toggle_watch(&coin))
    }

    /// Retire une crypto de la watchlist (sans effet si absente)
    pub fn remove_from_watchlist(&mut self, coin_id: &str) {
        match self.watchlist.remove(coin_id) {
            Ok(()) => {
                info!(coin = %coin_id, "Removed from watchlist");
                self.status_message = None;
            }
            Err(e) => {
                error!(coin = %coin_id, error = %e, "Failed to persist watchlist");
                self.status_message = Some(format!("Watchlist not saved: {}", e));
            }
        }

        let max_index = self.watchlist.len().saturating_sub(1);
        self.watchlist_index = self.watchlist_index.min(max_index);
    }

    /// Ouvre/ferme le panneau de watchlist
    pub fn toggle_watchlist_panel(&mut self) {
        self.watchlist_open = !self.watchlist_open;
        self.watchlist_index = 0;
        self.confirm_delete = false;
    }

    pub fn close_watchlist_panel(&mut self) {
        self.watchlist_open = false;
        self.confirm_delete = false;
    }

    pub fn watchlist_navigate_up(&mut self) {
        self.watchlist_index = self.watchlist_index.saturating_sub(1);
    }

    pub fn watchlist_navigate_down(&mut self) {
        let max_index = self.watchlist.len().saturating_sub(1);
        self.watchlist_index = (self.watchlist_index + 1).min(max_index);
    }

    /// Crypto surlignée dans le panneau
    pub fn selected_watched(&self) -> Option<&CoinSummary> {
        self.watchlist.coins().get(self.watchlist_index)
    }

    /// Demande la confirmation de suppression (two-step delete)
    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn is_awaiting_delete_confirmation(&self) -> bool {
        self.confirm_delete
    }

    /// Supprime la crypto surlignée dans le panneau
    pub fn delete_selected_watched(&mut self) {
        if let Some(id) = self.selected_watched().map(|c| c.id.clone()) {
            self.remove_from_watchlist(&id);
        }
        self.confirm_delete = false;
    }

    // ========================================================================
    // Vue détail
    // ========================================================================

    /// Ouvre la vue détail d'une crypto (navigation + chargement)
    ///
    /// Retourne le jeton à passer au fetch.
    pub fn open_detail(&mut self, coin_id: &str) -> DetailRequest {
        let timeframe = Timeframe::default();
        self.current_screen = Screen::CoinDetail;
        self.start_detail_load(coin_id.to_string(), timeframe)
    }

    /// Ouvre la vue détail de la crypto sélectionnée
    pub fn open_selected(&mut self) -> Option<DetailRequest> {
        let coin_id = self.selected_coin()?.id.clone();
        Some(self.open_detail(&coin_id))
    }

    /// Sélectionne un Timeframe ; re-fetch même si c'est le Timeframe actif
    pub fn select_timeframe(&mut self, timeframe: Timeframe) -> Option<DetailRequest> {
        let coin_id = self.detail.as_ref()?.request.coin_id.clone();
        Some(self.start_detail_load(coin_id, timeframe))
    }

    pub fn next_timeframe(&mut self) -> Option<DetailRequest> {
        let next = self.current_timeframe()?.next();
        self.select_timeframe(next)
    }

    pub fn previous_timeframe(&mut self) -> Option<DetailRequest> {
        let previous = self.current_timeframe()?.previous();
        self.select_timeframe(previous)
    }

    /// Timeframe de la vue détail courante
    pub fn current_timeframe(&self) -> Option<Timeframe> {
        self.detail.as_ref().map(|d| d.request.timeframe)
    }

    fn start_detail_load(&mut self, coin_id: String, timeframe: Timeframe) -> DetailRequest {
        self.detail_generation += 1;
        let request = DetailRequest {
            coin_id,
            timeframe,
            generation: self.detail_generation,
        };

        info!(coin = %request.coin_id, timeframe = timeframe.label(), generation = request.generation, "Loading coin detail");

        // La fiche déjà chargée reste affichée pendant un changement de
        // Timeframe sur la même crypto
        let previous_detail = self
            .detail
            .take()
            .filter(|d| d.request.coin_id == request.coin_id)
            .and_then(|d| d.detail);

        let mut view = DetailView::loading(request.clone());
        view.detail = previous_detail;
        self.detail = Some(view);
        request
    }

    /// Applique le résultat du fetch fiche + historique
    ///
    /// Ignoré si le jeton n'est plus le jeton courant (réponse périmée).
    /// Un échec est journalisé puis la vue passe en `Ready` avec des données
    /// vides pour la partie en échec. Retourne true si appliqué.
    pub fn apply_detail_result(
        &mut self,
        request: &DetailRequest,
        detail: Result<CoinDetail, FetchError>,
        history: Result<PriceHistory, FetchError>,
    ) -> bool {
        let view = match self.detail.as_mut() {
            Some(view) if view.request == *request => view,
            _ => {
                debug!(coin = %request.coin_id, generation = request.generation, "Discarding stale detail result");
                return false;
            }
        };

        let mut failures = Vec::new();

        match detail {
            Ok(detail) => view.detail = Some(detail),
            Err(e) => {
                error!(coin = %request.coin_id, error = %e, "Failed to load coin detail");
                view.detail = None;
                failures.push("details");
            }
        }

        match history {
            Ok(history) => view.history = history,
            Err(e) => {
                error!(coin = %request.coin_id, error = %e, "Failed to load price history");
                view.history = PriceHistory::empty(request.timeframe);
                failures.push("price history");
            }
        }

        view.notice = if failures.is_empty() {
            None
        } else {
            Some(format!("Could not load {}", failures.join(" and ")))
        };
        view.state = DetailState::Ready;
        true
    }

    /// Retourne à la liste
    pub fn close_detail(&mut self) {
        self.detail = None;
        self.current_screen = Screen::CoinList;
    }

    pub fn is_on_list(&self) -> bool {
        self.current_screen == Screen::CoinList
    }

    pub fn is_on_detail(&self) -> bool {
        self.current_screen == Screen::CoinDetail
    }

    // ========================================================================
    // Bandeau des cryptos en vedette
    // ========================================================================

    /// Jusqu'à SLIDER_WIDTH cryptos à partir de slider_index (avec bouclage)
    pub fn featured_coins(&self) -> Vec<&CoinSummary> {
        if self.coins.is_empty() {
            return Vec::new();
        }

        let count = SLIDER_WIDTH.min(self.coins.len());
        (0..count)
            .map(|offset| &self.coins[(self.slider_index + offset) % self.coins.len()])
            .collect()
    }

    /// Tick : appelé à chaque itération de la boucle
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Fait tourner le bandeau toutes les SLIDER_PERIOD
    pub fn tick_at(&mut self, now: Instant) {
        if now.duration_since(self.slider_last_advance) < SLIDER_PERIOD {
            return;
        }

        self.slider_last_advance = now;
        if !self.coins.is_empty() {
            self.slider_index = (self.slider_index + 1) % self.coins.len();
        }
    }

    // ========================================================================
    // Two-step quit
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    /// Entre en mode input avec un prompt donné
    pub fn start_input(&mut self, prompt: String) {
        self.current_screen = Screen::InputMode;
        self.input_buffer.clear();
        self.input_prompt = prompt;
    }

    /// Annule le mode input et retourne à la liste
    pub fn cancel_input(&mut self) {
        self.current_screen = Screen::CoinList;
        self.input_buffer.clear();
        self.input_prompt.clear();
    }

    /// Valide la saisie : elle devient le filtre de recherche
    pub fn submit_input(&mut self) -> String {
        let value = self.input_buffer.trim().to_string();
        self.current_screen = Screen::CoinList;
        self.input_buffer.clear();
        self.input_prompt.clear();
        self.search_query = value.clone();
        self.selected_index = 0;
        value
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchOperation;
    use crate::models::PricePoint;
    use crate::storage::{KeyValueStore, MemoryStore, WATCHLIST_KEY};

    fn app() -> App {
        App::new(WatchlistStore::load(Box::new(MemoryStore::new())))
    }

    fn coin(id: &str, price: f64) -> CoinSummary {
        let mut coin = CoinSummary::new(id, id.to_uppercase(), &id[..3]);
        coin.current_price = price;
        coin.market_cap = price * 1000.0;
        coin
    }

    fn page_of_coins() -> Vec<CoinSummary> {
        [
            "bitcoin", "ethereum", "tether", "binancecoin", "solana", "ripple", "usdcoin",
            "cardano", "dogecoin", "tron",
        ]
        .iter()
        .enumerate()
        .map(|(i, id)| coin(id, 100.0 * (10 - i) as f64))
        .collect()
    }

    fn status_error(page: u32) -> FetchError {
        FetchError::Status {
            operation: FetchOperation::CoinsPage(page),
            status: 500,
        }
    }

    #[test]
    fn test_app_creation() {
        let app = app();
        assert!(app.is_running());
        assert!(app.is_on_list());
        assert_eq!(app.page, 1);
        assert!(app.is_loading());
    }

    #[test]
    fn test_page_change_in_range() {
        for p in MIN_PAGE..=MAX_PAGE {
            let mut app = app();
            app.list_state = ListState::Ready;
            assert!(app.handle_page_change(p));
            assert_eq!(app.page, p);
            assert!(app.is_loading());
        }
    }

    #[test]
    fn test_page_change_out_of_range_is_noop() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));

        for p in [0, 11, 42, u32::MAX] {
            assert!(!app.handle_page_change(p));
            assert_eq!(app.page, 1);
            assert_eq!(app.list_state, ListState::Ready);
        }
    }

    #[test]
    fn test_next_previous_page_bounds() {
        let mut app = app();
        assert!(!app.previous_page());
        assert_eq!(app.page, 1);

        app.handle_page_change(10);
        assert!(!app.next_page());
        assert_eq!(app.page, 10);
        assert!(app.previous_page());
        assert_eq!(app.page, 9);
    }

    #[test]
    fn test_page_result_replaces_coins() {
        let mut app = app();
        assert!(app.apply_page_result(app.page_request(), Ok(page_of_coins())));
        assert_eq!(app.coins.len(), 10);
        assert_eq!(app.list_state, ListState::Ready);

        app.handle_page_change(2);
        app.apply_page_result(app.page_request(), Ok(vec![coin("litecoin", 80.0)]));
        assert_eq!(app.coins.len(), 1);
        assert_eq!(app.coins[0].id, "litecoin");
    }

    #[test]
    fn test_page_error_then_retry() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Err(status_error(1)));
        assert!(!app.is_loading());
        assert!(app.list_error().unwrap().contains("HTTP 500"));

        // Le message reste jusqu'au prochain changement de page
        app.tick();
        assert!(app.list_error().is_some());

        app.handle_page_change(2);
        assert!(app.is_loading());
        assert!(app.list_error().is_none());
    }

    #[test]
    fn test_stale_page_result_is_discarded() {
        let mut app = app();
        app.handle_page_change(2);
        let page_two = app.page_request();
        app.handle_page_change(3);

        assert!(!app.apply_page_result(page_two, Ok(page_of_coins())));
        assert!(app.coins.is_empty());
        assert!(app.is_loading());

        assert!(app.apply_page_result(app.page_request(), Ok(vec![coin("bitcoin", 1.0)])));
        assert_eq!(app.coins.len(), 1);
    }

    #[test]
    fn test_superseded_request_for_same_page_is_discarded() {
        let mut app = app();
        let first = app.begin_page_load();
        app.handle_page_change(2);
        app.handle_page_change(1);
        let again = app.page_request();
        assert_eq!(first.page, again.page);
        assert_ne!(first, again);

        assert!(app.apply_page_result(again, Ok(page_of_coins())));
        assert!(!app.apply_page_result(first, Err(status_error(1))));
        assert_eq!(app.list_state, ListState::Ready);
        assert_eq!(app.coins.len(), 10);
    }

    #[test]
    fn test_hidden_rows_cannot_be_watched_or_opened() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));

        // Page 2 en cours de chargement : le tableau n'est plus affiché
        app.handle_page_change(2);
        assert!(app.selected_coin().is_none());
        assert_eq!(app.toggle_watch_selected(), None);
        assert!(app.open_selected().is_none());

        // Page 2 en erreur : toujours rien de sélectionnable
        app.apply_page_result(app.page_request(), Err(status_error(2)));
        assert!(app.list_error().is_some());
        assert_eq!(app.toggle_watch_selected(), None);
        assert!(app.open_selected().is_none());
        assert!(app.watchlist.is_empty());
        assert!(app.is_on_list());
    }

    #[test]
    fn test_toggle_bitcoin_scenario() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));

        assert_eq!(app.selected_coin().unwrap().id, "bitcoin");
        assert_eq!(app.toggle_watch_selected(), Some(true));
        assert_eq!(app.watchlist.len(), 1);
        assert_eq!(app.watchlist.coins()[0].id, "bitcoin");

        app.remove_from_watchlist("bitcoin");
        assert!(app.watchlist.is_empty());
        let persisted = app.watchlist.storage().get(WATCHLIST_KEY).unwrap();
        assert_eq!(persisted.as_deref(), Some("[]"));
    }

    #[test]
    fn test_currency_change_does_not_reload() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));
        let mut rates = RateTable::new();
        rates.insert("RUB", 90.0);
        app.apply_rates(Ok(rates));

        app.next_currency();
        assert_eq!(app.currency, Currency::Rub);
        assert_eq!(app.list_state, ListState::Ready);
        assert_eq!(app.convert_price(2.0), 180.0);
        assert_eq!(app.display_price(2.0), "RUB 180.00");
    }

    #[test]
    fn test_rates_failure_falls_back_to_usd() {
        let mut app = app();
        app.apply_rates(Err(FetchError::Status {
            operation: FetchOperation::ExchangeRates,
            status: 503,
        }));

        app.set_currency(Currency::Rub);
        assert_eq!(app.convert_price(64000.0), 64000.0);
    }

    #[test]
    fn test_search_filters_visible_coins() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));

        app.start_search();
        for c in "coin".chars() {
            app.append_char(c);
        }
        app.submit_input();

        let ids: Vec<&str> = app.visible_coins().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "binancecoin", "usdcoin", "dogecoin"]);
        assert!(app.is_on_list());

        app.clear_search();
        assert_eq!(app.visible_coins().len(), 10);
    }

    #[test]
    fn test_navigation_bounds() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));

        app.navigate_up();
        assert_eq!(app.selected_index, 0);
        for _ in 0..20 {
            app.navigate_down();
        }
        assert_eq!(app.selected_index, 9);
        assert_eq!(app.selected_coin().unwrap().id, "tron");
    }

    #[test]
    fn test_open_detail_and_apply() {
        let mut app = app();
        let request = app.open_detail("ethereum");
        assert!(app.is_on_detail());
        assert_eq!(request.timeframe, Timeframe::TwentyFourHours);
        assert!(app.detail.as_ref().unwrap().is_loading());

        let detail = CoinDetail {
            id: "ethereum".to_string(),
            name: "Ethereum".to_string(),
            ..CoinDetail::default()
        };
        let history = PriceHistory::new(request.timeframe, vec![PricePoint::new(0, 1.0)]);

        assert!(app.apply_detail_result(&request, Ok(detail), Ok(history)));
        let view = app.detail.as_ref().unwrap();
        assert_eq!(view.state, DetailState::Ready);
        assert_eq!(view.detail.as_ref().unwrap().name, "Ethereum");
        assert_eq!(view.history.len(), 1);
        assert!(view.notice.is_none());
    }

    #[test]
    fn test_stale_detail_result_is_discarded() {
        let mut app = app();
        let first = app.open_detail("bitcoin");
        let second = app.select_timeframe(Timeframe::OneYear).unwrap();
        assert_ne!(first, second);

        let late = PriceHistory::new(first.timeframe, vec![PricePoint::new(0, 1.0)]);
        assert!(!app.apply_detail_result(&first, Ok(CoinDetail::default()), Ok(late)));
        assert!(app.detail.as_ref().unwrap().is_loading());

        assert!(app.apply_detail_result(
            &second,
            Ok(CoinDetail::default()),
            Ok(PriceHistory::empty(Timeframe::OneYear))
        ));
        assert!(!app.detail.as_ref().unwrap().is_loading());
    }

    #[test]
    fn test_same_timeframe_refetches() {
        let mut app = app();
        let first = app.open_detail("bitcoin");
        let again = app.select_timeframe(Timeframe::TwentyFourHours).unwrap();

        assert_eq!(first.timeframe, again.timeframe);
        assert!(again.generation > first.generation);
    }

    #[test]
    fn test_detail_failure_goes_ready_with_defaults() {
        let mut app = app();
        let request = app.open_detail("bitcoin");

        let detail_err = FetchError::Status {
            operation: FetchOperation::CoinDetail("bitcoin".to_string()),
            status: 404,
        };
        let history_err = FetchError::Status {
            operation: FetchOperation::PriceHistory {
                coin_id: "bitcoin".to_string(),
                days: 1,
            },
            status: 404,
        };

        assert!(app.apply_detail_result(&request, Err(detail_err), Err(history_err)));
        let view = app.detail.as_ref().unwrap();
        assert_eq!(view.state, DetailState::Ready);
        assert!(view.detail.is_none());
        assert!(view.history.is_empty());
        assert!(view.notice.is_some());
    }

    #[test]
    fn test_timeframe_requires_detail() {
        let mut app = app();
        assert!(app.select_timeframe(Timeframe::OneYear).is_none());
        assert!(app.next_timeframe().is_none());
    }

    #[test]
    fn test_close_detail_returns_to_list() {
        let mut app = app();
        app.open_detail("bitcoin");
        app.close_detail();
        assert!(app.is_on_list());
        assert!(app.detail.is_none());
    }

    #[test]
    fn test_slider_rotation() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));
        let start = Instant::now();

        app.tick_at(start);
        let before = app.slider_index;
        app.tick_at(start + SLIDER_PERIOD * 2);
        assert_eq!(app.slider_index, (before + 1) % 10);

        let featured = app.featured_coins();
        assert_eq!(featured.len(), SLIDER_WIDTH);
        assert_eq!(featured[0].id, app.coins[app.slider_index].id);
    }

    #[test]
    fn test_featured_wraps_around() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));
        app.slider_index = 8;

        let ids: Vec<&str> = app.featured_coins().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["dogecoin", "tron", "bitcoin", "ethereum"]);
    }

    #[test]
    fn test_watchlist_panel_delete() {
        let mut app = app();
        app.apply_page_result(app.page_request(), Ok(page_of_coins()));
        app.toggle_watch_selected();
        app.navigate_down();
        app.toggle_watch_selected();

        app.toggle_watchlist_panel();
        app.watchlist_navigate_down();
        assert_eq!(app.selected_watched().unwrap().id, "ethereum");

        app.request_delete();
        app.delete_selected_watched();
        assert!(!app.is_awaiting_delete_confirmation());
        assert_eq!(app.watchlist.len(), 1);
        assert_eq!(app.watchlist_index, 0);
    }
}
