use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::{debug, info, warn};

use crate::model::{generate_flights, Flight, ListRow};
use crate::storage::MatchMode;
use crate::worker::{StoreMessage, StoreRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Search,
    Flights,
    Help,
}

/// What the main list shows, derived from the search text alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Searching,
    BrowsingFavorites,
}

impl DisplayMode {
    pub fn for_query(query: &str) -> Self {
        if query.is_empty() {
            DisplayMode::BrowsingFavorites
        } else {
            DisplayMode::Searching
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Searching => "SEARCH",
            DisplayMode::BrowsingFavorites => "FAVORITES",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Default,
    Amber,
    Monochrome,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            ThemeMode::Default => ThemeMode::Amber,
            ThemeMode::Amber => ThemeMode::Monochrome,
            ThemeMode::Monochrome => ThemeMode::Default,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Default => "DEFAULT",
            ThemeMode::Amber => "AMBER",
            ThemeMode::Monochrome => "MONO",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "amber" => ThemeMode::Amber,
            "mono" | "monochrome" => ThemeMode::Monochrome,
            _ => ThemeMode::Default,
        }
    }
}

/// Hands out increasing generations for list requests; only the newest one
/// may update the display.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

pub struct FlightsDialog {
    pub airport: ListRow,
    pub flights: Vec<Flight>,
    pub saved: Vec<bool>,
    pub state: ListState,
}

impl FlightsDialog {
    fn new(airport: ListRow) -> Self {
        let flights = generate_flights(&airport.code);
        let saved = vec![false; flights.len()];
        let mut state = ListState::default();
        state.select(Some(0));
        Self {
            airport,
            flights,
            saved,
            state,
        }
    }
}

pub struct Status {
    pub message: String,
    pub at: DateTime<Local>,
    pub is_error: bool,
}

pub struct App {
    pub query: String,
    pub rows: Vec<ListRow>,
    pub list_state: ListState,
    pub input_mode: InputMode,
    pub theme_mode: ThemeMode,
    pub match_mode: MatchMode,
    pub flights: Option<FlightsDialog>,
    requests: RequestTracker,
    loading: bool,
    status: Option<Status>,
    list_area: Option<Rect>,
    dialog_area: Option<Rect>,
}

impl App {
    pub fn new(theme_mode: ThemeMode, match_mode: MatchMode) -> Self {
        Self {
            query: String::new(),
            rows: Vec::new(),
            list_state: ListState::default(),
            input_mode: InputMode::Search,
            theme_mode,
            match_mode,
            flights: None,
            requests: RequestTracker::default(),
            loading: false,
            status: None,
            list_area: None,
            dialog_area: None,
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        DisplayMode::for_query(&self.query)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Issues the list request for the current text under a fresh generation.
    pub fn refresh(&mut self) -> StoreRequest {
        let generation = self.requests.next();
        self.loading = true;
        match self.display_mode() {
            DisplayMode::Searching => {
                debug!("search issued generation={generation} len={}", self.query.len());
                StoreRequest::Search {
                    generation,
                    query: self.query.clone(),
                }
            }
            DisplayMode::BrowsingFavorites => {
                debug!("favorites issued generation={generation}");
                StoreRequest::Favorites { generation }
            }
        }
    }

    pub fn push_char(&mut self, ch: char) -> StoreRequest {
        self.query.push(ch);
        self.refresh()
    }

    pub fn backspace(&mut self) -> Option<StoreRequest> {
        self.query.pop()?;
        Some(self.refresh())
    }

    pub fn clear_query(&mut self) -> Option<StoreRequest> {
        if self.query.is_empty() {
            return None;
        }
        self.query.clear();
        Some(self.refresh())
    }

    /// Applies a worker reply. Returns a follow-up request when the reply
    /// invalidates what is on screen.
    pub fn apply_message(&mut self, message: StoreMessage) -> Option<StoreRequest> {
        match message {
            StoreMessage::Rows { generation, rows } => {
                if !self.requests.is_current(generation) {
                    debug!(
                        "discarding stale rows generation={generation} latest={}",
                        self.requests.latest()
                    );
                    return None;
                }
                self.loading = false;
                self.rows = rows;
                self.list_state.select(None);
                self.clamp_selection();
                None
            }
            StoreMessage::Error {
                generation,
                message,
            } => {
                if let Some(generation) = generation {
                    if !self.requests.is_current(generation) {
                        return None;
                    }
                    self.loading = false;
                }
                warn!("store error ignored: {message}");
                self.set_status(message, true);
                None
            }
            StoreMessage::FavoriteAdded {
                origin,
                destination,
            } => {
                self.set_status(format!("Saved {origin} → {destination}"), false);
                None
            }
            StoreMessage::FavoritesCleared(removed) => {
                self.set_status(format!("Cleared {removed} favorites"), false);
                if self.display_mode() == DisplayMode::BrowsingFavorites {
                    Some(self.refresh())
                } else {
                    None
                }
            }
        }
    }

    pub fn set_status(&mut self, message: String, is_error: bool) {
        self.status = Some(Status {
            message,
            at: Local::now(),
            is_error,
        });
    }

    pub fn clear_favorites(&mut self) -> StoreRequest {
        info!("clear favorites requested");
        StoreRequest::ClearFavorites
    }

    pub fn next_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let idx = self.list_state.selected().unwrap_or(0);
        let next = if idx + 1 >= self.rows.len() { 0 } else { idx + 1 };
        self.list_state.select(Some(next));
    }

    pub fn previous_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let idx = self.list_state.selected().unwrap_or(0);
        let prev = if idx == 0 { self.rows.len() - 1 } else { idx - 1 };
        self.list_state.select(Some(prev));
    }

    pub fn select_row(&mut self, row: usize) {
        if self.rows.is_empty() {
            self.list_state.select(None);
            return;
        }
        self.list_state
            .select(Some(row.min(self.rows.len().saturating_sub(1))));
    }

    fn clamp_selection(&mut self) {
        if self.rows.is_empty() {
            self.list_state.select(None);
        } else if let Some(selected) = self.list_state.selected() {
            if selected >= self.rows.len() {
                self.list_state.select(Some(self.rows.len() - 1));
            }
        } else {
            self.list_state.select(Some(0));
        }
    }

    pub fn selected_row(&self) -> Option<&ListRow> {
        self.list_state.selected().and_then(|i| self.rows.get(i))
    }

    /// Opens the generated flights for the selected row.
    pub fn open_selected(&mut self) -> bool {
        let Some(row) = self.selected_row().cloned() else {
            return false;
        };
        debug!("flights opened for {}", row.code);
        self.flights = Some(FlightsDialog::new(row));
        self.input_mode = InputMode::Flights;
        true
    }

    /// Closes the flight list. Favorites may have changed meanwhile, so the
    /// favorites view is reloaded.
    pub fn close_flights(&mut self) -> Option<StoreRequest> {
        self.flights = None;
        self.dialog_area = None;
        self.input_mode = InputMode::Search;
        if self.display_mode() == DisplayMode::BrowsingFavorites {
            Some(self.refresh())
        } else {
            None
        }
    }

    pub fn next_flight(&mut self) {
        if let Some(dialog) = self.flights.as_mut() {
            let len = dialog.flights.len();
            if len == 0 {
                return;
            }
            let idx = dialog.state.selected().unwrap_or(0);
            dialog.state.select(Some((idx + 1) % len));
        }
    }

    pub fn previous_flight(&mut self) {
        if let Some(dialog) = self.flights.as_mut() {
            let len = dialog.flights.len();
            if len == 0 {
                return;
            }
            let idx = dialog.state.selected().unwrap_or(0);
            dialog
                .state
                .select(Some(if idx == 0 { len - 1 } else { idx - 1 }));
        }
    }

    /// Highlights the selected flight and asks the store to save it.
    pub fn select_flight(&mut self) -> Option<StoreRequest> {
        let dialog = self.flights.as_mut()?;
        let idx = dialog.state.selected()?;
        let flight = dialog.flights.get(idx)?;
        dialog.saved[idx] = true;
        info!("flight selected: {}", flight.label());
        Some(StoreRequest::AddFavorite {
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
        })
    }

    pub fn open_help(&mut self) {
        if self.input_mode == InputMode::Search {
            self.input_mode = InputMode::Help;
        }
    }

    pub fn close_help(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn toggle_theme(&mut self) {
        self.theme_mode = self.theme_mode.toggle();
        debug!("theme {}", self.theme_mode.label());
    }

    pub fn set_list_area(&mut self, area: Rect) {
        self.list_area = Some(area);
    }

    pub fn set_dialog_area(&mut self, area: Rect) {
        self.dialog_area = Some(area);
    }

    pub fn list_row_at(&self, y: u16) -> Option<usize> {
        let row = bordered_row_at(self.list_area?, y)? + self.list_state.offset();
        (row < self.rows.len()).then_some(row)
    }

    pub fn dialog_row_at(&self, y: u16) -> Option<usize> {
        let dialog = self.flights.as_ref()?;
        let row = bordered_row_at(self.dialog_area?, y)? + dialog.state.offset();
        (row < dialog.flights.len()).then_some(row)
    }

    pub fn select_flight_row(&mut self, row: usize) {
        if let Some(dialog) = self.flights.as_mut() {
            if row < dialog.flights.len() {
                dialog.state.select(Some(row));
            }
        }
    }
}

fn bordered_row_at(area: Rect, y: u16) -> Option<usize> {
    if area.height < 3 {
        return None;
    }
    let top = area.y + 1;
    let bottom = area.y + area.height.saturating_sub(1);
    if y < top || y >= bottom {
        return None;
    }
    Some((y - top) as usize)
}

#[cfg(test)]
mod tests {
    use super::{App, DisplayMode, InputMode, RequestTracker, ThemeMode};
    use crate::model::ListRow;
    use crate::storage::MatchMode;
    use crate::worker::{StoreMessage, StoreRequest};
    use ratatui::layout::Rect;

    fn app() -> App {
        App::new(ThemeMode::Default, MatchMode::IgnoreCase)
    }

    fn row(name: &str, code: &str) -> ListRow {
        ListRow {
            name: name.to_string(),
            code: code.to_string(),
        }
    }

    fn generation_of(request: &StoreRequest) -> u64 {
        match request {
            StoreRequest::Search { generation, .. } | StoreRequest::Favorites { generation } => {
                *generation
            }
            other => panic!("not a list request: {other:?}"),
        }
    }

    #[test]
    fn tracker_only_accepts_latest() {
        let mut tracker = RequestTracker::default();
        let first = tracker.next();
        let second = tracker.next();
        assert!(second > first);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[test]
    fn typing_switches_between_modes() {
        let mut app = app();
        assert_eq!(app.display_mode(), DisplayMode::BrowsingFavorites);
        let req = app.push_char('J');
        assert!(matches!(req, StoreRequest::Search { ref query, .. } if query == "J"));
        assert_eq!(app.display_mode(), DisplayMode::Searching);
        let req = app.backspace().unwrap();
        assert!(matches!(req, StoreRequest::Favorites { .. }));
        assert_eq!(app.display_mode(), DisplayMode::BrowsingFavorites);
        assert!(app.backspace().is_none());
        assert!(app.clear_query().is_none());
    }

    #[test]
    fn stale_rows_are_discarded() {
        let mut app = app();
        let first = generation_of(&app.push_char('J'));
        let second = generation_of(&app.push_char('F'));

        app.apply_message(StoreMessage::Rows {
            generation: first,
            rows: vec![row("stale", "OLD")],
        });
        assert!(app.rows.is_empty());
        assert!(app.is_loading());

        app.apply_message(StoreMessage::Rows {
            generation: second,
            rows: vec![row("John F. Kennedy International Airport", "JFK")],
        });
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.rows[0].code, "JFK");
        assert!(!app.is_loading());

        app.apply_message(StoreMessage::Rows {
            generation: first,
            rows: vec![row("stale", "OLD")],
        });
        assert_eq!(app.rows[0].code, "JFK");
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn current_error_leaves_rows_untouched() {
        let mut app = app();
        let generation = generation_of(&app.refresh());
        app.apply_message(StoreMessage::Rows {
            generation,
            rows: vec![row("JFK", "DEST1")],
        });
        let generation = generation_of(&app.refresh());
        app.apply_message(StoreMessage::Error {
            generation: Some(generation),
            message: "database query failed".to_string(),
        });
        assert_eq!(app.rows, vec![row("JFK", "DEST1")]);
        let status = app.status().unwrap();
        assert!(status.is_error);
        assert!(!app.is_loading());
    }

    #[test]
    fn flight_dialog_saves_selected_flight() {
        let mut app = app();
        let generation = generation_of(&app.push_char('j'));
        app.apply_message(StoreMessage::Rows {
            generation,
            rows: vec![row("John F. Kennedy International Airport", "JFK")],
        });
        assert!(app.open_selected());
        assert_eq!(app.input_mode, InputMode::Flights);
        let dialog = app.flights.as_ref().unwrap();
        assert_eq!(dialog.flights.len(), 5);
        assert_eq!(dialog.flights[4].name, "Vuelo 5");

        app.next_flight();
        let req = app.select_flight().unwrap();
        assert_eq!(
            req,
            StoreRequest::AddFavorite {
                origin: "JFK".to_string(),
                destination: "DEST2".to_string(),
            }
        );
        let dialog = app.flights.as_ref().unwrap();
        assert_eq!(dialog.saved, vec![false, true, false, false, false]);
        assert_eq!(app.input_mode, InputMode::Flights);

        assert!(app.close_flights().is_none());
        assert!(app.flights.is_none());
        assert_eq!(app.input_mode, InputMode::Search);
    }

    #[test]
    fn closing_dialog_reloads_favorites() {
        let mut app = app();
        let generation = generation_of(&app.refresh());
        app.apply_message(StoreMessage::Rows {
            generation,
            rows: vec![row("JFK", "DEST1")],
        });
        assert!(app.open_selected());
        assert_eq!(app.flights.as_ref().unwrap().flights[0].origin, "DEST1");
        let req = app.close_flights().unwrap();
        assert!(generation_of(&req) > generation);
    }

    #[test]
    fn cleared_favorites_refresh_favorites_view() {
        let mut app = app();
        assert!(matches!(
            app.apply_message(StoreMessage::FavoritesCleared(3)),
            Some(StoreRequest::Favorites { .. })
        ));
        app.push_char('x');
        assert!(app.apply_message(StoreMessage::FavoritesCleared(0)).is_none());
    }

    #[test]
    fn row_navigation_wraps() {
        let mut app = app();
        let generation = generation_of(&app.refresh());
        app.apply_message(StoreMessage::Rows {
            generation,
            rows: vec![row("a", "A"), row("b", "B"), row("c", "C")],
        });
        app.previous_row();
        assert_eq!(app.list_state.selected(), Some(2));
        app.next_row();
        assert_eq!(app.list_state.selected(), Some(0));
        app.select_row(10);
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn mouse_rows_map_inside_border() {
        let mut app = app();
        let generation = generation_of(&app.refresh());
        app.apply_message(StoreMessage::Rows {
            generation,
            rows: vec![row("a", "A"), row("b", "B")],
        });
        app.set_list_area(Rect::new(0, 3, 40, 10));
        assert_eq!(app.list_row_at(3), None);
        assert_eq!(app.list_row_at(4), Some(0));
        assert_eq!(app.list_row_at(5), Some(1));
        assert_eq!(app.list_row_at(6), None);
    }

    #[test]
    fn theme_parses_and_cycles() {
        assert_eq!(ThemeMode::from_str("amber"), ThemeMode::Amber);
        assert_eq!(ThemeMode::from_str("MONO"), ThemeMode::Monochrome);
        assert_eq!(ThemeMode::from_str("other"), ThemeMode::Default);
        assert_eq!(ThemeMode::Monochrome.toggle(), ThemeMode::Default);
    }
}
