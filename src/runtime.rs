use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;
use tracing::{debug, warn};

use crate::app::{App, InputMode};
use crate::error::{StoreError, StoreResult};
use crate::ui;
use crate::worker::{StoreMessage, StoreRequest};

pub struct StoreChannels {
    pub req_tx: Sender<StoreRequest>,
    pub res_rx: Receiver<StoreMessage>,
}

impl StoreChannels {
    pub fn send(&self, request: StoreRequest) -> StoreResult<()> {
        self.req_tx
            .send(request)
            .map_err(|_| StoreError::WorkerGone)
    }

    fn dispatch(&self, app: &mut App, request: Option<StoreRequest>) {
        if let Some(request) = request {
            if let Err(err) = self.send(request) {
                warn!("request dropped: {err}");
                app.set_status(err.to_string(), true);
            }
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

pub fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    store: StoreChannels,
) -> Result<()> {
    let tick_rate = Duration::from_millis(50);
    let initial = app.refresh();
    store.dispatch(&mut app, Some(initial));

    loop {
        while let Ok(message) = store.res_rx.try_recv() {
            let follow_up = app.apply_message(message);
            store.dispatch(&mut app, follow_up);
        }

        terminal.draw(|f| ui::ui(f, &mut app))?;

        if event::poll(tick_rate)? {
            let flow = match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    handle_key(&mut app, &store, key)
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, &store, mouse);
                    Flow::Continue
                }
                _ => Flow::Continue,
            };
            if let Flow::Quit = flow {
                debug!("quit requested");
                return Ok(());
            }
        }
    }
}

fn handle_key(app: &mut App, store: &StoreChannels, key: KeyEvent) -> Flow {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }
    match app.input_mode {
        InputMode::Search => match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Down => app.next_row(),
            KeyCode::Up => app.previous_row(),
            KeyCode::Enter => {
                app.open_selected();
            }
            KeyCode::F(1) => app.open_help(),
            KeyCode::Backspace => {
                let request = app.backspace();
                store.dispatch(app, request);
            }
            KeyCode::Char(ch) if ctrl => match ch {
                'u' => {
                    let request = app.clear_query();
                    store.dispatch(app, request);
                }
                'x' => {
                    let request = app.clear_favorites();
                    store.dispatch(app, Some(request));
                }
                't' => app.toggle_theme(),
                _ => {}
            },
            KeyCode::Char(ch) => {
                let request = app.push_char(ch);
                store.dispatch(app, Some(request));
            }
            _ => {}
        },
        InputMode::Flights => match key.code {
            KeyCode::Esc => {
                let request = app.close_flights();
                store.dispatch(app, request);
            }
            KeyCode::Down => app.next_flight(),
            KeyCode::Up => app.previous_flight(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let request = app.select_flight();
                store.dispatch(app, request);
            }
            _ => {}
        },
        InputMode::Help => match key.code {
            KeyCode::Esc | KeyCode::F(1) => app.close_help(),
            _ => {}
        },
    }
    Flow::Continue
}

fn handle_mouse(app: &mut App, store: &StoreChannels, mouse: MouseEvent) {
    match app.input_mode {
        InputMode::Search => match mouse.kind {
            MouseEventKind::ScrollUp => app.previous_row(),
            MouseEventKind::ScrollDown => app.next_row(),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(row) = app.list_row_at(mouse.row) {
                    app.select_row(row);
                    app.open_selected();
                }
            }
            _ => {}
        },
        InputMode::Flights => match mouse.kind {
            MouseEventKind::ScrollUp => app.previous_flight(),
            MouseEventKind::ScrollDown => app.next_flight(),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(row) = app.dialog_row_at(mouse.row) {
                    app.select_flight_row(row);
                    let request = app.select_flight();
                    store.dispatch(app, request);
                }
            }
            _ => {}
        },
        InputMode::Help => {}
    }
}

#[cfg(test)]
mod tests {
    use super::{handle_key, Flow, StoreChannels};
    use crate::app::{App, InputMode, ThemeMode};
    use crate::storage::MatchMode;
    use crate::worker::StoreRequest;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_drive_requests() {
        let (req_tx, req_rx) = mpsc::channel();
        let (_res_tx, res_rx) = mpsc::channel();
        let store = StoreChannels { req_tx, res_rx };
        let mut app = App::new(ThemeMode::Default, MatchMode::IgnoreCase);

        handle_key(&mut app, &store, key(KeyCode::Char('s')));
        handle_key(&mut app, &store, key(KeyCode::Char('f')));
        handle_key(&mut app, &store, key(KeyCode::Backspace));
        let sent: Vec<StoreRequest> = req_rx.try_iter().collect();
        assert_eq!(sent.len(), 3);
        assert!(matches!(&sent[1], StoreRequest::Search { query, generation: 2 } if query == "sf"));
        assert!(matches!(&sent[2], StoreRequest::Search { query, generation: 3 } if query == "s"));

        handle_key(
            &mut app,
            &store,
            KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL),
        );
        assert_eq!(req_rx.try_recv().unwrap(), StoreRequest::ClearFavorites);

        handle_key(&mut app, &store, key(KeyCode::F(1)));
        assert_eq!(app.input_mode, InputMode::Help);
        handle_key(&mut app, &store, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Search);
        assert!(matches!(
            handle_key(&mut app, &store, key(KeyCode::Esc)),
            Flow::Quit
        ));
    }

    #[test]
    fn closed_worker_sets_error_status() {
        let (req_tx, req_rx) = mpsc::channel();
        let (_res_tx, res_rx) = mpsc::channel();
        drop(req_rx);
        let store = StoreChannels { req_tx, res_rx };
        let mut app = App::new(ThemeMode::Default, MatchMode::IgnoreCase);
        handle_key(&mut app, &store, key(KeyCode::Char('a')));
        let status = app.status().unwrap();
        assert!(status.is_error);
        assert_eq!(status.message, "store worker is not running");
    }
}
