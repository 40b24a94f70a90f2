use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use tui::backend::CrosstermBackend;
use tui::layout::{Alignment, Constraint, Direction, Layout};
use tui::style::{Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{CycleError, Result};
use crate::state::{CycleState, StateReader, MAX_REPEAT};

/// the bar is `[`, one cell per repeat, `]`
pub const PROGRESS_WIDTH: usize = MAX_REPEAT as usize + 2;
const PROGRESS_FILLED: char = '=';
const PROGRESS_EMPTY: char = '-';

/// everything that ends up on screen for one state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub title: &'static str,
    pub identifier: String,
    pub progress: String,
}

impl Frame {
    pub fn new(title: &'static str, catalog: &Catalog, state: CycleState) -> Frame {
        Frame {
            title,
            identifier: catalog.get(state.current_index()).to_string(),
            progress: progress_bar(state.repeat_count()),
        }
    }
}

/// e.g. "[==-]" for two repeats out of three
pub fn progress_bar(repeat_count: u8) -> String {
    let filled = repeat_count.min(MAX_REPEAT) as usize;
    let mut cells = [PROGRESS_EMPTY; PROGRESS_WIDTH];
    cells[0] = '[';
    cells[PROGRESS_WIDTH - 1] = ']';
    for cell in &mut cells[1..=filled] {
        *cell = PROGRESS_FILLED;
    }
    cells.iter().collect()
}

/// Display is used by the render worker to put a frame on the screen. It
/// should abstract the implementation details, so a variety of kinds of
/// screen would work.
pub trait Display {
    fn draw(&mut self, frame: &Frame) -> io::Result<()>;
}

// raw mode + alternate screen for as long as this lives
struct RawScreen;

impl RawScreen {
    fn enter() -> io::Result<RawScreen> {
        terminal::enable_raw_mode()?;
        // NB. from here on Drop tidies up, even if the next step fails
        let screen = RawScreen;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        Ok(screen)
    }
}

impl Drop for RawScreen {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// full-screen display in a terminal, rendered using TUI and crossterm
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    // declared last so the terminal is dropped before we leave raw mode
    _screen: RawScreen,
}

impl TermDisplay {
    pub fn new() -> io::Result<TermDisplay> {
        let screen = RawScreen::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(TermDisplay {
            terminal,
            _screen: screen,
        })
    }
}

impl Display for TermDisplay {
    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        self.terminal.draw(|f| {
            let area = f.size();
            // title at the top, identifier in the middle, bar at the bottom
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(1),
                        Constraint::Percentage(50),
                        Constraint::Length(1),
                        Constraint::Percentage(50),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(area);

            let title = Paragraph::new(Spans::from(Span::styled(
                frame.title,
                Style::default().add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center);
            let identifier =
                Paragraph::new(frame.identifier.as_str()).alignment(Alignment::Center);
            let progress = Paragraph::new(frame.progress.as_str()).alignment(Alignment::Center);

            f.render_widget(Block::default().borders(Borders::ALL), area);
            f.render_widget(title, rows[0]);
            f.render_widget(identifier, rows[2]);
            f.render_widget(progress, rows[4]);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; keeps every frame it's given.
/// clones share the same record
#[derive(Clone, Default)]
pub struct DummyDisplay {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        self.frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(frame.clone());
        Ok(())
    }
}

enum RenderRequest {
    Redraw,
    Shutdown,
}

/// asks the render worker for a new frame. requests made while one is
/// already pending are folded into it
#[derive(Clone)]
pub struct RedrawHandle {
    tx: Sender<RenderRequest>,
}

impl RedrawHandle {
    pub fn request(&self) {
        // full means a redraw is already queued, which will pick up this
        // change too
        let _ = self.tx.try_send(RenderRequest::Redraw);
    }
}

/// how the render worker got on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_drawn: u64,
    /// frames given up because the state lock stayed busy
    pub frames_skipped: u64,
}

/// owns the display and draws on its own thread whenever asked
pub struct RenderWorker {
    tx: Sender<RenderRequest>,
    handle: Option<JoinHandle<RenderStats>>,
}

impl RenderWorker {
    pub fn start<D>(
        display: D,
        state: StateReader,
        catalog: Catalog,
        config: &Config,
    ) -> Result<RenderWorker>
    where
        D: Display + Send + 'static,
    {
        // NB. room for exactly one pending request; that's what coalesces them
        let (tx, rx) = bounded(1);
        let title = config.title;
        let lock_timeout = config.render_lock_timeout;
        let handle = thread::Builder::new()
            .name("cycle-render".into())
            .spawn(move || render_loop(display, rx, state, catalog, title, lock_timeout))
            .map_err(|e| CycleError::startup("renderer", e))?;
        Ok(RenderWorker {
            tx,
            handle: Some(handle),
        })
    }

    pub fn handle(&self) -> RedrawHandle {
        RedrawHandle {
            tx: self.tx.clone(),
        }
    }

    /// finish any pending frame, then stop the thread and drop the display
    /// (which restores the terminal, for a TermDisplay)
    pub fn shutdown(mut self) -> RenderStats {
        self.finish()
    }

    fn finish(&mut self) -> RenderStats {
        let Some(handle) = self.handle.take() else {
            return RenderStats::default();
        };
        // blocks until any pending redraw has been taken; fails only if the
        // thread is already gone
        let _ = self.tx.send(RenderRequest::Shutdown);
        match handle.join() {
            Ok(stats) => stats,
            Err(_) => {
                tracing::error!("render worker panicked");
                RenderStats::default()
            }
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn render_loop<D: Display>(
    mut display: D,
    requests: Receiver<RenderRequest>,
    state: StateReader,
    catalog: Catalog,
    title: &'static str,
    lock_timeout: Duration,
) -> RenderStats {
    let mut stats = RenderStats::default();
    for request in requests.iter() {
        match request {
            RenderRequest::Redraw => {
                // copy out and let go of the lock before touching the screen
                let snapshot = match state.lock_for(lock_timeout) {
                    Some(snapshot) => snapshot,
                    None => {
                        stats.frames_skipped += 1;
                        tracing::trace!("state busy, frame skipped");
                        continue;
                    }
                };
                let frame = Frame::new(title, &catalog, snapshot);
                match display.draw(&frame) {
                    Ok(()) => stats.frames_drawn += 1,
                    Err(e) => tracing::error!(error = %e, "drawing frame failed"),
                }
            }
            RenderRequest::Shutdown => break,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_CATALOG;
    use crate::state::SharedState;

    #[test]
    fn test_progress_bar_width() {
        for n in 0..=MAX_REPEAT {
            assert_eq!(progress_bar(n).chars().count(), PROGRESS_WIDTH);
        }
    }

    #[test]
    fn test_progress_bar_contents() {
        assert_eq!(progress_bar(0), "[---]");
        assert_eq!(progress_bar(1), "[=--]");
        assert_eq!(progress_bar(2), "[==-]");
        assert_eq!(progress_bar(3), "[===]");
    }

    #[test]
    fn test_progress_bar_clamps() {
        assert_eq!(progress_bar(200), "[===]");
    }

    #[test]
    fn test_frame_for_last_identifier() {
        let f = Frame::new("t", &DEFAULT_CATALOG, CycleState::at(11, 2));
        assert_eq!(f.identifier, "12:34:56:78:9A");
        assert_eq!(f.progress, "[==-]");
        assert_eq!(f.title, "t");
    }

    #[test]
    fn test_worker_draws_current_state() -> crate::Result<()> {
        let display = DummyDisplay::new();
        let state = SharedState::new();
        for _ in 0..=MAX_REPEAT {
            state.lock().tick(&DEFAULT_CATALOG);
        }
        let worker = RenderWorker::start(
            display.clone(),
            state.reader(),
            DEFAULT_CATALOG,
            &Config::default(),
        )?;
        worker.handle().request();
        let stats = worker.shutdown();
        assert_eq!(stats.frames_drawn, 1);
        assert_eq!(stats.frames_skipped, 0);
        let frames = display.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].identifier, "FF:FF:FF:FF:FF");
        assert_eq!(frames[0].progress, "[---]");
        Ok(())
    }

    #[test]
    fn test_worker_skips_frame_while_state_is_held() -> crate::Result<()> {
        let display = DummyDisplay::new();
        let state = SharedState::new();
        let config = Config {
            render_lock_timeout: Duration::from_millis(5),
            ..Config::default()
        };
        let worker = RenderWorker::start(display.clone(), state.reader(), DEFAULT_CATALOG, &config)?;
        let stats = {
            let _held = state.lock();
            worker.handle().request();
            // let the worker time out on the held lock before shutting down
            thread::sleep(Duration::from_millis(50));
            worker.shutdown()
        };
        assert_eq!(stats.frames_skipped, 1);
        assert_eq!(stats.frames_drawn, 0);
        assert!(display.frames().is_empty());
        // state untouched by the missed frame
        assert_eq!(state.snapshot(), CycleState::new());
        Ok(())
    }

    #[test]
    fn test_redraw_requests_coalesce() -> crate::Result<()> {
        let display = DummyDisplay::new();
        let state = SharedState::new();
        let worker = RenderWorker::start(
            display.clone(),
            state.reader(),
            DEFAULT_CATALOG,
            &Config::default(),
        )?;
        let redraw = worker.handle();
        {
            // hold the state so the first redraw is stuck waiting on it
            let _held = state.lock();
            for _ in 0..10 {
                redraw.request();
            }
        }
        let stats = worker.shutdown();
        assert!(stats.frames_drawn + stats.frames_skipped <= 2);
        Ok(())
    }

    #[test]
    fn test_dropping_worker_joins_and_releases_display() -> crate::Result<()> {
        let display = DummyDisplay::new();
        let state = SharedState::new();
        let worker = RenderWorker::start(
            display.clone(),
            state.reader(),
            DEFAULT_CATALOG,
            &Config::default(),
        )?;
        worker.handle().request();
        assert_eq!(Arc::strong_count(&display.frames), 2);

        drop(worker);

        // the thread has been joined and took its display down with it
        assert_eq!(Arc::strong_count(&display.frames), 1);
        // the pending redraw was still served before it went
        assert_eq!(display.frames().len(), 1);
        Ok(())
    }

    #[test]
    #[ignore]
    // NB. needs a real terminal to draw into
    fn test_term_display_draws() -> io::Result<()> {
        let mut d = TermDisplay::new()?;
        d.draw(&Frame::new("t", &DEFAULT_CATALOG, CycleState::new()))
    }
}
