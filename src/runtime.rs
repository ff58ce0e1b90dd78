use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::app::App;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Focus(bool),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, focus, resize)
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                // key release events would double every keystroke on some terminals
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
                Ok(CtEvent::FocusGained) => AppEvent::Focus(true),
                Ok(CtEvent::FocusLost) => AppEvent::Focus(false),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Event source fed from a channel; drives the app headless.
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }

    /// Feeds events to `app` until it asks to quit.
    ///
    /// `draw` runs once up front, after every non-tick event, and on the
    /// tick where a text request resolves.
    pub fn run<D, Err>(&self, app: &mut App, mut draw: D) -> Result<(), Err>
    where
        D: FnMut(&App) -> Result<(), Err>,
    {
        draw(app)?;

        while !app.should_quit {
            let event = self.step();
            let was_loading = app.is_loading();
            let redraw = !matches!(event, AppEvent::Tick);

            app.handle_event(event);

            if redraw || was_loading != app.is_loading() {
                draw(app)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = ChannelEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            AppEvent::Tick => {}
            other => panic!("expected Tick on timeout, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Focus(false)).unwrap();
        tx.send(AppEvent::Resize).unwrap();
        let es = ChannelEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        assert!(matches!(runner.step(), AppEvent::Focus(false)));
        assert!(matches!(runner.step(), AppEvent::Resize));
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn run_draws_after_input_and_stops_on_quit() {
        let (tx, rx) = mpsc::channel();
        tx.send(key(KeyCode::Char('a'))).unwrap();
        tx.send(key(KeyCode::Char('x'))).unwrap();
        tx.send(key(KeyCode::Esc)).unwrap();

        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let mut app = App::with_prompt("abc", Difficulty::Easy);
        let mut frames = Vec::new();

        runner
            .run(&mut app, |app| {
                frames.push(app.session.typed_text());
                Ok::<(), std::io::Error>(())
            })
            .unwrap();

        assert!(app.should_quit);
        assert_eq!(frames, vec!["", "a", "ax", "ax"]);
    }

    #[test]
    fn run_skips_idle_ticks() {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let mut app = App::with_prompt("abc", Difficulty::Easy);
        let mut draws = 0;

        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            let _ = tx.send(key(KeyCode::Esc));
        });

        runner
            .run(&mut app, |_| {
                draws += 1;
                Ok::<(), std::io::Error>(())
            })
            .unwrap();

        // initial frame plus the quit key, none for the ticks in between
        assert_eq!(draws, 2);
    }

    #[test]
    fn run_stops_on_draw_error() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let mut app = App::with_prompt("abc", Difficulty::Easy);

        let result = runner.run(&mut app, |_| Err("terminal gone"));
        assert_eq!(result, Err("terminal gone"));
    }

    #[test]
    fn step_ticks_after_sender_hangs_up() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        drop(tx);
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        assert!(matches!(runner.step(), AppEvent::Tick));
    }
}
