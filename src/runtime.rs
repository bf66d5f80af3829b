use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::debug;

use crate::session::Generation;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
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
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(%err, "terminal event reader stopped");
                    break;
                }
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

impl EventSource for CrosstermEventSource {
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

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
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
}

/// Interval timer polled from the main loop. It carries the session generation it
/// was armed under so that its firings can be told apart from a newer session's.
#[derive(Clone, Copy, Debug)]
pub struct PeriodicTimer {
    interval: Duration,
    next_due: Instant,
    token: Generation,
}

impl PeriodicTimer {
    pub fn armed(interval: Duration, now: Instant, token: Generation) -> Self {
        Self {
            interval,
            next_due: now + interval,
            token,
        }
    }

    pub fn token(&self) -> Generation {
        self.token
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fires at most once per call; missed intervals are skipped rather than replayed
    pub fn poll(&mut self, now: Instant) -> Option<Generation> {
        if now < self.next_due {
            return None;
        }
        while self.next_due <= now {
            self.next_due += self.interval;
        }
        Some(self.token)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerFired {
    Playback(Generation),
    Clock(Generation),
}

/// The two timers a session runs: playback sampling and the elapsed-time clock
#[derive(Clone, Copy, Debug)]
pub struct SessionTimers {
    playback: PeriodicTimer,
    clock: PeriodicTimer,
}

impl SessionTimers {
    pub fn arm(
        playback_interval: Duration,
        clock_interval: Duration,
        now: Instant,
        token: Generation,
    ) -> Self {
        Self {
            playback: PeriodicTimer::armed(playback_interval, now, token),
            clock: PeriodicTimer::armed(clock_interval, now, token),
        }
    }

    /// Re-arm both timers for a new session generation
    pub fn rearm(&mut self, now: Instant, token: Generation) {
        *self = Self::arm(self.playback.interval, self.clock.interval, now, token);
    }

    pub fn token(&self) -> Generation {
        self.clock.token
    }

    /// Shortest wait until either timer is due
    pub fn until_next(&self, now: Instant) -> Duration {
        self.playback
            .next_due
            .min(self.clock.next_due)
            .saturating_duration_since(now)
    }

    pub fn due(&mut self, now: Instant) -> Vec<TimerFired> {
        let mut fired = Vec::new();
        if let Some(token) = self.playback.poll(now) {
            fired.push(TimerFired::Playback(token));
        }
        if let Some(token) = self.clock.poll(now) {
            fired.push(TimerFired::Clock(token));
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            AppEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            AppEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn periodic_timer_fires_on_interval() {
        let t0 = Instant::now();
        let token = Generation::default().next();
        let mut timer = PeriodicTimer::armed(Duration::from_millis(500), t0, token);

        assert_eq!(timer.poll(t0), None);
        assert_eq!(timer.poll(t0 + Duration::from_millis(499)), None);
        assert_eq!(timer.poll(t0 + Duration::from_millis(500)), Some(token));
        assert_eq!(timer.poll(t0 + Duration::from_millis(600)), None);
        // a long stall fires once, not once per missed interval
        assert_eq!(timer.poll(t0 + Duration::from_millis(2600)), Some(token));
        assert_eq!(timer.poll(t0 + Duration::from_millis(2700)), None);
        assert_eq!(timer.poll(t0 + Duration::from_millis(3000)), Some(token));
    }

    #[test]
    fn session_timers_fire_independently() {
        let t0 = Instant::now();
        let mut timers = SessionTimers::arm(
            Duration::from_millis(500),
            Duration::from_millis(1000),
            t0,
            Generation::default(),
        );

        assert!(timers.due(t0 + Duration::from_millis(100)).is_empty());
        assert_eq!(
            timers.due(t0 + Duration::from_millis(500)),
            vec![TimerFired::Playback(Generation::default())]
        );
        assert_eq!(
            timers.due(t0 + Duration::from_millis(1000)),
            vec![
                TimerFired::Playback(Generation::default()),
                TimerFired::Clock(Generation::default())
            ]
        );
        assert_eq!(
            timers.until_next(t0 + Duration::from_millis(1200)),
            Duration::from_millis(300)
        );
    }

    #[test]
    fn rearm_switches_token() {
        let t0 = Instant::now();
        let old = Generation::default();
        let new = old.next();
        let mut timers =
            SessionTimers::arm(Duration::from_millis(500), Duration::from_secs(1), t0, old);

        timers.rearm(t0 + Duration::from_millis(400), new);
        assert_eq!(timers.token(), new);
        assert!(timers.due(t0 + Duration::from_millis(800)).is_empty());
        assert_eq!(
            timers.due(t0 + Duration::from_millis(900)),
            vec![TimerFired::Playback(new)]
        );
    }
}
