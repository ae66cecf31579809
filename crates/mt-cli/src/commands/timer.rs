//! Interactive timing display for `session start --interactive`.
//!
//! A ticker task redraws the elapsed time once a second while a blocking
//! thread waits for the quit key. Quitting flips a watch channel; the ticker
//! then stamps the end time and hands it back over a oneshot, so the end time
//! is taken exactly once and only after the key was read.

use std::io::{self, Write};
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::sync::{oneshot, watch};

use super::util::format_clock;

/// A key press, reduced to what the timer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Ctrl-C.
    Interrupt,
    Other,
}

/// Blocking source of key presses.
pub trait KeySource: Send + 'static {
    /// Blocks until the next key press.
    fn next_key(&mut self) -> io::Result<Key>;
}

/// Reads keys from the terminal in raw mode. Raw mode ends on drop.
pub struct TerminalKeys;

impl TerminalKeys {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::warn!(error = %err, "failed to restore terminal mode");
        }
    }
}

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Key> {
        loop {
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = event::read()?
            {
                return Ok(match code {
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        Key::Interrupt
                    }
                    KeyCode::Char(c) => Key::Char(c),
                    _ => Key::Other,
                });
            }
        }
    }
}

/// Blocks until `quit_key` or Ctrl-C is pressed.
fn wait_for_quit<K: KeySource>(mut keys: K, quit_key: char) -> io::Result<()> {
    loop {
        match keys.next_key()? {
            Key::Interrupt => return Ok(()),
            Key::Char(c) if c == quit_key => return Ok(()),
            key => tracing::trace!(?key, "ignored key"),
        }
    }
}

async fn tick<F>(
    start: DateTime<Utc>,
    mut cancel: watch::Receiver<bool>,
    done: oneshot::Sender<DateTime<Utc>>,
    mut render: F,
) where
    F: FnMut(Duration) + Send + 'static,
{
    let mut done = Some(done);
    let mut interval = tokio::time::interval(StdDuration::from_secs(1));

    loop {
        tokio::select! {
            _ = interval.tick() => render(Utc::now() - start),
            changed = cancel.changed() => {
                if changed.is_ok() && !*cancel.borrow_and_update() {
                    continue;
                }
                if let Some(done) = done.take() {
                    // The receiver only goes away if the caller gave up waiting.
                    let _ = done.send(Utc::now());
                }
                return;
            }
        }
    }
}

/// Renders elapsed time through `render` until the quit key, then returns the
/// end time.
///
/// A failure to read keys still stops the display before it is reported.
pub async fn run_until_quit<K, F>(
    keys: K,
    quit_key: char,
    start: DateTime<Utc>,
    render: F,
) -> Result<DateTime<Utc>>
where
    K: KeySource,
    F: FnMut(Duration) + Send + 'static,
{
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (done_tx, done_rx) = oneshot::channel();
    let ticker = tokio::spawn(tick(start, cancel_rx, done_tx, render));

    let waited = tokio::task::spawn_blocking(move || wait_for_quit(keys, quit_key)).await;

    cancel_tx.send_replace(true);
    let end = done_rx
        .await
        .context("timer display stopped without an end time")?;
    ticker.await.context("timer display task failed")?;

    waited
        .context("key reader task failed")?
        .context("failed to read key")?;
    tracing::debug!(%end, "timer stopped");
    Ok(end)
}

/// Runs the display on the terminal until `quit_key` or Ctrl-C.
pub fn run_interactive(start: DateTime<Utc>, quit_key: char) -> Result<DateTime<Utc>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start timer runtime")?;
    let keys = TerminalKeys::new().context("failed to enable raw terminal mode")?;

    let end = runtime.block_on(run_until_quit(keys, quit_key, start, render_to_stdout));

    let mut stdout = io::stdout();
    writeln!(stdout)?;
    end
}

fn render_to_stdout(elapsed: Duration) {
    let mut stdout = io::stdout();
    // Raw mode: return to column 0 explicitly.
    let _ = write!(stdout, "\r  {}", format_clock(elapsed));
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Replays keys in order, optionally pausing before each one.
    #[derive(Clone)]
    struct ScriptedKeys {
        keys: Arc<Mutex<VecDeque<Key>>>,
        delay: StdDuration,
        last_read: Arc<Mutex<Option<DateTime<Utc>>>>,
    }

    impl ScriptedKeys {
        fn new(keys: impl IntoIterator<Item = Key>) -> Self {
            Self {
                keys: Arc::new(Mutex::new(keys.into_iter().collect())),
                delay: StdDuration::ZERO,
                last_read: Arc::new(Mutex::new(None)),
            }
        }

        fn with_delay(mut self, delay: StdDuration) -> Self {
            self.delay = delay;
            self
        }

        fn remaining(&self) -> usize {
            self.keys.lock().unwrap().len()
        }
    }

    impl KeySource for ScriptedKeys {
        fn next_key(&mut self) -> io::Result<Key> {
            std::thread::sleep(self.delay);
            let key = self.keys.lock().unwrap().pop_front().ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted")
            })?;
            *self.last_read.lock().unwrap() = Some(Utc::now());
            Ok(key)
        }
    }

    fn no_render(_: Duration) {}

    #[tokio::test]
    async fn quit_key_stamps_end_after_it_is_read() {
        let keys = ScriptedKeys::new([Key::Char('x'), Key::Other, Key::Char('q'), Key::Char('z')])
            .with_delay(StdDuration::from_millis(20));
        let probe = keys.clone();
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&renders);
        let start = Utc::now();

        let end = run_until_quit(keys, 'q', start, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

        let quit_read = probe.last_read.lock().unwrap().expect("quit key read");
        assert!(end >= quit_read);
        assert!(end >= start);
        assert_eq!(probe.remaining(), 1);
        assert!(renders.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn ctrl_c_quits() {
        let keys = ScriptedKeys::new([Key::Interrupt, Key::Char('q')]);
        let probe = keys.clone();

        run_until_quit(keys, 'q', Utc::now(), no_render).await.unwrap();
        assert_eq!(probe.remaining(), 1);
    }

    #[tokio::test]
    async fn quit_key_is_configurable() {
        let keys = ScriptedKeys::new([Key::Char('q'), Key::Char('s')]);
        let probe = keys.clone();

        run_until_quit(keys, 's', Utc::now(), no_render).await.unwrap();
        assert_eq!(probe.remaining(), 0);
    }

    #[tokio::test]
    async fn key_read_failure_is_reported() {
        let keys = ScriptedKeys::new([Key::Char('a')]);

        let err = run_until_quit(keys, 'q', Utc::now(), no_render)
            .await
            .unwrap_err();
        assert_eq!(format!("{err:#}"), "failed to read key: script exhausted");
    }

    #[tokio::test]
    async fn ticker_stamps_once_on_repeated_cancel() {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (done_tx, done_rx) = oneshot::channel();
        let ticker = tokio::spawn(tick(Utc::now(), cancel_rx, done_tx, no_render));

        cancel_tx.send_replace(true);
        cancel_tx.send_replace(true);
        let end = done_rx.await.unwrap();
        ticker.await.unwrap();
        assert!(end <= Utc::now());
    }

    #[test]
    fn terminal_keys_is_a_unit_guard() {
        assert_eq!(std::mem::size_of::<TerminalKeys>(), 0);
    }
}
