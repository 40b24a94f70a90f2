use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{poll, read, Event, KeyEvent};

use crate::error::{CycleError, Result};
use crate::event::KeySender;

/// how long a single wait for input lasts before we look at the stop flag
const INPUT_POLL: Duration = Duration::from_millis(50);

/// somewhere keypresses come from
pub trait KeySource {
    /// wait up to `timeout` for the next keypress
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// keypresses from the controlling terminal. expects the terminal to
/// already be in raw mode (see display::TermDisplay)
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !poll(timeout)? {
            return Ok(None);
        }
        match read()? {
            Event::Key(key) => Ok(Some(key)),
            // resizes and mouse movement aren't someone asking us to stop
            other => {
                tracing::trace!(?other, "ignoring non-key input");
                Ok(None)
            }
        }
    }
}

/// canned keypresses for testing; yields each in turn, then nothing
pub struct ScriptedKeys {
    keys: VecDeque<KeyEvent>,
}

impl ScriptedKeys {
    pub fn new(keys: &[KeyEvent]) -> Self {
        ScriptedKeys {
            keys: keys.iter().copied().collect(),
        }
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        match self.keys.pop_front() {
            Some(key) => Ok(Some(key)),
            None => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// forwards every keypress from a KeySource into the event queue, on its
/// own thread. if the source fails, an InputClosed goes on the queue before
/// the thread ends
pub struct InputListener {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputListener {
    pub fn start<S>(mut source: S, keys: KeySender) -> Result<InputListener>
    where
        S: KeySource + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("cycle-input".into())
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    match source.next_key(INPUT_POLL) {
                        Ok(Some(key)) => {
                            tracing::debug!(?key, "key pressed");
                            if keys.send(key).is_err() {
                                // nobody is listening any more
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "reading input failed");
                            break;
                        }
                    }
                }
                // NB. still flagged as running means nobody asked us to go;
                //     the controller must hear of it or it would wait forever
                if flag.load(Ordering::Acquire) && keys.close().is_ok() {
                    tracing::warn!("input listener gone");
                }
            })
            .map_err(|e| CycleError::startup("input listener", e))?;
        Ok(InputListener {
            running,
            handle: Some(handle),
        })
    }

    /// stop listening and wait for the thread. the queue's receiver must be
    /// gone (or drained) first, else a blocked send would hold us up
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("input listener panicked");
            }
        }
    }
}

impl Drop for InputListener {
    fn drop(&mut self) {
        self.stop();
    }
}
