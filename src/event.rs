use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, SendError, Sender, TrySendError};
use crossterm::event::KeyEvent;

/// things the controller reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// the periodic timer fired
    Tick,
    /// somebody pressed something; we keep whatever the terminal gave us
    Key(KeyEvent),
    /// the input listener has gone for good, so no key will ever come
    InputClosed,
}

/// producer side for the timer. never blocks: if the queue is full the tick
/// is thrown away and counted
#[derive(Clone, Debug)]
pub struct TickSender {
    tx: Sender<Event>,
    dropped: Arc<AtomicU64>,
}

impl TickSender {
    /// returns false if the tick didn't make it onto the queue
    pub fn offer(&self) -> bool {
        match self.tx.try_send(Event::Tick) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("event queue full, tick dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// how many ticks have been thrown away so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// producer side for input. blocks until there's room, so a keypress is
/// never lost while anybody is still listening
#[derive(Clone, Debug)]
pub struct KeySender {
    tx: Sender<Event>,
}

impl KeySender {
    /// errors only once the controller has gone away
    pub fn send(&self, key: KeyEvent) -> Result<(), SendError<Event>> {
        self.tx.send(Event::Key(key))
    }

    /// last word from an input source that has given up
    pub fn close(&self) -> Result<(), SendError<Event>> {
        self.tx.send(Event::InputClosed)
    }
}

/// build the single ordered queue that both producers feed and the
/// controller drains
pub fn queue(depth: usize) -> (TickSender, KeySender, Receiver<Event>) {
    let (tx, rx) = bounded(depth);
    let ticks = TickSender {
        tx: tx.clone(),
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (ticks, KeySender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::thread;
    use std::time::Duration;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_fifo_across_producers() {
        let (ticks, keys, rx) = queue(8);
        assert!(ticks.offer());
        keys.send(key('q')).unwrap();
        assert!(ticks.offer());
        assert_eq!(rx.try_recv(), Ok(Event::Tick));
        assert_eq!(rx.try_recv(), Ok(Event::Key(key('q'))));
        assert_eq!(rx.try_recv(), Ok(Event::Tick));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_tick_dropped_when_full() {
        let (ticks, _keys, rx) = queue(2);
        assert!(ticks.offer());
        assert!(ticks.offer());
        assert!(!ticks.offer());
        assert!(!ticks.offer());
        assert_eq!(ticks.dropped(), 2);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn test_tick_after_disconnect_is_not_counted() {
        let (ticks, _keys, rx) = queue(2);
        drop(rx);
        assert!(!ticks.offer());
        assert_eq!(ticks.dropped(), 0);
    }

    #[test]
    fn test_key_waits_for_room() {
        let (ticks, keys, rx) = queue(1);
        assert!(ticks.offer());
        let producer = thread::spawn(move || keys.send(key('x')));
        // give the producer a chance to block on the full queue
        thread::sleep(Duration::from_millis(20));
        assert_eq!(rx.recv(), Ok(Event::Tick));
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)),
            Ok(Event::Key(key('x')))
        );
        assert!(producer.join().unwrap().is_ok());
    }

    #[test]
    fn test_close_queues_behind_keys() {
        let (_ticks, keys, rx) = queue(4);
        keys.send(key('a')).unwrap();
        keys.close().unwrap();
        assert_eq!(rx.try_recv(), Ok(Event::Key(key('a'))));
        assert_eq!(rx.try_recv(), Ok(Event::InputClosed));
    }

    #[test]
    fn test_key_errors_once_consumer_gone() {
        let (_ticks, keys, rx) = queue(1);
        drop(rx);
        assert!(keys.send(key('x')).is_err());
    }
}
