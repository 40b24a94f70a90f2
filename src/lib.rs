//!
//! ## Design
//!
//! * cycle through a fixed catalog of 5-byte tag identifiers, keeping a tag
//!   emulator emitting whichever one is current
//! * hold each identifier for MAX_REPEAT + 1 timer ticks, then move on;
//!   wrap round at the end of the catalog
//! * any keypress stops the whole thing, and so does losing the input
//! * abstract display and emulator so can plug alternatives; starting with
//!   TUI in-console and the PC speaker
//!
//! Model
//!
//! ```text
//! run()
//!  |-- shared state (index, repeat count) behind one lock
//!  |-- render worker(display, state reader)    -- own thread; read-only
//!  |-- timer(tick sender)                      -- own thread; drops ticks
//!  |                                              if the queue is full
//!  |-- input listener(key sender)              -- own thread; blocks if
//!  |                                              the queue is full
//!  `-- controller(emulator, shared state)      -- caller's thread; only
//!       |                                         writer, only consumer
//!       |-- event = queue.recv_timeout(100ms)
//!       |-- Tick => state.tick(); maybe re-arm emulator; request redraw
//!       |-- Key  => stop
//!       |-- InputClosed => stop
//!       `-- on the way out: emulator.stop(); tear down the threads
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod display;
pub mod emulator;
pub mod error;
pub mod event;
pub mod input;
pub mod state;
pub mod timer;

pub use error::{CycleError, Result};
