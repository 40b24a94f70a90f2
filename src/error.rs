use std::io;

use crate::emulator::TagKind;

/// Result alias that carries [`CycleError`].
pub type Result<T> = std::result::Result<T, CycleError>;

/// everything that can go wrong while setting up or running the cycle
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// a resource needed before the loop starts could not be acquired;
    /// whatever was acquired before it has already been released
    #[error("cannot initialise {resource}: {source}")]
    Startup {
        resource: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Io(#[from] io::Error),
    /// the emulator backend refused a start/stop request
    #[error("emulator failure: {0}")]
    Emulator(String),
    #[error("{kind:?} needs {expected} bytes of payload, got {actual}")]
    Payload {
        kind: TagKind,
        expected: usize,
        actual: usize,
    },
}

impl CycleError {
    pub fn startup(resource: &'static str, source: io::Error) -> Self {
        Self::Startup { resource, source }
    }

    pub fn emulator<T: ToString>(msg: T) -> Self {
        Self::Emulator(msg.to_string())
    }
}
