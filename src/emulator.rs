use beep::beep;

use crate::catalog::IDENTIFIER_LEN;
use crate::error::{CycleError, Result};

/// the tag encodings an emulator may be asked to produce. we only ever use
/// one, but the payload size is tied to it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    Em4100,
}

impl TagKind {
    /// how many payload bytes this kind carries
    pub const fn data_len(self) -> usize {
        match self {
            TagKind::Em4100 => IDENTIFIER_LEN,
        }
    }

    fn check(self, payload: &[u8]) -> Result<()> {
        if payload.len() != self.data_len() {
            return Err(CycleError::Payload {
                kind: self,
                expected: self.data_len(),
                actual: payload.len(),
            });
        }
        Ok(())
    }
}

/// the thing that actually emits an identifier. at most one session is live
/// at a time: `start` stops whatever was running first, and `stop` does
/// nothing if nothing is running
pub trait Emulator {
    fn start(&mut self, kind: TagKind, payload: &[u8]) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn is_running(&self) -> bool;
}

/// lowest pitch we'll play; identifiers spread upward from here
const TONE_BASE_PITCH: u16 = 440;
const TONE_STEP: u16 = 8;

/// stands in for the coil on a PC: holds a tone on the speaker for as long
/// as a session is live, pitched from the payload so you can hear it move on
pub struct ToneEmulator {
    pitch: Option<u16>,
}

impl ToneEmulator {
    /// make sure we can actually drive the speaker before committing to it
    pub fn probe() -> Result<Self> {
        beep(0).map_err(CycleError::emulator)?;
        Ok(ToneEmulator { pitch: None })
    }

    fn pitch_for(payload: &[u8]) -> u16 {
        let mix = payload.iter().fold(0u8, |acc, b| acc ^ b);
        TONE_BASE_PITCH + mix as u16 * TONE_STEP
    }
}

impl Emulator for ToneEmulator {
    fn start(&mut self, kind: TagKind, payload: &[u8]) -> Result<()> {
        kind.check(payload)?;
        self.stop()?;
        let pitch = Self::pitch_for(payload);
        beep(pitch).map_err(CycleError::emulator)?;
        self.pitch = Some(pitch);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.pitch.take().is_some() {
            beep(0).map_err(CycleError::emulator)?;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.pitch.is_some()
    }
}

impl Drop for ToneEmulator {
    fn drop(&mut self) {
        // don't leave the speaker screaming
        let _ = self.stop();
    }
}

/// emulator that only logs what it would have emitted
#[derive(Default)]
pub struct TraceEmulator {
    active: Option<Vec<u8>>,
}

impl TraceEmulator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Emulator for TraceEmulator {
    fn start(&mut self, kind: TagKind, payload: &[u8]) -> Result<()> {
        kind.check(payload)?;
        self.stop()?;
        tracing::info!(?kind, payload = ?payload, "emulation started");
        self.active = Some(payload.to_vec());
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(payload) = self.active.take() {
            tracing::info!(payload = ?payload, "emulation stopped");
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.active.is_some()
    }
}

/// one request made of a RecordingEmulator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmulatorCall {
    Start(TagKind, Vec<u8>),
    Stop,
}

/// useful for testing: remembers every call and how many sessions were
/// actually ended
#[derive(Default)]
pub struct RecordingEmulator {
    pub calls: Vec<EmulatorCall>,
    pub sessions_ended: usize,
    active: bool,
}

impl RecordingEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// payloads of every start, in order
    pub fn started(&self) -> Vec<&[u8]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EmulatorCall::Start(_, p) => Some(p.as_slice()),
                EmulatorCall::Stop => None,
            })
            .collect()
    }

    fn end_session(&mut self) {
        if self.active {
            self.active = false;
            self.sessions_ended += 1;
        }
    }
}

impl Emulator for RecordingEmulator {
    fn start(&mut self, kind: TagKind, payload: &[u8]) -> Result<()> {
        kind.check(payload)?;
        self.calls.push(EmulatorCall::Start(kind, payload.to_vec()));
        self.end_session();
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.calls.push(EmulatorCall::Stop);
        self.end_session();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.active
    }
}
