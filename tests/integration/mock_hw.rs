//! Mock adapters for integration tests.
//!
//! `MockTransport` records every frame the engines write and plays back
//! scripted module output; with a responder attached it answers each RAPI
//! frame the way the charging hardware would. `MockHardware` stands in for
//! the front panel and records indicator writes.

use std::collections::VecDeque;

use wallybox::app::events::AppEvent;
use wallybox::app::ports::{
    ConfigError, ConfigPort, EventSink, Indicator, IndicatorPort, SensorPort, StorageError,
    StoragePort,
};
use wallybox::config::SystemConfig;
use wallybox::drivers::led::Rgb;
use wallybox::rapi::frame;
use wallybox::transport::Transport;

// ── MockTransport ─────────────────────────────────────────────

/// Maps the text of a RAPI command (checksum stripped) to the reply text.
pub type Responder = Box<dyn FnMut(&str) -> Option<String>>;

pub struct MockTransport {
    pub sent: Vec<Vec<u8>>,
    pub rx: VecDeque<u8>,
    pub send_done: bool,
    pub responder: Option<Responder>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            rx: VecDeque::new(),
            send_done: true,
            responder: None,
        }
    }

    /// Loopback that answers every RAPI frame through `f`.
    pub fn rapi_device(f: impl FnMut(&str) -> Option<String> + 'static) -> Self {
        Self {
            responder: Some(Box::new(f)),
            ..Self::new()
        }
    }

    pub fn push_rx(&mut self, text: &str) {
        self.rx.extend(text.as_bytes());
    }

    /// Queue a correctly framed RAPI reply.
    pub fn push_rapi_reply(&mut self, text: &str) {
        let framed = frame::encode(text, None).expect("reply fits a frame");
        self.rx.extend(framed.iter());
    }

    pub fn sent_text(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect()
    }

    /// Written RAPI commands without checksum and terminator.
    pub fn sent_commands(&self) -> Vec<String> {
        self.sent_text()
            .iter()
            .map(|s| command_text(s).to_owned())
            .collect()
    }

    pub fn count_sent(&self, text: &str) -> usize {
        self.sent_text().iter().filter(|s| s.as_str() == text).count()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn command_text(framed: &str) -> &str {
    let text = framed.trim_end_matches('\r');
    text.rsplit_once('^').map_or(text, |(body, _)| body)
}

impl Transport for MockTransport {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = self.rx.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.sent.push(data.to_vec());
        if let Some(responder) = self.responder.as_mut() {
            let text = String::from_utf8_lossy(data).into_owned();
            if let Some(reply) = responder(command_text(&text)) {
                let framed = frame::encode(&reply, None).map_err(|_| ())?;
                self.rx.extend(framed.iter());
            }
        }
        Ok(data.len())
    }

    fn is_send_done(&self) -> bool {
        self.send_done
    }

    fn remaining_send_bytes(&self) -> usize {
        0
    }
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorCall {
    pub which: Indicator,
    pub rgb: Rgb,
}

pub struct MockHardware {
    pub pressed: bool,
    pub plug: u16,
    pub calls: Vec<IndicatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            pressed: false,
            plug: 0,
            calls: Vec::new(),
        }
    }

    pub fn last_colour(&self, which: Indicator) -> Option<Rgb> {
        self.calls
            .iter()
            .rev()
            .find(|c| c.which == which)
            .map(|c| c.rgb)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn button_pressed(&mut self) -> bool {
        self.pressed
    }

    fn plug_sample(&mut self) -> u16 {
        self.plug
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, which: Indicator, rgb: Rgb) {
        self.calls.push(IndicatorCall { which, rgb });
    }
}

// ── FlakyStore ────────────────────────────────────────────────

/// Word store whose writes can be made to fail.
pub struct FlakyStore {
    pub words: Vec<u16>,
    pub fail_writes: bool,
    pub saved_config: Option<SystemConfig>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Self {
        Self {
            words: vec![0xFFFF; 256],
            fail_writes: false,
            saved_config: None,
        }
    }
}

impl Default for FlakyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for FlakyStore {
    fn capacity_words(&self) -> u16 {
        self.words.len() as u16
    }

    fn read_word(&self, addr: u16) -> Result<u16, StorageError> {
        self.words
            .get(usize::from(addr))
            .copied()
            .ok_or(StorageError::OutOfRange)
    }

    fn write_word(&mut self, addr: u16, value: u16) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        let cell = self
            .words
            .get_mut(usize::from(addr))
            .ok_or(StorageError::OutOfRange)?;
        *cell = value;
        Ok(())
    }
}

impl ConfigPort for FlakyStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        self.saved_config.clone().ok_or(ConfigError::NotFound)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        wallybox::config::validate(config)?;
        if self.fail_writes {
            return Err(ConfigError::IoError);
        }
        self.saved_config = Some(config.clone());
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
