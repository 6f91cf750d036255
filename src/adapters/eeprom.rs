//! Word-addressed persistent store.
//!
//! Implements [`StoragePort`] over a RAM image of [`EEPROM_WORDS`] cells
//! and [`ConfigPort`] on top of it (postcard blob at
//! [`persist::ADDR_CONFIG`]).
//!
//! - **`target_os = "espidf"`**: the image is loaded from NVS on open and
//!   written back after every changed word.
//! - **host**: RAM only, starting erased.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::{SystemConfig, validate};
use crate::persist::{self, ADDR_CONFIG, CONFIG_WORDS, ERASED};

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};

pub const EEPROM_WORDS: u16 = 256;

const CONFIG_BYTES: usize = CONFIG_WORDS as usize * 2;

#[cfg(target_os = "espidf")]
const NVS_NAMESPACE: &str = "wallybox";
#[cfg(target_os = "espidf")]
const NVS_KEY: &str = "eeprom";

pub struct EepromAdapter {
    cells: [u16; EEPROM_WORDS as usize],
    writes: u32,
    #[cfg(target_os = "espidf")]
    nvs: EspNvs<NvsDefault>,
}

impl EepromAdapter {
    /// Erased in-memory store.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            cells: [ERASED; EEPROM_WORDS as usize],
            writes: 0,
        }
    }

    /// Open the NVS namespace and load the stored image, if any.
    #[cfg(target_os = "espidf")]
    pub fn open(partition: EspNvsPartition<NvsDefault>) -> Result<Self, ConfigError> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true).map_err(|_| ConfigError::IoError)?;
        let mut cells = [ERASED; EEPROM_WORDS as usize];
        let mut raw = [0u8; EEPROM_WORDS as usize * 2];
        match nvs.get_raw(NVS_KEY, &mut raw) {
            Ok(Some(bytes)) if bytes.len() == raw.len() => {
                for (cell, pair) in cells.iter_mut().zip(raw.chunks_exact(2)) {
                    *cell = u16::from_le_bytes([pair[0], pair[1]]);
                }
                info!("EEPROM: image loaded from NVS");
            }
            Ok(_) => info!("EEPROM: no stored image, starting erased"),
            Err(e) => {
                warn!("EEPROM: NVS read failed: {:?}", e);
                return Err(ConfigError::IoError);
            }
        }
        Ok(Self {
            cells,
            writes: 0,
            nvs,
        })
    }

    #[cfg(target_os = "espidf")]
    fn flush(&mut self) -> Result<(), StorageError> {
        let mut raw = [0u8; EEPROM_WORDS as usize * 2];
        for (pair, cell) in raw.chunks_exact_mut(2).zip(self.cells.iter()) {
            pair.copy_from_slice(&cell.to_le_bytes());
        }
        self.nvs
            .set_raw(NVS_KEY, &raw)
            .map(|_| ())
            .map_err(|_| StorageError::IoError)
    }

    #[cfg(not(target_os = "espidf"))]
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Word writes since construction.
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    /// Reset every cell to the erased value.
    pub fn erase(&mut self) -> Result<(), StorageError> {
        self.cells = [ERASED; EEPROM_WORDS as usize];
        self.flush()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for EepromAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for EepromAdapter {
    fn capacity_words(&self) -> u16 {
        EEPROM_WORDS
    }

    fn read_word(&self, addr: u16) -> Result<u16, StorageError> {
        self.cells
            .get(usize::from(addr))
            .copied()
            .ok_or(StorageError::OutOfRange)
    }

    fn write_word(&mut self, addr: u16, value: u16) -> Result<(), StorageError> {
        let cell = self
            .cells
            .get_mut(usize::from(addr))
            .ok_or(StorageError::OutOfRange)?;
        *cell = value;
        self.writes = self.writes.wrapping_add(1);
        self.flush()
    }
}

impl ConfigPort for EepromAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; CONFIG_BYTES];
        let len = persist::read_bytes(self, ADDR_CONFIG, CONFIG_WORDS, &mut buf)
            .map_err(|_| ConfigError::IoError)?
            .ok_or(ConfigError::NotFound)?;
        let cfg: SystemConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        validate(&cfg).map_err(|e| {
            warn!("EEPROM: stored config rejected: {}", e);
            ConfigError::Corrupted
        })?;
        Ok(cfg)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate(config)?;
        let mut buf = [0u8; CONFIG_BYTES];
        let used = postcard::to_slice(config, &mut buf).map_err(|_| ConfigError::StorageFull)?;
        let len = used.len();
        persist::write_bytes(self, ADDR_CONFIG, CONFIG_WORDS, &buf[..len]).map_err(|e| match e {
            StorageError::OutOfRange => ConfigError::StorageFull,
            StorageError::IoError => ConfigError::IoError,
        })?;
        info!("EEPROM: config saved ({} bytes)", len);
        Ok(())
    }
}
