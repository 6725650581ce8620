//! Persistent per-gate calibration over a 256-byte non-volatile store.
//!
//! Layout:
//! - bytes 0..4: magic header `SCIZ`
//! - byte `4 + 2i`: gate `i` open byte
//! - byte `4 + 2i + 1`: gate `i` close byte
//!
//! A store without the header is reset in full: every byte from offset 4 to
//! the end becomes [`NEUTRAL_RAW`], then the header is written and the store
//! flushed. Writing the header last means an interrupted reset is simply
//! redone on the next load.

use blastgate_traits::{BYTE_STORE_LEN, ByteStore};
use tracing::{debug, info, warn};

use crate::error::{BuildError, GateError, Result};
use crate::hw_error::driver;
use crate::mapping::{NEUTRAL_RAW, angle_of};

pub const MAGIC: [u8; 4] = *b"SCIZ";
/// First record byte.
pub const RECORD_BASE: usize = MAGIC.len();
/// Most gates whose records fit in the store.
pub const MAX_GATES: usize = (BYTE_STORE_LEN - RECORD_BASE) / 2;

const _: () = assert!(MAX_GATES == blastgate_config::MAX_GATES);

/// One of a gate's two taught positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Open,
    Close,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Close => "close",
        })
    }
}

/// Address of a gate's endpoint byte, or `None` past the end of the store.
pub fn record_addr(gate: usize, endpoint: Endpoint) -> Option<u8> {
    let offset = match endpoint {
        Endpoint::Open => 0,
        Endpoint::Close => 1,
    };
    let addr = gate.checked_mul(2)?.checked_add(RECORD_BASE + offset)?;
    u8::try_from(addr).ok()
}

/// Stored bytes for one gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEndpoints {
    pub open_raw: u8,
    pub close_raw: u8,
}

impl RawEndpoints {
    pub const NEUTRAL: Self = Self {
        open_raw: NEUTRAL_RAW,
        close_raw: NEUTRAL_RAW,
    };

    pub fn open_angle(&self) -> u8 {
        angle_of(self.open_raw)
    }

    pub fn close_angle(&self) -> u8 {
        angle_of(self.close_raw)
    }
}

/// Non-destructive view of the store, as `inspect` found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReport {
    pub header_valid: bool,
    pub records: Vec<RawEndpoints>,
}

pub struct PersistentCalibration<S: ByteStore> {
    store: S,
    gates: usize,
}

impl<S: ByteStore> PersistentCalibration<S> {
    pub fn new(store: S, gates: usize) -> Result<Self> {
        if gates > MAX_GATES {
            return Err(eyre::Report::new(BuildError::TooManyGates {
                gates,
                max: MAX_GATES,
            }));
        }
        Ok(Self { store, gates })
    }

    pub fn gate_count(&self) -> usize {
        self.gates
    }

    pub fn header_valid(&mut self) -> Result<bool> {
        for (addr, want) in (0u8..).zip(MAGIC) {
            if driver(self.store.read_byte(addr), "read store header")? != want {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Read every configured gate's record, resetting the whole store first
    /// when the header is missing. Returns the records and whether a reset
    /// happened.
    pub fn load(&mut self) -> Result<(Vec<RawEndpoints>, bool)> {
        let reset = !self.header_valid()?;
        if reset {
            warn!("calibration store header missing; resetting to neutral");
            self.reset()?;
        }
        let records = self.read_all()?;
        debug!(gates = records.len(), reset, "calibration loaded");
        Ok((records, reset))
    }

    /// Report header validity and decoded records without writing anything.
    pub fn inspect(&mut self) -> Result<StoreReport> {
        Ok(StoreReport {
            header_valid: self.header_valid()?,
            records: self.read_all()?,
        })
    }

    /// Unconditionally reset every record byte to neutral and rewrite the header.
    pub fn reset(&mut self) -> Result<()> {
        for addr in (RECORD_BASE..BYTE_STORE_LEN).filter_map(|a| u8::try_from(a).ok()) {
            driver(self.store.write_byte(addr, NEUTRAL_RAW), "reset store record")?;
        }
        for (addr, byte) in (0u8..).zip(MAGIC) {
            driver(self.store.write_byte(addr, byte), "write store header")?;
        }
        driver(self.store.flush(), "flush store")?;
        info!("calibration store reset");
        Ok(())
    }

    pub fn read(&mut self, gate: usize) -> Result<RawEndpoints> {
        let open = self.addr(gate, Endpoint::Open)?;
        let close = self.addr(gate, Endpoint::Close)?;
        Ok(RawEndpoints {
            open_raw: driver(self.store.read_byte(open), "read store record")?,
            close_raw: driver(self.store.read_byte(close), "read store record")?,
        })
    }

    /// Persist one endpoint byte and flush it.
    pub fn commit(&mut self, gate: usize, endpoint: Endpoint, raw: u8) -> Result<()> {
        let addr = self.addr(gate, endpoint)?;
        driver(self.store.write_byte(addr, raw), "write store record")?;
        driver(self.store.flush(), "flush store")?;
        debug!(gate, %endpoint, raw, addr, "endpoint committed");
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read_all(&mut self) -> Result<Vec<RawEndpoints>> {
        (0..self.gates).map(|g| self.read(g)).collect()
    }

    fn addr(&self, gate: usize, endpoint: Endpoint) -> Result<u8> {
        if gate >= self.gates {
            return Err(eyre::Report::new(GateError::InvalidGate {
                gate,
                count: self.gates,
            }));
        }
        record_addr(gate, endpoint).ok_or_else(|| {
            eyre::Report::new(GateError::Store(format!("gate {gate} has no record address")))
        })
    }
}
