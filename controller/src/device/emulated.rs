use crate::device::session::{DeviceSession, INSTRUCTION_REGISTER};
use anyhow::{bail, Context};
use log::{debug, warn};
use std::collections::BTreeMap;
use tcucore::codec::{Register, TcuStatus};

/// Fill byte of unwritten pulse slots, matching the gateware's `others` default.
const BLANK: u8 = 0xff;

const STATUS_PRESENT: u16 = 1 << 6;
const STATUS_PRI: u16 = 1 << 4;

/// In-memory stand-in for the TCU register bank.
///
/// Reads return the full device register, so the pulse block comes back
/// padded to its capacity the way the board reports it.
#[derive(Debug, Default)]
pub struct EmulatedTcu {
    connected: bool,
    pid: Option<u32>,
    registers: BTreeMap<String, Vec<u8>>,
    instruction_log: Vec<Vec<u8>>,
    faults: BTreeMap<String, Vec<u8>>,
}

impl EmulatedTcu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a `.bof` already running on the board.
    #[cfg(test)]
    pub fn with_running_bof(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Makes subsequent reads of `name` return `bytes` regardless of writes.
    #[cfg(test)]
    pub fn inject_fault(&mut self, name: &str, bytes: Vec<u8>) {
        self.faults.insert(name.to_string(), bytes);
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// True once the instruction register has seen a 0 followed by a 1.
    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        let is_zero = |bytes: &Vec<u8>| bytes.iter().all(|b| *b == 0);
        self.instruction_log
            .windows(2)
            .last()
            .map(|pair| is_zero(&pair[0]) && !is_zero(&pair[1]))
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub fn register(&self, name: &str) -> Option<&[u8]> {
        self.registers.get(name).map(Vec::as_slice)
    }

    /// Status word as the gateware reports it, in the byte order the
    /// instruction register was last written with.
    fn status_bytes(&self) -> Vec<u8> {
        let armed = self
            .instruction_log
            .last()
            .map(|bytes| bytes.iter().any(|b| *b != 0))
            .unwrap_or(false);
        let status = if armed {
            TcuStatus::from_bits(STATUS_PRESENT | STATUS_PRI)
        } else {
            TcuStatus::from_bits(STATUS_PRESENT)
        };
        let little = self
            .instruction_log
            .iter()
            .rev()
            .find(|bytes| bytes.iter().any(|b| *b != 0))
            .map(|bytes| bytes.first().copied().unwrap_or(0) != 0)
            .unwrap_or(false);
        if little {
            status.bits.to_le_bytes().to_vec()
        } else {
            status.bits.to_be_bytes().to_vec()
        }
    }

    fn require_process(&self) -> anyhow::Result<u32> {
        if !self.connected {
            bail!("not connected to the board");
        }
        self.pid.context("no TCU process running on the board")
    }
}

impl DeviceSession for EmulatedTcu {
    fn connect(&mut self) -> anyhow::Result<()> {
        self.connected = true;
        Ok(())
    }

    fn ensure_running(&mut self, bof: &str) -> anyhow::Result<()> {
        if !self.connected {
            bail!("not connected to the board");
        }
        match self.pid {
            Some(pid) => warn!("existing .bof found running as pid {}, adopting it", pid),
            None => {
                let pid = 1000;
                debug!("launching {} as pid {}", bof, pid);
                self.pid = Some(pid);
            }
        }
        Ok(())
    }

    fn write_register(&mut self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        self.require_process()?;
        if name == INSTRUCTION_REGISTER {
            self.instruction_log.push(bytes.to_vec());
            self.registers.insert(name.to_string(), bytes.to_vec());
            return Ok(());
        }

        let register = Register::from_name(name)?;
        if !register.is_writable() {
            bail!("{} register is read-only", name);
        }
        let capacity = register.capacity();
        if bytes.len() > capacity {
            bail!(
                "{} bytes do not fit the {}-byte {} register",
                bytes.len(),
                capacity,
                name
            );
        }
        let mut stored = bytes.to_vec();
        stored.resize(capacity, BLANK);
        self.registers.insert(name.to_string(), stored);
        Ok(())
    }

    fn read_register(&mut self, name: &str) -> anyhow::Result<Vec<u8>> {
        self.require_process()?;
        if let Some(fault) = self.faults.get(name) {
            return Ok(fault.clone());
        }
        if name == Register::Status.name() {
            return Ok(self.status_bytes());
        }
        self.registers
            .get(name)
            .cloned()
            .with_context(|| format!("register {} was never written", name))
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        self.connected = false;
        Ok(())
    }
}
