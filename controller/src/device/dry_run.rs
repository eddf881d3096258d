use crate::device::emulated::EmulatedTcu;
use crate::device::session::DeviceSession;
use log::info;
use tcucore::codec::RegisterWord;

/// Logs the board shell commands a live session would run.
///
/// Register contents are kept in an [`EmulatedTcu`] so readback and
/// verification still run end to end.
pub struct DryRun {
    address: String,
    login_timeout_s: u64,
    bank: EmulatedTcu,
    commands: Vec<String>,
}

impl DryRun {
    pub fn new(address: impl Into<String>, login_timeout_s: u64) -> Self {
        Self {
            address: address.into(),
            login_timeout_s,
            bank: EmulatedTcu::new(),
            commands: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    fn ioreg(&self, name: &str) -> String {
        format!(
            "/proc/{}/hw/ioreg/{}",
            self.bank.pid().unwrap_or_default(),
            name
        )
    }

    fn issue(&mut self, command: String) {
        info!("[dry-run] {}", command);
        self.commands.push(command);
    }
}

impl DeviceSession for DryRun {
    fn connect(&mut self) -> anyhow::Result<()> {
        self.issue(format!(
            "ssh root@{} (login timeout {}s)",
            self.address, self.login_timeout_s
        ));
        self.bank.connect()
    }

    fn ensure_running(&mut self, bof: &str) -> anyhow::Result<()> {
        self.issue("ps -o pid,args | grep [.]bof".to_string());
        let launching = self.bank.pid().is_none();
        self.bank.ensure_running(bof)?;
        if launching {
            self.issue(format!("/opt/rhinofs/{} &", bof));
        }
        Ok(())
    }

    fn write_register(&mut self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let escaped = RegisterWord::from_bytes(bytes.to_vec()).to_escaped();
        let command = format!("echo -en '{}' | cat > {}", escaped, self.ioreg(name));
        self.bank.write_register(name, bytes)?;
        self.issue(command);
        Ok(())
    }

    fn read_register(&mut self, name: &str) -> anyhow::Result<Vec<u8>> {
        let command = format!("od -x -An {}", self.ioreg(name));
        self.issue(command);
        self.bank.read_register(name)
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        self.issue("exit".to_string());
        self.bank.disconnect()
    }
}
