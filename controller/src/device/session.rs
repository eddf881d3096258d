use tcucore::codec::{decode_status, encode, Register, TcuStatus};
use tcucore::Endianness;

/// Control register that arms the TCU on a 0 then 1 write.
pub const INSTRUCTION_REGISTER: &str = "instruction";

const INSTRUCTION_WIDTH: usize = 2;

/// Operations the workflow needs from a connection to the board.
pub trait DeviceSession {
    fn connect(&mut self) -> anyhow::Result<()>;

    /// Makes sure the TCU bitstream is running, adopting an existing process
    /// if one is found.
    fn ensure_running(&mut self, bof: &str) -> anyhow::Result<()>;

    fn write_register(&mut self, name: &str, bytes: &[u8]) -> anyhow::Result<()>;

    fn read_register(&mut self, name: &str) -> anyhow::Result<Vec<u8>>;

    fn disconnect(&mut self) -> anyhow::Result<()>;

    fn arm(&mut self, endianness: Endianness) -> anyhow::Result<()> {
        for value in [0, 1] {
            let word = encode(INSTRUCTION_REGISTER, value, INSTRUCTION_WIDTH, endianness)?;
            self.write_register(INSTRUCTION_REGISTER, word.as_bytes())?;
        }
        Ok(())
    }

    /// Reads and decodes the gateware's status flags.
    fn status(&mut self, endianness: Endianness) -> anyhow::Result<TcuStatus> {
        let bytes = self.read_register(Register::Status.name())?;
        Ok(decode_status(&bytes, endianness)?)
    }
}
