use serde::{Deserialize, Serialize};

/// Byte order applied to every register in one build.
///
/// The device and the readback path must agree on this value, so it is
/// carried as a single flag rather than chosen per register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Most-significant byte first.
    #[default]
    Big,
    /// Least-significant byte first.
    Little,
}

impl std::fmt::Display for Endianness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endianness::Big => f.write_str("big"),
            Endianness::Little => f.write_str("little"),
        }
    }
}

impl std::str::FromStr for Endianness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "big" | "b" => Ok(Endianness::Big),
            "little" | "l" => Ok(Endianness::Little),
            other => Err(format!("unknown endianness '{}'", other)),
        }
    }
}

/// Failures raised while quantizing, encoding or decoding register values.
///
/// None of these leave partial state behind: a caller either holds a complete
/// register image or one of these errors, before anything touches the device.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("invalid duration: {value_us}us")]
    InvalidDuration { value_us: f64 },
    #[error("invalid clock period: {0}ns")]
    InvalidClockPeriod(u32),
    #[error("value {value} does not fit the {width}-byte {register} register")]
    ValueOutOfRange {
        register: String,
        value: u64,
        width: usize,
    },
    #[error("invalid register width: {0} bytes")]
    InvalidWidth(usize),
    #[error("pulse {index}: PRI too short for pre-pulse and pulse width (offset {offset_ticks} ticks)")]
    NegativePriOffset { index: usize, offset_ticks: i64 },
    #[error("too many pulses: {0} (device holds at most 32)")]
    TooManyPulses(usize),
    #[error("pulse {index}: invalid polarization mode {mode}")]
    InvalidPolarizationMode { index: usize, mode: u16 },
    #[error("pulse index {index} out of range for {len} pulses")]
    PulseIndexOutOfRange { index: usize, len: usize },
    #[error("missing register: {0}")]
    MissingRegister(String),
    #[error("unknown register: {0}")]
    UnknownRegister(String),
    #[error("{register}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        register: String,
        expected: usize,
        actual: usize,
    },
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Failures raised while reading or writing the textual header file.
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("no [{0}] section found")]
    MissingSection(&'static str),
    #[error("could not find required parameter {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
    #[error("malformed pulse {index}: '{text}'")]
    MalformedPulse { index: usize, text: String },
    #[error("line {line}: {text}")]
    Syntax { line: usize, text: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HeaderResult<T> = Result<T, HeaderError>;
