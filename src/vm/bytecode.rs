//! Ahlelele executable format and serialization
//!
//! ```text
//! offset  size  field
//! 0       4     magic, u32 little-endian (MAGIC)
//! 4       8     payload length in bytes, u64 little-endian
//! 12      n     byte stream as produced by the compiler
//! ```

use std::io::{self, Read, Write};

use thiserror::Error;
use tracing::{debug, warn};

use super::opcodes::MAGIC;

pub const HEADER_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid executable file format (magic {found:#010x}, expected {:#010x})", MAGIC)]
    InvalidExecutableFormat { found: u32 },

    #[error("truncated executable: {section} needs {expected} byte(s), {actual} available")]
    Truncated {
        section: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A compiled program, the content of an executable file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Executable {
    pub code: Vec<u8>,
}

impl Executable {
    pub fn new(code: Vec<u8>) -> Self {
        Self { code }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.code.len());
        write_u32(&mut buf, MAGIC);
        write_u64(&mut buf, self.code.len() as u64);
        buf.extend_from_slice(&self.code);
        buf
    }

    /// Parse a container. The magic number is checked before the length or
    /// payload is looked at.
    pub fn deserialize(data: &[u8]) -> Result<Self, FormatError> {
        let mut pos = 0;

        let magic = read_u32(data, &mut pos, "magic number")?;
        if magic != MAGIC {
            return Err(FormatError::InvalidExecutableFormat { found: magic });
        }

        let declared = read_u64(data, &mut pos, "length prefix")?;
        let available = (data.len() - pos) as u64;
        if declared > available {
            return Err(FormatError::Truncated {
                section: "payload",
                expected: declared,
                actual: available,
            });
        }
        if declared < available {
            warn!(
                declared,
                trailing = available - declared,
                "ignoring bytes after executable payload"
            );
        }

        // declared <= available, which already fits in usize
        let end = pos + declared as usize;
        let code = data[pos..end].to_vec();
        debug!(bytes = code.len(), "loaded executable");
        Ok(Executable { code })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), FormatError> {
        writer.write_all(&self.serialize())?;
        writer.flush()?;
        Ok(())
    }

    /// Stream a container from `reader`, consuming nothing past the declared
    /// payload. A bad magic number stops after the first four bytes.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, FormatError> {
        let magic = u32::from_le_bytes(read_array::<_, 4>(&mut reader, "magic number")?);
        if magic != MAGIC {
            return Err(FormatError::InvalidExecutableFormat { found: magic });
        }

        let declared = u64::from_le_bytes(read_array::<_, 8>(&mut reader, "length prefix")?);

        // Grows with what is actually there, never with what the header claims
        let mut code = Vec::new();
        reader.by_ref().take(declared).read_to_end(&mut code)?;
        let actual = code.len() as u64;
        if actual < declared {
            return Err(FormatError::Truncated {
                section: "payload",
                expected: declared,
                actual,
            });
        }
        debug!(bytes = code.len(), "loaded executable");
        Ok(Executable { code })
    }
}

// ── Serialization helpers ────────────────────────────────────────────────

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

// ── Deserialization helpers ──────────────────────────────────────────────

fn take<const N: usize>(
    data: &[u8],
    pos: &mut usize,
    section: &'static str,
) -> Result<[u8; N], FormatError> {
    let bytes: [u8; N] = data
        .get(*pos..*pos + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(FormatError::Truncated {
            section,
            expected: N as u64,
            actual: data.len().saturating_sub(*pos) as u64,
        })?;
    *pos += N;
    Ok(bytes)
}

fn read_u32(data: &[u8], pos: &mut usize, section: &'static str) -> Result<u32, FormatError> {
    take::<4>(data, pos, section).map(u32::from_le_bytes)
}

fn read_u64(data: &[u8], pos: &mut usize, section: &'static str) -> Result<u64, FormatError> {
    take::<8>(data, pos, section).map(u64::from_le_bytes)
}

/// Fill `N` bytes from a stream, reporting how many arrived if it ends early.
fn read_array<R: Read, const N: usize>(
    reader: &mut R,
    section: &'static str,
) -> Result<[u8; N], FormatError> {
    let mut buf = [0u8; N];
    let mut filled = 0;
    while filled < N {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(FormatError::Truncated {
                    section,
                    expected: N as u64,
                    actual: filled as u64,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(buf)
}
