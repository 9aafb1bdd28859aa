use std::io::{self, Read, Write};

use super::BinarySerializable;

/// Wrapper over a `u64` that serializes as a variable int.
///
/// Each byte carries 7 bits of payload, least significant group first. The last byte of the
/// encoding has its high bit set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VInt(pub u64);

const STOP_BIT: u8 = 128;

impl VInt {
    /// The wrapped value.
    pub fn val(&self) -> u64 {
        self.0
    }

    /// Writes the encoding into `buffer` and returns the number of bytes used.
    pub fn serialize_into(&self, buffer: &mut [u8; 10]) -> usize {
        let mut remaining = self.0;
        for (i, b) in buffer.iter_mut().enumerate() {
            let next_byte: u8 = (remaining % 128u64) as u8;
            remaining /= 128u64;
            if remaining == 0u64 {
                *b = next_byte | STOP_BIT;
                return i + 1;
            } else {
                *b = next_byte;
            }
        }
        unreachable!("a u64 always fits in 10 bytes of 7 bits");
    }
}

impl BinarySerializable for VInt {
    fn serialize<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        let mut buffer = [0u8; 10];
        let num_bytes = self.serialize_into(&mut buffer);
        writer.write_all(&buffer[0..num_bytes])
    }

    fn deserialize<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut result = 0u64;
        let mut shift = 0u64;
        for byte in reader.bytes() {
            let b = byte?;
            if shift >= 64 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "VInt is longer than 10 bytes",
                ));
            }
            result |= u64::from(b % 128u8) << shift;
            if b >= STOP_BIT {
                return Ok(VInt(result));
            }
            shift += 7;
        }
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Reach end of buffer while reading VInt",
        ))
    }
}
