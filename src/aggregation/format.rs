//! Presentation of bucket keys.

use std::net::Ipv4Addr;

use super::date::format_date;
use super::streams::{StreamInput, StreamOutput, Streamable};
use crate::ReduceError;

const RAW_ID: u8 = 1;
const DATE_TIME_ID: u8 = 2;
const IPV4_ID: u8 = 6;

/// Renders a bucket key as the `key_as_string` of the response.
///
/// Formatters only affect the rendering, the reduction never looks at them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueFormatter {
    /// The decimal representation of the key.
    Raw,
    /// The key is a timestamp in milliseconds, rendered as a RFC3339 date.
    DateTime,
    /// The low 32 bits of the key are an IPv4 address.
    Ipv4,
}

impl ValueFormatter {
    /// Formats `key`.
    pub fn format(&self, key: i64) -> crate::Result<String> {
        match self {
            ValueFormatter::Raw => Ok(key.to_string()),
            ValueFormatter::DateTime => format_date(key),
            ValueFormatter::Ipv4 => Ok(Ipv4Addr::from(key as u32).to_string()),
        }
    }

    fn id(&self) -> u8 {
        match self {
            ValueFormatter::Raw => RAW_ID,
            ValueFormatter::DateTime => DATE_TIME_ID,
            ValueFormatter::Ipv4 => IPV4_ID,
        }
    }
}

impl Streamable for ValueFormatter {
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        output.write(&self.id())
    }

    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self> {
        match input.read::<u8>()? {
            RAW_ID => Ok(ValueFormatter::Raw),
            DATE_TIME_ID => Ok(ValueFormatter::DateTime),
            IPV4_ID => Ok(ValueFormatter::Ipv4),
            id => Err(ReduceError::ProtocolError(format!(
                "unknown value formatter id [{id}]"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_keys() -> crate::Result<()> {
        assert_eq!(ValueFormatter::Raw.format(-42)?, "-42");
        assert_eq!(
            ValueFormatter::DateTime.format(1_420_156_800_000)?,
            "2015-01-02T00:00:00Z"
        );
        assert_eq!(ValueFormatter::Ipv4.format(3_232_235_777)?, "192.168.1.1");
        Ok(())
    }
}
