//! Binary wire format of intermediate aggregation results.
//!
//! Partial results travel between nodes as a compact byte stream. Every stream carries a
//! [`WireVersion`], so that a node can talk to older nodes: fields introduced in a later
//! version are only written and read when both sides know about them.
//!
//! Nested aggregation results are polymorphic. Each one is prefixed with its type tag, and the
//! decoder looks up the matching read function in an [`AggregationStreams`] registry, which is
//! built once at start-up and handed to every [`StreamInput`].

use std::fmt;

use rustc_hash::FxHashMap;

use super::intermediate_agg_result::InternalAggregation;
use crate::ReduceError;
use crate::common::{BinarySerializable, VInt};

/// Version of the wire protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WireVersion(u32);

impl WireVersion {
    /// First protocol version.
    pub const V_1_0_0: WireVersion = WireVersion(1_000_099);
    /// Adds the extended bounds to the empty bucket info of histograms.
    pub const V_1_1_0: WireVersion = WireVersion(1_010_099);
    /// Version spoken by this node.
    pub const CURRENT: WireVersion = WireVersion::V_1_1_0;

    /// Builds a version from its numeric id.
    pub fn from_id(id: u32) -> WireVersion {
        WireVersion(id)
    }

    /// Numeric id of the version.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns true if `self` is `other` or a later version.
    pub fn on_or_after(self, other: WireVersion) -> bool {
        self >= other
    }
}

impl Default for WireVersion {
    fn default() -> Self {
        WireVersion::CURRENT
    }
}

/// Types that can be written to and read from the wire.
pub trait Streamable: Sized {
    /// Appends `self` to the output.
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()>;
    /// Reads an instance from the input.
    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self>;
}

/// Serializes `value` for a peer speaking `version`.
pub fn to_bytes<T: Streamable>(value: &T, version: WireVersion) -> crate::Result<Vec<u8>> {
    let mut output = StreamOutput::new(version);
    value.write_to(&mut output)?;
    Ok(output.into_bytes())
}

/// Deserializes a value written by a peer speaking `version`.
///
/// The whole buffer has to be consumed, trailing bytes are a protocol error.
pub fn from_bytes<T: Streamable>(
    bytes: &[u8],
    version: WireVersion,
    streams: &AggregationStreams,
) -> crate::Result<T> {
    let mut input = StreamInput::new(bytes, version, streams);
    let value = T::read_from(&mut input)?;
    if input.remaining() != 0 {
        return Err(ReduceError::ProtocolError(format!(
            "{} trailing bytes after the end of the stream",
            input.remaining()
        )));
    }
    Ok(value)
}

/// Byte sink of the wire format.
#[derive(Debug)]
pub struct StreamOutput {
    buffer: Vec<u8>,
    version: WireVersion,
}

impl StreamOutput {
    /// Creates an empty output for a peer speaking `version`.
    pub fn new(version: WireVersion) -> StreamOutput {
        StreamOutput {
            buffer: Vec::new(),
            version,
        }
    }

    /// Protocol version of the peer.
    pub fn version(&self) -> WireVersion {
        self.version
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Writes a value with its fixed binary representation.
    pub fn write<T: BinarySerializable>(&mut self, value: &T) -> crate::Result<()> {
        value.serialize(&mut self.buffer)?;
        Ok(())
    }

    /// Writes a variable length unsigned integer.
    pub fn write_vint(&mut self, value: u64) -> crate::Result<()> {
        self.write(&VInt(value))
    }

    /// Writes a length prefixed utf-8 string.
    pub fn write_str(&mut self, value: &str) -> crate::Result<()> {
        self.write_vint(value.len() as u64)?;
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes a presence flag followed by the value, if any.
    pub fn write_optional<T: Streamable>(&mut self, value: Option<&T>) -> crate::Result<()> {
        self.write(&value.is_some())?;
        if let Some(value) = value {
            value.write_to(self)?;
        }
        Ok(())
    }
}

/// Byte source of the wire format.
pub struct StreamInput<'a> {
    reader: &'a [u8],
    version: WireVersion,
    streams: &'a AggregationStreams,
}

impl<'a> StreamInput<'a> {
    /// Reads `bytes` written by a peer speaking `version`.
    pub fn new(
        bytes: &'a [u8],
        version: WireVersion,
        streams: &'a AggregationStreams,
    ) -> StreamInput<'a> {
        StreamInput {
            reader: bytes,
            version,
            streams,
        }
    }

    /// Protocol version of the peer.
    pub fn version(&self) -> WireVersion {
        self.version
    }

    /// Number of bytes not read yet.
    pub fn remaining(&self) -> usize {
        self.reader.len()
    }

    /// Reads a value with its fixed binary representation.
    pub fn read<T: BinarySerializable>(&mut self) -> crate::Result<T> {
        Ok(T::deserialize(&mut self.reader)?)
    }

    /// Reads a variable length unsigned integer.
    pub fn read_vint(&mut self) -> crate::Result<u64> {
        Ok(self.read::<VInt>()?.val())
    }

    /// Reads a length prefixed utf-8 string.
    pub fn read_string(&mut self) -> crate::Result<String> {
        self.read::<String>()
    }

    /// Reads an element count.
    ///
    /// Every element takes at least one byte, so a count larger than the remaining input can
    /// only come from corrupted data.
    pub fn read_len(&mut self) -> crate::Result<usize> {
        let len = self.read_vint()?;
        if len > self.remaining() as u64 {
            return Err(ReduceError::ProtocolError(format!(
                "announced {len} elements, but only {} bytes are left",
                self.remaining()
            )));
        }
        Ok(len as usize)
    }

    /// Reads a presence flag followed by the value, if any.
    pub fn read_optional<T: Streamable>(&mut self) -> crate::Result<Option<T>> {
        if self.read::<bool>()? {
            T::read_from(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads an aggregation result, dispatching on its type tag.
    pub fn read_aggregation(&mut self, type_tag: &str) -> crate::Result<InternalAggregation> {
        let streams = self.streams;
        streams.read(type_tag, self)
    }
}

/// Reads one aggregation result from the input.
pub type ReadAggregationFn = fn(&mut StreamInput<'_>) -> crate::Result<InternalAggregation>;

/// Registry mapping the type tag of an aggregation result to its read function.
///
/// `AggregationStreams::default()` knows all the aggregation kinds of this crate.
#[derive(Clone)]
pub struct AggregationStreams {
    readers: FxHashMap<String, ReadAggregationFn>,
}

impl Default for AggregationStreams {
    fn default() -> Self {
        let mut streams = AggregationStreams::empty();
        InternalAggregation::register_streams(&mut streams);
        streams
    }
}

impl fmt::Debug for AggregationStreams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut type_tags: Vec<&str> = self.readers.keys().map(String::as_str).collect();
        type_tags.sort_unstable();
        f.debug_struct("AggregationStreams")
            .field("type_tags", &type_tags)
            .finish()
    }
}

impl AggregationStreams {
    /// Registry without any read function.
    pub fn empty() -> Self {
        AggregationStreams {
            readers: FxHashMap::default(),
        }
    }

    /// Registers the read function of `type_tag`, replacing a previous registration.
    pub fn register(&mut self, type_tag: impl Into<String>, reader: ReadAggregationFn) {
        self.readers.insert(type_tag.into(), reader);
    }

    /// Returns true if a read function is registered for `type_tag`.
    pub fn contains(&self, type_tag: &str) -> bool {
        self.readers.contains_key(type_tag)
    }

    fn read(
        &self,
        type_tag: &str,
        input: &mut StreamInput<'_>,
    ) -> crate::Result<InternalAggregation> {
        let reader = self.readers.get(type_tag).ok_or_else(|| {
            ReduceError::ProtocolError(format!("unknown aggregation type [{type_tag}]"))
        })?;
        reader(input)
    }
}
