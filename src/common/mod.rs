//! Low level building blocks shared by the wire format and the memory accounting.

mod byte_count;
mod serialize;
mod vint;

pub use self::byte_count::ByteCount;
pub use self::serialize::BinarySerializable;
pub use self::vint::VInt;
