//! Typed routine calls: descriptors, value codec, executor, and result envelopes.
//!
//! Business code builds each `CallDescriptor` once, then calls
//! `CallExecutor::invoke` per request and branches on the `ResultEnvelope`.

pub mod codec;
pub mod descriptor;
pub mod envelope;
pub mod executor;
pub mod kind;
pub mod table;


pub use codec::{BoundValue, CodecError, decode, encode};
pub use descriptor::{
    CallDescriptor, DescriptorError, DescriptorParts, ReturnShape, build_function,
    build_procedure, build_query,
};
pub use envelope::{ResultEnvelope, Row};
pub use executor::CallExecutor;
pub use kind::{DATE_FORMAT, JsonValueError, UnknownKind, Value, ValueKind};
pub use table::{TableParameter, TableRow, TableSnapshot};
