//! Decoded content as an ordered event stream.
//!
//! Decoding emits [`Event`]s to a sink implementing [`FromEvents`]; the sink
//! chooses the output form. [`text::TextWriter`] and [`json::JsonWriter`]
//! render the two line formats, and a plain `Vec<Event>` keeps the stream
//! itself.

#[cfg(feature = "std")]
pub mod json;
#[cfg(feature = "std")]
pub mod text;

use core::fmt;

use alloc::string::String;
use alloc::vec::Vec;

use either::Either;
use serde::{Serialize, Serializer};

use crate::message::descriptor::Descriptor;
use crate::tables::TableEntry;

/// One decoded value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A number, after reference and scale are applied.
    Number(f64),
    /// Character data.
    Text(String),
    /// The encoded missing pattern.
    Missing,
}

/// Largest magnitude a float holds exactly for every whole number below it.
const EXACT: f64 = (1_i64 << 53) as f64;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Whole numbers keep an integer representation.
            Value::Number(n) if n % 1.0 == 0.0 && (-EXACT..=EXACT).contains(n) => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(text) => serializer.serialize_str(text),
            Value::Missing => serializer.serialize_unit(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(text) => f.write_str(text),
            Value::Missing => f.write_str("MISSING"),
        }
    }
}

/// Value of a metadata event.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    /// A numeric header field.
    Number(u64),
    /// The descriptors of the data description section.
    Codes(Vec<Descriptor>),
    /// Uninterpreted section content.
    Bytes(Vec<u8>),
    /// Values of a character literal operator.
    Values(Vec<Value>),
}

/// Progress of one replication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The replication begins.
    Start,
    /// The numbered round begins, counting from zero.
    Advance(u64),
    /// The replication ends.
    Stop,
    /// The replication has zero rounds, none of its group is decoded.
    Skip,
}

/// One decoded event.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A header field, in wire order.
    Meta { name: String, value: MetaValue },
    /// Data for one subset follows. Compressed messages announce all their
    /// subsets at once.
    Subset { number: u64, compressed: bool },
    /// A decoded element with its per-subset values and any associated
    /// field values.
    Value {
        descriptor: Descriptor,
        entry: TableEntry,
        values: Vec<Value>,
        associated: Vec<u64>,
    },
    /// A replication boundary.
    Replication(Step),
}

/// A sink assembling decoded events into an output form.
pub trait FromEvents {
    fn event(&mut self, event: Event);
}

/// Keeps the raw event stream.
impl FromEvents for Vec<Event> {
    fn event(&mut self, event: Event) {
        self.push(event);
    }
}

impl<L: FromEvents, R: FromEvents> FromEvents for Either<L, R> {
    fn event(&mut self, event: Event) {
        either::for_both!(self, sink => sink.event(event));
    }
}
