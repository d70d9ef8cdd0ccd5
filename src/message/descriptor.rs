//! F-X-Y data descriptors, the keys into the tables.

use core::fmt;
use core::str::FromStr;

use alloc::string::String;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::reader::{BitReader, Truncated};

/// A string did not name a descriptor.
///
/// Descriptors are written as six digits: one for F (at most 3), two for X
/// (at most 63), three for Y (at most 255).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not a descriptor code: {0:?}.")]
pub struct IllegalDescriptor(pub String);

/// A data descriptor.
///
/// Descriptors order numerically by their fields, which coincides with the
/// lexicographic order of their six-digit codes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Descriptor {
    /// Class selector, two bits.
    pub f: u8,
    /// Category, six bits.
    pub x: u8,
    /// Entry within the category, eight bits.
    pub y: u8,
}

/// Dispatch classes selected by a descriptor's F bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// An element with an encoded value.
    Element,
    /// Replication of the descriptors that follow.
    Replication,
    /// An operator changing how later elements decode.
    Operator,
    /// A sequence to expand in place.
    Sequence,
}

impl Descriptor {
    /// Returns the descriptor with the given fields.
    pub const fn new(f: u8, x: u8, y: u8) -> Self {
        Self { f, x, y }
    }

    /// Reads a descriptor as its two-, six-, and eight-bit fields.
    pub fn read(reader: &mut BitReader) -> Result<Self, Truncated> {
        let word = reader.read(16)?;

        Ok(Self {
            f: (word >> 14) as u8,
            x: (word >> 8) as u8 & 0x3f,
            y: word as u8,
        })
    }

    /// Returns the descriptor's dispatch class.
    pub fn class(self) -> Class {
        match self.f {
            0 => Class::Element,
            1 => Class::Replication,
            2 => Class::Operator,
            _ => Class::Sequence,
        }
    }

    /// Returns whether width, scale, and reference modifications apply to
    /// this descriptor's values. Class 31 always keeps its table form.
    pub(crate) fn modifiable(self) -> bool {
        !(Self::new(0, 31, 0)..Self::new(0, 32, 0)).contains(&self)
    }

    /// Returns whether an all-ones pattern still carries a count rather than
    /// the missing value.
    pub(crate) fn counter(self) -> bool {
        (Self::new(0, 31, 0)..Self::new(0, 31, 20)).contains(&self)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}{:03}", self.f, self.x, self.y)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Descriptor {
    type Err = IllegalDescriptor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IllegalDescriptor(s.into());

        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            Err(err())?;
        }

        let f = s[..1].parse().map_err(|_| err())?;
        let x = s[1..3].parse().map_err(|_| err())?;
        let y = s[3..].parse().map_err(|_| err())?;

        if f > 3 || x > 63 {
            Err(err())?;
        }

        Ok(Self { f, x, y })
    }
}

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Descriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodeVisitor;

        impl Visitor<'_> for CodeVisitor {
            type Value = Descriptor;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a six-digit descriptor code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Descriptor, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(CodeVisitor)
    }
}
