//! Operator state applied to later element reads.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use super::descriptor::Descriptor;

/// Active operator modifications, accumulated while walking descriptors.
///
/// Each field stays in force until its operator category cancels it. The
/// associated-field widths form a stack whose base entry of zero is never
/// popped.
#[derive(Debug)]
pub(super) struct Modifier {
    /// Signed change to element widths, category 1 (and 7).
    pub width_bit: Option<i32>,
    /// Signed change to element scales, category 2 (and 7).
    pub scale: Option<i32>,
    /// Multiplier for table reference values, category 7.
    pub ref_mul: Option<f64>,
    /// Replacement reference values, category 3.
    pub ref_val: Option<BTreeMap<Descriptor, i64>>,
    /// Replacement width for character data, category 8, in bits.
    pub width_char: Option<u32>,
    /// Associated-field widths, category 4, in bits.
    pub assoc: Vec<u32>,
    /// Width of IEEE floating-point representation, category 9, in bits.
    pub ieee: Option<u32>,
}

impl Modifier {
    pub fn new() -> Self {
        Self {
            width_bit: None,
            scale: None,
            ref_mul: None,
            ref_val: None,
            width_char: None,
            assoc: vec![0],
            ieee: None,
        }
    }

    /// Width of the associated field prefixed to each element, zero when no
    /// operator is in force.
    pub fn associated(&self) -> u32 {
        self.assoc.last().copied().unwrap_or(0)
    }

    /// Stacks a further associated field on top of the current one.
    pub fn push_associated(&mut self, bits: u32) {
        self.assoc.push(self.associated() + bits);
    }

    /// Unstacks the top associated field. The base entry stays.
    pub fn pop_associated(&mut self) {
        if self.associated() > 0 {
            self.assoc.pop();
        }
    }
}
