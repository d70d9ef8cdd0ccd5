//! Element values, decoded under the active operator state.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::output::Value;
use crate::tables::{EntryKind, TableEntry};

use super::Decoder;
use super::descriptor::Descriptor;
use super::reader::{Truncated, ones};

impl<O> Decoder<'_, '_, '_, O> {
    /// Reads one element, returning the per-subset values and the values of
    /// any associated field in force.
    pub(super) fn value(
        &mut self,
        descriptor: Descriptor,
        entry: &TableEntry,
    ) -> Result<(Vec<Value>, Vec<u64>), Truncated> {
        let associated = if self.modifier.associated() > 0 && descriptor.modifiable() {
            self.raw_words(self.modifier.associated())?
        } else {
            Vec::new()
        };

        if entry.kind == EntryKind::String {
            let width = self.modifier.width_char.unwrap_or(entry.width);
            let values = self
                .raw_text(width)?
                .into_iter()
                .map(|text| {
                    if text.chars().all(|c| c == '\u{ff}') {
                        Value::Missing
                    } else {
                        Value::Text(text)
                    }
                })
                .collect();
            return Ok((values, associated));
        }

        if matches!(entry.kind, EntryKind::Long | EntryKind::Double)
            && let Some(bits) = self.modifier.ieee
        {
            return Ok((self.ieee(bits)?, associated));
        }

        // Scaled binary form. Code and flag tables always keep their table
        // widths, as does the whole of class 31.
        let mut width = i64::from(entry.width);
        let mut scale = entry.scale;
        let mut reference = entry.reference as f64;

        if descriptor.modifiable() && matches!(entry.kind, EntryKind::Long | EntryKind::Double) {
            if let Some(change) = self.modifier.width_bit {
                width += i64::from(change);
            }
            if let Some(change) = self.modifier.scale {
                scale += change;
            }
            // An explicit reference value wins over the multiplier.
            if let Some(value) = self
                .modifier
                .ref_val
                .as_ref()
                .and_then(|m| m.get(&descriptor))
            {
                reference = *value as f64;
            } else if let Some(multiplier) = self.modifier.ref_mul {
                reference *= multiplier;
            }
        }

        let width = match width {
            ..0 => {
                log::warn!("Modified width of {descriptor} is {width} bits, reading none.");
                0
            }
            65.. => {
                log::warn!(
                    "Modified width of {descriptor} is {width} bits, beyond the value range; reporting missing."
                );
                self.skip_words(width as u32)?;
                return Ok((vec![Value::Missing; self.each_subset()], associated));
            }
            width => width as u32,
        };

        let counter = descriptor.counter();
        let values = self
            .raw_words(width)?
            .into_iter()
            .map(|raw| {
                if raw == ones(width) && !counter {
                    Value::Missing
                } else {
                    Value::Number(scaled(raw, reference, scale))
                }
            })
            .collect();

        Ok((values, associated))
    }

    /// Reads the per-subset raw words of one field.
    ///
    /// Compressed messages store a base value, a six-bit increment width, and
    /// one increment per subset.
    pub(super) fn raw_words(&mut self, width: u32) -> Result<Vec<u64>, Truncated> {
        if !self.compressed {
            return Ok(vec![self.reader.read(width)?]);
        }

        let base = self.reader.read(width)?;
        let nbinc = self.reader.read(6)? as u32;

        let mut words = Vec::with_capacity(self.subsets as usize);
        for _ in 0..self.subsets {
            words.push(if nbinc == 0 {
                base
            } else {
                base.wrapping_add(self.reader.read(nbinc)?)
            });
        }
        Ok(words)
    }

    /// Reads the per-subset texts of one field.
    ///
    /// A nonzero increment width replaces the base text entirely, giving that
    /// many octets per subset.
    fn raw_text(&mut self, width: u32) -> Result<Vec<String>, Truncated> {
        let octets = (width as usize).div_ceil(8);
        if !self.compressed {
            return Ok(vec![self.reader.read_text(octets)?]);
        }

        let base = self.reader.read_text(octets)?;
        let nbinc = self.reader.read(6)? as usize;

        if nbinc == 0 {
            Ok(vec![base; self.subsets as usize])
        } else {
            let mut texts = Vec::with_capacity(self.subsets as usize);
            for _ in 0..self.subsets {
                texts.push(self.reader.read_text(nbinc)?);
            }
            Ok(texts)
        }
    }

    /// Reads a field in IEEE form. Widths other than 32 and 64 degrade to
    /// missing after consuming their bits.
    fn ieee(&mut self, bits: u32) -> Result<Vec<Value>, Truncated> {
        match bits {
            32 => Ok(self
                .raw_words(32)?
                .into_iter()
                .map(|raw| {
                    if raw == 0x7f7f_ffff {
                        Value::Missing
                    } else {
                        Value::Number(f32::from_bits(raw as u32).into())
                    }
                })
                .collect()),
            64 => Ok(self
                .raw_words(64)?
                .into_iter()
                .map(|raw| {
                    if raw == 0x7fef_ffff_ffff_ffff {
                        Value::Missing
                    } else {
                        Value::Number(f64::from_bits(raw))
                    }
                })
                .collect()),
            _ => {
                log::warn!("IEEE width of {bits} bits is neither 32 nor 64, reporting missing.");
                self.skip_words(bits)?;
                Ok(vec![Value::Missing; self.each_subset()])
            }
        }
    }

    /// Consumes a field of the given width without decoding it.
    fn skip_words(&mut self, width: u32) -> Result<(), Truncated> {
        self.reader.skip(width as usize)?;
        if self.compressed {
            let nbinc = self.reader.read(6)? as usize;
            self.reader.skip(nbinc * self.subsets as usize)?;
        }
        Ok(())
    }

    /// Values carried by one field: one per subset when compressed.
    fn each_subset(&self) -> usize {
        if self.compressed {
            self.subsets as usize
        } else {
            1
        }
    }
}

/// Applies reference and scale to a raw word.
fn scaled(raw: u64, reference: f64, scale: i32) -> f64 {
    let value = raw as f64 + reference;
    if scale > 0 {
        value / pow10(scale)
    } else {
        value * pow10(-scale)
    }
}

/// Ten raised to a small non-negative power.
pub(super) fn pow10(exponent: i32) -> f64 {
    let mut power = 1.0;
    for _ in 0..exponent {
        power *= 10.0;
    }
    power
}
