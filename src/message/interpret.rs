//! Recursive interpretation of descriptor lists.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use crate::output::{Event, FromEvents, MetaValue, Step, Value};
use crate::tables::{EntryKind, TableEntry};

use super::descriptor::{Class, Descriptor};
use super::reader::ones;
use super::value::pow10;
use super::{Decoder, Error};

/// Padding descriptor, ignored wherever it appears.
const FILLER: Descriptor = Descriptor::new(0, 0, 0);

/// Terminator of a new-reference-value block.
const NEW_REFERENCES_END: Descriptor = Descriptor::new(2, 3, 255);

impl<O: FromEvents> Decoder<'_, '_, '_, O> {
    /// Walks a descriptor list, dispatching on each descriptor's class.
    pub(super) fn walk(&mut self, descriptors: &[Descriptor]) -> Result<(), Error> {
        let mut index = 0;
        while index < descriptors.len() {
            let descriptor = descriptors[index];
            if descriptor == FILLER {
                index += 1;
                continue;
            }
            index += match descriptor.class() {
                Class::Element => {
                    self.element(descriptor)?;
                    1
                }
                Class::Replication => self.replication(descriptor, &descriptors[index + 1..])?,
                Class::Operator => self.operator(descriptor, &descriptors[index + 1..])?,
                Class::Sequence => {
                    self.sequence(descriptor)?;
                    1
                }
            };
        }
        Ok(())
    }

    fn element(&mut self, descriptor: Descriptor) -> Result<(), Error> {
        let Some(entry) = self.tables.element(descriptor) else {
            Err(Error::UnknownDescriptor(descriptor))?
        };
        let (values, associated) = self.value(descriptor, entry)?;
        self.out.event(Event::Value {
            descriptor,
            entry: entry.clone(),
            values,
            associated,
        });
        Ok(())
    }

    fn sequence(&mut self, descriptor: Descriptor) -> Result<(), Error> {
        let Some(expansion) = self.tables.sequence(descriptor) else {
            Err(Error::UnknownDescriptor(descriptor))?
        };
        self.walk(expansion)
    }

    /// Runs one replication, returning how many descriptors it spans: itself,
    /// any delayed counter, and the replicated group.
    fn replication(&mut self, descriptor: Descriptor, rest: &[Descriptor]) -> Result<usize, Error> {
        let Descriptor { x, y, .. } = descriptor;

        let (count, rest, consumed) = if y > 0 {
            (u64::from(y), rest, 1)
        } else {
            // Delayed: the next descriptor is a counter element carrying the
            // repeat count in the data.
            let Some((&counter, rest)) = rest.split_first() else {
                log::warn!("Delayed replication {descriptor} ends the descriptor list.");
                return Ok(1);
            };
            let Some(entry) = self.tables.element(counter) else {
                Err(Error::UnknownDescriptor(counter))?
            };
            let count = match self.value(counter, entry)?.0.first() {
                Some(Value::Number(count)) => *count as u64,
                _ => 0,
            };
            (count, rest, 2)
        };

        let group = &rest[..rest.len().min(x as usize)];

        if count == 0 {
            self.out.event(Event::Replication(Step::Skip));
        } else {
            self.out.event(Event::Replication(Step::Start));
            for round in 0..count {
                self.out.event(Event::Replication(Step::Advance(round)));
                self.walk(group)?;
            }
            self.out.event(Event::Replication(Step::Stop));
        }

        Ok(consumed + group.len())
    }

    /// Applies one operator, returning how many descriptors it spans.
    fn operator(&mut self, descriptor: Descriptor, rest: &[Descriptor]) -> Result<usize, Error> {
        let Descriptor { x, y, .. } = descriptor;
        match x {
            1 => self.modifier.width_bit = (y > 0).then(|| i32::from(y) - 128),
            2 => self.modifier.scale = (y > 0).then(|| i32::from(y) - 128),
            3 => {
                if y > 0 {
                    return self.new_references(u32::from(y), rest);
                }
                self.modifier.ref_val = None;
            }
            4 => {
                if y > 0 {
                    self.modifier.push_associated(u32::from(y));
                } else {
                    self.modifier.pop_associated();
                }
            }
            5 => {
                // Character literal carried in the data itself.
                let entry = TableEntry {
                    kind: EntryKind::String,
                    width: u32::from(y) * 8,
                    scale: 0,
                    reference: 0,
                    name: String::new(),
                    unit: String::new(),
                };
                let (values, _) = self.value(descriptor, &entry)?;
                self.out.event(Event::Meta {
                    name: descriptor.to_string(),
                    value: MetaValue::Values(values),
                });
            }
            6 => {
                // The following descriptor identifies a local element of the
                // signified width. Its bits are read untouched by modifiers
                // but reported as a plain number.
                let Some(&follower) = rest.first() else {
                    log::warn!("Local descriptor {descriptor} ends the descriptor list.");
                    return Ok(2);
                };
                let entry = TableEntry {
                    kind: EntryKind::Flag,
                    width: u32::from(y),
                    scale: 0,
                    reference: 0,
                    name: String::from("localDescriptor"),
                    unit: String::new(),
                };
                let (values, associated) = self.value(follower, &entry)?;
                self.out.event(Event::Value {
                    descriptor: follower,
                    entry: TableEntry {
                        kind: EntryKind::Long,
                        ..entry
                    },
                    values,
                    associated,
                });
                return Ok(2);
            }
            7 => {
                if y == 0 {
                    self.modifier.scale = None;
                    self.modifier.ref_mul = None;
                    self.modifier.width_bit = None;
                } else {
                    let y = i32::from(y);
                    self.modifier.scale = Some(y);
                    self.modifier.ref_mul = Some(pow10(y));
                    self.modifier.width_bit = Some((10 * y + 2) / 3);
                }
            }
            8 => self.modifier.width_char = (y > 0).then(|| u32::from(y) * 8),
            9 => self.modifier.ieee = (y > 0).then(|| u32::from(y)),
            _ => Err(Error::UnsupportedOperator(descriptor))?,
        }
        Ok(1)
    }

    /// Reads a block of new reference values, one signed-magnitude word per
    /// descriptor, ending at the 203255 terminator.
    fn new_references(&mut self, bits: u32, rest: &[Descriptor]) -> Result<usize, Error> {
        let mut references = BTreeMap::new();
        let mut consumed = 1;

        for &target in rest {
            consumed += 1;
            if target == NEW_REFERENCES_END {
                break;
            }
            let raw = self.raw_words(bits)?.first().copied().unwrap_or(0);
            let magnitude = (raw & ones(bits - 1)) as i64;
            let value = if raw >> (bits - 1) & 1 == 1 {
                -magnitude
            } else {
                magnitude
            };
            references.insert(target, value);
        }

        self.modifier.ref_val = Some(references);
        Ok(consumed)
    }
}
