//! Decoding of complete messages into an event stream.

pub mod descriptor;
mod interpret;
mod modifier;
pub mod reader;
mod section;
mod value;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

use crate::output::{Event, FromEvents, MetaValue};
use crate::tables::{TableSet, TableView};

use descriptor::Descriptor;
use modifier::Modifier;
use reader::{BitReader, Truncated};

/// A failure decoding a message.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Truncated(#[from] Truncated),
    /// The data does not begin with the opening `BUFR` marker.
    #[error("Data does not begin a message.")]
    BadMagic,
    /// Decoding did not end at the closing `7777` marker.
    #[error("Message ends with {found:?} at octet {actual}, expecting the closing marker at {expected}.")]
    BadTrailer {
        found: String,
        expected: usize,
        actual: usize,
    },
    /// The indicator section names an edition other than 3 or 4.
    #[error("Edition {0} is not supported.")]
    UnsupportedEdition(u8),
    /// The message calls for a local table the table set does not hold.
    #[error("Required local table {0:?} is not available.")]
    MissingLocalTable(String),
    /// A descriptor has no entry in the tables in force.
    #[error("No table entry for descriptor {0}.")]
    UnknownDescriptor(Descriptor),
    /// An operator descriptor of an unknown category.
    #[error("Operator {0} is not supported.")]
    UnsupportedOperator(Descriptor),
}

/// Decodes one complete message, emitting events to `out`.
///
/// Returns the number of octets consumed, including the closing marker.
pub fn decode<O: FromEvents>(data: &[u8], tables: &TableSet, out: &mut O) -> Result<usize, Error> {
    Decoder {
        reader: BitReader::new(data),
        set: tables,
        tables: tables.master(),
        out,
        modifier: Modifier::new(),
        edition: 0,
        subsets: 0,
        compressed: false,
        collected: BTreeMap::new(),
    }
    .run()
}

/// Working state of one message decode.
struct Decoder<'d, 't, 'o, O> {
    reader: BitReader<'d>,
    set: &'t TableSet,
    tables: TableView<'t>,
    out: &'o mut O,
    modifier: Modifier,
    edition: u8,
    subsets: u64,
    compressed: bool,
    /// Header fields decoded so far, for diagnostics on failure.
    collected: BTreeMap<String, u64>,
}

impl<O: FromEvents> Decoder<'_, '_, '_, O> {
    fn run(mut self) -> Result<usize, Error> {
        // Section 0, the indicator. The declared total length is not held
        // against the data.
        let (magic, _, edition) = section::indicator(self.reader.take()?);
        if &magic != b"BUFR" {
            Err(Error::BadMagic)?;
        }
        self.edition = edition;
        self.meta("bufrEdition", edition.into());
        let mut end = 8;

        // Section 1, identification. Its declared length governs where the
        // next section starts, leaving room for fields beyond the fixed part.
        let identification = match edition {
            3 => section::identification_v3(self.reader.take()?),
            4 => section::identification_v4(self.reader.take()?),
            _ => Err(Error::UnsupportedEdition(edition))?,
        };
        end += identification.length as usize;
        self.identification(&identification);
        self.reader.reset_to(end)?;

        if identification.local_version > 0 {
            let key = format!(
                "{}/{}/{}",
                identification.local_version, identification.centre, identification.sub_centre
            );
            let Some(overlaid) = self.set.overlaid(&key) else {
                Err(Error::MissingLocalTable(key))?
            };
            self.tables = overlaid;
        }

        // Section 2 carries local content, passed through uninterpreted.
        if identification.has_section2 {
            let length = section::length(self.reader.take()?) as usize;
            end += length;
            let content = self.reader.bytes(length.saturating_sub(4))?;
            self.out.event(Event::Meta {
                name: String::from("section2"),
                value: MetaValue::Bytes(content),
            });
        }

        // Section 3, the data description.
        let (length, subsets, observed, compressed) = section::description(self.reader.take()?);
        end += length as usize;
        self.subsets = subsets.into();
        self.compressed = compressed;
        self.meta("numberOfSubsets", subsets.into());
        self.meta("observedData", observed.into());
        self.meta("compressedData", compressed.into());

        let mut codes = Vec::new();
        while self.reader.offset() < end * 8 {
            codes.push(Descriptor::read(&mut self.reader)?);
        }
        self.out.event(Event::Meta {
            name: String::from("unexpandedDescriptors"),
            value: MetaValue::Codes(codes.clone()),
        });
        self.reader.reset_to(end)?;

        // Section 4, the data itself. Compressed data interleaves all subsets
        // in one pass, otherwise the descriptors repeat per subset.
        let length = section::length(self.reader.take()?);
        end += length as usize;

        if self.compressed {
            self.out.event(Event::Subset {
                number: self.subsets,
                compressed: true,
            });
            self.walk(&codes)?;
            if self.edition < 4 {
                self.reader.align_even()?;
            }
        } else {
            for number in 1..=self.subsets {
                self.out.event(Event::Subset {
                    number,
                    compressed: false,
                });
                self.walk(&codes)?;
                if self.edition < 4 {
                    self.reader.align_even()?;
                }
            }
        }
        self.reader.align()?;

        // Section 5, the closing marker.
        let actual = self.reader.offset() / 8;
        let found = self.reader.read_text(4)?;
        if found != "7777" {
            log::error!("Header of the failing message: {:?}.", self.collected);
            Err(Error::BadTrailer {
                found,
                expected: end,
                actual,
            })?;
        }

        Ok(self.reader.offset() / 8)
    }

    /// Emits the identification fields in their wire order, which differs
    /// between editions.
    fn identification(&mut self, id: &section::Identification) {
        self.meta("masterTableNumber", id.master_table.into());
        if self.edition < 4 {
            self.meta("bufrHeaderSubCentre", id.sub_centre.into());
            self.meta("bufrHeaderCentre", id.centre.into());
        } else {
            self.meta("bufrHeaderCentre", id.centre.into());
            self.meta("bufrHeaderSubCentre", id.sub_centre.into());
        }
        self.meta("updateSequenceNumber", id.update_sequence.into());
        self.meta("section2present", id.has_section2.into());
        self.meta("dataCategory", id.category.into());
        if let Some(international) = id.international_sub_category {
            self.meta("internationalDataSubCategory", international.into());
        }
        self.meta("dataSubCategory", id.sub_category.into());
        self.meta("masterTablesVersionNumber", id.master_version.into());
        self.meta("localTablesVersionNumber", id.local_version.into());
        self.meta("typicalYear", id.year.into());
        self.meta("typicalMonth", id.month.into());
        self.meta("typicalDay", id.day.into());
        self.meta("typicalHour", id.hour.into());
        self.meta("typicalMinute", id.minute.into());
        if let Some(second) = id.second {
            self.meta("typicalSecond", second.into());
        }
    }

    /// Emits a numeric header field, keeping a copy for diagnostics.
    fn meta(&mut self, name: &str, value: u64) {
        self.collected.insert(String::from(name), value);
        self.out.event(Event::Meta {
            name: String::from(name),
            value: MetaValue::Number(value),
        });
    }
}
