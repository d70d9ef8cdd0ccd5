//! Line-oriented text rendering of the event stream.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::message::descriptor::Descriptor;
use crate::output::{Event, FromEvents, MetaValue, Step, Value};
use crate::tables::{EntryKind, TableEntry, TableSet, TableView};

/// Units that name an encoding rather than a measure, left off value lines.
const UNITLESS: [&str; 3] = ["CCITT IA5", "CODE TABLE", "FLAG TABLE"];

/// Renders the event stream as aligned text lines.
///
/// Code and flag values are replaced by their table labels, so the writer
/// needs the table set the message is decoded against.
pub struct TextWriter<'t> {
    set: &'t TableSet,
    view: Option<TableView<'t>>,
    local_version: u64,
    centre: u64,
    sub_centre: u64,
    lines: Vec<String>,
}

impl<'t> TextWriter<'t> {
    /// Returns a writer rendering against the given tables.
    pub fn new(set: &'t TableSet) -> Self {
        Self {
            set,
            view: None,
            local_version: 0,
            centre: 0,
            sub_centre: 0,
            lines: Vec::new(),
        }
    }

    /// The rendered lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// The tables in force, resolved once the header has named any local
    /// overlay.
    fn view(&mut self) -> TableView<'t> {
        if let Some(view) = self.view {
            return view;
        }
        let view = if self.local_version > 0 {
            let key = format!("{}/{}/{}", self.local_version, self.centre, self.sub_centre);
            self.set
                .overlaid(&key)
                .unwrap_or_else(|| self.set.master())
        } else {
            self.set.master()
        };
        self.view = Some(view);
        view
    }

    /// Label of a code value. Without a code table the value cannot be
    /// rendered at all; with one, an unlabelled value is left empty.
    fn code(&mut self, descriptor: Descriptor, value: f64) -> String {
        let Some(labels) = self.view().labels(descriptor) else {
            return String::from("MISSING");
        };
        labels.get(&(value as u64)).cloned().unwrap_or_default()
    }

    /// Labels of the set bits of a flag value, joined by `|`. Bits count
    /// from one at the most significant position.
    fn flags(&mut self, descriptor: Descriptor, width: u32, value: f64) -> String {
        let value = value as u64;
        let Some(labels) = self.view().labels(descriptor) else {
            return String::new();
        };
        let mut found = Vec::new();
        for (&bit, label) in labels {
            if (1..=u64::from(width)).contains(&bit) && value & 1 << (u64::from(width) - bit) != 0 {
                found.push(label.as_str());
            }
        }
        found.join("|")
    }

    /// The value column: per-subset values joined by commas, code and flag
    /// values through their labels.
    fn cell(&mut self, descriptor: Descriptor, entry: &TableEntry, values: &[Value]) -> String {
        let mapped: Vec<String> = values
            .iter()
            .map(|value| match (entry.kind, value) {
                (_, Value::Missing) => String::from("MISSING"),
                (EntryKind::Table, Value::Number(n)) => self.code(descriptor, *n),
                (EntryKind::Flag, Value::Number(n)) => self.flags(descriptor, entry.width, *n),
                (_, value) => value.to_string(),
            })
            .collect();
        mapped.join(",")
    }
}

impl FromEvents for TextWriter<'_> {
    fn event(&mut self, event: Event) {
        match event {
            Event::Meta { name, value } => {
                match (name.as_str(), &value) {
                    ("localTablesVersionNumber", MetaValue::Number(n)) => self.local_version = *n,
                    ("bufrHeaderCentre", MetaValue::Number(n)) => self.centre = *n,
                    ("bufrHeaderSubCentre", MetaValue::Number(n)) => self.sub_centre = *n,
                    _ => {}
                }
                self.lines
                    .push(format!("{:<57} = {:>10}", name, meta_cell(&value)));
            }
            Event::Subset { number, compressed } => {
                let caption = if compressed {
                    format!(" SUBSETS: {number} ")
                } else {
                    format!(" SUBSET {number} ")
                };
                self.lines.push(banner(&caption));
            }
            Event::Value {
                descriptor,
                entry,
                values,
                associated,
            } => {
                let cell = self.cell(descriptor, &entry, &values);
                let unit = if entry.unit.is_empty() || UNITLESS.contains(&entry.unit.as_str()) {
                    String::new()
                } else {
                    format!("[{}]", entry.unit)
                };
                let assoc = if associated.is_empty() {
                    String::new()
                } else {
                    let list: Vec<String> = associated.iter().map(ToString::to_string).collect();
                    format!("Q:{}", list.join(","))
                };
                self.lines.push(format!(
                    "{:>6} {:<50} = {:>10} {:<5} {:>3}",
                    descriptor.to_string(),
                    entry.name,
                    cell,
                    unit,
                    assoc,
                ));
            }
            Event::Replication(step) => self.lines.push(match step {
                Step::Start => String::from("replication start"),
                Step::Advance(round) => format!("replication advance {round}"),
                Step::Stop => String::from("replication stop"),
                Step::Skip => String::from("replication skip"),
            }),
        }
    }
}

/// A subset caption pushed out to column forty by `=` fill, the whole line
/// then padded with more fill to eighty columns.
fn banner(caption: &str) -> String {
    let mut line = "=".repeat(40_usize.saturating_sub(caption.len()));
    line.push_str(caption);
    line.push_str(&"=".repeat(80_usize.saturating_sub(line.len())));
    line
}

fn meta_cell(value: &MetaValue) -> String {
    match value {
        MetaValue::Number(n) => n.to_string(),
        MetaValue::Codes(codes) => {
            let codes: Vec<String> = codes.iter().map(ToString::to_string).collect();
            codes.join(",")
        }
        MetaValue::Bytes(bytes) => uri(bytes),
        MetaValue::Values(values) => {
            let values: Vec<String> = values
                .iter()
                .map(|value| match value {
                    Value::Missing => String::new(),
                    value => value.to_string(),
                })
                .collect();
            values.join(",")
        }
    }
}

/// Percent-encodes section content, bytes beyond ASCII first widening to
/// their two-octet form.
fn uri(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for &octet in bytes {
        if octet.is_ascii_alphanumeric() || b";,/?:@&=+$-_.!~*'()#".contains(&octet) {
            text.push(char::from(octet));
        } else {
            let mut buf = [0; 2];
            for encoded in char::from(octet).encode_utf8(&mut buf).bytes() {
                text.push_str(&format!("%{encoded:02X}"));
            }
        }
    }
    text
}
