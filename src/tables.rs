//! Decoding tables, loaded from their JSON form.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use serde::Deserialize;
use thiserror::Error;

#[cfg(feature = "std")]
extern crate std;

use crate::message::descriptor::Descriptor;

/// A failure loading a table set.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Kind of value an element descriptor denotes.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// An integer under scale and reference.
    Long,
    /// A floating-point number under scale and reference.
    Double,
    /// Character data, one octet per character.
    String,
    /// A code looked up in a code table.
    Table,
    /// A bit mask labelled by a flag table.
    Flag,
}

/// Decoding parameters of one element descriptor.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TableEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Data width in bits.
    pub width: u32,
    /// Power of ten dividing the referenced value.
    #[serde(default)]
    pub scale: i32,
    /// Offset added to the raw value before scaling.
    #[serde(default, rename = "ref")]
    pub reference: i64,
    /// Short name of the element.
    #[serde(rename = "snam")]
    pub name: String,
    /// Unit of the scaled value.
    #[serde(default)]
    pub unit: String,
}

/// One table namespace: element parameters, sequence expansions, and the
/// labels of code and flag tables.
#[derive(Debug, Default, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub elements: BTreeMap<Descriptor, TableEntry>,
    #[serde(default, rename = "sequence")]
    pub sequences: BTreeMap<Descriptor, Vec<Descriptor>>,
    #[serde(default, rename = "codetables")]
    pub labels: BTreeMap<Descriptor, BTreeMap<u64, String>>,
}

/// The tables messages decode against: the master namespace and any number
/// of local overlays keyed by `"{version}/{centre}/{subCentre}"`.
#[derive(Debug, Default, Deserialize)]
pub struct TableSet {
    #[serde(default)]
    pub wmo: Tables,
    #[serde(default)]
    pub local: BTreeMap<String, Tables>,
}

impl TableSet {
    /// Parses a table set from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a table set from a JSON file.
    #[cfg(feature = "std")]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }

    /// The master tables alone.
    pub fn master(&self) -> TableView<'_> {
        TableView {
            master: &self.wmo,
            local: None,
        }
    }

    /// The master tables overlaid by the named local set, if present.
    pub fn overlaid(&self, key: &str) -> Option<TableView<'_>> {
        Some(TableView {
            master: &self.wmo,
            local: Some(self.local.get(key)?),
        })
    }
}

/// A lookup view of the tables in force for one message.
///
/// Local entries shadow master entries one by one; neither set is modified.
#[derive(Clone, Copy, Debug)]
pub struct TableView<'t> {
    master: &'t Tables,
    local: Option<&'t Tables>,
}

impl<'t> TableView<'t> {
    /// Looks up the decoding parameters of an element descriptor.
    pub fn element(&self, descriptor: Descriptor) -> Option<&'t TableEntry> {
        self.lookup(|tables| tables.elements.get(&descriptor))
    }

    /// Looks up the expansion of a sequence descriptor.
    pub fn sequence(&self, descriptor: Descriptor) -> Option<&'t [Descriptor]> {
        self.lookup(|tables| tables.sequences.get(&descriptor))
            .map(Vec::as_slice)
    }

    /// Looks up the labels of a code or flag table.
    pub fn labels(&self, descriptor: Descriptor) -> Option<&'t BTreeMap<u64, String>> {
        self.lookup(|tables| tables.labels.get(&descriptor))
    }

    fn lookup<T>(&self, get: impl Fn(&'t Tables) -> Option<&'t T>) -> Option<&'t T> {
        self.local
            .and_then(|tables| get(tables))
            .or_else(|| get(self.master))
    }
}
