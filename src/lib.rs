#![no_std]

//! A decoder for WMO FM94 BUFR meteorological messages.
//!
//! Radiosonde walks a message's descriptor list against a set of decoding
//! tables and emits a flat stream of events, leaving presentation to an
//! interchangeable sink. Two renderers are included: an aligned plain-text
//! listing, and a JSON serialization accumulating observation state frame by
//! frame.
//!
//! Most users should begin with [`message::decode`], feeding it a
//! [`TableSet`](tables::TableSet) and one of the sinks in the [`output`]
//! module.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable the renderers and file-backed table loading (default).
//! - `cli`: build the command-line frontend.

extern crate alloc;

pub mod message;
pub mod output;
pub mod tables;
