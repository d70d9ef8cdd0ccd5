//! JSON rendering of the event stream as state frames.
//!
//! Values land in frames under the ambient observation state: every class
//! 0 element below category 10 updates the state rather than the values,
//! and the date and time elements among them drive a synthetic clock whose
//! epoch seconds appear as the `time` state key.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::ser::PrettyFormatter;

use crate::message::descriptor::Descriptor;
use crate::output::{Event, FromEvents, Step, Value};

/// One output frame: the ambient state and the values read under it.
#[derive(Clone, Debug, Serialize)]
pub struct Frame {
    pub state: State,
    pub values: Vec<Row>,
}

/// One value row of a frame.
#[derive(Clone, Debug, Serialize)]
pub struct Row {
    pub desc: Descriptor,
    pub snam: String,
    pub value: Vec<Value>,
    pub assoc: Vec<u64>,
}

/// State carried between frames: the clock fields and the element values
/// keyed by name, in the order they were first set.
#[derive(Clone, Debug, Default)]
pub struct State {
    pub time: f64,
    pub time_increment: f64,
    entries: Vec<(String, Vec<Value>)>,
}

impl State {
    /// The values under a key, if set.
    pub fn get(&self, key: &str) -> Option<&[Value]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Sets a key, or removes it when every value is missing.
    fn put(&mut self, key: &str, values: Vec<Value>) {
        if values.iter().all(|value| *value == Value::Missing) {
            self.entries.retain(|(k, _)| k != key);
        } else if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = values;
        } else {
            self.entries.push((String::from(key), values));
        }
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 2))?;
        map.serialize_entry("time", &Value::Number(self.time))?;
        map.serialize_entry("time_increment", &Value::Number(self.time_increment))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

/// Renders the event stream as a list of state frames.
pub struct JsonWriter {
    clock: DateTime,
    frames: Vec<Frame>,
}

impl JsonWriter {
    /// Returns a writer whose clock starts at the current time.
    pub fn new() -> Self {
        Self::with_base(Timestamp::now())
    }

    /// Returns a writer whose clock starts at the given instant, its
    /// seconds zeroed. Messages carrying a complete set of date and time
    /// elements overwrite the clock entirely.
    pub fn with_base(base: Timestamp) -> Self {
        let at = TimeZone::UTC.to_datetime(base);
        Self {
            clock: at.date().at(at.hour(), at.minute(), 0, 0),
            frames: vec![Frame {
                state: State::default(),
                values: Vec::new(),
            }],
        }
    }

    /// The accumulated frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The accumulated frames as pretty-printed JSON, one-space indented.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        self.frames.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Applies a state change, starting a fresh frame when the current one
    /// already carries values.
    fn state_update(&mut self, change: impl FnOnce(&mut State)) {
        let Some(last) = self.frames.last_mut() else {
            return;
        };
        if last.values.is_empty() {
            change(&mut last.state);
        } else {
            let mut state = last.state.clone();
            change(&mut state);
            self.frames.push(Frame {
                state,
                values: Vec::new(),
            });
        }
    }

    /// Sets one component of the clock, dropping values the calendar
    /// rejects.
    fn set_clock(&mut self, descriptor: Descriptor, value: Option<&Value>) {
        let Some(Value::Number(component)) = value else {
            log::debug!("Time component {descriptor} is missing, keeping the clock.");
            return;
        };
        let with = self.clock.with();
        let with = match descriptor.y {
            1 => with.year(*component as i16),
            2 => with.month(*component as i8),
            3 => with.day(*component as i8),
            4 => with.hour(*component as i8),
            5 => with.minute(*component as i8),
            _ => with.second(*component as i8),
        };
        match with.build() {
            Ok(clock) => {
                self.clock = clock;
                let time = epoch(clock) as f64;
                self.state_update(|state| state.time = time);
            }
            Err(error) => {
                log::debug!("Time component {descriptor} of {component} dropped: {error}.");
            }
        }
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FromEvents for JsonWriter {
    fn event(&mut self, event: Event) {
        match event {
            Event::Value {
                descriptor,
                entry,
                values,
                associated,
            } => {
                if descriptor.f == 0 && descriptor.x < 10 {
                    if descriptor.x == 4 && (1..=6).contains(&descriptor.y) {
                        self.set_clock(descriptor, values.first());
                    } else if let Some(unit) = increment_unit(descriptor) {
                        let step = match values.first() {
                            Some(Value::Number(n)) => n * unit,
                            _ => 0.0,
                        };
                        self.state_update(|state| {
                            state.time_increment = step;
                            state.time += step;
                        });
                    } else {
                        self.state_update(|state| state.put(&entry.name, values));
                    }
                } else if let Some(last) = self.frames.last_mut() {
                    last.values.push(Row {
                        desc: descriptor,
                        snam: entry.name,
                        value: values,
                        assoc: associated,
                    });
                }
            }
            Event::Replication(Step::Advance(round)) => {
                let Some(last) = self.frames.last() else {
                    return;
                };
                if last.state.time_increment != 0.0 {
                    let mut state = last.state.clone();
                    if round > 0 {
                        state.time += state.time_increment;
                    }
                    self.frames.push(Frame {
                        state,
                        values: Vec::new(),
                    });
                }
            }
            Event::Replication(Step::Stop | Step::Skip) => {
                if let Some(last) = self.frames.last_mut() {
                    last.state.time_increment = 0.0;
                }
            }
            Event::Replication(Step::Start) | Event::Meta { .. } | Event::Subset { .. } => {}
        }
    }
}

/// Seconds one unit of a time-increment element stands for.
fn increment_unit(descriptor: Descriptor) -> Option<f64> {
    match (descriptor.x, descriptor.y) {
        (4, 13) => Some(86400.0),
        (4, 14) => Some(3600.0),
        (4, 15) => Some(60.0),
        (4, 16) => Some(1.0),
        (4, 65) => Some(60.0),
        (4, 66) => Some(1.0),
        _ => None,
    }
}

/// The clock as whole seconds since the epoch.
fn epoch(clock: DateTime) -> i64 {
    TimeZone::UTC
        .to_timestamp(clock)
        .map(|timestamp| timestamp.as_second())
        .unwrap_or_default()
}
