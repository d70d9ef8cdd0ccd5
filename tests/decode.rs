use radiosonde::message::descriptor::Descriptor;
use radiosonde::message::{Error, decode};
use radiosonde::output::{Event, MetaValue, Step, Value};
use radiosonde::tables::{EntryKind, TableSet};

#[test]
fn subsets_decode_in_sequence() {
    let mut message = Message::new(&["001001"]);
    message.subsets = 2;
    message.data.push(10, 7);
    message.data.push(20, 7);
    let data = message.build();

    let mut events = Vec::new();
    let consumed = decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(consumed, data.len());

    let subsets: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::Subset { .. }))
        .collect();
    assert_eq!(
        subsets,
        [
            &Event::Subset {
                number: 1,
                compressed: false
            },
            &Event::Subset {
                number: 2,
                compressed: false
            },
        ]
    );
    assert_eq!(element_values(&events), [[Value::Number(10.0)], [Value::Number(20.0)]]);

    let codes = vec!["001001".parse::<Descriptor>().unwrap()];
    assert!(events.contains(&Event::Meta {
        name: String::from("unexpandedDescriptors"),
        value: MetaValue::Codes(codes),
    }));
    assert!(events.contains(&Event::Meta {
        name: String::from("observedData"),
        value: MetaValue::Number(1),
    }));
    assert!(events.contains(&Event::Meta {
        name: String::from("compressedData"),
        value: MetaValue::Number(0),
    }));
}

#[test]
fn all_ones_decodes_as_missing() {
    let mut message = Message::new(&["001001", "012001"]);
    message.data.push(127, 7);
    message.data.push(4095, 12);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Missing], [Value::Missing]]);
}

#[test]
fn width_and_scale_operators_modify_elements() {
    let mut message = Message::new(&["201132", "202129", "012001", "201000", "202000", "012001"]);
    message.data.push(4000, 16);
    message.data.push(3003, 12);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Number(30.0)], [Value::Number(200.3)]]);
}

#[test]
fn negative_widths_read_nothing() {
    let mut message = Message::new(&["201001", "012001", "201000", "012001"]);
    message.data.push(2000, 12);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Missing], [Value::Number(100.0)]]);
}

#[test]
fn new_reference_values_override_until_cancelled() {
    let descriptors = &[
        "203012", "010004", "012001", "203255", "010004", "012001", "203000", "010004",
    ];
    let mut message = Message::new(descriptors);
    // Sign-magnitude words: -100 for the pressure, zero for the temperature.
    message.data.push(1 << 11 | 100, 12);
    message.data.push(0, 12);
    message.data.push(500, 14);
    message.data.push(150, 12);
    message.data.push(500, 14);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [
        [Value::Number(4000.0)],
        [Value::Number(15.0)],
        [Value::Number(5000.0)],
    ]);
}

#[test]
fn associated_fields_attach_to_modifiable_elements() {
    let mut message = Message::new(&["204002", "031021", "012001", "204000", "012001"]);
    message.data.push(1, 6);
    message.data.push(3, 2);
    message.data.push(2000, 12);
    message.data.push(1500, 12);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    let fields: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::Value {
                values, associated, ..
            } => Some((values.clone(), associated.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(fields, [
        (vec![Value::Number(1.0)], vec![]),
        (vec![Value::Number(100.0)], vec![3]),
        (vec![Value::Number(50.0)], vec![]),
    ]);
}

#[test]
fn character_literals_emit_metadata() {
    let mut message = Message::new(&["205003", "001001"]);
    message.data.text("ABC");
    message.data.push(42, 7);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    assert!(events.contains(&Event::Meta {
        name: String::from("205003"),
        value: MetaValue::Values(vec![Value::Text(String::from("ABC"))]),
    }));
    assert_eq!(element_values(&events), [[Value::Number(42.0)]]);
}

#[test]
fn local_descriptors_decode_by_signified_width() {
    let mut message = Message::new(&["206010", "063250", "001001"]);
    message.data.push(777, 10);
    message.data.push(42, 7);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    let Some(Event::Value {
        descriptor,
        entry,
        values,
        ..
    }) = events
        .iter()
        .find(|event| matches!(event, Event::Value { .. }))
    else {
        panic!("no value event");
    };
    assert_eq!(*descriptor, "063250".parse().unwrap());
    assert_eq!(entry.name, "localDescriptor");
    assert_eq!(entry.kind, EntryKind::Long);
    assert_eq!(*values, [Value::Number(777.0)]);

    assert_eq!(element_values(&events).last().unwrap(), &[Value::Number(42.0)]);
}

#[test]
fn combined_modifier_scales_width_and_reference() {
    let mut message = Message::new(&["207002", "012001", "207000", "012001"]);
    message.data.push(500000, 19);
    message.data.push(2000, 12);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Number(400.0)], [Value::Number(100.0)]]);
}

#[test]
fn character_width_override_applies_to_strings() {
    let mut message = Message::new(&["208005", "001011", "208000", "001011", "001011"]);
    message.data.text("HELLO");
    message.data.text("SEA");
    message.data.push(0xffffff, 24);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [
        [Value::Text(String::from("HELLO"))],
        [Value::Text(String::from("SEA"))],
        [Value::Missing],
    ]);
}

#[test]
fn ieee_elements_decode_by_width() {
    let mut message = Message::new(&["209032", "012001", "209000", "012001"]);
    message.data.push(12.5f32.to_bits().into(), 32);
    message.data.push(2000, 12);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Number(12.5)], [Value::Number(100.0)]]);

    let mut message = Message::new(&["209064", "012001"]);
    message.data.push(13.25f64.to_bits(), 64);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Number(13.25)]]);

    let mut message = Message::new(&["209032", "012001"]);
    message.data.push(0x7f7f_ffff, 32);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Missing]]);
}

#[test]
fn unusable_ieee_width_degrades_to_missing() {
    let mut message = Message::new(&["209016", "012001", "209000", "012001"]);
    message.data.push(0xbeef, 16);
    message.data.push(2000, 12);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Missing], [Value::Number(100.0)]]);
}

#[test]
fn compressed_subsets_share_a_base_value() {
    let mut message = Message::new(&["012001"]);
    message.subsets = 3;
    message.compressed = true;
    message.data.push(2000, 12);
    message.data.push(0, 6);
    let data = message.build();

    let mut events = Vec::new();
    let consumed = decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(consumed, data.len());

    let subsets: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::Subset { .. }))
        .collect();
    assert_eq!(subsets, [&Event::Subset {
        number: 3,
        compressed: true
    }]);
    assert_eq!(element_values(&events), [vec![Value::Number(100.0); 3]]);
}

#[test]
fn compressed_increments_offset_the_base() {
    let mut message = Message::new(&["012001"]);
    message.subsets = 3;
    message.compressed = true;
    message.data.push(1500, 12);
    message.data.push(4, 6);
    for increment in [0, 5, 15] {
        message.data.push(increment, 4);
    }
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[
        Value::Number(50.0),
        Value::Number(50.5),
        Value::Number(51.5),
    ]]);
}

#[test]
fn compressed_strings_replace_the_base() {
    let mut message = Message::new(&["001011"]);
    message.subsets = 3;
    message.compressed = true;
    message.data.text("AAA");
    message.data.push(2, 6);
    for text in ["AB", "CD", "EF"] {
        message.data.text(text);
    }
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[
        Value::Text(String::from("AB")),
        Value::Text(String::from("CD")),
        Value::Text(String::from("EF")),
    ]]);

    let mut message = Message::new(&["001011"]);
    message.subsets = 3;
    message.compressed = true;
    message.data.text("SEA");
    message.data.push(0, 6);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [vec![Value::Text(String::from("SEA")); 3]]);
}

#[test]
fn compressed_missing_pattern_spans_subsets() {
    let mut message = Message::new(&["012001"]);
    message.subsets = 3;
    message.compressed = true;
    message.data.push(4095, 12);
    message.data.push(0, 6);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [vec![Value::Missing; 3]]);
}

#[test]
fn fixed_replication_repeats_the_group() {
    let mut message = Message::new(&["102003", "001001", "004004"]);
    for (block, hour) in [(10, 2), (20, 9), (30, 17)] {
        message.data.push(block, 7);
        message.data.push(hour, 5);
    }
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    assert_eq!(steps(&events), [
        Step::Start,
        Step::Advance(0),
        Step::Advance(1),
        Step::Advance(2),
        Step::Stop,
    ]);
    assert_eq!(element_values(&events), [
        [Value::Number(10.0)],
        [Value::Number(2.0)],
        [Value::Number(20.0)],
        [Value::Number(9.0)],
        [Value::Number(30.0)],
        [Value::Number(17.0)],
    ]);
}

#[test]
fn delayed_replication_reads_its_count() {
    let mut message = Message::new(&["101000", "031001", "001001"]);
    message.data.push(2, 8);
    message.data.push(42, 7);
    message.data.push(99, 7);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    assert_eq!(steps(&events), [
        Step::Start,
        Step::Advance(0),
        Step::Advance(1),
        Step::Stop,
    ]);
    // The counter itself is not reported.
    assert_eq!(element_values(&events), [[Value::Number(42.0)], [Value::Number(99.0)]]);
}

#[test]
fn zero_count_replication_skips_the_group() {
    let mut message = Message::new(&["101000", "031001", "001001"]);
    message.data.push(0, 8);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    assert_eq!(steps(&events), [Step::Skip]);
    assert!(element_values(&events).is_empty());
}

#[test]
fn replication_counts_are_exempt_from_missing() {
    let mut message = Message::new(&["101000", "031001", "001001"]);
    message.data.push(255, 8);
    for i in 0..255 {
        message.data.push(i % 100, 7);
    }
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events).len(), 255);
}

#[test]
fn sequences_expand_in_place() {
    let mut message = Message::new(&["301002"]);
    message.data.push(10, 7);
    message.data.push(2, 5);
    message.data.push(2000, 12);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    let descriptors: Vec<Descriptor> = events
        .iter()
        .filter_map(|event| match event {
            Event::Value { descriptor, .. } => Some(*descriptor),
            _ => None,
        })
        .collect();
    let expected: Vec<Descriptor> = ["001001", "004004", "012001"]
        .iter()
        .map(|code| code.parse().unwrap())
        .collect();
    assert_eq!(descriptors, expected);
}

#[test]
fn filler_descriptors_are_ignored() {
    let mut message = Message::new(&["000000", "001001", "000000"]);
    message.data.push(42, 7);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(element_values(&events), [[Value::Number(42.0)]]);
}

#[test]
fn descriptor_section_padding_reads_as_a_filler() {
    let mut message = Message::new(&["001001", "004004"]);
    message.section3_pad = true;
    message.data.push(42, 7);
    message.data.push(17, 5);
    let data = message.build();

    let mut events = Vec::new();
    let consumed = decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(consumed, data.len());

    // The declared length governs the descriptor walk, so the final read
    // straddles the pad octet and comes out as a filler.
    let codes: Vec<Descriptor> = ["001001", "004004", "000000"]
        .iter()
        .map(|code| code.parse().unwrap())
        .collect();
    assert!(events.contains(&Event::Meta {
        name: String::from("unexpandedDescriptors"),
        value: MetaValue::Codes(codes),
    }));
    assert_eq!(element_values(&events), [[Value::Number(42.0)], [Value::Number(17.0)]]);
}

#[test]
fn section_two_passes_through() {
    let mut message = Message::new(&["001001"]);
    message.section2 = Some(vec![0x00, b'd', b'a', b't', b'a', 0xff]);
    message.data.push(42, 7);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    assert!(events.contains(&Event::Meta {
        name: String::from("section2"),
        value: MetaValue::Bytes(vec![0x00, b'd', b'a', b't', b'a', 0xff]),
    }));
}

#[test]
fn local_tables_overlay_the_master_set() {
    let mut message = Message::new(&["001001"]);
    message.local_version = 5;
    message.data.push(42, 7);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();

    let Some(Event::Value { entry, .. }) = events
        .iter()
        .find(|event| matches!(event, Event::Value { .. }))
    else {
        panic!("no value event");
    };
    assert_eq!(entry.name, "localBlockNumber");
}

#[test]
fn missing_local_tables_abort_early() {
    let mut message = Message::new(&["001001"]);
    message.local_version = 9;
    message.data.push(42, 7);
    let data = message.build();

    let mut events = Vec::new();
    let error = decode(&data, &tables(), &mut events).unwrap_err();

    let Error::MissingLocalTable(key) = error else {
        panic!("expected a missing table, got {error:?}");
    };
    assert_eq!(key, "9/78/0");
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::Subset { .. } | Event::Value { .. }))
    );
}

#[test]
fn corrupt_magic_is_rejected() {
    let mut message = Message::new(&["001001"]);
    message.data.push(42, 7);
    let mut data = message.build();
    data[0] = b'X';

    let mut events = Vec::new();
    let error = decode(&data, &tables(), &mut events).unwrap_err();
    assert!(matches!(error, Error::BadMagic));
    assert!(events.is_empty());
}

#[test]
fn corrupt_trailer_is_rejected() {
    let mut message = Message::new(&["001001"]);
    message.data.push(42, 7);
    let mut data = message.build();
    let len = data.len();
    data[len - 4..].copy_from_slice(b"XXXX");

    let error = decode(&data, &tables(), &mut Vec::new()).unwrap_err();
    let Error::BadTrailer {
        found,
        expected,
        actual,
    } = error
    else {
        panic!("expected a trailer failure, got {error:?}");
    };
    assert_eq!(found, "XXXX");
    assert_eq!(expected, len - 4);
    assert_eq!(actual, len - 4);
}

#[test]
fn truncated_data_is_rejected() {
    let mut message = Message::new(&["001001"]);
    message.data.push(42, 7);
    let data = message.build();

    let error = decode(&data[..20], &tables(), &mut Vec::new()).unwrap_err();
    assert!(matches!(error, Error::Truncated(_)));
}

#[test]
fn unsupported_editions_are_rejected() {
    let mut message = Message::new(&["001001"]);
    message.edition = 2;
    message.data.push(42, 7);
    let data = message.build();

    let error = decode(&data, &tables(), &mut Vec::new()).unwrap_err();
    assert!(matches!(error, Error::UnsupportedEdition(2)));
}

#[test]
fn unknown_descriptors_are_rejected() {
    let mut message = Message::new(&["063111"]);
    message.data.push(42, 7);
    let data = message.build();

    let error = decode(&data, &tables(), &mut Vec::new()).unwrap_err();
    let Error::UnknownDescriptor(descriptor) = error else {
        panic!("expected an unknown descriptor, got {error:?}");
    };
    assert_eq!(descriptor, "063111".parse().unwrap());
}

#[test]
fn unknown_operators_are_rejected() {
    let mut message = Message::new(&["210001", "001001"]);
    message.data.push(42, 7);
    let data = message.build();

    let error = decode(&data, &tables(), &mut Vec::new()).unwrap_err();
    let Error::UnsupportedOperator(descriptor) = error else {
        panic!("expected an unsupported operator, got {error:?}");
    };
    assert_eq!(descriptor, "210001".parse().unwrap());
}

#[test]
fn edition_three_headers_reorder_and_window() {
    let mut message = Message::new(&["001001"]);
    message.edition = 3;
    message.year = 99;
    message.data.push(42, 7);
    let data = message.build();

    let mut events = Vec::new();
    let consumed = decode(&data, &tables(), &mut events).unwrap();
    assert_eq!(consumed, data.len());

    let names: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            Event::Meta { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    let sub_centre = names.iter().position(|n| *n == "bufrHeaderSubCentre").unwrap();
    let centre = names.iter().position(|n| *n == "bufrHeaderCentre").unwrap();
    assert!(sub_centre < centre);
    assert!(!names.contains(&"typicalSecond"));
    assert!(!names.contains(&"internationalDataSubCategory"));

    assert!(events.contains(&Event::Meta {
        name: String::from("typicalYear"),
        value: MetaValue::Number(1999),
    }));

    let mut message = Message::new(&["001001"]);
    message.edition = 3;
    message.year = 7;
    message.data.push(42, 7);
    let data = message.build();

    let mut events = Vec::new();
    decode(&data, &tables(), &mut events).unwrap();
    assert!(events.contains(&Event::Meta {
        name: String::from("typicalYear"),
        value: MetaValue::Number(2007),
    }));
}

/// Tables for the descriptors the synthetic messages use.
fn tables() -> TableSet {
    TableSet::from_json(
        r#"{
          "wmo": {
            "elements": {
              "001001": {"type": "long", "width": 7, "snam": "wmoBlockNumber", "unit": "Numeric"},
              "001011": {"type": "string", "width": 24, "snam": "shipOrMobileLandStationIdentifier", "unit": "CCITT IA5"},
              "004004": {"type": "long", "width": 5, "snam": "hour", "unit": "h"},
              "010004": {"type": "double", "width": 14, "scale": -1, "snam": "pressure", "unit": "Pa"},
              "012001": {"type": "double", "width": 12, "scale": 1, "ref": -1000, "snam": "airTemperature", "unit": "K"},
              "031001": {"type": "long", "width": 8, "snam": "delayedDescriptorReplicationFactor", "unit": "Numeric"},
              "031021": {"type": "long", "width": 6, "snam": "associatedFieldSignificance", "unit": "CODE TABLE"}
            },
            "sequence": {
              "301001": ["001001", "004004"],
              "301002": ["301001", "012001"]
            }
          },
          "local": {
            "5/78/0": {
              "elements": {
                "001001": {"type": "long", "width": 7, "snam": "localBlockNumber", "unit": "Numeric"}
              }
            }
          }
        }"#,
    )
    .unwrap()
}

/// A big-endian bit accumulator for hand-assembling data sections.
#[derive(Default)]
struct Bits {
    octets: Vec<u8>,
    length: usize,
}

impl Bits {
    fn push(&mut self, value: u64, width: u32) {
        for i in (0..width).rev() {
            if self.length % 8 == 0 {
                self.octets.push(0);
            }
            let bit = (value >> i & 1) as u8;
            *self.octets.last_mut().unwrap() |= bit << (7 - self.length % 8);
            self.length += 1;
        }
    }

    fn text(&mut self, text: &str) {
        for c in text.chars() {
            self.push(c as u64, 8);
        }
    }
}

/// An edition-4 single-subset message by default; the data section is
/// hand-assembled through [`Bits`].
struct Message {
    edition: u8,
    centre: u16,
    sub_centre: u16,
    local_version: u8,
    /// Two-digit year, for edition 3 only.
    year: u8,
    subsets: u16,
    compressed: bool,
    section2: Option<Vec<u8>>,
    /// Declare one pad octet after the descriptors.
    section3_pad: bool,
    descriptors: Vec<Descriptor>,
    data: Bits,
}

impl Message {
    fn new(descriptors: &[&str]) -> Self {
        Self {
            edition: 4,
            centre: 78,
            sub_centre: 0,
            local_version: 0,
            year: 99,
            subsets: 1,
            compressed: false,
            section2: None,
            section3_pad: false,
            descriptors: descriptors
                .iter()
                .map(|code| code.parse().unwrap())
                .collect(),
            data: Bits::default(),
        }
    }

    fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"BUFR");
        buf.extend_from_slice(&[0, 0, 0]); // Total length, patched below.
        buf.push(self.edition);

        let section2 = u8::from(self.section2.is_some()) << 7;
        if self.edition == 3 {
            push_u24(&mut buf, 18);
            buf.push(0); // Master table.
            buf.push(self.sub_centre as u8);
            buf.push(self.centre as u8);
            buf.push(0); // Update sequence number.
            buf.push(section2);
            buf.push(1); // Data category.
            buf.push(0); // Data sub-category.
            buf.push(34); // Master table version.
            buf.push(self.local_version);
            buf.push(self.year);
            buf.extend_from_slice(&[1, 10, 14, 30]);
            buf.push(0); // Padding within the declared length.
        } else {
            push_u24(&mut buf, 22);
            buf.push(0);
            buf.extend_from_slice(&self.centre.to_be_bytes());
            buf.extend_from_slice(&self.sub_centre.to_be_bytes());
            buf.push(0);
            buf.push(section2);
            buf.push(1);
            buf.push(0);
            buf.push(0);
            buf.push(34);
            buf.push(self.local_version);
            buf.extend_from_slice(&2023u16.to_be_bytes());
            buf.extend_from_slice(&[1, 10, 14, 30, 0]);
        }

        if let Some(content) = &self.section2 {
            push_u24(&mut buf, 4 + content.len() as u32);
            buf.push(0);
            buf.extend_from_slice(content);
        }

        push_u24(
            &mut buf,
            7 + 2 * self.descriptors.len() as u32 + u32::from(self.section3_pad),
        );
        buf.push(0);
        buf.extend_from_slice(&self.subsets.to_be_bytes());
        buf.push(0b1000_0000 | u8::from(self.compressed) << 6);
        for descriptor in &self.descriptors {
            let word = u16::from(descriptor.f) << 14
                | u16::from(descriptor.x) << 8
                | u16::from(descriptor.y);
            buf.extend_from_slice(&word.to_be_bytes());
        }
        if self.section3_pad {
            buf.push(0);
        }

        // Editions before 4 round each subset up to an even octet.
        let mut content = self.data.octets.clone();
        if self.edition < 4 && (buf.len() + 4 + content.len()) % 2 == 1 {
            content.push(0);
        }
        push_u24(&mut buf, 4 + content.len() as u32);
        buf.push(0);
        buf.extend_from_slice(&content);

        buf.extend_from_slice(b"7777");

        let total = (buf.len() as u32).to_be_bytes();
        buf[4..7].copy_from_slice(&total[1..]);
        buf
    }
}

fn push_u24(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes()[1..]);
}

/// The values of each value event, in order.
fn element_values(events: &[Event]) -> Vec<Vec<Value>> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Value { values, .. } => Some(values.clone()),
            _ => None,
        })
        .collect()
}

/// The replication steps, in order.
fn steps(events: &[Event]) -> Vec<Step> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Replication(step) => Some(*step),
            _ => None,
        })
        .collect()
}
