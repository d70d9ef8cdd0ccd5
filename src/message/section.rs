//! Fixed-layout message sections.

use tartan_bitfield::bitfield;
use zerocopy::FromBytes;

/// Fields of the indicator section: magic, total message length, edition.
pub(super) fn indicator(r: [u8; 8]) -> ([u8; 4], u32, u8) {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct Indicator {
        magic: [u8; 4],
        length: [u8; 3],
        edition: u8,
    }

    let Indicator {
        magic,
        length,
        edition,
    } = zerocopy::transmute!(r);

    (magic, u24(length), edition)
}

/// Fields of the identification section common to both editions.
///
/// Fields the older edition lacks are `None`; the edition-3 two-digit year
/// arrives already windowed.
pub(super) struct Identification {
    pub length: u32,
    pub master_table: u8,
    pub centre: u16,
    pub sub_centre: u16,
    pub update_sequence: u8,
    pub has_section2: bool,
    pub category: u8,
    pub international_sub_category: Option<u8>,
    pub sub_category: u8,
    pub master_version: u8,
    pub local_version: u8,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: Option<u8>,
}

/// Decodes the fixed part of an edition-3 identification section.
pub(super) fn identification_v3(r: [u8; 17]) -> Identification {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct Layout {
        length: [u8; 3],
        master_table: u8,
        sub_centre: u8,
        centre: u8,
        update_sequence: u8,
        flags: u8,
        category: u8,
        sub_category: u8,
        master_version: u8,
        local_version: u8,
        year: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
    }

    let v: Layout = zerocopy::transmute!(r);

    // Two-digit year window centred on the edition's era.
    let year = if v.year > 50 {
        1900 + u16::from(v.year)
    } else {
        2000 + u16::from(v.year)
    };

    Identification {
        length: u24(v.length),
        master_table: v.master_table,
        centre: v.centre.into(),
        sub_centre: v.sub_centre.into(),
        update_sequence: v.update_sequence,
        has_section2: flags(v.flags),
        category: v.category,
        international_sub_category: None,
        sub_category: v.sub_category,
        master_version: v.master_version,
        local_version: v.local_version,
        year,
        month: v.month,
        day: v.day,
        hour: v.hour,
        minute: v.minute,
        second: None,
    }
}

/// Decodes the fixed part of an edition-4 identification section.
pub(super) fn identification_v4(r: [u8; 22]) -> Identification {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct Layout {
        length: [u8; 3],
        master_table: u8,
        centre: [u8; 2],
        sub_centre: [u8; 2],
        update_sequence: u8,
        flags: u8,
        category: u8,
        international_sub_category: u8,
        sub_category: u8,
        master_version: u8,
        local_version: u8,
        year: [u8; 2],
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    }

    let v: Layout = zerocopy::transmute!(r);

    Identification {
        length: u24(v.length),
        master_table: v.master_table,
        centre: u16::from_be_bytes(v.centre),
        sub_centre: u16::from_be_bytes(v.sub_centre),
        update_sequence: v.update_sequence,
        has_section2: flags(v.flags),
        category: v.category,
        international_sub_category: Some(v.international_sub_category),
        sub_category: v.sub_category,
        master_version: v.master_version,
        local_version: v.local_version,
        year: u16::from_be_bytes(v.year),
        month: v.month,
        day: v.day,
        hour: v.hour,
        minute: v.minute,
        second: Some(v.second),
    }
}

/// Fields of the data description section's fixed part: section length,
/// subset count, and the observed and compressed flags.
pub(super) fn description(r: [u8; 7]) -> (u32, u16, bool, bool) {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct Layout {
        length: [u8; 3],
        reserved: u8,
        subsets: [u8; 2],
        flags: u8,
    }

    bitfield! {
        struct Flags(u8) {
            [7] is_observed,
            [6] is_compressed,
        }
    }

    let Layout {
        length,
        subsets,
        flags,
        ..
    } = zerocopy::transmute!(r);

    let flags = Flags(flags);

    (
        u24(length),
        u16::from_be_bytes(subsets),
        flags.is_observed(),
        flags.is_compressed(),
    )
}

/// Length of a section from its four-octet header.
pub(super) fn length(r: [u8; 4]) -> u32 {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct Layout {
        length: [u8; 3],
        reserved: u8,
    }

    let Layout { length, .. } = zerocopy::transmute!(r);

    u24(length)
}

fn flags(octet: u8) -> bool {
    bitfield! {
        struct Flags(u8) {
            [7] has_section2,
        }
    }

    Flags(octet).has_section2()
}

fn u24(octets: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, octets[0], octets[1], octets[2]])
}
