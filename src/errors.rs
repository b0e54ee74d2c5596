//! Decoder errors.

/// Possible errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// The instrument bank could not be decoded.
    #[cfg_attr(feature = "std", error("Malformed instrument bank: {0}"))]
    MalformedBank(Malformed),

    /// The song could not be decoded.
    #[cfg_attr(feature = "std", error("Malformed song: {0}"))]
    MalformedSong(Malformed),
}

/// The structural problem behind a decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Malformed {
    /// The buffer ended before a field could be read.
    #[cfg_attr(
        feature = "std",
        error("unexpected end of data at offset 0x{offset:04x} ({needed} bytes needed)")
    )]
    UnexpectedEof { offset: usize, needed: usize },

    /// A table offset points outside the buffer.
    #[cfg_attr(feature = "std", error("{field} offset 0x{offset:08x} is outside the data"))]
    OffsetOutOfRange { field: &'static str, offset: u32 },

    /// A record count cannot fit in the remaining data.
    #[cfg_attr(feature = "std", error("{field} count {count} exceeds the remaining data"))]
    CountOutOfRange { field: &'static str, count: u16 },
}

impl Malformed {
    pub(crate) fn in_bank(self) -> Error {
        Error::MalformedBank(self)
    }

    pub(crate) fn in_song(self) -> Error {
        Error::MalformedSong(self)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_includes_cause() {
        let error = Malformed::UnexpectedEof {
            offset: 0xb6,
            needed: 15,
        }
        .in_song();

        assert_eq!(
            error.to_string(),
            "Malformed song: unexpected end of data at offset 0x00b6 (15 bytes needed)"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn offset_out_of_range_names_field() {
        let error = Malformed::OffsetOutOfRange {
            field: "instrument data",
            offset: 0x1234,
        }
        .in_bank();

        assert_eq!(
            error.to_string(),
            "Malformed instrument bank: instrument data offset 0x00001234 is outside the data"
        );
    }
}
