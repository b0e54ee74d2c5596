// Song layout
pub(crate) const NUM_VOICES: usize = 11;
pub(crate) const NUM_EVENT_TYPES: usize = 4;

pub(crate) const SONG_MAJOR_VERSION_OFFSET: usize = 0x00;
pub(crate) const SONG_MINOR_VERSION_OFFSET: usize = 0x02;
pub(crate) const TICKS_PER_BEAT_OFFSET: usize = 0x2c;
pub(crate) const BEATS_PER_MEASURE_OFFSET: usize = 0x2e;
pub(crate) const SCALE_Y_OFFSET: usize = 0x30;
pub(crate) const SCALE_X_OFFSET: usize = 0x32;
pub(crate) const MUSIC_MODE_OFFSET: usize = 0x35;
pub(crate) const EVENT_SECTION_OFFSET: usize = 0xb6;

pub(crate) const TRACK_NAME_LENGTH: usize = 15;
pub(crate) const INSTRUMENT_NAME_LENGTH: usize = 9;

pub(crate) const TEMPO_EVENT_LENGTH: usize = 6;
pub(crate) const INSTRUMENT_EVENT_LENGTH: usize = 2 + INSTRUMENT_NAME_LENGTH + 1 + 2;
pub(crate) const VOLUME_EVENT_LENGTH: usize = 6;
pub(crate) const PITCH_EVENT_LENGTH: usize = 6;

// Bank layout
pub(crate) const BANK_HEADER_LENGTH: usize = 0x1c;
pub(crate) const BANK_SIGNATURE_LENGTH: usize = 6;
pub(crate) const BANK_INDEX_RECORD_LENGTH: usize = 2 + 1 + INSTRUMENT_NAME_LENGTH;
pub(crate) const BANK_DATA_RECORD_LENGTH: usize = 30;

pub(crate) const OPERATOR_FIELDS: usize = 13;
pub(crate) const INSTRUMENT_REGISTERS: usize = 12;

// Chip
pub(crate) const MELODIC_CHANNELS: usize = 9;
pub(crate) const OPL_CLOCK_DIVISOR: f64 = 49716.0;
pub(crate) const MAX_BLOCK: i32 = 7;

/// Register offset of the modulator operator for each melodic channel. The
/// carrier sits three registers above.
pub(crate) const OPERATOR_OFFSETS: [u16; MELODIC_CHANNELS] =
    [0x00, 0x01, 0x02, 0x08, 0x09, 0x0a, 0x10, 0x11, 0x12];

/// Maps a linear 0-127 volume onto the chip's logarithmic attenuation.
#[rustfmt::skip]
pub(crate) const VOLUME_TABLE: [u8; 128] = [
    0, 1, 3, 5, 6, 8, 10, 11,
    13, 14, 16, 17, 19, 20, 22, 23,
    25, 26, 27, 29, 30, 32, 33, 34,
    36, 37, 39, 41, 43, 45, 47, 49,
    50, 52, 54, 55, 57, 59, 60, 61,
    63, 64, 66, 67, 68, 69, 71, 72,
    73, 74, 75, 76, 77, 79, 80, 81,
    82, 83, 84, 84, 85, 86, 87, 88,
    89, 90, 91, 92, 92, 93, 94, 95,
    96, 96, 97, 98, 99, 99, 100, 101,
    101, 102, 103, 103, 104, 105, 105, 106,
    107, 107, 108, 109, 109, 110, 110, 111,
    112, 112, 113, 113, 114, 114, 115, 115,
    116, 117, 117, 118, 118, 119, 119, 120,
    120, 121, 121, 122, 122, 123, 123, 123,
    124, 124, 125, 125, 126, 126, 127, 127,
];
