use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::TryFrom;
use log::debug;

use crate::bytes::Reader;
use crate::consts::*;
use crate::errors::{Error, Malformed};

/// An AdLib instrument bank (`.BNK`): named chip voice presets shared by every
/// song that references them.
#[derive(Debug, Clone)]
pub struct InstrumentBank {
    pub major_version: u8,
    pub minor_version: u8,
    pub num_instruments_used: u16,
    /// As stored in the header. Index records are always read right after
    /// the header.
    pub names_offset: u32,
    pub data_offset: u32,
    instruments: Vec<Instrument>,
    by_name: BTreeMap<String, usize>,
}

/// A named preset of operator register values.
///
/// `registers` holds modulator/carrier pairs for the characteristic (0/1),
/// level (2/3), attack/decay (4/5), sustain/release (6/7) and waveform (8/9)
/// registers, then the feedback/connection byte computed from each operator
/// (10/11). Only byte 10 is sent to the chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub name: String,
    pub used: bool,
    pub percussive: bool,
    pub voice_number: u8,
    pub registers: [u8; INSTRUMENT_REGISTERS],
}

/// Raw per-operator parameters as stored in the bank's data table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Operator {
    key_scaling_level: u8,
    frequency_multiplier: u8,
    feedback: u8,
    attack: u8,
    sustain: u8,
    envelope_type: u8,
    decay: u8,
    release: u8,
    total_level: u8,
    amplitude_vibrato: u8,
    frequency_vibrato: u8,
    key_scaling_rate: u8,
    connection: u8,
}

impl Operator {
    fn from_slice(raw: &[u8]) -> Operator {
        Operator {
            key_scaling_level: raw[0],
            frequency_multiplier: raw[1],
            feedback: raw[2],
            attack: raw[3],
            sustain: raw[4],
            envelope_type: raw[5],
            decay: raw[6],
            release: raw[7],
            total_level: raw[8],
            amplitude_vibrato: raw[9],
            frequency_vibrato: raw[10],
            key_scaling_rate: raw[11],
            connection: raw[12],
        }
    }

    /// AM / VIB / EG-TYPE / KSR / MULT (register 0x20).
    fn characteristic(&self) -> u8 {
        (self.frequency_multiplier & 0x0f)
            | ((self.key_scaling_rate << 4) & 0x10)
            | ((self.envelope_type << 5) & 0x20)
            | ((self.frequency_vibrato << 6) & 0x40)
            | ((self.amplitude_vibrato << 7) & 0x80)
    }

    /// KSL / TL (register 0x40).
    fn level(&self) -> u8 {
        (self.total_level & 0x3f) | ((self.key_scaling_level << 6) & 0xc0)
    }

    /// AR / DR (register 0x60).
    fn attack_decay(&self) -> u8 {
        ((self.attack << 4) & 0xf0) | (self.decay & 0x0f)
    }

    /// SL / RR (register 0x80).
    fn sustain_release(&self) -> u8 {
        ((self.sustain << 4) & 0xf0) | (self.release & 0x0f)
    }

    /// FB / CNT (register 0xC0). The bank stores the connection inverted.
    fn feedback_connection(&self) -> u8 {
        ((self.feedback << 1) & 0x0e) | ((self.connection ^ 0x01) & 0x01)
    }
}

impl Instrument {
    pub(crate) fn from_operators(
        name: String,
        modulator: &Operator,
        carrier: &Operator,
        waveforms: [u8; 2],
    ) -> Instrument {
        let registers = [
            modulator.characteristic(),
            carrier.characteristic(),
            modulator.level(),
            carrier.level(),
            modulator.attack_decay(),
            carrier.attack_decay(),
            modulator.sustain_release(),
            carrier.sustain_release(),
            waveforms[0],
            waveforms[1],
            modulator.feedback_connection(),
            carrier.feedback_connection(),
        ];

        Instrument {
            name,
            used: true,
            percussive: false,
            voice_number: 0,
            registers,
        }
    }

    /// Whether both operators sound directly (additive synthesis), in which
    /// case the modulator level also follows the voice volume.
    pub fn is_additive(&self) -> bool {
        self.registers[10] & 0x01 != 0
    }
}

impl InstrumentBank {
    /// Create a new `InstrumentBank` from a byte slice.
    pub fn from_slice(slice: &[u8]) -> Result<InstrumentBank, Error> {
        if slice.len() < BANK_HEADER_LENGTH {
            return Err(Malformed::UnexpectedEof {
                offset: 0,
                needed: BANK_HEADER_LENGTH,
            }
            .in_bank());
        }

        let mut header = Reader::new(slice, 0);
        let major_version = header.u8().map_err(Malformed::in_bank)?;
        let minor_version = header.u8().map_err(Malformed::in_bank)?;
        header
            .skip(BANK_SIGNATURE_LENGTH)
            .map_err(Malformed::in_bank)?;
        let num_instruments_used = header.u16().map_err(Malformed::in_bank)?;
        let num_instruments = header.u16().map_err(Malformed::in_bank)?;
        let names_offset = header.u32().map_err(Malformed::in_bank)?;
        let data_offset = header.u32().map_err(Malformed::in_bank)?;

        let data_start = table_start(slice, data_offset, "instrument data")?;

        // Index records follow the reserved bytes at the end of the header,
        // whatever the names offset field says.
        let mut index = Reader::new(slice, BANK_HEADER_LENGTH);
        if usize::from(num_instruments) * BANK_INDEX_RECORD_LENGTH > index.remaining() {
            return Err(Malformed::CountOutOfRange {
                field: "instruments",
                count: num_instruments,
            }
            .in_bank());
        }

        let mut instruments = Vec::with_capacity(usize::from(num_instruments));
        let mut by_name = BTreeMap::new();

        for _ in 0..num_instruments {
            let instrument = load_instrument(slice, &mut index, data_start)?;
            let key = lookup_key(&instrument.name);

            if by_name.insert(key, instruments.len()).is_some() {
                debug!("Duplicate instrument name {:?}, keeping the later one", instrument.name);
            }
            instruments.push(instrument);
        }

        debug!(
            "Loaded instrument bank v{}.{}: {} instruments ({} used)",
            major_version, minor_version, num_instruments, num_instruments_used
        );

        Ok(InstrumentBank {
            major_version,
            minor_version,
            num_instruments_used,
            names_offset,
            data_offset,
            instruments,
            by_name,
        })
    }

    /// Look up an instrument by name, ignoring case and surrounding spaces.
    pub fn get(&self, name: &str) -> Option<&Instrument> {
        self.by_name
            .get(&lookup_key(name))
            .map(|&i| &self.instruments[i])
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Instruments in bank order.
    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }
}

fn lookup_key(name: &str) -> String {
    name.trim().to_uppercase()
}

fn table_start(slice: &[u8], offset: u32, field: &'static str) -> Result<usize, Error> {
    match usize::try_from(offset) {
        Ok(start) if start <= slice.len() => Ok(start),
        _ => Err(Malformed::OffsetOutOfRange { field, offset }.in_bank()),
    }
}

/// Start of the data record for `index`, or `None` if it cannot be addressed.
fn record_offset(data_start: usize, index: u16) -> Option<usize> {
    usize::from(index)
        .checked_mul(BANK_DATA_RECORD_LENGTH)?
        .checked_add(data_start)
}

/// Read one index record and the data record it points at.
fn load_instrument(
    slice: &[u8],
    index: &mut Reader,
    data_start: usize,
) -> Result<Instrument, Error> {
    let data_index = index.u16().map_err(Malformed::in_bank)?;
    let used = index.u8().map_err(Malformed::in_bank)? != 0;
    let name = index
        .string(INSTRUMENT_NAME_LENGTH)
        .map_err(Malformed::in_bank)?;

    let offset = record_offset(data_start, data_index);
    let record = offset
        .and_then(|offset| Reader::new(slice, offset).take(BANK_DATA_RECORD_LENGTH).ok())
        .ok_or_else(|| {
            Malformed::OffsetOutOfRange {
                field: "instrument record",
                offset: offset
                    .and_then(|offset| u32::try_from(offset).ok())
                    .unwrap_or(u32::MAX),
            }
            .in_bank()
        })?;

    let percussive = record[0] != 0;
    let voice_number = record[1];
    let modulator = Operator::from_slice(&record[2..2 + OPERATOR_FIELDS]);
    let carrier = Operator::from_slice(&record[2 + OPERATOR_FIELDS..2 + OPERATOR_FIELDS * 2]);
    let waveforms = [record[28], record[29]];

    let mut instrument = Instrument::from_operators(name, &modulator, &carrier, waveforms);
    instrument.used = used;
    instrument.percussive = percussive;
    instrument.voice_number = voice_number;

    Ok(instrument)
}
