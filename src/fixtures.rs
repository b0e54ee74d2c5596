//! Builders for synthetic `.ROL` and `.BNK` data used by the tests.

use crate::bank::{Instrument, InstrumentBank, Operator};
use crate::consts::*;
use crate::song::{MusicMode, SongHeader};

/// Raw operator fields with the given envelope and everything else zero.
pub(crate) fn operator(
    attack: u8,
    decay: u8,
    sustain: u8,
    release: u8,
) -> [u8; OPERATOR_FIELDS] {
    let mut raw = [0; OPERATOR_FIELDS];
    raw[3] = attack;
    raw[4] = sustain;
    raw[6] = decay;
    raw[7] = release;
    raw
}

pub(crate) fn instrument(name: &str) -> Instrument {
    let op = Operator::default();
    Instrument::from_operators(name.into(), &op, &op, [0, 0])
}

pub(crate) fn header(ticks_per_beat: u16) -> SongHeader {
    SongHeader {
        major_version: 0,
        minor_version: 4,
        ticks_per_beat,
        beats_per_measure: 4,
        scale_y: 48,
        scale_x: 56,
        mode: MusicMode::Melodic,
    }
}

pub(crate) struct BankEntry {
    pub name: &'static str,
    pub used: bool,
    pub percussive: bool,
    pub voice_number: u8,
    pub modulator: [u8; OPERATOR_FIELDS],
    pub carrier: [u8; OPERATOR_FIELDS],
    pub waveforms: [u8; 2],
}

impl BankEntry {
    pub fn new(
        name: &'static str,
        modulator: [u8; OPERATOR_FIELDS],
        carrier: [u8; OPERATOR_FIELDS],
    ) -> Self {
        BankEntry {
            name,
            used: true,
            percussive: false,
            voice_number: 0,
            modulator,
            carrier,
            waveforms: [0, 0],
        }
    }
}

fn push_name(out: &mut Vec<u8>, name: &str, len: usize) {
    let mut field = vec![0; len];
    for (dst, src) in field.iter_mut().zip(name.bytes().take(len - 1)) {
        *dst = src;
    }
    out.extend_from_slice(&field);
}

/// A version 1.0 bank with the index table right after the header and the
/// data table after the index.
pub(crate) fn bank_bytes(entries: &[BankEntry]) -> Vec<u8> {
    let count = entries.len() as u16;
    let names_offset = BANK_HEADER_LENGTH as u32;
    let data_offset = names_offset + u32::from(count) * BANK_INDEX_RECORD_LENGTH as u32;

    let mut out = vec![1, 0];
    out.extend_from_slice(b"ADLIB-");
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&names_offset.to_le_bytes());
    out.extend_from_slice(&data_offset.to_le_bytes());
    out.extend_from_slice(&[0; 8]);

    for (i, entry) in entries.iter().enumerate() {
        out.extend_from_slice(&(i as u16).to_le_bytes());
        out.push(entry.used as u8);
        push_name(&mut out, entry.name, INSTRUMENT_NAME_LENGTH);
    }

    for entry in entries {
        out.push(entry.percussive as u8);
        out.push(entry.voice_number);
        out.extend_from_slice(&entry.modulator);
        out.extend_from_slice(&entry.carrier);
        out.extend_from_slice(&entry.waveforms);
    }

    out
}

pub(crate) fn empty_bank() -> InstrumentBank {
    InstrumentBank::from_slice(&bank_bytes(&[])).unwrap()
}

#[derive(Clone, Default)]
pub(crate) struct VoiceBuilder {
    notes: Vec<(u16, u16)>,
    declared_ticks: Option<u16>,
    instruments: Vec<(u16, &'static str)>,
    volumes: Vec<(u16, f32)>,
    pitches: Vec<(u16, f32)>,
    pitch_count: Option<u16>,
}

impl VoiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(mut self, note: u16, duration: u16) -> Self {
        self.notes.push((note, duration));
        self
    }

    /// Override the declared note track length (defaults to the sum of the
    /// note durations).
    pub fn declared_ticks(mut self, ticks: u16) -> Self {
        self.declared_ticks = Some(ticks);
        self
    }

    pub fn instrument(mut self, tick: u16, name: &'static str) -> Self {
        self.instruments.push((tick, name));
        self
    }

    pub fn volume(mut self, tick: u16, multiplier: f32) -> Self {
        self.volumes.push((tick, multiplier));
        self
    }

    pub fn pitch(mut self, tick: u16, variation: f32) -> Self {
        self.pitches.push((tick, variation));
        self
    }

    pub fn pitch_count_override(mut self, count: u16) -> Self {
        self.pitch_count = Some(count);
        self
    }

    fn write(&self, out: &mut Vec<u8>) {
        let total: u16 = self.notes.iter().map(|&(_, duration)| duration).sum();
        out.extend_from_slice(&[0; TRACK_NAME_LENGTH]);
        out.extend_from_slice(&self.declared_ticks.unwrap_or(total).to_le_bytes());
        for &(note, duration) in &self.notes {
            out.extend_from_slice(&note.to_le_bytes());
            out.extend_from_slice(&duration.to_le_bytes());
        }

        out.extend_from_slice(&[0; TRACK_NAME_LENGTH]);
        out.extend_from_slice(&(self.instruments.len() as u16).to_le_bytes());
        for &(tick, name) in &self.instruments {
            out.extend_from_slice(&tick.to_le_bytes());
            push_name(out, name, INSTRUMENT_NAME_LENGTH);
            out.extend_from_slice(&[0, 0, 0]);
        }

        write_float_track(out, &self.volumes, None);
        write_float_track(out, &self.pitches, self.pitch_count);
    }
}

fn write_float_track(out: &mut Vec<u8>, events: &[(u16, f32)], count: Option<u16>) {
    out.extend_from_slice(&[0; TRACK_NAME_LENGTH]);
    out.extend_from_slice(&count.unwrap_or(events.len() as u16).to_le_bytes());
    for &(tick, value) in events {
        out.extend_from_slice(&tick.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
}

pub(crate) struct SongBuilder {
    ticks_per_beat: u16,
    tempo: f32,
    mode: u8,
    tempo_events: Vec<(u16, f32)>,
    voices: Vec<VoiceBuilder>,
}

impl SongBuilder {
    pub fn new() -> Self {
        SongBuilder {
            ticks_per_beat: 4,
            tempo: 120.0,
            mode: 1,
            tempo_events: Vec::new(),
            voices: vec![VoiceBuilder::new(); NUM_VOICES],
        }
    }

    pub fn ticks_per_beat(mut self, ticks: u16) -> Self {
        self.ticks_per_beat = ticks;
        self
    }

    pub fn tempo(mut self, tempo: f32) -> Self {
        self.tempo = tempo;
        self
    }

    pub fn mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }

    pub fn tempo_event(mut self, tick: u16, multiplier: f32) -> Self {
        self.tempo_events.push((tick, multiplier));
        self
    }

    pub fn voice(mut self, voice: usize, builder: VoiceBuilder) -> Self {
        self.voices[voice] = builder;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header = header(self.ticks_per_beat);
        let mut out = vec![0; EVENT_SECTION_OFFSET];
        let mut put_u16 = |offset: usize, value: u16| {
            out[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        };
        put_u16(0x00, header.major_version);
        put_u16(0x02, header.minor_version);
        put_u16(0x2c, header.ticks_per_beat);
        put_u16(0x2e, header.beats_per_measure);
        put_u16(0x30, header.scale_y);
        put_u16(0x32, header.scale_x);
        out[0x04..0x04 + 13].copy_from_slice(b"\\roll\\default");
        out[0x35] = self.mode;

        push_name(&mut out, "Tempo", TRACK_NAME_LENGTH);
        out.extend_from_slice(&self.tempo.to_le_bytes());
        out.extend_from_slice(&(self.tempo_events.len() as u16).to_le_bytes());
        for &(tick, multiplier) in &self.tempo_events {
            out.extend_from_slice(&tick.to_le_bytes());
            out.extend_from_slice(&multiplier.to_le_bytes());
        }

        for voice in &self.voices {
            voice.write(&mut out);
        }

        out
    }
}
