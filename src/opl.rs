//! OPL register encoding.
//!
//! Translates instruments, volumes and notes into register writes on a chip
//! that implements [`Opl`]. Only the nine melodic channels have registers;
//! writes for any other voice are dropped.

use alloc::vec::Vec;
use log::trace;

use crate::bank::Instrument;
use crate::consts::*;

/// Register bank of an OPL3-compatible chip. OPL2 only has `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterBank {
    Primary = 0,
    Secondary = 1,
}

/// A write-only FM synthesis chip.
pub trait Opl {
    fn write(&mut self, bank: RegisterBank, register: u16, value: u8);
}

impl<T: Opl + ?Sized> Opl for &mut T {
    fn write(&mut self, bank: RegisterBank, register: u16, value: u8) {
        (**self).write(bank, register, value)
    }
}

/// Records every write, in order.
impl Opl for Vec<(RegisterBank, u16, u8)> {
    fn write(&mut self, bank: RegisterBank, register: u16, value: u8) {
        self.push((bank, register, value));
    }
}

const CHARACTERISTIC: u16 = 0x20;
const LEVEL: u16 = 0x40;
const ATTACK_DECAY: u16 = 0x60;
const SUSTAIN_RELEASE: u16 = 0x80;
const FNUM_LOW: u16 = 0xa0;
const KEY_ON_BLOCK: u16 = 0xb0;
const FEEDBACK_CONNECTION: u16 = 0xc0;
const WAVEFORM: u16 = 0xe0;

const KEY_ON: u8 = 0x20;
const STEREO_OUTPUT: u8 = 0x30;

fn write_reg<C: Opl + ?Sized>(chip: &mut C, register: u16, value: u8) {
    chip.write(RegisterBank::Primary, register, value);
}

/// Write the modulator value and the carrier value of one register group.
fn write_operators<C: Opl + ?Sized>(
    chip: &mut C,
    base: u16,
    offset: u16,
    modulator: u8,
    carrier: u8,
) {
    write_reg(chip, base + offset, modulator);
    write_reg(chip, base + offset + 3, carrier);
}

fn operator_offset(voice: usize) -> Option<u16> {
    OPERATOR_OFFSETS.get(voice).copied()
}

fn channel(voice: usize) -> Option<u16> {
    if voice < MELODIC_CHANNELS {
        Some(voice as u16)
    } else {
        None
    }
}

/// Put the chip in OPL2-compatible melodic mode with waveform select enabled.
pub fn write_init_state<C: Opl + ?Sized>(chip: &mut C) {
    chip.write(RegisterBank::Secondary, 0x105, 0x00); // OPL3 mode off
    chip.write(RegisterBank::Secondary, 0x104, 0x00); // 4-operator voices off
    write_reg(chip, 0x01, 0x20); // waveform select
    write_reg(chip, 0x08, 0x40); // CSW off
    write_reg(chip, 0xbd, 0x00); // shallow vibrato/tremolo, melodic
}

pub fn write_instrument<C: Opl + ?Sized>(chip: &mut C, voice: usize, instrument: &Instrument) {
    let (offset, channel) = match (operator_offset(voice), channel(voice)) {
        (Some(offset), Some(channel)) => (offset, channel),
        _ => return,
    };
    let regs = &instrument.registers;

    write_operators(chip, CHARACTERISTIC, offset, regs[0], regs[1]);
    write_operators(chip, LEVEL, offset, regs[2], regs[3]);
    write_operators(chip, ATTACK_DECAY, offset, regs[4], regs[5]);
    write_operators(chip, SUSTAIN_RELEASE, offset, regs[6], regs[7]);
    write_operators(chip, WAVEFORM, offset, regs[8], regs[9]);
    write_reg(chip, FEEDBACK_CONNECTION + channel, regs[10] | STEREO_OUTPUT);
}

/// Scale a 0.0-1.0 volume multiplier to an index into the volume curve.
pub fn volume_index(multiplier: f32) -> usize {
    let volume = libm::roundf(multiplier * 127.0);
    if volume >= 127.0 {
        127
    } else if volume > 0.0 {
        volume as usize
    } else {
        0
    }
}

/// Attenuate a 6-bit total level by a 0-127 volume.
pub fn scale_level(level: u8, volume: usize) -> u8 {
    let gain = u32::from(VOLUME_TABLE[volume.min(127)]);
    let headroom = u32::from(0x3f - (level & 0x3f));

    0x3f - ((headroom * gain) >> 7) as u8
}

/// Apply a voice volume to the carrier level, and to the modulator level too
/// when the instrument is additive. Key scaling bits are kept.
pub fn write_volume<C: Opl + ?Sized>(
    chip: &mut C,
    voice: usize,
    instrument: &Instrument,
    multiplier: f32,
) {
    let offset = match operator_offset(voice) {
        Some(offset) => offset,
        None => return,
    };
    let volume = volume_index(multiplier);
    let regs = &instrument.registers;

    let modulator = if instrument.is_additive() {
        scale_level(regs[2], volume)
    } else {
        regs[2] & 0x3f
    };
    let carrier = scale_level(regs[3], volume);

    write_operators(
        chip,
        LEVEL,
        offset,
        modulator | (regs[2] & 0xc0),
        carrier | (regs[3] & 0xc0),
    );
}

/// Octave block for a note, clamped to the chip's 0..=7 range.
pub fn block_number(note: u16) -> u8 {
    let block = libm::floor((f64::from(note) - 19.0) / 12.0) as i32;
    block.max(0).min(MAX_BLOCK) as u8
}

/// Equal-tempered frequency of a note in Hz, with note 69 at 440 Hz.
pub fn note_frequency(note: u16) -> f64 {
    libm::pow(2.0, (f64::from(note) - 69.0) / 12.0) * 440.0
}

/// Frequency number for `frequency` within octave `block`.
pub fn f_number(frequency: f64, block: u8) -> u16 {
    libm::round(frequency * libm::pow(2.0, 20.0 - f64::from(block)) / OPL_CLOCK_DIVISOR) as u16
}

pub fn key_off<C: Opl + ?Sized>(chip: &mut C, voice: usize) {
    if let Some(channel) = channel(voice) {
        write_reg(chip, KEY_ON_BLOCK + channel, 0);
    }
}

/// Key off the voice, then set its frequency and optionally key it on again.
pub fn play_note<C: Opl + ?Sized>(chip: &mut C, voice: usize, note: u16, key_on: bool) {
    let channel = match channel(voice) {
        Some(channel) => channel,
        None => return,
    };
    key_off(chip, voice);

    let block = block_number(note);
    let fnum = f_number(note_frequency(note), block);
    trace!("voice {} note {} block {} fnum {}", voice, note, block, fnum);

    write_reg(chip, FNUM_LOW + channel, (fnum & 0xff) as u8);
    let high = ((fnum >> 8) & 0x03) as u8 | (block << 2) | if key_on { KEY_ON } else { 0 };
    write_reg(chip, KEY_ON_BLOCK + channel, high);
}

/// Key off the voice. A pitched `last_note` is written back with key-on
/// clear so the channel keeps its frequency.
pub fn release_note<C: Opl + ?Sized>(chip: &mut C, voice: usize, last_note: u16) {
    key_off(chip, voice);
    if last_note > 0 {
        play_note(chip, voice, last_note, false);
    }
}
