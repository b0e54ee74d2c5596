//! Plays AdLib Visual Composer songs (`.ROL`) with instruments from an AdLib
//! instrument bank (`.BNK`) by writing registers on an OPL2/OPL3 chip.
//!
//! The chip itself is not emulated. Anything implementing [`Opl`] can receive
//! the register writes, and the host renders audio between calls to
//! [`Player::step`] for as long as [`Player::refresh`] says.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;
extern crate arrayvec;
extern crate byteorder;
extern crate libm;
extern crate log;

mod bank;
mod bytes;
mod consts;
mod errors;
pub mod opl;
mod player;
mod song;

#[cfg(test)]
mod fixtures;

pub use bank::{Instrument, InstrumentBank};
pub use errors::{Error, Malformed};
pub use opl::{Opl, RegisterBank};
pub use player::{EventType, OplFormat, PlaybackState, Player};
pub use song::{
    InstrumentEvent, MusicMode, NoteEvent, PitchEvent, Song, SongHeader, TempoEvent, VoiceTracks,
    VolumeEvent,
};
