use alloc::string::String;
use alloc::vec::Vec;
use arrayvec::ArrayVec;
use log::debug;

use crate::bytes::Reader;
use crate::consts::*;
use crate::errors::{Error, Malformed};

/// A decoded AdLib Visual Composer song (`.ROL`): a header, one tempo track
/// and four event tracks for each of the 11 voices.
///
/// A `Song` is immutable once decoded. Playback state lives in the
/// [`Player`](crate::Player).
#[derive(Debug, Clone)]
pub struct Song {
    pub header: SongHeader,
    pub basic_tempo: f32,
    pub tempo_events: Vec<TempoEvent>,
    pub(crate) voices: ArrayVec<VoiceTracks, NUM_VOICES>,
    /// The longest declared voice length; playback ends here.
    pub total_note_ticks: u32,
    /// Length of the raw song data in bytes.
    pub data_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongHeader {
    pub major_version: u16,
    pub minor_version: u16,
    pub ticks_per_beat: u16,
    pub beats_per_measure: u16,
    pub scale_y: u16,
    pub scale_x: u16,
    pub mode: MusicMode,
}

/// Whether the song was composed for 11 voices with percussion or for 9
/// melodic voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicMode {
    Percussive,
    Melodic,
}

/// The four event tracks of one voice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceTracks {
    pub notes: Vec<NoteEvent>,
    pub instruments: Vec<InstrumentEvent>,
    pub volumes: Vec<VolumeEvent>,
    pub pitches: Vec<PitchEvent>,
    /// Declared length of the note track.
    pub total_ticks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEvent {
    pub tick: u32,
    pub multiplier: f32,
}

/// A note (`note > 0`, MIDI numbering in 12..=107) or a rest (`note == 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub tick: u32,
    pub note: u16,
    pub duration: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentEvent {
    pub tick: u32,
    pub name: String,
}

/// Volume change, nominally 0.0 to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeEvent {
    pub tick: u32,
    pub multiplier: f32,
}

/// Pitch bend, nominally 0.0 to 2.0 with 1.0 meaning no bend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEvent {
    pub tick: u32,
    pub variation: f32,
}

/// Anything positioned on the song's tick timeline.
pub(crate) trait Timed {
    fn tick(&self) -> u32;
}

macro_rules! impl_timed {
    ($($event:ty),*) => {
        $(impl Timed for $event {
            fn tick(&self) -> u32 {
                self.tick
            }
        })*
    };
}

impl_timed!(NoteEvent, InstrumentEvent, VolumeEvent, PitchEvent);

impl From<u8> for MusicMode {
    fn from(mode: u8) -> Self {
        match mode {
            0 => MusicMode::Percussive,
            _ => MusicMode::Melodic,
        }
    }
}

impl Song {
    /// Create a new `Song` from a byte slice.
    ///
    /// ```
    /// # fn load(data: &[u8]) -> Result<(), rol_opl::Error> {
    /// let song = rol_opl::Song::from_slice(data)?;
    /// println!("{} ticks", song.total_note_ticks);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_slice(slice: &[u8]) -> Result<Song, Error> {
        let header = load_header(slice).map_err(Malformed::in_song)?;

        let mut reader = Reader::new(slice, EVENT_SECTION_OFFSET);
        let (basic_tempo, tempo_events) =
            load_tempo_track(&mut reader).map_err(Malformed::in_song)?;

        let mut voices = ArrayVec::new();
        for _ in 0..NUM_VOICES {
            voices.push(load_voice(&mut reader).map_err(Malformed::in_song)?);
        }

        let total_note_ticks = voices.iter().map(|v| v.total_ticks).max().unwrap_or(0);

        debug!(
            "Loaded song v{}.{}: {} ticks/beat, tempo {}, {} ticks, {} tempo events",
            header.major_version,
            header.minor_version,
            header.ticks_per_beat,
            basic_tempo,
            total_note_ticks,
            tempo_events.len()
        );

        Ok(Song {
            header,
            basic_tempo,
            tempo_events,
            voices,
            total_note_ticks,
            data_length: slice.len(),
        })
    }

    /// Build a song from already decoded tracks. Missing voices are left
    /// empty and extra voices are ignored.
    pub fn from_tracks(
        header: SongHeader,
        basic_tempo: f32,
        tracks: impl IntoIterator<Item = VoiceTracks>,
    ) -> Song {
        let mut voices: ArrayVec<VoiceTracks, NUM_VOICES> =
            tracks.into_iter().take(NUM_VOICES).collect();
        while !voices.is_full() {
            voices.push(VoiceTracks::default());
        }
        let total_note_ticks = voices.iter().map(|v| v.total_ticks).max().unwrap_or(0);

        Song {
            header,
            basic_tempo,
            tempo_events: Vec::new(),
            voices,
            total_note_ticks,
            data_length: 0,
        }
    }

    /// The event tracks of all 11 voices.
    pub fn voices(&self) -> &[VoiceTracks] {
        &self.voices
    }

    /// Ticks per second at the basic tempo. Tempo events are not applied.
    pub fn ticks_per_second(&self) -> f64 {
        f64::from(self.basic_tempo) / 60.0 * f64::from(self.header.ticks_per_beat)
    }

    /// Song length in seconds at the basic tempo, or 0.0 if the tempo is
    /// unusable.
    pub fn duration_seconds(&self) -> f64 {
        ticks_to_seconds(self.total_note_ticks, self.ticks_per_second())
    }
}

pub(crate) fn ticks_to_seconds(ticks: u32, ticks_per_second: f64) -> f64 {
    if ticks_per_second > 0.0 && ticks_per_second.is_finite() {
        f64::from(ticks) / ticks_per_second
    } else {
        0.0
    }
}

fn load_header(slice: &[u8]) -> Result<SongHeader, Malformed> {
    let u16_at = |offset| Reader::new(slice, offset).u16();

    Ok(SongHeader {
        major_version: u16_at(SONG_MAJOR_VERSION_OFFSET)?,
        minor_version: u16_at(SONG_MINOR_VERSION_OFFSET)?,
        ticks_per_beat: u16_at(TICKS_PER_BEAT_OFFSET)?,
        beats_per_measure: u16_at(BEATS_PER_MEASURE_OFFSET)?,
        scale_y: u16_at(SCALE_Y_OFFSET)?,
        scale_x: u16_at(SCALE_X_OFFSET)?,
        mode: Reader::new(slice, MUSIC_MODE_OFFSET).u8()?.into(),
    })
}

fn load_tempo_track(reader: &mut Reader) -> Result<(f32, Vec<TempoEvent>), Malformed> {
    reader.skip(TRACK_NAME_LENGTH)?;
    let basic_tempo = reader.f32()?;
    let count = reader.count("tempo events", TEMPO_EVENT_LENGTH)?;

    let mut events = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        events.push(TempoEvent {
            tick: u32::from(reader.u16()?),
            multiplier: reader.f32()?,
        });
    }

    Ok((basic_tempo, events))
}

fn load_voice(reader: &mut Reader) -> Result<VoiceTracks, Malformed> {
    let (total_ticks, notes) = load_note_track(reader)?;
    let instruments = load_instrument_track(reader)?;
    let volumes = load_volume_track(reader)?;
    let pitches = load_pitch_track(reader)?;

    Ok(VoiceTracks {
        notes,
        instruments,
        volumes,
        pitches,
        total_ticks,
    })
}

/// Notes carry no timestamp: each starts where the previous one ended, and
/// the track runs until the durations add up to the declared length.
fn load_note_track(reader: &mut Reader) -> Result<(u32, Vec<NoteEvent>), Malformed> {
    reader.skip(TRACK_NAME_LENGTH)?;
    let total_ticks = u32::from(reader.u16()?);

    let mut notes = Vec::new();
    let mut tick = 0;
    while tick < total_ticks {
        let note = reader.u16()?;
        let duration = reader.u16()?;
        notes.push(NoteEvent {
            tick,
            note,
            duration,
        });
        tick += u32::from(duration);
    }

    Ok((total_ticks, notes))
}

fn load_instrument_track(reader: &mut Reader) -> Result<Vec<InstrumentEvent>, Malformed> {
    reader.skip(TRACK_NAME_LENGTH)?;
    let count = reader.count("instrument events", INSTRUMENT_EVENT_LENGTH)?;

    let mut events = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let tick = u32::from(reader.u16()?);
        let name = reader.string(INSTRUMENT_NAME_LENGTH)?;
        // Padding byte, then a field that sometimes repeats the bank index.
        reader.skip(3)?;
        events.push(InstrumentEvent { tick, name });
    }

    Ok(events)
}

fn load_volume_track(reader: &mut Reader) -> Result<Vec<VolumeEvent>, Malformed> {
    reader.skip(TRACK_NAME_LENGTH)?;
    let count = reader.count("volume events", VOLUME_EVENT_LENGTH)?;

    let mut events = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        events.push(VolumeEvent {
            tick: u32::from(reader.u16()?),
            multiplier: reader.f32()?,
        });
    }

    Ok(events)
}

fn load_pitch_track(reader: &mut Reader) -> Result<Vec<PitchEvent>, Malformed> {
    reader.skip(TRACK_NAME_LENGTH)?;
    let count = reader.count("pitch events", PITCH_EVENT_LENGTH)?;

    let mut events = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        events.push(PitchEvent {
            tick: u32::from(reader.u16()?),
            variation: reader.f32()?,
        });
    }

    Ok(events)
}
