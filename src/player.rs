use log::{debug, trace};

use crate::bank::{Instrument, InstrumentBank};
use crate::consts::*;
use crate::errors::Error;
use crate::opl::{self, Opl};
use crate::song::{ticks_to_seconds, Song, Timed, VoiceTracks};

/// The contract a host uses to drive any song format on an OPL chip.
///
/// The host calls [`step`](OplFormat::step), renders audio for
/// [`refresh`](OplFormat::refresh) seconds, and repeats until `step` returns
/// `false`.
pub trait OplFormat {
    /// Apply every change due at the next update time. Returns `false` once
    /// the end of the song is reached.
    fn step(&mut self) -> bool;

    /// Seconds until the next call to `step` is due.
    fn refresh(&self) -> f64;

    /// Go back to the beginning of the song.
    fn rewind(&mut self);

    /// Playback progress from 0.0 to 1.0.
    fn position(&self) -> f64;
}

/// Event tracks a voice is scheduled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Note = 0,
    Volume = 1,
    Instrument = 2,
    Pitch = 3,
}

/// Everything that changes while a song plays.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState<'a> {
    current_tick: u32,
    ticks_to_next_update: u32,
    cursors: [[usize; NUM_VOICES]; NUM_EVENT_TYPES],
    instruments: [Option<&'a Instrument>; NUM_VOICES],
    position: f64,
}

impl<'a> PlaybackState<'a> {
    fn new() -> Self {
        PlaybackState {
            current_tick: 0,
            ticks_to_next_update: 0,
            cursors: [[0; NUM_VOICES]; NUM_EVENT_TYPES],
            instruments: [None; NUM_VOICES],
            position: 0.0,
        }
    }

    /// Ticks since the start of the song.
    pub fn current_tick(&self) -> u32 {
        self.current_tick
    }

    /// Ticks until the next event on any voice.
    pub fn ticks_to_next_update(&self) -> u32 {
        self.ticks_to_next_update
    }

    /// Index of the next event to dispatch from a voice's track.
    pub fn cursor(&self, event_type: EventType, voice: usize) -> usize {
        self.cursors[event_type as usize][voice]
    }

    /// The instrument currently bound to a voice.
    pub fn instrument(&self, voice: usize) -> Option<&'a Instrument> {
        self.instruments[voice]
    }

    /// If the event under the cursor is due, advance past it and return its
    /// index. At most one event per track is taken each step.
    fn take_due<E: Timed>(
        &mut self,
        events: &[E],
        event_type: EventType,
        voice: usize,
        now: u32,
    ) -> Option<usize> {
        let cursor = &mut self.cursors[event_type as usize][voice];
        let event = events.get(*cursor)?;
        if event.tick() > now {
            return None;
        }

        let index = *cursor;
        *cursor += 1;

        Some(index)
    }

    /// Shorten the time to the next update if the track's next event comes
    /// sooner.
    fn schedule<E: Timed>(
        &mut self,
        events: &[E],
        event_type: EventType,
        voice: usize,
        now: u32,
    ) {
        let next = events.get(self.cursor(event_type, voice));
        if let Some(next) = next.filter(|e| e.tick() > now) {
            self.ticks_to_next_update = self.ticks_to_next_update.min(next.tick() - now);
        }
    }
}

/// Plays a [`Song`] on an OPL chip using instruments from a shared
/// [`InstrumentBank`].
///
/// ```
/// use rol_opl::{InstrumentBank, Player, RegisterBank};
///
/// # fn play(rol: &[u8], bnk: &[u8]) -> Result<(), rol_opl::Error> {
/// let bank = InstrumentBank::from_slice(bnk)?;
/// let chip: Vec<(RegisterBank, u16, u8)> = Vec::new();
/// let mut player = Player::load(&bank, chip, rol)?;
///
/// while player.step() {
///     let seconds = player.refresh();
///     // Render `seconds` of audio from the chip here.
/// #   let _ = seconds;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Player<'a, C> {
    song: Song,
    bank: &'a InstrumentBank,
    chip: C,
    state: PlaybackState<'a>,
}

impl<'a, C: Opl> Player<'a, C> {
    /// Decode `data` as a song and prepare it for playback.
    pub fn load(bank: &'a InstrumentBank, chip: C, data: &[u8]) -> Result<Self, Error> {
        let song = Song::from_slice(data)?;

        Ok(Self::new(bank, chip, song))
    }

    /// Prepare a decoded song for playback. The chip is initialized here.
    pub fn new(bank: &'a InstrumentBank, mut chip: C, song: Song) -> Self {
        opl::write_init_state(&mut chip);

        Player {
            song,
            bank,
            chip,
            state: PlaybackState::new(),
        }
    }

    pub fn step(&mut self) -> bool {
        let horizon = self.song.total_note_ticks;
        if self.state.current_tick >= horizon {
            return false;
        }

        let bank = self.bank;
        let Player { song, chip, state, .. } = self;

        state.current_tick += state.ticks_to_next_update;
        let now = state.current_tick;
        state.ticks_to_next_update = horizon.saturating_sub(now);

        for (voice, tracks) in song.voices.iter().enumerate() {
            update_voice(chip, bank, state, voice, tracks, now);
        }

        state.position = f64::from(now) / f64::from(horizon);

        now < horizon
    }

    pub fn refresh(&self) -> f64 {
        ticks_to_seconds(self.state.ticks_to_next_update, self.song.ticks_per_second())
    }

    pub fn rewind(&mut self) {
        debug!("Rewinding song");
        self.state = PlaybackState::new();
    }

    /// Playback progress from 0.0 to 1.0, in ticks.
    pub fn position(&self) -> f64 {
        self.state.position
    }

    /// Playback progress mapped onto the raw song data, for scrubbing.
    pub fn byte_position(&self) -> usize {
        (self.state.position * self.song.data_length as f64) as usize
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn state(&self) -> &PlaybackState<'a> {
        &self.state
    }

    pub fn chip(&self) -> &C {
        &self.chip
    }

    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }

    pub fn into_chip(self) -> C {
        self.chip
    }
}

impl<'a, C: Opl> OplFormat for Player<'a, C> {
    fn step(&mut self) -> bool {
        Player::step(self)
    }

    fn refresh(&self) -> f64 {
        Player::refresh(self)
    }

    fn rewind(&mut self) {
        Player::rewind(self)
    }

    fn position(&self) -> f64 {
        Player::position(self)
    }
}

/// Dispatch the instrument, volume and note events due on one voice, in that
/// order, and fold each track's next event into the update time.
fn update_voice<'a, C: Opl>(
    chip: &mut C,
    bank: &'a InstrumentBank,
    state: &mut PlaybackState<'a>,
    voice: usize,
    tracks: &VoiceTracks,
    now: u32,
) {
    let events = &tracks.instruments;
    if let Some(i) = state.take_due(events, EventType::Instrument, voice, now) {
        let name = &events[i].name;
        match bank.get(name) {
            Some(instrument) => {
                trace!("voice {} instrument {}", voice, name);
                opl::write_instrument(chip, voice, instrument);
                state.instruments[voice] = Some(instrument);
            }
            None => debug!("voice {}: instrument {:?} is not in the bank", voice, name),
        }
    }
    state.schedule(events, EventType::Instrument, voice, now);

    let events = &tracks.volumes;
    if let Some(i) = state.take_due(events, EventType::Volume, voice, now) {
        if let Some(instrument) = state.instruments[voice] {
            trace!("voice {} volume {}", voice, events[i].multiplier);
            opl::write_volume(chip, voice, instrument, events[i].multiplier);
        }
    }
    state.schedule(events, EventType::Volume, voice, now);

    let events = &tracks.notes;
    if let Some(i) = state.take_due(events, EventType::Note, voice, now) {
        let note = events[i].note;
        if note > 0 {
            opl::play_note(chip, voice, note, true);
        } else {
            let last_note = events[i.saturating_sub(1)].note;
            opl::release_note(chip, voice, last_note);
        }
    }
    state.schedule(events, EventType::Note, voice, now);

    // Pitch bends are not applied yet, so they never shorten the update time.
    state.take_due(&tracks.pitches, EventType::Pitch, voice, now);
}
