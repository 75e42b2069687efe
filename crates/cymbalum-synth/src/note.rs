//! Held-note bookkeeping and sample-accurate event scheduling.
//!
//! [`NoteStack`] remembers which notes are held, in press order. Synthesis
//! always follows the most recently pressed note that is still down.
//!
//! [`EventScheduler`] holds the note events of the current block sorted by
//! sample offset so the per-sample loop can apply each one exactly when it
//! is due. Both structures are sized once and never allocate afterwards.

use cymbalum_core::midi_to_frequency;

/// Maximum number of simultaneously held notes.
pub const MAX_NOTES: usize = 128;

/// Maximum number of note events queued in one block.
pub const MAX_EVENTS: usize = 512;

/// A held note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteInfo {
    /// Host note id, unique while held
    pub id: i32,
    /// Frequency in Hz, before pitch bend
    pub frequency: f32,
    /// Velocity in `[0, 1]`
    pub velocity: f32,
}

/// Insertion-ordered stack of held notes.
///
/// # Example
///
/// ```rust
/// use cymbalum_synth::{NoteInfo, NoteStack};
///
/// let mut stack = NoteStack::new();
/// stack.push(NoteInfo { id: 1, frequency: 220.0, velocity: 1.0 });
/// stack.push(NoteInfo { id: 2, frequency: 330.0, velocity: 1.0 });
/// stack.release(2);
/// assert_eq!(stack.current().map(|n| n.frequency), Some(220.0));
/// ```
#[derive(Debug, Clone)]
pub struct NoteStack {
    notes: Vec<NoteInfo>,
}

impl NoteStack {
    /// Empty stack with room for [`MAX_NOTES`].
    pub fn new() -> Self {
        Self {
            notes: Vec::with_capacity(MAX_NOTES),
        }
    }

    /// Press a note.
    ///
    /// A held note with the same id is removed first. At capacity the oldest
    /// note is dropped.
    pub fn push(&mut self, info: NoteInfo) {
        self.release(info.id);
        if self.notes.len() >= MAX_NOTES {
            self.notes.remove(0);
        }
        self.notes.push(info);
    }

    /// Release a note by id. Returns `false` if no such note was held.
    pub fn release(&mut self, id: i32) -> bool {
        match self.notes.iter().position(|n| n.id == id) {
            Some(index) => {
                self.notes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Most recently pressed held note.
    pub fn current(&self) -> Option<&NoteInfo> {
        self.notes.last()
    }

    /// Whether no notes are held.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Number of held notes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Release everything.
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Held notes, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &NoteInfo> {
        self.notes.iter()
    }
}

impl Default for NoteStack {
    fn default() -> Self {
        Self::new()
    }
}

/// A note event tagged with its position inside the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// `true` for note-on, `false` for note-off
    pub is_note_on: bool,
    /// Sample offset from the start of the block
    pub offset: u32,
    /// Note id (see [`host_id`](Self::host_id))
    pub id: i32,
    /// MIDI pitch
    pub pitch: i16,
    /// Tuning offset in cents
    pub tuning: f32,
    /// Velocity in `[0, 1]`
    pub velocity: f32,
}

impl NoteEvent {
    /// Resolve the id a host sent.
    ///
    /// Some hosts send `-1` for every note; those notes are keyed by pitch.
    pub fn host_id(note_id: i32, pitch: i16) -> i32 {
        if note_id == -1 {
            i32::from(pitch)
        } else {
            note_id
        }
    }

    /// Frequency of this event's pitch and tuning.
    pub fn frequency(&self) -> f32 {
        midi_to_frequency(self.pitch, self.tuning)
    }

    /// Convert to the held-note record.
    pub fn note_info(&self) -> NoteInfo {
        NoteInfo {
            id: self.id,
            frequency: self.frequency(),
            velocity: self.velocity,
        }
    }
}

/// Per-block queue of note events, sorted by offset.
///
/// Equal offsets keep arrival order. When full, further events are dropped
/// and counted in [`dropped`](Self::dropped).
#[derive(Debug, Clone)]
pub struct EventScheduler {
    queue: Vec<NoteEvent>,
    cursor: usize,
    dropped: u64,
}

impl EventScheduler {
    /// Empty scheduler with room for [`MAX_EVENTS`].
    pub fn new() -> Self {
        Self {
            queue: Vec::with_capacity(MAX_EVENTS),
            cursor: 0,
            dropped: 0,
        }
    }

    /// Queue an event. Returns `false` if the queue was full.
    pub fn push(&mut self, event: NoteEvent) -> bool {
        if self.queue.len() >= MAX_EVENTS {
            self.dropped += 1;
            return false;
        }
        let at = self.queue.partition_point(|e| e.offset <= event.offset);
        self.queue.insert(at, event);
        true
    }

    /// Next event due at sample `index` of a block of `block_len` samples.
    ///
    /// An event is due once its offset is reached. Events past the end of
    /// the block fall due at the last sample.
    #[inline]
    pub fn next_due(&mut self, index: usize, block_len: usize) -> Option<NoteEvent> {
        let event = *self.queue.get(self.cursor)?;
        let due = event.offset as usize <= index || index + 1 >= block_len;
        if due {
            self.cursor += 1;
            Some(event)
        } else {
            None
        }
    }

    /// Take every remaining event regardless of offset.
    pub fn next_pending(&mut self) -> Option<NoteEvent> {
        let event = *self.queue.get(self.cursor)?;
        self.cursor += 1;
        Some(event)
    }

    /// Forget all events. Called at the end of every block.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.cursor = 0;
    }

    /// Number of queued events not yet applied.
    pub fn pending(&self) -> usize {
        self.queue.len() - self.cursor
    }

    /// Events dropped because the queue was full, since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}
