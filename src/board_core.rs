use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Sub;
use std::sync::OnceLock;

pub type NoteId = u64;

pub const MIN_NOTE_SIDE: f64 = 200.0;
pub const DEFAULT_NOTE_SIZE: Size = Size {
    width: 200.0,
    height: 200.0,
};
pub const PALETTE: [&str; 5] = ["#ffd700", "#ff7eb9", "#7afcff", "#98fb98", "#ffa07a"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Raises each side to `MIN_NOTE_SIDE`; non-finite sides land on the minimum.
    pub fn clamped(self) -> Self {
        let side = |v: f64| if v.is_finite() { v.max(MIN_NOTE_SIDE) } else { MIN_NOTE_SIDE };
        Self {
            width: side(self.width),
            height: side(self.height),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        DEFAULT_NOTE_SIZE
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    pub position: Point,
    pub color: String,
    pub size: Size,
}

/// Source of ids and placement randomness for new notes.
pub trait Entropy {
    fn now_ms(&mut self) -> u64;
    /// Uniform sample in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

#[derive(Clone, Debug, PartialEq)]
pub enum NoteAction {
    UpdateText { id: NoteId, text: String },
    Move { id: NoteId, position: Point },
    Resize { id: NoteId, size: Size },
    Delete { id: NoteId },
}

impl NoteAction {
    pub fn note(&self) -> NoteId {
        match self {
            NoteAction::UpdateText { id, .. }
            | NoteAction::Move { id, .. }
            | NoteAction::Resize { id, .. }
            | NoteAction::Delete { id } => *id,
        }
    }
}

/// Records fixed while loading persisted notes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub duplicate_ids: usize,
    pub undersized: usize,
    pub bad_colors: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Immutable snapshot of the board. Every mutation returns a new snapshot;
/// operations on an unknown id return `None` and leave `self` untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteStore {
    notes: Vec<Note>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from untrusted records, keeping the first note for
    /// each id and forcing sizes and colors back into range.
    pub fn from_notes(raw: Vec<Note>) -> (Self, RepairReport) {
        let mut report = RepairReport::default();
        let mut seen = HashSet::new();
        let mut notes = Vec::with_capacity(raw.len());
        for mut note in raw {
            if !seen.insert(note.id) {
                report.duplicate_ids += 1;
                continue;
            }
            let size = note.size.clamped();
            if size != note.size {
                report.undersized += 1;
                note.size = size;
            }
            if !is_css_hex_color(&note.color) {
                report.bad_colors += 1;
                note.color = PALETTE[0].to_string();
            }
            notes.push(note);
        }
        (Self { notes }, report)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn ids(&self) -> Vec<NoteId> {
        self.notes.iter().map(|note| note.id).collect()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn create(&self, viewport: Viewport, entropy: &mut impl Entropy) -> (Self, NoteId) {
        let id = self.fresh_id(entropy.now_ms());
        let size = DEFAULT_NOTE_SIZE;
        let x = entropy.unit() * (viewport.width - size.width).max(0.0);
        let y = entropy.unit() * (viewport.height - size.height).max(0.0);
        let color = PALETTE[pick_index(entropy.unit(), PALETTE.len())].to_string();

        let mut notes = self.notes.clone();
        notes.push(Note {
            id,
            text: String::new(),
            position: Point::new(x, y),
            color,
            size,
        });
        (Self { notes }, id)
    }

    pub fn update_text(&self, id: NoteId, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        self.replace(id, |note| note.text = text)
    }

    pub fn move_to(&self, id: NoteId, position: Point) -> Option<Self> {
        self.replace(id, |note| note.position = position)
    }

    pub fn resize(&self, id: NoteId, size: Size) -> Option<Self> {
        let size = size.clamped();
        self.replace(id, |note| note.size = size)
    }

    pub fn delete(&self, id: NoteId) -> Option<Self> {
        let idx = self.index_of(id)?;
        let mut notes = self.notes.clone();
        notes.remove(idx);
        Some(Self { notes })
    }

    pub fn apply(&self, action: NoteAction) -> Option<Self> {
        match action {
            NoteAction::UpdateText { id, text } => self.update_text(id, text),
            NoteAction::Move { id, position } => self.move_to(id, position),
            NoteAction::Resize { id, size } => self.resize(id, size),
            NoteAction::Delete { id } => self.delete(id),
        }
    }

    fn index_of(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    fn replace(&self, id: NoteId, edit: impl FnOnce(&mut Note)) -> Option<Self> {
        let idx = self.index_of(id)?;
        let mut notes = self.notes.clone();
        edit(&mut notes[idx]);
        Some(Self { notes })
    }

    // Clock ids collide when two notes land in the same millisecond or the
    // clock steps back; fall past the newest live id in that case. A stored id
    // of `u64::MAX` leaves nothing above it, so take the lowest free id instead.
    fn fresh_id(&self, now_ms: u64) -> NoteId {
        match self.notes.iter().map(|note| note.id).max() {
            Some(max) if now_ms <= max => max
                .checked_add(1)
                .unwrap_or_else(|| self.lowest_free_id()),
            _ => now_ms,
        }
    }

    fn lowest_free_id(&self) -> NoteId {
        let taken: HashSet<NoteId> = self.notes.iter().map(|note| note.id).collect();
        (0..=NoteId::MAX)
            .find(|id| !taken.contains(id))
            .unwrap_or_default()
    }
}

fn pick_index(sample: f64, len: usize) -> usize {
    let idx = (sample * len as f64).floor();
    if idx.is_finite() && idx > 0.0 {
        (idx as usize).min(len - 1)
    } else {
        0
    }
}

pub fn is_css_hex_color(value: &str) -> bool {
    static RE_HEX: OnceLock<Regex> = OnceLock::new();
    let re_hex = RE_HEX
        .get_or_init(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());
    re_hex.is_match(value)
}
