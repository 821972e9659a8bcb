use crate::board_core::{Note, NoteAction, NoteId, Point, Size};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize,
}

/// Pointer gesture over a single note, from press to release.
///
/// `Idle` is the only "nothing selected" state, so every note id, including
/// zero, can be the target of an active gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Active {
        note: NoteId,
        kind: GestureKind,
        pointer_start: Point,
        position_start: Point,
        size_start: Size,
    },
}

impl Gesture {
    pub fn begin(kind: GestureKind, note: &Note, pointer: Point) -> Self {
        Gesture::Active {
            note: note.id,
            kind,
            pointer_start: pointer,
            position_start: note.position,
            size_start: note.size,
        }
    }

    pub fn note(&self) -> Option<NoteId> {
        match self {
            Gesture::Idle => None,
            Gesture::Active { note, .. } => Some(*note),
        }
    }

    /// Pointer position minus note origin at press time. Only moves carry one.
    pub fn drag_offset(&self) -> Option<Point> {
        match self {
            Gesture::Active {
                kind: GestureKind::Move,
                pointer_start,
                position_start,
                ..
            } => Some(*pointer_start - *position_start),
            _ => None,
        }
    }

    /// Maps a pointer sample to the store action it implies.
    pub fn track(&self, pointer: Point) -> Option<NoteAction> {
        let Gesture::Active {
            note,
            kind,
            pointer_start,
            size_start,
            ..
        } = *self
        else {
            return None;
        };

        match kind {
            GestureKind::Move => self.drag_offset().map(|offset| NoteAction::Move {
                id: note,
                position: pointer - offset,
            }),
            GestureKind::Resize => {
                let delta = pointer - pointer_start;
                Some(NoteAction::Resize {
                    id: note,
                    size: Size::new(size_start.width + delta.x, size_start.height + delta.y)
                        .clamped(),
                })
            }
        }
    }

    /// Returns to `Idle`, handing back the note the gesture was holding.
    pub fn release(&mut self) -> Option<NoteId> {
        let released = self.note();
        *self = Gesture::Idle;
        released
    }
}
