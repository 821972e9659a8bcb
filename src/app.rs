use leptos::ev;
use leptos::logging::{log, warn};
use leptos::prelude::*;
use leptos::web_sys::{MouseEvent, TouchEvent};
use wasm_bindgen::JsValue;

use crate::board_core::{Entropy, Note, NoteAction, NoteId, NoteStore, Point, Viewport};
use crate::config::BoardConfig;
use crate::gesture::{Gesture, GestureKind};
use crate::pointer::PointerInput;
use crate::storage::{BrowserStorage, NotePersistence};

struct BrowserEntropy;

impl Entropy for BrowserEntropy {
    fn now_ms(&mut self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn unit(&mut self) -> f64 {
        js_sys::Math::random()
    }
}

fn viewport_size() -> Viewport {
    let win = window();
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport {
        width: dim(win.inner_width()),
        height: dim(win.inner_height()),
    }
}

pub fn note_style(note: &Note) -> String {
    format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; background-color: {};",
        note.position.x, note.position.y, note.size.width, note.size.height, note.color
    )
}

#[component]
pub fn App() -> impl IntoView {
    let config = BoardConfig::from_query(&window().location().search().unwrap_or_default());
    let persistence = StoredValue::new(NotePersistence::new(BrowserStorage, config.storage_key));
    let initial = persistence.with_value(|p| p.load());
    persistence.with_value(|p| log!("loaded {} notes from {}", initial.len(), p.key()));

    let (notes, set_notes) = signal(initial);
    let gesture = StoredValue::new(Gesture::Idle);
    let listeners = StoredValue::new(Vec::<WindowListenerHandle>::new());

    let commit = move |next: NoteStore| {
        persistence.with_value(|p| {
            if let Err(err) = p.save(&next) {
                warn!("{err}");
            }
        });
        set_notes.set(next);
    };

    let dispatch = move |action: NoteAction| {
        let deleted = matches!(action, NoteAction::Delete { .. }).then(|| action.note());
        if let Some(next) = notes.with_untracked(|store| store.apply(action)) {
            commit(next);
            if let Some(id) = deleted {
                log!("deleted note {id}");
            }
        }
    };

    let add_note = move |_: MouseEvent| {
        let (next, id) =
            notes.with_untracked(|store| store.create(viewport_size(), &mut BrowserEntropy));
        commit(next);
        log!("created note {id}");
    };

    let end_gesture = move || -> Option<NoteId> {
        let mut current = gesture.get_value();
        let released = current.release();
        gesture.set_value(current);
        listeners.update_value(|handles| {
            for handle in handles.drain(..) {
                handle.remove();
            }
        });
        released
    };

    let track = move |pointer: Option<Point>| {
        let Some(pointer) = pointer else { return };
        if let Some(action) = gesture.with_value(|g| g.track(pointer)) {
            dispatch(action);
        }
    };

    // Window listeners live exactly as long as the gesture; a press while a
    // previous gesture is still active (lost release) restarts cleanly.
    let begin_gesture = move |kind: GestureKind, id: NoteId, pointer: Option<Point>| {
        let Some(pointer) = pointer else { return };
        let Some(next) = notes.with_untracked(|store| {
            store.get(id).map(|note| Gesture::begin(kind, note, pointer))
        }) else {
            return;
        };
        if let Some(stuck) = end_gesture() {
            log!("restarting gesture; released note {stuck}");
        }
        gesture.set_value(next);
        listeners.set_value(vec![
            window_event_listener(ev::mousemove, move |e| track(e.client_point())),
            window_event_listener(ev::touchmove, move |e| track(e.client_point())),
            window_event_listener(ev::mouseup, move |_| {
                end_gesture();
            }),
            window_event_listener(ev::touchend, move |_| {
                end_gesture();
            }),
            window_event_listener(ev::touchcancel, move |_| {
                end_gesture();
            }),
        ]);
    };

    on_cleanup(move || {
        if let Some(id) = end_gesture() {
            log!("dropping gesture on note {id} at teardown");
        }
    });

    view! {
        <main class="board">
            <button class="add-button" on:click=add_note>
                "+ New Note"
            </button>
            <For
                each=move || notes.with(|store| store.ids())
                key=|id| *id
                children=move |id| note_card(id, notes, dispatch, begin_gesture)
            />
        </main>
    }
}

fn note_card(
    id: NoteId,
    notes: ReadSignal<NoteStore>,
    dispatch: impl Fn(NoteAction) + Copy + Send + Sync + 'static,
    begin_gesture: impl Fn(GestureKind, NoteId, Option<Point>) + Copy + Send + Sync + 'static,
) -> impl IntoView {
    let note = Memo::new(move |_| notes.with(|store| store.get(id).cloned()));
    let style = move || note.with(|n| n.as_ref().map(note_style).unwrap_or_default());
    let text = move || note.with(|n| n.as_ref().map(|n| n.text.clone()).unwrap_or_default());

    view! {
        <div
            class="note"
            style=style
            on:mousedown=move |e: MouseEvent| begin_gesture(GestureKind::Move, id, e.client_point())
            on:touchstart=move |e: TouchEvent| begin_gesture(GestureKind::Move, id, e.client_point())
        >
            <button
                class="delete-button"
                title="Delete note"
                on:mousedown=|e: MouseEvent| e.stop_propagation()
                on:touchstart=|e: TouchEvent| e.stop_propagation()
                on:click=move |_| dispatch(NoteAction::Delete { id })
            >
                "×"
            </button>
            <textarea
                prop:value=text
                on:input=move |e| dispatch(NoteAction::UpdateText { id, text: event_target_value(&e) })
                placeholder="Type your note here..."
            ></textarea>
            <div
                class="resize-handle"
                on:mousedown=move |e: MouseEvent| {
                    e.stop_propagation();
                    e.prevent_default();
                    begin_gesture(GestureKind::Resize, id, e.client_point());
                }
                on:touchstart=move |e: TouchEvent| {
                    e.stop_propagation();
                    begin_gesture(GestureKind::Resize, id, e.client_point());
                }
            ></div>
        </div>
    }
}
