//! The user's current choices and the views derived from them

pub mod debounce;
pub mod palette;
pub mod state;

pub use debounce::{Debouncer, TextCommit, TextField, TextInputs};
pub use palette::{applicable_colour_sets, is_applicable_key, RESERVED_COLOUR_KEY};
pub use state::{
    with_skin_added, with_skin_removed, ColourOverrides, LoadTicket, RenderFlags, Selection,
    SelectionPhase, SelectionState, DEFAULT_TEXT_SIZE, JUST_HEAD_SKIN,
};
