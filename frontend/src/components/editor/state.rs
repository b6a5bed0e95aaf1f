//! State container for the editor component.

use gloo_timers::callback::Interval;
use web_sys::File;
use yew::prelude::*;

use common::jobs::poll::PollSession;
use common::model::options::EffectOptions;

/// One tracked submission: the polling protocol state plus the interval
/// driving it. Dropping the struct stops the interval, so clearing
/// `EditorComponent::active` is the single way polling ends.
pub struct ActiveJob {
    pub session: PollSession,
    pub _interval: Interval,
}

pub struct EditorComponent {
    /// The video picked for the next submission.
    pub file: Option<File>,
    /// Optional background track, only sent when the music effect is on.
    pub music: Option<File>,
    pub drag_active: bool,
    pub options: EffectOptions,
    /// Present from submission acceptance until terminal observation.
    pub active: Option<ActiveJob>,
    /// Server-reported failure of the last tracked job; keeps the modal up
    /// in its error state until dismissed.
    pub failure: Option<String>,
    /// True while the upload request is in flight.
    pub submitting: bool,
    pub file_input_ref: NodeRef,
    pub music_input_ref: NodeRef,
}

impl EditorComponent {
    pub fn new() -> Self {
        EditorComponent {
            file: None,
            music: None,
            drag_active: false,
            options: EffectOptions::default(),
            active: None,
            failure: None,
            submitting: false,
            file_input_ref: Default::default(),
            music_input_ref: Default::default(),
        }
    }

    /// Controls are locked while an upload or a tracked job is running.
    pub fn busy(&self) -> bool {
        self.submitting || self.active.is_some()
    }
}
