use common::jobs::StatusResponse;
use web_sys::File;

pub enum Msg {
    FileChosen(Option<File>),
    MusicChosen(Option<File>),
    DragState(bool),
    /// One form control changed: `(field name, raw value)`.
    SetOption(String, String),
    Submit,
    SubmitAccepted(String),
    SubmitFailed(String),
    PollTick,
    StatusReceived(StatusResponse),
    PollFailed(String),
    Cancel,
    CancelRejected(String),
    DismissError,
}
