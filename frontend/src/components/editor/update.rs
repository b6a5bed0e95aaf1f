//! Update function for the editor component, Elm style: fold one `Msg`
//! into the state, spawn side effects through the link, return whether the
//! view must re-render.
//!
//! Lifecycle rules enforced here:
//! - one tracked job at a time, controls stay locked while it runs;
//! - the poll interval lives inside [`ActiveJob`], so clearing
//!   `component.active` is what stops polling;
//! - terminal side effects (prompt, toast, jobs refresh) fire exactly once,
//!   the session's own guard covers late responses;
//! - a failed poll tick is logged and swallowed, never treated as terminal;
//! - cancel is optimistic: the UI unlocks immediately, the server request
//!   runs in the background.

use gloo_timers::callback::Interval;
use wasm_bindgen::JsValue;
use web_sys::{File, FormData};
use yew::platform::spawn_local;
use yew::prelude::*;

use common::jobs::poll::{PollOutcome, PollSession, STATUS_POLL_MS, Terminal};
use common::model::options::EffectOptions;

use crate::api;
use crate::helpers::show_toast;

use super::messages::Msg;
use super::state::{ActiveJob, EditorComponent};

fn build_form(
    file: &File,
    music: Option<&File>,
    options: &EffectOptions,
) -> Result<FormData, JsValue> {
    let form = FormData::new()?;
    form.append_with_blob_and_filename("video", file, &file.name())?;
    if options.music_enabled {
        if let Some(track) = music {
            form.append_with_blob_and_filename("music", track, &track.name())?;
        }
    }
    for (name, value) in options.to_fields() {
        form.append_with_str(name, &value)?;
    }
    Ok(form)
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// The message shown in the modal's error state: the server's text
/// verbatim, with a generic fallback when it sent none.
pub(super) fn error_label(message: Option<String>) -> String {
    message.unwrap_or_else(|| "Processing failed.".to_string())
}

/// Applies the one-shot side effects of a successful or cancelled end.
/// Errors are not handled here; they stay visible in the modal instead.
fn finish(terminal: Terminal) {
    match terminal {
        Terminal::Completed {
            preview_url,
            output_url,
        } => match preview_url.or(output_url) {
            Some(url) => {
                if confirm("Your video is ready. Open it now?") {
                    if let Some(window) = web_sys::window() {
                        let _ = window.open_with_url(&url);
                    }
                }
            }
            None => show_toast("Processing complete."),
        },
        Terminal::Error { .. } => {}
        Terminal::Cancelled => show_toast("Job cancelled."),
    }
}

pub fn update(component: &mut EditorComponent, ctx: &Context<EditorComponent>, msg: Msg) -> bool {
    match msg {
        Msg::FileChosen(file) => {
            component.file = file;
            component.drag_active = false;
            true
        }
        Msg::MusicChosen(file) => {
            component.music = file;
            true
        }
        Msg::DragState(active) => {
            if component.drag_active != active {
                component.drag_active = active;
                return true;
            }
            false
        }
        Msg::SetOption(name, value) => {
            component.options.set_field(&name, &value);
            true
        }
        Msg::Submit => {
            if component.busy() {
                return false;
            }
            let Some(file) = component.file.clone() else {
                show_toast("Choose a video file first.");
                return false;
            };
            let form = match build_form(&file, component.music.as_ref(), &component.options) {
                Ok(form) => form,
                Err(e) => {
                    gloo_console::error!("building upload form failed:", e);
                    alert("Could not prepare the upload.");
                    return false;
                }
            };
            component.submitting = true;
            component.failure = None;
            let link = ctx.link().clone();
            spawn_local(async move {
                match api::submit_job("/upload", form).await {
                    Ok(resp) => link.send_message(Msg::SubmitAccepted(resp.job_id)),
                    Err(e) => link.send_message(Msg::SubmitFailed(e.message())),
                }
            });
            true
        }
        Msg::SubmitAccepted(job_id) => {
            component.submitting = false;
            let session = PollSession::new(job_id);
            let link = ctx.link().clone();
            let interval =
                Interval::new(STATUS_POLL_MS, move || link.send_message(Msg::PollTick));
            component.active = Some(ActiveJob {
                session,
                _interval: interval,
            });
            true
        }
        Msg::SubmitFailed(message) => {
            // No session was created, so nothing to tear down.
            component.submitting = false;
            alert(&format!("Upload failed: {message}"));
            true
        }
        Msg::PollTick => {
            let Some(active) = &component.active else {
                return false;
            };
            let job_id = active.session.job_id().to_string();
            let link = ctx.link().clone();
            spawn_local(async move {
                match api::fetch_status(&job_id).await {
                    Ok(status) => link.send_message(Msg::StatusReceived(status)),
                    Err(e) => link.send_message(Msg::PollFailed(e.message())),
                }
            });
            false
        }
        Msg::StatusReceived(status) => {
            let Some(active) = &mut component.active else {
                return false;
            };
            match active.session.observe(&status) {
                PollOutcome::Continue => true,
                PollOutcome::AlreadyFinished => false,
                PollOutcome::Finished(terminal) => {
                    // Dropping the active job stops the interval.
                    component.active = None;
                    ctx.props().on_job_finished.emit(());
                    if let Terminal::Error { message } = terminal {
                        component.failure = Some(error_label(message));
                    } else {
                        finish(terminal);
                    }
                    true
                }
            }
        }
        Msg::PollFailed(message) => {
            let Some(active) = &mut component.active else {
                return false;
            };
            let failures = active.session.observe_failure();
            gloo_console::error!(format!(
                "status poll failed ({failures} in a row): {message}"
            ));
            false
        }
        Msg::Cancel => {
            if component.active.is_none() || !confirm("Cancel this job?") {
                return false;
            }
            let Some(mut active) = component.active.take() else {
                return false;
            };
            let outcome = active.session.cancel_locally();
            if matches!(outcome, PollOutcome::Finished(_)) {
                ctx.props().on_job_finished.emit(());
                let job_id = active.session.job_id().to_string();
                let link = ctx.link().clone();
                spawn_local(async move {
                    if let Err(e) = api::cancel_job(&job_id).await {
                        link.send_message(Msg::CancelRejected(e.message()));
                    }
                });
                show_toast("Job cancelled.");
            }
            true
        }
        Msg::CancelRejected(message) => {
            show_toast(&format!("Cancel request failed: {message}"));
            false
        }
        Msg::DismissError => {
            if component.failure.take().is_some() {
                return true;
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_label_keeps_server_message_verbatim() {
        assert_eq!(
            error_label(Some("ffmpeg exited with code 1".to_string())),
            "ffmpeg exited with code 1"
        );
    }

    #[test]
    fn error_label_falls_back_when_server_sent_none() {
        assert_eq!(error_label(None), "Processing failed.");
    }
}
