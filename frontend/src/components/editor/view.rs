//! View rendering for the editor component.

use wasm_bindgen::JsCast;
use web_sys::{DragEvent, Event, HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::helpers::format_file_size;

use super::messages::Msg;
use super::state::EditorComponent;

fn input_value(e: &Event) -> Option<String> {
    let target = e.target()?;
    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        if input.type_() == "checkbox" {
            return Some(if input.checked() { "on" } else { "off" }.to_string());
        }
        return Some(input.value());
    }
    target.dyn_ref::<HtmlSelectElement>().map(|s| s.value())
}

fn on_option(ctx: &Context<EditorComponent>, name: &'static str) -> Callback<Event> {
    ctx.link().callback(move |e: Event| {
        let value = input_value(&e).unwrap_or_default();
        Msg::SetOption(name.to_string(), value)
    })
}

fn checkbox(
    ctx: &Context<EditorComponent>,
    name: &'static str,
    label: &str,
    checked: bool,
    disabled: bool,
) -> Html {
    html! {
        <label class="option-toggle">
            <input
                type="checkbox"
                checked={checked}
                disabled={disabled}
                onchange={on_option(ctx, name)}
            />
            { label }
        </label>
    }
}

fn number(
    ctx: &Context<EditorComponent>,
    name: &'static str,
    label: &str,
    value: String,
    step: &str,
    disabled: bool,
) -> Html {
    html! {
        <label class="option-number">
            { label }
            <input
                type="number"
                step={step.to_string()}
                value={value}
                disabled={disabled}
                onchange={on_option(ctx, name)}
            />
        </label>
    }
}

fn select(
    ctx: &Context<EditorComponent>,
    name: &'static str,
    label: &str,
    selected: &str,
    choices: &[(&'static str, &'static str)],
    disabled: bool,
) -> Html {
    html! {
        <label class="option-select">
            { label }
            <select disabled={disabled} onchange={on_option(ctx, name)}>
                { for choices.iter().map(|(value, text)| html! {
                    <option value={*value} selected={*value == selected}>{ *text }</option>
                }) }
            </select>
        </label>
    }
}

fn file_picker(component: &EditorComponent, ctx: &Context<EditorComponent>) -> Html {
    let on_file_change = ctx.link().callback(|e: Event| {
        let file = e
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        Msg::FileChosen(file)
    });
    let on_drop = ctx.link().callback(|e: DragEvent| {
        e.prevent_default();
        let file = e
            .data_transfer()
            .and_then(|dt| dt.files())
            .and_then(|files| files.get(0));
        Msg::FileChosen(file)
    });
    let on_drag_over = ctx.link().callback(|e: DragEvent| {
        e.prevent_default();
        Msg::DragState(true)
    });
    let on_drag_leave = ctx.link().callback(|_: DragEvent| Msg::DragState(false));
    let on_click = {
        let input_ref = component.file_input_ref.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                input.click();
            }
        })
    };

    let zone_class = if component.drag_active {
        "drop-zone active"
    } else {
        "drop-zone"
    };

    html! {
        <div
            class={zone_class}
            ondrop={on_drop}
            ondragover={on_drag_over}
            ondragleave={on_drag_leave}
            onclick={on_click}
        >
            <input
                ref={component.file_input_ref.clone()}
                type="file"
                accept=".mp4,.avi,.mov,.mkv,.flv,.wmv"
                style="display: none;"
                onchange={on_file_change}
            />
            {
                match &component.file {
                    Some(file) => html! {
                        <p class="file-name">
                            { file.name() }
                            { " (" }{ format_file_size(file.size()) }{ ")" }
                        </p>
                    },
                    None => html! {
                        <p class="file-hint">{ "Drop a video here or click to browse" }</p>
                    },
                }
            }
        </div>
    }
}

fn progress_modal(component: &EditorComponent, ctx: &Context<EditorComponent>) -> Html {
    if let Some(message) = &component.failure {
        let on_dismiss = ctx.link().callback(|_: MouseEvent| Msg::DismissError);
        return html! {
            <div class="progress-overlay">
                <div class="progress-modal error">
                    <p class="progress-label">{ "error" }</p>
                    <p class="error-message">{ message.clone() }</p>
                    <button class="dismiss-button" onclick={on_dismiss}>{ "Close" }</button>
                </div>
            </div>
        };
    }
    let Some(active) = &component.active else {
        return html! {};
    };
    let progress = active.session.progress();
    let on_cancel = ctx.link().callback(|_: MouseEvent| Msg::Cancel);

    html! {
        <div class="progress-overlay">
            <div class="progress-modal">
                <p class="progress-label">{ active.session.label() }</p>
                <div class="progress-track">
                    <div
                        class="progress-fill"
                        style={format!("width: {progress}%;")}
                    />
                </div>
                <p class="progress-percent">{ progress }{ "%" }</p>
                <button class="cancel-button" onclick={on_cancel}>{ "Cancel" }</button>
            </div>
        </div>
    }
}

pub fn view(component: &EditorComponent, ctx: &Context<EditorComponent>) -> Html {
    let o = &component.options;
    let busy = component.busy();
    let on_submit = ctx.link().callback(|_: MouseEvent| Msg::Submit);
    let on_music_change = ctx.link().callback(|e: Event| {
        let file = e
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        Msg::MusicChosen(file)
    });

    html! {
        <section class="editor">
            { file_picker(component, ctx) }

            <div class="options-grid">
                <fieldset>
                    <legend>{ "Cut" }</legend>
                    { number(ctx, "split_time", "Segment length (s)", o.split_time.to_string(), "1", busy) }
                    { number(ctx, "remove_time", "Trim per segment (s)", o.remove_time.to_string(), "0.1", busy) }
                    { select(ctx, "output_quality", "Output quality", o.output_quality.as_str(),
                        &[("720p", "720p"), ("1080p", "1080p"), ("4k", "4K")], busy) }
                </fieldset>

                <fieldset>
                    <legend>{ "Picture" }</legend>
                    { checkbox(ctx, "zoom_enabled", "Zoom", o.zoom_enabled, busy) }
                    { number(ctx, "zoom_factor", "Zoom factor", o.zoom_factor.to_string(), "0.1", busy || !o.zoom_enabled) }
                    { select(ctx, "zoom_type", "Zoom direction", if o.zoom_type == common::model::options::ZoomType::In { "in" } else { "out" },
                        &[("in", "In"), ("out", "Out")], busy || !o.zoom_enabled) }
                    { checkbox(ctx, "mirror_enabled", "Mirror", o.mirror_enabled, busy) }
                    { select(ctx, "mirror_type", "Mirror axis", if o.mirror_type == common::model::options::MirrorType::Horizontal { "horizontal" } else { "vertical" },
                        &[("horizontal", "Horizontal"), ("vertical", "Vertical")], busy || !o.mirror_enabled) }
                    { checkbox(ctx, "rotate_enabled", "Rotate", o.rotate_enabled, busy) }
                    { number(ctx, "rotate_angle", "Angle", o.rotate_angle.to_string(), "90", busy || !o.rotate_enabled) }
                    { checkbox(ctx, "blur_enabled", "Blur", o.blur_enabled, busy) }
                    { number(ctx, "blur_radius", "Blur radius", o.blur_radius.to_string(), "1", busy || !o.blur_enabled) }
                    { checkbox(ctx, "glitch_enabled", "Glitch", o.glitch_enabled, busy) }
                    { checkbox(ctx, "oldfilm_enabled", "Old film look", o.oldfilm_enabled, busy) }
                </fieldset>

                <fieldset>
                    <legend>{ "Motion" }</legend>
                    { checkbox(ctx, "speed_enabled", "Speed change", o.speed_enabled, busy) }
                    { number(ctx, "speed_factor", "Factor", o.speed_factor.to_string(), "0.1", busy || !o.speed_enabled) }
                    { select(ctx, "speed_type", "Direction", if o.speed_type == common::model::options::SpeedType::Fast { "fast" } else { "slow" },
                        &[("fast", "Faster"), ("slow", "Slower")], busy || !o.speed_enabled) }
                    { checkbox(ctx, "freeze_enabled", "Freeze frame", o.freeze_enabled, busy) }
                    { number(ctx, "freeze_duration", "Freeze (s)", o.freeze_duration.to_string(), "0.1", busy || !o.freeze_enabled) }
                    { select(ctx, "transition_type", "Transition", match o.transition_type {
                            common::model::options::TransitionType::None => "none",
                            common::model::options::TransitionType::Fade => "fade",
                            common::model::options::TransitionType::Slide => "slide",
                            common::model::options::TransitionType::Zoom => "zoom",
                        },
                        &[("none", "None"), ("fade", "Fade"), ("slide", "Slide"), ("zoom", "Zoom")], busy) }
                    { number(ctx, "transition_duration", "Transition (s)", o.transition_duration.to_string(), "0.1", busy) }
                </fieldset>

                <fieldset>
                    <legend>{ "Text" }</legend>
                    { checkbox(ctx, "text_enabled", "Overlay text", o.text_enabled, busy) }
                    <label class="option-text">
                        { "Text" }
                        <input
                            type="text"
                            value={o.text_content.clone()}
                            disabled={busy || !o.text_enabled}
                            onchange={on_option(ctx, "text_content")}
                        />
                    </label>
                    { number(ctx, "text_size", "Size", o.text_size.to_string(), "1", busy || !o.text_enabled) }
                    <label class="option-text">
                        { "Color" }
                        <input
                            type="text"
                            value={o.text_color.clone()}
                            disabled={busy || !o.text_enabled}
                            onchange={on_option(ctx, "text_color")}
                        />
                    </label>
                    { select(ctx, "text_position", "Position", o.text_position.as_str(),
                        &[("center", "Center"), ("top", "Top"), ("bottom", "Bottom"), ("watermark", "Watermark")], busy || !o.text_enabled) }
                </fieldset>

                <fieldset>
                    <legend>{ "Sound" }</legend>
                    { checkbox(ctx, "noise_reduction", "Noise reduction", o.noise_reduction, busy) }
                    { number(ctx, "noise_strength", "Strength", o.noise_strength.to_string(), "0.1", busy || !o.noise_reduction) }
                    { checkbox(ctx, "music_enabled", "Background music", o.music_enabled, busy) }
                    { number(ctx, "music_volume", "Music volume", o.music_volume.to_string(), "0.1", busy || !o.music_enabled) }
                    <label class="option-file">
                        { "Track" }
                        <input
                            ref={component.music_input_ref.clone()}
                            type="file"
                            accept="audio/*"
                            disabled={busy || !o.music_enabled}
                            onchange={on_music_change}
                        />
                    </label>
                </fieldset>
            </div>

            <button
                class="submit-button"
                disabled={busy || component.file.is_none()}
                onclick={on_submit}
            >
                { if component.submitting { "Uploading..." } else { "Process video" } }
            </button>

            { progress_modal(component, ctx) }
        </section>
    }
}
