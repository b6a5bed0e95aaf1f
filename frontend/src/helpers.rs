//! Small DOM and formatting helpers shared across components.

use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

/// Displays a temporary notification message at the bottom of the screen.
/// The toast removes itself after a few seconds.
pub fn show_toast(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let (Ok(toast), Some(body)) = (document.create_element("div"), document.body()) {
                toast.set_text_content(Some(message));
                let html_toast: HtmlElement = toast.unchecked_into();
                let style = html_toast.style();
                style.set_property("position", "fixed").ok();
                style.set_property("bottom", "20px").ok();
                style.set_property("left", "50%").ok();
                style.set_property("transform", "translateX(-50%)").ok();
                style.set_property("background", "rgba(0, 0, 0, 0.8)").ok();
                style.set_property("color", "#fff").ok();
                style.set_property("padding", "10px 20px").ok();
                style.set_property("border-radius", "4px").ok();
                style.set_property("z-index", "10000").ok();
                style.set_property("font-family", "Arial, sans-serif").ok();

                if body.append_child(&html_toast).is_ok() {
                    wasm_bindgen_futures::spawn_local(async move {
                        gloo_timers::future::TimeoutFuture::new(3000).await;
                        if let Some(parent) = html_toast.parent_node() {
                            parent.remove_child(&html_toast).ok();
                        }
                    });
                }
            }
        }
    }
}

/// Human-readable file size for the upload preview.
pub fn format_file_size(bytes: f64) -> String {
    if bytes < 1024.0 {
        format!("{bytes:.0} B")
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.1} KB", bytes / 1024.0)
    } else {
        format!("{:.1} MB", bytes / (1024.0 * 1024.0))
    }
}

/// Shortens long filenames for the jobs table, keeping the extension visible.
pub fn truncate_filename(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    let keep = max.saturating_sub(ext.len() + 4).max(1);
    let head: String = name.chars().take(keep).collect();
    if ext.is_empty() {
        format!("{head}...")
    } else {
        format!("{head}....{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes_pick_sensible_units() {
        assert_eq!(format_file_size(512.0), "512 B");
        assert_eq!(format_file_size(2048.0), "2.0 KB");
        assert_eq!(format_file_size(5.5 * 1024.0 * 1024.0), "5.5 MB");
    }

    #[test]
    fn short_names_pass_through() {
        assert_eq!(truncate_filename("clip.mp4", 20), "clip.mp4");
    }

    #[test]
    fn long_names_keep_the_extension() {
        let name = "a_very_long_recording_from_my_phone_2024.mp4";
        let short = truncate_filename(name, 20);
        assert!(short.len() <= 24);
        assert!(short.ends_with(".mp4"));
        assert!(short.starts_with("a_very_long"));
    }
}
