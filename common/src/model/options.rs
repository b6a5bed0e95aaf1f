//! Edit options submitted alongside an upload.
//!
//! The upload form sends one text field per option next to the video file
//! part. Field names are the wire contract (`split_time`, `zoom_enabled`,
//! ...); checkbox fields carry `"on"`/`"off"`. Parsing is lenient the way
//! the form always was: unknown fields are ignored and malformed values
//! fall back to the defaults instead of failing the upload.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[serde(rename = "720p")]
    Hd720,
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "4k")]
    Uhd4k,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Hd720 => "720p",
            Quality::Hd1080 => "1080p",
            Quality::Uhd4k => "4k",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "720p" => Some(Quality::Hd720),
            "1080p" => Some(Quality::Hd1080),
            "4k" => Some(Quality::Uhd4k),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomType {
    #[default]
    In,
    Out,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorType {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedType {
    #[default]
    Fast,
    Slow,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    #[default]
    Center,
    Top,
    Bottom,
    Watermark,
}

impl TextPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            TextPosition::Center => "center",
            TextPosition::Top => "top",
            TextPosition::Bottom => "bottom",
            TextPosition::Watermark => "watermark",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    #[default]
    None,
    Fade,
    Slide,
    Zoom,
}

/// The full effect/option form for one edit run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectOptions {
    /// Segment length in seconds the source is split into.
    pub split_time: u32,
    /// Seconds trimmed from the end of each full-length segment.
    pub remove_time: f32,
    pub output_quality: Quality,

    pub zoom_enabled: bool,
    pub zoom_factor: f32,
    pub zoom_type: ZoomType,

    pub freeze_enabled: bool,
    pub freeze_duration: f32,

    pub mirror_enabled: bool,
    pub mirror_type: MirrorType,

    pub rotate_enabled: bool,
    pub rotate_angle: i32,

    pub blur_enabled: bool,
    pub blur_radius: u32,

    pub glitch_enabled: bool,
    pub glitch_intensity: f32,

    pub oldfilm_enabled: bool,

    pub speed_enabled: bool,
    pub speed_factor: f32,
    pub speed_type: SpeedType,

    pub text_enabled: bool,
    pub text_content: String,
    pub text_size: u32,
    pub text_color: String,
    pub text_position: TextPosition,

    pub noise_reduction: bool,
    pub noise_strength: f32,

    pub transition_type: TransitionType,
    pub transition_duration: f32,

    pub music_enabled: bool,
    pub music_volume: f32,
}

impl Default for EffectOptions {
    fn default() -> Self {
        EffectOptions {
            split_time: 6,
            remove_time: 1.0,
            output_quality: Quality::default(),
            zoom_enabled: false,
            zoom_factor: 1.5,
            zoom_type: ZoomType::default(),
            freeze_enabled: false,
            freeze_duration: 1.0,
            mirror_enabled: false,
            mirror_type: MirrorType::default(),
            rotate_enabled: false,
            rotate_angle: 90,
            blur_enabled: false,
            blur_radius: 5,
            glitch_enabled: false,
            glitch_intensity: 0.1,
            oldfilm_enabled: false,
            speed_enabled: false,
            speed_factor: 1.5,
            speed_type: SpeedType::default(),
            text_enabled: false,
            text_content: String::new(),
            text_size: 40,
            text_color: "white".to_string(),
            text_position: TextPosition::default(),
            noise_reduction: false,
            noise_strength: 0.5,
            transition_type: TransitionType::default(),
            transition_duration: 1.0,
            music_enabled: false,
            music_volume: 0.5,
        }
    }
}

fn flag(value: &str) -> bool {
    value == "on"
}

fn flag_str(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}

impl EffectOptions {
    /// Applies one form field. Unknown names and unparsable values leave
    /// the current value untouched.
    pub fn set_field(&mut self, name: &str, value: &str) {
        match name {
            "split_time" => {
                if let Ok(v) = value.parse::<u32>() {
                    if v > 0 {
                        self.split_time = v;
                    }
                }
            }
            "remove_time" => {
                if let Ok(v) = value.parse::<f32>() {
                    if v >= 0.0 {
                        self.remove_time = v;
                    }
                }
            }
            "output_quality" => {
                if let Some(q) = Quality::parse(value) {
                    self.output_quality = q;
                }
            }
            "zoom_enabled" => self.zoom_enabled = flag(value),
            "zoom_factor" => {
                if let Ok(v) = value.parse::<f32>() {
                    if v > 1.0 {
                        self.zoom_factor = v;
                    }
                }
            }
            "zoom_type" => {
                self.zoom_type = match value {
                    "out" => ZoomType::Out,
                    "in" => ZoomType::In,
                    _ => self.zoom_type,
                }
            }
            "freeze_enabled" => self.freeze_enabled = flag(value),
            "freeze_duration" => {
                if let Ok(v) = value.parse::<f32>() {
                    if v > 0.0 {
                        self.freeze_duration = v;
                    }
                }
            }
            "mirror_enabled" => self.mirror_enabled = flag(value),
            "mirror_type" => {
                self.mirror_type = match value {
                    "vertical" => MirrorType::Vertical,
                    "horizontal" => MirrorType::Horizontal,
                    _ => self.mirror_type,
                }
            }
            "rotate_enabled" => self.rotate_enabled = flag(value),
            "rotate_angle" => {
                if let Ok(v) = value.parse::<i32>() {
                    self.rotate_angle = v;
                }
            }
            "blur_enabled" => self.blur_enabled = flag(value),
            "blur_radius" => {
                if let Ok(v) = value.parse::<u32>() {
                    if v > 0 {
                        self.blur_radius = v;
                    }
                }
            }
            "glitch_enabled" => self.glitch_enabled = flag(value),
            "glitch_intensity" => {
                if let Ok(v) = value.parse::<f32>() {
                    if (0.0..=1.0).contains(&v) {
                        self.glitch_intensity = v;
                    }
                }
            }
            "oldfilm_enabled" => self.oldfilm_enabled = flag(value),
            "speed_enabled" => self.speed_enabled = flag(value),
            "speed_factor" => {
                if let Ok(v) = value.parse::<f32>() {
                    if v > 1.0 {
                        self.speed_factor = v;
                    }
                }
            }
            "speed_type" => {
                self.speed_type = match value {
                    "slow" => SpeedType::Slow,
                    "fast" => SpeedType::Fast,
                    _ => self.speed_type,
                }
            }
            "text_enabled" => self.text_enabled = flag(value),
            "text_content" => self.text_content = value.to_string(),
            "text_size" => {
                if let Ok(v) = value.parse::<u32>() {
                    if v > 0 {
                        self.text_size = v;
                    }
                }
            }
            "text_color" => {
                if !value.is_empty() {
                    self.text_color = value.to_string();
                }
            }
            "text_position" => {
                self.text_position = match value {
                    "center" => TextPosition::Center,
                    "top" => TextPosition::Top,
                    "bottom" => TextPosition::Bottom,
                    "watermark" => TextPosition::Watermark,
                    _ => self.text_position,
                }
            }
            "noise_reduction" => self.noise_reduction = flag(value),
            "noise_strength" => {
                if let Ok(v) = value.parse::<f32>() {
                    if (0.0..=1.0).contains(&v) {
                        self.noise_strength = v;
                    }
                }
            }
            "transition_type" => {
                self.transition_type = match value {
                    "none" => TransitionType::None,
                    "fade" => TransitionType::Fade,
                    "slide" => TransitionType::Slide,
                    "zoom" => TransitionType::Zoom,
                    _ => self.transition_type,
                }
            }
            "transition_duration" => {
                if let Ok(v) = value.parse::<f32>() {
                    if v > 0.0 {
                        self.transition_duration = v;
                    }
                }
            }
            "music_enabled" => self.music_enabled = flag(value),
            "music_volume" => {
                if let Ok(v) = value.parse::<f32>() {
                    if (0.0..=1.0).contains(&v) {
                        self.music_volume = v;
                    }
                }
            }
            _ => {}
        }
    }

    /// Builds options from collected multipart text fields.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut opts = EffectOptions::default();
        for (name, value) in fields {
            opts.set_field(name, value);
        }
        opts
    }

    /// Flattens the options back into `(field, value)` pairs for a
    /// multipart submission. Inverse of `from_fields` for every field.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("split_time", self.split_time.to_string()),
            ("remove_time", self.remove_time.to_string()),
            ("output_quality", self.output_quality.as_str().to_string()),
            ("zoom_enabled", flag_str(self.zoom_enabled)),
            ("zoom_factor", self.zoom_factor.to_string()),
            (
                "zoom_type",
                match self.zoom_type {
                    ZoomType::In => "in",
                    ZoomType::Out => "out",
                }
                .to_string(),
            ),
            ("freeze_enabled", flag_str(self.freeze_enabled)),
            ("freeze_duration", self.freeze_duration.to_string()),
            ("mirror_enabled", flag_str(self.mirror_enabled)),
            (
                "mirror_type",
                match self.mirror_type {
                    MirrorType::Horizontal => "horizontal",
                    MirrorType::Vertical => "vertical",
                }
                .to_string(),
            ),
            ("rotate_enabled", flag_str(self.rotate_enabled)),
            ("rotate_angle", self.rotate_angle.to_string()),
            ("blur_enabled", flag_str(self.blur_enabled)),
            ("blur_radius", self.blur_radius.to_string()),
            ("glitch_enabled", flag_str(self.glitch_enabled)),
            ("glitch_intensity", self.glitch_intensity.to_string()),
            ("oldfilm_enabled", flag_str(self.oldfilm_enabled)),
            ("speed_enabled", flag_str(self.speed_enabled)),
            ("speed_factor", self.speed_factor.to_string()),
            (
                "speed_type",
                match self.speed_type {
                    SpeedType::Fast => "fast",
                    SpeedType::Slow => "slow",
                }
                .to_string(),
            ),
            ("text_enabled", flag_str(self.text_enabled)),
            ("text_content", self.text_content.clone()),
            ("text_size", self.text_size.to_string()),
            ("text_color", self.text_color.clone()),
            ("text_position", self.text_position.as_str().to_string()),
            ("noise_reduction", flag_str(self.noise_reduction)),
            ("noise_strength", self.noise_strength.to_string()),
            (
                "transition_type",
                match self.transition_type {
                    TransitionType::None => "none",
                    TransitionType::Fade => "fade",
                    TransitionType::Slide => "slide",
                    TransitionType::Zoom => "zoom",
                }
                .to_string(),
            ),
            ("transition_duration", self.transition_duration.to_string()),
            ("music_enabled", flag_str(self.music_enabled)),
            ("music_volume", self.music_volume.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_form() {
        let opts = EffectOptions::default();
        assert_eq!(opts.split_time, 6);
        assert_eq!(opts.remove_time, 1.0);
        assert_eq!(opts.output_quality, Quality::Hd1080);
        assert!(!opts.zoom_enabled);
        assert_eq!(opts.zoom_factor, 1.5);
        assert_eq!(opts.text_color, "white");
        assert_eq!(opts.transition_type, TransitionType::None);
    }

    #[test]
    fn from_fields_applies_known_fields() {
        let opts = EffectOptions::from_fields([
            ("split_time", "10"),
            ("zoom_enabled", "on"),
            ("zoom_type", "out"),
            ("output_quality", "4k"),
            ("speed_enabled", "on"),
            ("speed_factor", "2"),
            ("speed_type", "slow"),
        ]);
        assert_eq!(opts.split_time, 10);
        assert!(opts.zoom_enabled);
        assert_eq!(opts.zoom_type, ZoomType::Out);
        assert_eq!(opts.output_quality, Quality::Uhd4k);
        assert_eq!(opts.speed_factor, 2.0);
        assert_eq!(opts.speed_type, SpeedType::Slow);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let opts = EffectOptions::from_fields([
            ("split_time", "zero"),
            ("split_time", "0"),
            ("remove_time", "-3"),
            ("output_quality", "8k"),
            ("blur_radius", "-1"),
            ("music_volume", "1.5"),
            ("some_future_field", "whatever"),
        ]);
        assert_eq!(opts, EffectOptions::default());
    }

    #[test]
    fn checkbox_fields_only_accept_on() {
        let mut opts = EffectOptions::default();
        opts.set_field("mirror_enabled", "on");
        assert!(opts.mirror_enabled);
        opts.set_field("mirror_enabled", "off");
        assert!(!opts.mirror_enabled);
        opts.set_field("mirror_enabled", "true");
        assert!(!opts.mirror_enabled);
    }

    #[test]
    fn to_fields_round_trips() {
        let mut opts = EffectOptions::default();
        opts.set_field("zoom_enabled", "on");
        opts.set_field("zoom_factor", "2.5");
        opts.set_field("text_enabled", "on");
        opts.set_field("text_content", "hello world");
        opts.set_field("text_position", "bottom");
        opts.set_field("transition_type", "fade");

        let fields = opts.to_fields();
        let rebuilt =
            EffectOptions::from_fields(fields.iter().map(|(n, v)| (*n, v.as_str())));
        assert_eq!(rebuilt, opts);
    }
}
