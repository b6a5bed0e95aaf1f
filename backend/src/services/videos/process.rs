//! Background render worker.
//!
//! Each accepted upload is rendered by shelling out to `ffmpeg`: the source
//! is split into segments, each segment gets the requested filter chain, and
//! the parts are stitched back together (optionally through crossfades and
//! with a background track mixed in). Progress maps segment completion onto
//! 0..=90, assembly reports 90 and completion 100.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use common::jobs::JobStatus;
use common::model::options::{
    EffectOptions, MirrorType, Quality, SpeedType, TextPosition, TransitionType, ZoomType,
};

use crate::job_controller::state::{JobUpdate, UpdateKind};

pub(crate) struct RenderRequest {
    pub job_id: String,
    pub input: PathBuf,
    pub music: Option<PathBuf>,
    pub options: EffectOptions,
    pub output_dir: PathBuf,
    pub tx: mpsc::Sender<JobUpdate>,
    pub cancelled: Arc<AtomicBool>,
}

#[derive(Debug)]
pub(crate) enum RenderError {
    Probe(String),
    Ffmpeg(String),
    Io(std::io::Error),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Probe(e) => write!(f, "could not read video metadata: {e}"),
            RenderError::Ffmpeg(e) => write!(f, "video processing failed: {e}"),
            RenderError::Io(e) => write!(f, "processing i/o failed: {e}"),
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

enum RenderOutcome {
    Finished(PathBuf),
    Cancelled,
}

/// Hands the request to a blocking worker and forwards its terminal update.
pub(crate) fn schedule(req: RenderRequest) {
    tokio::spawn(async move {
        let tx = req.tx.clone();
        let job_id = req.job_id.clone();
        let result = tokio::task::spawn_blocking(move || render_job(req)).await;
        let update = match result {
            Ok(Ok(RenderOutcome::Finished(path))) => Some(UpdateKind::Completed(path)),
            Ok(Ok(RenderOutcome::Cancelled)) => {
                info!("job {job_id} stopped after cancellation");
                None
            }
            Ok(Err(e)) => Some(UpdateKind::Failed(e.to_string())),
            Err(e) => {
                error!("render task for job {job_id} panicked: {e}");
                Some(UpdateKind::Failed("internal processing error".to_string()))
            }
        };
        if let Some(kind) = update {
            if tx.send(JobUpdate { job_id, kind }).await.is_err() {
                warn!("job updater is gone, dropping final update");
            }
        }
    });
}

fn render_job(req: RenderRequest) -> Result<RenderOutcome, RenderError> {
    let send = |kind: UpdateKind| {
        let _ = req.tx.blocking_send(JobUpdate {
            job_id: req.job_id.clone(),
            kind,
        });
    };

    send(UpdateKind::Status(JobStatus::Processing));

    let duration = probe_duration(&req.input)?;
    let segments = plan_segments(duration, req.options.split_time, req.options.remove_time);
    info!(
        "job {}: {duration:.2}s source, {} segment(s)",
        req.job_id,
        segments.len()
    );

    let work_dir = tempfile::tempdir()?;
    let quality = quality_params(req.options.output_quality);
    let video_filters = build_video_filters(&req.options, &quality);
    let audio_filters = build_audio_filters(&req.options);

    let mut parts: Vec<PathBuf> = Vec::with_capacity(segments.len());
    let total = segments.len();
    for (i, seg) in segments.iter().enumerate() {
        if req.cancelled.load(Ordering::Relaxed) {
            return Ok(RenderOutcome::Cancelled);
        }
        let part = work_dir.path().join(format!("part_{i:04}.mp4"));
        let args = build_segment_args(
            &req.input,
            seg,
            &video_filters,
            &audio_filters,
            &quality,
            &part,
        );
        run_ffmpeg(&args)?;
        parts.push(part);
        send(UpdateKind::Progress(segment_progress(i + 1, total)));
    }

    if req.cancelled.load(Ordering::Relaxed) {
        return Ok(RenderOutcome::Cancelled);
    }
    send(UpdateKind::Progress(90));

    std::fs::create_dir_all(&req.output_dir)?;
    let output = req.output_dir.join(format!("{}.mp4", req.job_id));
    let part_lens: Vec<f64> = segments.iter().map(Segment::len).collect();
    assemble(
        &parts,
        &part_lens,
        req.music.as_deref(),
        &req.options,
        work_dir.path(),
        &output,
    )?;

    Ok(RenderOutcome::Finished(output))
}

/// Reads the container duration in seconds via `ffprobe`.
fn probe_duration(input: &Path) -> Result<f64, RenderError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(input)
        .output()
        .map_err(|e| RenderError::Probe(format!("ffprobe did not start: {e}")))?;
    if !output.status.success() {
        return Err(RenderError::Probe(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| RenderError::Probe(e.to_string()))?;
    value["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .ok_or_else(|| RenderError::Probe("no duration in ffprobe output".to_string()))
}

fn run_ffmpeg(args: &[String]) -> Result<(), RenderError> {
    debug!("ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg")
        .args(args)
        .output()
        .map_err(|e| RenderError::Ffmpeg(format!("ffmpeg did not start: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(4).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        return Err(RenderError::Ffmpeg(tail.join(" | ")));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    fn len(&self) -> f64 {
        self.end - self.start
    }
}

/// Splits `duration` into `split_time`-second pieces and trims `remove_time`
/// seconds off the end of every full-length piece. Pieces that the trim would
/// erase entirely are dropped; a short final piece is kept untrimmed.
pub(crate) fn plan_segments(duration: f64, split_time: u32, remove_time: f32) -> Vec<Segment> {
    let split = f64::from(split_time.max(1));
    let remove = f64::from(remove_time.max(0.0));
    let mut segments = Vec::new();
    let mut start = 0.0;
    while start < duration {
        let full_end = (start + split).min(duration);
        let is_full = (full_end - start) >= split - f64::EPSILON;
        let end = if is_full { full_end - remove } else { full_end };
        if end - start > 0.05 {
            segments.push(Segment { start, end });
        }
        start = full_end;
    }
    if segments.is_empty() && duration > 0.0 {
        segments.push(Segment {
            start: 0.0,
            end: duration,
        });
    }
    segments
}

/// Maps completed segments onto the 0..=90 band of the progress bar.
pub(crate) fn segment_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 90;
    }
    ((done.min(total) * 90) / total) as u8
}

pub(crate) struct QualityParams {
    pub scale: &'static str,
    pub bitrate: &'static str,
    pub preset: &'static str,
}

pub(crate) fn quality_params(quality: Quality) -> QualityParams {
    match quality {
        Quality::Hd720 => QualityParams {
            scale: "scale=-2:720",
            bitrate: "2500k",
            preset: "veryfast",
        },
        Quality::Hd1080 => QualityParams {
            scale: "scale=-2:1080",
            bitrate: "5000k",
            preset: "fast",
        },
        Quality::Uhd4k => QualityParams {
            scale: "scale=-2:2160",
            bitrate: "16000k",
            preset: "medium",
        },
    }
}

/// Escapes a drawtext text argument for use inside a filter graph.
pub(crate) fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            ',' => out.push_str("\\,"),
            _ => out.push(c),
        }
    }
    out
}

fn drawtext_position(position: TextPosition) -> (&'static str, &'static str) {
    match position {
        TextPosition::Center => ("(w-text_w)/2", "(h-text_h)/2"),
        TextPosition::Top => ("(w-text_w)/2", "h/10"),
        TextPosition::Bottom => ("(w-text_w)/2", "h-h/10-text_h"),
        TextPosition::Watermark => ("w-text_w-20", "h-text_h-20"),
    }
}

/// Builds the per-segment video filter chain from the enabled effects.
/// Filter order mirrors the form: geometry first, then color, then overlays.
pub(crate) fn build_video_filters(options: &EffectOptions, quality: &QualityParams) -> Vec<String> {
    let mut filters = Vec::new();

    if options.zoom_enabled {
        let factor = f64::from(options.zoom_factor.clamp(1.0, 4.0));
        match options.zoom_type {
            ZoomType::In => {
                filters.push(format!(
                    "scale=iw*{factor:.3}:ih*{factor:.3},crop=iw/{factor:.3}:ih/{factor:.3}"
                ));
            }
            ZoomType::Out => {
                filters.push(format!(
                    "scale=iw/{factor:.3}:ih/{factor:.3},pad=iw*{factor:.3}:ih*{factor:.3}:(ow-iw)/2:(oh-ih)/2"
                ));
            }
        }
    }
    if options.mirror_enabled {
        filters.push(
            match options.mirror_type {
                MirrorType::Horizontal => "hflip",
                MirrorType::Vertical => "vflip",
            }
            .to_string(),
        );
    }
    if options.rotate_enabled {
        match options.rotate_angle.rem_euclid(360) {
            90 => filters.push("transpose=1".to_string()),
            180 => filters.push("transpose=1,transpose=1".to_string()),
            270 => filters.push("transpose=2".to_string()),
            0 => {}
            angle => filters.push(format!("rotate={angle}*PI/180")),
        }
    }
    if options.blur_enabled {
        filters.push(format!("gblur=sigma={}", options.blur_radius.clamp(1, 50)));
    }
    if options.glitch_enabled {
        let shift = (f64::from(options.glitch_intensity.clamp(0.0, 1.0)) * 30.0).round() as i32;
        filters.push(format!("rgbashift=rh={shift}:bv=-{shift}"));
    }
    if options.oldfilm_enabled {
        filters.push(
            "colorchannelmixer=.393:.769:.189:0:.349:.686:.168:0:.272:.534:.131,noise=alls=12:allf=t"
                .to_string(),
        );
    }
    if options.speed_enabled {
        let factor = f64::from(options.speed_factor.clamp(1.1, 4.0));
        let pts = match options.speed_type {
            SpeedType::Fast => 1.0 / factor,
            SpeedType::Slow => factor,
        };
        filters.push(format!("setpts={pts:.4}*PTS"));
    }
    if options.freeze_enabled {
        let hold = f64::from(options.freeze_duration.clamp(0.1, 10.0));
        filters.push(format!("tpad=stop_mode=clone:stop_duration={hold:.2}"));
    }
    if options.text_enabled && !options.text_content.trim().is_empty() {
        let (x, y) = drawtext_position(options.text_position);
        filters.push(format!(
            "drawtext=text='{}':fontsize={}:fontcolor={}:x={x}:y={y}:borderw=2:bordercolor=black",
            escape_drawtext(options.text_content.trim()),
            options.text_size.clamp(8, 200),
            options.text_color,
        ));
    }

    filters.push(quality.scale.to_string());
    filters
}

/// Per-segment audio chain. Speed changes must keep audio and video in step.
pub(crate) fn build_audio_filters(options: &EffectOptions) -> Vec<String> {
    let mut filters = Vec::new();
    if options.speed_enabled {
        let factor = f64::from(options.speed_factor.clamp(1.1, 4.0));
        let tempo = match options.speed_type {
            SpeedType::Fast => factor,
            SpeedType::Slow => 1.0 / factor,
        };
        // atempo only accepts 0.5..=2.0 per instance, chain as needed.
        let mut remaining = tempo;
        while remaining > 2.0 {
            filters.push("atempo=2.0".to_string());
            remaining /= 2.0;
        }
        while remaining < 0.5 {
            filters.push("atempo=0.5".to_string());
            remaining /= 0.5;
        }
        filters.push(format!("atempo={remaining:.4}"));
    }
    if options.noise_reduction {
        let strength = f64::from(options.noise_strength.clamp(0.0, 1.0)) * 97.0;
        filters.push(format!("afftdn=nr={strength:.0}"));
    }
    filters
}

fn build_segment_args(
    input: &Path,
    seg: &Segment,
    video_filters: &[String],
    audio_filters: &[String],
    quality: &QualityParams,
    out: &Path,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-ss".to_string(),
        format!("{:.3}", seg.start),
        "-t".to_string(),
        format!("{:.3}", seg.len()),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        video_filters.join(","),
    ];
    if !audio_filters.is_empty() {
        args.push("-af".to_string());
        args.push(audio_filters.join(","));
    }
    args.extend([
        "-c:v".to_string(),
        "libx264".to_string(),
        "-b:v".to_string(),
        quality.bitrate.to_string(),
        "-preset".to_string(),
        quality.preset.to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        out.to_string_lossy().to_string(),
    ]);
    args
}

fn xfade_transition(transition: TransitionType) -> Option<&'static str> {
    match transition {
        TransitionType::None => None,
        TransitionType::Fade => Some("fade"),
        TransitionType::Slide => Some("slideleft"),
        TransitionType::Zoom => Some("zoomin"),
    }
}

/// Builds the `-filter_complex` graph chaining every part through `xfade`
/// and `acrossfade`. `part_lens` are the individual part durations in
/// seconds; the final piece is usually shorter than the rest, so each fade
/// offset is accumulated from the lengths actually consumed so far.
pub(crate) fn build_xfade_graph(
    part_lens: &[f64],
    transition: &'static str,
    duration: f64,
) -> String {
    let mut graph = String::new();
    let mut last_v = "0:v".to_string();
    let mut last_a = "0:a".to_string();
    let mut consumed = 0.0;
    for i in 1..part_lens.len() {
        consumed += part_lens[i - 1];
        let offset = (consumed - i as f64 * duration).max(0.0);
        let out_v = format!("v{i}");
        let out_a = format!("a{i}");
        graph.push_str(&format!(
            "[{last_v}][{i}:v]xfade=transition={transition}:duration={duration:.2}:offset={offset:.2}[{out_v}];"
        ));
        graph.push_str(&format!(
            "[{last_a}][{i}:a]acrossfade=d={duration:.2}[{out_a}];"
        ));
        last_v = out_v;
        last_a = out_a;
    }
    // Trailing semicolon is dropped, the last labels are the graph outputs.
    graph.truncate(graph.len().saturating_sub(1));
    graph
}

/// Concat demuxer list file content. Paths are quoted for ffmpeg.
pub(crate) fn concat_list(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

fn assemble(
    parts: &[PathBuf],
    part_lens: &[f64],
    music: Option<&Path>,
    options: &EffectOptions,
    work_dir: &Path,
    output: &Path,
) -> Result<(), RenderError> {
    let transition = xfade_transition(options.transition_type).filter(|_| parts.len() > 1);

    // Stitch the parts into one file first, then mix music over it.
    let stitched = if music.is_some() {
        work_dir.join("stitched.mp4")
    } else {
        output.to_path_buf()
    };

    match transition {
        Some(kind) => {
            let graph = build_xfade_graph(
                part_lens,
                kind,
                f64::from(options.transition_duration.clamp(0.2, 3.0)),
            );
            let mut args = vec!["-y".to_string()];
            for part in parts {
                args.push("-i".to_string());
                args.push(part.to_string_lossy().to_string());
            }
            let last = parts.len() - 1;
            args.extend([
                "-filter_complex".to_string(),
                graph,
                "-map".to_string(),
                format!("[v{last}]"),
                "-map".to_string(),
                format!("[a{last}]"),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                stitched.to_string_lossy().to_string(),
            ]);
            run_ffmpeg(&args)?;
        }
        None => {
            let list_path = work_dir.join("concat.txt");
            std::fs::write(&list_path, concat_list(parts))?;
            let args = vec![
                "-y".to_string(),
                "-f".to_string(),
                "concat".to_string(),
                "-safe".to_string(),
                "0".to_string(),
                "-i".to_string(),
                list_path.to_string_lossy().to_string(),
                "-c".to_string(),
                "copy".to_string(),
                stitched.to_string_lossy().to_string(),
            ];
            run_ffmpeg(&args)?;
        }
    }

    if let Some(track) = music {
        let volume = f64::from(options.music_volume.clamp(0.0, 1.0));
        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            stitched.to_string_lossy().to_string(),
            "-i".to_string(),
            track.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            format!(
                "[1:a]volume={volume:.2}[m];[0:a][m]amix=inputs=2:duration=first:dropout_transition=2[aout]"
            ),
            "-map".to_string(),
            "0:v".to_string(),
            "-map".to_string(),
            "[aout]".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            output.to_string_lossy().to_string(),
        ];
        run_ffmpeg(&args)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_trim_full_pieces_only() {
        let segs = plan_segments(13.0, 6, 1.0);
        assert_eq!(
            segs,
            vec![
                Segment {
                    start: 0.0,
                    end: 5.0
                },
                Segment {
                    start: 6.0,
                    end: 11.0
                },
                Segment {
                    start: 12.0,
                    end: 13.0
                },
            ]
        );
    }

    #[test]
    fn short_source_yields_one_segment() {
        let segs = plan_segments(3.5, 6, 1.0);
        assert_eq!(
            segs,
            vec![Segment {
                start: 0.0,
                end: 3.5
            }]
        );
    }

    #[test]
    fn trim_that_would_erase_a_piece_drops_it() {
        // 6s pieces with 6s removed would leave nothing per piece.
        let segs = plan_segments(12.0, 6, 6.0);
        assert_eq!(
            segs,
            vec![Segment {
                start: 0.0,
                end: 12.0
            }]
        );
    }

    #[test]
    fn progress_band_tops_out_at_90() {
        assert_eq!(segment_progress(0, 4), 0);
        assert_eq!(segment_progress(1, 4), 22);
        assert_eq!(segment_progress(2, 4), 45);
        assert_eq!(segment_progress(4, 4), 90);
        assert_eq!(segment_progress(5, 4), 90);
        assert_eq!(segment_progress(1, 1), 90);
    }

    #[test]
    fn default_options_only_scale() {
        let options = EffectOptions::default();
        let quality = quality_params(options.output_quality);
        let filters = build_video_filters(&options, &quality);
        assert_eq!(filters, vec!["scale=-2:1080".to_string()]);
        assert!(build_audio_filters(&options).is_empty());
    }

    #[test]
    fn mirror_and_rotate_filters() {
        let mut options = EffectOptions::default();
        options.mirror_enabled = true;
        options.mirror_type = MirrorType::Vertical;
        options.rotate_enabled = true;
        options.rotate_angle = 180;
        let quality = quality_params(Quality::Hd720);
        let filters = build_video_filters(&options, &quality);
        assert!(filters.contains(&"vflip".to_string()));
        assert!(filters.contains(&"transpose=1,transpose=1".to_string()));
        assert_eq!(filters.last().map(String::as_str), Some("scale=-2:720"));
    }

    #[test]
    fn drawtext_escapes_special_characters() {
        assert_eq!(escape_drawtext("it's 100%: a,b"), "it\\'s 100\\%\\: a\\,b");
    }

    #[test]
    fn text_filter_uses_position_and_escape() {
        let mut options = EffectOptions::default();
        options.text_enabled = true;
        options.text_content = "hi: there".to_string();
        options.text_position = TextPosition::Watermark;
        let quality = quality_params(options.output_quality);
        let filters = build_video_filters(&options, &quality);
        let drawtext = filters
            .iter()
            .find(|f| f.starts_with("drawtext"))
            .expect("drawtext filter present");
        assert!(drawtext.contains("hi\\: there"));
        assert!(drawtext.contains("x=w-text_w-20"));
    }

    #[test]
    fn speed_keeps_audio_and_video_in_step() {
        let mut options = EffectOptions::default();
        options.speed_enabled = true;
        options.speed_factor = 3.0;
        options.speed_type = SpeedType::Fast;
        let quality = quality_params(options.output_quality);
        let video = build_video_filters(&options, &quality);
        assert!(video.contains(&"setpts=0.3333*PTS".to_string()));
        let audio = build_audio_filters(&options);
        assert_eq!(audio, vec!["atempo=2.0".to_string(), "atempo=1.5000".to_string()]);
    }

    #[test]
    fn xfade_graph_chains_offsets() {
        let graph = build_xfade_graph(&[5.0, 5.0, 5.0], "fade", 1.0);
        assert!(graph.contains("[0:v][1:v]xfade=transition=fade:duration=1.00:offset=4.00[v1]"));
        assert!(graph.contains("[v1][2:v]xfade=transition=fade:duration=1.00:offset=8.00[v2]"));
        assert!(graph.contains("[a1][2:a]acrossfade=d=1.00[a2]"));
        assert!(!graph.ends_with(';'));
    }

    #[test]
    fn xfade_offsets_follow_uneven_part_lengths() {
        // A short untrimmed final piece must not shift the earlier fades,
        // and the fade into it starts where the full pieces actually end.
        let graph = build_xfade_graph(&[6.0, 6.0, 3.0], "fade", 1.0);
        assert!(graph.contains("offset=5.00[v1]"));
        assert!(graph.contains("offset=10.00[v2]"));

        // The middle piece being the odd one out moves the second offset.
        let graph = build_xfade_graph(&[6.0, 2.0, 6.0], "fade", 1.0);
        assert!(graph.contains("offset=5.00[v1]"));
        assert!(graph.contains("offset=6.00[v2]"));
    }

    #[test]
    fn concat_list_quotes_paths() {
        let parts = vec![PathBuf::from("/tmp/a.mp4"), PathBuf::from("/tmp/b'c.mp4")];
        let list = concat_list(&parts);
        assert_eq!(list, "file '/tmp/a.mp4'\nfile '/tmp/b'\\''c.mp4'\n");
    }
}
