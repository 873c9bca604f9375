//! Built-in preset catalog.

use ffai_types::{Difficulty, ParameterType, Preset, PresetParameter};

use ParameterType::{File, Number, Select};

fn preset(
    id: &str,
    name: &str,
    category: &str,
    description: &str,
    prompt: &str,
    difficulty: Difficulty,
    common_use: bool,
) -> Preset {
    Preset {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        prompt: prompt.to_string(),
        parameters: Vec::new(),
        examples: Vec::new(),
        tags: Vec::new(),
        difficulty,
        common_use,
    }
}

trait PresetExt {
    fn params(self, params: Vec<PresetParameter>) -> Self;
    fn examples(self, examples: &[&str]) -> Self;
    fn tags(self, tags: &[&str]) -> Self;
}

impl PresetExt for Preset {
    fn params(mut self, params: Vec<PresetParameter>) -> Self {
        self.parameters = params;
        self
    }

    fn examples(mut self, examples: &[&str]) -> Self {
        self.examples = examples.iter().map(|s| s.to_string()).collect();
        self
    }

    fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|s| s.to_string()).collect();
        self
    }
}

fn input() -> PresetParameter {
    PresetParameter::new("input", File, "Input media file").required()
}

fn string(name: &str, description: &str) -> PresetParameter {
    PresetParameter::new(name, ParameterType::String, description)
}

pub fn builtin_presets() -> Vec<Preset> {
    use Difficulty::{Advanced, Beginner, Intermediate};

    vec![
        preset(
            "convert-format",
            "Convert Format",
            "Format Conversion",
            "Convert a video to another container format",
            "convert {input} to {format} format",
            Beginner,
            true,
        )
        .params(vec![
            input(),
            PresetParameter::new("format", Select, "Target format")
                .with_options(&["mp4", "webm", "mkv", "mov", "avi"])
                .with_default("mp4")
                .required(),
        ])
        .examples(&["convert input.mov to mp4 format"])
        .tags(&["convert", "format", "container"]),
        preset(
            "convert-h264",
            "Convert to H.264 MP4",
            "Format Conversion",
            "Produce a widely compatible H.264/AAC MP4",
            "convert {input} to mp4 using h264 video and aac audio {mode}",
            Beginner,
            true,
        )
        .params(vec![
            input(),
            PresetParameter::new("mode", Select, "Whether to re-encode the streams")
                .with_options(&["with re-encoding (compatible)", "without re-encoding (fast)"])
                .with_default("with re-encoding (compatible)"),
        ])
        .tags(&["convert", "h264", "mp4", "compatibility"]),
        preset(
            "compress-video",
            "Compress Video",
            "Compression",
            "Reduce file size with a constant rate factor",
            "compress {input} using {codec} with crf {crf} and the {speed} encoding preset",
            Intermediate,
            true,
        )
        .params(vec![
            input(),
            PresetParameter::new("codec", Select, "Video codec")
                .with_options(&["h264", "h265"])
                .with_default("h264"),
            PresetParameter::new("crf", Select, "Quality level (lower is better)")
                .with_options(&["18 (High quality)", "23 (Medium)", "28 (Small file)"])
                .with_default("23 (Medium)"),
            PresetParameter::new("speed", Select, "Encoder speed preset")
                .with_options(&["ultrafast", "fast", "medium", "slow", "veryslow"])
                .with_default("medium"),
        ])
        .examples(&["compress input.mp4 using h264 with crf 23 and the medium encoding preset"])
        .tags(&["compress", "crf", "size"]),
        preset(
            "compress-target-size",
            "Compress to Target Size",
            "Compression",
            "Two-pass encode aiming at a file size",
            "compress {input} so the output file is about {size} MB using two-pass encoding",
            Advanced,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("size", Number, "Target size in megabytes")
                .with_range(1.0, 10_000.0)
                .required(),
        ])
        .tags(&["compress", "two-pass", "bitrate"]),
        preset(
            "video-to-gif",
            "Video to GIF",
            "GIF Creation",
            "Turn part of a video into an animated GIF",
            "create gif from {input} starting at {start} seconds for {duration} seconds with {fps}fps",
            Beginner,
            true,
        )
        .params(vec![
            input(),
            PresetParameter::new("start", Number, "Start time in seconds").with_default(0i64),
            PresetParameter::new("duration", Number, "Length in seconds")
                .with_default(5i64)
                .with_range(0.1, 60.0),
            PresetParameter::new("fps", Number, "Frames per second")
                .with_default(10i64)
                .with_range(1.0, 60.0),
        ])
        .examples(&["create gif from clip.mp4 starting at 5 seconds for 3 seconds with 10fps"])
        .tags(&["gif", "animation"]),
        preset(
            "high-quality-gif",
            "High Quality GIF",
            "GIF Creation",
            "Palette-based GIF with better colors",
            "create a high quality gif from {input} using a generated palette, {width} pixels wide at {fps}fps",
            Intermediate,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("width", Number, "Output width in pixels")
                .with_default(480i64)
                .with_range(16.0, 3840.0),
            PresetParameter::new("fps", Number, "Frames per second")
                .with_default(15i64)
                .with_range(1.0, 60.0),
        ])
        .tags(&["gif", "palette", "quality"]),
        preset(
            "extract-audio",
            "Extract Audio",
            "Audio",
            "Pull the audio track out of a video",
            "extract audio from {input} as {format}",
            Beginner,
            true,
        )
        .params(vec![
            input(),
            PresetParameter::new("format", Select, "Audio format")
                .with_options(&["mp3", "aac", "wav", "flac", "opus"])
                .with_default("mp3"),
        ])
        .examples(&["extract audio from interview.mp4 as mp3"])
        .tags(&["audio", "extract", "mp3"]),
        preset(
            "normalize-audio",
            "Normalize Loudness",
            "Audio",
            "EBU R128 loudness normalization",
            "normalize the audio loudness of {input} to {target} LUFS",
            Intermediate,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("target", Number, "Integrated loudness target")
                .with_default(-16i64)
                .with_range(-70.0, -5.0),
        ])
        .tags(&["audio", "loudnorm", "volume"]),
        preset(
            "remove-audio",
            "Remove Audio",
            "Audio",
            "Drop the audio track and keep the video untouched",
            "remove the audio track from {input} without re-encoding the video",
            Beginner,
            false,
        )
        .params(vec![input()])
        .tags(&["audio", "mute"]),
        preset(
            "trim-video",
            "Trim Video",
            "Editing",
            "Cut a segment between two timestamps",
            "trim {input} from {start} to {end} {mode}",
            Beginner,
            true,
        )
        .params(vec![
            input(),
            string("start", "Start timestamp (HH:MM:SS)")
                .with_default("00:00:00")
                .with_pattern(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$"),
            string("end", "End timestamp (HH:MM:SS)")
                .with_pattern(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$")
                .required(),
            PresetParameter::new("mode", Select, "Cutting mode")
                .with_options(&["without re-encoding (fast)", "with re-encoding (frame accurate)"])
                .with_default("without re-encoding (fast)"),
        ])
        .examples(&["trim talk.mp4 from 00:01:00 to 00:02:30 without re-encoding"])
        .tags(&["trim", "cut"]),
        preset(
            "merge-videos",
            "Merge Videos",
            "Editing",
            "Concatenate clips listed in a text file",
            "concatenate the videos listed in {list} into {output}",
            Intermediate,
            false,
        )
        .params(vec![
            PresetParameter::new("list", File, "Text file with one `file 'path'` line per clip")
                .required(),
            string("output", "Output file name").with_default("merged.mp4"),
        ])
        .tags(&["concat", "merge", "join"]),
        preset(
            "add-watermark",
            "Add Watermark",
            "Editing",
            "Overlay a logo image in a corner",
            "overlay the image {watermark} on {input} in the {position} corner with {opacity} opacity",
            Intermediate,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("watermark", File, "Image to overlay").required(),
            PresetParameter::new("position", Select, "Corner")
                .with_options(&["top-left", "top-right", "bottom-left", "bottom-right"])
                .with_default("bottom-right"),
            PresetParameter::new("opacity", Number, "Overlay opacity")
                .with_default(0.8)
                .with_range(0.0, 1.0),
        ])
        .tags(&["watermark", "overlay", "logo"]),
        preset(
            "resize-video",
            "Resize Video",
            "Resize & Crop",
            "Scale to a standard resolution",
            "resize {input} to {resolution} keeping the aspect ratio",
            Beginner,
            true,
        )
        .params(vec![
            input(),
            PresetParameter::new("resolution", Select, "Target resolution")
                .with_options(&["1920x1080 (1080p)", "1280x720 (720p)", "854x480 (480p)"])
                .with_default("1280x720 (720p)"),
        ])
        .tags(&["resize", "scale", "resolution"]),
        preset(
            "crop-video",
            "Crop Video",
            "Resize & Crop",
            "Cut out a rectangle of the frame",
            "crop {input} to {width}x{height} starting at x={x} y={y}",
            Intermediate,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("width", Number, "Crop width").required(),
            PresetParameter::new("height", Number, "Crop height").required(),
            PresetParameter::new("x", Number, "Left offset").with_default(0i64),
            PresetParameter::new("y", Number, "Top offset").with_default(0i64),
        ])
        .tags(&["crop"]),
        preset(
            "apply-filter",
            "Apply Filter",
            "Filters",
            "Apply a simple visual effect",
            "apply a {filter} filter to {input}",
            Beginner,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("filter", Select, "Effect")
                .with_options(&["grayscale", "sepia", "blur", "sharpen", "vignette"])
                .with_default("grayscale"),
        ])
        .tags(&["filter", "effect"]),
        preset(
            "change-speed",
            "Change Speed",
            "Filters",
            "Speed up or slow down video and audio together",
            "change the playback speed of {input} by a factor of {speed}, adjusting the audio to match",
            Intermediate,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("speed", Number, "Speed multiplier")
                .with_default(2i64)
                .with_range(0.25, 4.0),
        ])
        .tags(&["speed", "timelapse", "slow motion"]),
        preset(
            "social-vertical",
            "Vertical Social Video",
            "Social Media",
            "9:16 video with a blurred background fill",
            "format {input} as a vertical 1080x1920 video for {platform} with a blurred background",
            Intermediate,
            true,
        )
        .params(vec![
            input(),
            PresetParameter::new("platform", Select, "Target platform")
                .with_options(&["TikTok", "Instagram Reels", "YouTube Shorts"])
                .with_default("TikTok"),
        ])
        .tags(&["social", "vertical", "tiktok", "reels"]),
        preset(
            "social-square",
            "Square Social Video",
            "Social Media",
            "1:1 video capped to a maximum length",
            "make {input} a square 1080x1080 video for instagram, at most {duration} seconds long",
            Beginner,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("duration", Number, "Maximum length in seconds")
                .with_default(60i64)
                .with_range(1.0, 600.0),
        ])
        .tags(&["social", "square", "instagram"]),
        preset(
            "stream-rtmp",
            "Stream to RTMP",
            "Streaming",
            "Push a file to an RTMP ingest endpoint in real time",
            "stream {input} in real time to {url} over rtmp at {bitrate}k video bitrate",
            Advanced,
            false,
        )
        .params(vec![
            input(),
            string("url", "RTMP ingest URL")
                .with_pattern(r"^rtmps?://")
                .required(),
            PresetParameter::new("bitrate", Number, "Video bitrate in kbit/s")
                .with_default(3000i64)
                .with_range(100.0, 50_000.0),
        ])
        .tags(&["stream", "rtmp", "live"]),
        preset(
            "hls-package",
            "Package as HLS",
            "Streaming",
            "Segment a video into an HLS playlist",
            "package {input} as HLS with {segment} second segments",
            Advanced,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("segment", Number, "Segment length in seconds")
                .with_default(6i64)
                .with_range(1.0, 60.0),
        ])
        .tags(&["hls", "stream", "m3u8"]),
        preset(
            "extract-frames",
            "Extract Frames",
            "Frames & Thumbnails",
            "Save still images at a fixed interval",
            "extract one frame every {interval} seconds from {input} as {format} images",
            Beginner,
            false,
        )
        .params(vec![
            input(),
            PresetParameter::new("interval", Number, "Seconds between frames")
                .with_default(1i64)
                .with_range(0.01, 3600.0),
            PresetParameter::new("format", Select, "Image format")
                .with_options(&["png", "jpg", "webp"])
                .with_default("png"),
        ])
        .tags(&["frames", "images", "extract"]),
        preset(
            "thumbnail",
            "Create Thumbnail",
            "Frames & Thumbnails",
            "Grab a single frame as a thumbnail",
            "create a thumbnail image from {input} at {time}",
            Beginner,
            true,
        )
        .params(vec![
            input(),
            string("time", "Timestamp (HH:MM:SS)")
                .with_default("00:00:05")
                .with_pattern(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$"),
        ])
        .tags(&["thumbnail", "frame", "poster"]),
    ]
}
