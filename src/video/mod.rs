pub mod frame;
pub mod media;

pub use frame::FramePlacement;
pub use media::{
    burn_subtitles, check_ffmpeg, check_ffprobe, cut_segment, extract_audio,
    extract_audio_segment, probe_dimensions, probe_duration, reformat_portrait,
};
