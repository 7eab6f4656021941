//! Audio pipeline: decode, playback, capture, silence detection

pub mod decode;
pub mod mic;
pub mod record;
pub mod silence;
pub mod sink;

pub use decode::{AudioFormat, AudioFrame, FrameDecoder, SampleSpec};
pub use mic::Microphone;
pub use record::{FrameSource, RecordingSession};
pub use silence::{is_silent, rms};
pub use sink::{AudioSink, Playback, Speaker};
