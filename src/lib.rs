//! WAV PCM Source Library
//!
//! File-backed PCM audio source: inspects a RIFF/WAVE container once,
//! then streams 10ms frames of interleaved PCM on demand.

pub mod audio;
pub mod decode;
pub mod source;

pub use audio::{AudioFormat, StatsReport, StreamStats, QUANTUM_MS};
pub use decode::{
    ChunkScan, ContainerHeader, FrameStreamer, InspectOptions, Inspector, OpenError,
    StreamCursor,
};
pub use source::{PcmFileSource, PcmFrameSource};
