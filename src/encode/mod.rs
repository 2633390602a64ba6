//! Frame sinks: consumers of rendered frames in timeline order.

/// System `ffmpeg` MP4 sink.
pub mod ffmpeg;
/// Sink contract and in-memory test sink.
pub mod sink;
