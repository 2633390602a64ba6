//! MP4 encoding through the system `ffmpeg` binary.
//!
//! Raw RGBA frames are streamed to ffmpeg's stdin while the narration audio
//! file is attached as a second input, producing H.264 + AAC output. Encoder
//! failures are fatal and carry ffmpeg's stderr as the cause.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{LecternError, LecternResult};
use crate::render::frame::FrameRgba;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to stdin.
///
/// The narration audio travels through `SinkConfig.audio_path` and is encoded
/// as an AAC stream alongside the H.264 video.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> LecternResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(LecternError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(LecternError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(LecternError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(LecternError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });

        // First input: raw opaque RGBA8 frames on stdin. `-r` before `-i`
        // sets the rawvideo input framerate.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
        ]);

        // Second input: the narration track, re-encoded to AAC. `-shortest`
        // stops the mux at whichever stream ends first so rounding at the
        // final frame cannot pad the container.
        if let Some(audio) = cfg.audio_path.as_ref() {
            cmd.arg("-i").arg(audio);
            cmd.args(["-c:a", "aac", "-shortest"]);
        } else {
            cmd.arg("-an");
        }

        cmd.args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            LecternError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LecternError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| LecternError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> LecternResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| LecternError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(LecternError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(LecternError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != (cfg.width as usize) * (cfg.height as usize) * 4 {
            return Err(LecternError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(LecternError::encode("ffmpeg sink is already finalized"));
        };
        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            LecternError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> LecternResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| LecternError::encode("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| LecternError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| LecternError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| LecternError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(LecternError::encode(format!(
                "ffmpeg exited with status {} writing '{}': {}",
                status,
                self.opts.out_path.display(),
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
fn ensure_parent_dir(path: &Path) -> LecternResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Fps;

    #[test]
    fn push_before_begin_is_an_error() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("/tmp/never-written.mp4"));
        let frame = FrameRgba {
            width: 2,
            height: 2,
            data: vec![0; 16],
        };
        assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    }

    #[test]
    fn odd_dimensions_are_rejected_at_begin() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("/tmp/never-written.mp4"));
        let cfg = SinkConfig {
            width: 121,
            height: 72,
            fps: Fps::default(),
            audio_path: None,
        };
        let err = sink.begin(cfg).unwrap_err();
        assert!(err.to_string().contains("even"));
    }
}
