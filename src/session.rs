//! Session-oriented rendering API.
//!
//! A [`RenderSession`] front-loads everything that must happen exactly once:
//! probing the narration duration, allocating the dialogue timeline, and
//! extracting the loudness envelope. The session is immutable afterwards;
//! frame synthesis only reads it, so frames can be rendered on parallel
//! workers and reassembled in index order at the sink boundary.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::audio::decode::probe_duration_secs;
use crate::audio::envelope::{Envelope, EnvelopeSource};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{LecternError, LecternResult};
use crate::render::frame::{FrameComposer, FrameRgba, SceneView};
use crate::script::Script;
use crate::timeline::{Utterance, allocate};
use crate::typeset::resolve_font_bytes;

/// Options controlling session construction and range rendering.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Output frame rate.
    pub fps: Fps,
    /// Output canvas size.
    pub canvas: Canvas,
    /// Explicit font file for on-screen text. `None` scans well-known system
    /// locations; if nothing is found, frames render text-free.
    pub font_path: Option<PathBuf>,
    /// Enable frame-level parallelism on a dedicated rayon pool.
    pub parallel: bool,
    /// Worker thread count override. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Frames rendered per chunk before they are handed to the sink.
    pub chunk_size: usize,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            canvas: Canvas::default(),
            font_path: None,
            parallel: false,
            threads: None,
            chunk_size: 64,
        }
    }
}

/// Cooperative cancellation handle for a long-running render.
///
/// Cancelling abandons the in-flight encode between chunks; a partially
/// written output file is not valid and should be treated as absent.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; observed at the next chunk boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Return `true` when cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The immutable aggregate of everything needed to render the full video.
#[derive(Debug)]
pub struct RenderSession {
    script: Script,
    utterances: Vec<Utterance>,
    envelope: Envelope,
    envelope_source: EnvelopeSource,
    fps: Fps,
    canvas: Canvas,
    total_duration: f64,
    total_frames: u64,
    audio_path: Option<PathBuf>,
    font_bytes: Option<Arc<Vec<u8>>>,
    opts: RenderOpts,
}

impl RenderSession {
    /// Construct a session from a script and a narration audio file.
    ///
    /// Probing the audio is fatal on failure (the timeline would be
    /// undefined without a duration); envelope extraction degrades to a
    /// synthetic envelope instead, which is logged and reported through
    /// [`RenderSession::envelope_source`].
    pub fn new(
        script: Script,
        audio_path: impl Into<PathBuf>,
        opts: RenderOpts,
    ) -> LecternResult<Self> {
        let audio_path = audio_path.into();
        let total_duration = probe_duration_secs(&audio_path)?;
        let total_frames = opts.fps.cover_secs(total_duration);
        let (envelope, envelope_source) = Envelope::from_audio(&audio_path, total_frames);
        let utterances = allocate(&script, total_duration)?;
        let font_bytes = resolve_font_bytes(opts.font_path.as_deref())?.map(Arc::new);
        if font_bytes.is_none() {
            tracing::warn!("no usable font found; frames will render without text");
        }

        tracing::debug!(
            duration_secs = total_duration,
            frames = total_frames,
            utterances = utterances.len(),
            measured = matches!(envelope_source, EnvelopeSource::Measured),
            "render session ready"
        );

        Ok(Self {
            script,
            utterances,
            envelope,
            envelope_source,
            fps: opts.fps,
            canvas: opts.canvas,
            total_duration,
            total_frames,
            audio_path: Some(audio_path),
            font_bytes,
            opts,
        })
    }

    /// Construct a session from an already-resolved duration and envelope,
    /// with no audio attached to the output.
    ///
    /// This is the entry point for embedders that manage audio themselves
    /// and for tests; it performs no I/O. A `None` envelope uses the
    /// synthetic fallback.
    pub fn from_parts(
        script: Script,
        total_duration: f64,
        envelope: Option<Envelope>,
        opts: RenderOpts,
    ) -> LecternResult<Self> {
        let total_frames = opts.fps.cover_secs(total_duration);
        let utterances = allocate(&script, total_duration)?;
        let (envelope, envelope_source) = match envelope {
            Some(env) => {
                if env.len() as u64 != total_frames {
                    return Err(LecternError::validation(format!(
                        "envelope length {} does not match total_frames {total_frames}",
                        env.len()
                    )));
                }
                (env, EnvelopeSource::Measured)
            }
            None => (
                Envelope::synthetic(total_frames),
                EnvelopeSource::Synthetic {
                    reason: "no audio attached".to_string(),
                },
            ),
        };
        let font_bytes = resolve_font_bytes(opts.font_path.as_deref())?.map(Arc::new);

        Ok(Self {
            script,
            utterances,
            envelope,
            envelope_source,
            fps: opts.fps,
            canvas: opts.canvas,
            total_duration,
            total_frames,
            audio_path: None,
            font_bytes,
            opts,
        })
    }

    /// Declared timeline duration in seconds.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Number of output frames, `ceil(total_duration * fps)`.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Output canvas size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// The resolved dialogue timeline.
    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    /// The per-frame loudness envelope.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Whether the envelope was measured from audio or synthesized.
    pub fn envelope_source(&self) -> &EnvelopeSource {
        &self.envelope_source
    }

    fn view(&self) -> SceneView<'_> {
        SceneView {
            script: &self.script,
            utterances: &self.utterances,
            envelope: &self.envelope,
            fps: self.fps,
            total_duration: self.total_duration,
            total_frames: self.total_frames,
        }
    }

    fn composer(&self) -> LecternResult<FrameComposer> {
        FrameComposer::new(self.canvas, self.font_bytes.as_ref().map(|b| (**b).clone()))
    }

    /// Render the frame at timestamp `t` seconds as a pure function of the
    /// session state.
    pub fn render_frame_at(&self, t: f64) -> LecternResult<FrameRgba> {
        self.composer()?.compose(&self.view(), t)
    }

    /// Render frame `idx`, which must lie within the timeline.
    pub fn render_frame(&self, idx: FrameIndex) -> LecternResult<FrameRgba> {
        if idx.0 >= self.total_frames {
            return Err(LecternError::validation(format!(
                "frame {} is outside the timeline of {} frames",
                idx.0, self.total_frames
            )));
        }
        self.render_frame_at(self.fps.frame_to_secs(idx))
    }

    /// Render every frame in order into `sink`, returning the number of
    /// frames delivered.
    ///
    /// Frames are produced chunk by chunk, in parallel when
    /// [`RenderOpts::parallel`] is set, and always reach the sink in
    /// strictly increasing index order. `cancel` is observed between chunks;
    /// cancellation abandons the encode with [`LecternError::Cancelled`].
    pub fn render_into(
        &self,
        sink: &mut dyn FrameSink,
        cancel: Option<&CancelToken>,
    ) -> LecternResult<u64> {
        sink.begin(SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
            audio_path: self.audio_path.clone(),
        })?;

        let chunk_size = (self.opts.chunk_size.max(1)) as u64;
        let pool = if self.opts.parallel {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(n) = self.opts.threads {
                builder = builder.num_threads(n);
            }
            Some(builder.build().map_err(anyhow::Error::from)?)
        } else {
            None
        };

        let mut seq_composer = if pool.is_none() {
            Some(self.composer()?)
        } else {
            None
        };

        let mut delivered = 0u64;
        let mut chunk_start = 0u64;
        while chunk_start < self.total_frames {
            if let Some(token) = cancel
                && token.is_cancelled()
            {
                return Err(LecternError::Cancelled);
            }
            let chunk_end = (chunk_start + chunk_size).min(self.total_frames);

            let frames: Vec<FrameRgba> = if let Some(pool) = pool.as_ref() {
                pool.install(|| {
                    (chunk_start..chunk_end)
                        .into_par_iter()
                        .map_init(
                            || self.composer(),
                            |composer, f| {
                                let composer = composer.as_mut().map_err(|e| {
                                    LecternError::validation(format!(
                                        "worker composer init failed: {e}"
                                    ))
                                })?;
                                composer
                                    .compose(&self.view(), self.fps.frame_to_secs(FrameIndex(f)))
                            },
                        )
                        .collect::<LecternResult<Vec<_>>>()
                })?
            } else if let Some(composer) = seq_composer.as_mut() {
                let mut out = Vec::with_capacity((chunk_end - chunk_start) as usize);
                for f in chunk_start..chunk_end {
                    out.push(composer.compose(&self.view(), self.fps.frame_to_secs(FrameIndex(f)))?);
                }
                out
            } else {
                return Err(LecternError::validation("render_into composer missing"));
            };

            for (offset, frame) in frames.iter().enumerate() {
                sink.push_frame(FrameIndex(chunk_start + offset as u64), frame)?;
                delivered += 1;
            }
            tracing::debug!(chunk_start, chunk_end, "rendered chunk");
            chunk_start = chunk_end;
        }

        sink.end()?;
        Ok(delivered)
    }

    /// Render the whole timeline into an MP4 at `out_path`, muxing the
    /// narration audio when this session owns one.
    pub fn render_to_mp4(
        &self,
        out_path: impl Into<PathBuf>,
        cancel: Option<&CancelToken>,
    ) -> LecternResult<u64> {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(out_path));
        self.render_into(&mut sink, cancel)
    }
}
