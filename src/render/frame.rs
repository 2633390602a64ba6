//! Per-timestamp frame synthesis.
//!
//! A frame is a pure function of the read-only session state and a timestamp:
//! background gradient, title/keyline card, both avatars, speech bubble, and
//! progress bar, composed in that order. Calling [`FrameComposer::compose`]
//! twice with the same inputs yields byte-identical output, which is what
//! makes frame-level regression testing and parallel rendering safe.

use crate::audio::envelope::Envelope;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{LecternError, LecternResult};
use crate::layout::wrap;
use crate::render::{fill_shape, rgba_premul_to_image};
use crate::render::avatar::draw_avatar;
use crate::script::{Scene, Script, Speaker};
use crate::timeline::{Utterance, active_index};
use crate::typeset::{SizedMeasure, TextBrushRgba8, TypeSetter};

/// Caps on rendered text lines; extra wrapped lines are dropped silently.
const KEYLINE_MAX_LINES: usize = 3;
const BUBBLE_MAX_LINES: usize = 6;

const TITLE_SIZE_PX: f32 = 40.0;
const KEYLINE_SIZE_PX: f32 = 32.0;
const BUBBLE_SIZE_PX: f32 = 28.0;
const LABEL_SIZE_PX: f32 = 18.0;

/// A rendered frame as opaque RGBA8 pixels, tightly packed, row-major.
///
/// Created fresh per synthesis call and owned by the caller; the composer
/// never retains frames.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes (`width * height * 4`), alpha always 255.
    pub data: Vec<u8>,
}

/// Read-only per-session state consumed on every frame query.
pub(crate) struct SceneView<'a> {
    pub(crate) script: &'a Script,
    pub(crate) utterances: &'a [Utterance],
    pub(crate) envelope: &'a Envelope,
    pub(crate) fps: Fps,
    pub(crate) total_duration: f64,
    pub(crate) total_frames: u64,
}

/// Stateful composer wrapping a raster context and text shaping contexts.
///
/// The internal state is scratch only; it is reset at the start of every
/// `compose` call and never leaks between frames.
pub(crate) struct FrameComposer {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    setter: Option<TypeSetter>,
}

impl FrameComposer {
    /// Create a composer for `canvas`, with optional font bytes for on-screen
    /// text. Without a font, frames render text-free (cosmetic degradation).
    pub(crate) fn new(canvas: Canvas, font_bytes: Option<Vec<u8>>) -> LecternResult<Self> {
        let w: u16 = canvas
            .width
            .try_into()
            .map_err(|_| LecternError::validation("canvas width exceeds u16"))?;
        let h: u16 = canvas
            .height
            .try_into()
            .map_err(|_| LecternError::validation("canvas height exceeds u16"))?;
        let setter = font_bytes.map(TypeSetter::new).transpose()?;
        Ok(Self {
            canvas,
            ctx: vello_cpu::RenderContext::new(w, h),
            setter,
        })
    }

    /// Compose the frame for timestamp `t`.
    ///
    /// `t` must be finite and non-negative; values at or past the declared
    /// duration clamp to the final frame's content.
    pub(crate) fn compose(&mut self, view: &SceneView<'_>, t: f64) -> LecternResult<FrameRgba> {
        if !t.is_finite() || t < 0.0 {
            return Err(LecternError::validation(format!(
                "frame timestamp must be finite and >= 0, got {t}"
            )));
        }
        let frame_idx = ((t * view.fps.as_f64()).floor() as u64).min(view.total_frames.saturating_sub(1));
        let env = f64::from(view.envelope.value_at(frame_idx));

        let u = &view.utterances[active_index(view.utterances, t)];
        let fallback_scene;
        let scene: &Scene = match view.script.scenes.get(u.scene) {
            Some(s) => s,
            None => {
                fallback_scene = Scene {
                    title: "Scene".to_string(),
                    keyline: String::new(),
                    dialogue: Vec::new(),
                };
                &fallback_scene
            }
        };

        self.ctx.reset();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        self.draw_background(t)?;
        self.draw_scene_card(scene);
        self.draw_speakers(u.speaker, env);
        self.draw_speech_bubble(u);
        self.draw_progress(view, u, t);

        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(
            self.canvas.width as u16,
            self.canvas.height as u16,
        );
        self.ctx.render_to_pixmap(&mut pixmap);

        let mut data = pixmap.data_as_u8_slice().to_vec();
        // The gradient fully covers the canvas, so every pixel is opaque and
        // premultiplied RGBA8 equals straight RGBA8.
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }

        Ok(FrameRgba {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
        })
    }

    /// Time-varying vertical gradient; purely decorative but deterministic.
    fn draw_background(&mut self, t: f64) -> LecternResult<()> {
        let w = self.canvas.width;
        let h = self.canvas.height;
        let mut bytes = vec![0u8; (w as usize) * (h as usize) * 4];
        for y in 0..h {
            let fy = f64::from(y) / f64::from(h);
            let r = 35.0 + 70.0 * fy + 15.0 * (t / 6.0).sin();
            let g = 55.0 + 85.0 * fy + 10.0 * (t / 5.0).cos();
            let b = 120.0 + 45.0 * fy + 20.0 * (t / 4.0).sin();
            let row = [
                r.clamp(0.0, 255.0) as u8,
                g.clamp(0.0, 255.0) as u8,
                b.clamp(0.0, 255.0) as u8,
                255,
            ];
            let off = (y as usize) * (w as usize) * 4;
            for px in bytes[off..off + (w as usize) * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&row);
            }
        }
        let img = rgba_premul_to_image(&bytes, w, h)?;
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(img);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
        Ok(())
    }

    /// Right-hand card with the scene title and wrapped keyline.
    fn draw_scene_card(&mut self, scene: &Scene) {
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        let (x0, y0, x1, y1) = (w * 0.55, h * 0.08, w * 0.95, h * 0.45);

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 225));
        fill_shape(&mut self.ctx, &kurbo::RoundedRect::new(x0, y0, x1, y1, 18.0));

        let Some(setter) = self.setter.as_mut() else {
            return;
        };
        draw_text_line(
            &mut self.ctx,
            setter,
            &scene.title,
            TITLE_SIZE_PX,
            TextBrushRgba8 {
                r: 20,
                g: 20,
                b: 40,
                a: 255,
            },
            kurbo::Point::new(x0 + 20.0, y0 + 16.0),
        );

        let max_width = x1 - x0 - 40.0;
        let keyline_brush = TextBrushRgba8 {
            r: 30,
            g: 30,
            b: 60,
            a: 255,
        };
        let lines: Vec<String> = wrap(
            &scene.keyline,
            SizedMeasure {
                setter: &mut *setter,
                size_px: KEYLINE_SIZE_PX,
            },
            max_width,
        )
        .take(KEYLINE_MAX_LINES)
        .collect();
        let mut y = y0 + 70.0;
        for line in lines {
            draw_text_line(
                &mut self.ctx,
                setter,
                &line,
                KEYLINE_SIZE_PX,
                keyline_brush,
                kurbo::Point::new(x0 + 20.0, y),
            );
            y += 36.0;
        }
    }

    /// Both figures; the active speaker gets the full envelope, the other a
    /// 0.15 attenuation so it stays subtly alive without stealing focus.
    fn draw_speakers(&mut self, active: Speaker, env: f64) {
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        let teacher_pos = kurbo::Point::new(w * 0.22, h * 0.46);
        let student_pos = kurbo::Point::new(w * 0.38, h * 0.56);

        let openness = |role: Speaker| {
            if role == active { env } else { 0.15 * env }
        };
        draw_avatar(&mut self.ctx, teacher_pos, openness(Speaker::Teacher), Speaker::Teacher);
        draw_avatar(&mut self.ctx, student_pos, openness(Speaker::Student), Speaker::Student);
    }

    /// Speech bubble: left for the teacher, right-shifted for the student.
    fn draw_speech_bubble(&mut self, u: &Utterance) {
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        let bubble_w = w * 0.48;
        let bubble_h = h * 0.28;
        let (bx, by) = match u.speaker {
            Speaker::Teacher => (w * 0.06, h * 0.08),
            Speaker::Student => (w * 0.26, h * 0.40),
        };

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 235));
        fill_shape(
            &mut self.ctx,
            &kurbo::RoundedRect::new(bx, by, bx + bubble_w, by + bubble_h, 18.0),
        );

        let Some(setter) = self.setter.as_mut() else {
            return;
        };
        let brush = TextBrushRgba8 {
            r: 10,
            g: 10,
            b: 25,
            a: 255,
        };
        let lines: Vec<String> = wrap(
            &u.text,
            SizedMeasure {
                setter: &mut *setter,
                size_px: BUBBLE_SIZE_PX,
            },
            bubble_w - 32.0,
        )
        .take(BUBBLE_MAX_LINES)
        .collect();
        let mut y = by + 16.0;
        for line in lines {
            draw_text_line(
                &mut self.ctx,
                setter,
                &line,
                BUBBLE_SIZE_PX,
                brush,
                kurbo::Point::new(bx + 16.0, y),
            );
            y += 30.0;
        }
    }

    /// Progress bar plus a "Scene i/n • Speaker" label.
    fn draw_progress(&mut self, view: &SceneView<'_>, u: &Utterance, t: f64) {
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        let p = (t / view.total_duration).clamp(0.0, 1.0);
        let (x0, x1, y) = (w * 0.08, w * 0.92, h * 0.92);

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(220, 220, 220, 255));
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(x0, y - 6.0, x1, y + 6.0));
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(50, 120, 200, 255));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            x0,
            y - 6.0,
            x0 + (x1 - x0) * p,
            y + 6.0,
        ));

        let Some(setter) = self.setter.as_mut() else {
            return;
        };
        let scene_count = view.script.scenes.len().max(1);
        let label = format!(
            "Scene {}/{} \u{2022} {}",
            u.scene + 1,
            scene_count,
            u.speaker.label()
        );
        draw_text_line(
            &mut self.ctx,
            setter,
            &label,
            LABEL_SIZE_PX,
            TextBrushRgba8 {
                r: 240,
                g: 240,
                b: 240,
                a: 255,
            },
            kurbo::Point::new(x0, y + 10.0),
        );
    }
}

/// Draw one pre-wrapped line of text with its top-left corner at `origin`.
fn draw_text_line(
    ctx: &mut vello_cpu::RenderContext,
    setter: &mut TypeSetter,
    text: &str,
    size_px: f32,
    brush: TextBrushRgba8,
    origin: kurbo::Point,
) {
    if text.is_empty() {
        return;
    }
    let layout = setter.layout_line(text, size_px, brush);
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin.x, origin.y)));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let b = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(setter.font())
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Line, Scene};
    use crate::timeline::allocate;

    fn sample_view<'a>(
        script: &'a Script,
        utterances: &'a [Utterance],
        envelope: &'a Envelope,
    ) -> SceneView<'a> {
        SceneView {
            script,
            utterances,
            envelope,
            fps: Fps::default(),
            total_duration: 2.0,
            total_frames: 48,
        }
    }

    fn sample_script() -> Script {
        Script {
            scenes: vec![Scene {
                title: "Concept 1".into(),
                keyline: "Key point".into(),
                dialogue: vec![
                    Line {
                        speaker: Speaker::Teacher,
                        text: "A first line of dialogue.".into(),
                    },
                    Line {
                        speaker: Speaker::Student,
                        text: "And a reply.".into(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn compose_is_byte_identical_for_equal_timestamps() {
        let script = sample_script();
        let utts = allocate(&script, 2.0).unwrap();
        let env = Envelope::synthetic(48);
        let view = sample_view(&script, &utts, &env);

        let mut composer = FrameComposer::new(Canvas::new(192, 108).unwrap(), None).unwrap();
        let a = composer.compose(&view, 0.7).unwrap();
        let b = composer.compose(&view, 0.7).unwrap();
        assert_eq!(a.data, b.data);

        // A fresh composer agrees too: no hidden scratch state leaks through.
        let mut other = FrameComposer::new(Canvas::new(192, 108).unwrap(), None).unwrap();
        let c = other.compose(&view, 0.7).unwrap();
        assert_eq!(a.data, c.data);
    }

    #[test]
    fn different_timestamps_produce_different_frames() {
        let script = sample_script();
        let utts = allocate(&script, 2.0).unwrap();
        let env = Envelope::synthetic(48);
        let view = sample_view(&script, &utts, &env);

        let mut composer = FrameComposer::new(Canvas::new(192, 108).unwrap(), None).unwrap();
        let a = composer.compose(&view, 0.1).unwrap();
        let b = composer.compose(&view, 1.9).unwrap();
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn frames_are_fully_opaque() {
        let script = sample_script();
        let utts = allocate(&script, 2.0).unwrap();
        let env = Envelope::synthetic(48);
        let view = sample_view(&script, &utts, &env);

        let mut composer = FrameComposer::new(Canvas::new(64, 36).unwrap(), None).unwrap();
        let frame = composer.compose(&view, 0.0).unwrap();
        assert_eq!(frame.data.len(), 64 * 36 * 4);
        assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn empty_script_renders_placeholder_without_panicking() {
        let script = Script::default();
        let utts = allocate(&script, 2.0).unwrap();
        let env = Envelope::synthetic(48);
        let view = sample_view(&script, &utts, &env);

        let mut composer = FrameComposer::new(Canvas::new(96, 54).unwrap(), None).unwrap();
        let frame = composer.compose(&view, 1.0).unwrap();
        assert_eq!(frame.width, 96);
    }

    #[test]
    fn timestamp_past_duration_clamps_to_final_frame() {
        let script = sample_script();
        let utts = allocate(&script, 2.0).unwrap();
        let env = Envelope::synthetic(48);
        let view = sample_view(&script, &utts, &env);

        let mut composer = FrameComposer::new(Canvas::new(96, 54).unwrap(), None).unwrap();
        assert!(composer.compose(&view, 10.0).is_ok());
        assert!(composer.compose(&view, -0.1).is_err());
        assert!(composer.compose(&view, f64::NAN).is_err());
    }
}
