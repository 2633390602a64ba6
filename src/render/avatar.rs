//! Stylized speaker figure whose mouth opening tracks the loudness envelope.
//!
//! Drawing is purely additive into the caller's render context: a fixed
//! geometric figure (head, body, eyes, pupils, mouth) whose only moving parts
//! are a small head bob and the mouth ellipse height, both affine in
//! `mouth_openness`. Identical inputs produce identical pixels.

use crate::render::fill_shape;
use crate::script::Speaker;

const HEAD_RADIUS: f64 = 56.0;
const BODY_WIDTH: f64 = 110.0;
const BODY_HEIGHT: f64 = 160.0;
const EYE_OFFSET_X: f64 = 24.0;
const EYE_RADIUS: f64 = 8.0;
const PUPIL_RADIUS: f64 = 3.0;
const MOUTH_HALF_WIDTH: f64 = 34.0;

/// Fixed per-role fill colors; the only behavioral difference between roles.
fn palette(speaker: Speaker) -> (vello_cpu::peniko::Color, vello_cpu::peniko::Color) {
    match speaker {
        Speaker::Teacher => (
            vello_cpu::peniko::Color::from_rgba8(30, 30, 120, 255),
            vello_cpu::peniko::Color::from_rgba8(50, 50, 160, 255),
        ),
        Speaker::Student => (
            vello_cpu::peniko::Color::from_rgba8(120, 30, 30, 255),
            vello_cpu::peniko::Color::from_rgba8(160, 50, 50, 255),
        ),
    }
}

/// Draw one speaker figure centered at `center`.
///
/// `mouth_openness` is the envelope value in `[0, 1]`; callers attenuate it
/// for the figure that is not currently speaking so the secondary character
/// stays subtly alive while the active speaker moves at full amplitude.
pub(crate) fn draw_avatar(
    ctx: &mut vello_cpu::RenderContext,
    center: kurbo::Point,
    mouth_openness: f64,
    speaker: Speaker,
) {
    let env = mouth_openness.clamp(0.0, 1.0);
    let (head_color, body_color) = palette(speaker);

    let x = center.x;
    // Subtle bob keyed to the same envelope as the mouth.
    let y = center.y + (4.0 * env).floor();

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

    ctx.set_paint(head_color);
    fill_shape(ctx, &kurbo::Circle::new((x, y), HEAD_RADIUS));

    ctx.set_paint(body_color);
    let body = kurbo::RoundedRect::new(
        x - BODY_WIDTH / 2.0,
        y + HEAD_RADIUS - 10.0,
        x + BODY_WIDTH / 2.0,
        y + HEAD_RADIUS - 10.0 + BODY_HEIGHT,
        18.0,
    );
    fill_shape(ctx, &body);

    let eye_y = y - 8.0;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    fill_shape(ctx, &kurbo::Circle::new((x - EYE_OFFSET_X, eye_y), EYE_RADIUS));
    fill_shape(ctx, &kurbo::Circle::new((x + EYE_OFFSET_X, eye_y), EYE_RADIUS));

    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
    fill_shape(ctx, &kurbo::Circle::new((x - EYE_OFFSET_X, eye_y), PUPIL_RADIUS));
    fill_shape(ctx, &kurbo::Circle::new((x + EYE_OFFSET_X, eye_y), PUPIL_RADIUS));

    // Mouth height is an affine function of the envelope: closed lips stay
    // 6px tall, a shout opens to 30px.
    let mouth_h = 6.0 + env * 24.0;
    let mouth = kurbo::Ellipse::new(
        (x, y + 22.0 + mouth_h / 2.0),
        (MOUTH_HALF_WIDTH, mouth_h / 2.0),
        0.0,
    );
    fill_shape(ctx, &mouth);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_figure(env: f64, speaker: Speaker) -> Vec<u8> {
        let mut ctx = vello_cpu::RenderContext::new(320, 360);
        ctx.reset();
        draw_avatar(&mut ctx, kurbo::Point::new(160.0, 120.0), env, speaker);
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(320, 360);
        ctx.render_to_pixmap(&mut pixmap);
        pixmap.data_as_u8_slice().to_vec()
    }

    #[test]
    fn identical_inputs_yield_identical_pixels() {
        let a = render_figure(0.42, Speaker::Teacher);
        let b = render_figure(0.42, Speaker::Teacher);
        assert_eq!(a, b);
    }

    #[test]
    fn mouth_openness_changes_the_figure() {
        let closed = render_figure(0.0, Speaker::Student);
        let open = render_figure(1.0, Speaker::Student);
        assert_ne!(closed, open);
    }

    #[test]
    fn roles_differ_only_by_palette_but_do_differ() {
        let teacher = render_figure(0.5, Speaker::Teacher);
        let student = render_figure(0.5, Speaker::Student);
        assert_ne!(teacher, student);
    }
}
