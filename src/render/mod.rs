//! CPU scene composition on top of `vello_cpu`.

pub(crate) mod avatar;
/// Frame synthesis: one pixel buffer per timestamp.
pub mod frame;

use std::sync::Arc;

use crate::foundation::error::{LecternError, LecternResult};

/// Convert a `kurbo` path into the raster backend's path type.
pub(crate) fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Flatten a `kurbo` shape and fill it with the current paint.
pub(crate) fn fill_shape(ctx: &mut vello_cpu::RenderContext, shape: &impl kurbo::Shape) {
    let mut path = kurbo::BezPath::new();
    for el in shape.path_elements(0.1) {
        path.push(el);
    }
    ctx.fill_path(&bezpath_to_cpu(&path));
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> LecternResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| LecternError::validation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| LecternError::validation("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(LecternError::validation("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

/// Wrap premultiplied RGBA8 bytes as an image paint.
pub(crate) fn rgba_premul_to_image(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> LecternResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}
