//! Shaped text support: Parley layout for single lines plus width
//! measurement feeding the greedy wrap in [`crate::layout`].

use std::path::{Path, PathBuf};

use crate::foundation::error::{LecternError, LecternResult};
use crate::layout::MeasureText;

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Well-known sans-serif font locations probed when no font is configured.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Resolve font bytes from an explicit path or the well-known search list.
///
/// An explicit path that cannot be read is a validation error (the caller
/// asked for it); an empty search result is `Ok(None)` and the renderer
/// degrades to text-free frames.
pub(crate) fn resolve_font_bytes(explicit: Option<&Path>) -> LecternResult<Option<Vec<u8>>> {
    if let Some(path) = explicit {
        let bytes = std::fs::read(path).map_err(|e| {
            LecternError::validation(format!("failed to read font '{}': {e}", path.display()))
        })?;
        return Ok(Some(bytes));
    }
    for candidate in FONT_SEARCH_PATHS {
        let p = PathBuf::from(candidate);
        if let Ok(bytes) = std::fs::read(&p) {
            tracing::debug!(font = %p.display(), "using system font for on-screen text");
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

/// Stateful helper building Parley layouts from one registered font.
pub(crate) struct TypeSetter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl TypeSetter {
    /// Register `font_bytes` and prepare shaping contexts.
    pub(crate) fn new(font_bytes: Vec<u8>) -> LecternResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            LecternError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| LecternError::validation("registered font family has no name"))?
            .to_string();

        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    /// Shape `text` as a single unbroken line at `size_px`.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Measured pixel width of `text` at `size_px`.
    pub(crate) fn width_px(&mut self, text: &str, size_px: f32) -> f64 {
        f64::from(self.layout_line(text, size_px, TextBrushRgba8::default()).width())
    }

    /// Font handle for glyph rasterization.
    pub(crate) fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }
}

/// [`MeasureText`] adapter binding a [`TypeSetter`] to one font size.
pub(crate) struct SizedMeasure<'a> {
    pub(crate) setter: &'a mut TypeSetter,
    pub(crate) size_px: f32,
}

impl MeasureText for SizedMeasure<'_> {
    fn width_px(&mut self, text: &str) -> f64 {
        self.setter.width_px(text, self.size_px)
    }
}
