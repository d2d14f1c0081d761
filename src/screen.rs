//! The now-playing screen: title, artist and album art on one canvas.

use std::path::Path;

use euclid::default::Point2D;
use image::GrayImage;

use crate::{
    config::LayoutConfig,
    error::FontError,
    font_storage::FontStorage,
    renderer::Canvas,
    source::Track,
    text::{FallbackFonts, FittedText, FontFace, TextMetrics},
};

/// Turns a track into a frame for the panel.
pub trait TrackView {
    /// Largest artwork, in pixels, the view can place.
    fn artwork_bounds(&self) -> [u32; 2];

    /// Redraws the whole frame for `track`.
    fn compose(&mut self, track: &Track, artwork: Option<&GrayImage>) -> &GrayImage;
}

/// Where the title and artist go, decided before anything is drawn.
#[derive(Debug)]
pub struct ScreenPlan<'a, M> {
    pub title: FittedText<'a, M>,
    pub title_origin: Point2D<i32>,
    pub artist: FittedText<'a, M>,
    pub artist_origin: Point2D<i32>,
}

/// Height the title may take: the canvas minus the artist line and a
/// margin above and below.
pub fn title_budget(layout: &LayoutConfig, canvas_height: u32) -> f32 {
    (canvas_height as f32 - layout.artist_reserve - 2.0 * layout.margin_top as f32).max(0.0)
}

/// Space between the art position and the bottom-right canvas corner.
pub fn artwork_bounds(layout: &LayoutConfig, canvas_size: [u32; 2]) -> [u32; 2] {
    let [x, y] = layout.art_position;
    let [width, height] = canvas_size;
    [
        (width as i32 - x).max(0) as u32,
        (height as i32 - y).max(0) as u32,
    ]
}

/// Fits title and artist for `track` on a canvas `canvas_height` pixels tall.
///
/// The title picks the largest candidate within [`title_budget`]; the artist
/// starts `artist_gap` below the title and gets whatever height is left
/// above the bottom margin.
pub fn plan<'a, M: TextMetrics>(
    layout: &LayoutConfig,
    canvas_height: u32,
    title_fonts: &'a FallbackFonts<M>,
    artist_fonts: &'a FallbackFonts<M>,
    track: &Track,
) -> ScreenPlan<'a, M> {
    let title_origin = Point2D::new(0, layout.margin_top);
    let title = title_fonts.fit(
        &track.song_name,
        layout.text_max_width,
        title_budget(layout, canvas_height),
        layout.line_spacing,
    );
    log::debug!(
        "Title \"{}\" uses candidate {} over {} lines",
        track.song_name,
        title.index,
        title.layout.lines.len()
    );

    let title_end = title_origin.y + title.layout.total_height.round() as i32;
    let artist_origin = Point2D::new(0, title_end + layout.artist_gap);
    let artist_budget =
        (canvas_height as i32 - artist_origin.y - layout.margin_top).max(0) as f32;
    let artist = artist_fonts.fit(
        &track.artist_name,
        layout.text_max_width,
        artist_budget,
        layout.line_spacing,
    );

    ScreenPlan {
        title,
        title_origin,
        artist,
        artist_origin,
    }
}

pub struct NowPlayingScreen {
    layout: LayoutConfig,
    title_fonts: FallbackFonts<FontFace>,
    artist_fonts: FallbackFonts<FontFace>,
    canvas: Canvas,
}

impl NowPlayingScreen {
    pub fn new(
        layout: LayoutConfig,
        title_fonts: FallbackFonts<FontFace>,
        artist_fonts: FallbackFonts<FontFace>,
        size: [u32; 2],
    ) -> Self {
        let [width, height] = size;
        Self {
            layout,
            title_fonts,
            artist_fonts,
            canvas: Canvas::new(width, height),
        }
    }

    /// Loads the configured fonts from `assets_dir` and builds a screen of
    /// `size` pixels.
    ///
    /// A missing font file falls back to the configured installed family
    /// (serif for the title, sans-serif for the artist), and failing that to
    /// the installed face closest in weight.
    pub fn load(
        storage: &mut FontStorage,
        layout: LayoutConfig,
        assets_dir: &Path,
        size: [u32; 2],
    ) -> Result<Self, FontError> {
        storage.set_serif_family(layout.title_fallback_family.clone());
        storage.set_sans_serif_family(layout.artist_fallback_family.clone());

        let title_fonts = load_candidates(
            storage,
            &assets_dir.join(&layout.title_font),
            fontdb::Family::Serif,
            fontdb::Weight::BOLD,
            &layout.title_sizes,
            "title",
        )?;
        let artist_fonts = load_candidates(
            storage,
            &assets_dir.join(&layout.artist_font),
            fontdb::Family::SansSerif,
            fontdb::Weight::NORMAL,
            &layout.artist_sizes,
            "artist",
        )?;

        Ok(Self::new(layout, title_fonts, artist_fonts, size))
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

impl TrackView for NowPlayingScreen {
    fn artwork_bounds(&self) -> [u32; 2] {
        artwork_bounds(&self.layout, [self.canvas.width(), self.canvas.height()])
    }

    fn compose(&mut self, track: &Track, artwork: Option<&GrayImage>) -> &GrayImage {
        self.canvas.clear();

        let plan = plan(
            &self.layout,
            self.canvas.height(),
            &self.title_fonts,
            &self.artist_fonts,
            track,
        );
        self.canvas
            .draw_layout(plan.title_origin, plan.title.face, &plan.title.layout);
        self.canvas
            .draw_layout(plan.artist_origin, plan.artist.face, &plan.artist.layout);

        if let Some(artwork) = artwork {
            let [x, y] = self.layout.art_position;
            self.canvas.draw_image(Point2D::new(x, y), artwork);
        }

        self.canvas.image()
    }
}

fn load_candidates(
    storage: &mut FontStorage,
    path: &Path,
    fallback: fontdb::Family<'_>,
    weight: fontdb::Weight,
    sizes: &[f32],
    role: &'static str,
) -> Result<FallbackFonts<FontFace>, FontError> {
    let id = if path.is_file() {
        storage.load_font_file(path)?
    } else {
        let id = storage
            .resolve_family(fallback, weight)
            .ok_or_else(|| FontError::NoFace(path.to_path_buf()))?;
        log::warn!(
            "{} not found, using system font {} for the {role}",
            path.display(),
            storage.family_name(id).unwrap_or("<unnamed>")
        );
        id
    };

    let mut sizes = sizes.to_vec();
    sizes.sort_by(|a, b| b.total_cmp(a));
    sizes.dedup();

    let base = match sizes.first() {
        Some(&size) => storage.face(id, size)?,
        None => return Err(FontError::NoSizes(role)),
    };
    let faces = sizes.iter().map(|&size| base.with_size(size)).collect();

    FallbackFonts::new(faces).ok_or(FontError::NoSizes(role))
}
