use super::{
    metrics::TextMetrics,
    wrap::{Line, wrap_text},
};

/// Wrapped lines plus the space they occupy.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<Line>,
    /// Extra gap added below every line, the last one included.
    pub line_spacing: f32,
    pub total_width: f32,
    /// Sum of `line.height + line_spacing` over all lines.
    pub total_height: f32,
}

impl TextLayout {
    pub fn new(lines: Vec<Line>, line_spacing: f32) -> Self {
        let total_width = lines.iter().map(|line| line.width).fold(0.0, f32::max);
        let total_height: f32 = lines
            .iter()
            .map(|line| line.height + line_spacing)
            .sum();

        Self {
            lines,
            line_spacing,
            total_width,
            total_height,
        }
    }

    /// Wraps `text` to `max_width` and measures the result.
    pub fn wrap<M: TextMetrics + ?Sized>(
        text: &str,
        metrics: &M,
        max_width: f32,
        line_spacing: f32,
    ) -> Self {
        Self::new(wrap_text(text, metrics, max_width), line_spacing)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Each line with its top offset from the layout origin.
    pub fn positioned_lines(&self) -> impl Iterator<Item = (f32, &Line)> {
        self.lines.iter().scan(0.0, |top, line| {
            let this_top = *top;
            *top += line.height + self.line_spacing;
            Some((this_top, line))
        })
    }
}

/// Ordered font candidates for one piece of text, preferred (largest) first.
///
/// The list is fixed at construction and always holds a smallest candidate,
/// which is what makes [`FallbackFonts::fit`] total.
#[derive(Clone, Debug)]
pub struct FallbackFonts<M> {
    /// Every candidate but the last, largest first.
    larger: Vec<M>,
    smallest: M,
}

/// Outcome of [`FallbackFonts::fit`].
#[derive(Debug)]
pub struct FittedText<'a, M> {
    /// The candidate the layout was produced with.
    pub face: &'a M,
    /// Position of `face` in the candidate list.
    pub index: usize,
    pub layout: TextLayout,
    /// `false` when even the last candidate exceeded the height budget.
    pub fits: bool,
}

impl<M: TextMetrics> FallbackFonts<M> {
    /// Returns `None` for an empty list.
    pub fn new(mut faces: Vec<M>) -> Option<Self> {
        let smallest = faces.pop()?;
        Some(Self {
            larger: faces,
            smallest,
        })
    }

    /// Candidates in the order they are tried.
    pub fn faces(&self) -> impl Iterator<Item = &M> {
        self.larger.iter().chain(std::iter::once(&self.smallest))
    }


    /// Wraps `text` with each candidate in turn and keeps the first layout
    /// whose total height is within `max_height`.
    ///
    /// When nothing fits, the layout of the last candidate is returned with
    /// `fits` cleared; the caller draws it anyway and lets it overflow.
    pub fn fit(
        &self,
        text: &str,
        max_width: f32,
        max_height: f32,
        line_spacing: f32,
    ) -> FittedText<'_, M> {
        for (index, face) in self.larger.iter().enumerate() {
            let layout = TextLayout::wrap(text, face, max_width, line_spacing);
            if layout.total_height <= max_height {
                return FittedText {
                    face,
                    index,
                    layout,
                    fits: true,
                };
            }
        }

        let layout = TextLayout::wrap(text, &self.smallest, max_width, line_spacing);
        let fits = layout.total_height <= max_height;
        if !fits {
            log::warn!(
                "Text does not fit {max_width}x{max_height} even with the smallest font, \
                 overflowing by {}px",
                layout.total_height - max_height
            );
        }

        FittedText {
            face: &self.smallest,
            index: self.larger.len(),
            layout,
            fits,
        }
    }
}
