use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{error::FontError, text::FontFace};

/// Font database plus the rasterizer-ready fonts loaded from it.
///
/// Faces are registered with `fontdb` and only parsed by `fontdue` the first
/// time a [`FontFace`] is requested, so loading a whole directory stays cheap.
pub struct FontStorage {
    /// Every face known to fontdb.
    font_db: fontdb::Database,
    /// Faces parsed by fontdue so far.
    loaded_font: HashMap<fontdb::ID, Arc<fontdue::Font>, fxhash::FxBuildHasher>,
    system_fonts_loaded: bool,
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            system_fonts_loaded: false,
        }
    }
}

/// Registering faces.
impl FontStorage {
    /// Registers a font from memory and returns the id of its first face.
    pub fn load_font_binary(&mut self, data: impl Into<Vec<u8>>) -> Option<fontdb::ID> {
        let data: Arc<dyn AsRef<[u8]> + Send + Sync> = Arc::new(data.into());
        self.font_db
            .load_font_source(fontdb::Source::Binary(data))
            .first()
            .copied()
    }

    /// Registers a font file and returns the id of its first face.
    ///
    /// Collections (`.ttc`) register every face; the first one is returned.
    pub fn load_font_file(&mut self, path: &Path) -> Result<fontdb::ID, FontError> {
        if !path.is_file() {
            return Err(FontError::NoFace(path.to_path_buf()));
        }

        self.font_db
            .load_font_source(fontdb::Source::File(path.to_path_buf()))
            .first()
            .copied()
            .ok_or_else(|| FontError::NoFace(path.to_path_buf()))
    }

    /// Registers the fonts installed on the host.
    pub fn load_system_fonts(&mut self) {
        self.font_db.load_system_fonts();
        self.system_fonts_loaded = true;
        log::debug!("Font database holds {} faces after the system scan.", self.len());
    }

    pub fn is_empty(&self) -> bool {
        self.font_db.is_empty()
    }

    pub fn len(&self) -> usize {
        self.font_db.len()
    }
}

/// Generic families.
///
/// fontdb resolves `Family::Serif` to "Times New Roman" and
/// `Family::SansSerif` to "Arial" unless told otherwise.
impl FontStorage {
    /// Sets the family name for the "serif" generic family.
    pub fn set_serif_family(&mut self, family: impl Into<String>) {
        self.font_db.set_serif_family(family);
    }

    /// Sets the family name for the "sans-serif" generic family.
    pub fn set_sans_serif_family(&mut self, family: impl Into<String>) {
        self.font_db.set_sans_serif_family(family);
    }
}

/// Getting faces.
impl FontStorage {
    /// Finds the best match for `family`, scanning the system fonts first if
    /// that has not happened yet.
    pub fn query_family(
        &mut self,
        family: fontdb::Family<'_>,
        weight: fontdb::Weight,
    ) -> Option<fontdb::ID> {
        if !self.system_fonts_loaded {
            self.load_system_fonts();
        }

        self.font_db.query(&fontdb::Query {
            families: &[family],
            weight,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        })
    }

    /// [`FontStorage::query_family`], falling back to the registered face
    /// closest to `weight` when no face carries the family name.
    ///
    /// Only `None` when the database holds no faces at all.
    pub fn resolve_family(
        &mut self,
        family: fontdb::Family<'_>,
        weight: fontdb::Weight,
    ) -> Option<fontdb::ID> {
        if let Some(id) = self.query_family(family, weight) {
            return Some(id);
        }

        let id = self.closest_face(weight)?;
        log::debug!(
            "No face for {}, settling for {}",
            self.font_db.family_name(&family),
            self.family_name(id).unwrap_or("<unnamed>")
        );
        Some(id)
    }

    /// Upright, proportional faces first, then the smallest weight distance.
    fn closest_face(&self, weight: fontdb::Weight) -> Option<fontdb::ID> {
        self.font_db
            .faces()
            .min_by_key(|face| {
                (
                    face.style != fontdb::Style::Normal,
                    face.monospaced,
                    face.weight.0.abs_diff(weight.0),
                )
            })
            .map(|face| face.id)
    }

    /// Retrieves a parsed font by id, parsing it on first use.
    pub fn font(&mut self, id: fontdb::ID) -> Result<Arc<fontdue::Font>, FontError> {
        use std::collections::hash_map::Entry;

        match self.loaded_font.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let font_result = self
                    .font_db
                    .with_face_data(id, |data, index| {
                        fontdue::Font::from_bytes(
                            data,
                            fontdue::FontSettings {
                                collection_index: index,
                                scale: 40.0,
                                load_substitutions: true,
                            },
                        )
                    })
                    .ok_or_else(|| FontError::Rasterizer(format!("face {id:?} is not registered")))?;

                match font_result {
                    Ok(font) => {
                        let r: &mut Arc<fontdue::Font> = entry.insert(Arc::new(font));
                        Ok(Arc::clone(r))
                    }
                    Err(e) => {
                        log::error!("Failed to load font (id: {:?}): {}", id, e);
                        Err(FontError::Rasterizer(e.to_string()))
                    }
                }
            }
        }
    }

    /// A face for `id` at `size` pixels.
    pub fn face(&mut self, id: fontdb::ID, size: f32) -> Result<FontFace, FontError> {
        self.font(id).map(|font| FontFace::new(id, font, size))
    }

    /// Family name of a registered face, for logging.
    pub fn family_name(&self, id: fontdb::ID) -> Option<&str> {
        self.font_db
            .face(id)
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.as_str())
    }
}

/// A face resolved the way the screen resolves its fallback, or `None` on a
/// host without any fonts.
#[cfg(test)]
pub(crate) fn test_face(size: f32) -> Option<FontFace> {
    let mut storage = FontStorage::new();
    let id = storage.resolve_family(fontdb::Family::SansSerif, fontdb::Weight::NORMAL)?;
    storage.face(id, size).ok()
}
