use std::fmt::{Debug, Formatter};

use crate::errors::{RasterError, Result};

/// Color interpretation of the entries of a [`ColorTable`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PaletteInterpretation {
    /// Grayscale, one component.
    Gray,
    /// Red, Green, Blue and Alpha in that order.
    #[default]
    Rgba,
    /// Cyan, Magenta, Yellow and Black in that order.
    Cmyk,
    /// Hue, Lightness and Saturation in that order.
    Hls,
}

impl PaletteInterpretation {
    pub fn name(&self) -> &'static str {
        match self {
            PaletteInterpretation::Gray => "Gray",
            PaletteInterpretation::Rgba => "RGB",
            PaletteInterpretation::Cmyk => "CMYK",
            PaletteInterpretation::Hls => "HLS",
        }
    }
}

/// Grayscale [`ColorTable`] entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GrayEntry {
    pub g: i16,
}

/// Red, green, blue, alpha [`ColorTable`] entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RgbaEntry {
    pub r: i16,
    pub g: i16,
    pub b: i16,
    pub a: i16,
}

/// Cyan, magenta, yellow, black [`ColorTable`] entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CmykEntry {
    pub c: i16,
    pub m: i16,
    pub y: i16,
    pub k: i16,
}

/// Hue, lightness, saturation [`ColorTable`] entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HlsEntry {
    pub h: i16,
    pub l: i16,
    pub s: i16,
}

/// A color table entry, typed by the interpretation of its table.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum ColorEntry {
    Gray(GrayEntry),
    Rgba(RgbaEntry),
    Cmyk(CmykEntry),
    Hls(HlsEntry),
}

impl ColorEntry {
    /// Instantiate a greyscale color entry
    pub fn grey(g: i16) -> Self {
        Self::Gray(GrayEntry { g })
    }

    /// Instantiate an red, green, blue, alpha color entry
    pub fn rgba(r: i16, g: i16, b: i16, a: i16) -> Self {
        Self::Rgba(RgbaEntry { r, g, b, a })
    }

    /// Instantiate a cyan, magenta, yellow, black color entry
    pub fn cmyk(c: i16, m: i16, y: i16, k: i16) -> Self {
        Self::Cmyk(CmykEntry { c, m, y, k })
    }

    /// Instantiate a hue, lightness, saturation color entry
    pub fn hls(h: i16, l: i16, s: i16) -> Self {
        Self::Hls(HlsEntry { h, l, s })
    }

    pub fn palette_interpretation(&self) -> PaletteInterpretation {
        match self {
            ColorEntry::Gray(_) => PaletteInterpretation::Gray,
            ColorEntry::Rgba(_) => PaletteInterpretation::Rgba,
            ColorEntry::Cmyk(_) => PaletteInterpretation::Cmyk,
            ColorEntry::Hls(_) => PaletteInterpretation::Hls,
        }
    }

    fn components(&self) -> [i16; 4] {
        match *self {
            ColorEntry::Gray(e) => [e.g, 0, 0, 0],
            ColorEntry::Rgba(e) => [e.r, e.g, e.b, e.a],
            ColorEntry::Cmyk(e) => [e.c, e.m, e.y, e.k],
            ColorEntry::Hls(e) => [e.h, e.l, e.s, 0],
        }
    }

    fn from_components(interpretation: PaletteInterpretation, c: [i16; 4]) -> Self {
        match interpretation {
            PaletteInterpretation::Gray => ColorEntry::grey(c[0]),
            PaletteInterpretation::Rgba => ColorEntry::rgba(c[0], c[1], c[2], c[3]),
            PaletteInterpretation::Cmyk => ColorEntry::cmyk(c[0], c[1], c[2], c[3]),
            PaletteInterpretation::Hls => ColorEntry::hls(c[0], c[1], c[2]),
        }
    }
}

impl Debug for ColorEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorEntry::Gray(e) => e.fmt(f),
            ColorEntry::Rgba(e) => e.fmt(f),
            ColorEntry::Cmyk(e) => e.fmt(f),
            ColorEntry::Hls(e) => e.fmt(f),
        }
    }
}

/// Color table for raster bands that use the PaletteIndex color interpretation.
///
/// Entries are stored as raw components and read back according to the
/// table's [`PaletteInterpretation`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ColorTable {
    interpretation: PaletteInterpretation,
    entries: Vec<[i16; 4]>,
}

impl ColorTable {
    /// Instantiate a new, empty color table with the given interpretation.
    pub fn new(interp: PaletteInterpretation) -> Self {
        ColorTable {
            interpretation: interp,
            entries: Vec::new(),
        }
    }

    /// Creates a color ramp between two entries, both inclusive.
    ///
    /// Entries below `start_index` are zero.
    pub fn color_ramp(
        start_index: u8,
        start_color: &ColorEntry,
        end_index: u8,
        end_color: &ColorEntry,
    ) -> Result<ColorTable> {
        if start_index > end_index {
            return Err(RasterError::BadArgument(format!(
                "color ramp start index {start_index} is after end index {end_index}"
            )));
        }
        let interpretation = start_color.palette_interpretation();
        if end_color.palette_interpretation() != interpretation {
            return Err(RasterError::BadArgument(
                "color ramp ends have different palette interpretations".to_string(),
            ));
        }
        let mut ct = ColorTable::new(interpretation);
        let (start, end) = (start_color.components(), end_color.components());
        let steps = (end_index - start_index) as usize;
        ct.set_color_entry(start_index as usize, start_color);
        for i in 1..=steps {
            let mut c = [0i16; 4];
            for (n, slot) in c.iter_mut().enumerate() {
                let slope = (end[n] as f64 - start[n] as f64) / steps as f64;
                *slot = (start[n] as f64 + i as f64 * slope) as i16;
            }
            ct.set_color_entry(
                start_index as usize + i,
                &ColorEntry::from_components(interpretation, c),
            );
        }
        Ok(ct)
    }

    /// How the entries of this table are interpreted.
    pub fn palette_interpretation(&self) -> PaletteInterpretation {
        self.interpretation
    }

    /// Get the number of color entries in this color table.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Get a color entry.
    pub fn entry(&self, index: usize) -> Option<ColorEntry> {
        self.entries
            .get(index)
            .map(|c| ColorEntry::from_components(self.interpretation, *c))
    }

    /// Get a color entry as RGBA.
    ///
    /// Only gray and RGB tables can be converted.
    pub fn entry_as_rgb(&self, index: usize) -> Option<RgbaEntry> {
        let c = self.entries.get(index)?;
        match self.interpretation {
            PaletteInterpretation::Gray => Some(RgbaEntry {
                r: c[0],
                g: c[0],
                b: c[0],
                a: 255,
            }),
            PaletteInterpretation::Rgba => Some(RgbaEntry {
                r: c[0],
                g: c[1],
                b: c[2],
                a: c[3],
            }),
            PaletteInterpretation::Cmyk | PaletteInterpretation::Hls => None,
        }
    }

    /// Set entry in the color table.
    ///
    /// The table grows as needed, padding with zeroed entries. The entry's own
    /// interpretation is not checked against the table's.
    pub fn set_color_entry(&mut self, index: usize, entry: &ColorEntry) {
        if index >= self.entries.len() {
            self.entries.resize(index + 1, [0; 4]);
        }
        self.entries[index] = entry.components();
    }
}
