// src/presentation/word_cloud.rs
//
// Lays out a weighted text as a word cloud and rasterizes it to PNG

use plotters::prelude::*;
use plotters::style::FontStyle;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::application::models::record::{CollectionContext, HashtagCount};
use crate::constants::{
    DEFAULT_STOPWORDS, FALLBACK_FONT_PATHS, WORD_CLOUD_HEIGHT, WORD_CLOUD_SEED,
    WORD_CLOUD_WIDTH,
};
use crate::error::{AppError, Reported};
use crate::storage::utils::word_cloud_path;
use crate::utils::hashtags::{build_weighted_text, rank_hashtags};

/// Glyph width relative to the font size, used to size word boxes.
const CHAR_WIDTH_RATIO: f64 = 0.6;
/// Pixels the spiral radius grows per radian.
const SPIRAL_SPACING: f64 = 2.0;
const SPIRAL_STEP: f64 = 0.1;
const FONT_FAMILY: &str = "word-cloud";

const PALETTE: &[RGBColor] = &[
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
    RGBColor(49, 104, 142),
];

#[derive(Debug, Clone)]
pub struct WordCloudOptions {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    /// Compared case-insensitively, with any leading `#` ignored.
    pub stopwords: Vec<String>,
    pub max_words: usize,
    pub max_font_size: u32,
    pub min_font_size: u32,
    pub background: RGBColor,
    /// TrueType font used to draw the words. `None` tries a few common system fonts.
    pub font_path: Option<PathBuf>,
}

impl Default for WordCloudOptions {
    fn default() -> Self {
        Self {
            width: WORD_CLOUD_WIDTH,
            height: WORD_CLOUD_HEIGHT,
            seed: WORD_CLOUD_SEED,
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            max_words: 200,
            max_font_size: 200,
            min_font_size: 10,
            background: WHITE,
            font_path: None,
        }
    }
}

impl WordCloudOptions {
    fn is_stopword(&self, word: &str) -> bool {
        let word = word.trim_start_matches('#');
        self.stopwords
            .iter()
            .any(|s| s.trim_start_matches('#').eq_ignore_ascii_case(word))
    }
}

/// A word with its box in pixel coordinates, top-left anchored.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub word: String,
    pub count: usize,
    pub font_size: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: RGBColor,
}

impl PlacedWord {
    fn overlaps(&self, x: i32, y: i32, width: u32, height: u32) -> bool {
        x < self.x + self.width as i32
            && self.x < x + width as i32
            && y < self.y + self.height as i32
            && self.y < y + height as i32
    }
}

fn text_box(word: &str, font_size: u32) -> (u32, u32) {
    let chars = word.chars().count() as f64;
    ((chars * font_size as f64 * CHAR_WIDTH_RATIO).ceil() as u32, font_size)
}

/// Walks an Archimedean spiral out of the canvas center and returns the first
/// free position for a `width` x `height` box.
fn find_position(
    placed: &[PlacedWord],
    width: u32,
    height: u32,
    options: &WordCloudOptions,
    start_angle: f64,
) -> Option<(i32, i32)> {
    if width > options.width || height > options.height {
        return None;
    }
    let cx = (options.width as f64 - width as f64) / 2.0;
    let cy = (options.height as f64 - height as f64) / 2.0;
    let max_radius = (options.width as f64).hypot(options.height as f64) / 2.0;

    let mut t = 0.0;
    while SPIRAL_SPACING * t <= max_radius {
        let r = SPIRAL_SPACING * t;
        let x = (cx + r * (t + start_angle).cos()).round() as i32;
        let y = (cy + r * (t + start_angle).sin()).round() as i32;
        t += SPIRAL_STEP;

        let inside = x >= 0
            && y >= 0
            && x as u32 + width <= options.width
            && y as u32 + height <= options.height;
        if inside && !placed.iter().any(|p| p.overlaps(x, y, width, height)) {
            return Some((x, y));
        }
    }
    None
}

/// Counts the words of `text`, drops stopwords and places the most frequent
/// words first, biggest font first.
///
/// Font size scales with frequency relative to the most frequent word. A word
/// that does not fit shrinks until `min_font_size` and is dropped after that.
pub fn layout_words<R: Rng + ?Sized>(
    text: &str,
    options: &WordCloudOptions,
    rng: &mut R,
) -> Vec<PlacedWord> {
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| !options.is_stopword(w))
        .collect();
    let counts: Vec<HashtagCount> = rank_hashtags(&words)
        .into_iter()
        .take(options.max_words)
        .collect();
    let Some(max_count) = counts.first().map(|c| c.count) else {
        return Vec::new();
    };

    let mut placed: Vec<PlacedWord> = Vec::with_capacity(counts.len());
    for entry in counts {
        let scale = 0.5 + 0.5 * entry.count as f64 / max_count as f64;
        let mut font_size = ((options.max_font_size as f64 * scale).round() as u32)
            .max(options.min_font_size);
        let start_angle = rng.gen_range(0.0..TAU);
        let color = *PALETTE.choose(rng).unwrap_or(&BLACK);

        loop {
            let (width, height) = text_box(&entry.hashtag, font_size);
            if let Some((x, y)) = find_position(&placed, width, height, options, start_angle) {
                placed.push(PlacedWord {
                    word: entry.hashtag.clone(),
                    count: entry.count,
                    font_size,
                    x,
                    y,
                    width,
                    height,
                    color,
                });
                break;
            }
            if font_size <= options.min_font_size {
                debug!("No room left for {}", entry.hashtag);
                break;
            }
            font_size = (font_size * 9 / 10).max(options.min_font_size);
        }
    }
    placed
}

/// Font file currently registered under `FONT_FAMILY`.
static REGISTERED_FONT: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Reads `path` and hands it to `register` unless it is already the registered
/// font. Returns whether a registration happened.
///
/// plotters keeps registered font bytes for the lifetime of the process, so the
/// bytes are leaked once per font switch.
fn register_font_once<F>(path: &Path, register: F) -> Result<bool, AppError>
where
    F: FnOnce(&'static [u8]) -> Result<(), AppError>,
{
    let mut current = REGISTERED_FONT
        .lock()
        .map_err(|_| AppError::Render("font registry poisoned".to_string()))?;
    if current.as_deref() == Some(path) {
        return Ok(false);
    }
    let bytes = std::fs::read(path)?;
    register(Box::leak(bytes.into_boxed_slice()))?;
    *current = Some(path.to_path_buf());
    debug!("Registered font {}", path.display());
    Ok(true)
}

fn register_font(options: &WordCloudOptions) -> Result<(), AppError> {
    let path = match &options.font_path {
        Some(path) => path.clone(),
        None => FALLBACK_FONT_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
            .ok_or_else(|| AppError::Render("no font found, set font_path".to_string()))?,
    };
    register_font_once(&path, |bytes| {
        plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
            .map_err(|_| AppError::Render(format!("invalid font file {}", path.display())))
    })?;
    Ok(())
}

/// Renders `text` as a PNG at `path`. Returns the placed words.
pub fn render_word_cloud<R: Rng + ?Sized>(
    text: &str,
    path: &Path,
    options: &WordCloudOptions,
    rng: &mut R,
) -> Result<Vec<PlacedWord>, AppError> {
    let words = layout_words(text, options, rng);
    if words.is_empty() {
        return Err(AppError::Render("no words to draw".to_string()));
    }
    register_font(options)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let render_err = |e: DrawingAreaErrorKind<_>| AppError::Render(e.to_string());
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&options.background).map_err(render_err)?;
    for word in &words {
        let style = (FONT_FAMILY, word.font_size as f64)
            .into_font()
            .color(&word.color);
        root.draw(&Text::new(word.word.as_str(), (word.x, word.y), style))
            .map_err(render_err)?;
    }
    root.present().map_err(render_err)?;

    info!("Word cloud with {} words written to {}", words.len(), path.display());
    Ok(words)
}

/// Draws the `top_n` hashtags of `ranked` to `<output_dir>/<username>_ht_word_cloud.png`.
pub fn make_hashtag_word_cloud(
    ctx: &CollectionContext,
    ranked: &[HashtagCount],
    top_n: usize,
    output_dir: &Path,
    options: &WordCloudOptions,
) -> Result<Reported<PathBuf>, AppError> {
    let Reported { value: text, warnings } = build_weighted_text(ranked, top_n);
    let path = word_cloud_path(output_dir, &ctx.username);
    let mut rng = StdRng::seed_from_u64(options.seed);
    render_word_cloud(&text, &path, options, &mut rng)?;
    Ok(Reported::with_warnings(path, warnings))
}
