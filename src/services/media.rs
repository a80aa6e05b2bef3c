use crate::errors::ServiceError;
use anyhow::{anyhow, Context};
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use tracing::instrument;

/// Fallback base name when sanitization strips everything.
const FALLBACK_BASENAME: &str = "image";
/// Maximum length of the sanitized base name, before timestamp and suffix.
const MAX_BASENAME_LEN: usize = 100;
/// Quality used for all re-encoded variants.
const JPEG_QUALITY: u8 = 80;

/// Fixed target widths for the generated derivatives. Heights are computed
/// from the source aspect ratio; sources narrower than a target are
/// stretched up rather than rejected.
pub const THUMBNAIL_WIDTH: u32 = 300;
pub const PREVIEW_WIDTH: u32 = 800;
pub const LARGE_WIDTH: u32 = 1600;

/// Turns an arbitrary user-supplied filename into a safe, bounded ASCII token.
///
/// Directory components are dropped (both `/` and `\`), the final extension
/// is removed, and any earlier extension-like segments are kept as
/// underscore-joined tokens so `a.php.jpg` becomes `a_php` instead of `a`.
/// Everything outside `[A-Za-z0-9_-]` is replaced with `_`.
pub fn sanitize_filename(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("");

    let segments: Vec<&str> = name.split('.').collect();
    let joined = if segments.len() > 1 {
        segments[..segments.len() - 1].join("_")
    } else {
        name.to_string()
    };

    let replaced: String = joined
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut collapsed = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.chars() {
        if c == '_' {
            if !prev_underscore {
                collapsed.push('_');
            }
            prev_underscore = true;
        } else {
            collapsed.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = collapsed.trim_matches('_');
    let base = if trimmed.is_empty() {
        FALLBACK_BASENAME
    } else {
        trimmed
    };

    base.chars().take(MAX_BASENAME_LEN).collect()
}

/// A single re-encoded derivative of an uploaded image.
#[derive(Debug, Clone)]
pub struct ImageVariant {
    pub data: Vec<u8>,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// The three derivatives produced for every upload. All share one timestamp
/// and sanitized base name, computed once per call.
#[derive(Debug, Clone)]
pub struct ImageVariantSet {
    pub thumbnail: ImageVariant,
    pub preview: ImageVariant,
    pub large: ImageVariant,
}

impl ImageVariantSet {
    pub fn iter(&self) -> impl Iterator<Item = &ImageVariant> {
        [&self.thumbnail, &self.preview, &self.large].into_iter()
    }
}

/// Resizes and re-encodes uploaded artwork into web-friendly derivatives.
///
/// Pure CPU/memory work; persisting the returned buffers is the caller's
/// responsibility.
#[derive(Debug, Clone, Default)]
pub struct MediaService;

impl MediaService {
    pub fn new() -> Self {
        Self
    }

    /// Produces thumbnail/preview/large JPEG variants of `bytes`.
    ///
    /// Fails when the input is empty, not a decodable image, or cannot be
    /// re-encoded; the error renders as the fixed "Failed to process image"
    /// message with the cause available for logs.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn generate_variants(
        &self,
        bytes: &[u8],
        original_filename: &str,
    ) -> Result<ImageVariantSet, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::ImageProcessing(anyhow!(
                "uploaded image is empty"
            )));
        }

        let decoded = image::load_from_memory(bytes)
            .context("could not decode uploaded image")
            .map_err(ServiceError::ImageProcessing)?;

        // JPEG output carries no alpha channel; flatten before resizing.
        let source = DynamicImage::ImageRgb8(decoded.to_rgb8());

        let timestamp = Utc::now().timestamp_millis();
        let base = sanitize_filename(original_filename);

        Ok(ImageVariantSet {
            thumbnail: encode_variant(&source, THUMBNAIL_WIDTH, "thumb", timestamp, &base)?,
            preview: encode_variant(&source, PREVIEW_WIDTH, "preview", timestamp, &base)?,
            large: encode_variant(&source, LARGE_WIDTH, "large", timestamp, &base)?,
        })
    }
}

fn scaled_height(src_w: u32, src_h: u32, target_w: u32) -> u32 {
    let height = (f64::from(target_w) * f64::from(src_h) / f64::from(src_w)).round();
    height.max(1.0) as u32
}

fn encode_variant(
    source: &DynamicImage,
    target_w: u32,
    suffix: &str,
    timestamp: i64,
    base: &str,
) -> Result<ImageVariant, ServiceError> {
    let (src_w, src_h) = source.dimensions();
    let target_h = scaled_height(src_w, src_h, target_w);

    let resized = source.resize_exact(target_w, target_h, FilterType::Lanczos3);

    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY);
    resized
        .write_with_encoder(encoder)
        .with_context(|| format!("could not encode {suffix} variant"))
        .map_err(ServiceError::ImageProcessing)?;

    Ok(ImageVariant {
        data,
        filename: format!("{timestamp}-{base}-{suffix}.jpg"),
        width: target_w,
        height: target_h,
    })
}
