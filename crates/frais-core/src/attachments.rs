//! Attachment normalization
//!
//! Turns each uploaded justification document into a PDF ready for the
//! merger: PDFs pass through unchanged, images become exactly one portrait
//! A4 page with the picture scaled to fit and centered. Also hosts the
//! upload-time compression loop for oversized images.

use std::collections::HashMap;
use std::io::BufWriter;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use printpdf::{Image as PdfImage, ImageTransform, Mm, PdfDocument};

use crate::error::{Error, Result};
use crate::models::{Attachment, AttachmentId, AttachmentKind, ExpenseLine};

/// Portrait A4 page hosting normalized images, with a fixed margin
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const PAGE_MARGIN_MM: f32 = 15.0;

/// Images are embedded at this resolution; scaling is computed against it
const EMBED_DPI: f32 = 300.0;

/// Upload-time compression bounds
pub const COMPRESSION_THRESHOLD_BYTES: usize = 1_000_000;
pub const COMPRESSION_START_QUALITY: u8 = 85;
pub const COMPRESSION_FLOOR_QUALITY: u8 = 40;
const COMPRESSION_QUALITY_STEP: u8 = 10;
/// Hard cap applied before any quality adjustment
const MAX_PIXEL_WIDTH: u32 = 2000;

/// Per-attachment normalization result. Failures are data, not exceptions:
/// a skipped attachment carries its reason and the export surfaces it as a
/// warning instead of aborting.
#[derive(Debug, Clone)]
pub enum AttachmentOutcome {
    Normalized { filename: String, pdf: Vec<u8> },
    Skipped { filename: String, reason: String },
}

/// Normalize one attachment into a standalone PDF.
pub fn normalize(attachment: &Attachment) -> Result<Vec<u8>> {
    match attachment.kind {
        AttachmentKind::Pdf => {
            // Validate readability up front so corrupt files are skipped
            // here rather than poisoning the merge.
            lopdf::Document::load_mem(&attachment.bytes)?;
            Ok(attachment.bytes.clone())
        }
        AttachmentKind::Image => image_to_pdf(&attachment.bytes),
    }
}

/// Normalize every line's attachment, in line order.
pub fn normalize_line_attachments(
    lines: &[ExpenseLine],
    attachments: &HashMap<AttachmentId, Attachment>,
) -> Vec<AttachmentOutcome> {
    let mut outcomes = Vec::new();
    for line in lines {
        let Some(id) = line.attachment_id else {
            continue;
        };
        let Some(attachment) = attachments.get(&id) else {
            tracing::warn!(attachment_id = id, "line references a missing attachment");
            outcomes.push(AttachmentOutcome::Skipped {
                filename: format!("attachment #{}", id),
                reason: "not present in session".to_string(),
            });
            continue;
        };
        match normalize(attachment) {
            Ok(pdf) => outcomes.push(AttachmentOutcome::Normalized {
                filename: attachment.filename.clone(),
                pdf,
            }),
            Err(e) => {
                tracing::warn!(
                    filename = %attachment.filename,
                    error = %e,
                    "skipping unreadable attachment"
                );
                outcomes.push(AttachmentOutcome::Skipped {
                    filename: attachment.filename.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    outcomes
}

/// Wrap a JPG/PNG image into a single-page PDF: scaled uniformly to fit
/// inside the page margin, centered both ways.
fn image_to_pdf(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    // Flatten alpha; builtin PDF image embedding wants plain RGB.
    let img = DynamicImage::ImageRgb8(img.to_rgb8());
    let (px_w, px_h) = img.dimensions();
    if px_w == 0 || px_h == 0 {
        return Err(Error::InvalidData("empty image".to_string()));
    }

    let max_w = PAGE_WIDTH_MM - 2.0 * PAGE_MARGIN_MM;
    let max_h = PAGE_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM;
    let base_w = px_w as f32 * 25.4 / EMBED_DPI;
    let base_h = px_h as f32 * 25.4 / EMBED_DPI;
    let scale = (max_w / base_w).min(max_h / base_h);
    let display_w = base_w * scale;
    let display_h = base_h * scale;
    let x = PAGE_MARGIN_MM + (max_w - display_w) / 2.0;
    let y = PAGE_MARGIN_MM + (max_h - display_h) / 2.0;

    let (doc, page, layer) = PdfDocument::new(
        "Justificatif",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);

    PdfImage::from_dynamic_image(&img).add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(EMBED_DPI),
            ..Default::default()
        },
    );

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|e| Error::Render(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| Error::Render(e.to_string()))
}

/// Downsample and re-encode an oversized image until it fits `target_size`
/// or quality hits `floor_quality`, whichever comes first.
///
/// Pure and total: on any decode/encode failure, or when the result would
/// not actually be smaller, the original bytes come back unchanged. Input
/// already at or under the target is returned as-is.
pub fn compress_image(
    bytes: &[u8],
    target_size: usize,
    start_quality: u8,
    floor_quality: u8,
) -> Vec<u8> {
    if bytes.len() <= target_size {
        return bytes.to_vec();
    }

    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!(error = %e, "compression skipped, image undecodable");
            return bytes.to_vec();
        }
    };

    // Pixel-width cap first, quality steps second.
    let img = if img.width() > MAX_PIXEL_WIDTH {
        img.resize(MAX_PIXEL_WIDTH, u32::MAX, FilterType::Triangle)
    } else {
        img
    };
    let rgb = img.to_rgb8();

    let floor = floor_quality.min(start_quality);
    let mut quality = start_quality;
    let mut encoded: Option<Vec<u8>> = None;
    loop {
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        if let Err(e) = encoder.encode_image(&rgb) {
            tracing::warn!(error = %e, quality, "compression skipped, jpeg encode failed");
            return bytes.to_vec();
        }
        let len = out.len();
        encoded = Some(out);
        if len <= target_size || quality <= floor {
            break;
        }
        quality = quality.saturating_sub(COMPRESSION_QUALITY_STEP).max(floor);
    }

    match encoded {
        Some(out) if out.len() < bytes.len() => {
            tracing::debug!(
                original = bytes.len(),
                compressed = out.len(),
                "attachment image compressed"
            );
            out
        }
        _ => bytes.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::page_count;
    use std::io::Cursor;

    /// Small solid-color PNG fixture
    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Noisy PNG fixture, large enough to be over any realistic threshold
    fn noisy_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            // Cheap deterministic noise so PNG cannot compress it away.
            let v = x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17)) as u8;
            image::Rgb([v, v.wrapping_mul(7), v.wrapping_add(x as u8)])
        });
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn attachment(kind: AttachmentKind, bytes: Vec<u8>) -> Attachment {
        Attachment {
            id: 1,
            filename: match kind {
                AttachmentKind::Pdf => "piece.pdf".to_string(),
                AttachmentKind::Image => "piece.png".to_string(),
            },
            kind,
            bytes,
        }
    }

    #[test]
    fn test_image_becomes_single_page() {
        let pdf = image_to_pdf(&png_bytes(640, 480)).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 1);
    }

    #[test]
    fn test_tall_image_becomes_single_page() {
        let pdf = image_to_pdf(&png_bytes(100, 2500)).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 1);
    }

    #[test]
    fn test_normalize_pdf_passes_through() {
        let original = image_to_pdf(&png_bytes(100, 100)).unwrap();
        let att = attachment(AttachmentKind::Pdf, original.clone());
        let normalized = normalize(&att).unwrap();
        assert_eq!(normalized, original);
    }

    #[test]
    fn test_normalize_rejects_corrupt_pdf() {
        let att = attachment(AttachmentKind::Pdf, b"not a pdf at all".to_vec());
        assert!(normalize(&att).is_err());
    }

    #[test]
    fn test_normalize_rejects_corrupt_image() {
        let att = attachment(AttachmentKind::Image, vec![0, 1, 2, 3]);
        assert!(normalize(&att).is_err());
    }

    #[test]
    fn test_compress_under_threshold_is_identity() {
        let bytes = png_bytes(50, 50);
        let out = compress_image(&bytes, 1_000_000, 85, 40);
        assert_eq!(out, bytes);
        // Effectively idempotent once under the target.
        let again = compress_image(&out, 1_000_000, 85, 40);
        assert_eq!(again, out);
    }

    #[test]
    fn test_compress_shrinks_oversized_image() {
        let bytes = noisy_png_bytes(2600, 1800);
        assert!(bytes.len() > 200_000, "fixture should be big");
        let out = compress_image(&bytes, 200_000, 85, 40);
        assert!(out.len() < bytes.len());
    }

    #[test]
    fn test_compress_garbage_returns_input_unchanged() {
        let garbage = vec![42u8; 4096];
        let out = compress_image(&garbage, 16, 85, 40);
        assert_eq!(out, garbage);
    }

    #[test]
    fn test_normalize_line_attachments_reports_skips() {
        use chrono::NaiveDate;
        use crate::models::Category;

        let good = Attachment {
            id: 1,
            filename: "ok.png".to_string(),
            kind: AttachmentKind::Image,
            bytes: png_bytes(80, 80),
        };
        let bad = Attachment {
            id: 2,
            filename: "broken.pdf".to_string(),
            kind: AttachmentKind::Pdf,
            bytes: b"garbage".to_vec(),
        };
        let mut attachments = HashMap::new();
        attachments.insert(good.id, good);
        attachments.insert(bad.id, bad);

        let mk = |id: Option<AttachmentId>| ExpenseLine {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            supplier: "X".to_string(),
            description: "Y".to_string(),
            category: Category::Divers,
            amount: 1.0,
            budget_code: None,
            attachment_id: id,
        };
        let lines = vec![mk(Some(1)), mk(Some(2)), mk(None)];

        let outcomes = normalize_line_attachments(&lines, &attachments);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], AttachmentOutcome::Normalized { .. }));
        match &outcomes[1] {
            AttachmentOutcome::Skipped { filename, .. } => assert_eq!(filename, "broken.pdf"),
            other => panic!("expected skip, got {:?}", other),
        }
    }
}
