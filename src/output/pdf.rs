//! Paginated PDF export
//!
//! The image is cut into page-sized horizontal bands. Every page has the
//! image's width and `width * aspect` height in PDF units (one unit per
//! pixel); a short last band sits at the top of its page on white.

use std::io::Write;

use image::{RgbaImage, imageops};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::domain::OutputError;

/// Cut `image` into bands of at most `width * aspect` rows
pub fn paginate(image: &RgbaImage, aspect: f64) -> Vec<RgbaImage> {
    let (width, height) = image.dimensions();
    let page_height = ((f64::from(width) * aspect).round() as u32).max(1);
    (0..height)
        .step_by(page_height as usize)
        .map(|top| {
            let rows = page_height.min(height - top);
            imageops::crop_imm(image, 0, top, width, rows).to_image()
        })
        .collect()
}

/// Flatten onto white and drop alpha
fn rgb_on_white(image: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.as_raw().len() / 4 * 3);
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let a = u32::from(a);
        for c in [r, g, b] {
            rgb.push(((u32::from(c) * a + 255 * (255 - a)) / 255) as u8);
        }
    }
    rgb
}

/// Write `image` as a paginated PDF
pub fn write_pdf<W: Write>(mut w: W, image: &RgbaImage, aspect: f64) -> Result<(), OutputError> {
    let width = i64::from(image.width());
    let page_height = ((image.width() as f64 * aspect).round() as i64).max(1);
    let bands = paginate(image, aspect);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(bands.len());

    for band in &bands {
        let rows = i64::from(band.height());
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => rows,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb_on_white(band),
        ));

        // PDF space is bottom-up: place the band against the page top
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width.into(),
                        0.into(),
                        0.into(),
                        rows.into(),
                        0.into(),
                        (page_height - rows).into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), page_height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    doc.save_to(&mut w)?;
    log::info!("Wrote {count}-page PDF");
    Ok(())
}
