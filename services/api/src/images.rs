//! Recipe image naming and validation

use std::path::Path;

use image::ImageFormat;
use uuid::Uuid;

/// Formats accepted for recipe images
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum upload size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Storage key for a new recipe image.
///
/// The client's file name is replaced by a random UUID; only its extension
/// is kept, so two uploads never collide.
pub fn recipe_image_key(filename: Option<&str>) -> String {
    let extension = filename
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty());

    match extension {
        Some(ext) => format!("uploads/recipe/{}.{}", Uuid::new_v4(), ext),
        None => format!("uploads/recipe/{}", Uuid::new_v4()),
    }
}

/// Check that `data` is an image in an allowed format and return its MIME type
pub fn validate_image(data: &[u8]) -> Result<&'static str, String> {
    if data.is_empty() {
        return Err("image: The submitted file is empty.".to_string());
    }

    let format = image::guess_format(data).map_err(|_| {
        "image: Upload a valid image. The file you uploaded was either not an image or a \
         corrupted image."
            .to_string()
    })?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "image: Unsupported image format {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        ));
    }

    Ok(format.to_mime_type())
}
