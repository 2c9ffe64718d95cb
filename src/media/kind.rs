use image::ImageFormat;
use std::path::Path;

/// Media type used when a file's format cannot be recognised
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// True for `image/*` media types (e.g. "image/jpeg", "IMAGE/PNG")
pub fn is_image_media_type(media_type: &str) -> bool {
    let media_type = media_type.trim().to_ascii_lowercase();
    match media_type.strip_prefix("image/") {
        Some(subtype) => !subtype.is_empty(),
        None => false,
    }
}

/// Guess the media type of a file from its extension
pub fn media_type_for_path(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| UNKNOWN_MEDIA_TYPE.to_string())
}

/// File extension matching the encoded bytes ("jpg", "png", ...)
pub fn extension_for_bytes(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("bin")
}
