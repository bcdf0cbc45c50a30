use base64::{engine::general_purpose::STANDARD, Engine};
use image::{io::Reader as ImageReader, ImageFormat};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoInfo {
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

/// Decode a base64 photo payload, with or without a `data:<mime>;base64,` prefix
pub fn decode_photo_payload(payload: &str) -> Result<Vec<u8>, String> {
    let trimmed = payload.trim();
    let encoded = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or("Malformed data URL")?,
        None => trimmed,
    };
    STANDARD
        .decode(encoded)
        .map_err(|e| format!("Failed to decode base64: {}", e))
}

/// Identify the image format and read its dimensions without decoding pixels
pub fn inspect_photo(bytes: &[u8]) -> Result<PhotoInfo, String> {
    let format = image::guess_format(bytes).map_err(|_| "Not a recognizable image".to_string())?;
    let content_type = match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        other => return Err(format!("Unsupported image format: {:?}", other)),
    };

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| format!("Failed to read image: {}", e))?;

    Ok(PhotoInfo {
        width,
        height,
        content_type,
    })
}

/// File extension for an uploaded content type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}
