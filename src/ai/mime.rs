//! Content-type sniffing for uploaded label photos.

/// Camera apps overwhelmingly produce JPEG, so unknown data is sent as such.
const FALLBACK_MIME: &str = "image/jpeg";

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] if is_heif_brand(brand) => "image/heic",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first bytes: {:02X?}), sending as {}",
                &bytes[..bytes.len().min(8)],
                FALLBACK_MIME
            );
            FALLBACK_MIME
        }
    }
}

fn is_heif_brand(brand: &[u8]) -> bool {
    matches!(
        brand.get(..4),
        Some(b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" | b"mif1" | b"msf1")
    )
}
