//! Decodes uploaded logo, signature and screenshot images into PDF image
//! XObjects. JPEG data passes through untouched under `DCTDecode`; PNG pixel
//! data passes through under `FlateDecode` with PNG prediction, so no pixel
//! decoding happens on the server.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lopdf::{dictionary, Object, Stream};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported image format, expected JPEG or PNG")]
    UnknownFormat,
    #[error("unsupported image: {0}")]
    Unsupported(String),
    #[error("image data is truncated")]
    Truncated,
}

/// A decoded image ready to be attached to a page.
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub xobject: Stream,
}

impl EmbeddedImage {
    pub fn aspect_ratio(&self) -> f32 {
        self.height as f32 / self.width as f32
    }
}

/// Accepts plain base64 or a `data:image/...;base64,` URL.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, ImageError> {
    let payload = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    Ok(STANDARD.decode(payload.trim())?)
}

pub fn embed(bytes: &[u8]) -> Result<EmbeddedImage, ImageError> {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        embed_jpeg(bytes)
    } else if bytes.starts_with(PNG_SIGNATURE) {
        embed_png(bytes)
    } else {
        Err(ImageError::UnknownFormat)
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Result<u16, ImageError> {
    let raw: [u8; 2] = bytes
        .get(at..at + 2)
        .and_then(|s| s.try_into().ok())
        .ok_or(ImageError::Truncated)?;
    Ok(u16::from_be_bytes(raw))
}

fn be_u32(bytes: &[u8], at: usize) -> Result<u32, ImageError> {
    let raw: [u8; 4] = bytes
        .get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or(ImageError::Truncated)?;
    Ok(u32::from_be_bytes(raw))
}

/// Walks the marker stream until a start-of-frame marker yields the
/// dimensions, then hands the whole file to the PDF reader as a `DCTDecode`
/// stream.
fn embed_jpeg(bytes: &[u8]) -> Result<EmbeddedImage, ImageError> {
    let mut pos = 2;
    loop {
        if *bytes.get(pos).ok_or(ImageError::Truncated)? != 0xFF {
            return Err(ImageError::UnknownFormat);
        }
        let marker = *bytes.get(pos + 1).ok_or(ImageError::Truncated)?;
        pos += 2;
        match marker {
            // Standalone markers carry no length.
            0xD0..=0xD9 | 0x01 => continue,
            // Start-of-frame variants, excluding DHT/JPG/DAC which share
            // the range.
            0xC0..=0xCF if marker != 0xC4 && marker != 0xC8 && marker != 0xCC => {
                let height = be_u16(bytes, pos + 3)?;
                let width = be_u16(bytes, pos + 5)?;
                let components = *bytes.get(pos + 7).ok_or(ImageError::Truncated)?;
                let color_space = match components {
                    1 => "DeviceGray",
                    3 => "DeviceRGB",
                    other => {
                        return Err(ImageError::Unsupported(format!(
                            "JPEG with {other} color components"
                        )))
                    }
                };
                let dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => color_space,
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                };
                return Ok(EmbeddedImage {
                    width: width as u32,
                    height: height as u32,
                    xobject: Stream::new(dict, bytes.to_vec()),
                });
            }
            _ => {
                let len = be_u16(bytes, pos)? as usize;
                if len < 2 {
                    return Err(ImageError::UnknownFormat);
                }
                pos += len;
            }
        }
    }
}

const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// 8-bit RGB or grayscale, non-interlaced PNGs only: for those the zlib
/// stream inside the IDAT chunks is exactly what `FlateDecode` with PNG
/// prediction expects, filter bytes included.
fn embed_png(bytes: &[u8]) -> Result<EmbeddedImage, ImageError> {
    let mut pos = PNG_SIGNATURE.len();
    let mut header: Option<(u32, u32, i64)> = None;
    let mut idat = Vec::new();

    loop {
        let len = be_u32(bytes, pos)? as usize;
        let kind = bytes.get(pos + 4..pos + 8).ok_or(ImageError::Truncated)?;
        let data = bytes
            .get(pos + 8..pos + 8 + len)
            .ok_or(ImageError::Truncated)?;
        match kind {
            b"IHDR" => {
                if len != 13 {
                    return Err(ImageError::UnknownFormat);
                }
                let width = be_u32(data, 0)?;
                let height = be_u32(data, 4)?;
                let bit_depth = data[8];
                let color_type = data[9];
                let interlace = data[12];
                if bit_depth != 8 {
                    return Err(ImageError::Unsupported(format!(
                        "{bit_depth}-bit PNG, only 8-bit is embeddable"
                    )));
                }
                if interlace != 0 {
                    return Err(ImageError::Unsupported("interlaced PNG".to_string()));
                }
                let colors = match color_type {
                    0 => 1,
                    2 => 3,
                    other => {
                        return Err(ImageError::Unsupported(format!(
                            "PNG color type {other}, convert to plain RGB first"
                        )))
                    }
                };
                header = Some((width, height, colors));
            }
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" => break,
            _ => {}
        }
        // Skip data and CRC.
        pos += 8 + len + 4;
    }

    let (width, height, colors) = header.ok_or(ImageError::UnknownFormat)?;
    if idat.is_empty() {
        return Err(ImageError::Truncated);
    }
    let color_space = if colors == 1 { "DeviceGray" } else { "DeviceRGB" };
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
        "DecodeParms" => dictionary! {
            "Predictor" => 15,
            "Colors" => colors,
            "BitsPerComponent" => 8,
            "Columns" => width as i64,
        },
    };
    Ok(EmbeddedImage {
        width,
        height,
        xobject: Stream::new(dict, idat),
    })
}
