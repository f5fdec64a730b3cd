//! `data:` URIs, percent-decoding and format sniffing for buffer and image URIs.

use base64::Engine;

use crate::error::{GltfError, Result};

/// A `data:<mime>;<encoding>,<payload>` URI split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime_type: &'a str,
    payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Parse a data URI. Only base64 payloads are accepted.
    pub fn parse(uri: &'a str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| GltfError::InvalidDataUri("missing 'data:' prefix".into()))?;
        let semicolon = rest
            .find(';')
            .ok_or_else(|| GltfError::InvalidDataUri("missing ';'".into()))?;
        let comma = rest
            .find(',')
            .filter(|&comma| comma > semicolon)
            .ok_or_else(|| GltfError::InvalidDataUri("missing ','".into()))?;

        let encoding = &rest[semicolon + 1..comma];
        if encoding != "base64" {
            return Err(GltfError::InvalidDataUri(format!("unsupported encoding '{}'", encoding)));
        }

        Ok(Self {
            mime_type: &rest[..semicolon],
            payload: &rest[comma + 1..],
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.payload.trim())
            .map_err(|e| GltfError::InvalidDataUri(e.to_string()))
    }
}

pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Mime types accepted for buffer payloads.
pub fn is_buffer_mime_type(mime_type: &str) -> bool {
    matches!(mime_type, "application/octet-stream" | "application/gltf-buffer")
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                output.push((h << 4) | l);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&output).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Encoded image formats the reader recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    Png,
    Jpeg,
    #[default]
    Unknown,
}

impl ImageFormat {
    pub fn from_mime_type(mime_type: &str) -> Self {
        match mime_type {
            "image/png" => ImageFormat::Png,
            "image/jpeg" => ImageFormat::Jpeg,
            _ => ImageFormat::Unknown,
        }
    }

    pub fn from_filename(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "png" => ImageFormat::Png,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            _ => ImageFormat::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_uri() {
        let uri = "data:application/octet-stream;base64,AAECAw==";
        let parsed = DataUri::parse(uri).unwrap();
        assert_eq!(parsed.mime_type, "application/octet-stream");
        assert_eq!(parsed.decode().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_non_base64_encoding_rejected() {
        assert!(DataUri::parse("data:text/plain;utf8,hello").is_err());
        assert!(DataUri::parse("data:text/plain,hello").is_err());
        assert!(DataUri::parse("file.bin").is_err());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("my%20model.bin"), "my model.bin");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
    }

    #[test]
    fn test_image_formats() {
        assert_eq!(ImageFormat::from_mime_type("image/png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_filename("textures/Albedo.JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_filename("noext"), ImageFormat::Unknown);
    }
}
