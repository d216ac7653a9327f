use base64::{Engine as _, engine::general_purpose::STANDARD};
use color_eyre::Result;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::storage::{Attachment, AttachmentKind};

/// Reads a file into an attachment: images by extension become data URLs, the rest text
pub fn load_attachment(path: &Path) -> Result<Attachment> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file")
        .to_string();
    let bytes = std::fs::read(path)?;

    let attachment = match image_mime(path) {
        Some(mime) => Attachment::image(name, data_url(mime, &bytes)),
        None => Attachment::text(name, String::from_utf8_lossy(&bytes).into_owned()),
    };
    tracing::debug!(
        path = %path.display(),
        kind = ?attachment.kind,
        bytes = bytes.len(),
        "attachment loaded"
    );
    Ok(attachment)
}

/// Wraps PNG bytes (e.g. from the clipboard) as an image attachment
pub fn png_attachment(name: impl Into<String>, png_bytes: &[u8]) -> Attachment {
    Attachment::image(name, data_url("image/png", png_bytes))
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension().and_then(|ext| ext.to_str())?;
    match extension.to_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// Pixel size of an image attachment, when its data decodes
#[must_use]
pub fn image_dimensions(attachment: &Attachment) -> Option<(u32, u32)> {
    if attachment.kind != AttachmentKind::Image {
        return None;
    }
    let (_, payload) = attachment.content.split_once(";base64,")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Short label shown for a staged attachment
#[must_use]
pub fn chip_label(attachment: &Attachment) -> String {
    match attachment.kind {
        AttachmentKind::Text => attachment.name.clone(),
        AttachmentKind::Image => match image_dimensions(attachment) {
            Some((width, height)) => format!("{} ({width}x{height})", attachment.name),
            None => attachment.name.clone(),
        },
    }
}

/// Interprets typed or pasted text as a path to an existing file
///
/// Accepts `file://` URLs, surrounding quotes and a leading `~/`.
pub fn parse_attachment_path(input: &str) -> Option<PathBuf> {
    let mut candidate = input
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string();
    if let Some(stripped) = candidate.strip_prefix("file://") {
        candidate = stripped.to_string();
    }
    if let Some(rest) = candidate.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        candidate = PathBuf::from(home)
            .join(rest)
            .to_string_lossy()
            .into_owned();
    }
    if candidate.is_empty() {
        return None;
    }
    let path = PathBuf::from(candidate);
    path.is_file().then_some(path)
}
