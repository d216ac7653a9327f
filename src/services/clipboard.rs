use arboard::Clipboard;
use color_eyre::Result;
use std::io::Cursor;

pub struct ClipboardService {
    clipboard: Option<Clipboard>,
}

impl ClipboardService {
    pub fn new() -> Self {
        Self {
            clipboard: Clipboard::new().ok(),
        }
    }

    pub fn copy_text(&mut self, text: &str) -> Result<()> {
        let clipboard = self.get_clipboard()?;
        clipboard.set_text(text.to_string())?;
        Ok(())
    }

    /// Clipboard image re-encoded as PNG, `None` when the clipboard holds no image
    pub fn read_image_png(&mut self) -> Result<Option<Vec<u8>>> {
        let clipboard = self.get_clipboard()?;
        let image = match clipboard.get_image() {
            Ok(image) => image,
            Err(arboard::Error::ContentNotAvailable) => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let width = u32::try_from(image.width)?;
        let height = u32::try_from(image.height)?;
        let png = rgba_to_png(width, height, image.bytes.into_owned())?;
        Ok(Some(png))
    }

    fn get_clipboard(&mut self) -> Result<&mut Clipboard> {
        if self.clipboard.is_none() {
            self.clipboard = Some(Clipboard::new()?);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| color_eyre::eyre::eyre!("Clipboard unavailable"))
    }
}

fn rgba_to_png(width: u32, height: u32, rgba: Vec<u8>) -> Result<Vec<u8>> {
    let buffer = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| color_eyre::eyre::eyre!("Clipboard image has an unexpected size"))?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_pixels_encode_as_png() {
        let png = rgba_to_png(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 1));
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        assert!(rgba_to_png(4, 4, vec![0; 8]).is_err());
    }
}
