//! Screenshot and clipboard seams.
//!
//! The engine itself never rasterizes or touches a system clipboard;
//! embedders plug in implementations of these traits. The defaults
//! keep the engine usable in tests and the CLI: captures report
//! unsupported, clipboard writes collect into a buffer.

use crate::error::Error;

/// Renders the current page to PNG bytes.
pub trait Rasterizer {
    fn capture(&self) -> Result<Vec<u8>, Error>;
}

/// Receives snapshot text or image bytes.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), Error>;
    fn write_image(&mut self, png_bytes: &[u8]) -> Result<(), Error>;
}

/// Placeholder rasterizer for environments with no renderer attached.
#[derive(Debug, Default)]
pub struct NoRasterizer;

impl Rasterizer for NoRasterizer {
    fn capture(&self) -> Result<Vec<u8>, Error> {
        Err(Error::Capture("no rasterizer attached".to_string()))
    }
}

/// In-memory clipboard, also used by the CLI to print what was copied.
#[derive(Debug, Default)]
pub struct BufferClipboard {
    pub text: Option<String>,
    pub image: Option<Vec<u8>>,
}

impl Clipboard for BufferClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), Error> {
        self.text = Some(text.to_string());
        Ok(())
    }

    fn write_image(&mut self, png_bytes: &[u8]) -> Result<(), Error> {
        self.image = Some(png_bytes.to_vec());
        Ok(())
    }
}
