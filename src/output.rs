use minifb::{Key, KeyRepeat, Window, WindowOptions};
use tracing::info;

use crate::error::{Error, Result};
use crate::interaction::KeyEvent;
use crate::types::RgbFrame;

/// Display window for the composite stereo view.
pub struct WindowOutput {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| Error::Display(format!("failed to create window: {e}")))?;

        window.set_target_fps(60);
        info!(title, width, height, "window created");

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// At most one core key event per call; the first recognised key wins.
    pub fn poll_event(&self) -> Option<KeyEvent> {
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .find_map(map_key)
    }

    pub fn show(&mut self, frame: &RgbFrame) -> Result<()> {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
        }
        pack_argb(frame, &mut self.buffer);

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| Error::Display(format!("window update failed: {e}")))
    }
}

pub fn map_key(key: Key) -> Option<KeyEvent> {
    match key {
        Key::Q => KeyEvent::from_char('q'),
        Key::D => KeyEvent::from_char('d'),
        Key::L => KeyEvent::from_char('l'),
        _ => None,
    }
}

/// RGB8 to minifb's 0RGB words.
pub fn pack_argb(frame: &RgbFrame, buffer: &mut Vec<u32>) {
    buffer.clear();
    buffer.extend(frame.pixels().map(|p| {
        let [r, g, b] = p.0;
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn packs_rgb_into_words() {
        let frame = RgbFrame::from_pixel(2, 1, Rgb([0x12, 0x34, 0x56]));
        let mut buf = Vec::new();
        pack_argb(&frame, &mut buf);
        assert_eq!(buf, vec![0x0012_3456, 0x0012_3456]);
    }

    #[test]
    fn only_core_keys_map() {
        assert_eq!(map_key(Key::Q), Some(KeyEvent::Quit));
        assert_eq!(map_key(Key::D), Some(KeyEvent::ToggleMode));
        assert_eq!(map_key(Key::L), Some(KeyEvent::CycleLandmark));
        assert_eq!(map_key(Key::Escape), None);
    }
}
