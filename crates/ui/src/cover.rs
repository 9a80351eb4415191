//! Cover images for the details dialog.

use std::time::Duration;

use ratatui::layout::Rect;
use ratatui_image::picker::{Picker, cap_parser::QueryStdioOptions};
use ratatui_image::protocol::Protocol as ImageProtocol;
use ratatui_image::{Image as ImageWidget, Resize};

fn graphics_terminal_hint() -> bool {
    let env_set = |name: &str| {
        std::env::var(name)
            .ok()
            .is_some_and(|v| !v.trim().is_empty())
    };
    env_set("KITTY_WINDOW_ID")
        || env_set("ITERM_SESSION_ID")
        || std::env::var("TERM")
            .ok()
            .is_some_and(|term| term.starts_with("xterm-kitty"))
        || std::env::var("TERM_PROGRAM")
            .ok()
            .is_some_and(|term| term.contains("iTerm") || term.contains("WezTerm"))
}

/// Queries the terminal for a graphics protocol only when it is likely to
/// answer; everything else gets halfblocks. Must run after raw mode is on.
pub(crate) fn pick_picker() -> Picker {
    let mut picker = if graphics_terminal_hint() {
        let mut options = QueryStdioOptions::default();
        options.timeout = Duration::from_millis(1000);
        options.text_sizing_protocol = false;
        Picker::from_query_stdio_with_options(options).unwrap_or_else(|_| Picker::halfblocks())
    } else {
        Picker::halfblocks()
    };
    picker.set_background_color(image::Rgba([0u8, 0u8, 0u8, 255u8]));
    picker
}

struct CachedCover {
    url: String,
    size: Rect,
    protocol: ImageProtocol,
}

/// Decoded cover for the most recently drawn url and area.
pub(crate) struct CoverCache {
    picker: Picker,
    current: Option<CachedCover>,
    undecodable: Option<String>,
}

impl CoverCache {
    pub(crate) fn new(picker: Picker) -> Self {
        Self {
            picker,
            current: None,
            undecodable: None,
        }
    }

    pub(crate) fn set_picker(&mut self, picker: Picker) {
        self.picker = picker;
        self.current = None;
    }

    /// Draws the cover centered in `area`. Returns `false` when the bytes are
    /// not an image this build can decode.
    pub(crate) fn render(
        &mut self,
        url: &str,
        bytes: &[u8],
        area: Rect,
        frame: &mut ratatui::Frame,
    ) -> bool {
        if self.undecodable.as_deref() == Some(url) {
            return false;
        }

        let size = Rect::new(0, 0, area.width, area.height);
        let fresh = self
            .current
            .as_ref()
            .is_some_and(|c| c.url == url && c.size == size);
        if !fresh {
            self.current = None;
            let decoded = match image::load_from_memory(bytes) {
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::debug!(url, error = %err, "cover decode failed");
                    self.undecodable = Some(url.to_string());
                    return false;
                }
            };
            match self.picker.new_protocol(decoded, size, Resize::Fit(None)) {
                Ok(protocol) => {
                    self.current = Some(CachedCover {
                        url: url.to_string(),
                        size,
                        protocol,
                    });
                }
                Err(err) => {
                    tracing::debug!(url, error = %err, "cover protocol failed");
                    self.undecodable = Some(url.to_string());
                    return false;
                }
            }
        }

        let Some(cached) = self.current.as_ref() else {
            return false;
        };
        let proto_area = cached.protocol.area();
        let width = proto_area.width.min(area.width);
        let height = proto_area.height.min(area.height);
        let draw_area = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );
        frame.render_widget(ImageWidget::new(&cached.protocol), draw_area);
        true
    }
}
