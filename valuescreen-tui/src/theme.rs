//! Neon-on-charcoal palette for the chart browser.
//!
//! - **Accent**: electric cyan (focus, highlighted point)
//! - **Small / Medium / Large**: one colour per P/E tertile
//! - **Muted**: steel blue (axes, help text)

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    /// Lowest P/E tertile.
    pub small: Color,
    pub medium: Color,
    /// Highest P/E tertile.
    pub large: Color,
    /// Empty-chart notices.
    pub warning: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::parrot_neon()
    }
}

impl Theme {
    pub fn parrot_neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            small: Color::Rgb(0, 255, 128),
            medium: Color::Rgb(147, 112, 219),
            large: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            muted: Color::Rgb(100, 149, 237),
        }
    }

    /// Colour for a size bucket (0 = small, 1 = medium, 2 = large).
    pub fn bucket_color(&self, bucket: usize) -> Color {
        match bucket {
            0 => self.small,
            1 => self.medium,
            _ => self.large,
        }
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Chart canvas: background fill only.
    pub fn canvas(&self) -> Style {
        Style::default().bg(self.background)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_colors_are_distinct() {
        let theme = Theme::default();
        assert_ne!(theme.bucket_color(0), theme.bucket_color(1));
        assert_ne!(theme.bucket_color(1), theme.bucket_color(2));
        assert_eq!(theme.bucket_color(7), theme.large);
    }

    #[test]
    fn highlight_uses_accent() {
        let theme = Theme::default();
        assert_eq!(theme.highlight().fg, Some(theme.accent));
    }

    #[test]
    fn canvas_and_warning_styles() {
        let theme = Theme::default();
        assert_eq!(theme.canvas().bg, Some(theme.background));
        assert_eq!(theme.canvas().fg, None);
        assert_eq!(theme.warning().fg, Some(theme.warning));
    }
}
