//! Semantic color tags for the status display.
//!
//! Lines carry a [`ColorTag`] rather than a concrete color so the diff
//! renderer can compare display state without caring how the terminal
//! realizes each tag.

use crossterm::style::Color;

/// Semantic color applied to a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorTag {
    /// Unstyled text (commit lines, padding)
    #[default]
    Plain,
    /// Header and entity name rows
    Header,
    /// Succeeded / completed
    Good,
    /// In progress
    Active,
    /// Failed executions and fetch errors
    Bad,
    /// Stopped executions
    Halted,
    /// Unknown provider status passthrough
    Other,
}

impl ColorTag {
    /// Concrete terminal color for this tag, or `None` for default text.
    pub fn color(self) -> Option<Color> {
        match self {
            Self::Plain => None,
            Self::Header => Some(Color::Cyan),
            Self::Good => Some(Color::Green),
            Self::Active => Some(Color::Yellow),
            Self::Bad => Some(Color::Red),
            // Orange is outside the 16-color palette
            Self::Halted => Some(Color::AnsiValue(208)),
            Self::Other => Some(Color::Cyan),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tag_colors() {
        assert_eq!(ColorTag::Good.color(), Some(Color::Green));
        assert_eq!(ColorTag::Active.color(), Some(Color::Yellow));
        assert_eq!(ColorTag::Bad.color(), Some(Color::Red));
        assert_eq!(ColorTag::Halted.color(), Some(Color::AnsiValue(208)));
        assert_eq!(ColorTag::Other.color(), Some(Color::Cyan));
        assert_eq!(ColorTag::Plain.color(), None);
    }
}
