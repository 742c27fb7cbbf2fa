//! Inline text marks.
//!
//! A run carries a full set of boolean marks rather than a format bitmask;
//! toggling a mark produces the style the next keystroke inherits.

use serde::{Deserialize, Serialize};

/// One toggleable inline mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Subscript,
    Superscript,
    Code,
}

/// Marks active on a text run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineStyle {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub subscript: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub superscript: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl InlineStyle {
    pub fn has(&self, format: TextFormat) -> bool {
        match format {
            TextFormat::Bold => self.bold,
            TextFormat::Italic => self.italic,
            TextFormat::Underline => self.underline,
            TextFormat::Strikethrough => self.strikethrough,
            TextFormat::Subscript => self.subscript,
            TextFormat::Superscript => self.superscript,
            TextFormat::Code => self.code,
        }
    }

    pub fn toggle(&mut self, format: TextFormat) {
        let slot = match format {
            TextFormat::Bold => &mut self.bold,
            TextFormat::Italic => &mut self.italic,
            TextFormat::Underline => &mut self.underline,
            TextFormat::Strikethrough => &mut self.strikethrough,
            TextFormat::Subscript => &mut self.subscript,
            TextFormat::Superscript => &mut self.superscript,
            TextFormat::Code => &mut self.code,
        };
        *slot = !*slot;
    }

    pub fn with(mut self, format: TextFormat) -> Self {
        self.toggle(format);
        self
    }

    /// Marks present in both styles
    pub fn intersect(&self, other: &InlineStyle) -> InlineStyle {
        InlineStyle {
            bold: self.bold && other.bold,
            italic: self.italic && other.italic,
            underline: self.underline && other.underline,
            strikethrough: self.strikethrough && other.strikethrough,
            subscript: self.subscript && other.subscript,
            superscript: self.superscript && other.superscript,
            code: self.code && other.code,
        }
    }
}
