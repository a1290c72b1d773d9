//! Text item: a string rendered with a font in the node box.

use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strata_core::Color4f;
use strata_core::hash::hash_combine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HorizontalTextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VerticalTextAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextFlags: u32 {
        const VISIBLE_IN_GAME = 1 << 0;
        const BLINK_TEXT      = 1 << 1;
        const UNDERLINE_TEXT  = 1 << 2;
        const PP_ENABLE_BLOOM = 1 << 3;
    }
}

impl Default for TextFlags {
    fn default() -> Self {
        Self::VISIBLE_IN_GAME | Self::PP_ENABLE_BLOOM
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextItemClass {
    pub text: String,
    #[serde(rename = "font_name")]
    pub font: String,
    pub font_size: u32,
    pub line_height: f32,
    #[serde(rename = "color")]
    pub text_color: Color4f,
    pub horizontal_align: HorizontalTextAlign,
    pub vertical_align: VerticalTextAlign,
    pub layer: i32,
    #[serde(with = "strata_core::flags::bits")]
    pub flags: TextFlags,
}

impl Default for TextItemClass {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: String::new(),
            font_size: 0,
            line_height: 1.0,
            text_color: Color4f::WHITE,
            horizontal_align: HorizontalTextAlign::Center,
            vertical_align: VerticalTextAlign::Center,
            layer: 0,
            flags: TextFlags::default(),
        }
    }
}

impl TextItemClass {
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = 0;
        hash = hash_combine(hash, &self.text);
        hash = hash_combine(hash, &self.font);
        hash = hash_combine(hash, &self.font_size);
        hash = hash_combine(hash, &self.line_height);
        hash = hash_combine(hash, &self.text_color);
        hash = hash_combine(hash, &(self.horizontal_align as u32));
        hash = hash_combine(hash, &(self.vertical_align as u32));
        hash = hash_combine(hash, &self.layer);
        hash_combine(hash, &self.flags.bits())
    }

    pub fn set_flag(&mut self, flag: TextFlags, on: bool) {
        self.flags.set(flag, on);
    }
}

#[derive(Debug, Clone)]
pub struct TextItem {
    class: Arc<TextItemClass>,
    text: String,
    text_color: Color4f,
    flags: TextFlags,
}

impl TextItem {
    #[must_use]
    pub fn new(class: Arc<TextItemClass>) -> Self {
        Self {
            text: class.text.clone(),
            text_color: class.text_color,
            flags: class.flags,
            class,
        }
    }

    #[must_use]
    pub fn class(&self) -> &TextItemClass {
        &self.class
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    #[must_use]
    pub fn text_color(&self) -> Color4f {
        self.text_color
    }

    pub fn set_text_color(&mut self, color: Color4f) {
        self.text_color = color;
    }

    #[must_use]
    pub fn flags(&self) -> TextFlags {
        self.flags
    }

    #[must_use]
    pub fn test_flag(&self, flag: TextFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: TextFlags, on: bool) {
        self.flags.set(flag, on);
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.test_flag(TextFlags::VISIBLE_IN_GAME)
    }

    #[must_use]
    pub fn font(&self) -> &str {
        &self.class.font
    }

    #[must_use]
    pub fn font_size(&self) -> u32 {
        self.class.font_size
    }

    #[must_use]
    pub fn layer(&self) -> i32 {
        self.class.layer
    }

    /// Hash of the instance state that affects rasterization.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hash = 0;
        hash = hash_combine(hash, &self.text);
        hash = hash_combine(hash, &self.text_color);
        hash_combine(hash, &self.flags.bits())
    }
}
