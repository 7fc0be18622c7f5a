use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::model::ImageKey;

pub const DEFAULT_PLACEHOLDER_BASE: &str = "https://placehold.co";

/// Every place on the page that shows an image, with its designed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Hero,
    Story,
    ProductCard,
    LookbookLifestyle,
    LookbookFlatlay,
    LookbookCloseup,
}

impl ImageSlot {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            ImageSlot::Hero => (1600, 900),
            ImageSlot::Story => (1200, 1400),
            ImageSlot::ProductCard => (800, 600),
            ImageSlot::LookbookLifestyle => (800, 1000),
            ImageSlot::LookbookFlatlay => (1000, 800),
            ImageSlot::LookbookCloseup => (900, 900),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImageSlot::Hero => "Hero",
            ImageSlot::Story | ImageSlot::LookbookLifestyle => "Lifestyle",
            ImageSlot::ProductCard => "Frame",
            ImageSlot::LookbookFlatlay => "Flatlay",
            ImageSlot::LookbookCloseup => "Closeup",
        }
    }

    /// The `images` map entry feeding this slot. Product cards read the
    /// product's own `image` field instead.
    pub fn key(self) -> Option<ImageKey> {
        match self {
            ImageSlot::Hero => Some(ImageKey::Hero),
            ImageSlot::Story | ImageSlot::LookbookLifestyle => Some(ImageKey::Lifestyle),
            ImageSlot::LookbookFlatlay => Some(ImageKey::Flatlay),
            ImageSlot::LookbookCloseup => Some(ImageKey::Closeup),
            ImageSlot::ProductCard => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub url: String,
    pub label: String,
    pub placeholder: bool,
}

/// Picks the URL to render for a slot. Pure URL construction, no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolver {
    placeholder_base: String,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_BASE)
    }
}

impl ImageResolver {
    pub fn new(placeholder_base: impl Into<String>) -> Self {
        let base: String = placeholder_base.into();
        Self {
            placeholder_base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve(&self, slot: ImageSlot, explicit: Option<&str>) -> String {
        self.resolve_image(slot, explicit).url
    }

    pub fn resolve_image(&self, slot: ImageSlot, explicit: Option<&str>) -> ResolvedImage {
        match explicit {
            Some(url) if !url.is_empty() => ResolvedImage {
                url: url.to_string(),
                label: slot.label().to_string(),
                placeholder: false,
            },
            _ => ResolvedImage {
                url: self.placeholder(slot),
                label: slot.label().to_string(),
                placeholder: true,
            },
        }
    }

    pub fn placeholder(&self, slot: ImageSlot) -> String {
        let (width, height) = slot.dimensions();
        format!(
            "{}/{}x{}?text={}",
            self.placeholder_base,
            width,
            height,
            encode_label(slot.label())
        )
    }
}

/// Unreserved URL characters stay literal, everything else is escaped.
const LABEL: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

fn encode_label(label: &str) -> String {
    utf8_percent_encode(label, LABEL).to_string()
}
