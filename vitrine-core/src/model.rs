//! The Project document.
//!
//! Everything the editor produces ends up here. [`normalize`] turns any JSON
//! value into a [`Project`] without ever failing: fields that are missing or
//! have the wrong shape degrade to their defaults one at a time, so a half
//! typed document still renders. Older documents using the flat
//! `headline`/`collections`/`styles` shape are migrated on the way in.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::theme::{DEFAULT_ACCENT, DEFAULT_BACKGROUND, DEFAULT_TEXT};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("unknown field path: {0}")]
    UnknownPath(String),
    #[error("product index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub products: Vec<Product>,
    pub theme: Theme,
    pub sections: Sections,
    pub images: Images,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price: clamp_price(price),
            description: None,
            image: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Raw theme colors as the user typed them. Validation happens in
/// [`crate::theme::ThemeTokens::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub accent: String,
    pub background: String,
    pub text: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: DEFAULT_ACCENT.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            text: DEFAULT_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub hero_cta: String,
    pub story_title: String,
    pub story_body: String,
    pub craft_title: String,
    pub craft_points: Vec<String>,
    pub lookbook_title: String,
    pub testimonials: Vec<String>,
    pub faqs: Vec<Faq>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Faq {
    #[serde(alias = "q")]
    pub question: String,
    #[serde(alias = "a")]
    pub answer: String,
}

impl Faq {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Named image slots. The set is closed; anything else in the `images` map is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageKey {
    Hero,
    Lifestyle,
    Closeup,
    Flatlay,
}

impl ImageKey {
    pub const ALL: [ImageKey; 4] = [
        ImageKey::Hero,
        ImageKey::Lifestyle,
        ImageKey::Closeup,
        ImageKey::Flatlay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageKey::Hero => "hero",
            ImageKey::Lifestyle => "lifestyle",
            ImageKey::Closeup => "closeup",
            ImageKey::Flatlay => "flatlay",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifestyle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closeup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flatlay: Option<String>,
}

impl Images {
    pub fn get(&self, key: ImageKey) -> Option<&str> {
        match key {
            ImageKey::Hero => self.hero.as_deref(),
            ImageKey::Lifestyle => self.lifestyle.as_deref(),
            ImageKey::Closeup => self.closeup.as_deref(),
            ImageKey::Flatlay => self.flatlay.as_deref(),
        }
    }

    pub fn set(&mut self, key: ImageKey, url: Option<String>) {
        let slot = match key {
            ImageKey::Hero => &mut self.hero,
            ImageKey::Lifestyle => &mut self.lifestyle,
            ImageKey::Closeup => &mut self.closeup,
            ImageKey::Flatlay => &mut self.flatlay,
        };
        *slot = url;
    }
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            products: Vec::new(),
            theme: Theme::default(),
            sections: Sections::default(),
            images: Images::default(),
        }
    }
}

impl Project {
    /// The sample storefront a new editing session starts from.
    pub fn starter() -> Self {
        Self {
            name: "Zenview Eyewear".into(),
            description: "Quiet luxury eyewear storefront".into(),
            products: vec![
                Product::new("Aero 01", 420.0)
                    .with_description("Sculptural acetate, balanced silhouette"),
                Product::new("Linea 02", 460.0)
                    .with_description("Slim titanium, architectural lines"),
                Product::new("Shade 03", 480.0).with_description("Deep lens profile, cinematic"),
            ],
            theme: Theme::default(),
            sections: Sections {
                hero_title: "Zenview Eyewear".into(),
                hero_subtitle: "See Without Noise".into(),
                hero_cta: "Shop the Collection".into(),
                story_title: "Quiet Luxury, Considered Design".into(),
                story_body: "Handcrafted eyewear balancing proportion, material and restraint."
                    .into(),
                craft_title: "Craftsmanship & Materials".into(),
                craft_points: vec![
                    "Premium Italian acetate, hand-polished".into(),
                    "Anti-reflective Zeiss lenses".into(),
                    "Featherlight titanium hardware".into(),
                    "Precision-balanced comfort fit".into(),
                ],
                lookbook_title: "Lookbook".into(),
                testimonials: vec![
                    "Understated and impeccably made.".into(),
                    "The only frames I wear now.".into(),
                    "Pure, quiet confidence.".into(),
                ],
                faqs: vec![
                    Faq::new(
                        "What makes Zenview different?",
                        "A focus on restraint, proportion and material honesty.",
                    ),
                    Faq::new(
                        "Do you ship internationally?",
                        "Yes, we ship worldwide with premium tracked service.",
                    ),
                    Faq::new(
                        "What is your return policy?",
                        "30-day returns in original condition for a full refund.",
                    ),
                ],
            },
            images: Images::default(),
        }
    }

    pub fn from_json_str(data: &str) -> Result<Self, ParseError> {
        let raw: Value = serde_json::from_str(data)?;
        Ok(normalize(&raw))
    }

    pub fn from_toml_str(data: &str) -> Result<Self, ParseError> {
        let raw: Value = toml::from_str(data)?;
        Ok(normalize(&raw))
    }

    /// Read a project file. `.toml` files are parsed as TOML, everything else as JSON.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&data),
            _ => Self::from_json_str(&data),
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply a single edit. The value is coerced with the same rules as [`normalize`].
    pub fn update(&mut self, path: FieldPath, value: &Value) -> Result<(), UpdateError> {
        match path {
            FieldPath::Name => self.name = text(Some(value)),
            FieldPath::Description => self.description = text(Some(value)),
            FieldPath::Section(field) => self.sections.set(field, value),
            FieldPath::Theme(field) => {
                let (slot, fallback) = match field {
                    ThemeField::Accent => (&mut self.theme.accent, DEFAULT_ACCENT),
                    ThemeField::Background => (&mut self.theme.background, DEFAULT_BACKGROUND),
                    ThemeField::Text => (&mut self.theme.text, DEFAULT_TEXT),
                };
                *slot = color(Some(value), fallback);
            }
            FieldPath::Image(key) => self.images.set(key, optional_text(Some(value))),
            FieldPath::Products => self.products = products(Some(value)),
            FieldPath::Product(index, field) => {
                let len = self.products.len();
                let product = self
                    .products
                    .get_mut(index)
                    .ok_or(UpdateError::IndexOutOfRange { index, len })?;
                match field {
                    ProductField::Name => product.name = text(Some(value)),
                    ProductField::Price => product.price = coerce_price(Some(value)),
                    ProductField::Description => product.description = optional_text(Some(value)),
                    ProductField::Image => product.image = optional_text(Some(value)),
                }
            }
        }

        Ok(())
    }

    pub fn push_product(&mut self, product: Product) {
        self.products.push(Product {
            price: clamp_price(product.price),
            ..product
        });
    }

    pub fn remove_product(&mut self, index: usize) -> Result<Product, UpdateError> {
        if index >= self.products.len() {
            return Err(UpdateError::IndexOutOfRange {
                index,
                len: self.products.len(),
            });
        }
        Ok(self.products.remove(index))
    }

    /// Move a product to a new position, shifting the ones in between.
    pub fn move_product(&mut self, from: usize, to: usize) -> Result<(), UpdateError> {
        let len = self.products.len();
        for index in [from, to] {
            if index >= len {
                return Err(UpdateError::IndexOutOfRange { index, len });
            }
        }
        let product = self.products.remove(from);
        self.products.insert(to, product);
        Ok(())
    }
}

impl Sections {
    fn set(&mut self, field: SectionField, value: &Value) {
        match field {
            SectionField::HeroTitle => self.hero_title = text(Some(value)),
            SectionField::HeroSubtitle => self.hero_subtitle = text(Some(value)),
            SectionField::HeroCta => self.hero_cta = text(Some(value)),
            SectionField::StoryTitle => self.story_title = text(Some(value)),
            SectionField::StoryBody => self.story_body = text(Some(value)),
            SectionField::CraftTitle => self.craft_title = text(Some(value)),
            SectionField::CraftPoints => self.craft_points = text_list(Some(value)),
            SectionField::LookbookTitle => self.lookbook_title = text(Some(value)),
            SectionField::Testimonials => self.testimonials = text_list(Some(value)),
            SectionField::Faqs => self.faqs = faqs(Some(value)),
        }
    }
}

/// A validated location inside a [`Project`], e.g. `sections.hero_title` or
/// `products.2.price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    Name,
    Description,
    Section(SectionField),
    Theme(ThemeField),
    Image(ImageKey),
    Products,
    Product(usize, ProductField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionField {
    HeroTitle,
    HeroSubtitle,
    HeroCta,
    StoryTitle,
    StoryBody,
    CraftTitle,
    CraftPoints,
    LookbookTitle,
    Testimonials,
    Faqs,
}

impl SectionField {
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "hero_title" => SectionField::HeroTitle,
            "hero_subtitle" => SectionField::HeroSubtitle,
            "hero_cta" => SectionField::HeroCta,
            "story_title" => SectionField::StoryTitle,
            "story_body" => SectionField::StoryBody,
            "craft_title" => SectionField::CraftTitle,
            "craft_points" => SectionField::CraftPoints,
            "lookbook_title" => SectionField::LookbookTitle,
            "testimonials" => SectionField::Testimonials,
            "faqs" => SectionField::Faqs,
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeField {
    Accent,
    Background,
    Text,
}

impl ThemeField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "accent" => Some(ThemeField::Accent),
            "background" => Some(ThemeField::Background),
            "text" => Some(ThemeField::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Name,
    Price,
    Description,
    Image,
}

impl ProductField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(ProductField::Name),
            "price" => Some(ProductField::Price),
            "description" => Some(ProductField::Description),
            "image" => Some(ProductField::Image),
            _ => None,
        }
    }
}

impl FromStr for FieldPath {
    type Err = UpdateError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path.split('.').collect();
        let parsed = match segments.as_slice() {
            ["name"] => Some(FieldPath::Name),
            ["description"] => Some(FieldPath::Description),
            ["sections", field] => SectionField::from_name(field).map(FieldPath::Section),
            ["theme", field] => ThemeField::from_name(field).map(FieldPath::Theme),
            ["images", key] => ImageKey::from_name(key).map(FieldPath::Image),
            ["products"] => Some(FieldPath::Products),
            ["products", index, field] => index
                .parse::<usize>()
                .ok()
                .zip(ProductField::from_name(field))
                .map(|(index, field)| FieldPath::Product(index, field)),
            _ => None,
        };

        parsed.ok_or_else(|| UpdateError::UnknownPath(path.to_string()))
    }
}

const LEGACY_KEYS: [&str; 10] = [
    "headline",
    "subheading",
    "cta",
    "collections",
    "story",
    "craftsmanship",
    "lookbook",
    "testimonials",
    "faq",
    "styles",
];

/// Build a [`Project`] from whatever the editor sent. Never fails.
pub fn normalize(raw: &Value) -> Project {
    let Some(mut obj) = raw.as_object() else {
        debug!("project document is not an object, using defaults");
        return Project::default();
    };

    // Request bodies wrap the document as `{ "project": {...} }`.
    if let Some(Value::Object(inner)) = obj.get("project") {
        if !obj.contains_key("sections") && !obj.contains_key("name") {
            obj = inner;
        }
    }

    if is_legacy(obj) {
        return migrate_legacy(obj);
    }

    let sections = match obj.get("sections") {
        Some(Value::Object(sections)) => Sections {
            hero_title: text(sections.get("hero_title")),
            hero_subtitle: text(sections.get("hero_subtitle")),
            hero_cta: text(sections.get("hero_cta")),
            story_title: text(sections.get("story_title")),
            story_body: text(sections.get("story_body")),
            craft_title: text(sections.get("craft_title")),
            craft_points: text_list(sections.get("craft_points")),
            lookbook_title: text(sections.get("lookbook_title")),
            testimonials: text_list(sections.get("testimonials")),
            faqs: faqs(sections.get("faqs")),
        },
        _ => Sections::default(),
    };

    Project {
        name: text(obj.get("name")),
        description: text(obj.get("description")),
        products: products(obj.get("products")),
        theme: theme(obj.get("theme")),
        sections,
        images: images(obj.get("images")),
    }
}

fn is_legacy(obj: &Map<String, Value>) -> bool {
    !obj.contains_key("sections") && LEGACY_KEYS.iter().any(|key| obj.contains_key(*key))
}

fn migrate_legacy(obj: &Map<String, Value>) -> Project {
    debug!("migrating legacy project document");
    let styles = obj.get("styles").and_then(Value::as_object);
    let style = |key: &str| styles.and_then(|s| s.get(key));

    let mut name = text(obj.get("name"));
    if name.is_empty() {
        name = text(style("brand"));
    }
    let mut description = text(obj.get("description"));
    if description.is_empty() {
        description = text(style("tagline"));
    }

    // Loose lookbook URLs fill whichever photo slots are still empty.
    let mut images = images(obj.get("images"));
    if let Some(Value::Array(urls)) = obj.get("lookbook") {
        let mut urls = urls.iter().filter_map(|url| optional_text(Some(url)));
        for key in [ImageKey::Lifestyle, ImageKey::Flatlay, ImageKey::Closeup] {
            let Some(url) = urls.next() else { break };
            if images.get(key).is_none() {
                images.set(key, Some(url));
            }
        }
    }

    Project {
        name,
        description,
        products: products(obj.get("collections")),
        theme: theme(obj.get("styles")),
        sections: Sections {
            hero_title: text(obj.get("headline")),
            hero_subtitle: text(obj.get("subheading")),
            hero_cta: text(obj.get("cta")),
            story_body: text(obj.get("story")),
            craft_points: text_list(obj.get("craftsmanship")),
            testimonials: text_list(obj.get("testimonials")),
            faqs: faqs(obj.get("faq")),
            ..Sections::default()
        },
        images,
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    let text = text(value);
    if text.is_empty() { None } else { Some(text) }
}

fn color(value: Option<&Value>, fallback: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => fallback.to_string(),
    }
}

/// Coerce a price to a non-negative number. Anything unparseable becomes `0`.
pub fn coerce_price(value: Option<&Value>) -> f64 {
    let price = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').parse().unwrap_or(0.0),
        _ => 0.0,
    };
    clamp_price(price)
}

fn clamp_price(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 { price } else { 0.0 }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items.iter().filter_map(list_entry).collect()
}

fn list_entry(item: &Value) -> Option<String> {
    match item {
        Value::String(_) | Value::Number(_) => Some(text(Some(item))),
        Value::Object(obj) if obj.contains_key("quote") => Some(testimonial(obj)),
        Value::Object(obj) => {
            let title = text(obj.get("title"));
            let description = text(obj.get("description"));
            match (title.is_empty(), description.is_empty()) {
                (true, true) => None,
                (false, true) => Some(title),
                (true, false) => Some(description),
                (false, false) => Some(format!("{title}: {description}")),
            }
        }
        _ => None,
    }
}

fn testimonial(obj: &Map<String, Value>) -> String {
    let quote = text(obj.get("quote"));
    let attribution: Vec<String> = ["author", "role"]
        .iter()
        .map(|key| text(obj.get(*key)))
        .filter(|part| !part.is_empty())
        .collect();

    if attribution.is_empty() {
        quote
    } else {
        format!("{quote} \u{2014} {}", attribution.join(", "))
    }
}

fn faqs(value: Option<&Value>) -> Vec<Faq> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|pair| Faq {
            question: text(pair.get("question").or_else(|| pair.get("q"))),
            answer: text(pair.get("answer").or_else(|| pair.get("a"))),
        })
        .collect()
}

fn products(value: Option<&Value>) -> Vec<Product> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items.iter().map(product).collect()
}

fn product(item: &Value) -> Product {
    match item {
        Value::Object(obj) => Product {
            name: text(obj.get("name")),
            price: coerce_price(obj.get("price")),
            description: optional_text(obj.get("description")),
            image: optional_text(obj.get("image")),
        },
        Value::String(name) => Product {
            name: name.clone(),
            ..Product::default()
        },
        _ => Product::default(),
    }
}

fn theme(value: Option<&Value>) -> Theme {
    let Some(Value::Object(obj)) = value else {
        return Theme::default();
    };
    Theme {
        accent: color(obj.get("accent"), DEFAULT_ACCENT),
        background: color(obj.get("background"), DEFAULT_BACKGROUND),
        text: color(obj.get("text"), DEFAULT_TEXT),
    }
}

fn images(value: Option<&Value>) -> Images {
    let Some(Value::Object(obj)) = value else {
        return Images::default();
    };
    let mut images = Images::default();
    for key in ImageKey::ALL {
        images.set(key, optional_text(obj.get(key.as_str())));
    }
    images
}
