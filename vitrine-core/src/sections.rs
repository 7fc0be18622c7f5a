//! One render function per page section.
//!
//! Every function is pure: it reads only the slice of the project it is
//! handed plus the [`RenderContext`], and returns a markup fragment. None of
//! them depend on a sibling section having been rendered.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as esc};

use crate::images::{ImageResolver, ImageSlot};
use crate::markdown::render_rich_text;
use crate::model::{Images, Product, Project, Sections};
use crate::theme::{ThemeTokens, Token};

/// Inputs shared by every section of one render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub theme: &'a ThemeTokens,
    pub images: &'a ImageResolver,
    pub currency_symbol: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Nav,
    Hero,
    Collection,
    Story,
    Craft,
    Lookbook,
    Testimonials,
    Faq,
    Footer,
}

impl Section {
    pub const PAGE_ORDER: [Section; 9] = [
        Section::Nav,
        Section::Hero,
        Section::Collection,
        Section::Story,
        Section::Craft,
        Section::Lookbook,
        Section::Testimonials,
        Section::Faq,
        Section::Footer,
    ];

    pub fn render(self, project: &Project, cx: &RenderContext) -> String {
        match self {
            Section::Nav => nav(&project.name),
            Section::Hero => hero(&project.sections, &project.images, cx),
            Section::Collection => collection(&project.products, cx),
            Section::Story => story(&project.sections, &project.images, cx),
            Section::Craft => craft(&project.sections, cx),
            Section::Lookbook => lookbook(&project.sections, &project.images, cx),
            Section::Testimonials => testimonials(&project.sections, cx),
            Section::Faq => faq(&project.sections),
            Section::Footer => footer(&project.name, &project.sections, cx),
        }
    }
}

const NAV_LINKS: [(&str, &str); 5] = [
    ("#collections", "Collections"),
    ("#story", "Story"),
    ("#craft", "Craft"),
    ("#lookbook", "Lookbook"),
    ("#faq", "FAQ"),
];

pub fn nav(brand: &str) -> String {
    let mut html = String::from("<nav class=\"vt-nav\">\n<div class=\"vt-container vt-nav-inner\">\n");
    html.push_str(&format!("<a class=\"vt-brand\" href=\"#top\">{}</a>\n", esc(brand)));
    html.push_str("<div class=\"vt-nav-links\">\n");
    for (href, text) in NAV_LINKS {
        html.push_str(&format!("<a href=\"{href}\">{text}</a>\n"));
    }
    html.push_str("</div>\n</div>\n</nav>\n");
    html
}

pub fn hero(sections: &Sections, images: &Images, cx: &RenderContext) -> String {
    let src = cx.images.resolve(ImageSlot::Hero, images.hero.as_deref());

    let mut html = String::from("<section class=\"vt-hero\" id=\"top\">\n<div class=\"vt-hero-copy\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", esc(&sections.hero_title)));
    html.push_str(&format!(
        "<p class=\"vt-hero-subtitle\">{}</p>\n",
        esc(&sections.hero_subtitle)
    ));
    html.push_str(&format!(
        "<a class=\"vt-button\" href=\"#collections\" style=\"background:{}\">{}</a>\n",
        cx.theme.var(Token::Text),
        esc(&sections.hero_cta)
    ));
    html.push_str("</div>\n");
    html.push_str(&format!(
        "<div class=\"vt-hero-media\"><img src=\"{}\" alt=\"{}\"></div>\n",
        attr(&src),
        attr(&sections.hero_title)
    ));
    html.push_str("</section>\n");
    html
}

pub fn collection(products: &[Product], cx: &RenderContext) -> String {
    let mut html = String::from(
        "<section class=\"vt-collection\" id=\"collections\">\n<div class=\"vt-container\">\n",
    );
    html.push_str("<h2>Signature Collection</h2>\n<div class=\"vt-grid\">\n");
    for product in products {
        html.push_str(&product_card(product, cx));
    }
    html.push_str("</div>\n</div>\n</section>\n");
    html
}

fn product_card(product: &Product, cx: &RenderContext) -> String {
    let src = cx.images.resolve(ImageSlot::ProductCard, product.image.as_deref());

    let mut html = String::from("<article class=\"vt-card\">\n");
    html.push_str(&format!(
        "<img class=\"vt-card-media\" src=\"{}\" alt=\"{}\">\n",
        attr(&src),
        attr(&product.name)
    ));
    html.push_str(&format!(
        "<div class=\"vt-card-body\"><span class=\"vt-card-name\">{}</span><span class=\"vt-card-price\">{}</span></div>\n",
        esc(&product.name),
        esc(&format_price(product.price, cx.currency_symbol))
    ));
    if let Some(description) = product.description.as_deref() {
        html.push_str(&format!(
            "<p class=\"vt-card-description\">{}</p>\n",
            esc(description)
        ));
    }
    html.push_str("</article>\n");
    html
}

pub fn story(sections: &Sections, images: &Images, cx: &RenderContext) -> String {
    let src = cx.images.resolve(ImageSlot::Story, images.lifestyle.as_deref());

    let mut html = String::from(
        "<section class=\"vt-story\" id=\"story\">\n<div class=\"vt-container vt-split\">\n",
    );
    html.push_str(&format!(
        "<img class=\"vt-story-media\" src=\"{}\" alt=\"{}\">\n",
        attr(&src),
        attr(&sections.story_title)
    ));
    html.push_str(&format!(
        "<div class=\"vt-story-copy\">\n<h3>{}</h3>\n<div class=\"vt-prose\">{}</div>\n</div>\n",
        esc(&sections.story_title),
        render_rich_text(&sections.story_body)
    ));
    html.push_str("</div>\n</section>\n");
    html
}

pub fn craft(sections: &Sections, cx: &RenderContext) -> String {
    let mut html = String::from("<section class=\"vt-craft\" id=\"craft\">\n<div class=\"vt-container\">\n");
    html.push_str(&format!("<h3>{}</h3>\n", esc(&sections.craft_title)));
    html.push_str("<ul class=\"vt-craft-list\">\n");
    for point in &sections.craft_points {
        html.push_str(&format!(
            "<li class=\"vt-craft-point\"><span class=\"vt-dot\" style=\"background:{}\"></span><p>{}</p></li>\n",
            cx.theme.var(Token::Accent),
            esc(point)
        ));
    }
    html.push_str("</ul>\n</div>\n</section>\n");
    html
}

const LOOKBOOK_SLOTS: [ImageSlot; 3] = [
    ImageSlot::LookbookLifestyle,
    ImageSlot::LookbookFlatlay,
    ImageSlot::LookbookCloseup,
];

pub fn lookbook(sections: &Sections, images: &Images, cx: &RenderContext) -> String {
    let mut html = String::from(
        "<section class=\"vt-lookbook\" id=\"lookbook\">\n<div class=\"vt-container\">\n",
    );
    html.push_str(&format!("<h3>{}</h3>\n", esc(&sections.lookbook_title)));
    html.push_str("<div class=\"vt-columns\">\n");
    for slot in LOOKBOOK_SLOTS {
        let explicit = slot.key().and_then(|key| images.get(key));
        let src = cx.images.resolve(slot, explicit);
        html.push_str(&format!(
            "<img class=\"vt-lookbook-image\" src=\"{}\" alt=\"{}\">\n",
            attr(&src),
            slot.label()
        ));
    }
    html.push_str("</div>\n</div>\n</section>\n");
    html
}

pub fn testimonials(sections: &Sections, cx: &RenderContext) -> String {
    let mut html = String::from(
        "<section class=\"vt-testimonials\" id=\"testimonials\">\n<div class=\"vt-container vt-narrow\">\n",
    );
    html.push_str("<h3>Testimonials</h3>\n");
    for quote in &sections.testimonials {
        html.push_str(&format!(
            "<blockquote class=\"vt-quote\" style=\"border-color:{}\">&ldquo;{}&rdquo;</blockquote>\n",
            cx.theme.var(Token::Accent),
            esc(quote)
        ));
    }
    html.push_str("</div>\n</section>\n");
    html
}

pub fn faq(sections: &Sections) -> String {
    let mut html = String::from(
        "<section class=\"vt-faq\" id=\"faq\">\n<div class=\"vt-container vt-narrow\">\n",
    );
    html.push_str("<h3>Frequently Asked Questions</h3>\n");
    for pair in &sections.faqs {
        html.push_str(&format!(
            "<details class=\"vt-faq-item\">\n<summary>{}</summary>\n<div class=\"vt-faq-answer\">{}</div>\n</details>\n",
            esc(&pair.question),
            render_rich_text(&pair.answer)
        ));
    }
    html.push_str("</div>\n</section>\n");
    html
}

pub fn footer(brand: &str, sections: &Sections, cx: &RenderContext) -> String {
    let mut html = String::from("<footer class=\"vt-footer\">\n<div class=\"vt-container vt-footer-inner\">\n");
    html.push_str(&format!(
        "<div class=\"vt-footer-brand\">{} &mdash; {}</div>\n",
        esc(brand),
        esc(&sections.hero_subtitle)
    ));
    html.push_str(&format!(
        "<form class=\"vt-signup\" onsubmit=\"return false\"><input type=\"email\" placeholder=\"Email\" aria-label=\"Email\"><button type=\"submit\" style=\"background:{}\">Join</button></form>\n",
        cx.theme.var(Token::Accent)
    ));
    html.push_str("</div>\n</footer>\n");
    html
}

/// `$420` for whole amounts, `$420.50` otherwise.
pub fn format_price(price: f64, symbol: &str) -> String {
    let price = if price.is_finite() && price > 0.0 { price } else { 0.0 };
    if price.fract() == 0.0 {
        format!("{symbol}{price:.0}")
    } else {
        format!("{symbol}{price:.2}")
    }
}
