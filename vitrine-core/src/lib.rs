pub mod bundle;
pub mod composer;
pub mod config;
pub mod images;
pub mod markdown;
pub mod model;
pub mod preview;
pub mod sections;
pub mod template;
pub mod theme;

// Re-export main types
pub use bundle::{AssetKind, AssetManifest, AssetRef, Bundle, BundleAssembler, BundleError};
pub use composer::{ComposeError, Document, PageComposer, compose};
pub use config::{ConfigError, RenderOptions};
pub use images::{ImageResolver, ImageSlot};
pub use model::{FieldPath, ParseError, Product, Project, UpdateError, normalize};
pub use preview::{Commit, Preview, PreviewSession, RenderTicket};
pub use theme::ThemeTokens;
