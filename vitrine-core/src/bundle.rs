use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::composer::Document;
use crate::images::{ImageResolver, ImageSlot, ResolvedImage};
use crate::model::Project;

pub const ENTRY_FILE: &str = "index.html";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Generated placeholder; nothing to fetch ahead of time.
    Placeholder,
    /// Absolute URL on another host.
    Remote,
    /// Path relative to the project's asset directory, copied into the bundle.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub label: String,
    pub url: String,
    pub kind: AssetKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub entry: String,
    /// SHA-256 of the entry markup, hex encoded.
    pub content_hash: String,
    /// Every image the page references, in page order, without duplicates.
    pub assets: Vec<AssetRef>,
}

/// Exported site: the composed markup plus its asset manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    index_html: String,
    manifest: AssetManifest,
}

impl Bundle {
    pub fn index_html(&self) -> &str {
        &self.index_html
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn external_urls(&self) -> impl Iterator<Item = &str> {
        self.manifest
            .assets
            .iter()
            .filter(|asset| asset.kind != AssetKind::Local)
            .map(|asset| asset.url.as_str())
    }

    /// The generated files, as `(relative path, contents)`.
    pub fn files(&self) -> Result<Vec<(PathBuf, Vec<u8>)>, BundleError> {
        Ok(vec![
            (PathBuf::from(ENTRY_FILE), self.index_html.as_bytes().to_vec()),
            (
                PathBuf::from(MANIFEST_FILE),
                serde_json::to_vec_pretty(&self.manifest)?,
            ),
        ])
    }

    /// Write the bundle into `out_dir`. Local assets are copied from
    /// `asset_root` when given; ones that are missing or escape the root are
    /// skipped with a warning.
    pub fn write_to<P: AsRef<Path>>(
        &self,
        out_dir: P,
        asset_root: Option<&Path>,
    ) -> Result<(), BundleError> {
        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;

        for (path, contents) in self.files()? {
            std::fs::write(out_dir.join(path), contents)?;
        }

        let Some(root) = asset_root else {
            return Ok(());
        };

        for asset in &self.manifest.assets {
            if asset.kind != AssetKind::Local {
                continue;
            }
            let Some(relative) = safe_relative(&asset.url) else {
                warn!(url = %asset.url, "skipping asset outside the asset root");
                continue;
            };
            let source = root.join(&relative);
            if !source.is_file() {
                warn!(path = %source.display(), "referenced asset not found");
                continue;
            }
            let target = out_dir.join(&relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&source, &target)?;
            debug!(path = %relative.display(), "copied asset");
        }

        Ok(())
    }
}

/// Packages a composed document. Never touches the markup.
pub struct BundleAssembler<'a> {
    images: &'a ImageResolver,
}

impl<'a> BundleAssembler<'a> {
    pub fn new(images: &'a ImageResolver) -> Self {
        Self { images }
    }

    pub fn assemble(&self, project: &Project, document: Document) -> Bundle {
        let index_html = document.into_string();
        let content_hash = format!("{:x}", Sha256::digest(index_html.as_bytes()));

        Bundle {
            manifest: AssetManifest {
                entry: ENTRY_FILE.to_string(),
                content_hash,
                assets: self.collect_assets(project),
            },
            index_html,
        }
    }

    /// Resolve every image slot the page renders, in page order.
    pub fn collect_assets(&self, project: &Project) -> Vec<AssetRef> {
        let images = &project.images;
        let mut resolved: Vec<ResolvedImage> = Vec::new();

        resolved.push(self.images.resolve_image(ImageSlot::Hero, images.hero.as_deref()));
        for product in &project.products {
            resolved.push(
                self.images
                    .resolve_image(ImageSlot::ProductCard, product.image.as_deref()),
            );
        }
        for slot in [
            ImageSlot::Story,
            ImageSlot::LookbookLifestyle,
            ImageSlot::LookbookFlatlay,
            ImageSlot::LookbookCloseup,
        ] {
            let explicit = slot.key().and_then(|key| images.get(key));
            resolved.push(self.images.resolve_image(slot, explicit));
        }

        let mut seen = BTreeSet::new();
        resolved
            .into_iter()
            .filter(|image| seen.insert(image.url.clone()))
            .map(|image| AssetRef {
                kind: classify(&image),
                label: image.label,
                url: image.url,
            })
            .collect()
    }
}

fn classify(image: &ResolvedImage) -> AssetKind {
    if image.placeholder {
        return AssetKind::Placeholder;
    }
    let url = image.url.trim();
    let has_scheme = url.split_once(':').is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    });
    if has_scheme || url.starts_with("//") {
        AssetKind::Remote
    } else {
        AssetKind::Local
    }
}

fn safe_relative(url: &str) -> Option<PathBuf> {
    let path = Path::new(url.trim());
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if relative.as_os_str().is_empty() { None } else { Some(relative) }
}
