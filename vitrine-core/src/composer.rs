use std::fmt;

use crate::bundle::{Bundle, BundleAssembler};
use crate::config::RenderOptions;
use crate::images::ImageResolver;
use crate::model::Project;
use crate::preview::Preview;
use crate::sections::{RenderContext, Section};
use crate::template::{PageShell, ShellContext, TemplateError};
use crate::theme::ThemeTokens;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("composition failed: {0}")]
    Template(#[from] TemplateError),
}

/// A fully rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document {
    html: String,
}

impl Document {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

/// Renders a [`Project`] into a [`Document`]. Holds no per-project state, so
/// one composer can be shared across every render of a session.
#[derive(Debug)]
pub struct PageComposer {
    shell: PageShell,
    images: ImageResolver,
    options: RenderOptions,
}

impl PageComposer {
    pub fn new(options: RenderOptions) -> Result<Self, ComposeError> {
        let shell = match &options.template_dir {
            Some(dir) => PageShell::from_dir(dir)?,
            None => PageShell::builtin()?,
        };

        Ok(Self {
            shell,
            images: ImageResolver::new(options.placeholder_base.clone()),
            options,
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn image_resolver(&self) -> &ImageResolver {
        &self.images
    }

    #[tracing::instrument(skip_all, fields(project = %project.name))]
    pub fn compose(&self, project: &Project) -> Result<Document, ComposeError> {
        let theme = ThemeTokens::resolve(&project.theme);
        let cx = RenderContext {
            theme: &theme,
            images: &self.images,
            currency_symbol: &self.options.currency_symbol,
        };

        let body: String = Section::PAGE_ORDER
            .iter()
            .map(|section| section.render(project, &cx))
            .collect();

        let theme_css = theme.root_rule();
        let html = self.shell.render(&ShellContext {
            title: &project.name,
            description: &project.description,
            theme_css: &theme_css,
            body: &body,
        })?;

        tracing::debug!(bytes = html.len(), "composed document");
        Ok(Document { html })
    }

    pub fn preview(&self, project: &Project) -> Result<Preview, ComposeError> {
        Ok(Preview::new(self.compose(project)?))
    }

    pub fn bundle(&self, project: &Project) -> Result<Bundle, ComposeError> {
        let document = self.compose(project)?;
        Ok(BundleAssembler::new(&self.images).assemble(project, document))
    }
}

/// Compose with default options.
pub fn compose(project: &Project) -> Result<Document, ComposeError> {
    PageComposer::new(RenderOptions::default())?.compose(project)
}
