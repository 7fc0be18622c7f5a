use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

pub const PAGE_TEMPLATE: &str = "page.html";

const BUILTIN_PAGE: &str = include_str!("../templates/page.html");

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),
    #[error("Template directory not found: {}", .0.display())]
    MissingDir(PathBuf),
}

/// Values the page shell can reference.
#[derive(Debug, Serialize)]
pub struct ShellContext<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// The `:root` rule carrying the theme tokens.
    pub theme_css: &'a str,
    /// Concatenated section fragments.
    pub body: &'a str,
}

/// The outer HTML document every page is rendered into.
#[derive(Debug)]
pub struct PageShell {
    tera: Tera,
}

impl PageShell {
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE, BUILTIN_PAGE)?;
        Ok(Self { tera })
    }

    /// Load `*.html` templates from a directory. A directory without its own
    /// `page.html` falls back to the built-in one.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TemplateError::MissingDir(dir.to_path_buf()));
        }

        let glob = format!("{}/**/*.html", dir.display());
        let mut tera = Tera::new(&glob)?;
        if !tera.get_template_names().any(|name| name == PAGE_TEMPLATE) {
            tera.add_raw_template(PAGE_TEMPLATE, BUILTIN_PAGE)?;
        }
        Ok(Self { tera })
    }

    pub fn render(&self, shell: &ShellContext) -> Result<String, TemplateError> {
        let context = Context::from_serialize(shell)?;
        Ok(self.tera.render(PAGE_TEMPLATE, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_context<'a>(body: &'a str) -> ShellContext<'a> {
        ShellContext {
            title: "Shop <One>",
            description: "A \"quiet\" shop",
            theme_css: ":root{--vt-accent:#fff;}",
            body,
        }
    }

    #[test]
    fn builtin_shell_wraps_the_body() {
        let shell = PageShell::builtin().unwrap();
        let html = shell.render(&shell_context("<main>hello</main>")).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<main>hello</main>"));
        assert!(html.contains(":root{--vt-accent:#fff;}"));
        assert!(html.contains("<title>Shop &lt;One&gt;</title>"));
    }

    #[test]
    fn custom_directory_overrides_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("page.html"),
            "<html><style>{{ theme_css | safe }}</style>{{ body | safe }}</html>",
        )
        .unwrap();

        let shell = PageShell::from_dir(dir.path()).unwrap();
        let html = shell.render(&shell_context("<p>x</p>")).unwrap();
        assert_eq!(html, "<html><style>:root{--vt-accent:#fff;}</style><p>x</p></html>");
    }

    #[test]
    fn directory_without_page_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let shell = PageShell::from_dir(dir.path()).unwrap();
        let html = shell.render(&shell_context("<p>x</p>")).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = PageShell::from_dir("/definitely/not/here").err().unwrap();
        assert!(matches!(err, TemplateError::MissingDir(_)));
    }
}
