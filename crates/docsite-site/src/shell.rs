//! Site shell: the HTML/CSS/JS scaffold copied into every build.
//!
//! The default shell is compiled into the binary via `rust-embed`. A shell
//! directory on disk can replace it (`docs.shell_dir`).

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rust_embed::RustEmbed;

use docsite_renderer::escape_html;

/// Landing page receiving the site title.
pub const LANDING_PAGE: &str = "index.html";

/// Placeholder replaced with the site title in the landing page.
pub const TITLE_PLACEHOLDER: &str = "{{title}}";

/// Icon copied into the output root.
pub const FAVICON: &str = "favicon.ico";

#[derive(RustEmbed)]
#[folder = "shell/"]
struct EmbeddedShell;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct FixedAssets;

/// One file of the shell, relative to the output root.
#[derive(Debug)]
pub struct ShellFile {
    pub path: PathBuf,
    pub data: Cow<'static, [u8]>,
}

/// Where the site shell comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SiteShell {
    /// Shell compiled into the binary.
    #[default]
    Embedded,
    /// Shell read from a directory.
    Directory(PathBuf),
}

impl SiteShell {
    /// Every file of the shell.
    pub fn files(&self) -> io::Result<Vec<ShellFile>> {
        match self {
            Self::Embedded => Ok(EmbeddedShell::iter()
                .filter_map(|name| {
                    let file = EmbeddedShell::get(&name)?;
                    Some(ShellFile {
                        path: PathBuf::from(name.as_ref()),
                        data: file.data,
                    })
                })
                .collect()),
            Self::Directory(dir) => {
                let mut files = Vec::new();
                collect_files(dir, dir, &mut files)?;
                Ok(files)
            }
        }
    }
}

fn collect_files(base: &Path, current: &Path, files: &mut Vec<ShellFile>) -> io::Result<()> {
    for entry in fs::read_dir(current)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(base, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            files.push(ShellFile {
                path: relative.to_path_buf(),
                data: Cow::Owned(fs::read(&path)?),
            });
        }
    }
    Ok(())
}

/// The fixed site icon.
pub(crate) fn favicon() -> Option<Cow<'static, [u8]>> {
    FixedAssets::get(FAVICON).map(|file| file.data)
}

/// Replace the first title placeholder with the HTML-escaped title.
pub(crate) fn substitute_title(page: &str, title: &str) -> String {
    page.replacen(TITLE_PLACEHOLDER, &escape_html(title), 1)
}
