//! Defines how template sources are read by name.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads template sources by name.
///
/// The loader is used both for the root template passed to
/// [`Engine::load`][crate::Engine::load] and for every include directive.
pub trait Loader {
    /// Returns the source of the template with the given name.
    fn load(&self, name: &str) -> io::Result<String>;
}

impl<F> Loader for F
where
    F: Fn(&str) -> io::Result<String>,
{
    fn load(&self, name: &str) -> io::Result<String> {
        self(name)
    }
}

/// Loads templates from a directory on disk.
///
/// Names are resolved relative to the base directory, absolute names are
/// used as is.
#[derive(Debug, Clone)]
pub struct FileLoader {
    base_dir: PathBuf,
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the directory that names are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Loader for FileLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.base_dir.join(name))
    }
}

/// Loads templates from memory.
///
/// # Examples
///
/// ```
/// let mut loader = nonhaml::MemoryLoader::new();
/// loader.insert("header", "<h1>#{title}</h1>");
///
/// let mut engine = nonhaml::Engine::new();
/// engine.set_loader(loader);
///
/// let result = engine
///     .compile("= include 'header'")?
///     .render_from(&nonhaml::value! { title: "Hello" })?;
/// assert_eq!(result, "<h1>Hello</h1>\n");
/// # Ok::<(), nonhaml::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing any template with the same name.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }
}

impl Loader for MemoryLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        self.templates.get(name).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("template `{name}` not found"),
            )
        })
    }
}
