//! A line-oriented, indentation-driven template compiler.
//!
//! Templates are plain text where each line is either emitted literally,
//! or marked as code. Blocks are not terminated explicitly, instead the
//! indentation of the following lines decides where a block ends. The
//! indentation that a block body carries in the template is removed from the
//! output.
//!
//! # Syntax
//!
//! - Literal lines with interpolation: `Hello #{user.name}!`
//! - Output lines: `= user.name.upper()`
//! - Code lines: `- total = total + item.price`
//! - Conditionals: `- if user.admin`, `- elsif ...`, `- else`, `- unless ...`
//! - Loops: `- for item in items`, `- items.each_with_index do |item, i|`
//! - Nested templates: `= include 'header.txt'`
//! - Configurable markers: `% if user.admin`, `${user.name}`
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the syntax
//! config, the template loader and the functions available to templates.
//!
//! ```
//! let engine = nonhaml::Engine::new();
//! let template = engine.compile(
//!     "- if user.admin\n  Welcome back #{user.name}!\n- else\n  Hello #{user.name}.",
//! )?;
//! let result = template.render(nonhaml::value! { user: { name: "John Smith", admin: true } })?;
//! assert_eq!(result, "Welcome back John Smith!\n");
//! # Ok::<(), nonhaml::Error>(())
//! ```
//!
//! # Examples
//!
//! ### Render using structured data
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Context { items: Vec<Item> }
//!
//! #[derive(serde::Serialize)]
//! struct Item { name: String, price: i64 }
//!
//! let ctx = Context {
//!     items: vec![
//!         Item { name: "apple".into(), price: 3 },
//!         Item { name: "pear".into(), price: 4 },
//!     ],
//! };
//!
//! let result = nonhaml::Engine::new()
//!     .compile("- for item in items\n  #{item.name}: #{item.price}")?
//!     .render(&ctx)?;
//!
//! assert_eq!(result, "apple: 3\npear: 4\n");
//! # Ok::<(), nonhaml::Error>(())
//! ```
//!
//! ### Call custom functions
//!
//! ```
//! let mut engine = nonhaml::Engine::new();
//! engine.add_function("shout", |s: String| format!("{}!", s.to_uppercase()));
//!
//! let result = engine
//!     .compile("= name.shout()")?
//!     .render(nonhaml::value! { name: "hello" })?;
//!
//! assert_eq!(result, "HELLO!\n");
//! # Ok::<(), nonhaml::Error>(())
//! ```
//!
//! See the [`Function`] trait documentation for more information.
//!
//! ### Generate a file
//!
//! [`Engine::generate`] loads a template through the engine's loader,
//! renders it and writes the output file. On failure a diagnostic showing the
//! failing template line is printed to stderr and no file is written.
//!
//! ```no_run
//! let mut engine = nonhaml::Engine::new();
//! engine.set_base_dir("templates");
//! engine.generate("out/config.h", "config.h.nhaml", nonhaml::value! { debug: true })?;
//! # Ok::<(), nonhaml::Error>(())
//! ```

mod compile;
mod error;
mod format;
pub mod functions;
mod loader;
mod macros;
mod render;
mod types;
mod value;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::error;

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::functions::Function;
pub use crate::loader::{FileLoader, Loader, MemoryLoader};
pub use crate::types::program::Program;
pub use crate::types::syntax::{Syntax, SyntaxBuilder};
#[cfg(feature = "serde")]
pub use crate::value::to_value;
pub use crate::value::{List, Map, Value};

use crate::functions::{FunctionArgs, FunctionFn, FunctionReturn};
use crate::types::program;

/// The compilation and rendering engine.
pub struct Engine<'engine> {
    syntax: Syntax<'engine>,
    loader: Box<dyn Loader + Send + Sync + 'engine>,
    functions: BTreeMap<&'engine str, Box<FunctionFn>>,
    max_include_depth: usize,
    verbose: bool,
}

/// A compiled template.
pub struct Template<'engine> {
    engine: &'engine Engine<'engine>,
    template: program::Template,
}

impl<'engine> Default for Engine<'engine> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<'engine> Engine<'engine> {
    /// Construct a new engine.
    #[inline]
    pub fn new() -> Self {
        Self::with_syntax(Syntax::default())
    }

    /// Construct a new engine with custom syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use nonhaml::{Engine, Syntax};
    ///
    /// let syntax = Syntax::builder().statement("%").interpolation("${", "}").build();
    /// let engine = Engine::with_syntax(syntax);
    /// ```
    pub fn with_syntax(syntax: Syntax<'engine>) -> Self {
        #[allow(unused_mut)]
        let mut engine = Self {
            syntax,
            loader: Box::new(FileLoader::default()),
            functions: BTreeMap::new(),
            max_include_depth: 64,
            verbose: false,
        };
        #[cfg(feature = "builtins")]
        {
            use crate::functions::builtins;
            engine.add_function("lower", builtins::lower);
            engine.add_function("upper", builtins::upper);
            engine.add_function("trim", builtins::trim);
            engine.add_function("replace", builtins::replace);
            engine.add_function("len", builtins::len);
            engine.add_function("first", builtins::first);
            engine.add_function("last", builtins::last);
            engine.add_function("keys", builtins::keys);
            engine.add_function("values", builtins::values);
            engine.add_function("join", builtins::join);
            engine.add_function("reverse", builtins::reverse);
            engine.add_function("default", builtins::default);
            engine.add_function("to_s", builtins::to_s);
        }
        engine
    }

    /// Set the loader used to read templates and includes.
    #[inline]
    pub fn set_loader<L>(&mut self, loader: L)
    where
        L: Loader + Send + Sync + 'engine,
    {
        self.loader = Box::new(loader);
    }

    /// Read templates and includes from the given directory.
    ///
    /// This is a shorthand for setting a [`FileLoader`].
    #[inline]
    pub fn set_base_dir(&mut self, base_dir: impl Into<PathBuf>) {
        self.set_loader(FileLoader::new(base_dir));
    }

    /// Set the maximum number of nested includes.
    ///
    /// Defaults to 64. A template that includes itself fails to compile
    /// once this depth is reached.
    #[inline]
    pub fn set_max_include_depth(&mut self, depth: usize) {
        self.max_include_depth = depth;
    }

    /// Print the compiled program to stderr before rendering in
    /// [`.generate(..)`][Engine::generate].
    #[inline]
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Add a new function to the engine.
    ///
    /// Functions with the same name as a builtin replace it.
    #[inline]
    pub fn add_function<F, R, A>(&mut self, name: &'engine str, f: F)
    where
        F: Function<R, A> + Send + Sync + 'static,
        R: FunctionReturn,
        A: FunctionArgs,
    {
        self.functions.insert(name, functions::new(f));
    }

    /// Compile a template.
    ///
    /// Diagnostics refer to the template as `<anonymous>`.
    #[inline]
    pub fn compile(&self, source: &str) -> Result<Template<'_>> {
        self.compile_named("<anonymous>", source)
    }

    /// Compile a template, using the name in diagnostics.
    #[inline]
    pub fn compile_named(&self, name: &str, source: &str) -> Result<Template<'_>> {
        let template = compile::template(self, name, source)?;
        Ok(Template {
            engine: self,
            template,
        })
    }

    /// Read a template using the engine's loader and compile it.
    pub fn load(&self, name: &str) -> Result<Template<'_>> {
        let source = self.loader.load(name)?;
        self.compile_named(name, &source)
    }

    /// Load, compile and render a template, then write the output file.
    ///
    /// The output is written exactly once and ends with a newline. On
    /// failure the full diagnostic is printed to stderr and the error is
    /// returned, the output file is not created.
    #[cfg(feature = "serde")]
    pub fn generate<P, S>(&self, out_path: P, name: &str, ctx: S) -> Result<()>
    where
        P: AsRef<Path>,
        S: serde::Serialize,
    {
        let generate = || self.generate_inner(out_path.as_ref(), name, to_value(ctx)?);
        report(generate())
    }

    /// Like [`.generate(..)`][Engine::generate] but using the provided
    /// [`Value`].
    pub fn generate_from<P>(&self, out_path: P, name: &str, ctx: &Value) -> Result<()>
    where
        P: AsRef<Path>,
    {
        report(self.generate_inner(out_path.as_ref(), name, ctx.clone()))
    }

    fn generate_inner(&self, out_path: &Path, name: &str, ctx: Value) -> Result<()> {
        let template = self.load(name)?;
        if self.verbose {
            eprint!("{}", template.program());
        }
        let mut out = render::template(self, &template.template, ctx)?;
        if !out.ends_with('\n') {
            out.push('\n');
        }
        fs::write(out_path, out)?;
        Ok(())
    }
}

fn report(result: Result<()>) -> Result<()> {
    if let Err(err) = &result {
        error!(error = %err, "failed to generate template");
        eprintln!("{err:#}");
    }
    result
}

impl fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("syntax", &self.syntax)
            .field("functions", &self.functions.keys())
            .field("max_include_depth", &self.max_include_depth)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl<'engine> Template<'engine> {
    /// Render the template to a string using the provided value.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        render::template(self.engine, &self.template, to_value(ctx)?)
    }

    /// Render the template to a string using the provided value.
    #[inline]
    pub fn render_from(&self, ctx: &Value) -> Result<String> {
        render::template(self.engine, &self.template, ctx.clone())
    }

    /// Render the template to a writer using the provided value.
    ///
    /// Nothing is written to the writer if rendering fails.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render_to_writer<W, S>(&self, writer: W, ctx: S) -> Result<()>
    where
        W: io::Write,
        S: serde::Serialize,
    {
        render::template_to(self.engine, &self.template, writer, to_value(ctx)?)
    }

    /// Render the template to a writer using the provided value.
    #[inline]
    pub fn render_from_to_writer<W>(&self, writer: W, ctx: &Value) -> Result<()>
    where
        W: io::Write,
    {
        render::template_to(self.engine, &self.template, writer, ctx.clone())
    }

    /// Returns the emitted program.
    ///
    /// Its [`Display`][std::fmt::Display] implementation writes a line
    /// numbered listing.
    #[inline]
    pub fn program(&self) -> &Program {
        &self.template.program
    }

    /// Returns the name of the template.
    #[inline]
    pub fn name(&self) -> &str {
        &self.template.program.files[0].name
    }

    /// Returns the original template source.
    #[inline]
    pub fn source(&self) -> &str {
        &self.template.program.files[0].source
    }
}

impl fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
