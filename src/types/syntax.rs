use std::marker::PhantomData;

/// The template syntax configuration.
///
/// Use [`Syntax::default()`] to get the default syntax configuration and
/// [`Syntax::builder()`] to create a custom syntax configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax<'a> {
    /// Marks a line of code, e.g. `- if cond`.
    pub(crate) statement: String,
    /// Marks an expression whose value is emitted, e.g. `= user.name`.
    pub(crate) output: String,
    /// Delimits an interpolation inside a literal line, e.g. `#{name}`.
    pub(crate) interp: (String, String),
    /// The name of the include operation, e.g. `= include 'header.txt'`.
    pub(crate) include: String,
    _marker: PhantomData<&'a ()>,
}

/// A builder for the syntax configuration.
///
/// This struct is typically created using [`Syntax::builder()`].
#[derive(Debug, Clone)]
pub struct SyntaxBuilder<'a> {
    statement: &'a str,
    output: &'a str,
    interp: (&'a str, &'a str),
    include: &'a str,
}

impl Default for Syntax<'_> {
    /// Returns the default syntax configuration.
    ///
    /// This is equivalent to the following.
    /// ```
    /// use nonhaml::Syntax;
    ///
    /// let syntax = Syntax::builder()
    ///     .statement("-")
    ///     .output("=")
    ///     .interpolation("#{", "}")
    ///     .include("include")
    ///     .build();
    /// assert_eq!(syntax, Syntax::default());
    /// ```
    #[inline]
    fn default() -> Self {
        Syntax::builder().build()
    }
}

impl<'a> Syntax<'a> {
    /// Create a new syntax builder.
    ///
    /// # Examples
    ///
    /// ```
    /// let syntax = nonhaml::Syntax::builder()
    ///     .statement("%")
    ///     .interpolation("${", "}")
    ///     .build();
    /// ```
    #[inline]
    pub fn builder() -> SyntaxBuilder<'a> {
        SyntaxBuilder::new()
    }
}

impl<'a> SyntaxBuilder<'a> {
    /// Creates a new syntax builder populated with the default markers.
    #[inline]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            statement: "-",
            output: "=",
            interp: ("#{", "}"),
            include: "include",
        }
    }

    /// Set the marker that starts a line of code.
    ///
    /// # Panics
    ///
    /// If the marker is empty.
    #[inline]
    pub fn statement(&mut self, marker: &'a str) -> &mut Self {
        assert!(!marker.is_empty());
        self.statement = marker;
        self
    }

    /// Set the marker that starts an output expression line.
    ///
    /// # Panics
    ///
    /// If the marker is empty.
    #[inline]
    pub fn output(&mut self, marker: &'a str) -> &mut Self {
        assert!(!marker.is_empty());
        self.output = marker;
        self
    }

    /// Set the interpolation delimiters used in literal lines.
    ///
    /// # Panics
    ///
    /// If either of the strings are empty.
    #[inline]
    pub fn interpolation(&mut self, begin: &'a str, end: &'a str) -> &mut Self {
        assert!(!begin.is_empty() && !end.is_empty());
        self.interp = (begin, end);
        self
    }

    /// Set the name of the include operation.
    ///
    /// # Panics
    ///
    /// If the name is empty.
    #[inline]
    pub fn include(&mut self, name: &'a str) -> &mut Self {
        assert!(!name.is_empty());
        self.include = name;
        self
    }

    /// Builds the syntax configuration.
    pub fn build(&self) -> Syntax<'a> {
        Syntax {
            statement: self.statement.into(),
            output: self.output.into(),
            interp: (self.interp.0.into(), self.interp.1.into()),
            include: self.include.into(),
            _marker: PhantomData,
        }
    }
}
