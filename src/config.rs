//! Configuration shared by the [`Compiler`] and the [`Interpreter`].
//!
//! [`Compiler`]: crate::Compiler
//! [`Interpreter`]: crate::Interpreter

/// A struct that holds a codec configuration.
///
/// Current configuration can be retrieved by calling [`Compiler::config()`] or
/// [`Interpreter::config()`] and changed by changing properties of the object
/// returned by a call to [`Compiler::config_mut()`] or
/// [`Interpreter::config_mut()`].
///
/// [`Compiler::config()`]: crate::Compiler::config
/// [`Compiler::config_mut()`]: crate::Compiler::config_mut
/// [`Interpreter::config()`]: crate::Interpreter::config
/// [`Interpreter::config_mut()`]: crate::Interpreter::config_mut
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
#[non_exhaustive]
pub struct Config {
    /// Whether the event sequence must follow the document grammar.
    ///
    /// When set to `true`, the compiler refuses events that cannot appear at
    /// their position (for example an `EndElement` whose names do not match
    /// the innermost open element) with [`Error::IllFormed`], leaving the
    /// output unchanged. The interpreter performs the same checks before
    /// dispatching each record and additionally reports constructs that are
    /// still open at the end of the blob. Streams without `StartDocument`
    /// (fragments) are accepted.
    ///
    /// When set to `false`, the sequence is transported as is: what goes in
    /// comes out, even if it is malformed.
    ///
    /// Checking costs a copy of every open element name. It is intended for
    /// tests and for untrusted producers.
    ///
    /// Default: `false`
    ///
    /// [`Error::IllFormed`]: crate::Error::IllFormed
    pub check_well_formed: bool,

    /// Upper bound on the capacity kept by internal buffers across `recycle()`.
    ///
    /// When `Some(n)`, a buffer that grew beyond `n` bytes (or items) while
    /// handling one document is shrunk to `n` when the instance is recycled.
    /// When `None`, all capacity is kept, so a long-lived instance settles at
    /// the size of the largest document it has handled.
    ///
    /// Default: `None`
    pub retain_capacity: Option<usize>,
}

impl Config {
    /// Sets [`check_well_formed`](Self::check_well_formed) and returns the
    /// updated configuration.
    #[inline]
    pub fn with_checks(mut self, check: bool) -> Self {
        self.check_well_formed = check;
        self
    }
}
