//! Call-site capture for tracked operations.
//!
//! Every tracked allocation records where it was made. A [`CallSite`] is a
//! small `Copy` value built at the call boundary, either by the
//! [`call_site!`](crate::call_site) macro (file, enclosing function, line)
//! or by [`CallSite::caller`] through `#[track_caller]` (function unknown).

use std::fmt;
use std::panic::Location;

/// Source location of a tracked allocation, reallocation, or free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// Source file, as reported by `file!()`.
    pub file: &'static str,
    /// Fully qualified path of the enclosing function. Empty when unknown.
    pub function: &'static str,
    /// Line number, as reported by `line!()`.
    pub line: u32,
}

impl CallSite {
    /// Placeholder site for operations with no meaningful origin.
    pub const UNKNOWN: CallSite = CallSite::new("<unknown>", "", 0);

    /// Create a call site from its parts.
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }

    /// Capture the location of the caller via `#[track_caller]`.
    ///
    /// The enclosing function is not available this way, so `function`
    /// is left empty.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), "", location.line())
    }

    /// Whether the enclosing function name is known.
    pub fn has_function(&self) -> bool {
        !self.function.is_empty()
    }
}

impl Default for CallSite {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)?;
        if self.has_function() {
            write!(f, " ({})", self.function)?;
        }
        Ok(())
    }
}

/// Strip the helper-item suffix that [`call_site!`](crate::call_site)
/// leaves on a `type_name` path, including any closure frames.
#[doc(hidden)]
pub fn enclosing_function(path: &'static str) -> &'static str {
    let mut name = path.strip_suffix("::__stash_here").unwrap_or(path);
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    name
}

/// Capture the current file, enclosing function, and line as a [`CallSite`].
///
/// ```
/// use stash_core::call_site;
///
/// fn load_level() -> stash_core::CallSite {
///     call_site!()
/// }
///
/// let site = load_level();
/// assert!(site.function.ends_with("load_level"));
/// assert!(site.line > 0);
/// ```
#[macro_export]
macro_rules! call_site {
    () => {{
        fn __stash_here() {}
        fn __stash_type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        $crate::CallSite::new(
            ::core::file!(),
            $crate::site::enclosing_function(__stash_type_name_of(__stash_here)),
            ::core::line!(),
        )
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured_here() -> CallSite {
        crate::call_site!()
    }

    #[test]
    fn macro_captures_file_line_and_function() {
        let site = captured_here();
        assert!(site.file.ends_with("site.rs"));
        assert!(site.line > 0);
        assert!(
            site.function.ends_with("tests::captured_here"),
            "got {}",
            site.function
        );
    }

    #[test]
    fn macro_strips_closure_frames() {
        let site = (|| crate::call_site!())();
        assert!(
            site.function
                .ends_with("tests::macro_strips_closure_frames"),
            "got {}",
            site.function
        );
    }

    #[test]
    fn caller_has_no_function() {
        let site = CallSite::caller();
        assert!(site.file.ends_with("site.rs"));
        assert!(!site.has_function());
    }

    #[test]
    fn display_includes_function_when_known() {
        let site = CallSite::new("src/world.rs", "game::world::spawn", 42);
        assert_eq!(site.to_string(), "src/world.rs:42 (game::world::spawn)");
        let bare = CallSite::new("src/world.rs", "", 7);
        assert_eq!(bare.to_string(), "src/world.rs:7");
    }

    #[test]
    fn enclosing_function_leaves_plain_paths_alone() {
        assert_eq!(enclosing_function("a::b::c"), "a::b::c");
        assert_eq!(enclosing_function("a::b::__stash_here"), "a::b");
        assert_eq!(
            enclosing_function("a::b::{{closure}}::{{closure}}::__stash_here"),
            "a::b"
        );
    }
}
