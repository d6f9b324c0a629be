//! API implementation submodules.
//!
//! Each submodule contains `impl MovieBrowser` blocks that extend the public
//! API. The struct definition remains in `lib.rs`.

mod builder;
mod movies;

pub use builder::MovieBrowserBuilder;
