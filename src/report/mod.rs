//! Report renderers for classpath runs.
//!
//! - [`terminal`] — colored summary box and per-root tables; respects `--verbose` / `--quiet`.
//!
//! JSON and plain path-list output are written directly from `main`.

pub mod terminal;
