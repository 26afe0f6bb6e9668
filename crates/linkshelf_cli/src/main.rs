//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `linkshelf_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Why: keep a tiny CLI probe to validate core crate wiring independently
    // from the desktop/web runtime setup.
    println!("linkshelf_core ping={}", linkshelf_core::ping());
    println!("linkshelf_core version={}", linkshelf_core::core_version());
}
