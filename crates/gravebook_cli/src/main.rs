//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `gravebook_core` linkage and
//!   the effective session configuration.
//! - Keep output deterministic for quick local sanity checks.

use gravebook_core::SessionConfig;

fn main() {
    let config = SessionConfig::from_env();
    println!("gravebook_core ping={}", gravebook_core::ping());
    println!("gravebook_core version={}", gravebook_core::core_version());
    println!("backend_url={}", config.backend_url);
    println!("snapshot_path={}", config.snapshot_path.display());
}
