//! Build metadata baked in by the build script.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit SHA (short)
pub const GIT_SHA: &str = env!("VERGEN_GIT_SHA");

/// Git branch name
pub const GIT_BRANCH: &str = env!("VERGEN_GIT_BRANCH");

/// Whether the working tree had uncommitted changes
pub const GIT_DIRTY: &str = env!("VERGEN_GIT_DIRTY");

pub const RUSTC_VERSION: &str = env!("VERGEN_RUSTC_SEMVER");

pub const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");

pub const TARGET: &str = env!("VERGEN_CARGO_TARGET_TRIPLE");

/// `<version> (<git_sha>[ dirty])`
pub fn full_version() -> String {
    let dirty = if GIT_DIRTY == "true" { " dirty" } else { "" };
    format!("{VERSION} ({GIT_SHA}{dirty})")
}

/// Multi-line build report printed by `parley version`.
pub fn build_info() -> String {
    format!(
        "parley {}\n\
         branch: {}\n\
         built:  {}\n\
         rustc:  {}\n\
         target: {}",
        full_version(),
        GIT_BRANCH,
        BUILD_TIMESTAMP,
        RUSTC_VERSION,
        TARGET
    )
}
