/// Static asset names and image URL helpers.
pub mod assets;
/// Environment variable readers.
pub mod env;
/// Shared formatting helpers (names, placeholders, points).
pub mod formatting;
/// Shown wherever an optional profile field is absent.
pub const MISSING_FIELD: &str = "---";
