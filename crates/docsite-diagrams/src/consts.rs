//! Internal constants for diagram rendering.

/// Output subdirectory holding rendered diagrams.
pub const DIAGRAMS_DIR: &str = "diagrams";

/// Document attribute selecting the default output format.
pub const DEFAULT_FORMAT_ATTRIBUTE: &str = "kroki-default-format";
