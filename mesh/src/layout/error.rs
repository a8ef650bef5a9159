use thiserror::Error;

/// Errors that can occur while validating or computing a layout
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Layout contains no screens
    #[error("Layout has no screens")]
    NoScreens,

    /// A screen has a non-positive width or height
    #[error("Screen `{id}` has a non-positive size ({w}x{h})")]
    InvalidScreenSize { id: String, w: f64, h: f64 },

    /// Two screens share one id
    #[error("Duplicate screen id `{id}` in layout")]
    DuplicateScreenId { id: String },

    /// Frame does not equal the union of the screens
    #[error("Layout frame does not match the union of its screens")]
    FrameMismatch,

    /// Layout format version is not supported
    #[error("Unsupported layout version {version} (expected 1)")]
    UnsupportedVersion { version: u32 },
}
