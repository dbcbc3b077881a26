// error.rs - Error types for the simulation core

use thiserror::Error;

/// Errors raised by the engine, the timelines and the simulation coordinator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifeError {
    /// A grid was requested with a zero dimension.
    #[error("grid dimensions must be positive, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    /// Nested row data did not describe a rectangle.
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A pattern string contained something other than a cell marker.
    #[error("unexpected character {found:?} at row {row}, column {col}")]
    BadPatternChar { row: usize, col: usize, found: char },

    /// Range export bounds outside the captured frames.
    #[error("invalid frame range {start}..={end} for {len} frames")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// The operation needs at least one captured frame.
    #[error("no frames have been captured")]
    EmptyTimeline,

    /// Live simulation controls are locked while a recording is being viewed.
    #[error("simulation controls are disabled in playback mode")]
    PlaybackModeActive,
}

/// Reasons a rule string was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("rule string is empty")]
    Empty,

    #[error("expected `B<digits>/S<digits>`, got {0:?}")]
    Shape(String),

    #[error("neighbour count {0:?} is not a digit in 0..=8")]
    BadDigit(char),

    #[error("neighbour count {0} listed twice")]
    Duplicate(u8),
}

/// Configuration problems found while loading or validating [`crate::config::StudioConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),

    #[error("invalid rule string in configuration: {0}")]
    Rules(#[from] RuleParseError),

    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}
