use thiserror::Error;

/// Everything that can go wrong running a simulation, from a bad config
/// value through to a rank thread dying mid-run.
#[derive(Debug, Error)]
pub enum MiniWeatherError {
    /// A configuration value is out of range or otherwise nonsensical.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The rank count doesn't fit the requested grid (e.g. more ranks than
    /// x-columns, or a column count that doesn't divide evenly).
    #[error("rank layout error: {message}")]
    RankLayout { message: String },

    /// A cell value went non-finite at a step boundary. Only raised when
    /// `Config::check_finite` is enabled.
    #[error("non-finite value in {field} at step with etime={etime}")]
    NonFinite { field: &'static str, etime: f64 },

    /// A rank's worker thread panicked instead of returning a result.
    #[error("rank {rank} panicked during the run")]
    RankPanicked { rank: usize },

    /// A ring channel's peer hung up before a message could be received.
    #[error("halo exchange with rank {peer} failed: channel disconnected")]
    ChannelClosed { peer: usize },

    /// Output-writer failure, surfaced by the CLI crate's `OutputSink` impls.
    #[error("output error: {message}")]
    Output { message: String },

    /// Wraps a lower-level I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
