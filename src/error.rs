use thiserror::Error;

/// Failures of a `grades` command that are reported back to the asker
#[derive(Error, Debug)]
pub enum CommandError {
    /// Fewer than two arguments
    #[error("expected a course number and a professor surname")]
    Usage,

    /// The snapshot could not be read
    #[error("grade data unavailable: {0:#}")]
    DataUnavailable(anyhow::Error),
}
