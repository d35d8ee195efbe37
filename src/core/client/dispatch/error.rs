use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// The dispatch mechanism itself could not be reached; distinct from a
    /// dispatch that ran and reported failure in its outcome.
    #[error("Retry dispatch unreachable: {0}")]
    Unreachable(String),
}
