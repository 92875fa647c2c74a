use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("position is outside the board")]
    OutOfRange,
    #[error("flags are not allowed before the first reveal")]
    NotStarted,
    #[error("game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = std::result::Result<T, GameError>;
