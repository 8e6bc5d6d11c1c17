use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("User with ID {0} not found.")]
    UserNotFound(String),

    #[error("Group with ID {0} not found.")]
    GroupNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
