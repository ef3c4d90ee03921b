use thiserror::Error;

pub type Result<T> = std::result::Result<T, InfraError>;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Container(#[from] testcontainers::TestcontainersError),
}
