use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] autodelete_config::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
