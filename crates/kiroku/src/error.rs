use thiserror::Error;

#[derive(Error, Debug)]
pub enum KirokuError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    MissingExecutable(#[from] which::Error),

    #[error("Invalid config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error(transparent)]
    PatternError(#[from] regex::Error),

    #[error("Invalid extra arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid channel argument: {0:?}")]
    InvalidChannel(String),
}

pub type KirokuResult<T> = Result<T, KirokuError>;
