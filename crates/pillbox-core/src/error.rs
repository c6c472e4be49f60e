use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid pin number: {0}")]
    InvalidPin(u8),

    #[error("Invalid reading: {0}")]
    InvalidReading(String),
}

pub type Result<T> = std::result::Result<T, Error>;
