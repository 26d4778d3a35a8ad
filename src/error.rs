/// Error kinds surfaced by the bot.
///
/// Only `Config` ends the process (at startup). Network, decode and delivery
/// failures abandon the current report or command and get logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("delivery error: {0}")]
    Delivery(String),
}

impl Error {
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<teloxide::RequestError> for Error {
    fn from(e: teloxide::RequestError) -> Self {
        match e {
            teloxide::RequestError::Network(_) | teloxide::RequestError::Io(_) => {
                Error::Network(format!("Telegram: {}", e))
            }
            other => Error::Delivery(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
