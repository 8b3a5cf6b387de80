use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Discord(#[from] serenity::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

impl Error {
    /// Discord answered 404, e.g. for a deleted message.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Discord(serenity::Error::Http(http)) => {
                http.status_code().map(|s| s.as_u16()) == Some(404)
            },
            _ => false,
        }
    }
}

impl From<Error> for trp_channels::Error {
    fn from(err: Error) -> Self {
        if err.is_not_found() {
            return Self::not_found(err);
        }
        match err {
            Error::TooLarge { .. } => Self::invalid_input(err),
            Error::Io(e) => Self::Io(e),
            other => Self::external("discord request failed", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
