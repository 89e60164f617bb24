use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A statistics source could not be opened or read to completion.
    #[error("{}: statistics unavailable: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("page size unavailable")]
    PageSize,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Unavailable { path: path.into(), source }
    }
}
