use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum PublisherError {
    /// The client refused the readiness listener.
    InvalidClient,
    /// No tokio runtime to schedule write callbacks on.
    NoRuntime,
    /// A channel primitive failed; the original error is kept as the source.
    Channel(Box<dyn Error + Send + Sync>),
}

impl PublisherError {
    pub(crate) fn channel<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        PublisherError::Channel(Box::new(err))
    }
}

impl Error for PublisherError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PublisherError::Channel(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for PublisherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublisherError::InvalidClient => {
                write!(f, "Client does not accept a readiness listener")
            }
            PublisherError::NoRuntime => write!(f, "No tokio runtime available"),
            PublisherError::Channel(err) => write!(f, "Channel error: {err}"),
        }
    }
}
