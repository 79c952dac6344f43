use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown role `{0}`, it is neither a primitive nor a discovered relation.")]
    UnknownRole(String),

    #[error(transparent)]
    Graph(#[from] plangraph::Error),
}

pub type RoleResult<T> = Result<T, Error>;
