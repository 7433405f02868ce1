// ============================================================
// Layer 2 — Operation Outcomes and Fatal Errors
// ============================================================
// Every public manager operation returns
//
//   Result<Outcome<T>, ManagerError>
//
// Outcome carries the conditions a request layer answers with a
// normal response (found / not found / could not be computed).
// ManagerError is reserved for configuration and caller bugs
// that must surface loudly.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    /// The name is not in the model catalog
    UnknownModel(String),
    /// The model exists but this request could not be served
    Unavailable(String),
}

impl<T> Outcome<T> {
    #[cfg(test)]
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready(v)           => Outcome::Ready(f(v)),
            Outcome::UnknownModel(name) => Outcome::UnknownModel(name),
            Outcome::Unavailable(why)   => Outcome::Unavailable(why),
        }
    }

    /// Ready value, or this outcome re-typed for an early return
    pub fn or_early<U>(self) -> Result<T, Outcome<U>> {
        match self {
            Outcome::Ready(v)           => Ok(v),
            Outcome::UnknownModel(name) => Err(Outcome::UnknownModel(name)),
            Outcome::Unavailable(why)   => Err(Outcome::Unavailable(why)),
        }
    }

    /// Ready value or an error describing why there is none
    pub fn into_result(self) -> anyhow::Result<T> {
        match self {
            Outcome::Ready(v)           => Ok(v),
            Outcome::UnknownModel(name) => anyhow::bail!("Cannot find model with name {name}"),
            Outcome::Unavailable(why)   => anyhow::bail!("Request could not be served: {why}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("model '{model}' has no checkpoint at '{}'", .path.display())]
    MissingCheckpoint { model: String, path: PathBuf },

    #[error("{0}")]
    InvalidSplit(String),

    #[error("cannot build model '{name}': {error:#}")]
    Build { name: String, error: anyhow::Error },

    #[error("cannot restore model '{name}': {error:#}")]
    Restore { name: String, error: anyhow::Error },

    #[error("model '{name}' failed: {error:#}")]
    Model { name: String, error: anyhow::Error },
}
