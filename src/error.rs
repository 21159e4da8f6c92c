//! Describes dependency resolution errors

use std::fmt::{Display, Formatter};

/// An error returned by the container when a dependency cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A strong dependency was resolved before anything was provided or mocked for it
    NeverProvided(&'static str),
    /// The stored instance does not match the requested type
    WrongType(&'static str)
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NeverProvided(type_name) => write!(f, "Dependency Error: dependency was never provided: {type_name}"),
            Error::WrongType(type_name) => write!(f, "Dependency Error: instance is not of the expected type: {type_name}")
        }
    }
}

impl std::error::Error for Error {}
