use core::fmt;
use std::{
  error::Error,
  fmt::{Display, Formatter},
};

#[derive(Debug)]
pub enum CrossgenError {
  Internal(String),
  MalformedStructure(String),
}

impl Display for CrossgenError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      CrossgenError::Internal(msg) => write!(f, "Internal error: {msg}"),
      CrossgenError::MalformedStructure(msg) => write!(f, "Malformed structure: {msg}"),
    }
  }
}

impl Error for CrossgenError {}

pub type CrossgenResult<T = ()> = Result<T, Box<dyn Error>>;
