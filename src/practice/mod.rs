pub mod form;
pub mod handler;

pub use form::*;
pub use handler::*;

use thiserror::Error;

use crate::backend::BackendError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Form has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("A submission is already in progress")]
    AlreadySubmitting,
}

pub type Result<T> = std::result::Result<T, FormError>;
