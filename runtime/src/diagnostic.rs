//! Conversions into [`Diagnostic`], the error envelope posted to the
//! control plane.
//!
//! [`Diagnostic::error_type`] is derived from the type name of the
//! original error with [`std::any::type_name`] as a fallback. A handler
//! error type that needs a more descriptive, value-dependent
//! `errorType` (for example, a dispatcher proxying to a child process
//! whose own handler threw an error with a dynamic name) should implement
//! `From<Self> for Diagnostic` directly rather than rely on the fallback.
use std::any::type_name;

use crate::{deserializer::DeserializeError, types::Diagnostic, Error};

fn type_name_of_val<T>(_: &T) -> String {
    type_name::<T>().into()
}

impl From<DeserializeError> for Diagnostic {
    fn from(value: DeserializeError) -> Self {
        Diagnostic::new(type_name_of_val(&value), value.to_string())
    }
}

impl From<Error> for Diagnostic {
    fn from(value: Error) -> Self {
        Diagnostic::new(type_name_of_val(&value), value.to_string())
    }
}

impl From<String> for Diagnostic {
    fn from(value: String) -> Self {
        Diagnostic::new(type_name_of_val(&value), value.clone())
    }
}

impl From<&'static str> for Diagnostic {
    fn from(value: &'static str) -> Self {
        Diagnostic::new(type_name_of_val(&value), value.to_string())
    }
}

impl From<std::io::Error> for Diagnostic {
    fn from(value: std::io::Error) -> Self {
        Diagnostic::new(type_name_of_val(&value), value.to_string())
    }
}

impl From<std::convert::Infallible> for Diagnostic {
    fn from(value: std::convert::Infallible) -> Self {
        match value {}
    }
}
