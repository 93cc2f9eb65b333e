//! Value model for mapped documents
//!
//! This module provides the dynamic [`Value`] produced by value factories, the
//! [`ValueType`] descriptors used as registry keys, and the conversions that
//! connect both to concrete member types.

#![warn(missing_docs)]

pub mod convert;
pub mod types;
pub mod value;

pub use convert::{ConversionResult, FromValue, IntoValue, TypeMismatch};
pub use types::{UnknownValueType, ValueType};
pub use value::{ClassRef, ObjectHandle, Resource, Shared, Value, shared};
