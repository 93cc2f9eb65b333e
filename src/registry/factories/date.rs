//! Date factory

use chrono::NaiveDate;
use std::fmt::Write;

use crate::config::MEDIUM_DATE_FORMAT;
use crate::context::Context;
use crate::error::{MappingError, MappingResult};
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, unexpected_value};

/// Date-only values in a fixed `chrono` format
///
/// In lenient mode text that does not match the format decodes to
/// [`Value::Empty`] instead of failing the binding.
pub struct DateValueFactory {
    format: String,
    lenient: bool,
}

impl DateValueFactory {
    /// Create a factory for `format`
    pub fn new(format: impl Into<String>, lenient: bool) -> Self {
        Self {
            format: format.into(),
            lenient,
        }
    }

    /// Format in use
    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Default for DateValueFactory {
    fn default() -> Self {
        Self::new(MEDIUM_DATE_FORMAT, true)
    }
}

impl ValueFactory for DateValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Date
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        match NaiveDate::parse_from_str(value, &self.format) {
            Ok(date) => Ok(Value::Date(date)),
            Err(e) if self.lenient => {
                log::debug!("unparsable date '{value}' ({e}), leaving it empty");
                Ok(Value::Empty)
            }
            Err(e) => Err(MappingError::conversion(value, ValueType::Date, e)),
        }
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Date(date) => {
                // Time specifiers make the formatter fail instead of printing
                let mut text = String::new();
                write!(text, "{}", date.format(&self.format)).map_err(|_| {
                    MappingError::conversion(
                        date.to_string(),
                        ValueType::Date,
                        format!("format '{}' cannot print a date", self.format),
                    )
                })?;
                Ok(text)
            }
            other => Err(unexpected_value(other, ValueType::Date)),
        }
    }
}
