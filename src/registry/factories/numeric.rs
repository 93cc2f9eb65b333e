// Copyright 2024 XMapper Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Numeric factories
//!
//! Integers are parsed in base 10 with an optional sign and no surrounding
//! whitespace. Floating point values ignore surrounding whitespace and never
//! depend on the process locale.

use std::str::FromStr;

use crate::context::Context;
use crate::error::{MappingError, MappingResult};
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, unexpected_value};

fn parse_number<T>(text: &str, target_type: ValueType) -> MappingResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| MappingError::conversion(text, target_type, e))
}

/// 32-bit integers
pub struct IntegerValueFactory;

impl ValueFactory for IntegerValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Integer
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        parse_number(value, ValueType::Integer).map(Value::Integer)
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Integer(i) => Ok(i.to_string()),
            other => Err(unexpected_value(other, ValueType::Integer)),
        }
    }
}

/// 64-bit integers
pub struct LongValueFactory;

impl ValueFactory for LongValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Long
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        parse_number(value, ValueType::Long).map(Value::Long)
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Long(l) => Ok(l.to_string()),
            other => Err(unexpected_value(other, ValueType::Long)),
        }
    }
}

/// 64-bit floats
pub struct DoubleValueFactory;

impl ValueFactory for DoubleValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Double
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        parse_number(value.trim(), ValueType::Double).map(Value::Double)
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Double(d) => Ok(d.to_string()),
            other => Err(unexpected_value(other, ValueType::Double)),
        }
    }
}

/// 32-bit floats
pub struct FloatValueFactory;

impl ValueFactory for FloatValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Float
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        parse_number(value.trim(), ValueType::Float).map(Value::Float)
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Float(x) => Ok(x.to_string()),
            other => Err(unexpected_value(other, ValueType::Float)),
        }
    }
}
