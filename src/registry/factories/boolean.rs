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

//! Boolean factory

use crate::context::Context;
use crate::error::MappingResult;
use crate::model::{Value, ValueType};
use crate::registry::{ValueFactory, unexpected_value};

/// `"true"` in any case decodes to true, everything else to false
pub struct BooleanValueFactory;

impl ValueFactory for BooleanValueFactory {
    fn value_type(&self) -> ValueType {
        ValueType::Boolean
    }

    fn deserialize(&self, _context: &Context, value: &str) -> MappingResult<Value> {
        Ok(Value::Boolean(value.eq_ignore_ascii_case("true")))
    }

    fn serialize(&self, _context: &Context, value: &Value) -> MappingResult<String> {
        match value {
            Value::Boolean(b) => Ok(b.to_string()),
            other => Err(unexpected_value(other, ValueType::Boolean)),
        }
    }
}
