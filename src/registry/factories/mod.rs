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

//! Built-in value factories

mod boolean;
mod class;
mod date;
mod file;
mod numeric;
mod resource;
mod text;
mod url;

pub use boolean::BooleanValueFactory;
pub use class::ClassValueFactory;
pub use date::DateValueFactory;
pub use file::FileValueFactory;
pub use numeric::{DoubleValueFactory, FloatValueFactory, IntegerValueFactory, LongValueFactory};
pub use resource::ResourceValueFactory;
pub use text::StringValueFactory;
pub use self::url::UrlValueFactory;

use crate::config::MapperConfig;
use crate::registry::ValueFactoryRegistry;

/// Register all built-in factories
pub fn register_builtin_factories(registry: &mut ValueFactoryRegistry, config: &MapperConfig) {
    // Text and numbers
    registry.register_factory(StringValueFactory);
    registry.register_factory(IntegerValueFactory);
    registry.register_factory(LongValueFactory);
    registry.register_factory(DoubleValueFactory);
    registry.register_factory(FloatValueFactory);
    registry.register_factory(BooleanValueFactory);

    // Dates follow the configured format and leniency
    registry.register_factory(DateValueFactory::new(
        config.date_format.clone(),
        config.lenient_dates,
    ));

    // References
    registry.register_factory(FileValueFactory);
    registry.register_factory(UrlValueFactory);
    registry.register_factory(ClassValueFactory);
    registry.register_factory(ResourceValueFactory);
}
