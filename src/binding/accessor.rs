//! Member accessors
//!
//! An [`Accessor`] writes decoded values into one member of one target type
//! and, when a getter is known, reads them back. Accessors are type-erased so
//! bindings of every target type share one representation; the concrete type
//! is recovered by downcasting the object handle.
//!
//! Without runtime reflection the members of a type are declared up front in
//! a [`TypeMembers`] table. Setter accessors find their storage field and
//! getter in that table by naming convention: `setServiceType` pairs with the
//! field `serviceType` and the getter `getServiceType` (`isEnabled` for a
//! boolean `setEnabled`).

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::error::{MappingError, MappingResult};
use crate::model::{FromValue, IntoValue, ObjectHandle, TypeMismatch, Value, ValueType};

type Writer = Arc<dyn Fn(&ObjectHandle, Value) -> MappingResult<()> + Send + Sync>;
type Reader = Arc<dyn Fn(&ObjectHandle) -> Option<Value> + Send + Sync>;

/// Read/write capability over one member of one target type
pub struct Accessor {
    signature: String,
    value_type: ValueType,
    member_type: ValueType,
    writer: Writer,
    reader: Option<Reader>,
}

impl Accessor {
    /// Build an accessor over a setter
    ///
    /// `setter` receives the decoded value converted to `V`. An error it
    /// returns is surfaced as the application error it is; instance or value
    /// type mismatches are reported as [`MappingError::InvalidBinding`].
    pub fn new<T, V, F>(signature: impl Into<String>, value_type: ValueType, setter: F) -> Self
    where
        T: Send + 'static,
        V: FromValue,
        F: Fn(&mut T, V) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let signature = signature.into();
        let label = signature.clone();
        let writer: Writer = Arc::new(move |instance, value| {
            let target = lock_target::<T>(instance, &label)?;
            let value = V::from_value(value).map_err(|e| mismatch(&label, e))?;
            let mut target = target.lock();
            setter(&mut target, value).map_err(MappingError::from_application)
        });

        Self {
            signature,
            member_type: value_type.clone(),
            value_type,
            writer,
            reader: None,
        }
    }

    /// Attach a getter
    pub fn with_getter<T, G>(mut self, getter: G) -> Self
    where
        T: Send + 'static,
        G: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.reader = Some(Arc::new(move |instance| {
            let target = instance.downcast_ref::<Mutex<T>>()?;
            let target = target.lock();
            Some(getter(&target))
        }));
        self
    }

    /// Declare the richer type visible through the member's field or getter
    pub fn with_member_type(mut self, member_type: ValueType) -> Self {
        self.member_type = member_type;
        self
    }

    /// Member signature
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Type the value factory must produce
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Type of the underlying member
    pub fn member_type(&self) -> &ValueType {
        &self.member_type
    }

    /// Check whether [`Accessor::read`] can observe the member
    pub fn has_getter(&self) -> bool {
        self.reader.is_some()
    }

    /// Store `value` into `instance`
    pub fn write(&self, instance: &ObjectHandle, value: Value) -> MappingResult<()> {
        (self.writer)(instance, value)
    }

    /// Read the member back; `None` when no getter is known
    pub fn read(&self, instance: &ObjectHandle) -> Option<Value> {
        let reader = self.reader.as_ref()?;
        reader(instance)
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("signature", &self.signature)
            .field("value_type", &self.value_type)
            .field("member_type", &self.member_type)
            .field("has_getter", &self.has_getter())
            .finish()
    }
}

fn lock_target<'a, T: Send + 'static>(
    instance: &'a ObjectHandle,
    label: &str,
) -> MappingResult<&'a Mutex<T>> {
    instance.downcast_ref::<Mutex<T>>().ok_or_else(|| {
        MappingError::invalid_binding(
            label,
            format!("instance is not a {}", std::any::type_name::<T>()),
        )
    })
}

fn mismatch(label: &str, error: TypeMismatch) -> MappingError {
    MappingError::invalid_binding(label, format!("value type mismatch: {error}"))
}

type FieldReader<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type FieldWriter<T> = Arc<dyn Fn(&mut T, Value) -> Result<(), TypeMismatch> + Send + Sync>;

struct Field<T> {
    value_type: ValueType,
    read: FieldReader<T>,
    write: FieldWriter<T>,
}

struct Getter<T> {
    return_type: ValueType,
    get: FieldReader<T>,
}

/// Declared members of a target type
pub struct TypeMembers<T> {
    type_name: String,
    fields: IndexMap<String, Field<T>>,
    getters: IndexMap<String, Getter<T>>,
}

impl<T: Send + 'static> TypeMembers<T> {
    /// Start an empty member table
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
            getters: IndexMap::new(),
        }
    }

    /// Declare a storage field
    pub fn field<V, R, W>(mut self, name: &str, value_type: ValueType, read: R, write: W) -> Self
    where
        V: FromValue + IntoValue,
        R: Fn(&T) -> V + Send + Sync + 'static,
        W: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.fields.insert(
            name.to_string(),
            Field {
                value_type,
                read: Arc::new(move |target| read(target).into_value()),
                write: Arc::new(move |target, value| {
                    write(target, V::from_value(value)?);
                    Ok(())
                }),
            },
        );
        self
    }

    /// Declare a getter method
    pub fn getter<V, R>(mut self, name: &str, return_type: ValueType, read: R) -> Self
    where
        V: IntoValue,
        R: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.getters.insert(
            name.to_string(),
            Getter {
                return_type,
                get: Arc::new(move |target| read(target).into_value()),
            },
        );
        self
    }

    /// Name of the target type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Check whether a field is declared
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Check whether a getter is declared
    pub fn has_getter(&self, name: &str) -> bool {
        self.getters.contains_key(name)
    }

    /// Accessor writing and reading the field `name` directly
    pub fn field_accessor(&self, name: &str) -> Option<Accessor> {
        let field = self.fields.get(name)?;
        let signature = format!("{}.{}: {}", self.type_name, name, field.value_type);

        let label = signature.clone();
        let write = field.write.clone();
        let writer: Writer = Arc::new(move |instance, value| {
            let target = lock_target::<T>(instance, &label)?;
            let mut target = target.lock();
            write(&mut target, value).map_err(|e| mismatch(&label, e))
        });

        let read = field.read.clone();
        let reader: Reader = Arc::new(move |instance| {
            let target = instance.downcast_ref::<Mutex<T>>()?;
            let target = target.lock();
            Some(read(&target))
        });

        Some(Accessor {
            signature,
            value_type: field.value_type.clone(),
            member_type: field.value_type.clone(),
            writer,
            reader: Some(reader),
        })
    }

    /// Accessor over the setter `setter_name`
    ///
    /// The paired field and getter are guessed from the setter name. A missing
    /// field is fine; a missing getter is logged and leaves the accessor
    /// write-only.
    pub fn method_accessor<V, F>(&self, setter_name: &str, value_type: ValueType, setter: F) -> Accessor
    where
        V: FromValue,
        F: Fn(&mut T, V) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let signature = format!("{}::{}({})", self.type_name, setter_name, value_type);
        let field_name = guess_field_name(setter_name);
        let field = field_name.as_deref().and_then(|name| self.fields.get(name));

        let getter = match field_name.as_deref() {
            Some(name) => {
                let getter_name = guess_getter_name(name, &value_type);
                let getter = self.getters.get(&getter_name);
                if getter.is_none() {
                    log::warn!(
                        "Cannot guess getter of field {} in class {}",
                        name,
                        self.type_name
                    );
                }
                getter
            }
            None => {
                log::warn!(
                    "Cannot guess field of setter {} in class {}",
                    setter_name,
                    self.type_name
                );
                None
            }
        };

        let member_type = field
            .map(|field| field.value_type.clone())
            .or_else(|| getter.map(|getter| getter.return_type.clone()))
            .unwrap_or(ValueType::Any);

        let accessor = Accessor::new(signature, value_type, setter).with_member_type(member_type);
        match getter {
            Some(getter) => {
                let get = getter.get.clone();
                accessor.with_getter(move |target: &T| get(target))
            }
            None => accessor,
        }
    }
}

/// Field name paired with a setter: the part after `set`, uncapitalized
pub fn guess_field_name(setter_name: &str) -> Option<String> {
    let index = setter_name.to_ascii_lowercase().find("set")?;
    let rest = &setter_name[index + 3..];
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

/// Getter name paired with a field: `is` for booleans, `get` otherwise
pub fn guess_getter_name(field_name: &str, value_type: &ValueType) -> String {
    let prefix = if *value_type == ValueType::Boolean {
        "is"
    } else {
        "get"
    };
    let mut chars = field_name.chars();
    match chars.next() {
        Some(first) => format!("{prefix}{}{}", first.to_uppercase(), chars.as_str()),
        None => prefix.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassRef, shared};

    #[derive(Default)]
    struct Contribution {
        component_type: Option<ClassRef>,
        service_type: Option<String>,
        enabled: bool,
    }

    fn members() -> TypeMembers<Contribution> {
        TypeMembers::new("Contribution")
            .field(
                "componentType",
                ValueType::Class,
                |c: &Contribution| c.component_type.clone(),
                |c, v| c.component_type = v,
            )
            .getter("getServiceType", ValueType::String, |c: &Contribution| {
                c.service_type.clone()
            })
            .getter("isEnabled", ValueType::Boolean, |c: &Contribution| c.enabled)
    }

    fn set_service_type(c: &mut Contribution, name: String) -> anyhow::Result<()> {
        c.service_type = Some(name);
        Ok(())
    }

    #[test]
    fn test_name_guessing() {
        assert_eq!(guess_field_name("setServiceType").as_deref(), Some("serviceType"));
        assert_eq!(guess_field_name("SetURL").as_deref(), Some("uRL"));
        assert_eq!(guess_field_name("configure"), None);
        assert_eq!(guess_field_name("set"), None);
        assert_eq!(guess_getter_name("serviceType", &ValueType::String), "getServiceType");
        assert_eq!(guess_getter_name("enabled", &ValueType::Boolean), "isEnabled");
    }

    #[test]
    fn test_setter_with_getter_reads_back() {
        let accessor =
            members().method_accessor("setServiceType", ValueType::String, set_service_type);
        assert!(accessor.has_getter());
        assert_eq!(accessor.member_type(), &ValueType::String);

        let object = shared(Contribution::default());
        let handle: ObjectHandle = object.clone();
        accessor.write(&handle, Value::String("x".into())).unwrap();

        assert_eq!(accessor.read(&handle), Some(Value::String("x".into())));
        assert_eq!(object.lock().service_type.as_deref(), Some("x"));
    }

    #[test]
    fn test_missing_getter_reads_missing() {
        let bare = TypeMembers::<Contribution>::new("Contribution");
        let accessor = bare.method_accessor("setServiceType", ValueType::String, set_service_type);
        assert!(!accessor.has_getter());
        assert_eq!(accessor.member_type(), &ValueType::Any);

        let handle: ObjectHandle = shared(Contribution::default());
        accessor.write(&handle, Value::String("x".into())).unwrap();
        assert_eq!(accessor.read(&handle), None);
    }

    #[test]
    fn test_boolean_setter_uses_is_getter() {
        let accessor = members().method_accessor(
            "setEnabled",
            ValueType::Boolean,
            |c: &mut Contribution, v: bool| {
                c.enabled = v;
                Ok(())
            },
        );
        let handle: ObjectHandle = shared(Contribution::default());
        accessor.write(&handle, Value::Boolean(true)).unwrap();
        assert_eq!(accessor.read(&handle), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_member_type_from_field() {
        let members = members().field(
            "serviceType",
            ValueType::Class,
            |_: &Contribution| None::<ClassRef>,
            |_, _: Option<ClassRef>| {},
        );
        let accessor = members.method_accessor("setServiceType", ValueType::String, set_service_type);
        assert_eq!(accessor.value_type(), &ValueType::String);
        assert_eq!(accessor.member_type(), &ValueType::Class);
    }

    #[test]
    fn test_field_accessor() {
        let accessor = members().field_accessor("componentType").unwrap();
        assert_eq!(accessor.to_string(), "Contribution.componentType: Class");

        let handle: ObjectHandle = shared(Contribution::default());
        assert_eq!(accessor.read(&handle), Some(Value::Empty));
        let class = ClassRef::named("a.Component");
        accessor.write(&handle, Value::Class(class.clone())).unwrap();
        assert_eq!(accessor.read(&handle), Some(Value::Class(class)));

        assert!(members().field_accessor("nothing").is_none());
    }

    #[test]
    fn test_invalid_binding_errors() {
        let accessor =
            members().method_accessor("setServiceType", ValueType::String, set_service_type);

        let wrong_instance: ObjectHandle = shared(42_u32);
        let err = accessor.write(&wrong_instance, Value::String("x".into())).unwrap_err();
        assert!(matches!(err, MappingError::InvalidBinding { .. }));

        let handle: ObjectHandle = shared(Contribution::default());
        let err = accessor.write(&handle, Value::Integer(1)).unwrap_err();
        assert!(matches!(err, MappingError::InvalidBinding { .. }));
        assert_eq!(accessor.read(&wrong_instance), None);
    }

    #[test]
    fn test_application_error_is_unwrapped() {
        let accessor = Accessor::new(
            "Contribution::setServiceType(String)",
            ValueType::String,
            |_: &mut Contribution, name: String| -> anyhow::Result<()> {
                Err(MappingError::conversion(name, ValueType::Class, "no such service").into())
            },
        );
        let handle: ObjectHandle = shared(Contribution::default());
        let err = accessor.write(&handle, Value::String("a.B".into())).unwrap_err();
        assert!(err.is_conversion());

        let accessor = Accessor::new(
            "Contribution::setServiceType(String)",
            ValueType::String,
            |_: &mut Contribution, _: String| -> anyhow::Result<()> {
                anyhow::bail!("service registry offline")
            },
        );
        let err = accessor.write(&handle, Value::String("a.B".into())).unwrap_err();
        assert!(matches!(err, MappingError::Application(_)));
        assert_eq!(err.to_string(), "service registry offline");
    }
}
