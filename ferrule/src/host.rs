//! Host object capability
//!
//! Rules read and mutate caller-owned values ("facts") through the [`Fact`]
//! trait: field lookup, assignment, key/index lookup, method invocation and
//! navigation into nested objects. Implementations are provided for maps,
//! vectors and `serde_json::Value`; plain structs get one through
//! [`impl_fact!`](crate::impl_fact).

use crate::value::{FromValue, ToValue, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Failure reported by a host object while resolving a member, index or call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("no field or accessor '{member}' on {type_name}")]
    UnknownMember { type_name: String, member: String },

    #[error("no method '{method}' on {type_name}")]
    UnknownMethod { type_name: String, method: String },

    #[error("{type_name} does not support indexing")]
    NotIndexable { type_name: String },

    #[error("key {key} not found")]
    MissingKey { key: String },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: String },

    #[error("'{method}' expects {expected} argument(s), found {found}")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("field '{member}' of {type_name} cannot be assigned")]
    ReadOnly { type_name: String, member: String },

    #[error("{0}")]
    Custom(String),
}

/// A caller-owned value bound into a data context.
///
/// Only `get` is required. Everything else defaults to "not supported" so a
/// read-only fact is a one-method impl.
pub trait Fact {
    /// Name used in error messages
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Read a field, `None` when the field does not exist
    fn get(&self, field: &str) -> Option<Value>;

    /// Assign a field
    fn set(&mut self, field: &str, value: Value) -> Result<(), HostError> {
        let _ = value;
        if self.get(field).is_some() {
            Err(HostError::ReadOnly {
                type_name: self.type_name().to_string(),
                member: field.to_string(),
            })
        } else {
            Err(HostError::UnknownMember {
                type_name: self.type_name().to_string(),
                member: field.to_string(),
            })
        }
    }

    /// Key or position lookup (`fact[key]`)
    fn index(&self, key: &Value) -> Result<Value, HostError> {
        let _ = key;
        Err(HostError::NotIndexable {
            type_name: self.type_name().to_string(),
        })
    }

    /// Key or position assignment (`fact[key] = value`)
    fn set_index(&mut self, key: &Value, value: Value) -> Result<(), HostError> {
        let _ = (key, value);
        Err(HostError::NotIndexable {
            type_name: self.type_name().to_string(),
        })
    }

    /// Invoke a method with already evaluated arguments
    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, HostError> {
        let _ = args;
        Err(HostError::UnknownMethod {
            type_name: self.type_name().to_string(),
            method: method.to_string(),
        })
    }

    /// Nested host object reachable through a field
    fn member_mut(&mut self, field: &str) -> Option<&mut dyn Fact> {
        let _ = field;
        None
    }

    /// Nested host object reachable through a key or position
    fn element_mut(&mut self, key: &Value) -> Option<&mut dyn Fact> {
        let _ = key;
        None
    }

    /// Snapshot of the whole object, used when a fact name appears on its own
    fn to_value(&self) -> Value {
        Value::Nil
    }
}

/// Check that a method received exactly `expected` arguments
pub fn expect_arity(method: &str, args: &[Value], expected: usize) -> Result<(), HostError> {
    if args.len() != expected {
        return Err(HostError::Arity {
            method: method.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

/// Convert the argument at `index` into a host type
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, HostError> {
    let value = args.get(index).cloned().ok_or_else(|| {
        HostError::Custom(format!("missing argument at position {}", index))
    })?;
    T::from_value(value)
}

fn text_key(key: &Value) -> Result<&str, HostError> {
    key.as_str().ok_or_else(|| HostError::TypeMismatch {
        expected: "string key".to_string(),
        found: key.type_name().to_string(),
    })
}

fn position(key: &Value, len: usize) -> Result<usize, HostError> {
    let index = match key {
        Value::Integer(n) => *n,
        other => {
            return Err(HostError::TypeMismatch {
                expected: "integer index".to_string(),
                found: other.type_name().to_string(),
            })
        }
    };
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(HostError::IndexOutOfBounds { index, len })
}

fn missing_key(key: &str) -> HostError {
    HostError::MissingKey {
        key: format!("{:?}", key),
    }
}

impl<V: ToValue + FromValue> Fact for HashMap<String, V> {
    fn type_name(&self) -> &str {
        "map"
    }

    fn get(&self, _field: &str) -> Option<Value> {
        None
    }

    fn index(&self, key: &Value) -> Result<Value, HostError> {
        let key = text_key(key)?;
        self.get(key)
            .map(ToValue::to_value)
            .ok_or_else(|| missing_key(key))
    }

    fn set_index(&mut self, key: &Value, value: Value) -> Result<(), HostError> {
        let key = text_key(key)?;
        self.insert(key.to_string(), V::from_value(value)?);
        Ok(())
    }

    fn to_value(&self) -> Value {
        ToValue::to_value(self)
    }
}

impl<V: ToValue + FromValue> Fact for BTreeMap<String, V> {
    fn type_name(&self) -> &str {
        "map"
    }

    fn get(&self, _field: &str) -> Option<Value> {
        None
    }

    fn index(&self, key: &Value) -> Result<Value, HostError> {
        let key = text_key(key)?;
        self.get(key)
            .map(ToValue::to_value)
            .ok_or_else(|| missing_key(key))
    }

    fn set_index(&mut self, key: &Value, value: Value) -> Result<(), HostError> {
        let key = text_key(key)?;
        self.insert(key.to_string(), V::from_value(value)?);
        Ok(())
    }

    fn to_value(&self) -> Value {
        ToValue::to_value(self)
    }
}

impl<V: ToValue + FromValue> Fact for Vec<V> {
    fn type_name(&self) -> &str {
        "list"
    }

    fn get(&self, _field: &str) -> Option<Value> {
        None
    }

    fn index(&self, key: &Value) -> Result<Value, HostError> {
        let i = position(key, self.len())?;
        Ok(ToValue::to_value(&self[i]))
    }

    fn set_index(&mut self, key: &Value, value: Value) -> Result<(), HostError> {
        let i = position(key, self.len())?;
        self[i] = V::from_value(value)?;
        Ok(())
    }

    fn to_value(&self) -> Value {
        ToValue::to_value(self)
    }
}

impl Fact for serde_json::Value {
    fn type_name(&self) -> &str {
        match self {
            serde_json::Value::Null => "json null",
            serde_json::Value::Bool(_) => "json boolean",
            serde_json::Value::Number(_) => "json number",
            serde_json::Value::String(_) => "json string",
            serde_json::Value::Array(_) => "json array",
            serde_json::Value::Object(_) => "json object",
        }
    }

    fn get(&self, field: &str) -> Option<Value> {
        self.as_object()
            .and_then(|object| object.get(field))
            .map(Value::from)
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), HostError> {
        let type_name = Fact::type_name(self).to_string();
        match self.as_object_mut() {
            Some(object) => {
                object.insert(field.to_string(), value.to_json());
                Ok(())
            }
            None => Err(HostError::UnknownMember {
                type_name,
                member: field.to_string(),
            }),
        }
    }

    fn index(&self, key: &Value) -> Result<Value, HostError> {
        match self {
            serde_json::Value::Object(object) => {
                let key = text_key(key)?;
                object
                    .get(key)
                    .map(Value::from)
                    .ok_or_else(|| missing_key(key))
            }
            serde_json::Value::Array(items) => {
                let i = position(key, items.len())?;
                Ok(Value::from(&items[i]))
            }
            _ => Err(HostError::NotIndexable {
                type_name: Fact::type_name(self).to_string(),
            }),
        }
    }

    fn set_index(&mut self, key: &Value, value: Value) -> Result<(), HostError> {
        let type_name = Fact::type_name(self).to_string();
        match self {
            serde_json::Value::Object(object) => {
                let key = text_key(key)?;
                object.insert(key.to_string(), value.to_json());
                Ok(())
            }
            serde_json::Value::Array(items) => {
                let i = position(key, items.len())?;
                items[i] = value.to_json();
                Ok(())
            }
            _ => Err(HostError::NotIndexable { type_name }),
        }
    }

    fn member_mut(&mut self, field: &str) -> Option<&mut dyn Fact> {
        self.as_object_mut()
            .and_then(|object| object.get_mut(field))
            .map(|child| child as &mut dyn Fact)
    }

    fn element_mut(&mut self, key: &Value) -> Option<&mut dyn Fact> {
        match self {
            serde_json::Value::Object(object) => object
                .get_mut(key.as_str()?)
                .map(|child| child as &mut dyn Fact),
            serde_json::Value::Array(items) => {
                let i = usize::try_from(key.as_i64()?).ok()?;
                items.get_mut(i).map(|child| child as &mut dyn Fact)
            }
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::from(self)
    }
}

/// Implement [`Fact`] for a plain struct by mapping rule-language field
/// names to Rust fields.
///
/// ```
/// use ferrule::impl_fact;
///
/// #[derive(Default)]
/// struct Item {
///     name: String,
///     price: i64,
///     discount: i64,
/// }
///
/// impl_fact!(Item {
///     "Name" => name,
///     "Price" => price,
///     "Discount" => discount,
/// });
/// ```
///
/// Fields listed under `nested { .. }` must themselves implement `Fact` and
/// can be navigated into for assignment (`A.Limits["x"] = 1`). A
/// `methods = path` clause routes calls to a function with the signature
/// `fn(&mut Self, &str, &[Value]) -> Result<Value, HostError>`.
#[macro_export]
macro_rules! impl_fact {
    (@call $this:ident, $method:ident, $args:ident, $ty:ty, $dispatch:path) => {
        $dispatch($this, $method, $args)
    };
    (@call $this:ident, $method:ident, $args:ident, $ty:ty) => {{
        let _ = $args;
        ::core::result::Result::Err($crate::HostError::UnknownMethod {
            type_name: ::std::string::String::from(stringify!($ty)),
            method: ::std::string::ToString::to_string($method),
        })
    }};
    (
        $ty:ty {
            $($name:literal => $field:ident),* $(,)?
        }
        $(nested { $($nested_name:literal => $nested_field:ident),* $(,)? })?
        $(methods = $dispatch:path)?
    ) => {
        impl $crate::Fact for $ty {
            fn type_name(&self) -> &str {
                stringify!($ty)
            }

            fn get(&self, field: &str) -> ::core::option::Option<$crate::Value> {
                match field {
                    $($name => ::core::option::Option::Some($crate::ToValue::to_value(&self.$field)),)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set(
                &mut self,
                field: &str,
                value: $crate::Value,
            ) -> ::core::result::Result<(), $crate::HostError> {
                match field {
                    $($name => {
                        self.$field = $crate::FromValue::from_value(value)?;
                        ::core::result::Result::Ok(())
                    })*
                    _ => ::core::result::Result::Err($crate::HostError::UnknownMember {
                        type_name: ::std::string::String::from(stringify!($ty)),
                        member: ::std::string::ToString::to_string(field),
                    }),
                }
            }

            fn member_mut(&mut self, field: &str) -> ::core::option::Option<&mut dyn $crate::Fact> {
                match field {
                    $($($nested_name => ::core::option::Option::Some(&mut self.$nested_field as &mut dyn $crate::Fact),)*)?
                    _ => ::core::option::Option::None,
                }
            }

            fn call(
                &mut self,
                method: &str,
                args: &[$crate::Value],
            ) -> ::core::result::Result<$crate::Value, $crate::HostError> {
                $crate::impl_fact!(@call self, method, args, $ty $(, $dispatch)?)
            }

            #[allow(unused_mut)]
            fn to_value(&self) -> $crate::Value {
                let mut fields = ::std::collections::BTreeMap::new();
                $(fields.insert(::std::string::String::from($name), $crate::ToValue::to_value(&self.$field));)*
                $crate::Value::Map(fields)
            }
        }
    };
}
