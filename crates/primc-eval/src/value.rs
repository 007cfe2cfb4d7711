//! Runtime values.
//!
//! Every user type, struct or class, lives on the heap behind an
//! [`ObjectRef`]; the evaluator does not model value-type copies.

use indexmap::IndexMap;
use primc_binder::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value produced by the evaluator.
#[derive(Clone)]
pub enum Value {
    Unit,
    Null,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Object(ObjectRef),
    /// A type used as a receiver (`Color.Red`).
    Type(TypeId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Unit,
    Null,
    Bool,
    Int,
    Str,
    Object,
    Type,
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unit => ValueKind::Unit,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Str(_) => ValueKind::Str,
            Value::Object(_) => ValueKind::Object,
            Value::Type(_) => ValueKind::Type,
        }
    }

    #[must_use]
    pub fn str(text: &str) -> Self {
        Value::Str(Rc::from(text))
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Object(o) => write!(f, "object({})", o.borrow().type_name),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
            Value::Object(o) => f.write_str(&o.borrow().type_name),
            Value::Type(id) => write!(f, "{id}"),
        }
    }
}

/// An instance of a user type. Fields of every type in the base chain and
/// the backing fields of captured parameters share one table.
#[derive(Debug)]
pub struct Object {
    pub ty: TypeId,
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    #[must_use]
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.0.borrow().ty
    }

    /// Current value of a stored field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.borrow().fields.get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        let mut object = self.0.borrow_mut();
        if let Some(slot) = object.fields.get_mut(name) {
            *slot = value;
        } else {
            object.fields.insert(name.to_string(), value);
        }
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.0.borrow().fields.keys().cloned().collect()
    }

    #[must_use]
    pub fn borrow(&self) -> std::cell::Ref<'_, Object> {
        self.0.borrow()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let object = self.0.borrow();
        f.debug_struct(&object.type_name)
            .field("fields", &object.fields)
            .finish()
    }
}
