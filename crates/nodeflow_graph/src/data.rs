// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type-erased value storage shared between connected ports.

use crate::error::GraphError;
use std::any::{type_name, Any, TypeId};
use std::fmt;

/// A single type-erased value slot.
///
/// The type tag is fixed at creation and compatibility between two slots is
/// decided by comparing tags, never by inspecting payloads. Two distinct
/// types with identical layout are therefore still incompatible.
pub struct TypedData {
    type_id: TypeId,
    type_name: &'static str,
    value: Option<Box<dyn Any>>,
}

impl TypedData {
    /// Create an empty slot tagged with `T`.
    pub fn empty<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            value: None,
        }
    }

    /// Create a slot tagged with `T` holding `value`.
    pub fn of<T: Any>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            value: Some(Box::new(value)),
        }
    }

    /// Name of the tagged type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// True iff both slots are tagged with the same concrete type.
    pub fn is_same_type(&self, other: &TypedData) -> bool {
        self.type_id == other.type_id
    }

    /// Whether a value has ever been written.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Borrow the payload as `T`.
    pub fn get<T: Any>(&self) -> Result<&T, GraphError> {
        if TypeId::of::<T>() != self.type_id {
            return Err(GraphError::TypeMismatch {
                expected: type_name::<T>(),
                found: self.type_name,
            });
        }
        let boxed = self.value.as_ref().ok_or(GraphError::Empty {
            type_name: self.type_name,
        })?;
        boxed.downcast_ref::<T>().ok_or(GraphError::TypeMismatch {
            expected: type_name::<T>(),
            found: self.type_name,
        })
    }

    /// Store a new payload. The tag never changes, so writing a value of a
    /// different type is rejected.
    pub fn set<T: Any>(&mut self, value: T) -> Result<(), GraphError> {
        if TypeId::of::<T>() != self.type_id {
            return Err(GraphError::TypeMismatch {
                expected: self.type_name,
                found: type_name::<T>(),
            });
        }
        self.value = Some(Box::new(value));
        Ok(())
    }
}

impl fmt::Debug for TypedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedData")
            .field("type", &self.type_name)
            .field("has_value", &self.has_value())
            .finish()
    }
}
