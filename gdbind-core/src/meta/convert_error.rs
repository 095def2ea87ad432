/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

use crate::builtin::VariantType;

/// Represents errors that can occur when converting values from the engine.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ConvertError {
    kind: ErrorKind,
}

#[derive(Clone, Eq, PartialEq, Debug)]
enum ErrorKind {
    BadType {
        expected: VariantType,
        actual: VariantType,
    },
    OutOfRange {
        target: VariantType,
        value: i64,
    },
    NullObject {
        class_name: &'static str,
    },
    WrongClass {
        expected: &'static str,
        actual: String,
    },
}

impl ConvertError {
    /// Variant holds `actual` where `expected` was needed.
    pub(crate) fn new(expected: VariantType, actual: VariantType) -> Self {
        Self {
            kind: ErrorKind::BadType { expected, actual },
        }
    }

    /// Integer `value` does not fit into the target type.
    pub(crate) fn out_of_range(target: VariantType, value: i64) -> Self {
        Self {
            kind: ErrorKind::OutOfRange { target, value },
        }
    }

    /// Variant holds a null object, converted to a non-nullable `Gd<T>`.
    pub(crate) fn null_object(class_name: &'static str) -> Self {
        Self {
            kind: ErrorKind::NullObject { class_name },
        }
    }

    /// Variant holds an object of a class not deriving from the expected one.
    pub(crate) fn wrong_class(expected: &'static str, actual: String) -> Self {
        Self {
            kind: ErrorKind::WrongClass { expected, actual },
        }
    }

    /// The variant type the conversion needed.
    pub fn expected_type(&self) -> VariantType {
        match self.kind {
            ErrorKind::BadType { expected, .. } => expected,
            ErrorKind::OutOfRange { target, .. } => target,
            ErrorKind::NullObject { .. } | ErrorKind::WrongClass { .. } => VariantType::Object,
        }
    }

    /// The variant type that was found, if the error is a type mismatch.
    pub fn actual_type(&self) -> Option<VariantType> {
        match self.kind {
            ErrorKind::BadType { actual, .. } => Some(actual),
            _ => None,
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::BadType { expected, actual } => {
                write!(f, "expected type {expected:?}, got {actual:?}")
            }
            ErrorKind::OutOfRange { target, value } => {
                write!(f, "value {value} out of range for {target:?} conversion")
            }
            ErrorKind::NullObject { class_name } => {
                write!(f, "expected object of class {class_name}, got null")
            }
            ErrorKind::WrongClass { expected, actual } => {
                write!(f, "expected object of class {expected}, got {actual}")
            }
        }
    }
}

impl Error for ConvertError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = ConvertError::new(VariantType::Int, VariantType::String);
        assert_eq!(err.to_string(), "expected type Int, got String");
        assert_eq!(err.actual_type(), Some(VariantType::String));
        assert_eq!(err.expected_type(), VariantType::Int);

        let err = ConvertError::wrong_class("Node2D", "Node3D".to_string());
        assert_eq!(err.to_string(), "expected object of class Node2D, got Node3D");
        assert_eq!(err.actual_type(), None);
        assert_eq!(err.expected_type(), VariantType::Object);
    }

    #[test]
    fn out_of_range_message() {
        let err = ConvertError::out_of_range(VariantType::Int, i64::MAX);
        assert!(err.to_string().contains("9223372036854775807"));
    }
}
