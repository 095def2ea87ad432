/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Builtin payloads: strings, string names, variants, arrays and dictionaries.

use std::ffi::{c_char, c_int};
use std::ptr;

use gdbind::sys;

use super::{read_id, with_engine, write_id, Engine};

/// Value held by a variant.
///
/// Containers refer to shared storage, objects to their pointer.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    StringName(String),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Color([f32; 4]),
    Object(usize),
    Array(u64),
    Dictionary(u64),
}

impl Value {
    pub fn variant_type(&self) -> sys::GDExtensionVariantType {
        match self {
            Value::Nil => sys::GDEXTENSION_VARIANT_TYPE_NIL,
            Value::Bool(_) => sys::GDEXTENSION_VARIANT_TYPE_BOOL,
            Value::Int(_) => sys::GDEXTENSION_VARIANT_TYPE_INT,
            Value::Float(_) => sys::GDEXTENSION_VARIANT_TYPE_FLOAT,
            Value::String(_) => sys::GDEXTENSION_VARIANT_TYPE_STRING,
            Value::StringName(_) => sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME,
            Value::Vector2(_) => sys::GDEXTENSION_VARIANT_TYPE_VECTOR2,
            Value::Vector3(_) => sys::GDEXTENSION_VARIANT_TYPE_VECTOR3,
            Value::Color(_) => sys::GDEXTENSION_VARIANT_TYPE_COLOR,
            Value::Object(_) => sys::GDEXTENSION_VARIANT_TYPE_OBJECT,
            Value::Array(_) => sys::GDEXTENSION_VARIANT_TYPE_ARRAY,
            Value::Dictionary(_) => sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY,
        }
    }
}

/// Variant slot inside a container, with the size of a native variant.
#[repr(C)]
pub(super) struct VariantCell {
    id: u64,
    _pad: [u64; 2],
}

sys::static_assert!(std::mem::size_of::<VariantCell>() == 24);

impl VariantCell {
    fn new(id: u64) -> Box<Self> {
        Box::new(Self { id, _pad: [0; 2] })
    }

    fn as_variant_ptr(&mut self) -> sys::GDExtensionVariantPtr {
        self as *mut Self as sys::GDExtensionVariantPtr
    }
}

#[derive(Default)]
pub(super) struct ArrayStorage {
    refs: usize,
    items: Vec<Box<VariantCell>>,
}

#[derive(Default)]
pub(super) struct DictStorage {
    refs: usize,
    entries: Vec<(Box<VariantCell>, Box<VariantCell>)>,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Engine-side bookkeeping

impl Engine {
    pub(super) fn new_string(&mut self, text: String) -> u64 {
        let id = self.next_id();
        self.strings.insert(id, text);
        id
    }

    pub(super) fn string_text(&mut self, id: u64) -> String {
        match self.strings.get(&id) {
            Some(text) => text.clone(),
            None => {
                self.violation(format!("use of dead or unknown String {id}"));
                String::new()
            }
        }
    }

    pub(super) fn destroy_string(&mut self, id: u64) {
        if id != 0 && self.strings.remove(&id).is_none() {
            self.violation(format!("double or unknown destroy of String {id}"));
        }
    }

    pub(super) fn new_string_name(&mut self, text: String) -> u64 {
        let id = self.next_id();
        self.string_names.insert(id, text);
        id
    }

    pub(super) fn string_name_text(&mut self, id: u64) -> String {
        match self.string_names.get(&id) {
            Some(text) => text.clone(),
            None => {
                self.violation(format!("use of dead or unknown StringName {id}"));
                String::new()
            }
        }
    }

    pub(super) fn destroy_string_name(&mut self, id: u64) {
        if id != 0 && self.string_names.remove(&id).is_none() {
            self.violation(format!("double or unknown destroy of StringName {id}"));
        }
    }

    /// Stores `value`, whose references must already be accounted for.
    pub(super) fn new_variant(&mut self, value: Value) -> u64 {
        let id = self.next_id();
        self.variants.insert(id, value);
        id
    }

    pub(super) fn variant_value(&mut self, id: u64) -> Value {
        match self.variants.get(&id) {
            Some(value) => value.clone(),
            None => {
                self.violation(format!("use of dead or unknown Variant {id}"));
                Value::Nil
            }
        }
    }

    /// New variant holding a copy of variant `id`.
    pub(super) fn copy_variant(&mut self, id: u64) -> u64 {
        let value = self.variant_value(id);
        self.retain(&value);
        self.new_variant(value)
    }

    pub(super) fn destroy_variant(&mut self, id: u64) {
        if id == 0 {
            return;
        }

        match self.variants.remove(&id) {
            Some(value) => self.release(value),
            None => self.violation(format!("double or unknown destroy of Variant {id}")),
        }
    }

    /// Accounts for one more holder of `value`.
    pub(super) fn retain(&mut self, value: &Value) {
        match *value {
            Value::Array(storage) => {
                if let Some(storage) = self.array_storage.get_mut(&storage) {
                    storage.refs += 1;
                }
            }
            Value::Dictionary(storage) => {
                if let Some(storage) = self.dictionary_storage.get_mut(&storage) {
                    storage.refs += 1;
                }
            }
            Value::Object(object) if object != 0 && self.is_ref_counted(object) => {
                self.reference(object);
            }
            _ => {}
        }
    }

    /// Drops one holder of `value`; frees shared storage or objects that are no longer referenced.
    pub(super) fn release(&mut self, value: Value) {
        match value {
            Value::Array(storage) => self.release_array_storage(storage),
            Value::Dictionary(storage) => self.release_dictionary_storage(storage),
            Value::Object(object) if object != 0 && self.is_ref_counted(object) => {
                if self.unreference(object) {
                    self.pending_destroy.push(object);
                }
            }
            _ => {}
        }
    }

    // Arrays

    pub(super) fn new_array_storage(&mut self) -> u64 {
        let id = self.next_id();
        self.array_storage.insert(id, ArrayStorage::default());
        id
    }

    /// New handle on existing storage.
    pub(super) fn new_array_handle(&mut self, storage: u64) -> u64 {
        self.retain(&Value::Array(storage));
        let id = self.next_id();
        self.arrays.insert(id, storage);
        id
    }

    pub(super) fn new_array(&mut self) -> u64 {
        let storage = self.new_array_storage();
        self.new_array_handle(storage)
    }

    pub(super) fn array_storage_of(&mut self, handle: u64) -> Option<u64> {
        let storage = self.arrays.get(&handle).copied();
        if storage.is_none() {
            self.violation(format!("use of dead or unknown Array {handle}"));
        }
        storage
    }

    pub(super) fn destroy_array(&mut self, handle: u64) {
        match self.arrays.remove(&handle) {
            Some(storage) => self.release_array_storage(storage),
            None => self.violation(format!("double or unknown destroy of Array {handle}")),
        }
    }

    pub(super) fn array_push(&mut self, storage: u64, value: Value) {
        let variant = self.new_variant(value);
        match self.array_storage.get_mut(&storage) {
            Some(array) => array.items.push(VariantCell::new(variant)),
            None => self.violation(format!("push into freed array storage {storage}")),
        }
    }

    fn array_clear(&mut self, storage: u64) {
        let items = match self.array_storage.get_mut(&storage) {
            Some(array) => std::mem::take(&mut array.items),
            None => return,
        };

        for item in items {
            self.destroy_variant(item.id);
        }
    }

    fn release_array_storage(&mut self, storage: u64) {
        let Some(array) = self.array_storage.get_mut(&storage) else {
            self.violation(format!("release of freed array storage {storage}"));
            return;
        };

        array.refs -= 1;
        if array.refs == 0 {
            self.array_clear(storage);
            self.array_storage.remove(&storage);
        }
    }

    // Dictionaries

    pub(super) fn new_dictionary_handle(&mut self, storage: u64) -> u64 {
        self.retain(&Value::Dictionary(storage));
        let id = self.next_id();
        self.dictionaries.insert(id, storage);
        id
    }

    pub(super) fn new_dictionary(&mut self) -> u64 {
        let storage = self.next_id();
        self.dictionary_storage.insert(storage, DictStorage::default());
        self.new_dictionary_handle(storage)
    }

    pub(super) fn dictionary_storage_of(&mut self, handle: u64) -> Option<u64> {
        let storage = self.dictionaries.get(&handle).copied();
        if storage.is_none() {
            self.violation(format!("use of dead or unknown Dictionary {handle}"));
        }
        storage
    }

    pub(super) fn destroy_dictionary(&mut self, handle: u64) {
        match self.dictionaries.remove(&handle) {
            Some(storage) => self.release_dictionary_storage(storage),
            None => self.violation(format!("double or unknown destroy of Dictionary {handle}")),
        }
    }

    /// Inserts an entry into the dictionary behind `handle`. Values must be owned by the caller.
    pub(super) fn dictionary_insert(&mut self, handle: u64, key: Value, value: Value) {
        let Some(storage) = self.dictionary_storage_of(handle) else {
            return;
        };

        let key = self.new_variant(key);
        let value = self.new_variant(value);
        if let Some(dictionary) = self.dictionary_storage.get_mut(&storage) {
            dictionary.entries.push((VariantCell::new(key), VariantCell::new(value)));
        }
    }

    fn dictionary_find(&self, storage: u64, key: &Value) -> Option<usize> {
        let dictionary = self.dictionary_storage.get(&storage)?;
        dictionary
            .entries
            .iter()
            .position(|(entry_key, _)| self.variants.get(&entry_key.id) == Some(key))
    }

    fn dictionary_clear(&mut self, storage: u64) {
        let entries = match self.dictionary_storage.get_mut(&storage) {
            Some(dictionary) => std::mem::take(&mut dictionary.entries),
            None => return,
        };

        for (key, value) in entries {
            self.destroy_variant(key.id);
            self.destroy_variant(value.id);
        }
    }

    fn release_dictionary_storage(&mut self, storage: u64) {
        let Some(dictionary) = self.dictionary_storage.get_mut(&storage) else {
            self.violation(format!("release of freed dictionary storage {storage}"));
            return;
        };

        dictionary.refs -= 1;
        if dictionary.refs == 0 {
            self.dictionary_clear(storage);
            self.dictionary_storage.remove(&storage);
        }
    }

    // Return slots hold an initialized value of the library; assigning replaces it.

    pub(super) unsafe fn assign_string(&mut self, slot: sys::GDExtensionTypePtr, text: String) {
        self.destroy_string(read_id(slot));
        let id = self.new_string(text);
        write_id(slot, id);
    }

    pub(super) unsafe fn assign_string_name(&mut self, slot: sys::GDExtensionTypePtr, text: String) {
        self.destroy_string_name(read_id(slot));
        let id = self.new_string_name(text);
        write_id(slot, id);
    }

    /// `value` must be owned by the caller.
    pub(super) unsafe fn assign_variant(&mut self, slot: sys::GDExtensionTypePtr, value: Value) {
        self.destroy_variant(read_id(slot));
        let id = self.new_variant(value);
        write_id(slot, id);
    }

    pub(super) unsafe fn assign_array(&mut self, slot: sys::GDExtensionTypePtr, storage: u64) {
        let id = self.new_array_handle(storage);
        self.destroy_array(read_id(slot));
        write_id(slot, id);
    }

    pub(super) unsafe fn assign_dictionary(&mut self, slot: sys::GDExtensionTypePtr, storage: u64) {
        let id = self.new_dictionary_handle(storage);
        self.destroy_dictionary(read_id(slot));
        write_id(slot, id);
    }
}

/// Copies the text of a native string, if `ptr` points to one.
pub(super) unsafe fn string_arg(ptr: sys::GDExtensionConstTypePtr) -> String {
    let id = read_id(ptr);
    with_engine(|e| e.string_text(id))
}

pub(super) unsafe fn string_name_arg(ptr: sys::GDExtensionConstTypePtr) -> String {
    let id = read_id(ptr);
    with_engine(|e| e.string_name_text(id))
}

unsafe fn utf8_text(contents: *const c_char, size: sys::GDExtensionInt) -> String {
    if contents.is_null() || size <= 0 {
        return String::new();
    }

    let bytes = std::slice::from_raw_parts(contents as *const u8, size as usize);
    String::from_utf8_lossy(bytes).into_owned()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions: variants

pub(super) unsafe extern "C" fn variant_new_copy(
    dest: sys::GDExtensionUninitializedVariantPtr,
    src: sys::GDExtensionConstVariantPtr,
) {
    let src = read_id(src);
    let id = with_engine(|e| e.copy_variant(src));
    write_id(dest, id);
}

pub(super) unsafe extern "C" fn variant_new_nil(dest: sys::GDExtensionUninitializedVariantPtr) {
    let id = with_engine(|e| e.new_variant(Value::Nil));
    write_id(dest, id);
}

pub(super) unsafe extern "C" fn variant_destroy(variant: sys::GDExtensionVariantPtr) {
    let id = read_id(variant);
    with_engine(|e| e.destroy_variant(id));
}

pub(super) unsafe extern "C" fn variant_get_type(variant: sys::GDExtensionConstVariantPtr) -> sys::GDExtensionVariantType {
    let id = read_id(variant);
    with_engine(|e| e.variant_value(id).variant_type())
}

unsafe fn store_new_variant(dest: sys::GDExtensionUninitializedVariantPtr, value: Value) {
    let id = with_engine(|e| e.new_variant(value));
    write_id(dest, id);
}

unsafe fn load_value(variant: sys::GDExtensionVariantPtr) -> Value {
    let id = read_id(variant);
    with_engine(|e| e.variant_value(id))
}

fn type_mismatch(expected: &str, actual: &Value) {
    with_engine(|e| e.violation(format!("variant conversion to {expected} from {actual:?}")));
}

macro_rules! plain_converters {
    ($( $to_variant:ident, $from_variant:ident: $Raw:ty => $Variant:ident; )*) => {
        $(
            unsafe extern "C" fn $to_variant(dest: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
                let raw = ptr::read(src as *const $Raw);
                store_new_variant(dest, Value::$Variant(raw));
            }

            unsafe extern "C" fn $from_variant(dest: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
                let raw = match load_value(src) {
                    Value::$Variant(raw) => raw,
                    other => {
                        type_mismatch(stringify!($Variant), &other);
                        <$Raw>::default()
                    }
                };
                ptr::write(dest as *mut $Raw, raw);
            }
        )*
    };
}

plain_converters! {
    int_to_variant, int_from_variant: i64 => Int;
    float_to_variant, float_from_variant: f64 => Float;
    vector2_to_variant, vector2_from_variant: [f32; 2] => Vector2;
    vector3_to_variant, vector3_from_variant: [f32; 3] => Vector3;
    color_to_variant, color_from_variant: [f32; 4] => Color;
}

unsafe extern "C" fn bool_to_variant(dest: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
    let raw = ptr::read(src as *const u8);
    store_new_variant(dest, Value::Bool(raw != 0));
}

unsafe extern "C" fn bool_from_variant(dest: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    let raw = match load_value(src) {
        Value::Bool(value) => value as u8,
        other => {
            type_mismatch("Bool", &other);
            0
        }
    };
    ptr::write(dest as *mut u8, raw);
}

unsafe extern "C" fn string_to_variant(dest: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
    let text = string_arg(src);
    store_new_variant(dest, Value::String(text));
}

unsafe extern "C" fn string_from_variant(dest: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    let text = match load_value(src) {
        Value::String(text) => text,
        other => {
            type_mismatch("String", &other);
            String::new()
        }
    };
    let id = with_engine(|e| e.new_string(text));
    write_id(dest, id);
}

unsafe extern "C" fn string_name_to_variant(dest: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
    let text = string_name_arg(src);
    store_new_variant(dest, Value::StringName(text));
}

unsafe extern "C" fn string_name_from_variant(dest: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    let text = match load_value(src) {
        Value::StringName(text) => text,
        other => {
            type_mismatch("StringName", &other);
            String::new()
        }
    };
    let id = with_engine(|e| e.new_string_name(text));
    write_id(dest, id);
}

/// Object variants of reference-counted objects hold a reference, like `Ref<T>`.
unsafe extern "C" fn object_to_variant(dest: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
    let object = ptr::read(src as *const usize);
    let id = with_engine(|e| {
        if object != 0 && e.is_ref_counted(object) {
            e.init_ref(object);
        }
        e.new_variant(Value::Object(object))
    });
    write_id(dest, id);
}

unsafe extern "C" fn object_from_variant(dest: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    let object = match load_value(src) {
        Value::Object(object) => object,
        other => {
            type_mismatch("Object", &other);
            0
        }
    };
    ptr::write(dest as *mut usize, object);
}

unsafe extern "C" fn array_to_variant(dest: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
    let handle = read_id(src);
    let id = with_engine(|e| {
        let value = match e.array_storage_of(handle) {
            Some(storage) => Value::Array(storage),
            None => Value::Nil,
        };
        e.retain(&value);
        e.new_variant(value)
    });
    write_id(dest, id);
}

unsafe extern "C" fn array_from_variant(dest: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    let id = match load_value(src) {
        Value::Array(storage) => with_engine(|e| e.new_array_handle(storage)),
        other => {
            type_mismatch("Array", &other);
            with_engine(|e| e.new_array())
        }
    };
    write_id(dest, id);
}

unsafe extern "C" fn dictionary_to_variant(dest: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
    let handle = read_id(src);
    let id = with_engine(|e| {
        let value = match e.dictionary_storage_of(handle) {
            Some(storage) => Value::Dictionary(storage),
            None => Value::Nil,
        };
        e.retain(&value);
        e.new_variant(value)
    });
    write_id(dest, id);
}

unsafe extern "C" fn dictionary_from_variant(dest: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    let id = match load_value(src) {
        Value::Dictionary(storage) => with_engine(|e| e.new_dictionary_handle(storage)),
        other => {
            type_mismatch("Dictionary", &other);
            with_engine(|e| e.new_dictionary())
        }
    };
    write_id(dest, id);
}

pub(super) unsafe extern "C" fn get_variant_from_type_constructor(
    ty: sys::GDExtensionVariantType,
) -> sys::GDExtensionVariantFromTypeConstructorFunc {
    match ty {
        sys::GDEXTENSION_VARIANT_TYPE_BOOL => Some(bool_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_INT => Some(int_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_FLOAT => Some(float_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_STRING => Some(string_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_VECTOR2 => Some(vector2_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_VECTOR3 => Some(vector3_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_COLOR => Some(color_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME => Some(string_name_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_OBJECT => Some(object_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY => Some(dictionary_to_variant),
        sys::GDEXTENSION_VARIANT_TYPE_ARRAY => Some(array_to_variant),
        _ => None,
    }
}

pub(super) unsafe extern "C" fn get_variant_to_type_constructor(
    ty: sys::GDExtensionVariantType,
) -> sys::GDExtensionTypeFromVariantConstructorFunc {
    match ty {
        sys::GDEXTENSION_VARIANT_TYPE_BOOL => Some(bool_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_INT => Some(int_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_FLOAT => Some(float_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_STRING => Some(string_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_VECTOR2 => Some(vector2_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_VECTOR3 => Some(vector3_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_COLOR => Some(color_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME => Some(string_name_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_OBJECT => Some(object_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY => Some(dictionary_from_variant),
        sys::GDEXTENSION_VARIANT_TYPE_ARRAY => Some(array_from_variant),
        _ => None,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions: constructors and destructors of builtin types

unsafe extern "C" fn string_construct_default(base: sys::GDExtensionUninitializedTypePtr, _args: *const sys::GDExtensionConstTypePtr) {
    let id = with_engine(|e| e.new_string(String::new()));
    write_id(base, id);
}

unsafe extern "C" fn string_construct_copy(base: sys::GDExtensionUninitializedTypePtr, args: *const sys::GDExtensionConstTypePtr) {
    let text = string_arg(*args);
    let id = with_engine(|e| e.new_string(text));
    write_id(base, id);
}

unsafe extern "C" fn string_construct_from_string_name(
    base: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let text = string_name_arg(*args);
    let id = with_engine(|e| e.new_string(text));
    write_id(base, id);
}

unsafe extern "C" fn string_name_construct_default(
    base: sys::GDExtensionUninitializedTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
) {
    let id = with_engine(|e| e.new_string_name(String::new()));
    write_id(base, id);
}

unsafe extern "C" fn string_name_construct_copy(base: sys::GDExtensionUninitializedTypePtr, args: *const sys::GDExtensionConstTypePtr) {
    let text = string_name_arg(*args);
    let id = with_engine(|e| e.new_string_name(text));
    write_id(base, id);
}

unsafe extern "C" fn string_name_construct_from_string(
    base: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let text = string_arg(*args);
    let id = with_engine(|e| e.new_string_name(text));
    write_id(base, id);
}

unsafe extern "C" fn array_construct_default(base: sys::GDExtensionUninitializedTypePtr, _args: *const sys::GDExtensionConstTypePtr) {
    let id = with_engine(|e| e.new_array());
    write_id(base, id);
}

/// Copies share their storage, like the engine's copy-on-write arrays that are never written through a copy.
unsafe extern "C" fn array_construct_copy(base: sys::GDExtensionUninitializedTypePtr, args: *const sys::GDExtensionConstTypePtr) {
    let handle = read_id(*args);
    let id = with_engine(|e| match e.array_storage_of(handle) {
        Some(storage) => e.new_array_handle(storage),
        None => e.new_array(),
    });
    write_id(base, id);
}

unsafe extern "C" fn dictionary_construct_default(
    base: sys::GDExtensionUninitializedTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
) {
    let id = with_engine(|e| e.new_dictionary());
    write_id(base, id);
}

unsafe extern "C" fn dictionary_construct_copy(base: sys::GDExtensionUninitializedTypePtr, args: *const sys::GDExtensionConstTypePtr) {
    let handle = read_id(*args);
    let id = with_engine(|e| match e.dictionary_storage_of(handle) {
        Some(storage) => e.new_dictionary_handle(storage),
        None => e.new_dictionary(),
    });
    write_id(base, id);
}

pub(super) unsafe extern "C" fn variant_get_ptr_constructor(
    ty: sys::GDExtensionVariantType,
    index: i32,
) -> sys::GDExtensionPtrConstructor {
    match (ty, index) {
        (sys::GDEXTENSION_VARIANT_TYPE_STRING, 0) => Some(string_construct_default),
        (sys::GDEXTENSION_VARIANT_TYPE_STRING, 1) => Some(string_construct_copy),
        (sys::GDEXTENSION_VARIANT_TYPE_STRING, 2) => Some(string_construct_from_string_name),
        (sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME, 0) => Some(string_name_construct_default),
        (sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME, 1) => Some(string_name_construct_copy),
        (sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME, 2) => Some(string_name_construct_from_string),
        (sys::GDEXTENSION_VARIANT_TYPE_ARRAY, 0) => Some(array_construct_default),
        (sys::GDEXTENSION_VARIANT_TYPE_ARRAY, 1) => Some(array_construct_copy),
        (sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY, 0) => Some(dictionary_construct_default),
        (sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY, 1) => Some(dictionary_construct_copy),
        _ => None,
    }
}

unsafe extern "C" fn string_destroy(base: sys::GDExtensionTypePtr) {
    let id = read_id(base);
    with_engine(|e| e.destroy_string(id));
}

unsafe extern "C" fn string_name_destroy(base: sys::GDExtensionTypePtr) {
    let id = read_id(base);
    with_engine(|e| e.destroy_string_name(id));
}

unsafe extern "C" fn array_destroy(base: sys::GDExtensionTypePtr) {
    let id = read_id(base);
    with_engine(|e| e.destroy_array(id));
}

unsafe extern "C" fn dictionary_destroy(base: sys::GDExtensionTypePtr) {
    let id = read_id(base);
    with_engine(|e| e.destroy_dictionary(id));
}

pub(super) unsafe extern "C" fn variant_get_ptr_destructor(ty: sys::GDExtensionVariantType) -> sys::GDExtensionPtrDestructor {
    match ty {
        sys::GDEXTENSION_VARIANT_TYPE_STRING => Some(string_destroy),
        sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME => Some(string_name_destroy),
        sys::GDEXTENSION_VARIANT_TYPE_ARRAY => Some(array_destroy),
        sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY => Some(dictionary_destroy),
        _ => None,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions: builtin methods

const HASH_LENGTH: i64 = 3173160232;
const HASH_PUSH_BACK: i64 = 3316032543;
const HASH_CLEAR: i64 = 3218959716;
const HASH_HAS: i64 = 3680194679;

unsafe extern "C" fn string_length(
    base: sys::GDExtensionTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: c_int,
) {
    let text = string_arg(base);
    ptr::write(ret as *mut i64, text.chars().count() as i64);
}

unsafe extern "C" fn array_size(
    base: sys::GDExtensionTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: c_int,
) {
    let handle = read_id(base);
    let size = with_engine(|e| {
        let storage = e.array_storage_of(handle)?;
        e.array_storage.get(&storage).map(|array| array.items.len())
    });
    ptr::write(ret as *mut i64, size.unwrap_or(0) as i64);
}

unsafe extern "C" fn array_push_back(
    base: sys::GDExtensionTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
    _ret: sys::GDExtensionTypePtr,
    _argc: c_int,
) {
    let handle = read_id(base);
    let element = read_id(*args);
    with_engine(|e| {
        if let Some(storage) = e.array_storage_of(handle) {
            let value = e.variant_value(element);
            e.retain(&value);
            e.array_push(storage, value);
        }
    });
}

unsafe extern "C" fn array_clear_method(
    base: sys::GDExtensionTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
    _ret: sys::GDExtensionTypePtr,
    _argc: c_int,
) {
    let handle = read_id(base);
    with_engine(|e| {
        if let Some(storage) = e.array_storage_of(handle) {
            e.array_clear(storage);
        }
    });
}

unsafe extern "C" fn dictionary_size(
    base: sys::GDExtensionTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: c_int,
) {
    let handle = read_id(base);
    let size = with_engine(|e| {
        let storage = e.dictionary_storage_of(handle)?;
        e.dictionary_storage.get(&storage).map(|dictionary| dictionary.entries.len())
    });
    ptr::write(ret as *mut i64, size.unwrap_or(0) as i64);
}

unsafe extern "C" fn dictionary_has(
    base: sys::GDExtensionTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    _argc: c_int,
) {
    let handle = read_id(base);
    let key = read_id(*args);
    let found = with_engine(|e| {
        let key = e.variant_value(key);
        let storage = e.dictionary_storage_of(handle)?;
        e.dictionary_find(storage, &key)
    });
    ptr::write(ret as *mut u8, found.is_some() as u8);
}

unsafe extern "C" fn dictionary_clear_method(
    base: sys::GDExtensionTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
    _ret: sys::GDExtensionTypePtr,
    _argc: c_int,
) {
    let handle = read_id(base);
    with_engine(|e| {
        if let Some(storage) = e.dictionary_storage_of(handle) {
            e.dictionary_clear(storage);
        }
    });
}

pub(super) unsafe extern "C" fn variant_get_ptr_builtin_method(
    ty: sys::GDExtensionVariantType,
    method: sys::GDExtensionConstStringNamePtr,
    hash: sys::GDExtensionInt,
) -> sys::GDExtensionPtrBuiltInMethod {
    let method = string_name_arg(method);

    match (ty, method.as_str(), hash) {
        (sys::GDEXTENSION_VARIANT_TYPE_STRING, "length", HASH_LENGTH) => Some(string_length),
        (sys::GDEXTENSION_VARIANT_TYPE_ARRAY, "size", HASH_LENGTH) => Some(array_size),
        (sys::GDEXTENSION_VARIANT_TYPE_ARRAY, "push_back", HASH_PUSH_BACK) => Some(array_push_back),
        (sys::GDEXTENSION_VARIANT_TYPE_ARRAY, "clear", HASH_CLEAR) => Some(array_clear_method),
        (sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY, "size", HASH_LENGTH) => Some(dictionary_size),
        (sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY, "has", HASH_HAS) => Some(dictionary_has),
        (sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY, "clear", HASH_CLEAR) => Some(dictionary_clear_method),
        _ => None,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions: strings and container access

pub(super) unsafe extern "C" fn string_new_with_utf8_chars_and_len(
    dest: sys::GDExtensionUninitializedStringPtr,
    contents: *const c_char,
    size: sys::GDExtensionInt,
) {
    let text = utf8_text(contents, size);
    let id = with_engine(|e| e.new_string(text));
    write_id(dest, id);
}

/// Writes at most `max_len` bytes; returns the full length in bytes.
pub(super) unsafe extern "C" fn string_to_utf8_chars(
    string: sys::GDExtensionConstStringPtr,
    text: *mut c_char,
    max_len: sys::GDExtensionInt,
) -> sys::GDExtensionInt {
    let content = string_arg(string);
    let bytes = content.as_bytes();

    if !text.is_null() && max_len > 0 {
        let count = bytes.len().min(max_len as usize);
        ptr::copy_nonoverlapping(bytes.as_ptr(), text as *mut u8, count);
    }
    bytes.len() as sys::GDExtensionInt
}

pub(super) unsafe extern "C" fn string_name_new_with_utf8_chars_and_len(
    dest: sys::GDExtensionUninitializedStringNamePtr,
    contents: *const c_char,
    size: sys::GDExtensionInt,
) {
    let text = utf8_text(contents, size);
    let id = with_engine(|e| e.new_string_name(text));
    write_id(dest, id);
}

pub(super) unsafe extern "C" fn array_operator_index(
    array: sys::GDExtensionTypePtr,
    index: sys::GDExtensionInt,
) -> sys::GDExtensionVariantPtr {
    let handle = read_id(array);
    with_engine(|e| {
        let storage = e.array_storage_of(handle)?;
        let array = e.array_storage.get_mut(&storage)?;
        let len = array.items.len();
        let cell = usize::try_from(index)
            .ok()
            .and_then(|index| array.items.get_mut(index))
            .map(|cell| cell.as_variant_ptr());

        if cell.is_none() {
            e.violation(format!("array index {index} out of bounds (size {len})"));
        }
        cell
    })
    .unwrap_or(ptr::null_mut())
}

/// Returns the value slot of `key`, inserting a nil entry if absent.
pub(super) unsafe extern "C" fn dictionary_operator_index(
    dictionary: sys::GDExtensionTypePtr,
    key: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionVariantPtr {
    let handle = read_id(dictionary);
    let key = read_id(key);

    with_engine(|e| {
        let storage = e.dictionary_storage_of(handle)?;
        let key = e.variant_value(key);

        let index = match e.dictionary_find(storage, &key) {
            Some(index) => index,
            None => {
                e.retain(&key);
                let key = e.new_variant(key);
                let value = e.new_variant(Value::Nil);

                let entries = &mut e.dictionary_storage.get_mut(&storage)?.entries;
                entries.push((VariantCell::new(key), VariantCell::new(value)));
                entries.len() - 1
            }
        };

        let entry = e.dictionary_storage.get_mut(&storage)?.entries.get_mut(index)?;
        Some(entry.1.as_variant_ptr())
    })
    .unwrap_or(ptr::null_mut())
}

pub(super) unsafe extern "C" fn dictionary_operator_index_const(
    dictionary: sys::GDExtensionConstTypePtr,
    key: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionVariantPtr {
    let handle = read_id(dictionary);
    let key = read_id(key);

    with_engine(|e| {
        let storage = e.dictionary_storage_of(handle)?;
        let key = e.variant_value(key);
        let index = e.dictionary_find(storage, &key)?;

        let entry = e.dictionary_storage.get_mut(&storage)?.entries.get_mut(index)?;
        Some(entry.1.as_variant_ptr())
    })
    .unwrap_or(ptr::null_mut())
}
