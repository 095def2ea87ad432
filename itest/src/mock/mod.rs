/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! In-process engine behind the C interface.
//!
//! Every function the binding loads through `get_proc_address` is implemented here, backed by plain collections behind
//! one lock. Builtin payloads (strings, variants, containers) store an ID in the first 8 bytes of their opaque storage;
//! objects are leaked boxes whose address is the object pointer, so addresses are never reused.
//!
//! Mistakes a real engine would punish with a crash are recorded as *violations* instead, and tests assert that there
//! are none. Extern functions never panic and never call back into the library while holding the lock.

mod interface;
mod methods;
mod objects;
mod values;

use std::collections::HashMap;
use std::ffi::c_void;
use std::mem;
use std::ptr;
use std::sync::Mutex;

use gdbind::init::InitLevel;
use gdbind::obj::InstanceId;
use gdbind::sys::{self, Global};

pub use objects::{ObjectHandle, RegisteredProperty};
pub use values::Value;

use objects::{ExtensionClass, ExtensionMethod, MockObject, ObjectCallbacks};
use values::{ArrayStorage, DictStorage};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Engine state

#[derive(Default)]
pub(crate) struct Engine {
    next_id: u64,

    strings: HashMap<u64, String>,
    string_names: HashMap<u64, String>,
    variants: HashMap<u64, Value>,

    /// Array handle → shared storage.
    arrays: HashMap<u64, u64>,
    array_storage: HashMap<u64, ArrayStorage>,

    /// Dictionary handle → shared storage.
    dictionaries: HashMap<u64, u64>,
    dictionary_storage: HashMap<u64, DictStorage>,

    objects: HashMap<usize, MockObject>,
    object_ids: HashMap<u64, usize>,
    extension_classes: HashMap<String, ExtensionClass>,
    class_tags: Vec<String>,
    unregistered: Vec<String>,

    /// Objects whose last reference went away while the lock was held.
    pending_destroy: Vec<usize>,

    /// Reference/unreference callbacks of extension instances, with the instance to call them on.
    pending_ref_callbacks: Vec<(unsafe extern "C" fn(sys::GDExtensionClassInstancePtr), usize)>,

    init: Option<InitCallbacks>,
    initialized_levels: Vec<InitLevel>,

    method_bind_requests: HashMap<(String, String), usize>,
    ptrcalls: HashMap<(&'static str, &'static str), usize>,

    errors: Vec<String>,
    warnings: Vec<String>,
    violations: Vec<String>,
}

#[derive(Copy, Clone)]
struct InitCallbacks {
    minimum_level: InitLevel,
    userdata: usize,
    initialize: sys::GDExtensionInitializeCallback,
    deinitialize: sys::GDExtensionInitializeCallback,
}

impl Engine {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn violation(&mut self, message: String) {
        eprintln!("[mock engine] violation: {message}");
        self.violations.push(message);
    }
}

static ENGINE: Global<Engine> = Global::default();

/// Runs `f` on the engine state.
///
/// Reference callbacks queued inside `f` run afterwards, and objects whose last reference was dropped are destroyed
/// after that. Both happen outside the lock, because they call back into the library.
fn with_engine<R>(f: impl FnOnce(&mut Engine) -> R) -> R {
    let (result, ref_callbacks, pending) = {
        let mut engine = ENGINE.lock();
        let result = f(&mut engine);
        (
            result,
            mem::take(&mut engine.pending_ref_callbacks),
            mem::take(&mut engine.pending_destroy),
        )
    };

    for (callback, instance) in ref_callbacks {
        // SAFETY: callback registered by the library for the class of this live instance.
        unsafe { callback(instance as sys::GDExtensionClassInstancePtr) };
    }

    for object in pending {
        objects::destroy_object(object);
    }
    result
}

/// Reads the payload ID stored at the start of an opaque value.
unsafe fn read_id(ptr: *const c_void) -> u64 {
    ptr::read(ptr as *const u64)
}

unsafe fn write_id(ptr: *mut c_void, id: u64) {
    ptr::write(ptr as *mut u64, id)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Configuration

/// Engine capabilities withheld from the library, to exercise startup failures.
#[derive(Clone, Default, Debug)]
pub struct MockConfig {
    /// Interface functions for which `get_proc_address` returns null.
    pub hidden_interface_fns: Vec<&'static str>,

    /// `(class, method)` pairs for which `classdb_get_method_bind` returns null.
    pub hidden_methods: Vec<(&'static str, &'static str)>,
}

static CONFIG: Mutex<Option<MockConfig>> = Mutex::new(None);

/// Replaces the engine configuration. Must happen before the library is loaded.
pub fn configure(config: MockConfig) {
    *CONFIG.lock().unwrap_or_else(|e| e.into_inner()) = Some(config);
}

fn config() -> MockConfig {
    CONFIG.lock().unwrap_or_else(|e| e.into_inner()).clone().unwrap_or_default()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Library lifecycle

/// Token the engine passes as library pointer.
static LIBRARY: u8 = 0;

pub(crate) fn library_ptr() -> sys::GDExtensionClassLibraryPtr {
    &LIBRARY as *const u8 as sys::GDExtensionClassLibraryPtr
}

/// Calls the library's entry point, like the engine does when opening the shared library.
///
/// Returns whether the library accepted to load.
pub fn load_library(entry: sys::GDExtensionInitializationFunction) -> bool {
    let Some(entry) = entry else {
        return false;
    };

    let mut init = sys::GDExtensionInitialization {
        minimum_initialization_level: sys::GDEXTENSION_INITIALIZATION_CORE,
        userdata: ptr::null_mut(),
        initialize: None,
        deinitialize: None,
    };

    // SAFETY: entry point with the signature the engine expects; `init` outlives the call.
    let accepted = unsafe { entry(Some(interface::get_proc_address), library_ptr(), &mut init) };
    if accepted == 0 {
        return false;
    }

    with_engine(|e| {
        e.init = Some(InitCallbacks {
            minimum_level: InitLevel::from_sys(init.minimum_initialization_level),
            userdata: init.userdata as usize,
            initialize: init.initialize,
            deinitialize: init.deinitialize,
        });
    });
    true
}

/// Runs the library's init callback for every level from its minimum up to `up_to`, skipping levels already done.
pub fn initialize_levels(up_to: InitLevel) {
    let Some(init) = with_engine(|e| e.init) else {
        panic!("initialize_levels(): library not loaded");
    };

    for level in up_to.up_to().filter(|level| *level >= init.minimum_level) {
        let already = with_engine(|e| e.initialized_levels.contains(&level));
        if already {
            continue;
        }

        if let Some(initialize) = init.initialize {
            // SAFETY: callback and userdata as handed out by the entry point.
            unsafe { initialize(init.userdata as *mut c_void, level.to_sys()) };
        }
        with_engine(|e| e.initialized_levels.push(level));
    }
}

/// Runs the library's deinit callback for all initialized levels, in reverse order.
pub fn deinitialize_levels() {
    let Some(init) = with_engine(|e| e.init) else {
        return;
    };

    while let Some(level) = with_engine(|e| e.initialized_levels.pop()) {
        if let Some(deinitialize) = init.deinitialize {
            // SAFETY: see initialize_levels().
            unsafe { deinitialize(init.userdata as *mut c_void, level.to_sys()) };
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Objects, as seen from the engine side

/// Instantiates a class the way a script or the scene loader would.
///
/// Reference-counted objects come back with one reference held by the caller; release it with [`release()`].
pub fn instantiate(class_name: &str) -> Option<ObjectHandle> {
    let raw = objects::construct_by_name(class_name) as usize;
    if raw == 0 {
        return None;
    }

    with_engine(|e| {
        if e.is_ref_counted(raw) {
            e.init_ref(raw);
        }
        e.handle_of(raw)
    })
}

/// Drops the engine's reference (reference-counted objects) or frees the object (all others).
pub fn release(object: ObjectHandle) {
    let destroy = with_engine(|e| {
        if !e.objects.contains_key(&object.ptr()) {
            e.violation(format!("release() of dead object {}", object.id()));
            return false;
        }

        if e.is_ref_counted(object.ptr()) {
            e.unreference(object.ptr())
        } else {
            true
        }
    });

    if destroy {
        objects::destroy_object(object.ptr());
    }
}

pub fn is_live(object: ObjectHandle) -> bool {
    with_engine(|e| e.objects.contains_key(&object.ptr()))
}

/// Looks up the engine-side handle of an object.
pub fn handle_of(instance_id: InstanceId) -> Option<ObjectHandle> {
    with_engine(|e| {
        let raw = *e.object_ids.get(&instance_id.to_u64())?;
        e.handle_of(raw)
    })
}

/// Class name of an object as the engine reports it (extension class if any).
pub fn class_of(object: ObjectHandle) -> Option<String> {
    with_engine(|e| e.objects.get(&object.ptr()).map(|obj| obj.class_name().to_string()))
}

pub fn reference_count(object: ObjectHandle) -> Option<u32> {
    with_engine(|e| e.objects.get(&object.ptr()).and_then(|obj| obj.refcount.map(|rc| rc.count)))
}

pub fn children_of(object: ObjectHandle) -> Vec<ObjectHandle> {
    with_engine(|e| {
        let children = e.objects.get(&object.ptr()).map(|obj| obj.children.clone()).unwrap_or_default();
        children.into_iter().filter_map(|child| e.handle_of(child)).collect()
    })
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Virtual calls

/// Asks the library for the virtual method `name` of the object's extension class, and calls it.
///
/// Returns `false` if the library does not implement it, in which case the engine would run its own default.
pub fn call_virtual(
    object: ObjectHandle,
    name: &str,
    args: &[sys::GDExtensionConstTypePtr],
    ret: sys::GDExtensionTypePtr,
) -> bool {
    let target = with_engine(|e| {
        let instance = e.objects.get(&object.ptr())?.extension.as_ref()?;
        let class = e.extension_classes.get(&instance.class_name)?;
        Some((class.get_virtual, class.userdata, instance.instance))
    });

    let Some((Some(get_virtual), userdata, instance)) = target else {
        return false;
    };

    let name_id = with_engine(|e| e.new_string_name(name.to_string()));

    // SAFETY: callback registered by the library, called with the userdata it registered and a live name.
    let function = unsafe { get_virtual(userdata as *mut c_void, &name_id as *const u64 as *const c_void) };
    with_engine(|e| e.destroy_string_name(name_id));

    let Some(function) = function else {
        return false;
    };

    // SAFETY: argument and return slots are laid out as the virtual method's signature requires.
    unsafe { function(instance as *mut c_void, args.as_ptr(), ret) };
    true
}

pub fn call_ready(object: ObjectHandle) -> bool {
    call_virtual(object, "_ready", &[], ptr::null_mut())
}

pub fn call_process(object: ObjectHandle, delta: f64) -> bool {
    call_virtual(object, "_process", &[&delta as *const f64 as sys::GDExtensionConstTypePtr], ptr::null_mut())
}

/// `_to_string()`, or `None` if not overridden.
pub fn call_to_string(object: ObjectHandle) -> Option<String> {
    let mut slot = with_engine(|e| e.new_string(String::new()));
    let called = call_virtual(object, "_to_string", &[], &mut slot as *mut u64 as sys::GDExtensionTypePtr);

    with_engine(|e| {
        let text = called.then(|| e.string_text(slot));
        e.destroy_string(slot);
        text
    })
}

pub fn call_get_priority(object: ObjectHandle) -> Option<f64> {
    let mut priority = 0.0_f64;
    let called = call_virtual(
        object,
        "_get_priority",
        &[],
        &mut priority as *mut f64 as sys::GDExtensionTypePtr,
    );
    called.then_some(priority)
}

pub fn call_get_importer_name(object: ObjectHandle) -> Option<String> {
    let mut slot = with_engine(|e| e.new_string(String::new()));
    let called = call_virtual(
        object,
        "_get_importer_name",
        &[],
        &mut slot as *mut u64 as sys::GDExtensionTypePtr,
    );

    with_engine(|e| {
        let text = called.then(|| e.string_text(slot));
        e.destroy_string(slot);
        text
    })
}

/// `_import(source_file, save_path, options, platform_variants, gen_files)`, with integer options.
pub fn call_import(object: ObjectHandle, source_file: &str, save_path: &str, options: &[(&str, i64)]) -> Option<i64> {
    let (source, save, dictionary, platform_variants, gen_files) = with_engine(|e| {
        let source = e.new_string(source_file.to_string());
        let save = e.new_string(save_path.to_string());

        let dictionary = e.new_dictionary();
        for (key, value) in options {
            e.dictionary_insert(dictionary, Value::String(key.to_string()), Value::Int(*value));
        }

        (source, save, dictionary, e.new_array(), e.new_array())
    });

    let args = [
        &source as *const u64 as sys::GDExtensionConstTypePtr,
        &save as *const u64 as sys::GDExtensionConstTypePtr,
        &dictionary as *const u64 as sys::GDExtensionConstTypePtr,
        &platform_variants as *const u64 as sys::GDExtensionConstTypePtr,
        &gen_files as *const u64 as sys::GDExtensionConstTypePtr,
    ];

    let mut error = -1_i64;
    let called = call_virtual(object, "_import", &args, &mut error as *mut i64 as sys::GDExtensionTypePtr);

    with_engine(|e| {
        e.destroy_string(source);
        e.destroy_string(save);
        e.destroy_dictionary(dictionary);
        e.destroy_array(platform_variants);
        e.destroy_array(gen_files);
    });

    called.then_some(error)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Extension methods

/// Method of an extension class, as registered by the library.
#[derive(Clone, Debug)]
pub struct RegisteredMethod {
    pub name: String,
    pub is_static: bool,
    pub return_value: Option<RegisteredProperty>,
    pub arguments: Vec<RegisteredProperty>,
}

/// Methods the library registered for `class_name` itself, in registration order.
pub fn registered_methods(class_name: &str) -> Vec<RegisteredMethod> {
    with_engine(|e| {
        let Some(class) = e.extension_classes.get(class_name) else {
            return Vec::new();
        };

        class
            .methods
            .iter()
            .map(|method| RegisteredMethod {
                name: method.name.clone(),
                is_static: method.is_static,
                return_value: method.return_value.clone(),
                arguments: method.arguments.clone(),
            })
            .collect()
    })
}

fn call_error(error: sys::GDExtensionCallErrorType) -> sys::GDExtensionCallError {
    sys::GDExtensionCallError {
        error,
        ..Default::default()
    }
}

/// Variant slot with the size of a native variant, holding the payload ID in its first word.
type VariantSlot = [u64; 3];

/// Calls a method registered for the object's class (or an extension base) through its `call_func`, the way a script
/// would: arguments and result are variants.
///
/// Containers and objects in the result are released before returning; only their identity is reported.
pub fn call_method(object: ObjectHandle, method_name: &str, args: &[Value]) -> Result<Value, sys::GDExtensionCallError> {
    let Some(class_name) = class_of(object) else {
        return Err(call_error(sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL));
    };

    let method = with_engine(|e| e.find_method(&class_name, method_name).cloned());
    let instance = with_engine(|e| {
        e.objects
            .get(&object.ptr())
            .and_then(|obj| obj.extension.as_ref())
            .map_or(0, |extension| extension.instance)
    });

    varcall(method, instance, args)
}

/// Calls a static method, without instance.
pub fn call_static_method(class_name: &str, method_name: &str, args: &[Value]) -> Result<Value, sys::GDExtensionCallError> {
    let method = with_engine(|e| e.find_method(class_name, method_name).cloned());
    varcall(method, 0, args)
}

fn varcall(method: Option<ExtensionMethod>, instance: usize, args: &[Value]) -> Result<Value, sys::GDExtensionCallError> {
    let Some(ExtensionMethod {
        call: Some(call),
        userdata,
        ..
    }) = method
    else {
        return Err(call_error(sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD));
    };

    let arg_slots: Vec<VariantSlot> = with_engine(|e| {
        args.iter()
            .map(|value| {
                e.retain(value);
                [e.new_variant(value.clone()), 0, 0]
            })
            .collect()
    });
    let arg_ptrs: Vec<sys::GDExtensionConstVariantPtr> =
        arg_slots.iter().map(|slot| slot.as_ptr() as sys::GDExtensionConstVariantPtr).collect();

    let mut ret: VariantSlot = [with_engine(|e| e.new_variant(Value::Nil)), 0, 0];
    let mut error = sys::GDExtensionCallError::default();

    // SAFETY: call function registered by the library; arguments and result are live variants.
    unsafe {
        call(
            userdata as *mut c_void,
            instance as sys::GDExtensionClassInstancePtr,
            arg_ptrs.as_ptr(),
            arg_ptrs.len() as sys::GDExtensionInt,
            ret.as_mut_ptr() as sys::GDExtensionVariantPtr,
            &mut error,
        )
    };

    let result = with_engine(|e| {
        let result = e.variant_value(ret[0]);
        e.destroy_variant(ret[0]);
        for slot in &arg_slots {
            e.destroy_variant(slot[0]);
        }
        result
    });

    if error.error == sys::GDEXTENSION_CALL_OK {
        Ok(result)
    } else {
        Err(error)
    }
}

/// Calls a method registered for the object's class through its `ptrcall_func`, with native arguments.
///
/// Returns `false` if there is no such method.
pub fn ptrcall_method(
    object: ObjectHandle,
    method_name: &str,
    args: &[sys::GDExtensionConstTypePtr],
    ret: sys::GDExtensionTypePtr,
) -> bool {
    let target = with_engine(|e| {
        let obj = e.objects.get(&object.ptr())?;
        let instance = obj.extension.as_ref()?.instance;
        let method = e.find_method(obj.class_name(), method_name)?;
        Some((method.ptrcall, method.userdata, instance))
    });

    let Some((Some(ptrcall), userdata, instance)) = target else {
        return false;
    };

    // SAFETY: argument and return slots are laid out as the method's signature requires.
    unsafe { ptrcall(userdata as *mut c_void, instance as sys::GDExtensionClassInstancePtr, args.as_ptr(), ret) };
    true
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Object callbacks

fn callbacks_of(object: ObjectHandle) -> Option<(ObjectCallbacks, usize)> {
    with_engine(|e| {
        let extension = e.objects.get(&object.ptr())?.extension.as_ref()?;
        let class = e.extension_classes.get(&extension.class_name)?;
        Some((class.callbacks, extension.instance))
    })
}

/// Runs `f` with a temporary `StringName` holding `name`.
fn with_string_name<R>(name: &str, f: impl FnOnce(sys::GDExtensionConstStringNamePtr) -> R) -> R {
    let id = with_engine(|e| e.new_string_name(name.to_string()));
    let result = f(&id as *const u64 as sys::GDExtensionConstStringNamePtr);
    with_engine(|e| e.destroy_string_name(id));
    result
}

/// Runs a callback filling a variant slot; returns the value if the callback reports success.
fn with_variant_out(f: impl FnOnce(sys::GDExtensionVariantPtr) -> bool) -> Option<Value> {
    let mut slot: VariantSlot = [with_engine(|e| e.new_variant(Value::Nil)), 0, 0];
    let handled = f(slot.as_mut_ptr() as sys::GDExtensionVariantPtr);

    with_engine(|e| {
        let value = e.variant_value(slot[0]);
        e.destroy_variant(slot[0]);
        handled.then_some(value)
    })
}

/// Sends a notification to the object's extension instance. Returns `false` if its class has no notification callback.
pub fn notify(object: ObjectHandle, what: i32) -> bool {
    let Some((ObjectCallbacks { notification: Some(notification), .. }, instance)) = callbacks_of(object) else {
        return false;
    };

    // SAFETY: callback registered by the library for the class of this instance.
    unsafe { notification(instance as sys::GDExtensionClassInstancePtr, what) };
    true
}

/// Property lookup through the class's get callback; `None` if the callback is absent or does not handle `name`.
pub fn get_property(object: ObjectHandle, name: &str) -> Option<Value> {
    let (ObjectCallbacks { get: Some(get), .. }, instance) = callbacks_of(object)? else {
        return None;
    };

    with_string_name(name, |name| {
        with_variant_out(|ret| {
            // SAFETY: callback of the instance's class, with a live name and result slot.
            unsafe { get(instance as sys::GDExtensionClassInstancePtr, name, ret) != 0 }
        })
    })
}

/// Property assignment through the class's set callback. Returns whether the callback handled it.
pub fn set_property(object: ObjectHandle, name: &str, value: Value) -> bool {
    let Some((ObjectCallbacks { set: Some(set), .. }, instance)) = callbacks_of(object) else {
        return false;
    };

    let slot: VariantSlot = [
        with_engine(|e| {
            e.retain(&value);
            e.new_variant(value)
        }),
        0,
        0,
    ];

    let handled = with_string_name(name, |name| {
        // SAFETY: callback of the instance's class, with a live name and value.
        unsafe {
            set(
                instance as sys::GDExtensionClassInstancePtr,
                name,
                slot.as_ptr() as sys::GDExtensionConstVariantPtr,
            ) != 0
        }
    });

    with_engine(|e| e.destroy_variant(slot[0]));
    handled
}

/// Properties the class adds through its property-list callback. The list is handed back to the library right away.
pub fn property_list(object: ObjectHandle) -> Vec<RegisteredProperty> {
    let Some((callbacks, instance)) = callbacks_of(object) else {
        return Vec::new();
    };
    let Some(get_property_list) = callbacks.get_property_list else {
        return Vec::new();
    };

    let instance = instance as sys::GDExtensionClassInstancePtr;
    let mut count = 0_u32;

    // SAFETY: callback of the instance's class.
    let list = unsafe { get_property_list(instance, &mut count) };
    if list.is_null() {
        if count != 0 {
            with_engine(|e| e.violation(format!("null property list with {count} entries")));
        }
        return Vec::new();
    }

    // SAFETY: the library hands out `count` live records, valid until freed.
    let properties = unsafe { std::slice::from_raw_parts(list, count as usize) }
        .iter()
        .map(|info| unsafe { RegisteredProperty::read(info) })
        .collect();

    match callbacks.free_property_list {
        // SAFETY: list handed out by the same class, returned exactly once.
        Some(free_property_list) => unsafe { free_property_list(instance, list) },
        None => with_engine(|e| e.violation("property list handed out without free callback".to_string())),
    }

    properties
}

pub fn property_can_revert(object: ObjectHandle, name: &str) -> bool {
    let Some((ObjectCallbacks { property_can_revert: Some(can_revert), .. }, instance)) = callbacks_of(object) else {
        return false;
    };

    // SAFETY: callback of the instance's class, with a live name.
    with_string_name(name, |name| unsafe { can_revert(instance as sys::GDExtensionClassInstancePtr, name) != 0 })
}

pub fn property_get_revert(object: ObjectHandle, name: &str) -> Option<Value> {
    let (ObjectCallbacks { property_get_revert: Some(get_revert), .. }, instance) = callbacks_of(object)? else {
        return None;
    };

    with_string_name(name, |name| {
        with_variant_out(|ret| {
            // SAFETY: callback of the instance's class, with a live name and result slot.
            unsafe { get_revert(instance as sys::GDExtensionClassInstancePtr, name, ret) != 0 }
        })
    })
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Inspection

/// Live native values, per kind.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
pub struct NativeCounts {
    pub strings: usize,
    pub string_names: usize,
    pub variants: usize,
    pub arrays: usize,
    pub dictionaries: usize,
    pub objects: usize,
}

pub fn native_counts() -> NativeCounts {
    with_engine(|e| NativeCounts {
        strings: e.strings.len(),
        string_names: e.string_names.len(),
        variants: e.variants.len(),
        arrays: e.arrays.len(),
        dictionaries: e.dictionaries.len(),
        objects: e.objects.len(),
    })
}

/// How often the library asked for the method bind of `class.method`.
pub fn method_bind_requests(class_name: &str, method_name: &str) -> usize {
    with_engine(|e| {
        let key = (class_name.to_string(), method_name.to_string());
        e.method_bind_requests.get(&key).copied().unwrap_or(0)
    })
}

/// How often `class.method` was called through ptrcall.
pub fn ptrcall_count(class_name: &str, method_name: &str) -> usize {
    with_engine(|e| {
        e.ptrcalls
            .iter()
            .filter(|((class, method), _)| *class == class_name && *method == method_name)
            .map(|(_, count)| *count)
            .sum()
    })
}

/// Messages the library sent through `print_error`.
pub fn errors() -> Vec<String> {
    with_engine(|e| e.errors.clone())
}

pub fn warnings() -> Vec<String> {
    with_engine(|e| e.warnings.clone())
}

/// Interface misuse detected so far.
pub fn violations() -> Vec<String> {
    with_engine(|e| e.violations.clone())
}

/// Extension classes unregistered so far, in order.
pub fn unregistered_classes() -> Vec<String> {
    with_engine(|e| e.unregistered.clone())
}

/// Extension classes currently registered, with their parent class.
pub fn registered_classes() -> Vec<(String, String)> {
    with_engine(|e| {
        let mut classes: Vec<_> = e
            .extension_classes
            .iter()
            .map(|(name, class)| (name.clone(), class.parent.clone()))
            .collect();
        classes.sort();
        classes
    })
}
