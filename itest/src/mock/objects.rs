/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Objects, the class database and extension-class registration.

use std::ffi::c_void;
use std::ptr;

use gdbind::obj::InstanceId;
use gdbind::sys;

use super::values::{string_arg, string_name_arg};
use super::{library_ptr, with_engine, write_id, Engine};

/// Engine classes known to the mock, parent before child.
struct EngineClassDef {
    name: &'static str,
    parent: Option<&'static str>,
    instantiable: bool,
}

const ENGINE_CLASSES: &[EngineClassDef] = &[
    EngineClassDef { name: "Object", parent: None, instantiable: true },
    EngineClassDef { name: "RefCounted", parent: Some("Object"), instantiable: true },
    EngineClassDef { name: "Node", parent: Some("Object"), instantiable: true },
    EngineClassDef { name: "CanvasItem", parent: Some("Node"), instantiable: false },
    EngineClassDef { name: "Node2D", parent: Some("CanvasItem"), instantiable: true },
    EngineClassDef { name: "Sprite2D", parent: Some("Node2D"), instantiable: true },
    EngineClassDef { name: "Node3D", parent: Some("Node"), instantiable: true },
    EngineClassDef { name: "ResourceImporter", parent: Some("RefCounted"), instantiable: false },
    EngineClassDef { name: "EditorImportPlugin", parent: Some("ResourceImporter"), instantiable: true },
    EngineClassDef { name: "Echo", parent: Some("RefCounted"), instantiable: true },
];

fn engine_class(name: &str) -> Option<&'static EngineClassDef> {
    ENGINE_CLASSES.iter().find(|class| class.name == name)
}

/// Extension class, as registered by the library.
pub(super) struct ExtensionClass {
    pub parent: String,
    pub is_abstract: bool,
    pub create: sys::GDExtensionClassCreateInstance,
    pub free: sys::GDExtensionClassFreeInstance,
    pub get_virtual: sys::GDExtensionClassGetVirtual,
    pub callbacks: ObjectCallbacks,
    pub userdata: usize,
    pub methods: Vec<ExtensionMethod>,
}

/// Per-instance callbacks of an extension class.
#[derive(Copy, Clone)]
pub(super) struct ObjectCallbacks {
    pub set: sys::GDExtensionClassSet,
    pub get: sys::GDExtensionClassGet,
    pub get_property_list: sys::GDExtensionClassGetPropertyList,
    pub free_property_list: sys::GDExtensionClassFreePropertyList,
    pub property_can_revert: sys::GDExtensionClassPropertyCanRevert,
    pub property_get_revert: sys::GDExtensionClassPropertyGetRevert,
    pub notification: sys::GDExtensionClassNotification,
    pub reference: sys::GDExtensionClassReference,
    pub unreference: sys::GDExtensionClassUnreference,
}

/// Property record, copied out of a `GDExtensionPropertyInfo`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct RegisteredProperty {
    pub name: String,
    pub variant_type: sys::GDExtensionVariantType,
    pub class_name: String,
    pub hint: u32,
    pub hint_string: String,
    pub usage: u32,
}

impl RegisteredProperty {
    /// # Safety
    /// All pointers of `info` must point to live values. Not to be called while the engine lock is held.
    pub(super) unsafe fn read(info: &sys::GDExtensionPropertyInfo) -> Self {
        Self {
            name: string_name_arg(info.name),
            variant_type: info.type_,
            class_name: string_name_arg(info.class_name),
            hint: info.hint,
            hint_string: string_arg(info.hint_string),
            usage: info.usage,
        }
    }
}

/// Method registered with `classdb_register_extension_class_method`.
#[derive(Clone)]
pub(super) struct ExtensionMethod {
    pub name: String,
    pub is_static: bool,
    pub call: sys::GDExtensionClassMethodCall,
    pub ptrcall: sys::GDExtensionClassMethodPtrCall,
    pub userdata: usize,
    pub return_value: Option<RegisteredProperty>,
    pub arguments: Vec<RegisteredProperty>,
}

/// Extension instance attached to an object by `object_set_instance`.
pub(super) struct ExtensionInstance {
    pub class_name: String,
    pub instance: usize,
    free: sys::GDExtensionClassFreeInstance,
    userdata: usize,
}

/// Reference count with the engine's "initial reference" semantics.
#[derive(Copy, Clone, Debug)]
pub(super) struct RefCount {
    pub count: u32,
    init_pending: bool,
}

/// Address of an object. Boxes are leaked, so that a pointer is never reused by a later object.
#[repr(C)]
struct ObjectHeader {
    _id: u64,
}

pub(super) struct MockObject {
    pub id: u64,
    pub class: &'static str,
    pub extension: Option<ExtensionInstance>,
    pub binding: Option<(usize, usize)>,
    pub refcount: Option<RefCount>,

    pub name: String,
    pub process_priority: i64,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
    pub groups: Vec<String>,
    pub meta: Vec<(String, u64)>,
    pub position_2d: [f32; 2],
    pub rotation: f64,
    pub position_3d: [f32; 3],
    pub modulate: [f32; 4],
    pub visible: bool,
    pub echo_value: i64,
}

impl MockObject {
    /// Most derived class: the extension class if there is one.
    pub fn class_name(&self) -> &str {
        match &self.extension {
            Some(extension) => &extension.class_name,
            None => self.class,
        }
    }
}

/// Object as seen by tests: pointer plus instance ID.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ObjectHandle {
    ptr: usize,
    id: u64,
}

impl ObjectHandle {
    pub(super) fn ptr(self) -> usize {
        self.ptr
    }

    pub fn id(self) -> u64 {
        self.id
    }

    pub fn instance_id(self) -> InstanceId {
        InstanceId::from_u64(self.id)
    }

    pub fn sys(self) -> sys::GDExtensionObjectPtr {
        self.ptr as sys::GDExtensionObjectPtr
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Engine-side bookkeeping

impl Engine {
    pub(super) fn handle_of(&self, object: usize) -> Option<ObjectHandle> {
        self.objects.get(&object).map(|obj| ObjectHandle { ptr: object, id: obj.id })
    }

    pub(super) fn parent_class(&self, class_name: &str) -> Option<String> {
        if let Some(class) = self.extension_classes.get(class_name) {
            return Some(class.parent.clone());
        }
        engine_class(class_name).and_then(|class| class.parent.map(str::to_string))
    }

    fn class_exists(&self, class_name: &str) -> bool {
        self.extension_classes.contains_key(class_name) || engine_class(class_name).is_some()
    }

    /// `class_name` followed by all its ancestors.
    pub(super) fn class_chain(&self, class_name: &str) -> Vec<String> {
        let mut chain = vec![class_name.to_string()];
        while let Some(parent) = chain.last().and_then(|last| self.parent_class(last)) {
            chain.push(parent);
        }
        chain
    }

    pub(super) fn is_instance_of(&self, object: usize, class_name: &str) -> bool {
        match self.objects.get(&object) {
            Some(obj) => self.class_chain(obj.class_name()).iter().any(|name| name == class_name),
            None => false,
        }
    }

    pub(super) fn is_ref_counted(&self, object: usize) -> bool {
        self.objects.get(&object).is_some_and(|obj| obj.refcount.is_some())
    }

    fn class_tag(&mut self, class_name: &str) -> usize {
        let index = match self.class_tags.iter().position(|name| name == class_name) {
            Some(index) => index,
            None => {
                self.class_tags.push(class_name.to_string());
                self.class_tags.len() - 1
            }
        };

        // Never dereferenced; only compared.
        (index + 1) * 16
    }

    /// Creates an object of an engine class; extension instances are attached separately.
    pub(super) fn alloc_object(&mut self, class: &'static str) -> usize {
        let id = self.next_id();
        let object = Box::into_raw(Box::new(ObjectHeader { _id: id })) as usize;
        let is_ref_counted = self.class_chain(class).iter().any(|name| name == "RefCounted");

        let obj = MockObject {
            id,
            class,
            extension: None,
            binding: None,
            refcount: is_ref_counted.then_some(RefCount {
                count: 1,
                init_pending: true,
            }),
            name: String::new(),
            process_priority: 0,
            children: Vec::new(),
            parent: None,
            groups: Vec::new(),
            meta: Vec::new(),
            position_2d: [0.0; 2],
            rotation: 0.0,
            position_3d: [0.0; 3],
            modulate: [1.0; 4],
            visible: true,
            echo_value: 0,
        };

        self.objects.insert(object, obj);
        self.object_ids.insert(id, object);
        object
    }

    /// Returns `false` if the object is already on its way out.
    pub(super) fn reference(&mut self, object: usize) -> bool {
        let Some(refcount) = self.objects.get_mut(&object).and_then(|obj| obj.refcount.as_mut()) else {
            self.violation(format!("reference() on non-refcounted or dead object {object:#x}"));
            return false;
        };

        if refcount.count == 0 {
            return false;
        }
        refcount.count += 1;

        self.queue_ref_callback(object, |callbacks| callbacks.reference);
        true
    }

    /// Extension classes learn about reference changes through their reference/unreference callbacks; these run once the
    /// lock is released.
    fn queue_ref_callback(
        &mut self,
        object: usize,
        select: fn(&ObjectCallbacks) -> Option<unsafe extern "C" fn(sys::GDExtensionClassInstancePtr)>,
    ) {
        let Some(extension) = self.objects.get(&object).and_then(|obj| obj.extension.as_ref()) else {
            return;
        };

        let instance = extension.instance;
        let callback = self
            .extension_classes
            .get(&extension.class_name)
            .and_then(|class| select(&class.callbacks));

        if let Some(callback) = callback {
            self.pending_ref_callbacks.push((callback, instance));
        }
    }

    /// Method `method_name` of `class_name` or its nearest extension base that registered one.
    pub(super) fn find_method(&self, class_name: &str, method_name: &str) -> Option<&ExtensionMethod> {
        let chain = self.class_chain(class_name);

        chain
            .iter()
            .filter_map(|class| self.extension_classes.get(class))
            .find_map(|class| class.methods.iter().find(|method| method.name == method_name))
    }

    /// Returns whether the last reference is gone; destroying is up to the caller.
    pub(super) fn unreference(&mut self, object: usize) -> bool {
        let Some(refcount) = self.objects.get_mut(&object).and_then(|obj| obj.refcount.as_mut()) else {
            self.violation(format!("unreference() on non-refcounted or dead object {object:#x}"));
            return false;
        };

        match refcount.count.checked_sub(1) {
            Some(count) => {
                refcount.count = count;
                self.queue_ref_callback(object, |callbacks| callbacks.unreference);
                count == 0
            }
            None => {
                self.violation(format!("unreference() below zero on object {object:#x}"));
                false
            }
        }
    }

    /// First reference of a new object replaces the initial one; later calls add a reference.
    pub(super) fn init_ref(&mut self, object: usize) -> bool {
        if !self.reference(object) {
            return false;
        }

        let init_pending = self
            .objects
            .get_mut(&object)
            .and_then(|obj| obj.refcount.as_mut())
            .map(|refcount| std::mem::replace(&mut refcount.init_pending, false))
            .unwrap_or(false);

        if init_pending {
            self.unreference(object);
        }
        true
    }

    pub(super) fn attach_child(&mut self, parent: usize, child: usize) {
        let Some(child_obj) = self.objects.get_mut(&child) else {
            self.violation(format!("add_child() of dead object {child:#x}"));
            return;
        };

        if child_obj.parent.is_some() {
            let id = child_obj.id;
            self.violation(format!("add_child() of object {id} which already has a parent"));
            return;
        }
        child_obj.parent = Some(parent);

        match self.objects.get_mut(&parent) {
            Some(parent) => parent.children.push(child),
            None => self.violation(format!("add_child() on dead object {parent:#x}")),
        }
    }

    pub(super) fn detach_child(&mut self, parent: usize, child: usize) {
        let is_child = self.objects.get(&child).is_some_and(|obj| obj.parent == Some(parent));
        if !is_child {
            self.violation(format!("remove_child() of object {child:#x}, which is not a child"));
            return;
        }

        if let Some(child) = self.objects.get_mut(&child) {
            child.parent = None;
        }
        if let Some(parent) = self.objects.get_mut(&parent) {
            parent.children.retain(|c| *c != child);
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Construction and destruction (outside the lock: both may call into the library)

/// Instantiates `class_name`: extension classes through their create callback, engine classes directly.
pub(super) fn construct_by_name(class_name: &str) -> sys::GDExtensionObjectPtr {
    enum Plan {
        Extension(sys::GDExtensionClassCreateInstance, usize),
        Engine(&'static str),
        Fail,
    }

    let plan = with_engine(|e| {
        if let Some(class) = e.extension_classes.get(class_name) {
            if class.is_abstract {
                e.errors.push(format!("Class '{class_name}' is abstract and cannot be instantiated."));
                return Plan::Fail;
            }
            return Plan::Extension(class.create, class.userdata);
        }

        match engine_class(class_name) {
            Some(class) if class.instantiable => Plan::Engine(class.name),
            Some(_) => {
                e.errors.push(format!("Class '{class_name}' is abstract and cannot be instantiated."));
                Plan::Fail
            }
            None => {
                e.errors.push(format!("Class '{class_name}' does not exist."));
                Plan::Fail
            }
        }
    });

    match plan {
        // SAFETY: callback and userdata as registered by the library.
        Plan::Extension(Some(create), userdata) => unsafe { create(userdata as *mut c_void) },
        Plan::Extension(None, _) | Plan::Fail => ptr::null_mut(),
        Plan::Engine(class) => with_engine(|e| e.alloc_object(class)) as sys::GDExtensionObjectPtr,
    }
}

/// Destroys an object: children first, then the extension instance, then the object itself.
pub(super) fn destroy_object(object: usize) {
    let children = with_engine(|e| {
        let Some(obj) = e.objects.get_mut(&object) else {
            e.violation(format!("destroy of dead or unknown object {object:#x}"));
            return None;
        };

        let children = std::mem::take(&mut obj.children);
        if let Some(parent) = obj.parent.take() {
            if let Some(parent) = e.objects.get_mut(&parent) {
                parent.children.retain(|c| *c != object);
            }
        }
        Some(children)
    });

    let Some(children) = children else {
        return;
    };

    for child in children {
        destroy_object(child);
    }

    let extension = with_engine(|e| e.objects.get_mut(&object).and_then(|obj| obj.extension.take()));
    if let Some(ExtensionInstance {
        instance,
        free: Some(free),
        userdata,
        ..
    }) = extension
    {
        // SAFETY: instance created by the library for this object; freed exactly once.
        unsafe { free(userdata as *mut c_void, instance as *mut c_void) };
    }

    with_engine(|e| {
        if let Some(obj) = e.objects.remove(&object) {
            e.object_ids.remove(&obj.id);
            for (_, value) in obj.meta {
                e.destroy_variant(value);
            }
        }
    });
}

/// Creates a copy of a node and its subtree.
pub(super) fn duplicate_object(source: usize) -> usize {
    let Some(class_name) = with_engine(|e| e.objects.get(&source).map(|obj| obj.class_name().to_string())) else {
        return 0;
    };

    let copy = construct_by_name(&class_name) as usize;
    if copy == 0 {
        return 0;
    }

    let children = with_engine(|e| {
        let Some(src) = e.objects.get(&source) else {
            return Vec::new();
        };

        let name = src.name.clone();
        let process_priority = src.process_priority;
        let groups = src.groups.clone();
        let position_2d = src.position_2d;
        let rotation = src.rotation;
        let position_3d = src.position_3d;
        let modulate = src.modulate;
        let visible = src.visible;
        let meta = src.meta.clone();
        let children = src.children.clone();

        let meta: Vec<_> = meta.into_iter().map(|(key, value)| (key, e.copy_variant(value))).collect();

        if let Some(dst) = e.objects.get_mut(&copy) {
            dst.name = name;
            dst.process_priority = process_priority;
            dst.groups = groups;
            dst.position_2d = position_2d;
            dst.rotation = rotation;
            dst.position_3d = position_3d;
            dst.modulate = modulate;
            dst.visible = visible;
            dst.meta = meta;
        }
        children
    });

    for child in children {
        let child_copy = duplicate_object(child);
        if child_copy != 0 {
            with_engine(|e| e.attach_child(copy, child_copy));
        }
    }
    copy
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions: objects

pub(super) unsafe extern "C" fn object_destroy(object: sys::GDExtensionObjectPtr) {
    destroy_object(object as usize);
}

pub(super) unsafe extern "C" fn object_get_instance_id(object: sys::GDExtensionConstObjectPtr) -> sys::GDObjectInstanceID {
    let object = object as usize;
    with_engine(|e| match e.objects.get(&object) {
        Some(obj) => obj.id,
        None => {
            e.violation(format!("instance ID of dead or unknown object {object:#x}"));
            0
        }
    })
}

pub(super) unsafe extern "C" fn object_get_instance_from_id(id: sys::GDObjectInstanceID) -> sys::GDExtensionObjectPtr {
    with_engine(|e| e.object_ids.get(&id).copied().unwrap_or(0)) as sys::GDExtensionObjectPtr
}

pub(super) unsafe extern "C" fn object_cast_to(
    object: sys::GDExtensionConstObjectPtr,
    class_tag: *mut c_void,
) -> sys::GDExtensionObjectPtr {
    let object = object as usize;
    let tag = class_tag as usize;

    let matches = with_engine(|e| {
        let Some(obj) = e.objects.get(&object) else {
            e.violation(format!("cast of dead or unknown object {object:#x}"));
            return false;
        };

        let chain = e.class_chain(obj.class_name());
        tag != 0 && chain.iter().any(|name| e.class_tag(name) == tag)
    });

    if matches {
        object as sys::GDExtensionObjectPtr
    } else {
        ptr::null_mut()
    }
}

pub(super) unsafe extern "C" fn object_get_class_name(
    object: sys::GDExtensionConstObjectPtr,
    library: sys::GDExtensionClassLibraryPtr,
    class_name: sys::GDExtensionUninitializedStringNamePtr,
) -> sys::GDExtensionBool {
    let object = object as usize;

    let name = with_engine(|e| {
        if library != library_ptr() {
            e.violation("object_get_class_name() with foreign library pointer".to_string());
        }

        let name = e.objects.get(&object).map(|obj| obj.class_name().to_string())?;
        Some(e.new_string_name(name))
    });

    match name {
        Some(id) => {
            write_id(class_name, id);
            1
        }
        None => 0,
    }
}

pub(super) unsafe extern "C" fn object_set_instance(
    object: sys::GDExtensionObjectPtr,
    class_name: sys::GDExtensionConstStringNamePtr,
    instance: sys::GDExtensionClassInstancePtr,
) {
    let object = object as usize;
    let class_name = string_name_arg(class_name);

    with_engine(|e| {
        let Some(class) = e.extension_classes.get(&class_name) else {
            e.violation(format!("object_set_instance() with unregistered class {class_name}"));
            return;
        };

        let extension = ExtensionInstance {
            class_name: class_name.clone(),
            instance: instance as usize,
            free: class.free,
            userdata: class.userdata,
        };

        match e.objects.get(&object).map(|obj| obj.extension.is_some()) {
            Some(false) => {
                if let Some(obj) = e.objects.get_mut(&object) {
                    obj.extension = Some(extension);
                }
            }
            Some(true) => e.violation(format!("object {object:#x} already has an extension instance")),
            None => e.violation(format!("object_set_instance() on dead object {object:#x}")),
        }
    });
}

pub(super) unsafe extern "C" fn object_get_instance_binding(
    object: sys::GDExtensionObjectPtr,
    token: *mut c_void,
    _callbacks: *const sys::GDExtensionInstanceBindingCallbacks,
) -> *mut c_void {
    let object = object as usize;
    let token = token as usize;

    let binding = with_engine(|e| {
        let obj = e.objects.get(&object)?;
        match obj.binding {
            Some((bound_token, binding)) if bound_token == token => Some(binding),
            _ => None,
        }
    });
    binding.unwrap_or(0) as *mut c_void
}

pub(super) unsafe extern "C" fn object_set_instance_binding(
    object: sys::GDExtensionObjectPtr,
    token: *mut c_void,
    binding: *mut c_void,
    _callbacks: *const sys::GDExtensionInstanceBindingCallbacks,
) {
    let object = object as usize;

    with_engine(|e| match e.objects.get_mut(&object) {
        Some(obj) => obj.binding = Some((token as usize, binding as usize)),
        None => e.violation(format!("object_set_instance_binding() on dead object {object:#x}")),
    });
}

pub(super) unsafe extern "C" fn ref_get_object(reference: sys::GDExtensionConstRefPtr) -> sys::GDExtensionObjectPtr {
    ptr::read(reference as *const sys::GDExtensionObjectPtr)
}

/// Points a `Ref<T>` slot to `object`, dropping the reference to the previous one.
pub(super) unsafe extern "C" fn ref_set_object(reference: sys::GDExtensionRefPtr, object: sys::GDExtensionObjectPtr) {
    let slot = reference as *mut usize;
    let previous = ptr::read(slot);
    let object = object as usize;

    with_engine(|e| {
        if object != 0 {
            e.init_ref(object);
        }
        if previous != 0 && e.unreference(previous) {
            e.pending_destroy.push(previous);
        }
    });
    ptr::write(slot, object);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions: class database

pub(super) unsafe extern "C" fn classdb_construct_object(class_name: sys::GDExtensionConstStringNamePtr) -> sys::GDExtensionObjectPtr {
    let class_name = string_name_arg(class_name);
    construct_by_name(&class_name)
}

pub(super) unsafe extern "C" fn classdb_get_class_tag(class_name: sys::GDExtensionConstStringNamePtr) -> *mut c_void {
    let class_name = string_name_arg(class_name);

    with_engine(|e| {
        if e.class_exists(&class_name) {
            e.class_tag(&class_name)
        } else {
            0
        }
    }) as *mut c_void
}

pub(super) unsafe extern "C" fn classdb_register_extension_class(
    library: sys::GDExtensionClassLibraryPtr,
    class_name: sys::GDExtensionConstStringNamePtr,
    parent_class_name: sys::GDExtensionConstStringNamePtr,
    info: *const sys::GDExtensionClassCreationInfo,
) {
    let class_name = string_name_arg(class_name);
    let parent = string_name_arg(parent_class_name);
    let info = ptr::read(info);

    with_engine(|e| {
        if library != library_ptr() {
            e.violation(format!("class {class_name} registered with foreign library pointer"));
        }
        if e.class_exists(&class_name) {
            e.violation(format!("class {class_name} registered twice"));
            return;
        }
        if !e.class_exists(&parent) {
            e.violation(format!("class {class_name} registered before its parent {parent}"));
            return;
        }

        if info.get_property_list_func.is_some() && info.free_property_list_func.is_none() {
            e.violation(format!("class {class_name} hands out property lists without a way to free them"));
        }

        let callbacks = ObjectCallbacks {
            set: info.set_func,
            get: info.get_func,
            get_property_list: info.get_property_list_func,
            free_property_list: info.free_property_list_func,
            property_can_revert: info.property_can_revert_func,
            property_get_revert: info.property_get_revert_func,
            notification: info.notification_func,
            reference: info.reference_func,
            unreference: info.unreference_func,
        };

        e.extension_classes.insert(
            class_name,
            ExtensionClass {
                parent,
                is_abstract: info.is_abstract != 0,
                create: info.create_instance_func,
                free: info.free_instance_func,
                get_virtual: info.get_virtual_func,
                callbacks,
                userdata: info.class_userdata as usize,
                methods: Vec::new(),
            },
        );
    });
}

pub(super) unsafe extern "C" fn classdb_register_extension_class_method(
    library: sys::GDExtensionClassLibraryPtr,
    class_name: sys::GDExtensionConstStringNamePtr,
    info: *const sys::GDExtensionClassMethodInfo,
) {
    let class_name = string_name_arg(class_name);
    let info = ptr::read(info);

    // Copied before taking the lock; reading names locks the engine itself.
    let method_name = string_name_arg(info.name);
    let return_value = if info.has_return_value != 0 && !info.return_value_info.is_null() {
        Some(RegisteredProperty::read(&*info.return_value_info))
    } else {
        None
    };

    let arguments: Vec<RegisteredProperty> = if info.argument_count == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(info.arguments_info, info.argument_count as usize)
            .iter()
            .map(|argument| RegisteredProperty::read(argument))
            .collect()
    };

    with_engine(|e| {
        if library != library_ptr() {
            e.violation(format!("method {class_name}::{method_name} registered with foreign library pointer"));
        }
        if info.call_func.is_none() || info.ptrcall_func.is_none() {
            e.violation(format!("method {class_name}::{method_name} registered without call functions"));
        }

        let Some(class) = e.extension_classes.get_mut(&class_name) else {
            e.violation(format!("method {method_name} registered for unknown class {class_name}"));
            return;
        };

        if class.methods.iter().any(|method| method.name == method_name) {
            e.violation(format!("method {class_name}::{method_name} registered twice"));
            return;
        }

        class.methods.push(ExtensionMethod {
            name: method_name,
            is_static: info.method_flags & sys::GDEXTENSION_METHOD_FLAG_STATIC != 0,
            call: info.call_func,
            ptrcall: info.ptrcall_func,
            userdata: info.method_userdata as usize,
            return_value,
            arguments,
        });
    });
}

pub(super) unsafe extern "C" fn classdb_unregister_extension_class(
    library: sys::GDExtensionClassLibraryPtr,
    class_name: sys::GDExtensionConstStringNamePtr,
) {
    let class_name = string_name_arg(class_name);

    with_engine(|e| {
        if library != library_ptr() {
            e.violation(format!("class {class_name} unregistered with foreign library pointer"));
        }

        let has_subclass = e.extension_classes.values().any(|class| class.parent == class_name);
        if has_subclass {
            e.violation(format!("class {class_name} unregistered before its subclasses"));
        }

        match e.extension_classes.remove(&class_name) {
            Some(_) => e.unregistered.push(class_name),
            None => e.violation(format!("unregistering unknown class {class_name}")),
        }
    });
}
