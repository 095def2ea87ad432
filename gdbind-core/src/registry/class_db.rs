/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use gdbind_ffi as sys;
use sys::{interface_fn, BindError, InitCell, InitLevel};

use crate::classes::Object;
use crate::handle::Ownership;
use crate::obj::{class_tag, Gd, GodotClass, NoBase};
use crate::registry::plugin::{ClassCallbacks, ClassPlugin, ErasedVirtualFn, PluginItem, StructInfo};

/// Produces a typed `Gd<T>` (boxed as `Any`) for a native object of the record's class.
///
/// # Safety
/// The object must be live and an instance of the record's class; `ownership` must describe the caller's rights.
pub type ErasedFactoryFn = unsafe fn(sys::GDExtensionObjectPtr, Ownership) -> Box<dyn Any>;

/// Whether a class is provided by the engine or implemented in Rust.
#[derive(Copy, Clone, Debug)]
pub enum ClassKind {
    /// Engine class with a hand-written or generated façade. Root of virtual lookup.
    Engine {
        /// Loads the method tables of the class.
        load_tables: fn() -> Result<(), BindError>,
    },

    /// User class, registered with the engine as extension class.
    User {
        create_fn: sys::GDExtensionClassCreateInstance,
        free_fn: sys::GDExtensionClassFreeInstance,
        is_abstract: bool,
    },
}

/// Registration record of one class.
#[derive(Clone)]
pub struct ClassRecord {
    pub name: &'static str,

    /// Name of the direct base class; `None` only for the root class `Object`.
    pub parent: Option<&'static str>,

    pub kind: ClassKind,
    pub factory: ErasedFactoryFn,

    /// Virtual switch of the class's own interface-trait impl, if it has one.
    pub get_virtual: Option<ErasedVirtualFn>,

    /// Object callbacks overridden by the class's own interface-trait impl.
    pub callbacks: ClassCallbacks,

    /// Registers the `#[func]` methods of the class's inherent `#[godot_api]` impls.
    pub register_methods: Vec<fn()>,

    pub type_id: TypeId,
    pub init_level: InitLevel,
}

impl ClassRecord {
    pub fn is_user_class(&self) -> bool {
        matches!(self.kind, ClassKind::User { .. })
    }
}

impl fmt::Debug for ClassRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRecord")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("kind", &self.kind)
            .field("has_virtuals", &self.get_virtual.is_some())
            .field("callbacks", &self.callbacks)
            .field("method_impls", &self.register_methods.len())
            .field("init_level", &self.init_level)
            .finish()
    }
}

/// Engine class of the wrapper layer, as contributed to the class registry.
#[derive(Clone, Debug)]
pub struct EngineClassInfo {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub init_level: InitLevel,
    pub load_tables: fn() -> Result<(), BindError>,
    factory: ErasedFactoryFn,
    type_id: TypeId,
}

impl EngineClassInfo {
    /// Describes engine class `T`, whose method tables are loaded by `load_tables`.
    pub fn of<T: GodotClass>(load_tables: fn() -> Result<(), BindError>) -> Self {
        Self {
            name: T::CLASS_NAME,
            parent: parent_name::<T>(),
            init_level: T::INIT_LEVEL,
            load_tables,
            factory: factory::<T>,
            type_id: TypeId::of::<T>(),
        }
    }

    fn into_record(self) -> ClassRecord {
        ClassRecord {
            name: self.name,
            parent: self.parent,
            kind: ClassKind::Engine {
                load_tables: self.load_tables,
            },
            factory: self.factory,
            get_virtual: None,
            callbacks: ClassCallbacks::default(),
            register_methods: Vec::new(),
            type_id: self.type_id,
            init_level: self.init_level,
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

static CLASS_DB: InitCell<ClassDb> = InitCell::new("class registry");

/// Frozen registry of all classes known to the binding.
pub struct ClassDb {
    records: Vec<ClassRecord>,
    by_name: HashMap<&'static str, usize>,
    by_type: HashMap<TypeId, usize>,
}

impl ClassDb {
    /// Builds the registry from the engine classes and all class plugins, then freezes it.
    ///
    /// # Panics
    /// - If called more than once.
    /// - If a class is declared twice, or derives from a class the registry does not know.
    pub fn initialize(engine_classes: Vec<EngineClassInfo>) {
        let mut builder = RecordsBuilder::default();

        for info in engine_classes {
            builder.add(info.into_record());
        }

        // Impls may be collected before their struct; attach them at the end.
        let mut impls = Vec::new();
        crate::private::iterate_plugins(|plugin: &ClassPlugin| match &plugin.item {
            PluginItem::Struct(info) => builder.add(user_record(plugin, info)),
            item => impls.push((plugin.class_name, item.clone())),
        });

        for (class_name, item) in impls {
            let Some(record) = builder.find_mut(class_name) else {
                panic!("#[godot_api] impl for class {class_name}, which is not registered; missing #[derive(GodotClass)]?");
            };

            match item {
                PluginItem::ITraitImpl(info) => {
                    assert!(
                        record.get_virtual.is_none(),
                        "class {class_name} has more than one interface-trait impl"
                    );
                    record.get_virtual = Some(info.get_virtual_fn);
                    record.callbacks = info.callbacks;
                }
                PluginItem::InherentImpl(info) => record.register_methods.push(info.register_methods_fn),
                PluginItem::Struct(_) => unreachable!(),
            }
        }

        let db = builder.build();
        sys::out!("ClassDb: {} classes registered", db.records.len());
        CLASS_DB.initialize(db);
    }

    /// Returns the frozen registry.
    ///
    /// # Panics
    /// If the registry is not initialized yet.
    pub fn get() -> &'static ClassDb {
        CLASS_DB.get()
    }

    pub fn is_initialized() -> bool {
        CLASS_DB.is_initialized()
    }

    pub fn find(&self, class_name: &str) -> Option<&ClassRecord> {
        self.by_name.get(class_name).map(|&index| &self.records[index])
    }

    pub fn find_by_type<T: GodotClass>(&self) -> Option<&ClassRecord> {
        self.by_type.get(&TypeId::of::<T>()).map(|&index| &self.records[index])
    }

    pub fn records(&self) -> impl Iterator<Item = &ClassRecord> {
        self.records.iter()
    }

    /// Whether `class_name` is `base_name` or derives from it.
    pub fn is_subclass_of(&self, class_name: &str, base_name: &str) -> bool {
        self.ancestors(class_name).any(|record| record.name == base_name)
    }

    /// The class itself, followed by its bases up to the root.
    pub fn ancestors<'a>(&'a self, class_name: &str) -> impl Iterator<Item = &'a ClassRecord> + 'a {
        let mut next = self.find(class_name);

        std::iter::from_fn(move || {
            let current = next?;
            next = current.parent.and_then(|parent| self.find(parent));
            Some(current)
        })
    }

    /// Resolves a virtual method by name, nearest ancestor first.
    ///
    /// Asks the class's own virtual switch, then those of its user-class bases. Engine classes end the lookup: the
    /// engine provides their behavior itself, so `None` is returned.
    pub fn resolve_virtual(&self, class_name: &str, method_name: &str) -> sys::GDExtensionClassCallVirtual {
        for record in self.ancestors(class_name) {
            if !record.is_user_class() {
                break;
            }

            if let Some(get_virtual) = record.get_virtual {
                if let Some(function) = get_virtual(method_name) {
                    sys::out!("resolve virtual {class_name}.{method_name} -> {}", record.name);
                    return Some(function);
                }
            }
        }

        sys::out!("resolve virtual {class_name}.{method_name} -> (engine default)");
        None
    }

    /// Object callbacks of a user class: its own, completed by those of its user-class bases, nearest first.
    pub fn resolve_callbacks(&self, class_name: &str) -> ClassCallbacks {
        self.ancestors(class_name)
            .take_while(|record| record.is_user_class())
            .fold(ClassCallbacks::default(), |resolved, record| resolved.or(&record.callbacks))
    }

    /// Wraps a native object into a typed handle of its class, boxed as `Any`.
    ///
    /// The result downcasts to `Gd<C>`, where `C` is the object's runtime class if registered. Otherwise, `C` is the
    /// nearest registered ancestor, ultimately `Object`.
    ///
    /// # Safety
    /// `raw` must be a live object, and `ownership` must describe the rights passed to the handle.
    pub unsafe fn materialize(&self, raw: sys::GDExtensionObjectPtr, ownership: Ownership) -> Box<dyn Any> {
        let runtime_class = Gd::<Object>::from_obj_sys_borrowed(raw).dynamic_class_name();

        let record = match self.find(&runtime_class) {
            Some(record) => Some(record),
            None => self.nearest_registered_ancestor(raw),
        };

        match record {
            Some(record) => {
                sys::out!("materialize {runtime_class} as {}", record.name);
                (record.factory)(raw, ownership)
            }
            None => Box::new(Gd::<Object>::from_obj_sys_with(raw, ownership)),
        }
    }

    /// Most derived registered class the object can be cast to.
    unsafe fn nearest_registered_ancestor(&self, raw: sys::GDExtensionObjectPtr) -> Option<&ClassRecord> {
        self.records
            .iter()
            .filter(|record| !interface_fn!(object_cast_to)(raw, class_tag(record.name)).is_null())
            .max_by_key(|record| self.ancestors(record.name).count())
    }
}

impl fmt::Debug for ClassDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.records.iter().map(|r| r.name)).finish()
    }
}

#[derive(Default)]
struct RecordsBuilder {
    records: Vec<ClassRecord>,
}

impl RecordsBuilder {
    fn add(&mut self, record: ClassRecord) {
        if self.records.iter().any(|existing| existing.name == record.name) {
            panic!("class {} registered twice", record.name);
        }
        self.records.push(record);
    }

    fn find_mut(&mut self, class_name: &str) -> Option<&mut ClassRecord> {
        self.records.iter_mut().find(|record| record.name == class_name)
    }

    fn build(self) -> ClassDb {
        let by_name: HashMap<_, _> = self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| (record.name, index))
            .collect();

        for record in &self.records {
            if let Some(parent) = record.parent {
                assert!(
                    by_name.contains_key(parent),
                    "class {} derives from {parent}, which is not registered",
                    record.name
                );
            }
        }

        let by_type = self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| (record.type_id, index))
            .collect();

        ClassDb {
            records: self.records,
            by_name,
            by_type,
        }
    }
}

fn user_record(plugin: &ClassPlugin, info: &StructInfo) -> ClassRecord {
    ClassRecord {
        name: plugin.class_name,
        parent: Some(info.base_class_name),
        kind: ClassKind::User {
            create_fn: info.create_fn,
            free_fn: info.free_fn,
            is_abstract: info.is_abstract,
        },
        factory: info.factory,
        get_virtual: None,
        callbacks: ClassCallbacks::default(),
        register_methods: Vec::new(),
        type_id: info.type_id,
        init_level: plugin.init_level,
    }
}

pub(crate) fn parent_name<T: GodotClass>() -> Option<&'static str> {
    if TypeId::of::<T::Base>() == TypeId::of::<NoBase>() {
        None
    } else {
        Some(<T::Base as GodotClass>::CLASS_NAME)
    }
}

pub(crate) unsafe fn factory<T: GodotClass>(raw: sys::GDExtensionObjectPtr, ownership: Ownership) -> Box<dyn Any> {
    Box::new(Gd::<T>::from_obj_sys_with(raw, ownership))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU8, Ordering};

    // Distinct bodies, so the two functions keep distinct addresses.
    static LAST_CALLED: AtomicU8 = AtomicU8::new(0);

    unsafe extern "C" fn impl_a(
        _instance: sys::GDExtensionClassInstancePtr,
        _args: *const sys::GDExtensionConstTypePtr,
        _ret: sys::GDExtensionTypePtr,
    ) {
        LAST_CALLED.store(1, Ordering::Relaxed);
    }

    unsafe extern "C" fn impl_b(
        _instance: sys::GDExtensionClassInstancePtr,
        _args: *const sys::GDExtensionConstTypePtr,
        _ret: sys::GDExtensionTypePtr,
    ) {
        LAST_CALLED.store(2, Ordering::Relaxed);
    }

    fn virtuals_a(name: &str) -> sys::GDExtensionClassCallVirtual {
        match name {
            "_ready" | "_process" => Some(impl_a),
            _ => None,
        }
    }

    fn virtuals_b(name: &str) -> sys::GDExtensionClassCallVirtual {
        match name {
            "_process" => Some(impl_b),
            _ => None,
        }
    }

    unsafe fn no_factory(_: sys::GDExtensionObjectPtr, _: Ownership) -> Box<dyn Any> {
        Box::new(())
    }

    fn record<Tag: 'static>(name: &'static str, parent: Option<&'static str>, user: bool) -> ClassRecord {
        let kind = if user {
            ClassKind::User {
                create_fn: None,
                free_fn: None,
                is_abstract: false,
            }
        } else {
            ClassKind::Engine { load_tables: || Ok(()) }
        };

        ClassRecord {
            name,
            parent,
            kind,
            factory: no_factory,
            get_virtual: None,
            callbacks: ClassCallbacks::default(),
            register_methods: Vec::new(),
            type_id: TypeId::of::<Tag>(),
            init_level: InitLevel::Scene,
        }
    }

    // Object <- Node <- A <- B <- C, where A and B override virtuals and C doesn't.
    fn hierarchy() -> ClassDb {
        let mut builder = RecordsBuilder::default();
        builder.add(record::<[u8; 0]>("Object", None, false));
        builder.add(record::<[u8; 1]>("Node", Some("Object"), false));
        builder.add(record::<[u8; 2]>("A", Some("Node"), true));
        builder.add(record::<[u8; 3]>("B", Some("A"), true));
        builder.add(record::<[u8; 4]>("C", Some("B"), true));

        builder.find_mut("A").unwrap().get_virtual = Some(virtuals_a);
        builder.find_mut("B").unwrap().get_virtual = Some(virtuals_b);
        builder.build()
    }

    fn resolved(db: &ClassDb, class: &str, method: &str) -> Option<usize> {
        db.resolve_virtual(class, method).map(|f| f as usize)
    }

    #[test]
    fn ancestors_walk_to_root() {
        let db = hierarchy();
        let names: Vec<_> = db.ancestors("C").map(|r| r.name).collect();

        assert_eq!(names, ["C", "B", "A", "Node", "Object"]);
        assert!(db.is_subclass_of("C", "Node"));
        assert!(db.is_subclass_of("A", "A"));
        assert!(!db.is_subclass_of("Node", "A"));
        assert_eq!(db.ancestors("Unknown").count(), 0);
    }

    #[test]
    fn virtual_resolves_to_nearest_ancestor() {
        let db = hierarchy();
        let a = impl_a as usize;
        let b = impl_b as usize;

        assert_eq!(resolved(&db, "C", "_process"), Some(b));
        assert_eq!(resolved(&db, "C", "_ready"), Some(a));
        assert_eq!(resolved(&db, "B", "_ready"), Some(a));
        assert_eq!(resolved(&db, "A", "_process"), Some(a));
    }

    #[test]
    fn virtual_lookup_stops_at_engine_class() {
        let db = hierarchy();

        assert_eq!(resolved(&db, "C", "_draw"), None);
        assert_eq!(resolved(&db, "Node", "_ready"), None);
    }

    unsafe extern "C" fn notify_a(_instance: sys::GDExtensionClassInstancePtr, _what: i32) {
        LAST_CALLED.store(3, Ordering::Relaxed);
    }

    unsafe extern "C" fn notify_b(_instance: sys::GDExtensionClassInstancePtr, _what: i32) {
        LAST_CALLED.store(4, Ordering::Relaxed);
    }

    unsafe extern "C" fn free_list(_instance: sys::GDExtensionClassInstancePtr, _list: *const sys::GDExtensionPropertyInfo) {
        LAST_CALLED.store(5, Ordering::Relaxed);
    }

    #[test]
    fn callbacks_are_completed_from_user_bases() {
        let mut db = hierarchy();

        let index = db.by_name["A"];
        db.records[index].callbacks.notification_fn = Some(notify_a);
        db.records[index].callbacks.free_property_list_fn = Some(free_list);

        let index = db.by_name["B"];
        db.records[index].callbacks.notification_fn = Some(notify_b);

        let resolved = db.resolve_callbacks("C");
        assert_eq!(resolved.notification_fn.map(|f| f as usize), Some(notify_b as usize));
        assert_eq!(resolved.free_property_list_fn.map(|f| f as usize), Some(free_list as usize));
        assert!(resolved.get_property_fn.is_none());

        let resolved = db.resolve_callbacks("A");
        assert_eq!(resolved.notification_fn.map(|f| f as usize), Some(notify_a as usize));

        assert!(db.resolve_callbacks("Node").notification_fn.is_none());
    }

    #[test]
    fn lookup_by_type() {
        let db = hierarchy();

        assert_eq!(db.by_type.get(&TypeId::of::<[u8; 3]>()).map(|&i| db.records[i].name), Some("B"));
        assert!(db.find("B").is_some_and(ClassRecord::is_user_class));
        assert!(!db.find("Node").is_some_and(ClassRecord::is_user_class));
    }

    #[test]
    #[should_panic(expected = "class A registered twice")]
    fn duplicate_class_panics() {
        let mut builder = RecordsBuilder::default();
        builder.add(record::<[u8; 0]>("A", None, true));
        builder.add(record::<[u8; 1]>("A", None, true));
    }

    #[test]
    #[should_panic(expected = "class Orphan derives from Missing, which is not registered")]
    fn unknown_parent_panics() {
        let mut builder = RecordsBuilder::default();
        builder.add(record::<[u8; 0]>("Orphan", Some("Missing"), true));
        builder.build();
    }
}
