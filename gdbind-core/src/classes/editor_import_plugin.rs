/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::{Array, Dictionary, GString};
use crate::classes::ResourceImporter;
use crate::obj::{Constructible, GodotClass};

crate::engine_class! {
    /// Editor-side importer for custom resource formats. Only available from the `Editor` level on.
    pub struct EditorImportPlugin: ResourceImporter, MemRefCounted, Editor;
}

impl Constructible for EditorImportPlugin {}

crate::inherits_transitive_ResourceImporter!(EditorImportPlugin);

/// Virtual methods of `EditorImportPlugin`.
#[allow(unused_variables)]
pub trait IEditorImportPlugin: GodotClass + crate::private::You_forgot_the_attribute__godot_api {
    object_callback_methods!();

    /// Unique name of the importer.
    fn get_importer_name(&self) -> GString {
        unimplemented!()
    }

    /// Name shown in the import dock.
    fn get_visible_name(&self) -> GString {
        unimplemented!()
    }

    fn get_priority(&self) -> f64 {
        unimplemented!()
    }

    fn get_import_order(&self) -> i64 {
        unimplemented!()
    }

    fn get_preset_count(&self) -> i64 {
        unimplemented!()
    }

    /// Imports `source_file` and saves the result under `save_path`; returns an engine error code (0 is OK).
    fn import(
        &self,
        source_file: &GString,
        save_path: &GString,
        options: &Dictionary,
        platform_variants: &Array,
        gen_files: &Array,
    ) -> i64 {
        unimplemented!()
    }

    fn to_string(&self) -> GString {
        unimplemented!()
    }
}
