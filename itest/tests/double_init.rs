/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Loading the library a second time is refused; the first load keeps working.

use gdbind::classes::Node;
use gdbind::obj::NewAlloc;
use gdbind_itest::{assert_no_violations, boot, mock, try_boot};

#[test]
fn second_load_is_refused() {
    boot();

    assert!(!try_boot());

    let errors = mock::errors().join("\n");
    assert!(errors.contains("gdbind binding already initialized"), "errors: {errors}");
    assert!(errors.contains("error when loading GDExtension library"), "errors: {errors}");

    let mut node = Node::new_alloc();
    node.set_name("still_alive");
    assert_eq!(node.get_name(), "still_alive");
    node.free();
    assert_no_violations();
}
