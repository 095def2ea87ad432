/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine calls from several threads at once, each with its own objects and call frames.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use gdbind::builtin::GString;
use gdbind::obj::NewGd;
use gdbind::prelude::*;
use gdbind::registry::ClassDb;
use gdbind::sys;
use gdbind_itest::echo::Echo;
use gdbind_itest::{assert_no_violations, boot, mock, serial};

const THREADS: i64 = 4;
const ROUNDS: i64 = 200;

#[derive(GodotClass)]
#[class(base = Node, init)]
struct Ticker {
    #[base]
    base: Base<Node>,
    processed: i64,
}

#[godot_api]
impl INode for Ticker {
    fn process(&mut self, _delta: f64) {
        self.processed += 1;
    }
}

#[test]
fn concurrent_calls_use_separate_frames() {
    boot();

    let workers: Vec<_> = (0..THREADS)
        .map(|worker| {
            thread::spawn(move || {
                assert!(!sys::is_main_thread());
                let mut echo = Echo::new_gd();

                for round in 0..ROUNDS {
                    let value = worker * 1_000_000 + round;
                    assert_eq!(echo.echo_int(value), value);

                    let values: Vec<i64> = (0..16).map(|i| value + i).collect();
                    assert_eq!(echo.sum16(&values), 16 * value + 120);

                    let text = format!("worker {worker} round {round}");
                    assert_eq!(echo.echo_str(&text), GString::from(text.as_str()));

                    echo.set_value(value);
                    assert_eq!(echo.get_value(), value);
                }

                worker
            })
        })
        .collect();

    let mut finished: Vec<i64> = workers
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect();
    finished.sort();

    assert_eq!(finished, (0..THREADS).collect::<Vec<_>>());
    assert_no_violations();
}

#[test]
fn registry_is_readable_from_any_thread() {
    boot();

    let names: Vec<Vec<&'static str>> = thread::scope(|scope| {
        let readers: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| ClassDb::get().ancestors("Echo").map(|record| record.name).collect::<Vec<_>>()))
            .collect();

        readers
            .into_iter()
            .map(|reader| reader.join().expect("reader panicked"))
            .collect()
    });

    for chain in names {
        assert_eq!(chain, ["Echo", "RefCounted", "Object"]);
    }
}

#[test]
fn virtual_call_from_worker_waits_for_bind_on_main() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Ticker").expect("Ticker not instantiable");
    let errors_before = mock::errors().len();
    let mut ticker = Gd::<Ticker>::try_from_instance_id(object.instance_id()).expect("not a Ticker");

    let (started_tx, started_rx) = mpsc::channel();
    let worker = {
        let bound = ticker.bind_mut();

        let worker = thread::spawn(move || {
            started_tx.send(()).expect("main thread gone");
            mock::call_process(object, 0.1)
        });

        started_rx.recv().expect("worker did not start");
        thread::sleep(Duration::from_millis(200));

        // The worker's call is still blocked on the bind.
        assert_eq!(bound.processed, 0);
        worker
    };

    assert!(worker.join().expect("worker panicked"));
    assert_eq!(ticker.bind().processed, 1);
    let new_errors = &mock::errors()[errors_before..];
    assert!(new_errors.is_empty(), "{new_errors:?}");

    drop(ticker);
    mock::release(object);
    assert_no_violations();
}
