// tests/node_runtime.rs
//
// Compiled programs run under node together with the list runtime. Each
// test passes without running anything when node is not installed.

use std::io::Write;
use std::process::{Command, Stdio};

use lisp2js::runtime::with_prelude;
use lisp2js::Session;

fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Compiles `program` in a fresh session and returns what node prints.
fn run(program: &str) -> Option<Vec<String>> {
    if !node_available() {
        eprintln!("node not found, skipping");
        return None;
    }
    let mut session = Session::new();
    let code = session.compile(program, false).unwrap();
    assert!(session.diagnostics().is_empty(), "{:?}", session.diagnostics());

    let mut child = Command::new("node")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(with_prelude(&code).as_bytes())
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(
        out.status.success(),
        "node rejected:\n{}\n{}",
        code,
        String::from_utf8_lossy(&out.stderr)
    );
    Some(
        String::from_utf8(out.stdout)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect(),
    )
}

#[test]
fn loop_computes_factorial() {
    let Some(printed) = run(
        "(def fact (loop [i 10 acc 1] (if (= i 0) acc (recur (- i 1) (* i acc)))))
         (console.log fact)",
    ) else {
        return;
    };
    assert_eq!(printed, ["3628800"]);
}

#[test]
fn keyword_defaults_and_overrides() {
    let Some(printed) = run(
        "(defn add [{:a 1 :b 2}] (+ a b))
         (console.log (add))
         (console.log (add :a 3 :b 4))
         (console.log (add :b 2 :a 2))",
    ) else {
        return;
    };
    assert_eq!(printed, ["3", "7", "4"]);
}

#[test]
fn super_calls_reach_the_parent_once() {
    let Some(printed) = run(
        "(class Animal
           :constructor (fn [legs] (set! this.legs legs))
           :speak (fn [] (console.log \"Animal\") this.legs))
         (class Dog extends Animal
           :constructor (fn [legs] (super legs))
           :speak (fn [] (console.log \"Dog\") (super.speak)))
         (def rex (new Dog 4))
         (console.log (rex.speak))",
    ) else {
        return;
    };
    assert_eq!(printed, ["Dog", "Animal", "4"]);
}

#[test]
fn quoted_data_prints_in_list_notation() {
    let Some(printed) = run("(console.log (String '(a 1 2 [b 1] . c)))") else {
        return;
    };
    assert_eq!(printed, ["(a, 1, 2, [b,1] . c)"]);
}

#[test]
fn expanded_macros_run() {
    let Some(printed) = run(
        "(defmacro inc [x] (list '+ x 1))
         (defmacro unless [c . body] `(if (not ~c) (do ~@body)))
         (unless false (console.log (inc 12)))",
    ) else {
        return;
    };
    assert_eq!(printed, ["13"]);
}
