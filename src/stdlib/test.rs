use super::*;
use crate::{t_any, t_float, t_nil, t_string};
use pretty_assertions::assert_eq;

fn find(natives: &[Box<dyn NativeFunction>], name: &str) -> Box<dyn NativeFunction> {
    natives
        .iter()
        .find(|n| n.name() == name)
        .cloned()
        .unwrap_or_else(|| panic!("no native named {}", name))
}

#[test]
fn test_io_signatures() {
    let natives = load("io", &Host::detached()).unwrap();
    let names: Vec<&str> = natives.iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["print", "input"]);

    let print = find(&natives, "print");
    assert_eq!(print.params(), vec![t_any!()]);
    assert_eq!(print.return_type(), t_nil!());
    assert_eq!(print.arity(), 1);

    let input = find(&natives, "input");
    assert_eq!(input.arity(), 0);
    assert_eq!(input.return_type(), t_string!());
}

#[test]
fn test_time_signatures() {
    let natives = load("time", &Host::detached()).unwrap();
    let clock = find(&natives, "clock");
    assert_eq!(clock.arity(), 0);
    assert_eq!(clock.return_type(), t_float!());
}

#[test]
fn test_unknown_library() {
    assert!(load("net", &Host::detached()).is_none());
}

#[test]
fn test_print_writes_display_form() {
    let (host, out) = Host::captured("");
    let natives = load("io", &host).unwrap();
    let print = find(&natives, "print");
    print.call(vec![Value::Int(42)]).unwrap();
    print.call(vec![Value::Float(2.0)]).unwrap();
    print.call(vec![Value::String("hi".to_string())]).unwrap();
    print.call(vec![Value::Nil]).unwrap();
    assert_eq!(String::from_utf8_lossy(&out.borrow()), "42\n2.0\nhi\nnil\n");
}

#[test]
fn test_cloned_native_shares_host() {
    let (host, out) = Host::captured("");
    let print = find(&load("io", &host).unwrap(), "print");
    let copy = print.clone();
    copy.call(vec![Value::Bool(true)]).unwrap();
    assert_eq!(String::from_utf8_lossy(&out.borrow()), "true\n");
}

#[test]
fn test_input_reads_lines() {
    let (host, _) = Host::captured("first\r\nsecond\n");
    let input = find(&load("io", &host).unwrap(), "input");
    assert_eq!(input.call(vec![]).unwrap(), Value::String("first".to_string()));
    assert_eq!(input.call(vec![]).unwrap(), Value::String("second".to_string()));
    // end of input
    assert_eq!(input.call(vec![]).unwrap(), Value::String(String::new()));
}

#[test]
fn test_clock_is_after_epoch() {
    let clock = find(&load("time", &Host::detached()).unwrap(), "clock");
    match clock.call(vec![]).unwrap() {
        Value::Float(seconds) => assert!(seconds > 1_000_000_000.0),
        other => panic!("expected float, got {:?}", other),
    }
}
