use kea_ir::StringInterner;
use pretty_assertions::assert_eq;

use super::*;
use crate::errors::EvalErrorKind;

#[test]
fn push_pop_tracks_depth() {
    let interner = StringInterner::new();
    let f = interner.intern("f");

    let mut stack = CallStack::new(None);
    assert_eq!(stack.depth(), 0);
    stack.push(f, 1).unwrap();
    stack.push(f, 2).unwrap();
    assert_eq!(stack.depth(), 2);
    stack.pop();
    assert_eq!(stack.depth(), 1);
}

#[test]
fn depth_limit_raises_recursion_error() {
    let interner = StringInterner::new();
    let f = interner.intern("f");

    let mut stack = CallStack::new(Some(2));
    stack.push(f, 1).unwrap();
    stack.push(f, 1).unwrap();
    let err = stack.push(f, 1).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::RecursionLimitExceeded { depth: 2 }
    );
    // The failed push leaves the stack unchanged.
    assert_eq!(stack.depth(), 2);
}

#[test]
fn set_line_updates_innermost_frame_only() {
    let interner = StringInterner::new();
    let main = interner.intern("<module>");
    let f = interner.intern("f");

    let mut stack = CallStack::new(None);
    stack.push(main, 1).unwrap();
    stack.push(f, 10).unwrap();
    stack.set_line(12);

    let capture = stack.capture();
    assert_eq!(capture.frames[0].line, 1);
    assert_eq!(capture.frames[1].line, 12);
}

#[test]
fn render_with_source_quotes_the_frame_lines() {
    let interner = StringInterner::new();
    let main = interner.intern("<module>");

    let mut stack = CallStack::new(None);
    stack.push(main, 2).unwrap();

    let source = "x = 1\ny = x + boom\n";
    let rendered = stack
        .capture()
        .render_with_source(&interner, "main.kea", Some(source));
    assert_eq!(
        rendered,
        "Traceback (most recent call last):\n  File \"main.kea\", line 2, in <module>\n    y = x + boom\n"
    );
}

#[test]
fn render_lists_frames_innermost_last() {
    let interner = StringInterner::new();
    let main = interner.intern("<module>");
    let f = interner.intern("f");

    let mut stack = CallStack::new(None);
    stack.push(main, 3).unwrap();
    stack.push(f, 7).unwrap();

    let rendered = stack.capture().render(&interner, "main.kea");
    assert_eq!(
        rendered,
        "Traceback (most recent call last):\n  File \"main.kea\", line 3, in <module>\n  File \"main.kea\", line 7, in f\n"
    );
}
