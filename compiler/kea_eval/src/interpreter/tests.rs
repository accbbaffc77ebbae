use kea_ir::{BinaryOp, BoolOp, ImportNames, UnaryOp};
use pretty_assertions::assert_eq;

use crate::test_helpers::{run_program, run_program_with_loader, TreeBuilder};
use crate::value::Value;
use crate::ModuleLoader;

fn output_of(build: impl FnOnce(&mut TreeBuilder) -> Vec<kea_ir::InstrId>) -> String {
    let (interp, result) = run_program(build);
    if let Err(err) = &result {
        panic!("program failed: {err}");
    }
    interp.printed_output()
}

// Numeric promotion

#[test]
fn numeric_promotion_laws() {
    let output = output_of(|b| {
        let mut stmts = vec![];
        // 5 // 2 == 2
        let (l, r) = (b.int(5), b.int(2));
        let e = b.binary(BinaryOp::FloorDiv, l, r);
        stmts.push(b.print1(e));
        // -1 // 2 == -1
        let (l, r) = (b.int(-1), b.int(2));
        let e = b.binary(BinaryOp::FloorDiv, l, r);
        stmts.push(b.print1(e));
        // 5 % -2 == -1
        let (l, r) = (b.int(5), b.int(-2));
        let e = b.binary(BinaryOp::Mod, l, r);
        stmts.push(b.print1(e));
        // 4 / 2 is float-typed
        let (l, r) = (b.int(4), b.int(2));
        let e = b.binary(BinaryOp::Div, l, r);
        stmts.push(b.print1(e));
        stmts
    });
    assert_eq!(output, "2\n-1\n-1\n2.0\n");
}

// Scoping

#[test]
fn assignment_in_function_creates_a_local() {
    // x = 5; def f(): x = 6; f(); print(x) -> 5
    let output = output_of(|b| {
        let five = b.int(5);
        let s1 = b.assign_name("x", five);
        let six = b.int(6);
        let body = b.assign_name("x", six);
        let s2 = b.simple_func("f", &[], vec![body]);
        let s3 = b.call_name("f", vec![]);
        let x = b.load("x");
        let s4 = b.print1(x);
        vec![s1, s2, s3, s4]
    });
    assert_eq!(output, "5\n");
}

#[test]
fn global_declaration_rebinds_module_scope() {
    let output = output_of(|b| {
        let one = b.int(1);
        let s1 = b.assign_name("x", one);
        let decl = b.global_decl(&["x"]);
        let two = b.int(2);
        let write = b.assign_name("x", two);
        let s2 = b.simple_func("f", &[], vec![decl, write]);
        let s3 = b.call_name("f", vec![]);
        let x = b.load("x");
        let s4 = b.print1(x);
        vec![s1, s2, s3, s4]
    });
    assert_eq!(output, "2\n");
}

#[test]
fn nonlocal_writes_the_enclosing_function_binding() {
    // def outer(): a = 1; def bump(): nonlocal a; a = a + 1
    //   bump(); bump(); return a
    let output = output_of(|b| {
        let one = b.int(1);
        let init = b.assign_name("a", one);
        let decl = b.nonlocal_decl(&["a"]);
        let (a, one) = (b.load("a"), b.int(1));
        let sum = b.binary(BinaryOp::Add, a, one);
        let write = b.assign_name("a", sum);
        let bump = b.simple_func("bump", &[], vec![decl, write]);
        let c1 = b.call_name("bump", vec![]);
        let c2 = b.call_name("bump", vec![]);
        let a = b.load("a");
        let ret = b.ret(Some(a));
        let outer = b.simple_func("outer", &[], vec![init, bump, c1, c2, ret]);
        let call = b.call_name("outer", vec![]);
        let print = b.print1(call);
        vec![outer, print]
    });
    assert_eq!(output, "3\n");
}

#[test]
fn closures_read_the_current_outer_value() {
    // def outer(): a = 1; def inner(): return a
    //   a = 2; return inner()
    let output = output_of(|b| {
        let one = b.int(1);
        let init = b.assign_name("a", one);
        let a = b.load("a");
        let ret_a = b.ret(Some(a));
        let inner = b.simple_func("inner", &[], vec![ret_a]);
        let two = b.int(2);
        let update = b.assign_name("a", two);
        let call_inner = b.call_name("inner", vec![]);
        let ret = b.ret(Some(call_inner));
        let outer = b.simple_func("outer", &[], vec![init, inner, update, ret]);
        let call = b.call_name("outer", vec![]);
        let print = b.print1(call);
        vec![outer, print]
    });
    assert_eq!(output, "2\n");
}

#[test]
fn module_names_bind_late() {
    // f references g defined after f's definition.
    let output = output_of(|b| {
        let call_g = b.call_name("g", vec![]);
        let ret = b.ret(Some(call_g));
        let f = b.simple_func("f", &[], vec![ret]);
        let seven = b.int(7);
        let ret7 = b.ret(Some(seven));
        let g = b.simple_func("g", &[], vec![ret7]);
        let call = b.call_name("f", vec![]);
        let print = b.print1(call);
        vec![f, g, print]
    });
    assert_eq!(output, "7\n");
}

// Short-circuit evaluation

#[test]
fn boolean_operators_short_circuit() {
    // calls = []; def f(): calls.append(1); return True
    // False and f(); True or f(); False or f()
    // print(len(calls)) -> 1
    let output = output_of(|b| {
        let empty = b.list(vec![]);
        let init = b.assign_name("calls", empty);
        let calls = b.load("calls");
        let append = b.attr(calls, "append");
        let one = b.int(1);
        let do_append = b.call(append, vec![one]);
        let true_lit = b.bool_lit(true);
        let ret = b.ret(Some(true_lit));
        let f = b.simple_func("f", &[], vec![do_append, ret]);

        let lhs = b.bool_lit(false);
        let call_f = b.call_name("f", vec![]);
        let and_expr = b.logic(BoolOp::And, lhs, call_f);
        let s_and = b.assign_name("x", and_expr);

        let lhs = b.bool_lit(true);
        let call_f = b.call_name("f", vec![]);
        let or_expr = b.logic(BoolOp::Or, lhs, call_f);
        let s_or = b.assign_name("y", or_expr);

        let lhs = b.bool_lit(false);
        let call_f = b.call_name("f", vec![]);
        let or2_expr = b.logic(BoolOp::Or, lhs, call_f);
        let s_or2 = b.assign_name("z", or2_expr);

        let calls = b.load("calls");
        let len = b.call_name("len", vec![calls]);
        let print = b.print1(len);
        vec![init, f, s_and, s_or, s_or2, print]
    });
    assert_eq!(output, "1\n");
}

#[test]
fn boolean_result_is_the_last_operand_evaluated() {
    let output = output_of(|b| {
        let (zero, s) = (b.int(0), b.str_lit("x"));
        let or_expr = b.logic(BoolOp::Or, zero, s);
        let p1 = b.print1(or_expr);
        let (one, two) = (b.int(1), b.int(2));
        let and_expr = b.logic(BoolOp::And, one, two);
        let p2 = b.print1(and_expr);
        vec![p1, p2]
    });
    assert_eq!(output, "x\n2\n");
}

// Argument binding

#[test]
fn defaults_and_keywords_bind() {
    // def f(a, b=2): return a + b
    // f(3) -> 5; f(3, b=10) -> 13
    let output = output_of(|b| {
        let two = b.int(2);
        let params = vec![b.param("a"), b.param_default("b", two)];
        let (a, bv) = (b.load("a"), b.load("b"));
        let sum = b.binary(BinaryOp::Add, a, bv);
        let ret = b.ret(Some(sum));
        let f = b.func_def("f", params, vec![ret]);

        let three = b.int(3);
        let c1 = b.call_name("f", vec![three]);
        let p1 = b.print1(c1);

        let three = b.int(3);
        let ten = b.int(10);
        let f_load = b.load("f");
        let c2 = b.call_kw(f_load, vec![three], &[("b", ten)]);
        let p2 = b.print1(c2);
        vec![f, p1, p2]
    });
    assert_eq!(output, "5\n13\n");
}

#[test]
fn missing_required_argument_fails() {
    let (_, result) = run_program(|b| {
        let two = b.int(2);
        let params = vec![b.param("a"), b.param_default("b", two)];
        let none = b.none();
        let ret = b.ret(Some(none));
        let f = b.func_def("f", params, vec![ret]);
        let ten = b.int(10);
        let f_load = b.load("f");
        let call = b.call_kw(f_load, vec![], &[("b", ten)]);
        vec![f, call]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "TypeError");
    assert!(err.message.contains("missing required argument"));
    assert!(err.message.contains("'a'"));
}

#[test]
fn extra_positional_arguments_fail() {
    let (_, result) = run_program(|b| {
        let none = b.none();
        let ret = b.ret(Some(none));
        let f = b.simple_func("f", &["a", "b"], vec![ret]);
        let args = vec![b.int(1), b.int(2), b.int(3)];
        let call = b.call_name("f", args);
        vec![f, call]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "TypeError");
    assert!(err.message.contains("unknown positional argument"));
}

#[test]
fn unknown_keyword_argument_fails() {
    let (_, result) = run_program(|b| {
        let none = b.none();
        let ret = b.ret(Some(none));
        let f = b.simple_func("f", &["a"], vec![ret]);
        let one = b.int(1);
        let nine = b.int(9);
        let f_load = b.load("f");
        let call = b.call_kw(f_load, vec![one], &[("z", nine)]);
        vec![f, call]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "TypeError");
    assert!(err.message.contains("unknown keyword argument"));
    assert!(err.message.contains("'z'"));
}

#[test]
fn keywords_take_precedence_over_positionals_for_the_same_slot() {
    // Keywords are applied after positionals, so f(1, a=9) leaves a=9.
    let output = output_of(|b| {
        let a = b.load("a");
        let ret = b.ret(Some(a));
        let f = b.simple_func("f", &["a"], vec![ret]);
        let one = b.int(1);
        let nine = b.int(9);
        let f_load = b.load("f");
        let call = b.call_kw(f_load, vec![one], &[("a", nine)]);
        let print = b.print1(call);
        vec![f, print]
    });
    assert_eq!(output, "9\n");
}

#[test]
fn variadic_collectors_take_the_surplus() {
    // def f(a, *rest, **kw): return [a, rest, kw]
    // print(f(1, 2, 3, x=9)) -> [1, [2, 3], {'x': 9}]
    let output = output_of(|b| {
        let params = vec![b.param("a"), b.param_varargs("rest"), b.param_kwargs("kw")];
        let items = vec![b.load("a"), b.load("rest"), b.load("kw")];
        let list = b.list(items);
        let ret = b.ret(Some(list));
        let f = b.func_def("f", params, vec![ret]);
        let pos = vec![b.int(1), b.int(2), b.int(3)];
        let nine = b.int(9);
        let f_load = b.load("f");
        let call = b.call_kw(f_load, pos, &[("x", nine)]);
        let print = b.print1(call);
        vec![f, print]
    });
    assert_eq!(output, "[1, [2, 3], {'x': 9}]\n");
}

#[test]
fn defaults_evaluate_at_call_time_in_the_call_scope() {
    // def f(a, b=a+1): return a + b; f(5) -> 11
    let output = output_of(|b| {
        let (a_ref, one) = (b.load("a"), b.int(1));
        let default = b.binary(BinaryOp::Add, a_ref, one);
        let params = vec![b.param("a"), b.param_default("b", default)];
        let (a, bv) = (b.load("a"), b.load("b"));
        let sum = b.binary(BinaryOp::Add, a, bv);
        let ret = b.ret(Some(sum));
        let f = b.func_def("f", params, vec![ret]);
        let five = b.int(5);
        let call = b.call_name("f", vec![five]);
        let print = b.print1(call);
        vec![f, print]
    });
    assert_eq!(output, "11\n");
}

// Classes and objects

#[test]
fn init_constructs_instance_state() {
    // class Point: def __init__(self, x): self.x = x
    // p = Point(4); print(p.x)
    let output = output_of(|b| {
        let self_x = {
            let s = b.load("self");
            b.attr(s, "x")
        };
        let x = b.load("x");
        let set = b.assign(self_x, x);
        let init = b.simple_func("__init__", &["self", "x"], vec![set]);
        let class = b.class_def("Point", vec![], vec![init]);
        let four = b.int(4);
        let new = b.call_name("Point", vec![four]);
        let s1 = b.assign_name("p", new);
        let p = b.load("p");
        let px = b.attr(p, "x");
        let print = b.print1(px);
        vec![class, s1, print]
    });
    assert_eq!(output, "4\n");
}

#[test]
fn operator_overloading_dispatches_dunder() {
    // class C: def __add__(self, o): return 5
    // c = C(); print(c + c) -> 5
    let output = output_of(|b| {
        let five = b.int(5);
        let ret = b.ret(Some(five));
        let add = b.simple_func("__add__", &["self", "o"], vec![ret]);
        let class = b.class_def("C", vec![], vec![add]);
        let new = b.call_name("C", vec![]);
        let s1 = b.assign_name("c", new);
        let (l, r) = (b.load("c"), b.load("c"));
        let sum = b.binary(BinaryOp::Add, l, r);
        let print = b.print1(sum);
        vec![class, s1, print]
    });
    assert_eq!(output, "5\n");
}

#[test]
fn equality_without_dunder_is_a_type_error() {
    // a == b on plain instances raises, never identity.
    let output = output_of(|b| {
        let class = b.class_def("C", vec![], vec![]);
        let new_a = b.call_name("C", vec![]);
        let s1 = b.assign_name("a", new_a);
        let new_b = b.call_name("C", vec![]);
        let s2 = b.assign_name("b", new_b);

        let (l, r) = (b.load("a"), b.load("b"));
        let cmp = b.binary(BinaryOp::Eq, l, r);
        let type_error = b.load("TypeError");
        let msg = b.str_lit("type-error");
        let caught = b.print1(msg);
        let handler = b.handler(Some(type_error), None, vec![caught]);
        let try_stmt = b.try_stmt(vec![cmp], vec![handler], vec![], vec![]);
        vec![class, s1, s2, try_stmt]
    });
    assert_eq!(output, "type-error\n");
}

#[test]
fn attribute_lookup_is_depth_first_in_base_order() {
    // class A: def who(self): return "A"
    // class B(A): pass
    // class C: def who(self): return "C"
    // class D(B, C): pass
    // D().who() -> "A"  (B's chain, depth-first, before C)
    let output = output_of(|b| {
        let a_str = b.str_lit("A");
        let ret_a = b.ret(Some(a_str));
        let who_a = b.simple_func("who", &["self"], vec![ret_a]);
        let class_a = b.class_def("A", vec![], vec![who_a]);

        let base_a = b.load("A");
        let class_b = b.class_def("B", vec![base_a], vec![]);

        let c_str = b.str_lit("C");
        let ret_c = b.ret(Some(c_str));
        let who_c = b.simple_func("who", &["self"], vec![ret_c]);
        let class_c = b.class_def("C", vec![], vec![who_c]);

        let (base_b, base_c) = (b.load("B"), b.load("C"));
        let class_d = b.class_def("D", vec![base_b, base_c], vec![]);

        let d = b.call_name("D", vec![]);
        let s1 = b.assign_name("d", d);
        let d_load = b.load("d");
        let who = b.attr(d_load, "who");
        let call = b.call(who, vec![]);
        let print = b.print1(call);
        vec![class_a, class_b, class_c, class_d, s1, print]
    });
    assert_eq!(output, "A\n");
}

#[test]
fn isinstance_is_transitive_over_deep_chains() {
    let output = output_of(|b| {
        let class_a = b.class_def("A", vec![], vec![]);
        let base = b.load("A");
        let class_b = b.class_def("B", vec![base], vec![]);
        let base = b.load("B");
        let class_c = b.class_def("C", vec![base], vec![]);

        let c = b.call_name("C", vec![]);
        let s1 = b.assign_name("c", c);

        let args = vec![b.load("c"), b.load("A")];
        let check1 = b.call_name("isinstance", args);
        let p1 = b.print1(check1);

        let args = vec![b.load("C"), b.load("A")];
        let check2 = b.call_name("issubclass", args);
        let p2 = b.print1(check2);

        let args = vec![b.load("A"), b.load("C")];
        let check3 = b.call_name("issubclass", args);
        let p3 = b.print1(check3);
        vec![class_a, class_b, class_c, s1, p1, p2, p3]
    });
    assert_eq!(output, "True\nTrue\nFalse\n");
}

#[test]
fn super_resolves_against_the_defining_class() {
    // class A: def greet(self): return "A"
    // class B(A): def greet(self): return super().greet() + "B"
    // B().greet() -> "AB"
    let output = output_of(|b| {
        let a_str = b.str_lit("A");
        let ret_a = b.ret(Some(a_str));
        let greet_a = b.simple_func("greet", &["self"], vec![ret_a]);
        let class_a = b.class_def("A", vec![], vec![greet_a]);

        let sup = b.call_name("super", vec![]);
        let sup_greet = b.attr(sup, "greet");
        let call_sup = b.call(sup_greet, vec![]);
        let b_str = b.str_lit("B");
        let concat = b.binary(BinaryOp::Add, call_sup, b_str);
        let ret_b = b.ret(Some(concat));
        let greet_b = b.simple_func("greet", &["self"], vec![ret_b]);
        let base = b.load("A");
        let class_b = b.class_def("B", vec![base], vec![greet_b]);

        let instance = b.call_name("B", vec![]);
        let s1 = b.assign_name("x", instance);
        let x = b.load("x");
        let greet = b.attr(x, "greet");
        let call = b.call(greet, vec![]);
        let print = b.print1(call);
        vec![class_a, class_b, s1, print]
    });
    assert_eq!(output, "AB\n");
}

#[test]
fn instances_are_callable_through_dunder_call() {
    let output = output_of(|b| {
        let self_n = {
            let s = b.load("self");
            b.attr(s, "n")
        };
        let n = b.load("n");
        let set = b.assign(self_n, n);
        let init = b.simple_func("__init__", &["self", "n"], vec![set]);

        let self_n = {
            let s = b.load("self");
            b.attr(s, "n")
        };
        let x = b.load("x");
        let sum = b.binary(BinaryOp::Add, self_n, x);
        let ret = b.ret(Some(sum));
        let call_m = b.simple_func("__call__", &["self", "x"], vec![ret]);

        let class = b.class_def("Adder", vec![], vec![init, call_m]);
        let ten = b.int(10);
        let adder = b.call_name("Adder", vec![ten]);
        let s1 = b.assign_name("add10", adder);
        let five = b.int(5);
        let result = b.call_name("add10", vec![five]);
        let print = b.print1(result);
        vec![class, s1, print]
    });
    assert_eq!(output, "15\n");
}

#[test]
fn attribute_deletion_mirrors_lookup_order() {
    let output = output_of(|b| {
        let class = b.class_def("C", vec![], vec![]);
        // C.x = 1; c = C(); c.x = 2
        let c_cls = b.load("C");
        let cls_attr = b.attr(c_cls, "x");
        let one = b.int(1);
        let s1 = b.assign(cls_attr, one);
        let new = b.call_name("C", vec![]);
        let s2 = b.assign_name("c", new);
        let c = b.load("c");
        let inst_attr = b.attr(c, "x");
        let two = b.int(2);
        let s3 = b.assign(inst_attr, two);

        // del c.x removes the instance member; the class member shows.
        let c = b.load("c");
        let attr = b.attr(c, "x");
        let d1 = b.delete(attr);
        let c = b.load("c");
        let read = b.attr(c, "x");
        let p1 = b.print1(read);

        // del c.x again removes the class member; next read raises.
        let c = b.load("c");
        let attr = b.attr(c, "x");
        let d2 = b.delete(attr);
        let c = b.load("c");
        let read = b.attr(c, "x");
        let attr_err = b.load("AttributeError");
        let msg = b.str_lit("gone");
        let caught = b.print1(msg);
        let handler = b.handler(Some(attr_err), None, vec![caught]);
        let try_read = b.try_stmt(vec![read], vec![handler], vec![], vec![]);

        vec![class, s1, s2, s3, d1, p1, d2, try_read]
    });
    assert_eq!(output, "2\ngone\n");
}

#[test]
fn len_dunder_drives_truthiness() {
    // class Box: __init__ stores n; __len__ returns n
    // if Box(0): ... else: print("empty"); if Box(2): print("full")
    let output = output_of(|b| {
        let self_n = {
            let s = b.load("self");
            b.attr(s, "n")
        };
        let n = b.load("n");
        let set = b.assign(self_n, n);
        let init = b.simple_func("__init__", &["self", "n"], vec![set]);
        let self_n = {
            let s = b.load("self");
            b.attr(s, "n")
        };
        let ret = b.ret(Some(self_n));
        let len_m = b.simple_func("__len__", &["self"], vec![ret]);
        let class = b.class_def("Box", vec![], vec![init, len_m]);

        let zero = b.int(0);
        let empty_box = b.call_name("Box", vec![zero]);
        let full_msg = b.str_lit("nonempty");
        let then1 = b.print1(full_msg);
        let empty_msg = b.str_lit("empty");
        let else1 = b.print1(empty_msg);
        let if1 = b.if_stmt(vec![(empty_box, vec![then1])], vec![else1]);

        let two = b.int(2);
        let full_box = b.call_name("Box", vec![two]);
        let msg = b.str_lit("full");
        let then2 = b.print1(msg);
        let if2 = b.if_stmt(vec![(full_box, vec![then2])], vec![]);
        vec![class, if1, if2]
    });
    assert_eq!(output, "empty\nfull\n");
}

// Iteration

#[test]
fn for_loops_drive_the_iterator_protocol() {
    // Custom iterable: Counter(3) yields 1, 2, 3.
    let output = output_of(|b| {
        let self_i = {
            let s = b.load("self");
            b.attr(s, "i")
        };
        let zero = b.int(0);
        let set_i = b.assign(self_i, zero);
        let self_n = {
            let s = b.load("self");
            b.attr(s, "n")
        };
        let n = b.load("n");
        let set_n = b.assign(self_n, n);
        let init = b.simple_func("__init__", &["self", "n"], vec![set_i, set_n]);

        let s = b.load("self");
        let ret_self = b.ret(Some(s));
        let iter_m = b.simple_func("__iter__", &["self"], vec![ret_self]);

        // if self.i >= self.n: raise StopIteration
        let self_i = {
            let s = b.load("self");
            b.attr(s, "i")
        };
        let self_n = {
            let s = b.load("self");
            b.attr(s, "n")
        };
        let done = b.binary(BinaryOp::GtE, self_i, self_n);
        let stop = b.load("StopIteration");
        let raise = b.raise(stop);
        let check = b.if_stmt(vec![(done, vec![raise])], vec![]);
        // self.i = self.i + 1; return self.i
        let self_i_read = {
            let s = b.load("self");
            b.attr(s, "i")
        };
        let one = b.int(1);
        let sum = b.binary(BinaryOp::Add, self_i_read, one);
        let self_i_write = {
            let s = b.load("self");
            b.attr(s, "i")
        };
        let advance = b.assign(self_i_write, sum);
        let self_i = {
            let s = b.load("self");
            b.attr(s, "i")
        };
        let ret = b.ret(Some(self_i));
        let next_m = b.simple_func("__next__", &["self"], vec![check, advance, ret]);

        let class = b.class_def("Counter", vec![], vec![init, iter_m, next_m]);

        let zero = b.int(0);
        let init_total = b.assign_name("total", zero);
        let three = b.int(3);
        let counter = b.call_name("Counter", vec![three]);
        let (total, x) = (b.load("total"), b.load("x"));
        let sum = b.binary(BinaryOp::Add, total, x);
        let acc = b.assign_name("total", sum);
        let loop_stmt = b.for_stmt("x", counter, vec![acc]);
        let total = b.load("total");
        let print = b.print1(total);
        vec![class, init_total, loop_stmt, print]
    });
    assert_eq!(output, "6\n");
}

#[test]
fn next_past_exhaustion_raises_stop_iteration_every_time() {
    let output = output_of(|b| {
        let one = b.int(1);
        let items = b.list(vec![one]);
        let iterator = b.call_name("iter", vec![items]);
        let s1 = b.assign_name("it", iterator);
        let zero = b.int(0);
        let s2 = b.assign_name("caught", zero);

        let mut stmts = vec![s1, s2];
        // Three next() calls: first succeeds, next two raise.
        for _ in 0..3 {
            let it = b.load("it");
            let next = b.call_name("next", vec![it]);
            let stop = b.load("StopIteration");
            let (caught, one) = (b.load("caught"), b.int(1));
            let sum = b.binary(BinaryOp::Add, caught, one);
            let bump = b.assign_name("caught", sum);
            let handler = b.handler(Some(stop), None, vec![bump]);
            stmts.push(b.try_stmt(vec![next], vec![handler], vec![], vec![]));
        }
        let caught = b.load("caught");
        stmts.push(b.print1(caught));
        stmts
    });
    assert_eq!(output, "2\n");
}

#[test]
fn for_loops_cover_the_builtin_iterables() {
    let output = output_of(|b| {
        // list
        let items = vec![b.int(1), b.int(2), b.int(3)];
        let list = b.list(items);
        let x = b.load("x");
        let p = b.print1(x);
        let for_list = b.for_stmt("x", list, vec![p]);
        // str
        let s = b.str_lit("ab");
        let c = b.load("c");
        let p = b.print1(c);
        let for_str = b.for_stmt("c", s, vec![p]);
        // dict yields keys in insertion order
        let (k1, v1) = (b.str_lit("k1"), b.int(1));
        let (k2, v2) = (b.str_lit("k2"), b.int(2));
        let dict = b.dict(vec![(k1, v1), (k2, v2)]);
        let k = b.load("k");
        let p = b.print1(k);
        let for_dict = b.for_stmt("k", dict, vec![p]);
        // range
        let zero = b.int(0);
        let init = b.assign_name("total", zero);
        let five = b.int(5);
        let range = b.call_name("range", vec![five]);
        let (total, i) = (b.load("total"), b.load("i"));
        let sum = b.binary(BinaryOp::Add, total, i);
        let acc = b.assign_name("total", sum);
        let for_range = b.for_stmt("i", range, vec![acc]);
        let total = b.load("total");
        let p_total = b.print1(total);
        vec![for_list, for_str, for_dict, init, for_range, p_total]
    });
    assert_eq!(output, "1\n2\n3\na\nb\nk1\nk2\n10\n");
}

#[test]
fn while_loops_absorb_break_and_continue() {
    // i = 0; total = 0
    // while True: i += 1; if i > 5: break; if i % 2 == 0: continue; total += i
    let output = output_of(|b| {
        let zero = b.int(0);
        let s1 = b.assign_name("i", zero);
        let zero = b.int(0);
        let s2 = b.assign_name("total", zero);

        let (i, one) = (b.load("i"), b.int(1));
        let sum = b.binary(BinaryOp::Add, i, one);
        let bump = b.assign_name("i", sum);

        let (i, five) = (b.load("i"), b.int(5));
        let too_big = b.binary(BinaryOp::Gt, i, five);
        let brk = b.break_stmt();
        let if_break = b.if_stmt(vec![(too_big, vec![brk])], vec![]);

        let (i, two) = (b.load("i"), b.int(2));
        let rem = b.binary(BinaryOp::Mod, i, two);
        let zero = b.int(0);
        let even = b.binary(BinaryOp::Eq, rem, zero);
        let cont = b.continue_stmt();
        let if_continue = b.if_stmt(vec![(even, vec![cont])], vec![]);

        let (total, i) = (b.load("total"), b.load("i"));
        let sum = b.binary(BinaryOp::Add, total, i);
        let acc = b.assign_name("total", sum);

        let cond = b.bool_lit(true);
        let while_stmt = b.while_stmt(cond, vec![bump, if_break, if_continue, acc]);
        let total = b.load("total");
        let print = b.print1(total);
        vec![s1, s2, while_stmt, print]
    });
    // 1 + 3 + 5
    assert_eq!(output, "9\n");
}

// Exceptions

#[test]
fn first_matching_except_clause_wins() {
    let output = output_of(|b| {
        let type_error = b.load("TypeError");
        let msg = b.str_lit("boom");
        let exc = b.call(type_error, vec![msg]);
        let raise = b.raise(exc);

        let value_error = b.load("ValueError");
        let v_msg = b.str_lit("value");
        let v_print = b.print1(v_msg);
        let h1 = b.handler(Some(value_error), None, vec![v_print]);

        let type_error = b.load("TypeError");
        let t_msg = b.str_lit("type");
        let t_print = b.print1(t_msg);
        let e = b.load("e");
        let e_print = b.print1(e);
        let h2 = b.handler(Some(type_error), Some("e"), vec![t_print, e_print]);

        let exception = b.load("Exception");
        let x_msg = b.str_lit("generic");
        let x_print = b.print1(x_msg);
        let h3 = b.handler(Some(exception), None, vec![x_print]);

        let try_stmt = b.try_stmt(vec![raise], vec![h1, h2, h3], vec![], vec![]);
        vec![try_stmt]
    });
    assert_eq!(output, "type\nboom\n");
}

#[test]
fn unmatched_exceptions_propagate_unchanged() {
    // An inner try with only a TypeError clause lets ValueError
    // escape with its original type and message.
    let (_, result) = run_program(|b| {
        let value_error = b.load("ValueError");
        let msg = b.str_lit("original");
        let exc = b.call(value_error, vec![msg]);
        let raise = b.raise(exc);
        let type_error = b.load("TypeError");
        let no = b.str_lit("no");
        let p = b.print1(no);
        let handler = b.handler(Some(type_error), None, vec![p]);
        let inner_try = b.try_stmt(vec![raise], vec![handler], vec![], vec![]);
        let f = b.simple_func("f", &[], vec![inner_try]);
        let call = b.call_name("f", vec![]);
        vec![f, call]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "ValueError");
    assert_eq!(err.message, "original");
}

#[test]
fn interpreter_errors_are_catchable_like_user_exceptions() {
    let output = output_of(|b| {
        // NameError from an undefined read.
        let missing = b.load("zzz");
        let p = b.print1(missing);
        let name_error = b.load("NameError");
        let msg = b.str_lit("caught-name");
        let caught = b.print1(msg);
        let handler = b.handler(Some(name_error), Some("e"), vec![caught]);
        let t1 = b.try_stmt(vec![p], vec![handler], vec![], vec![]);

        // ZeroDivisionError from the operator layer.
        let (one, zero) = (b.int(1), b.int(0));
        let div = b.binary(BinaryOp::Div, one, zero);
        let zde = b.load("ZeroDivisionError");
        let msg = b.str_lit("caught-zero");
        let caught = b.print1(msg);
        let handler = b.handler(Some(zde), None, vec![caught]);
        let t2 = b.try_stmt(vec![div], vec![handler], vec![], vec![]);

        // KeyError from a missing deletion, via the Exception root.
        let dict = b.dict(vec![]);
        let s1 = b.assign_name("d", dict);
        let d = b.load("d");
        let key = b.str_lit("a");
        let entry = b.index(d, key);
        let del = b.delete(entry);
        let exception = b.load("Exception");
        let msg = b.str_lit("caught-key");
        let caught = b.print1(msg);
        let handler = b.handler(Some(exception), None, vec![caught]);
        let t3 = b.try_stmt(vec![del], vec![handler], vec![], vec![]);

        vec![t1, t2, s1, t3]
    });
    assert_eq!(output, "caught-name\ncaught-zero\ncaught-key\n");
}

#[test]
fn else_runs_after_a_clean_body() {
    let output = output_of(|b| {
        let ok = b.str_lit("body");
        let body = b.print1(ok);
        let exception = b.load("Exception");
        let no = b.str_lit("handler");
        let h_print = b.print1(no);
        let handler = b.handler(Some(exception), None, vec![h_print]);
        let else_msg = b.str_lit("else");
        let else_print = b.print1(else_msg);
        let fin_msg = b.str_lit("finally");
        let fin_print = b.print1(fin_msg);
        let try_stmt = b.try_stmt(vec![body], vec![handler], vec![else_print], vec![fin_print]);
        vec![try_stmt]
    });
    assert_eq!(output, "body\nelse\nfinally\n");
}

#[test]
fn else_runs_when_no_handler_matched_then_the_exception_resumes() {
    // Preserved source behavior: a raising body whose exception
    // matches no clause still runs `else`, then the exception
    // continues propagating (caught here by the outer try).
    let output = output_of(|b| {
        let value_error = b.load("ValueError");
        let msg = b.str_lit("x");
        let exc = b.call(value_error, vec![msg]);
        let raise = b.raise(exc);
        let type_error = b.load("TypeError");
        let no = b.str_lit("handler");
        let h_print = b.print1(no);
        let handler = b.handler(Some(type_error), None, vec![h_print]);
        let else_msg = b.str_lit("else-ran");
        let else_print = b.print1(else_msg);
        let fin_msg = b.str_lit("finally");
        let fin_print = b.print1(fin_msg);
        let inner = b.try_stmt(vec![raise], vec![handler], vec![else_print], vec![fin_print]);

        let value_error = b.load("ValueError");
        let outer_msg = b.str_lit("outer-caught");
        let outer_print = b.print1(outer_msg);
        let outer_handler = b.handler(Some(value_error), None, vec![outer_print]);
        let outer = b.try_stmt(vec![inner], vec![outer_handler], vec![], vec![]);
        vec![outer]
    });
    assert_eq!(output, "else-ran\nfinally\nouter-caught\n");
}

#[test]
fn else_does_not_run_when_a_handler_matched() {
    let output = output_of(|b| {
        let value_error = b.load("ValueError");
        let exc = b.call(value_error, vec![]);
        let raise = b.raise(exc);
        let value_error = b.load("ValueError");
        let msg = b.str_lit("handled");
        let h_print = b.print1(msg);
        let handler = b.handler(Some(value_error), None, vec![h_print]);
        let else_msg = b.str_lit("else");
        let else_print = b.print1(else_msg);
        let try_stmt = b.try_stmt(vec![raise], vec![handler], vec![else_print], vec![]);
        vec![try_stmt]
    });
    assert_eq!(output, "handled\n");
}

#[test]
fn finally_runs_on_abrupt_exits_and_can_replace_them() {
    // finally's own completion replaces the pending exception.
    let output = output_of(|b| {
        let value_error = b.load("ValueError");
        let exc = b.call(value_error, vec![]);
        let raise = b.raise(exc);
        let fin_msg = b.str_lit("cleanup");
        let fin_print = b.print1(fin_msg);
        let ninety_nine = b.int(99);
        let ret = b.ret(Some(ninety_nine));
        let try_stmt = b.try_stmt(vec![raise], vec![], vec![], vec![fin_print, ret]);
        let f = b.simple_func("f", &[], vec![try_stmt]);
        let call = b.call_name("f", vec![]);
        let print = b.print1(call);
        vec![f, print]
    });
    assert_eq!(output, "cleanup\n99\n");
}

#[test]
fn user_exception_classes_subclass_the_builtin_root() {
    // class MyError(Exception): pass
    // raise MyError("custom") caught via Exception; message preserved.
    let output = output_of(|b| {
        let base = b.load("Exception");
        let class = b.class_def("MyError", vec![base], vec![]);
        let my_error = b.load("MyError");
        let msg = b.str_lit("custom");
        let exc = b.call(my_error, vec![msg]);
        let raise = b.raise(exc);
        let exception = b.load("Exception");
        let e = b.load("e");
        let p = b.print1(e);
        let handler = b.handler(Some(exception), Some("e"), vec![p]);
        let try_stmt = b.try_stmt(vec![raise], vec![handler], vec![], vec![]);
        vec![class, try_stmt]
    });
    assert_eq!(output, "custom\n");
}

#[test]
fn raising_a_non_exception_is_a_type_error() {
    let (_, result) = run_program(|b| {
        let not_exc = b.int(5);
        let raise = b.raise(not_exc);
        vec![raise]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "TypeError");
    assert!(err.message.contains("derive from Exception"));
}

#[test]
fn deep_recursion_raises_a_catchable_recursion_error() {
    let (_, result) = run_program(|b| {
        let call = b.call_name("f", vec![]);
        let ret = b.ret(Some(call));
        let f = b.simple_func("f", &[], vec![ret]);
        let call = b.call_name("f", vec![]);
        vec![f, call]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "RecursionError");
    assert!(err.message.contains("maximum recursion depth"));
}

#[test]
fn uncaught_exceptions_report_a_traceback() {
    let (_, result) = run_program(|b| {
        let value_error = b.load("ValueError");
        let msg = b.str_lit("deep");
        let exc = b.call(value_error, vec![msg]);
        let raise = b.raise(exc);
        let inner = b.simple_func("inner", &[], vec![raise]);
        let call_inner = b.call_name("inner", vec![]);
        let ret = b.ret(Some(call_inner));
        let outer = b.simple_func("outer", &[], vec![ret]);
        let call = b.call_name("outer", vec![]);
        vec![inner, outer, call]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "ValueError");
    assert_eq!(err.message, "deep");
    let module_pos = err.traceback.find("in <module>").unwrap();
    let outer_pos = err.traceback.find("in outer").unwrap();
    let inner_pos = err.traceback.find("in inner").unwrap();
    // Innermost frame last.
    assert!(module_pos < outer_pos && outer_pos < inner_pos);
}

// Containers

#[test]
fn dict_deletion_scenario() {
    // x = {'a': 1, 'b': 2}; del x['a'] -> {'b': 2}
    let output = output_of(|b| {
        let (ka, va) = (b.str_lit("a"), b.int(1));
        let (kb, vb) = (b.str_lit("b"), b.int(2));
        let dict = b.dict(vec![(ka, va), (kb, vb)]);
        let s1 = b.assign_name("x", dict);
        let x = b.load("x");
        let key = b.str_lit("a");
        let entry = b.index(x, key);
        let del = b.delete(entry);
        let x = b.load("x");
        let print = b.print1(x);
        vec![s1, del, print]
    });
    assert_eq!(output, "{'b': 2}\n");
}

#[test]
fn indexing_supports_negative_positions() {
    let output = output_of(|b| {
        let items = vec![b.int(1), b.int(2), b.int(3)];
        let list = b.list(items);
        let s1 = b.assign_name("xs", list);
        let xs = b.load("xs");
        let neg = b.int(-1);
        let last = b.index(xs, neg);
        let p1 = b.print1(last);
        // xs[0] = 9
        let xs = b.load("xs");
        let zero = b.int(0);
        let slot = b.index(xs, zero);
        let nine = b.int(9);
        let s2 = b.assign(slot, nine);
        let xs = b.load("xs");
        let p2 = b.print1(xs);
        vec![s1, p1, s2, p2]
    });
    assert_eq!(output, "3\n[9, 2, 3]\n");
}

#[test]
fn builtin_methods_bind_on_native_receivers() {
    let output = output_of(|b| {
        let s = b.str_lit("abc");
        let upper = b.attr(s, "upper");
        let call = b.call(upper, vec![]);
        let p1 = b.print1(call);

        let items = vec![b.int(1)];
        let list = b.list(items);
        let s1 = b.assign_name("xs", list);
        let xs = b.load("xs");
        let append = b.attr(xs, "append");
        let two = b.int(2);
        let call = b.call(append, vec![two]);
        let xs = b.load("xs");
        let p2 = b.print1(xs);
        vec![p1, s1, call, p2]
    });
    assert_eq!(output, "ABC\n[1, 2]\n");
}

#[test]
fn str_conversion_dispatches_user_dunder() {
    let output = output_of(|b| {
        let text = b.str_lit("P!");
        let ret = b.ret(Some(text));
        let str_m = b.simple_func("__str__", &["self"], vec![ret]);
        let class = b.class_def("P", vec![], vec![str_m]);
        let p = b.call_name("P", vec![]);
        let print = b.print1(p);
        vec![class, print]
    });
    assert_eq!(output, "P!\n");
}

#[test]
fn builtin_class_calls_convert() {
    let output = output_of(|b| {
        let text = b.str_lit("12");
        let as_int = b.call_name("int", vec![text]);
        let one = b.int(1);
        let sum = b.binary(BinaryOp::Add, as_int, one);
        let p1 = b.print1(sum);

        let three = b.int(3);
        let as_float = b.call_name("float", vec![three]);
        let p2 = b.print1(as_float);

        let five = b.int(5);
        let as_str = b.call_name("str", vec![five]);
        let suffix = b.str_lit("!");
        let concat = b.binary(BinaryOp::Add, as_str, suffix);
        let p3 = b.print1(concat);
        vec![p1, p2, p3]
    });
    assert_eq!(output, "13\n3.0\n5!\n");
}

#[test]
fn unary_operators_dispatch() {
    let output = output_of(|b| {
        let three = b.int(3);
        let neg = b.unary(UnaryOp::Neg, three);
        let p1 = b.print1(neg);
        let zero = b.int(0);
        let not = b.unary(UnaryOp::Not, zero);
        let p2 = b.print1(not);
        // `not` on a plain instance uses default truthiness (true).
        let class = b.class_def("C", vec![], vec![]);
        let c = b.call_name("C", vec![]);
        let not_c = b.unary(UnaryOp::Not, c);
        let p3 = b.print1(not_c);
        vec![p1, p2, class, p3]
    });
    assert_eq!(output, "-3\nTrue\nFalse\n");
}

// Imports

struct FixtureLoader;

impl ModuleLoader for FixtureLoader {
    fn load(&self, module: &str) -> Result<Vec<(String, Value)>, String> {
        match module {
            "mathlib" => Ok(vec![
                ("answer".to_owned(), Value::Int(42)),
                ("pi".to_owned(), Value::Float(3.14)),
            ]),
            other => Err(format!("no module named '{other}'")),
        }
    }
}

#[test]
fn from_import_copies_named_bindings() {
    let (interp, result) = run_program_with_loader(Box::new(FixtureLoader), |b| {
        let names = ImportNames::Names(vec![b.name("answer")]);
        let import = b.import("mathlib", names);
        let answer = b.load("answer");
        let print = b.print1(answer);
        vec![import, print]
    });
    result.unwrap();
    assert_eq!(interp.printed_output(), "42\n");
}

#[test]
fn import_module_binds_a_synthetic_mapping() {
    let (interp, result) = run_program_with_loader(Box::new(FixtureLoader), |b| {
        let import = b.import("mathlib", ImportNames::Module);
        let module = b.load("mathlib");
        let key = b.str_lit("answer");
        let entry = b.index(module, key);
        let print = b.print1(entry);
        vec![import, print]
    });
    result.unwrap();
    assert_eq!(interp.printed_output(), "42\n");
}

#[test]
fn star_import_copies_everything() {
    let (interp, result) = run_program_with_loader(Box::new(FixtureLoader), |b| {
        let import = b.import("mathlib", ImportNames::Star);
        let pi = b.load("pi");
        let print = b.print1(pi);
        vec![import, print]
    });
    result.unwrap();
    assert_eq!(interp.printed_output(), "3.14\n");
}

#[test]
fn importing_an_unknown_name_fails_with_the_symbol() {
    let (_, result) = run_program_with_loader(Box::new(FixtureLoader), |b| {
        let names = ImportNames::Names(vec![b.name("missing")]);
        let import = b.import("mathlib", names);
        vec![import]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "ImportError");
    assert!(err.message.contains("'missing'"));
    assert!(err.message.contains("'mathlib'"));
}

#[test]
fn importing_without_a_loader_fails() {
    let (_, result) = run_program(|b| {
        let import = b.import("mathlib", ImportNames::Module);
        vec![import]
    });
    let err = result.unwrap_err();
    assert_eq!(err.exception_type, "ImportError");
}
