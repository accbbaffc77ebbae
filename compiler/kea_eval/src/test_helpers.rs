//! Helpers for building instruction trees in tests.
//!
//! The parser lives out of tree, so tests construct programs through
//! [`TreeBuilder`]: one method per instruction kind, names as `&str`,
//! ids returned for composition. Each allocated instruction gets the
//! next line number, so traceback assertions have stable lines.

use std::rc::Rc;

use kea_ir::{
    BinaryOp, BoolOp, CallArg, CallArgKind, ExceptHandler, ImportNames, InstrArena, InstrId,
    InstrKind, Name, Param, ParamKind, SharedTree, Span, StringInterner, UnaryOp,
};

use crate::interpreter::{Interpreter, InterpreterBuilder, ModuleLoader};

/// Incremental instruction-tree builder for tests.
pub struct TreeBuilder {
    pub interner: Rc<StringInterner>,
    arena: InstrArena,
    line: u32,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder {
            interner: Rc::new(StringInterner::new()),
            arena: InstrArena::new(),
            line: 0,
        }
    }

    /// Intern a name.
    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    fn alloc(&mut self, kind: InstrKind) -> InstrId {
        self.line += 1;
        self.arena.alloc(kind, Span::new(self.line, 1))
    }

    // Literals

    pub fn int(&mut self, value: i64) -> InstrId {
        self.alloc(InstrKind::Int(value))
    }

    pub fn float(&mut self, value: f64) -> InstrId {
        self.alloc(InstrKind::Float(value))
    }

    pub fn str_lit(&mut self, value: &str) -> InstrId {
        let name = self.name(value);
        self.alloc(InstrKind::Str(name))
    }

    pub fn bool_lit(&mut self, value: bool) -> InstrId {
        self.alloc(InstrKind::Bool(value))
    }

    pub fn none(&mut self) -> InstrId {
        self.alloc(InstrKind::NoneLit)
    }

    pub fn list(&mut self, items: Vec<InstrId>) -> InstrId {
        self.alloc(InstrKind::ListDisplay(items))
    }

    pub fn dict(&mut self, entries: Vec<(InstrId, InstrId)>) -> InstrId {
        self.alloc(InstrKind::DictDisplay(entries))
    }

    // Names and access

    pub fn load(&mut self, name: &str) -> InstrId {
        let name = self.name(name);
        self.alloc(InstrKind::Load(name))
    }

    pub fn attr(&mut self, object: InstrId, name: &str) -> InstrId {
        let name = self.name(name);
        self.alloc(InstrKind::Attribute { object, name })
    }

    pub fn index(&mut self, object: InstrId, index: InstrId) -> InstrId {
        self.alloc(InstrKind::Index { object, index })
    }

    // Assignment

    pub fn assign(&mut self, target: InstrId, value: InstrId) -> InstrId {
        self.alloc(InstrKind::Assign { target, value })
    }

    /// `name = value`
    pub fn assign_name(&mut self, name: &str, value: InstrId) -> InstrId {
        let target = self.load(name);
        self.assign(target, value)
    }

    pub fn delete(&mut self, target: InstrId) -> InstrId {
        self.alloc(InstrKind::Delete { target })
    }

    pub fn global_decl(&mut self, names: &[&str]) -> InstrId {
        let names = names.iter().map(|n| self.name(n)).collect();
        self.alloc(InstrKind::Global(names))
    }

    pub fn nonlocal_decl(&mut self, names: &[&str]) -> InstrId {
        let names = names.iter().map(|n| self.name(n)).collect();
        self.alloc(InstrKind::Nonlocal(names))
    }

    // Operators

    pub fn binary(&mut self, op: BinaryOp, lhs: InstrId, rhs: InstrId) -> InstrId {
        self.alloc(InstrKind::Binary { op, lhs, rhs })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: InstrId) -> InstrId {
        self.alloc(InstrKind::Unary { op, operand })
    }

    pub fn logic(&mut self, op: BoolOp, lhs: InstrId, rhs: InstrId) -> InstrId {
        self.alloc(InstrKind::Logic { op, lhs, rhs })
    }

    // Calls

    pub fn call(&mut self, callee: InstrId, args: Vec<InstrId>) -> InstrId {
        let args = args
            .into_iter()
            .map(|value| CallArg {
                kind: CallArgKind::Positional,
                value,
            })
            .collect();
        self.alloc(InstrKind::Call { callee, args })
    }

    /// Call with positional and keyword arguments.
    pub fn call_kw(
        &mut self,
        callee: InstrId,
        positional: Vec<InstrId>,
        keywords: &[(&str, InstrId)],
    ) -> InstrId {
        let mut args: Vec<CallArg> = positional
            .into_iter()
            .map(|value| CallArg {
                kind: CallArgKind::Positional,
                value,
            })
            .collect();
        for (name, value) in keywords {
            args.push(CallArg {
                kind: CallArgKind::Keyword(self.name(name)),
                value: *value,
            });
        }
        self.alloc(InstrKind::Call { callee, args })
    }

    /// `callee(args...)` where callee is a module-scope name.
    pub fn call_name(&mut self, callee: &str, args: Vec<InstrId>) -> InstrId {
        let callee = self.load(callee);
        self.call(callee, args)
    }

    // Control flow

    pub fn if_stmt(
        &mut self,
        branches: Vec<(InstrId, Vec<InstrId>)>,
        else_body: Vec<InstrId>,
    ) -> InstrId {
        self.alloc(InstrKind::If {
            branches,
            else_body,
        })
    }

    pub fn while_stmt(&mut self, cond: InstrId, body: Vec<InstrId>) -> InstrId {
        self.alloc(InstrKind::While { cond, body })
    }

    pub fn for_stmt(&mut self, target: &str, iterable: InstrId, body: Vec<InstrId>) -> InstrId {
        let target = self.name(target);
        self.alloc(InstrKind::For {
            target,
            iterable,
            body,
        })
    }

    pub fn ret(&mut self, value: Option<InstrId>) -> InstrId {
        self.alloc(InstrKind::Return(value))
    }

    pub fn break_stmt(&mut self) -> InstrId {
        self.alloc(InstrKind::Break)
    }

    pub fn continue_stmt(&mut self) -> InstrId {
        self.alloc(InstrKind::Continue)
    }

    pub fn raise(&mut self, operand: InstrId) -> InstrId {
        self.alloc(InstrKind::Raise(operand))
    }

    pub fn try_stmt(
        &mut self,
        body: Vec<InstrId>,
        handlers: Vec<ExceptHandler>,
        else_body: Vec<InstrId>,
        finally_body: Vec<InstrId>,
    ) -> InstrId {
        self.alloc(InstrKind::Try {
            body,
            handlers,
            else_body,
            finally_body,
        })
    }

    /// `except class as binding:` clause.
    pub fn handler(
        &self,
        class: Option<InstrId>,
        binding: Option<&str>,
        body: Vec<InstrId>,
    ) -> ExceptHandler {
        ExceptHandler {
            class,
            binding: binding.map(|name| self.name(name)),
            body,
        }
    }

    // Definitions

    pub fn param(&self, name: &str) -> Param {
        Param {
            name: self.name(name),
            default: None,
            kind: ParamKind::Normal,
        }
    }

    pub fn param_default(&self, name: &str, default: InstrId) -> Param {
        Param {
            name: self.name(name),
            default: Some(default),
            kind: ParamKind::Normal,
        }
    }

    pub fn param_varargs(&self, name: &str) -> Param {
        Param {
            name: self.name(name),
            default: None,
            kind: ParamKind::VarArgs,
        }
    }

    pub fn param_kwargs(&self, name: &str) -> Param {
        Param {
            name: self.name(name),
            default: None,
            kind: ParamKind::KwArgs,
        }
    }

    pub fn func_def(&mut self, name: &str, params: Vec<Param>, body: Vec<InstrId>) -> InstrId {
        let name = self.name(name);
        self.alloc(InstrKind::FunctionDef { name, params, body })
    }

    /// Function whose parameters are all plain names.
    pub fn simple_func(&mut self, name: &str, params: &[&str], body: Vec<InstrId>) -> InstrId {
        let params = params.iter().map(|p| self.param(p)).collect();
        self.func_def(name, params, body)
    }

    pub fn class_def(&mut self, name: &str, bases: Vec<InstrId>, body: Vec<InstrId>) -> InstrId {
        let name = self.name(name);
        self.alloc(InstrKind::ClassDef { name, bases, body })
    }

    pub fn import(&mut self, module: &str, names: ImportNames) -> InstrId {
        let module = self.name(module);
        self.alloc(InstrKind::Import { module, names })
    }

    /// `print(arg)`
    pub fn print1(&mut self, arg: InstrId) -> InstrId {
        self.call_name("print", vec![arg])
    }

    /// Finish building: the shared tree plus interner.
    pub fn build(self) -> (SharedTree, Rc<StringInterner>) {
        (Rc::new(self.arena), self.interner)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a program and run it in a fresh output-capturing interpreter.
///
/// Returns the interpreter (for output and scope assertions) and the
/// run result.
pub fn run_program(
    build: impl FnOnce(&mut TreeBuilder) -> Vec<InstrId>,
) -> (
    Interpreter,
    Result<(), crate::interpreter::UncaughtException>,
) {
    let mut builder = TreeBuilder::new();
    let program = build(&mut builder);
    let (tree, interner) = builder.build();
    let mut interp = InterpreterBuilder::new(tree, interner)
        .script_name("test.kea")
        .capture_output()
        .build();
    let result = interp.run(&program);
    (interp, result)
}

/// Like [`run_program`], with a module loader installed.
pub fn run_program_with_loader(
    loader: Box<dyn ModuleLoader>,
    build: impl FnOnce(&mut TreeBuilder) -> Vec<InstrId>,
) -> (
    Interpreter,
    Result<(), crate::interpreter::UncaughtException>,
) {
    let mut builder = TreeBuilder::new();
    let program = build(&mut builder);
    let (tree, interner) = builder.build();
    let mut interp = InterpreterBuilder::new(tree, interner)
        .script_name("test.kea")
        .capture_output()
        .module_loader(loader)
        .build();
    let result = interp.run(&program);
    (interp, result)
}
