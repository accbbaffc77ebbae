//! Builder for configuring an [`Interpreter`].

use std::rc::Rc;

use kea_ir::{SharedTree, StringInterner};

use super::{DunderNames, Interpreter, ModuleLoader};
use crate::builtins::{install_builtins, TypeRegistry};
use crate::diagnostics::CallStack;
use crate::environment::Environment;
use crate::print_handler::PrintHandler;

/// Default user-level recursion limit, in call frames.
const DEFAULT_RECURSION_LIMIT: usize = 1000;

/// Builder for [`Interpreter`].
///
/// ```text
/// let mut interp = InterpreterBuilder::new(tree, interner)
///     .script_name("main.kea")
///     .capture_output()
///     .build();
/// interp.run(&program)?;
/// ```
pub struct InterpreterBuilder {
    tree: SharedTree,
    interner: Rc<StringInterner>,
    script_name: String,
    source: Option<String>,
    recursion_limit: Option<usize>,
    print_handler: PrintHandler,
    module_loader: Option<Box<dyn ModuleLoader>>,
}

impl InterpreterBuilder {
    /// Start a builder from the program's tree and interner.
    pub fn new(tree: SharedTree, interner: Rc<StringInterner>) -> Self {
        InterpreterBuilder {
            tree,
            interner,
            script_name: "<script>".to_owned(),
            source: None,
            recursion_limit: Some(DEFAULT_RECURSION_LIMIT),
            print_handler: PrintHandler::Stdout,
            module_loader: None,
        }
    }

    /// Script name used in tracebacks.
    #[must_use]
    pub fn script_name(mut self, name: impl Into<String>) -> Self {
        self.script_name = name.into();
        self
    }

    /// Program source text; tracebacks quote the offending lines when
    /// it is available.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Override the user-level recursion limit (`None` = unlimited;
    /// the host stack still grows on demand).
    #[must_use]
    pub fn recursion_limit(mut self, limit: Option<usize>) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Capture `print` output in a buffer instead of writing stdout.
    #[must_use]
    pub fn capture_output(mut self) -> Self {
        self.print_handler = PrintHandler::buffer();
        self
    }

    /// Install the module-import collaborator.
    #[must_use]
    pub fn module_loader(mut self, loader: Box<dyn ModuleLoader>) -> Self {
        self.module_loader = Some(loader);
        self
    }

    /// Build the interpreter: interns the dunder names, registers the
    /// builtin classes, and seeds the module scope.
    pub fn build(self) -> Interpreter {
        let dunders = DunderNames::new(&self.interner);
        let registry = TypeRegistry::new(&self.interner);
        let mut env = Environment::new();
        install_builtins(&mut env, &self.interner, &registry);
        let module_frame_name = self.interner.intern("<module>");

        Interpreter {
            interner: self.interner,
            tree: self.tree,
            env,
            call_stack: CallStack::new(self.recursion_limit),
            registry,
            dunders,
            print_handler: self.print_handler,
            module_loader: self.module_loader,
            method_ctx: None,
            script_name: self.script_name,
            source: self.source,
            module_frame_name,
        }
    }
}
