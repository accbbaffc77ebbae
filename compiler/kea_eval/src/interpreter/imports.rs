//! The module-import seam.
//!
//! Loading and evaluating another module is an external collaborator's
//! job; the engine only consumes the resulting export table and copies
//! bindings into the current scope.

use kea_ir::{ImportNames, Name};

use super::Interpreter;
use crate::errors::{import_failed, unknown_import, EvalResult};
use crate::value::{DictKey, DictValue, Value};

/// External collaborator that resolves `import` instructions.
///
/// Implementations typically parse and evaluate the target module and
/// return its top-level scope as name/value pairs, in binding order.
pub trait ModuleLoader {
    /// Load a module's exports. `Err` carries a human-readable reason
    /// and surfaces as an `ImportError`.
    fn load(&self, module: &str) -> Result<Vec<(String, Value)>, String>;
}

impl Interpreter {
    pub(crate) fn eval_import(&mut self, module: Name, names: &ImportNames) -> EvalResult {
        let module_name = self.interner().lookup(module);
        let Some(loader) = &self.module_loader else {
            return Err(import_failed(module_name, "no module loader installed").into());
        };
        let exports = loader
            .load(module_name)
            .map_err(|reason| import_failed(module_name, &reason))?;

        match names {
            // `import m`: the whole module becomes one mapping value.
            ImportNames::Module => {
                let mut dict = DictValue::new();
                for (key, value) in exports {
                    dict.insert(DictKey::Str(key.into()), value);
                }
                self.bind_name(module, Value::dict(dict))?;
            }
            // `from m import a, b`: copy the named bindings.
            ImportNames::Names(names) => {
                for &name in names {
                    let wanted = self.interner().lookup(name);
                    let found = exports
                        .iter()
                        .find(|(key, _)| key == wanted)
                        .map(|(_, value)| value.clone())
                        .ok_or_else(|| unknown_import(wanted, module_name))?;
                    self.bind_name(name, found)?;
                }
            }
            // `from m import *`: copy everything.
            ImportNames::Star => {
                for (key, value) in exports {
                    let name = self.interner().intern(&key);
                    self.bind_name(name, value)?;
                }
            }
        }
        Ok(Value::None)
    }
}
