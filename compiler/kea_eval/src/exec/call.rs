//! Call-site arguments and parameter binding.
//!
//! Binding order: positional arguments fill parameters left to right,
//! keyword arguments fill by name, defaults cover what remains.
//! A single `*args` collector takes surplus positionals as a list and
//! a single `**kwargs` collector takes surplus keywords as a dict.
//! Defaults are evaluated at call time, inside the callee's fresh
//! scope, so earlier parameters are visible to later defaults.

use kea_ir::{Name, ParamKind};
use smallvec::SmallVec;

use crate::errors::{
    missing_required_argument, unknown_keyword_argument, unknown_positional_argument,
    ControlAction,
};
use crate::interpreter::Interpreter;
use crate::value::{DictKey, DictValue, FunctionValue, Value};

/// Evaluated call-site arguments.
///
/// Most calls pass a handful of positionals; the small-vector keeps
/// them off the heap.
#[derive(Debug, Default)]
pub struct CallArgs {
    pub positional: SmallVec<[Value; 4]>,
    pub keywords: Vec<(Name, Value)>,
}

impl CallArgs {
    /// No arguments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Positional-only arguments.
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        CallArgs {
            positional: values.into_iter().collect(),
            keywords: Vec::new(),
        }
    }

    /// Insert the receiver in front of the positionals (bound-method
    /// calls supply `self` this way).
    pub fn prepend(&mut self, value: Value) {
        self.positional.insert(0, value);
    }
}

/// Bind call arguments to the callee's parameters, defining each
/// parameter in the interpreter's current (callee) scope.
pub fn bind_parameters(
    interp: &mut Interpreter,
    func: &FunctionValue,
    args: CallArgs,
) -> Result<(), ControlAction> {
    let func_name = interp.interner().lookup(func.name);

    let mut positional_params = Vec::new();
    let mut varargs_name = None;
    let mut kwargs_name = None;
    for param in &func.params {
        match param.kind {
            ParamKind::Normal => positional_params.push(param),
            ParamKind::VarArgs => varargs_name = Some(param.name),
            ParamKind::KwArgs => kwargs_name = Some(param.name),
        }
    }

    // Positional fill, left to right; surplus goes to *args or fails.
    let given = args.positional.len();
    let mut slots: Vec<Option<Value>> = Vec::with_capacity(positional_params.len());
    slots.resize_with(positional_params.len(), || None);
    let mut surplus_positional = Vec::new();
    for (index, value) in args.positional.into_iter().enumerate() {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(value);
        } else if varargs_name.is_some() {
            surplus_positional.push(value);
        } else {
            return Err(
                unknown_positional_argument(func_name, positional_params.len(), given).into(),
            );
        }
    }

    // Keyword fill by name, after positionals. A keyword targeting an
    // already-filled slot wins: keywords are applied later, so they
    // take precedence through ordering alone.
    let mut surplus_keywords: Vec<(Name, Value)> = Vec::new();
    for (name, value) in args.keywords {
        if let Some(index) = positional_params.iter().position(|p| p.name == name) {
            slots[index] = Some(value);
        } else if kwargs_name.is_some() {
            surplus_keywords.push((name, value));
        } else {
            return Err(
                unknown_keyword_argument(func_name, interp.interner().lookup(name)).into(),
            );
        }
    }

    // Defaults and definition, in declaration order: a default may
    // read parameters bound before it.
    for (param, slot) in positional_params.iter().zip(slots) {
        let value = match slot {
            Some(value) => value,
            None => match param.default {
                Some(default) => interp.eval(default)?,
                None => {
                    return Err(missing_required_argument(
                        func_name,
                        interp.interner().lookup(param.name),
                    )
                    .into());
                }
            },
        };
        interp.env.define(param.name, value);
    }

    if let Some(name) = varargs_name {
        interp.env.define(name, Value::list(surplus_positional));
    }
    if let Some(name) = kwargs_name {
        let dict: DictValue = surplus_keywords
            .into_iter()
            .map(|(key, value)| {
                (DictKey::Str(interp.interner().lookup(key).into()), value)
            })
            .collect();
        interp.env.define(name, Value::dict(dict));
    }
    Ok(())
}
