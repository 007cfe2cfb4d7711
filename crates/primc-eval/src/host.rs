//! Host functions: the implementation of `extern` methods.

use crate::error::RuntimeError;
use crate::value::Value;
use rustc_hash::FxHashMap;

/// Services `extern` method calls made by evaluated code.
pub trait Host {
    fn call_extern(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError>;
}

type HostFunction = Box<dyn FnMut(&[Value]) -> Result<Value, RuntimeError>>;

/// A host that records `Print` output and dispatches any other extern to a
/// registered closure.
#[derive(Default)]
pub struct RecordingHost {
    output: Vec<String>,
    functions: FxHashMap<String, HostFunction>,
}

impl RecordingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host function callable as `extern` method `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: FnMut(&[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        self.functions.insert(name.into(), Box::new(f));
    }

    /// Lines printed so far, one per `Print` call.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    #[must_use]
    pub fn into_output(self) -> Vec<String> {
        self.output
    }
}

impl Host for RecordingHost {
    fn call_extern(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        if name == "Print" {
            let line: Vec<String> = args.iter().map(ToString::to_string).collect();
            self.output.push(line.join(" "));
            return Ok(Value::Unit);
        }
        match self.functions.get_mut(name) {
            Some(f) => f(args),
            None => Err(RuntimeError::MissingHostFunction {
                name: name.to_string(),
            }),
        }
    }
}
