// Instance registry collaborator used to resolve by-name invocations

use crate::command::trait_def::OperationFuture;
use serde_json::Value;
use std::sync::Arc;

/// An object (an editor, a canvas, ...) whose methods can be invoked by name
pub trait Instance: Send + Sync {
    /// Invoke `method` with `args`
    ///
    /// Should resolve to `CommandError::UnknownMethod` when there is no such method.
    fn invoke(&self, method: &str, args: Vec<Value>) -> OperationFuture;
}

/// Host-side lookup of live instances
///
/// Called with the value of the invocation's id attribute, or `None` when the
/// invocation carries no id.
pub trait InstanceRegistry: Send + Sync {
    fn get_instance(&self, id: Option<&Value>) -> Option<Arc<dyn Instance>>;
}

/// Registry backed by a closure
pub struct FnRegistry<F>(pub F);

impl<F> InstanceRegistry for FnRegistry<F>
where
    F: Fn(Option<&Value>) -> Option<Arc<dyn Instance>> + Send + Sync,
{
    fn get_instance(&self, id: Option<&Value>) -> Option<Arc<dyn Instance>> {
        (self.0)(id)
    }
}
