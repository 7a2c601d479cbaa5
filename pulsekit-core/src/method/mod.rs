pub mod binder;
pub mod registry;

pub use binder::{resolve_method_kwargs, ModuleState};
pub use registry::{MethodRegistry, RegisteredMethod};
