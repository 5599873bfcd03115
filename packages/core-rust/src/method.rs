//! Method descriptors. Diagnostics only; they never influence dispatch.

use std::fmt;

/// Identifies one method of a type, e.g. `Greeter::greet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Declaring trait or type name.
    pub type_name: &'static str,
    /// Method name.
    pub method: &'static str,
}

impl MethodDescriptor {
    #[must_use]
    pub const fn new(type_name: &'static str, method: &'static str) -> Self {
        Self { type_name, method }
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.type_name, self.method)
    }
}

/// The interface method being called and the implementation method that
/// ultimately serves it.
///
/// Dispatch bodies usually keep one `const` pair per method:
///
/// ```
/// use interpose_core::{MethodDescriptor, MethodPair};
///
/// const GREET: MethodPair = MethodPair::new(
///     MethodDescriptor::new("Greeter", "greet"),
///     MethodDescriptor::new("EnglishGreeter", "greet"),
/// );
/// assert_eq!(GREET.interface.to_string(), "Greeter::greet");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodPair {
    pub interface: MethodDescriptor,
    pub implementation: MethodDescriptor,
}

impl MethodPair {
    #[must_use]
    pub const fn new(interface: MethodDescriptor, implementation: MethodDescriptor) -> Self {
        Self {
            interface,
            implementation,
        }
    }
}
