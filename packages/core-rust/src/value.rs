//! Type-erased values carried through a dispatch: the parameter snapshot and
//! the return slot.

use std::any::Any;
use std::fmt;

// ---------------------------------------------------------------------------
// DynValue
// ---------------------------------------------------------------------------

/// Any `'static` value that can be printed and sent across threads.
///
/// Blanket-implemented for every `T: Any + Debug + Send`, so arguments and
/// return values never need to opt in.
pub trait DynValue: Any + fmt::Debug + Send {
    /// Borrow as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert into an owned `Box<dyn Any>` for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + fmt::Debug + Send> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Owned, type-erased value.
pub type BoxedValue = Box<dyn DynValue>;

impl dyn DynValue {
    /// Returns `true` if the erased value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the erased value as a `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Unbox an erased value into a `T`. A value of any other type is dropped.
pub(crate) fn unbox<T: Any>(value: BoxedValue) -> Option<T> {
    DynValue::into_any(value).downcast::<T>().ok().map(|boxed| *boxed)
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Ordered snapshot of the arguments of one intercepted call.
///
/// Every interceptor sees the same snapshot. Replacing an entry changes what
/// later interceptors observe; the terminal closure is bound to the arguments
/// it captured when the dispatch body was written.
#[derive(Debug, Default)]
pub struct Parameters {
    values: Vec<BoxedValue>,
}

impl Parameters {
    /// Snapshot with no arguments.
    #[must_use]
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append an argument. Order of `push` calls is argument order.
    pub fn push<V: DynValue>(&mut self, value: V) {
        self.values.push(Box::new(value));
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a method without arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&(dyn DynValue + 'static)> {
        self.values.get(index).map(AsRef::as_ref)
    }

    /// Argument at `index`, downcast to `T`.
    #[must_use]
    pub fn get_as<T: std::any::Any>(&self, index: usize) -> Option<&T> {
        self.get(index).and_then(|value| value.downcast_ref::<T>())
    }

    /// Replace the argument at `index`, returning the previous one.
    ///
    /// Returns `None` and leaves the snapshot untouched when `index` is out of
    /// range.
    pub fn set<V: DynValue>(&mut self, index: usize, value: V) -> Option<BoxedValue> {
        let slot = self.values.get_mut(index)?;
        Some(std::mem::replace(slot, Box::new(value)))
    }

    /// Iterate the arguments in order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn DynValue + 'static)> {
        self.values.iter().map(AsRef::as_ref)
    }
}

impl From<Vec<BoxedValue>> for Parameters {
    fn from(values: Vec<BoxedValue>) -> Self {
        Self { values }
    }
}

/// Comma-separated `Debug` rendering of each argument, for logs.
impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value:?}")?;
        }
        Ok(())
    }
}

/// Build a [`Parameters`] snapshot from an ordered argument list.
///
/// ```
/// use interpose_core::parameters;
///
/// let params = parameters!["alice".to_string(), 42_u32];
/// assert_eq!(params.len(), 2);
/// assert_eq!(params.get_as::<u32>(1), Some(&42));
/// ```
#[macro_export]
macro_rules! parameters {
    () => {
        $crate::Parameters::new()
    };
    ($($arg:expr),+ $(,)?) => {{
        let mut params = $crate::Parameters::new();
        $(params.push($arg);)+
        params
    }};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_sees_inner_value_not_box() {
        let value: BoxedValue = Box::new(String::from("hello"));
        assert!(value.is::<String>());
        assert!(!value.is::<BoxedValue>());
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hello"));
    }

    #[test]
    fn unbox_wrong_type_yields_none() {
        let value: BoxedValue = Box::new(5_i64);
        assert_eq!(unbox::<i32>(value), None);
        let value: BoxedValue = Box::new(5_i64);
        assert_eq!(unbox::<i64>(value), Some(5));
    }

    #[test]
    fn parameters_keep_argument_order() {
        let params = crate::parameters!["a", 2_u8, 'c'];
        let rendered: Vec<String> = params.iter().map(|v| format!("{v:?}")).collect();
        assert_eq!(rendered, vec!["\"a\"", "2", "'c'"]);
        assert_eq!(params.to_string(), "\"a\", 2, 'c'");
    }

    #[test]
    fn set_replaces_in_range_only() {
        let mut params = crate::parameters![1_u32];
        let old = params.set(0, 9_u32).and_then(unbox::<u32>);
        assert_eq!(old, Some(1));
        assert_eq!(params.get_as::<u32>(0), Some(&9));
        assert!(params.set(3, 0_u32).is_none());
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn empty_macro_builds_empty_snapshot() {
        let params = crate::parameters![];
        assert!(params.is_empty());
        assert_eq!(params.to_string(), "");
    }
}
