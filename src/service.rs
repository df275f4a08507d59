//! Opaque service values stored in a registry.
//!
//! The registry treats every service as an opaque, reference-counted payload. Two notions of
//! equality exist for such payloads:
//!
//! - **Deep equality** ([`PartialEq`] on [`Service`]) compares the concrete values when both
//!   services hold the same type.
//! - **Reference identity** ([`Service::ptr_eq`]) compares the shared allocation only. It is
//!   cheaper and conservative: identical references are always deep-equal, the converse does not
//!   hold.
//!
//! # Examples
//!
//! ```rust
//! use capenv::Service;
//!
//! let a = Service::new(42_u32);
//! let b = Service::new(42_u32);
//!
//! assert_eq!(a, b);
//! assert!(!a.ptr_eq(&b));
//! assert_eq!(a.downcast_ref::<u32>(), Some(&42));
//! ```

use std::{
    any::Any,
    fmt,
    sync::{Arc, LazyLock},
};

/// Object-safe view of a service payload.
///
/// Blanket-implemented for every `'static` type that is `PartialEq + Debug + Send + Sync`, so
/// user code never implements it by hand.
pub trait ServiceValue: Any + fmt::Debug + Send + Sync {
    /// Returns the payload as [`Any`] for checked downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared payload into a shared [`Any`] for checked downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Compares two payloads, returning `false` when their concrete types differ.
    fn dyn_eq(&self, other: &dyn ServiceValue) -> bool;
}

impl<T> ServiceValue for T
where
    T: Any + PartialEq + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn dyn_eq(&self, other: &dyn ServiceValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

static UNIT: LazyLock<Service> = LazyLock::new(|| Service::new(()));

/// A shared, type-erased service instance.
///
/// Cloning a `Service` shares the same payload; [`ptr_eq`](Self::ptr_eq) holds between clones.
#[derive(Clone)]
pub struct Service(Arc<dyn ServiceValue>);

impl Service {
    /// Wraps a value into a new service.
    ///
    /// # Arguments
    ///
    /// * `value` - The service payload
    #[must_use]
    pub fn new<S>(value: S) -> Self
    where
        S: Any + PartialEq + fmt::Debug + Send + Sync,
    {
        Service(Arc::new(value))
    }

    /// Wraps an already shared value without copying it.
    ///
    /// # Arguments
    ///
    /// * `value` - The shared service payload
    #[must_use]
    pub fn from_arc<S>(value: Arc<S>) -> Self
    where
        S: Any + PartialEq + fmt::Debug + Send + Sync,
    {
        Service(value)
    }

    /// The unit service, resolved for the "no requirement" capability on an empty registry.
    ///
    /// Every call returns a clone of the same shared payload.
    #[must_use]
    pub fn unit() -> Self {
        UNIT.clone()
    }

    /// Returns `true` if both services share the same payload allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Service) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` if the payload is of type `S`.
    #[must_use]
    pub fn is<S: Any>(&self) -> bool {
        self.0.as_any().is::<S>()
    }

    /// Borrows the payload as `S`, if it has that type.
    #[must_use]
    pub fn downcast_ref<S: Any>(&self) -> Option<&S> {
        self.0.as_any().downcast_ref::<S>()
    }

    /// Returns a shared handle to the payload as `S`, if it has that type.
    #[must_use]
    pub fn downcast<S: Any + Send + Sync>(&self) -> Option<Arc<S>> {
        Arc::clone(&self.0).into_any().downcast::<S>().ok()
    }

    /// Address of the payload, stable for the lifetime of any clone of this service.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

/// Reference identity between two optional services, used for scope comparison.
pub(crate) fn same_identity(a: Option<&Service>, b: Option<&Service>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.ptr_eq(b),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.dyn_eq(other.0.as_ref())
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
