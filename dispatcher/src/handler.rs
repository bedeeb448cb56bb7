//! The handler abstraction: a named async function plus the descriptors of the parameters it
//! wants resolved.
//!
//! Free functions, closures, associated functions and methods bound to a shared receiver all
//! become the same [`Handler`] at registration time; nothing branches on the callable's shape at
//! dispatch time.

use std::any::{self, Any};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use telecore_core::{type_key, Container, Dependency, MessageHandler, Result, RouteError, Update};

/// Boxed future returned by every handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

type HandlerFn = dyn Fn(Args) -> HandlerFuture + Send + Sync;

/// Declared parameter: a name and an optional type key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    type_key: Option<&'static str>,
}

impl Param {
    /// Parameter resolved by name only.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_key: None,
        }
    }

    /// Parameter declared with type `T`; resolved by type key, with overrides also matched by name.
    pub fn typed<T: Any + ?Sized>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_key: Some(type_key::<T>()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> Option<&'static str> {
        self.type_key
    }
}

/// Resolved argument list, in parameter declaration order.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Dependency>);

impl Args {
    pub fn new(values: Vec<Dependency>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dependency(&self, index: usize) -> Option<&Dependency> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.0.iter()
    }

    /// Argument `index` as a `T`; fails if missing, null or of another type.
    pub fn get<T: Any>(&self, index: usize) -> Result<&T> {
        self.get_opt(index).ok_or(RouteError::ArgumentType {
            index,
            expected: any::type_name::<T>(),
        })
    }

    /// Argument `index` as a `T`, or `None` if missing, null or of another type.
    pub fn get_opt<T: Any>(&self, index: usize) -> Option<&T> {
        self.0.get(index)?.downcast_ref::<T>()
    }

    /// Argument `index` as a shared `Arc<T>`.
    pub fn get_arc<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        self.0
            .get(index)
            .and_then(|d| d.downcast_arc::<T>())
            .ok_or(RouteError::ArgumentType {
                index,
                expected: any::type_name::<T>(),
            })
    }
}

impl From<Vec<Dependency>> for Args {
    fn from(values: Vec<Dependency>) -> Self {
        Self(values)
    }
}

impl FromIterator<Dependency> for Args {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A callable plus its parameter descriptors. Cheap to clone; clones share identity
/// (see [`Handler::ptr_eq`]).
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    params: Vec<Param>,
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Wraps a free function, closure or associated function.
    pub fn new<F, Fut>(name: &str, f: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let func: Arc<HandlerFn> =
            Arc::new(move |args: Args| -> HandlerFuture { Box::pin(f(args)) });
        Self {
            name: Arc::from(name),
            params: Vec::new(),
            func,
        }
    }

    /// Wraps a method bound to a shared receiver.
    pub fn method<T, F, Fut>(name: &str, receiver: Arc<T>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::new(name, move |args| f(receiver.clone(), args))
    }

    /// Adapts a [`MessageHandler`] (an entity router, a chain, ...) into a handler taking the
    /// `request` and the dispatch's `container`, which is forwarded so the routed handlers can
    /// resolve the session and other per-update entries.
    ///
    /// Whether the message was taken is logged, not returned: the adapted handler completes with
    /// `Ok(())` even when no inner handler took the message.
    pub fn from_message_handler(name: &str, handler: Arc<dyn MessageHandler>) -> Self {
        let handler_name: Arc<str> = Arc::from(name);
        Self::new(name, move |args: Args| {
            let handler = handler.clone();
            let handler_name = handler_name.clone();
            async move {
                let request = args.get_arc::<Update>(0)?;
                let container = args.get_opt::<Container>(1);
                let handled = handler.handle_message(&request, container).await?;
                tracing::debug!(handler = %handler_name, handled, "step: message handler finished");
                Ok(())
            }
        })
        .param(Param::typed::<Update>("request"))
        .param(Param::typed::<Container>("container"))
    }

    /// Appends a parameter descriptor.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Invokes the handler with already-resolved arguments.
    pub fn call(&self, args: Args) -> HandlerFuture {
        (self.func)(args)
    }

    /// True when both handlers wrap the same registered callable.
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}
