use std::sync::{Arc, Weak};

/// Error type a fallible handler may report.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type HandlerResult = Result<(), HandlerError>;

/// Outcome of a single invocation, before panic containment.
#[doc(hidden)]
#[derive(Debug)]
pub enum Invocation {
    Delivered,
    Failed(HandlerError),
    TargetGone,
}

/// The erased, but still payload-typed, form every handler is stored as.
#[doc(hidden)]
pub type Invoker<E> = Arc<dyn Fn(&E) -> Invocation + Send + Sync>;

// Shape markers. They only exist so a closure's arity and return type can
// select an `IntoHandler` impl without overlapping.
pub struct NoPayload;
pub struct WithPayload;
pub struct Fallible;

/// Anything that can be subscribed to events of type `E`.
///
/// Implemented for `Fn()`, `Fn(&E)` and `Fn(&E) -> Result<(), Er>`.
/// Closures taking the payload need an annotated argument type
/// (`|e: &MyEvent| ...`) so the shape can be inferred.
pub trait IntoHandler<E, Marker>: Send + Sync + 'static {
    #[doc(hidden)]
    fn into_invoker(self) -> Invoker<E>;
}

impl<E, F> IntoHandler<E, NoPayload> for F
where
    E: 'static,
    F: Fn() + Send + Sync + 'static,
{
    fn into_invoker(self) -> Invoker<E> {
        Arc::new(move |_: &E| {
            self();
            Invocation::Delivered
        })
    }
}

impl<E, F> IntoHandler<E, WithPayload> for F
where
    E: 'static,
    F: Fn(&E) + Send + Sync + 'static,
{
    fn into_invoker(self) -> Invoker<E> {
        Arc::new(move |event: &E| {
            self(event);
            Invocation::Delivered
        })
    }
}

impl<E, F, Er> IntoHandler<E, (Fallible, Er)> for F
where
    E: 'static,
    Er: Into<HandlerError> + 'static,
    F: Fn(&E) -> Result<(), Er> + Send + Sync + 'static,
{
    fn into_invoker(self) -> Invoker<E> {
        Arc::new(move |event: &E| match self(event) {
            Ok(()) => Invocation::Delivered,
            Err(e) => Invocation::Failed(e.into()),
        })
    }
}

/// A method of `T` that can be bound to a target and subscribed to `E`.
///
/// Implemented for `Fn(&T)` and `Fn(&T, &E)`, which covers plain method
/// paths such as `Counter::on_tick`.
pub trait IntoMethodHandler<T, E, Marker>: Send + Sync + 'static {
    #[doc(hidden)]
    fn bind(self, target: Weak<T>) -> Invoker<E>;
}

impl<T, E, F> IntoMethodHandler<T, E, NoPayload> for F
where
    T: Send + Sync + 'static,
    E: 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    fn bind(self, target: Weak<T>) -> Invoker<E> {
        Arc::new(move |_: &E| match target.upgrade() {
            Some(target) => {
                self(&target);
                Invocation::Delivered
            },
            None => Invocation::TargetGone,
        })
    }
}

impl<T, E, F> IntoMethodHandler<T, E, WithPayload> for F
where
    T: Send + Sync + 'static,
    E: 'static,
    F: Fn(&T, &E) + Send + Sync + 'static,
{
    fn bind(self, target: Weak<T>) -> Invoker<E> {
        Arc::new(move |event: &E| match target.upgrade() {
            Some(target) => {
                self(&target, event);
                Invocation::Delivered
            },
            None => Invocation::TargetGone,
        })
    }
}
