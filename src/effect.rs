//! Deferred, cancellable effects.
//!
//! An [`Io<T>`] is a computation that does nothing until [`Io::run`] drives it with a
//! [`Context`]. Every I/O-bearing step of the pipeline (reading configuration, encoding a
//! key, deriving a path, writing a file) is expressed as one, and the steps are glued
//! together with a handful of combinators:
//!
//! - [`lift`] turns a plain fallible function into an effect-producing one
//! - [`Io::bind`] sequences two effects, short-circuiting on the first error
//! - [`Io::or`] falls back to another effect when the first one fails
//! - [`all`] runs a list of effects in order and collects their results
//! - [`of`] / [`of_fn`] / [`fail`] build effects that succeed or fail unconditionally
//!
//! # Cancellation
//!
//! Cancellation is cooperative. A [`Context`] carries a shared flag (set through a
//! [`CancelHandle`]) and an optional deadline; effects that loop or block call
//! [`Context::check`] and stop with [`Error::Cancelled`] or [`Error::DeadlineExceeded`].
//!
//! # Example
//!
//! ```
//! use keyshard::effect::{lift, of, Context};
//! use keyshard::Error;
//!
//! let parse = lift(|s: String| s.parse::<usize>().map_err(|e| Error::config(e.to_string())));
//! let n = of("42".to_string()).bind(parse).or(of(7));
//! assert_eq!(n.run(&Context::background()).unwrap(), 42);
//! ```

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Execution context threaded through every effect.
///
/// Cheap to clone; clones share cancellation state. A context derived with
/// [`Context::with_cancel`] is cancelled when either its own handle or any ancestor's
/// handle fires.
#[derive(Clone, Debug, Default)]
pub struct Context {
    flags: Vec<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

/// Cancels the [`Context`] that created it and every context derived from that one.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that can additionally be cancelled through the returned handle.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let mut flags = self.flags.clone();
        flags.push(Arc::clone(&flag));
        let child = Self {
            flags,
            deadline: self.deadline,
        };
        (child, CancelHandle { flag })
    }

    /// Derive a context that expires at `deadline` (or earlier, if the parent does).
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(d) if d < deadline => d,
            _ => deadline,
        };
        Self {
            flags: self.flags.clone(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flags.iter().any(|f| f.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail if the context has been cancelled or its deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }
}

/// A deferred computation yielding `T` or an [`Error`].
///
/// Constructing an `Io` never performs work; only [`Io::run`] does. An `Io` is consumed by
/// running it.
#[must_use = "effects do nothing unless run"]
pub struct Io<'a, T> {
    thunk: Box<dyn FnOnce(&Context) -> Result<T> + 'a>,
}

impl<'a, T: 'a> Io<'a, T> {
    /// Wrap a closure as an effect.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&Context) -> Result<T> + 'a,
    {
        Self { thunk: Box::new(f) }
    }

    /// Drive the effect to completion.
    pub fn run(self, ctx: &Context) -> Result<T> {
        (self.thunk)(ctx)
    }

    /// Run `self`, then feed its result into `f` and run the effect it returns.
    ///
    /// If `self` fails, `f` is never called.
    pub fn bind<U: 'a, F>(self, f: F) -> Io<'a, U>
    where
        F: FnOnce(T) -> Io<'a, U> + 'a,
    {
        Io::new(move |ctx| {
            let t = self.run(ctx)?;
            f(t).run(ctx)
        })
    }

    /// Transform the result of a successful run.
    pub fn map<U: 'a, F>(self, f: F) -> Io<'a, U>
    where
        F: FnOnce(T) -> U + 'a,
    {
        Io::new(move |ctx| self.run(ctx).map(f))
    }

    /// Run `self`; if it fails, discard the error and run `fallback` instead.
    ///
    /// Cancellation is not a failure that can be recovered from: a cancelled or timed out
    /// primary propagates without running the fallback.
    pub fn or(self, fallback: Io<'a, T>) -> Io<'a, T> {
        Io::new(move |ctx| match self.run(ctx) {
            Ok(t) => Ok(t),
            Err(e) if e.is_cancellation() => Err(e),
            Err(_) => fallback.run(ctx),
        })
    }
}

/// An effect that always succeeds with `value` without touching the context.
pub fn of<'a, T: 'a>(value: T) -> Io<'a, T> {
    Io::new(move |_| Ok(value))
}

/// An effect that computes its value from an infallible function when run.
pub fn of_fn<'a, T: 'a, F>(f: F) -> Io<'a, T>
where
    F: FnOnce() -> T + 'a,
{
    Io::new(move |_| Ok(f()))
}

/// An effect that always fails with `err`.
pub fn fail<'a, T: 'a>(err: Error) -> Io<'a, T> {
    Io::new(move |_| Err(err))
}

/// Lift a fallible function into one that returns an effect.
///
/// The returned function can be handed straight to [`Io::bind`].
pub fn lift<'a, A: 'a, B: 'a, F>(f: F) -> impl Fn(A) -> Io<'a, B> + Clone + 'a
where
    F: Fn(A) -> Result<B> + Clone + 'a,
{
    move |a| {
        let f = f.clone();
        Io::new(move |_| f(a))
    }
}

/// Run `effects` in order, stopping at the first failure; collect results in input order.
///
/// The context is checked before each effect.
pub fn all<'a, T: 'a>(effects: Vec<Io<'a, T>>) -> Io<'a, Vec<T>> {
    Io::new(move |ctx| {
        let mut out = Vec::with_capacity(effects.len());
        for effect in effects {
            ctx.check()?;
            out.push(effect.run(ctx)?);
        }
        Ok(out)
    })
}
