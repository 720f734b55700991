use crate::app::error::TestError;
use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub type Verdict = Result<(), TestError>;

/// Values with a notion of truthiness: `false`, zero, `None` and empty
/// strings or collections are falsy, everything else is truthy.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

/// Containers that can be asked whether they hold an item.
pub trait Contains<I: ?Sized> {
    fn contains_item(&self, item: &I) -> bool;
}

pub struct Expectation<T> {
    actual: T,
}

/// Starts an expectation about `actual`.
pub fn expect<T>(actual: T) -> Expectation<T> {
    Expectation { actual }
}

impl<T: Debug> Expectation<T> {
    #[track_caller]
    pub fn to_equal<U>(self, expected: U) -> Verdict
    where
        T: PartialEq<U>,
        U: Debug,
    {
        trace!("Check equals of {:?} to {:?}", self.actual, expected);
        self.check(self.actual == expected, || {
            format!("expected {:?} to equal {:?}", self.actual, expected)
        })
    }

    #[track_caller]
    pub fn to_not_equal<U>(self, unexpected: U) -> Verdict
    where
        T: PartialEq<U>,
        U: Debug,
    {
        self.check(self.actual != unexpected, || {
            format!("expected {:?} to not equal {:?}", self.actual, unexpected)
        })
    }

    #[track_caller]
    pub fn to_be_truthy(self) -> Verdict
    where
        T: Truthy,
    {
        self.check(self.actual.is_truthy(), || {
            format!("expected {:?} to be truthy", self.actual)
        })
    }

    #[track_caller]
    pub fn to_be_falsy(self) -> Verdict
    where
        T: Truthy,
    {
        self.check(!self.actual.is_truthy(), || {
            format!("expected {:?} to be falsy", self.actual)
        })
    }

    #[track_caller]
    pub fn to_contain<I>(self, item: &I) -> Verdict
    where
        T: Contains<I>,
        I: Debug + ?Sized,
    {
        self.check(self.actual.contains_item(item), || {
            format!("expected {:?} to contain {:?}", self.actual, item)
        })
    }

    #[track_caller]
    fn check(&self, holds: bool, message: impl FnOnce() -> String) -> Verdict {
        if holds {
            Ok(())
        } else {
            Err(TestError::located(message()))
        }
    }
}

impl<F> Expectation<F> {
    /// Passes when the closure returns `Err` or panics.
    #[track_caller]
    pub fn to_throw<R, E>(self) -> Verdict
    where
        F: FnOnce() -> Result<R, E>,
        R: Debug,
    {
        let thrown = match catch_unwind(AssertUnwindSafe(self.actual)) {
            Ok(Ok(value)) => Err(value),
            Ok(Err(_)) | Err(_) => Ok(()),
        };
        match thrown {
            Ok(()) => Ok(()),
            Err(value) => Err(TestError::located(format!(
                "expected function to throw, but it returned {:?}",
                value
            ))),
        }
    }
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl Truthy for &str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

macro_rules! truthy_number {
    ($($number: ty),*) => {
        $(impl Truthy for $number {
            fn is_truthy(&self) -> bool {
                *self != (0 as $number)
            }
        })*
    };
}

truthy_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Contains<str> for &str {
    fn contains_item(&self, item: &str) -> bool {
        self.contains(item)
    }
}

impl Contains<str> for String {
    fn contains_item(&self, item: &str) -> bool {
        self.contains(item)
    }
}

impl<T: PartialEq> Contains<T> for Vec<T> {
    fn contains_item(&self, item: &T) -> bool {
        self.contains(item)
    }
}

impl<T: PartialEq> Contains<T> for &[T] {
    fn contains_item(&self, item: &T) -> bool {
        self.contains(item)
    }
}
