//! Outcome of one conditional evaluation.

/// The value a conditional produced, paired with the context it was
/// evaluated against.
///
/// For accepted candidates `result` is the transformed value; for rejected
/// ones it is the neutral value. Either way the context already reflects
/// the evaluation, so callers can read fresh statistics when emitting.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult<C, R> {
    context: C,
    result: R,
}

impl<C, R> FilterResult<C, R> {
    pub fn new(context: C, result: R) -> Self {
        Self { context, result }
    }

    /// Take the produced value.
    pub fn into_result(self) -> R {
        self.result
    }

    /// Borrow the produced value.
    pub fn result(&self) -> &R {
        &self.result
    }

    /// Borrow the context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Split into context and value.
    pub fn into_parts(self) -> (C, R) {
        (self.context, self.result)
    }

    /// Consume the value.
    pub fn apply<F>(self, consumer: F)
    where
        F: FnOnce(R),
    {
        consumer(self.result)
    }

    /// Consume the value together with the context.
    pub fn apply_with_context<F>(self, consumer: F)
    where
        F: FnOnce(&C, R),
    {
        consumer(&self.context, self.result)
    }

    /// Map the value, keeping the context.
    pub fn map<R2, F>(self, f: F) -> FilterResult<C, R2>
    where
        F: FnOnce(R) -> R2,
    {
        FilterResult {
            context: self.context,
            result: f(self.result),
        }
    }
}
