//! Edge-triggered transition detection.
//!
//! A detector holds the last-observed value for one concern and turns a
//! stream of polled values into a stream of changes: exactly one
//! [`Transition`] per maximal run of equal values, nothing while a
//! value repeats.

/// A detected change for one concern.
///
/// Ephemeral: consumed by the watcher that observed it, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T> {
    /// The value before the change; `None` on the first observation.
    pub previous: Option<T>,
    /// The value after the change.
    pub current: T,
}

impl<T> Transition<T> {
    /// Whether this is the first observation for the concern.
    pub fn is_initial(&self) -> bool {
        self.previous.is_none()
    }
}

/// Holds the last-observed value for one concern and emits a
/// [`Transition`] only when a newly observed value differs.
///
/// # Example
///
/// ```
/// use statuswatch_engine::TransitionDetector;
///
/// let mut detector = TransitionDetector::new();
/// assert!(detector.observe(false).is_some()); // first observation
/// assert!(detector.observe(false).is_none()); // stable, no event
/// let edge = detector.observe(true).unwrap();
/// assert_eq!(edge.previous, Some(false));
/// ```
#[derive(Debug)]
pub struct TransitionDetector<T> {
    previous: Option<T>,
}

impl<T> Default for TransitionDetector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TransitionDetector<T> {
    /// Create a detector with no value observed yet.
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// The last value this detector saw, if any.
    pub fn last(&self) -> Option<&T> {
        self.previous.as_ref()
    }
}

impl<T: Clone> TransitionDetector<T> {
    /// Observe a polled value, using `PartialEq` as the equality rule.
    ///
    /// Derived `PartialEq` gives structural equality for composite
    /// records, which is the rule every current concern wants.
    pub fn observe(&mut self, current: T) -> Option<Transition<T>>
    where
        T: PartialEq,
    {
        self.observe_with(current, |a, b| a == b)
    }

    /// Observe a polled value with a caller-supplied equality rule.
    ///
    /// The stored value is updated on every observation, transition or
    /// not; the detector must see every polled value to guarantee no
    /// missed edge.
    pub fn observe_with(
        &mut self,
        current: T,
        eq: impl Fn(&T, &T) -> bool,
    ) -> Option<Transition<T>> {
        match &self.previous {
            Some(previous) if eq(previous, &current) => {
                self.previous = Some(current);
                None
            }
            _ => {
                let previous = self.previous.replace(current.clone());
                Some(Transition { previous, current })
            }
        }
    }
}
