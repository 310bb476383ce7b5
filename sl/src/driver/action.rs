//! Step verdicts

/// Verdict of a stateless step function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<C, R = ()> {
    /// Pull the next chunk
    Continue,
    /// Stop the run
    Break {
        /// Data to push back onto the source so the next reader sees it first
        unconsumed: Option<C>,
        /// Value the run resolves with
        result: Option<R>,
    },
}

impl<C, R> Action<C, R> {
    /// Stop without pushing anything back or returning a result
    pub fn stop() -> Self {
        Action::Break {
            unconsumed: None,
            result: None,
        }
    }

    /// Stop and push `unconsumed` back onto the source
    pub fn stop_with(unconsumed: C) -> Self {
        Action::Break {
            unconsumed: Some(unconsumed),
            result: None,
        }
    }

    /// Stop and resolve the run with `result`
    pub fn finish(result: R) -> Self {
        Action::Break {
            unconsumed: None,
            result: Some(result),
        }
    }

    /// Stop, resolve with `result`, and push `unconsumed` back onto the source
    pub fn finish_with(result: R, unconsumed: C) -> Self {
        Action::Break {
            unconsumed: Some(unconsumed),
            result: Some(result),
        }
    }

    /// Check if this verdict stops the run
    pub fn is_break(&self) -> bool {
        matches!(self, Action::Break { .. })
    }

    /// Stateless runs thread `Option<R>` as their accumulator; it stays `None`
    /// until a `Break` supplies a result.
    pub(crate) fn into_accumulate(self, acc: Option<R>) -> Accumulate<Option<R>, C> {
        match self {
            Action::Continue => Accumulate::Continue(acc),
            Action::Break { unconsumed, result } => Accumulate::Break { acc: result, unconsumed },
        }
    }
}

/// Verdict of a stateful step function
///
/// Both variants hand the accumulator back; the run owns it between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulate<A, C> {
    /// Keep the updated accumulator and pull the next chunk
    Continue(A),
    /// Stop the run and resolve with `acc`
    Break {
        acc: A,
        /// Data to push back onto the source so the next reader sees it first
        unconsumed: Option<C>,
    },
}

impl<A, C> Accumulate<A, C> {
    /// Stop and resolve with `acc`
    pub fn stop(acc: A) -> Self {
        Accumulate::Break { acc, unconsumed: None }
    }

    /// Stop, resolve with `acc`, and push `unconsumed` back onto the source
    pub fn stop_with(acc: A, unconsumed: C) -> Self {
        Accumulate::Break {
            acc,
            unconsumed: Some(unconsumed),
        }
    }

    /// Check if this verdict stops the run
    pub fn is_break(&self) -> bool {
        matches!(self, Accumulate::Break { .. })
    }

    /// Borrow the accumulator carried by either variant
    pub fn acc(&self) -> &A {
        match self {
            Accumulate::Continue(acc) => acc,
            Accumulate::Break { acc, .. } => acc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_constructors() {
        assert_eq!(
            Action::<&str>::stop(),
            Action::Break {
                unconsumed: None,
                result: None
            }
        );
        assert_eq!(
            Action::<&str, u8>::finish_with(7, "rest"),
            Action::Break {
                unconsumed: Some("rest"),
                result: Some(7)
            }
        );
        assert!(Action::<&str>::stop_with("rest").is_break());
        assert!(!Action::<&str>::Continue.is_break());
    }

    #[test]
    fn test_continue_keeps_accumulator() {
        let verdict = Action::<&str, u8>::Continue.into_accumulate(None);
        assert_eq!(verdict, Accumulate::Continue(None));
    }

    #[test]
    fn test_break_moves_result_into_accumulator() {
        let verdict = Action::<&str, u8>::finish_with(3, "rest").into_accumulate(None);
        assert_eq!(verdict, Accumulate::stop_with(Some(3), "rest"));

        let verdict = Action::<&str, u8>::stop().into_accumulate(None);
        assert_eq!(verdict, Accumulate::stop(None));
    }

    #[test]
    fn test_accumulate_acc() {
        assert_eq!(*Accumulate::<_, ()>::Continue(4).acc(), 4);
        assert_eq!(*Accumulate::<_, ()>::stop(5).acc(), 5);
        assert!(Accumulate::<u8, &str>::stop_with(1, "x").is_break());
    }
}
