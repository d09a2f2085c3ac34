// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Completion plumbing for datagram sends.
//!
//! Every emit through a `MetricSink` carries a `SendToken` that the sink
//! resolves exactly once with the outcome of the send. For a single-name
//! metric the token routes straight to the caller's callback. For a
//! fan-out over several names, the tokens share a `BatchJoin` that counts
//! completions, accumulates byte totals, and fires the caller's callback
//! exactly once: with the first error encountered, or with the grand total
//! once every name has completed successfully.

use crate::types::{MetricError, MetricResult};
use std::io;
use std::sync::{Arc, Mutex};

/// Callback invoked at most once with the outcome of a logical send:
/// the total bytes written, or the first error encountered.
pub type SendCallback = Box<dyn FnOnce(MetricResult<usize>) + Send + 'static>;

/// Completion slot for one datagram send.
///
/// A `MetricSink` implementation must resolve the token it is handed
/// exactly once, via [`SendToken::complete`], after the send finishes or
/// fails. Completions may happen on any thread and in any order relative
/// to other sends of the same fan-out.
///
/// Dropping a token without completing it means the outcome of that send
/// is never observed; for a fan-out this leaves the batch callback waiting
/// forever. The client does this deliberately for sampled-out names.
pub struct SendToken {
    repr: TokenRepr,
}

enum TokenRepr {
    Direct(SendCallback),
    Member(Arc<BatchJoin>),
}

impl SendToken {
    /// Token for a lone send, routed straight to the caller's callback.
    pub(crate) fn direct(callback: SendCallback) -> SendToken {
        SendToken {
            repr: TokenRepr::Direct(callback),
        }
    }

    /// Resolve this send with the number of bytes written or an I/O error.
    pub fn complete(self, result: io::Result<usize>) {
        match self.repr {
            TokenRepr::Direct(callback) => callback(result.map_err(MetricError::from)),
            TokenRepr::Member(join) => join.complete_one(result),
        }
    }
}

impl std::fmt::Debug for SendToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.repr {
            TokenRepr::Direct(_) => write!(f, "SendToken::Direct"),
            TokenRepr::Member(ref join) => write!(f, "SendToken::Member(expected: {})", join.expected),
        }
    }
}

/// Join point for the completions of one multi-name send.
///
/// `expected` is the length of the original name sequence, fixed before
/// any sampling decision is made. Names dropped by sampling never complete,
/// so a partially sampled batch may never reach `expected` completions and
/// its callback then never fires. That mirrors the behavior of the wire
/// protocol's reference clients and is relied upon by callers that treat
/// the callback as "all names definitely sent".
pub(crate) struct BatchJoin {
    expected: usize,
    state: Mutex<JoinState>,
}

struct JoinState {
    completed: usize,
    bytes: usize,
    latched: bool,
    callback: Option<SendCallback>,
}

impl BatchJoin {
    pub(crate) fn new(expected: usize, callback: SendCallback) -> Arc<BatchJoin> {
        Arc::new(BatchJoin {
            expected,
            state: Mutex::new(JoinState {
                completed: 0,
                bytes: 0,
                latched: false,
                callback: Some(callback),
            }),
        })
    }

    /// Completion slot for one member of this batch.
    pub(crate) fn token(self: &Arc<Self>) -> SendToken {
        SendToken {
            repr: TokenRepr::Member(Arc::clone(self)),
        }
    }

    fn complete_one(&self, result: io::Result<usize>) {
        // The callback runs outside the lock; the Option take makes it
        // single-fire no matter how completions interleave.
        let fire = {
            let mut state = self.state.lock().unwrap();
            state.completed += 1;

            if state.latched {
                // An error was already delivered. Later completions, whether
                // success or error, are counted and then swallowed.
                None
            } else {
                match result {
                    Err(err) => {
                        state.latched = true;
                        state.callback.take().map(|cb| (cb, Err(MetricError::from(err))))
                    }
                    Ok(written) => {
                        state.bytes += written;
                        if state.completed >= self.expected {
                            let total = state.bytes;
                            state.callback.take().map(|cb| (cb, Ok(total)))
                        } else {
                            None
                        }
                    }
                }
            }
        };

        if let Some((callback, result)) = fire {
            callback(result);
        }
    }
}
