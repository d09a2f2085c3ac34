// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Optional process-wide default client.
//!
//! Nothing in this crate consults the registry implicitly: clients are
//! plain values passed where they are needed. For applications that want a
//! single shared client without threading it through every call site, the
//! registry holds one `Arc<StatsdClient>` that can be set exactly once and
//! looked up from anywhere.
//!
//! # Example
//!
//! ```
//! use fanfare::prelude::*;
//! use fanfare::{NopMetricSink, StatsdClient};
//! use fanfare::registry;
//!
//! let client = StatsdClient::from_sink("my.prefix", NopMetricSink);
//! if registry::set_global_client(client) {
//!     // this process set the client, do any one-time setup here
//! }
//!
//! registry::global_client().unwrap().incr("requests").send();
//! ```

use crate::client::StatsdClient;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock};

static GLOBAL_CLIENT: OnceLock<Arc<StatsdClient>> = OnceLock::new();

/// Error indicating that no global client has been set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalClientNotSet;

impl fmt::Display for GlobalClientNotSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "global Statsd client has not been set".fmt(f)
    }
}

impl Error for GlobalClientNotSet {}

/// Set the process-wide default client, returning `true` if this call was
/// the one that set it.
///
/// The first successful call wins for the life of the process. Later calls
/// leave the existing client in place and return `false`.
pub fn set_global_client<C>(client: C) -> bool
where
    C: Into<Arc<StatsdClient>>,
{
    GLOBAL_CLIENT.set(client.into()).is_ok()
}

/// Get the process-wide default client, if one has been set
pub fn global_client() -> Result<Arc<StatsdClient>, GlobalClientNotSet> {
    GLOBAL_CLIENT.get().cloned().ok_or(GlobalClientNotSet)
}

/// Return true if a process-wide default client has been set
pub fn is_global_client_set() -> bool {
    GLOBAL_CLIENT.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::{global_client, is_global_client_set, set_global_client, GlobalClientNotSet};
    use crate::prelude::*;
    use crate::sinks::NopMetricSink;
    use crate::StatsdClient;

    // the registry is process-global state shared by every test in this
    // binary, so its whole lifecycle runs in a single test function
    #[test]
    fn test_global_client_lifecycle() {
        assert!(!is_global_client_set());
        assert_eq!(GlobalClientNotSet, global_client().unwrap_err());

        let client = StatsdClient::from_sink("global.prefix", NopMetricSink);
        assert!(set_global_client(client));
        assert!(is_global_client_set());

        let client = global_client().unwrap();
        client.incr("some.counter").send();

        // second set is refused, the original client remains
        let other = StatsdClient::from_sink("other.prefix", NopMetricSink);
        assert!(!set_global_client(other));
        assert!(is_global_client_set());
    }
}
