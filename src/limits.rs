//! Server configuration limits and timeouts
//!
//! # Memory Consumption
//!
//! Each open connection holds one slot: a receive buffer, a send buffer and
//! a header store. Slots are recycled through a pool of
//! [`pool_size`](ServerLimits::pool_size) entries, so memory stays flat
//! after warm-up: on recycle, buffers larger than
//! [`max_capacity`](RespLimits::max_capacity) and header stores larger than
//! [`HeaderStore::DEFAULT_CAPACITY`](crate::HeaderStore::DEFAULT_CAPACITY)
//! entries are replaced with fresh ones.
//!
//! # Examples
//!
//! ```no_run
//! use vocab_web::{Catalog, Server, Vocabulary, limits::{ConnLimits, ServerLimits}};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let vocab = Vocabulary::load("vocab.gz").unwrap();
//!
//!     Server::builder()
//!         .bind(([127, 0, 0, 1], 8080).into())
//!         .unwrap()
//!         .resolver(Catalog::new(vocab))
//!         .server_limits(ServerLimits {
//!             pool_size: 1024,
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             idle_timeout: Duration::from_secs(10),
//!             keep_alive: true,
//!             ..ConnLimits::default()
//!         })
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```

use std::time::Duration;

/// Listener-level settings.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Number of idle connection slots kept for reuse (default: `256`).
    ///
    /// A slot is taken from the pool when a connection is accepted and
    /// returned when it closes. When the pool is empty a new slot is
    /// allocated; when it is full a returned slot is dropped.
    pub pool_size: usize,

    /// Length of the kernel's pending-connection queue (default: `1024`).
    pub backlog: i32,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            pool_size: 256,
            backlog: 1024,

            _priv: (),
        }
    }
}

/// Connection-level limits and timeouts
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Time allowed for a complete request head to arrive (default: `5 seconds`).
    ///
    /// The deadline is armed when the connection is accepted and, with
    /// `keep_alive`, again after every response. When it passes the
    /// connection is closed without a response. Its whole seconds are
    /// advertised in the `keep-alive: timeout=` header.
    pub idle_timeout: Duration,

    /// Maximum duration to write one response (default: `3 seconds`).
    pub write_timeout: Duration,

    /// Serve more than one request per connection (default: `false`).
    ///
    /// When `false` the connection is shut down after the first response.
    pub keep_alive: bool,

    /// Largest accepted request head in bytes (default: `64 KiB`).
    ///
    /// A client that sends more without finishing the head is disconnected.
    pub max_head_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(3),
            keep_alive: false,
            max_head_size: 64 * 1024,

            _priv: (),
        }
    }
}

impl ConnLimits {
    #[inline]
    pub(crate) fn keep_alive_secs(&self) -> u32 {
        u32::try_from(self.idle_timeout.as_secs()).unwrap_or(u32::MAX)
    }
}

/// Controls how slot buffers are allocated and recycled.
///
/// # Buffer Management
///
/// When a slot goes back to the pool, each of its buffers is handled as follows:
/// ```rust
/// # use vocab_web::{Buffer, limits::RespLimits};
/// # let limits = RespLimits::default();
/// # let mut buffer = Buffer::with_capacity(limits.default_capacity);
/// #
/// if buffer.capacity() > limits.max_capacity.max(Buffer::DEFAULT_CAPACITY) {
///     buffer = Buffer::with_capacity(limits.default_capacity);
/// } else {
///     buffer.clear();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RespLimits {
    /// Initial buffer capacity, raised to at least
    /// [`Buffer::DEFAULT_CAPACITY`](crate::Buffer::DEFAULT_CAPACITY) and rounded
    /// up to a power of two (default: `4096 B`)
    pub default_capacity: usize,
    /// Largest buffer kept across connections (default: `64 KiB`)
    pub max_capacity: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for RespLimits {
    fn default() -> Self {
        Self {
            default_capacity: 4096,
            max_capacity: 64 * 1024,

            _priv: (),
        }
    }
}
