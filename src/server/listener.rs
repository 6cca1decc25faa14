use crate::{
    errors::StartupError,
    http::serve::Resolve,
    limits::{ConnLimits, RespLimits, ServerLimits},
    server::connection::{HttpConnection, Slot},
};
use crossbeam::queue::ArrayQueue;
use socket2::{Domain, Protocol, Socket, Type};
use std::{io, net::SocketAddr, sync::Arc};
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

/// Everything a connection task needs, shared by all of them.
struct Shared<R> {
    resolver: R,
    pool: ArrayQueue<Slot>,
    conn_limits: ConnLimits,
    resp_limits: RespLimits,
}

/// An HTTP server that answers every accepted connection with its own task.
///
/// # Examples
///
/// ```no_run
/// use vocab_web::{Catalog, Server, Vocabulary};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let vocab = Vocabulary::load("vocab.gz").unwrap();
///
///     Server::builder()
///         .bind(([0, 0, 0, 0], 8080).into())
///         .unwrap()
///         .resolver(Catalog::new(vocab))
///         .build()
///         .launch()
///         .await
/// }
/// ```
pub struct Server<R: Resolve> {
    listener: TcpListener,
    shared: Arc<Shared<R>>,
}

impl<R: Resolve> Server<R> {
    #[inline]
    pub fn builder() -> ServerBuilder<R> {
        ServerBuilder {
            listener: None,
            resolver: None,

            server_limits: None,
            connection_limits: None,
            response_limits: None,
        }
    }

    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    ///
    /// A failed accept is logged and the next one is issued immediately.
    pub async fn launch(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(err) => debug!(error = %err, "accept failed"),
            }
        }
    }

    #[inline]
    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let shared = Arc::clone(&self.shared);
        let _ = stream.set_nodelay(true);

        tokio::spawn(async move {
            let mut slot = shared
                .pool
                .pop()
                .unwrap_or_else(|| Slot::new(&shared.resp_limits));

            HttpConnection::new(
                stream,
                peer,
                &mut slot,
                &shared.resolver,
                &shared.conn_limits,
            )
            .run()
            .await;

            slot.recycle(&shared.resp_limits);
            let _ = shared.pool.push(slot);
        });
    }
}

/// Builder for [`Server`].
///
/// A listening socket (from [`bind`](Self::bind) or
/// [`listener`](Self::listener)) and a [`resolver`](Self::resolver) are
/// required; every limit falls back to its default.
pub struct ServerBuilder<R: Resolve> {
    listener: Option<TcpListener>,
    resolver: Option<R>,

    server_limits: Option<ServerLimits>,
    connection_limits: Option<ConnLimits>,
    response_limits: Option<RespLimits>,
}

impl<R: Resolve> ServerBuilder<R> {
    /// Opens a reusable listening socket on `addr`.
    ///
    /// The backlog is taken from the server limits set so far. Must be
    /// called inside a tokio runtime.
    pub fn bind(mut self, addr: SocketAddr) -> Result<Self, StartupError> {
        let backlog = self
            .server_limits
            .as_ref()
            .map_or(ServerLimits::default().backlog, |limits| limits.backlog);

        let listener = listen(addr, backlog)
            .and_then(TcpListener::from_std)
            .map_err(|source| StartupError::Bind { addr, source })?;

        self.listener = Some(listener);
        Ok(self)
    }

    /// Uses an already bound listener.
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    #[inline(always)]
    pub fn resolver(mut self, resolver: R) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    #[inline(always)]
    pub fn response_limits(mut self, limits: RespLimits) -> Self {
        self.response_limits = Some(limits);
        self
    }

    /// # Panics
    ///
    /// If no listener or no resolver was set.
    #[inline]
    #[track_caller]
    pub fn build(self) -> Server<R> {
        let listener = self
            .listener
            .expect("The `bind` or `listener` method must be called to create");
        let resolver = self
            .resolver
            .expect("The `resolver` method must be called to create");
        let server_limits = self.server_limits.unwrap_or_default();

        Server {
            listener,
            shared: Arc::new(Shared {
                resolver,
                pool: ArrayQueue::new(server_limits.pool_size.max(1)),
                conn_limits: self.connection_limits.unwrap_or_default(),
                resp_limits: self.response_limits.unwrap_or_default(),
            }),
        }
    }
}

fn listen(addr: SocketAddr, backlog: i32) -> io::Result<std::net::TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    Ok(socket.into())
}
