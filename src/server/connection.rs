use crate::{
    buffer::Buffer,
    errors::ConnError,
    http::{
        headers::HeaderStore,
        request::RequestHead,
        serve::{serve, Resolve},
    },
    limits::{ConnLimits, RespLimits},
};
use memchr::memmem;
use std::net::SocketAddr;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{sleep_until, timeout, Instant},
};
use tracing::{debug, warn};

/// Smallest free space offered to a socket read.
const MIN_READ: usize = 1024;

/// Per-connection storage, recycled between connections.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) recv: Buffer,
    pub(crate) send: Buffer,
    pub(crate) headers: HeaderStore,
}

impl Slot {
    #[inline]
    pub(crate) fn new(limits: &RespLimits) -> Self {
        Self {
            recv: Buffer::with_capacity(limits.default_capacity),
            send: Buffer::with_capacity(limits.default_capacity),
            headers: HeaderStore::new(),
        }
    }

    /// Empties the slot, replacing buffers that grew past `max_capacity`
    /// and a header store that grew past its default size.
    #[inline]
    pub(crate) fn recycle(&mut self, limits: &RespLimits) {
        let max_capacity = limits.max_capacity.max(Buffer::DEFAULT_CAPACITY);
        for buffer in [&mut self.recv, &mut self.send] {
            if buffer.capacity() > max_capacity {
                *buffer = Buffer::with_capacity(limits.default_capacity);
            } else {
                buffer.clear();
            }
        }

        if self.headers.capacity() > HeaderStore::DEFAULT_CAPACITY {
            self.headers = HeaderStore::new();
        } else {
            self.headers.clear();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// The idle deadline is not armed yet.
    Idle,
    /// Reading until the blank line, racing the idle deadline.
    AwaitingRequest,
    /// The first `head_len` received bytes are a complete request head.
    Parsing { head_len: usize },
    /// The send buffer holds a response.
    AwaitingWriteDone { close: bool },
    Closed,
}

pub(crate) struct HttpConnection<'a, R: Resolve + ?Sized> {
    stream: TcpStream,
    peer: SocketAddr,
    slot: &'a mut Slot,
    resolver: &'a R,
    limits: &'a ConnLimits,

    state: State,
    deadline: Instant,
    served: usize,
}

impl<'a, R: Resolve + ?Sized> HttpConnection<'a, R> {
    #[inline]
    pub(crate) fn new(
        stream: TcpStream,
        peer: SocketAddr,
        slot: &'a mut Slot,
        resolver: &'a R,
        limits: &'a ConnLimits,
    ) -> Self {
        Self {
            stream,
            peer,
            slot,
            resolver,
            limits,

            state: State::Idle,
            deadline: Instant::now(),
            served: 0,
        }
    }

    /// Drives the connection until it closes. Never fails: errors end the
    /// connection and are logged.
    pub(crate) async fn run(&mut self) {
        debug!(peer = %self.peer, "connection opened");

        loop {
            self.state = match self.state {
                State::Idle => self.arm_deadline(),
                State::AwaitingRequest => self.await_request().await,
                State::Parsing { head_len } => self.respond(head_len),
                State::AwaitingWriteDone { close } => self.write_response(close).await,
                State::Closed => break,
            };
        }

        debug!(peer = %self.peer, requests = self.served, "connection closed");
    }

    #[inline]
    fn arm_deadline(&mut self) -> State {
        self.deadline = Instant::now() + self.limits.idle_timeout;
        State::AwaitingRequest
    }

    async fn await_request(&mut self) -> State {
        let read = tokio::select! {
            biased;

            read = read_head(&mut self.stream, &mut self.slot.recv, self.limits.max_head_size) => read,
            () = sleep_until(self.deadline) => {
                debug!(peer = %self.peer, "idle timeout");
                return State::Closed;
            }
        };

        match read {
            Ok(Some(head_len)) => State::Parsing { head_len },
            Ok(None) => State::Closed,
            Err(err @ ConnError::HeadTooLarge { .. }) => {
                debug!(peer = %self.peer, error = %err, "request rejected");
                State::Closed
            }
            Err(err) => {
                warn!(peer = %self.peer, error = %err, "read failed");
                State::Closed
            }
        }
    }

    /// Parses the head and renders the response into the send buffer.
    fn respond(&mut self, head_len: usize) -> State {
        let Slot {
            recv,
            send,
            headers,
        } = &mut *self.slot;

        let Some(head) = RequestHead::new(&mut recv.as_mut_slice()[..head_len]) else {
            return State::Closed;
        };
        let request = head.parse(headers);
        let served = serve(&request, self.resolver, self.limits.keep_alive_secs(), send);
        debug!(
            peer = %self.peer,
            %request,
            status = served.status().as_u16(),
            bytes = send.len(),
            "request served"
        );

        recv.clear();
        headers.clear();
        self.served += 1;
        State::AwaitingWriteDone {
            close: !self.limits.keep_alive || served.closes_connection(),
        }
    }

    async fn write_response(&mut self, close: bool) -> State {
        let written = timeout(
            self.limits.write_timeout,
            self.stream.write_all(self.slot.send.as_slice()),
        )
        .await;
        self.slot.send.clear();

        let written = match written {
            Ok(result) => result.map_err(ConnError::from),
            Err(_) => Err(ConnError::WriteTimeout),
        };

        match written {
            Ok(()) if close => {
                let _ = self.stream.shutdown().await;
                State::Closed
            }
            Ok(()) => State::Idle,
            Err(err) => {
                warn!(peer = %self.peer, error = %err, "write failed");
                State::Closed
            }
        }
    }
}

/// Reads into `recv` until it holds `\r\n\r\n` and returns the length of
/// the head including the delimiter, or `None` on end of stream.
///
/// Each search covers only the newly read bytes plus the three before
/// them, so a delimiter split across reads is still found.
pub(crate) async fn read_head<S: AsyncRead + Unpin>(
    stream: &mut S,
    recv: &mut Buffer,
    max_head_size: usize,
) -> Result<Option<usize>, ConnError> {
    let delimiter = RequestHead::DELIMITER;
    let mut searched = 0;

    loop {
        if let Some(at) = memmem::find(&recv.as_slice()[searched..], delimiter) {
            return Ok(Some(searched + at + delimiter.len()));
        }
        searched = recv.len().saturating_sub(delimiter.len() - 1);

        if recv.len() >= max_head_size {
            return Err(ConnError::HeadTooLarge {
                limit: max_head_size,
            });
        }
        if recv.spare_mut().len() < MIN_READ {
            recv.reserve(MIN_READ);
        }

        let read = stream.read(recv.spare_mut()).await?;
        if read == 0 {
            return Ok(None);
        }
        recv.advance(read);
    }
}
