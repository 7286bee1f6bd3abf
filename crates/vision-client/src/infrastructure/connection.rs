//! REQ socket connection to the broker.
//!
//! # One request at a time (for beginners)
//!
//! A REQ socket enforces send → receive → send → receive.  That makes
//! [`ClassifyClient`] strictly sequential: `classify` sends, then waits for
//! the reply.  To run requests in parallel, open several clients; the broker
//! keeps their replies apart using the identity it assigned to each
//! connection.
//!
//! If a reply does not arrive within the configured timeout the socket is
//! left waiting for it and refuses further sends.  Drop the client and
//! connect a new one.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqError, ZmqMessage};

use vision_core::{decode_result_table, ResultTable, TableError};

use crate::application::prepare::ClassifyRequest;
use crate::domain::config::ClientConfig;

/// Errors returned by [`ClassifyClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: ZmqError,
    },

    #[error("send failed: {0}")]
    Send(#[source] ZmqError),

    #[error("receive failed: {0}")]
    Receive(#[source] ZmqError),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("request must have at least one segment")]
    EmptyRequest,

    /// The reply did not consist of exactly one frame.
    #[error("expected a single reply frame, got {0}")]
    MalformedReply(usize),

    #[error("reply is not a valid result table: {0}")]
    Table(#[from] TableError),
}

/// A connected request/reply client.
pub struct ClassifyClient {
    socket: ReqSocket,
    endpoint: String,
    request_timeout: Duration,
}

impl ClassifyClient {
    /// Connects to the broker described by `config`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Connect`] if the endpoint is malformed or the broker
    /// is unreachable.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint();
        let mut socket = ReqSocket::new();
        socket
            .connect(&endpoint)
            .await
            .map_err(|source| ClientError::Connect {
                endpoint: endpoint.clone(),
                source,
            })?;
        debug!("connected to {endpoint}");

        Ok(Self {
            socket,
            endpoint,
            request_timeout: config.request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a validated image and returns the decoded result table.
    pub async fn classify(&mut self, request: ClassifyRequest) -> Result<ResultTable, ClientError> {
        self.send_segments(request.into_segments()).await
    }

    /// Sends arbitrary segments, skipping local validation.
    ///
    /// Useful to see how the worker treats malformed input; it always
    /// answers with a table, possibly empty.
    pub async fn send_segments<I>(&mut self, segments: I) -> Result<ResultTable, ClientError>
    where
        I: IntoIterator<Item = Bytes>,
    {
        let mut segments = segments.into_iter();
        let first = segments.next().ok_or(ClientError::EmptyRequest)?;
        let mut message = ZmqMessage::from(first);
        for segment in segments {
            message.push_back(segment);
        }

        self.socket.send(message).await.map_err(ClientError::Send)?;

        let reply = tokio::time::timeout(self.request_timeout, self.socket.recv())
            .await
            .map_err(|_| ClientError::Timeout(self.request_timeout))?
            .map_err(ClientError::Receive)?;

        if reply.len() != 1 {
            return Err(ClientError::MalformedReply(reply.len()));
        }
        let frame = reply.get(0).ok_or(ClientError::MalformedReply(0))?;
        let table = decode_result_table(frame)?;
        debug!(rows = table.len(), "reply decoded");
        Ok(table)
    }
}
