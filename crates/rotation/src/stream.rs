//! Bidirectional Rotate streams.

use async_trait::async_trait;
use rotor_core::{Code, Status};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Per-call metadata handed to the authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub peer: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl CallContext {
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Server side of one Rotate RPC.
#[async_trait]
pub trait RotateStream<Req, Resp>: Send {
    /// Next client message; `None` once the client half-closes.
    async fn recv(&mut self) -> Option<Result<Req, Status>>;

    async fn send(&mut self, response: Resp) -> Result<(), Status>;

    fn context(&self) -> &CallContext;
}

const CHANNEL_DEPTH: usize = 16;

/// In-process stream backed by two mpsc channels.
#[derive(Debug)]
pub struct ChannelStream<Req, Resp> {
    context: CallContext,
    requests: mpsc::Receiver<Result<Req, Status>>,
    responses: mpsc::Sender<Resp>,
}

/// Client end of a [`ChannelStream`].
#[derive(Debug)]
pub struct ClientHandle<Req, Resp> {
    requests: Option<mpsc::Sender<Result<Req, Status>>>,
    responses: Option<mpsc::Receiver<Resp>>,
}

/// Connected server stream and client handle.
pub fn channel_stream<Req, Resp>(context: CallContext) -> (ChannelStream<Req, Resp>, ClientHandle<Req, Resp>) {
    let (req_tx, req_rx) = mpsc::channel(CHANNEL_DEPTH);
    let (resp_tx, resp_rx) = mpsc::channel(CHANNEL_DEPTH);
    (
        ChannelStream {
            context,
            requests: req_rx,
            responses: resp_tx,
        },
        ClientHandle {
            requests: Some(req_tx),
            responses: Some(resp_rx),
        },
    )
}

#[async_trait]
impl<Req: Send, Resp: Send> RotateStream<Req, Resp> for ChannelStream<Req, Resp> {
    async fn recv(&mut self) -> Option<Result<Req, Status>> {
        self.requests.recv().await
    }

    async fn send(&mut self, response: Resp) -> Result<(), Status> {
        self.responses
            .send(response)
            .await
            .map_err(|_| Status::new(Code::Unavailable, "client stream closed"))
    }

    fn context(&self) -> &CallContext {
        &self.context
    }
}

impl<Req, Resp> ClientHandle<Req, Resp> {
    /// Send a request. Returns `false` if the server already hung up.
    pub async fn send(&self, request: Req) -> bool {
        match &self.requests {
            Some(tx) => tx.send(Ok(request)).await.is_ok(),
            None => false,
        }
    }

    /// Deliver a transport error to the server's next `recv`.
    pub async fn fail(&self, status: Status) -> bool {
        match &self.requests {
            Some(tx) => tx.send(Err(status)).await.is_ok(),
            None => false,
        }
    }

    /// Next response, or `None` once the server finished.
    pub async fn recv(&mut self) -> Option<Resp> {
        match &mut self.responses {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Half-close: the server sees end of stream.
    pub fn close_send(&mut self) {
        self.requests = None;
    }

    /// Stop reading: the server's next `send` fails.
    pub fn close_recv(&mut self) {
        self.responses = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn messages_flow_both_ways() {
        let (mut server, mut client) = channel_stream::<u32, String>(CallContext::default());
        assert!(client.send(7).await);
        assert_eq!(server.recv().await.unwrap().unwrap(), 7);
        server.send("ack".to_string()).await.unwrap();
        assert_eq!(client.recv().await.unwrap(), "ack");
    }

    #[tokio::test]
    async fn close_send_is_end_of_stream() {
        let (mut server, mut client) = channel_stream::<u32, String>(CallContext::default());
        client.close_send();
        assert!(server.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_recv_fails_server_send() {
        let (mut server, mut client) = channel_stream::<u32, String>(CallContext::default());
        client.close_recv();
        let err = server.send("lost".to_string()).await.unwrap_err();
        assert_eq!(err.code(), Code::Unavailable);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_on_recv() {
        let (mut server, client) = channel_stream::<u32, String>(CallContext::default());
        client.fail(Status::cancelled("deadline")).await;
        let err = server.recv().await.unwrap().unwrap_err();
        assert_eq!(err.code(), Code::Cancelled);
    }
}
