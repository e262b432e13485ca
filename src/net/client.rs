/// ConnectionClient: the one WebSocket of a client session.
///
/// The socket lives on a background thread running a single-threaded tokio
/// runtime. It only moves text frames; decoding, dispatch and every state
/// change happen on the UI thread in `poll()`, so inbound messages are
/// applied strictly in receipt order.
///
/// Connection loss is terminal. There is no reconnect: the close is turned
/// into a chat line (sender = close code) and reported once.

use std::sync::mpsc as std_mpsc;
use std::thread;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::ClientError;
use crate::net::envelope::{ChatLine, Inbound, Intent};

/// Orderly shutdown initiated by us.
const NORMAL_CLOSE: u16 = 1000;
/// Close frame carried no status code.
const NO_STATUS: u16 = 1005;
/// Connection dropped (or never opened) without a close frame.
pub const ABNORMAL_CLOSE: u16 = 1006;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// What the transport thread reports to the UI thread.
#[derive(Debug)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    Closed { code: u16 },
}

/// Output of `poll()`, in receipt order.
#[derive(Clone, Debug, PartialEq)]
pub enum Received {
    Inbound(Inbound),
    Closed { code: u16 },
}

/// `ws://<host><path>`. A host that already carries a `ws://` or `wss://`
/// scheme is used as is.
pub fn server_url(host: &str, path: &str) -> Result<Url, url::ParseError> {
    let base = if host.starts_with("ws://") || host.starts_with("wss://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("ws://{host}")
    };
    if path.starts_with('/') {
        Url::parse(&format!("{base}{path}"))
    } else {
        Url::parse(&format!("{base}/{path}"))
    }
}

pub struct ConnectionClient {
    state: ConnectionState,
    name: String,
    outbound: mpsc::UnboundedSender<String>,
    events: std_mpsc::Receiver<TransportEvent>,
    closed: bool,
}

impl ConnectionClient {
    /// Start connecting to `url`. Returns immediately; the `auth` message
    /// goes out as soon as the socket opens.
    pub fn connect(url: &Url, name: &str) -> Self {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (ev_tx, ev_rx) = std_mpsc::channel();
        let target = url.to_string();

        let spawned = thread::Builder::new()
            .name("mprl-socket".into())
            .spawn(move || run_transport(target, out_rx, ev_tx));
        if let Err(err) = spawned {
            // The event sender went down with the closure, so the first
            // poll reports an abnormal close.
            error!(%err, "could not start socket thread");
        }

        Self::from_channels(name, out_tx, ev_rx)
    }

    pub(crate) fn from_channels(
        name: &str,
        outbound: mpsc::UnboundedSender<String>,
        events: std_mpsc::Receiver<TransportEvent>,
    ) -> Self {
        ConnectionClient {
            state: ConnectionState::Disconnected,
            name: name.to_string(),
            outbound,
            events,
            closed: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Drain everything the transport delivered since the last call.
    pub fn poll(&mut self) -> Vec<Received> {
        let mut received = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle(event, &mut received),
                Err(std_mpsc::TryRecvError::Empty) => break,
                Err(std_mpsc::TryRecvError::Disconnected) => {
                    if !self.closed {
                        self.handle(TransportEvent::Closed { code: ABNORMAL_CLOSE }, &mut received);
                    }
                    break;
                }
            }
        }
        received
    }

    fn handle(&mut self, event: TransportEvent, received: &mut Vec<Received>) {
        match event {
            TransportEvent::Opened => {
                info!("connected, authenticating as {:?}", self.name);
                self.state = ConnectionState::Connected;
                let auth = Intent::Auth { name: self.name.clone() };
                if let Err(err) = self.send(&auth) {
                    warn!(%err, "could not send auth");
                }
            }
            TransportEvent::Frame(text) => match Inbound::decode(&text) {
                Ok(inbound) => received.push(Received::Inbound(inbound)),
                Err(ClientError::UnknownEventTag(tag)) => trace!(%tag, "ignoring unknown event"),
                Err(err) => warn!(%err, "dropping inbound frame"),
            },
            TransportEvent::Closed { code } => {
                if self.closed {
                    return;
                }
                info!(code, "connection closed");
                self.state = ConnectionState::Disconnected;
                self.closed = true;
                let line = ChatLine::new(code.to_string(), "disconnected");
                received.push(Received::Inbound(Inbound::Message(line)));
                received.push(Received::Closed { code });
            }
        }
    }

    /// Fire-and-forget send. No acknowledgement, no retry.
    pub fn send(&self, intent: &Intent) -> Result<(), ClientError> {
        if self.state != ConnectionState::Connected {
            return Err(ClientError::Disconnected);
        }
        let text = intent.to_envelope().to_json();
        debug!(%text, "send");
        self.outbound.send(text).map_err(|_| ClientError::Disconnected)
    }
}

// ── Transport thread ──

fn run_transport(
    url: String,
    outbound: mpsc::UnboundedReceiver<String>,
    events: std_mpsc::Sender<TransportEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            error!(%err, "could not start socket runtime");
            let _ = events.send(TransportEvent::Closed { code: ABNORMAL_CLOSE });
            return;
        }
    };
    let code = runtime.block_on(pump(&url, outbound, &events));
    let _ = events.send(TransportEvent::Closed { code });
}

/// Shuttle frames until either side hangs up; returns the close code.
async fn pump(
    url: &str,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: &std_mpsc::Sender<TransportEvent>,
) -> u16 {
    let (ws, _) = match connect_async(url).await {
        Ok(pair) => pair,
        Err(err) => {
            warn!(%err, url, "connect failed");
            return ABNORMAL_CLOSE;
        }
    };
    info!(url, "socket open");
    if events.send(TransportEvent::Opened).is_err() {
        return NORMAL_CLOSE;
    }

    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(text) => {
                    if let Err(err) = sink.send(Message::Text(text)).await {
                        warn!(%err, "send failed");
                        return ABNORMAL_CLOSE;
                    }
                }
                None => {
                    // UI side dropped the client: close politely.
                    let _ = sink.send(Message::Close(None)).await;
                    return NORMAL_CLOSE;
                }
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if events.send(TransportEvent::Frame(text)).is_err() {
                        return NORMAL_CLOSE;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    return frame.map_or(NO_STATUS, |f| u16::from(f.code));
                }
                Some(Ok(other)) => trace!(?other, "ignoring non-text frame"),
                Some(Err(err)) => {
                    warn!(%err, "socket error");
                    return ABNORMAL_CLOSE;
                }
                None => return ABNORMAL_CLOSE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (
        ConnectionClient,
        mpsc::UnboundedReceiver<String>,
        std_mpsc::Sender<TransportEvent>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (ev_tx, ev_rx) = std_mpsc::channel();
        (ConnectionClient::from_channels("bob", out_tx, ev_rx), out_rx, ev_tx)
    }

    #[test]
    fn sends_auth_on_open() {
        let (mut c, mut out, ev) = client();
        assert_eq!(c.state(), ConnectionState::Disconnected);

        ev.send(TransportEvent::Opened).unwrap();
        assert!(c.poll().is_empty());

        assert_eq!(c.state(), ConnectionState::Connected);
        assert_eq!(out.try_recv().unwrap(), r#"{"e":"auth","d":{"name":"bob"}}"#);
    }

    #[test]
    fn decodes_frames_in_order() {
        let (mut c, _out, ev) = client();
        ev.send(TransportEvent::Opened).unwrap();
        ev.send(TransportEvent::Frame(r#"{"e":"message","d":{"sender":"a","text":"1"}}"#.into())).unwrap();
        ev.send(TransportEvent::Frame(r#"{"e":"message","d":{"sender":"b","text":"2"}}"#.into())).unwrap();

        let got = c.poll();
        assert_eq!(
            got,
            vec![
                Received::Inbound(Inbound::Message(ChatLine::new("a", "1"))),
                Received::Inbound(Inbound::Message(ChatLine::new("b", "2"))),
            ]
        );
    }

    #[test]
    fn unknown_and_malformed_frames_are_dropped() {
        let (mut c, _out, ev) = client();
        ev.send(TransportEvent::Opened).unwrap();
        ev.send(TransportEvent::Frame(r#"{"e":"sparkle","d":1}"#.into())).unwrap();
        ev.send(TransportEvent::Frame("{{{".into())).unwrap();
        ev.send(TransportEvent::Frame(r#"{"e":"message","d":{"sender":"a","text":"ok"}}"#.into())).unwrap();

        let got = c.poll();
        assert_eq!(got.len(), 1);
        assert_eq!(c.state(), ConnectionState::Connected);
    }

    #[test]
    fn close_becomes_disconnect_message() {
        let (mut c, _out, ev) = client();
        ev.send(TransportEvent::Opened).unwrap();
        ev.send(TransportEvent::Closed { code: 1001 }).unwrap();

        let got = c.poll();
        assert_eq!(
            got,
            vec![
                Received::Inbound(Inbound::Message(ChatLine::new("1001", "disconnected"))),
                Received::Closed { code: 1001 },
            ]
        );
        assert_eq!(c.state(), ConnectionState::Disconnected);
        assert_eq!(c.send(&Intent::Move { dx: 0, dy: 0 }), Err(ClientError::Disconnected));
    }

    #[test]
    fn lost_transport_reports_abnormal_close_once() {
        let (mut c, _out, ev) = client();
        drop(ev);

        let got = c.poll();
        assert_eq!(got.last(), Some(&Received::Closed { code: ABNORMAL_CLOSE }));
        assert!(c.poll().is_empty());
    }

    #[test]
    fn intents_are_plain_envelope_sends() {
        let (mut c, mut out, ev) = client();
        ev.send(TransportEvent::Opened).unwrap();
        c.poll();
        out.try_recv().unwrap(); // auth

        c.send(&Intent::Move { dx: 1, dy: -1 }).unwrap();
        c.send(&Intent::Chat { message: "hello".into() }).unwrap();

        assert_eq!(
            out.try_recv().unwrap(),
            r#"{"e":"turn","d":{"data":{"dx":1,"dy":-1},"turn_type":"move"}}"#
        );
        assert_eq!(out.try_recv().unwrap(), r#"{"e":"chat","d":{"message":"hello"}}"#);
    }

    #[test]
    fn cannot_send_before_open() {
        let (c, _out, _ev) = client();
        assert_eq!(c.send(&Intent::Chat { message: "hi".into() }), Err(ClientError::Disconnected));
    }

    #[test]
    fn url_building() {
        assert_eq!(server_url("127.0.0.1:8000", "/server/").unwrap().as_str(), "ws://127.0.0.1:8000/server/");
        assert_eq!(server_url("example.org", "server/").unwrap().as_str(), "ws://example.org/server/");
        assert_eq!(server_url("wss://example.org/", "/server/").unwrap().as_str(), "wss://example.org/server/");
    }
}
