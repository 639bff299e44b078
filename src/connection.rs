//! Per-connection protocol state machine.
//!
//! Each accepted transport stream gets one task owning its frame codec,
//! sequence counters and timers; nothing here is shared across
//! connections except the message queue handle. The task multiplexes
//! inbound frames, queue wakeups and timer deadlines and runs the
//! STOPPED/STARTED lifecycle of the standard: only the STARTED state
//! carries I-frames, S/U frames are accepted in any non-closed state.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{sleep_until, Instant};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::{Apdu, Iec104Codec};
use crate::error::{Iec104Error, Result};
use crate::handler::{OutstationHandler, Replies};
use crate::queue::{QueueEntry, SharedQueue};
use crate::types::{
    seq_distance, seq_next, Apci, Asdu, AsduParameters, Cot, InformationElement, TypeId, UFunction,
};

/// Default T1 timeout (acknowledge of sent I-frames) in seconds.
pub const DEFAULT_T1_TIMEOUT: u64 = 15;

/// Default T2 timeout (deferred acknowledge of received I-frames) in seconds.
pub const DEFAULT_T2_TIMEOUT: u64 = 10;

/// Default T3 timeout (idle test frame) in seconds.
pub const DEFAULT_T3_TIMEOUT: u64 = 20;

/// Default K parameter (max unacknowledged sent I-frames).
pub const DEFAULT_K: u16 = 12;

/// Default W parameter (max unacknowledged received I-frames before an
/// explicit S-frame).
pub const DEFAULT_W: u16 = 8;

/// What happens to unacknowledged sent ASDUs when the peer stops data
/// transfer with STOPDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBehavior {
    /// Return them to the queue front for retransmission in the next
    /// STARTED phase (default)
    #[default]
    RequeueUnacknowledged,
    /// Drop them
    Discard,
}

/// Per-connection protocol parameters.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// T1: time to wait for the peer to acknowledge a sent I-frame or a
    /// TESTFR act; expiry closes the connection
    pub t1: Duration,
    /// T2: longest deferral of an acknowledge for received I-frames
    /// (must be shorter than T1)
    pub t2: Duration,
    /// T3: idle time before probing the link with TESTFR
    pub t3: Duration,
    /// K: max unacknowledged sent I-frames
    pub k: u16,
    /// W: received I-frames to accumulate before an explicit S-frame
    pub w: u16,
    /// Unacknowledged-data policy on STOPDT
    pub stop_behavior: StopBehavior,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            t1: Duration::from_secs(DEFAULT_T1_TIMEOUT),
            t2: Duration::from_secs(DEFAULT_T2_TIMEOUT),
            t3: Duration::from_secs(DEFAULT_T3_TIMEOUT),
            k: DEFAULT_K,
            w: DEFAULT_W,
            stop_behavior: StopBehavior::default(),
        }
    }
}

/// Link-layer connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Transport connected, no STARTDT yet
    Unconfirmed,
    /// Data transfer active
    Started,
    /// Data transfer stopped by STOPDT
    Stopped,
    /// Terminal; no further I/O
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameSource {
    Queue,
    Local,
}

#[derive(Debug)]
struct SentFrame {
    seq: u16,
    entry: QueueEntry,
    source: FrameSource,
    sent_at: Instant,
}

pub(crate) struct Connection<S, H> {
    framed: Framed<S, Iec104Codec>,
    peer: SocketAddr,
    params: AsduParameters,
    config: ConnectionConfig,
    handler: Arc<H>,
    queue: Arc<SharedQueue>,
    shared_mode: bool,
    cancel: CancellationToken,

    state: LinkState,
    send_seq: u16,
    recv_seq: u16,
    sent_unacked: VecDeque<SentFrame>,
    unconfirmed_recvs: u16,
    t2_deadline: Option<Instant>,
    testfr_deadline: Option<Instant>,
    last_activity: Instant,
    responses: VecDeque<Asdu>,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: OutstationHandler,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        stream: S,
        peer: SocketAddr,
        params: AsduParameters,
        config: ConnectionConfig,
        handler: Arc<H>,
        queue: Arc<SharedQueue>,
        shared_mode: bool,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            framed: Framed::new(stream, Iec104Codec::new()),
            peer,
            params,
            config,
            handler,
            queue,
            shared_mode,
            cancel,
            state: LinkState::Unconfirmed,
            send_seq: 0,
            recv_seq: 0,
            sent_unacked: VecDeque::new(),
            unconfirmed_recvs: 0,
            t2_deadline: None,
            testfr_deadline: None,
            last_activity: Instant::now(),
            responses: VecDeque::new(),
        }
    }

    /// Drive the connection until it closes. Errors terminate only this
    /// connection; in shared-queue mode unacknowledged data entries are
    /// returned to the queue for the next connecting station.
    pub(crate) async fn run(mut self) -> Result<()> {
        let result = self.drive().await;
        self.state = LinkState::Closed;

        match &result {
            Ok(()) => debug!(peer = %self.peer, "connection closed"),
            Err(e) => warn!(peer = %self.peer, error = %e, "connection closed"),
        }

        if self.shared_mode {
            let retained: Vec<QueueEntry> = self
                .sent_unacked
                .drain(..)
                .filter(|frame| frame.source == FrameSource::Queue)
                .map(|frame| frame.entry)
                .collect();
            self.queue.requeue_front(retained);
        }

        result
    }

    async fn drive(&mut self) -> Result<()> {
        loop {
            self.pump_outbound().await?;

            // register the wakeup before re-checking the queue, so an
            // enqueue between the check and the await cannot be missed
            let queue = Arc::clone(&self.queue);
            let notified = queue.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.can_send_data() && !self.queue.is_empty() {
                continue;
            }

            let can_send = self.can_send_data();
            let deadline = self.next_deadline();

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!(peer = %self.peer, "connection cancelled");
                    return Ok(());
                }

                frame = self.framed.next() => match frame {
                    Some(Ok(apdu)) => self.handle_apdu(apdu).await?,
                    Some(Err(e)) => return Err(e),
                    None => return Err(Iec104Error::TransportClosed),
                },

                _ = &mut notified, if can_send => {}

                _ = sleep_until(deadline) => self.on_deadline().await?,
            }
        }
    }

    fn window_open(&self) -> bool {
        (self.sent_unacked.len() as u16) < self.config.k
    }

    fn can_send_data(&self) -> bool {
        self.state == LinkState::Started && self.window_open()
    }

    /// Send pending I-frames while the state and the k window allow it.
    /// Connection-local responses drain before queued data.
    async fn pump_outbound(&mut self) -> Result<()> {
        if self.state != LinkState::Started {
            return Ok(());
        }

        while self.window_open() {
            if let Some(asdu) = self.responses.pop_front() {
                self.send_i_frame(QueueEntry::new(asdu), FrameSource::Local)
                    .await?;
            } else if let Some(entry) = self.queue.dequeue_entry() {
                self.send_i_frame(entry, FrameSource::Queue).await?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn next_deadline(&self) -> Instant {
        let mut deadline = match self.t1_deadline() {
            Some(t1) => t1,
            None => self.last_activity + self.config.t3,
        };
        if self.testfr_deadline.is_none() {
            deadline = deadline.min(self.last_activity + self.config.t3);
        }
        if let Some(t2) = self.t2_deadline {
            deadline = deadline.min(t2);
        }
        deadline
    }

    fn t1_deadline(&self) -> Option<Instant> {
        let window = self
            .sent_unacked
            .front()
            .map(|frame| frame.sent_at + self.config.t1);
        match (window, self.testfr_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    async fn on_deadline(&mut self) -> Result<()> {
        let now = Instant::now();

        if let Some(t1) = self.t1_deadline() {
            if t1 <= now {
                warn!(
                    peer = %self.peer,
                    oldest_unacked = ?self.sent_unacked.front().map(|frame| frame.seq),
                    "t1 expired, peer unresponsive"
                );
                return Err(Iec104Error::T1Timeout);
            }
        }

        if let Some(t2) = self.t2_deadline {
            if t2 <= now {
                self.send_s_frame().await?;
            }
        }

        if self.testfr_deadline.is_none() && now >= self.last_activity + self.config.t3 {
            debug!(peer = %self.peer, "link idle, sending TESTFR act");
            self.testfr_deadline = Some(now + self.config.t1);
            self.send_u_frame(UFunction::TestFrAct).await?;
        }

        Ok(())
    }

    async fn handle_apdu(&mut self, apdu: Apdu) -> Result<()> {
        self.last_activity = Instant::now();

        match apdu.apci {
            Apci::UFrame { function } => self.handle_u_frame(function).await,
            Apci::SFrame { recv_seq } => self.process_ack(recv_seq),
            Apci::IFrame { send_seq, recv_seq } => {
                self.handle_i_frame(send_seq, recv_seq, &apdu.payload).await
            }
        }
    }

    async fn handle_u_frame(&mut self, function: UFunction) -> Result<()> {
        match function {
            UFunction::StartDtAct => {
                match self.state {
                    LinkState::Unconfirmed | LinkState::Stopped => {
                        debug!(peer = %self.peer, "STARTDT: data transfer started");
                        self.send_seq = 0;
                        self.recv_seq = 0;
                        self.sent_unacked.clear();
                        self.unconfirmed_recvs = 0;
                        self.t2_deadline = None;
                        self.state = LinkState::Started;
                    }
                    LinkState::Started => {
                        debug!(peer = %self.peer, "redundant STARTDT act, confirming");
                    }
                    LinkState::Closed => {}
                }
                self.send_u_frame(UFunction::StartDtCon).await
            }

            UFunction::StopDtAct => {
                if self.state == LinkState::Started {
                    debug!(peer = %self.peer, "STOPDT: data transfer stopped");
                    if self.unconfirmed_recvs > 0 {
                        self.send_s_frame().await?;
                    }
                    self.release_window();
                    self.state = LinkState::Stopped;
                }
                self.send_u_frame(UFunction::StopDtCon).await
            }

            UFunction::TestFrAct => self.send_u_frame(UFunction::TestFrCon).await,

            UFunction::TestFrCon => {
                self.testfr_deadline = None;
                Ok(())
            }

            UFunction::StartDtCon | UFunction::StopDtCon => {
                warn!(peer = %self.peer, "unexpected confirmation from controlling station");
                Ok(())
            }
        }
    }

    async fn handle_i_frame(&mut self, send_seq: u16, recv_seq: u16, payload: &[u8]) -> Result<()> {
        if self.state != LinkState::Started {
            warn!(peer = %self.peer, "I-frame outside STARTED state");
            return Err(Iec104Error::SequenceError {
                expected: self.recv_seq,
                actual: send_seq,
            });
        }

        self.process_ack(recv_seq)?;

        if send_seq != self.recv_seq {
            warn!(
                peer = %self.peer,
                expected = self.recv_seq,
                actual = send_seq,
                "receive sequence mismatch"
            );
            return Err(Iec104Error::SequenceError {
                expected: self.recv_seq,
                actual: send_seq,
            });
        }

        self.recv_seq = seq_next(self.recv_seq);
        self.unconfirmed_recvs += 1;
        if self.t2_deadline.is_none() {
            self.t2_deadline = Some(Instant::now() + self.config.t2);
        }

        match Asdu::parse(payload, &self.params) {
            Ok(asdu) => self.dispatch(asdu),
            Err(Iec104Error::UnknownTypeId(raw)) => {
                // the unit is dropped; the frame stays acknowledged
                warn!(peer = %self.peer, type_id = raw, "dropping ASDU with unknown type identifier");
            }
            Err(e) => return Err(e),
        }

        if self.unconfirmed_recvs >= self.config.w {
            self.send_s_frame().await?;
        }

        Ok(())
    }

    /// Account a receive sequence number against our sent window,
    /// circularly. An acknowledgment covering frames never sent is a
    /// protocol violation.
    fn process_ack(&mut self, recv_seq: u16) -> Result<()> {
        let outstanding = self.sent_unacked.len() as u16;
        let base = self.send_seq.wrapping_sub(outstanding) & 0x7FFF;
        let acked = seq_distance(base, recv_seq);

        if acked > outstanding {
            return Err(Iec104Error::SequenceError {
                expected: self.send_seq,
                actual: recv_seq,
            });
        }

        for _ in 0..acked {
            self.sent_unacked.pop_front();
        }
        Ok(())
    }

    /// Route a decoded ASDU to the application callbacks. Each callback
    /// completes before the next inbound frame is processed.
    fn dispatch(&mut self, asdu: Asdu) {
        match asdu.header.type_id {
            TypeId::ClockSync => self.dispatch_clock_sync(asdu),
            TypeId::InterrogationCommand => self.dispatch_interrogation(asdu),
            _ => self.dispatch_generic(asdu),
        }
    }

    fn dispatch_clock_sync(&mut self, asdu: Asdu) {
        if asdu.header.cot != Cot::Activation {
            self.responses.push_back(asdu.with_cause(Cot::UnknownCot, true));
            return;
        }

        let time = asdu.objects.first().and_then(|object| match &object.element {
            InformationElement::ClockSync { time } => Some(*time),
            _ => None,
        });

        let accepted = match time {
            Some(time) => self.handler.clock_sync(self.peer, &time),
            None => false,
        };
        self.responses.push_back(asdu.activation_confirm(!accepted));
    }

    fn dispatch_interrogation(&mut self, asdu: Asdu) {
        if asdu.header.cot != Cot::Activation {
            self.responses.push_back(asdu.with_cause(Cot::UnknownCot, true));
            return;
        }

        let qoi = asdu.objects.first().and_then(|object| match &object.element {
            InformationElement::Interrogation { qualifier } => Some(*qualifier),
            _ => None,
        });
        let Some(qoi) = qoi else {
            self.responses.push_back(asdu.activation_confirm(true));
            return;
        };

        let mut replies = Replies::new();
        if self.handler.interrogation(self.peer, qoi, &mut replies) {
            debug!(peer = %self.peer, qoi, count = replies.len(), "interrogation accepted");
            self.responses.push_back(asdu.activation_confirm(false));
            self.responses.extend(replies.into_inner());
            self.responses.push_back(asdu.activation_termination());
        } else {
            debug!(peer = %self.peer, qoi, "interrogation rejected");
            self.responses.push_back(asdu.activation_confirm(true));
        }
    }

    fn dispatch_generic(&mut self, asdu: Asdu) {
        let mut replies = Replies::new();
        let handled = self.handler.handle_asdu(self.peer, &asdu, &mut replies);
        self.responses.extend(replies.into_inner());

        if !handled && asdu.header.type_id.is_control() {
            debug!(
                peer = %self.peer,
                type_id = %asdu.header.type_id,
                "unhandled command, mirroring with unknown type id"
            );
            self.responses
                .push_back(asdu.with_cause(Cot::UnknownTypeId, true));
        }
    }

    /// Empty the sent window on STOPDT per the configured policy.
    fn release_window(&mut self) {
        let frames: Vec<SentFrame> = self.sent_unacked.drain(..).collect();
        if self.config.stop_behavior == StopBehavior::Discard {
            return;
        }

        let mut queued = Vec::new();
        let mut local = Vec::new();
        for frame in frames {
            match frame.source {
                FrameSource::Queue => queued.push(frame.entry),
                FrameSource::Local => local.push(frame.entry.asdu),
            }
        }
        for asdu in local.into_iter().rev() {
            self.responses.push_front(asdu);
        }
        self.queue.requeue_front(queued);
    }

    async fn send_u_frame(&mut self, function: UFunction) -> Result<()> {
        self.framed.send(Apdu::u_frame(function)).await?;
        self.last_activity = Instant::now();
        Ok(())
    }

    async fn send_s_frame(&mut self) -> Result<()> {
        self.framed.send(Apdu::s_frame(self.recv_seq)).await?;
        self.unconfirmed_recvs = 0;
        self.t2_deadline = None;
        self.last_activity = Instant::now();
        Ok(())
    }

    async fn send_i_frame(&mut self, entry: QueueEntry, source: FrameSource) -> Result<()> {
        let payload = entry.asdu.encode(&self.params).freeze();
        let seq = self.send_seq;

        self.framed
            .send(Apdu::i_frame(seq, self.recv_seq, payload))
            .await?;

        self.send_seq = seq_next(self.send_seq);
        // sending an I-frame piggybacks the acknowledge
        self.unconfirmed_recvs = 0;
        self.t2_deadline = None;
        self.last_activity = Instant::now();
        self.sent_unacked.push_back(SentFrame {
            seq,
            entry,
            source,
            sent_at: Instant::now(),
        });
        Ok(())
    }
}
