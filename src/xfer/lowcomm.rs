//! The low-level transport boundary (spec §1 "Out of scope": "the
//! low-level transport"). `LowComm` is the trait C4 sends/receives
//! through; this crate ships two implementations: an in-process
//! `mpsc`-channel transport for multi-`DddContext` integration tests, and
//! a `Loopback` transport for single-processor use (every send is
//! immediately queued for the same processor's own receive, used by
//! library consumers who only need the API shape without a real cluster).

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};

use crate::ids::ProcId;

/// Byte-oriented point-to-point transport between processors. Send is
/// fire-and-forget; receive drains whatever has arrived from any peer
/// since the last call (spec §4.4.3: "XferEnd ... receives every message
/// addressed to this processor before unpacking any of them").
pub trait LowComm {
    fn send(&mut self, to: ProcId, payload: Vec<u8>);
    fn receive_all(&mut self) -> Vec<(ProcId, Vec<u8>)>;
}

/// Single-processor transport: every send loops back into this
/// processor's own inbox. Useful for exercising C1/C2 without C4's
/// multi-processor machinery.
#[derive(Default)]
pub struct Loopback {
    inbox: VecDeque<(ProcId, Vec<u8>)>,
}

impl LowComm for Loopback {
    fn send(&mut self, to: ProcId, payload: Vec<u8>) {
        self.inbox.push_back((to, payload));
    }

    fn receive_all(&mut self) -> Vec<(ProcId, Vec<u8>)> {
        self.inbox.drain(..).collect()
    }
}

/// `mpsc`-channel transport: one `Sender` per peer processor plus one
/// shared `Receiver` for everything addressed to this processor. Built by
/// wiring up a `ChannelNetwork` across every participating processor
/// before any of them call `xfer_begin`.
pub struct ChannelComm {
    self_proc: ProcId,
    senders: ahash::AHashMap<ProcId, Sender<Vec<u8>>>,
    receiver: Receiver<Vec<u8>>,
}

impl ChannelComm {
    pub fn new(self_proc: ProcId, senders: ahash::AHashMap<ProcId, Sender<Vec<u8>>>, receiver: Receiver<Vec<u8>>) -> Self {
        ChannelComm { self_proc, senders, receiver }
    }
}

impl LowComm for ChannelComm {
    fn send(&mut self, to: ProcId, payload: Vec<u8>) {
        if to == self.self_proc {
            tracing::warn!(proc = %to, "ChannelComm: refusing to send to self");
            return;
        }
        if let Some(tx) = self.senders.get(&to) {
            let _ = tx.send(payload);
        } else {
            tracing::warn!(proc = %to, "ChannelComm: no channel registered for destination");
        }
    }

    fn receive_all(&mut self) -> Vec<(ProcId, Vec<u8>)> {
        let mut out = Vec::new();
        while let Ok(payload) = self.receiver.try_recv() {
            out.push((self.self_proc, payload));
        }
        out
    }
}

/// Builds one [`ChannelComm`] per processor id in `procs`, fully
/// interconnected, for use by integration tests.
pub fn build_channel_network(procs: &[ProcId]) -> Vec<ChannelComm> {
    use std::sync::mpsc::channel;

    let mut senders: ahash::AHashMap<ProcId, Vec<(ProcId, Sender<Vec<u8>>)>> = ahash::AHashMap::new();
    let mut receivers: ahash::AHashMap<ProcId, Receiver<Vec<u8>>> = ahash::AHashMap::new();

    for &p in procs {
        let (tx, rx) = channel::<Vec<u8>>();
        receivers.insert(p, rx);
        for &q in procs {
            if q != p {
                senders.entry(q).or_default().push((p, tx.clone()));
            }
        }
    }

    procs
        .iter()
        .map(|&p| {
            let rx = receivers.remove(&p).unwrap();
            let tx_map: ahash::AHashMap<ProcId, Sender<Vec<u8>>> = senders.remove(&p).unwrap_or_default().into_iter().collect();
            ChannelComm::new(p, tx_map, rx)
        })
        .collect()
}
