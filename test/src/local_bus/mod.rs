/// In-memory bus implementation for end-to-end testing
/// Routes messages between peers without any real transport
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use windowmesh::{Bus, BusReceiver, BusSender, MeshMessage, RecvError, SendError};

struct Endpoint {
    channel: String,
    partition: u32,
    queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

#[derive(Default)]
struct HubInner {
    endpoints: Vec<Endpoint>,
}

/// Shared router behind every endpoint of one test mesh.
///
/// Delivery is per-sender FIFO, never echoes back to the sender, and can be
/// partitioned: a message only reaches endpoints in the sender's partition.
/// Payloads travel as JSON bytes, so malformed-input handling in the
/// receiving half is exercised for real.
#[derive(Clone, Default)]
pub struct LocalHub {
    inner: Arc<Mutex<HubInner>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus handle in partition 0, ready for `MeshEngine::connect`.
    pub fn bus(&self) -> LocalBus {
        self.bus_in(0)
    }

    /// A bus handle whose endpoint starts in the given partition.
    pub fn bus_in(&self, partition: u32) -> LocalBus {
        LocalBus {
            hub: self.clone(),
            partition,
        }
    }

    /// Moves an endpoint (indexed by attach order) into `partition`.
    pub fn set_partition(&self, endpoint_index: usize, partition: u32) {
        let mut inner = self.inner.lock().unwrap();
        inner.endpoints[endpoint_index].partition = partition;
    }

    /// Heals every partition: all endpoints rejoin partition 0.
    pub fn merge_all(&self) {
        let mut inner = self.inner.lock().unwrap();
        for endpoint in &mut inner.endpoints {
            endpoint.partition = 0;
        }
    }

    /// Injects a raw payload to every endpoint on `channel`, bypassing the
    /// sender half (malformed-input testing).
    pub fn inject_raw(&self, channel: &str, payload: &[u8]) {
        let inner = self.inner.lock().unwrap();
        for endpoint in &inner.endpoints {
            if endpoint.channel == channel {
                endpoint.queue.lock().unwrap().push_back(payload.to_vec());
            }
        }
    }

    fn attach(&self, channel: &str, partition: u32) -> (LocalBusSender, LocalBusReceiver) {
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let mut inner = self.inner.lock().unwrap();
        let endpoint_index = inner.endpoints.len();
        inner.endpoints.push(Endpoint {
            channel: channel.to_string(),
            partition,
            queue: queue.clone(),
        });
        (
            LocalBusSender {
                hub: self.clone(),
                endpoint_index,
            },
            LocalBusReceiver { queue },
        )
    }

    fn broadcast_from(&self, endpoint_index: usize, payload: Vec<u8>) {
        let inner = self.inner.lock().unwrap();
        let from = &inner.endpoints[endpoint_index];
        for (index, endpoint) in inner.endpoints.iter().enumerate() {
            if index == endpoint_index {
                // never echo back to the sender
                continue;
            }
            if endpoint.channel != from.channel || endpoint.partition != from.partition {
                continue;
            }
            endpoint.queue.lock().unwrap().push_back(payload.clone());
        }
    }
}

/// One peer's attachment point, handed to `MeshEngine::connect`.
pub struct LocalBus {
    hub: LocalHub,
    partition: u32,
}

impl Bus for LocalBus {
    fn connect(self: Box<Self>, channel: &str) -> (Box<dyn BusSender>, Box<dyn BusReceiver>) {
        let (sender, receiver) = self.hub.attach(channel, self.partition);
        (Box::new(sender), Box::new(receiver))
    }
}

impl From<LocalBus> for Box<dyn Bus> {
    fn from(bus: LocalBus) -> Self {
        Box::new(bus)
    }
}

struct LocalBusSender {
    hub: LocalHub,
    endpoint_index: usize,
}

impl BusSender for LocalBusSender {
    fn broadcast(&self, message: &MeshMessage) -> Result<(), SendError> {
        let payload = serde_json::to_vec(message).map_err(|_| SendError)?;
        self.hub.broadcast_from(self.endpoint_index, payload);
        Ok(())
    }
}

struct LocalBusReceiver {
    queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl BusReceiver for LocalBusReceiver {
    fn try_receive(&mut self) -> Result<Option<MeshMessage>, RecvError> {
        loop {
            let payload = self.queue.lock().map_err(|_| RecvError)?.pop_front();
            let Some(payload) = payload else {
                return Ok(None);
            };
            match serde_json::from_slice(&payload) {
                Ok(message) => return Ok(Some(message)),
                // ill-formed payloads are dropped silently
                Err(_) => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windowmesh::PeerId;

    fn request(id: &str) -> MeshMessage {
        MeshMessage::RequestLayout {
            id: PeerId::from(id),
        }
    }

    #[test]
    fn broadcast_reaches_everyone_but_the_sender() {
        let hub = LocalHub::new();
        let (sender_a, mut receiver_a) = hub.attach("s", 0);
        let (_sender_b, mut receiver_b) = hub.attach("s", 0);

        sender_a.broadcast(&request("a")).unwrap();

        assert_eq!(receiver_a.try_receive().unwrap(), None);
        assert_eq!(receiver_b.try_receive().unwrap(), Some(request("a")));
    }

    #[test]
    fn channels_are_isolated() {
        let hub = LocalHub::new();
        let (sender_a, _) = hub.attach("s1", 0);
        let (_b, mut receiver_b) = hub.attach("s2", 0);

        sender_a.broadcast(&request("a")).unwrap();

        assert_eq!(receiver_b.try_receive().unwrap(), None);
    }

    #[test]
    fn partitions_block_delivery_until_merged() {
        let hub = LocalHub::new();
        let (sender_a, _) = hub.attach("s", 1);
        let (_b, mut receiver_b) = hub.attach("s", 2);

        sender_a.broadcast(&request("a")).unwrap();
        assert_eq!(receiver_b.try_receive().unwrap(), None);

        hub.merge_all();
        sender_a.broadcast(&request("a")).unwrap();
        assert_eq!(receiver_b.try_receive().unwrap(), Some(request("a")));
    }

    #[test]
    fn malformed_payloads_are_dropped_silently() {
        let hub = LocalHub::new();
        let (sender_a, _) = hub.attach("s", 0);
        let (_b, mut receiver_b) = hub.attach("s", 0);

        hub.inject_raw("s", b"not json at all");
        hub.inject_raw("s", br#"{"payload":{"id":"x"}}"#);
        sender_a.broadcast(&request("a")).unwrap();

        assert_eq!(receiver_b.try_receive().unwrap(), Some(request("a")));
        assert_eq!(receiver_b.try_receive().unwrap(), None);
    }

    #[test]
    fn delivery_is_fifo_per_sender() {
        let hub = LocalHub::new();
        let (sender_a, _) = hub.attach("s", 0);
        let (_b, mut receiver_b) = hub.attach("s", 0);

        sender_a.broadcast(&request("first")).unwrap();
        sender_a.broadcast(&request("second")).unwrap();

        assert_eq!(receiver_b.try_receive().unwrap(), Some(request("first")));
        assert_eq!(receiver_b.try_receive().unwrap(), Some(request("second")));
    }
}
