//! Message broker
//!
//! Topic-addressed synchronous publish/subscribe dispatch shared by every
//! module and by the console. The broker owns a fixed-capacity subscription
//! table and nothing else: payloads stay owned by the publisher, handlers
//! stay owned by their modules.
//!
//! # Dispatch rules
//!
//! - Delivery is synchronous and depth-first: `publish` returns only after
//!   every current subscriber (and anything they published in turn) has run.
//! - Invocation order equals registration order.
//! - The table lock is held only while snapshotting or mutating the
//!   subscriber list, never across a handler call. A handler may therefore
//!   publish again (any topic, to stack-limited depth) or subscribe/query the
//!   table without deadlocking.
//! - Handlers must not retain the payload reference beyond the call; copy out
//!   what outlives it.
//!
//! # Lifetimes
//!
//! The bus stores `&'s dyn Subscriber` handles. Construct subscribers before
//! the bus so they strictly outlive it:
//!
//! ```
//! use spieluhr::core::broker::{Message, MessageBus, Subscriber, Topic};
//!
//! struct Printer;
//! impl Subscriber for Printer {
//!     fn on_message(&self, _bus: &MessageBus<'_>, _message: &Message<'_>) {}
//! }
//!
//! let printer = Printer; // before the bus
//! let bus = MessageBus::new();
//! bus.subscribe(Topic::TimeResponse, &printer).unwrap();
//! bus.publish(&Message { topic: Topic::TimeResponse, payload: &[] });
//! ```

mod topic;

pub use topic::Topic;

use crate::core::traits::{ModuleState, SharedState};
use heapless::Vec;

/// Maximum subscribers on one topic
pub const MAX_SUBSCRIBERS_PER_TOPIC: usize = 8;

/// Maximum subscriptions across all topics
pub const MAX_SUBSCRIPTIONS: usize = 64;

/// Broker-level errors, returned synchronously from `subscribe`
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Subscriber list or the global subscription limit is full
    CapacityExceeded,
    /// Wire identifier does not name a known topic
    InvalidTopic,
}

/// A message in flight.
///
/// The payload is a borrowed view into publisher-owned memory, valid only for
/// the duration of the `publish` call that delivers it.
#[derive(Debug, Clone, Copy)]
pub struct Message<'p> {
    pub topic: Topic,
    pub payload: &'p [u8],
}

/// A message handler.
///
/// Implementors guard their own mutable state; the broker calls `on_message`
/// outside any broker lock and passes itself so handlers can publish
/// responses from within the dispatch.
pub trait Subscriber {
    fn on_message(&self, bus: &MessageBus<'_>, message: &Message<'_>);
}

struct SubscriptionTable<'s> {
    lists: [Vec<&'s dyn Subscriber, MAX_SUBSCRIBERS_PER_TOPIC>; Topic::COUNT],
    total: usize,
}

impl<'s> SubscriptionTable<'s> {
    fn new() -> Self {
        Self {
            lists: core::array::from_fn(|_| Vec::new()),
            total: 0,
        }
    }
}

/// The message broker
pub struct MessageBus<'s> {
    table: ModuleState<SubscriptionTable<'s>>,
}

impl<'s> MessageBus<'s> {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            table: ModuleState::new(SubscriptionTable::new()),
        }
    }

    /// Append `handler` to the subscriber list for `topic`.
    ///
    /// Registration is not idempotent: subscribing the same handler twice
    /// registers it twice and it will run twice per publish.
    ///
    /// # Errors
    ///
    /// `BusError::CapacityExceeded` if the topic's list or the global limit
    /// is full; the existing subscriber set is left unchanged.
    pub fn subscribe(&self, topic: Topic, handler: &'s dyn Subscriber) -> Result<(), BusError> {
        self.table.with_mut(|table| {
            if table.total >= MAX_SUBSCRIPTIONS {
                return Err(BusError::CapacityExceeded);
            }
            table.lists[topic.index()]
                .push(handler)
                .map_err(|_| BusError::CapacityExceeded)?;
            table.total += 1;
            Ok(())
        })
    }

    /// Remove the first registration of `handler` on `topic`, preserving the
    /// order of the remaining subscribers.
    ///
    /// Returns `true` if a registration was removed. Not required by any
    /// module in this system (subscriptions are made once at init), but kept
    /// for generality.
    pub fn unsubscribe(&self, topic: Topic, handler: &'s dyn Subscriber) -> bool {
        self.table.with_mut(|table| {
            let list = &mut table.lists[topic.index()];
            match list.iter().position(|h| same_handler(*h, handler)) {
                Some(pos) => {
                    list.remove(pos);
                    table.total -= 1;
                    true
                }
                None => false,
            }
        })
    }

    /// Deliver `message` to every current subscriber of its topic, in
    /// registration order.
    ///
    /// The subscriber list is snapshotted under the table lock, then handlers
    /// run with the lock released; a subscribe racing this publish from
    /// another context lands in the next publish's snapshot. Delivery
    /// failures are the handlers' concern: `publish` itself cannot fail, and
    /// no subscriber can prevent the ones after it from running short of
    /// diverting the whole context.
    pub fn publish(&self, message: &Message<'_>) {
        let snapshot: Vec<&'s dyn Subscriber, MAX_SUBSCRIBERS_PER_TOPIC> = self
            .table
            .with(|table| table.lists[message.topic.index()].clone());

        for handler in &snapshot {
            handler.on_message(self, message);
        }
    }

    /// Number of subscribers currently registered on `topic`
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.table.with(|table| table.lists[topic.index()].len())
    }

    /// Total subscriptions across all topics
    pub fn subscription_count(&self) -> usize {
        self.table.with(|table| table.total)
    }
}

impl Default for MessageBus<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_handler(a: &dyn Subscriber, b: &dyn Subscriber) -> bool {
    core::ptr::addr_eq(a as *const dyn Subscriber, b as *const dyn Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    /// Appends its tag to a shared log on every delivery.
    struct Tagger<'l> {
        tag: u8,
        log: &'l RefCell<std::vec::Vec<u8>>,
    }

    impl Subscriber for Tagger<'_> {
        fn on_message(&self, _bus: &MessageBus<'_>, _message: &Message<'_>) {
            self.log.borrow_mut().push(self.tag);
        }
    }

    /// Copies every delivered payload (the only way to keep payload data).
    struct Recorder {
        seen: RefCell<std::vec::Vec<std::vec::Vec<u8>>>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                seen: RefCell::new(std::vec::Vec::new()),
            }
        }
    }

    impl Subscriber for Recorder {
        fn on_message(&self, _bus: &MessageBus<'_>, message: &Message<'_>) {
            self.seen.borrow_mut().push(message.payload.to_vec());
        }
    }

    /// Republishes on another topic, logging around the nested publish.
    struct Chainer<'l> {
        next: Topic,
        log: &'l RefCell<std::vec::Vec<u8>>,
    }

    impl Subscriber for Chainer<'_> {
        fn on_message(&self, bus: &MessageBus<'_>, message: &Message<'_>) {
            if message.topic == self.next {
                return; // only chain from the originating topic
            }
            self.log.borrow_mut().push(b'<');
            bus.publish(&Message {
                topic: self.next,
                payload: &[],
            });
            self.log.borrow_mut().push(b'>');
        }
    }

    #[test]
    fn handlers_run_in_registration_order_exactly_once() {
        let log = RefCell::new(std::vec::Vec::new());
        let h1 = Tagger { tag: 1, log: &log };
        let h2 = Tagger { tag: 2, log: &log };
        let h3 = Tagger { tag: 3, log: &log };

        let bus = MessageBus::new();
        bus.subscribe(Topic::TimeRequest, &h1).unwrap();
        bus.subscribe(Topic::TimeRequest, &h2).unwrap();
        bus.subscribe(Topic::TimeRequest, &h3).unwrap();

        bus.publish(&Message {
            topic: Topic::TimeRequest,
            payload: &[],
        });

        assert_eq!(*log.borrow(), [1, 2, 3]);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = MessageBus::new();
        bus.publish(&Message {
            topic: Topic::PlayerNext,
            payload: &[],
        });
    }

    #[test]
    fn payload_reaches_only_the_matching_topic() {
        let hit = Recorder::new();
        let miss = Recorder::new();

        let bus = MessageBus::new();
        bus.subscribe(Topic::PlayerPlay, &hit).unwrap();
        bus.subscribe(Topic::PlayerResponse, &miss).unwrap();

        bus.publish(&Message {
            topic: Topic::PlayerPlay,
            payload: &[0x2A, 0x00],
        });

        assert_eq!(hit.seen.borrow().len(), 1);
        assert_eq!(hit.seen.borrow()[0], [0x2A, 0x00]);
        assert!(miss.seen.borrow().is_empty());
    }

    #[test]
    fn duplicate_registration_is_invoked_twice() {
        let log = RefCell::new(std::vec::Vec::new());
        let h = Tagger { tag: 7, log: &log };

        let bus = MessageBus::new();
        bus.subscribe(Topic::ScheduleClear, &h).unwrap();
        bus.subscribe(Topic::ScheduleClear, &h).unwrap();

        bus.publish(&Message {
            topic: Topic::ScheduleClear,
            payload: &[],
        });

        assert_eq!(*log.borrow(), [7, 7]);
    }

    #[test]
    fn per_topic_capacity_rejects_and_preserves_existing() {
        let log = RefCell::new(std::vec::Vec::new());
        let handlers: std::vec::Vec<Tagger<'_>> = (0..=MAX_SUBSCRIBERS_PER_TOPIC as u8)
            .map(|tag| Tagger { tag, log: &log })
            .collect();

        let bus = MessageBus::new();
        for h in handlers.iter().take(MAX_SUBSCRIBERS_PER_TOPIC) {
            bus.subscribe(Topic::SetLogging, h).unwrap();
        }

        assert_eq!(
            bus.subscribe(Topic::SetLogging, &handlers[MAX_SUBSCRIBERS_PER_TOPIC]),
            Err(BusError::CapacityExceeded)
        );
        assert_eq!(
            bus.subscriber_count(Topic::SetLogging),
            MAX_SUBSCRIBERS_PER_TOPIC
        );

        bus.publish(&Message {
            topic: Topic::SetLogging,
            payload: &[],
        });
        assert_eq!(log.borrow().len(), MAX_SUBSCRIBERS_PER_TOPIC);
    }

    #[test]
    fn global_capacity_rejects_across_topics() {
        let log = RefCell::new(std::vec::Vec::new());
        let h = Tagger { tag: 0, log: &log };

        let bus = MessageBus::new();
        let mut subscribed = 0;
        'outer: for topic in Topic::ALL {
            for _ in 0..MAX_SUBSCRIBERS_PER_TOPIC {
                if subscribed == MAX_SUBSCRIPTIONS {
                    break 'outer;
                }
                bus.subscribe(topic, &h).unwrap();
                subscribed += 1;
            }
        }

        assert_eq!(bus.subscription_count(), MAX_SUBSCRIPTIONS);
        assert_eq!(
            bus.subscribe(Topic::ScheduleListResponse, &h),
            Err(BusError::CapacityExceeded)
        );
    }

    #[test]
    fn unsubscribe_removes_first_registration_and_keeps_order() {
        let log = RefCell::new(std::vec::Vec::new());
        let h1 = Tagger { tag: 1, log: &log };
        let h2 = Tagger { tag: 2, log: &log };
        let h3 = Tagger { tag: 3, log: &log };

        let bus = MessageBus::new();
        bus.subscribe(Topic::WifiStatus, &h1).unwrap();
        bus.subscribe(Topic::WifiStatus, &h2).unwrap();
        bus.subscribe(Topic::WifiStatus, &h3).unwrap();

        assert!(bus.unsubscribe(Topic::WifiStatus, &h2));
        assert!(!bus.unsubscribe(Topic::WifiStatus, &h2));
        assert_eq!(bus.subscription_count(), 2);

        bus.publish(&Message {
            topic: Topic::WifiStatus,
            payload: &[],
        });
        assert_eq!(*log.borrow(), [1, 3]);
    }

    #[test]
    fn nested_publish_is_depth_first() {
        let log = RefCell::new(std::vec::Vec::new());
        let chain = Chainer {
            next: Topic::PlayerPlay,
            log: &log,
        };
        let inner = Tagger { tag: b'i', log: &log };
        let after = Tagger { tag: b'a', log: &log };

        let bus = MessageBus::new();
        bus.subscribe(Topic::TimeResponse, &chain).unwrap();
        bus.subscribe(Topic::TimeResponse, &after).unwrap();
        bus.subscribe(Topic::PlayerPlay, &inner).unwrap();

        bus.publish(&Message {
            topic: Topic::TimeResponse,
            payload: &[],
        });

        // The nested publish runs to completion inside the chainer, before
        // the subscriber registered after it on the outer topic.
        assert_eq!(*log.borrow(), [b'<', b'i', b'>', b'a']);
    }

    #[test]
    fn handler_may_query_the_table_during_dispatch() {
        struct Prober;
        impl Subscriber for Prober {
            fn on_message(&self, bus: &MessageBus<'_>, message: &Message<'_>) {
                // Would deadlock (or panic the RefCell) if the table lock
                // were held across handler invocation.
                assert_eq!(bus.subscriber_count(message.topic), 1);
            }
        }

        let prober = Prober;
        let bus = MessageBus::new();
        bus.subscribe(Topic::ScheduleList, &prober).unwrap();
        bus.publish(&Message {
            topic: Topic::ScheduleList,
            payload: &[],
        });
    }
}
