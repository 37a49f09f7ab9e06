//! Handler priorities and the channel-state critical section
//!
//! Handlers run to completion. A handler is preempted only by one with a
//! strictly higher priority, which here means a strictly lower level:
//!
//! | level | handlers |
//! |-------|----------|
//! | -1 | packet receive |
//! | 0 | timer, DMA, user |
//! | 1 | SDP, background |

use core::fmt;
use core::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};

use crate::accumulator::Accumulator;

/// Priority of an event handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Incoming spike packets
    PacketReceive,
    /// The timestep tick
    Timer,
    /// DMA completion
    Dma,
    /// Spike processing triggered from other handlers
    User,
    /// Host control messages
    Sdp,
    /// Deferred per-tick neuron work
    Background,
}

impl Priority {
    /// Numeric level; lower runs first
    pub const fn level(self) -> i8 {
        match self {
            Self::PacketReceive => -1,
            Self::Timer | Self::Dma | Self::User => 0,
            Self::Sdp | Self::Background => 1,
        }
    }

    /// Whether a handler at `self` may interrupt one running at `other`
    pub const fn preempts(self, other: Priority) -> bool {
        self.level() < other.level()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PacketReceive => "packet-receive",
            Self::Timer => "timer",
            Self::Dma => "dma",
            Self::User => "user",
            Self::Sdp => "sdp",
            Self::Background => "background",
        };
        write!(f, "{}({})", name, self.level())
    }
}

/// Exclusive lock over the accumulator
///
/// Packet-receive handlers preempt every holder, so they never enter; they
/// hand spikes over through the input buffer instead.
#[derive(Debug)]
pub struct ChannelLock {
    inner: Mutex<Accumulator>,
}

impl ChannelLock {
    /// Wrap an accumulator
    pub fn new(accumulator: Accumulator) -> Self {
        Self {
            inner: Mutex::new(accumulator),
        }
    }

    /// Enter the critical section from a handler at `priority`
    pub fn enter(&self, priority: Priority) -> CriticalSection<'_> {
        debug_assert!(
            !priority.preempts(Priority::Timer),
            "{} handlers must not enter the channel critical section",
            priority
        );
        CriticalSection {
            priority,
            guard: self.inner.lock(),
        }
    }

    /// Release the accumulator
    pub fn into_inner(self) -> Accumulator {
        self.inner.into_inner()
    }
}

/// Scoped exclusive access to the ring buffer and channels
pub struct CriticalSection<'a> {
    priority: Priority,
    guard: MutexGuard<'a, Accumulator>,
}

impl CriticalSection<'_> {
    /// Priority of the handler holding the section
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl Deref for CriticalSection<'_> {
    type Target = Accumulator;

    fn deref(&self) -> &Accumulator {
        &self.guard
    }
}

impl DerefMut for CriticalSection<'_> {
    fn deref_mut(&mut self) -> &mut Accumulator {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccumulatorConfig;
    use ncore_connect::SynapseLayout;

    #[test]
    fn test_preemption_rule() {
        assert!(Priority::PacketReceive.preempts(Priority::Timer));
        assert!(Priority::Timer.preempts(Priority::Background));
        assert!(!Priority::Timer.preempts(Priority::User));
        assert!(!Priority::Dma.preempts(Priority::Timer));
        assert!(!Priority::Background.preempts(Priority::Sdp));
        assert!(!Priority::Background.preempts(Priority::PacketReceive));
    }

    #[test]
    fn test_display() {
        assert_eq!(Priority::PacketReceive.to_string(), "packet-receive(-1)");
        assert_eq!(Priority::Background.to_string(), "background(1)");
    }

    #[test]
    fn test_critical_section_gives_exclusive_access() {
        let layout = SynapseLayout::new(1, 0, 2).unwrap();
        let accumulator = Accumulator::new(&AccumulatorConfig::new(2, 1, layout)).unwrap();
        let lock = ChannelLock::new(accumulator);
        {
            let mut section = lock.enter(Priority::Timer);
            assert_eq!(section.priority(), Priority::Timer);
            section.ring_buffer_mut().add(1, 0, 1, 9);
        }
        let section = lock.enter(Priority::Background);
        assert_eq!(section.ring_buffer().peek(1, 0, 1), 9);
        drop(section);
        assert_eq!(lock.into_inner().ring_buffer().peek(1, 0, 1), 9);
    }
}
