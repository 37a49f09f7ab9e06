//! Real-time timestep scheduler
//!
//! The scheduler owns the simulation clock, the admission counters and the
//! pause/resume state machine:
//!
//! ```text
//! Initializing -> Running -> Pausing -> Paused -> Resuming -> Running
//!                                         |
//!                                         +-> Finished
//! ```
//!
//! Each handler runs at a fixed [`Priority`]:
//!
//! - [`Scheduler::timer_tick`] at timer priority: advance the clock, check the
//!   tick budget, consume the ring-buffer slot inside the critical section,
//!   then admit the tick's background job.
//! - [`Scheduler::receive_spike`] at packet priority: push into the input
//!   buffer, never touching channel state.
//! - [`Scheduler::process_spikes`] at user priority: expand buffered spikes
//!   through the synaptic matrix into the ring buffer.
//! - [`Scheduler::run_background`] at background priority: structural
//!   plasticity, then the neuron update.

use core::fmt;

use crossbeam::queue::ArrayQueue;
use ncore_connect::SynapticMatrix;

use crate::accumulator::Accumulator;
use crate::collaborators::{NeuronModel, SynapseSubsystem};
use crate::config::SchedulerConfig;
use crate::error::{Result, RuntimeError};
use crate::priority::{ChannelLock, CriticalSection, Priority};
use crate::provenance::{ProvenanceRecord, ProvenanceSink, SpikeProvenance};
use crate::recording::InputRecorder;
use crate::spike_buffer::SpikeInputBuffer;

/// Lifecycle state of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Built but not started
    Initializing,
    /// Ticks are being processed
    Running,
    /// Pause in progress
    Pausing,
    /// Stopped; may resume or finish
    Paused,
    /// Resume in progress
    Resuming,
    /// Shut down
    Finished,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "Initializing",
            Self::Running => "Running",
            Self::Pausing => "Pausing",
            Self::Paused => "Paused",
            Self::Resuming => "Resuming",
            Self::Finished => "Finished",
        };
        f.write_str(name)
    }
}

/// Tick counter
///
/// Starts one before zero so the first tick is 0. Pausing rewinds it by one
/// so the pausing tick is replayed after resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    time: u32,
}

impl SimulationClock {
    /// Value before the first tick
    pub const BEFORE_START: u32 = u32::MAX;

    /// Create a clock that has not ticked
    pub const fn new() -> Self {
        Self {
            time: Self::BEFORE_START,
        }
    }

    /// Current tick
    pub const fn time(&self) -> u32 {
        self.time
    }

    /// Move to the next tick and return it
    pub fn advance(&mut self) -> u32 {
        self.time = self.time.wrapping_add(1);
        self.time
    }

    /// Step back one tick
    pub fn rewind(&mut self) {
        self.time = self.time.wrapping_sub(1);
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Background admission counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmissionCounter {
    queued: u32,
    overloads: u32,
    max_queued: u32,
}

impl AdmissionCounter {
    /// Jobs admitted and not yet completed
    pub fn queued(&self) -> u32 {
        self.queued
    }

    /// Jobs rejected by a full queue
    pub fn overloads(&self) -> u32 {
        self.overloads
    }

    /// Highest value `queued` has reached
    pub fn max_queued(&self) -> u32 {
        self.max_queued
    }

    fn admit(&mut self) {
        self.queued += 1;
        self.max_queued = self.max_queued.max(self.queued);
    }

    fn reject(&mut self) {
        self.overloads += 1;
    }

    fn complete(&mut self) {
        debug_assert!(self.queued > 0, "background job completed without admission");
        self.queued = self.queued.saturating_sub(1);
    }
}

/// What a timer tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick processed and its background job queued
    Admitted {
        /// Tick processed
        time: u32,
    },
    /// Tick processed but its background job rejected
    Overloaded {
        /// Tick processed
        time: u32,
    },
    /// Tick budget exhausted; the scheduler is now paused
    Paused {
        /// Tick that will run first after resume
        resume_at: u32,
    },
}

#[derive(Debug, Clone, Copy)]
struct BackgroundJob {
    time: u32,
    timer_count: u32,
}

/// Per-core timestep scheduler
pub struct Scheduler<N, S> {
    config: SchedulerConfig,
    state: RunState,
    clock: SimulationClock,
    timer_count: u32,
    admission: AdmissionCounter,
    background: ArrayQueue<BackgroundJob>,
    channels: ChannelLock,
    matrix: SynapticMatrix,
    spikes: SpikeInputBuffer,
    recorder: InputRecorder,
    neuron: N,
    synapses: S,
    n_late_spikes: u32,
    n_pre_synaptic_events: u32,
    n_synapses_delivered: u32,
}

impl<N: NeuronModel, S: SynapseSubsystem> Scheduler<N, S> {
    /// Create a scheduler over an expanded synaptic matrix
    pub fn new(
        config: SchedulerConfig,
        accumulator: Accumulator,
        matrix: SynapticMatrix,
        neuron: N,
        synapses: S,
    ) -> Result<Self> {
        config.validate()?;
        if matrix.layout() != accumulator.layout() {
            return Err(RuntimeError::invalid_config(
                "synaptic matrix and ring buffer use different layouts",
            ));
        }
        Ok(Self {
            background: ArrayQueue::new(config.background_capacity),
            spikes: SpikeInputBuffer::new(config.spike_buffer_capacity),
            recorder: InputRecorder::new(config.record_inputs, config.recording_capacity),
            config,
            state: RunState::Initializing,
            clock: SimulationClock::new(),
            timer_count: 0,
            admission: AdmissionCounter::default(),
            channels: ChannelLock::new(accumulator),
            matrix,
            neuron,
            synapses,
            n_late_spikes: 0,
            n_pre_synaptic_events: 0,
            n_synapses_delivered: 0,
        })
    }

    /// Begin running
    pub fn start(&mut self) -> Result<()> {
        self.expect_state(RunState::Initializing)?;
        if self.config.infinite_run {
            log::info!("Starting infinite run");
        } else {
            log::info!("Starting run of {} ticks", self.config.simulation_ticks);
        }
        self.state = RunState::Running;
        Ok(())
    }

    /// Timer handler: process one tick
    pub fn timer_tick(&mut self) -> Result<TickOutcome> {
        self.expect_state(RunState::Running)?;

        let late = self.spikes.clear();
        if late > 0 {
            log::debug!("Dropped {} late spikes", late);
            self.n_late_spikes += late;
        }

        let time = self.clock.advance();
        self.timer_count = self.timer_count.wrapping_add(1);

        if self.is_finished(time) {
            self.pause();
            return Ok(TickOutcome::Paused { resume_at: time });
        }

        {
            let mut section = self.channels.enter(Priority::Timer);
            section.process(time);
            self.recorder.record(time, section.channels());
        }

        let job = BackgroundJob {
            time,
            timer_count: self.timer_count,
        };
        if self.background.push(job).is_ok() {
            self.admission.admit();
            Ok(TickOutcome::Admitted { time })
        } else {
            self.admission.reject();
            log::warn!(
                "Background queue full at tick {}; skipping its update ({} overloads)",
                time,
                self.admission.overloads()
            );
            Ok(TickOutcome::Overloaded { time })
        }
    }

    /// Packet handler: buffer a spike from pre-neuron `pre`
    ///
    /// Returns `false` when the buffer is full and the spike was dropped.
    pub fn receive_spike(&self, pre: u32) -> bool {
        let accepted = self.spikes.push(pre);
        if !accepted {
            log::debug!("Input buffer full; dropped spike from {}", pre);
        }
        accepted
    }

    /// User handler: expand buffered spikes into the ring buffer
    ///
    /// Spikes are delivered relative to the current tick. Returns the number
    /// of spikes processed; nothing is processed unless running.
    pub fn process_spikes(&mut self) -> usize {
        if self.state != RunState::Running {
            return 0;
        }
        let time = self.clock.time();
        let mut section = self.channels.enter(Priority::User);
        let mut processed = 0;
        while let Some(pre) = self.spikes.pop() {
            let delivered = section.deliver(time, self.matrix.row(pre));
            self.n_pre_synaptic_events += 1;
            self.n_synapses_delivered += delivered as u32;
            processed += 1;
        }
        processed
    }

    /// Background handler: run the oldest queued job
    ///
    /// Returns `false` when nothing was queued.
    pub fn run_background(&mut self) -> bool {
        let Some(job) = self.background.pop() else {
            return false;
        };
        self.synapses.do_timestep_update(job.time);
        {
            let section = self.channels.enter(Priority::Background);
            self.neuron
                .do_timestep_update(job.time, job.timer_count, section.channels());
        }
        self.admission.complete();
        true
    }

    /// Run queued background jobs until none remain
    pub fn drain_background(&mut self) -> usize {
        let mut completed = 0;
        while self.run_background() {
            completed += 1;
        }
        completed
    }

    /// Continue a paused run for `extra_ticks` more ticks
    ///
    /// A refusal by either collaborator is fatal and finishes the run.
    pub fn resume(&mut self, extra_ticks: u32) -> Result<()> {
        self.expect_state(RunState::Paused)?;
        self.state = RunState::Resuming;
        self.recorder.reset();

        if !self.neuron.resume() {
            self.state = RunState::Finished;
            return Err(RuntimeError::ResumeRefused { subsystem: "neuron" });
        }
        let next = self.clock.time().wrapping_add(1);
        if !self.synapses.resume(next) {
            self.state = RunState::Finished;
            return Err(RuntimeError::ResumeRefused { subsystem: "synapse" });
        }

        self.config.simulation_ticks = self.config.simulation_ticks.saturating_add(extra_ticks);
        self.state = RunState::Running;
        log::info!(
            "Resumed at tick {}, running until {}",
            next,
            self.config.simulation_ticks
        );
        Ok(())
    }

    /// Shut down a paused run and return its provenance
    pub fn exit(&mut self) -> Result<ProvenanceRecord> {
        self.expect_state(RunState::Paused)?;
        self.state = RunState::Finished;
        let record = self.provenance();
        log::info!(
            "Finished: max {} backgrounds queued, {} overloads",
            record.max_backgrounds_queued,
            record.n_background_queue_overloads
        );
        Ok(record)
    }

    /// Hand the current provenance to `sink`
    pub fn store_provenance(&self, sink: &mut dyn ProvenanceSink) {
        sink.store(&self.provenance());
    }

    /// Snapshot of every counter
    pub fn provenance(&self) -> ProvenanceRecord {
        let n_weight_saturations = self
            .channels
            .enter(Priority::Sdp)
            .ring_buffer()
            .saturation_count();
        ProvenanceRecord {
            neuron: self.neuron.provenance(),
            synapse: self.synapses.provenance_snapshot(),
            spikes: SpikeProvenance {
                n_received: self.spikes.received(),
                n_input_buffer_overflows: self.spikes.overflows(),
                n_late_spikes: self.n_late_spikes,
                n_pre_synaptic_events: self.n_pre_synaptic_events,
                n_synapses_delivered: self.n_synapses_delivered,
                n_weight_saturations,
                max_filled_input_buffer: self.spikes.max_filled() as u32,
            },
            max_backgrounds_queued: self.admission.max_queued(),
            n_background_queue_overloads: self.admission.overloads(),
        }
    }

    /// Run ticks until the budget pauses the scheduler
    ///
    /// After each processed tick, spikes from `stimulus(time)` are received
    /// and processed and the background queue is drained. Returns the number
    /// of ticks processed. Never returns on an infinite run.
    pub fn run_to_pause<F, I>(&mut self, mut stimulus: F) -> Result<u32>
    where
        F: FnMut(u32) -> I,
        I: IntoIterator<Item = u32>,
    {
        let mut ticks = 0;
        loop {
            match self.timer_tick()? {
                TickOutcome::Paused { .. } => return Ok(ticks),
                TickOutcome::Admitted { time } | TickOutcome::Overloaded { time } => {
                    for pre in stimulus(time) {
                        self.receive_spike(pre);
                    }
                    self.process_spikes();
                    self.drain_background();
                    ticks += 1;
                }
            }
        }
    }

    /// Enter the channel critical section at `priority`
    pub fn critical_section(&self, priority: Priority) -> CriticalSection<'_> {
        self.channels.enter(priority)
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Current tick
    pub fn time(&self) -> u32 {
        self.clock.time()
    }

    /// Timer events handled, including pausing ones
    pub fn timer_count(&self) -> u32 {
        self.timer_count
    }

    /// Background admission counters
    pub fn admission(&self) -> &AdmissionCounter {
        &self.admission
    }

    /// Active configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The neuron model
    pub fn neuron(&self) -> &N {
        &self.neuron
    }

    /// The synapse subsystem
    pub fn synapses(&self) -> &S {
        &self.synapses
    }

    /// Input recorder
    pub fn recorder(&self) -> &InputRecorder {
        &self.recorder
    }

    /// The expanded synaptic matrix
    pub fn matrix(&self) -> &SynapticMatrix {
        &self.matrix
    }

    fn is_finished(&self, time: u32) -> bool {
        !self.config.infinite_run && time >= self.config.simulation_ticks
    }

    fn pause(&mut self) {
        self.state = RunState::Pausing;
        log::info!("Tick budget of {} reached; pausing", self.config.simulation_ticks);
        self.neuron.pause();
        self.recorder.flush();
        self.clock.rewind();
        self.state = RunState::Paused;
    }

    fn expect_state(&self, expected: RunState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RuntimeError::invalid_state(expected.to_string(), self.state))
        }
    }
}
