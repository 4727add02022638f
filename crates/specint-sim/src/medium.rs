//! Event-driven shared medium
//!
//! A [`Medium`] owns one receiver's [`SpectrumInterference`] and a queue of
//! timed events. Transmissions become a `SignalStart`/`SignalEnd` pair;
//! receptions additionally bracket the signal with `RxStart`/`RxEnd`.
//! Running the medium feeds the events to the receiver in time order.

use crate::error::{SimError, SimResult};
use crate::event::{EventQueue, MediumEvent};
use serde::{Deserialize, Serialize};
use specint_core::spectrum::SpectrumValue;
use specint_core::{SimTime, SpectrumInterference};
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of one scheduled reception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxVerdict {
    pub label: String,
    pub start: SimTime,
    pub end: SimTime,
    pub success: bool,
    pub success_probability: f64,
    pub chunks: usize,
}

/// Discrete-event driver around a single receiver
#[derive(Debug)]
pub struct Medium {
    receiver: SpectrumInterference,
    queue: EventQueue,
    now: SimTime,
    current_label: Option<String>,
    verdicts: Vec<RxVerdict>,
}

impl Medium {
    pub fn new(receiver: SpectrumInterference) -> Self {
        Self {
            receiver,
            queue: EventQueue::new(),
            now: SimTime::ZERO,
            current_label: None,
            verdicts: Vec::new(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn receiver(&self) -> &SpectrumInterference {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut SpectrumInterference {
        &mut self.receiver
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn verdicts(&self) -> &[RxVerdict] {
        &self.verdicts
    }

    pub fn take_verdicts(&mut self) -> Vec<RxVerdict> {
        std::mem::take(&mut self.verdicts)
    }

    pub fn into_receiver(self) -> SpectrumInterference {
        self.receiver
    }

    /// Add `signal` to the medium now and schedule its removal after `duration`.
    pub fn add_signal(&mut self, signal: &SpectrumValue, duration: Duration) -> SimResult<()> {
        let end = end_time(self.now, duration)?;
        self.receiver.add_signal(signal, self.now)?;
        self.queue.push(end, MediumEvent::SignalEnd(signal.clone()));
        Ok(())
    }

    /// Schedule a transmission occupying `[start, start + duration]`.
    pub fn transmit(
        &mut self,
        start: SimTime,
        signal: &SpectrumValue,
        duration: Duration,
    ) -> SimResult<()> {
        self.check_schedule(start)?;
        let end = end_time(start, duration)?;
        self.receiver.aggregate().check_compatible(signal)?;
        self.queue.push(start, MediumEvent::SignalStart(signal.clone()));
        self.queue.push(end, MediumEvent::SignalEnd(signal.clone()));
        Ok(())
    }

    /// Schedule a transmission that the receiver also attempts to decode.
    pub fn receive(
        &mut self,
        start: SimTime,
        signal: &SpectrumValue,
        duration: Duration,
        label: impl Into<String>,
    ) -> SimResult<()> {
        let label = label.into();
        let end = end_time(start, duration)?;
        self.transmit(start, signal, duration)?;
        self.queue.push(
            start,
            MediumEvent::RxStart {
                label: label.clone(),
                signal: signal.clone(),
            },
        );
        self.queue.push(end, MediumEvent::RxEnd { label });
        Ok(())
    }

    /// Process the next event. Returns its time, or `None` when the queue is empty.
    ///
    /// An event whose dispatch fails stays queued and the clock does not move,
    /// so the run can resume once the cause is dealt with.
    pub fn step(&mut self) -> SimResult<Option<SimTime>> {
        let Some((time, event)) = self.queue.peek().map(|(t, e)| (t, e.clone())) else {
            return Ok(None);
        };
        self.dispatch(time, event)?;
        self.queue.pop();
        self.now = time;
        Ok(Some(time))
    }

    /// Process every event scheduled at or before `until`, then advance the clock to it.
    pub fn run_until(&mut self, until: SimTime) -> SimResult<usize> {
        let mut processed = 0;
        while self.queue.peek_time().is_some_and(|t| t <= until) {
            self.step()?;
            processed += 1;
        }
        self.now = self.now.max(until);
        Ok(processed)
    }

    /// Drain the queue.
    pub fn run(&mut self) -> SimResult<&[RxVerdict]> {
        while self.step()?.is_some() {}
        Ok(&self.verdicts)
    }

    fn check_schedule(&self, at: SimTime) -> SimResult<()> {
        if at < self.now {
            return Err(SimError::ScheduleInPast { at, now: self.now });
        }
        Ok(())
    }

    fn dispatch(&mut self, now: SimTime, event: MediumEvent) -> SimResult<()> {
        match event {
            MediumEvent::SignalStart(signal) => {
                self.receiver.add_signal(&signal, now)?;
            }
            MediumEvent::SignalEnd(signal) => {
                self.receiver.subtract_signal(&signal, now)?;
            }
            MediumEvent::RxStart { label, signal } => {
                self.receiver.start_rx(&signal, now)?;
                debug!(label = %label, at = %now, "Reception started");
                self.current_label = Some(label);
            }
            MediumEvent::RxEnd { label } => {
                if self.current_label.as_deref() != Some(label.as_str()) {
                    return Err(SimError::InvalidSchedule(format!(
                        "reception '{}' ended but was never started",
                        label
                    )));
                }
                let report = self.receiver.end_rx_report(now)?;
                self.current_label = None;
                info!(
                    label = %label,
                    success = report.success,
                    probability = report.success_probability,
                    chunks = report.chunks,
                    "Reception finished"
                );
                self.verdicts.push(RxVerdict {
                    label,
                    start: report.started,
                    end: report.ended,
                    success: report.success,
                    success_probability: report.success_probability,
                    chunks: report.chunks,
                });
            }
        }
        Ok(())
    }
}

fn end_time(start: SimTime, duration: Duration) -> SimResult<SimTime> {
    start.checked_add(duration).ok_or_else(|| {
        SimError::InvalidSchedule(format!("{} + {:?} overflows the clock", start, duration))
    })
}
