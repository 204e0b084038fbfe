//! Host-Side Synchronization Primitive
//!
//! [`Semaphore`] tracks where its device resource is in the submit cycle.
//! It stores and reports state; it never polls the backend. Every state
//! change is validated, so a scheduling bug surfaces as an error at the
//! violating call instead of as a hang three frames later.

use crate::errors::{Result, RheaError};

use super::device::DeviceRef;
use super::handle::{GpuHandle, ResourceTag};

/// Lifecycle position of a [`Semaphore`].
///
/// The only legal walk is `Idle → Submitted → Signaled → Idle`, one edge at
/// a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemaphoreState {
    /// Not part of any submission.
    Idle,
    /// Attached to work the device has not finished.
    Submitted,
    /// The attached work completed; awaiting reuse.
    Signaled,
}

/// Binary synchronization primitive owning one device resource.
///
/// One owner per primitive; there is no sharing and no fan-in.
pub struct Semaphore {
    gpu: GpuHandle,
    label: String,
    state: SemaphoreState,
}

impl Semaphore {
    pub fn new(device: &DeviceRef, label: impl Into<String>) -> Result<Self> {
        let raw = device.create_semaphore()?;
        Ok(Self {
            gpu: GpuHandle::new(device.clone(), raw, 0, ResourceTag::Semaphore, false),
            label: label.into(),
            state: SemaphoreState::Idle,
        })
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> SemaphoreState {
        self.state
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn gpu(&self) -> &GpuHandle {
        &self.gpu
    }

    /// Advances the lifecycle by one edge.
    ///
    /// Anything but the next edge in the cycle, including a transition to
    /// the current state, is rejected and leaves the state untouched.
    pub fn set_state(&mut self, next: SemaphoreState) -> Result<()> {
        let legal = matches!(
            (self.state, next),
            (SemaphoreState::Idle, SemaphoreState::Submitted)
                | (SemaphoreState::Submitted, SemaphoreState::Signaled)
                | (SemaphoreState::Signaled, SemaphoreState::Idle)
        );
        if !legal {
            return Err(RheaError::InvalidSemaphoreTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// `Idle → Submitted`.
    pub fn submit(&mut self) -> Result<()> {
        self.set_state(SemaphoreState::Submitted)
    }

    /// `Submitted → Signaled`.
    pub fn signal(&mut self) -> Result<()> {
        self.set_state(SemaphoreState::Signaled)
    }

    /// `Signaled → Idle`.
    pub fn reset(&mut self) -> Result<()> {
        self.set_state(SemaphoreState::Idle)
    }

    /// Checks that waiting makes sense right now.
    ///
    /// Waiting on an idle semaphore is a lifecycle violation and is
    /// reported, never silently passed. The state itself only moves through
    /// [`set_state`](Self::set_state).
    pub fn wait(&self) -> Result<()> {
        if self.state == SemaphoreState::Idle {
            return Err(RheaError::SemaphoreWaitWhileIdle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::null::NullDevice;
    use std::sync::Arc;

    fn semaphore() -> Semaphore {
        let device: DeviceRef = Arc::new(NullDevice::new());
        Semaphore::new(&device, "test").unwrap()
    }

    #[test]
    fn test_full_cycle() {
        let mut s = semaphore();
        assert_eq!(s.state(), SemaphoreState::Idle);
        s.submit().unwrap();
        assert_eq!(s.state(), SemaphoreState::Submitted);
        s.signal().unwrap();
        assert_eq!(s.state(), SemaphoreState::Signaled);
        s.reset().unwrap();
        assert_eq!(s.state(), SemaphoreState::Idle);
        // The cycle restarts cleanly.
        s.submit().unwrap();
    }

    #[test]
    fn test_invalid_edges_leave_state_untouched() {
        let mut s = semaphore();
        for bad in [SemaphoreState::Signaled, SemaphoreState::Idle] {
            let err = s.set_state(bad).unwrap_err();
            assert!(matches!(
                err,
                RheaError::InvalidSemaphoreTransition {
                    from: SemaphoreState::Idle,
                    ..
                }
            ));
            assert_eq!(s.state(), SemaphoreState::Idle);
        }

        s.submit().unwrap();
        assert!(s.set_state(SemaphoreState::Idle).is_err());
        assert!(s.set_state(SemaphoreState::Submitted).is_err());
        assert_eq!(s.state(), SemaphoreState::Submitted);

        s.signal().unwrap();
        assert!(s.set_state(SemaphoreState::Submitted).is_err());
        assert!(s.set_state(SemaphoreState::Signaled).is_err());
        assert_eq!(s.state(), SemaphoreState::Signaled);
    }

    #[test]
    fn test_wait_rejects_idle_only() {
        let mut s = semaphore();
        assert!(matches!(
            s.wait(),
            Err(RheaError::SemaphoreWaitWhileIdle)
        ));

        s.submit().unwrap();
        s.wait().unwrap();
        assert_eq!(s.state(), SemaphoreState::Submitted);

        s.signal().unwrap();
        s.wait().unwrap();
        assert_eq!(s.state(), SemaphoreState::Signaled);
    }
}
