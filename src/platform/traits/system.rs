//! System control interface trait

/// System-level control operations used by the console
pub trait SystemControl {
    /// Microseconds since boot
    fn uptime_us(&self) -> u64;

    /// Request a system restart.
    ///
    /// On hardware this does not return; implementations that cannot restart
    /// (mocks) record the request and return.
    fn restart(&mut self);
}
