//! Process-group signalling on Unix.

use llamadeck_core::{ProcessError, ProcessSignal};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::debug;

const fn to_nix(signal: ProcessSignal) -> Signal {
    match signal {
        ProcessSignal::Terminate => Signal::SIGTERM,
        ProcessSignal::Kill => Signal::SIGKILL,
    }
}

/// Send `signal` to the process group led by `pid`.
///
/// A group that no longer exists (`ESRCH`) counts as delivered.
pub fn signal_group(pid: u32, signal: ProcessSignal) -> Result<(), ProcessError> {
    let raw = i32::try_from(pid).map_err(|_| ProcessError::SignalFailed {
        pid,
        reason: "pid out of range".to_string(),
    })?;

    match signal::killpg(Pid::from_raw(raw), to_nix(signal)) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => {
            debug!(pid, %signal, "Process group already gone");
            Ok(())
        }
        Err(e) => Err(ProcessError::SignalFailed {
            pid,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_group_is_ok() {
        // Use a PID that's very unlikely to exist
        assert!(signal_group(999_999, ProcessSignal::Terminate).is_ok());
    }

    #[test]
    fn test_signal_mapping() {
        assert_eq!(to_nix(ProcessSignal::Terminate), Signal::SIGTERM);
        assert_eq!(to_nix(ProcessSignal::Kill), Signal::SIGKILL);
    }
}
