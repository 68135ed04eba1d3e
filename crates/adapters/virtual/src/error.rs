/// Failures of the simulated network.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    #[error("no virtual device with id {0:?}")]
    UnknownDevice(String),

    #[error("virtual device {0:?} is unreachable")]
    Unreachable(String),

    #[error("wrong key for virtual device {0:?}")]
    KeyMismatch(String),

    #[error("virtual device {0:?} is not at address {1}")]
    AddressMismatch(String, String),
}
