//! OSD Network Apply
//!
//! Applies a network configuration to the host and waits for it to
//! converge, keeping track of the configuration that is currently active.

pub mod applier;
pub mod cancel;
pub mod converge;
pub mod system;
pub mod transaction;


pub use applier::{ApplierSettings, Capabilities, NetworkApplier};
pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use converge::{ConvergenceWaiter, QuorumPolicy};
pub use system::{
    CommandRunner, EnvironmentControl, HostnameControl, HostnamectlControl, LinkStateProbe,
    NetworkctlProbe, SeedFileProbe, SeedProbe, ServiceControl, SystemCommandRunner,
    SystemdEnvironment, SystemdServiceControl,
};
pub use transaction::{NetworkState, Transaction, TransactionState};
