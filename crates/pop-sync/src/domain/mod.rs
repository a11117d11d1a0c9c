//! Domain model: the per-LAO aggregate and everything it owns.

pub mod consensus;
pub mod election;
pub mod ids;
pub mod lao;
pub mod roll_call;
pub mod witness;

pub use consensus::{ConsensusNode, ElectInstance, InstanceState, NodeState};
pub use election::{Election, ElectionState, VoteRecord};
pub use lao::{Lao, LaoMetadata, PendingUpdate, Server};
pub use roll_call::{RollCall, RollCallState};
pub use witness::WitnessMessage;
