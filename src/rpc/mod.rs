//! Remote call layer: wire protocol, the `CallChannel` primitive, and its
//! bus-backed implementation.

mod bus_channel;
mod channel;
mod protocol;

pub use bus_channel::BusChannel;
pub use channel::{CallChannel, Connect};
pub use protocol::{FaultKind, IndexReply, IndexRequest, Operation, RemoteFault, REPLY_MESSAGE_TYPE};
