/// Server link: wire envelope codec and the socket client.

pub mod client;
pub mod envelope;
