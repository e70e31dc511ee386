//! Wire-level pieces shared by the agent runtime and the artifact store:
//! credentials, request signing and the event stream framing used for
//! streamed agent replies.
pub mod credentials;
pub mod event_stream;
pub mod sigv4;
