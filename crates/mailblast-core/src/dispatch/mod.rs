//! Message dispatch: transport adapters, the dispatch pipeline, and the
//! queue adapter.

mod mailer;
mod pipeline;
mod provider;
mod queue;
mod transport;

pub use mailer::SmtpMailer;
pub use pipeline::Dispatcher;
pub use provider::HttpProvider;
pub use queue::DispatchQueue;
pub use transport::{MailTransport, OutgoingEmail, RejectionKind, TransportError};

#[cfg(test)]
pub(crate) use pipeline::tests as test_support;
