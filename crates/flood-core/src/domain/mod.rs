//! Domain entities - the core business objects.

mod decision;
mod event;
mod policy;
mod subject;

pub use decision::FloodDecision;
pub use event::Event;
pub use policy::FloodPolicy;
pub use subject::SubjectId;
