//! Environmental classification: calendar season and inferred trigger.
//!
//! Both are pure decision rules; no state is kept between requests.

pub mod season;
pub mod trigger;

pub use season::Season;
pub use trigger::{classify_trigger, Trigger};
