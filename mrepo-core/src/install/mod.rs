//! Install pipeline
//!
//! ```text
//! ContentReference ──▶ InstallSession::resolve ──▶ ResolvedPackage ──▶ InstallTrigger
//!                        │ direct path + registry check
//!                        └ else: full copy to <session tmp>/tmp.zip + registry check
//! ```
//!
//! Every stage has one failure exit. The resolved value is passed to the
//! trigger explicitly; nothing is accumulated across calls.

mod reference;
mod session;
mod trigger;

pub use reference::{ContentReference, Opener, UriReference};
pub use session::{InstallSession, ResolvedPackage, MATERIALIZED_FILE};
pub use trigger::{CommandTrigger, InstallTrigger};
