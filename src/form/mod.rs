mod session;

pub use session::{FormMode, FormSession, SessionStatus, SessionToken, SubmitOutcome};
