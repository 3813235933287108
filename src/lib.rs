// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive CLI.
//
// Module responsibilities:
// - `transport`: one form POST per call against the platform API.
// - `decode`: pulls the `data` payload out of responses and checks its shape.
// - `api`: session token, domain records and the platform operations.
// - `config`: the settings file holding saved credentials and pacing delay.
// - `ui`: prompts, screen clearing and the waits between submissions.
// - `workflow`: the menu-driven state machine tying it all together.
pub mod api;
pub mod config;
pub mod decode;
pub mod error;
pub mod transport;
pub mod ui;
pub mod workflow;

pub use api::{ApiClient, Course, Coursework, Profile, Session, MAX_GRADE};
pub use config::{ConfigStore, JsonFileStore, Settings};
pub use error::{ApiError, ConfigError, WorkflowError};
pub use transport::{Endpoint, HttpTransport, Transport};
pub use workflow::Workflow;
