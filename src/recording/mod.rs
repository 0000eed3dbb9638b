//! Voice recording feature for vmemo.
//!
//! Provides the recording lifecycle (idle/recording state machine), the
//! microphone capture capability, elapsed time display, local replay storage,
//! and the recording screen.

pub mod capture;
pub mod session;
pub mod store;
pub mod timer;
pub mod ui;

pub use capture::{CaptureSource, MicCapture};
pub use session::{RecordingController, SessionState};
pub use store::RecordingStore;
pub use timer::ElapsedTimer;
pub use ui::{RecordTui, UiCommand};
