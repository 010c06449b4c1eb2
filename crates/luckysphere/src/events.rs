use crate::sphere::{CardPlacement, DisplayId, SphereRotation};
use crate::sys::draw::CodeVerification;
use drawctl::{ControlCommand, DrawCode};

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Spin(DrawCode),
    Verify(DrawCode),
    ConfigReload,
    Close,
}

impl From<ControlCommand> for AppEvent {
    fn from(command: ControlCommand) -> Self {
        match command {
            ControlCommand::Spin(code) => AppEvent::Spin(code),
            ControlCommand::Verify(code) => AppEvent::Verify(code),
            ControlCommand::Reload => AppEvent::ConfigReload,
            ControlCommand::Close => AppEvent::Close,
        }
    }
}

/// Plain-data output for whatever draws the sphere.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Layout(Vec<CardPlacement>),
    Rotation(SphereRotation),
    Highlight(Option<usize>),
    Settled { index: usize, display_id: DisplayId },
    SpinRejected,
    SpinFailed { reason: String },
    Verified {
        code: DrawCode,
        verification: CodeVerification,
    },
    VerifyFailed { code: DrawCode, reason: String },
}
