pub mod frame_samples;
pub mod output_manager;

pub use frame_samples::FrameSamples;
pub use output_manager::{ConfirmOverwrite, FixedDecision, OutputManager, OverwriteDecision, TerminalPrompt};
