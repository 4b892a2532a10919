mod controller;
mod state;

pub use controller::*;
pub use state::{
    ActivityMonitor, GeneratedPrompt, InFlight, InputMethod, ManualSource, MlsSource, StatusMessages, WorkflowState,
};
