pub mod prompts;
pub mod spinner;

pub use prompts::prompt_confirmation;
pub use spinner::with_spinner;
