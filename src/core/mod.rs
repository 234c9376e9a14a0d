pub mod clock;
pub mod notifier;
pub mod scheduler;
pub mod source;
