pub mod store_name;
pub mod task;
pub mod task_state;

pub use store_name::StoreName;
pub use task::Task;
pub use task_state::TaskState;
