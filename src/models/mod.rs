pub mod task;
pub mod user;

pub use task::{CreateTaskRequest, NewTask, Task, TaskResponse, UpdateTaskRequest};
pub use user::{Identity, NewIdentity, UpdateUserRequest, UserResponse};
