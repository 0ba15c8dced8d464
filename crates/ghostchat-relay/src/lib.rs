pub mod events;
pub mod manager;
pub mod testing;

pub use events::LifecycleBus;
pub use manager::ChatroomManager;
