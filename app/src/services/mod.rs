pub mod process_queue;
pub mod relocate;
