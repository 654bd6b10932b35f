pub mod pipeline;
pub mod poller;
