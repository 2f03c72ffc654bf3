pub mod delivery_queue;
pub mod transport;
