pub mod delivery_worker;
