pub mod relay_consumer;
