mod client;
mod event_bus;
mod normalize;
mod registry;
mod support;
