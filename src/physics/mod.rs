pub mod body_properties;
pub mod collidables;
pub mod collision_body;
pub mod collision_detection;
pub mod collision_pipeline;
pub mod configuration;
pub mod error;
pub mod handles;
pub mod island_dispatcher;
pub mod island_manager;
