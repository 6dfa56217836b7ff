// Domain layer: message types and the ports the platform sessions and renderers implement.

pub mod model;
pub mod ports;
