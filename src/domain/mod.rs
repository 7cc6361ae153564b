// Domain layer: request models and ports. Adapters implement the ports against the remote spaces.

pub mod model;
pub mod ports;
