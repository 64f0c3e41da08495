// Domain layer: configuration items, the result aggregate and the ports the core depends on.

pub mod aggregate;
pub mod model;
pub mod ports;
