// Domain layer: element, URL and submission models plus the host-facing ports.

pub mod model;
pub mod ports;
