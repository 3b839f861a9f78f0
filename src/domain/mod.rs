// Domain layer: constants, models and the adapter port. No AWS types leak through here.

pub mod model;
pub mod ports;
