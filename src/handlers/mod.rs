// handlers/mod.rs - Two-tier handler layout
//
// public:    no account needed (registration, activation, tokens, healthcheck)
// protected: activated account needed; book routes also check permissions

pub mod protected;
pub mod public;
pub mod utils;
