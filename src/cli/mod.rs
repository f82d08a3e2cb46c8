//! Terminal front end

pub mod play;
