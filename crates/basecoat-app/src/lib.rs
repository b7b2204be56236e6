// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod debounce;
pub mod detail;
pub mod filter;
pub mod ids;
pub mod listing;
pub mod model;
pub mod state;
pub mod surface;

pub use debounce::*;
pub use detail::*;
pub use filter::*;
pub use ids::*;
pub use listing::*;
pub use model::*;
pub use state::*;
pub use surface::*;
