pub mod config;
pub mod container;
pub mod descriptor;
pub mod drift;
pub mod git;
pub mod paths;
pub mod report;
pub mod resolver;
pub mod state;
pub mod sync;
pub mod tracked;
pub mod util;
